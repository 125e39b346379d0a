// SPDX-License-Identifier: MIT OR Apache-2.0
// Project: keysetmac
// File: commands.rs
// Author: keysetmac maintainers

//! CLI dispatch for `ksm compute` and `ksm verify`.

use std::error::Error;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use serde_json::json;

use crate::ksm::config::{LegacyMacPolicy, MacConfig};
use crate::ksm::keyset::{load_keyset, KeysetHandle, KeysetSource};
use crate::ksm::mac::{self, Mac, WrappedMac};

#[derive(Debug)]
pub enum MacInput {
	Inline(String),
	File(PathBuf),
	Stdin,
}

#[derive(Debug)]
pub struct ComputeOptions {
	pub keyset: KeysetSource,
	pub input: MacInput,
	pub json: bool,
	pub disable_legacy_compute: bool,
}

#[derive(Debug)]
pub struct VerifyOptions {
	pub keyset: KeysetSource,
	pub input: MacInput,
	pub tag_hex: String,
}

pub fn run_compute(options: ComputeOptions) -> Result<(), Box<dyn Error>> {
	ensure_single_stdin(&options.keyset, &options.input)?;
	let policy = if options.disable_legacy_compute {
		LegacyMacPolicy::new(false)
	} else {
		LegacyMacPolicy::from_config(&MacConfig::from_env()?)
	};
	let (handle, wrapped) = open_keyset(&options.keyset, policy)?;
	let data = read_input(&options.input)?;
	let tag = wrapped.compute_mac(&data)?;
	let tag_hex = hex::encode(&tag);

	if !options.json {
		println!("{}", tag_hex);
		return Ok(());
	}

	let primary = wrapped.primitives().primary();
	let algorithm = handle
		.keys()
		.iter()
		.find(|key| key.key_id == primary.key_id())
		.map(|key| key.key_data.algorithm().to_string());
	let input_value = match &options.input {
		MacInput::Inline(text) => {
			json!({ "type": "inline", "value": text })
		}
		MacInput::File(path) => {
			json!({ "type": "file", "value": path.display().to_string() })
		}
		MacInput::Stdin => json!({ "type": "stdin" }),
	};
	let payload = json!({
		"algorithm": algorithm,
		"key_id": primary.key_id(),
		"output_prefix_type": primary.prefix_type().to_string(),
		"tag": tag_hex,
		"input": input_value,
		"keyset_source": options.keyset.description(),
	});
	println!("{}", payload);
	Ok(())
}

/// Returns whether the tag verified; also prints `valid` or `invalid`.
pub fn run_verify(options: VerifyOptions) -> Result<bool, Box<dyn Error>> {
	ensure_single_stdin(&options.keyset, &options.input)?;
	// Verification never computes a tag.
	let (_, wrapped) =
		open_keyset(&options.keyset, LegacyMacPolicy::new(false))?;
	let tag = hex::decode(options.tag_hex.trim()).map_err(|err| {
		Box::new(io::Error::new(
			io::ErrorKind::InvalidInput,
			format!("tag is not valid hex: {}", err),
		)) as Box<dyn Error>
	})?;
	let data = read_input(&options.input)?;
	let valid = wrapped.verify_mac(&tag, &data).is_ok();
	println!("{}", if valid { "valid" } else { "invalid" });
	Ok(valid)
}

fn open_keyset(
	source: &KeysetSource,
	policy: LegacyMacPolicy,
) -> Result<(KeysetHandle, WrappedMac), Box<dyn Error>> {
	let handle = load_keyset(source)?;
	let wrapped = mac::new_with_policy(&handle, None, policy)?;
	Ok((handle, wrapped))
}

fn ensure_single_stdin(
	keyset: &KeysetSource,
	input: &MacInput,
) -> Result<(), Box<dyn Error>> {
	if matches!(keyset, KeysetSource::Stdin)
		&& matches!(input, MacInput::Stdin)
	{
		return Err(Box::new(io::Error::new(
			io::ErrorKind::InvalidInput,
			"keyset and input cannot both be read from stdin",
		)));
	}
	Ok(())
}

fn read_input(input: &MacInput) -> Result<Vec<u8>, Box<dyn Error>> {
	match input {
		MacInput::Inline(text) => Ok(text.as_bytes().to_vec()),
		MacInput::File(path) => fs::read(path).map_err(|err| {
			Box::new(io::Error::other(format!(
				"failed to open `{}`: {}",
				path.display(),
				err
			))) as Box<dyn Error>
		}),
		MacInput::Stdin => {
			let mut buf = Vec::new();
			io::stdin()
				.read_to_end(&mut buf)
				.map_err(|err| Box::new(err) as Box<dyn Error>)?;
			Ok(buf)
		}
	}
}
