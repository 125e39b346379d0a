// SPDX-License-Identifier: MIT OR Apache-2.0
// Project: keysetmac
// File: reader.rs
// Author: keysetmac maintainers

//! Loads cleartext JSON keysets from files, stdin, or inline strings.

use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use serde::Deserialize;
use zeroize::Zeroizing;

use super::{
	KeyData, KeyStatus, Keyset, KeysetHandle, KeysetKey,
	OutputPrefixType,
};
use crate::ksm::mac::MacError;

#[derive(Debug)]
pub enum KeysetSource {
	File(PathBuf),
	Stdin,
	Inline(String),
}

impl KeysetSource {
	pub fn description(&self) -> &'static str {
		match self {
			KeysetSource::File(_) => "file",
			KeysetSource::Stdin => "stdin",
			KeysetSource::Inline(_) => "inline",
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct KeysetDocument {
	primary_key_id: u32,
	keys: Vec<KeyDocument>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct KeyDocument {
	key_id: u32,
	status: KeyStatus,
	output_prefix_type: OutputPrefixType,
	algorithm: String,
	/// Hex-encoded key material.
	#[serde(default)]
	key_value: String,
	#[serde(default)]
	tag_size: Option<usize>,
}

impl fmt::Debug for KeyDocument {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("KeyDocument")
			.field("key_id", &self.key_id)
			.field("algorithm", &self.algorithm)
			.finish_non_exhaustive()
	}
}

#[derive(Debug)]
pub enum KeysetReadError {
	Io {
		source: io::Error,
		origin: String,
	},
	Parse(serde_json::Error),
	KeyEncoding {
		key_id: u32,
		source: hex::FromHexError,
	},
	Invalid(MacError),
}

impl fmt::Display for KeysetReadError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			KeysetReadError::Io { source, origin } => {
				write!(f, "failed to read keyset from {}: {}", origin, source)
			}
			KeysetReadError::Parse(source) => {
				write!(f, "failed to parse keyset: {}", source)
			}
			KeysetReadError::KeyEncoding { key_id, source } => {
				write!(
					f,
					"key {} has malformed hex key_value: {}",
					key_id, source
				)
			}
			KeysetReadError::Invalid(err) => {
				write!(f, "invalid keyset: {}", err)
			}
		}
	}
}

impl std::error::Error for KeysetReadError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			KeysetReadError::Io { source, .. } => Some(source),
			KeysetReadError::Parse(source) => Some(source),
			KeysetReadError::KeyEncoding { source, .. } => Some(source),
			KeysetReadError::Invalid(err) => Some(err),
		}
	}
}

pub fn load_keyset(
	source: &KeysetSource,
) -> Result<KeysetHandle, KeysetReadError> {
	let text = Zeroizing::new(read_source(source)?);
	parse_keyset(&text)
}

/// Parses and validates a JSON keyset document.
pub fn parse_keyset(
	text: &str,
) -> Result<KeysetHandle, KeysetReadError> {
	let document: KeysetDocument =
		serde_json::from_str(text).map_err(KeysetReadError::Parse)?;
	let mut keys = Vec::with_capacity(document.keys.len());
	for key in document.keys {
		let encoded = Zeroizing::new(key.key_value);
		let key_value =
			hex::decode(encoded.trim()).map_err(|source| {
				KeysetReadError::KeyEncoding {
					key_id: key.key_id,
					source,
				}
			})?;
		keys.push(KeysetKey::new(
			key.key_id,
			key.status,
			key.output_prefix_type,
			KeyData::new(key.algorithm, key_value, key.tag_size),
		));
	}
	KeysetHandle::new(Keyset {
		primary_key_id: document.primary_key_id,
		keys,
	})
	.map_err(KeysetReadError::Invalid)
}

fn read_source(
	source: &KeysetSource,
) -> Result<String, KeysetReadError> {
	match source {
		KeysetSource::File(path) => {
			fs::read_to_string(path).map_err(|source| {
				KeysetReadError::Io {
					source,
					origin: format!("`{}`", path.display()),
				}
			})
		}
		KeysetSource::Stdin => {
			let mut buf = String::new();
			io::stdin().read_to_string(&mut buf).map_err(|source| {
				KeysetReadError::Io {
					source,
					origin: "stdin".to_string(),
				}
			})?;
			Ok(buf)
		}
		KeysetSource::Inline(text) => Ok(text.clone()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const KEYSET: &str = r#"{
		"primary_key_id": 42,
		"keys": [
			{
				"key_id": 42,
				"status": "enabled",
				"output_prefix_type": "tink",
				"algorithm": "hmac-sha256",
				"key_value": "000102030405060708090a0b0c0d0e0f",
				"tag_size": 16
			},
			{
				"key_id": 7,
				"status": "disabled",
				"output_prefix_type": "raw",
				"algorithm": "cmac-aes128",
				"key_value": "2b7e151628aed2a6abf7158809cf4f3c"
			}
		]
	}"#;

	#[test]
	fn inline_keyset_is_parsed() {
		let handle =
			load_keyset(&KeysetSource::Inline(KEYSET.to_string()))
				.expect("keyset");
		assert_eq!(handle.primary_key_id(), 42);
		assert_eq!(handle.keys().len(), 2);
		let primary = &handle.keys()[0];
		assert_eq!(primary.output_prefix_type, OutputPrefixType::Tink);
		assert_eq!(primary.key_data.tag_size(), Some(16));
		assert_eq!(primary.key_data.key_value().len(), 16);
		assert_eq!(handle.keys()[1].status, KeyStatus::Disabled);
	}

	#[test]
	fn malformed_hex_names_the_key() {
		let text = KEYSET.replace("000102", "zz0102");
		let err = parse_keyset(&text).expect_err("bad hex");
		assert!(matches!(
			err,
			KeysetReadError::KeyEncoding { key_id: 42, .. }
		));
	}

	#[test]
	fn unknown_prefix_type_fails_to_parse() {
		let text = KEYSET.replace("\"tink\"", "\"fancy\"");
		assert!(matches!(
			parse_keyset(&text),
			Err(KeysetReadError::Parse(_))
		));
	}

	#[test]
	fn missing_file_reports_path() {
		let err = load_keyset(&KeysetSource::File(PathBuf::from(
			"/nonexistent/keyset.json",
		)))
		.expect_err("missing file");
		assert!(err.to_string().contains("/nonexistent/keyset.json"));
	}
}
