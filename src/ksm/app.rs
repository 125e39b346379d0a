// SPDX-License-Identifier: MIT OR Apache-2.0
// Project: keysetmac
// File: app.rs
// Author: keysetmac maintainers

use crate::ksm::config::LEGACY_COMPUTE_ENV;
use crate::ksm::keyset::KeysetSource;
use crate::ksm::mac::commands::{
	run_compute, run_verify, ComputeOptions, MacInput, VerifyOptions,
};
use crate::ksm::mac::registry;
use clap::{Arg, ArgAction, ArgGroup};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

const HELP_TEMPLATE: &str = "{before-help}{name} {version}
Written by {author-with-newline}{about-with-newline}
Primary commands:
  ksm compute --keyset <FILE> <TEXT>            Tag data with the keyset's primary key
  ksm verify --keyset <FILE> --tag <HEX> <TEXT> Check a tag against every enabled key
  ksm algorithms                                List supported MAC key types
{usage-heading} {usage}

{all-args}{after-help}
";

fn keyset_arg() -> Arg {
	Arg::new("keyset")
		.short('k')
		.long("keyset")
		.value_name("FILE")
		.help("Cleartext JSON keyset (`-` reads stdin)")
		.required(true)
}

fn input_args() -> [Arg; 3] {
	[
		Arg::new("input").help("Inline data to authenticate"),
		Arg::new("file")
			.short('f')
			.long("file")
			.value_name("PATH")
			.value_parser(clap::value_parser!(PathBuf))
			.help("Read data from a file"),
		Arg::new("stdin")
			.long("stdin")
			.help("Read data from stdin")
			.action(ArgAction::SetTrue),
	]
}

fn disable_legacy_arg() -> Arg {
	Arg::new("disable-legacy-compute")
		.long("disable-legacy-compute")
		.help(format!(
			"Refuse to produce old LEGACY-format tags (overrides {})",
			LEGACY_COMPUTE_ENV
		))
		.action(ArgAction::SetTrue)
}

fn input_group() -> ArgGroup {
	ArgGroup::new("data")
		.args(["input", "file", "stdin"])
		.required(true)
}

pub fn build_cli() -> clap::Command {
	clap::Command::new("ksm")
		.color(clap::ColorChoice::Never)
		.help_template(HELP_TEMPLATE)
		.bin_name("ksm")
		.version(clap::crate_version!())
		.author(clap::crate_authors!())
		.about("Compute and verify MACs against a rotating keyset")
		.subcommand_required(true)
		.arg_required_else_help(true)
		.subcommand(
			clap::command!("compute")
				.about("Compute a tag with the primary key")
				.arg(keyset_arg())
				.args(input_args())
				.group(input_group())
				.arg(disable_legacy_arg())
				.arg(
					Arg::new("json")
						.long("json")
						.help("Emit a JSON object instead of the bare tag")
						.action(ArgAction::SetTrue),
				),
		)
		.subcommand(
			clap::command!("verify")
				.about("Verify a tag against the keyset")
				.arg(keyset_arg())
				.arg(
					Arg::new("tag")
						.short('t')
						.long("tag")
						.value_name("HEX")
						.help("Hex-encoded tag to verify")
						.required(true),
				)
				.args(input_args())
				.group(input_group()),
		)
		.subcommand(
			clap::command!("algorithms")
				.about("List supported MAC key types"),
		)
}

fn keyset_source(matches: &clap::ArgMatches) -> KeysetSource {
	match matches.get_one::<String>("keyset").map(String::as_str) {
		Some("-") | None => KeysetSource::Stdin,
		Some(path) => KeysetSource::File(PathBuf::from(path)),
	}
}

fn mac_input(matches: &clap::ArgMatches) -> MacInput {
	if let Some(path) = matches.get_one::<PathBuf>("file") {
		MacInput::File(path.clone())
	} else if matches.get_flag("stdin") {
		MacInput::Stdin
	} else {
		MacInput::Inline(
			matches
				.get_one::<String>("input")
				.cloned()
				.unwrap_or_default(),
		)
	}
}

fn list_algorithms() {
	for meta in registry::metadata() {
		let marker = if meta.is_legacy() { " (legacy)" } else { "" };
		println!(
			"{:<14} {:>3} bytes  {}{}",
			meta.identifier, meta.output_size, meta.display_name, marker
		);
	}
}

pub fn run() -> Result<ExitCode, Box<dyn Error>> {
	run_with(build_cli().get_matches())
}

pub fn run_with(
	matches: clap::ArgMatches,
) -> Result<ExitCode, Box<dyn Error>> {
	match matches.subcommand() {
		Some(("compute", args)) => {
			run_compute(ComputeOptions {
				keyset: keyset_source(args),
				input: mac_input(args),
				json: args.get_flag("json"),
				disable_legacy_compute: args
					.get_flag("disable-legacy-compute"),
			})?;
			Ok(ExitCode::SUCCESS)
		}
		Some(("verify", args)) => {
			let valid = run_verify(VerifyOptions {
				keyset: keyset_source(args),
				input: mac_input(args),
				tag_hex: args
					.get_one::<String>("tag")
					.cloned()
					.unwrap_or_default(),
			})?;
			Ok(if valid {
				ExitCode::SUCCESS
			} else {
				ExitCode::from(1)
			})
		}
		Some(("algorithms", _)) => {
			list_algorithms();
			Ok(ExitCode::SUCCESS)
		}
		_ => Ok(ExitCode::from(2)),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn cli_definition_is_consistent() {
		build_cli().debug_assert();
	}

	#[test]
	fn input_sources_are_mutually_exclusive() {
		let result = build_cli().try_get_matches_from([
			"ksm", "compute", "--keyset", "k.json", "text", "--stdin",
		]);
		assert!(result.is_err());
	}

	#[test]
	fn legacy_switch_belongs_to_compute_only() {
		let result = build_cli().try_get_matches_from([
			"ksm",
			"verify",
			"--keyset",
			"k.json",
			"--tag",
			"00",
			"--disable-legacy-compute",
			"text",
		]);
		assert!(result.is_err());
		assert!(build_cli()
			.try_get_matches_from([
				"ksm",
				"compute",
				"--keyset",
				"k.json",
				"--disable-legacy-compute",
				"text",
			])
			.is_ok());
	}

	#[test]
	fn usage_names_the_installed_binary() {
		let usage = build_cli().render_usage().to_string();
		assert!(usage.contains("ksm"));
		assert!(!usage.contains("keysetmac"));
	}

	#[test]
	fn dash_keyset_reads_stdin() {
		let matches = build_cli()
			.try_get_matches_from([
				"ksm", "compute", "--keyset", "-", "--file", "data.bin",
			])
			.expect("matches");
		let (_, args) = matches.subcommand().expect("subcommand");
		assert!(matches!(keyset_source(args), KeysetSource::Stdin));
		assert!(matches!(mac_input(args), MacInput::File(_)));
	}
}
