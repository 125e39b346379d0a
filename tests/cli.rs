// SPDX-License-Identifier: MIT OR Apache-2.0
// Project: keysetmac

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_keyset(value: &Value) -> NamedTempFile {
	let mut file = NamedTempFile::new().expect("temp keyset");
	write!(file, "{}", value).expect("write keyset");
	file
}

fn rotated_keyset(primary: u32, legacy: bool) -> Value {
	json!({
		"primary_key_id": primary,
		"keys": [
			{
				"key_id": 1,
				"status": "enabled",
				"output_prefix_type": if legacy { "legacy" } else { "tink" },
				"algorithm": "hmac-sha256",
				"key_value": "0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b",
			},
			{
				"key_id": 2,
				"status": "enabled",
				"output_prefix_type": "tink",
				"algorithm": "cmac-aes128",
				"key_value": "2b7e151628aed2a6abf7158809cf4f3c",
				"tag_size": 12
			}
		]
	})
}

fn compute(keyset: &NamedTempFile, data: &str) -> String {
	let output = cargo_bin_cmd!("ksm")
		.args(["compute", "--keyset"])
		.arg(keyset.path())
		.arg(data)
		.output()
		.expect("run ksm");
	assert!(output.status.success());
	String::from_utf8(output.stdout)
		.expect("utf8")
		.trim()
		.to_string()
}

#[test]
fn compute_emits_prefixed_hmac_tag() {
	let keyset = write_keyset(&rotated_keyset(1, false));
	let tag = compute(&keyset, "Hi There");
	assert_eq!(
		tag,
		"0100000001b0344c61d8db38535ca8afceaf0bf12b881dc200c9833da726e9376c2e32cff7"
	);
}

#[test]
fn tag_from_old_primary_verifies_after_rotation() {
	let old = write_keyset(&rotated_keyset(1, false));
	let tag = compute(&old, "payload");

	let rotated = write_keyset(&rotated_keyset(2, false));
	let new_tag = compute(&rotated, "payload");
	assert!(new_tag.starts_with("0100000002"));
	assert_eq!(new_tag.len(), (5 + 12) * 2);

	cargo_bin_cmd!("ksm")
		.args(["verify", "--keyset"])
		.arg(rotated.path())
		.args(["--tag", &tag, "payload"])
		.assert()
		.success()
		.stdout(predicate::str::diff("valid\n"));
}

#[test]
fn invalid_tag_exits_with_status_one() {
	let keyset = write_keyset(&rotated_keyset(1, false));
	cargo_bin_cmd!("ksm")
		.args(["verify", "--keyset"])
		.arg(keyset.path())
		.args(["--tag", "0100000001deadbeefdeadbeef", "payload"])
		.assert()
		.code(1)
		.stdout(predicate::str::diff("invalid\n"));
}

#[test]
fn json_output_describes_the_primary() {
	let keyset = write_keyset(&rotated_keyset(2, false));
	let output = cargo_bin_cmd!("ksm")
		.args(["compute", "--json", "--keyset"])
		.arg(keyset.path())
		.arg("payload")
		.output()
		.expect("run ksm");
	assert!(output.status.success());
	let payload: Value =
		serde_json::from_slice(&output.stdout).expect("json");
	assert_eq!(payload["algorithm"], "cmac-aes128");
	assert_eq!(payload["key_id"], 2);
	assert_eq!(payload["output_prefix_type"], "tink");
	assert_eq!(payload["input"]["type"], "inline");
}

#[test]
fn data_can_come_from_stdin_or_file() {
	let keyset = write_keyset(&rotated_keyset(1, false));
	let inline = compute(&keyset, "streamed");

	let piped = cargo_bin_cmd!("ksm")
		.args(["compute", "--stdin", "--keyset"])
		.arg(keyset.path())
		.write_stdin("streamed")
		.output()
		.expect("run ksm");
	assert_eq!(String::from_utf8_lossy(&piped.stdout).trim(), inline);

	let mut data = NamedTempFile::new().expect("temp data");
	write!(data, "streamed").expect("write data");
	cargo_bin_cmd!("ksm")
		.args(["compute", "--keyset"])
		.arg(keyset.path())
		.arg("--file")
		.arg(data.path())
		.assert()
		.success()
		.stdout(predicate::str::contains(inline.as_str()));
}

#[test]
fn legacy_compute_can_be_disabled() {
	let keyset = write_keyset(&rotated_keyset(1, true));
	cargo_bin_cmd!("ksm")
		.args(["compute", "--disable-legacy-compute", "--keyset"])
		.arg(keyset.path())
		.arg("payload")
		.assert()
		.failure()
		.stderr(predicate::str::contains("LEGACY"));

	cargo_bin_cmd!("ksm")
		.env("KSM_ENABLE_COMPUTE_OLD_LEGACY_MAC", "true")
		.args(["compute", "--keyset"])
		.arg(keyset.path())
		.arg("payload")
		.assert()
		.success()
		.stdout(predicate::str::starts_with("0000000001"));
}

#[test]
fn mistyped_legacy_flag_is_a_configuration_error() {
	let keyset = write_keyset(&rotated_keyset(1, true));
	cargo_bin_cmd!("ksm")
		.env("KSM_ENABLE_COMPUTE_OLD_LEGACY_MAC", "flase")
		.args(["compute", "--keyset"])
		.arg(keyset.path())
		.arg("payload")
		.assert()
		.code(2)
		.stdout(predicate::str::is_empty())
		.stderr(predicate::str::contains("KSM_ENABLE_COMPUTE_OLD_LEGACY_MAC"));
}

#[test]
fn help_uses_the_binary_name() {
	cargo_bin_cmd!("ksm")
		.arg("--help")
		.assert()
		.success()
		.stdout(predicate::str::contains("Usage: ksm"))
		.stdout(predicate::str::contains("Usage: keysetmac").not());
}

#[test]
fn invalid_keyset_is_reported() {
	let keyset = write_keyset(&json!({ "primary_key_id": 3, "keys": [] }));
	cargo_bin_cmd!("ksm")
		.args(["compute", "--keyset"])
		.arg(keyset.path())
		.arg("payload")
		.assert()
		.failure()
		.stderr(predicate::str::contains("empty keyset"));
}

#[test]
fn algorithms_lists_catalog() {
	cargo_bin_cmd!("ksm")
		.arg("algorithms")
		.assert()
		.success()
		.stdout(predicate::str::contains("hmac-sha1"))
		.stdout(predicate::str::contains("(legacy)"))
		.stdout(predicate::str::contains("blake3-keyed"));
}
