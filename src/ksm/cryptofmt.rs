// SPDX-License-Identifier: MIT OR Apache-2.0
// Project: keysetmac
// File: cryptofmt.rs
// Author: keysetmac maintainers

//! Output prefix format shared by every producer and verifier of a keyset.
//!
//! Non-raw tags start with a one byte format marker followed by the key id in
//! big-endian order. Raw tags carry no prefix at all.

use crate::ksm::keyset::OutputPrefixType;

/// Width of the prefix carried by TINK, LEGACY and CRUNCHY tags.
pub const NON_RAW_PREFIX_SIZE: usize = 5;

/// Prefix of RAW tags.
pub const RAW_PREFIX: &[u8] = &[];

/// Marker byte for LEGACY and CRUNCHY prefixes.
pub const LEGACY_START_BYTE: u8 = 0x00;

/// Marker byte for TINK prefixes.
pub const TINK_START_BYTE: u8 = 0x01;

/// Builds the output prefix for a key with the given id and prefix type.
pub fn output_prefix(
	key_id: u32,
	prefix_type: OutputPrefixType,
) -> Vec<u8> {
	match prefix_type {
		OutputPrefixType::Raw => RAW_PREFIX.to_vec(),
		OutputPrefixType::Tink => framed(TINK_START_BYTE, key_id),
		OutputPrefixType::Legacy | OutputPrefixType::Crunchy => {
			framed(LEGACY_START_BYTE, key_id)
		}
	}
}

fn framed(start: u8, key_id: u32) -> Vec<u8> {
	let mut prefix = Vec::with_capacity(NON_RAW_PREFIX_SIZE);
	prefix.push(start);
	prefix.extend_from_slice(&key_id.to_be_bytes());
	prefix
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn tink_prefix_carries_marker_and_big_endian_id() {
		let prefix = output_prefix(0x0102_0304, OutputPrefixType::Tink);
		assert_eq!(prefix, vec![0x01, 0x01, 0x02, 0x03, 0x04]);
	}

	#[test]
	fn legacy_and_crunchy_share_the_zero_marker() {
		let legacy = output_prefix(7, OutputPrefixType::Legacy);
		let crunchy = output_prefix(7, OutputPrefixType::Crunchy);
		assert_eq!(legacy, crunchy);
		assert_eq!(legacy, vec![0x00, 0, 0, 0, 7]);
	}

	#[test]
	fn raw_prefix_is_empty() {
		assert!(output_prefix(42, OutputPrefixType::Raw).is_empty());
	}

	#[test]
	fn non_raw_prefixes_have_fixed_width() {
		for prefix_type in [
			OutputPrefixType::Tink,
			OutputPrefixType::Legacy,
			OutputPrefixType::Crunchy,
		] {
			assert_eq!(
				output_prefix(u32::MAX, prefix_type).len(),
				NON_RAW_PREFIX_SIZE
			);
		}
	}
}
