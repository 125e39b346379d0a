// SPDX-License-Identifier: MIT OR Apache-2.0
// Project: keysetmac
// File: cmac.rs
// Author: keysetmac maintainers

//! AES-CMAC key types for 128/192/256-bit keys.

use aes::{Aes128, Aes192, Aes256};
use cmac::Cmac;

use super::hmac::DigestMacExecutor;
use super::registry::{
	MacAlgorithm, MacAlgorithmMetadata, MacError, MacErrorKind,
	MacExecutor,
};

type CmacAes128 = Cmac<Aes128>;
type CmacAes192 = Cmac<Aes192>;
type CmacAes256 = Cmac<Aes256>;

const AES_CMAC_KEY_LENGTHS: &[usize] = &[16, 24, 32];
const CMAC_OUTPUT_SIZE: usize = 16;

pub fn catalog() -> &'static [MacAlgorithm] {
	const ALGORITHMS: &[MacAlgorithm] = &[
		MacAlgorithm::new(
			MacAlgorithmMetadata::current(
				"cmac-aes128",
				"CMAC-AES128",
				CMAC_OUTPUT_SIZE,
			),
			create_cmac::<CmacAes128, 16>,
		),
		MacAlgorithm::new(
			MacAlgorithmMetadata::current(
				"cmac-aes192",
				"CMAC-AES192",
				CMAC_OUTPUT_SIZE,
			),
			create_cmac::<CmacAes192, 24>,
		),
		MacAlgorithm::new(
			MacAlgorithmMetadata::current(
				"cmac-aes256",
				"CMAC-AES256",
				CMAC_OUTPUT_SIZE,
			),
			create_cmac::<CmacAes256, 32>,
		),
	];
	ALGORITHMS
}

/// Validates that the provided key length is suitable for AES-CMAC.
pub fn validate_cmac_key_length(key: &[u8]) -> Result<(), MacError> {
	if AES_CMAC_KEY_LENGTHS.contains(&key.len()) {
		Ok(())
	} else {
		Err(MacError::new(
			MacErrorKind::InvalidKeyLength,
			format!(
				"Invalid CMAC key length: expected 16, 24, or 32 bytes but received {}",
				key.len()
			),
		))
	}
}

fn create_cmac<M, const KEY_LEN: usize>(
	key: &[u8],
) -> Result<Box<dyn MacExecutor>, MacError>
where
	M: cmac::Mac + cmac::digest::KeyInit + Send + 'static,
{
	validate_cmac_key_length(key)?;
	if key.len() != KEY_LEN {
		return Err(MacError::new(
			MacErrorKind::InvalidKeyLength,
			format!(
				"Invalid CMAC-AES{} key length: expected {} bytes but received {}",
				KEY_LEN * 8,
				KEY_LEN,
				key.len()
			),
		));
	}
	DigestMacExecutor::<M>::boxed(key, "CMAC")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn key_length_outside_aes_sizes_is_rejected() {
		let err = validate_cmac_key_length(&[0u8; 20])
			.expect_err("20-byte key");
		assert_eq!(err.kind(), MacErrorKind::InvalidKeyLength);
		assert!(err.message().contains("received 20"));
	}

	#[test]
	fn key_must_match_variant() {
		let err = create_cmac::<CmacAes256, 32>(&[0u8; 16])
			.err()
			.expect("aes128 key for aes256 variant");
		assert!(err.message().contains("CMAC-AES256"));
	}
}
