// SPDX-License-Identifier: MIT OR Apache-2.0
// Project: keysetmac
// File: hmac.rs
// Author: keysetmac maintainers

//! HMAC key types covering SHA-1 (legacy) and SHA-2/SHA-3 variants, plus the
//! executor shared by every algorithm built on the `digest::Mac` trait.

use super::registry::{
	MacAlgorithm, MacAlgorithmMetadata, MacError, MacErrorKind,
	MacExecutor,
};
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha512};
use sha3::{Sha3_256, Sha3_512};

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;
type HmacSha512 = Hmac<Sha512>;
type HmacSha3_256 = Hmac<Sha3_256>;
type HmacSha3_512 = Hmac<Sha3_512>;

/// Shortest HMAC key accepted into a keyset.
pub const MIN_KEY_SIZE: usize = 16;

pub fn catalog() -> &'static [MacAlgorithm] {
	const ALGORITHMS: &[MacAlgorithm] = &[
		MacAlgorithm::new(
			MacAlgorithmMetadata::legacy("hmac-sha1", "HMAC-SHA1", 20),
			create_hmac::<HmacSha1>,
		),
		MacAlgorithm::new(
			MacAlgorithmMetadata::current(
				"hmac-sha256",
				"HMAC-SHA256",
				32,
			),
			create_hmac::<HmacSha256>,
		),
		MacAlgorithm::new(
			MacAlgorithmMetadata::current(
				"hmac-sha512",
				"HMAC-SHA512",
				64,
			),
			create_hmac::<HmacSha512>,
		),
		MacAlgorithm::new(
			MacAlgorithmMetadata::current(
				"hmac-sha3-256",
				"HMAC-SHA3-256",
				32,
			),
			create_hmac::<HmacSha3_256>,
		),
		MacAlgorithm::new(
			MacAlgorithmMetadata::current(
				"hmac-sha3-512",
				"HMAC-SHA3-512",
				64,
			),
			create_hmac::<HmacSha3_512>,
		),
	];
	ALGORITHMS
}

/// Executor over any RustCrypto MAC (HMAC, CMAC).
pub(super) struct DigestMacExecutor<M> {
	inner: M,
}

impl<M> DigestMacExecutor<M>
where
	M: Mac + KeyInit + Send + 'static,
{
	pub(super) fn boxed(
		key: &[u8],
		label: &'static str,
	) -> Result<Box<dyn MacExecutor>, MacError> {
		let inner = <M as KeyInit>::new_from_slice(key).map_err(|_| {
			MacError::new(
				MacErrorKind::InvalidKeyLength,
				format!("{} failed to initialize with provided key", label),
			)
		})?;
		Ok(Box::new(Self { inner }))
	}
}

impl<M> MacExecutor for DigestMacExecutor<M>
where
	M: Mac + Send + 'static,
{
	fn update(&mut self, data: &[u8]) {
		Mac::update(&mut self.inner, data);
	}

	fn finalize(self: Box<Self>) -> Vec<u8> {
		Mac::finalize(self.inner).into_bytes().to_vec()
	}
}

fn create_hmac<M>(
	key: &[u8],
) -> Result<Box<dyn MacExecutor>, MacError>
where
	M: Mac + KeyInit + Send + 'static,
{
	if key.len() < MIN_KEY_SIZE {
		return Err(MacError::new(
			MacErrorKind::InvalidKeyLength,
			format!(
				"HMAC key must be at least {} bytes but received {}",
				MIN_KEY_SIZE,
				key.len()
			),
		));
	}
	DigestMacExecutor::<M>::boxed(key, "HMAC")
}
