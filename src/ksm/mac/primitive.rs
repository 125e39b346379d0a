// SPDX-License-Identifier: MIT OR Apache-2.0
// Project: keysetmac
// File: primitive.rs
// Author: keysetmac maintainers

//! Key-bound MAC primitive built from a catalog algorithm.

use std::fmt;

use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::registry::{
	MacAlgorithm, MacAlgorithmMetadata, MacError, MacErrorKind,
	MacExecutor,
};
use super::Mac;

/// Shortest tag a key may be configured to emit.
pub const MIN_TAG_SIZE: usize = 10;

/// One algorithm bound to one key, emitting tags truncated to `tag_size`.
pub struct KeyedMac {
	algorithm: &'static MacAlgorithm,
	key: Zeroizing<Vec<u8>>,
	tag_size: usize,
}

impl KeyedMac {
	/// Binds `key` to `algorithm`. `tag_size` defaults to the full output.
	pub fn new(
		algorithm: &'static MacAlgorithm,
		key: &[u8],
		tag_size: Option<usize>,
	) -> Result<Self, MacError> {
		let metadata = &algorithm.metadata;
		let tag_size = tag_size.unwrap_or(metadata.output_size);
		if !(MIN_TAG_SIZE..=metadata.output_size).contains(&tag_size) {
			return Err(MacError::new(
				MacErrorKind::InvalidTagSize,
				format!(
					"{} tag size must be between {} and {} bytes but was {}",
					metadata.display_name,
					MIN_TAG_SIZE,
					metadata.output_size,
					tag_size
				),
			));
		}
		// Runs the factory once so bad key material fails here.
		(algorithm.factory)(key)?;
		if metadata.is_legacy() {
			tracing::warn!(
				algorithm = metadata.identifier,
				"{} is considered legacy; prefer SHA-2, SHA-3, KMAC, or BLAKE3 keyed alternatives",
				metadata.display_name
			);
		}
		Ok(Self {
			algorithm,
			key: Zeroizing::new(key.to_vec()),
			tag_size,
		})
	}

	pub fn metadata(&self) -> &MacAlgorithmMetadata {
		&self.algorithm.metadata
	}

	pub fn tag_size(&self) -> usize {
		self.tag_size
	}

	fn tag(&self, data: &[u8]) -> Result<Vec<u8>, MacError> {
		let mut executor: Box<dyn MacExecutor> =
			(self.algorithm.factory)(&self.key)?;
		executor.update(data);
		let mut tag = executor.finalize();
		tag.truncate(self.tag_size);
		Ok(tag)
	}
}

impl Mac for KeyedMac {
	fn compute_mac(&self, data: &[u8]) -> Result<Vec<u8>, MacError> {
		self.tag(data)
	}

	fn verify_mac(
		&self,
		mac: &[u8],
		data: &[u8],
	) -> Result<(), MacError> {
		if mac.len() != self.tag_size {
			return Err(MacError::invalid_mac());
		}
		let expected = self.tag(data)?;
		if bool::from(expected.ct_eq(mac)) {
			Ok(())
		} else {
			Err(MacError::invalid_mac())
		}
	}
}

impl fmt::Debug for KeyedMac {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("KeyedMac")
			.field("algorithm", &self.algorithm.metadata.identifier)
			.field("tag_size", &self.tag_size)
			.finish_non_exhaustive()
	}
}
