// SPDX-License-Identifier: MIT OR Apache-2.0
// Project: keysetmac
// File: wrapped.rs
// Author: keysetmac maintainers

//! MAC over a whole primitive set.

use std::fmt;
use std::sync::Arc;

use super::registry::{MacError, MacErrorKind};
use super::Mac;
use crate::ksm::config::{LegacyMacPolicy, LEGACY_COMPUTE_ENV};
use crate::ksm::cryptofmt::NON_RAW_PREFIX_SIZE;
use crate::ksm::keyset::OutputPrefixType;
use crate::ksm::primitiveset::PrimitiveSet;

/// Computes tags with the primary entry and verifies them against every
/// entry of the set.
///
/// Cloning is cheap; clones share the primitive set and the legacy policy.
pub struct WrappedMac<P = Box<dyn Mac>> {
	primitives: Arc<PrimitiveSet<P>>,
	policy: LegacyMacPolicy,
}

impl<P> Clone for WrappedMac<P> {
	fn clone(&self) -> Self {
		Self {
			primitives: Arc::clone(&self.primitives),
			policy: self.policy.clone(),
		}
	}
}

impl<P: Mac> WrappedMac<P> {
	pub fn new(
		primitives: PrimitiveSet<P>,
		policy: LegacyMacPolicy,
	) -> Self {
		tracing::debug!(
			primary_key_id = primitives.primary().key_id(),
			entries = primitives.len(),
			"wrapped keyset mac"
		);
		Self {
			primitives: Arc::new(primitives),
			policy,
		}
	}

	pub fn primitives(&self) -> &PrimitiveSet<P> {
		&self.primitives
	}

	pub fn policy(&self) -> &LegacyMacPolicy {
		&self.policy
	}
}

impl<P: Mac> Mac for WrappedMac<P> {
	/// Returns the primary's prefix followed by the primary's tag over `data`.
	fn compute_mac(&self, data: &[u8]) -> Result<Vec<u8>, MacError> {
		let primary = self.primitives.primary();
		if primary.prefix_type() == OutputPrefixType::Legacy {
			if !self.policy.is_enabled() {
				return Err(MacError::new(
					MacErrorKind::LegacyComputeDisabled,
					format!(
						"keyset mac: computation of old LEGACY MACs is disabled, to enable set {}=true",
						LEGACY_COMPUTE_ENV
					),
				));
			}
			tracing::debug!(
				key_id = primary.key_id(),
				"computing MAC in the old LEGACY format"
			);
		}
		let mac = primary.primitive().compute_mac(data)?;
		let mut tag =
			Vec::with_capacity(primary.prefix().len() + mac.len());
		tag.extend_from_slice(primary.prefix());
		tag.extend_from_slice(&mac);
		Ok(tag)
	}

	/// Tries the entries registered under the tag's prefix, then every raw
	/// entry with the full tag. Every failure yields the same error.
	fn verify_mac(
		&self,
		mac: &[u8],
		data: &[u8],
	) -> Result<(), MacError> {
		// Also rejects raw tags of five bytes or fewer.
		if mac.len() <= NON_RAW_PREFIX_SIZE {
			return Err(MacError::invalid_mac());
		}

		let (prefix, body) = mac.split_at(NON_RAW_PREFIX_SIZE);
		for entry in self.primitives.entries_for_prefix(prefix) {
			if entry.primitive().verify_mac(body, data).is_ok() {
				return Ok(());
			}
		}

		for entry in self.primitives.raw_entries() {
			if entry.primitive().verify_mac(mac, data).is_ok() {
				return Ok(());
			}
		}

		tracing::debug!("keyset mac verification failed");
		Err(MacError::invalid_mac())
	}
}

impl<P> fmt::Debug for WrappedMac<P> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("WrappedMac")
			.field("primitives", &self.primitives)
			.field("policy", &self.policy)
			.finish()
	}
}
