// SPDX-License-Identifier: MIT OR Apache-2.0
// Project: keysetmac
// Module: mac (message authentication codes)
// Author: keysetmac maintainers

//! Keyset-backed message authentication codes.
//!
//! [`new`] resolves a [`KeysetHandle`] into a primitive set and wraps it in a
//! [`WrappedMac`], which computes tags with the primary key and verifies tags
//! against every key of the keyset. Submodules provide the key-manager
//! registry, the algorithm key types, and the CLI handlers.

use std::sync::Arc;

use crate::ksm::config::LegacyMacPolicy;
use crate::ksm::keyset::KeysetHandle;

pub mod blake3;
pub mod cmac;
pub mod commands;
pub mod hmac;
pub mod kmac;
pub mod primitive;
pub mod registry;
pub mod wrapped;

pub use primitive::{KeyedMac, MIN_TAG_SIZE};
pub use registry::{
	KeyManager, MacError, MacErrorKind, RegistryKeyManager,
};
pub use wrapped::WrappedMac;

/// Computes and verifies authentication tags.
///
/// Implementations must be usable from several threads at once.
pub trait Mac: Send + Sync {
	fn compute_mac(&self, data: &[u8]) -> Result<Vec<u8>, MacError>;
	fn verify_mac(&self, mac: &[u8], data: &[u8])
		-> Result<(), MacError>;
}

impl<M: Mac + ?Sized> Mac for Box<M> {
	fn compute_mac(&self, data: &[u8]) -> Result<Vec<u8>, MacError> {
		(**self).compute_mac(data)
	}

	fn verify_mac(
		&self,
		mac: &[u8],
		data: &[u8],
	) -> Result<(), MacError> {
		(**self).verify_mac(mac, data)
	}
}

impl<M: Mac + ?Sized> Mac for Arc<M> {
	fn compute_mac(&self, data: &[u8]) -> Result<Vec<u8>, MacError> {
		(**self).compute_mac(data)
	}

	fn verify_mac(
		&self,
		mac: &[u8],
		data: &[u8],
	) -> Result<(), MacError> {
		(**self).verify_mac(mac, data)
	}
}

/// Creates a MAC primitive from the given keyset handle.
pub fn new(handle: &KeysetHandle) -> Result<WrappedMac, MacError> {
	new_with_key_manager(handle, None)
}

/// Creates a MAC primitive, consulting `key_manager` before the built-in
/// registry for the algorithms it supports.
pub fn new_with_key_manager(
	handle: &KeysetHandle,
	key_manager: Option<&dyn KeyManager>,
) -> Result<WrappedMac, MacError> {
	new_with_policy(handle, key_manager, LegacyMacPolicy::global())
}

/// Creates a MAC primitive with an explicit legacy-compute policy.
pub fn new_with_policy(
	handle: &KeysetHandle,
	key_manager: Option<&dyn KeyManager>,
	policy: LegacyMacPolicy,
) -> Result<WrappedMac, MacError> {
	let primitives = handle
		.primitives_with_key_manager(key_manager)
		.map_err(|err| {
			MacError::new(
				err.kind(),
				format!(
					"keyset mac: cannot obtain primitive set: {}",
					err
				),
			)
		})?;
	Ok(WrappedMac::new(primitives, policy))
}
