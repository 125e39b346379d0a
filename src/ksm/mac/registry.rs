// SPDX-License-Identifier: MIT OR Apache-2.0
// Project: keysetmac
// File: registry.rs
// Author: keysetmac maintainers

//! Key-manager registry: algorithm catalog, error type, and the dispatch that
//! turns key data from a keyset into a runnable MAC primitive.

use std::borrow::Cow;

use super::primitive::KeyedMac;
use super::{blake3, cmac, hmac, kmac, Mac};
use crate::ksm::keyset::KeyData;

/// Single-use streaming state for one tag computation.
pub trait MacExecutor: Send + 'static {
	fn update(&mut self, data: &[u8]);
	fn finalize(self: Box<Self>) -> Vec<u8>;
}

#[derive(Clone, Copy, Debug)]
pub struct MacAlgorithmMetadata {
	pub identifier: &'static str,
	pub display_name: &'static str,
	pub legacy: bool,
	/// Untruncated tag length in bytes.
	pub output_size: usize,
}

impl MacAlgorithmMetadata {
	pub const fn new(
		identifier: &'static str,
		display_name: &'static str,
		legacy: bool,
		output_size: usize,
	) -> Self {
		Self {
			identifier,
			display_name,
			legacy,
			output_size,
		}
	}

	pub const fn legacy(
		identifier: &'static str,
		display_name: &'static str,
		output_size: usize,
	) -> Self {
		Self::new(identifier, display_name, true, output_size)
	}

	pub const fn current(
		identifier: &'static str,
		display_name: &'static str,
		output_size: usize,
	) -> Self {
		Self::new(identifier, display_name, false, output_size)
	}

	pub fn is_legacy(&self) -> bool {
		self.legacy
	}
}

/// Builds a fresh executor from raw key bytes, validating the key on the way.
pub type MacFactory =
	fn(&[u8]) -> Result<Box<dyn MacExecutor>, MacError>;

#[derive(Clone, Copy)]
pub struct MacAlgorithm {
	pub metadata: MacAlgorithmMetadata,
	pub factory: MacFactory,
}

impl MacAlgorithm {
	pub const fn new(
		metadata: MacAlgorithmMetadata,
		factory: MacFactory,
	) -> Self {
		Self { metadata, factory }
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacErrorKind {
	/// The key type does not resolve to a MAC primitive.
	NotMacPrimitive,
	InvalidKey,
	InvalidKeyLength,
	InvalidTagSize,
	InvalidKeyset,
	LegacyComputeDisabled,
	Crypto,
	/// Verification failed. Deliberately carries no detail.
	InvalidMac,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacError {
	kind: MacErrorKind,
	message: Cow<'static, str>,
}

const INVALID_MAC_MESSAGE: &str = "keyset mac: invalid mac";

impl MacError {
	pub fn new(
		kind: MacErrorKind,
		message: impl Into<Cow<'static, str>>,
	) -> Self {
		Self {
			kind,
			message: message.into(),
		}
	}

	/// The one error every failed verification returns.
	pub fn invalid_mac() -> Self {
		Self::new(MacErrorKind::InvalidMac, INVALID_MAC_MESSAGE)
	}

	pub fn kind(&self) -> MacErrorKind {
		self.kind
	}

	pub fn message(&self) -> &str {
		self.message.as_ref()
	}
}

impl std::fmt::Display for MacError {
	fn fmt(
		&self,
		f: &mut std::fmt::Formatter<'_>,
	) -> std::fmt::Result {
		write!(f, "{}", self.message)
	}
}

impl std::error::Error for MacError {}

pub fn algorithms() -> impl Iterator<Item = &'static MacAlgorithm> {
	hmac::catalog()
		.iter()
		.chain(cmac::catalog().iter())
		.chain(kmac::catalog().iter())
		.chain(blake3::catalog().iter())
}

pub fn metadata() -> Vec<MacAlgorithmMetadata> {
	algorithms().map(|alg| alg.metadata).collect()
}

pub fn find_algorithm(
	identifier: &str,
) -> Option<&'static MacAlgorithm> {
	algorithms().find(|alg| {
		alg.metadata.identifier.eq_ignore_ascii_case(identifier)
	})
}

/// Resolves key data of a particular algorithm into a MAC primitive.
pub trait KeyManager: Send + Sync {
	fn does_support(&self, algorithm: &str) -> bool;
	fn primitive(&self, key: &KeyData)
		-> Result<Box<dyn Mac>, MacError>;
}

/// Key manager backed by the built-in algorithm catalog.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegistryKeyManager;

impl KeyManager for RegistryKeyManager {
	fn does_support(&self, algorithm: &str) -> bool {
		find_algorithm(algorithm).is_some()
	}

	fn primitive(
		&self,
		key: &KeyData,
	) -> Result<Box<dyn Mac>, MacError> {
		let algorithm =
			find_algorithm(key.algorithm()).ok_or_else(|| {
				MacError::new(
					MacErrorKind::NotMacPrimitive,
					format!(
						"`{}` is not a MAC key type",
						key.algorithm()
					),
				)
			})?;
		let mac =
			KeyedMac::new(algorithm, key.key_value(), key.tag_size())?;
		Ok(Box::new(mac))
	}
}

/// Resolves `key`, preferring `custom` when it supports the algorithm.
pub fn primitive_for_key(
	key: &KeyData,
	custom: Option<&dyn KeyManager>,
) -> Result<Box<dyn Mac>, MacError> {
	match custom {
		Some(manager) if manager.does_support(key.algorithm()) => {
			manager.primitive(key)
		}
		_ => RegistryKeyManager.primitive(key),
	}
}
