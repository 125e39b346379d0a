// SPDX-License-Identifier: MIT OR Apache-2.0
// Project: keysetmac
// File: keyset/mod.rs
// Author: keysetmac maintainers
//
// Keyset model, validation, and resolution into primitive sets.

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::ksm::mac::registry::{self, KeyManager};
use crate::ksm::mac::{Mac, MacError, MacErrorKind};
use crate::ksm::primitiveset::{PrimitiveSet, PrimitiveSetBuilder};

pub mod reader;

pub use reader::{load_keyset, KeysetReadError, KeysetSource};

/// Tag framing convention of a key.
#[derive(
	Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputPrefixType {
	Raw,
	Tink,
	Legacy,
	Crunchy,
}

impl fmt::Display for OutputPrefixType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			OutputPrefixType::Raw => "raw",
			OutputPrefixType::Tink => "tink",
			OutputPrefixType::Legacy => "legacy",
			OutputPrefixType::Crunchy => "crunchy",
		})
	}
}

#[derive(
	Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum KeyStatus {
	Enabled,
	Disabled,
	Destroyed,
}

/// Algorithm identifier plus secret key material.
#[derive(Clone)]
pub struct KeyData {
	algorithm: String,
	key_value: Zeroizing<Vec<u8>>,
	tag_size: Option<usize>,
}

impl KeyData {
	pub fn new(
		algorithm: impl Into<String>,
		key_value: Vec<u8>,
		tag_size: Option<usize>,
	) -> Self {
		Self {
			algorithm: algorithm.into(),
			key_value: Zeroizing::new(key_value),
			tag_size,
		}
	}

	pub fn algorithm(&self) -> &str {
		&self.algorithm
	}

	pub fn key_value(&self) -> &[u8] {
		self.key_value.as_slice()
	}

	/// Configured tag length; `None` means the algorithm's full output.
	pub fn tag_size(&self) -> Option<usize> {
		self.tag_size
	}
}

impl fmt::Debug for KeyData {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("KeyData")
			.field("algorithm", &self.algorithm)
			.field("key_value", &"<redacted>")
			.field("tag_size", &self.tag_size)
			.finish()
	}
}

#[derive(Debug, Clone)]
pub struct KeysetKey {
	pub key_id: u32,
	pub status: KeyStatus,
	pub output_prefix_type: OutputPrefixType,
	pub key_data: KeyData,
}

impl KeysetKey {
	pub fn new(
		key_id: u32,
		status: KeyStatus,
		output_prefix_type: OutputPrefixType,
		key_data: KeyData,
	) -> Self {
		Self {
			key_id,
			status,
			output_prefix_type,
			key_data,
		}
	}
}

#[derive(Debug, Clone)]
pub struct Keyset {
	pub primary_key_id: u32,
	pub keys: Vec<KeysetKey>,
}

fn invalid(message: impl Into<String>) -> MacError {
	MacError::new(MacErrorKind::InvalidKeyset, message.into())
}

/// Checks the structural rules a keyset must satisfy before use.
pub fn validate(keyset: &Keyset) -> Result<(), MacError> {
	if keyset.keys.is_empty() {
		return Err(invalid("empty keyset"));
	}
	let mut has_primary = false;
	let mut enabled = 0usize;
	for key in &keyset.keys {
		validate_key(key)?;
		if key.status != KeyStatus::Enabled {
			continue;
		}
		if key.key_id == keyset.primary_key_id {
			if has_primary {
				return Err(invalid(
					"keyset contains multiple primary keys",
				));
			}
			has_primary = true;
		}
		enabled += 1;
	}
	if enabled == 0 {
		return Err(invalid(
			"keyset must contain at least one ENABLED key",
		));
	}
	if !has_primary {
		return Err(invalid(
			"keyset does not contain a valid primary key",
		));
	}
	Ok(())
}

fn validate_key(key: &KeysetKey) -> Result<(), MacError> {
	if key.key_data.algorithm().trim().is_empty() {
		return Err(invalid(format!(
			"key {} has no algorithm",
			key.key_id
		)));
	}
	if key.status != KeyStatus::Destroyed
		&& key.key_data.key_value().is_empty()
	{
		return Err(invalid(format!(
			"key {} has no key material",
			key.key_id
		)));
	}
	Ok(())
}

/// A validated keyset.
#[derive(Debug, Clone)]
pub struct KeysetHandle {
	keyset: Keyset,
}

impl KeysetHandle {
	pub fn new(keyset: Keyset) -> Result<Self, MacError> {
		validate(&keyset)?;
		Ok(Self { keyset })
	}

	pub fn primary_key_id(&self) -> u32 {
		self.keyset.primary_key_id
	}

	pub fn keys(&self) -> &[KeysetKey] {
		&self.keyset.keys
	}

	/// Resolves every enabled key through the built-in registry.
	pub fn primitives(
		&self,
	) -> Result<PrimitiveSet<Box<dyn Mac>>, MacError> {
		self.primitives_with_key_manager(None)
	}

	/// Resolves every enabled key, consulting `key_manager` first.
	/// Disabled and destroyed keys are skipped.
	pub fn primitives_with_key_manager(
		&self,
		key_manager: Option<&dyn KeyManager>,
	) -> Result<PrimitiveSet<Box<dyn Mac>>, MacError> {
		let mut builder = PrimitiveSetBuilder::new();
		for key in self
			.keys()
			.iter()
			.filter(|key| key.status == KeyStatus::Enabled)
		{
			let primitive =
				registry::primitive_for_key(&key.key_data, key_manager)
					.map_err(|err| {
						MacError::new(
							err.kind(),
							format!("key {}: {}", key.key_id, err),
						)
					})?;
			if key.key_id == self.keyset.primary_key_id {
				builder.add_primary(primitive, key)?;
			} else {
				builder.add(primitive, key)?;
			}
		}
		let primitives = builder.build()?;
		tracing::debug!(
			primary_key_id = self.keyset.primary_key_id,
			entries = primitives.len(),
			skipped = self.keys().len() - primitives.len(),
			"resolved keyset into primitive set"
		);
		Ok(primitives)
	}
}
