// SPDX-License-Identifier: MIT OR Apache-2.0
// Project: keysetmac
// File: primitiveset.rs
// Author: keysetmac maintainers

//! Immutable set of key-bound primitives, indexed by output prefix.
//!
//! A [`PrimitiveSet`] is assembled once through [`PrimitiveSetBuilder`] and is
//! read-only afterwards, so it can be shared between threads without locking.
//! Entries sharing a prefix keep their insertion order, which is the order in
//! which verification tries them. Raw entries live under the empty prefix.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::ksm::cryptofmt::{self, RAW_PREFIX};
use crate::ksm::keyset::{KeyStatus, KeysetKey, OutputPrefixType};
use crate::ksm::mac::{MacError, MacErrorKind};

/// A primitive bound to the metadata of the key it was built from.
pub struct Entry<P> {
	key_id: u32,
	primitive: P,
	prefix: Vec<u8>,
	prefix_type: OutputPrefixType,
	status: KeyStatus,
}

impl<P> Entry<P> {
	pub fn key_id(&self) -> u32 {
		self.key_id
	}

	pub fn primitive(&self) -> &P {
		&self.primitive
	}

	/// Empty for raw entries, `NON_RAW_PREFIX_SIZE` bytes otherwise.
	pub fn prefix(&self) -> &[u8] {
		&self.prefix
	}

	pub fn prefix_type(&self) -> OutputPrefixType {
		self.prefix_type
	}

	pub fn status(&self) -> KeyStatus {
		self.status
	}
}

impl<P> fmt::Debug for Entry<P> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Entry")
			.field("key_id", &self.key_id)
			.field("prefix", &hex::encode(&self.prefix))
			.field("prefix_type", &self.prefix_type)
			.field("status", &self.status)
			.finish_non_exhaustive()
	}
}

pub struct PrimitiveSet<P> {
	primary: Arc<Entry<P>>,
	entries: HashMap<Vec<u8>, Vec<Arc<Entry<P>>>>,
	len: usize,
}

impl<P> PrimitiveSet<P> {
	pub fn builder() -> PrimitiveSetBuilder<P> {
		PrimitiveSetBuilder::new()
	}

	pub fn primary(&self) -> &Arc<Entry<P>> {
		&self.primary
	}

	/// Entries whose prefix equals `prefix`, in insertion order. Unknown
	/// prefixes yield an empty slice.
	pub fn entries_for_prefix(&self, prefix: &[u8]) -> &[Arc<Entry<P>>] {
		self.entries
			.get(prefix)
			.map(Vec::as_slice)
			.unwrap_or_default()
	}

	pub fn raw_entries(&self) -> &[Arc<Entry<P>>] {
		self.entries_for_prefix(RAW_PREFIX)
	}

	pub fn len(&self) -> usize {
		self.len
	}

	pub fn is_empty(&self) -> bool {
		self.len == 0
	}
}

impl<P> fmt::Debug for PrimitiveSet<P> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PrimitiveSet")
			.field("primary", &self.primary)
			.field("len", &self.len)
			.finish_non_exhaustive()
	}
}

pub struct PrimitiveSetBuilder<P> {
	primary: Option<Arc<Entry<P>>>,
	entries: HashMap<Vec<u8>, Vec<Arc<Entry<P>>>>,
	len: usize,
}

impl<P> Default for PrimitiveSetBuilder<P> {
	fn default() -> Self {
		Self::new()
	}
}

impl<P> PrimitiveSetBuilder<P> {
	pub fn new() -> Self {
		Self {
			primary: None,
			entries: HashMap::new(),
			len: 0,
		}
	}

	/// Adds `primitive` for an enabled `key`.
	pub fn add(
		&mut self,
		primitive: P,
		key: &KeysetKey,
	) -> Result<Arc<Entry<P>>, MacError> {
		if key.status != KeyStatus::Enabled {
			return Err(MacError::new(
				MacErrorKind::InvalidKeyset,
				format!(
					"primitive set: key {} is not enabled",
					key.key_id
				),
			));
		}
		let entry = Arc::new(Entry {
			key_id: key.key_id,
			primitive,
			prefix: cryptofmt::output_prefix(
				key.key_id,
				key.output_prefix_type,
			),
			prefix_type: key.output_prefix_type,
			status: key.status,
		});
		self.entries
			.entry(entry.prefix.clone())
			.or_default()
			.push(Arc::clone(&entry));
		self.len += 1;
		Ok(entry)
	}

	/// Adds `primitive` and designates it as the primary.
	pub fn add_primary(
		&mut self,
		primitive: P,
		key: &KeysetKey,
	) -> Result<Arc<Entry<P>>, MacError> {
		if self.primary.is_some() {
			return Err(MacError::new(
				MacErrorKind::InvalidKeyset,
				"primitive set: primary already designated",
			));
		}
		let entry = self.add(primitive, key)?;
		self.primary = Some(Arc::clone(&entry));
		Ok(entry)
	}

	pub fn build(self) -> Result<PrimitiveSet<P>, MacError> {
		let primary = self.primary.ok_or_else(|| {
			MacError::new(
				MacErrorKind::InvalidKeyset,
				"primitive set: no primary designated",
			)
		})?;
		Ok(PrimitiveSet {
			primary,
			entries: self.entries,
			len: self.len,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ksm::keyset::KeyData;

	fn key(
		key_id: u32,
		prefix_type: OutputPrefixType,
	) -> KeysetKey {
		KeysetKey::new(
			key_id,
			KeyStatus::Enabled,
			prefix_type,
			KeyData::new("hmac-sha256", vec![0u8; 32], None),
		)
	}

	#[test]
	fn build_without_primary_fails() {
		let mut builder = PrimitiveSetBuilder::new();
		builder
			.add("a", &key(1, OutputPrefixType::Tink))
			.expect("add");
		let err = builder.build().expect_err("no primary");
		assert_eq!(err.kind(), MacErrorKind::InvalidKeyset);
	}

	#[test]
	fn second_primary_is_rejected() {
		let mut builder = PrimitiveSetBuilder::new();
		builder
			.add_primary("a", &key(1, OutputPrefixType::Tink))
			.expect("primary");
		assert!(builder
			.add_primary("b", &key(2, OutputPrefixType::Tink))
			.is_err());
	}

	#[test]
	fn disabled_key_is_rejected() {
		let mut disabled = key(3, OutputPrefixType::Tink);
		disabled.status = KeyStatus::Disabled;
		let mut builder = PrimitiveSetBuilder::<&str>::new();
		assert!(builder.add("c", &disabled).is_err());
	}

	#[test]
	fn lookups_preserve_insertion_order() {
		let mut builder = PrimitiveSetBuilder::new();
		builder
			.add("legacy", &key(9, OutputPrefixType::Legacy))
			.expect("add");
		builder
			.add_primary("tink", &key(9, OutputPrefixType::Tink))
			.expect("primary");
		builder
			.add("crunchy", &key(9, OutputPrefixType::Crunchy))
			.expect("add");
		builder
			.add("raw-1", &key(10, OutputPrefixType::Raw))
			.expect("add");
		builder
			.add("raw-2", &key(11, OutputPrefixType::Raw))
			.expect("add");
		let set = builder.build().expect("set");

		assert_eq!(set.len(), 5);
		assert_eq!(*set.primary().primitive(), "tink");

		let zero_prefixed: Vec<&str> = set
			.entries_for_prefix(&[0, 0, 0, 0, 9])
			.iter()
			.map(|entry| *entry.primitive())
			.collect();
		assert_eq!(zero_prefixed, vec!["legacy", "crunchy"]);

		let raw: Vec<&str> = set
			.raw_entries()
			.iter()
			.map(|entry| *entry.primitive())
			.collect();
		assert_eq!(raw, vec!["raw-1", "raw-2"]);
		assert!(set.raw_entries().iter().all(|e| e.prefix().is_empty()));
	}

	#[test]
	fn unknown_prefix_yields_empty_slice() {
		let mut builder = PrimitiveSetBuilder::new();
		builder
			.add_primary("a", &key(1, OutputPrefixType::Tink))
			.expect("primary");
		let set = builder.build().expect("set");
		assert!(set.entries_for_prefix(&[1, 0, 0, 0, 2]).is_empty());
		assert!(set.raw_entries().is_empty());
	}
}
