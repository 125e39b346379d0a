// SPDX-License-Identifier: MIT OR Apache-2.0
// Project: keysetmac
// File: config.rs
// Author: keysetmac maintainers

//! Runtime configuration and the legacy-compute policy shared by wrappers.

use std::env;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Environment variable that toggles computing tags in the old LEGACY format.
pub const LEGACY_COMPUTE_ENV: &str = "KSM_ENABLE_COMPUTE_OLD_LEGACY_MAC";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacConfig {
	/// Lets wrappers compute MACs for LEGACY keys in the old format.
	pub enable_compute_old_legacy_mac: bool,
}

impl Default for MacConfig {
	fn default() -> Self {
		Self {
			enable_compute_old_legacy_mac: true,
		}
	}
}

impl MacConfig {
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| env::var(name).ok())
	}

	/// Builds a config from `lookup`, which maps variable names to values.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let mut config = Self::default();
		if let Some(value) = lookup(LEGACY_COMPUTE_ENV) {
			config.enable_compute_old_legacy_mac =
				parse_flag(LEGACY_COMPUTE_ENV, &value)?;
		}
		Ok(config)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
	InvalidFlag {
		variable: &'static str,
		value: String,
	},
}

impl fmt::Display for ConfigError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ConfigError::InvalidFlag { variable, value } => write!(
				f,
				"{} must be one of true/false/1/0/yes/no/on/off (got `{}`)",
				variable, value
			),
		}
	}
}

impl std::error::Error for ConfigError {}

pub fn parse_flag(
	variable: &'static str,
	value: &str,
) -> Result<bool, ConfigError> {
	match value.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(true),
		"0" | "false" | "no" | "off" => Ok(false),
		_ => Err(ConfigError::InvalidFlag {
			variable,
			value: value.to_string(),
		}),
	}
}

/// Shared switch deciding whether LEGACY-format tags may still be produced.
///
/// Clones observe each other's updates. Reads are atomic but unordered with
/// respect to in-flight computations.
#[derive(Clone)]
pub struct LegacyMacPolicy {
	enabled: Arc<AtomicBool>,
}

impl LegacyMacPolicy {
	pub fn new(enabled: bool) -> Self {
		Self {
			enabled: Arc::new(AtomicBool::new(enabled)),
		}
	}

	pub fn from_config(config: &MacConfig) -> Self {
		Self::new(config.enable_compute_old_legacy_mac)
	}

	/// Process-wide policy, initialised once from the environment.
	///
	/// An unparsable environment value disables legacy compute.
	pub fn global() -> Self {
		static GLOBAL: OnceLock<LegacyMacPolicy> = OnceLock::new();
		GLOBAL
			.get_or_init(|| {
				Self::from_config_or_disabled(MacConfig::from_env())
			})
			.clone()
	}

	fn from_config_or_disabled(
		config: Result<MacConfig, ConfigError>,
	) -> Self {
		match config {
			Ok(config) => Self::from_config(&config),
			Err(err) => {
				tracing::warn!("{}; disabling legacy MAC compute", err);
				Self::new(false)
			}
		}
	}

	pub fn is_enabled(&self) -> bool {
		self.enabled.load(Ordering::Relaxed)
	}

	pub fn set_enabled(&self, enabled: bool) {
		self.enabled.store(enabled, Ordering::Relaxed);
	}
}

impl fmt::Debug for LegacyMacPolicy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("LegacyMacPolicy")
			.field("enabled", &self.is_enabled())
			.finish()
	}
}
