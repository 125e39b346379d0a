// SPDX-License-Identifier: MIT OR Apache-2.0
// Project: keysetmac
// File: lib.rs
// Author: keysetmac maintainers

pub mod ksm {
	pub mod app;
	pub mod config;
	pub mod cryptofmt;
	pub mod keyset;
	pub mod mac;
	pub mod primitiveset;
}
