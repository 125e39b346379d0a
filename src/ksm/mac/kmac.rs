// SPDX-License-Identifier: MIT OR Apache-2.0
// Project: keysetmac
// File: kmac.rs
// Author: keysetmac maintainers

//! KMAC (NIST SP 800-185) key types for the 128- and 256-bit variants.
//!
//! The output length is fixed at 32 bytes for KMAC128 and 64 bytes for
//! KMAC256. A key configured with a shorter `tag_size` emits a prefix of that
//! output, so its tags are not the standard SP 800-185 KMAC for the shorter
//! length, which would encode the shorter length itself.

use super::registry::{
	MacAlgorithm, MacAlgorithmMetadata, MacError, MacErrorKind,
	MacExecutor,
};
use sha3::digest::{ExtendableOutput, Update};
use sha3::{CShake128, CShake128Core, CShake256, CShake256Core};

const KMAC128_RATE: usize = 168; // bytes
const KMAC256_RATE: usize = 136; // bytes
const CUSTOMIZATION: &[u8] = b"";
const FUNCTION_NAME: &[u8] = b"KMAC";
const OUTPUT_LEN_128: usize = 32;
const OUTPUT_LEN_256: usize = 64;

pub fn catalog() -> &'static [MacAlgorithm] {
	const ALGORITHMS: &[MacAlgorithm] = &[
		MacAlgorithm::new(
			MacAlgorithmMetadata::current(
				"kmac128",
				"KMAC128",
				OUTPUT_LEN_128,
			),
			create_kmac128,
		),
		MacAlgorithm::new(
			MacAlgorithmMetadata::current(
				"kmac256",
				"KMAC256",
				OUTPUT_LEN_256,
			),
			create_kmac256,
		),
	];
	ALGORITHMS
}

struct KmacExecutor<H> {
	state: H,
	output_len: usize,
}

impl<H> KmacExecutor<H>
where
	H: Update + ExtendableOutput + Send + 'static,
{
	fn keyed(
		mut state: H,
		key: &[u8],
		rate: usize,
		output_len: usize,
	) -> Box<dyn MacExecutor> {
		state.update(&bytepad(&encode_string(key), rate));
		Box::new(Self { state, output_len })
	}
}

impl<H> MacExecutor for KmacExecutor<H>
where
	H: Update + ExtendableOutput + Send + 'static,
{
	fn update(&mut self, data: &[u8]) {
		Update::update(&mut self.state, data);
	}

	fn finalize(self: Box<Self>) -> Vec<u8> {
		let KmacExecutor {
			mut state,
			output_len,
		} = *self;
		state.update(&right_encode((output_len as u64) * 8));
		let mut out = vec![0u8; output_len];
		state.finalize_xof_into(&mut out);
		out
	}
}

fn ensure_key(key: &[u8], label: &str) -> Result<(), MacError> {
	if key.is_empty() {
		return Err(MacError::new(
			MacErrorKind::InvalidKey,
			format!("{} key must not be empty", label),
		));
	}
	Ok(())
}

fn create_kmac128(
	key: &[u8],
) -> Result<Box<dyn MacExecutor>, MacError> {
	ensure_key(key, "KMAC128")?;
	let core = CShake128Core::new_with_function_name(
		FUNCTION_NAME,
		CUSTOMIZATION,
	);
	Ok(KmacExecutor::keyed(
		CShake128::from_core(core),
		key,
		KMAC128_RATE,
		OUTPUT_LEN_128,
	))
}

fn create_kmac256(
	key: &[u8],
) -> Result<Box<dyn MacExecutor>, MacError> {
	ensure_key(key, "KMAC256")?;
	let core = CShake256Core::new_with_function_name(
		FUNCTION_NAME,
		CUSTOMIZATION,
	);
	Ok(KmacExecutor::keyed(
		CShake256::from_core(core),
		key,
		KMAC256_RATE,
		OUTPUT_LEN_256,
	))
}

fn encode_string(input: &[u8]) -> Vec<u8> {
	let mut result = left_encode((input.len() * 8) as u64);
	result.extend_from_slice(input);
	result
}

fn left_encode(value: u64) -> Vec<u8> {
	let encoded = trim_be_bytes(value);
	let mut out = Vec::with_capacity(1 + encoded.len());
	out.push(encoded.len() as u8);
	out.extend_from_slice(&encoded);
	out
}

fn right_encode(value: u64) -> Vec<u8> {
	let mut out = trim_be_bytes(value);
	out.push(out.len() as u8);
	out
}

fn bytepad(encoded: &[u8], w: usize) -> Vec<u8> {
	let mut result = left_encode(w as u64);
	result.extend_from_slice(encoded);
	let padded = result.len().div_ceil(w) * w;
	result.resize(padded, 0);
	result
}

fn trim_be_bytes(value: u64) -> Vec<u8> {
	let bytes = value.to_be_bytes();
	let first = bytes
		.iter()
		.position(|&b| b != 0)
		.unwrap_or(bytes.len() - 1);
	bytes[first..].to_vec()
}
