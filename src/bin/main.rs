// SPDX-License-Identifier: MIT OR Apache-2.0
// Project: keysetmac
// File: main.rs
// Author: keysetmac maintainers

use std::process::ExitCode;

use keysetmac::ksm::app;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| EnvFilter::new("warn")),
		)
		.with_writer(std::io::stderr)
		.init();

	match app::run() {
		Ok(code) => code,
		Err(err) => {
			eprintln!("error: {}", err);
			ExitCode::from(2)
		}
	}
}
