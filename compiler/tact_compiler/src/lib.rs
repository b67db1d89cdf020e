//! Tact backend driver.
//!
//! Glues the backend to its consumers: reads program descriptions (directly
//! or as JSON), maps driver configuration onto codegen options and installs
//! logging.
//!
//! # Usage
//!
//! ```ignore
//! use tact_compiler::{compile_json, CompileConfig};
//!
//! let output = compile_json(json, &CompileConfig::default())?;
//! std::fs::write("counter.fc", output.code)?;
//! ```
//!
//! # Architecture
//!
//! ```text
//!            tact_ir
//!               ↓
//!         tact_codegen
//!               ↓
//!        tact_compiler  ← this crate
//! ```

mod cli;
mod output;
mod pipeline;

use std::sync::Once;

pub use cli::{parse_args, CliOptions};
pub use output::{CompileError, CompileOutput};
pub use pipeline::{compile, compile_json, CompileConfig, CompileInput};

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber driven by `RUST_LOG`.
///
/// Does nothing when `RUST_LOG` is unset; safe to call more than once.
///
/// ```bash
/// RUST_LOG=tact_codegen=debug tactc counter.json
/// RUST_LOG=tact_codegen::allocation=trace tactc counter.json
/// ```
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}

#[cfg(test)]
mod tests;
