//! pgpdesk - orchestration core for a PGP workbench
//!
//! This crate provides the pieces a PGP front end drives: input validation,
//! a thin wrapper over rPGP, one controller per user flow (encrypt, decrypt,
//! sign, verify, inspect, generate) and helpers that wipe sensitive fields.

pub mod cli;
pub mod config;
pub mod controllers;
pub mod core;
pub mod crypto;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// Re-export commonly used items for convenience
pub use crate::config::Settings;
pub use controllers::{
    DecryptController, EncryptController, GenerateController, InspectController, SignController,
    VerifyController, VerifyMode,
};
pub use crate::core::error::{ErrorCategory, PgpError};
pub use crate::core::flow::FlowState;
pub use types::{KeyInfo, OperationResult};

/// Initialize logging
///
/// `RUST_LOG` wins over `default_filter` when set. Records emitted through
/// the `log` facade are forwarded to the same subscriber.
pub fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(default_filter)
            .unwrap_or_else(|_| EnvFilter::new(tracing::Level::INFO.to_string()))
    });

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}
