//! Error taxonomy for every workbench flow.
//!
//! Library failures are caught at the controller boundary and folded into
//! one of a handful of categories. Each category carries a short message
//! that is safe to show to the user; the underlying library error is only
//! ever logged.

use std::fmt;

/// Broad classes of failure a flow can end in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed or missing armor.
    Format,
    /// Input over the configured size ceiling.
    Size,
    /// Armor was fine but the key could not be parsed or used.
    Key,
    /// Passphrase missing or incorrect.
    Passphrase,
    /// Wrong key, tampered content, or any other library-level failure.
    Crypto,
    /// Form field rules (names, emails, passphrase policy, recipients).
    Validation,
    /// An operation is already running on this form.
    Busy,
    /// Bugs and invariant violations.
    Internal,
}

impl ErrorCategory {
    /// Stable machine-readable code.
    pub const fn code(self) -> &'static str {
        match self {
            Self::Format => "FORMAT_ERROR",
            Self::Size => "SIZE_ERROR",
            Self::Key => "KEY_ERROR",
            Self::Passphrase => "PASSPHRASE_ERROR",
            Self::Crypto => "CRYPTO_ERROR",
            Self::Validation => "VALIDATION_ERROR",
            Self::Busy => "BUSY",
            Self::Internal => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Whether a passphrase error is about a missing or an incorrect passphrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassphraseProblem {
    Missing,
    Incorrect,
}

/// Errors surfaced by workbench flows.
///
/// `Display` renders the user-facing message; nothing in here ever holds
/// library internals.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PgpError {
    #[error("{0}")]
    Format(String),

    #[error("Input is too large. Maximum size is {}.", human_size(.limit))]
    Size { limit: usize },

    #[error("Could not read the key. Please check that it is a valid PGP key.")]
    Key,

    #[error("{}", passphrase_message(.0))]
    Passphrase(PassphraseProblem),

    #[error("{0}")]
    Crypto(String),

    #[error("{0}")]
    Validation(String),

    #[error("An operation is already in progress.")]
    Busy,

    #[error("An unexpected error occurred.")]
    Internal,
}

const DECRYPT_FAILED: &str = "Could not decrypt the message. It may not be addressed to this key.";
const OPERATION_FAILED: &str = "The operation failed. Please check your input and try again.";

fn passphrase_message(problem: &PassphraseProblem) -> &'static str {
    match problem {
        PassphraseProblem::Missing => "This key is protected. Please enter its passphrase.",
        PassphraseProblem::Incorrect => "Incorrect passphrase. Please try again.",
    }
}

fn human_size(bytes: &usize) -> String {
    let bytes = *bytes;
    const MIB: usize = 1024 * 1024;
    const KIB: usize = 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{} MiB", bytes / MIB)
    } else if bytes >= KIB && bytes % KIB == 0 {
        format!("{} KiB", bytes / KIB)
    } else {
        format!("{} bytes", bytes)
    }
}

impl PgpError {
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }

    pub fn too_large(limit: usize) -> Self {
        Self::Size { limit }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn missing_passphrase() -> Self {
        Self::Passphrase(PassphraseProblem::Missing)
    }

    pub fn wrong_passphrase() -> Self {
        Self::Passphrase(PassphraseProblem::Incorrect)
    }

    /// The message could not be decrypted with the supplied key.
    pub fn decrypt_failed() -> Self {
        Self::Crypto(DECRYPT_FAILED.to_string())
    }

    /// Generic library failure for encrypt, sign and verify.
    pub fn operation_failed() -> Self {
        Self::Crypto(OPERATION_FAILED.to_string())
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Format(_) => ErrorCategory::Format,
            Self::Size { .. } => ErrorCategory::Size,
            Self::Key => ErrorCategory::Key,
            Self::Passphrase(_) => ErrorCategory::Passphrase,
            Self::Crypto(_) => ErrorCategory::Crypto,
            Self::Validation(_) => ErrorCategory::Validation,
            Self::Busy => ErrorCategory::Busy,
            Self::Internal => ErrorCategory::Internal,
        }
    }

    pub fn code(&self) -> &'static str {
        self.category().code()
    }

    pub fn user_message(&self) -> String {
        self.to_string()
    }

    /// Map a library error to a user-safe error, logging the detail.
    pub fn from_library(context: &str, err: &anyhow::Error, fallback: PgpError) -> Self {
        tracing::debug!("{} failed: {:#}", context, err);
        fallback
    }
}

impl From<tokio::task::JoinError> for PgpError {
    fn from(err: tokio::task::JoinError) -> Self {
        tracing::error!("Crypto worker task failed: {}", err);
        Self::Internal
    }
}
