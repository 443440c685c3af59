//! Passphrase input for the CLI
//!
//! Supports two input modes:
//! 1. **Environment variable**: set `PGPDESK_PASSPHRASE` for non-interactive use
//!    (scripts, CI). The variable is removed from the process environment as
//!    soon as it has been read.
//! 2. **Interactive prompt**: hidden input via `rpassword`.
//!
//! Environment variables may be visible to other processes on the same system
//! (e.g. via `/proc/<pid>/environ` on Linux). Prefer the prompt on shared hosts.

use std::io::Write;

use zeroize::Zeroizing;

use crate::core::validation;

/// Environment variable name for non-interactive passphrase input.
pub const ENV_VAR: &str = "PGPDESK_PASSPHRASE";

/// Errors that can occur during passphrase input.
#[derive(Debug, thiserror::Error)]
pub enum PassphraseError {
    #[error("Passphrase cannot be empty")]
    Empty,

    #[error("Passphrase must be at least {min} characters")]
    TooShort { min: usize },

    #[error("Passphrases do not match")]
    Mismatch,

    /// EOF on the prompt.
    #[error("Passphrase input cancelled")]
    Cancelled,

    #[error("Failed to read passphrase: {0}")]
    Io(#[from] std::io::Error),
}

/// Read a passphrase for unlocking an existing key.
pub fn read_passphrase() -> Result<Zeroizing<String>, PassphraseError> {
    if let Some(val) = take_env_passphrase()? {
        return Ok(val);
    }

    eprint!("Enter passphrase to unlock key: ");
    std::io::stderr().flush()?;

    let passphrase = read_password()?;
    if passphrase.is_empty() {
        return Err(PassphraseError::Cancelled);
    }
    Ok(passphrase)
}

/// Read a passphrase for a new key. The prompt asks twice; the environment
/// variable skips confirmation.
pub fn read_new_passphrase(min_length: usize) -> Result<Zeroizing<String>, PassphraseError> {
    if let Some(val) = take_env_passphrase()? {
        check_length(&val, min_length)?;
        return Ok(val);
    }

    eprint!("Enter a passphrase for the new key (min {} characters): ", min_length);
    std::io::stderr().flush()?;
    let passphrase = read_password()?;
    if passphrase.is_empty() {
        return Err(PassphraseError::Cancelled);
    }
    check_length(&passphrase, min_length)?;

    eprint!("Confirm passphrase: ");
    std::io::stderr().flush()?;
    let confirmation = read_password()?;

    if validation::validate_passphrase_confirmation(&passphrase, &confirmation).is_err() {
        return Err(PassphraseError::Mismatch);
    }
    Ok(passphrase)
}

fn take_env_passphrase() -> Result<Option<Zeroizing<String>>, PassphraseError> {
    let Ok(val) = std::env::var(ENV_VAR) else {
        return Ok(None);
    };
    let val = Zeroizing::new(val);
    std::env::remove_var(ENV_VAR);

    if val.is_empty() {
        return Err(PassphraseError::Empty);
    }
    tracing::debug!("Using passphrase from {}", ENV_VAR);
    Ok(Some(val))
}

fn check_length(passphrase: &str, min_length: usize) -> Result<(), PassphraseError> {
    if passphrase.chars().count() < min_length {
        return Err(PassphraseError::TooShort { min: min_length });
    }
    Ok(())
}

/// Read a password from the terminal, mapping EOF to [`PassphraseError::Cancelled`].
fn read_password() -> Result<Zeroizing<String>, PassphraseError> {
    rpassword::read_password().map(Zeroizing::new).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            PassphraseError::Cancelled
        } else {
            PassphraseError::Io(e)
        }
    })
}
