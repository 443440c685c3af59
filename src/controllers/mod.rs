//! Per-flow controllers
//!
//! One controller per form: encrypt, decrypt, sign, verify, inspect and
//! generate. Each owns its form fields and a [`Flow`], validates input,
//! asks for a passphrase when a protected key needs one, runs the rPGP
//! call on a blocking thread and records an [`OperationResult`].

mod decrypt;
mod encrypt;
mod generate;
mod inspect;
mod sign;
mod verify;

pub use decrypt::DecryptController;
pub use encrypt::EncryptController;
pub use generate::GenerateController;
pub use inspect::InspectController;
pub use sign::SignController;
pub use verify::{VerifyController, VerifyMode};

use pgp::composed::SignedSecretKey;

use crate::core::error::{PassphraseProblem, PgpError};
use crate::core::flow::Flow;
use crate::core::sanitize::SensitiveText;
use crate::core::validation::{self, ArmorKind};
use crate::crypto::pgp::{PgpKeyManager, SecurePassphrase};
use crate::types::OperationResult;

/// Run a crypto call off the async executor.
pub(crate) async fn run_blocking<T, F>(work: F) -> Result<T, PgpError>
where
    F: FnOnce() -> Result<T, PgpError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await?
}

/// Record the outcome of the executing step and move the flow to its final state.
pub(crate) fn settle<T: Clone>(
    flow: &mut Flow,
    slot: &mut Option<OperationResult<T>>,
    outcome: Result<T, PgpError>,
) -> Result<T, PgpError> {
    match outcome {
        Ok(data) => {
            flow.succeed()?;
            *slot = Some(OperationResult::ok(data.clone()));
            Ok(data)
        }
        Err(err) => Err(reject(flow, slot, err)),
    }
}

/// Record a failure from any step before or during execution.
pub(crate) fn reject<T>(
    flow: &mut Flow,
    slot: &mut Option<OperationResult<T>>,
    err: PgpError,
) -> PgpError {
    tracing::info!("Flow failed: {}", err.code());
    *slot = Some(OperationResult::failed(&err));
    flow.fail(err)
}

/// Stop in `NeedsPassphrase` until the user supplies one.
pub(crate) fn park_for_passphrase<T>(
    flow: &mut Flow,
    slot: &mut Option<OperationResult<T>>,
) -> PgpError {
    let err = PgpError::missing_passphrase();
    if let Err(internal) = flow.require_passphrase() {
        return reject(flow, slot, internal);
    }
    tracing::info!("Key is protected, waiting for passphrase");
    *slot = Some(OperationResult::failed(&err));
    err
}

/// A private key ready for use, or a note that it still needs a passphrase.
pub(crate) enum PreparedKey {
    Ready {
        key: SignedSecretKey,
        passphrase: SecurePassphrase,
    },
    NeedsPassphrase,
}

/// Validate and parse a pasted private key.
pub(crate) fn prepare_secret_key(
    key_text: &SensitiveText,
    passphrase: &SensitiveText,
    limit: usize,
) -> Result<PreparedKey, PgpError> {
    validation::validate_input(key_text.as_str(), ArmorKind::PrivateKey, limit)?;

    let key = PgpKeyManager::parse_secret_key(key_text.as_str())
        .map_err(|e| PgpError::from_library("parse private key", &e, PgpError::Key))?;

    if PgpKeyManager::is_secret_key_encrypted(&key) && passphrase.is_empty() {
        return Ok(PreparedKey::NeedsPassphrase);
    }

    Ok(PreparedKey::Ready {
        key,
        passphrase: SecurePassphrase::new(passphrase.as_str().to_owned()),
    })
}

/// Fail with the wrong-passphrase error unless `passphrase` unlocks `key`.
pub(crate) fn unlock(key: &SignedSecretKey, passphrase: &SecurePassphrase) -> Result<(), PgpError> {
    if PgpKeyManager::check_passphrase(key, passphrase) {
        Ok(())
    } else {
        Err(PgpError::wrong_passphrase())
    }
}

pub(crate) fn is_wrong_passphrase(err: &PgpError) -> bool {
    matches!(err, PgpError::Passphrase(PassphraseProblem::Incorrect))
}
