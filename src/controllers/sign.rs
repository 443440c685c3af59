//! Sign flow: message + private key, cleartext or detached.

use crate::config::Settings;
use crate::controllers::{
    is_wrong_passphrase, park_for_passphrase, prepare_secret_key, reject, run_blocking, settle,
    unlock, PreparedKey,
};
use crate::core::error::PgpError;
use crate::core::flow::{Flow, FlowState};
use crate::core::sanitize::SensitiveText;
use crate::core::validation;
use crate::crypto::pgp::{KeyInspector, PgpSigner};
use crate::types::{SignMode, SignResult, SignedPayload};
use pgp::composed::SignedPublicKey;

pub struct SignController {
    flow: Flow,
    message: SensitiveText,
    private_key: SensitiveText,
    passphrase: SensitiveText,
    mode: SignMode,
    max_input_bytes: usize,
    result: Option<SignResult>,
}

impl Default for SignController {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl SignController {
    pub fn new(settings: &Settings) -> Self {
        Self {
            flow: Flow::new(),
            message: SensitiveText::default(),
            private_key: SensitiveText::default(),
            passphrase: SensitiveText::default(),
            mode: SignMode::default(),
            max_input_bytes: settings.max_input_bytes,
            result: None,
        }
    }

    pub fn state(&self) -> FlowState {
        self.flow.state()
    }

    pub fn result(&self) -> Option<&SignResult> {
        self.result.as_ref()
    }

    pub fn mode(&self) -> SignMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: SignMode) {
        self.mode = mode;
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message.set(message);
    }

    pub fn set_private_key(&mut self, key: impl Into<String>) {
        self.private_key.set(key);
    }

    pub fn set_passphrase(&mut self, passphrase: impl Into<String>) {
        self.passphrase.set(passphrase);
    }

    pub fn has_passphrase(&self) -> bool {
        !self.passphrase.is_empty()
    }

    pub async fn sign(&mut self) -> Result<SignedPayload, PgpError> {
        self.flow.begin_validation()?;
        tracing::info!("Sign flow started ({:?})", self.mode);

        let prepared = match self.validate() {
            Ok(prepared) => prepared,
            Err(err) => return Err(reject(&mut self.flow, &mut self.result, err)),
        };

        let (key, passphrase) = match prepared {
            PreparedKey::Ready { key, passphrase } => (key, passphrase),
            PreparedKey::NeedsPassphrase => {
                return Err(park_for_passphrase(&mut self.flow, &mut self.result));
            }
        };

        if !PgpSigner::has_signing_capability(&SignedPublicKey::from(key.clone())) {
            let err = PgpError::validation("This key cannot be used for signing.");
            return Err(reject(&mut self.flow, &mut self.result, err));
        }

        self.flow.begin_execution()?;
        let message = self.message.clone();
        let mode = self.mode;

        let outcome = run_blocking(move || {
            unlock(&key, &passphrase)?;

            let armored = match mode {
                SignMode::Cleartext => {
                    PgpSigner::sign_cleartext(&key, message.as_str(), &passphrase)
                }
                SignMode::Detached => {
                    PgpSigner::sign_detached(&key, message.as_str().as_bytes(), &passphrase)
                }
            }
            .map_err(|e| PgpError::from_library("sign", &e, PgpError::operation_failed()))?;

            Ok(SignedPayload {
                mode,
                armored,
                signer_fingerprint: KeyInspector::secret_key_info(&key).fingerprint,
            })
        })
        .await;

        if outcome.as_ref().err().is_some_and(is_wrong_passphrase) {
            self.passphrase.clear();
        }

        settle(&mut self.flow, &mut self.result, outcome)
    }

    fn validate(&self) -> Result<PreparedKey, PgpError> {
        if self.message.is_blank() {
            return Err(PgpError::validation("Please enter a message to sign."));
        }
        validation::validate_size(self.message.as_str(), self.max_input_bytes)?;
        prepare_secret_key(&self.private_key, &self.passphrase, self.max_input_bytes)
    }

    pub fn clear(&mut self) {
        self.flow.reset();
        self.result = None;
        self.mode = SignMode::default();
        self.message.clear();
        self.private_key.clear();
        self.passphrase.clear();
    }
}

impl Drop for SignController {
    fn drop(&mut self) {
        self.clear();
    }
}
