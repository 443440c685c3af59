//! Decrypt flow: armored message + private key (+ passphrase when protected).

use crate::config::Settings;
use crate::controllers::{
    is_wrong_passphrase, park_for_passphrase, prepare_secret_key, reject, run_blocking, settle,
    unlock, PreparedKey,
};
use crate::core::error::PgpError;
use crate::core::flow::{Flow, FlowState};
use crate::core::sanitize::{wipe_bytes, SensitiveText};
use crate::core::validation::{self, ArmorKind};
use crate::crypto::pgp::PgpCipher;
use crate::types::{DecryptResult, DecryptedPayload};
use zeroize::Zeroizing;

pub struct DecryptController {
    flow: Flow,
    message: SensitiveText,
    private_key: SensitiveText,
    passphrase: SensitiveText,
    max_input_bytes: usize,
    result: Option<DecryptResult>,
}

impl Default for DecryptController {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl DecryptController {
    pub fn new(settings: &Settings) -> Self {
        Self {
            flow: Flow::new(),
            message: SensitiveText::default(),
            private_key: SensitiveText::default(),
            passphrase: SensitiveText::default(),
            max_input_bytes: settings.max_input_bytes,
            result: None,
        }
    }

    pub fn state(&self) -> FlowState {
        self.flow.state()
    }

    pub fn result(&self) -> Option<&DecryptResult> {
        self.result.as_ref()
    }

    pub fn last_error(&self) -> Option<&PgpError> {
        self.flow.last_error()
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

    /// Decrypt the message. Stops in `NeedsPassphrase` if the key is protected
    /// and no passphrase has been entered yet.
    pub async fn decrypt(&mut self) -> Result<DecryptedPayload, PgpError> {
        self.flow.begin_validation()?;
        tracing::info!("Decrypt flow started");

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

        self.flow.begin_execution()?;
        let message = self.message.clone();

        let outcome = run_blocking(move || {
            unlock(&key, &passphrase)?;

            let mut data = PgpCipher::decrypt(message.as_str(), &key, &passphrase)
                .map_err(|e| PgpError::from_library("decrypt", &e, PgpError::decrypt_failed()))?;

            let byte_len = data.len();
            let payload = match std::str::from_utf8(&data) {
                Ok(text) => DecryptedPayload {
                    text: Zeroizing::new(text.to_owned()),
                    byte_len,
                    is_binary: false,
                },
                Err(_) => DecryptedPayload {
                    text: Zeroizing::new(String::from_utf8_lossy(&data).into_owned()),
                    byte_len,
                    is_binary: true,
                },
            };
            wipe_bytes(&mut data);
            Ok(payload)
        })
        .await;

        if outcome.as_ref().err().is_some_and(is_wrong_passphrase) {
            self.passphrase.clear();
        }

        settle(&mut self.flow, &mut self.result, outcome)
    }

    fn validate(&self) -> Result<PreparedKey, PgpError> {
        validation::validate_input(
            self.message.as_str(),
            ArmorKind::Message,
            self.max_input_bytes,
        )?;
        prepare_secret_key(&self.private_key, &self.passphrase, self.max_input_bytes)
    }

    pub fn clear(&mut self) {
        self.flow.reset();
        self.result = None;
        self.message.clear();
        self.private_key.clear();
        self.passphrase.clear();
    }
}

impl Drop for DecryptController {
    fn drop(&mut self) {
        self.clear();
    }
}
