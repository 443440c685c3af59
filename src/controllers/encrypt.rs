//! Encrypt flow: plaintext + one or more recipient public keys.

use crate::config::Settings;
use crate::controllers::{reject, run_blocking, settle};
use crate::core::error::PgpError;
use crate::core::flow::{Flow, FlowState};
use crate::core::recipients::RecipientList;
use crate::core::sanitize::SensitiveText;
use crate::core::validation;
use crate::crypto::pgp::{CipherChoice, PgpCipher};
use crate::types::{EncryptResult, EncryptedPayload};

pub struct EncryptController {
    flow: Flow,
    recipients: RecipientList,
    message: SensitiveText,
    cipher: CipherChoice,
    max_input_bytes: usize,
    result: Option<EncryptResult>,
}

impl Default for EncryptController {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl EncryptController {
    pub fn new(settings: &Settings) -> Self {
        Self {
            flow: Flow::new(),
            recipients: RecipientList::new(settings.max_input_bytes),
            message: SensitiveText::default(),
            cipher: settings.symmetric_algorithm,
            max_input_bytes: settings.max_input_bytes,
            result: None,
        }
    }

    pub fn state(&self) -> FlowState {
        self.flow.state()
    }

    pub fn result(&self) -> Option<&EncryptResult> {
        self.result.as_ref()
    }

    pub fn recipients(&self) -> &RecipientList {
        &self.recipients
    }

    pub fn recipients_mut(&mut self) -> &mut RecipientList {
        &mut self.recipients
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message.set(message);
    }

    pub fn set_cipher(&mut self, cipher: CipherChoice) {
        self.cipher = cipher;
    }

    /// Encrypt the message to every valid recipient.
    pub async fn encrypt(&mut self) -> Result<EncryptedPayload, PgpError> {
        self.flow.begin_validation()?;
        tracing::info!("Encrypt flow started");

        if let Err(err) = self.validate() {
            return Err(reject(&mut self.flow, &mut self.result, err));
        }

        self.flow.begin_execution()?;

        let keys = self.recipients.parsed_keys();
        let recipient_fingerprints = self.recipients.fingerprints();
        let message = self.message.clone();
        let cipher = self.cipher;
        tracing::debug!("Encrypting to {} recipient(s)", keys.len());

        let outcome = run_blocking(move || {
            let armored = PgpCipher::encrypt(message.as_str().as_bytes(), &keys, cipher)
                .map_err(|e| PgpError::from_library("encrypt", &e, PgpError::operation_failed()))?;
            Ok(EncryptedPayload {
                armored,
                recipient_fingerprints,
            })
        })
        .await;

        settle(&mut self.flow, &mut self.result, outcome)
    }

    fn validate(&mut self) -> Result<(), PgpError> {
        if self.message.is_blank() {
            return Err(PgpError::validation("Please enter a message to encrypt."));
        }
        validation::validate_size(self.message.as_str(), self.max_input_bytes)?;
        self.recipients.validate_all()
    }

    /// Reset the form: state, result, message and recipients.
    pub fn clear(&mut self) {
        self.flow.reset();
        self.result = None;
        self.message.clear();
        self.recipients.clear();
    }
}

impl Drop for EncryptController {
    fn drop(&mut self) {
        self.clear();
    }
}
