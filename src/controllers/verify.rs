//! Verify flow: public key plus either a clear-signed message or a
//! message and its detached signature.

use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::controllers::{reject, run_blocking, settle};
use crate::core::error::PgpError;
use crate::core::flow::{Flow, FlowState};
use crate::core::sanitize::SensitiveText;
use crate::core::validation::{self, ArmorKind};
use crate::crypto::pgp::{PgpKeyManager, PgpSigner, VerifiedSignature};
use crate::types::{VerificationReport, VerifyResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifyMode {
    #[default]
    Cleartext,
    Detached,
}

pub struct VerifyController {
    flow: Flow,
    mode: VerifyMode,
    public_key: String,
    signed_message: String,
    message: SensitiveText,
    signature: String,
    max_input_bytes: usize,
    result: Option<VerifyResult>,
}

impl Default for VerifyController {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl VerifyController {
    pub fn new(settings: &Settings) -> Self {
        Self {
            flow: Flow::new(),
            mode: VerifyMode::default(),
            public_key: String::new(),
            signed_message: String::new(),
            message: SensitiveText::default(),
            signature: String::new(),
            max_input_bytes: settings.max_input_bytes,
            result: None,
        }
    }

    pub fn state(&self) -> FlowState {
        self.flow.state()
    }

    pub fn result(&self) -> Option<&VerifyResult> {
        self.result.as_ref()
    }

    pub fn mode(&self) -> VerifyMode {
        self.mode
    }

    pub fn set_public_key(&mut self, key: impl Into<String>) {
        self.public_key = key.into();
    }

    /// Switches to cleartext mode.
    pub fn set_signed_message(&mut self, signed: impl Into<String>) {
        self.mode = VerifyMode::Cleartext;
        self.signed_message = signed.into();
    }

    /// Switches to detached mode.
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.mode = VerifyMode::Detached;
        self.message.set(message);
    }

    /// Switches to detached mode.
    pub fn set_signature(&mut self, signature: impl Into<String>) {
        self.mode = VerifyMode::Detached;
        self.signature = signature.into();
    }

    /// Check the signature. A bad signature still completes successfully
    /// with `valid = false`.
    pub async fn verify(&mut self) -> Result<VerificationReport, PgpError> {
        self.flow.begin_validation()?;
        tracing::info!("Verify flow started ({:?})", self.mode);

        if let Err(err) = self.validate() {
            return Err(reject(&mut self.flow, &mut self.result, err));
        }

        self.flow.begin_execution()?;

        let mode = self.mode;
        let key_text = self.public_key.clone();
        let signed_message = self.signed_message.clone();
        let message = self.message.clone();
        let signature = self.signature.clone();

        let outcome = run_blocking(move || {
            let key = PgpKeyManager::parse_public_key(&key_text)
                .map_err(|e| PgpError::from_library("parse public key", &e, PgpError::Key))?;

            let verified = match mode {
                VerifyMode::Cleartext => PgpSigner::verify_cleartext(&key, &signed_message),
                VerifyMode::Detached => {
                    PgpSigner::verify_detached(&key, message.as_str().as_bytes(), &signature)
                }
            }
            .map_err(|e| PgpError::from_library("verify", &e, PgpError::operation_failed()))?;

            Ok(report_from(verified))
        })
        .await;

        if let Ok(report) = &outcome {
            tracing::info!("Signature valid: {}", report.valid);
        }
        settle(&mut self.flow, &mut self.result, outcome)
    }

    fn validate(&self) -> Result<(), PgpError> {
        let limit = self.max_input_bytes;
        validation::validate_size(&self.public_key, limit)?;
        // A private key block also carries the public half.
        if validation::detect_armor_kind(&self.public_key) != Some(ArmorKind::PrivateKey) {
            validation::validate_armor(&self.public_key, ArmorKind::PublicKey)?;
        }

        match self.mode {
            VerifyMode::Cleartext => {
                validation::validate_input(&self.signed_message, ArmorKind::SignedMessage, limit)
            }
            VerifyMode::Detached => {
                if self.message.is_empty() {
                    return Err(PgpError::validation("Please enter the signed message."));
                }
                validation::validate_size(self.message.as_str(), limit)?;
                validation::validate_input(&self.signature, ArmorKind::Signature, limit)
            }
        }
    }

    pub fn clear(&mut self) {
        self.flow.reset();
        self.result = None;
        self.mode = VerifyMode::default();
        self.public_key.clear();
        self.signed_message.clear();
        self.message.clear();
        self.signature.clear();
    }
}

impl Drop for VerifyController {
    fn drop(&mut self) {
        self.clear();
    }
}

fn report_from(verified: VerifiedSignature) -> VerificationReport {
    let signer_key_id = verified
        .signer_fingerprint
        .get(verified.signer_fingerprint.len().saturating_sub(16)..)
        .unwrap_or_default()
        .to_string();
    VerificationReport {
        signer_key_id,
        valid: verified.is_valid,
        signed_text: verified.signed_text,
        signer_user_id: verified.signer_user_id,
        signer_fingerprint: verified.signer_fingerprint,
        signed_at: verified.created_at,
    }
}
