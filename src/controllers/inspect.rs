//! Inspect flow: summarise a pasted public or private key.

use crate::config::Settings;
use crate::controllers::{reject, run_blocking, settle};
use crate::core::error::PgpError;
use crate::core::flow::{Flow, FlowState};
use crate::core::sanitize::SensitiveText;
use crate::core::validation::{self, ArmorKind};
use crate::crypto::pgp::{KeyInspector, PgpKeyManager};
use crate::types::{InspectResult, KeyInfo};

const NOT_A_KEY: &str = "Please paste a PGP public or private key.";

pub struct InspectController {
    flow: Flow,
    // May hold a private key.
    key_text: SensitiveText,
    max_input_bytes: usize,
    result: Option<InspectResult>,
}

impl Default for InspectController {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl InspectController {
    pub fn new(settings: &Settings) -> Self {
        Self {
            flow: Flow::new(),
            key_text: SensitiveText::default(),
            max_input_bytes: settings.max_input_bytes,
            result: None,
        }
    }

    pub fn state(&self) -> FlowState {
        self.flow.state()
    }

    pub fn result(&self) -> Option<&InspectResult> {
        self.result.as_ref()
    }

    pub fn set_key(&mut self, key: impl Into<String>) {
        self.key_text.set(key);
    }

    pub async fn inspect(&mut self) -> Result<KeyInfo, PgpError> {
        self.flow.begin_validation()?;
        tracing::info!("Inspect flow started");

        let kind = match self.validate() {
            Ok(kind) => kind,
            Err(err) => return Err(reject(&mut self.flow, &mut self.result, err)),
        };

        self.flow.begin_execution()?;
        let key_text = self.key_text.clone();

        let outcome = run_blocking(move || match kind {
            ArmorKind::PrivateKey => PgpKeyManager::parse_secret_key(key_text.as_str())
                .map(|key| KeyInspector::secret_key_info(&key))
                .map_err(|e| PgpError::from_library("inspect private key", &e, PgpError::Key)),
            _ => PgpKeyManager::parse_public_key(key_text.as_str())
                .map(|key| KeyInspector::key_info(&key))
                .map_err(|e| PgpError::from_library("inspect public key", &e, PgpError::Key)),
        })
        .await;

        if let Ok(info) = &outcome {
            tracing::debug!("Inspected key {}", info.key_id);
        }
        settle(&mut self.flow, &mut self.result, outcome)
    }

    fn validate(&self) -> Result<ArmorKind, PgpError> {
        let text = self.key_text.as_str();
        if text.trim().is_empty() {
            return Err(PgpError::format(NOT_A_KEY));
        }
        validation::validate_size(text, self.max_input_bytes)?;

        let kind = match validation::detect_armor_kind(text) {
            Some(kind @ (ArmorKind::PublicKey | ArmorKind::PrivateKey)) => kind,
            _ => return Err(PgpError::format(NOT_A_KEY)),
        };
        validation::validate_armor(text, kind)?;
        Ok(kind)
    }

    pub fn clear(&mut self) {
        self.flow.reset();
        self.result = None;
        self.key_text.clear();
    }
}

impl Drop for InspectController {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorCategory;
    use crate::test_utils::TestKeyPair;

    #[tokio::test]
    async fn test_inspect_public_key() {
        let carol = TestKeyPair::new("Carol", "carol@example.org").unwrap();
        let mut controller = InspectController::default();
        controller.set_key(carol.public_armored.clone());

        let info = controller.inspect().await.unwrap();
        assert_eq!(info.fingerprint.len(), 40);
        assert!(info.fingerprint.ends_with(&info.key_id));
        assert!(!info.is_private);
        assert_eq!(info.subkey_count, 1);
        assert_eq!(info.primary_user_id(), Some("Carol <carol@example.org>"));
    }

    #[tokio::test]
    async fn test_inspect_private_key() {
        let carol = TestKeyPair::new("Carol", "carol@example.org").unwrap();
        let mut controller = InspectController::default();
        controller.set_key(carol.secret_armored.clone());

        let info = controller.inspect().await.unwrap();
        assert!(info.is_private);
        assert!(info.is_encrypted);
        assert_eq!(info.fingerprint, KeyInspector::key_info(&carol.public_key).fingerprint);
    }

    #[tokio::test]
    async fn test_message_is_not_a_key() {
        let mut controller = InspectController::default();
        controller.set_key("-----BEGIN PGP MESSAGE-----\n\nwcBMA\n-----END PGP MESSAGE-----\n");

        let err = controller.inspect().await.unwrap_err();
        assert_eq!(err.user_message(), NOT_A_KEY);
        assert_eq!(controller.state(), FlowState::Error);
    }

    #[tokio::test]
    async fn test_corrupt_key_body() {
        let mut controller = InspectController::default();
        controller.set_key(
            "-----BEGIN PGP PUBLIC KEY BLOCK-----\n\nAAAA\n-----END PGP PUBLIC KEY BLOCK-----\n",
        );

        let err = controller.inspect().await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Key);
    }

    #[tokio::test]
    async fn test_retry_after_error() {
        let carol = TestKeyPair::new("Carol", "carol@example.org").unwrap();
        let mut controller = InspectController::default();
        controller.set_key("hello");
        assert!(controller.inspect().await.is_err());

        controller.set_key(carol.public_armored.clone());
        assert!(controller.inspect().await.is_ok());
        assert_eq!(controller.state(), FlowState::Success);
    }
}
