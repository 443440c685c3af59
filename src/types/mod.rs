//! Data transfer types handed to the presentation layer
//!
//! These types are serialized as camelCase JSON so a web or desktop front
//! end can consume them directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::core::error::PgpError;

/// Read-only summary of a parsed key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyInfo {
    /// Uppercase hex fingerprint, no spaces.
    pub fingerprint: String,
    /// Long key id (last 16 hex chars of the fingerprint).
    pub key_id: String,
    pub user_ids: Vec<String>,
    pub algorithm: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    /// Secret material is passphrase-protected.
    pub is_encrypted: bool,
    pub is_private: bool,
    pub subkey_count: usize,
}

impl KeyInfo {
    /// Fingerprint grouped for display.
    pub fn formatted_fingerprint(&self) -> String {
        crate::core::validation::format_fingerprint(&self.fingerprint)
    }

    pub fn primary_user_id(&self) -> Option<&str> {
        self.user_ids.first().map(String::as_str)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expiry| expiry <= now)
    }
}

/// Error payload safe to show to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<&PgpError> for ApiError {
    fn from(err: &PgpError) -> Self {
        Self::new(err.code(), err.user_message())
    }
}

impl From<PgpError> for ApiError {
    fn from(err: PgpError) -> Self {
        Self::from(&err)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Outcome of one operation: either a payload or a user-facing error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl<T> OperationResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(err: &PgpError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError::from(err)),
        }
    }

    pub fn from_result(result: &Result<T, PgpError>) -> Self
    where
        T: Clone,
    {
        match result {
            Ok(data) => Self::ok(data.clone()),
            Err(err) => Self::failed(err),
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }
}

/// Armored ciphertext from the encrypt flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedPayload {
    pub armored: String,
    pub recipient_fingerprints: Vec<String>,
}

/// Recovered plaintext from the decrypt flow. The text is wiped on drop.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptedPayload {
    /// UTF-8 view of the plaintext (lossy for binary content).
    pub text: Zeroizing<String>,
    pub byte_len: usize,
    pub is_binary: bool,
}

impl std::fmt::Debug for DecryptedPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecryptedPayload")
            .field("byte_len", &self.byte_len)
            .field("is_binary", &self.is_binary)
            .finish_non_exhaustive()
    }
}

/// How a message is signed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignMode {
    /// Text and signature in one clear-signed block.
    #[default]
    Cleartext,
    /// Signature stored separately from the content.
    Detached,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedPayload {
    pub mode: SignMode,
    pub armored: String,
    pub signer_fingerprint: String,
}

/// Verification outcome. `valid = false` is a completed verification, not a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub valid: bool,
    /// Text covered by a clear-signed message.
    pub signed_text: Option<String>,
    pub signer_user_id: Option<String>,
    pub signer_fingerprint: String,
    /// Long key id of the checked key.
    pub signer_key_id: String,
    pub signed_at: Option<DateTime<Utc>>,
}

/// A freshly generated keypair. The private block is wiped on drop.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedKeyPair {
    pub public_key_armored: String,
    pub private_key_armored: Zeroizing<String>,
    pub key_info: KeyInfo,
}

impl std::fmt::Debug for GeneratedKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedKeyPair")
            .field("key_info", &self.key_info)
            .finish_non_exhaustive()
    }
}

pub type EncryptResult = OperationResult<EncryptedPayload>;
pub type DecryptResult = OperationResult<DecryptedPayload>;
pub type SignResult = OperationResult<SignedPayload>;
pub type VerifyResult = OperationResult<VerificationReport>;
pub type InspectResult = OperationResult<KeyInfo>;
pub type GenerateResult = OperationResult<GeneratedKeyPair>;
