//! Common test setup and utilities for integration tests
//!
//! Keys are generated through the public controller API, the same way a
//! front end would obtain them.

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use pgpdesk::crypto::pgp::{KeyAlgorithm, KeyGenParams, PgpKeyManager, SecurePassphrase};
use pgpdesk::GenerateController;

pub const PASSPHRASE: &str = "integration test passphrase";

/// Initialize test logging (call once per test module)
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("pgpdesk=debug,test=debug")
        .with_test_writer()
        .try_init();
}

/// Armored keypair plus the passphrase protecting it.
pub struct Identity {
    pub public_armored: String,
    pub secret_armored: String,
    pub passphrase: String,
    pub fingerprint: String,
}

impl Identity {
    /// Generate a protected Ed25519 identity through `GenerateController`.
    pub async fn generate(name: &str, email: &str) -> Result<Self> {
        let mut controller = GenerateController::default();
        controller.set_name(name);
        controller.set_email(email);
        controller.set_passphrase(PASSPHRASE);
        controller.set_passphrase_confirmation(PASSPHRASE);

        let pair = controller
            .generate()
            .await
            .map_err(|e| anyhow!("key generation failed: {}", e))?;

        Ok(Self {
            public_armored: pair.public_key_armored,
            secret_armored: pair.private_key_armored.as_str().to_owned(),
            passphrase: PASSPHRASE.to_string(),
            fingerprint: pair.key_info.fingerprint,
        })
    }

    /// Identity whose private key carries no passphrase.
    pub fn unprotected(name: &str, email: &str) -> Result<Self> {
        let params = KeyGenParams {
            name: name.to_string(),
            email: email.to_string(),
            comment: None,
            algorithm: KeyAlgorithm::Ed25519,
            passphrase: SecurePassphrase::empty(),
        };
        let (secret_key, public_key) = PgpKeyManager::generate_keypair(&params)?;

        Ok(Self {
            public_armored: PgpKeyManager::public_key_armored(&public_key)?,
            secret_armored: PgpKeyManager::secret_key_armored(&secret_key)?,
            passphrase: String::new(),
            fingerprint: pgpdesk::crypto::pgp::KeyInspector::key_info(&public_key).fingerprint,
        })
    }
}
