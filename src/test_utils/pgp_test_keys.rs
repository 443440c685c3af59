//! PGP key generation utilities for testing
//!
//! Provides helpers for generating PGP keypairs without requiring user interaction.

use crate::crypto::pgp::{KeyAlgorithm, KeyGenParams, PgpKeyManager, SecurePassphrase};
use anyhow::Result;
use pgp::composed::{SignedPublicKey, SignedSecretKey};

/// A generated keypair with its armored forms and passphrase.
#[derive(Clone)]
pub struct TestKeyPair {
    pub secret_key: SignedSecretKey,
    pub public_key: SignedPublicKey,
    pub passphrase: SecurePassphrase,
    pub public_armored: String,
    pub secret_armored: String,
}

impl TestKeyPair {
    /// Ed25519 keypair protected by a random strong passphrase.
    pub fn new(name: &str, email: &str) -> Result<Self> {
        Self::build(name, email, SecurePassphrase::generate_strong())
    }

    /// Create a keypair with a specific passphrase.
    pub fn with_passphrase(name: &str, email: &str, passphrase: &str) -> Result<Self> {
        Self::build(name, email, SecurePassphrase::new(passphrase.to_string()))
    }

    /// Keypair whose secret material is not passphrase-protected.
    pub fn unprotected(name: &str, email: &str) -> Result<Self> {
        Self::build(name, email, SecurePassphrase::empty())
    }

    fn build(name: &str, email: &str, passphrase: SecurePassphrase) -> Result<Self> {
        let params = KeyGenParams {
            name: name.to_string(),
            email: email.to_string(),
            comment: None,
            algorithm: KeyAlgorithm::Ed25519,
            passphrase: passphrase.clone(),
        };
        let (secret_key, public_key) = PgpKeyManager::generate_keypair(&params)?;

        Ok(Self {
            public_armored: PgpKeyManager::public_key_armored(&public_key)?,
            secret_armored: PgpKeyManager::secret_key_armored(&secret_key)?,
            secret_key,
            public_key,
            passphrase,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_pair_is_protected() {
        let pair = TestKeyPair::new("Test", "test@example.org").unwrap();
        assert!(PgpKeyManager::is_secret_key_encrypted(&pair.secret_key));
        assert_eq!(pair.passphrase.as_str().len(), 32);
    }

    #[test]
    fn test_unprotected_pair() {
        let pair = TestKeyPair::unprotected("Test", "test@example.org").unwrap();
        assert!(!PgpKeyManager::is_secret_key_encrypted(&pair.secret_key));
    }
}
