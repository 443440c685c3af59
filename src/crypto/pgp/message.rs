//! Message encryption and decryption using rPGP 0.16

use anyhow::{anyhow, Result};
use pgp::composed::{Message, MessageBuilder, SignedPublicKey, SignedSecretKey};
use pgp::crypto::sym::SymmetricKeyAlgorithm;
use pgp::types::{CompressionAlgorithm, PublicKeyTrait};
use rand::thread_rng;
use serde::{Deserialize, Serialize};

use crate::crypto::pgp::keypair::SecurePassphrase;

/// Symmetric ciphers offered for the session key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CipherChoice {
    Aes128,
    #[default]
    Aes256,
}

impl CipherChoice {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "aes128" | "aes-128" => Some(Self::Aes128),
            "aes256" | "aes-256" => Some(Self::Aes256),
            _ => None,
        }
    }

    fn algorithm(self) -> SymmetricKeyAlgorithm {
        match self {
            Self::Aes128 => SymmetricKeyAlgorithm::AES128,
            Self::Aes256 => SymmetricKeyAlgorithm::AES256,
        }
    }
}

/// PGP message encryption operations.
pub struct PgpCipher;

impl PgpCipher {
    /// Encrypt `plaintext` to every recipient and return an armored message.
    ///
    /// Each recipient contributes its encryption-capable subkeys; a key
    /// without one is encrypted to its primary key.
    pub fn encrypt(
        plaintext: &[u8],
        recipients: &[SignedPublicKey],
        cipher: CipherChoice,
    ) -> Result<String> {
        if recipients.is_empty() {
            return Err(anyhow!("No recipients to encrypt to"));
        }

        log::info!(
            "Encrypting {} bytes to {} recipient(s)",
            plaintext.len(),
            recipients.len()
        );

        let mut builder = MessageBuilder::from_bytes("", plaintext.to_vec())
            .seipd_v1(thread_rng(), cipher.algorithm());
        builder.compression(CompressionAlgorithm::ZLIB);

        for recipient in recipients {
            let mut used_subkey = false;
            for subkey in recipient.public_subkeys.iter() {
                if subkey.is_encryption_key() {
                    builder
                        .encrypt_to_key(thread_rng(), subkey)
                        .map_err(|e| anyhow!("Failed to encrypt to subkey: {}", e))?;
                    used_subkey = true;
                }
            }

            if !used_subkey {
                log::debug!("Recipient has no encryption subkey, using primary key");
                builder
                    .encrypt_to_key(thread_rng(), &recipient.primary_key)
                    .map_err(|e| anyhow!("Failed to encrypt to primary key: {}", e))?;
            }
        }

        let armored = builder
            .to_armored_string(thread_rng(), Default::default())
            .map_err(|e| anyhow!("Failed to armor message: {}", e))?;

        log::info!("Successfully encrypted message");
        Ok(armored)
    }

    /// Decrypt an armored message with `secret_key`, returning the literal data.
    pub fn decrypt(
        armored: &str,
        secret_key: &SignedSecretKey,
        passphrase: &SecurePassphrase,
    ) -> Result<Vec<u8>> {
        log::info!("Decrypting message ({} bytes of armor)", armored.len());

        let (message, _headers) = Message::from_armor(armored.as_bytes())
            .map_err(|e| anyhow!("Failed to parse armored message: {}", e))?;

        let mut message = message
            .decrypt(&passphrase.to_pgp_password(), secret_key)
            .map_err(|e| anyhow!("Failed to decrypt message: {}", e))?;

        while message.is_compressed() {
            message = message
                .decompress()
                .map_err(|e| anyhow!("Failed to decompress message: {}", e))?;
        }

        let data = message
            .as_data_vec()
            .map_err(|e| anyhow!("Failed to read message data: {}", e))?;

        log::info!("Successfully decrypted {} bytes", data.len());
        Ok(data)
    }
}
