//! PGP cleartext and detached signatures using rPGP 0.16

use crate::crypto::pgp::inspect::KeyInspector;
use crate::crypto::pgp::keypair::SecurePassphrase;
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use pgp::composed::{
    CleartextSignedMessage, Deserializable, SignedPublicKey, SignedSecretKey, StandaloneSignature,
};
use pgp::packet::{Signature, SignatureConfig, SignatureType, Subpacket, SubpacketData};
use pgp::types::KeyDetails;
use rand::thread_rng;
use std::time::SystemTime;

/// PGP signing operations using rPGP 0.16.
pub struct PgpSigner;

/// Result of signature verification.
#[derive(Debug, Clone)]
pub struct VerifiedSignature {
    /// User ID of the signer.
    pub signer_user_id: Option<String>,
    /// Fingerprint of the key the signature was checked against.
    pub signer_fingerprint: String,
    /// Whether the signature is valid.
    pub is_valid: bool,
    /// When the signature was created.
    pub created_at: Option<DateTime<Utc>>,
    /// Text covered by a clear-signed message.
    pub signed_text: Option<String>,
}

impl PgpSigner {
    /// Create detached PGP signature for binary data.
    ///
    /// Returns an armored signature string.
    pub fn sign_detached(
        secret_key: &SignedSecretKey,
        data: &[u8],
        passphrase: &SecurePassphrase,
    ) -> Result<String> {
        log::info!(
            "Creating detached PGP signature for {} bytes of data",
            data.len()
        );

        let mut config = SignatureConfig::from_key(
            thread_rng(),
            &secret_key.primary_key,
            SignatureType::Binary,
        )
        .map_err(|e| anyhow!("Failed to create signature config: {}", e))?;

        config.hashed_subpackets = vec![
            Subpacket::regular(SubpacketData::IssuerFingerprint(secret_key.fingerprint()))
                .map_err(|e| anyhow!("Failed to create fingerprint subpacket: {}", e))?,
            Subpacket::critical(SubpacketData::SignatureCreationTime(SystemTime::now().into()))
                .map_err(|e| anyhow!("Failed to create creation time subpacket: {}", e))?,
        ];

        config.unhashed_subpackets = vec![Subpacket::regular(SubpacketData::Issuer(
            secret_key.key_id(),
        ))
        .map_err(|e| anyhow!("Failed to create issuer subpacket: {}", e))?];

        let signature = config
            .sign(&secret_key.primary_key, &passphrase.to_pgp_password(), data)
            .map_err(|e| anyhow!("Failed to create signature: {}", e))?;

        let armored_signature = StandaloneSignature::new(signature)
            .to_armored_string(Default::default())
            .map_err(|e| anyhow!("Failed to armor signature: {}", e))?;

        log::info!("Successfully created detached PGP signature");
        Ok(armored_signature)
    }

    /// Create cleartext signature (message + signature combined).
    pub fn sign_cleartext(
        secret_key: &SignedSecretKey,
        message: &str,
        passphrase: &SecurePassphrase,
    ) -> Result<String> {
        log::info!(
            "Creating cleartext PGP signature for {} chars of text",
            message.len()
        );

        let signed = CleartextSignedMessage::sign(
            thread_rng(),
            message,
            &secret_key.primary_key,
            &passphrase.to_pgp_password(),
        )
        .map_err(|e| anyhow!("Failed to create cleartext signature: {}", e))?;

        let armored = signed
            .to_armored_string(Default::default())
            .map_err(|e| anyhow!("Failed to armor cleartext signature: {}", e))?;

        log::info!("Successfully created cleartext PGP signature");
        Ok(armored)
    }

    /// Verify detached PGP signature.
    ///
    /// A signature that does not match the data is reported through
    /// `is_valid`; only unreadable signature material is an error.
    pub fn verify_detached(
        public_key: &SignedPublicKey,
        data: &[u8],
        signature_armored: &str,
    ) -> Result<VerifiedSignature> {
        log::info!(
            "Verifying detached PGP signature for {} bytes of data",
            data.len()
        );

        let (standalone_sig, _) =
            StandaloneSignature::from_armor_single(std::io::Cursor::new(signature_armored))
                .map_err(|e| anyhow!("Failed to parse armored signature: {}", e))?;

        let is_valid = standalone_sig.verify(&public_key.primary_key, data).is_ok()
            || public_key
                .public_subkeys
                .iter()
                .any(|subkey| standalone_sig.verify(&subkey.key, data).is_ok());

        let result = Self::report(public_key, &standalone_sig.signature, is_valid, None);

        log::info!(
            "PGP signature verification result: valid={}, signer={}",
            result.is_valid,
            result.signer_fingerprint
        );
        Ok(result)
    }

    /// Verify a clear-signed message.
    pub fn verify_cleartext(
        public_key: &SignedPublicKey,
        signed_armored: &str,
    ) -> Result<VerifiedSignature> {
        log::info!("Verifying cleartext PGP signature");

        let (signed, _) = CleartextSignedMessage::from_string(signed_armored)
            .map_err(|e| anyhow!("Failed to parse cleartext signed message: {}", e))?;

        let verified = signed.verify(&public_key.primary_key).ok().or_else(|| {
            public_key
                .public_subkeys
                .iter()
                .find_map(|subkey| signed.verify(&subkey.key).ok())
        });

        let signature = match verified {
            Some(standalone) => Some(&standalone.signature),
            None => signed.signatures().first().map(|s| &s.signature),
        }
        .ok_or_else(|| anyhow!("Cleartext message carries no signature"))?;

        let result = Self::report(
            public_key,
            signature,
            verified.is_some(),
            // Hashing normalises line endings to CRLF; hand back what was signed.
            Some(signed.signed_text().replace("\r\n", "\n")),
        );

        log::info!(
            "PGP cleartext verification result: valid={}, signer={}",
            result.is_valid,
            result.signer_fingerprint
        );
        Ok(result)
    }

    fn report(
        public_key: &SignedPublicKey,
        signature: &Signature,
        is_valid: bool,
        signed_text: Option<String>,
    ) -> VerifiedSignature {
        // Extract signer info from public key user IDs
        let signer_user_id = public_key
            .details
            .users
            .first()
            .map(|uid| String::from_utf8_lossy(uid.id.id()).to_string());

        // Get signature creation time from subpackets
        let created_at = signature.config().and_then(|config| {
            config
                .hashed_subpackets
                .iter()
                .find_map(|subpkt| match &subpkt.data {
                    SubpacketData::SignatureCreationTime(dt) => Some(dt.clone()),
                    _ => None,
                })
        });

        VerifiedSignature {
            signer_user_id,
            signer_fingerprint: KeyInspector::fingerprint_hex(public_key),
            is_valid,
            created_at,
            signed_text,
        }
    }

    /// Check if a public key has signing capability.
    pub fn has_signing_capability(public_key: &SignedPublicKey) -> bool {
        let has_flag = |sig: &Signature| {
            sig.config().map_or(false, |config| {
                config.hashed_subpackets.iter().any(|subpkt| {
                    matches!(&subpkt.data, SubpacketData::KeyFlags(flags) if flags.sign())
                })
            })
        };

        let has_primary_sign = public_key.details.direct_signatures.iter().any(has_flag)
            || public_key
                .details
                .users
                .iter()
                .any(|user| user.signatures.iter().any(has_flag));

        let has_subkey_sign = public_key
            .public_subkeys
            .iter()
            .any(|subkey| subkey.signatures.iter().any(has_flag));

        has_primary_sign || has_subkey_sign
    }
}
