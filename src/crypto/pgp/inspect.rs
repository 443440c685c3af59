//! Read-only key summaries

use chrono::{DateTime, Duration, Utc};
use pgp::composed::{SignedPublicKey, SignedSecretKey};
use pgp::crypto::public_key::PublicKeyAlgorithm;
use pgp::packet::SubpacketData;
use pgp::types::{KeyDetails, PublicKeyTrait};

use crate::crypto::pgp::keypair::PgpKeyManager;
use crate::types::KeyInfo;

/// Length of a long key id in hex characters.
const KEY_ID_HEX_LEN: usize = 16;

/// Builds [`KeyInfo`] from parsed keys.
pub struct KeyInspector;

impl KeyInspector {
    pub fn key_info(public_key: &SignedPublicKey) -> KeyInfo {
        let fingerprint = Self::fingerprint_hex(public_key);
        let key_id = fingerprint
            .get(fingerprint.len().saturating_sub(KEY_ID_HEX_LEN)..)
            .unwrap_or_default()
            .to_string();

        let user_ids = public_key
            .details
            .users
            .iter()
            .map(|user| String::from_utf8_lossy(user.id.id()).to_string())
            .collect();

        let created_at: DateTime<Utc> = public_key.primary_key.created_at().clone();
        let expires_at = Self::key_expiration(public_key).map(|validity| created_at + validity);

        KeyInfo {
            fingerprint,
            key_id,
            user_ids,
            algorithm: Self::algorithm_name(public_key.primary_key.algorithm()),
            created_at,
            expires_at,
            is_encrypted: false,
            is_private: false,
            subkey_count: public_key.public_subkeys.len(),
        }
    }

    pub fn secret_key_info(secret_key: &SignedSecretKey) -> KeyInfo {
        let public_key = SignedPublicKey::from(secret_key.clone());
        KeyInfo {
            is_encrypted: PgpKeyManager::is_secret_key_encrypted(secret_key),
            is_private: true,
            ..Self::key_info(&public_key)
        }
    }

    /// Uppercase hex fingerprint without separators.
    pub fn fingerprint_hex(public_key: &SignedPublicKey) -> String {
        public_key
            .fingerprint()
            .to_string()
            .chars()
            .filter(char::is_ascii_hexdigit)
            .map(|c| c.to_ascii_uppercase())
            .collect()
    }

    /// Validity period set by the newest self-signature.
    fn key_expiration(public_key: &SignedPublicKey) -> Option<Duration> {
        let user_signatures = public_key
            .details
            .users
            .iter()
            .flat_map(|user| user.signatures.iter());

        let self_signatures = public_key
            .details
            .direct_signatures
            .iter()
            .chain(user_signatures)
            .filter_map(|sig| sig.config())
            .map(|config| {
                let mut created = None;
                let mut validity = None;
                for subpkt in &config.hashed_subpackets {
                    match &subpkt.data {
                        SubpacketData::SignatureCreationTime(time) => {
                            created = Some(time.clone());
                        }
                        SubpacketData::KeyExpirationTime(period) => validity = Some(*period),
                        _ => {}
                    }
                }
                (created, validity)
            });

        newest_validity(self_signatures)
    }

    fn algorithm_name(algorithm: PublicKeyAlgorithm) -> String {
        match algorithm {
            PublicKeyAlgorithm::RSA
            | PublicKeyAlgorithm::RSASign
            | PublicKeyAlgorithm::RSAEncrypt => "RSA".to_string(),
            PublicKeyAlgorithm::DSA => "DSA".to_string(),
            PublicKeyAlgorithm::ECDSA => "ECDSA".to_string(),
            PublicKeyAlgorithm::ECDH => "ECDH".to_string(),
            PublicKeyAlgorithm::EdDSALegacy => "EdDSA".to_string(),
            other => format!("{:?}", other),
        }
    }
}

/// Picks the validity of the signature with the latest creation time.
/// Ties go to the later signature. A newest signature without an expiry,
/// or with a zero period, means the key does not expire.
fn newest_validity<I>(signatures: I) -> Option<Duration>
where
    I: IntoIterator<Item = (Option<DateTime<Utc>>, Option<Duration>)>,
{
    signatures
        .into_iter()
        .enumerate()
        .max_by_key(|(index, (created, _))| (*created, *index))
        .and_then(|(_, (_, validity))| validity)
        .filter(|validity| *validity > Duration::zero())
}
