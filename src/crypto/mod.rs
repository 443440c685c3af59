//! Cryptographic operations for pgpdesk
//!
//! All primitives are delegated to rPGP; this module only wraps its API
//! in functions that take and return armored text.

pub mod pgp;

pub use self::pgp::{
    CipherChoice, KeyAlgorithm, KeyGenParams, KeyInspector, PgpCipher, PgpKeyManager, PgpSigner,
    SecurePassphrase, VerifiedSignature,
};
