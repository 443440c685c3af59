//! PGP cryptographic operations.
//!
//! This module is the only place that talks to rPGP:
//! - Key generation, parsing and passphrase unlocking
//! - Read-only key inspection
//! - Message encryption and decryption
//! - Cleartext and detached signatures

pub mod inspect;
pub mod keypair;
pub mod message;
pub mod signing;

pub use inspect::KeyInspector;
pub use keypair::{KeyAlgorithm, KeyGenParams, PgpKeyManager, SecurePassphrase};
pub use message::{CipherChoice, PgpCipher};
pub use signing::{PgpSigner, VerifiedSignature};
