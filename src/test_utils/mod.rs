//! Test utilities
//!
//! Freshly generated keypairs so no test depends on checked-in key material.

#![cfg(test)]

pub mod pgp_test_keys;

pub use pgp_test_keys::*;
