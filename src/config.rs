//! Runtime settings
//!
//! Defaults, then an optional `settings.json`, then `PGPDESK_*` environment
//! variables (a `.env` file is loaded by the binary before this runs).

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::validation::MAX_INPUT_BYTES;
use crate::crypto::pgp::{CipherChoice, KeyAlgorithm};

pub const ENV_MAX_INPUT_BYTES: &str = "PGPDESK_MAX_INPUT_BYTES";
pub const ENV_MIN_PASSPHRASE_LENGTH: &str = "PGPDESK_MIN_PASSPHRASE_LENGTH";
pub const ENV_KEY_ALGORITHM: &str = "PGPDESK_KEY_ALGORITHM";
pub const ENV_LOG: &str = "PGPDESK_LOG";

const DEFAULT_MIN_PASSPHRASE_LENGTH: usize = 12;
const DEFAULT_LOG_FILTER: &str = "pgpdesk=info";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Ceiling for any single input, in bytes.
    pub max_input_bytes: usize,
    /// Minimum passphrase length for new keys.
    pub min_passphrase_length: usize,
    pub default_key_algorithm: KeyAlgorithm,
    pub symmetric_algorithm: CipherChoice,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_input_bytes: MAX_INPUT_BYTES,
            min_passphrase_length: DEFAULT_MIN_PASSPHRASE_LENGTH,
            default_key_algorithm: KeyAlgorithm::default(),
            symmetric_algorithm: CipherChoice::default(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Settings {
    /// Load settings from an optional JSON file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_env(|name| std::env::var(name).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))
    }

    /// Overlay values from `lookup` (normally `std::env::var`).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_MAX_INPUT_BYTES) {
            self.max_input_bytes = value
                .trim()
                .parse()
                .with_context(|| format!("{} must be a number of bytes", ENV_MAX_INPUT_BYTES))?;
        }
        if let Some(value) = lookup(ENV_MIN_PASSPHRASE_LENGTH) {
            self.min_passphrase_length = value
                .trim()
                .parse()
                .with_context(|| format!("{} must be a number", ENV_MIN_PASSPHRASE_LENGTH))?;
        }
        if let Some(value) = lookup(ENV_KEY_ALGORITHM) {
            self.default_key_algorithm = KeyAlgorithm::parse(&value).ok_or_else(|| {
                anyhow!("Unknown key algorithm in {}: {}", ENV_KEY_ALGORITHM, value)
            })?;
        }
        if let Some(value) = lookup(ENV_LOG) {
            self.log_filter = value;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_input_bytes == 0 {
            return Err(anyhow!("maxInputBytes must be greater than zero"));
        }
        if self.min_passphrase_length == 0 {
            return Err(anyhow!("minPassphraseLength must be greater than zero"));
        }
        Ok(())
    }
}
