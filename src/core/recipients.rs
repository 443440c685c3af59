//! Recipient list for the encrypt form
//!
//! Each entry holds the raw key text the user pasted plus the result of
//! the last validation. Entries live only as long as the form.

use chrono::{DateTime, Utc};
use pgp::composed::SignedPublicKey;
use serde::Serialize;

use crate::core::error::PgpError;
use crate::core::validation::{self, ArmorKind};
use crate::crypto::pgp::{KeyInspector, PgpKeyManager};
use crate::types::KeyInfo;

pub type RecipientId = u32;

/// One recipient row.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    pub id: RecipientId,
    pub key_text: String,
    pub key_info: Option<KeyInfo>,
    pub error: Option<String>,
    #[serde(skip)]
    parsed: Option<SignedPublicKey>,
}

impl Recipient {
    fn new(id: RecipientId) -> Self {
        Self {
            id,
            key_text: String::new(),
            key_info: None,
            error: None,
            parsed: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.parsed.is_some() && self.error.is_none()
    }

    pub fn is_blank(&self) -> bool {
        self.key_text.trim().is_empty()
    }

    fn reset_validation(&mut self) {
        self.key_info = None;
        self.error = None;
        self.parsed = None;
    }
}

/// Ordered recipients with at least one (possibly empty) row.
#[derive(Debug, Clone)]
pub struct RecipientList {
    entries: Vec<Recipient>,
    next_id: RecipientId,
    max_input_bytes: usize,
}

impl RecipientList {
    pub fn new(max_input_bytes: usize) -> Self {
        let mut list = Self {
            entries: Vec::new(),
            next_id: 1,
            max_input_bytes,
        };
        list.add();
        list
    }

    /// Append an empty row and return its id.
    pub fn add(&mut self) -> RecipientId {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(Recipient::new(id));
        id
    }

    /// Remove a row. Removing the last row leaves a fresh empty one.
    pub fn remove(&mut self, id: RecipientId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|r| r.id != id);
        let removed = self.entries.len() != before;
        if self.entries.is_empty() {
            self.add();
        }
        removed
    }

    /// Store new key text; the previous validation no longer applies.
    pub fn update(&mut self, id: RecipientId, key_text: impl Into<String>) -> Result<(), PgpError> {
        let entry = self.get_mut(id)?;
        entry.key_text = key_text.into();
        entry.reset_validation();
        Ok(())
    }

    /// Validate a single row, as on blur. Returns whether the row is usable.
    pub fn validate(&mut self, id: RecipientId) -> Result<bool, PgpError> {
        let index = self
            .entries
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| PgpError::validation("Unknown recipient."))?;

        let outcome = self.check_entry(index);
        let entry = &mut self.entries[index];
        entry.reset_validation();
        match outcome {
            Ok((key, info)) => {
                entry.key_info = Some(info);
                entry.parsed = Some(key);
                Ok(true)
            }
            Err(err) => {
                entry.error = Some(err.user_message());
                Ok(false)
            }
        }
    }

    /// Validate every non-empty row; returns the first problem found.
    ///
    /// Empty rows are ignored as long as at least one row has a key.
    pub fn validate_all(&mut self) -> Result<(), PgpError> {
        if self.is_empty() {
            return Err(PgpError::validation("Please add at least one recipient."));
        }

        let ids: Vec<RecipientId> = self
            .entries
            .iter()
            .filter(|r| !r.is_blank())
            .map(|r| r.id)
            .collect();
        for id in ids {
            self.validate(id)?;
        }

        match self.entries.iter().find(|r| !r.is_blank() && !r.is_valid()) {
            Some(bad) => Err(PgpError::validation(
                bad.error
                    .clone()
                    .unwrap_or_else(|| "Invalid recipient key.".to_string()),
            )),
            None => Ok(()),
        }
    }

    fn check_entry(&self, index: usize) -> Result<(SignedPublicKey, KeyInfo), PgpError> {
        let entry = &self.entries[index];
        if entry.is_blank() {
            return Err(PgpError::validation("Please paste the recipient's public key."));
        }

        validation::validate_size(&entry.key_text, self.max_input_bytes)?;
        // Pasting a private key here is almost always a mistake.
        validation::validate_armor(&entry.key_text, ArmorKind::PublicKey)?;

        let key = PgpKeyManager::parse_public_key(&entry.key_text).map_err(|e| {
            tracing::debug!("Recipient {} key rejected: {:#}", entry.id, e);
            PgpError::Key
        })?;
        let info = KeyInspector::key_info(&key);
        ensure_not_expired(&info, Utc::now())?;

        let duplicate = self.entries[..index].iter().any(|earlier| {
            earlier
                .key_info
                .as_ref()
                .is_some_and(|other| other.fingerprint == info.fingerprint)
        });
        if duplicate {
            return Err(PgpError::validation("This key has already been added."));
        }

        Ok((key, info))
    }

    /// Keys of all valid rows, in order.
    pub fn parsed_keys(&self) -> Vec<SignedPublicKey> {
        self.entries
            .iter()
            .filter_map(|r| r.parsed.clone())
            .collect()
    }

    pub fn fingerprints(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter_map(|r| r.key_info.as_ref().map(|info| info.fingerprint.clone()))
            .collect()
    }

    pub fn get(&self, id: RecipientId) -> Option<&Recipient> {
        self.entries.iter().find(|r| r.id == id)
    }

    fn get_mut(&mut self, id: RecipientId) -> Result<&mut Recipient, PgpError> {
        self.entries
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| PgpError::validation("Unknown recipient."))
    }

    pub fn entries(&self) -> &[Recipient] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(Recipient::is_blank)
    }

    /// Drop every row and start over with one empty row.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.add();
    }
}

fn ensure_not_expired(info: &KeyInfo, now: DateTime<Utc>) -> Result<(), PgpError> {
    if info.is_expired_at(now) {
        return Err(PgpError::validation("This key has expired."));
    }
    Ok(())
}
