//! Best-effort wiping of sensitive form fields.
//!
//! Fields holding plaintext, private keys or passphrases are zeroed when a
//! form is cleared or dropped. Copies made inside the PGP library or by
//! the allocator on reallocation are out of reach.

use std::fmt;

use zeroize::{Zeroize, Zeroizing};

/// A form field whose contents are zeroed on replace, clear and drop.
#[derive(Default, Clone)]
pub struct SensitiveText(Zeroizing<String>);

impl SensitiveText {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    /// Replace the contents, wiping the old buffer first.
    pub fn set(&mut self, value: impl Into<String>) {
        self.0.zeroize();
        *self.0 = value.into();
    }

    pub fn clear(&mut self) {
        self.0.zeroize();
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Debug for SensitiveText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SensitiveText({} bytes)", self.0.len())
    }
}

impl From<String> for SensitiveText {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SensitiveText {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Zero a plain `String` in place and leave it empty.
pub fn wipe_string(value: &mut String) {
    value.zeroize();
}

/// Zero a byte buffer in place and leave it empty.
pub fn wipe_bytes(value: &mut Vec<u8>) {
    value.zeroize();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_replaces_and_clear_empties() {
        let mut field = SensitiveText::new("first secret");
        field.set("second");
        assert_eq!(field.as_str(), "second");

        field.clear();
        assert!(field.is_empty());
        assert_eq!(field.len(), 0);
    }

    #[test]
    fn test_debug_does_not_print_contents() {
        let field = SensitiveText::new("hunter2hunter2");
        let rendered = format!("{:?}", field);
        assert!(!rendered.contains("hunter2"));
        assert_eq!(rendered, "SensitiveText(14 bytes)");
    }

    #[test]
    fn test_blank_detection() {
        assert!(SensitiveText::new("  \n").is_blank());
        assert!(!SensitiveText::new(" x ").is_blank());
    }

    #[test]
    fn test_wipe_helpers() {
        let mut s = String::from("plaintext");
        wipe_string(&mut s);
        assert!(s.is_empty());

        let mut b = b"plaintext".to_vec();
        wipe_bytes(&mut b);
        assert!(b.is_empty());
    }
}
