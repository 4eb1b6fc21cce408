//! Message header handling.

use crate::error::{Error, Result};
use std::fmt;

/// Ordered collection of message headers.
///
/// Headers are written in insertion order, names in the case they were
/// added with.
#[derive(Debug, Clone, Default)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header value.
    ///
    /// # Errors
    ///
    /// Returns an error if the name or value would break the header block.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let name = name.into();
        let value = value.into();
        Self::validate(&name, &value)?;
        self.entries.push((name, value));
        Ok(())
    }

    fn validate(name: &str, value: &str) -> Result<()> {
        if name.is_empty() || !name.bytes().all(|b| b.is_ascii_graphic() && b != b':') {
            return Err(Error::InvalidHeader(format!("Invalid header name: {name:?}")));
        }

        if value.contains(['\r', '\n']) {
            return Err(Error::InvalidHeader(format!(
                "Line break in value of header {name}"
            )));
        }

        Ok(())
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.entries {
            write!(f, "{name}: {value}\r\n")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_reject_injection() {
        let mut headers = Headers::new();
        assert!(headers.add("Subject", "Hi\r\nBcc: evil@example.com").is_err());
        assert!(headers.add("Subject", "Hi\nBcc: evil@example.com").is_err());
        assert!(headers.add("Bad Name", "x").is_err());
        assert!(headers.add("Bad:Name", "x").is_err());
        assert!(headers.add("", "x").is_err());
        assert_eq!(headers.to_string(), "");
    }

    #[test]
    fn test_headers_display_preserves_order() {
        let mut headers = Headers::new();
        headers.add("From", "sender@example.com").unwrap();
        headers.add("To", "recipient@example.com").unwrap();
        headers.add("to", "second@example.com").unwrap();

        assert_eq!(
            headers.to_string(),
            "From: sender@example.com\r\nTo: recipient@example.com\r\nto: second@example.com\r\n"
        );
    }
}
