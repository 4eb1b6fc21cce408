//! Server descriptors and client options.

use crate::capability::{HasEncryption, HasSecretCredentials, ServerConfig};
use crate::error::DispatchError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An SMTP server descriptor.
///
/// Missing or empty host, user or password means "no server", in which case
/// messages go to local delivery.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpServer {
    /// Server hostname.
    pub host: Option<String>,
    /// Server port (default: 25).
    pub port: Option<u16>,
    /// Username for authentication.
    pub user: Option<String>,
    /// Password for authentication.
    pub password: Option<String>,
    /// Encryption mode; `"tls"` selects `smtps`.
    pub encryption: Option<String>,
}

impl SmtpServer {
    /// Creates a descriptor for an authenticated server.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16, user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            host: Some(host.into()),
            port: Some(port),
            user: Some(user.into()),
            password: Some(password.into()),
            encryption: None,
        }
    }

    /// A descriptor with no server, selecting local delivery.
    #[must_use]
    pub fn local() -> Self {
        Self::default()
    }

    /// Sets the encryption mode.
    #[must_use]
    pub fn with_encryption(mut self, encryption: impl Into<String>) -> Self {
        self.encryption = Some(encryption.into());
        self
    }

    /// Loads a descriptor from JSON.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the JSON does not describe a server.
    pub fn from_json(json: &str) -> Result<Self, DispatchError> {
        serde_json::from_str(json).map_err(|e| DispatchError::Configuration(format!("invalid server JSON: {e}")))
    }
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|s| !s.is_empty())
}

impl ServerConfig for SmtpServer {
    fn host(&self) -> Option<&str> {
        non_empty(self.host.as_ref())
    }

    fn port(&self) -> Option<u16> {
        self.port
    }

    fn as_credentials(&self) -> Option<&dyn HasSecretCredentials> {
        Some(self)
    }

    fn as_encryption(&self) -> Option<&dyn HasEncryption> {
        self.encryption.is_some().then_some(self as &dyn HasEncryption)
    }
}

impl HasSecretCredentials for SmtpServer {
    fn client_id(&self) -> Option<&str> {
        non_empty(self.user.as_ref())
    }

    fn client_secret(&self) -> Option<&str> {
        non_empty(self.password.as_ref())
    }
}

impl HasEncryption for SmtpServer {
    fn encryption(&self) -> Option<&str> {
        self.encryption.as_deref()
    }
}

impl fmt::Debug for SmtpServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpServer")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("encryption", &self.encryption)
            .finish()
    }
}

/// What to do when no server is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocalFallback {
    /// Deliver through the local `sendmail` binary.
    #[default]
    Allow,
    /// Fail the dispatch with a configuration error.
    Deny,
}

/// Options for a dispatch client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    /// Behavior when the server descriptor is incomplete.
    pub local_fallback: LocalFallback,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json() {
        let server = SmtpServer::from_json(
            r#"{"host": "smtp.test", "port": 587, "user": "u", "password": "p", "encryption": "TLS"}"#,
        )
        .unwrap();
        assert_eq!(server, SmtpServer::new("smtp.test", 587, "u", "p").with_encryption("TLS"));
    }

    #[test]
    fn test_from_json_partial() {
        let server = SmtpServer::from_json(r#"{"host": "smtp.test"}"#).unwrap();
        assert_eq!(server.host(), Some("smtp.test"));
        assert!(server.port().is_none());
        assert!(server.as_credentials().unwrap().client_id().is_none());
        assert!(server.as_encryption().is_none());
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(matches!(
            SmtpServer::from_json(r#"{"port": "not a number"}"#),
            Err(DispatchError::Configuration(_))
        ));
    }

    #[test]
    fn test_empty_strings_are_absent() {
        let server = SmtpServer::new("", 25, "", "");
        assert!(server.host().is_none());
        let credentials = server.as_credentials().unwrap();
        assert!(credentials.client_id().is_none());
        assert!(credentials.client_secret().is_none());
    }

    #[test]
    fn test_debug_redacts_password() {
        let server = SmtpServer::new("smtp.test", 25, "u", "hunter2");
        let debug = format!("{server:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn test_client_options_json() {
        let options: ClientOptions = serde_json::from_str(r#"{"local_fallback": "deny"}"#).unwrap();
        assert_eq!(options.local_fallback, LocalFallback::Deny);
        assert_eq!(serde_json::from_str::<ClientOptions>("{}").unwrap(), ClientOptions::default());
    }
}
