//! Error types for transport operations.

use std::io;
use std::time::Duration;

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Transport error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// TLS error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Server returned error response.
    #[error("SMTP error {code}: {message}")]
    SmtpError {
        /// Reply code (e.g., 550).
        code: u16,
        /// Error message from server.
        message: String,
    },

    /// Protocol error (unexpected response).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Malformed connection target.
    #[error("Invalid DSN: {0}")]
    InvalidDsn(String),

    /// Connection target names a transport this crate does not provide.
    #[error("Unsupported scheme: {0}")]
    UnsupportedScheme(String),

    /// The message could not be turned into an envelope or rendered.
    #[error("Message error: {0}")]
    Message(#[from] herald_mime::Error),

    /// Message exceeds the size the server advertised.
    #[error("Message exceeds size limit: {size} bytes (server accepts {limit})")]
    MessageTooLarge {
        /// Rendered message size.
        size: usize,
        /// Advertised SIZE limit.
        limit: usize,
    },

    /// Feature not supported by server.
    #[error("Server does not support {0}")]
    NotSupported(String),

    /// A network step did not finish in time.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// The local sendmail program failed.
    #[error("sendmail exited with {status}: {stderr}")]
    Sendmail {
        /// Exit status description.
        status: String,
        /// Captured standard error.
        stderr: String,
    },
}

impl Error {
    /// Creates an SMTP error from a reply code and message.
    #[must_use]
    pub fn smtp_error(code: u16, message: impl Into<String>) -> Self {
        Self::SmtpError {
            code,
            message: message.into(),
        }
    }

    /// Returns true if this is a permanent error (5xx).
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::SmtpError { code, .. } if *code >= 500 && *code < 600)
    }

    /// Returns true if this is a transient error (4xx), a timeout or an I/O failure.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::SmtpError { code, .. } if *code >= 400 && *code < 500)
            || matches!(self, Self::Timeout(_) | Self::Io(_))
    }
}
