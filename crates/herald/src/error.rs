//! Error types for dispatch.

use std::io;
use std::path::PathBuf;

/// Errors that can occur while dispatching a notification.
///
/// These never escape [`Client::dispatch`](crate::Client::dispatch); they are
/// carried inside a failed [`NotificationResult`](crate::NotificationResult).
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The server descriptor cannot be turned into a connection target.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The message could not be built from the notification.
    #[error("Message assembly failed: {0}")]
    Assembly(#[from] herald_mime::Error),

    /// An attachment could not be read.
    #[error("Cannot read attachment {}: {source}", path.display())]
    AttachmentRead {
        /// File path, or the stream's URI.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The transport could not be created or failed to deliver.
    #[error("Transport error: {0}")]
    Transport(#[from] herald_smtp::Error),
}

impl DispatchError {
    pub(crate) fn attachment_read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::AttachmentRead {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_transport_error_keeps_source() {
        let io = io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused");
        let err = DispatchError::from(herald_smtp::Error::from(io));

        assert_eq!(err.to_string(), "Transport error: I/O error: connection refused");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_attachment_read_display() {
        let err = DispatchError::attachment_read(
            "/tmp/missing.pdf",
            io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        );
        assert_eq!(
            err.to_string(),
            "Cannot read attachment /tmp/missing.pdf: No such file or directory"
        );
    }
}
