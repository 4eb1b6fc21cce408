//! Error types for message construction.

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// MIME error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid email address or mailbox.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Header value that cannot be written (e.g. embedded line break).
    #[error("Invalid MIME header: {0}")]
    InvalidHeader(String),

    /// A required part of the message was never set.
    #[error("Missing required header: {0}")]
    MissingHeader(&'static str),

    /// Message has neither a body nor attachments.
    #[error("Message has no body")]
    EmptyBody,
}
