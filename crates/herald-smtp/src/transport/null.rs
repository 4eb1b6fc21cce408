//! Transport that discards messages.

use super::Transport;
use crate::error::Result;
use async_trait::async_trait;
use herald_mime::Email;

/// Accepts and drops every message after checking it would render.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTransport;

#[async_trait]
impl Transport for NullTransport {
    async fn send(&self, email: &Email) -> Result<()> {
        let envelope = email.envelope()?;
        let message = email.render()?;
        tracing::debug!(
            recipients = envelope.recipients.len(),
            bytes = message.len(),
            "Message discarded"
        );
        Ok(())
    }

    fn name(&self) -> String {
        "null".to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;
    use herald_mime::Mailbox;

    #[tokio::test]
    async fn test_null_accepts_valid_message() {
        let email = Email::new()
            .from(Mailbox::parse("a@x.com").unwrap())
            .to(Mailbox::parse("b@x.com").unwrap())
            .text("x");
        assert!(NullTransport.send(&email).await.is_ok());
    }

    #[tokio::test]
    async fn test_null_rejects_incomplete_message() {
        assert!(NullTransport.send(&Email::new().text("x")).await.is_err());
    }
}
