//! Local delivery through a `sendmail`-compatible binary.

use super::Transport;
use crate::dsn::Dsn;
use crate::error::{Error, Result};
use async_trait::async_trait;
use herald_mime::Email;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Default sendmail location.
pub const DEFAULT_COMMAND: &str = "/usr/sbin/sendmail";

/// Pipes rendered messages to `sendmail -i -f <sender> -- <recipients>`.
#[derive(Debug, Clone)]
pub struct SendmailTransport {
    command: PathBuf,
}

impl SendmailTransport {
    /// Creates a transport using the given binary.
    #[must_use]
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Creates a transport from a `sendmail://` DSN (`?command=` overrides the binary).
    ///
    /// # Errors
    ///
    /// Currently infallible; kept fallible like the other transports.
    pub fn from_dsn(dsn: &Dsn) -> Result<Self> {
        Ok(Self::new(dsn.option("command").unwrap_or(DEFAULT_COMMAND)))
    }
}

impl Default for SendmailTransport {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND)
    }
}

#[async_trait]
impl Transport for SendmailTransport {
    async fn send(&self, email: &Email) -> Result<()> {
        let envelope = email.envelope()?;
        let message = email.render()?;

        let mut child = Command::new(&self.command)
            .arg("-i")
            .arg("-f")
            .arg(envelope.sender.as_str())
            .arg("--")
            .args(envelope.recipients.iter().map(|r| r.as_str()))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(&message).await {
                // The exit status below tells whether the program cared.
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
                other => other?,
            }
            drop(stdin);
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(Error::Sendmail {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        tracing::debug!(command = %self.command.display(), "Message handed to sendmail");
        Ok(())
    }

    fn name(&self) -> String {
        format!("sendmail:{}", self.command.display())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;
    use herald_mime::Mailbox;

    fn email() -> Email {
        Email::new()
            .from(Mailbox::parse("a@x.com").unwrap())
            .to(Mailbox::parse("b@x.com").unwrap())
            .text("hello")
    }

    #[test]
    fn test_from_dsn_command_override() {
        let dsn = Dsn::parse("sendmail://default?command=/opt/bin/sendmail").unwrap();
        assert_eq!(SendmailTransport::from_dsn(&dsn).unwrap().name(), "sendmail:/opt/bin/sendmail");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_exit() {
        let transport = SendmailTransport::new("true");
        assert!(transport.send(&email()).await.is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_exit() {
        let transport = SendmailTransport::new("false");
        assert!(matches!(transport.send(&email()).await, Err(Error::Sendmail { .. })));
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let transport = SendmailTransport::new("/nonexistent/herald-sendmail");
        assert!(matches!(transport.send(&email()).await, Err(Error::Io(_))));
    }
}
