//! SMTP protocol session over any byte stream.

use super::ServerInfo;
use crate::command::Command;
use crate::error::{Error, Result};
use crate::parser::{is_last_reply_line, parse_reply};
use crate::types::{AuthMechanism, Extension, Reply, ReplyCode};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use herald_mime::Envelope;
use std::collections::HashSet;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

/// Upper bound on reply lines, guarding against a misbehaving server.
const MAX_REPLY_LINES: usize = 512;

/// An SMTP session.
///
/// Generic over the stream so the same protocol code drives plain TCP, TLS,
/// and in-memory test streams. Every read and write is bounded by `timeout`.
#[derive(Debug)]
pub struct Session<S> {
    stream: BufReader<S>,
    server_info: ServerInfo,
    timeout: Duration,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wraps a fresh connection and reads the server greeting.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the greeting fails or the server refuses service.
    pub async fn open(stream: S, timeout: Duration) -> Result<Self> {
        let mut session = Self::resume(stream, timeout);

        let greeting = session
            .read_reply()
            .await?
            .expect_code(ReplyCode::SERVICE_READY)?;

        // First word of the greeting is the server's name
        session.server_info.hostname = greeting
            .message
            .first()
            .and_then(|msg| msg.split_whitespace().next())
            .unwrap_or("unknown")
            .to_string();
        tracing::debug!(server = %session.server_info.hostname, "Greeting received");

        Ok(session)
    }

    /// Wraps a stream whose greeting has already been consumed (after STARTTLS).
    pub fn resume(stream: S, timeout: Duration) -> Self {
        Self {
            stream: BufReader::new(stream),
            server_info: ServerInfo::default(),
            timeout,
        }
    }

    /// Returns the server information.
    pub const fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    /// Sends EHLO and records the server's extensions.
    ///
    /// # Errors
    ///
    /// Returns an error if the EHLO command fails.
    pub async fn ehlo(&mut self, client_hostname: &str) -> Result<()> {
        let reply = self
            .command(Command::Ehlo {
                hostname: client_hostname.to_string(),
            })
            .await?
            .expect_success()?;

        // First line echoes the server name, the rest are extensions
        self.server_info.extensions = reply
            .message
            .iter()
            .skip(1)
            .map(|line| Extension::parse(line))
            .collect::<HashSet<_>>();

        Ok(())
    }

    /// Requests a TLS upgrade and hands back the raw stream for the handshake.
    ///
    /// # Errors
    ///
    /// Returns an error if STARTTLS is not advertised or the server refuses it.
    pub async fn starttls(mut self) -> Result<S> {
        if !self.server_info.supports_starttls() {
            return Err(Error::NotSupported("STARTTLS".into()));
        }

        self.command(Command::StartTls)
            .await?
            .expect_code(ReplyCode::SERVICE_READY)?;

        Ok(self.stream.into_inner())
    }

    /// Authenticates, preferring PLAIN over LOGIN.
    ///
    /// # Errors
    ///
    /// Returns an error if the server offers no usable mechanism or rejects the
    /// credentials.
    pub async fn authenticate(&mut self, username: &str, password: &str) -> Result<()> {
        let mechanisms = self
            .server_info
            .auth_mechanisms()
            .ok_or_else(|| Error::NotSupported("AUTH".into()))?;

        let mechanism = if mechanisms.contains(&AuthMechanism::Plain) {
            AuthMechanism::Plain
        } else if mechanisms.contains(&AuthMechanism::Login) {
            AuthMechanism::Login
        } else {
            return Err(Error::NotSupported("AUTH PLAIN or LOGIN".into()));
        };
        tracing::debug!(mechanism = mechanism.as_str(), "Authenticating");

        match mechanism {
            AuthMechanism::Plain => {
                let credentials = format!("\0{username}\0{password}");
                self.command(Command::Auth {
                    mechanism,
                    initial_response: Some(STANDARD.encode(credentials.as_bytes())),
                })
                .await?
                .expect_code(ReplyCode::AUTH_SUCCEEDED)?;
            }
            AuthMechanism::Login => {
                self.command(Command::Auth {
                    mechanism,
                    initial_response: None,
                })
                .await?
                .expect_code(ReplyCode::AUTH_CONTINUE)?;
                self.command(Command::AuthResponse(STANDARD.encode(username)))
                    .await?
                    .expect_code(ReplyCode::AUTH_CONTINUE)?;
                self.command(Command::AuthResponse(STANDARD.encode(password)))
                    .await?
                    .expect_code(ReplyCode::AUTH_SUCCEEDED)?;
            }
        }

        Ok(())
    }

    /// Runs one mail transaction: MAIL FROM, RCPT TO for each recipient, DATA.
    ///
    /// The message is sent with CRLF line endings and dot-stuffing.
    ///
    /// # Errors
    ///
    /// Returns an error if the message is too large or any step is rejected.
    /// The transaction is reset on rejection so the session stays usable.
    pub async fn send_mail(&mut self, envelope: &Envelope, message: &[u8]) -> Result<()> {
        if let Some(limit) = self.server_info.max_message_size()
            && limit > 0
            && message.len() > limit
        {
            return Err(Error::MessageTooLarge {
                size: message.len(),
                limit,
            });
        }

        let result = self.transaction(envelope, message).await;
        if let Err(Error::SmtpError { .. }) = &result {
            // Best effort; the original rejection is what the caller needs.
            if let Err(e) = self.command(Command::Rset).await {
                tracing::debug!(error = %e, "RSET after rejection failed");
            }
        }
        result
    }

    async fn transaction(&mut self, envelope: &Envelope, message: &[u8]) -> Result<()> {
        let eight_bit = !message.is_ascii() && self.server_info.supports(&Extension::EightBitMime);
        let size = self.server_info.supports_size().then_some(message.len());

        self.command(Command::MailFrom {
            from: envelope.sender.clone(),
            eight_bit,
            size,
        })
        .await?
        .expect_success()?;

        for recipient in &envelope.recipients {
            self.command(Command::RcptTo {
                to: recipient.clone(),
            })
            .await?
            .expect_success()?;
        }

        self.command(Command::Data)
            .await?
            .expect_code(ReplyCode::START_DATA)?;

        self.write(&dot_stuff(message)).await?;
        let reply = self.read_reply().await?.expect_success()?;
        tracing::debug!(reply = %reply.message_text(), "Message accepted");

        Ok(())
    }

    /// Sends QUIT and closes the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the QUIT command fails.
    pub async fn quit(mut self) -> Result<()> {
        self.command(Command::Quit).await?.expect_success()?;
        Ok(())
    }

    async fn command(&mut self, cmd: Command) -> Result<Reply> {
        tracing::trace!(command = %cmd.redacted(), "C:");
        self.write(&cmd.serialize()).await?;
        self.read_reply().await
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        let timeout = self.timeout;
        let stream = self.stream.get_mut();
        tokio::time::timeout(timeout, async {
            stream.write_all(data).await?;
            stream.flush().await
        })
        .await
        .map_err(|_| Error::Timeout(timeout))?
        .map_err(Into::into)
    }

    async fn read_reply(&mut self) -> Result<Reply> {
        let mut lines = Vec::new();

        loop {
            let mut line = String::new();
            let read = tokio::time::timeout(self.timeout, self.stream.read_line(&mut line))
                .await
                .map_err(|_| Error::Timeout(self.timeout))??;

            if read == 0 {
                return Err(Error::Protocol("Connection closed by server".into()));
            }

            let line = line.trim_end().to_string();
            if line.is_empty() {
                continue;
            }
            tracing::trace!(%line, "S:");

            let is_last = is_last_reply_line(&line);
            lines.push(line);

            if is_last {
                break;
            }
            if lines.len() >= MAX_REPLY_LINES {
                return Err(Error::Protocol("Reply has too many lines".into()));
            }
        }

        parse_reply(&lines)
    }
}

/// Normalizes line endings to CRLF, escapes leading dots, and appends the
/// terminating `.` line.
fn dot_stuff(message: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(message.len() + message.len() / 64 + 5);
    let body = message
        .strip_suffix(b"\n")
        .map_or(message, |m| m.strip_suffix(b"\r").unwrap_or(m));

    if !body.is_empty() {
        for line in body.split(|&b| b == b'\n') {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            if line.first() == Some(&b'.') {
                out.push(b'.');
            }
            out.extend_from_slice(line);
            out.extend_from_slice(b"\r\n");
        }
    }

    out.extend_from_slice(b".\r\n");
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_stuff_normalizes_and_terminates() {
        assert_eq!(dot_stuff(b"a\nb"), b"a\r\nb\r\n.\r\n");
        assert_eq!(dot_stuff(b"a\r\nb\r\n"), b"a\r\nb\r\n.\r\n");
        assert_eq!(dot_stuff(b".hidden\r\n..two"), b"..hidden\r\n...two\r\n.\r\n");
        assert_eq!(dot_stuff(b""), b".\r\n");
    }

    #[test]
    fn test_dot_stuff_keeps_blank_lines() {
        assert_eq!(dot_stuff(b"h: v\r\n\r\nbody"), b"h: v\r\n\r\nbody\r\n.\r\n");
    }

    #[tokio::test]
    async fn test_ehlo_exchange() {
        use tokio_test::io::Builder;

        let mock = Builder::new()
            .read(b"220 smtp.test ESMTP\r\n")
            .write(b"EHLO client.test\r\n")
            .read(b"250-smtp.test greets you\r\n250-SIZE 1000\r\n250 8BITMIME\r\n")
            .write(b"QUIT\r\n")
            .read(b"221 bye\r\n")
            .build();

        let mut session = Session::open(mock, Duration::from_secs(5)).await.unwrap();
        session.ehlo("client.test").await.unwrap();

        assert_eq!(session.server_info().hostname, "smtp.test");
        assert_eq!(session.server_info().max_message_size(), Some(1000));
        assert!(session.server_info().supports(&Extension::EightBitMime));
        assert!(!session.server_info().supports_starttls());
        session.quit().await.unwrap();
    }

    #[tokio::test]
    async fn test_mail_from_announces_8bit() {
        use tokio_test::io::Builder;

        let envelope = Envelope {
            sender: crate::Address::new("a@x.com").unwrap(),
            recipients: vec![crate::Address::new("b@x.com").unwrap()],
        };
        let mock = Builder::new()
            .read(b"220 smtp.test\r\n")
            .write(b"EHLO client.test\r\n")
            .read(b"250-smtp.test\r\n250 8BITMIME\r\n")
            .write(b"MAIL FROM:<a@x.com> BODY=8BITMIME\r\n")
            .read(b"250 ok\r\n")
            .write(b"RCPT TO:<b@x.com>\r\n")
            .read(b"250 ok\r\n")
            .write(b"DATA\r\n")
            .read(b"354 go\r\n")
            .write("caf\u{e9}\r\n.\r\n".as_bytes())
            .read(b"250 queued\r\n")
            .build();

        let mut session = Session::open(mock, Duration::from_secs(5)).await.unwrap();
        session.ehlo("client.test").await.unwrap();
        session.send_mail(&envelope, "caf\u{e9}".as_bytes()).await.unwrap();
    }

    #[tokio::test]
    async fn test_quit_refused() {
        use tokio_test::io::Builder;

        let mock = Builder::new()
            .read(b"220 smtp.test\r\n")
            .write(b"QUIT\r\n")
            .read(b"500 not now\r\n")
            .build();

        let session = Session::open(mock, Duration::from_secs(5)).await.unwrap();
        assert!(matches!(
            session.quit().await,
            Err(Error::SmtpError { code: 500, .. })
        ));
    }
}
