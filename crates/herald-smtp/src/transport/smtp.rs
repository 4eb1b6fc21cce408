//! SMTP transport (RFC 5321) with implicit TLS or opportunistic STARTTLS.

use super::Transport;
use crate::connection::{Session, connect, tls_handshake};
use crate::dsn::{DEFAULT_TIMEOUT, Dsn, Scheme};
use crate::error::{Error, Result};
use async_trait::async_trait;
use herald_mime::{Email, Envelope};
use std::fmt;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};

/// TLS mode of an [`SmtpTransport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Security {
    /// TLS from the first byte (`smtps`).
    Implicit,
    /// Plain connection, upgraded when the server offers STARTTLS.
    Opportunistic,
    /// Plain connection, never upgraded.
    None,
}

/// Delivers messages to an SMTP server, one connection per message.
#[derive(Clone)]
pub struct SmtpTransport {
    host: String,
    port: u16,
    security: Security,
    credentials: Option<(String, String)>,
    local_domain: String,
    timeout: Duration,
}

impl SmtpTransport {
    /// Creates a transport for `host:port` with the given security mode.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16, security: Security) -> Self {
        Self {
            host: host.into(),
            port,
            security,
            credentials: None,
            local_domain: "localhost".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the credentials used for AUTH.
    #[must_use]
    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((user.into(), password.into()));
        self
    }

    /// Sets the name announced in EHLO.
    #[must_use]
    pub fn with_local_domain(mut self, local_domain: impl Into<String>) -> Self {
        self.local_domain = local_domain.into();
        self
    }

    /// Sets the per-step network timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Creates a transport from an `smtp://` or `smtps://` DSN.
    ///
    /// # Errors
    ///
    /// Returns an error if the DSN has another scheme or invalid options.
    pub fn from_dsn(dsn: &Dsn) -> Result<Self> {
        let security = match dsn.scheme {
            Scheme::Smtps => Security::Implicit,
            Scheme::Smtp if dsn.auto_tls()? => Security::Opportunistic,
            Scheme::Smtp => Security::None,
            other => return Err(Error::UnsupportedScheme(other.to_string())),
        };

        let mut transport = Self::new(&dsn.host, dsn.port_or_default(), security)
            .with_local_domain(dsn.local_domain())
            .with_timeout(dsn.timeout()?);
        if let Some((user, password)) = dsn.credentials() {
            transport = transport.with_credentials(user, password);
        }
        Ok(transport)
    }

    async fn deliver<S>(&self, mut session: Session<S>, envelope: &Envelope, message: &[u8]) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        if let Some((user, password)) = &self.credentials {
            session.authenticate(user, password).await?;
        }
        session.send_mail(envelope, message).await?;

        // The message is already accepted; a failed QUIT changes nothing.
        if let Err(e) = session.quit().await {
            tracing::debug!(error = %e, "QUIT failed after delivery");
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for SmtpTransport {
    async fn send(&self, email: &Email) -> Result<()> {
        let envelope = email.envelope()?;
        let message = email.render()?;
        let tcp = connect(&self.host, self.port, self.timeout).await?;

        match self.security {
            Security::Implicit => {
                let tls = tls_handshake(tcp, &self.host, self.timeout).await?;
                let mut session = Session::open(tls, self.timeout).await?;
                session.ehlo(&self.local_domain).await?;
                self.deliver(session, &envelope, &message).await
            }
            Security::Opportunistic | Security::None => {
                let mut session = Session::open(tcp, self.timeout).await?;
                session.ehlo(&self.local_domain).await?;

                if self.security == Security::Opportunistic && session.server_info().supports_starttls() {
                    tracing::debug!(host = %self.host, "Upgrading with STARTTLS");
                    let tcp = session.starttls().await?;
                    let tls = tls_handshake(tcp, &self.host, self.timeout).await?;
                    let mut session = Session::resume(tls, self.timeout);
                    session.ehlo(&self.local_domain).await?;
                    self.deliver(session, &envelope, &message).await
                } else {
                    self.deliver(session, &envelope, &message).await
                }
            }
        }
    }

    fn name(&self) -> String {
        let scheme = if self.security == Security::Implicit { "smtps" } else { "smtp" };
        match &self.credentials {
            Some((user, _)) => format!("{scheme}://{}:***@{}:{}", urlencoding::encode(user), self.host, self.port),
            None => format!("{scheme}://{}:{}", self.host, self.port),
        }
    }
}

impl fmt::Debug for SmtpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpTransport")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("security", &self.security)
            .field("user", &self.credentials.as_ref().map(|(user, _)| user))
            .field("local_domain", &self.local_domain)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
