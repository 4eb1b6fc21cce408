//! Notification dispatch.

use crate::attachment::AttachmentResolver;
use crate::capability::{Notification, ServerConfig};
use crate::config::{ClientOptions, LocalFallback};
use crate::error::DispatchError;
use crate::result::NotificationResult;
use crate::stamp::Stamper;
use crate::target::ConnectionTarget;
use async_trait::async_trait;
use herald_mime::{Email, Mailbox, MimeProbes, Priority, html_to_text};
use herald_smtp::Transport;
use std::sync::Arc;

/// Sends notifications and reports the outcome as data.
#[async_trait]
pub trait Client: Send + Sync {
    /// Dispatches one notification.
    ///
    /// Never fails: every error ends up in the returned result.
    async fn dispatch(&self, notification: &dyn Notification) -> NotificationResult;
}

/// Turns a connection target into a transport.
pub trait TransportFactory: Send + Sync {
    /// Creates the transport for `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if the target is malformed or names no known transport.
    fn from_target(&self, target: &str) -> herald_smtp::Result<Box<dyn Transport>>;
}

/// Creates transports with [`herald_smtp::from_dsn`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DsnTransportFactory;

impl TransportFactory for DsnTransportFactory {
    fn from_target(&self, target: &str) -> herald_smtp::Result<Box<dyn Transport>> {
        herald_smtp::from_dsn(target)
    }
}

/// Builds a message from a notification.
///
/// The message is sent with high priority. The content becomes the HTML body
/// and, converted with [`html_to_text`], the text body. Subject, blind-copy
/// recipients and attachments are added only when the notification has the
/// matching capability.
///
/// # Errors
///
/// Returns an error if an address is malformed or an attachment cannot be read.
pub fn assemble(notification: &dyn Notification, probes: &MimeProbes) -> Result<Email, DispatchError> {
    let content = notification.content();
    let mut email = Email::new()
        .from(Mailbox::parse(notification.sender())?)
        .to(Mailbox::parse(notification.receiver())?)
        .priority(Priority::High)
        .html(content)
        .text(html_to_text(content));

    if let Some(subject) = notification.as_subject() {
        email = email.subject(subject.subject());
    }

    if let Some(bcc) = notification.as_attached_addresses() {
        for address in bcc.attached_addresses() {
            email = email.bcc(Mailbox::parse(address)?);
        }
    }

    if let Some(attachments) = notification.as_attachments() {
        for resolved in AttachmentResolver::new(attachments.attachments(), probes) {
            email = email.attach(resolved?.into_attachment());
        }
    }

    Ok(email)
}

/// Dispatches notifications to the server `S` describes.
pub struct SmtpClient<S> {
    server: S,
    factory: Arc<dyn TransportFactory>,
    probes: MimeProbes,
    stamper: Stamper,
    options: ClientOptions,
}

impl<S: ServerConfig> SmtpClient<S> {
    /// Creates a client with the default transport factory, probes and stamper.
    pub fn new(server: S) -> Self {
        Self {
            server,
            factory: Arc::new(DsnTransportFactory),
            probes: MimeProbes::default(),
            stamper: Stamper::system(),
            options: ClientOptions::default(),
        }
    }

    /// Replaces the transport factory.
    #[must_use]
    pub fn with_transport_factory(mut self, factory: impl TransportFactory + 'static) -> Self {
        self.factory = Arc::new(factory);
        self
    }

    /// Replaces the MIME probes.
    #[must_use]
    pub fn with_probes(mut self, probes: MimeProbes) -> Self {
        self.probes = probes;
        self
    }

    /// Replaces the result stamper.
    #[must_use]
    pub fn with_stamper(mut self, stamper: Stamper) -> Self {
        self.stamper = stamper;
        self
    }

    /// Replaces the client options.
    #[must_use]
    pub const fn with_options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// The server descriptor.
    pub const fn server(&self) -> &S {
        &self.server
    }

    /// Builds the connection target, honoring [`LocalFallback`].
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unusable host, or for local
    /// delivery when it is denied.
    pub fn connection_target(&self) -> Result<ConnectionTarget, DispatchError> {
        let target = ConnectionTarget::from_server(&self.server)?;
        if target.is_local() && self.options.local_fallback == LocalFallback::Deny {
            return Err(DispatchError::Configuration(
                "no SMTP server configured and local delivery is denied".into(),
            ));
        }
        Ok(target)
    }

    async fn try_dispatch(&self, notification: &dyn Notification) -> Result<(), DispatchError> {
        let target = self.connection_target()?;
        tracing::debug!(target_dsn = %target, receiver = notification.receiver(), "Dispatching notification");

        let email = assemble(notification, &self.probes)?;
        let transport = self.factory.from_target(target.as_str())?;
        transport.send(&email).await?;
        Ok(())
    }
}

#[async_trait]
impl<S: ServerConfig> Client for SmtpClient<S> {
    async fn dispatch(&self, notification: &dyn Notification) -> NotificationResult {
        let result = NotificationResult::stamped(self.try_dispatch(notification).await, &self.stamper);

        match result.error() {
            None => tracing::info!(id = result.id(), "Notification sent"),
            Some(e) => tracing::info!(id = result.id(), error = %e, "Notification failed"),
        }
        result
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for SmtpClient<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpClient")
            .field("server", &self.server)
            .field("probes", &self.probes)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
