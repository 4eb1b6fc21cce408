//! The stock notification type.

use crate::attachment::AttachmentSource;
use crate::capability::{HasAttachedAddresses, HasAttachments, HasSubject, Notification};

/// An email notification.
///
/// Exposes exactly the capabilities it was given: a `Mail` built without
/// [`Mail::subject`] has no subject capability, one built with an empty
/// subject has an empty subject.
#[derive(Debug, Clone, Default)]
pub struct Mail {
    sender: String,
    receiver: String,
    content: String,
    subject: Option<String>,
    bcc: Option<Vec<String>>,
    attachments: Option<Vec<AttachmentSource>>,
}

impl Mail {
    /// Creates an empty mail.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sender.
    #[must_use]
    pub fn from(mut self, sender: impl Into<String>) -> Self {
        self.sender = sender.into();
        self
    }

    /// Sets the receiver.
    #[must_use]
    pub fn to(mut self, receiver: impl Into<String>) -> Self {
        self.receiver = receiver.into();
        self
    }

    /// Sets the HTML content.
    #[must_use]
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Sets the subject.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Adds a blind-copy recipient.
    #[must_use]
    pub fn bcc(mut self, address: impl Into<String>) -> Self {
        self.bcc.get_or_insert_with(Vec::new).push(address.into());
        self
    }

    /// Adds an attachment.
    #[must_use]
    pub fn attach(mut self, source: impl Into<AttachmentSource>) -> Self {
        self.attachments.get_or_insert_with(Vec::new).push(source.into());
        self
    }
}

impl Notification for Mail {
    fn sender(&self) -> &str {
        &self.sender
    }

    fn receiver(&self) -> &str {
        &self.receiver
    }

    fn content(&self) -> &str {
        &self.content
    }

    fn as_subject(&self) -> Option<&dyn HasSubject> {
        self.subject.is_some().then_some(self as &dyn HasSubject)
    }

    fn as_attached_addresses(&self) -> Option<&dyn HasAttachedAddresses> {
        self.bcc.is_some().then_some(self as &dyn HasAttachedAddresses)
    }

    fn as_attachments(&self) -> Option<&dyn HasAttachments> {
        self.attachments.is_some().then_some(self as &dyn HasAttachments)
    }
}

impl HasSubject for Mail {
    fn subject(&self) -> &str {
        self.subject.as_deref().unwrap_or_default()
    }
}

impl HasAttachedAddresses for Mail {
    fn attached_addresses(&self) -> &[String] {
        self.bcc.as_deref().unwrap_or_default()
    }
}

impl HasAttachments for Mail {
    fn attachments(&self) -> &[AttachmentSource] {
        self.attachments.as_deref().unwrap_or_default()
    }
}
