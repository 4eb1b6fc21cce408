//! Outgoing message builder and RFC 5322 rendering.

use crate::address::{Address, Mailbox};
use crate::content_type::ContentType;
use crate::encoding::{encode_base64_wrapped, encode_quoted_printable, encode_rfc2047};
use crate::error::{Error, Result};
use crate::header::Headers;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use std::fmt::Write as _;

/// Message priority, rendered as an `X-Priority` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    /// 1 (Highest).
    Highest = 1,
    /// 2 (High).
    High = 2,
    /// 3 (Normal).
    Normal = 3,
    /// 4 (Low).
    Low = 4,
    /// 5 (Lowest).
    Lowest = 5,
}

impl Priority {
    /// Returns the `X-Priority` header value.
    #[must_use]
    pub const fn header_value(self) -> &'static str {
        match self {
            Self::Highest => "1 (Highest)",
            Self::High => "2 (High)",
            Self::Normal => "3 (Normal)",
            Self::Low => "4 (Low)",
            Self::Lowest => "5 (Lowest)",
        }
    }
}

/// A file attached to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Raw content.
    pub content: Bytes,
    /// File name shown to the recipient.
    pub filename: Option<String>,
    /// Content type; `application/octet-stream` when unknown.
    pub content_type: Option<ContentType>,
    /// Render inline instead of as a download.
    pub inline: bool,
}

impl Attachment {
    /// Creates an attachment from raw content.
    #[must_use]
    pub fn new(content: impl Into<Bytes>) -> Self {
        Self {
            content: content.into(),
            filename: None,
            content_type: None,
            inline: false,
        }
    }

    /// Sets the file name.
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Sets the content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = Some(content_type);
        self
    }

    /// Marks the attachment as inline.
    #[must_use]
    pub const fn inline(mut self) -> Self {
        self.inline = true;
        self
    }

    fn render(&self, out: &mut String) -> Result<()> {
        let mut headers = Headers::new();
        let mut content_type = self
            .content_type
            .clone()
            .unwrap_or_else(ContentType::octet_stream);
        let disposition = if self.inline { "inline" } else { "attachment" };

        match &self.filename {
            Some(name) => {
                let name = encode_rfc2047(name, "utf-8");
                content_type = content_type.with_parameter("name", name.clone());
                headers.add("Content-Type", content_type.to_string())?;
                headers.add(
                    "Content-Disposition",
                    format!("{disposition}; filename=\"{}\"", name.replace('"', "\\\"")),
                )?;
            }
            None => {
                headers.add("Content-Type", content_type.to_string())?;
                headers.add("Content-Disposition", disposition)?;
            }
        }
        headers.add("Content-Transfer-Encoding", "base64")?;

        let _ = write!(out, "{headers}\r\n");
        out.push_str(&encode_base64_wrapped(&self.content));
        Ok(())
    }
}

/// SMTP envelope derived from a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Reverse path (`MAIL FROM`).
    pub sender: Address,
    /// Forward paths (`RCPT TO`), To recipients first, then Bcc.
    pub recipients: Vec<Address>,
}

/// An outgoing email.
///
/// Built fluently, then rendered with [`Email::render`]. Bcc recipients are
/// part of the [`Envelope`] but never of the rendered headers.
#[derive(Debug, Clone, Default)]
pub struct Email {
    from: Option<Mailbox>,
    to: Vec<Mailbox>,
    bcc: Vec<Mailbox>,
    subject: Option<String>,
    priority: Option<Priority>,
    html: Option<String>,
    text: Option<String>,
    attachments: Vec<Attachment>,
}

impl Email {
    /// Creates an empty message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sender.
    #[must_use]
    pub fn from(mut self, mailbox: Mailbox) -> Self {
        self.from = Some(mailbox);
        self
    }

    /// Adds a To recipient.
    #[must_use]
    pub fn to(mut self, mailbox: Mailbox) -> Self {
        self.to.push(mailbox);
        self
    }

    /// Adds a blind-copy recipient.
    #[must_use]
    pub fn bcc(mut self, mailbox: Mailbox) -> Self {
        self.bcc.push(mailbox);
        self
    }

    /// Sets the subject.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets the HTML body.
    #[must_use]
    pub fn html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    /// Sets the plain-text body.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Attaches a file.
    #[must_use]
    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Returns the sender.
    #[must_use]
    pub const fn sender(&self) -> Option<&Mailbox> {
        self.from.as_ref()
    }

    /// Returns the To recipients.
    #[must_use]
    pub fn recipients(&self) -> &[Mailbox] {
        &self.to
    }

    /// Returns the blind-copy recipients.
    #[must_use]
    pub fn bcc_recipients(&self) -> &[Mailbox] {
        &self.bcc
    }

    /// Returns the subject.
    #[must_use]
    pub fn subject_text(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority_level(&self) -> Option<Priority> {
        self.priority
    }

    /// Returns the HTML body.
    #[must_use]
    pub fn html_body(&self) -> Option<&str> {
        self.html.as_deref()
    }

    /// Returns the plain-text body.
    #[must_use]
    pub fn text_body(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Returns the attachments.
    #[must_use]
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Derives the SMTP envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no sender or no recipient at all.
    pub fn envelope(&self) -> Result<Envelope> {
        let sender = self.from.as_ref().ok_or(Error::MissingHeader("From"))?;
        let recipients: Vec<Address> = self
            .to
            .iter()
            .chain(&self.bcc)
            .map(|m| m.address.clone())
            .collect();

        if recipients.is_empty() {
            return Err(Error::MissingHeader("To"));
        }

        Ok(Envelope {
            sender: sender.address.clone(),
            recipients,
        })
    }

    /// Renders the message as RFC 5322 bytes with the current date.
    ///
    /// # Errors
    ///
    /// Returns an error if required parts are missing or a header is invalid.
    pub fn render(&self) -> Result<Vec<u8>> {
        self.render_at(Utc::now())
    }

    /// Renders the message as RFC 5322 bytes with the given date.
    ///
    /// # Errors
    ///
    /// Returns an error if required parts are missing or a header is invalid.
    pub fn render_at(&self, date: DateTime<Utc>) -> Result<Vec<u8>> {
        let from = self.from.as_ref().ok_or(Error::MissingHeader("From"))?;
        if self.to.is_empty() && self.bcc.is_empty() {
            return Err(Error::MissingHeader("To"));
        }
        if self.html.is_none() && self.text.is_none() && self.attachments.is_empty() {
            return Err(Error::EmptyBody);
        }

        let mut headers = Headers::new();
        headers.add("Date", date.to_rfc2822())?;
        headers.add(
            "Message-ID",
            format!("<{}@{}>", random_token(32), from.address.domain()),
        )?;
        headers.add("From", from.to_header_value())?;
        if !self.to.is_empty() {
            let to: Vec<String> = self.to.iter().map(Mailbox::to_header_value).collect();
            headers.add("To", to.join(", "))?;
        }
        if let Some(subject) = &self.subject {
            headers.add("Subject", encode_rfc2047(subject, "utf-8"))?;
        }
        if let Some(priority) = self.priority {
            headers.add("X-Priority", priority.header_value())?;
        }
        headers.add("MIME-Version", "1.0")?;

        let mut out = headers.to_string();
        self.render_body(&mut out)?;
        Ok(out.into_bytes())
    }

    fn render_body(&self, out: &mut String) -> Result<()> {
        if self.attachments.is_empty() {
            return self.render_text_parts(out);
        }

        let boundary = boundary();
        let _ = write!(
            out,
            "Content-Type: {}\r\n\r\n",
            ContentType::multipart_mixed(&boundary)
        );

        if self.html.is_some() || self.text.is_some() {
            let _ = write!(out, "--{boundary}\r\n");
            self.render_text_parts(out)?;
            out.push_str("\r\n");
        }

        for attachment in &self.attachments {
            let _ = write!(out, "--{boundary}\r\n");
            attachment.render(out)?;
        }

        let _ = write!(out, "--{boundary}--\r\n");
        Ok(())
    }

    fn render_text_parts(&self, out: &mut String) -> Result<()> {
        match (&self.text, &self.html) {
            (Some(text), Some(html)) => {
                let boundary = boundary();
                let _ = write!(
                    out,
                    "Content-Type: {}\r\n\r\n",
                    ContentType::multipart_alternative(&boundary)
                );
                let _ = write!(out, "--{boundary}\r\n");
                render_text_part(out, ContentType::text_plain(), text);
                let _ = write!(out, "\r\n--{boundary}\r\n");
                render_text_part(out, ContentType::text_html(), html);
                let _ = write!(out, "\r\n--{boundary}--\r\n");
            }
            (Some(text), None) => render_text_part(out, ContentType::text_plain(), text),
            (None, Some(html)) => render_text_part(out, ContentType::text_html(), html),
            (None, None) => {}
        }
        Ok(())
    }
}

fn render_text_part(out: &mut String, content_type: ContentType, body: &str) {
    let _ = write!(
        out,
        "Content-Type: {content_type}\r\nContent-Transfer-Encoding: quoted-printable\r\n\r\n{}",
        encode_quoted_printable(body)
    );
}

fn boundary() -> String {
    format!("=_herald_{}", random_token(24))
}

fn random_token(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
