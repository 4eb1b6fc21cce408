//! # herald-mime
//!
//! Message construction for herald.
//!
//! ## Features
//!
//! - **Message building**: [`Email`] with sender, recipients, blind copies,
//!   subject, priority, HTML and plain-text bodies, attachments
//! - **Rendering**: RFC 5322 output with `multipart/alternative` and
//!   `multipart/mixed` structure
//! - **Encoding**: Base64, Quoted-Printable, RFC 2047 header encoding
//! - **HTML fallback**: [`html_to_text`] derives the plain-text alternative
//! - **MIME probing**: best-effort content type detection for attachments
//!
//! ## Quick Start
//!
//! ```ignore
//! use herald_mime::{Attachment, Email, Mailbox, Priority, html_to_text};
//!
//! let html = "<p>Hello</p>";
//! let email = Email::new()
//!     .from(Mailbox::parse("Alice <a@example.com>")?)
//!     .to(Mailbox::parse("b@example.com")?)
//!     .subject("Hi")
//!     .priority(Priority::High)
//!     .html(html)
//!     .text(html_to_text(html))
//!     .attach(Attachment::new(std::fs::read("report.pdf")?).with_filename("report.pdf"));
//!
//! let bytes = email.render()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod address;
mod content_type;
mod email;
mod error;
mod header;
mod html;

pub mod encoding;
pub mod probe;

pub use address::{Address, Mailbox};
pub use content_type::ContentType;
pub use email::{Attachment, Email, Envelope, Priority};
pub use error::{Error, Result};
pub use header::Headers;
pub use html::{decode_entities, html_to_text};
pub use probe::{ExtensionProbe, MagicProbe, MimeProbe, MimeProbes, NoProbe};
