//! # herald
//!
//! Notification dispatch behind one operation with a uniform result.
//!
//! This crate provides:
//! - **Result model** - [`NotificationResult`] carries success or failure as data
//! - **Capabilities** - optional notification and server facets as traits
//! - **Connection targets** - server descriptor to `smtp`/`smtps` DSN, with a
//!   local `sendmail` fallback
//! - **Message assembly** - HTML plus text fallback, blind copies, attachments
//! - **Dispatch** - [`SmtpClient`] behind the [`Client`] trait, with injectable
//!   transports, MIME probes, clocks and id generators
//!
//! ## Quick Start
//!
//! ```ignore
//! use herald::{Client, Mail, SmtpClient, SmtpServer};
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = SmtpServer::new("smtp.example.com", 465, "user", "secret").with_encryption("tls");
//!     let client = SmtpClient::new(server);
//!
//!     let mail = Mail::new()
//!         .from("alerts@example.com")
//!         .to("oncall@example.com")
//!         .subject("Disk almost full")
//!         .content("<p>Only <b>3%</b> left on /var</p>");
//!
//!     let result = client.dispatch(&mail).await;
//!     if !result.is_success() {
//!         eprintln!("{}", serde_json::to_string(&result).unwrap_or_default());
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod attachment;
pub mod capability;
pub mod client;
pub mod config;
mod error;
pub mod mail;
mod result;
pub mod stamp;
pub mod target;

pub use attachment::{AttachmentResolver, AttachmentSource, Resolved};
pub use capability::{
    HasAttachedAddresses, HasAttachments, HasEncryption, HasSecretCredentials, HasSubject,
    Notification, ServerConfig,
};
pub use client::{Client, DsnTransportFactory, SmtpClient, TransportFactory, assemble};
pub use config::{ClientOptions, LocalFallback, SmtpServer};
pub use error::DispatchError;
pub use mail::Mail;
pub use result::NotificationResult;
pub use stamp::{Clock, FixedClock, IdGenerator, SequentialIds, Stamper, SystemClock, TimeRandomIds};
pub use target::{ConnectionTarget, LOCAL_DELIVERY, SSL_ENCRYPTION};
