//! Capability contracts for notifications and server descriptors.
//!
//! A notification always has a sender, a receiver and content. Everything
//! else is an optional capability the client asks for through the `as_*`
//! queries; a type that lacks a capability answers `None`, which is
//! different from answering with an empty value.

use crate::attachment::AttachmentSource;
use std::sync::Arc;

/// A message to dispatch.
pub trait Notification: Send + Sync {
    /// Sender mailbox, e.g. `a@x.com` or `Name <a@x.com>`.
    fn sender(&self) -> &str;

    /// Receiver mailbox.
    fn receiver(&self) -> &str;

    /// Body markup.
    fn content(&self) -> &str;

    /// The subject capability, if present.
    fn as_subject(&self) -> Option<&dyn HasSubject> {
        None
    }

    /// The blind-copy recipients capability, if present.
    fn as_attached_addresses(&self) -> Option<&dyn HasAttachedAddresses> {
        None
    }

    /// The attachments capability, if present.
    fn as_attachments(&self) -> Option<&dyn HasAttachments> {
        None
    }
}

/// A notification with a subject line.
pub trait HasSubject {
    /// The subject.
    fn subject(&self) -> &str;
}

/// A notification with blind-copy recipients.
pub trait HasAttachedAddresses {
    /// Recipients in the order they are added to the message.
    fn attached_addresses(&self) -> &[String];
}

/// A notification with attachments.
pub trait HasAttachments {
    /// Attachment sources, resolved at dispatch time.
    fn attachments(&self) -> &[AttachmentSource];
}

/// Describes where and how to deliver.
pub trait ServerConfig: Send + Sync {
    /// Server host; `None` means no server is configured.
    fn host(&self) -> Option<&str>;

    /// Server port; `None` means the default.
    fn port(&self) -> Option<u16>;

    /// The credentials capability, if present.
    fn as_credentials(&self) -> Option<&dyn HasSecretCredentials> {
        None
    }

    /// The encryption capability, if present.
    fn as_encryption(&self) -> Option<&dyn HasEncryption> {
        None
    }
}

/// A server descriptor with a client identifier and secret.
pub trait HasSecretCredentials {
    /// Login name.
    fn client_id(&self) -> Option<&str>;

    /// Password or token.
    fn client_secret(&self) -> Option<&str>;
}

/// A server descriptor with an encryption mode, e.g. `"tls"`.
pub trait HasEncryption {
    /// The encryption mode.
    fn encryption(&self) -> Option<&str>;
}

macro_rules! forward_notification {
    ($($ty:ty),*) => {$(
        impl<T: Notification + ?Sized> Notification for $ty {
            fn sender(&self) -> &str {
                (**self).sender()
            }
            fn receiver(&self) -> &str {
                (**self).receiver()
            }
            fn content(&self) -> &str {
                (**self).content()
            }
            fn as_subject(&self) -> Option<&dyn HasSubject> {
                (**self).as_subject()
            }
            fn as_attached_addresses(&self) -> Option<&dyn HasAttachedAddresses> {
                (**self).as_attached_addresses()
            }
            fn as_attachments(&self) -> Option<&dyn HasAttachments> {
                (**self).as_attachments()
            }
        }
    )*};
}

macro_rules! forward_server_config {
    ($($ty:ty),*) => {$(
        impl<T: ServerConfig + ?Sized> ServerConfig for $ty {
            fn host(&self) -> Option<&str> {
                (**self).host()
            }
            fn port(&self) -> Option<u16> {
                (**self).port()
            }
            fn as_credentials(&self) -> Option<&dyn HasSecretCredentials> {
                (**self).as_credentials()
            }
            fn as_encryption(&self) -> Option<&dyn HasEncryption> {
                (**self).as_encryption()
            }
        }
    )*};
}

forward_notification!(&T, Box<T>, Arc<T>);
forward_server_config!(&T, Box<T>, Arc<T>);

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    struct Ping;

    impl Notification for Ping {
        fn sender(&self) -> &str {
            "ops@x.com"
        }
        fn receiver(&self) -> &str {
            "oncall@x.com"
        }
        fn content(&self) -> &str {
            "<p>ping</p>"
        }
    }

    struct Titled(&'static str);

    impl Notification for Titled {
        fn sender(&self) -> &str {
            "ops@x.com"
        }
        fn receiver(&self) -> &str {
            "oncall@x.com"
        }
        fn content(&self) -> &str {
            ""
        }
        fn as_subject(&self) -> Option<&dyn HasSubject> {
            Some(self)
        }
    }

    impl HasSubject for Titled {
        fn subject(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn test_capabilities_default_to_absent() {
        assert!(Ping.as_subject().is_none());
        assert!(Ping.as_attached_addresses().is_none());
        assert!(Ping.as_attachments().is_none());
    }

    #[test]
    fn test_empty_subject_is_still_present() {
        assert_eq!(Titled("").as_subject().map(HasSubject::subject), Some(""));
    }

    #[test]
    fn test_forwarding_through_pointers() {
        let boxed: Box<dyn Notification> = Box::new(Titled("Hi"));
        assert_eq!(boxed.as_subject().unwrap().subject(), "Hi");

        let shared = Arc::new(Ping);
        assert_eq!((&shared).receiver(), "oncall@x.com");
        assert!(shared.as_subject().is_none());
    }
}
