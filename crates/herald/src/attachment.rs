//! Attachment sources and their resolution into message parts.

use crate::error::DispatchError;
use bytes::Bytes;
use herald_mime::{Attachment, ContentType, MimeProbes};
use std::fmt;
use std::fs;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::slice;
use std::sync::Arc;

type Opener = Arc<dyn Fn() -> io::Result<Box<dyn Read + Send>> + Send + Sync>;

/// Where an attachment's bytes come from.
#[derive(Clone)]
pub enum AttachmentSource {
    /// A stream opened afresh for every dispatch.
    Reader {
        /// Opens the stream.
        opener: Opener,
        /// Path-like name of the stream, used to guess the content type.
        uri: Option<PathBuf>,
    },
    /// A file on disk.
    File(PathBuf),
    /// An attachment already in message form, used as is.
    Prepared(Attachment),
}

impl AttachmentSource {
    /// A stream source. `opener` is called once per dispatch.
    pub fn reader<F, R>(opener: F, uri: Option<PathBuf>) -> Self
    where
        F: Fn() -> io::Result<R> + Send + Sync + 'static,
        R: Read + Send + 'static,
    {
        Self::Reader {
            opener: Arc::new(move || opener().map(|r| Box::new(r) as Box<dyn Read + Send>)),
            uri,
        }
    }

    /// An in-memory stream source.
    pub fn bytes(content: impl Into<Bytes>, uri: Option<PathBuf>) -> Self {
        let content = content.into();
        Self::reader(move || Ok(Cursor::new(content.clone())), uri)
    }

    /// A file source.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }
}

impl From<Attachment> for AttachmentSource {
    fn from(attachment: Attachment) -> Self {
        Self::Prepared(attachment)
    }
}

impl fmt::Debug for AttachmentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reader { uri, .. } => f.debug_struct("Reader").field("uri", uri).finish_non_exhaustive(),
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
            Self::Prepared(attachment) => f.debug_tuple("Prepared").field(attachment).finish(),
        }
    }
}

/// An attachment source after its content has been read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// Content read from a stream or file.
    Content {
        /// All bytes of the source.
        content: Bytes,
        /// Base name, for file sources.
        filename: Option<String>,
        /// Probed content type, if any.
        content_type: Option<ContentType>,
    },
    /// A prepared attachment, unchanged.
    Prepared(Attachment),
}

impl Resolved {
    /// Converts into a message attachment.
    #[must_use]
    pub fn into_attachment(self) -> Attachment {
        match self {
            Self::Content {
                content,
                filename,
                content_type,
            } => Attachment {
                content,
                filename,
                content_type,
                inline: false,
            },
            Self::Prepared(attachment) => attachment,
        }
    }
}

/// Lazily resolves attachment sources, one per iteration step.
///
/// Created per dispatch and consumed once. Content-type probing never fails
/// a step; it only leaves the type unset.
#[derive(Debug)]
pub struct AttachmentResolver<'a> {
    sources: slice::Iter<'a, AttachmentSource>,
    probes: &'a MimeProbes,
}

impl<'a> AttachmentResolver<'a> {
    /// Creates a resolver over `sources`.
    #[must_use]
    pub fn new(sources: &'a [AttachmentSource], probes: &'a MimeProbes) -> Self {
        Self {
            sources: sources.iter(),
            probes,
        }
    }

    fn resolve(&self, source: &AttachmentSource) -> Result<Resolved, DispatchError> {
        match source {
            AttachmentSource::Reader { opener, uri } => {
                let label = uri.clone().unwrap_or_else(|| PathBuf::from("<stream>"));
                let mut content = Vec::new();
                opener()
                    .and_then(|mut reader| reader.read_to_end(&mut content))
                    .map_err(|e| DispatchError::attachment_read(&label, e))?;

                let content_type = uri.as_deref().and_then(|uri| self.probes.by_path.probe(uri));
                log_untyped(&label, content_type.as_ref());
                Ok(Resolved::Content {
                    content: content.into(),
                    filename: None,
                    content_type,
                })
            }
            AttachmentSource::File(path) => self.resolve_file(path),
            AttachmentSource::Prepared(attachment) => Ok(Resolved::Prepared(attachment.clone())),
        }
    }

    fn resolve_file(&self, path: &Path) -> Result<Resolved, DispatchError> {
        let canonical = fs::canonicalize(path).map_err(|e| DispatchError::attachment_read(path, e))?;
        if !canonical.is_file() {
            return Err(DispatchError::attachment_read(
                path,
                io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
            ));
        }
        let content = fs::read(&canonical).map_err(|e| DispatchError::attachment_read(path, e))?;

        let filename = canonical
            .file_name()
            .or_else(|| path.file_name())
            .map(|name| name.to_string_lossy().into_owned());
        let content_type = self.probes.sniff.probe(&canonical);
        log_untyped(path, content_type.as_ref());

        Ok(Resolved::Content {
            content: content.into(),
            filename,
            content_type,
        })
    }
}

impl Iterator for AttachmentResolver<'_> {
    type Item = Result<Resolved, DispatchError>;

    fn next(&mut self) -> Option<Self::Item> {
        let source = self.sources.next()?;
        Some(self.resolve(source))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.sources.size_hint()
    }
}

fn log_untyped(path: &Path, content_type: Option<&ContentType>) {
    if content_type.is_none() {
        tracing::debug!(path = %path.display(), "No content type for attachment");
    }
}
