//! Best-effort MIME type probing for attachment files.
//!
//! Probing is advisory: every probe answers `None` rather than failing, so a
//! missing or broken facility only loses the content type, never the
//! attachment.

use crate::content_type::ContentType;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

/// Number of leading bytes inspected by [`MagicProbe`].
const SNIFF_LEN: usize = 512;

/// A facility that guesses the content type of a file by its path.
pub trait MimeProbe: Send + Sync {
    /// Returns the content type of the file at `path`, if it can be determined.
    fn probe(&self, path: &Path) -> Option<ContentType>;
}

/// Guesses the content type from the file extension alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionProbe;

impl MimeProbe for ExtensionProbe {
    fn probe(&self, path: &Path) -> Option<ContentType> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        let (main, sub) = match ext.as_str() {
            "txt" | "text" | "log" => ("text", "plain"),
            "htm" | "html" => ("text", "html"),
            "css" => ("text", "css"),
            "csv" => ("text", "csv"),
            "ics" => ("text", "calendar"),
            "md" => ("text", "markdown"),
            "xml" => ("application", "xml"),
            "json" => ("application", "json"),
            "pdf" => ("application", "pdf"),
            "zip" => ("application", "zip"),
            "gz" => ("application", "gzip"),
            "doc" => ("application", "msword"),
            "docx" => (
                "application",
                "vnd.openxmlformats-officedocument.wordprocessingml.document",
            ),
            "xls" => ("application", "vnd.ms-excel"),
            "xlsx" => (
                "application",
                "vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            ),
            "odt" => ("application", "vnd.oasis.opendocument.text"),
            "png" => ("image", "png"),
            "jpg" | "jpeg" => ("image", "jpeg"),
            "gif" => ("image", "gif"),
            "webp" => ("image", "webp"),
            "svg" => ("image", "svg+xml"),
            "mp3" => ("audio", "mpeg"),
            "wav" => ("audio", "wav"),
            "mp4" => ("video", "mp4"),
            "eml" => ("message", "rfc822"),
            _ => return None,
        };
        Some(ContentType::new(main, sub))
    }
}

/// Sniffs the leading bytes of the file, falling back to the extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct MagicProbe;

impl MagicProbe {
    /// Classifies a byte prefix by its signature.
    #[must_use]
    pub fn sniff(head: &[u8]) -> Option<ContentType> {
        let (main, sub) = if head.starts_with(b"%PDF-") {
            ("application", "pdf")
        } else if head.starts_with(b"\x89PNG\r\n\x1a\n") {
            ("image", "png")
        } else if head.starts_with(&[0xFF, 0xD8, 0xFF]) {
            ("image", "jpeg")
        } else if head.starts_with(b"GIF87a") || head.starts_with(b"GIF89a") {
            ("image", "gif")
        } else if head.len() >= 12 && head.starts_with(b"RIFF") && &head[8..12] == b"WEBP" {
            ("image", "webp")
        } else if head.starts_with(b"PK\x03\x04") {
            ("application", "zip")
        } else if head.starts_with(&[0x1F, 0x8B]) {
            ("application", "gzip")
        } else {
            return None;
        };
        Some(ContentType::new(main, sub))
    }

    fn looks_like_text(head: &[u8]) -> bool {
        if head.contains(&0) {
            return false;
        }
        match std::str::from_utf8(head) {
            Ok(_) => true,
            // A multi-byte character cut off by the sniff window is still text.
            Err(e) => e.error_len().is_none() && e.valid_up_to() + 4 > head.len(),
        }
    }
}

impl MimeProbe for MagicProbe {
    fn probe(&self, path: &Path) -> Option<ContentType> {
        let mut head = Vec::with_capacity(SNIFF_LEN);
        let read = File::open(path).and_then(|file| file.take(SNIFF_LEN as u64).read_to_end(&mut head));
        if let Err(e) = read {
            tracing::debug!(path = %path.display(), error = %e, "MIME sniffing skipped");
            return None;
        }

        Self::sniff(&head)
            .or_else(|| ExtensionProbe.probe(path))
            .or_else(|| {
                if head.is_empty() {
                    Some(ContentType::new("application", "x-empty"))
                } else if Self::looks_like_text(&head) {
                    Some(ContentType::new("text", "plain"))
                } else {
                    Some(ContentType::octet_stream())
                }
            })
    }
}

/// A probe that never answers, standing in for an unavailable facility.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProbe;

impl MimeProbe for NoProbe {
    fn probe(&self, _path: &Path) -> Option<ContentType> {
        None
    }
}

/// The two probing facilities used while resolving attachments.
///
/// `by_path` serves streams that only carry a URI; `sniff` serves files that
/// can be opened and inspected.
#[derive(Clone)]
pub struct MimeProbes {
    /// Content-type-by-path facility.
    pub by_path: Arc<dyn MimeProbe>,
    /// Content sniffing facility.
    pub sniff: Arc<dyn MimeProbe>,
}

impl MimeProbes {
    /// Both facilities disabled; every attachment resolves without a type.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            by_path: Arc::new(NoProbe),
            sniff: Arc::new(NoProbe),
        }
    }
}

impl Default for MimeProbes {
    fn default() -> Self {
        Self {
            by_path: Arc::new(ExtensionProbe),
            sniff: Arc::new(MagicProbe),
        }
    }
}

impl fmt::Debug for MimeProbes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MimeProbes").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, content: &[u8]) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        File::create(&path).unwrap().write_all(content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_extension_probe() {
        let ct = ExtensionProbe.probe(Path::new("/tmp/report.PDF")).unwrap();
        assert_eq!(ct.essence(), "application/pdf");
        assert!(ExtensionProbe.probe(Path::new("/tmp/noext")).is_none());
        assert!(ExtensionProbe.probe(Path::new("/tmp/file.unknownext")).is_none());
    }

    #[test]
    fn test_sniff_signatures() {
        assert_eq!(MagicProbe::sniff(b"%PDF-1.7\n").unwrap().essence(), "application/pdf");
        assert_eq!(
            MagicProbe::sniff(b"\x89PNG\r\n\x1a\n\0\0").unwrap().essence(),
            "image/png"
        );
        assert!(MagicProbe::sniff(b"hello").is_none());
    }

    #[test]
    fn test_magic_probe_prefers_content() {
        // Content wins over a misleading extension.
        let (_dir, path) = write_temp("bordereau.txt", b"%PDF-1.4 rest");
        assert_eq!(MagicProbe.probe(&path).unwrap().essence(), "application/pdf");
    }

    #[test]
    fn test_magic_probe_text_and_binary() {
        let (_dir, path) = write_temp("notes", "héllo wörld".as_bytes());
        assert_eq!(MagicProbe.probe(&path).unwrap().essence(), "text/plain");

        let (_dir, path) = write_temp("blob", &[0, 1, 2, 3, 0xFE]);
        assert_eq!(MagicProbe.probe(&path).unwrap().essence(), "application/octet-stream");
    }

    #[test]
    fn test_magic_probe_missing_file() {
        assert!(MagicProbe.probe(Path::new("/definitely/not/here.pdf")).is_none());
    }

    #[test]
    fn test_unavailable_probes() {
        let probes = MimeProbes::unavailable();
        let (_dir, path) = write_temp("a.pdf", b"%PDF-1.4");
        assert!(probes.sniff.probe(&path).is_none());
        assert!(probes.by_path.probe(&path).is_none());
    }
}
