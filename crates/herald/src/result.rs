//! The outcome of a dispatch.

use crate::error::DispatchError;
use crate::stamp::Stamper;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::sync::Arc;

/// Success or failure of one dispatch, with when it happened and an id.
///
/// A failed result always carries the error that caused it; a successful one
/// never does. Cloning shares the error.
#[derive(Debug, Clone)]
pub struct NotificationResult {
    timestamp: DateTime<Utc>,
    id: u64,
    error: Option<Arc<DispatchError>>,
}

impl NotificationResult {
    /// A successful result. Missing timestamp or id are filled in from the
    /// system clock and a time-plus-random id.
    #[must_use]
    pub fn ok(timestamp: Option<DateTime<Utc>>, id: Option<u64>) -> Self {
        Self::build(None, timestamp, id)
    }

    /// A failed result carrying `error`.
    #[must_use]
    pub fn failure(error: DispatchError, timestamp: Option<DateTime<Utc>>, id: Option<u64>) -> Self {
        Self::build(Some(error), timestamp, id)
    }

    /// Stamps an outcome with `stamper`.
    pub(crate) fn stamped(outcome: Result<(), DispatchError>, stamper: &Stamper) -> Self {
        let (timestamp, id) = stamper.stamp();
        Self {
            timestamp,
            id,
            error: outcome.err().map(Arc::new),
        }
    }

    fn build(error: Option<DispatchError>, timestamp: Option<DateTime<Utc>>, id: Option<u64>) -> Self {
        let (timestamp, id) = match (timestamp, id) {
            (Some(timestamp), Some(id)) => (timestamp, id),
            (timestamp, id) => {
                let (now, generated) = Stamper::system().stamp();
                (timestamp.unwrap_or(now), id.unwrap_or(generated))
            }
        };
        Self {
            timestamp,
            id,
            error: error.map(Arc::new),
        }
    }

    /// Timestamp in ISO-8601 form, e.g. `2024-01-02T03:04:05+00:00`.
    #[must_use]
    pub fn timestamp(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, false)
    }

    /// Timestamp as a date-time value.
    #[must_use]
    pub const fn date_time(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Result identifier.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Whether the dispatch succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// The error behind a failed dispatch.
    #[must_use]
    pub fn error(&self) -> Option<&DispatchError> {
        self.error.as_deref()
    }
}

impl Serialize for NotificationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("NotificationResult", 4)?;
        state.serialize_field("timestamp", &self.timestamp())?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("success", &self.is_success())?;
        state.serialize_field("error", &self.error.as_ref().map(ToString::to_string))?;
        state.end()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;
    use crate::stamp::{FixedClock, SequentialIds};
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
    }

    #[test]
    fn test_ok_identity() {
        let result = NotificationResult::ok(Some(at()), Some(7));
        assert!(result.is_success());
        assert!(result.error().is_none());
        assert_eq!(result.id(), 7);
        assert_eq!(result.timestamp(), "2024-01-02T03:04:05+00:00");
        assert_eq!(result.date_time(), at());
    }

    #[test]
    fn test_failure_identity() {
        let result = NotificationResult::failure(DispatchError::Configuration("bad host".into()), None, None);
        assert!(!result.is_success());
        assert!(matches!(result.error(), Some(DispatchError::Configuration(msg)) if msg == "bad host"));
    }

    #[test]
    fn test_defaults_are_generated() {
        let before = Utc::now().timestamp();
        let result = NotificationResult::ok(None, None);
        let after = Utc::now().timestamp();

        let seconds = result.date_time().timestamp();
        assert!((before..=after).contains(&seconds));
        assert!(result.id().to_string().starts_with(&seconds.to_string()));
    }

    #[test]
    fn test_partial_defaults() {
        let result = NotificationResult::ok(Some(at()), None);
        assert_eq!(result.date_time(), at());

        let result = NotificationResult::ok(None, Some(3));
        assert_eq!(result.id(), 3);
    }

    #[test]
    fn test_clone_shares_error() {
        let result = NotificationResult::failure(DispatchError::Configuration("x".into()), None, None);
        let copy = result.clone();
        assert!(std::ptr::eq(result.error().unwrap(), copy.error().unwrap()));
    }

    #[test]
    fn test_stamped() {
        let stamper = Stamper::new(FixedClock(at()), SequentialIds::starting_at(10));
        let ok = NotificationResult::stamped(Ok(()), &stamper);
        let failed = NotificationResult::stamped(Err(DispatchError::Configuration("x".into())), &stamper);

        assert_eq!((ok.id(), ok.is_success()), (10, true));
        assert_eq!((failed.id(), failed.is_success()), (11, false));
    }

    #[test]
    fn test_serialize() {
        let result = NotificationResult::failure(DispatchError::Configuration("no host".into()), Some(at()), Some(5));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "timestamp": "2024-01-02T03:04:05+00:00",
                "id": 5,
                "success": false,
                "error": "Configuration error: no host",
            })
        );
    }
}
