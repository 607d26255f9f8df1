//! Inbound article metadata and queue envelopes.
//!
//! Everything here arrives from untrusted callers, so the public types can only
//! be obtained through validation. String values are kept exactly as received;
//! URLs and timestamps are checked, never re-serialized.

use chrono::{DateTime, Timelike};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use url::Url;

// ============================================================================
// ValidationError
// ============================================================================

/// Input was well-formed JSON but did not match the expected shape.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Missing field, wrong type or unknown field.
    #[error("malformed {shape}: {source}")]
    Shape {
        shape: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("field `{field}` is not an absolute URL: {source}")]
    InvalidUrl {
        field: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("field `timestamp` is not an ISO-8601 datetime: {0}")]
    InvalidTimestamp(String),
}

// ============================================================================
// ArticleMetadata
// ============================================================================

/// Metadata of a freshly published article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleMetadata {
    title: String,
    url: String,
    description: String,
    timestamp: String,
    #[serde(rename = "thumbnailURL")]
    thumbnail_url: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawArticleMetadata {
    title: String,
    url: String,
    description: String,
    timestamp: String,
    #[serde(rename = "thumbnailURL")]
    thumbnail_url: String,
}

impl ArticleMetadata {
    /// Validate untyped input.
    pub fn from_value(input: Value) -> Result<Self, ValidationError> {
        let raw: RawArticleMetadata =
            serde_json::from_value(input).map_err(|source| ValidationError::Shape {
                shape: "article metadata",
                source,
            })?;
        Self::validate(raw)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Publication time, as sent by the caller.
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn thumbnail_url(&self) -> &str {
        &self.thumbnail_url
    }

    fn validate(raw: RawArticleMetadata) -> Result<Self, ValidationError> {
        check_absolute_url("url", &raw.url)?;
        check_absolute_url("thumbnailURL", &raw.thumbnail_url)?;
        check_timestamp(&raw.timestamp)?;

        Ok(Self {
            title: raw.title,
            url: raw.url,
            description: raw.description,
            timestamp: raw.timestamp,
            thumbnail_url: raw.thumbnail_url,
        })
    }
}

fn check_absolute_url(field: &'static str, value: &str) -> Result<(), ValidationError> {
    // `Url::parse` has no base, so relative references are rejected here.
    Url::parse(value)
        .map(|_| ())
        .map_err(|source| ValidationError::InvalidUrl { field, source })
}

/// RFC 3339 narrowed to `YYYY-MM-DDTHH:MM:SS[.f](Z|+hh:mm|-hh:mm)`: uppercase
/// `T` and `Z` only, no leap seconds.
fn check_timestamp(value: &str) -> Result<(), ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidTimestamp(reason.to_string());

    let parsed = DateTime::parse_from_rfc3339(value).map_err(|e| invalid(&e.to_string()))?;
    if value.as_bytes().get(10) != Some(&b'T') {
        return Err(invalid("date and time must be separated by `T`"));
    }
    if value.ends_with('z') {
        return Err(invalid("UTC must be written as `Z`"));
    }
    if parsed.nanosecond() >= 1_000_000_000 {
        return Err(invalid("leap seconds are not accepted"));
    }
    Ok(())
}

// ============================================================================
// QueueEnvelope
// ============================================================================

/// Body of a queue message: the shared secret plus the article to announce.
#[derive(Debug, Clone)]
pub struct QueueEnvelope {
    token: String,
    content: ArticleMetadata,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawQueueEnvelope {
    token: String,
    content: Value,
}

impl QueueEnvelope {
    pub fn from_value(input: Value) -> Result<Self, ValidationError> {
        let raw: RawQueueEnvelope =
            serde_json::from_value(input).map_err(|source| ValidationError::Shape {
                shape: "queue envelope",
                source,
            })?;

        Ok(Self {
            token: raw.token,
            content: ArticleMetadata::from_value(raw.content)?,
        })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn content(&self) -> &ArticleMetadata {
        &self.content
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_article() -> Value {
        json!({
            "title": "Writing a relay in Rust",
            "url": "https://calpa.me/blog/relay",
            "description": "Notes on forwarding events.",
            "timestamp": "2025-04-01T08:30:00.000Z",
            "thumbnailURL": "https://assets.calpa.me/relay.png"
        })
    }

    fn without(field: &str) -> Value {
        let mut value = valid_article();
        value.as_object_mut().unwrap().remove(field);
        value
    }

    fn with(field: &str, replacement: Value) -> Value {
        let mut value = valid_article();
        value[field] = replacement;
        value
    }

    fn invalid_url_field(err: &ValidationError) -> Option<&'static str> {
        match err {
            ValidationError::InvalidUrl { field, .. } => Some(*field),
            _ => None,
        }
    }

    fn shape_of(err: &ValidationError) -> Option<&'static str> {
        match err {
            ValidationError::Shape { shape, .. } => Some(*shape),
            _ => None,
        }
    }

    #[test]
    fn test_valid_article_keeps_fields_verbatim() {
        let meta = ArticleMetadata::from_value(valid_article()).unwrap();
        assert_eq!(meta.title(), "Writing a relay in Rust");
        assert_eq!(meta.url(), "https://calpa.me/blog/relay");
        assert_eq!(meta.description(), "Notes on forwarding events.");
        assert_eq!(meta.timestamp(), "2025-04-01T08:30:00.000Z");
        assert_eq!(meta.thumbnail_url(), "https://assets.calpa.me/relay.png");
    }

    #[test]
    fn test_url_is_not_normalized() {
        let meta = ArticleMetadata::from_value(with("url", json!("https://calpa.me"))).unwrap();
        assert_eq!(meta.url(), "https://calpa.me");
    }

    #[test]
    fn test_each_missing_field_is_rejected() {
        for field in ["title", "url", "description", "timestamp", "thumbnailURL"] {
            let err = ArticleMetadata::from_value(without(field)).unwrap_err();
            assert!(
                matches!(err, ValidationError::Shape { .. }),
                "missing {field} should be a shape error, got {err}"
            );
            assert!(err.to_string().contains(field), "{err}");
        }
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        let err = ArticleMetadata::from_value(with("title", json!(42))).unwrap_err();
        assert!(matches!(err, ValidationError::Shape { .. }));

        let err = ArticleMetadata::from_value(with("description", Value::Null)).unwrap_err();
        assert!(matches!(err, ValidationError::Shape { .. }));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = ArticleMetadata::from_value(with("author", json!("calpa"))).unwrap_err();
        assert!(matches!(err, ValidationError::Shape { .. }));
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(ArticleMetadata::from_value(json!([1, 2, 3])).is_err());
        assert!(ArticleMetadata::from_value(json!("article")).is_err());
    }

    #[test]
    fn test_relative_urls_are_rejected() {
        let err = ArticleMetadata::from_value(with("url", json!("/blog/relay"))).unwrap_err();
        assert_eq!(invalid_url_field(&err), Some("url"));

        let input = with("thumbnailURL", json!("relay.png"));
        let err = ArticleMetadata::from_value(input).unwrap_err();
        assert_eq!(invalid_url_field(&err), Some("thumbnailURL"));
    }

    #[test]
    fn test_malformed_timestamps_are_rejected() {
        for timestamp in [
            "yesterday",
            "2025-04-01",
            "2025-13-01T00:00:00Z",
            "",
            "2025-04-01 08:30:00Z",
            "2025-04-01t08:30:00Z",
            "2025-04-01T08:30:00z",
            "2025-04-01t08:30:00z",
            "2025-06-30T23:59:60Z",
        ] {
            let input = with("timestamp", json!(timestamp));
            let err = ArticleMetadata::from_value(input).unwrap_err();
            assert!(
                matches!(err, ValidationError::InvalidTimestamp(_)),
                "{timestamp:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_boundary_input_is_accepted() {
        let input = json!({
            "title": "",
            "url": "https://a.b",
            "description": "",
            "timestamp": "1970-01-01T00:00:00Z",
            "thumbnailURL": "https://a.b/c"
        });
        let meta = ArticleMetadata::from_value(input).unwrap();
        assert_eq!(meta.title(), "");
        assert_eq!(meta.timestamp(), "1970-01-01T00:00:00Z");
    }

    #[test]
    fn test_timestamp_with_offset_is_accepted() {
        let input = with("timestamp", json!("2025-04-01T16:30:00+08:00"));
        let meta = ArticleMetadata::from_value(input).unwrap();
        assert_eq!(meta.timestamp(), "2025-04-01T16:30:00+08:00");
    }

    #[test]
    fn test_validation_is_deterministic() {
        let first = ArticleMetadata::from_value(valid_article()).unwrap();
        let second = ArticleMetadata::from_value(valid_article()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_envelope_valid() {
        let input = json!({ "token": "s3cret", "content": valid_article() });
        let envelope = QueueEnvelope::from_value(input).unwrap();
        assert_eq!(envelope.token(), "s3cret");
        assert_eq!(envelope.content().title(), "Writing a relay in Rust");
    }

    #[test]
    fn test_envelope_missing_parts() {
        assert!(QueueEnvelope::from_value(json!({ "token": "s3cret" })).is_err());
        assert!(QueueEnvelope::from_value(json!({ "content": valid_article() })).is_err());
    }

    #[test]
    fn test_envelope_with_invalid_content() {
        let err = QueueEnvelope::from_value(json!({
            "token": "s3cret",
            "content": without("url"),
        }))
        .unwrap_err();
        assert_eq!(shape_of(&err), Some("article metadata"));
    }

    #[test]
    fn test_serializes_with_wire_names() {
        let meta = ArticleMetadata::from_value(valid_article()).unwrap();
        assert_eq!(serde_json::to_value(&meta).unwrap(), valid_article());
    }
}
