//! Line parser: splits a timestamp-prefixed log line into its generation
//! time and message body.
//!
//! Runtimes prefix every line with `<RFC3339Nano timestamp><space>`, but some
//! emit plain RFC 3339 without the fractional part, so two profiles are tried
//! in order.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Nanosecond profile: nine fractional digits and a numeric or `Z` offset.
const RFC3339_NANO: &str = "%Y-%m-%dT%H:%M:%S%.9f%#z";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed line")]
    MalformedLine,
    #[error("parse timestamp {0:?}")]
    TimestampUnparseable(String),
}

/// Split `raw` on its first space and parse the leading token as a timestamp.
///
/// Returns the message body (everything after the first space) together with
/// the parsed time in UTC.
pub fn parse_line(raw: &str) -> Result<(&str, DateTime<Utc>), ParseError> {
    let (token, message) = raw.split_once(' ').ok_or(ParseError::MalformedLine)?;
    let timestamp = parse_timestamp(token)
        .ok_or_else(|| ParseError::TimestampUnparseable(token.to_string()))?;
    Ok((message, timestamp))
}

fn parse_timestamp(token: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(token, RFC3339_NANO)
        .or_else(|_| DateTime::parse_from_rfc3339(token))
        .map(|ts| ts.with_timezone(&Utc))
        .ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
