//! Date normalization for `/Date(<millis>)/` tokens.
//!
//! The legislation API serializes timestamps as a wrapped count of
//! milliseconds since the Unix epoch, e.g. `/Date(1747153160257)/`, optionally
//! with a `±hhmm` suffix that only describes the server's zone. We render the
//! calendar date in one fixed UTC offset so repeated runs produce identical
//! cells regardless of the host's local zone.

use chrono::{DateTime, FixedOffset, Offset, Utc};

const WRAPPER_CHARS: &[char] = &['/', 'D', 'a', 't', 'e', '(', ')'];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateParseError {
    #[error("token has no payload after stripping wrapper")]
    Empty,
    #[error("payload `{0}` is not an integer millisecond count")]
    NotNumeric(String),
    #[error("timestamp {0}ms is out of range")]
    OutOfRange(i64),
}

/// Extract the epoch-millisecond payload from a wrapped token.
pub fn parse_date_token(token: &str) -> Result<i64, DateParseError> {
    let payload = token.trim().trim_matches(WRAPPER_CHARS);
    if payload.is_empty() {
        return Err(DateParseError::Empty);
    }

    // `1747153160257-0500`: the zone suffix does not shift the instant.
    let zone_at = payload
        .char_indices()
        .skip(1)
        .find(|(_, c)| matches!(c, '+' | '-'))
        .map(|(idx, _)| idx);
    let millis = match zone_at {
        Some(idx) => {
            let (ms, zone) = payload.split_at(idx);
            if zone.len() != 5 || !zone[1..].bytes().all(|b| b.is_ascii_digit()) {
                return Err(DateParseError::NotNumeric(payload.to_string()));
            }
            ms
        }
        None => payload,
    };

    millis
        .parse::<i64>()
        .map_err(|_| DateParseError::NotNumeric(payload.to_string()))
}

/// Renders date tokens as `YYYY-MM-DD` in a fixed offset.
#[derive(Debug, Clone, Copy)]
pub struct DateNormalizer {
    offset: FixedOffset,
}

impl Default for DateNormalizer {
    fn default() -> Self {
        Self::utc()
    }
}

impl DateNormalizer {
    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    /// `None` when the offset is outside ±24h.
    pub fn with_offset_minutes(minutes: i32) -> Option<Self> {
        let offset = FixedOffset::east_opt(minutes.checked_mul(60)?)?;
        Some(Self { offset })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn try_normalize(&self, token: &str) -> Result<String, DateParseError> {
        let millis = parse_date_token(token)?;
        let instant =
            DateTime::from_timestamp_millis(millis).ok_or(DateParseError::OutOfRange(millis))?;
        Ok(instant
            .with_timezone(&self.offset)
            .format("%Y-%m-%d")
            .to_string())
    }

    /// Absent or empty tokens give `""`; malformed ones give `""` and a warning.
    pub fn normalize(&self, token: Option<&str>) -> String {
        let Some(token) = token else {
            return String::new();
        };
        if token.trim().is_empty() {
            return String::new();
        }
        match self.try_normalize(token) {
            Ok(date) => date,
            Err(err) => {
                tracing::warn!(token = %token, error = %err, "failed to parse date token");
                String::new()
            }
        }
    }
}

/// Normalize a token in UTC.
pub fn normalize_date(token: Option<&str>) -> String {
    DateNormalizer::utc().normalize(token)
}
