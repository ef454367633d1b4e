//! Error taxonomy for a sync run.
//!
//! Parsing-level problems (malformed date tokens) never show up here: they are
//! recovered to an empty string inside the normalizer and only logged. What
//! remains are the failures an operator has to see: the source went away, the
//! store rejected a write, or the configuration is unusable.

use std::fmt;

/// A single page request against the record source failed.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    Decode(String),
}

/// A row-store call failed.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read rows: {0}")]
    Read(String),
    #[error("failed to write header: {0}")]
    Header(String),
    #[error("failed to append rows: {0}")]
    Append(String),
    #[error("failed to patch rows at position {position}: {message}")]
    Patch { position: usize, message: String },
    #[error("store i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The store header has no identity column, so existing rows cannot be matched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("store header lacks identity column `{expected}` (found: {found:?})")]
pub struct SchemaMismatch {
    pub expected: String,
    pub found: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// What went wrong while applying a write plan.
///
/// Append and update failures are tracked separately: an append failure does
/// not stop the update batches, while a failing update batch stops the rest.
#[derive(Debug, Default)]
pub struct WriteFailure {
    pub append: Option<StoreError>,
    pub update: Option<StoreError>,
    pub batches_completed: usize,
    pub batches_total: usize,
}

impl WriteFailure {
    pub fn is_empty(&self) -> bool {
        self.append.is_none() && self.update.is_none()
    }
}

impl fmt::Display for WriteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(err) = &self.append {
            parts.push(format!("append failed: {err}"));
        }
        if let Some(err) = &self.update {
            parts.push(format!(
                "update failed after {}/{} batches: {err}",
                self.batches_completed, self.batches_total
            ));
        }
        if parts.is_empty() {
            return write!(f, "no write failure");
        }
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for WriteFailure {}

/// Run-level error surfaced to the operator.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("record source unavailable (page {page}): {source}")]
    SourceUnavailable {
        page: u32,
        #[source]
        source: SourceError,
    },
    #[error("failed to read store snapshot: {0}")]
    StoreRead(#[source] StoreError),
    #[error("store write failed: {0}")]
    StoreWrite(WriteFailure),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type SyncResult<T> = Result<T, SyncError>;
