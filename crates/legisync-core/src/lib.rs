//! Legisync core: reconcile legislation records into a spreadsheet.
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌────────────┐   ┌──────────┐
//! │  Paginated   │──►│ Transformer │──►│ Reconciler │──►│  Writer  │
//! │   Fetcher    │   │ dates, bill │   │ vs. store  │   │ append + │
//! │ (all pages)  │   │ no., types  │   │  snapshot  │   │  batches │
//! └──────────────┘   └─────────────┘   └────────────┘   └──────────┘
//! ```
//!
//! The record source and the row store are traits; the HTTP and spreadsheet
//! implementations live in `legisync-remote`. Everything here is synchronous
//! and single-threaded.

pub mod bill_number;
pub mod config;
pub mod dates;
pub mod error;
pub mod pacing;
pub mod pipeline;
pub mod reconcile;
pub mod record;
pub mod schema;
pub mod source;
pub mod store;
pub mod transform;
pub mod writer;

pub use bill_number::normalize_sort_key;
pub use config::SyncConfig;
pub use dates::{normalize_date, DateNormalizer};
pub use error::{ConfigError, SchemaMismatch, SourceError, StoreError, SyncError, WriteFailure};
pub use pipeline::{RunSummary, SyncPipeline, SyncPlan};
pub use reconcile::{ExistingIndex, PersistedRow, Reconciler, Reconciliation, RowUpdate};
pub use record::RawRecord;
pub use schema::{CanonicalRow, Column};
pub use source::{Page, PaginatedFetcher, RecordSource};
pub use store::{JsonFileRowStore, MemoryRowStore, RowPatch, RowStore};
pub use transform::Transformer;
pub use writer::{RowWriter, WritePlan, WriteReport};
