//! Paginated retrieval of raw records.
//!
//! Page 1 is fetched first to learn the total count, then pages
//! `2..=ceil(total / page_size)` are requested strictly in order. Any failed
//! page fails the whole fetch: reconciliation needs a complete snapshot.

use crate::error::{ConfigError, SourceError, SyncError};
use crate::pacing::{Pacer, ThreadPacer};
use crate::record::RawRecord;
use std::time::Duration;

/// One page of results plus the source's total for the partition.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub total: u64,
    pub records: Vec<RawRecord>,
}

/// Anything that can serve pages of raw records for a partition.
pub trait RecordSource {
    /// `page` is 1-based.
    fn fetch_page(
        &mut self,
        partition_key: u32,
        page: u32,
        page_size: u32,
    ) -> Result<Page, SourceError>;
}

/// `ceil(total / page_size)`; zero page size yields zero pages.
pub fn total_pages(total: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    let pages = total.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

pub struct PaginatedFetcher<P: Pacer = ThreadPacer> {
    delay: Duration,
    pacer: P,
}

impl PaginatedFetcher<ThreadPacer> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pacer: ThreadPacer,
        }
    }
}

impl<P: Pacer> PaginatedFetcher<P> {
    pub fn with_pacer(delay: Duration, pacer: P) -> Self {
        Self { delay, pacer }
    }

    pub fn pacer(&self) -> &P {
        &self.pacer
    }

    /// Fetch every record of `partition_key`, in page order.
    pub fn fetch_all<S: RecordSource + ?Sized>(
        &mut self,
        source: &mut S,
        partition_key: u32,
        page_size: u32,
    ) -> Result<Vec<RawRecord>, SyncError> {
        if page_size == 0 {
            return Err(SyncError::Config(ConfigError::Invalid(
                "page_size must be at least 1".into(),
            )));
        }

        tracing::info!(partition_key, page = 1, "fetching page");
        let first = source
            .fetch_page(partition_key, 1, page_size)
            .map_err(|source| SyncError::SourceUnavailable { page: 1, source })?;

        let total = first.total;
        let pages = total_pages(total, page_size);
        tracing::info!(total, total_pages = pages, "source reported total");

        let mut records = first.records;
        tracing::debug!(page = 1, got = records.len(), "page fetched");

        for page in 2..=pages {
            self.pacer.pause(self.delay);
            tracing::info!(page, total_pages = pages, "fetching page");
            let next = source
                .fetch_page(partition_key, page, page_size)
                .map_err(|source| SyncError::SourceUnavailable { page, source })?;
            if next.records.is_empty() {
                return Err(SyncError::SourceUnavailable {
                    page,
                    source: SourceError::Decode(format!(
                        "empty page {page} of {pages} (total {total})"
                    )),
                });
            }
            tracing::debug!(page, got = next.records.len(), "page fetched");
            records.extend(next.records);
        }

        if records.len() as u64 != total {
            tracing::warn!(
                expected = total,
                fetched = records.len(),
                "fetched record count differs from reported total"
            );
        }
        tracing::info!(fetched = records.len(), "fetch complete");
        Ok(records)
    }
}
