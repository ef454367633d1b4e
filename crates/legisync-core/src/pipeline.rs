//! One reconciliation run: fetch → transform → snapshot → reconcile → write.
//!
//! Runs are sequential and assume no other run touches the same store at the
//! same time; the scheduler that invokes us owns that guarantee.

use crate::config::SyncConfig;
use crate::error::{ConfigError, SchemaMismatch, SyncError, SyncResult};
use crate::reconcile::{ExistingIndex, Reconciler};
use crate::record::RawRecord;
use crate::schema::CanonicalRow;
use crate::source::{PaginatedFetcher, RecordSource};
use crate::store::RowStore;
use crate::transform::Transformer;
use crate::writer::{RowWriter, WritePlan};

/// The outcome of the read-only half of a run.
#[derive(Debug, Clone)]
pub struct SyncPlan {
    pub fetched: usize,
    /// Records dropped for lacking an identity.
    pub skipped: usize,
    pub duplicates: usize,
    pub unchanged: usize,
    pub schema_mismatch: Option<SchemaMismatch>,
    pub write: WritePlan,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub fetched: usize,
    pub skipped: usize,
    pub duplicates: usize,
    pub unchanged: usize,
    pub inserted: usize,
    pub updated: usize,
    pub header_written: bool,
    pub schema_mismatch: bool,
}

pub struct SyncPipeline {
    config: SyncConfig,
    transformer: Transformer,
    reconciler: Reconciler,
}

impl SyncPipeline {
    pub fn new(config: SyncConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let transformer = Transformer::from_config(&config)?;
        let reconciler = Reconciler::new(config.non_comparable_columns()?);
        Ok(Self {
            config,
            transformer,
            reconciler,
        })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn fetch<S: RecordSource + ?Sized>(&self, source: &mut S) -> SyncResult<Vec<RawRecord>> {
        PaginatedFetcher::new(self.config.page_delay()).fetch_all(
            source,
            self.config.partition_key,
            self.config.page_size,
        )
    }

    /// Transform records, dropping those without an identity.
    pub fn canonicalize(&self, records: &[RawRecord]) -> (Vec<CanonicalRow>, usize) {
        let mut rows = Vec::with_capacity(records.len());
        let mut skipped = 0;
        for record in records {
            if record.identity().is_none() {
                tracing::warn!(
                    record = ?record.str_field(crate::record::fields::LEGISLATION_NUMBER),
                    "record has no usable identity; skipping"
                );
                skipped += 1;
                continue;
            }
            rows.push(self.transformer.transform(record));
        }
        (rows, skipped)
    }

    /// Everything up to, but not including, the writes.
    pub fn plan<S, T>(&self, source: &mut S, store: &mut T) -> SyncResult<SyncPlan>
    where
        S: RecordSource + ?Sized,
        T: RowStore + ?Sized,
    {
        let records = self.fetch(source)?;
        let (rows, skipped) = self.canonicalize(&records);

        let grid = store.read_all().map_err(SyncError::StoreRead)?;
        let (index, schema_mismatch) = ExistingIndex::build_or_degrade(&grid);
        tracing::info!(existing = index.len(), "loaded store snapshot");

        let reconciliation = self.reconciler.reconcile(&rows, &index);
        let duplicates = reconciliation.duplicates;
        let unchanged = reconciliation.unchanged;

        Ok(SyncPlan {
            fetched: records.len(),
            skipped,
            duplicates,
            unchanged,
            schema_mismatch,
            write: WritePlan::new(reconciliation, &index),
        })
    }

    pub fn apply<T: RowStore + ?Sized>(&self, plan: &SyncPlan, store: &mut T) -> SyncResult<RunSummary> {
        if plan.write.is_noop() {
            tracing::info!("store is up to date");
        }
        let mut writer = RowWriter::new(self.config.update_batch_size, self.config.batch_delay());
        let report = writer
            .apply(&plan.write, store)
            .into_result()
            .map_err(SyncError::StoreWrite)?;

        Ok(RunSummary {
            fetched: plan.fetched,
            skipped: plan.skipped,
            duplicates: plan.duplicates,
            unchanged: plan.unchanged,
            inserted: report.appended,
            updated: report.updated,
            header_written: report.header_written,
            schema_mismatch: plan.schema_mismatch.is_some(),
        })
    }

    pub fn run_once<S, T>(&self, source: &mut S, store: &mut T) -> SyncResult<RunSummary>
    where
        S: RecordSource + ?Sized,
        T: RowStore + ?Sized,
    {
        let plan = self.plan(source, store)?;
        let summary = self.apply(&plan, store)?;
        tracing::info!(
            fetched = summary.fetched,
            inserted = summary.inserted,
            updated = summary.updated,
            unchanged = summary.unchanged,
            "run complete"
        );
        Ok(summary)
    }
}
