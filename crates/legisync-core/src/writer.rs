//! Applying a reconciliation to a row store.
//!
//! Order of operations: header (only if the store is completely empty), one
//! bulk append of all new rows, then update batches of at most `batch_size`
//! rows with a fixed pause between batches. An append failure is recorded and
//! the updates are still attempted; a failed update batch stops the remaining
//! batches.

use crate::error::{StoreError, WriteFailure};
use crate::pacing::{Pacer, ThreadPacer};
use crate::reconcile::{ExistingIndex, Reconciliation, RowUpdate};
use crate::schema::{header_labels, CanonicalRow};
use crate::store::{RowPatch, RowStore};
use std::time::Duration;

/// Everything a run intends to write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WritePlan {
    pub write_header: bool,
    /// Position the first appended row will occupy.
    pub append_at: usize,
    pub new_rows: Vec<CanonicalRow>,
    pub updates: Vec<RowUpdate>,
    /// Header labels in store order; rows are written under these.
    pub layout: Vec<String>,
}

impl WritePlan {
    pub fn new(reconciliation: Reconciliation, index: &ExistingIndex) -> Self {
        let write_header = index.store_is_empty();
        let append_at = if write_header {
            2
        } else {
            index.next_free_position()
        };
        Self {
            write_header,
            append_at,
            new_rows: reconciliation.new_rows,
            updates: reconciliation.updates,
            layout: index.write_layout(),
        }
    }

    /// `row` rendered in store column order.
    pub fn cells(&self, row: &CanonicalRow) -> Vec<String> {
        if self.layout.is_empty() {
            row.to_cells()
        } else {
            row.cells_for(&self.layout)
        }
    }

    pub fn is_noop(&self) -> bool {
        !self.write_header && self.new_rows.is_empty() && self.updates.is_empty()
    }

    pub fn batch_count(&self, batch_size: usize) -> usize {
        if batch_size == 0 {
            return 0;
        }
        self.updates.len().div_ceil(batch_size)
    }
}

/// What actually landed in the store.
#[derive(Debug, Default)]
pub struct WriteReport {
    pub header_written: bool,
    pub appended: usize,
    pub updated: usize,
    pub failure: WriteFailure,
}

impl WriteReport {
    pub fn into_result(self) -> Result<Self, WriteFailure> {
        if self.failure.is_empty() {
            Ok(self)
        } else {
            Err(self.failure)
        }
    }
}

pub struct RowWriter<P: Pacer = ThreadPacer> {
    batch_size: usize,
    batch_delay: Duration,
    pacer: P,
}

impl RowWriter<ThreadPacer> {
    pub fn new(batch_size: usize, batch_delay: Duration) -> Self {
        Self::with_pacer(batch_size, batch_delay, ThreadPacer)
    }
}

impl<P: Pacer> RowWriter<P> {
    pub fn with_pacer(batch_size: usize, batch_delay: Duration, pacer: P) -> Self {
        Self {
            batch_size: batch_size.max(1),
            batch_delay,
            pacer,
        }
    }

    pub fn pacer(&self) -> &P {
        &self.pacer
    }

    pub fn apply<S: RowStore + ?Sized>(&mut self, plan: &WritePlan, store: &mut S) -> WriteReport {
        let mut report = WriteReport::default();

        if plan.write_header {
            match store.write_header(&header_labels()) {
                Ok(()) => {
                    tracing::info!("wrote header row");
                    report.header_written = true;
                }
                Err(err) => {
                    tracing::error!(error = %err, "failed to write header; skipping append");
                    report.failure.append = Some(err);
                }
            }
        }

        if !plan.new_rows.is_empty() && report.failure.append.is_none() {
            let rows: Vec<Vec<String>> = plan.new_rows.iter().map(|r| plan.cells(r)).collect();
            match store.append_rows(&rows) {
                Ok(()) => {
                    tracing::info!(count = rows.len(), at = plan.append_at, "appended new rows");
                    report.appended = rows.len();
                }
                Err(err) => {
                    tracing::error!(error = %err, count = rows.len(), "failed to append new rows");
                    report.failure.append = Some(err);
                }
            }
        }

        self.apply_updates(plan, store, &mut report);
        report
    }

    fn apply_updates<S: RowStore + ?Sized>(
        &mut self,
        plan: &WritePlan,
        store: &mut S,
        report: &mut WriteReport,
    ) {
        let batches: Vec<&[RowUpdate]> = plan.updates.chunks(self.batch_size).collect();
        report.failure.batches_total = batches.len();

        for (i, batch) in batches.iter().enumerate() {
            let patches: Vec<RowPatch> = batch
                .iter()
                .map(|u| RowPatch {
                    position: u.position,
                    cells: plan.cells(&u.row),
                })
                .collect();

            if let Err(err) = store.patch_rows(&patches) {
                tracing::error!(
                    batch = i + 1,
                    batches = batches.len(),
                    error = %err,
                    "update batch failed; aborting remaining batches"
                );
                report.failure.update = Some(err);
                return;
            }
            report.failure.batches_completed += 1;
            report.updated += batch.len();
            tracing::info!(batch = i + 1, batches = batches.len(), rows = batch.len(), "patched batch");

            if i + 1 < batches.len() {
                self.pacer.pause(self.batch_delay);
            }
        }
    }
}

/// Which stage of a write failed, for operator-facing messages.
pub fn failed_stage(failure: &WriteFailure) -> Option<&'static str> {
    match (&failure.append, &failure.update) {
        (Some(StoreError::Header(_)), _) => Some("header"),
        (Some(_), None) => Some("append"),
        (None, Some(_)) => Some("update"),
        (Some(_), Some(_)) => Some("append+update"),
        (None, None) => None,
    }
}
