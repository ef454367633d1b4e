//! Diffing canonical rows against the store snapshot.
//!
//! ```text
//! canonical row ──► identity in index? ──no──► NEW
//!                          │
//!                         yes
//!                          │
//!                          ▼
//!              compare comparable columns
//!              (trimmed strings, derived columns skipped)
//!                          │
//!               ┌──────────┴──────────┐
//!            differ                 equal
//!               │                     │
//!               ▼                     ▼
//!      UPDATE at stored position   unchanged (dropped)
//! ```
//!
//! The index is rebuilt from a full store read at the start of every run and
//! is never mutated by reconciliation.

use crate::error::SchemaMismatch;
use crate::schema::{header_labels, CanonicalRow, Column};
use std::collections::{BTreeSet, HashMap, HashSet};

// ============================================================================
// Existing-identity index
// ============================================================================

/// A row already in the store, keyed by header label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedRow {
    /// 1-based store position (the header is position 1).
    pub position: usize,
    pub values: HashMap<String, String>,
}

impl PersistedRow {
    /// Value under `label`; absent cells read as `""`.
    pub fn value(&self, label: &str) -> &str {
        self.values.get(label).map(String::as_str).unwrap_or("")
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExistingIndex {
    rows: HashMap<String, PersistedRow>,
    header: Vec<String>,
    /// Rows in the store, header included.
    row_count: usize,
}

impl ExistingIndex {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the index from a full store read (row 0 is the header).
    pub fn build(grid: &[Vec<String>]) -> Result<Self, SchemaMismatch> {
        let Some(header) = grid.first() else {
            return Ok(Self::empty());
        };
        let header: Vec<String> = header.iter().map(|h| h.trim().to_string()).collect();

        let identity_label = Column::Identity.label();
        let Some(id_col) = header.iter().position(|h| h == identity_label) else {
            return Err(SchemaMismatch {
                expected: identity_label.to_string(),
                found: header,
            });
        };

        if header != header_labels() {
            tracing::warn!(
                found = ?header,
                "store header differs from canonical columns; writing in the store's column order"
            );
        }

        let mut rows = HashMap::new();
        for (offset, cells) in grid.iter().enumerate().skip(1) {
            let position = offset + 1;
            let key = cells.get(id_col).map(|c| c.trim()).unwrap_or("");
            if key.is_empty() {
                continue;
            }
            if let Some(first) = rows.get(key).map(|r: &PersistedRow| r.position) {
                tracing::warn!(
                    identity = key,
                    kept = first,
                    ignored = position,
                    "duplicate identity in store"
                );
                continue;
            }
            let values = header
                .iter()
                .enumerate()
                .map(|(i, label)| (label.clone(), cells.get(i).cloned().unwrap_or_default()))
                .collect();
            rows.insert(key.to_string(), PersistedRow { position, values });
        }

        Ok(Self {
            rows,
            header,
            row_count: grid.len(),
        })
    }

    /// Like [`build`](Self::build), but a header without the identity column
    /// degrades to "no known identities" instead of failing.
    ///
    /// The row count is kept so appends still land after the existing rows.
    pub fn build_or_degrade(grid: &[Vec<String>]) -> (Self, Option<SchemaMismatch>) {
        match Self::build(grid) {
            Ok(index) => (index, None),
            Err(mismatch) => {
                tracing::warn!(
                    error = %mismatch,
                    "treating store as having no existing rows; every record will be inserted"
                );
                let index = Self {
                    rows: HashMap::new(),
                    header: mismatch.found.clone(),
                    row_count: grid.len(),
                };
                (index, Some(mismatch))
            }
        }
    }

    pub fn get(&self, identity: &str) -> Option<&PersistedRow> {
        self.rows.get(identity.trim())
    }

    /// Number of indexed identities.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Column order rows must be written in.
    ///
    /// The store's own header when it carries the identity column, the
    /// canonical header otherwise (empty or unrecognized store).
    pub fn write_layout(&self) -> Vec<String> {
        if self.header.iter().any(|h| h == Column::Identity.label()) {
            self.header.clone()
        } else {
            header_labels()
        }
    }

    /// True when the store had no rows at all, not even a header.
    pub fn store_is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// First position an append would write to.
    pub fn next_free_position(&self) -> usize {
        self.row_count + 1
    }
}

// ============================================================================
// Reconciler
// ============================================================================

/// A changed row paired with where it lives in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowUpdate {
    pub position: usize,
    pub row: CanonicalRow,
    pub changed: Vec<Column>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub new_rows: Vec<CanonicalRow>,
    pub updates: Vec<RowUpdate>,
    pub unchanged: usize,
    /// Fetched rows dropped because an earlier row had the same identity.
    pub duplicates: usize,
}

impl Reconciliation {
    pub fn is_noop(&self) -> bool {
        self.new_rows.is_empty() && self.updates.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Reconciler {
    non_comparable: BTreeSet<Column>,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new([Column::DisplayLink])
    }
}

impl Reconciler {
    pub fn new(non_comparable: impl IntoIterator<Item = Column>) -> Self {
        Self {
            non_comparable: non_comparable.into_iter().collect(),
        }
    }

    /// Columns that participate in change detection.
    pub fn comparable_columns(&self) -> impl Iterator<Item = Column> + '_ {
        Column::ALL
            .into_iter()
            .filter(move |c| *c != Column::Identity && !self.non_comparable.contains(c))
    }

    /// Columns whose trimmed values differ between `row` and `persisted`.
    ///
    /// Columns the store's header lacks are skipped; they cannot be written.
    pub fn diff(&self, row: &CanonicalRow, persisted: &PersistedRow) -> Vec<Column> {
        self.comparable_columns()
            .filter(|c| persisted.values.contains_key(c.label()))
            .filter(|&c| row.cell(c).trim() != persisted.value(c.label()).trim())
            .collect()
    }

    pub fn reconcile(&self, rows: &[CanonicalRow], index: &ExistingIndex) -> Reconciliation {
        let mut out = Reconciliation::default();
        let mut seen: HashSet<i64> = HashSet::with_capacity(rows.len());

        for row in rows {
            if !seen.insert(row.identity) {
                tracing::warn!(identity = row.identity, "duplicate identity in fetched set");
                out.duplicates += 1;
                continue;
            }
            match index.get(&row.identity_key()) {
                None => out.new_rows.push(row.clone()),
                Some(persisted) => {
                    let changed = self.diff(row, persisted);
                    if changed.is_empty() {
                        out.unchanged += 1;
                    } else {
                        tracing::debug!(
                            identity = row.identity,
                            position = persisted.position,
                            changed = ?changed,
                            "row changed"
                        );
                        out.updates.push(RowUpdate {
                            position: persisted.position,
                            row: row.clone(),
                            changed,
                        });
                    }
                }
            }
        }

        tracing::info!(
            new = out.new_rows.len(),
            updated = out.updates.len(),
            unchanged = out.unchanged,
            duplicates = out.duplicates,
            "reconciled"
        );
        out
    }
}
