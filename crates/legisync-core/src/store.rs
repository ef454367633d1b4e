//! Row stores: the tabular sink the reconciler diffs against.
//!
//! A store is a grid of string cells addressed by 1-based row position, with
//! the header in row 1. Only three mutations exist: write the header, append
//! rows after the last used row, and overwrite rows in place.

use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Cells for one row written at a known position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowPatch {
    pub position: usize,
    pub cells: Vec<String>,
}

pub trait RowStore {
    /// Every row in order; index 0 is the header.
    fn read_all(&mut self) -> Result<Vec<Vec<String>>, StoreError>;

    fn write_header(&mut self, labels: &[String]) -> Result<(), StoreError>;

    /// Append after the last used row, preserving order.
    fn append_rows(&mut self, rows: &[Vec<String>]) -> Result<(), StoreError>;

    /// Overwrite consecutive rows starting at `position` (1-based).
    fn patch_range(&mut self, position: usize, rows: &[Vec<String>]) -> Result<(), StoreError>;

    /// Overwrite possibly non-contiguous rows in one bulk call.
    ///
    /// The default issues one [`patch_range`](Self::patch_range) per row;
    /// remote stores override it with a real batch request.
    fn patch_rows(&mut self, patches: &[RowPatch]) -> Result<(), StoreError> {
        for patch in patches {
            self.patch_range(patch.position, std::slice::from_ref(&patch.cells))?;
        }
        Ok(())
    }
}

fn patch_grid(grid: &mut Vec<Vec<String>>, position: usize, rows: &[Vec<String>]) -> Result<(), StoreError> {
    if position == 0 {
        return Err(StoreError::Patch {
            position,
            message: "positions are 1-based".into(),
        });
    }
    for (offset, cells) in rows.iter().enumerate() {
        let idx = position - 1 + offset;
        if idx >= grid.len() {
            grid.resize_with(idx + 1, Vec::new);
        }
        grid[idx] = cells.clone();
    }
    Ok(())
}

fn write_header_grid(grid: &mut Vec<Vec<String>>, labels: &[String]) {
    if grid.is_empty() {
        grid.push(labels.to_vec());
    } else {
        grid[0] = labels.to_vec();
    }
}

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryRowStore {
    grid: Vec<Vec<String>>,
}

impl MemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(grid: Vec<Vec<String>>) -> Self {
        Self { grid }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.grid
    }
}

impl RowStore for MemoryRowStore {
    fn read_all(&mut self) -> Result<Vec<Vec<String>>, StoreError> {
        Ok(self.grid.clone())
    }

    fn write_header(&mut self, labels: &[String]) -> Result<(), StoreError> {
        write_header_grid(&mut self.grid, labels);
        Ok(())
    }

    fn append_rows(&mut self, rows: &[Vec<String>]) -> Result<(), StoreError> {
        self.grid.extend(rows.iter().cloned());
        Ok(())
    }

    fn patch_range(&mut self, position: usize, rows: &[Vec<String>]) -> Result<(), StoreError> {
        patch_grid(&mut self.grid, position, rows)
    }
}

// ============================================================================
// JSON file store
// ============================================================================

#[derive(Debug, Default, Serialize, Deserialize)]
struct GridFile {
    rows: Vec<Vec<String>>,
}

/// A local mirror of the sheet persisted as pretty JSON.
///
/// Every mutation rewrites the whole file through a temp file + rename, so a
/// crash leaves either the old or the new grid on disk.
#[derive(Debug, Clone)]
pub struct JsonFileRowStore {
    path: PathBuf,
}

impl JsonFileRowStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<Vec<Vec<String>>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&self.path)?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let file: GridFile = serde_json::from_str(&text)?;
        Ok(file.rows)
    }

    fn save(&self, rows: Vec<Vec<String>>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        {
            let mut out = fs::File::create(&tmp)?;
            serde_json::to_writer_pretty(&mut out, &GridFile { rows })?;
            out.write_all(b"\n")?;
            out.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn mutate(
        &self,
        f: impl FnOnce(&mut Vec<Vec<String>>) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let mut grid = self.load()?;
        f(&mut grid)?;
        self.save(grid)
    }
}

impl RowStore for JsonFileRowStore {
    fn read_all(&mut self) -> Result<Vec<Vec<String>>, StoreError> {
        self.load().map_err(|e| StoreError::Read(e.to_string()))
    }

    fn write_header(&mut self, labels: &[String]) -> Result<(), StoreError> {
        self.mutate(|grid| {
            write_header_grid(grid, labels);
            Ok(())
        })
    }

    fn append_rows(&mut self, rows: &[Vec<String>]) -> Result<(), StoreError> {
        self.mutate(|grid| {
            grid.extend(rows.iter().cloned());
            Ok(())
        })
    }

    fn patch_range(&mut self, position: usize, rows: &[Vec<String>]) -> Result<(), StoreError> {
        self.mutate(|grid| patch_grid(grid, position, rows))
    }

    fn patch_rows(&mut self, patches: &[RowPatch]) -> Result<(), StoreError> {
        self.mutate(|grid| {
            for patch in patches {
                patch_grid(grid, patch.position, std::slice::from_ref(&patch.cells))?;
            }
            Ok(())
        })
    }
}
