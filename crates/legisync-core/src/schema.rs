//! The canonical row shape and its fixed column layout.
//!
//! Column labels are a bijection with [`CanonicalRow`] fields. The store's
//! header must use exactly these labels for identity lookups to work.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One column of the tracker sheet, in header order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Column {
    Identity,
    SortKey,
    DisplayLink,
    TypeName,
    Chamber,
    Sponsor,
    ShortTitle,
    LongTitle,
    Synopsis,
    Status,
    IntroducedDate,
    LastStatusDate,
    HasAmendments,
    ParentIdentifier,
    AmendmentParentIdentifier,
}

impl Column {
    pub const ALL: [Column; 15] = [
        Column::Identity,
        Column::SortKey,
        Column::DisplayLink,
        Column::TypeName,
        Column::Chamber,
        Column::Sponsor,
        Column::ShortTitle,
        Column::LongTitle,
        Column::Synopsis,
        Column::Status,
        Column::IntroducedDate,
        Column::LastStatusDate,
        Column::HasAmendments,
        Column::ParentIdentifier,
        Column::AmendmentParentIdentifier,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Column::Identity => "LegislationId",
            Column::SortKey => "BillNumber",
            Column::DisplayLink => "DisplayCode",
            Column::TypeName => "Type",
            Column::Chamber => "Chamber",
            Column::Sponsor => "Sponsor",
            Column::ShortTitle => "ShortTitle",
            Column::LongTitle => "LongTitle",
            Column::Synopsis => "Synopsis",
            Column::Status => "Status",
            Column::IntroducedDate => "IntroducedDate",
            Column::LastStatusDate => "LastStatusDate",
            Column::HasAmendments => "HasAmendments",
            Column::ParentIdentifier => "ParentBill",
            Column::AmendmentParentIdentifier => "AmendmentParent",
        }
    }

    pub fn from_label(label: &str) -> Option<Column> {
        Column::ALL.into_iter().find(|c| c.label() == label.trim())
    }

    /// Zero-based position in the header.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The canonical header row.
pub fn header_labels() -> Vec<String> {
    Column::ALL.iter().map(|c| c.label().to_string()).collect()
}

/// Spreadsheet rendering of a boolean cell.
pub fn render_bool(value: Option<bool>) -> String {
    match value {
        Some(true) => "TRUE".to_string(),
        Some(false) => "FALSE".to_string(),
        None => String::new(),
    }
}

/// A normalized bill, ready to be compared against and written to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRow {
    pub identity: i64,
    pub sort_key: String,
    pub display_link: String,
    pub type_name: String,
    pub chamber: Option<String>,
    pub sponsor: Option<String>,
    pub short_title: String,
    pub long_title: String,
    pub synopsis: String,
    pub status: Option<String>,
    pub introduced_date: String,
    pub last_status_date: String,
    pub has_amendments: Option<bool>,
    pub parent_identifier: String,
    pub amendment_parent_identifier: String,
}

impl CanonicalRow {
    /// The identity as used for index lookups.
    pub fn identity_key(&self) -> String {
        self.identity.to_string()
    }

    /// Rendered cell value for `column`; nullable fields render as `""`.
    pub fn cell(&self, column: Column) -> String {
        match column {
            Column::Identity => self.identity.to_string(),
            Column::SortKey => self.sort_key.clone(),
            Column::DisplayLink => self.display_link.clone(),
            Column::TypeName => self.type_name.clone(),
            Column::Chamber => self.chamber.clone().unwrap_or_default(),
            Column::Sponsor => self.sponsor.clone().unwrap_or_default(),
            Column::ShortTitle => self.short_title.clone(),
            Column::LongTitle => self.long_title.clone(),
            Column::Synopsis => self.synopsis.clone(),
            Column::Status => self.status.clone().unwrap_or_default(),
            Column::IntroducedDate => self.introduced_date.clone(),
            Column::LastStatusDate => self.last_status_date.clone(),
            Column::HasAmendments => render_bool(self.has_amendments),
            Column::ParentIdentifier => self.parent_identifier.clone(),
            Column::AmendmentParentIdentifier => self.amendment_parent_identifier.clone(),
        }
    }

    /// All cells in header order.
    pub fn to_cells(&self) -> Vec<String> {
        Column::ALL.iter().map(|&c| self.cell(c)).collect()
    }

    /// Cells laid out under an arbitrary header; unknown labels get `""`.
    pub fn cells_for(&self, layout: &[String]) -> Vec<String> {
        layout
            .iter()
            .map(|label| Column::from_label(label).map(|c| self.cell(c)).unwrap_or_default())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip_and_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for column in Column::ALL {
            assert!(seen.insert(column.label()));
            assert_eq!(Column::from_label(column.label()), Some(column));
        }
        assert_eq!(Column::from_label("Nope"), None);
    }

    #[test]
    fn index_matches_header_position() {
        let header = header_labels();
        for column in Column::ALL {
            assert_eq!(header[column.index()], column.label());
        }
    }

    #[test]
    fn bool_rendering() {
        assert_eq!(render_bool(Some(true)), "TRUE");
        assert_eq!(render_bool(Some(false)), "FALSE");
        assert_eq!(render_bool(None), "");
    }
}
