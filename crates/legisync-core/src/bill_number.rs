//! Sortable bill numbers.
//!
//! Display identifiers look like `HB 13`, `SS 1 for SB 7` or `HA 2 to HB 100`.
//! Spreadsheets sort text lexicographically, so `HB 100` would land before
//! `HB 13`. Padding the leading number to three digits makes string order
//! match document order: letters first, then number, then the remainder.

use regex::Regex;
use std::sync::OnceLock;

const PAD_WIDTH: usize = 3;

fn bill_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)^([A-Z]+)\s+([0-9]+)(.*)$").expect("bill number pattern compiles")
    })
}

/// Normalize a display identifier into its sortable form.
///
/// Input that does not start with `<LETTERS> <DIGITS>` is returned unchanged.
pub fn normalize_sort_key(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    match bill_pattern().captures(raw) {
        Some(caps) => format!(
            "{} {:0>width$}{}",
            &caps[1],
            &caps[2],
            &caps[3],
            width = PAD_WIDTH
        ),
        None => raw.to_string(),
    }
}
