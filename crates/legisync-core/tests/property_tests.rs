//! Property-based tests for the reconciliation engine
//!
//! 1. Pagination fetches exactly ceil(T/P) pages and T records
//! 2. Sort keys order like (letters, number)
//! 3. Reconciling against the result of applying a plan is a no-op
//! 4. No identity is ever classified new twice

use legisync_core::pacing::RecordingPacer;
use legisync_core::source::total_pages;
use legisync_core::writer::RowWriter;
use legisync_core::*;
use proptest::prelude::*;
use std::collections::HashSet;
use std::time::Duration;

// ============================================================================
// Strategies
// ============================================================================

fn bill_prefix_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("HB".to_string()),
        Just("SB".to_string()),
        Just("HCR".to_string()),
        Just("SJR".to_string()),
    ]
}

fn status_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("Introduced".to_string())),
        Just(Some("Passed House".to_string())),
        Just(Some("Signed".to_string())),
    ]
}

fn row_strategy() -> impl Strategy<Value = CanonicalRow> {
    (
        1i64..40,
        bill_prefix_strategy(),
        1u32..999,
        status_strategy(),
        proptest::option::of(any::<bool>()),
        "[A-Za-z ]{0,20}",
    )
        .prop_map(|(identity, prefix, number, status, has_amendments, title)| CanonicalRow {
            identity,
            sort_key: normalize_sort_key(&format!("{prefix} {number}")),
            display_link: format!("=HYPERLINK(\"u/{identity}\", \"{prefix} {number}\")"),
            type_name: "Bill".to_string(),
            chamber: Some("Senate".to_string()),
            sponsor: None,
            short_title: title.trim().to_string(),
            long_title: String::new(),
            synopsis: String::new(),
            status,
            introduced_date: "2025-01-09".to_string(),
            last_status_date: String::new(),
            has_amendments,
            parent_identifier: String::new(),
            amendment_parent_identifier: String::new(),
        })
}

struct CountingSource {
    total: u64,
    requests: u32,
}

impl RecordSource for CountingSource {
    fn fetch_page(&mut self, _: u32, page: u32, page_size: u32) -> Result<Page, SourceError> {
        self.requests += 1;
        let start = u64::from(page - 1) * u64::from(page_size);
        let end = (start + u64::from(page_size)).min(self.total);
        let records = (start..end)
            .map(|i| RawRecord::from_value(serde_json::json!({ "LegislationId": i })).unwrap())
            .collect();
        Ok(Page {
            total: self.total,
            records,
        })
    }
}

fn apply(store: &mut MemoryRowStore, rows: &[CanonicalRow]) {
    let index = ExistingIndex::build(&store.read_all().unwrap()).unwrap();
    let plan = WritePlan::new(Reconciler::default().reconcile(rows, &index), &index);
    RowWriter::with_pacer(3, Duration::ZERO, RecordingPacer::default())
        .apply(&plan, store)
        .into_result()
        .unwrap();
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn pagination_is_complete(total in 0u64..1000, page_size in 1u32..150) {
        let mut source = CountingSource { total, requests: 0 };
        let mut fetcher = PaginatedFetcher::with_pacer(Duration::ZERO, RecordingPacer::default());
        let records = fetcher.fetch_all(&mut source, 153, page_size).unwrap();

        prop_assert_eq!(records.len() as u64, total);
        prop_assert_eq!(source.requests, total_pages(total, page_size).max(1));
    }

    #[test]
    fn sort_key_order_matches_numeric_order(prefix in bill_prefix_strategy(), a in 0u32..1000, b in 0u32..1000) {
        let ka = normalize_sort_key(&format!("{prefix} {a}"));
        let kb = normalize_sort_key(&format!("{prefix} {b}"));
        prop_assert_eq!(ka.cmp(&kb), a.cmp(&b));
    }

    #[test]
    fn unmatched_identifiers_pass_through(raw in "[a-z!?. ]{0,12}") {
        prop_assert_eq!(normalize_sort_key(&raw), raw);
    }

    #[test]
    fn reconcile_after_apply_is_noop(
        first in proptest::collection::vec(row_strategy(), 0..25),
        second in proptest::collection::vec(row_strategy(), 0..25),
    ) {
        let mut store = MemoryRowStore::new();
        apply(&mut store, &first);
        apply(&mut store, &second);

        let index = ExistingIndex::build(&store.read_all().unwrap()).unwrap();
        let again = Reconciler::default().reconcile(&second, &index);
        prop_assert!(again.is_noop());
    }

    #[test]
    fn identities_are_never_new_twice(rows in proptest::collection::vec(row_strategy(), 0..40)) {
        let result = Reconciler::default().reconcile(&rows, &ExistingIndex::empty());
        let mut seen = HashSet::new();
        for row in &result.new_rows {
            prop_assert!(seen.insert(row.identity));
        }
        prop_assert_eq!(result.new_rows.len() + result.duplicates, rows.len());
    }

    #[test]
    fn store_never_holds_duplicate_identities(
        batches in proptest::collection::vec(proptest::collection::vec(row_strategy(), 0..15), 1..4),
    ) {
        let mut store = MemoryRowStore::new();
        for batch in &batches {
            apply(&mut store, batch);
        }
        let mut seen = HashSet::new();
        for row in store.rows().iter().skip(1) {
            prop_assert!(seen.insert(row[0].clone()));
        }
    }
}
