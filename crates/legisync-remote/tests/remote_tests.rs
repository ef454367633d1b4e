//! Request and response shaping for the remote collaborators.

use legisync_core::error::SourceError;
use legisync_core::schema::{header_labels, Column};
use legisync_core::store::RowPatch;
use legisync_remote::sheets::{
    batch_update_body, column_letter, encode_row, full_range, last_column, parse_values, quote_sheet, row_range,
};
use legisync_remote::{form_fields, parse_page};
use serde_json::json;

// ============================================================================
// Legislation endpoint
// ============================================================================

#[test]
fn test_form_fields_carry_paging_and_session() {
    let fields = form_fields(153, 4, 100);
    let get = |k: &str| {
        fields
            .iter()
            .find(|(name, _)| *name == k)
            .map(|(_, v)| v.as_str())
    };
    assert_eq!(get("page"), Some("4"));
    assert_eq!(get("pageSize"), Some("100"));
    assert_eq!(get("selectedGA[0]"), Some("153"));
    assert_eq!(get("coSponsorCheck"), Some("false"));
    assert_eq!(get("sort"), Some(""));
    assert_eq!(fields.len(), 10);
}

#[test]
fn test_parse_page_reads_total_and_records() {
    let body = json!({
        "Total": 2,
        "Data": [
            { "LegislationId": 142255, "LegislationNumber": "HB 302" },
            { "LegislationId": 142256, "LegislationNumber": "HB 303" }
        ]
    })
    .to_string();
    let page = parse_page(&body).unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.records.len(), 2);
    assert_eq!(page.records[0].identity(), Some(142255));
}

#[test]
fn test_parse_page_tolerates_null_data() {
    let page = parse_page(r#"{"Total": 0, "Data": null}"#).unwrap();
    assert_eq!(page.total, 0);
    assert!(page.records.is_empty());
}

#[test]
fn test_parse_page_rejects_malformed_bodies() {
    assert!(matches!(parse_page("<html>busy</html>"), Err(SourceError::Decode(_))));
    assert!(matches!(
        parse_page(r#"{"Total": 1, "Data": [42]}"#),
        Err(SourceError::Decode(_))
    ));
}

// ============================================================================
// Sheets A1 notation and bodies
// ============================================================================

#[test]
fn test_column_letters() {
    assert_eq!(column_letter(1), "A");
    assert_eq!(column_letter(15), "O");
    assert_eq!(column_letter(26), "Z");
    assert_eq!(column_letter(27), "AA");
    assert_eq!(column_letter(703), "AAA");
    assert_eq!(last_column(), "O");
    assert_eq!(header_labels().len(), 15);
}

#[test]
fn test_ranges_quote_sheet_titles() {
    assert_eq!(quote_sheet("Bill's"), "'Bill''s'");
    assert_eq!(full_range("Sheet1"), "'Sheet1'!A:O");
    assert_eq!(row_range("Sheet1", 1, 1), "'Sheet1'!A1:O1");
    assert_eq!(row_range("Sheet1", 5, 3), "'Sheet1'!A5:O7");
}

#[test]
fn test_parse_values_handles_missing_and_ragged_rows() {
    assert!(parse_values(&json!({ "range": "'Sheet1'!A1:O1000" })).is_empty());

    let grid = parse_values(&json!({
        "values": [["LegislationId", "BillNumber"], ["142255"], [1, true, null]]
    }));
    assert_eq!(grid[1], vec!["142255".to_string()]);
    assert_eq!(grid[2], vec!["1".to_string(), "true".to_string(), String::new()]);
}

#[test]
fn test_batch_update_body_addresses_each_row() {
    let patches = vec![
        RowPatch {
            position: 3,
            cells: vec!["142255".into(), "HB 302".into()],
        },
        RowPatch {
            position: 9,
            cells: vec!["1".into()],
        },
    ];
    let body = batch_update_body("Sheet1", &header_labels(), &patches);
    assert_eq!(body["valueInputOption"], "USER_ENTERED");
    assert_eq!(body["data"][0]["range"], "'Sheet1'!A3:O3");
    assert_eq!(body["data"][1]["range"], "'Sheet1'!A9:O9");
    assert_eq!(body["data"][0]["values"], json!([["'142255", "'HB 302"]]));
}

#[test]
fn test_text_cells_are_entered_literally() {
    let header = header_labels();
    let mut cells = vec![String::new(); header.len()];
    cells[Column::Synopsis.index()] = "=SUM(1)".into();
    cells[Column::ShortTitle.index()] = "+1 more".into();
    cells[Column::LongTitle.index()] = "'quoted'".into();
    cells[Column::Sponsor.index()] = "0123".into();
    cells[Column::IntroducedDate.index()] = "2025-01-09".into();
    cells[Column::HasAmendments.index()] = "TRUE".into();
    cells[Column::DisplayLink.index()] = "=HYPERLINK(\"https://x\", \"HB 1\")".into();

    let sent = encode_row(&header, &cells);
    assert_eq!(sent[Column::Synopsis.index()], "'=SUM(1)");
    assert_eq!(sent[Column::ShortTitle.index()], "'+1 more");
    assert_eq!(sent[Column::LongTitle.index()], "''quoted'");
    assert_eq!(sent[Column::Sponsor.index()], "'0123");
    assert_eq!(sent[Column::IntroducedDate.index()], "'2025-01-09");
    assert_eq!(sent[Column::HasAmendments.index()], "TRUE");
    assert_eq!(sent[Column::DisplayLink.index()], cells[Column::DisplayLink.index()]);
    assert_eq!(sent[Column::Status.index()], "");

    // Sheets strips the leading apostrophe on FORMATTED_VALUE reads.
    let read_back: Vec<String> = sent
        .iter()
        .enumerate()
        .map(|(i, s)| {
            if i == Column::DisplayLink.index() {
                cells[i].clone()
            } else {
                s.strip_prefix('\'').unwrap_or(s).to_string()
            }
        })
        .collect();
    assert_eq!(parse_values(&json!({ "values": [read_back] }))[0], cells);
}

#[test]
fn test_encoding_follows_a_permuted_header() {
    let header = vec![
        Column::DisplayLink.label().to_string(),
        Column::Identity.label().to_string(),
    ];
    let cells = vec!["=HYPERLINK(\"u\", \"SB 1\")".to_string(), "7".to_string()];
    assert_eq!(encode_row(&header, &cells), vec![cells[0].clone(), "'7".to_string()]);
}
