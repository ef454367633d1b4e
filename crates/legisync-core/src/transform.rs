//! Raw record → canonical row.
//!
//! The transform is total: any missing or mistyped field falls back to its
//! default instead of failing the record.

use crate::bill_number::normalize_sort_key;
use crate::config::{SyncConfig, DEFAULT_DETAIL_URL_TEMPLATE};
use crate::dates::DateNormalizer;
use crate::error::ConfigError;
use crate::record::{fields, RawRecord};
use crate::schema::CanonicalRow;

/// Human-readable name for a legislation type code.
pub fn type_name(code: Option<i64>) -> String {
    let Some(code) = code else {
        return String::new();
    };
    match code {
        1 => "Bill".to_string(),
        2 => "Resolution".to_string(),
        3 => "Concurrent Resolution".to_string(),
        4 => "Joint Resolution".to_string(),
        5 => "Amendment".to_string(),
        6 => "Substitute".to_string(),
        other => format!("Unknown ({other})"),
    }
}

/// Clickable cell: `=HYPERLINK("<url>", "<label>")` with quotes doubled.
pub fn hyperlink_formula(url: &str, label: &str) -> String {
    format!(
        "=HYPERLINK(\"{}\", \"{}\")",
        url.replace('"', "\"\""),
        label.replace('"', "\"\"")
    )
}

#[derive(Debug, Clone)]
pub struct Transformer {
    dates: DateNormalizer,
    url_template: String,
}

impl Default for Transformer {
    fn default() -> Self {
        Self {
            dates: DateNormalizer::utc(),
            url_template: DEFAULT_DETAIL_URL_TEMPLATE.to_string(),
        }
    }
}

impl Transformer {
    pub fn new(dates: DateNormalizer, url_template: impl Into<String>) -> Self {
        Self {
            dates,
            url_template: url_template.into(),
        }
    }

    pub fn from_config(config: &SyncConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.date_normalizer()?,
            config.detail_url_template.clone(),
        ))
    }

    pub fn detail_url(&self, identity: i64) -> String {
        self.url_template.replace("{id}", &identity.to_string())
    }

    pub fn transform(&self, raw: &RawRecord) -> CanonicalRow {
        let identity = raw.identity().unwrap_or_default();

        let parent_identifier = raw.non_empty_str(fields::SUBSTITUTE_PARENT).unwrap_or_default();
        let amendment_parent_identifier =
            raw.non_empty_str(fields::AMENDMENT_PARENT).unwrap_or_default();

        let bill_number = raw
            .non_empty_str(fields::LEGISLATION_NUMBER)
            .or_else(|| raw.non_empty_str(fields::DISPLAY_CODE))
            .unwrap_or_default();
        let sort_source = [&parent_identifier, &amendment_parent_identifier]
            .into_iter()
            .find(|s| !s.is_empty())
            .unwrap_or(&bill_number);

        let label = raw
            .non_empty_str(fields::DISPLAY_CODE)
            .unwrap_or_else(|| bill_number.clone());

        CanonicalRow {
            identity,
            sort_key: normalize_sort_key(sort_source),
            display_link: hyperlink_formula(&self.detail_url(identity), &label),
            type_name: type_name(raw.int_field(fields::TYPE_ID)),
            chamber: raw.str_field(fields::CHAMBER),
            sponsor: raw.str_field(fields::SPONSOR),
            short_title: raw.str_field(fields::SHORT_TITLE).unwrap_or_default(),
            long_title: raw.str_field(fields::LONG_TITLE).unwrap_or_default(),
            synopsis: raw.str_field(fields::SYNOPSIS).unwrap_or_default(),
            status: raw.str_field(fields::STATUS),
            introduced_date: self
                .dates
                .normalize(raw.str_field(fields::INTRODUCED).as_deref()),
            last_status_date: self
                .dates
                .normalize(raw.str_field(fields::STATUS_DATE).as_deref()),
            has_amendments: raw.bool_field(fields::HAS_AMENDMENTS),
            parent_identifier,
            amendment_parent_identifier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Column;
    use serde_json::json;

    fn raw(v: serde_json::Value) -> RawRecord {
        RawRecord::from_value(v).unwrap()
    }

    fn sample() -> RawRecord {
        raw(json!({
            "LegislationId": 142255,
            "LegislationNumber": "HB 13",
            "LegislationDisplayCode": "HB 13",
            "LegislationTypeId": 1,
            "ChamberName": "House",
            "Sponsor": "Rep. Smith",
            "ShortTitle": null,
            "LongTitle": "AN ACT TO AMEND TITLE 29",
            "Synopsis": "This bill...",
            "StatusName": "Introduced",
            "IntroductionDateTime": "/Date(1747153160257)/",
            "LegislationStatusDateTime": "/Date(notanumber)/",
            "HasAmendments": false,
            "SubstituteParentLegislationDisplayCode": null,
            "AmendmentParentLegislationDisplayCode": ""
        }))
    }

    #[test]
    fn transforms_full_record() {
        let row = Transformer::default().transform(&sample());
        assert_eq!(row.identity, 142255);
        assert_eq!(row.sort_key, "HB 013");
        assert_eq!(
            row.display_link,
            "=HYPERLINK(\"https://legis.delaware.gov/BillDetail?LegislationId=142255\", \"HB 13\")"
        );
        assert_eq!(row.type_name, "Bill");
        assert_eq!(row.chamber.as_deref(), Some("House"));
        assert_eq!(row.short_title, "");
        assert_eq!(row.status.as_deref(), Some("Introduced"));
        assert_eq!(row.introduced_date, "2025-05-13");
        assert_eq!(row.last_status_date, "");
        assert_eq!(row.has_amendments, Some(false));
        assert_eq!(row.cell(Column::HasAmendments), "FALSE");
        assert_eq!(row.parent_identifier, "");
        assert_eq!(row.amendment_parent_identifier, "");
    }

    #[test]
    fn sort_key_prefers_substitute_parent_then_amendment_parent() {
        let t = Transformer::default();
        let sub = raw(json!({
            "LegislationId": 1,
            "LegislationNumber": "HS 1 for HB 100",
            "SubstituteParentLegislationDisplayCode": "HB 100",
            "AmendmentParentLegislationDisplayCode": "HB 7"
        }));
        assert_eq!(t.transform(&sub).sort_key, "HB 100");

        let amendment = raw(json!({
            "LegislationId": 2,
            "LegislationNumber": "HA 1 to HB 7",
            "AmendmentParentLegislationDisplayCode": "HB 7"
        }));
        assert_eq!(t.transform(&amendment).sort_key, "HB 007");

        let plain = raw(json!({"LegislationId": 3, "LegislationNumber": "HS 1 for HB 100"}));
        assert_eq!(t.transform(&plain).sort_key, "HS 001 for HB 100");
    }

    #[test]
    fn type_codes() {
        assert_eq!(type_name(Some(3)), "Concurrent Resolution");
        assert_eq!(type_name(Some(6)), "Substitute");
        assert_eq!(type_name(Some(42)), "Unknown (42)");
        assert_eq!(type_name(None), "");
    }

    #[test]
    fn nullable_pass_through_fields_stay_none() {
        let row = Transformer::default().transform(&raw(json!({"LegislationId": 9})));
        assert_eq!(row.chamber, None);
        assert_eq!(row.sponsor, None);
        assert_eq!(row.status, None);
        assert_eq!(row.has_amendments, None);
        assert_eq!(row.cell(Column::Status), "");
        assert_eq!(row.to_cells().len(), Column::ALL.len());
    }

    #[test]
    fn hyperlink_escapes_quotes() {
        assert_eq!(
            hyperlink_formula("https://x/?a=1", "HB \"13\""),
            "=HYPERLINK(\"https://x/?a=1\", \"HB \"\"13\"\"\")"
        );
    }

    #[test]
    fn custom_template_and_offset() {
        let t = Transformer::new(
            DateNormalizer::with_offset_minutes(480).unwrap(),
            "https://example.test/bill/{id}",
        );
        let row = t.transform(&sample());
        assert!(row.display_link.contains("https://example.test/bill/142255"));
        assert_eq!(row.introduced_date, "2025-05-14");
    }
}
