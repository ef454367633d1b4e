//! Raw records as returned by the legislation API.
//!
//! The source has no enforced schema; a record is whatever JSON object came
//! back. Accessors here are lenient: numbers may arrive as strings, strings
//! may be `null`, and absent keys are simply `None`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Raw field names read by the transformer.
pub mod fields {
    pub const LEGISLATION_ID: &str = "LegislationId";
    pub const LEGISLATION_NUMBER: &str = "LegislationNumber";
    pub const DISPLAY_CODE: &str = "LegislationDisplayCode";
    pub const TYPE_ID: &str = "LegislationTypeId";
    pub const CHAMBER: &str = "ChamberName";
    pub const SPONSOR: &str = "Sponsor";
    pub const SHORT_TITLE: &str = "ShortTitle";
    pub const LONG_TITLE: &str = "LongTitle";
    pub const SYNOPSIS: &str = "Synopsis";
    pub const STATUS: &str = "StatusName";
    pub const INTRODUCED: &str = "IntroductionDateTime";
    pub const STATUS_DATE: &str = "LegislationStatusDateTime";
    pub const HAS_AMENDMENTS: &str = "HasAmendments";
    pub const SUBSTITUTE_PARENT: &str = "SubstituteParentLegislationDisplayCode";
    pub const AMENDMENT_PARENT: &str = "AmendmentParentLegislationDisplayCode";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(Map<String, Value>);

impl RawRecord {
    /// Build a record from a JSON value; non-objects yield `None`.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// String value of `key`; numbers and booleans are rendered, `null` is `None`.
    pub fn str_field(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            other => Some(other.to_string()),
        }
    }

    /// Like [`str_field`](Self::str_field) but treats `null`, absent and blank as `None`.
    pub fn non_empty_str(&self, key: &str) -> Option<String> {
        self.str_field(key).filter(|s| !s.trim().is_empty())
    }

    pub fn int_field(&self, key: &str) -> Option<i64> {
        match self.0.get(key)? {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn bool_field(&self, key: &str) -> Option<bool> {
        match self.0.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            Value::Number(n) => n.as_i64().map(|v| v != 0),
            _ => None,
        }
    }

    /// The record's identity, if it carries a usable one.
    pub fn identity(&self) -> Option<i64> {
        self.int_field(fields::LEGISLATION_ID)
    }
}

impl From<Map<String, Value>> for RawRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(v: Value) -> RawRecord {
        RawRecord::from_value(v).unwrap()
    }

    #[test]
    fn identity_accepts_numbers_and_numeric_strings() {
        assert_eq!(record(json!({"LegislationId": 142255})).identity(), Some(142255));
        assert_eq!(record(json!({"LegislationId": " 7 "})).identity(), Some(7));
        assert_eq!(record(json!({"LegislationId": null})).identity(), None);
        assert_eq!(record(json!({"LegislationId": "abc"})).identity(), None);
        assert_eq!(record(json!({})).identity(), None);
    }

    #[test]
    fn str_field_distinguishes_null_from_empty() {
        let r = record(json!({"a": null, "b": "", "c": 3}));
        assert_eq!(r.str_field("a"), None);
        assert_eq!(r.str_field("b"), Some(String::new()));
        assert_eq!(r.str_field("c"), Some("3".to_string()));
        assert_eq!(r.non_empty_str("b"), None);
    }

    #[test]
    fn bool_field_is_lenient() {
        let r = record(json!({"a": true, "b": "False", "c": 0, "d": "maybe"}));
        assert_eq!(r.bool_field("a"), Some(true));
        assert_eq!(r.bool_field("b"), Some(false));
        assert_eq!(r.bool_field("c"), Some(false));
        assert_eq!(r.bool_field("d"), None);
    }

    #[test]
    fn from_value_rejects_non_objects() {
        assert!(RawRecord::from_value(json!([1, 2])).is_none());
    }
}
