//! Run configuration.
//!
//! Every field has a default, so an empty JSON object (or no file at all) is a
//! valid configuration. The CLI layers its flags on top of whatever is loaded.

use crate::dates::DateNormalizer;
use crate::error::ConfigError;
use crate::schema::Column;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_PARTITION_KEY: u32 = 153;
pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const DEFAULT_PAGE_DELAY_MS: u64 = 200;
pub const DEFAULT_UPDATE_BATCH_SIZE: usize = 50;
pub const DEFAULT_BATCH_DELAY_MS: u64 = 1000;
pub const DEFAULT_DETAIL_URL_TEMPLATE: &str =
    "https://legis.delaware.gov/BillDetail?LegislationId={id}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// General Assembly to fetch.
    pub partition_key: u32,
    pub page_size: u32,
    /// Pause between successive page requests.
    pub page_delay_ms: u64,
    /// Maximum rows per update patch.
    pub update_batch_size: usize,
    /// Pause between update batches.
    pub batch_delay_ms: u64,
    /// Fixed zone for rendering date tokens.
    pub utc_offset_minutes: i32,
    /// Must contain `{id}`.
    pub detail_url_template: String,
    /// Header labels excluded from diffing.
    pub non_comparable: Vec<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            partition_key: DEFAULT_PARTITION_KEY,
            page_size: DEFAULT_PAGE_SIZE,
            page_delay_ms: DEFAULT_PAGE_DELAY_MS,
            update_batch_size: DEFAULT_UPDATE_BATCH_SIZE,
            batch_delay_ms: DEFAULT_BATCH_DELAY_MS,
            utc_offset_minutes: 0,
            detail_url_template: DEFAULT_DETAIL_URL_TEMPLATE.to_string(),
            non_comparable: vec![Column::DisplayLink.label().to_string()],
        }
    }
}

impl SyncConfig {
    /// Load and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: SyncConfig =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be > 0".into()));
        }
        if self.update_batch_size == 0 {
            return Err(ConfigError::Invalid("update_batch_size must be > 0".into()));
        }
        if DateNormalizer::with_offset_minutes(self.utc_offset_minutes).is_none() {
            return Err(ConfigError::Invalid(format!(
                "utc_offset_minutes {} is outside ±24h",
                self.utc_offset_minutes
            )));
        }
        if !self.detail_url_template.contains("{id}") {
            return Err(ConfigError::Invalid(
                "detail_url_template must contain `{id}`".into(),
            ));
        }
        self.non_comparable_columns()?;
        Ok(())
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn date_normalizer(&self) -> Result<DateNormalizer, ConfigError> {
        DateNormalizer::with_offset_minutes(self.utc_offset_minutes).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "utc_offset_minutes {} is outside ±24h",
                self.utc_offset_minutes
            ))
        })
    }

    /// Resolve `non_comparable` labels; the identity column cannot be excluded.
    pub fn non_comparable_columns(&self) -> Result<BTreeSet<Column>, ConfigError> {
        let mut out = BTreeSet::new();
        for label in &self.non_comparable {
            let column = Column::from_label(label).ok_or_else(|| {
                ConfigError::Invalid(format!("unknown column in non_comparable: {label}"))
            })?;
            if column == Column::Identity {
                return Err(ConfigError::Invalid(
                    "the identity column cannot be non-comparable".into(),
                ));
            }
            out.insert(column);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = SyncConfig::default();
        config.validate().unwrap();
        assert_eq!(
            config.non_comparable_columns().unwrap(),
            BTreeSet::from([Column::DisplayLink])
        );
    }

    #[test]
    fn empty_object_uses_defaults() {
        let config: SyncConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, SyncConfig::default());
    }

    #[test]
    fn load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"partition_key": 152, "page_size": 25}}"#).unwrap();
        let config = SyncConfig::load(file.path()).unwrap();
        assert_eq!(config.partition_key, 152);
        assert_eq!(config.page_size, 25);
        assert_eq!(config.update_batch_size, DEFAULT_UPDATE_BATCH_SIZE);
    }

    #[test]
    fn load_rejects_unknown_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"pagesize": 25}}"#).unwrap();
        assert!(matches!(
            SyncConfig::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let bad = [
            SyncConfig { page_size: 0, ..Default::default() },
            SyncConfig { update_batch_size: 0, ..Default::default() },
            SyncConfig { utc_offset_minutes: 24 * 60, ..Default::default() },
            SyncConfig { detail_url_template: "https://x/".into(), ..Default::default() },
            SyncConfig { non_comparable: vec!["LegislationId".into()], ..Default::default() },
            SyncConfig { non_comparable: vec!["Bogus".into()], ..Default::default() },
        ];
        for config in bad {
            assert!(config.validate().is_err(), "{config:?}");
        }
    }
}
