//! Configuration for opening SIGMET volumes.

use serde::{Deserialize, Serialize};

use crate::cursor::RECORD_SIZE;

/// Configuration for the volume reader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Check the format discriminator before scanning.
    pub verify_format: bool,

    /// Value written for radials and gates that are not in the file.
    pub absent_value: f32,

    /// Refuse files with more records than this.
    pub max_records: Option<u64>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            verify_format: true,
            absent_value: f32::NAN,
            max_records: None,
        }
    }
}

impl ReaderConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("SIGMET_VERIFY_FORMAT") {
            config.verify_format = val.to_lowercase() == "true" || val == "1";
        }

        if let Ok(val) = std::env::var("SIGMET_ABSENT_VALUE") {
            if let Ok(value) = val.trim().parse::<f32>() {
                config.absent_value = value;
            }
        }

        if let Ok(val) = std::env::var("SIGMET_MAX_RECORDS") {
            if let Ok(records) = val.parse() {
                config.max_records = Some(records);
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.absent_value.is_infinite() {
            return Err("absent_value must be finite or NaN".to_string());
        }

        if let Some(max) = self.max_records {
            if max < 3 {
                return Err(
                    "max_records must allow the two header records and one data record"
                        .to_string(),
                );
            }
        }

        Ok(())
    }

    /// Largest file size accepted, in bytes.
    pub fn max_bytes(&self) -> Option<u64> {
        self.max_records.map(|records| records * RECORD_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ReaderConfig::default();
        assert!(config.verify_format);
        assert!(config.absent_value.is_nan());
        assert!(config.max_records.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ReaderConfig::default();
        config.absent_value = f32::INFINITY;
        assert!(config.validate().is_err());

        config.absent_value = -999.99;
        config.max_records = Some(2);
        assert!(config.validate().is_err());

        config.max_records = Some(3);
        assert!(config.validate().is_ok());
        assert_eq!(config.max_bytes(), Some(3 * 6144));
    }
}
