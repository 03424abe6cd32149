mod errors;

use std::fs;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::quality::QualityThresholds;

pub use errors::ConfigError;

/// Top-level settings, loaded from an optional TOML file.
///
/// Every field has a default, so a missing section or an empty file yields
/// the standard pipeline rules and quality thresholds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub pipeline: PipelineConfig,
    pub quality: QualityThresholds
}

/// Business rule limits and sentinel values used by the transformation stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Inclusive upper bound on a transaction amount.
    pub max_amount: Decimal,
    /// Oldest accepted transaction, in days before the evaluation time.
    pub max_age_days: i64,
    pub unknown_merchant: String,
    pub unknown_category: String,
    pub unknown_payment_method: String
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_amount: Decimal::from(1_000_000),
            max_age_days: 730,
            unknown_merchant: "UNKNOWN".to_string(),
            unknown_category: "unknown".to_string(),
            unknown_payment_method: "unknown".to_string()
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source
        })?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.max_amount <= Decimal::ZERO {
            return Err(ConfigError::OutOfRange {
                field: "pipeline.max_amount",
                expected: "greater than 0",
                value: self.pipeline.max_amount.to_string()
            });
        }

        if self.pipeline.max_age_days <= 0 {
            return Err(ConfigError::OutOfRange {
                field: "pipeline.max_age_days",
                expected: "greater than 0",
                value: self.pipeline.max_age_days.to_string()
            });
        }

        let fractions = [
            ("quality.max_null_percentage", self.quality.max_null_percentage),
            ("quality.max_duplicate_percentage", self.quality.max_duplicate_percentage)
        ];

        for (field, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange {
                    field,
                    expected: "a fraction between 0 and 1",
                    value: value.to_string()
                });
            }
        }

        Ok(())
    }
}
