//! Engine configuration.
//!
//! Every field has a default, so a TOML file only needs the values it changes:
//!
//! ```toml
//! locale = "en"
//! total_label = "Totaal"
//! average_indicators = ["average", "avg", "gemiddeld"]
//!
//! [classify]
//! numeric_threshold = 0.8
//! ```

use std::path::Path;

use dash_ingest::ClassifyOptions;
use serde::{Deserialize, Serialize};

use crate::aggregate::AverageRule;
use crate::error::{EngineError, Result};
use crate::format::NumberLocale;
use crate::report::ReportLayout;

/// Key under which the whole dashboard state is persisted.
pub const DEFAULT_STORAGE_KEY: &str = "analyticsDashboardState";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashConfig {
    /// Lower-case substrings marking a column as averaged instead of summed.
    pub average_indicators: Vec<String>,
    /// Label placed in the first column of the totals row.
    pub total_label: String,
    pub locale: NumberLocale,
    pub storage_key: String,
    /// Load the built-in example dataset when no persisted state is usable.
    pub seed_example: bool,
    /// Column classifier sample size and threshold.
    pub classify: ClassifyOptions,
    pub report: ReportLayout,
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            average_indicators: [
                "average",
                "avg",
                "per-active",
                "per active",
                "gemiddeld",
                "per actieve",
            ]
            .iter()
            .map(|indicator| (*indicator).to_string())
            .collect(),
            total_label: "Total".to_string(),
            locale: NumberLocale::default(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            seed_example: false,
            classify: ClassifyOptions::default(),
            report: ReportLayout::default(),
        }
    }
}

impl DashConfig {
    /// Parses configuration from TOML text.
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self> {
        toml::from_str(text).map_err(|e| EngineError::Config {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Loads configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| EngineError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config = Self::from_toml_str(&text, path)?;
        tracing::info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn average_rule(&self) -> AverageRule {
        AverageRule::new(&self.average_indicators)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = DashConfig::from_toml_str(
            "locale = \"en\"\n[classify]\nnumeric_threshold = 0.9\n",
            Path::new("inline.toml"),
        )
        .unwrap();
        assert_eq!(config.locale, NumberLocale::En);
        assert!((config.classify.numeric_threshold - 0.9).abs() < 1e-12);
        assert_eq!(config.classify.sample_size, 100);
        assert_eq!(config.total_label, "Total");
        assert_eq!(config.storage_key, DEFAULT_STORAGE_KEY);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let result = DashConfig::from_toml_str("locale = 3", Path::new("bad.toml"));
        assert!(matches!(result, Err(EngineError::Config { .. })));
    }

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let config = DashConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed = DashConfig::from_toml_str(&text, Path::new("round.toml")).unwrap();
        assert_eq!(parsed, config);
    }
}
