use std::path::PathBuf;
use std::sync::Arc;

use crate::aggregation::{ChartCatalog, ChartVariant};
use crate::dataset::Dataset;
use crate::engine::AggregationEngine;
use crate::error::ChurnError;
use crate::presentation::Locale;

pub const DEFAULT_DATA_PATH: &str = "data/churn.csv";

/// Startup configuration: where the table lives and how it is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    pub data_path: PathBuf,
    pub variant: ChartVariant,
    pub locale: Locale,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            variant: ChartVariant::default(),
            locale: Locale::default(),
        }
    }
}

impl DashboardConfig {
    /// Load the table once and wrap it in an engine for the configured variant.
    pub fn build_engine(&self) -> Result<AggregationEngine, ChurnError> {
        let dataset = Dataset::load(&self.data_path)?;
        Ok(AggregationEngine::new(
            Arc::new(dataset),
            ChartCatalog::for_variant(self.variant),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_bundled_location() {
        let config = DashboardConfig::default();
        assert_eq!(config.data_path, PathBuf::from("data/churn.csv"));
        assert_eq!(config.variant, ChartVariant::Full);
        assert_eq!(config.locale, Locale::En);
    }

    #[test]
    fn missing_data_file_fails_engine_build() {
        let config = DashboardConfig {
            data_path: PathBuf::from("/nonexistent/churn.csv"),
            ..DashboardConfig::default()
        };
        assert!(matches!(
            config.build_engine(),
            Err(ChurnError::DataFileNotFound(_))
        ));
    }
}
