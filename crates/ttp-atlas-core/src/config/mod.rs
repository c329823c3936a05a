//! Configuration management for the TTP Atlas system.

mod sub_configs;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

pub use sub_configs::{
    ClassifierConfig, IngestConfig, LoggingConfig, MapperConfig, SchemaEntry, StorageConfig,
};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub mapper: MapperConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from files and environment.
    ///
    /// Configuration is loaded in order:
    /// 1. config/default.toml (base settings)
    /// 2. config/{TTP_ATLAS_ENV}.toml (environment-specific)
    /// 3. Environment variables with TTP_ATLAS prefix
    pub fn load() -> CoreResult<Self> {
        let env = std::env::var("TTP_ATLAS_ENV").unwrap_or_else(|_| "development".to_string());

        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            .add_source(config::Environment::with_prefix("TTP_ATLAS").separator("__"));

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &std::path::Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CoreError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| CoreError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Threshold-shaped values must be probabilities; counts must be
    /// positive where zero would disable a component outright.
    pub fn validate(&self) -> CoreResult<()> {
        if !(0.0..=1.0).contains(&self.mapper.acceptance_threshold) {
            return Err(CoreError::Config(
                "mapper.acceptance_threshold must be within [0, 1]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.mapper.tie_band) {
            return Err(CoreError::Config(
                "mapper.tie_band must be within [0, 1]".into(),
            ));
        }
        if self.classifier.top_n == 0 {
            return Err(CoreError::Config(
                "classifier.top_n must be greater than 0".into(),
            ));
        }
        if self.classifier.supervised_min_confirmations == 0 {
            return Err(CoreError::Config(
                "classifier.supervised_min_confirmations must be greater than 0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.classifier.supervised_weight) {
            return Err(CoreError::Config(
                "classifier.supervised_weight must be within [0, 1]".into(),
            ));
        }
        if self.classifier.recalibration_event_threshold == 0 {
            return Err(CoreError::Config(
                "classifier.recalibration_event_threshold must be greater than 0".into(),
            ));
        }
        if self.ingest.max_dimension == 0 {
            return Err(CoreError::Config(
                "ingest.max_dimension must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
