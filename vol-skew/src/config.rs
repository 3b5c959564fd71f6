//! Application configuration.
//!
//! Loaded from an optional TOML file, then overridden by environment
//! variables prefixed with `VOL_SKEW__` (e.g.
//! `VOL_SKEW__SOURCE__TABLE=Options`). Every field has a default, so an
//! empty configuration scans the original MINI IBEX table.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::data::RecordSchema;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub schema: RecordSchema,
    pub presentation: PresentationConfig,
    pub logging: LoggingConfig,
}

/// Where the records come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Table to scan.
    pub table: String,

    /// Region used to derive the default endpoint.
    pub region: String,

    /// Explicit endpoint, e.g. `http://localhost:8000` for DynamoDB Local.
    pub endpoint: Option<String>,

    /// Maximum items per scan page (store default when unset).
    pub page_limit: Option<u32>,

    /// Directory of captured scan responses. Takes precedence over the
    /// endpoint when set.
    pub export_dir: Option<PathBuf>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            table: "OpcionesFuturosMiniIBEX".to_string(),
            region: "eu-west-1".to_string(),
            endpoint: None,
            page_limit: None,
            export_dir: None,
        }
    }
}

/// Labels and layout for rendered views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresentationConfig {
    pub title: String,

    /// Rows per table page.
    pub page_size: usize,

    /// Sort curve points by strike before handing them to a sink.
    /// Off by default: points keep scan order.
    pub sort_points_by_strike: bool,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            title: "Volatility Skew - MINI IBEX".to_string(),
            page_size: 20,
            sort_points_by_strike: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `tracing` directive when `RUST_LOG` does not override it.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "vol_skew=info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load from `path` (if given) and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let settings = builder
            .add_source(
                Environment::with_prefix("VOL_SKEW")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;
        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.source.export_dir.is_none() && self.source.table.is_empty() {
            return Err(ConfigError::Message(
                "source.table is required when no export_dir is set".to_string(),
            ));
        }
        if self.schema.discriminator.is_empty() || self.schema.option_prefix.is_empty() {
            return Err(ConfigError::Message(
                "schema.discriminator and schema.option_prefix must not be empty".to_string(),
            ));
        }
        if self.presentation.page_size == 0 {
            return Err(ConfigError::Message(
                "presentation.page_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
