//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod logging;
pub mod preview;
pub mod renderer;
pub mod storage;
pub mod sync;

use serde::{Deserialize, Serialize};
use validator::Validate;

use self::logging::LoggingConfig;
use self::preview::PreviewCacheConfig;
use self::renderer::RendererConfig;
use self::storage::StorageConfig;
use self::sync::SyncConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// Deserialized from `config/default.toml`, an environment overlay, and
/// `PARTVIEW__*` environment variables.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    /// Blob storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Rendering backend settings.
    #[serde(default)]
    #[validate(nested)]
    pub renderer: RendererConfig,
    /// Asset synchronization settings.
    #[serde(default)]
    #[validate(nested)]
    pub sync: SyncConfig,
    /// Display-side preview cache settings.
    #[serde(default)]
    pub preview_cache: PreviewCacheConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `PARTVIEW__`, then validates
    /// the result.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("PARTVIEW")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let app: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;
        app.validate()?;
        Ok(app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.storage.provider, "local");
        assert_eq!(config.sync.render_width, 1920);
        assert_eq!(config.sync.render_height, 1080);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{ "renderer": { "process_timeout_seconds": 45 } }"#;
        let config: AppConfig = serde_json::from_str(json).expect("deserialize");
        assert_eq!(config.renderer.process_timeout_seconds, 45);
        assert_eq!(config.renderer.max_concurrent_processes, 2);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_out_of_range_timeout_rejected() {
        let mut config = AppConfig::default();
        config.renderer.process_timeout_seconds = 0;
        assert!(config.validate().is_err());
    }
}
