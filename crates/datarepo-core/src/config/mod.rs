//! Configuration schemas.
//!
//! Configuration is deserialized from TOML files via the `config` crate,
//! with environment variables layered on top. Each sub-module represents
//! one configuration section.

pub mod database;
pub mod logging;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use self::database::DatabaseConfig;
pub use self::logging::LoggingConfig;

use crate::error::AppError;

/// Root configuration.
///
/// Top-level deserialization target for the merged configuration sources
/// (`config/default` + `config/{env}` + `DATAREPO_*` variables).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database connection settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration for the given environment name.
    ///
    /// Merges `config/default` with `config/{env}` (both optional) and
    /// environment variables prefixed with `DATAREPO_`, using `__` as the
    /// section separator (`DATAREPO_DATABASE__URL`).
    pub fn load(env: &str) -> Result<Self, AppError> {
        debug!(env, "Loading configuration");

        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false));

        Self::from_builder(builder)
    }

    /// Load configuration from a single explicit file plus the environment.
    pub fn from_file(path: &str) -> Result<Self, AppError> {
        debug!(path, "Loading configuration file");

        let builder =
            config::Config::builder().add_source(config::File::with_name(path).required(true));

        Self::from_builder(builder)
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, AppError> {
        let config = builder
            .add_source(
                config::Environment::with_prefix("DATAREPO")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                "[database]\nurl = \"sqlite://data/app.db\"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .expect("build")
            .try_deserialize()
            .expect("deserialize");

        assert_eq!(config.database.url, "sqlite://data/app.db");
        assert_eq!(config.database.max_connections, 10);
        assert!(config.database.auto_migrate);
        assert!(config.database.create_if_missing);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_missing_database_section_is_rejected() {
        let result: Result<AppConfig, _> = config::Config::builder()
            .add_source(config::File::from_str(
                "[logging]\nlevel = \"debug\"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .expect("build")
            .try_deserialize();

        assert!(result.is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[database]\nurl = \"sqlite::memory:\"\nauto_migrate = false\n\n[logging]\nformat = \"json\"\n",
        )
        .expect("write config");

        let config = AppConfig::from_file(path.to_str().expect("utf-8 path")).expect("load");
        assert_eq!(config.database.url, "sqlite::memory:");
        assert!(!config.database.auto_migrate);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_from_file_keeps_error_source() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing.toml");

        let err = AppConfig::from_file(path.to_str().expect("utf-8 path"))
            .expect_err("missing file");
        assert!(err.is(ErrorKind::Configuration));
        assert!(std::error::Error::source(&err).is_some());
    }
}
