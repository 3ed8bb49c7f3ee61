//! Application configuration management.
//!
//! Configuration merges from three sources with a clear precedence:
//! defaults, then an optional config file, then `APP_*` environment
//! variables on top.

use crate::Cli;
use serde::{Deserialize, Serialize};

/// The main application configuration composing all component configs.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AppConfig {
    /// Web server configuration (bind address, pagination).
    #[serde(default)]
    pub server: sba_axum::config::ApiConfig,

    /// Database configuration (path, creation).
    #[serde(default)]
    pub database: sba_sqlite::config::SqliteConfig,

    /// Engine configuration (auction defaults, anti-snipe, lock and worker
    /// cadence).
    #[serde(default)]
    pub engine: sba_core::models::EngineConfig,
}

impl AppConfig {
    /// Load configuration with precedence:
    /// 1. Environment variables (highest priority)
    /// 2. Config file given by the CLI
    /// 3. Default values (lowest priority)
    ///
    /// Environment variables map `APP_<SECTION>__<KEY>` to
    /// `<section>.<key>`, e.g. `APP_SERVER__BIND_ADDRESS=0.0.0.0:3000` or
    /// `APP_DATABASE__DATABASE_PATH=/data/auctions.db`.
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = config::Config::builder();

        config = config.add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = &cli.config {
            if path.exists() {
                config = config.add_source(config::File::from(path.as_path()))
            } else {
                return Err(anyhow::anyhow!(
                    "Config file {} does not exist",
                    path.display()
                ));
            }
        }

        config = config.add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let built_config = config.build()?;
        built_config.try_deserialize().map_err(Into::into)
    }
}
