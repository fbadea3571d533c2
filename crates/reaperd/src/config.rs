//! reaper.toml configuration parser and settings resolution.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use reaper_sweep::{webhook_delete, DeletionCatalog, DEFAULT_TIMEOUT};

/// Environment variable overriding the registry data directory.
pub const ENV_DATA_DIR: &str = "REAPER_DATA_DIR";

/// Environment variable overriding the registry table name.
pub const ENV_TABLE: &str = "REAPER_TABLE";

/// Data directory used when nothing else names one.
pub const DEFAULT_DATA_DIR: &str = "/var/lib/reaper";

/// Contents of reaper.toml.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReaperConfig {
    pub registry: Option<RegistryConfig>,
    #[serde(default, rename = "provider")]
    pub providers: Vec<ProviderConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    pub data_dir: Option<PathBuf>,
    pub table: Option<String>,
}

/// One `[[provider]]` entry wiring a (service, resource) pair to a
/// delete webhook.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub service: String,
    pub resource: String,
    pub endpoint: String,
    pub timeout_ms: Option<u64>,
}

/// Effective registry settings after precedence resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrySettings {
    pub data_dir: PathBuf,
    pub table: String,
}

impl ReaperConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ReaperConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Resolve registry settings: flag > environment > file > default.
    ///
    /// Environment values are passed in rather than read here so the
    /// resolution stays a pure function.
    pub fn registry_settings(
        &self,
        flag_data_dir: Option<PathBuf>,
        flag_table: Option<String>,
        env_data_dir: Option<String>,
        env_table: Option<String>,
    ) -> RegistrySettings {
        let file = self.registry.as_ref();
        RegistrySettings {
            data_dir: flag_data_dir
                .or(env_data_dir.map(PathBuf::from))
                .or_else(|| file.and_then(|r| r.data_dir.clone()))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            table: flag_table
                .or(env_table)
                .or_else(|| file.and_then(|r| r.table.clone()))
                .unwrap_or_else(|| reaper_state::DEFAULT_TABLE.to_string()),
        }
    }
}

/// Build the deletion catalog from the configured providers.
pub fn build_catalog(providers: &[ProviderConfig]) -> anyhow::Result<DeletionCatalog> {
    let mut catalog = DeletionCatalog::new();
    for provider in providers {
        let timeout = provider
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_TIMEOUT);
        let op = webhook_delete(&provider.endpoint, timeout)?;
        catalog.register(&provider.service, &provider.resource, op);
    }
    Ok(catalog)
}
