use crate::checkpoint::StalenessPolicy;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_FINTABLES_URL: &str = "https://api.fintables.com";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FintablesProviderConfig {
    pub base_url: String,
}

impl Default for FintablesProviderConfig {
    fn default() -> Self {
        FintablesProviderConfig {
            base_url: DEFAULT_FINTABLES_URL.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub fintables: FintablesProviderConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_user_agent() -> String {
    format!("fonsync/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SyncConfig {
    /// Span of the first download for a fund without any stored history.
    #[serde(default = "default_backfill_years")]
    pub backfill_years: u32,
    /// Funds whose last stored value is older than this are skipped. Unset means always resume.
    #[serde(default)]
    pub stale_after_days: Option<u32>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            backfill_years: default_backfill_years(),
            stale_after_days: None,
        }
    }
}

fn default_backfill_years() -> u32 {
    5
}

impl SyncConfig {
    pub fn staleness(&self) -> StalenessPolicy {
        match self.stale_after_days {
            Some(days) => StalenessPolicy::SkipAfter { days },
            None => StalenessPolicy::Resume,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    /// Directory of the fund store.
    pub data_path: Option<String>,
    /// Public asset root. Company logos are saved under `<public_path>/logos`.
    pub public_path: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "fonsync", "fonsync")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("com", "fonsync", "fonsync")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().join("store"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Applies `FONSYNC_DATA_PATH`, `FONSYNC_PUBLIC_PATH` and `FONSYNC_BASE_URL`
    /// on top of the file values.
    pub fn apply_env_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(path) = lookup("FONSYNC_DATA_PATH") {
            debug!(%path, "Overriding data path from environment");
            self.data_path = Some(path);
        }
        if let Some(path) = lookup("FONSYNC_PUBLIC_PATH") {
            debug!(%path, "Overriding public path from environment");
            self.public_path = Some(path);
        }
        if let Some(url) = lookup("FONSYNC_BASE_URL") {
            debug!(%url, "Overriding Fintables base url from environment");
            self.providers.fintables.base_url = url;
        }
        self
    }
}
