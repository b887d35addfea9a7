use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Dataset fetched when nothing else is configured.
pub const DEFAULT_HANDLE: &str = "tabassum18/handwritten-marathi-character-augmented-dataset";
/// Public Kaggle REST API root.
pub const DEFAULT_API_BASE_URL: &str = "https://www.kaggle.com/api/v1";

pub const ENV_HANDLE: &str = "KFETCH_HANDLE";
pub const ENV_API_BASE_URL: &str = "KFETCH_API_BASE_URL";

/// Global configuration loaded from `~/.config/kfetch/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KfetchConfig {
    /// Dataset handle, `owner/slug` or `owner/slug/versions/N`.
    pub handle: String,
    /// Base URL of the dataset service API (no trailing slash needed).
    pub api_base_url: String,
    /// Seconds allowed for establishing a connection.
    pub connect_timeout_secs: u64,
    /// Abort a transfer slower than this many bytes/sec ...
    pub low_speed_limit_bytes: u32,
    /// ... for this many seconds.
    pub low_speed_time_secs: u64,
    /// Keep the downloaded zip next to the extracted files.
    #[serde(default)]
    pub keep_archive: bool,
}

impl Default for KfetchConfig {
    fn default() -> Self {
        Self {
            handle: DEFAULT_HANDLE.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            connect_timeout_secs: 30,
            low_speed_limit_bytes: 1024,
            low_speed_time_secs: 60,
            keep_archive: false,
        }
    }
}

impl KfetchConfig {
    /// Apply `KFETCH_HANDLE` / `KFETCH_API_BASE_URL` on top of file values.
    pub fn apply_env_overrides<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(h) = env(ENV_HANDLE).filter(|s| !s.trim().is_empty()) {
            tracing::debug!("handle overridden by {}", ENV_HANDLE);
            self.handle = h;
        }
        if let Some(u) = env(ENV_API_BASE_URL).filter(|s| !s.trim().is_empty()) {
            tracing::debug!("api base url overridden by {}", ENV_API_BASE_URL);
            self.api_base_url = u;
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("kfetch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists,
/// then apply environment overrides.
pub fn load_or_init() -> Result<KfetchConfig> {
    let path = config_path()?;
    let mut cfg = load_or_init_at(&path)?;
    cfg.apply_env_overrides(|name| std::env::var(name).ok());
    Ok(cfg)
}

/// Like [`load_or_init`] for an explicit path, without env overrides.
pub fn load_or_init_at(path: &Path) -> Result<KfetchConfig> {
    if !path.exists() {
        let default_cfg = KfetchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)
            .with_context(|| format!("failed to write default config {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let cfg: KfetchConfig =
        toml::from_str(&data).with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}
