//! Ambient Kaggle credentials: environment first, then `kaggle.json`.

use crate::error::FetchError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_USERNAME: &str = "KAGGLE_USERNAME";
pub const ENV_KEY: &str = "KAGGLE_KEY";
pub const ENV_CONFIG_DIR: &str = "KAGGLE_CONFIG_DIR";
const CREDENTIALS_FILE: &str = "kaggle.json";

/// API username and key, sent as HTTP basic auth.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub key: String,
}

// Keep the key out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Looks up credentials from the process environment and the usual file locations.
///
/// Returns `Ok(None)` when nothing is configured; requests then go out
/// anonymously, which is enough for public datasets.
pub fn discover() -> Result<Option<Credentials>, FetchError> {
    let env = |name: &str| std::env::var(name).ok();
    discover_with(env, &candidate_files())
}

/// Same as [`discover`] with the environment and search path injected.
pub fn discover_with<F>(env: F, files: &[PathBuf]) -> Result<Option<Credentials>, FetchError>
where
    F: Fn(&str) -> Option<String>,
{
    let username = env(ENV_USERNAME).filter(|s| !s.is_empty());
    let key = env(ENV_KEY).filter(|s| !s.is_empty());
    if let (Some(username), Some(key)) = (username, key) {
        tracing::debug!("using credentials from {} / {}", ENV_USERNAME, ENV_KEY);
        return Ok(Some(Credentials { username, key }));
    }

    for path in files {
        if path.is_file() {
            let creds = read_file(path)?;
            tracing::debug!("using credentials from {}", path.display());
            return Ok(Some(creds));
        }
    }

    tracing::debug!("no credentials configured; requests will be anonymous");
    Ok(None)
}

/// Parses a `kaggle.json` file.
pub fn read_file(path: &Path) -> Result<Credentials, FetchError> {
    let fail = |reason: String| FetchError::Credentials {
        path: path.to_path_buf(),
        reason,
    };
    let data = fs::read_to_string(path).map_err(|e| fail(e.to_string()))?;
    let creds: Credentials = serde_json::from_str(&data).map_err(|e| fail(e.to_string()))?;
    if creds.username.is_empty() || creds.key.is_empty() {
        return Err(fail("username and key must be non-empty".to_string()));
    }
    Ok(creds)
}

/// Search order: `$KAGGLE_CONFIG_DIR/kaggle.json` when set, otherwise
/// `~/.kaggle/kaggle.json` followed by `$XDG_CONFIG_HOME/kaggle/kaggle.json`.
fn candidate_files() -> Vec<PathBuf> {
    if let Some(dir) = std::env::var_os(ENV_CONFIG_DIR) {
        return vec![PathBuf::from(dir).join(CREDENTIALS_FILE)];
    }

    let mut files = Vec::new();
    if let Some(home) = std::env::var_os("HOME") {
        files.push(PathBuf::from(home).join(".kaggle").join(CREDENTIALS_FILE));
    }
    if let Ok(xdg_dirs) = xdg::BaseDirectories::new() {
        files.push(
            xdg_dirs
                .get_config_home()
                .join("kaggle")
                .join(CREDENTIALS_FILE),
        );
    }
    files
}
