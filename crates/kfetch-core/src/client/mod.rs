//! Blocking client for the dataset service's REST API.
//!
//! Two calls are needed: a metadata lookup to learn the current version of an
//! unversioned handle, and the archive download itself.

mod classify;
mod transfer;

use crate::config::KfetchConfig;
use crate::credentials::Credentials;
use crate::error::FetchError;
use crate::filename::payload_filename;
use crate::handle::DatasetHandle;
use crate::storage::PartFile;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Transport knobs applied to every request.
#[derive(Debug, Clone)]
pub struct TransferOptions {
    pub connect_timeout: Duration,
    /// Abort when throughput stays below `low_speed_limit` bytes/sec for `low_speed_time`.
    pub low_speed_limit: u32,
    pub low_speed_time: Duration,
    pub user_agent: String,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self::from(&KfetchConfig::default())
    }
}

impl From<&KfetchConfig> for TransferOptions {
    fn from(cfg: &KfetchConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            low_speed_limit: cfg.low_speed_limit_bytes,
            low_speed_time: Duration::from_secs(cfg.low_speed_time_secs),
            user_agent: concat!("kfetch/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// A downloaded, not yet unpacked, payload.
#[derive(Debug, Clone)]
pub struct Payload {
    pub path: PathBuf,
    pub bytes: u64,
}

#[derive(Debug, Clone)]
pub struct DatasetClient {
    api_base_url: String,
    credentials: Option<Credentials>,
    opts: TransferOptions,
}

impl DatasetClient {
    pub fn new(
        api_base_url: impl Into<String>,
        credentials: Option<Credentials>,
        opts: TransferOptions,
    ) -> Self {
        let api_base_url = api_base_url.into().trim_end_matches('/').to_string();
        Self {
            api_base_url,
            credentials,
            opts,
        }
    }

    pub fn metadata_url(&self, handle: &DatasetHandle) -> String {
        format!(
            "{}/datasets/view/{}/{}",
            self.api_base_url, handle.owner, handle.slug
        )
    }

    pub fn download_url(&self, handle: &DatasetHandle, version: u32) -> String {
        format!(
            "{}/datasets/download/{}/{}?dataset_version_number={}",
            self.api_base_url, handle.owner, handle.slug, version
        )
    }

    /// Version the service currently serves for `handle` (ignores any pinned version).
    pub fn current_version(&self, handle: &DatasetHandle) -> Result<u32, FetchError> {
        let url = self.metadata_url(handle);
        let mut body = Vec::new();
        transfer::get(&url, self.credentials.as_ref(), &self.opts, |chunk| {
            body.extend_from_slice(chunk);
            Ok(())
        })?;

        let version = parse_current_version(&body).map_err(|reason| FetchError::Protocol {
            url: url.clone(),
            reason,
        })?;
        tracing::info!("{} current version is {}", handle, version);
        Ok(version)
    }

    /// Stream version `version` of `handle` into `dir`, returning the payload file.
    ///
    /// `dir` must exist. The body lands in `<name>.part` first and is renamed
    /// once the transfer and status check succeed; on failure the temp file is removed.
    pub fn download(
        &self,
        handle: &DatasetHandle,
        version: u32,
        dir: &Path,
    ) -> Result<Payload, FetchError> {
        let url = self.download_url(handle, version);
        // The real name is only known from the response headers.
        let staging = dir.join(format!(".{}-v{}.download", handle.slug, version));
        let mut part = PartFile::create(&staging)?;

        tracing::info!("downloading {} from {}", handle, url);
        let result = transfer::get(&url, self.credentials.as_ref(), &self.opts, |chunk| {
            part.write_chunk(chunk)
        });
        let meta = match result {
            Ok(meta) => meta,
            Err(e) => {
                part.discard();
                return Err(e);
            }
        };

        // Short bodies are already rejected by libcurl (partial file) as network errors.
        let bytes = part.bytes_written();

        let name = payload_filename(meta.content_disposition.as_deref(), &handle.slug);
        let final_path = dir.join(name);
        part.finalize(&final_path)?;
        tracing::info!("downloaded {} bytes to {}", bytes, final_path.display());
        Ok(Payload {
            path: final_path,
            bytes,
        })
    }
}

/// Extract `currentVersionNumber` from a dataset metadata body.
fn parse_current_version(body: &[u8]) -> Result<u32, String> {
    let json: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| format!("invalid JSON: {}", e))?;
    let n = json
        .get("currentVersionNumber")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| "missing currentVersionNumber".to_string())?;
    u32::try_from(n)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| format!("bad currentVersionNumber {}", n))
}
