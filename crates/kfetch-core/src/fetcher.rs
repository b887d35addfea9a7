//! The dataset fetcher: handle + destination hint in, local path out.
//!
//! Nothing here retries or translates errors; whatever the client reports is
//! handed straight back to the caller.

use crate::archive;
use crate::client::DatasetClient;
use crate::config::KfetchConfig;
use crate::credentials;
use crate::error::FetchError;
use crate::handle::DatasetHandle;
use crate::layout;
use std::fs;
use std::path::{Path, PathBuf};

/// Materialize a dataset locally and return where its files are.
pub trait Fetch {
    fn fetch(&self, handle: &DatasetHandle, destination_hint: &Path)
        -> Result<PathBuf, FetchError>;
}

/// Production fetcher backed by the dataset service.
#[derive(Debug, Clone)]
pub struct DatasetFetcher {
    client: DatasetClient,
    keep_archive: bool,
}

impl DatasetFetcher {
    pub fn new(client: DatasetClient) -> Self {
        Self {
            client,
            keep_archive: false,
        }
    }

    pub fn keep_archive(mut self, keep: bool) -> Self {
        self.keep_archive = keep;
        self
    }

    /// Build from config, picking up ambient credentials.
    pub fn from_config(cfg: &KfetchConfig) -> Result<Self, FetchError> {
        let creds = credentials::discover()?;
        let client = DatasetClient::new(cfg.api_base_url.clone(), creds, cfg.into());
        Ok(Self::new(client).keep_archive(cfg.keep_archive))
    }

    fn materialize(
        &self,
        handle: &DatasetHandle,
        version: u32,
        dir: &Path,
    ) -> Result<(), FetchError> {
        let staging = layout::staging_dir(dir);
        // Directories without a marker are left over from an interrupted run.
        for stale in [dir, staging.as_path()] {
            if stale.exists() {
                tracing::warn!("removing incomplete {}", stale.display());
                remove_dir(stale)?;
            }
        }
        create_dir(dir)?;
        create_dir(&staging)?;

        // The payload stays outside `dir` so dataset entries can share its name.
        let result = self
            .client
            .download(handle, version, &staging)
            .and_then(|payload| self.place_payload(&payload.path, dir));
        let cleanup = remove_dir(&staging);
        result?;
        cleanup?;

        let marker = layout::completion_marker(dir);
        fs::write(&marker, b"")
            .map_err(|e| FetchError::storage(format!("write {}", marker.display()), e))
    }

    /// Unpack a zip payload into `dir`, or move a single-file payload there.
    fn place_payload(&self, payload: &Path, dir: &Path) -> Result<(), FetchError> {
        let name = match payload.file_name() {
            Some(name) => name,
            None => {
                return Err(FetchError::storage(
                    format!("payload {}", payload.display()),
                    std::io::ErrorKind::InvalidInput.into(),
                ))
            }
        };
        let target = dir.join(name);

        if !archive::is_zip(payload)? {
            tracing::info!("payload is not an archive; keeping {}", target.display());
            return rename(payload, &target);
        }

        let files = archive::extract_zip(payload, dir)?;
        tracing::info!("unpacked {} files into {}", files, dir.display());
        if self.keep_archive {
            if target.exists() {
                tracing::warn!(
                    "not keeping archive: {} is part of the dataset",
                    target.display()
                );
            } else {
                rename(payload, &target)?;
            }
        }
        Ok(())
    }
}

fn create_dir(dir: &Path) -> Result<(), FetchError> {
    fs::create_dir_all(dir)
        .map_err(|e| FetchError::storage(format!("create {}", dir.display()), e))
}

fn remove_dir(dir: &Path) -> Result<(), FetchError> {
    fs::remove_dir_all(dir)
        .map_err(|e| FetchError::storage(format!("remove {}", dir.display()), e))
}

fn rename(from: &Path, to: &Path) -> Result<(), FetchError> {
    fs::rename(from, to).map_err(|e| {
        FetchError::storage(format!("rename {} to {}", from.display(), to.display()), e)
    })
}

impl Fetch for DatasetFetcher {
    fn fetch(
        &self,
        handle: &DatasetHandle,
        destination_hint: &Path,
    ) -> Result<PathBuf, FetchError> {
        let version = match handle.version {
            Some(v) => v,
            None => self.client.current_version(handle)?,
        };
        let dir = layout::version_dir(destination_hint, handle, version);

        if layout::is_complete(&dir) {
            tracing::info!("{} already present at {}", handle.with_version(version), dir.display());
            return Ok(dir);
        }

        self.materialize(handle, version, &dir)?;
        tracing::info!("{} ready at {}", handle.with_version(version), dir.display());
        Ok(dir)
    }
}
