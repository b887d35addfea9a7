//! Download target files.
//!
//! Payloads are streamed into `<name>.part` and renamed into place only after
//! the transfer succeeded, so a half-written file never carries the final name.

use crate::error::FetchError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Temporary file suffix used before the atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `data.zip` → `data.zip.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Sequential writer for one in-flight download.
pub struct PartFile {
    out: BufWriter<File>,
    temp_path: PathBuf,
    written: u64,
}

impl PartFile {
    /// Create (truncate) `<final_path>.part`.
    pub fn create(final_path: &Path) -> Result<Self, FetchError> {
        let temp_path = temp_path(final_path);
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(|e| FetchError::storage(format!("create {}", temp_path.display()), e))?;
        Ok(PartFile {
            out: BufWriter::new(file),
            temp_path,
            written: 0,
        })
    }

    pub fn write_chunk(&mut self, data: &[u8]) -> Result<(), FetchError> {
        self.out
            .write_all(data)
            .map_err(|e| FetchError::storage(format!("write {}", self.temp_path.display()), e))?;
        self.written += data.len() as u64;
        Ok(())
    }

    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Flush, fsync and rename the temp file to `final_path`.
    pub fn finalize(self, final_path: &Path) -> Result<(), FetchError> {
        let temp_path = self.temp_path;
        let file = self
            .out
            .into_inner()
            .map_err(|e| FetchError::storage(format!("flush {}", temp_path.display()), e.into_error()))?;
        file.sync_all()
            .map_err(|e| FetchError::storage(format!("sync {}", temp_path.display()), e))?;
        drop(file);

        std::fs::rename(&temp_path, final_path).map_err(|e| {
            FetchError::storage(
                format!("rename {} to {}", temp_path.display(), final_path.display()),
                e,
            )
        })
    }

    /// Remove the temp file after a failed transfer. Errors are logged, not returned.
    pub fn discard(self) {
        let temp_path = self.temp_path;
        drop(self.out);
        if let Err(e) = std::fs::remove_file(&temp_path) {
            tracing::warn!("could not remove {}: {}", temp_path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_path_appends_part() {
        let p = temp_path(Path::new("data.zip"));
        assert_eq!(p.to_string_lossy(), "data.zip.part");
        let p2 = temp_path(Path::new("/tmp/archive.zip"));
        assert_eq!(p2.to_string_lossy(), "/tmp/archive.zip.part");
    }

    #[test]
    fn write_then_finalize_renames() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("out.bin");

        let mut part = PartFile::create(&final_path).unwrap();
        let tp = part.temp_path().to_path_buf();
        part.write_chunk(b"hello ").unwrap();
        part.write_chunk(b"world").unwrap();
        assert_eq!(part.bytes_written(), 11);
        assert!(tp.exists());
        part.finalize(&final_path).unwrap();

        assert!(!tp.exists());
        assert_eq!(std::fs::read(&final_path).unwrap(), b"hello world");
    }

    #[test]
    fn discard_removes_temp() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("out.bin");
        let mut part = PartFile::create(&final_path).unwrap();
        part.write_chunk(b"partial").unwrap();
        let tp = part.temp_path().to_path_buf();
        part.discard();
        assert!(!tp.exists());
        assert!(!final_path.exists());
    }

    #[test]
    fn create_in_missing_dir_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("missing").join("out.bin");
        assert!(matches!(
            PartFile::create(&final_path),
            Err(FetchError::Storage { .. })
        ));
    }
}
