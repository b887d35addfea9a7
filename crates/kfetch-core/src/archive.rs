//! Unpacking downloaded dataset archives.

use crate::error::FetchError;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;

const ZIP_MAGIC: [u8; 4] = *b"PK\x03\x04";
/// Empty archives carry only the end-of-central-directory record.
const ZIP_EMPTY_MAGIC: [u8; 4] = *b"PK\x05\x06";

/// True if the file starts with a zip local-file or end-of-directory signature.
pub fn is_zip(path: &Path) -> Result<bool, FetchError> {
    let mut f = File::open(path)
        .map_err(|e| FetchError::storage(format!("open {}", path.display()), e))?;
    let mut magic = [0u8; 4];
    match f.read_exact(&mut magic) {
        Ok(()) => Ok(magic == ZIP_MAGIC || magic == ZIP_EMPTY_MAGIC),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(FetchError::storage(format!("read {}", path.display()), e)),
    }
}

/// Extract every entry of `archive` into `dest`, returning the number of files written.
///
/// Entries whose names would land outside `dest` (absolute paths, `..`)
/// abort the extraction with `FetchError::Archive`.
pub fn extract_zip(archive: &Path, dest: &Path) -> Result<usize, FetchError> {
    let bad = |reason: String| FetchError::Archive {
        path: archive.to_path_buf(),
        reason,
    };

    let file = File::open(archive)
        .map_err(|e| FetchError::storage(format!("open {}", archive.display()), e))?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| bad(e.to_string()))?;

    let mut files = 0usize;
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(|e| bad(e.to_string()))?;
        let rel = match entry.enclosed_name() {
            Some(p) => p.to_path_buf(),
            None => return Err(bad(format!("unsafe entry path {:?}", entry.name()))),
        };
        let out_path = dest.join(&rel);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)
                .map_err(|e| FetchError::storage(format!("create {}", out_path.display()), e))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| FetchError::storage(format!("create {}", parent.display()), e))?;
        }
        let mut out = File::create(&out_path)
            .map_err(|e| FetchError::storage(format!("create {}", out_path.display()), e))?;
        io::copy(&mut entry, &mut out).map_err(|e| {
            // Decompression failures surface as io errors from the entry reader.
            if e.kind() == io::ErrorKind::InvalidData {
                bad(format!("{}: {}", rel.display(), e))
            } else {
                FetchError::storage(format!("write {}", out_path.display()), e)
            }
        })?;
        files += 1;
    }

    tracing::debug!("extracted {} files from {}", files, archive.display());
    Ok(files)
}
