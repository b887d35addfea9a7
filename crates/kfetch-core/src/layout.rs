//! Where a dataset version lives on disk.
//!
//! `{root}/datasets/{owner}/{slug}/versions/{N}` holds the files;
//! `{root}/datasets/{owner}/{slug}/versions/{N}.complete` marks it finished;
//! `{root}/datasets/{owner}/{slug}/versions/{N}.download/` holds the payload
//! while it is fetched and unpacked.

use crate::handle::DatasetHandle;
use std::path::{Path, PathBuf};

const COMPLETE_SUFFIX: &str = ".complete";
const STAGING_SUFFIX: &str = ".download";

pub fn version_dir(root: &Path, handle: &DatasetHandle, version: u32) -> PathBuf {
    root.join("datasets")
        .join(&handle.owner)
        .join(&handle.slug)
        .join("versions")
        .join(version.to_string())
}

pub fn completion_marker(version_dir: &Path) -> PathBuf {
    with_suffix(version_dir, COMPLETE_SUFFIX)
}

/// Sibling of `version_dir`, so payload names never collide with dataset entries.
pub fn staging_dir(version_dir: &Path) -> PathBuf {
    with_suffix(version_dir, STAGING_SUFFIX)
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut o = path.as_os_str().to_owned();
    o.push(suffix);
    PathBuf::from(o)
}

pub fn is_complete(version_dir: &Path) -> bool {
    completion_marker(version_dir).is_file() && version_dir.is_dir()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_dir_layout() {
        let h = DatasetHandle::parse("alice/letters").unwrap();
        let d = version_dir(Path::new("/work"), &h, 3);
        assert_eq!(d, PathBuf::from("/work/datasets/alice/letters/versions/3"));
        assert_eq!(
            completion_marker(&d),
            PathBuf::from("/work/datasets/alice/letters/versions/3.complete")
        );
        assert_eq!(
            staging_dir(&d),
            PathBuf::from("/work/datasets/alice/letters/versions/3.download")
        );
    }

    #[test]
    fn complete_needs_marker_and_dir() {
        let root = tempfile::tempdir().unwrap();
        let h = DatasetHandle::parse("a/b").unwrap();
        let d = version_dir(root.path(), &h, 1);
        assert!(!is_complete(&d));

        std::fs::create_dir_all(&d).unwrap();
        assert!(!is_complete(&d));

        std::fs::write(completion_marker(&d), b"").unwrap();
        assert!(is_complete(&d));

        std::fs::remove_dir(&d).unwrap();
        assert!(!is_complete(&d));
    }
}
