//! Thin wrappers over native filesystem calls.

use std::fs;
use std::path::{Path, PathBuf};

use fmbridge_core::{EntryInfo, FsError, Result};

use crate::copy::CopyStats;

/// The user's home directory, if the platform reports one.
pub fn home_dir() -> Option<PathBuf> {
    dirs::home_dir()
}

/// The filesystem root.
#[cfg(not(windows))]
pub fn root_dir() -> PathBuf {
    PathBuf::from("/")
}

/// The filesystem root (the system drive on Windows).
#[cfg(windows)]
pub fn root_dir() -> PathBuf {
    let drive = std::env::var("SystemDrive").unwrap_or_else(|_| "C:".to_string());
    PathBuf::from(format!("{drive}\\"))
}

/// Turn a `file://` URL into a local path; plain paths pass through.
pub fn url_to_path(url: &str) -> PathBuf {
    match url.strip_prefix("file://") {
        Some(rest) => PathBuf::from(rest),
        None => PathBuf::from(url),
    }
}

/// Whether any entry exists at `path` (symlinks are followed).
pub fn exists(path: &Path) -> bool {
    path.exists()
}

/// Whether `path` is a regular file (symlinks are followed).
pub fn is_file(path: &Path) -> bool {
    path.is_file()
}

/// Size in bytes of the entry at `path`.
pub fn size(path: &Path) -> Result<u64> {
    fs::metadata(path)
        .map(|m| m.len())
        .map_err(|e| FsError::io(path, e))
}

/// Inspect `path` without following a final symlink.
pub fn stat(path: &Path) -> Result<EntryInfo> {
    let metadata = fs::symlink_metadata(path).map_err(|e| FsError::io(path, e))?;
    Ok(EntryInfo::from_metadata(path, &metadata))
}

/// Delete a single file, or send it to the trash.
pub fn remove_file(path: &Path, use_trash: bool) -> Result<()> {
    tracing::debug!(path = %path.display(), use_trash, "removing file");

    if use_trash {
        if fs::symlink_metadata(path).is_err() {
            return Err(FsError::NotFound {
                path: path.to_path_buf(),
            });
        }
        return trash_entry(path);
    }

    fs::remove_file(path).map_err(|e| FsError::io(path, e))
}

/// Recursively delete a directory tree, or send it to the trash.
///
/// A directory that does not exist counts as removed.
pub fn remove_dir(path: &Path, use_trash: bool) -> Result<()> {
    tracing::debug!(path = %path.display(), use_trash, "removing directory");

    let metadata = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(FsError::io(path, e)),
    };

    if !metadata.is_dir() {
        return Err(FsError::NotADirectory {
            path: path.to_path_buf(),
        });
    }

    if use_trash {
        return trash_entry(path);
    }

    fs::remove_dir_all(path).map_err(|e| FsError::io(path, e))
}

fn trash_entry(path: &Path) -> Result<()> {
    trash::delete(path).map_err(|e| FsError::Trash {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Count files, directories and bytes under `path` without following symlinks.
pub fn measure(path: &Path) -> Result<CopyStats> {
    let mut stats = CopyStats::default();
    measure_into(path, &mut stats)?;
    Ok(stats)
}

fn measure_into(path: &Path, stats: &mut CopyStats) -> Result<()> {
    let metadata = fs::symlink_metadata(path).map_err(|e| FsError::io(path, e))?;

    if metadata.is_dir() {
        stats.directories += 1;
        for entry in fs::read_dir(path).map_err(|e| FsError::io(path, e))? {
            let entry = entry.map_err(|e| FsError::io(path, e))?;
            measure_into(&entry.path(), stats)?;
        }
    } else {
        stats.files += 1;
        stats.bytes += metadata.len();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_to_path() {
        assert_eq!(url_to_path("file:///tmp/a.txt"), PathBuf::from("/tmp/a.txt"));
        assert_eq!(url_to_path("/tmp/a.txt"), PathBuf::from("/tmp/a.txt"));
    }

    #[test]
    fn test_exists_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, b"abc").unwrap();

        assert!(exists(&file));
        assert!(is_file(&file));
        assert_eq!(size(&file).unwrap(), 3);

        remove_file(&file, false).unwrap();
        assert!(!exists(&file));
        assert!(matches!(
            remove_file(&file, false),
            Err(FsError::NotFound { .. })
        ));
    }

    #[test]
    fn test_remove_dir_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        assert!(remove_dir(&dir.path().join("nope"), false).is_ok());
    }

    #[test]
    fn test_remove_dir_rejects_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, b"abc").unwrap();
        assert!(matches!(
            remove_dir(&file, false),
            Err(FsError::NotADirectory { .. })
        ));
    }

    #[test]
    fn test_measure_tree() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("tree");
        fs::create_dir_all(root.join("b")).unwrap();
        fs::write(root.join("a.txt"), b"12345").unwrap();
        fs::write(root.join("b").join("c.txt"), b"123").unwrap();

        let stats = measure(&root).unwrap();
        assert_eq!(stats.files, 2);
        assert_eq!(stats.directories, 2);
        assert_eq!(stats.bytes, 8);
    }

    #[test]
    fn test_root_dir_is_absolute() {
        assert!(root_dir().is_absolute() || cfg!(windows));
    }
}
