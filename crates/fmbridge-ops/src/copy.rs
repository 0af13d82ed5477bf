//! Recursive copy of files and directory trees.

use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};

use fmbridge_core::{FacadeConfig, FsError, Result};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Options for copy operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyOptions {
    /// Replace existing files instead of failing (directories are merged).
    pub overwrite: bool,
    /// Copy what symbolic links point to instead of the links themselves.
    pub follow_symlinks: bool,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            follow_symlinks: true,
        }
    }
}

impl From<&FacadeConfig> for CopyOptions {
    fn from(config: &FacadeConfig) -> Self {
        Self {
            overwrite: config.overwrite,
            follow_symlinks: config.follow_symlinks,
        }
    }
}

/// Totals for a finished copy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyStats {
    /// Files (and links) written.
    pub files: usize,
    /// Directories created.
    pub directories: usize,
    /// Bytes copied.
    pub bytes: u64,
}

impl CopyStats {
    /// Get a human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "{} files, {} directories, {} bytes",
            self.files, self.directories, self.bytes
        )
    }
}

/// Copy `source` to `target`.
///
/// A file is byte-copied. A directory is recreated at `target` (whose parent
/// must exist) and every entry below it, hidden ones included, is copied one
/// at a time. The first failure aborts the whole copy; whatever was already
/// written stays in place. `cancel` is checked between entries.
pub fn copy_path(
    source: &Path,
    target: &Path,
    options: &CopyOptions,
    cancel: &CancellationToken,
) -> Result<CopyStats> {
    tracing::debug!(
        source = %source.display(),
        dest = %target.display(),
        "copy started"
    );

    let metadata = entry_metadata(source, options.follow_symlinks)?;
    reject_self_copy(source, target, metadata.is_dir())?;

    let mut stats = CopyStats::default();
    copy_entry(source, target, &metadata, options, cancel, &mut stats)?;

    tracing::debug!(dest = %target.display(), "copy finished: {}", stats.summary());
    Ok(stats)
}

fn copy_entry(
    source: &Path,
    target: &Path,
    metadata: &Metadata,
    options: &CopyOptions,
    cancel: &CancellationToken,
    stats: &mut CopyStats,
) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(FsError::Cancelled);
    }

    if metadata.is_dir() {
        copy_dir(source, target, options, cancel, stats)
    } else if metadata.file_type().is_symlink() {
        copy_symlink(source, target, options)?;
        stats.files += 1;
        Ok(())
    } else {
        stats.bytes += copy_file(source, target, options)?;
        stats.files += 1;
        Ok(())
    }
}

fn copy_dir(
    source: &Path,
    target: &Path,
    options: &CopyOptions,
    cancel: &CancellationToken,
    stats: &mut CopyStats,
) -> Result<()> {
    create_target_dir(target, options)?;
    stats.directories += 1;

    let entries = fs::read_dir(source).map_err(|e| FsError::io(source, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| FsError::io(source, e))?;
        let child_source = entry.path();
        let child_target = target.join(entry.file_name());
        let metadata = entry_metadata(&child_source, options.follow_symlinks)?;

        tracing::trace!(entry = %child_source.display(), "copying entry");
        copy_entry(
            &child_source,
            &child_target,
            &metadata,
            options,
            cancel,
            stats,
        )?;
    }

    Ok(())
}

/// Create the directory for a copied tree.
///
/// Only the last component is created. An existing directory is reused when
/// overwriting.
fn create_target_dir(target: &Path, options: &CopyOptions) -> Result<()> {
    match fs::create_dir(target) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            if options.overwrite && target.is_dir() {
                Ok(())
            } else {
                Err(FsError::AlreadyExists {
                    path: target.to_path_buf(),
                })
            }
        }
        Err(e) => Err(FsError::io(target, e)),
    }
}

/// Copy one file, returning the number of bytes written.
fn copy_file(source: &Path, target: &Path, options: &CopyOptions) -> Result<u64> {
    prepare_file_target(target, options)?;
    fs::copy(source, target).map_err(|e| FsError::io(source, e))
}

#[cfg(unix)]
fn copy_symlink(source: &Path, target: &Path, options: &CopyOptions) -> Result<()> {
    let link = fs::read_link(source).map_err(|e| FsError::io(source, e))?;
    prepare_file_target(target, options)?;
    std::os::unix::fs::symlink(&link, target).map_err(|e| FsError::io(target, e))
}

#[cfg(not(unix))]
fn copy_symlink(source: &Path, target: &Path, options: &CopyOptions) -> Result<()> {
    copy_file(source, target, options).map(|_| ())
}

/// Make room for a file at `target`, or refuse if something is there.
fn prepare_file_target(target: &Path, options: &CopyOptions) -> Result<()> {
    let Ok(existing) = fs::symlink_metadata(target) else {
        return Ok(());
    };

    if !options.overwrite || existing.is_dir() {
        return Err(FsError::AlreadyExists {
            path: target.to_path_buf(),
        });
    }

    fs::remove_file(target).map_err(|e| FsError::io(target, e))
}

pub(crate) fn entry_metadata(path: &Path, follow_symlinks: bool) -> Result<Metadata> {
    let metadata = if follow_symlinks {
        fs::metadata(path)
    } else {
        fs::symlink_metadata(path)
    };
    metadata.map_err(|e| FsError::io(path, e))
}

/// Refuse to copy an entry onto itself, a directory into its own subtree, or
/// an entry onto a directory that contains it.
pub(crate) fn reject_self_copy(source: &Path, target: &Path, is_dir: bool) -> Result<()> {
    let Ok(source_abs) = source.canonicalize() else {
        return Ok(());
    };
    let source_entry = anchored(source);
    let target_abs = absolute_target(target);

    // Replacing an ancestor of the source would delete the source with it.
    let overlaps = source_abs.starts_with(&target_abs)
        || source_entry.starts_with(&target_abs)
        || (is_dir && target_abs.starts_with(&source_abs));

    if overlaps {
        return Err(FsError::SourceIsAncestor {
            path: source.to_path_buf(),
            destination: target.to_path_buf(),
        });
    }
    Ok(())
}

/// Canonical form of a target that may not exist yet.
fn absolute_target(target: &Path) -> PathBuf {
    target.canonicalize().unwrap_or_else(|_| anchored(target))
}

/// Canonical parent joined with the final component, which is not resolved.
fn anchored(path: &Path) -> PathBuf {
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => {
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            match parent.canonicalize() {
                Ok(parent) => parent.join(name),
                Err(_) => path.to_path_buf(),
            }
        }
        _ => path.to_path_buf(),
    }
}
