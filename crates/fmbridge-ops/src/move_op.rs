//! Move operation: rename when possible, copy then delete otherwise.

use std::fs::{self, Metadata};
use std::io;
use std::path::Path;

use fmbridge_core::{FsError, Result};
use tokio_util::sync::CancellationToken;

use crate::copy::{copy_path, reject_self_copy, CopyOptions, CopyStats};
use crate::fs_ops::measure;

/// Move `source` to `target`.
///
/// Tries a rename first. Only when source and target sit on different
/// filesystems is the entry copied and the source deleted, and the source
/// goes away only once the copy has fully succeeded. A file target is
/// replaced by the rename itself; a directory target in the way is removed
/// just before the transfer.
pub fn move_path(
    source: &Path,
    target: &Path,
    options: &CopyOptions,
    cancel: &CancellationToken,
) -> Result<CopyStats> {
    tracing::debug!(
        source = %source.display(),
        dest = %target.display(),
        "move started"
    );

    let metadata = fs::symlink_metadata(source).map_err(|e| FsError::io(source, e))?;
    reject_self_copy(source, target, metadata.is_dir())?;

    let existing = fs::symlink_metadata(target).ok();
    if existing.is_some() && !options.overwrite {
        return Err(FsError::AlreadyExists {
            path: target.to_path_buf(),
        });
    }

    let stats = measure(source)?;

    if cancel.is_cancelled() {
        return Err(FsError::Cancelled);
    }

    // rename(2) swaps a file over a file, but not over or into a directory.
    if let Some(existing) = existing.filter(|m| m.is_dir() || metadata.is_dir()) {
        clear_target(target, &existing)?;
    }

    match fs::rename(source, target) {
        Ok(()) => {
            tracing::debug!(dest = %target.display(), "moved by rename");
            Ok(stats)
        }
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            tracing::debug!(error = %e, "rename crosses filesystems, copying instead");
            copy_then_remove(source, target, options, cancel)
        }
        Err(e) => Err(FsError::io(source, e)),
    }
}

/// Copy `source` to `target`, then delete `source`.
///
/// The source is only touched once the copy has fully succeeded.
pub(crate) fn copy_then_remove(
    source: &Path,
    target: &Path,
    options: &CopyOptions,
    cancel: &CancellationToken,
) -> Result<CopyStats> {
    let metadata = fs::symlink_metadata(source).map_err(|e| FsError::io(source, e))?;

    // The copy must not follow links here: the source is about to go away.
    let copy_options = CopyOptions {
        follow_symlinks: false,
        ..*options
    };
    let stats = copy_path(source, target, &copy_options, cancel)?;

    let removed = if metadata.is_dir() {
        fs::remove_dir_all(source)
    } else {
        fs::remove_file(source)
    };
    if let Err(e) = removed {
        tracing::warn!(
            source = %source.display(),
            dest = %target.display(),
            error = %e,
            "copied but could not remove source"
        );
        return Err(FsError::io(source, e));
    }

    Ok(stats)
}

/// Remove the entry at `target` so the source can take its place.
fn clear_target(target: &Path, existing: &Metadata) -> Result<()> {
    tracing::debug!(path = %target.display(), "clearing move target");
    let removed = if existing.is_dir() {
        fs::remove_dir_all(target)
    } else {
        fs::remove_file(target)
    };
    removed.map_err(|e| FsError::io(target, e))
}
