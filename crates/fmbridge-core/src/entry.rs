//! Metadata describing a single filesystem entry.

use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The kind of a filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    Other,
}

impl EntryKind {
    /// Classify a metadata record.
    pub fn from_metadata(metadata: &Metadata) -> Self {
        let file_type = metadata.file_type();
        if file_type.is_symlink() {
            Self::Symlink
        } else if file_type.is_dir() {
            Self::Directory
        } else if file_type.is_file() {
            Self::File
        } else {
            Self::Other
        }
    }
}

/// Information about a filesystem entry, as returned by `stat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryInfo {
    /// Path that was inspected.
    pub path: PathBuf,
    /// Kind of entry (a symlink is reported as such, not followed).
    pub kind: EntryKind,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time, if the platform reports one.
    pub modified: Option<DateTime<Local>>,
    /// Name starts with a dot.
    pub hidden: bool,
    /// Write permission is not granted.
    pub readonly: bool,
}

impl EntryInfo {
    /// Build entry info from a path and its (non-followed) metadata.
    pub fn from_metadata(path: impl Into<PathBuf>, metadata: &Metadata) -> Self {
        let path = path.into();
        let hidden = is_hidden(&path);
        Self {
            kind: EntryKind::from_metadata(metadata),
            size: metadata.len(),
            modified: metadata.modified().ok().map(system_time_to_local),
            hidden,
            readonly: metadata.permissions().readonly(),
            path,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// Whether the final path component is a dotfile.
pub fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.') && n != "." && n != "..")
}

fn system_time_to_local(time: SystemTime) -> DateTime<Local> {
    DateTime::<Local>::from(time)
}
