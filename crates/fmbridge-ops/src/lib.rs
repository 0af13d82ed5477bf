//! Filesystem facade for fmbridge.
//!
//! This crate exposes a small set of filesystem operations (copy, move,
//! delete, stat, MIME lookup) through [`FileManager`], and runs copy and
//! move transfers on background workers. Each transfer gets its own
//! [`TaskHandle`] and registry entry; completion is published through
//! observable properties and a broadcast event channel.

mod copy;
mod facade;
mod fs_ops;
mod mime;
mod move_op;
mod property;
mod task;

pub use copy::{copy_path, CopyOptions, CopyStats};
pub use facade::{FacadeEvent, FileManager};
pub use fs_ops::{
    exists, home_dir, is_file, measure, remove_dir, remove_file, root_dir, size, stat,
    url_to_path,
};
pub use mime::{mime_for, mime_for_name, mime_for_url, DIRECTORY_MIME, OCTET_STREAM};
pub use move_op::move_path;
pub use property::Property;
pub use task::{TaskHandle, TaskId, TaskKind, TaskRecord, TaskRegistry, TaskStatus};

pub use fmbridge_core::{FacadeConfig, FsError, Result};
