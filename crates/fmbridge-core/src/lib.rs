//! Core types and configuration for fmbridge.
//!
//! This crate provides the error taxonomy, the facade configuration, and the
//! entry metadata types shared by the operations crate and the CLI.

mod config;
mod entry;
mod error;

pub use config::{FacadeConfig, FacadeConfigBuilder, DEFAULT_APP_NAME};
pub use entry::{EntryInfo, EntryKind};
pub use error::{FsError, Result};
