//! Facade configuration types.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::{FsError, Result};

/// Application name used for the data directory when none is configured.
pub const DEFAULT_APP_NAME: &str = "fmbridge";

/// Configuration for the filesystem facade.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct FacadeConfig {
    /// Name used to derive the application data directory.
    #[builder(default = "DEFAULT_APP_NAME.to_string()")]
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Explicit data directory, overriding the platform location.
    #[builder(default)]
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Replace existing targets instead of failing.
    #[builder(default = "false")]
    #[serde(default)]
    pub overwrite: bool,

    /// Copy the contents behind symbolic links rather than the links.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub follow_symlinks: bool,

    /// Send removed entries to the platform trash.
    #[builder(default = "false")]
    #[serde(default)]
    pub use_trash: bool,

    /// Buffer size of the facade event channel.
    #[builder(default = "64")]
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// Finished task records kept in the registry; older ones are dropped.
    #[builder(default = "128")]
    #[serde(default = "default_retain_finished")]
    pub retain_finished: usize,
}

fn default_app_name() -> String {
    DEFAULT_APP_NAME.to_string()
}

fn default_true() -> bool {
    true
}

fn default_event_capacity() -> usize {
    64
}

fn default_retain_finished() -> usize {
    128
}

impl FacadeConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(ref name) = self.app_name {
            check_app_name(name)?;
        }
        if let Some(0) = self.event_capacity {
            return Err("Event capacity must be at least 1".to_string());
        }
        Ok(())
    }
}

fn check_app_name(name: &str) -> std::result::Result<(), String> {
    if name.is_empty() {
        return Err("Application name cannot be empty".to_string());
    }
    if name.contains(['/', '\\']) {
        return Err("Application name cannot contain path separators".to_string());
    }
    Ok(())
}

impl FacadeConfig {
    /// Create a new config builder.
    pub fn builder() -> FacadeConfigBuilder {
        FacadeConfigBuilder::default()
    }

    /// Create a config for the given application name.
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            ..Self::default()
        }
    }

    /// Check a config that did not come through the builder (e.g. deserialized).
    pub fn validate(&self) -> Result<()> {
        check_app_name(&self.app_name).map_err(|message| FsError::InvalidConfig { message })?;
        if self.event_capacity == 0 {
            return Err(FsError::InvalidConfig {
                message: "Event capacity must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Resolve the writable application data directory.
    ///
    /// Uses the configured override if present, otherwise the platform data
    /// directory joined with the application name.
    pub fn resolve_data_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        dirs::data_dir()
            .map(|d| d.join(&self.app_name))
            .ok_or_else(|| FsError::InvalidConfig {
                message: "No platform data directory available".to_string(),
            })
    }
}

impl Default for FacadeConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            data_dir: None,
            overwrite: false,
            follow_symlinks: true,
            use_trash: false,
            event_capacity: default_event_capacity(),
            retain_finished: default_retain_finished(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = FacadeConfig::builder()
            .app_name("viewer")
            .overwrite(true)
            .event_capacity(8usize)
            .retain_finished(4usize)
            .build()
            .unwrap();

        assert_eq!(config.app_name, "viewer");
        assert!(config.overwrite);
        assert!(config.follow_symlinks);
        assert_eq!(config.event_capacity, 8);
        assert_eq!(config.retain_finished, 4);
    }

    #[test]
    fn test_config_builder_rejects_bad_name() {
        assert!(FacadeConfig::builder().app_name("").build().is_err());
        assert!(FacadeConfig::builder().app_name("a/b").build().is_err());
        assert!(FacadeConfig::builder().event_capacity(0usize).build().is_err());
    }

    #[test]
    fn test_data_dir_override() {
        let config = FacadeConfig::builder()
            .data_dir(PathBuf::from("/srv/data"))
            .build()
            .unwrap();
        assert_eq!(config.resolve_data_dir().unwrap(), PathBuf::from("/srv/data"));
    }

    #[test]
    fn test_validate_deserialized() {
        let mut config = FacadeConfig::default();
        assert!(config.validate().is_ok());

        config.event_capacity = 0;
        assert!(matches!(
            config.validate(),
            Err(FsError::InvalidConfig { .. })
        ));
    }
}
