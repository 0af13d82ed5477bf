//! The filesystem facade exposed to UI layers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use fmbridge_core::{EntryInfo, FacadeConfig, FsError, Result};
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

use crate::copy::{copy_path, CopyOptions, CopyStats};
use crate::fs_ops;
use crate::mime::mime_for;
use crate::move_op::move_path;
use crate::property::Property;
use crate::task::{TaskHandle, TaskId, TaskKind, TaskRegistry};

/// Notifications published by the facade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacadeEvent {
    /// The source path was set.
    SourceUrlChanged(String),
    /// The move/copy mode flag was set.
    MoveModeChanged(bool),
    /// A background transfer was scheduled.
    TaskStarted { id: TaskId, kind: TaskKind },
    /// A background transfer finished; `success` is the published copy result.
    TaskFinished {
        id: TaskId,
        kind: TaskKind,
        success: bool,
    },
}

struct Inner {
    config: FacadeConfig,
    source_url: Property<String>,
    move_mode: Property<bool>,
    cp_result: Property<bool>,
    registry: TaskRegistry,
    events: broadcast::Sender<FacadeEvent>,
}

impl Inner {
    fn emit(&self, event: FacadeEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Publish the outcome of a finished transfer.
    fn finish(&self, id: TaskId, kind: TaskKind, result: &Result<CopyStats>) {
        self.registry.finish(id, result);
        let pruned = self.registry.retain_finished(self.config.retain_finished);
        if pruned > 0 {
            tracing::trace!(pruned, "dropped old task records");
        }

        let success = result.is_ok();
        self.cp_result.set(success);
        tracing::debug!(task = %id, cp_result = success, "copy result published");

        match result {
            Ok(stats) => tracing::info!(task = %id, %kind, "transfer finished: {}", stats.summary()),
            Err(FsError::Cancelled) => tracing::info!(task = %id, %kind, "transfer cancelled"),
            Err(e) => tracing::warn!(task = %id, %kind, error = %e, "transfer failed"),
        }

        self.emit(FacadeEvent::TaskFinished { id, kind, success });
    }
}

/// Filesystem facade holding the source path, the move-mode flag and the
/// result of the last completed transfer.
///
/// Cloning is cheap; clones share state. Methods that start transfers must
/// be called from within a Tokio runtime.
#[derive(Clone)]
pub struct FileManager {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for FileManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileManager")
            .field("source_url", &self.source_url())
            .field("move_mode", &self.is_move_mode())
            .field("cp_result", &self.cp_result())
            .field("tasks", &self.inner.registry.len())
            .finish()
    }
}

impl FileManager {
    /// Create a facade with the given configuration.
    pub fn new(config: FacadeConfig) -> Result<Self> {
        config.validate()?;
        let (events, _) = broadcast::channel(config.event_capacity);

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                source_url: Property::default(),
                move_mode: Property::new(false),
                cp_result: Property::new(false),
                registry: TaskRegistry::new(),
                events,
            }),
        })
    }

    pub fn config(&self) -> &FacadeConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.inner.registry
    }

    /// Receiver for all facade events from now on.
    pub fn events(&self) -> broadcast::Receiver<FacadeEvent> {
        self.inner.events.subscribe()
    }

    // Properties

    pub fn source_url(&self) -> String {
        self.inner.source_url.get()
    }

    /// Set the source path; always notifies.
    pub fn set_source_url(&self, url: impl Into<String>) {
        let url = url.into();
        self.inner.source_url.set(url.clone());
        self.inner.emit(FacadeEvent::SourceUrlChanged(url));
    }

    pub fn subscribe_source_url(&self) -> watch::Receiver<String> {
        self.inner.source_url.subscribe()
    }

    pub fn is_move_mode(&self) -> bool {
        self.inner.move_mode.get()
    }

    pub fn set_move_mode(&self, mode: bool) {
        self.inner.move_mode.set(mode);
        self.inner.emit(FacadeEvent::MoveModeChanged(mode));
    }

    pub fn subscribe_move_mode(&self) -> watch::Receiver<bool> {
        self.inner.move_mode.subscribe()
    }

    /// Outcome of the most recently completed transfer.
    pub fn cp_result(&self) -> bool {
        self.inner.cp_result.get()
    }

    pub fn subscribe_cp_result(&self) -> watch::Receiver<bool> {
        self.inner.cp_result.subscribe()
    }

    // Well-known locations

    pub fn home(&self) -> Option<PathBuf> {
        fs_ops::home_dir()
    }

    pub fn root(&self) -> PathBuf {
        fs_ops::root_dir()
    }

    /// The writable application data directory.
    pub fn data_dir(&self) -> Result<PathBuf> {
        self.inner.config.resolve_data_dir()
    }

    /// Resolve the data directory and create it if needed.
    pub fn ensure_data_dir(&self) -> Result<PathBuf> {
        let dir = self.data_dir()?;
        std::fs::create_dir_all(&dir).map_err(|e| FsError::io(&dir, e))?;
        Ok(dir)
    }

    // Queries

    pub fn exists_path(&self, path: impl AsRef<Path>) -> bool {
        fs_ops::exists(path.as_ref())
    }

    pub fn is_file(&self, path: impl AsRef<Path>) -> bool {
        fs_ops::is_file(path.as_ref())
    }

    pub fn size(&self, path: impl AsRef<Path>) -> Result<u64> {
        fs_ops::size(path.as_ref())
    }

    pub fn stat(&self, path: impl AsRef<Path>) -> Result<EntryInfo> {
        fs_ops::stat(path.as_ref())
    }

    /// MIME type name for a path or URL.
    pub fn mime(&self, url: &str) -> String {
        mime_for(url)
    }

    // Deletion

    /// Delete a single file (or trash it, if configured).
    pub fn remove(&self, path: impl AsRef<Path>) -> Result<()> {
        fs_ops::remove_file(path.as_ref(), self.inner.config.use_trash)
    }

    /// Delete a directory tree (or trash it, if configured).
    pub fn remove_dir(&self, path: impl AsRef<Path>) -> Result<()> {
        fs_ops::remove_dir(path.as_ref(), self.inner.config.use_trash)
    }

    // Transfers

    /// Copy synchronously on the calling thread.
    pub fn cp_file(&self, source: impl AsRef<Path>, target: impl AsRef<Path>) -> Result<CopyStats> {
        let options = CopyOptions::from(&self.inner.config);
        copy_path(
            source.as_ref(),
            target.as_ref(),
            &options,
            &CancellationToken::new(),
        )
    }

    /// Start a background copy. Returns immediately.
    pub fn copy_file(&self, source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> TaskHandle {
        self.spawn_transfer(TaskKind::Copy, source.into(), target.into())
    }

    /// Start a background move. The source is removed only after the data
    /// is in place; awaiting the handle observes the completed move.
    pub fn move_file(&self, source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> TaskHandle {
        self.spawn_transfer(TaskKind::Move, source.into(), target.into())
    }

    /// Transfer the current source to `target`, moving or copying according
    /// to the move-mode flag.
    pub fn paste(&self, target: impl Into<PathBuf>) -> Result<TaskHandle> {
        let url = self.source_url();
        if url.is_empty() {
            return Err(FsError::NoSource);
        }
        let source = fs_ops::url_to_path(&url);

        Ok(if self.is_move_mode() {
            self.move_file(source, target)
        } else {
            self.copy_file(source, target)
        })
    }

    /// Request cancellation of a running transfer.
    pub fn cancel(&self, id: TaskId) -> bool {
        self.inner.registry.cancel(id)
    }

    fn spawn_transfer(&self, kind: TaskKind, source: PathBuf, target: PathBuf) -> TaskHandle {
        let (id, cancel) = self
            .inner
            .registry
            .register(kind, source.clone(), target.clone());
        tracing::debug!(
            task = %id,
            %kind,
            source = %source.display(),
            dest = %target.display(),
            "scheduling transfer"
        );
        self.inner.emit(FacadeEvent::TaskStarted { id, kind });

        let inner = Arc::clone(&self.inner);
        let options = CopyOptions::from(&inner.config);
        let token = cancel.clone();

        let join = tokio::spawn(async move {
            let result = tokio::task::spawn_blocking(move || match kind {
                TaskKind::Copy => copy_path(&source, &target, &options, &token),
                TaskKind::Move => move_path(&source, &target, &options, &token),
            })
            .await
            .unwrap_or_else(|e| {
                Err(FsError::TaskFailed {
                    message: e.to_string(),
                })
            });

            inner.finish(id, kind, &result);
            result
        });

        TaskHandle::new(id, kind, join, cancel)
    }
}
