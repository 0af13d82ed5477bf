//! Background transfer tasks and their registry.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use dashmap::DashMap;
use fmbridge_core::{FsError, Result};
use serde::{Deserialize, Serialize};
use strum::Display;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::copy::CopyStats;

/// Unique identifier of a background transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(pub u64);

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a background transfer does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum TaskKind {
    Copy,
    Move,
}

/// Lifecycle state of a background transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Running,
    Succeeded(CopyStats),
    Failed(String),
    Cancelled,
}

impl TaskStatus {
    /// Build the final status from a transfer result.
    pub fn from_result(result: &Result<CopyStats>) -> Self {
        match result {
            Ok(stats) => Self::Succeeded(*stats),
            Err(FsError::Cancelled) => Self::Cancelled,
            Err(e) => Self::Failed(e.to_string()),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }
}

/// A registry entry describing one transfer.
#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub id: TaskId,
    pub kind: TaskKind,
    pub source: PathBuf,
    pub target: PathBuf,
    pub status: TaskStatus,
    pub started: Instant,
    cancel: CancellationToken,
}

/// Registry of transfers keyed by id.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: DashMap<TaskId, TaskRecord>,
    next_id: AtomicU64,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new running transfer and return its id and cancellation token.
    pub fn register(
        &self,
        kind: TaskKind,
        source: PathBuf,
        target: PathBuf,
    ) -> (TaskId, CancellationToken) {
        let id = TaskId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let cancel = CancellationToken::new();
        self.tasks.insert(
            id,
            TaskRecord {
                id,
                kind,
                source,
                target,
                status: TaskStatus::Running,
                started: Instant::now(),
                cancel: cancel.clone(),
            },
        );
        (id, cancel)
    }

    /// Record the final result of a transfer.
    pub fn finish(&self, id: TaskId, result: &Result<CopyStats>) {
        if let Some(mut record) = self.tasks.get_mut(&id) {
            record.status = TaskStatus::from_result(result);
            tracing::trace!(
                task = %id,
                elapsed = ?record.started.elapsed(),
                "task record closed"
            );
        }
    }

    /// Status of a transfer, if it is known.
    pub fn status(&self, id: TaskId) -> Option<TaskStatus> {
        self.tasks.get(&id).map(|r| r.status.clone())
    }

    /// Snapshot of a transfer's record.
    pub fn record(&self, id: TaskId) -> Option<TaskRecord> {
        self.tasks.get(&id).map(|r| r.clone())
    }

    /// Ids of transfers still running, oldest first.
    pub fn running(&self) -> Vec<TaskId> {
        let mut ids: Vec<TaskId> = self
            .tasks
            .iter()
            .filter(|r| r.status.is_running())
            .map(|r| r.id)
            .collect();
        ids.sort();
        ids
    }

    /// Request cancellation of a running transfer.
    ///
    /// Returns false if the id is unknown or the transfer already finished.
    pub fn cancel(&self, id: TaskId) -> bool {
        match self.tasks.get(&id) {
            Some(record) if record.status.is_running() => {
                record.cancel.cancel();
                true
            }
            _ => false,
        }
    }

    /// Drop records of finished transfers, returning how many were removed.
    pub fn prune_finished(&self) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|_, r| r.status.is_running());
        before - self.tasks.len()
    }

    /// Keep at most `keep` finished records, dropping the oldest first.
    ///
    /// Returns how many were removed. Running transfers are never dropped.
    pub fn retain_finished(&self, keep: usize) -> usize {
        let mut finished: Vec<TaskId> = self
            .tasks
            .iter()
            .filter(|r| !r.status.is_running())
            .map(|r| r.id)
            .collect();
        if finished.len() <= keep {
            return 0;
        }

        finished.sort();
        let excess = finished.len() - keep;
        for id in &finished[..excess] {
            self.tasks.remove(id);
        }
        excess
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Handle to a background transfer.
///
/// Dropping the handle does not stop the transfer.
#[derive(Debug)]
pub struct TaskHandle {
    id: TaskId,
    kind: TaskKind,
    join: JoinHandle<Result<CopyStats>>,
    cancel: CancellationToken,
}

impl TaskHandle {
    pub(crate) fn new(
        id: TaskId,
        kind: TaskKind,
        join: JoinHandle<Result<CopyStats>>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id,
            kind,
            join,
            cancel,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Request cooperative cancellation.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the transfer to finish and return its outcome.
    pub async fn wait(self) -> Result<CopyStats> {
        self.join.await.map_err(|e| FsError::TaskFailed {
            message: e.to_string(),
        })?
    }
}
