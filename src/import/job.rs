//! Import job record
//!
//! One [`ImportJob`] tracks the lifecycle and outcome counters of a single
//! import run. The record is owned by the registry, mutated only by the
//! detached run task, and read by the polling endpoint through
//! [`ImportJob::snapshot`]. Counter updates are atomic so concurrently
//! resolving rows within a batch never lose increments.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use utoipa::ToSchema;
use uuid::Uuid;

use super::ImportMode;

/// Lifecycle states of an import run. Transitions are monotonic forward;
/// a terminal state is never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    Starting,
    Running,
    Completed,
    Failed,
}

impl ImportStatus {
    fn rank(self) -> u8 {
        match self {
            Self::Starting => 0,
            Self::Running => 1,
            Self::Completed => 2,
            Self::Failed => 3,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// A single row-level failure captured during a run.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RowError {
    /// 1-based data row number matching the source file
    pub row: u64,
    /// Business code of the row, when one was present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short machine-matchable failure reason
    pub reason: String,
    /// Free-form diagnostic detail (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Point-in-time view of a job, serialized by the polling endpoint.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ImportSnapshot {
    /// Unique identifier for the import run
    pub id: Uuid,
    /// Which import variant the run executes
    pub mode: ImportMode,
    /// Current lifecycle state
    pub status: ImportStatus,
    /// Total row count; 0 until decoding completes
    pub total: u32,
    /// Rows resolved so far, regardless of outcome
    pub processed: u32,
    /// Rows that created a new catalog item
    pub succeeded: u32,
    /// Rows that updated an existing catalog item
    pub updated: u32,
    /// Rows skipped as duplicates
    pub ignored: u32,
    /// Row-level failures, in resolution order
    pub errors: Vec<RowError>,
    /// Timestamp when the run was allocated
    pub started_at: DateTime<Utc>,
    /// Timestamp when the run reached a terminal state
    pub finished_at: Option<DateTime<Utc>>,
}

struct JobState {
    status: ImportStatus,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    errors: Vec<RowError>,
}

/// Mutable record of one import run.
pub struct ImportJob {
    pub id: Uuid,
    pub mode: ImportMode,
    total: AtomicU32,
    processed: AtomicU32,
    succeeded: AtomicU32,
    updated: AtomicU32,
    ignored: AtomicU32,
    state: Mutex<JobState>,
}

impl ImportJob {
    pub fn new(mode: ImportMode) -> Self {
        Self {
            id: Uuid::new_v4(),
            mode,
            total: AtomicU32::new(0),
            processed: AtomicU32::new(0),
            succeeded: AtomicU32::new(0),
            updated: AtomicU32::new(0),
            ignored: AtomicU32::new(0),
            state: Mutex::new(JobState {
                status: ImportStatus::Starting,
                started_at: Utc::now(),
                finished_at: None,
                errors: Vec::new(),
            }),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, JobState> {
        // Recover rather than panic if a row task poisoned the lock
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Fix the total row count once decoding has completed.
    pub fn set_total(&self, total: u32) {
        self.total.store(total, Ordering::Relaxed);
    }

    /// Advance the lifecycle state. Regressions are ignored; reaching a
    /// terminal state stamps `finished_at`.
    pub fn advance(&self, status: ImportStatus) {
        let mut state = self.state();
        if status.rank() <= state.status.rank() {
            return;
        }
        state.status = status;
        if status.is_terminal() {
            state.finished_at = Some(Utc::now());
        }
    }

    /// Record a row that created a new catalog item.
    pub fn record_created(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a row that updated an existing catalog item.
    pub fn record_updated(&self) {
        self.updated.fetch_add(1, Ordering::Relaxed);
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a row skipped as a duplicate.
    pub fn record_ignored(&self) {
        self.ignored.fetch_add(1, Ordering::Relaxed);
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a row-level failure. The row still counts as processed.
    pub fn record_error(&self, error: RowError) {
        self.state().errors.push(error);
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Fail the whole run before any row was processed (decode failure).
    /// Appends one synthetic error entry and moves to `Failed`.
    pub fn fail(&self, reason: &str, detail: String) {
        {
            let mut state = self.state();
            state.errors.push(RowError {
                row: 0,
                code: None,
                reason: reason.to_string(),
                detail: Some(detail),
            });
        }
        self.advance(ImportStatus::Failed);
    }

    pub fn status(&self) -> ImportStatus {
        self.state().status
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.state().finished_at
    }

    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }

    /// Produce a point-in-time snapshot. Never blocks on the run itself.
    pub fn snapshot(&self) -> ImportSnapshot {
        let state = self.state();
        ImportSnapshot {
            id: self.id,
            mode: self.mode,
            status: state.status,
            total: self.total.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            updated: self.updated.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
            errors: state.errors.clone(),
            started_at: state.started_at,
            finished_at: state.finished_at,
        }
    }
}
