//! Job record and status state machine.
//!
//! A `Job` is one request to concatenate an ordered set of audio inputs into
//! a single output file. Identity fields (`id`, `input_files`, `output_name`)
//! are fixed at creation; status and progress are mutated only through the
//! `JobStore`, which enforces the forward-only transition rules defined here.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// Opaque unique identifier for a job. Never reused.
pub type JobId = Uuid;

/// Lifecycle state of a job.
///
/// Transitions are strictly forward: `Queued -> Running -> (Completed | Failed)`.
/// `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    /// Returns true if no further transitions are possible from this state.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Returns true if moving from `self` to `next` is a legal forward transition.
    #[must_use]
    pub fn can_advance_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Queued, JobStatus::Running)
                | (JobStatus::Running, JobStatus::Completed)
                | (JobStatus::Running, JobStatus::Failed)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "queued"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One merge request: ordered inputs, derived output name, and live state.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    /// Unique identifier, generated at enqueue time.
    pub id: JobId,

    /// Ordered input files. The order is the concatenation order.
    pub input_files: Vec<PathBuf>,

    /// Deterministic output file name (sanitized base + timestamp suffix).
    pub output_name: String,

    /// Current lifecycle state.
    pub status: JobStatus,

    /// Progress percentage (0-100), monotonically non-decreasing while running.
    pub progress_percent: u8,

    /// Diagnostic detail, populated only when `status` is `Failed`.
    pub error_detail: Option<String>,

    /// Sum of probed input durations, used as the progress denominator.
    /// `None` when any probe failed; progress then degrades to indeterminate.
    pub total_duration_secs: Option<f64>,

    /// Creation time, used by the age-based retention sweep.
    pub created_at: DateTime<Utc>,

    /// Time the job reached a terminal state.
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Creates a new queued job. Input validation happens in the store.
    pub(crate) fn new(input_files: Vec<PathBuf>, output_name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            input_files,
            output_name,
            status: JobStatus::Queued,
            progress_percent: 0,
            error_detail: None,
            total_duration_secs: None,
            created_at: Utc::now(),
            finished_at: None,
        }
    }
}
