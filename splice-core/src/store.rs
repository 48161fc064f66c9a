//! Concurrent-safe job registry.
//!
//! The store is the single source of truth for job state and the only
//! structure read concurrently by multiple components. Readers receive
//! cloned snapshots, so a reader can never observe a partially-updated job.
//! Writes go through the transition rules in [`crate::job::JobStatus`]:
//! regression and transitions out of a terminal state fail with
//! `InvalidTransition` (a programming-level invariant violation, fatal to
//! the offending call only).

use crate::error::{CoreError, CoreResult};
use crate::job::{Job, JobId, JobStatus};
use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Registry mapping job identifier to job record. Cheap to clone and share.
#[derive(Clone, Default)]
pub struct JobStore {
    jobs: Arc<Mutex<HashMap<JobId, Job>>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a queued job and inserts it atomically.
    ///
    /// Empty input is rejected with `InvalidRequest` before any record
    /// exists; nothing enters the store.
    pub fn create(&self, input_files: Vec<PathBuf>, output_name: String) -> CoreResult<Job> {
        if input_files.is_empty() {
            return Err(CoreError::InvalidRequest(
                "at least one input file is required".to_string(),
            ));
        }
        let job = Job::new(input_files, output_name);
        let mut jobs = self.jobs.lock().unwrap();
        jobs.insert(job.id, job.clone());
        Ok(job)
    }

    /// Returns a snapshot of the job, or None if unknown.
    #[must_use]
    pub fn get(&self, id: JobId) -> Option<Job> {
        self.jobs.lock().unwrap().get(&id).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Advances a job's status. Only forward transitions are accepted;
    /// terminal states record `finished_at`.
    pub fn update_status(&self, id: JobId, next: JobStatus) -> CoreResult<()> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs.get_mut(&id).ok_or(CoreError::JobNotFound(id))?;
        if !job.status.can_advance_to(next) {
            return Err(CoreError::InvalidTransition {
                from: job.status,
                to: next,
            });
        }
        log::debug!("Job {} status: {} -> {}", id, job.status, next);
        job.status = next;
        if next.is_terminal() {
            job.finished_at = Some(Utc::now());
        }
        Ok(())
    }

    /// Records a progress update for a running job.
    ///
    /// The value is coerced into 0..=100 and kept monotonic: a lower value
    /// than the stored one is ignored, not an error, because the external
    /// tool's output is not guaranteed monotonic byte-for-byte. Updates for
    /// jobs that are not running are dropped silently.
    pub fn update_progress(&self, id: JobId, percent: u8) -> CoreResult<()> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs.get_mut(&id).ok_or(CoreError::JobNotFound(id))?;
        if job.status != JobStatus::Running {
            log::debug!("Ignoring progress update for non-running job {id}");
            return Ok(());
        }
        let percent = percent.min(100);
        if percent > job.progress_percent {
            job.progress_percent = percent;
        }
        Ok(())
    }

    /// Records the probed total duration, or None when probing failed and
    /// progress reporting degrades to indeterminate.
    pub fn set_total_duration(&self, id: JobId, total_secs: Option<f64>) -> CoreResult<()> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs.get_mut(&id).ok_or(CoreError::JobNotFound(id))?;
        job.total_duration_secs = total_secs;
        Ok(())
    }

    /// Marks a running job completed.
    pub fn complete(&self, id: JobId) -> CoreResult<()> {
        self.update_status(id, JobStatus::Completed)
    }

    /// Marks a running job failed and records the diagnostic detail.
    ///
    /// Both mutations happen under one lock so no reader can snapshot a
    /// failed job that does not carry its detail yet.
    pub fn fail(&self, id: JobId, detail: String) -> CoreResult<()> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs.get_mut(&id).ok_or(CoreError::JobNotFound(id))?;
        if !job.status.can_advance_to(JobStatus::Failed) {
            return Err(CoreError::InvalidTransition {
                from: job.status,
                to: JobStatus::Failed,
            });
        }
        log::debug!("Job {} status: {} -> failed", id, job.status);
        job.status = JobStatus::Failed;
        job.finished_at = Some(Utc::now());
        job.error_detail = Some(detail);
        Ok(())
    }

    /// Removes terminal jobs older than `max_age`, returning the evicted
    /// ids. Queued and running jobs are never touched.
    pub fn evict_finished(&self, max_age: chrono::Duration) -> Vec<JobId> {
        let cutoff = Utc::now() - max_age;
        let mut jobs = self.jobs.lock().unwrap();
        let evicted: Vec<JobId> = jobs
            .values()
            .filter(|job| {
                job.status.is_terminal() && job.finished_at.is_some_and(|at| at < cutoff)
            })
            .map(|job| job.id)
            .collect();
        for id in &evicted {
            jobs.remove(id);
        }
        if !evicted.is_empty() {
            log::info!("Evicted {} finished job(s) from the store", evicted.len());
        }
        evicted
    }
}
