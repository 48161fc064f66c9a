//! Merge executor: runs exactly one job's concatenation end-to-end.
//!
//! The executor owns the job for the duration of its slot: it is the only
//! writer of that job's state while running (the single-writer discipline
//! the store relies on). All per-job resources, namely the concat list
//! artifact and the subprocess handle, are released before `execute` returns.

use crate::config::CoreConfig;
use crate::error::{command_failed_error, command_start_error, CoreResult};
use crate::events::{JobEvent, JobEventKind, ProgressBus};
use crate::external::ffmpeg::{build_concat_command, parse_progress_line};
use crate::external::ffprobe_executor::probe_media;
use crate::job::{Job, JobId, JobStatus};
use crate::store::JobStore;
use crate::temp_files::write_concat_list;
use crate::utils::{format_duration, progress_percent};
use std::collections::VecDeque;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::Stdio;

/// Number of trailing stderr lines kept as the failure diagnostic.
const STDERR_TAIL_LINES: usize = 20;

/// Executes one job's merge. The seam between the scheduler and the
/// external tool; tests substitute a stub.
pub trait Merger: Send + Sync {
    /// Drives the job from `Running` to a terminal state, publishing
    /// lifecycle and progress events along the way. Must publish exactly
    /// one terminal event and must not panic on tool failure.
    fn execute(&self, job_id: JobId, store: &JobStore, bus: &ProgressBus);
}

/// Merger implementation driving ffmpeg's concat demuxer.
pub struct FfmpegMerger {
    config: CoreConfig,
}

impl FfmpegMerger {
    pub fn new(config: CoreConfig) -> Self {
        Self { config }
    }

    /// Probes every input and sums the durations. Any probe failure (or a
    /// file without a reported duration) degrades the total to unknown
    /// rather than aborting the merge.
    fn resolve_total_duration(&self, inputs: &[PathBuf]) -> Option<f64> {
        let mut total = 0.0;
        for input in inputs {
            match probe_media(input) {
                Ok(probe) => match probe.duration_secs {
                    Some(duration) => total += duration,
                    None => {
                        log::warn!(
                            "No duration for {}; progress will be indeterminate",
                            input.display()
                        );
                        return None;
                    }
                },
                Err(err) => {
                    log::warn!("Probe failed ({err}); progress will be indeterminate");
                    return None;
                }
            }
        }
        Some(total)
    }

    fn run_merge(&self, job: &Job, store: &JobStore, bus: &ProgressBus) -> CoreResult<String> {
        let total_secs = self.resolve_total_duration(&job.input_files);
        store.set_total_duration(job.id, total_secs)?;
        if let Some(total) = total_secs {
            log::debug!("Job {} total duration: {}", job.id, format_duration(total));
        }

        // Dropped on every exit path below, deleting the artifact.
        let list = write_concat_list(self.config.work_dir(), &job.input_files)?;

        std::fs::create_dir_all(&self.config.output_dir)?;
        let output_path = self.config.output_dir.join(&job.output_name);
        if output_path.exists() {
            std::fs::remove_file(&output_path)?;
        }

        let mut cmd = build_concat_command(&self.config, list.path(), &output_path);
        log::debug!("Running merge command: {cmd:?}");
        let mut child = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| command_start_error("ffmpeg (concat)", e))?;

        // Stream the status channel incrementally; buffering to completion
        // would make live progress impossible.
        let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);
        if let Some(stderr) = child.stderr.take() {
            for line in BufReader::new(stderr).lines() {
                let Ok(line) = line else { break };
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line.clone());

                if let Some(elapsed) = parse_progress_line(&line) {
                    let percent = progress_percent(elapsed, total_secs);
                    if let Some(percent) = percent {
                        store.update_progress(job.id, percent)?;
                    }
                    bus.publish(JobEvent {
                        job_id: job.id,
                        kind: JobEventKind::Progress { percent },
                    });
                }
            }
        }

        let status = child.wait()?;
        if status.success() {
            Ok(job.output_name.clone())
        } else {
            let tail: Vec<String> = tail.into_iter().collect();
            Err(command_failed_error(
                "ffmpeg (concat)",
                status,
                tail.join("\n"),
            ))
        }
    }
}

impl Merger for FfmpegMerger {
    fn execute(&self, job_id: JobId, store: &JobStore, bus: &ProgressBus) {
        let Some(job) = store.get(job_id) else {
            log::error!("Asked to execute unknown job {job_id}");
            return;
        };

        if let Err(err) = store.update_status(job_id, JobStatus::Running) {
            log::error!("Refusing to execute job {job_id}: {err}");
            return;
        }
        log::info!(
            "Starting merge for job {} ({} input file(s) -> {})",
            job_id,
            job.input_files.len(),
            job.output_name
        );
        bus.publish(JobEvent {
            job_id,
            kind: JobEventKind::Started,
        });

        match self.run_merge(&job, store, bus) {
            Ok(output_name) => {
                if let Err(err) = store.complete(job_id) {
                    log::error!("Failed to mark job {job_id} completed: {err}");
                }
                log::info!("Job {job_id} completed: {output_name}");
                bus.publish(JobEvent {
                    job_id,
                    kind: JobEventKind::Completed { output_name },
                });
            }
            Err(err) => {
                let detail = err.to_string();
                if let Err(err) = store.fail(job_id, detail.clone()) {
                    log::error!("Failed to mark job {job_id} failed: {err}");
                }
                log::warn!("Job {job_id} failed: {detail}");
                bus.publish(JobEvent {
                    job_id,
                    kind: JobEventKind::Failed { error: detail },
                });
            }
        }
    }
}
