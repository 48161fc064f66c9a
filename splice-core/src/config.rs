//! Configuration structures and constants for the splice-core library.
//!
//! This module provides the configuration for merge execution behavior:
//! output locations, concurrency, and the ffmpeg invocation policy.

use crate::error::{CoreError, CoreResult};
use std::path::PathBuf;

// Default constants

/// Default number of concurrency slots for the scheduler.
/// One slot means merges run strictly one at a time in enqueue order.
pub const DEFAULT_MAX_CONCURRENT_JOBS: usize = 1;

/// Default LAME VBR quality for re-encoded output (`-q:a`).
/// Range: 0-9, lower is higher quality.
pub const DEFAULT_MP3_QUALITY: u8 = 2;

/// Main configuration structure for the splice-core library.
///
/// Created by the consumer (e.g. splice-cli or an HTTP front end) and handed
/// to the `Scheduler`. Only `output_dir` is required; everything else has a
/// sensible default.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Directory where merged output files are written.
    pub output_dir: PathBuf,

    /// Directory for transient concat list artifacts (defaults to `output_dir`).
    pub work_dir: Option<PathBuf>,

    /// Number of concurrency slots. Default: 1.
    pub max_concurrent_jobs: usize,

    /// LAME VBR quality used when re-encoding (`-q:a`). Default: 2.
    pub mp3_quality: u8,

    /// Stream-copy the audio instead of re-encoding. Faster, but requires
    /// all inputs to share a codec and parameters.
    pub copy_audio: bool,

    /// The ffmpeg executable to invoke. Overridable for testing.
    pub ffmpeg_program: PathBuf,
}

impl CoreConfig {
    /// Creates a configuration with defaults for the given output directory.
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            output_dir,
            work_dir: None,
            max_concurrent_jobs: DEFAULT_MAX_CONCURRENT_JOBS,
            mp3_quality: DEFAULT_MP3_QUALITY,
            copy_audio: false,
            ffmpeg_program: PathBuf::from("ffmpeg"),
        }
    }

    /// Directory used for transient concat list artifacts.
    #[must_use]
    pub fn work_dir(&self) -> &PathBuf {
        self.work_dir.as_ref().unwrap_or(&self.output_dir)
    }

    /// Validates the configuration, returning a `Config` error on problems.
    pub fn validate(&self) -> CoreResult<()> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(CoreError::Config("output_dir must be set".to_string()));
        }
        if self.max_concurrent_jobs == 0 {
            return Err(CoreError::Config(
                "max_concurrent_jobs must be at least 1".to_string(),
            ));
        }
        if self.mp3_quality > 9 {
            return Err(CoreError::Config(format!(
                "mp3_quality must be 0-9, got {}",
                self.mp3_quality
            )));
        }
        Ok(())
    }
}
