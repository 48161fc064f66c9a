//! Core library for audio merge orchestration using ffmpeg and ffprobe.
//!
//! This crate accepts merge requests for ordered sets of audio files,
//! executes them with bounded parallelism against ffmpeg's concat demuxer,
//! and fans live progress out to any number of subscribers.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use splice_core::{CoreConfig, JobStore, ProgressBus, Scheduler};
//! use std::path::PathBuf;
//!
//! let config = CoreConfig::new(PathBuf::from("/path/to/merged"));
//! config.validate().unwrap();
//!
//! let scheduler = Scheduler::new(&config, JobStore::new(), ProgressBus::new());
//! let job_id = scheduler
//!     .enqueue(
//!         vec![PathBuf::from("a.mp3"), PathBuf::from("b.mp3")],
//!         Some("my mix"),
//!     )
//!     .unwrap();
//!
//! for event in scheduler.bus().subscribe(job_id) {
//!     println!("{event:?}");
//! }
//! let job = scheduler.store().get(job_id).unwrap();
//! println!("{}: {}", job.output_name, job.status);
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod executor;
pub mod external;
pub mod job;
pub mod scheduler;
pub mod store;
pub mod temp_files;
pub mod utils;

// Re-exports for public API
pub use config::CoreConfig;
pub use error::{CoreError, CoreResult};
pub use events::{JobEvent, JobEventKind, ProgressBus, Subscription};
pub use executor::{FfmpegMerger, Merger};
pub use external::{probe_media, MediaProbe};
pub use job::{Job, JobId, JobStatus};
pub use scheduler::Scheduler;
pub use store::JobStore;
pub use utils::{format_duration, parse_ffmpeg_time};
