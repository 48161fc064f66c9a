//! Integration with external media tools.
//!
//! Both tools are substitutable: anything that emits periodic `time=`
//! timestamps on stderr and a conventional exit code can stand in for
//! ffmpeg, and anything returning structured duration/size/format can stand
//! in for ffprobe.

pub mod ffmpeg;
pub mod ffprobe_executor;

pub use ffmpeg::{build_concat_command, parse_progress_line};
pub use ffprobe_executor::{probe_media, MediaProbe};
