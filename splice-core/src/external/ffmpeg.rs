//! FFmpeg concat command construction and status-stream parsing.
//!
//! The parsing side is deliberately a narrow interface: one raw status line
//! in, an optional elapsed-seconds value out. The executor's control flow
//! never sees the text format, so the extraction strategy can be swapped or
//! hardened without touching it.

use crate::config::CoreConfig;
use crate::utils::parse_ffmpeg_time;
use std::path::Path;
use std::process::Command;

/// Builds the ffmpeg concat-demuxer invocation for a merge job.
///
/// `list_path` must point at a concat list written by
/// [`crate::temp_files::write_concat_list`]; its order is the merge order.
pub fn build_concat_command(config: &CoreConfig, list_path: &Path, output_path: &Path) -> Command {
    let mut cmd = Command::new(&config.ffmpeg_program);
    cmd.arg("-y")
        .arg("-f")
        .arg("concat")
        .arg("-safe")
        .arg("0")
        .arg("-i")
        .arg(list_path);

    if config.copy_audio {
        cmd.arg("-c").arg("copy");
    } else {
        cmd.arg("-acodec")
            .arg("libmp3lame")
            .arg("-q:a")
            .arg(config.mp3_quality.to_string());
    }

    cmd.arg(output_path);
    cmd
}

/// Extracts the elapsed time in seconds from one ffmpeg status line.
/// Returns None for lines without a parseable `time=` field.
#[must_use]
pub fn parse_progress_line(line: &str) -> Option<f64> {
    let idx = line.find("time=")?;
    let token = line[idx + 5..].split_whitespace().next()?;
    parse_ffmpeg_time(token)
}
