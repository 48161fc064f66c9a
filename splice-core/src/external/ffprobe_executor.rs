//! FFprobe integration for media analysis.
//!
//! This module provides the media probe: duration, size, and container
//! format for a single file. Probe failures are non-fatal by contract;
//! callers fall back to treating the duration as unknown rather than
//! aborting the operation that needed it.

use crate::error::{CoreError, CoreResult};
use ffprobe::{ffprobe, FfProbeError};
use std::path::Path;

/// Structured metadata for one media file.
#[derive(Debug, Default, Clone)]
pub struct MediaProbe {
    /// Duration of the media in seconds, if the container reports one
    pub duration_secs: Option<f64>,
    /// File size in bytes
    pub size_bytes: u64,
    /// Container format name (e.g. "mp3")
    pub format_name: Option<String>,
}

/// Probes a media file for duration, size, and format.
pub fn probe_media(input_path: &Path) -> CoreResult<MediaProbe> {
    log::debug!(
        "Running ffprobe (via crate) for media info on: {}",
        input_path.display()
    );
    match ffprobe(input_path) {
        Ok(metadata) => {
            let duration_secs = metadata
                .format
                .duration
                .as_deref()
                .and_then(|d| d.parse::<f64>().ok());

            let size_bytes = metadata
                .format
                .size
                .parse::<u64>()
                .ok()
                .or_else(|| std::fs::metadata(input_path).ok().map(|m| m.len()))
                .unwrap_or(0);

            if duration_secs.is_none() {
                log::warn!(
                    "ffprobe reported no duration for {}",
                    input_path.display()
                );
            }

            Ok(MediaProbe {
                duration_secs,
                size_bytes,
                format_name: Some(metadata.format.format_name.clone()),
            })
        }
        Err(err) => {
            log::warn!("ffprobe failed for {}: {err:?}", input_path.display());
            Err(map_ffprobe_error(input_path, err))
        }
    }
}

fn map_ffprobe_error(path: &Path, err: FfProbeError) -> CoreError {
    let message = match err {
        FfProbeError::Io(io_err) => format!("failed to run ffprobe: {io_err}"),
        FfProbeError::Status(output) => format!(
            "ffprobe exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ),
        FfProbeError::Deserialize(err) => {
            format!("ffprobe output deserialization: {err}")
        }
        _ => format!("unknown ffprobe error: {err:?}"),
    };
    CoreError::Probe {
        path: path.display().to_string(),
        message,
    }
}
