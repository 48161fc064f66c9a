//! Utility functions for time parsing and output naming.
//!
//! This module provides general-purpose helpers used throughout the
//! splice-core library: ffmpeg timestamp parsing, duration formatting, and
//! the deterministic output-name derivation.

use chrono::Utc;

/// Parses an ffmpeg time string (HH:MM:SS.MS) to seconds. Returns None if invalid.
#[must_use]
pub fn parse_ffmpeg_time(time: &str) -> Option<f64> {
    let parts: Vec<&str> = time.split(':').collect();
    if parts.len() == 3 {
        let hours = parts[0].parse::<f64>().ok()?;
        let minutes = parts[1].parse::<f64>().ok()?;
        let seconds = parts[2].parse::<f64>().ok()?;
        Some(hours * 3600.0 + minutes * 60.0 + seconds)
    } else {
        None
    }
}

/// Formats seconds as HH:MM:SS (e.g., 3725.0 -> "01:02:05"). Returns "??:??:??" for invalid inputs.
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    if seconds < 0.0 || !seconds.is_finite() {
        return "??:??:??".to_string();
    }

    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Sanitizes a user-supplied base name for use in a file name.
///
/// Whitespace runs become underscores, anything outside `[A-Za-z0-9_\-.]` is
/// stripped, and underscore runs collapse. An empty result falls back to
/// "merged".
#[must_use]
pub fn sanitize_base_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_underscore = false;
    for c in name.trim().chars() {
        let mapped = if c.is_whitespace() { '_' } else { c };
        if mapped == '_' {
            if !last_underscore {
                out.push('_');
            }
            last_underscore = true;
        } else if mapped.is_ascii_alphanumeric() || mapped == '-' || mapped == '.' {
            out.push(mapped);
            last_underscore = false;
        }
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "merged".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Derives the deterministic output name: sanitized base + millisecond
/// timestamp suffix. Two jobs enqueued with the same base still get
/// distinguishable outputs.
#[must_use]
pub fn derive_output_name(base: Option<&str>) -> String {
    let base = sanitize_base_name(base.unwrap_or("merged"));
    format!("{}_{}.mp3", base, Utc::now().timestamp_millis())
}

/// Computes a clamped progress percentage from elapsed and total seconds.
/// Returns None when the total is unknown or not positive.
#[must_use]
pub fn progress_percent(elapsed_secs: f64, total_secs: Option<f64>) -> Option<u8> {
    let total = total_secs?;
    if total <= 0.0 || !elapsed_secs.is_finite() {
        return None;
    }
    let percent = (elapsed_secs / total * 100.0).round();
    Some(percent.clamp(0.0, 100.0) as u8)
}
