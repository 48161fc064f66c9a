//! Transient concat list artifacts.
//!
//! The ffmpeg concat demuxer consumes a text file listing the input paths in
//! merge order. The list is written as a `NamedTempFile` so it is deleted on
//! every exit path via the Drop trait, success or failure alike.

use crate::error::CoreResult;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{Builder as TempFileBuilder, NamedTempFile};

/// Writes a concat demuxer list for `inputs`, in exactly the given order,
/// into `dir`. The returned handle deletes the file when dropped.
pub fn write_concat_list(dir: &Path, inputs: &[PathBuf]) -> CoreResult<NamedTempFile> {
    std::fs::create_dir_all(dir)?;
    let mut list = TempFileBuilder::new()
        .prefix("inputs_")
        .suffix(".txt")
        .tempfile_in(dir)?;

    for input in inputs {
        // The concat demuxer quoting rules: single quotes, embedded quotes
        // written as '\''
        let escaped = input.to_string_lossy().replace('\'', "'\\''");
        writeln!(list, "file '{escaped}'")?;
    }
    list.flush()?;

    Ok(list)
}
