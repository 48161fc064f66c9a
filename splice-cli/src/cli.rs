// splice-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "Splice: Audio merge tool",
    long_about = "Concatenates audio files into a single output using ffmpeg via the splice-core library."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Merges audio files, in the given order, into one output file
    Merge(MergeArgs),
    /// Prints duration, size, and format information for a media file
    Probe(ProbeArgs),
}

#[derive(Parser, Debug)]
pub struct MergeArgs {
    /// Input audio files, in concatenation order
    #[arg(required = true, value_name = "INPUT_FILES")]
    pub input_files: Vec<PathBuf>,

    /// Directory where the merged file will be saved
    #[arg(short = 'o', long = "output", required = true, value_name = "OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Base name for the output file (a timestamp suffix is always appended)
    #[arg(short, long, value_name = "NAME")]
    pub name: Option<String>,

    /// Stream-copy the audio instead of re-encoding to MP3
    #[arg(long)]
    pub copy_audio: bool,

    /// LAME VBR quality for re-encoded output (0-9, lower is better)
    #[arg(long, value_name = "QUALITY")]
    pub mp3_quality: Option<u8>,
}

#[derive(Parser, Debug)]
pub struct ProbeArgs {
    /// Media file to inspect
    #[arg(required = true, value_name = "INPUT_FILE")]
    pub input_file: PathBuf,

    /// Emit the result as JSON instead of human-readable text
    #[arg(long)]
    pub json: bool,
}
