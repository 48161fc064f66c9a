// splice-cli/src/commands/probe.rs
//
// Implements the 'probe' subcommand: inspect a media file and report its
// duration, size, and container format.

use crate::cli::ProbeArgs;
use splice_core::{format_duration, probe_media};

pub fn run_probe(args: ProbeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let probe = probe_media(&args.input_file)?;

    if args.json {
        let value = serde_json::json!({
            "file": args.input_file.display().to_string(),
            "duration_secs": probe.duration_secs,
            "size_bytes": probe.size_bytes,
            "format_name": probe.format_name,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("File:     {}", args.input_file.display());
        match probe.duration_secs {
            Some(secs) => println!("Duration: {} ({secs:.2}s)", format_duration(secs)),
            None => println!("Duration: unknown"),
        }
        println!("Size:     {} bytes", probe.size_bytes);
        println!(
            "Format:   {}",
            probe.format_name.as_deref().unwrap_or("unknown")
        );
    }

    Ok(())
}
