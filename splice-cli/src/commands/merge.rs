// splice-cli/src/commands/merge.rs
//
// Implements the 'merge' subcommand: enqueue a merge job through the core
// scheduler, subscribe to the progress bus, and render live progress until
// the job reaches a terminal state.

use crate::cli::MergeArgs;
use indicatif::{ProgressBar, ProgressStyle};
use splice_core::{
    CoreConfig, JobEventKind, JobStatus, JobStore, ProgressBus, Scheduler,
};
use std::time::Duration;

pub fn run_merge(args: MergeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = CoreConfig::new(args.output_dir);
    config.copy_audio = args.copy_audio;
    if let Some(quality) = args.mp3_quality {
        config.mp3_quality = quality;
    }
    config.validate()?;

    let scheduler = Scheduler::new(&config, JobStore::new(), ProgressBus::new());
    let job_id = scheduler.enqueue(args.input_files, args.name.as_deref())?;
    let subscription = scheduler.bus().subscribe(job_id);

    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{bar:40.cyan/blue}] {percent:>3}% {msg}")?
            .progress_chars("=> "),
    );
    bar.enable_steady_tick(Duration::from_millis(120));
    bar.set_message("merging...");

    for event in subscription {
        match event.kind {
            JobEventKind::Started => bar.set_message("merging..."),
            JobEventKind::Progress { percent } => match percent {
                Some(percent) => bar.set_position(u64::from(percent)),
                // Total duration unknown: keep the spinner moving only
                None => bar.set_message("merging (duration unknown)..."),
            },
            JobEventKind::Completed { .. } | JobEventKind::Failed { .. } => break,
        }
    }
    bar.finish_and_clear();
    scheduler.wait_for_idle();

    // The store is the source of truth for the outcome; the subscription
    // may have attached after early events.
    let job = scheduler
        .store()
        .get(job_id)
        .ok_or("job disappeared from the store")?;
    match job.status {
        JobStatus::Completed => {
            println!("Merged into {}", config.output_dir.join(&job.output_name).display());
            Ok(())
        }
        JobStatus::Failed => {
            let detail = job.error_detail.unwrap_or_else(|| "unknown error".to_string());
            Err(format!("merge failed: {detail}").into())
        }
        status => Err(format!("job ended in unexpected state: {status}").into()),
    }
}
