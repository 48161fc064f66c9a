//! End-to-end tests for the merge pipeline, driving the real executor
//! against a fake ffmpeg script so no media tooling is required.
//!
//! The fake tool honors the executor's contract: it reads the concat list
//! passed after `-i`, emits `time=` status lines on stderr, writes the
//! output path given as the last argument, and exits 0 or 1.

#![cfg(unix)]

use splice_core::{
    CoreConfig, JobEventKind, JobStatus, JobStore, ProgressBus, Scheduler,
};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

fn write_fake_ffmpeg(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-ffmpeg");
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

/// Copies the concat list to the output, so the output content encodes the
/// exact input order the tool was given.
const ECHO_LIST_BODY: &str = r#"
list=""
prev=""
for a; do
  if [ "$prev" = "-i" ]; then list="$a"; fi
  prev="$a"
  last="$a"
done
sleep 0.2
echo "size=     256kB time=00:00:01.00 bitrate=N/A speed=30x" 1>&2
echo "size=     512kB time=00:00:02.00 bitrate=N/A speed=30x" 1>&2
cat "$list" > "$last"
exit 0
"#;

const FAILING_BODY: &str = r#"
echo "ffmpeg: unrecoverable demuxer error" 1>&2
exit 1
"#;

struct TestHarness {
    root: tempfile::TempDir,
    merged_dir: PathBuf,
    scheduler: Scheduler,
}

fn harness(script_body: &str) -> TestHarness {
    let root = tempfile::tempdir().unwrap();
    let merged_dir = root.path().join("merged");
    let mut config = CoreConfig::new(merged_dir.clone());
    config.ffmpeg_program = write_fake_ffmpeg(root.path(), script_body);
    config.validate().unwrap();

    // Dummy inputs; ffprobe cannot parse them, so progress is indeterminate
    for name in ["a.mp3", "b.mp3", "c.mp3"] {
        fs::write(root.path().join(name), b"not really audio").unwrap();
    }

    let scheduler = Scheduler::new(&config, JobStore::new(), ProgressBus::new());
    TestHarness {
        root,
        merged_dir,
        scheduler,
    }
}

impl TestHarness {
    fn input(&self, name: &str) -> PathBuf {
        self.root.path().join(name)
    }

    fn list_artifacts(&self) -> Vec<PathBuf> {
        match fs::read_dir(&self.merged_dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| {
                    p.file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with("inputs_"))
                })
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

#[test]
fn test_merge_completes_with_indeterminate_progress() {
    let h = harness(ECHO_LIST_BODY);
    let id = h
        .scheduler
        .enqueue(vec![h.input("a.mp3"), h.input("b.mp3")], Some("my mix"))
        .unwrap();
    let sub = h.scheduler.bus().subscribe(id);

    let events: Vec<_> = sub.collect();
    assert!(!events.is_empty());
    let last = events.last().unwrap();
    assert!(matches!(last.kind, JobEventKind::Completed { .. }));
    // Probes failed, so every progress event must be indeterminate
    for event in &events {
        if let JobEventKind::Progress { percent } = event.kind {
            assert_eq!(percent, None);
        }
    }

    h.scheduler.wait_for_idle();
    let job = h.scheduler.store().get(id).unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.total_duration_secs, None);
    assert!(job.output_name.starts_with("my_mix_"));
    assert!(h.merged_dir.join(&job.output_name).exists());
    assert!(h.list_artifacts().is_empty());
}

#[test]
fn test_concatenation_order_is_load_bearing() {
    let h = harness(ECHO_LIST_BODY);
    let forward = h
        .scheduler
        .enqueue(
            vec![h.input("a.mp3"), h.input("b.mp3"), h.input("c.mp3")],
            Some("fwd"),
        )
        .unwrap();
    let reverse = h
        .scheduler
        .enqueue(
            vec![h.input("c.mp3"), h.input("b.mp3"), h.input("a.mp3")],
            Some("rev"),
        )
        .unwrap();
    h.scheduler.wait_for_idle();

    let read = |id| {
        let job = h.scheduler.store().get(id).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        fs::read_to_string(h.merged_dir.join(&job.output_name)).unwrap()
    };
    let forward_content = read(forward);
    let reverse_content = read(reverse);

    // The fake tool wrote the concat list it was handed: order must match
    // the enqueue order exactly, and reversed inputs give a different output
    let a_pos = forward_content.find("a.mp3").unwrap();
    let c_pos = forward_content.find("c.mp3").unwrap();
    assert!(a_pos < c_pos);
    assert_ne!(forward_content, reverse_content);
}

#[test]
fn test_failed_merge_records_detail_and_cleans_up() {
    let h = harness(FAILING_BODY);
    let id = h
        .scheduler
        .enqueue(vec![h.input("a.mp3")], None)
        .unwrap();
    h.scheduler.wait_for_idle();

    let job = h.scheduler.store().get(id).unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    let detail = job.error_detail.unwrap();
    assert!(detail.contains("unrecoverable demuxer error"));
    assert!(h.list_artifacts().is_empty());
}

#[test]
fn test_fifo_with_single_slot_under_real_executor() {
    let h = harness(ECHO_LIST_BODY);
    let j1 = h
        .scheduler
        .enqueue(vec![h.input("a.mp3"), h.input("b.mp3")], Some("j1"))
        .unwrap();
    let j2 = h.scheduler.enqueue(vec![h.input("c.mp3")], Some("j2")).unwrap();

    // J1 must reach Running while J2 is still queued
    loop {
        let s1 = h.scheduler.store().get(j1).unwrap().status;
        if s1 == JobStatus::Running {
            assert_eq!(h.scheduler.store().get(j2).unwrap().status, JobStatus::Queued);
            break;
        }
        assert_eq!(s1, JobStatus::Queued);
        std::thread::sleep(std::time::Duration::from_millis(1));
    }

    h.scheduler.wait_for_idle();
    assert_eq!(h.scheduler.store().get(j1).unwrap().status, JobStatus::Completed);
    assert_eq!(h.scheduler.store().get(j2).unwrap().status, JobStatus::Completed);
}

#[test]
fn test_late_subscriber_relies_on_store_read() {
    let h = harness(ECHO_LIST_BODY);
    let id = h.scheduler.enqueue(vec![h.input("a.mp3")], None).unwrap();
    h.scheduler.wait_for_idle();

    // Terminal event already published: the stream is closed from the start
    let late = h.scheduler.bus().subscribe(id);
    let events: Vec<_> = late.collect();
    assert!(events.is_empty());

    // The outcome is available from the store instead
    assert_eq!(h.scheduler.store().get(id).unwrap().status, JobStatus::Completed);
}
