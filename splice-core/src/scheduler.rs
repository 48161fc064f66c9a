//! Scheduler: accepts merge requests and dispatches them to the executor
//! under a bounded pool of concurrency slots.
//!
//! Jobs dispatch in strict FIFO order; no job is ever promoted ahead of an
//! earlier one. With the default single slot exactly one job runs globally,
//! matching the original single-active-merge behavior, and the slot count
//! generalizes to N without changing the ordering guarantee. The scheduler
//! holds no per-job state beyond the queue and the slot counter; everything
//! else lives in the job store.

use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::events::ProgressBus;
use crate::executor::{FfmpegMerger, Merger};
use crate::job::JobId;
use crate::store::JobStore;
use crate::utils::derive_output_name;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Default)]
struct DispatchState {
    queue: VecDeque<JobId>,
    busy_slots: usize,
}

struct SchedulerInner {
    store: JobStore,
    bus: ProgressBus,
    merger: Arc<dyn Merger>,
    max_slots: usize,
    state: Mutex<DispatchState>,
}

/// Job intake and bounded-concurrency dispatch. Cheap to clone and share
/// across request-handling threads.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<SchedulerInner>,
}

impl Scheduler {
    /// Creates a scheduler running ffmpeg merges per `config`.
    pub fn new(config: &CoreConfig, store: JobStore, bus: ProgressBus) -> Self {
        Self::with_merger(
            store,
            bus,
            Arc::new(FfmpegMerger::new(config.clone())),
            config.max_concurrent_jobs,
        )
    }

    /// Creates a scheduler with a custom merger. Used by tests to substitute
    /// a stub for the external tool.
    pub fn with_merger(
        store: JobStore,
        bus: ProgressBus,
        merger: Arc<dyn Merger>,
        max_slots: usize,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                store,
                bus,
                merger,
                max_slots: max_slots.max(1),
                state: Mutex::new(DispatchState::default()),
            }),
        }
    }

    #[must_use]
    pub fn store(&self) -> &JobStore {
        &self.inner.store
    }

    #[must_use]
    pub fn bus(&self) -> &ProgressBus {
        &self.inner.bus
    }

    /// Accepts a merge request: validates it, creates the queued job record,
    /// appends it to the FIFO, and triggers dispatch.
    ///
    /// Empty input is rejected synchronously with `InvalidRequest`; no job
    /// is created.
    pub fn enqueue(
        &self,
        input_files: Vec<PathBuf>,
        base_name: Option<&str>,
    ) -> CoreResult<JobId> {
        if input_files.is_empty() {
            return Err(CoreError::InvalidRequest(
                "at least one input file is required".to_string(),
            ));
        }
        let output_name = derive_output_name(base_name);
        let job = self.inner.store.create(input_files, output_name)?;
        {
            let mut state = self.inner.state.lock().unwrap();
            state.queue.push_back(job.id);
        }
        log::info!(
            "Enqueued job {} ({} input file(s), output {})",
            job.id,
            job.input_files.len(),
            job.output_name
        );
        Self::dispatch(&self.inner);
        Ok(job.id)
    }

    /// Fills free slots from the front of the queue. The pop and the slot
    /// acquisition happen under one lock, so concurrent dispatch attempts
    /// can never pop the same job.
    fn dispatch(inner: &Arc<SchedulerInner>) {
        loop {
            let job_id = {
                let mut state = inner.state.lock().unwrap();
                if state.busy_slots >= inner.max_slots {
                    return;
                }
                let Some(id) = state.queue.pop_front() else {
                    return;
                };
                state.busy_slots += 1;
                id
            };

            let worker = Arc::clone(inner);
            thread::spawn(move || {
                worker.merger.execute(job_id, &worker.store, &worker.bus);
                {
                    let mut state = worker.state.lock().unwrap();
                    state.busy_slots -= 1;
                }
                // The freed slot picks up the next queued job, if any.
                Scheduler::dispatch(&worker);
            });
        }
    }

    /// Number of jobs waiting for a slot.
    #[must_use]
    pub fn queued_len(&self) -> usize {
        self.inner.state.lock().unwrap().queue.len()
    }

    /// Number of occupied concurrency slots.
    #[must_use]
    pub fn busy_slots(&self) -> usize {
        self.inner.state.lock().unwrap().busy_slots
    }

    /// Blocks until the queue is drained and every slot is free.
    pub fn wait_for_idle(&self) {
        loop {
            {
                let state = self.inner.state.lock().unwrap();
                if state.busy_slots == 0 && state.queue.is_empty() {
                    return;
                }
            }
            thread::sleep(Duration::from_millis(50));
        }
    }

    /// Retention sweep: drops terminal jobs older than `max_age` from the
    /// store and releases the bus bookkeeping for them.
    pub fn evict_finished(&self, max_age: chrono::Duration) -> usize {
        let evicted = self.inner.store.evict_finished(max_age);
        for id in &evicted {
            self.inner.bus.forget(*id);
        }
        evicted.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{JobEventKind, JobEvent};
    use crate::job::JobStatus;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Stub merger: marks the job running, sleeps, then completes or fails.
    /// Tracks execution order and peak concurrency.
    struct StubMerger {
        delay: Duration,
        fail_all: bool,
        running: AtomicUsize,
        peak_running: AtomicUsize,
        order: Mutex<Vec<JobId>>,
    }

    impl StubMerger {
        fn new(delay: Duration, fail_all: bool) -> Self {
            Self {
                delay,
                fail_all,
                running: AtomicUsize::new(0),
                peak_running: AtomicUsize::new(0),
                order: Mutex::new(Vec::new()),
            }
        }
    }

    impl Merger for StubMerger {
        fn execute(&self, job_id: JobId, store: &JobStore, bus: &ProgressBus) {
            store.update_status(job_id, JobStatus::Running).unwrap();
            bus.publish(JobEvent {
                job_id,
                kind: JobEventKind::Started,
            });
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_running.fetch_max(now, Ordering::SeqCst);
            self.order.lock().unwrap().push(job_id);

            thread::sleep(self.delay);

            self.running.fetch_sub(1, Ordering::SeqCst);
            if self.fail_all {
                store.fail(job_id, "stub failure".to_string()).unwrap();
                bus.publish(JobEvent {
                    job_id,
                    kind: JobEventKind::Failed {
                        error: "stub failure".to_string(),
                    },
                });
            } else {
                store.complete(job_id).unwrap();
                bus.publish(JobEvent {
                    job_id,
                    kind: JobEventKind::Completed {
                        output_name: "out.mp3".to_string(),
                    },
                });
            }
        }
    }

    fn scheduler_with_stub(stub: Arc<StubMerger>, slots: usize) -> Scheduler {
        Scheduler::with_merger(JobStore::new(), ProgressBus::new(), stub, slots)
    }

    fn inputs(name: &str) -> Vec<PathBuf> {
        vec![PathBuf::from(format!("{name}.mp3"))]
    }

    #[test]
    fn test_empty_enqueue_rejected_synchronously() {
        let stub = Arc::new(StubMerger::new(Duration::ZERO, false));
        let scheduler = scheduler_with_stub(stub, 1);
        let err = scheduler.enqueue(vec![], None).unwrap_err();
        assert!(matches!(err, CoreError::InvalidRequest(_)));
        assert!(scheduler.store().is_empty());
        assert_eq!(scheduler.queued_len(), 0);
    }

    #[test]
    fn test_fifo_order_with_single_slot() {
        let stub = Arc::new(StubMerger::new(Duration::from_millis(20), false));
        let scheduler = scheduler_with_stub(Arc::clone(&stub), 1);

        let ids: Vec<JobId> = (0..5)
            .map(|i| scheduler.enqueue(inputs(&format!("f{i}")), None).unwrap())
            .collect();
        scheduler.wait_for_idle();

        assert_eq!(*stub.order.lock().unwrap(), ids);
        assert_eq!(stub.peak_running.load(Ordering::SeqCst), 1);
        for id in ids {
            assert_eq!(scheduler.store().get(id).unwrap().status, JobStatus::Completed);
        }
    }

    #[test]
    fn test_single_running_under_concurrent_enqueue() {
        let stub = Arc::new(StubMerger::new(Duration::from_millis(10), false));
        let scheduler = scheduler_with_stub(Arc::clone(&stub), 1);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let scheduler = scheduler.clone();
                thread::spawn(move || scheduler.enqueue(inputs(&format!("t{i}")), None).unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        scheduler.wait_for_idle();

        assert_eq!(stub.peak_running.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.store().len(), 8);
    }

    #[test]
    fn test_second_job_queued_until_first_terminal() {
        let stub = Arc::new(StubMerger::new(Duration::from_millis(100), false));
        let scheduler = scheduler_with_stub(stub, 1);

        let j1 = scheduler.enqueue(inputs("a"), None).unwrap();
        let j2 = scheduler.enqueue(inputs("c"), None).unwrap();

        // J1 takes the slot; J2 must still be queued while J1 runs
        while scheduler.store().get(j1).unwrap().status == JobStatus::Queued {
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(scheduler.store().get(j1).unwrap().status, JobStatus::Running);
        assert_eq!(scheduler.store().get(j2).unwrap().status, JobStatus::Queued);

        scheduler.wait_for_idle();
        assert_eq!(scheduler.store().get(j1).unwrap().status, JobStatus::Completed);
        assert_eq!(scheduler.store().get(j2).unwrap().status, JobStatus::Completed);
    }

    #[test]
    fn test_failure_does_not_affect_later_jobs() {
        let failing = Arc::new(StubMerger::new(Duration::from_millis(5), true));
        let scheduler = scheduler_with_stub(failing, 1);

        let j1 = scheduler.enqueue(inputs("bad"), None).unwrap();
        let j2 = scheduler.enqueue(inputs("alsobad"), None).unwrap();
        scheduler.wait_for_idle();

        for id in [j1, j2] {
            let job = scheduler.store().get(id).unwrap();
            assert_eq!(job.status, JobStatus::Failed);
            assert_eq!(job.error_detail.as_deref(), Some("stub failure"));
        }
    }

    #[test]
    fn test_multiple_slots_run_in_parallel() {
        let stub = Arc::new(StubMerger::new(Duration::from_millis(100), false));
        let scheduler = scheduler_with_stub(Arc::clone(&stub), 2);

        for i in 0..4 {
            scheduler.enqueue(inputs(&format!("p{i}")), None).unwrap();
        }
        scheduler.wait_for_idle();

        assert_eq!(stub.peak_running.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_evict_finished_releases_store_and_bus() {
        let stub = Arc::new(StubMerger::new(Duration::ZERO, false));
        let scheduler = scheduler_with_stub(stub, 1);
        let id = scheduler.enqueue(inputs("a"), None).unwrap();
        scheduler.wait_for_idle();

        thread::sleep(Duration::from_millis(2));
        assert_eq!(scheduler.evict_finished(chrono::Duration::zero()), 1);
        assert!(scheduler.store().get(id).is_none());

        // Bus bookkeeping was released too: a fresh subscription stays open
        // (nothing will publish, so a short poll times out instead of
        // reading a closed stream)
        let sub = scheduler.bus().subscribe(id);
        assert!(sub.recv_timeout(Duration::from_millis(10)).is_none());
    }
}
