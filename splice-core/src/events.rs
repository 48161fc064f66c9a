//! Progress bus: per-job lifecycle and progress event distribution.
//!
//! The bus decouples merge execution from transport-layer delivery (SSE
//! relays, polling frontends, CLI renderers). Any number of subscribers may
//! watch one job; each receives every event published after its subscription,
//! in publication order. Delivery for a job ends with its terminal event:
//! the bus closes and releases every subscription for that job, so transport
//! loops terminate naturally instead of leaking listeners. Events are not
//! replayed; a late subscriber gets an already-closed stream and must read
//! the job store for the outcome.

use crate::job::JobId;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What happened to a job.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobEventKind {
    /// The job left the queue and its merge started.
    Started,
    /// A progress update parsed from the tool's status stream.
    /// `percent` is None when the total duration is unknown (indeterminate).
    Progress { percent: Option<u8> },
    /// The merge finished and the output file exists under `output_name`.
    Completed { output_name: String },
    /// The merge failed; `error` carries the diagnostic tail.
    Failed { error: String },
}

impl JobEventKind {
    /// Returns true for `Completed` and `Failed`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobEventKind::Completed { .. } | JobEventKind::Failed { .. })
    }
}

/// One event on the bus, tagged with the job it belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct JobEvent {
    pub job_id: JobId,
    #[serde(flatten)]
    pub kind: JobEventKind,
}

struct BusSubscriber {
    token: u64,
    tx: Sender<JobEvent>,
}

#[derive(Default)]
struct BusState {
    next_token: u64,
    subscribers: HashMap<JobId, Vec<BusSubscriber>>,
    /// Jobs whose terminal event has been published. Subscriptions taken out
    /// afterwards are closed immediately. Entries are released by `forget`
    /// during the retention sweep.
    finished: HashSet<JobId>,
}

/// In-process publish/subscribe channel for job events.
#[derive(Clone, Default)]
pub struct ProgressBus {
    state: Arc<Mutex<BusState>>,
}

impl ProgressBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscriber for one job's events.
    ///
    /// If the job already reached a terminal state the returned stream is
    /// closed from the start; the caller should read the job store instead.
    pub fn subscribe(&self, job_id: JobId) -> Subscription {
        let (tx, rx) = mpsc::channel();
        let mut state = self.state.lock().unwrap();
        let token = state.next_token;
        state.next_token += 1;
        if state.finished.contains(&job_id) {
            // Dropping tx here closes rx immediately: no replay for late subscribers.
            drop(tx);
        } else {
            state
                .subscribers
                .entry(job_id)
                .or_default()
                .push(BusSubscriber { token, tx });
        }
        Subscription {
            job_id,
            token,
            rx,
            state: Arc::clone(&self.state),
        }
    }

    /// Publishes an event to every live subscriber of its job.
    ///
    /// Disconnected subscribers are pruned on the spot. A terminal event
    /// additionally closes and releases all subscriptions for the job.
    pub fn publish(&self, event: JobEvent) {
        let mut state = self.state.lock().unwrap();
        if event.kind.is_terminal() {
            state.finished.insert(event.job_id);
            if let Some(subs) = state.subscribers.remove(&event.job_id) {
                for sub in subs {
                    // Senders are dropped right after, closing each stream.
                    let _ = sub.tx.send(event.clone());
                }
            }
        } else if let Some(subs) = state.subscribers.get_mut(&event.job_id) {
            subs.retain(|sub| sub.tx.send(event.clone()).is_ok());
            if subs.is_empty() {
                state.subscribers.remove(&event.job_id);
            }
        }
    }

    /// Number of live subscribers for a job.
    #[must_use]
    pub fn subscriber_count(&self, job_id: JobId) -> usize {
        let state = self.state.lock().unwrap();
        state.subscribers.get(&job_id).map_or(0, Vec::len)
    }

    /// Releases terminal bookkeeping for a job. Called by the retention
    /// sweep when the corresponding store entry is evicted.
    pub fn forget(&self, job_id: JobId) {
        let mut state = self.state.lock().unwrap();
        state.finished.remove(&job_id);
        state.subscribers.remove(&job_id);
    }
}

/// A live subscription to one job's events.
///
/// Iterating yields events in publication order and ends once the job's
/// terminal event has been delivered (the bus closes the channel). Dropping
/// the subscription unregisters it promptly, so a disconnected transport
/// does not accumulate dead listeners.
pub struct Subscription {
    job_id: JobId,
    token: u64,
    rx: Receiver<JobEvent>,
    state: Arc<Mutex<BusState>>,
}

impl Subscription {
    #[must_use]
    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Receives the next event, or None if the stream closed or `timeout`
    /// elapsed with nothing published.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<JobEvent> {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl Iterator for Subscription {
    type Item = JobEvent;

    fn next(&mut self) -> Option<JobEvent> {
        self.rx.recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap();
        if let Some(subs) = state.subscribers.get_mut(&self.job_id) {
            subs.retain(|sub| sub.token != self.token);
            if subs.is_empty() {
                state.subscribers.remove(&self.job_id);
            }
        }
    }
}
