//! Fire-and-forget remote writes.
//!
//! Store actions apply their change locally first, then hand a [`SyncJob`]
//! to the queue. A single worker executes jobs in order. A failed job is
//! logged and dropped: local state has already moved on and is never rolled
//! back.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::remote::{Endpoint, Remote, RemoteError};

/// One remote write.
#[derive(Debug, Clone)]
pub struct SyncJob {
    /// Short name used in logs, e.g. `"profile upsert"`.
    pub label: &'static str,
    pub endpoint: Endpoint,
    pub payload: Value,
}

impl SyncJob {
    #[must_use]
    pub const fn new(label: &'static str, endpoint: Endpoint, payload: Value) -> Self {
        Self {
            label,
            endpoint,
            payload,
        }
    }
}

enum Command {
    Run(SyncJob),
    Drain(oneshot::Sender<()>),
}

/// Handle to the sync worker. Cloning shares the same worker.
#[derive(Debug, Clone)]
pub struct SyncQueue {
    tx: mpsc::UnboundedSender<Command>,
}

impl SyncQueue {
    /// Spawn the worker. Must be called from within a Tokio runtime.
    pub fn start(remote: Arc<dyn Remote>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_worker(remote, rx));
        Self { tx }
    }

    /// Queue a job. Never blocks and never fails from the caller's view.
    pub fn enqueue(&self, job: SyncJob) {
        let label = job.label;
        if self.tx.send(Command::Run(job)).is_err() {
            warn!(job = label, "sync worker stopped; dropping job");
        }
    }

    /// Wait until every job queued before this call has finished.
    pub async fn drain(&self) {
        let (tx, rx) = oneshot::channel();
        if self.tx.send(Command::Drain(tx)).is_ok() {
            let _ = rx.await;
        }
    }
}

async fn run_worker(remote: Arc<dyn Remote>, mut rx: mpsc::UnboundedReceiver<Command>) {
    while let Some(command) = rx.recv().await {
        match command {
            Command::Run(job) => match remote.mutate(&job.endpoint, &job.payload).await {
                Ok(_) => debug!(job = job.label, endpoint = %job.endpoint, "sync job done"),
                Err(RemoteError::DemoMode) => {
                    debug!(job = job.label, "demo mode, sync job skipped");
                }
                Err(e) => warn!(
                    job = job.label,
                    endpoint = %job.endpoint,
                    error = %e,
                    "sync job failed, dropping"
                ),
            },
            Command::Drain(done) => {
                let _ = done.send(());
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::remote::{Procedure, Table};
    use crate::testing::{FailingRemote, RecordingRemote};

    #[tokio::test]
    async fn test_jobs_run_in_order() {
        let remote = Arc::new(RecordingRemote::new());
        let queue = SyncQueue::start(remote.clone());

        for i in 0..5 {
            queue.enqueue(SyncJob::new(
                "test",
                Endpoint::Table(Table::DailyStats),
                json!({ "n": i }),
            ));
        }
        queue.drain().await;

        let payloads: Vec<_> = remote.mutations().into_iter().map(|c| c.payload["n"].clone()).collect();
        assert_eq!(payloads, vec![json!(0), json!(1), json!(2), json!(3), json!(4)]);
    }

    #[tokio::test]
    async fn test_failures_are_dropped() {
        let queue = SyncQueue::start(Arc::new(FailingRemote));
        queue.enqueue(SyncJob::new(
            "doomed",
            Endpoint::Procedure(Procedure::ChatSendMessage),
            json!({}),
        ));
        // Worker survives the failure and keeps draining.
        queue.drain().await;
        queue.drain().await;
    }
}
