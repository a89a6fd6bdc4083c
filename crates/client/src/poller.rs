//! Cancellable periodic task.

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::{CancellationToken, DropGuard};

/// Runs `tick` every `period` until stopped.
///
/// The first tick fires one period after start. Dropping the poller cancels
/// the task; an in-flight tick is abandoned at its next await point.
#[derive(Debug)]
pub struct Poller {
    token: CancellationToken,
    _guard: DropGuard,
}

impl Poller {
    /// Start polling. Must be called from within a Tokio runtime.
    pub fn spawn<F, Fut>(period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let cancel = token.clone();

        tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = interval.tick() => {
                        tokio::select! {
                            () = cancel.cancelled() => break,
                            () = tick() => {}
                        }
                    }
                }
            }
            tracing::debug!("poller stopped");
        });

        Self {
            _guard: token.clone().drop_guard(),
            token,
        }
    }

    /// Whether the task has been told to stop.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Stop polling.
    pub fn stop(self) {
        self.token.cancel();
    }
}
