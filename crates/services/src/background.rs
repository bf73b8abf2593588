//! # Background Tasks
//!
//! Registry for work that outlives the response that triggered it. Tasks are
//! tracked so shutdown can cancel pending ones and wait for running ones.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

#[derive(Clone, Default)]
pub struct BackgroundTasks {
    tracker: TaskTracker,
    cancel: CancellationToken,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `task` after `delay` unless shutdown starts first. Never blocks
    /// the caller.
    pub fn spawn_delayed<F>(&self, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let cancel = self.cancel.clone();
        self.tracker.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("background task abandoned before start");
                }
                _ = tokio::time::sleep(delay) => {
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            tracing::debug!("background task cancelled while running");
                        }
                        _ = task => {}
                    }
                }
            }
        });
    }

    /// Number of tasks still pending or running.
    pub fn len(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracker.is_empty()
    }

    /// Waits for every task to finish without cancelling anything.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Gives running tasks up to `grace` to finish, then cancels the rest and
    /// waits for them to unwind.
    pub async fn shutdown(&self, grace: Duration) {
        self.tracker.close();
        if tokio::time::timeout(grace, self.tracker.wait()).await.is_err() {
            tracing::info!(pending = self.tracker.len(), "cancelling background tasks");
            self.cancel.cancel();
            self.tracker.wait().await;
        }
    }
}
