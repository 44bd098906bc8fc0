//! Cancellable task pool.
//!
//! Every unit of concurrent work a client starts (socket pumps, per-line
//! handling, event handlers) is spawned through one [`TaskPool`]. Killing
//! the pool cancels everything still running and everything spawned later.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::trace;

/// A group of tokio tasks sharing one cancellation token.
#[derive(Clone, Debug, Default)]
pub struct TaskPool {
    tracker: TaskTracker,
    token: CancellationToken,
}

impl TaskPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `fut` on the current runtime.
    ///
    /// The task is dropped at its next suspension point once the pool is
    /// killed. After a kill, spawned futures never run.
    pub fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = self.token.clone();
        self.tracker.spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => trace!("task cancelled"),
                _ = fut => {}
            }
        });
    }

    /// A token that is cancelled when the pool is killed.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Cancel all outstanding and future work.
    pub fn kill(&self) {
        self.token.cancel();
        self.tracker.close();
    }

    pub fn is_killed(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Number of tasks that have not finished yet.
    pub fn len(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracker.is_empty()
    }

    /// Kill the pool and wait up to `timeout` for its tasks to unwind.
    ///
    /// Returns false if tasks were still alive when the timeout elapsed.
    pub async fn kill_and_wait(&self, timeout: Duration) -> bool {
        self.kill();
        tokio::time::timeout(timeout, self.tracker.wait()).await.is_ok()
    }
}
