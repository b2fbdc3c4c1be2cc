//! Cooperative task group.
//!
//! Links the lifetime of a set of background tasks: the first task that
//! fails, or an explicit [`TaskGroup::kill`], moves the group into the dying
//! state and latches the cause. Tasks watch [`TaskGroup::dying`] and return
//! promptly once it fires.

use std::future::Future;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::{debug, warn};

use crate::domain::errors::{ConnectorError, ConnectorResult};

#[derive(Debug, Default)]
struct Inner {
    dying: CancellationToken,
    cause: OnceLock<ConnectorError>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

/// Shared handle to a group of background tasks.
#[derive(Debug, Clone, Default)]
pub struct TaskGroup {
    inner: Arc<Inner>,
}

impl TaskGroup {
    /// Create an empty, alive group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` on the runtime as a member of the group.
    ///
    /// An `Err` result kills the group with that error; a panic kills it
    /// with [`ConnectorError::TaskPanicked`].
    pub fn spawn<F>(&self, name: &'static str, task: F)
    where
        F: Future<Output = ConnectorResult<()>> + Send + 'static,
    {
        let group = self.clone();
        let task = tokio::spawn(task);
        let handle = tokio::spawn(async move {
            let cause = match task.await {
                Ok(Ok(())) => {
                    debug!(task = name, "task finished");
                    return;
                }
                Ok(Err(err)) => err,
                Err(join_err) => ConnectorError::TaskPanicked(format!("{name}: {join_err}")),
            };
            if group.is_alive() {
                warn!(task = name, error = %cause, "task failed, stopping group");
            }
            group.kill(cause);
        });
        self.inner
            .handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handle);
    }

    /// Put the group into the dying state. Only the first cause is kept.
    pub fn kill(&self, cause: ConnectorError) {
        // Latch before cancelling so waiters always observe a cause.
        let _ = self.inner.cause.set(cause);
        self.inner.dying.cancel();
    }

    /// Resolves once the group is dying.
    pub fn dying(&self) -> WaitForCancellationFuture<'_> {
        self.inner.dying.cancelled()
    }

    /// Whether no task has failed and nobody has killed the group.
    pub fn is_alive(&self) -> bool {
        !self.inner.dying.is_cancelled()
    }

    /// The cause the group was killed with.
    pub fn err(&self) -> Option<ConnectorError> {
        self.inner.cause.get().cloned()
    }

    /// Wait for every spawned task to return.
    pub async fn wait(&self) {
        let handles = std::mem::take(
            &mut *self
                .inner
                .handles
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for handle in handles {
            if let Err(err) = handle.await {
                warn!(error = %err, "task panicked or was aborted");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_failing_task_kills_group() {
        let group = TaskGroup::new();
        let watcher = group.clone();
        group.spawn("watcher", async move {
            watcher.dying().await;
            Ok(())
        });
        group.spawn("failing", async {
            Err(ConnectorError::MalformedTicket("bad".to_string()))
        });

        tokio::time::timeout(Duration::from_secs(1), group.wait())
            .await
            .expect("tasks stop once the group dies");
        assert!(!group.is_alive());
        assert!(matches!(group.err(), Some(ConnectorError::MalformedTicket(_))));
    }

    #[tokio::test]
    async fn test_first_cause_wins() {
        let group = TaskGroup::new();
        assert!(group.is_alive());
        assert!(group.err().is_none());

        group.kill(ConnectorError::IteratorStopped);
        group.kill(ConnectorError::Cancelled);

        assert!(!group.is_alive());
        assert!(matches!(group.err(), Some(ConnectorError::IteratorStopped)));
    }

    async fn explode() -> ConnectorResult<()> {
        panic!("boom")
    }

    #[tokio::test]
    async fn test_panicking_task_kills_group() {
        let group = TaskGroup::new();
        group.spawn("panicking", explode());

        tokio::time::timeout(Duration::from_secs(1), group.dying())
            .await
            .expect("a panic kills the group");
        group.wait().await;
        match group.err() {
            Some(ConnectorError::TaskPanicked(msg)) => assert!(msg.contains("panicking"), "{msg}"),
            other => panic!("unexpected cause: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_successful_task_leaves_group_alive() {
        let group = TaskGroup::new();
        group.spawn("noop", async { Ok(()) });
        group.wait().await;
        assert!(group.is_alive());
    }
}
