//! Task handles that cancel their task when dropped.

use std::future::Future;

use tokio::task::JoinHandle;

/// A spawned task that is aborted when the handle goes out of scope.
///
/// Consumers hold one per in-flight load; dropping it (e.g. on navigating
/// away) cancels the work and its result is never observed.
#[derive(Debug)]
#[must_use = "dropping a ScopedTask aborts the task"]
pub struct ScopedTask<T> {
    handle: JoinHandle<T>,
}

impl<T: Send + 'static> ScopedTask<T> {
    /// Spawn `future` on the current runtime.
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Self {
            handle: tokio::spawn(future),
        }
    }
}

impl<T> ScopedTask<T> {
    /// Wait for the task. `None` if it was aborted or panicked.
    pub async fn join(mut self) -> Option<T> {
        (&mut self.handle).await.ok()
    }

    /// Cancel the task now.
    pub fn abort(&self) {
        self.handle.abort();
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl<T> Drop for ScopedTask<T> {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_join_returns_output() {
        let task = ScopedTask::spawn(async { 7 });
        assert_eq!(task.join().await, Some(7));
    }

    #[tokio::test]
    async fn test_drop_aborts() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&finished);
        let task = ScopedTask::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            flag.store(true, Ordering::SeqCst);
        });
        drop(task);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_aborted_join_is_none() {
        let task = ScopedTask::spawn(std::future::pending::<()>());
        task.abort();
        assert_eq!(task.join().await, None);
    }
}
