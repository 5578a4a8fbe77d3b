//! Scoped ownership of background producer tasks

use std::future::Future;
use tokio::task::JoinHandle;

/// Owns a spawned task and aborts it when dropped.
///
/// Holding the guard is what keeps a producer alive; releasing it (dropping,
/// or replacing the `Option` that holds it) cancels the task at its next
/// await point, so no orphaned timer or socket reader survives teardown.
#[derive(Debug)]
pub struct TaskGuard {
    handle: JoinHandle<()>,
}

impl TaskGuard {
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            handle: tokio::spawn(future),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
