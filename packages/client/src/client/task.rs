//! Scoped ownership of spawned timer and session tasks.

use std::future::Future;

use tokio::task::JoinHandle;

/// Aborts its task when dropped.
///
/// Replacing or clearing the slot that holds a guard cancels the task on
/// every exit path.
#[derive(Debug)]
pub struct TaskGuard(Option<JoinHandle<()>>);

impl TaskGuard {
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self(Some(tokio::spawn(future)))
    }

    /// Release the task so it runs to completion on its own.
    pub fn detach(mut self) {
        self.0.take();
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        if let Some(handle) = self.0.take() {
            handle.abort();
        }
    }
}
