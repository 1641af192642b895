//! Debounced deferred-work scheduler.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Schedules a single pending piece of deferred work. Scheduling again
/// before the delay elapses replaces (and cancels) the previous one, so
/// at most one task is ever pending.
#[derive(Default)]
pub struct SaveScheduler {
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl SaveScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `work` after `delay`, cancelling any previously scheduled work.
    pub fn schedule<F>(&self, delay: Duration, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            work.await;
        });

        let previous = self
            .pending
            .lock()
            .expect("scheduler lock poisoned")
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Cancel the pending work, if any.
    pub fn cancel_pending(&self) {
        let previous = self.pending.lock().expect("scheduler lock poisoned").take();
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Whether work is still scheduled and has not run or been cancelled.
    pub fn has_pending(&self) -> bool {
        self.pending
            .lock()
            .expect("scheduler lock poisoned")
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}
