use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::debug;

/// A single pending task that fires after a quiet period.
///
/// Each `schedule` call cancels whatever timer is still waiting and starts a
/// new one, so only the last call within the window runs. Cancellation only
/// reaches the timer: once a task has fired it runs to completion on its own
/// tokio task.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Run `task` once `window` has passed without another `schedule` call.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();

        let window = self.window;
        self.pending = Some(tokio::spawn(async move {
            sleep(window).await;
            tokio::spawn(task);
        }));
    }

    /// Drop the waiting timer, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            if !handle.is_finished() {
                debug!("Rescheduling debounced task");
            }
            handle.abort();
        }
    }

    /// Whether a timer is still waiting to fire.
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
