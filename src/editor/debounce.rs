//! Trailing-edge debouncing of async callbacks.

use std::{
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::task::JoinHandle;

type Callback<T> = Arc<dyn Fn(T) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Coalesces rapid calls into a single delayed invocation.
///
/// Each [`call`](Self::call) cancels the pending invocation, if any, and
/// schedules a new one after the delay. Only the last call inside a window
/// runs, with its arguments. There is no leading edge and no maximum wait.
///
/// Once the delay has elapsed the callback runs on its own task, so a later
/// call or [`cancel`](Self::cancel) never interrupts an invocation that has
/// already started. Dropping the debouncer cancels the pending invocation.
///
/// Must be used from within a tokio runtime.
pub struct Debouncer<T> {
    delay: Duration,
    callback: Callback<T>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Debounce `callback` by `delay`.
    pub fn new<F, Fut>(delay: Duration, callback: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let callback: Callback<T> = Arc::new(
            move |args: T| -> Pin<Box<dyn Future<Output = ()> + Send>> { Box::pin(callback(args)) },
        );
        Self {
            delay,
            callback,
            pending: Mutex::new(None),
        }
    }

    /// Schedule the callback with `args`, replacing any pending invocation.
    pub fn call(&self, args: T) {
        let callback = Arc::clone(&self.callback);
        let delay = self.delay;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tokio::spawn(callback(args));
        });

        let previous = self.lock().replace(timer);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Cancel the pending invocation.
    ///
    /// Returns `true` if an invocation was pending.
    pub fn cancel(&self) -> bool {
        let timer = self.lock().take();
        timer.is_some_and(|timer| {
            let pending = !timer.is_finished();
            timer.abort();
            pending
        })
    }

    /// Whether an invocation is scheduled and has not started yet.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.lock().as_ref().is_some_and(|timer| !timer.is_finished())
    }
}

impl<T> Debouncer<T> {
    /// The debounce delay.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    fn lock(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        let pending = self.pending.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(timer) = pending.take() {
            timer.abort();
        }
    }
}

impl<T> std::fmt::Debug for Debouncer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debouncer")
            .field("delay", &self.delay)
            .field("pending", &self.lock().is_some())
            .finish_non_exhaustive()
    }
}
