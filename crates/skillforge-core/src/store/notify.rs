//! Synchronous change propagation to subscribers (dashboard counters and the like).

use std::panic::{self, AssertUnwindSafe};
use thiserror::Error;

/// Error a subscriber can return; it is recorded, never propagated to the mutator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct SubscriberError(pub String);

impl SubscriberError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Opaque handle returned by `subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

/// A failed or panicking callback from one `notify` pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyFailure {
    pub handle: SubscriptionHandle,
    pub message: String,
}

type Callback<T> = Box<dyn FnMut(&[T]) -> Result<(), SubscriberError>>;

/// Calls every subscriber, in registration order, with the new collection.
pub struct ChangeNotifier<T> {
    next_handle: u64,
    subscribers: Vec<(SubscriptionHandle, Callback<T>)>,
    failures: Vec<NotifyFailure>,
}

impl<T> ChangeNotifier<T> {
    pub fn new() -> Self {
        Self {
            next_handle: 0,
            subscribers: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionHandle
    where
        F: FnMut(&[T]) -> Result<(), SubscriberError> + 'static,
    {
        let handle = SubscriptionHandle(self.next_handle);
        self.next_handle += 1;
        self.subscribers.push((handle, Box::new(callback)));
        handle
    }

    /// Returns false if the handle was not subscribed.
    pub fn unsubscribe(&mut self, handle: SubscriptionHandle) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(h, _)| *h != handle);
        self.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Runs every callback. A callback that errors or panics is recorded and
    /// the remaining callbacks still run.
    pub fn notify(&mut self, items: &[T]) {
        for (handle, callback) in self.subscribers.iter_mut() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| callback(items)));
            let message = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e.0,
                Err(payload) => panic_message(&*payload),
            };
            tracing::warn!(
                target: "skillforge::notify",
                subscriber = handle.0,
                error = %message,
                "subscriber failed"
            );
            self.failures.push(NotifyFailure {
                handle: *handle,
                message,
            });
        }
    }

    /// Drains the failures recorded since the last call.
    pub fn take_failures(&mut self) -> Vec<NotifyFailure> {
        std::mem::take(&mut self.failures)
    }
}

impl<T> Default for ChangeNotifier<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("subscriber panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("subscriber panicked: {}", s)
    } else {
        "subscriber panicked".to_string()
    }
}
