//! Notification dispatcher adapters.
//!
//! Production deployments plug in the push-notification service; the
//! engine only needs fire-and-forget delivery.

use crate::domain::{CartError, UserId};
use crate::ports::{CartEvent, NotificationDispatcher};
use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::info;

/// Dispatcher that logs every event instead of delivering it.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

#[async_trait]
impl NotificationDispatcher for TracingNotifier {
    async fn notify(&self, user: UserId, event: CartEvent) -> Result<(), CartError> {
        info!("Notify user {}: {:?}", user, event);
        Ok(())
    }
}

/// Dispatcher that records events for test assertions.
///
/// Optionally fails every dispatch, to exercise the rule that a lost
/// notification never fails the triggering operation.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<(UserId, CartEvent)>>,
    fail: bool,
}

impl RecordingNotifier {
    /// Creates a recording dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a dispatcher whose every delivery fails.
    pub fn failing() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Everything dispatched so far.
    pub fn events(&self) -> Vec<(UserId, CartEvent)> {
        self.events.lock().clone()
    }

    /// Events delivered to one user.
    pub fn events_for(&self, user: UserId) -> Vec<CartEvent> {
        self.events
            .lock()
            .iter()
            .filter(|(u, _)| *u == user)
            .map(|(_, e)| e.clone())
            .collect()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingNotifier {
    async fn notify(&self, user: UserId, event: CartEvent) -> Result<(), CartError> {
        if self.fail {
            return Err(CartError::Store("dispatcher unavailable".to_string()));
        }
        self.events.lock().push((user, event));
        Ok(())
    }
}
