//! Notification relay for task status changes

use futures::stream::{self, BoxStream, StreamExt};
use geoscope_core::models::{Scope, TaskStatusEvent};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

/// Default broadcast channel capacity
pub const DEFAULT_CAPACITY: usize = 256;

/// Fans task status events out to subscribers over a bounded broadcast channel.
///
/// Publishing never blocks. With no subscribers the event is dropped; the
/// ledger remains the source of truth.
#[derive(Debug, Clone)]
pub struct NotificationRelay {
    sender: broadcast::Sender<TaskStatusEvent>,
}

impl NotificationRelay {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn publish(&self, event: TaskStatusEvent) {
        let task_id = event.task_id;
        let status = event.status;
        if let Ok(n) = self.sender.send(event) {
            debug!(task_id = %task_id, status = %status, subscribers = n, "Task event published");
        }
    }

    /// Stream of events matching `scope`.
    ///
    /// The subscription starts immediately; dropping the stream unsubscribes.
    /// A subscriber that falls behind skips the overwritten events.
    pub fn subscribe(&self, scope: Scope) -> BoxStream<'static, TaskStatusEvent> {
        let receiver = self.sender.subscribe();

        stream::unfold((receiver, scope), |(mut receiver, scope)| async move {
            loop {
                match receiver.recv().await {
                    Ok(event) if event.matches(&scope) => return Some((event, (receiver, scope))),
                    Ok(_) => continue,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, ?scope, "Subscriber lagged, events dropped");
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        })
        .boxed()
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for NotificationRelay {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
