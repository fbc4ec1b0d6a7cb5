//! Template change notifications
//!
//! An explicit publish/subscribe channel in place of a process-wide
//! listener registry. Subscribers hold a [`broadcast::Receiver`]; dropping
//! the receiver deregisters it, so subscriptions are scoped to the
//! lifetime that acquired them.

use crate::entities::TemplateId;
use tokio::sync::broadcast;

/// Notification published after a lifecycle mutation commits
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateEvent {
    Created(TemplateId),
    Updated { id: TemplateId, version: u64 },
    Published(TemplateId),
    Unpublished(TemplateId),
    Deleted(TemplateId),
}

pub struct TemplateEvents {
    sender: broadcast::Sender<TemplateEvent>,
}

impl TemplateEvents {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a subscriber. Dropping the returned receiver releases the
    /// subscription.
    pub fn subscribe(&self) -> broadcast::Receiver<TemplateEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publish an event. Publishing with no subscribers is a no-op; slow
    /// subscribers lag rather than block the publisher.
    pub(crate) fn publish(&self, event: TemplateEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for TemplateEvents {
    fn default() -> Self {
        Self::new(64)
    }
}
