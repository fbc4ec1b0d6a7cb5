//! Usage analytics recorder
//!
//! Append-only usage facts for auditing and metrics. Recording is
//! fire-and-forget from the caller's perspective: a failed analytics write
//! must never fail the user-facing operation that triggered it.

use crate::entities::{TemplateId, UsageAction, UsageEvent, UserId};
use crate::store::DocumentStore;
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub struct UsageRecorder {
    store: Arc<dyn DocumentStore>,
}

impl UsageRecorder {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Append a usage event. Errors are logged and swallowed.
    ///
    /// Callers invoke this only after the primary operation is known to
    /// have succeeded, never speculatively before.
    pub async fn record(
        &self,
        template_id: Option<&TemplateId>,
        user_id: Option<&UserId>,
        action: UsageAction,
        metadata: serde_json::Value,
    ) {
        let event = UsageEvent::new(template_id.cloned(), user_id.cloned(), action, metadata);
        if let Err(e) = self.store.append_usage_event(&event).await {
            warn!(?action, error = %e, "failed to record usage event");
        }
    }
}
