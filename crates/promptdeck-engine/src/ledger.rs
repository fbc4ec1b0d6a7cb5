//! Relationship ledger
//!
//! Owns fork-lineage and favorite-membership records, and is the only
//! writer of the derived counters on template rows. Counters are mutated
//! exclusively through the store's atomic adjust primitive — never
//! read-modify-write at this layer.

use crate::entities::{ForkRecord, TemplateId, UserId};
use crate::error::{EngineError, Result};
use crate::store::{Counter, DocumentStore, StoreError};
use std::sync::Arc;
use tracing::{error, warn};
use uuid::Uuid;

/// Attempts per counter mutation before giving up
const COUNTER_ATTEMPTS: usize = 3;

#[derive(Clone)]
pub struct RelationshipLedger {
    store: Arc<dyn DocumentStore>,
}

impl RelationshipLedger {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Add a user to a template's favorite set.
    ///
    /// Idempotent: adding an existing (template, user) pair is a no-op and
    /// the count moves only on first insertion.
    pub async fn add_favorite(&self, template_id: &TemplateId, user_id: &UserId) -> Result<()> {
        let inserted = self.store.insert_favorite(template_id, user_id).await?;
        if inserted {
            let key = Uuid::new_v4().to_string();
            self.adjust_with_retries(template_id, Counter::Favorites, 1, &key)
                .await?;
        }
        Ok(())
    }

    /// Remove a user from a template's favorite set.
    ///
    /// Idempotent: removing a non-existent favorite is a no-op; the count
    /// decrements only when a row was actually deleted and never goes
    /// below zero.
    pub async fn remove_favorite(&self, template_id: &TemplateId, user_id: &UserId) -> Result<()> {
        let removed = self.store.delete_favorite(template_id, user_id).await?;
        if removed {
            let key = Uuid::new_v4().to_string();
            self.adjust_with_retries(template_id, Counter::Favorites, -1, &key)
                .await?;
        }
        Ok(())
    }

    pub async fn is_favorite(&self, template_id: &TemplateId, user_id: &UserId) -> Result<bool> {
        Ok(self.store.favorite_exists(template_id, user_id).await?)
    }

    /// Favorite count, read directly from the counter column.
    pub async fn favorite_count(&self, template_id: &TemplateId) -> Result<i64> {
        Ok(self
            .store
            .read_counter(template_id, Counter::Favorites)
            .await?)
    }

    /// Fork count, read directly from the counter column.
    pub async fn fork_count(&self, template_id: &TemplateId) -> Result<i64> {
        Ok(self.store.read_counter(template_id, Counter::Forks).await?)
    }

    /// Usage count, read directly from the counter column.
    pub async fn usage_count(&self, template_id: &TemplateId) -> Result<i64> {
        Ok(self.store.read_counter(template_id, Counter::Usage).await?)
    }

    /// Append a fork-lineage record and bump the origin's fork count.
    ///
    /// The record is the source of truth; the counter is a cached
    /// derivation. The increment is keyed by the record id so retries are
    /// safe, and an increment that still fails after retries is logged and
    /// left to offline reconciliation rather than rolling the record back.
    pub async fn record_fork(
        &self,
        origin: &TemplateId,
        forked: &TemplateId,
        user: &UserId,
    ) -> Result<ForkRecord> {
        let record = ForkRecord::new(origin.clone(), forked.clone(), user.clone());
        self.store.insert_fork(&record).await?;

        if let Err(e) = self
            .adjust_with_retries(origin, Counter::Forks, 1, &record.id)
            .await
        {
            error!(
                origin = %origin,
                fork_record = %record.id,
                error = %e,
                "fork count increment failed; counter left for reconciliation"
            );
        }
        Ok(record)
    }

    /// Fork records whose origin is `origin`.
    ///
    /// Records outlive the templates they reference; soft deletion of
    /// either endpoint leaves them retrievable unchanged.
    pub async fn forks_of(&self, origin: &TemplateId) -> Result<Vec<ForkRecord>> {
        Ok(self.store.list_forks_of(origin).await?)
    }

    /// Bump the usage counter for a viewed template.
    ///
    /// Never fails the triggering read: exhausted retries are logged.
    pub async fn record_use(&self, template_id: &TemplateId) {
        let key = Uuid::new_v4().to_string();
        if let Err(e) = self
            .adjust_with_retries(template_id, Counter::Usage, 1, &key)
            .await
        {
            warn!(template = %template_id, error = %e, "usage count increment failed");
        }
    }

    /// Retry a counter mutation with a stable idempotency key.
    ///
    /// The key makes replays safe: an attempt that reported failure after
    /// the store applied it is deduplicated on the next try.
    async fn adjust_with_retries(
        &self,
        id: &TemplateId,
        counter: Counter,
        delta: i64,
        key: &str,
    ) -> Result<i64> {
        let mut last_error = None;
        for _ in 0..COUNTER_ATTEMPTS {
            match self.store.adjust_counter(id, counter, delta, Some(key)).await {
                Ok(value) => return Ok(value),
                Err(StoreError::NotFound(id)) => return Err(EngineError::TemplateNotFound(id)),
                Err(e) => last_error = Some(e),
            }
        }
        Err(EngineError::Transient(format!(
            "counter mutation gave up after {} attempts: {}",
            COUNTER_ATTEMPTS,
            last_error.map(|e| e.to_string()).unwrap_or_default()
        )))
    }
}
