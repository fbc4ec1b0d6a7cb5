//! In-memory document store
//!
//! This module provides the reference store implementation used for
//! testing and development. Durable deployments wire their own
//! [`DocumentStore`] backend.

use super::{Counter, DocumentStore, StoreError, StoreResult};
use crate::entities::{FavoriteRecord, ForkRecord, Template, TemplateId, UsageEvent, UserId};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use time::OffsetDateTime;

#[derive(Debug, Default)]
struct Inner {
    templates: HashMap<TemplateId, Template>,
    forks: Vec<ForkRecord>,
    favorites: HashMap<(TemplateId, UserId), FavoriteRecord>,
    events: Vec<UsageEvent>,
    applied_keys: HashSet<String>,
}

/// In-memory storage implementation for testing
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Backend("Lock poisoned".into()))
    }

    /// Number of template rows, soft-deleted included (useful for testing)
    pub fn template_rows(&self) -> usize {
        self.inner.lock().unwrap().templates.len()
    }

    /// Number of fork-ledger rows (useful for testing)
    pub fn fork_rows(&self) -> usize {
        self.inner.lock().unwrap().forks.len()
    }

    /// Number of favorite rows (useful for testing)
    pub fn favorite_rows(&self) -> usize {
        self.inner.lock().unwrap().favorites.len()
    }

    /// Snapshot of all recorded usage events (useful for testing)
    pub fn recorded_events(&self) -> Vec<UsageEvent> {
        self.inner.lock().unwrap().events.clone()
    }
}

fn counter_mut(template: &mut Template, counter: Counter) -> &mut i64 {
    match counter {
        Counter::Forks => &mut template.fork_count,
        Counter::Favorites => &mut template.favorite_count,
        Counter::Usage => &mut template.usage_count,
    }
}

fn counter_value(template: &Template, counter: Counter) -> i64 {
    match counter {
        Counter::Forks => template.fork_count,
        Counter::Favorites => template.favorite_count,
        Counter::Usage => template.usage_count,
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_template(&self, template: &Template) -> StoreResult<()> {
        let mut inner = self.lock()?;
        if inner.templates.contains_key(&template.id) {
            return Err(StoreError::Conflict(format!(
                "template id already exists: {}",
                template.id
            )));
        }
        inner.templates.insert(template.id.clone(), template.clone());
        Ok(())
    }

    async fn get_template(&self, id: &TemplateId) -> StoreResult<Option<Template>> {
        let inner = self.lock()?;
        Ok(inner.templates.get(id).cloned())
    }

    async fn replace_template(&self, template: &Template) -> StoreResult<()> {
        let mut inner = self.lock()?;
        let live = inner
            .templates
            .get(&template.id)
            .is_some_and(|current| !current.is_deleted());
        if !live {
            return Err(StoreError::NotFound(template.id.to_string()));
        }
        inner.templates.insert(template.id.clone(), template.clone());
        Ok(())
    }

    async fn list_templates_by_owner(
        &self,
        owner: &UserId,
        include_deleted: bool,
    ) -> StoreResult<Vec<Template>> {
        let inner = self.lock()?;
        let mut templates: Vec<Template> = inner
            .templates
            .values()
            .filter(|t| t.is_owned_by(owner) && (include_deleted || !t.is_deleted()))
            .cloned()
            .collect();
        templates.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(templates)
    }

    async fn adjust_counter(
        &self,
        id: &TemplateId,
        counter: Counter,
        delta: i64,
        idempotency_key: Option<&str>,
    ) -> StoreResult<i64> {
        let mut inner = self.lock()?;
        if let Some(key) = idempotency_key {
            if inner.applied_keys.contains(key) {
                let template = inner
                    .templates
                    .get(id)
                    .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
                return Ok(counter_value(template, counter));
            }
        }

        let template = inner
            .templates
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let slot = counter_mut(template, counter);
        *slot = (*slot + delta).max(0);
        let value = *slot;

        if let Some(key) = idempotency_key {
            inner.applied_keys.insert(key.to_string());
        }
        Ok(value)
    }

    async fn read_counter(&self, id: &TemplateId, counter: Counter) -> StoreResult<i64> {
        let inner = self.lock()?;
        let template = inner
            .templates
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        Ok(counter_value(template, counter))
    }

    async fn insert_fork(&self, record: &ForkRecord) -> StoreResult<()> {
        let mut inner = self.lock()?;
        if inner.forks.iter().any(|f| f.id == record.id) {
            return Err(StoreError::Conflict(format!(
                "fork record already exists: {}",
                record.id
            )));
        }
        inner.forks.push(record.clone());
        Ok(())
    }

    async fn list_forks_of(&self, origin: &TemplateId) -> StoreResult<Vec<ForkRecord>> {
        let inner = self.lock()?;
        Ok(inner
            .forks
            .iter()
            .filter(|f| &f.origin_template_id == origin)
            .cloned()
            .collect())
    }

    async fn insert_favorite(
        &self,
        template_id: &TemplateId,
        user_id: &UserId,
    ) -> StoreResult<bool> {
        let mut inner = self.lock()?;
        let key = (template_id.clone(), user_id.clone());
        if inner.favorites.contains_key(&key) {
            return Ok(false);
        }
        inner.favorites.insert(
            key,
            FavoriteRecord {
                template_id: template_id.clone(),
                user_id: user_id.clone(),
                created_at: OffsetDateTime::now_utc(),
            },
        );
        Ok(true)
    }

    async fn delete_favorite(
        &self,
        template_id: &TemplateId,
        user_id: &UserId,
    ) -> StoreResult<bool> {
        let mut inner = self.lock()?;
        let key = (template_id.clone(), user_id.clone());
        Ok(inner.favorites.remove(&key).is_some())
    }

    async fn favorite_exists(
        &self,
        template_id: &TemplateId,
        user_id: &UserId,
    ) -> StoreResult<bool> {
        let inner = self.lock()?;
        let key = (template_id.clone(), user_id.clone());
        Ok(inner.favorites.contains_key(&key))
    }

    async fn append_usage_event(&self, event: &UsageEvent) -> StoreResult<()> {
        let mut inner = self.lock()?;
        inner.events.push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::NewTemplate;

    fn draft(owner: &str, title: &str) -> Template {
        Template::new_draft(
            owner.into(),
            NewTemplate {
                title: title.to_string(),
                configuration: serde_json::json!({"model": "default"}),
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_insert_and_get_template() {
        let store = MemoryStore::new();
        let template = draft("alice", "Support agent");

        store.insert_template(&template).await.unwrap();
        let fetched = store.get_template(&template.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Support agent");

        // Duplicate ids are rejected
        match store.insert_template(&template).await {
            Err(StoreError::Conflict(_)) => {}
            other => panic!("expected Conflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_replace_requires_live_row() {
        let store = MemoryStore::new();
        let mut template = draft("alice", "Support agent");
        store.insert_template(&template).await.unwrap();

        template.title = "Renamed".to_string();
        store.replace_template(&template).await.unwrap();

        // Soft delete, then attempt another replace: the race surfaces
        // as NotFound.
        template.deleted_at = Some(OffsetDateTime::now_utc());
        store.replace_template(&template).await.unwrap();

        template.title = "Too late".to_string();
        match store.replace_template(&template).await {
            Err(StoreError::NotFound(_)) => {}
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_adjust_counter_clamps_at_zero() {
        let store = MemoryStore::new();
        let template = draft("alice", "Support agent");
        store.insert_template(&template).await.unwrap();

        let value = store
            .adjust_counter(&template.id, Counter::Favorites, -1, None)
            .await
            .unwrap();
        assert_eq!(value, 0);

        let value = store
            .adjust_counter(&template.id, Counter::Favorites, 1, None)
            .await
            .unwrap();
        assert_eq!(value, 1);
    }

    #[tokio::test]
    async fn test_adjust_counter_idempotency_key() {
        let store = MemoryStore::new();
        let template = draft("alice", "Support agent");
        store.insert_template(&template).await.unwrap();

        let first = store
            .adjust_counter(&template.id, Counter::Forks, 1, Some("fork-1"))
            .await
            .unwrap();
        assert_eq!(first, 1);

        // Replayed key is a no-op returning the current value
        let replayed = store
            .adjust_counter(&template.id, Counter::Forks, 1, Some("fork-1"))
            .await
            .unwrap();
        assert_eq!(replayed, 1);

        let fresh = store
            .adjust_counter(&template.id, Counter::Forks, 1, Some("fork-2"))
            .await
            .unwrap();
        assert_eq!(fresh, 2);
    }

    #[tokio::test]
    async fn test_favorite_rows_are_binary() {
        let store = MemoryStore::new();
        let id: TemplateId = "tpl-1".into();
        let user: UserId = "bob".into();

        assert!(store.insert_favorite(&id, &user).await.unwrap());
        assert!(!store.insert_favorite(&id, &user).await.unwrap());
        assert!(store.favorite_exists(&id, &user).await.unwrap());

        assert!(store.delete_favorite(&id, &user).await.unwrap());
        assert!(!store.delete_favorite(&id, &user).await.unwrap());
        assert!(!store.favorite_exists(&id, &user).await.unwrap());
    }

    #[tokio::test]
    async fn test_fork_records_filtered_by_origin() {
        let store = MemoryStore::new();
        let origin: TemplateId = "origin".into();
        let other: TemplateId = "other".into();

        let a = ForkRecord::new(origin.clone(), "fork-a".into(), "bob".into());
        let b = ForkRecord::new(other.clone(), "fork-b".into(), "bob".into());
        store.insert_fork(&a).await.unwrap();
        store.insert_fork(&b).await.unwrap();

        let forks = store.list_forks_of(&origin).await.unwrap();
        assert_eq!(forks.len(), 1);
        assert_eq!(forks[0].forked_template_id, "fork-a".into());
    }
}
