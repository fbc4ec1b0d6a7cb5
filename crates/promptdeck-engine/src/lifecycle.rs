//! Template lifecycle management
//!
//! Owns create/read/update/delete/clone/fork and the publish state
//! transitions, along with ownership enforcement. Template identity and
//! content are written only here; counters are written only by the
//! relationship ledger.

use crate::analytics::UsageRecorder;
use crate::entities::{
    CloneOverrides, NewTemplate, Principal, Template, TemplateId, TemplatePatch, TemplateStatus,
    UsageAction, UserId,
};
use crate::error::{EngineError, Result};
use crate::events::{TemplateEvent, TemplateEvents};
use crate::ledger::RelationshipLedger;
use crate::search::SearchIndex;
use crate::store::DocumentStore;
use serde_json::{Value, json};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::broadcast;
use tracing::warn;

pub struct LifecycleManager {
    store: Arc<dyn DocumentStore>,
    index: Arc<dyn SearchIndex>,
    ledger: RelationshipLedger,
    analytics: UsageRecorder,
    events: Arc<TemplateEvents>,
}

impl LifecycleManager {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        index: Arc<dyn SearchIndex>,
        ledger: RelationshipLedger,
        analytics: UsageRecorder,
        events: Arc<TemplateEvents>,
    ) -> Self {
        Self {
            store,
            index,
            ledger,
            analytics,
            events,
        }
    }

    /// Subscribe to change notifications. The subscription is released
    /// when the returned receiver is dropped.
    pub fn subscribe(&self) -> broadcast::Receiver<TemplateEvent> {
        self.events.subscribe()
    }

    /// Create a new draft owned by `principal`.
    pub async fn create(&self, principal: &Principal, draft: NewTemplate) -> Result<Template> {
        if draft.title.trim().is_empty() {
            return Err(EngineError::Validation("title is required".into()));
        }
        if draft.configuration.is_null() {
            return Err(EngineError::Validation(
                "configuration payload is required".into(),
            ));
        }

        let template = Template::new_draft(principal.id.clone(), draft);
        self.store.insert_template(&template).await?;

        self.analytics
            .record(
                Some(&template.id),
                Some(&principal.id),
                UsageAction::Create,
                json!({}),
            )
            .await;
        self.events.publish(TemplateEvent::Created(template.id.clone()));
        Ok(template)
    }

    /// Fetch a template by id.
    ///
    /// Soft-deleted rows are `TemplateNotFound` on the default path; with
    /// `include_deleted` they remain readable for audit, but only by their
    /// owner.
    pub async fn read(
        &self,
        viewer: Option<&Principal>,
        id: &TemplateId,
        include_deleted: bool,
    ) -> Result<Template> {
        let template = self
            .store
            .get_template(id)
            .await?
            .ok_or_else(|| EngineError::TemplateNotFound(id.to_string()))?;

        if template.is_deleted() {
            let owner_audit = include_deleted
                && viewer.map(|p| template.is_owned_by(&p.id)).unwrap_or(false);
            if !owner_audit {
                return Err(EngineError::TemplateNotFound(id.to_string()));
            }
        }
        Ok(template)
    }

    /// Default read path for the boundary: fetch, bump the usage counter,
    /// record a `view` event. Counter and analytics failures never fail
    /// the read.
    pub async fn view(&self, viewer: Option<&Principal>, id: &TemplateId) -> Result<Template> {
        let template = self.read(viewer, id, false).await?;

        self.ledger.record_use(id).await;
        self.analytics
            .record(
                Some(id),
                viewer.map(|p| &p.id),
                UsageAction::View,
                json!({}),
            )
            .await;
        Ok(template)
    }

    /// Apply a partial update. Absent patch fields are left unchanged;
    /// owner, id, timestamps and counters are not patchable. The version
    /// increments by exactly 1 per successful call.
    pub async fn update(
        &self,
        principal: &Principal,
        id: &TemplateId,
        patch: TemplatePatch,
    ) -> Result<Template> {
        let mut template = self.read(Some(principal), id, false).await?;
        if !template.is_owned_by(&principal.id) {
            return Err(EngineError::Forbidden(format!(
                "{} does not own template {}",
                principal.id, id
            )));
        }

        if let Some(title) = patch.title {
            if title.trim().is_empty() {
                return Err(EngineError::Validation("title cannot be empty".into()));
            }
            template.title = title;
        }
        if let Some(description) = patch.description {
            template.description = Some(description);
        }
        if let Some(tags) = patch.tags {
            template.tags = tags;
        }
        if let Some(is_public) = patch.is_public {
            template.is_public = is_public;
        }
        if let Some(configuration) = patch.configuration {
            template.configuration = configuration;
        }

        template.version += 1;
        template.updated_at = OffsetDateTime::now_utc();

        // A concurrent soft delete surfaces as NotFound here, not as a
        // corrupted write.
        self.store.replace_template(&template).await?;
        self.sync_index(&template).await;

        self.analytics
            .record(
                Some(id),
                Some(&principal.id),
                UsageAction::Update,
                json!({"version": template.version}),
            )
            .await;
        self.events.publish(TemplateEvent::Updated {
            id: template.id.clone(),
            version: template.version,
        });
        Ok(template)
    }

    /// Soft-delete a template. The row is never physically removed, and
    /// fork/favorite ledger rows are not cascaded.
    pub async fn delete(&self, principal: &Principal, id: &TemplateId) -> Result<()> {
        let mut template = self.read(Some(principal), id, false).await?;
        if !template.is_owned_by(&principal.id) {
            return Err(EngineError::Forbidden(format!(
                "{} does not own template {}",
                principal.id, id
            )));
        }

        let now = OffsetDateTime::now_utc();
        template.deleted_at = Some(now);
        template.updated_at = now;
        self.store.replace_template(&template).await?;

        if let Err(e) = self.index.remove_template(id).await {
            warn!(template = %id, error = %e, "failed to remove template from search index");
        }

        self.analytics
            .record(
                Some(id),
                Some(&principal.id),
                UsageAction::Delete,
                json!({}),
            )
            .await;
        self.events.publish(TemplateEvent::Deleted(id.clone()));
        Ok(())
    }

    /// Publish a draft. Publishing an already-published template is a
    /// no-op. Status transitions do not bump the content version.
    pub async fn publish(&self, principal: &Principal, id: &TemplateId) -> Result<Template> {
        self.transition(principal, id, TemplateStatus::Published).await
    }

    /// Return a published template to draft, removing it from search.
    pub async fn unpublish(&self, principal: &Principal, id: &TemplateId) -> Result<Template> {
        self.transition(principal, id, TemplateStatus::Draft).await
    }

    async fn transition(
        &self,
        principal: &Principal,
        id: &TemplateId,
        status: TemplateStatus,
    ) -> Result<Template> {
        let mut template = self.read(Some(principal), id, false).await?;
        if !template.is_owned_by(&principal.id) {
            return Err(EngineError::Forbidden(format!(
                "{} does not own template {}",
                principal.id, id
            )));
        }
        if template.status == status {
            return Ok(template);
        }

        template.status = status;
        template.updated_at = OffsetDateTime::now_utc();
        self.store.replace_template(&template).await?;
        self.sync_index(&template).await;

        let event = match status {
            TemplateStatus::Published => TemplateEvent::Published(id.clone()),
            TemplateStatus::Draft => TemplateEvent::Unpublished(id.clone()),
        };
        self.events.publish(event);
        Ok(template)
    }

    /// Copy a template without a lineage-counted relationship.
    ///
    /// The origin must exist and not be deleted, but need not be owned by
    /// the caller. With no principal, ownership goes to the explicit
    /// system owner. Overrides win field-by-field over the origin's
    /// content. Fork count and the fork ledger are untouched.
    pub async fn clone_template(
        &self,
        principal: Option<&Principal>,
        id: &TemplateId,
        overrides: CloneOverrides,
    ) -> Result<Template> {
        let origin = self.read(principal, id, false).await?;
        let owner = principal
            .map(|p| p.id.clone())
            .unwrap_or_else(UserId::system);

        let mut template = Template::derived_from(&origin, owner);
        if let Some(title) = overrides.title {
            if title.trim().is_empty() {
                return Err(EngineError::Validation("title cannot be empty".into()));
            }
            template.title = title;
        }
        if let Some(description) = overrides.description {
            template.description = Some(description);
        }
        if let Some(tags) = overrides.tags {
            template.tags = tags;
        }
        if let Some(configuration) = overrides.configuration {
            template.configuration =
                merge_configuration(&template.configuration, &configuration);
        }

        self.store.insert_template(&template).await?;

        self.analytics
            .record(
                Some(&template.id),
                principal.map(|p| &p.id),
                UsageAction::Create,
                json!({"cloned_from": origin.id}),
            )
            .await;
        self.events.publish(TemplateEvent::Created(template.id.clone()));
        Ok(template)
    }

    /// Create an owned derivative with lineage recorded and counted.
    ///
    /// Requires an authenticated principal. The fork record and counter
    /// bump go through the ledger; the derivative's existence does not
    /// depend on the counter bookkeeping succeeding.
    pub async fn fork(&self, principal: Option<&Principal>, id: &TemplateId) -> Result<Template> {
        let principal = principal.ok_or_else(|| {
            EngineError::Unauthorized("forking requires an authenticated user".into())
        })?;

        let origin = self.read(Some(principal), id, false).await?;
        let template = Template::derived_from(&origin, principal.id.clone());
        self.store.insert_template(&template).await?;

        self.ledger
            .record_fork(&origin.id, &template.id, &principal.id)
            .await?;

        self.analytics
            .record(
                Some(&origin.id),
                Some(&principal.id),
                UsageAction::Fork,
                json!({"forked_template_id": template.id.clone()}),
            )
            .await;
        self.events.publish(TemplateEvent::Created(template.id.clone()));
        Ok(template)
    }

    /// Non-deleted templates owned by the caller, newest first.
    pub async fn list_owned(&self, principal: &Principal) -> Result<Vec<Template>> {
        Ok(self
            .store
            .list_templates_by_owner(&principal.id, false)
            .await?)
    }

    /// Keep the search index in line with the row that just committed.
    /// Index divergence is reconciled by re-indexing, so failures are
    /// logged rather than surfaced.
    async fn sync_index(&self, template: &Template) {
        let result = if template.is_searchable() {
            self.index.index_template(template).await
        } else {
            self.index.remove_template(&template.id).await
        };
        if let Err(e) = result {
            warn!(template = %template.id, error = %e, "failed to sync search index");
        }
    }
}

/// Merge a clone override payload over the origin's configuration.
/// When both sides are objects the merge is field-by-field with the
/// override winning; any other shape is replaced wholesale.
fn merge_configuration(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            let mut merged = base_map.clone();
            for (key, value) in overlay_map {
                merged.insert(key.clone(), value.clone());
            }
            Value::Object(merged)
        }
        _ => overlay.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_configuration_overrides_win_per_field() {
        let base = json!({"model": "default", "temperature": 0.2});
        let overlay = json!({"temperature": 0.7, "max_tokens": 1024});

        let merged = merge_configuration(&base, &overlay);
        assert_eq!(
            merged,
            json!({"model": "default", "temperature": 0.7, "max_tokens": 1024})
        );
    }

    #[test]
    fn test_merge_configuration_non_object_replaces() {
        let base = json!({"model": "default"});
        let overlay = json!("raw prompt text");
        assert_eq!(merge_configuration(&base, &overlay), overlay);
    }
}
