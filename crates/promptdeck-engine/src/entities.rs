//! Core data structures for the promptdeck engine

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Unique identifier for a user
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Reserved owner id for documents produced without an authenticated
/// principal (anonymous clones).
const SYSTEM_USER_ID: &str = "system";

impl UserId {
    /// The explicit system owner used when no principal is present.
    pub fn system() -> Self {
        UserId(SYSTEM_USER_ID.to_string())
    }

    /// Whether this id is the reserved system owner.
    pub fn is_system(&self) -> bool {
        self.0 == SYSTEM_USER_ID
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        UserId(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        UserId(s.to_string())
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for a template document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateId(pub String);

impl TemplateId {
    /// Generate a fresh, never-reused id.
    pub fn generate() -> Self {
        TemplateId(Uuid::new_v4().to_string())
    }
}

impl From<String> for TemplateId {
    fn from(s: String) -> Self {
        TemplateId(s)
    }
}

impl From<&str> for TemplateId {
    fn from(s: &str) -> Self {
        TemplateId(s.to_string())
    }
}

impl AsRef<str> for TemplateId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TemplateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An authenticated caller, as supplied by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    /// Stable user identifier
    pub id: UserId,

    /// User's email address
    pub email: String,

    /// Optional display name
    pub display_name: Option<String>,
}

impl Principal {
    pub fn new(id: impl Into<UserId>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// Publication state of a template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateStatus {
    /// Editable, not visible in search
    Draft,

    /// Published to the marketplace
    Published,
}

/// A prompt/agent template document with registry metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    /// Opaque, immutable identifier
    pub id: TemplateId,

    /// Owning user; the only principal allowed to mutate content
    pub owner_id: UserId,

    /// Human-readable title
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Tags for search and aggregation
    pub tags: Vec<String>,

    /// Draft/published state
    pub status: TemplateStatus,

    /// Whether the template is exposed in public search
    pub is_public: bool,

    /// Monotonic content version, +1 per successful update
    pub version: u64,

    /// Number of forks recorded against this template
    pub fork_count: i64,

    /// Number of users that currently favorite this template
    pub favorite_count: i64,

    /// Number of recorded views
    pub usage_count: i64,

    /// Set at fork/clone time, immutable thereafter
    pub parent_template_id: Option<TemplateId>,

    /// Opaque agent configuration payload, passed through verbatim
    pub configuration: serde_json::Value,

    /// When this template was created
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// Last content or status change
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,

    /// Soft-delete marker; the row is never physically removed
    #[serde(with = "time::serde::rfc3339::option")]
    pub deleted_at: Option<OffsetDateTime>,
}

impl Template {
    /// Create a fresh draft owned by `owner`.
    pub fn new_draft(owner: UserId, draft: NewTemplate) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: TemplateId::generate(),
            owner_id: owner,
            title: draft.title,
            description: draft.description,
            tags: draft.tags,
            status: TemplateStatus::Draft,
            is_public: draft.is_public,
            version: 1,
            fork_count: 0,
            favorite_count: 0,
            usage_count: 0,
            parent_template_id: None,
            configuration: draft.configuration,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Create a private draft derived from `origin`, with lineage set.
    ///
    /// Used by both fork and clone; only fork additionally writes a fork
    /// record and bumps the origin's fork count.
    pub fn derived_from(origin: &Template, owner: UserId) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: TemplateId::generate(),
            owner_id: owner,
            title: origin.title.clone(),
            description: origin.description.clone(),
            tags: origin.tags.clone(),
            status: TemplateStatus::Draft,
            is_public: false,
            version: 1,
            fork_count: 0,
            favorite_count: 0,
            usage_count: 0,
            parent_template_id: Some(origin.id.clone()),
            configuration: origin.configuration.clone(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Whether the template has been soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Whether `user` owns this template.
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        &self.owner_id == user
    }

    /// Whether this template belongs in the search index.
    pub fn is_searchable(&self) -> bool {
        self.status == TemplateStatus::Published && self.is_public && !self.is_deleted()
    }
}

/// Fields required to create a new template draft
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTemplate {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub configuration: serde_json::Value,
}

/// Partial update applied to a template.
///
/// Only the fields present here are patchable; owner, id, timestamps and
/// counters cannot be expressed and are therefore stripped by construction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplatePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_public: Option<bool>,
    pub configuration: Option<serde_json::Value>,
}

impl TemplatePatch {
    /// True when no field is set; applying it still bumps the version.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.tags.is_none()
            && self.is_public.is_none()
            && self.configuration.is_none()
    }
}

/// Per-field overrides applied on top of the origin's content when cloning.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CloneOverrides {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub configuration: Option<serde_json::Value>,
}

/// A lineage edge from an origin template to a derivative.
///
/// Append-only: fork records are never updated or deleted, even when the
/// templates they reference are later soft-deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForkRecord {
    /// Unique record id, also the idempotency key for the counter bump
    pub id: String,

    /// Template the fork was taken from
    pub origin_template_id: TemplateId,

    /// The newly created derivative
    pub forked_template_id: TemplateId,

    /// User who performed the fork
    pub forked_by: UserId,

    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl ForkRecord {
    pub fn new(origin: TemplateId, forked: TemplateId, user: UserId) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            origin_template_id: origin,
            forked_template_id: forked,
            forked_by: user,
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Membership of a user in a template's favorite set.
///
/// Keyed by (template, user); existence is binary and removal deletes the
/// row rather than marking it inactive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoriteRecord {
    pub template_id: TemplateId,
    pub user_id: UserId,

    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Kind of action captured by a usage event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageAction {
    View,
    Search,
    Fork,
    Update,
    Delete,
    Create,
}

/// An immutable, append-only analytics fact.
///
/// Never a source of truth for counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageEvent {
    /// Unique event id
    pub id: String,

    /// Template the event concerns; absent for pure-search events
    pub template_id: Option<TemplateId>,

    /// Acting user; absent for anonymous actions
    pub user_id: Option<UserId>,

    /// What happened
    pub action: UsageAction,

    /// Free-form context payload
    pub metadata: serde_json::Value,

    #[serde(with = "time::serde::rfc3339")]
    pub recorded_at: OffsetDateTime,
}

impl UsageEvent {
    pub fn new(
        template_id: Option<TemplateId>,
        user_id: Option<UserId>,
        action: UsageAction,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            template_id,
            user_id,
            action,
            metadata,
            recorded_at: OffsetDateTime::now_utc(),
        }
    }
}

/// A tag with its aggregated frequency, as reported by the search index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub count: u64,
}
