//! Template-related API models

use promptdeck_engine::entities::{Template, TemplateStatus};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Template summary for listing endpoints
#[derive(Debug, Serialize)]
pub struct TemplateSummary {
    pub id: String,
    pub title: String,
    pub status: TemplateStatus,
    pub is_public: bool,
    pub version: u64,
    pub fork_count: i64,
    pub favorite_count: i64,
    pub usage_count: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Template> for TemplateSummary {
    fn from(t: Template) -> Self {
        Self {
            id: t.id.0,
            title: t.title,
            status: t.status,
            is_public: t.is_public,
            version: t.version,
            fork_count: t.fork_count,
            favorite_count: t.favorite_count,
            usage_count: t.usage_count,
            updated_at: t.updated_at,
        }
    }
}

/// Full template details
#[derive(Debug, Serialize)]
pub struct TemplateDetails {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub status: TemplateStatus,
    pub is_public: bool,
    pub version: u64,
    pub fork_count: i64,
    pub favorite_count: i64,
    pub usage_count: i64,
    pub parent_template_id: Option<String>,
    pub configuration: serde_json::Value,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub deleted_at: Option<OffsetDateTime>,
}

impl From<Template> for TemplateDetails {
    fn from(t: Template) -> Self {
        Self {
            id: t.id.0,
            owner_id: t.owner_id.0,
            title: t.title,
            description: t.description,
            tags: t.tags,
            status: t.status,
            is_public: t.is_public,
            version: t.version,
            fork_count: t.fork_count,
            favorite_count: t.favorite_count,
            usage_count: t.usage_count,
            parent_template_id: t.parent_template_id.map(|id| id.0),
            configuration: t.configuration,
            created_at: t.created_at,
            updated_at: t.updated_at,
            deleted_at: t.deleted_at,
        }
    }
}

/// Query parameters for `GET /templates/{id}`
#[derive(Debug, Deserialize)]
pub struct ReadQuery {
    /// Owner-only audit path that surfaces soft-deleted rows
    #[serde(default)]
    pub include_deleted: bool,
}

/// Query parameters for `GET /search`
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
    pub limit: Option<usize>,
}

/// Dispatchable actions for `POST /search`
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum SearchAction {
    PopularTags { limit: Option<usize> },
}

/// Favorite membership and count for a template
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteStatus {
    pub is_favorite: bool,
    pub favorite_count: i64,
}
