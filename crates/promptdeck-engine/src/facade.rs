//! Search query façade
//!
//! Validates and forwards search/tag queries to the search index.
//! Ranking is the index's concern; this component trims and validates
//! input, bounds the limit, filters out anything that is not a published
//! public live template, and records analytics for identified callers.

use crate::analytics::UsageRecorder;
use crate::entities::{Principal, TagCount, Template, UsageAction};
use crate::error::{EngineError, Result};
use crate::search::SearchIndex;
use crate::store::DocumentStore;
use serde_json::json;
use std::sync::Arc;

/// Shortest accepted query, in trimmed characters
pub const MIN_QUERY_CHARS: usize = 2;

const DEFAULT_LIMIT: usize = 20;
const MAX_LIMIT: usize = 50;

pub struct SearchFacade {
    store: Arc<dyn DocumentStore>,
    index: Arc<dyn SearchIndex>,
    analytics: UsageRecorder,
    default_limit: usize,
    max_limit: usize,
}

impl SearchFacade {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        index: Arc<dyn SearchIndex>,
        analytics: UsageRecorder,
    ) -> Self {
        Self {
            store,
            index,
            analytics,
            default_limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
        }
    }

    /// Override the default/maximum result limits.
    pub fn with_limits(mut self, default_limit: usize, max_limit: usize) -> Self {
        self.default_limit = default_limit.max(1);
        self.max_limit = max_limit.max(1);
        self
    }

    /// Full-text search over published, public, non-deleted templates.
    ///
    /// Fails with `InvalidQuery` when the trimmed query is shorter than
    /// [`MIN_QUERY_CHARS`]. Records a `search` usage event when the caller
    /// is identified.
    pub async fn search(
        &self,
        caller: Option<&Principal>,
        query: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Template>> {
        let trimmed = query.trim();
        if trimmed.chars().count() < MIN_QUERY_CHARS {
            return Err(EngineError::InvalidQuery(format!(
                "query must be at least {} characters",
                MIN_QUERY_CHARS
            )));
        }
        let limit = self.clamp_limit(limit);

        let ids = self
            .index
            .query(trimmed, limit)
            .await
            .map_err(|e| EngineError::SearchIndex(e.to_string()))?;

        // The index can lag the store; re-filter against the rows.
        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(template) = self.store.get_template(&id).await? {
                if template.is_searchable() {
                    results.push(template);
                }
            }
        }

        if let Some(principal) = caller {
            self.analytics
                .record(
                    None,
                    Some(&principal.id),
                    UsageAction::Search,
                    json!({"query": trimmed, "results": results.len()}),
                )
                .await;
        }
        Ok(results)
    }

    /// Tag frequency ranking, delegated entirely to the index.
    pub async fn popular_tags(&self, limit: Option<usize>) -> Result<Vec<TagCount>> {
        let limit = self.clamp_limit(limit);
        self.index
            .popular_tags(limit)
            .await
            .map_err(|e| EngineError::SearchIndex(e.to_string()))
    }

    fn clamp_limit(&self, limit: Option<usize>) -> usize {
        limit
            .unwrap_or(self.default_limit)
            .clamp(1, self.max_limit)
    }
}
