//! Search index abstraction
//!
//! Full-text search and tag aggregation are collaborator concerns: the
//! engine feeds the index write events and consumes query results, but
//! ranking internals stay behind this trait.

use crate::entities::{TagCount, Template, TemplateId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("Search backend error: {0}")]
    Backend(String),
}

/// Result type for index operations
pub type IndexResult<T> = std::result::Result<T, IndexError>;

/// Abstraction over the search index backend
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Add or refresh a template document in the index.
    async fn index_template(&self, template: &Template) -> IndexResult<()>;

    /// Remove a template document from the index.
    async fn remove_template(&self, id: &TemplateId) -> IndexResult<()>;

    /// Full-text query; returns matching ids, best match first.
    async fn query(&self, text: &str, limit: usize) -> IndexResult<Vec<TemplateId>>;

    /// Tag frequency aggregation over indexed documents, most used first.
    async fn popular_tags(&self, limit: usize) -> IndexResult<Vec<TagCount>>;
}

#[derive(Debug, Clone)]
struct IndexedDoc {
    title: String,
    description: String,
    tags: Vec<String>,
}

/// In-memory search index for testing and development.
///
/// Matching is naive lowercase substring search; title matches rank above
/// description and tag matches.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    docs: Mutex<HashMap<TemplateId, IndexedDoc>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indexed documents (useful for testing)
    pub fn len(&self) -> usize {
        self.docs.lock().unwrap().len()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.docs.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl SearchIndex for MemoryIndex {
    async fn index_template(&self, template: &Template) -> IndexResult<()> {
        let mut docs = self
            .docs
            .lock()
            .map_err(|_| IndexError::Backend("Lock poisoned".into()))?;

        docs.insert(
            template.id.clone(),
            IndexedDoc {
                title: template.title.to_lowercase(),
                description: template
                    .description
                    .clone()
                    .unwrap_or_default()
                    .to_lowercase(),
                tags: template.tags.iter().map(|t| t.to_lowercase()).collect(),
            },
        );
        Ok(())
    }

    async fn remove_template(&self, id: &TemplateId) -> IndexResult<()> {
        let mut docs = self
            .docs
            .lock()
            .map_err(|_| IndexError::Backend("Lock poisoned".into()))?;

        docs.remove(id);
        Ok(())
    }

    async fn query(&self, text: &str, limit: usize) -> IndexResult<Vec<TemplateId>> {
        let docs = self
            .docs
            .lock()
            .map_err(|_| IndexError::Backend("Lock poisoned".into()))?;

        let needle = text.to_lowercase();
        let mut hits: Vec<(u8, TemplateId)> = docs
            .iter()
            .filter_map(|(id, doc)| {
                if doc.title.contains(&needle) {
                    Some((0, id.clone()))
                } else if doc.description.contains(&needle) {
                    Some((1, id.clone()))
                } else if doc.tags.iter().any(|t| t.contains(&needle)) {
                    Some((2, id.clone()))
                } else {
                    None
                }
            })
            .collect();

        hits.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.as_ref().cmp(b.1.as_ref())));
        Ok(hits.into_iter().take(limit).map(|(_, id)| id).collect())
    }

    async fn popular_tags(&self, limit: usize) -> IndexResult<Vec<TagCount>> {
        let docs = self
            .docs
            .lock()
            .map_err(|_| IndexError::Backend("Lock poisoned".into()))?;

        let mut counts: HashMap<&str, u64> = HashMap::new();
        for doc in docs.values() {
            for tag in &doc.tags {
                *counts.entry(tag.as_str()).or_insert(0) += 1;
            }
        }

        let mut tags: Vec<TagCount> = counts
            .into_iter()
            .map(|(tag, count)| TagCount {
                tag: tag.to_string(),
                count,
            })
            .collect();

        tags.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
        tags.truncate(limit);
        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::NewTemplate;

    fn published(title: &str, tags: &[&str]) -> Template {
        let mut template = Template::new_draft(
            "alice".into(),
            NewTemplate {
                title: title.to_string(),
                tags: tags.iter().map(|t| t.to_string()).collect(),
                configuration: serde_json::json!({}),
                ..Default::default()
            },
        );
        template.status = crate::entities::TemplateStatus::Published;
        template.is_public = true;
        template
    }

    #[tokio::test]
    async fn test_query_ranks_title_above_tags() {
        let index = MemoryIndex::new();
        let by_title = published("Code review agent", &["rust"]);
        let by_tag = published("Summarizer", &["code"]);
        index.index_template(&by_title).await.unwrap();
        index.index_template(&by_tag).await.unwrap();

        let hits = index.query("code", 10).await.unwrap();
        assert_eq!(hits, vec![by_title.id.clone(), by_tag.id.clone()]);
    }

    #[tokio::test]
    async fn test_remove_template() {
        let index = MemoryIndex::new();
        let template = published("Code review agent", &[]);
        index.index_template(&template).await.unwrap();
        assert_eq!(index.len(), 1);

        index.remove_template(&template.id).await.unwrap();
        assert!(index.is_empty());
        assert!(index.query("code", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_popular_tags_ordered_by_count() {
        let index = MemoryIndex::new();
        index
            .index_template(&published("A", &["agents", "rust"]))
            .await
            .unwrap();
        index
            .index_template(&published("B", &["agents"]))
            .await
            .unwrap();

        let tags = index.popular_tags(10).await.unwrap();
        assert_eq!(
            tags,
            vec![
                TagCount {
                    tag: "agents".to_string(),
                    count: 2
                },
                TagCount {
                    tag: "rust".to_string(),
                    count: 1
                },
            ]
        );
    }
}
