//! Storage abstraction for engine data
//!
//! The document store is an external collaborator: durable table-like
//! storage with indexed lookup and an atomic counter primitive. The engine
//! issues operations against this trait and never implements durability
//! itself.

use crate::entities::{ForkRecord, Template, TemplateId, UsageEvent, UserId};
use async_trait::async_trait;

pub mod memory;

pub use memory::MemoryStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Row not found: {0}")]
    NotFound(String),

    #[error("Conflicting write: {0}")]
    Conflict(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// The derived counter columns on a template row.
///
/// Mutated exclusively through [`DocumentStore::adjust_counter`]; the
/// engine never reads-then-writes a counter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Counter {
    Forks,
    Favorites,
    Usage,
}

/// Abstraction over the document store backend
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new template row. Fails with `Conflict` if the id exists.
    async fn insert_template(&self, template: &Template) -> StoreResult<()>;

    /// Fetch a template row by id, soft-deleted rows included.
    async fn get_template(&self, id: &TemplateId) -> StoreResult<Option<Template>>;

    /// Replace the row for `template.id`, provided a live (non-deleted) row
    /// still exists. A concurrent soft delete makes this fail with
    /// `NotFound` — the accepted race from the concurrency contract.
    async fn replace_template(&self, template: &Template) -> StoreResult<()>;

    /// Templates owned by `owner`, optionally including soft-deleted rows.
    async fn list_templates_by_owner(
        &self,
        owner: &UserId,
        include_deleted: bool,
    ) -> StoreResult<Vec<Template>>;

    /// Atomically adjust a counter column and return the new value.
    ///
    /// Decrements clamp at zero. When `idempotency_key` is given, a key
    /// that was already applied leaves the counter untouched, so retries
    /// of the same logical mutation are safe.
    async fn adjust_counter(
        &self,
        id: &TemplateId,
        counter: Counter,
        delta: i64,
        idempotency_key: Option<&str>,
    ) -> StoreResult<i64>;

    /// Read a counter column directly, never recomputing from rows.
    async fn read_counter(&self, id: &TemplateId, counter: Counter) -> StoreResult<i64>;

    /// Append a fork-lineage record. Fails with `Conflict` on a duplicate
    /// record id.
    async fn insert_fork(&self, record: &ForkRecord) -> StoreResult<()>;

    /// Fork records whose origin is `origin`, oldest first.
    async fn list_forks_of(&self, origin: &TemplateId) -> StoreResult<Vec<ForkRecord>>;

    /// Insert a favorite row; returns `false` (and changes nothing) when
    /// the (template, user) pair already exists.
    async fn insert_favorite(
        &self,
        template_id: &TemplateId,
        user_id: &UserId,
    ) -> StoreResult<bool>;

    /// Delete a favorite row; returns `false` when no such row existed.
    async fn delete_favorite(
        &self,
        template_id: &TemplateId,
        user_id: &UserId,
    ) -> StoreResult<bool>;

    /// Whether the (template, user) favorite pair exists.
    async fn favorite_exists(
        &self,
        template_id: &TemplateId,
        user_id: &UserId,
    ) -> StoreResult<bool>;

    /// Append an immutable usage event.
    async fn append_usage_event(&self, event: &UsageEvent) -> StoreResult<()>;
}
