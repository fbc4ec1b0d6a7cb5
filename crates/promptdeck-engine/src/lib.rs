//! # Promptdeck Engine
//!
//! The template relationship and lifecycle engine behind the promptdeck
//! marketplace:
//! - Template lifecycle (create/update/soft-delete, draft ⇄ published)
//!   with single-owner enforcement
//! - Fork and clone workflows — fork records lineage in an append-only
//!   ledger and counts against the origin, clone does not
//! - Idempotent favorite membership with counters maintained through an
//!   atomic storage primitive
//! - Append-only usage analytics that never fail the primary operation
//! - A validated search façade over an opaque search-index collaborator
//!
//! ## Core Concepts
//!
//! - **Templates** are documents with derived counters (forks, favorites,
//!   usage) that only the relationship ledger writes
//! - **Fork records** are append-only and outlive soft-deleted templates
//! - **Soft deletion** hides a template from search and listing while
//!   keeping the row readable for audit
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use promptdeck_engine::{Engine, MemoryIndex, MemoryStore};
//! use promptdeck_engine::entities::{NewTemplate, Principal};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = Engine::new(Arc::new(MemoryStore::new()), Arc::new(MemoryIndex::new()));
//!
//! let alice = Principal::new("alice", "alice@example.com");
//! let template = engine
//!     .lifecycle
//!     .create(
//!         &alice,
//!         NewTemplate {
//!             title: "Support agent".into(),
//!             configuration: serde_json::json!({"model": "standard"}),
//!             ..Default::default()
//!         },
//!     )
//!     .await?;
//!
//! let bob = Principal::new("bob", "bob@example.com");
//! let fork = engine.lifecycle.fork(Some(&bob), &template.id).await?;
//! assert_eq!(fork.parent_template_id, Some(template.id));
//! # Ok(())
//! # }
//! ```

pub mod analytics;
pub mod entities;
pub mod error;
pub mod events;
pub mod facade;
pub mod ledger;
pub mod lifecycle;
pub mod search;
pub mod store;

pub use analytics::UsageRecorder;
pub use error::{EngineError, Result};
pub use events::{TemplateEvent, TemplateEvents};
pub use facade::SearchFacade;
pub use ledger::RelationshipLedger;
pub use lifecycle::LifecycleManager;
pub use search::{MemoryIndex, SearchIndex};
pub use store::{DocumentStore, MemoryStore};

use std::sync::Arc;

/// The assembled engine: lifecycle manager, relationship ledger and
/// search façade sharing one document store and one search index.
pub struct Engine {
    pub lifecycle: LifecycleManager,
    pub ledger: RelationshipLedger,
    pub search: SearchFacade,
}

impl Engine {
    pub fn new(store: Arc<dyn DocumentStore>, index: Arc<dyn SearchIndex>) -> Self {
        let analytics = UsageRecorder::new(store.clone());
        let ledger = RelationshipLedger::new(store.clone());
        let events = Arc::new(TemplateEvents::default());
        let lifecycle = LifecycleManager::new(
            store.clone(),
            index.clone(),
            ledger.clone(),
            analytics.clone(),
            events,
        );
        let search = SearchFacade::new(store, index, analytics);
        Self {
            lifecycle,
            ledger,
            search,
        }
    }

    /// Apply configured default/maximum search result limits.
    pub fn with_search_limits(mut self, default_limit: usize, max_limit: usize) -> Self {
        self.search = self.search.with_limits(default_limit, max_limit);
        self
    }
}
