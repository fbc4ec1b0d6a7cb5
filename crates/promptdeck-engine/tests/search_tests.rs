//! Integration tests for the search query façade

use promptdeck_engine::entities::{NewTemplate, Principal, Template, UsageAction};
use promptdeck_engine::{Engine, EngineError, MemoryIndex, MemoryStore};
use serde_json::json;
use std::sync::Arc;

fn engine_with_store() -> (Engine, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let engine = Engine::new(store.clone(), Arc::new(MemoryIndex::new()));
    (engine, store)
}

fn alice() -> Principal {
    Principal::new("alice", "alice@example.com")
}

async fn published(engine: &Engine, title: &str, tags: &[&str]) -> Template {
    let owner = alice();
    let template = engine
        .lifecycle
        .create(
            &owner,
            NewTemplate {
                title: title.to_string(),
                tags: tags.iter().map(|t| t.to_string()).collect(),
                is_public: true,
                configuration: json!({"model": "standard"}),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    engine.lifecycle.publish(&owner, &template.id).await.unwrap()
}

#[tokio::test]
async fn test_short_query_rejected_two_chars_accepted() {
    let (engine, _store) = engine_with_store();

    let err = engine.search.search(None, "a", None).await;
    assert!(matches!(err, Err(EngineError::InvalidQuery(_))));

    // Whitespace does not count toward the minimum
    let err = engine.search.search(None, "  a  ", None).await;
    assert!(matches!(err, Err(EngineError::InvalidQuery(_))));

    let results = engine.search.search(None, "ab", None).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_search_returns_only_published_public_live_templates() {
    let (engine, _store) = engine_with_store();
    let owner = alice();

    let visible = published(&engine, "Review helper", &[]).await;

    // Draft: never indexed
    engine
        .lifecycle
        .create(
            &owner,
            NewTemplate {
                title: "Review draft".to_string(),
                is_public: true,
                configuration: json!({}),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    // Published but private
    let private = engine
        .lifecycle
        .create(
            &owner,
            NewTemplate {
                title: "Review private".to_string(),
                is_public: false,
                configuration: json!({}),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    engine.lifecycle.publish(&owner, &private.id).await.unwrap();

    // Published then soft-deleted
    let deleted = published(&engine, "Review deleted", &[]).await;
    engine.lifecycle.delete(&owner, &deleted.id).await.unwrap();

    let results = engine.search.search(None, "review", None).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, visible.id);
}

#[tokio::test]
async fn test_unpublish_removes_from_search() {
    let (engine, _store) = engine_with_store();
    let owner = alice();
    let template = published(&engine, "Review helper", &[]).await;

    assert_eq!(
        engine.search.search(None, "review", None).await.unwrap().len(),
        1
    );

    engine
        .lifecycle
        .unpublish(&owner, &template.id)
        .await
        .unwrap();
    assert!(
        engine
            .search
            .search(None, "review", None)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_search_event_recorded_for_identified_callers_only() {
    let (engine, store) = engine_with_store();
    published(&engine, "Review helper", &[]).await;

    engine.search.search(None, "review", None).await.unwrap();
    let search_events = |store: &MemoryStore| {
        store
            .recorded_events()
            .into_iter()
            .filter(|e| e.action == UsageAction::Search)
            .collect::<Vec<_>>()
    };
    assert!(search_events(&store).is_empty());

    engine
        .search
        .search(Some(&alice()), "review", None)
        .await
        .unwrap();
    let events = search_events(&store);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].user_id, Some("alice".into()));
    assert_eq!(events[0].template_id, None);
    assert_eq!(events[0].metadata["query"], json!("review"));
}

#[tokio::test]
async fn test_limit_is_bounded() {
    let store = Arc::new(MemoryStore::new());
    let engine = Engine::new(store.clone(), Arc::new(MemoryIndex::new()))
        .with_search_limits(1, 2);

    for i in 0..4 {
        published(&engine, &format!("Review helper {i}"), &[]).await;
    }

    // Default limit applies when none is given
    let results = engine.search.search(None, "review", None).await.unwrap();
    assert_eq!(results.len(), 1);

    // An oversized limit is clamped to the configured maximum
    let results = engine
        .search
        .search(None, "review", Some(100))
        .await
        .unwrap();
    assert_eq!(results.len(), 2);
}

#[tokio::test]
async fn test_popular_tags_ranked_by_frequency() {
    let (engine, _store) = engine_with_store();
    published(&engine, "A", &["agents", "rust"]).await;
    published(&engine, "B", &["agents", "support"]).await;
    published(&engine, "C", &["agents"]).await;

    let tags = engine.search.popular_tags(Some(2)).await.unwrap();
    assert_eq!(tags.len(), 2);
    assert_eq!(tags[0].tag, "agents");
    assert_eq!(tags[0].count, 3);
}
