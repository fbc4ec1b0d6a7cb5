//! Integration tests for the relationship ledger

use promptdeck_engine::entities::{NewTemplate, Principal, Template, TemplateId};
use promptdeck_engine::{Engine, MemoryIndex, MemoryStore};
use serde_json::json;
use std::sync::Arc;

fn engine() -> Engine {
    Engine::new(Arc::new(MemoryStore::new()), Arc::new(MemoryIndex::new()))
}

async fn seeded_template(engine: &Engine) -> Template {
    engine
        .lifecycle
        .create(
            &Principal::new("alice", "alice@example.com"),
            NewTemplate {
                title: "Support agent".to_string(),
                configuration: json!({"model": "standard"}),
                ..Default::default()
            },
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_add_favorite_is_idempotent() {
    let engine = engine();
    let template = seeded_template(&engine).await;
    let user: promptdeck_engine::entities::UserId = "bob".into();

    engine.ledger.add_favorite(&template.id, &user).await.unwrap();
    let after_first = engine.ledger.favorite_count(&template.id).await.unwrap();
    assert_eq!(after_first, 1);

    // Second add of the same pair changes nothing
    engine.ledger.add_favorite(&template.id, &user).await.unwrap();
    assert_eq!(
        engine.ledger.favorite_count(&template.id).await.unwrap(),
        after_first
    );
    assert!(engine.ledger.is_favorite(&template.id, &user).await.unwrap());
}

#[tokio::test]
async fn test_remove_missing_favorite_is_a_noop() {
    let engine = engine();
    let template = seeded_template(&engine).await;
    let user: promptdeck_engine::entities::UserId = "bob".into();

    // Removing a pair that never existed succeeds and moves nothing
    engine
        .ledger
        .remove_favorite(&template.id, &user)
        .await
        .unwrap();
    assert_eq!(engine.ledger.favorite_count(&template.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_favorite_count_never_goes_below_zero() {
    let engine = engine();
    let template = seeded_template(&engine).await;
    let user: promptdeck_engine::entities::UserId = "bob".into();

    engine.ledger.add_favorite(&template.id, &user).await.unwrap();
    engine
        .ledger
        .remove_favorite(&template.id, &user)
        .await
        .unwrap();
    engine
        .ledger
        .remove_favorite(&template.id, &user)
        .await
        .unwrap();

    assert_eq!(engine.ledger.favorite_count(&template.id).await.unwrap(), 0);
    assert!(!engine.ledger.is_favorite(&template.id, &user).await.unwrap());
}

#[tokio::test]
async fn test_fork_count_agrees_with_ledger_records() {
    let engine = engine();
    let origin = seeded_template(&engine).await;

    for i in 0..5 {
        let forked: TemplateId = format!("forked-{i}").into();
        let user: promptdeck_engine::entities::UserId = format!("user-{i}").into();
        engine
            .ledger
            .record_fork(&origin.id, &forked, &user)
            .await
            .unwrap();
    }

    let count = engine.ledger.fork_count(&origin.id).await.unwrap();
    let records = engine.ledger.forks_of(&origin.id).await.unwrap();
    assert_eq!(count, 5);
    assert_eq!(records.len(), 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_forks_lose_no_increments() {
    let engine = Arc::new(engine());
    let origin = seeded_template(&engine).await;

    let mut handles = Vec::new();
    for i in 0..32 {
        let engine = engine.clone();
        let origin_id = origin.id.clone();
        handles.push(tokio::spawn(async move {
            let forked: TemplateId = format!("forked-{i}").into();
            let user: promptdeck_engine::entities::UserId = format!("user-{i}").into();
            engine
                .ledger
                .record_fork(&origin_id, &forked, &user)
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(engine.ledger.fork_count(&origin.id).await.unwrap(), 32);
    assert_eq!(engine.ledger.forks_of(&origin.id).await.unwrap().len(), 32);
}

#[tokio::test]
async fn test_favorites_are_per_user() {
    let engine = engine();
    let template = seeded_template(&engine).await;
    let bob: promptdeck_engine::entities::UserId = "bob".into();
    let carol: promptdeck_engine::entities::UserId = "carol".into();

    engine.ledger.add_favorite(&template.id, &bob).await.unwrap();
    engine
        .ledger
        .add_favorite(&template.id, &carol)
        .await
        .unwrap();
    assert_eq!(engine.ledger.favorite_count(&template.id).await.unwrap(), 2);

    engine
        .ledger
        .remove_favorite(&template.id, &bob)
        .await
        .unwrap();
    assert_eq!(engine.ledger.favorite_count(&template.id).await.unwrap(), 1);
    assert!(!engine.ledger.is_favorite(&template.id, &bob).await.unwrap());
    assert!(
        engine
            .ledger
            .is_favorite(&template.id, &carol)
            .await
            .unwrap()
    );
}
