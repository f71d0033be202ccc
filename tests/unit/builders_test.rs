//! Tests for builder modules

use std::sync::Arc;
use std::time::Duration;

use volunteer_match::builders::{build_engine, build_notification_backend};
use volunteer_match::config::{EngineConfig, NotificationBackendConfig};
use volunteer_match::core::{Actor, NewOpportunity, Organization, RelayMode};
use volunteer_match::infra::mailbox::NotificationBackend;
use volunteer_match::infra::MemoryStore;
use volunteer_match::runtime::TokioSpawner;
use volunteer_match::util::ids::{OrganizationId, UserId};

#[test]
fn test_build_in_memory_backend() {
    let backend = build_notification_backend(&EngineConfig::default()).unwrap();
    assert!(matches!(backend, NotificationBackend::InMemory(_)));
}

#[test]
fn test_file_backend_without_data_dir_fails() {
    let cfg = EngineConfig {
        notifications: NotificationBackendConfig::File,
        ..EngineConfig::default()
    };
    assert!(build_notification_backend(&cfg).is_err());
}

#[test]
fn test_build_file_backend() {
    let dir = std::env::temp_dir().join(format!("volunteer-match-{}", uuid::Uuid::new_v4()));
    let cfg = EngineConfig {
        notifications: NotificationBackendConfig::File,
        data_dir: Some(dir.to_string_lossy().into_owned()),
        stream: "builder".to_string(),
        ..EngineConfig::default()
    };
    let backend = build_notification_backend(&cfg).unwrap();
    let NotificationBackend::File(store) = backend else {
        panic!("expected file backend");
    };
    assert!(store.path().starts_with(&dir));
    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_build_engine_rejects_invalid_config() {
    let cfg = EngineConfig {
        recent_limit: 0,
        ..EngineConfig::default()
    };
    let result = build_engine(&cfg, Arc::new(MemoryStore::new()), &TokioSpawner::current());
    let err = result.err().expect("invalid config must fail");
    assert!(err.to_string().contains("recent_limit"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_build_engine_with_background_relay() {
    let cfg = EngineConfig {
        relay: RelayMode::Background,
        relay_idle_ms: 10,
        ..EngineConfig::default()
    };
    let store = Arc::new(MemoryStore::new());
    let staff = UserId::new();
    let organization = OrganizationId::new();
    store.put_organization(Organization {
        id: organization,
        name: "Shelter".to_string(),
        staff: vec![staff],
    });

    let engine = build_engine(&cfg, Arc::clone(&store), &TokioSpawner::current()).unwrap();
    assert_eq!(engine.options().relay_mode, RelayMode::Background);

    let staff_actor = Actor::staff(staff, organization);
    let opp = engine
        .create_opportunity(
            &staff_actor,
            NewOpportunity {
                title: "Dog walking".to_string(),
                max_participants: 2,
                ..NewOpportunity::default()
            },
        )
        .await
        .unwrap();
    engine
        .submit_application(&Actor::volunteer(UserId::new()), opp.id, None)
        .await
        .unwrap();

    let mut delivered = false;
    for _ in 0..100 {
        if engine.unread_count(staff).await.unwrap() == 1 {
            delivered = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(delivered, "background relay never delivered");
    engine.relay().shutdown();
}
