use chrono::{TimeDelta, Utc};
use common::ApplicationVersion;
use common::testing::TestConfigBuilder;
use retention::{
    DeleteOutcome, InMemoryVersionStore, RetentionEnforcer, RetentionError, RetentionMetrics,
    RetentionPolicy, StoreError, StoreErrorKind, VersionManager,
};
use std::sync::Arc;
use std::time::Duration;

const HOUR: Duration = Duration::from_secs(3600);

/// Four versions aged 1h, 2h, 10h and 100h, registered out of order
fn fleet() -> Arc<InMemoryVersionStore> {
    let now = Utc::now();
    let aged = |label: &str, hours: i64| {
        ApplicationVersion::new("web", label, now - TimeDelta::hours(hours))
    };
    Arc::new(InMemoryVersionStore::with_versions([
        aged("v10h", 10),
        aged("v1h", 1),
        aged("v100h", 100),
        aged("v2h", 2),
    ]))
}

fn enforcer(store: Arc<InMemoryVersionStore>) -> RetentionEnforcer {
    RetentionEnforcer::new(
        store,
        TestConfigBuilder::new().build().retention,
        RetentionMetrics::new(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_count_floor_only() {
    let store = fleet();
    let report = enforcer(store.clone())
        .enforce_with_policy("web", RetentionPolicy::new(2, Duration::ZERO))
        .await
        .unwrap();

    assert_eq!(report.selected, vec!["v10h", "v100h"]);
    assert_eq!(report.deleted, 2);
    assert_eq!(store.labels("web").await, vec!["v1h", "v2h"]);
}

#[tokio::test]
async fn test_age_filter_only() {
    let store = fleet();
    let report = enforcer(store.clone())
        .enforce_with_policy("web", RetentionPolicy::new(0, 5 * HOUR))
        .await
        .unwrap();

    assert_eq!(report.selected, vec!["v10h", "v100h"]);
    assert_eq!(store.labels("web").await, vec!["v1h", "v2h"]);
}

#[tokio::test]
async fn test_age_filter_applies_past_count_floor() {
    let store = fleet();
    let report = enforcer(store.clone())
        .enforce_with_policy("web", RetentionPolicy::new(3, 5 * HOUR))
        .await
        .unwrap();

    // v10h is older than 5h but sits inside the count floor
    assert_eq!(report.selected, vec!["v100h"]);
    assert_eq!(store.labels("web").await, vec!["v10h", "v1h", "v2h"]);
}

#[tokio::test]
async fn test_count_floor_larger_than_fleet() {
    let store = Arc::new(InMemoryVersionStore::with_versions([
        ApplicationVersion::new("web", "old", Utc::now() - TimeDelta::days(365)),
        ApplicationVersion::new("web", "older", Utc::now() - TimeDelta::days(730)),
    ]));

    let report = enforcer(store.clone())
        .enforce_with_policy("web", RetentionPolicy::new(5, HOUR))
        .await
        .unwrap();

    assert!(report.selected.is_empty());
    assert!(store.delete_calls().await.is_empty());
}

#[tokio::test]
async fn test_version_vanishing_mid_prune_is_absorbed() {
    let store = fleet();
    // Listed, but reported as already being removed once the delete arrives
    store
        .fail_delete("web", "v10h", StoreError::not_found_or_pending("web", "v10h"))
        .await;
    let oldest = ApplicationVersion::new("web", "v200h", Utc::now() - TimeDelta::hours(200));
    store.insert(oldest).await;

    let metrics = RetentionMetrics::new();
    let enforcer = RetentionEnforcer::new(
        store.clone(),
        TestConfigBuilder::new().build().retention,
        metrics.clone(),
    )
    .unwrap();

    let report = enforcer
        .enforce_with_policy("web", RetentionPolicy::new(2, Duration::ZERO))
        .await
        .unwrap();

    assert_eq!(report.selected, vec!["v10h", "v100h", "v200h"]);
    assert_eq!(report.deleted, 2);
    assert_eq!(report.already_gone, 1);
    assert_eq!(metrics.versions_already_gone(), 1);

    let calls: Vec<String> = store
        .delete_calls()
        .await
        .into_iter()
        .map(|(_, label)| label)
        .collect();
    assert_eq!(calls, vec!["v10h", "v100h", "v200h"]);
}

#[tokio::test]
async fn test_rejected_delete_aborts_prune() {
    let store = fleet();
    store
        .fail_delete(
            "web",
            "v10h",
            StoreError::new(StoreErrorKind::Throttled, "rate exceeded"),
        )
        .await;

    let err = enforcer(store.clone())
        .enforce_with_policy("web", RetentionPolicy::new(2, Duration::ZERO))
        .await
        .unwrap_err();

    match err {
        RetentionError::DeleteFailure { label, source, .. } => {
            assert_eq!(label, "v10h");
            assert_eq!(source.kind(), StoreErrorKind::Throttled);
        }
        other => panic!("unexpected error: {other}"),
    }
    // v100h is never attempted
    assert_eq!(store.delete_calls().await.len(), 1);
    assert!(store.labels("web").await.contains(&"v100h".to_string()));
}

#[tokio::test]
async fn test_delete_with_application_override() {
    let store = fleet();
    let config = TestConfigBuilder::new()
        .with_application("web", Some(0), Some(5 * HOUR))
        .build()
        .retention;
    let enforcer = RetentionEnforcer::new(store.clone(), config, RetentionMetrics::new()).unwrap();
    let manager = VersionManager::new(store.clone(), enforcer);

    let outcome = manager.delete("web", "v1h").await.unwrap();

    let DeleteOutcome::Pruned(report) = outcome else {
        panic!("expected the application to be pruned");
    };
    assert_eq!(report.selected, vec!["v10h", "v100h"]);
    // The named version is younger than the period and survives
    assert_eq!(store.labels("web").await, vec!["v1h", "v2h"]);
}
