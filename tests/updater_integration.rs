//! Integration tests for routed updaters, container recovery and batch execution.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::fixtures::{ROUTING_TOML, SUBJECT_PUBLISHER, SourceBuilder, TARGET_PUBLISHER, episode, slot};
use equiv::content::{Content, ContentId};
use equiv::routing::{RoutingTable, StaticSourceProvider, UpdaterConfigurationRegistry};
use equiv::update::{
    BatchRunner, ContainerTrackingHandler, EquivalenceUpdater, InMemoryResolver, OutcomeStatus,
    RecordingUpdater, RecoveringUpdater, ScriptedResolver, ScriptedUpdate,
};

fn brand() -> Content {
    Content::brand("bbc-brand", SUBJECT_PUBLISHER)
}

fn item() -> Content {
    episode("bbc-ep", SUBJECT_PUBLISHER)
        .with_container(ContentId::new("bbc-brand"))
        .with_broadcast(slot(0, 60))
}

fn provider() -> StaticSourceProvider<Content> {
    let title = SourceBuilder::new("title")
        .score("bbc-brand", &Content::brand("pa-brand", TARGET_PUBLISHER), 1.0)
        .score(
            "bbc-ep",
            &episode("pa-ep", TARGET_PUBLISHER).with_broadcast(slot(0, 60)),
            0.9,
        )
        .score("bbc-ep", &episode("pa-other", TARGET_PUBLISHER), 0.3);
    StaticSourceProvider::new(vec![title.generator()], Vec::new())
}

fn registry() -> UpdaterConfigurationRegistry {
    let table = RoutingTable::from_toml_str(ROUTING_TOML).expect("routing should parse");
    UpdaterConfigurationRegistry::new(table).expect("routing should validate")
}

#[tokio::test]
async fn test_item_before_container_recovers_through_routing() {
    let handler = Arc::new(ContainerTrackingHandler::<Content>::new());
    let updater = registry()
        .build_updater(&provider(), handler.clone())
        .expect("updater should build");
    let recovering = RecoveringUpdater::<Content>::new(
        Arc::new(updater),
        Arc::new(InMemoryResolver::new([brand(), item()])),
    );

    let found = recovering.update(&item()).await.expect("update should succeed");

    assert!(found);
    assert_eq!(
        handler.handled(),
        vec![ContentId::new("bbc-brand"), ContentId::new("bbc-ep")]
    );

    let results = handler.results();
    assert_eq!(results.len(), 2);
    let container_strong: Vec<&str> = results[0]
        .strong_ids()
        .into_iter()
        .map(ContentId::as_str)
        .collect();
    assert_eq!(container_strong, vec!["pa-brand"]);
    let item_strong: Vec<&str> = results[1]
        .strong_ids()
        .into_iter()
        .map(ContentId::as_str)
        .collect();
    assert_eq!(item_strong, vec!["pa-ep"]);
}

#[tokio::test]
async fn test_unresolvable_container_ends_quietly() {
    let handler = Arc::new(ContainerTrackingHandler::<Content>::new());
    let updater = registry()
        .build_updater(&provider(), handler.clone())
        .expect("updater should build");
    let resolver = Arc::new(ScriptedResolver::new([item()]));
    let recovering = RecoveringUpdater::<Content>::new(Arc::new(updater), resolver.clone());

    let found = recovering.update(&item()).await.expect("update should not fail");

    assert!(!found);
    assert!(handler.handled().is_empty());
    assert_eq!(resolver.lookups(), vec![ContentId::new("bbc-brand")]);
}

#[tokio::test]
async fn test_batch_in_container_order_needs_no_recovery() {
    let handler = Arc::new(ContainerTrackingHandler::<Content>::new());
    let updater = registry()
        .build_updater(&provider(), handler.clone())
        .expect("updater should build");

    let report = BatchRunner::<Content>::new(Arc::new(updater))
        .with_concurrency(1)
        .run(vec![brand(), item()])
        .await;

    assert_eq!(report.updated(), 2);
    assert_eq!(report.failed(), 0);
    assert_eq!(
        handler.handled(),
        vec![ContentId::new("bbc-brand"), ContentId::new("bbc-ep")]
    );
}

#[tokio::test]
async fn test_batch_isolates_failures_and_timeouts() {
    let recorder = Arc::new(
        RecordingUpdater::new()
            .script("a", [ScriptedUpdate::Found(true)])
            .script("b", [ScriptedUpdate::Fail("store offline".to_string())])
            .script("d", [ScriptedUpdate::Found(false)])
            .with_delay("c", Duration::from_millis(500)),
    );

    let subjects: Vec<Content> = ["a", "b", "c", "d"]
        .into_iter()
        .map(|id| episode(id, SUBJECT_PUBLISHER))
        .collect();
    let report = BatchRunner::<Content>::new(recorder.clone())
        .with_concurrency(4)
        .with_timeout(Some(Duration::from_millis(50)))
        .run(subjects)
        .await;

    let statuses: Vec<&OutcomeStatus> = report.outcomes.iter().map(|o| &o.status).collect();
    assert_eq!(statuses[0], &OutcomeStatus::Updated);
    assert!(matches!(statuses[1], OutcomeStatus::Failed { error } if error.contains("store offline")));
    assert_eq!(statuses[2], &OutcomeStatus::TimedOut);
    assert_eq!(statuses[3], &OutcomeStatus::Unchanged);
    assert_eq!(recorder.calls().len(), 4);
}

#[tokio::test]
async fn test_recovery_inside_batch_retries_once() {
    let recorder = Arc::new(RecordingUpdater::new().script(
        "ep",
        [ScriptedUpdate::ContainerRequired(ContentId::new("brand"))],
    ));
    let resolver = Arc::new(InMemoryResolver::new([Content::brand(
        "brand",
        SUBJECT_PUBLISHER,
    )]));
    let recovering = Arc::new(RecoveringUpdater::<Content>::new(recorder.clone(), resolver));

    let report = BatchRunner::<Content>::new(recovering)
        .run(vec![episode("ep", SUBJECT_PUBLISHER)])
        .await;

    assert_eq!(report.updated(), 1);
    assert_eq!(recorder.call_count("ep"), 2);
    assert_eq!(recorder.call_count("brand"), 1);
}
