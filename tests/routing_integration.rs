//! Integration tests for routing files and the batch driver.

mod common;

use std::io::Write;

use common::fixtures::{ROUTING_TOML, SUBJECT_PUBLISHER, TARGET_PUBLISHER};
use equiv::config::Config;
use equiv::content::ContentId;
use equiv::driver::{BatchFile, run_batch};
use equiv::routing::{RoutingError, RoutingTable, UpdaterConfigurationRegistry};
use equiv::update::OutcomeStatus;
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).expect("create file");
    file.write_all(contents.as_bytes()).expect("write file");
    path
}

fn batch_json() -> String {
    serde_json::json!({
        "contents": [
            { "id": "bbc-brand", "publisher": SUBJECT_PUBLISHER, "kind": { "type": "brand" } },
            {
                "id": "bbc-ep",
                "publisher": SUBJECT_PUBLISHER,
                "kind": { "type": "episode" },
                "container": "bbc-brand",
                "broadcasts": [{
                    "transmission_start": "2024-01-01T20:00:00Z",
                    "transmission_end": "2024-01-01T21:00:00Z"
                }]
            },
            {
                "id": "pa-1",
                "publisher": TARGET_PUBLISHER,
                "kind": { "type": "episode" },
                "broadcasts": [{
                    "transmission_start": "2024-01-01T20:00:00Z",
                    "transmission_end": "2024-01-01T20:30:00Z"
                }]
            },
            {
                "id": "pa-2",
                "publisher": TARGET_PUBLISHER,
                "kind": { "type": "episode" },
                "broadcasts": [{
                    "transmission_start": "2024-01-01T20:30:00Z",
                    "transmission_end": "2024-01-01T21:00:00Z"
                }]
            },
            { "id": "pa-brand", "publisher": TARGET_PUBLISHER, "kind": { "type": "brand" } }
        ],
        "generators": {
            "title": [
                { "subject": "bbc-ep", "candidate": "pa-1", "score": 0.9 },
                { "subject": "bbc-ep", "candidate": "pa-2", "score": 0.8 },
                { "subject": "bbc-brand", "candidate": "pa-brand", "score": 1.0 }
            ]
        },
        "scorers": {
            "broadcast": [
                { "subject": "bbc-ep", "candidate": "pa-1", "score": 0.9 },
                { "subject": "bbc-ep", "candidate": "pa-2", "score": 0.8 }
            ]
        }
    })
    .to_string()
}

#[test]
fn test_config_accepts_written_routing_file() {
    let dir = TempDir::new().expect("temp dir");
    let path = write(&dir, "routing.toml", ROUTING_TOML);

    let config = Config {
        routing_path: Some(path.clone()),
        ..Default::default()
    };
    config.validate().expect("routing path should validate");

    let table = RoutingTable::load(&path).expect("routing should load");
    let registry = UpdaterConfigurationRegistry::new(table).expect("routing should validate");
    let publishers: Vec<&str> = registry.publishers().map(|p| p.key()).collect();
    assert_eq!(publishers, vec![SUBJECT_PUBLISHER]);
}

#[test]
fn test_invalid_routing_file_is_rejected_at_load() {
    let dir = TempDir::new().expect("temp dir");
    let path = write(&dir, "routing.toml", "[pipelines.x]\nextractors = [{ type = \"sideways\" }]\n");

    let err = RoutingTable::load(&path).unwrap_err();
    assert!(matches!(err, RoutingError::Parse(_)));
}

#[tokio::test]
async fn test_batch_file_end_to_end() {
    let dir = TempDir::new().expect("temp dir");
    let routing = write(&dir, "routing.toml", ROUTING_TOML);
    let batch = write(&dir, "batch.json", &batch_json());

    let registry = UpdaterConfigurationRegistry::new(
        RoutingTable::load(&routing).expect("routing should load"),
    )
    .expect("routing should validate");
    let batch = BatchFile::load(&batch).expect("batch should load");

    let config = Config {
        batch_concurrency: 1,
        extraction_concurrency: 2,
        ..Default::default()
    };
    let output = run_batch(registry, batch, &config)
        .await
        .expect("run should succeed");

    let subjects: Vec<&str> = output
        .report
        .outcomes
        .iter()
        .map(|o| o.subject.as_str())
        .collect();
    assert_eq!(subjects, vec!["bbc-brand", "bbc-ep"]);
    assert!(
        output
            .report
            .outcomes
            .iter()
            .all(|o| o.status == OutcomeStatus::Updated)
    );

    let episode = output
        .results
        .iter()
        .find(|r| r.subject().id.as_str() == "bbc-ep")
        .expect("episode result");
    let strong: Vec<&str> = episode
        .strong_ids()
        .into_iter()
        .map(ContentId::as_str)
        .collect();
    assert_eq!(strong, vec!["pa-1", "pa-2"]);

    let json = serde_json::to_value(&output).expect("output should serialize");
    assert_eq!(json["run_id"], output.run_id.to_string());
    assert_eq!(json["results"].as_array().map(Vec::len), Some(2));
}
