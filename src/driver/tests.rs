use super::*;
use crate::routing::RoutingTable;
use crate::update::OutcomeStatus;

const ROUTING: &str = r#"
[pipelines.standard]
extractors = [{ type = "percent_above_next_best", multiplier = 1.5 }]

[[sources]]
publisher = "bbc.co.uk"
item = { pipelines = ["standard"], targets = ["pa"] }
"#;

const BATCH: &str = r#"{
  "contents": [
    { "id": "bbc-1", "publisher": "bbc.co.uk", "kind": { "type": "episode" } },
    { "id": "bbc-2", "publisher": "bbc.co.uk", "kind": { "type": "film" } },
    { "id": "itv-1", "publisher": "itv", "kind": { "type": "item" } },
    { "id": "pa-1", "publisher": "pa", "kind": { "type": "episode" } },
    { "id": "pa-2", "publisher": "pa", "kind": { "type": "episode" } }
  ],
  "generators": {
    "title": [
      { "subject": "bbc-1", "candidate": "pa-1", "score": 3.0 },
      { "subject": "bbc-1", "candidate": "pa-2", "score": 1.0 },
      { "subject": "itv-1", "candidate": "pa-1", "score": 1.0 }
    ]
  },
  "scorers": {
    "broadcast": [
      { "subject": "bbc-1", "candidate": "pa-1", "score": null },
      { "subject": "bbc-1", "candidate": "pa-2" }
    ]
  }
}"#;

fn registry() -> UpdaterConfigurationRegistry {
    let table = RoutingTable::from_toml_str(ROUTING).expect("routing should parse");
    UpdaterConfigurationRegistry::new(table).expect("routing should validate")
}

#[test]
fn test_batch_file_parses_null_and_missing_scores() {
    let batch = BatchFile::from_json_str(BATCH).expect("batch should parse");

    assert_eq!(batch.contents.len(), 5);
    let broadcast = &batch.scorers["broadcast"];
    assert_eq!(broadcast[0].score, Score::Null);
    assert_eq!(broadcast[1].score, Score::Null);
    assert_eq!(batch.generators["title"][0].score, Score::value(3.0));
}

#[test]
fn test_default_subjects_are_generated_subjects_in_catalogue_order() {
    let batch = BatchFile::from_json_str(BATCH).expect("batch should parse");
    let subjects = batch.resolve_subjects().expect("subjects should resolve");
    let ids: Vec<&str> = subjects.iter().map(|c| c.id().as_str()).collect();
    assert_eq!(ids, vec!["bbc-1", "itv-1"]);
}

#[test]
fn test_explicit_subjects_must_exist() {
    let mut batch = BatchFile::from_json_str(BATCH).expect("batch should parse");
    batch.subjects = vec![ContentId::new("bbc-2"), ContentId::new("missing")];

    let err = batch.resolve_subjects().unwrap_err();
    assert!(matches!(err, DriverError::UnknownContent { ref id, .. } if id.as_str() == "missing"));
}

#[tokio::test]
async fn test_unknown_candidate_fails_the_run() {
    let mut batch = BatchFile::from_json_str(BATCH).expect("batch should parse");
    batch.generators.insert(
        "typo".to_string(),
        vec![ScoreRecord {
            subject: ContentId::new("bbc-1"),
            candidate: ContentId::new("pa-9"),
            score: Score::ONE,
        }],
    );

    let err = run_batch(registry(), batch, &Config::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("source 'typo'"));
}

#[tokio::test]
async fn test_run_batch_reports_every_subject() {
    let batch = BatchFile::from_json_str(BATCH).expect("batch should parse");
    let output = run_batch(registry(), batch, &Config::default())
        .await
        .expect("run should succeed");

    assert_eq!(output.report.outcomes.len(), 2);
    assert_eq!(output.report.outcomes[0].status, OutcomeStatus::Updated);
    // itv is not routed; the failure stays with that subject.
    assert!(output.report.outcomes[1].is_failure());

    assert_eq!(output.results.len(), 1);
    let strong: Vec<&str> = output.results[0]
        .strong_ids()
        .into_iter()
        .map(ContentId::as_str)
        .collect();
    assert_eq!(strong, vec!["pa-1"]);
    assert_eq!(output.results[0].raw_scores().len(), 2);

    let json = serde_json::to_value(&output).expect("output should serialize");
    assert_eq!(json["report"]["outcomes"][1]["status"], "failed");
    assert!(json["run_id"].is_string());
}

const CONTAINER_ROUTING: &str = r#"
[pipelines.standard]
extractors = [{ type = "percent_above_next_best", multiplier = 1.5 }]

[pipelines.brands]
extractors = [{ type = "top" }]

[[sources]]
publisher = "bbc.co.uk"
item = { pipelines = ["standard"], targets = ["pa"] }
top_level_container = { pipelines = ["brands"], targets = ["pa"] }
"#;

const CONTAINER_BATCH: &str = r#"{
  "contents": [
    { "id": "bbc-ep", "publisher": "bbc.co.uk", "kind": { "type": "episode" }, "container": "bbc-brand" },
    { "id": "bbc-brand", "publisher": "bbc.co.uk", "kind": { "type": "brand" } },
    { "id": "pa-1", "publisher": "pa", "kind": { "type": "episode" } },
    { "id": "pa-brand", "publisher": "pa", "kind": { "type": "brand" } }
  ],
  "generators": {
    "title": [
      { "subject": "bbc-ep", "candidate": "pa-1", "score": 2.0 },
      { "subject": "bbc-brand", "candidate": "pa-brand", "score": 1.0 }
    ]
  }
}"#;

#[tokio::test]
async fn test_run_batch_equivalences_container_before_item() {
    let table = RoutingTable::from_toml_str(CONTAINER_ROUTING).expect("routing should parse");
    let registry = UpdaterConfigurationRegistry::new(table).expect("routing should validate");
    let batch = BatchFile::from_json_str(CONTAINER_BATCH).expect("batch should parse");
    let config = Config {
        batch_concurrency: 1,
        ..Default::default()
    };

    let output = run_batch(registry, batch, &config)
        .await
        .expect("run should succeed");

    let statuses: Vec<(&str, &OutcomeStatus)> = output
        .report
        .outcomes
        .iter()
        .map(|o| (o.subject.as_str(), &o.status))
        .collect();
    assert_eq!(
        statuses,
        vec![
            ("bbc-ep", &OutcomeStatus::Updated),
            ("bbc-brand", &OutcomeStatus::Updated),
        ]
    );

    // The brand ran during recovery and again as a subject; it is reported once.
    let handled: Vec<&str> = output
        .results
        .iter()
        .map(|r| r.subject().id.as_str())
        .collect();
    assert_eq!(handled, vec!["bbc-brand", "bbc-ep"]);
}

#[test]
fn test_load_missing_file() {
    let err = BatchFile::load("/nonexistent/batch.json").unwrap_err();
    assert!(matches!(err, DriverError::Read { .. }));
}
