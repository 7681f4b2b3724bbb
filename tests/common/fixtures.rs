//! Test fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use equiv::content::{Broadcast, Content, ContentId, ContentKind};
use equiv::pipeline::{EquivalenceGenerator, ReplayedScores};
use equiv::score::Score;

pub const SUBJECT_PUBLISHER: &str = "bbc.co.uk";

pub const TARGET_PUBLISHER: &str = "pressassociation.com";

/// 2024-01-01 20:00:00 UTC.
pub fn evening() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 20, 0, 0).unwrap()
}

/// Broadcast starting `offset_minutes` after [`evening`] and lasting `minutes`.
pub fn slot(offset_minutes: i64, minutes: i64) -> Broadcast {
    let start = evening() + Duration::minutes(offset_minutes);
    Broadcast::new(start, start + Duration::minutes(minutes))
}

pub fn episode(id: &str, publisher: &str) -> Content {
    Content::new(id, publisher, ContentKind::Episode)
}

pub fn song(id: &str, publisher: &str) -> Content {
    Content::new(id, publisher, ContentKind::Song)
}

/// Collects replayed scores for one named source.
pub struct SourceBuilder {
    scores: ReplayedScores<Content>,
}

impl SourceBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            scores: ReplayedScores::new(name),
        }
    }

    pub fn score(mut self, subject: &str, candidate: &Content, score: f64) -> Self {
        self.scores
            .insert(&ContentId::new(subject), candidate.clone(), Score::value(score));
        self
    }

    pub fn null(mut self, subject: &str, candidate: &Content) -> Self {
        self.scores
            .insert(&ContentId::new(subject), candidate.clone(), Score::Null);
        self
    }

    pub fn build(self) -> ReplayedScores<Content> {
        self.scores
    }

    pub fn generator(self) -> Arc<dyn EquivalenceGenerator<Content>> {
        Arc::new(self.scores)
    }
}

pub const ROUTING_TOML: &str = r#"
[pipelines.broadcast_items]
combiner = { type = "null_score_aware_averaging" }
minimum_score = 0.1
extractors = [
    { type = "multiple_candidate" },
    { type = "percent_above_next_best", multiplier = 1.5 },
]

[pipelines.containers]
extractors = [{ type = "top" }]

[[sources]]
publisher = "bbc.co.uk"
item = { pipelines = ["broadcast_items"], targets = ["pressassociation.com"] }
top_level_container = { pipelines = ["containers"], targets = ["pressassociation.com"] }
"#;
