//! Offline batch evaluation.
//!
//! A [`BatchFile`] carries a content catalogue and precomputed per-source scores. The
//! scores are replayed through the routed updaters and every subject's results are
//! collected into a [`RunOutput`].

pub mod error;

#[cfg(test)]
mod tests;

pub use error::{DriverError, DriverResult};

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::Config;
use crate::content::{Content, ContentId, EquivalenceContent};
use crate::pipeline::{EquivalenceGenerator, EquivalenceResult, EquivalenceScorer, ReplayedScores};
use crate::routing::{StaticSourceProvider, UpdaterConfigurationRegistry};
use crate::score::Score;
use crate::update::{BatchReport, BatchRunner, CollectingHandler, InMemoryResolver, RecoveringUpdater};

/// One recorded score of a candidate against a subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub subject: ContentId,
    pub candidate: ContentId,
    /// `null` or absent records a Null score.
    #[serde(default)]
    pub score: Score,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchFile {
    pub contents: Vec<Content>,
    /// Subjects to evaluate. Empty means every content that a generator recorded scores for.
    #[serde(default)]
    pub subjects: Vec<ContentId>,
    /// Generator name -> records. Generators propose the candidate universe.
    #[serde(default)]
    pub generators: BTreeMap<String, Vec<ScoreRecord>>,
    /// Scorer name -> records. Scorers only score candidates already generated.
    #[serde(default)]
    pub scorers: BTreeMap<String, Vec<ScoreRecord>>,
}

impl BatchFile {
    pub fn from_json_str(raw: &str) -> DriverResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn load(path: impl AsRef<Path>) -> DriverResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| DriverError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Subjects in evaluation order.
    pub fn resolve_subjects(&self) -> DriverResult<Vec<Content>> {
        let catalogue = self.catalogue();
        if self.subjects.is_empty() {
            let scored: HashSet<&ContentId> = self
                .generators
                .values()
                .flatten()
                .map(|r| &r.subject)
                .collect();
            return Ok(self
                .contents
                .iter()
                .filter(|c| scored.contains(c.id()))
                .cloned()
                .collect());
        }

        self.subjects
            .iter()
            .map(|id| lookup(&catalogue, id, "subject list").cloned())
            .collect()
    }

    fn catalogue(&self) -> HashMap<&ContentId, &Content> {
        self.contents.iter().map(|c| (c.id(), c)).collect()
    }

    fn replayed(
        &self,
        sources: &BTreeMap<String, Vec<ScoreRecord>>,
    ) -> DriverResult<Vec<ReplayedScores<Content>>> {
        let catalogue = self.catalogue();
        sources
            .iter()
            .map(|(name, records)| {
                let mut replayed = ReplayedScores::new(name.clone());
                for record in records {
                    let context = format!("source '{}'", name);
                    lookup(&catalogue, &record.subject, &context)?;
                    let candidate = lookup(&catalogue, &record.candidate, &context)?;
                    replayed.insert(&record.subject, candidate.clone(), record.score);
                }
                Ok(replayed)
            })
            .collect()
    }
}

fn lookup<'a>(
    catalogue: &HashMap<&ContentId, &'a Content>,
    id: &ContentId,
    context: &str,
) -> DriverResult<&'a Content> {
    catalogue
        .get(id)
        .copied()
        .ok_or_else(|| DriverError::UnknownContent {
            context: context.to_string(),
            id: id.clone(),
        })
}

/// Everything one batch run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutput {
    pub run_id: Uuid,
    pub report: BatchReport,
    pub results: Vec<EquivalenceResult<Content>>,
}

/// Replays the batch's scores through the routed updaters.
///
/// Per-subject failures end up in the report; only configuration and catalogue problems
/// fail the run.
#[instrument(skip_all, fields(run_id = tracing::field::Empty, contents = batch.contents.len()))]
pub async fn run_batch(
    registry: UpdaterConfigurationRegistry,
    batch: BatchFile,
    config: &Config,
) -> DriverResult<RunOutput> {
    let run_id = Uuid::new_v4();
    tracing::Span::current().record("run_id", tracing::field::display(run_id));

    let subjects = batch.resolve_subjects()?;
    let generators: Vec<Arc<dyn EquivalenceGenerator<Content>>> = batch
        .replayed(&batch.generators)?
        .into_iter()
        .map(|g| Arc::new(g) as Arc<dyn EquivalenceGenerator<Content>>)
        .collect();
    let scorers: Vec<Arc<dyn EquivalenceScorer<Content>>> = batch
        .replayed(&batch.scorers)?
        .into_iter()
        .map(|s| Arc::new(s) as Arc<dyn EquivalenceScorer<Content>>)
        .collect();
    let provider = StaticSourceProvider::new(generators, scorers);

    // Items wait for their container when the container runs a pipeline of its own.
    let summarised = batch
        .contents
        .iter()
        .filter(|c| c.is_container() && registry.is_routed(c.publisher(), c.hierarchy()))
        .map(|c| c.id().clone());
    let handler = Arc::new(CollectingHandler::<Content>::new().requiring_containers(summarised));
    let updater = registry
        .with_extraction_concurrency(config.extraction_concurrency)
        .build_updater(&provider, handler.clone())?;
    let resolver = Arc::new(InMemoryResolver::new(batch.contents));
    let recovering = Arc::new(RecoveringUpdater::<Content>::new(Arc::new(updater), resolver));

    let report = BatchRunner::<Content>::new(recovering)
        .with_concurrency(config.batch_concurrency)
        .with_timeout(config.run_timeout)
        .run(subjects)
        .await;

    let results = handler.drain();
    info!(
        %run_id,
        updated = report.updated(),
        unchanged = report.unchanged(),
        failed = report.failed(),
        results = results.len(),
        "Batch run finished"
    );

    Ok(RunOutput {
        run_id,
        report,
        results,
    })
}
