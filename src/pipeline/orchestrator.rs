use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use futures_util::future::join_all;
use futures_util::stream::{self, StreamExt};
use tracing::{debug, info, instrument, warn};

use crate::constants::{DEFAULT_EXTRACTION_CONCURRENCY, EMPTY_COMBINATION_SOURCE};
use crate::content::{ContentId, EquivalenceContent, Publisher};
use crate::extractors::SharedExtractor;
use crate::score::{ScoredCandidate, ScoredCandidates, sort_descending};
use crate::trace::{StageKind, TraceResult};

use super::combiner::ScoreCombiner;
use super::error::{PipelineError, PipelineResult};
use super::filter::EquivalenceFilter;
use super::generator::{EquivalenceGenerator, EquivalenceScorer};
use super::result::EquivalenceResult;

/// Everything one pipeline needs. Validated by [`EquivalencePipeline::new`].
pub struct PipelineConfig<T: EquivalenceContent> {
    pub name: String,
    pub generators: Vec<Arc<dyn EquivalenceGenerator<T>>>,
    pub scorers: Vec<Arc<dyn EquivalenceScorer<T>>>,
    pub combiner: Arc<dyn ScoreCombiner<T>>,
    pub filter: Arc<dyn EquivalenceFilter<T>>,
    /// Applied per publisher; the first extractor selecting anything wins.
    pub extractors: Vec<SharedExtractor<T>>,
    /// Candidates dropped from generator output before the universe is computed.
    pub excluded_ids: HashSet<ContentId>,
    pub extraction_concurrency: usize,
}

impl<T: EquivalenceContent> PipelineConfig<T> {
    pub fn new(
        name: impl Into<String>,
        generators: Vec<Arc<dyn EquivalenceGenerator<T>>>,
        combiner: Arc<dyn ScoreCombiner<T>>,
        filter: Arc<dyn EquivalenceFilter<T>>,
        extractors: Vec<SharedExtractor<T>>,
    ) -> Self {
        Self {
            name: name.into(),
            generators,
            scorers: Vec::new(),
            combiner,
            filter,
            extractors,
            excluded_ids: HashSet::new(),
            extraction_concurrency: DEFAULT_EXTRACTION_CONCURRENCY,
        }
    }

    pub fn with_scorers(mut self, scorers: Vec<Arc<dyn EquivalenceScorer<T>>>) -> Self {
        self.scorers = scorers;
        self
    }

    pub fn with_excluded_ids(mut self, excluded: impl IntoIterator<Item = ContentId>) -> Self {
        self.excluded_ids = excluded.into_iter().collect();
        self
    }

    pub fn with_extraction_concurrency(mut self, concurrency: usize) -> Self {
        self.extraction_concurrency = concurrency;
        self
    }

    fn validate(&self) -> PipelineResult<()> {
        if self.name.trim().is_empty() {
            return Err(PipelineError::invalid_config("pipeline name is empty"));
        }
        if self.generators.is_empty() {
            return Err(PipelineError::invalid_config(format!(
                "pipeline '{}' has no generators",
                self.name
            )));
        }
        if self.extractors.is_empty() {
            return Err(PipelineError::invalid_config(format!(
                "pipeline '{}' has no extractors",
                self.name
            )));
        }
        if self.extraction_concurrency == 0 {
            return Err(PipelineError::invalid_config(
                "extraction concurrency must be > 0",
            ));
        }
        Ok(())
    }
}

/// Runs generate -> score -> merge -> combine -> filter -> extract for one subject at a time.
///
/// Holds only read-only configuration; concurrent runs for different subjects share nothing
/// mutable.
pub struct EquivalencePipeline<T: EquivalenceContent> {
    name: String,
    generators: Vec<Arc<dyn EquivalenceGenerator<T>>>,
    scorers: Vec<Arc<dyn EquivalenceScorer<T>>>,
    combiner: Arc<dyn ScoreCombiner<T>>,
    filter: Arc<dyn EquivalenceFilter<T>>,
    extractors: Arc<[SharedExtractor<T>]>,
    excluded_ids: HashSet<ContentId>,
    extraction_concurrency: usize,
}

impl<T: EquivalenceContent> fmt::Debug for EquivalencePipeline<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let generators: Vec<&str> = self.generators.iter().map(|g| g.name()).collect();
        let scorers: Vec<&str> = self.scorers.iter().map(|s| s.name()).collect();
        let extractors: Vec<&str> = self.extractors.iter().map(|e| e.name()).collect();
        f.debug_struct("EquivalencePipeline")
            .field("name", &self.name)
            .field("generators", &generators)
            .field("scorers", &scorers)
            .field("combiner", &self.combiner.name())
            .field("filter", &self.filter.name())
            .field("extractors", &extractors)
            .field("excluded_ids", &self.excluded_ids.len())
            .field("extraction_concurrency", &self.extraction_concurrency)
            .finish()
    }
}

impl<T: EquivalenceContent> EquivalencePipeline<T> {
    pub fn new(config: PipelineConfig<T>) -> PipelineResult<Self> {
        config.validate()?;
        Ok(Self {
            name: config.name,
            generators: config.generators,
            scorers: config.scorers,
            combiner: config.combiner,
            filter: config.filter,
            extractors: config.extractors.into(),
            excluded_ids: config.excluded_ids,
            extraction_concurrency: config.extraction_concurrency,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Produces the equivalence decision for `subject`.
    #[instrument(skip(self, subject), fields(pipeline = %self.name, subject = %subject.id()))]
    pub async fn run(&self, subject: &T) -> PipelineResult<EquivalenceResult<T>> {
        let mut trace = TraceResult::new();

        let generated = self.generate(subject, &mut trace).await?;
        let universe = candidate_universe(&generated);
        debug!(
            sources = generated.len(),
            candidates = universe.len(),
            "Generated candidates"
        );

        if universe.is_empty() {
            debug!("No candidates generated, returning empty result");
            return Ok(EquivalenceResult::new(
                subject.clone(),
                generated,
                ScoredCandidates::empty(EMPTY_COMBINATION_SOURCE),
                BTreeMap::new(),
                trace,
            ));
        }

        let scored = self.score(subject, &universe, &mut trace).await?;

        let mut merged = generated;
        merged.extend(scored);

        let combined = self.combine(&merged, &mut trace)?;
        let admitted = self.filter(subject, &combined, &mut trace);
        let bins = publisher_bins(admitted);
        let strong = self.extract(subject, bins, &mut trace).await?;

        info!(
            combined = combined.len(),
            publishers = strong.len(),
            strong = strong.values().map(Vec::len).sum::<usize>(),
            "Equivalence run complete"
        );

        Ok(EquivalenceResult::new(
            subject.clone(),
            merged,
            combined,
            strong,
            trace,
        ))
    }

    async fn generate(
        &self,
        subject: &T,
        trace: &mut TraceResult,
    ) -> PipelineResult<Vec<ScoredCandidates<T>>> {
        let outputs = join_all(self.generators.iter().map(|g| g.generate(subject))).await;

        let mut generated = Vec::with_capacity(outputs.len());
        for (generator, output) in self.generators.iter().zip(outputs) {
            let scores = output.inspect_err(|e| {
                warn!(generator = generator.name(), error = %e, "Generator failed");
                trace.record_note(StageKind::Generator, generator.name(), e.to_string());
            })?;

            let source = scores.source().to_string();
            let kept = scores
                .into_candidates()
                .into_iter()
                .filter(|c| !self.excluded_ids.contains(c.id()));
            let scores = ScoredCandidates::from_candidates(source, kept);
            trace.record(StageKind::Generator, generator.name(), scores.candidates());
            generated.push(scores);
        }
        Ok(generated)
    }

    async fn score(
        &self,
        subject: &T,
        universe: &[T],
        trace: &mut TraceResult,
    ) -> PipelineResult<Vec<ScoredCandidates<T>>> {
        let outputs = join_all(self.scorers.iter().map(|s| s.score(subject, universe))).await;

        let mut scored = Vec::with_capacity(outputs.len());
        for (scorer, output) in self.scorers.iter().zip(outputs) {
            let scores = output.inspect_err(|e| {
                warn!(scorer = scorer.name(), error = %e, "Scorer failed");
                trace.record_note(StageKind::Scorer, scorer.name(), e.to_string());
            })?;
            trace.record(StageKind::Scorer, scorer.name(), scores.candidates());
            scored.push(scores);
        }
        Ok(scored)
    }

    fn combine(
        &self,
        merged: &[ScoredCandidates<T>],
        trace: &mut TraceResult,
    ) -> PipelineResult<ScoredCandidates<T>> {
        let combined = if merged.is_empty() {
            ScoredCandidates::empty(EMPTY_COMBINATION_SOURCE)
        } else {
            self.combiner.combine(merged).inspect_err(|e| {
                warn!(combiner = self.combiner.name(), error = %e, "Combiner failed");
                trace.record_note(StageKind::Combiner, self.combiner.name(), e.to_string());
            })?
        };
        trace.record(StageKind::Combiner, self.combiner.name(), combined.candidates());
        Ok(combined)
    }

    /// Admitted candidates, ordered by id so that later score ties break deterministically.
    fn filter(
        &self,
        subject: &T,
        combined: &ScoredCandidates<T>,
        trace: &mut TraceResult,
    ) -> Vec<ScoredCandidate<T>> {
        let mut ordered: Vec<&ScoredCandidate<T>> = combined.candidates().iter().collect();
        ordered.sort_by(|a, b| a.id().cmp(b.id()));

        let admitted: Vec<ScoredCandidate<T>> = ordered
            .into_iter()
            .filter(|c| self.filter.admit(c, subject))
            .cloned()
            .collect();
        debug!(
            combined = combined.len(),
            admitted = admitted.len(),
            "Filtered candidates"
        );
        trace.record(StageKind::Filter, self.filter.name(), &admitted);
        admitted
    }

    /// Runs the extractor chain over each publisher partition on the blocking pool.
    ///
    /// Partitions are processed with bounded concurrency; results and their trace
    /// components are collected back in publisher order.
    async fn extract(
        &self,
        subject: &T,
        bins: BTreeMap<Publisher, Vec<ScoredCandidate<T>>>,
        trace: &mut TraceResult,
    ) -> PipelineResult<BTreeMap<Publisher, Vec<ScoredCandidate<T>>>> {
        let tasks = bins.into_iter().map(|(publisher, candidates)| {
            let extractors = Arc::clone(&self.extractors);
            let subject = subject.clone();
            tokio::task::spawn_blocking(move || {
                let mut local = TraceResult::new();
                let selected = extract_chain(&extractors, &candidates, &subject, &mut local);
                (publisher, selected, local)
            })
        });

        let outcomes: Vec<_> = stream::iter(tasks)
            .buffered(self.extraction_concurrency)
            .collect()
            .await;

        let mut strong = BTreeMap::new();
        for outcome in outcomes {
            let (publisher, selected, local) = outcome?;
            trace.extend(local);
            if !selected.is_empty() {
                debug!(publisher = %publisher, selected = selected.len(), "Extracted strong equivalents");
                strong.insert(publisher, selected);
            }
        }
        Ok(strong)
    }
}

/// First non-empty selection of the chain, or empty.
fn extract_chain<T: EquivalenceContent>(
    extractors: &[SharedExtractor<T>],
    candidates: &[ScoredCandidate<T>],
    subject: &T,
    trace: &mut TraceResult,
) -> Vec<ScoredCandidate<T>> {
    for extractor in extractors {
        let selected = extractor.extract(candidates, subject, trace);
        if !selected.is_empty() {
            return selected;
        }
    }
    Vec::new()
}

/// Distinct candidates across all sources, in first-seen order.
fn candidate_universe<T: EquivalenceContent>(sources: &[ScoredCandidates<T>]) -> Vec<T> {
    let mut seen = HashSet::new();
    sources
        .iter()
        .flat_map(ScoredCandidates::candidates)
        .filter(|c| seen.insert(c.id().clone()))
        .map(|c| c.candidate.clone())
        .collect()
}

/// Groups candidates by publisher, each group sorted highest score first.
fn publisher_bins<T: EquivalenceContent>(
    candidates: Vec<ScoredCandidate<T>>,
) -> BTreeMap<Publisher, Vec<ScoredCandidate<T>>> {
    let mut bins: BTreeMap<Publisher, Vec<ScoredCandidate<T>>> = BTreeMap::new();
    for candidate in candidates {
        bins.entry(candidate.publisher().clone())
            .or_default()
            .push(candidate);
    }
    for bin in bins.values_mut() {
        sort_descending(bin);
    }
    bins
}
