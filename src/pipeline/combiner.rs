use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::content::{ContentId, EquivalenceContent, Publisher};
use crate::score::{Score, ScoredCandidates};

use super::error::PipelineResult;

/// Folds every per-source score for a candidate into one combined score.
pub trait ScoreCombiner<T: EquivalenceContent>: Send + Sync {
    fn name(&self) -> &str;

    /// `sources` is never empty; the pipeline handles the empty case itself.
    fn combine(&self, sources: &[ScoredCandidates<T>]) -> PipelineResult<ScoredCandidates<T>>;
}

fn joined_source<T: EquivalenceContent>(sources: &[ScoredCandidates<T>]) -> String {
    sources
        .iter()
        .map(ScoredCandidates::source)
        .collect::<Vec<_>>()
        .join("/")
}

/// Per-candidate running totals in first-seen order.
struct Tally<T> {
    entries: Vec<(T, Score, usize)>,
    positions: HashMap<ContentId, usize>,
}

impl<T: EquivalenceContent> Tally<T> {
    fn from_sources(sources: &[ScoredCandidates<T>]) -> Self {
        let mut tally = Self {
            entries: Vec::new(),
            positions: HashMap::new(),
        };
        for source in sources {
            for scored in source.candidates() {
                let real = usize::from(scored.score.is_real());
                match tally.positions.get(scored.id()) {
                    Some(&index) => {
                        let entry = &mut tally.entries[index];
                        entry.1 = entry.1 + scored.score;
                        entry.2 += real;
                    }
                    None => {
                        tally
                            .positions
                            .insert(scored.id().clone(), tally.entries.len());
                        tally
                            .entries
                            .push((scored.candidate.clone(), scored.score, real));
                    }
                }
            }
        }
        tally
    }
}

/// Sums all sources per candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddingCombiner;

impl<T: EquivalenceContent> ScoreCombiner<T> for AddingCombiner {
    fn name(&self) -> &str {
        "Adding"
    }

    fn combine(&self, sources: &[ScoredCandidates<T>]) -> PipelineResult<ScoredCandidates<T>> {
        let tally = Tally::from_sources(sources);
        Ok(ScoredCandidates::from_scores(
            joined_source(sources),
            tally.entries.into_iter().map(|(c, score, _)| (c, score)),
        ))
    }
}

/// Averages each candidate's summed score by the number of sources that actually scored
/// candidates from its publisher.
///
/// The divisor is the highest count of real scores seen for any candidate of the same
/// publisher, so a candidate that some scorers returned `NullScore` for is not rewarded for
/// the missing information. With `ignore_null_scoring_candidate`, a candidate whose publisher
/// divisor is 1 (only the generator had an opinion) scores zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullScoreAwareAveragingCombiner {
    ignore_null_scoring_candidate: bool,
}

impl NullScoreAwareAveragingCombiner {
    pub fn new(ignore_null_scoring_candidate: bool) -> Self {
        Self {
            ignore_null_scoring_candidate,
        }
    }
}

impl<T: EquivalenceContent> ScoreCombiner<T> for NullScoreAwareAveragingCombiner {
    fn name(&self) -> &str {
        "Null-score-aware averaging"
    }

    fn combine(&self, sources: &[ScoredCandidates<T>]) -> PipelineResult<ScoredCandidates<T>> {
        let tally = Tally::from_sources(sources);

        let mut publisher_counts: HashMap<Publisher, usize> = HashMap::new();
        for (candidate, _, count) in &tally.entries {
            if *count == 0 {
                continue;
            }
            let max = publisher_counts
                .entry(candidate.publisher().clone())
                .or_default();
            *max = (*max).max(*count);
        }

        let averaged = tally.entries.into_iter().map(|(candidate, sum, _)| {
            let Some(total) = sum.as_f64() else {
                return (candidate, sum);
            };
            let count = publisher_counts
                .get(candidate.publisher())
                .copied()
                .unwrap_or(1);
            if self.ignore_null_scoring_candidate && count == 1 {
                debug!(
                    candidate = %candidate.id(),
                    "Candidate scored only by its generator, setting score to zero"
                );
                return (candidate, Score::ZERO);
            }
            (candidate, Score::value(total / count as f64))
        });

        Ok(ScoredCandidates::from_scores(joined_source(sources), averaged))
    }
}

/// Requires a score above `threshold` from at least one of the named sources; candidates
/// without one are set to `NullScore` after the delegate has combined.
pub struct RequiredScoreFilteringCombiner<T: EquivalenceContent> {
    delegate: Arc<dyn ScoreCombiner<T>>,
    sources: BTreeSet<String>,
    threshold: f64,
    name: String,
}

impl<T: EquivalenceContent> RequiredScoreFilteringCombiner<T> {
    pub fn new(
        delegate: Arc<dyn ScoreCombiner<T>>,
        sources: impl IntoIterator<Item = impl Into<String>>,
        threshold: f64,
    ) -> Self {
        let sources: BTreeSet<String> = sources.into_iter().map(Into::into).collect();
        let name = format!(
            "{} requiring [{}]",
            delegate.name(),
            sources.iter().cloned().collect::<Vec<_>>().join(", ")
        );
        Self {
            delegate,
            sources,
            threshold,
            name,
        }
    }

    /// Requires a strictly positive score.
    pub fn positive(
        delegate: Arc<dyn ScoreCombiner<T>>,
        sources: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self::new(delegate, sources, 0.0)
    }
}

impl<T: EquivalenceContent> fmt::Debug for RequiredScoreFilteringCombiner<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequiredScoreFilteringCombiner")
            .field("delegate", &self.delegate.name())
            .field("sources", &self.sources)
            .field("threshold", &self.threshold)
            .finish()
    }
}

impl<T: EquivalenceContent> ScoreCombiner<T> for RequiredScoreFilteringCombiner<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn combine(&self, sources: &[ScoredCandidates<T>]) -> PipelineResult<ScoredCandidates<T>> {
        let combined = self.delegate.combine(sources)?;

        let required: Vec<&ScoredCandidates<T>> = sources
            .iter()
            .filter(|s| self.sources.contains(s.source()))
            .collect();
        if required.is_empty() {
            debug!(sources = ?self.sources, "No required scores found");
            return Ok(combined);
        }

        let source = combined.source().to_string();
        let filtered = combined.into_candidates().into_iter().map(|scored| {
            let satisfied = required
                .iter()
                .any(|s| s.score_for(scored.id()).above(self.threshold));
            if satisfied {
                (scored.candidate, scored.score)
            } else {
                debug!(candidate = %scored.id(), "Required score missing, setting to null");
                (scored.candidate, Score::Null)
            }
        });
        Ok(ScoredCandidates::from_scores(source, filtered))
    }
}
