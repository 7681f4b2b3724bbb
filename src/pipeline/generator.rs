use std::collections::{HashMap, HashSet};
use std::fmt;

use async_trait::async_trait;

use crate::content::{ContentId, EquivalenceContent};
use crate::score::{Score, ScoredCandidates};

use super::error::PipelineResult;

/// Proposes candidates for a subject, each with an initial score.
#[async_trait]
pub trait EquivalenceGenerator<T: EquivalenceContent>: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, subject: &T) -> PipelineResult<ScoredCandidates<T>>;
}

/// Scores a subject against a fixed candidate universe.
#[async_trait]
pub trait EquivalenceScorer<T: EquivalenceContent>: Send + Sync {
    fn name(&self) -> &str;

    async fn score(&self, subject: &T, candidates: &[T]) -> PipelineResult<ScoredCandidates<T>>;
}

/// Replays precomputed per-subject scores for one named source.
///
/// Acts as a generator (every recorded candidate) and as a scorer (only recorded candidates
/// that are in the universe it is handed).
#[derive(Clone)]
pub struct ReplayedScores<T> {
    name: String,
    scores: HashMap<ContentId, Vec<(T, Score)>>,
}

impl<T: EquivalenceContent> ReplayedScores<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scores: HashMap::new(),
        }
    }

    pub fn with_score(mut self, subject: &ContentId, candidate: T, score: Score) -> Self {
        self.insert(subject, candidate, score);
        self
    }

    pub fn insert(&mut self, subject: &ContentId, candidate: T, score: Score) {
        self.scores
            .entry(subject.clone())
            .or_default()
            .push((candidate, score));
    }

    pub fn subjects(&self) -> impl Iterator<Item = &ContentId> {
        self.scores.keys()
    }

    fn recorded_for(&self, subject: &T) -> &[(T, Score)] {
        self.scores
            .get(subject.id())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl<T> fmt::Debug for ReplayedScores<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplayedScores")
            .field("name", &self.name)
            .field("subjects", &self.scores.len())
            .finish()
    }
}

#[async_trait]
impl<T: EquivalenceContent> EquivalenceGenerator<T> for ReplayedScores<T> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, subject: &T) -> PipelineResult<ScoredCandidates<T>> {
        Ok(ScoredCandidates::from_scores(
            self.name.clone(),
            self.recorded_for(subject).iter().cloned(),
        ))
    }
}

#[async_trait]
impl<T: EquivalenceContent> EquivalenceScorer<T> for ReplayedScores<T> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn score(&self, subject: &T, candidates: &[T]) -> PipelineResult<ScoredCandidates<T>> {
        let universe: HashSet<&ContentId> = candidates.iter().map(|c| c.id()).collect();
        let scored = self
            .recorded_for(subject)
            .iter()
            .filter(|(candidate, _)| universe.contains(candidate.id()))
            .cloned();
        Ok(ScoredCandidates::from_scores(self.name.clone(), scored))
    }
}
