use std::collections::HashMap;
use std::collections::hash_map::Entry;

use serde::{Deserialize, Serialize};

use crate::content::{ContentId, EquivalenceContent, Publisher};

use super::types::Score;

/// A candidate paired with its score. Equality is candidate identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredCandidate<T> {
    pub candidate: T,
    pub score: Score,
}

impl<T: EquivalenceContent> ScoredCandidate<T> {
    pub fn new(candidate: T, score: Score) -> Self {
        Self { candidate, score }
    }

    pub fn id(&self) -> &ContentId {
        self.candidate.id()
    }

    pub fn publisher(&self) -> &Publisher {
        self.candidate.publisher()
    }
}

impl<T: EquivalenceContent> PartialEq for ScoredCandidate<T> {
    fn eq(&self, other: &Self) -> bool {
        self.candidate.id() == other.candidate.id()
    }
}

impl<T: EquivalenceContent> Eq for ScoredCandidate<T> {}

/// Stable sort, highest score first. Ties keep their incoming order.
pub fn sort_descending<T>(candidates: &mut [ScoredCandidate<T>]) {
    candidates.sort_by(|a, b| b.score.cmp(&a.score));
}

/// Per-candidate scores attributed to one named source (generator, scorer or combiner).
///
/// Each candidate appears at most once. Insertion order is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredCandidates<T> {
    source: String,
    candidates: Vec<ScoredCandidate<T>>,
}

impl<T: EquivalenceContent> ScoredCandidates<T> {
    pub fn empty(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            candidates: Vec::new(),
        }
    }

    /// Builds a source from scored pairs. A repeated candidate keeps its higher score.
    pub fn from_scores<I>(source: impl Into<String>, scores: I) -> Self
    where
        I: IntoIterator<Item = (T, Score)>,
    {
        let mut candidates: Vec<ScoredCandidate<T>> = Vec::new();
        let mut positions: HashMap<ContentId, usize> = HashMap::new();

        for (candidate, score) in scores {
            match positions.entry(candidate.id().clone()) {
                Entry::Occupied(slot) => {
                    let existing = &mut candidates[*slot.get()];
                    if score > existing.score {
                        existing.score = score;
                    }
                }
                Entry::Vacant(slot) => {
                    slot.insert(candidates.len());
                    candidates.push(ScoredCandidate::new(candidate, score));
                }
            }
        }

        Self {
            source: source.into(),
            candidates,
        }
    }

    pub fn from_candidates<I>(source: impl Into<String>, candidates: I) -> Self
    where
        I: IntoIterator<Item = ScoredCandidate<T>>,
    {
        Self::from_scores(source, candidates.into_iter().map(|c| (c.candidate, c.score)))
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn candidates(&self) -> &[ScoredCandidate<T>] {
        &self.candidates
    }

    pub fn into_candidates(self) -> Vec<ScoredCandidate<T>> {
        self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn contains(&self, id: &ContentId) -> bool {
        self.candidates.iter().any(|c| c.id() == id)
    }

    /// Score this source gave `id`, or [`Score::Null`] if it did not score it.
    pub fn score_for(&self, id: &ContentId) -> Score {
        self.candidates
            .iter()
            .find(|c| c.id() == id)
            .map_or(Score::Null, |c| c.score)
    }

    /// Candidates, highest score first.
    pub fn ordered(&self) -> Vec<ScoredCandidate<T>> {
        let mut ordered = self.candidates.clone();
        sort_descending(&mut ordered);
        ordered
    }

    /// Same candidates under a different source name.
    pub fn renamed(self, source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            candidates: self.candidates,
        }
    }
}
