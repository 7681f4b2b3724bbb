use std::collections::BTreeMap;

use serde::Serialize;

use crate::content::{ContentId, EquivalenceContent, Publisher};
use crate::score::{ScoredCandidate, ScoredCandidates};
use crate::trace::TraceResult;

/// Outcome of one equivalence run for one subject. Built once, never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct EquivalenceResult<T> {
    subject: T,
    raw_scores: Vec<ScoredCandidates<T>>,
    combined: ScoredCandidates<T>,
    strong_equivalences: BTreeMap<Publisher, Vec<ScoredCandidate<T>>>,
    trace: TraceResult,
}

impl<T: EquivalenceContent> EquivalenceResult<T> {
    pub fn new(
        subject: T,
        raw_scores: Vec<ScoredCandidates<T>>,
        combined: ScoredCandidates<T>,
        strong_equivalences: BTreeMap<Publisher, Vec<ScoredCandidate<T>>>,
        trace: TraceResult,
    ) -> Self {
        Self {
            subject,
            raw_scores,
            combined,
            strong_equivalences,
            trace,
        }
    }

    pub fn subject(&self) -> &T {
        &self.subject
    }

    /// Per-source scores from generators and scorers, in the order they ran.
    pub fn raw_scores(&self) -> &[ScoredCandidates<T>] {
        &self.raw_scores
    }

    pub fn combined(&self) -> &ScoredCandidates<T> {
        &self.combined
    }

    pub fn strong_equivalences(&self) -> &BTreeMap<Publisher, Vec<ScoredCandidate<T>>> {
        &self.strong_equivalences
    }

    pub fn strong_equivalences_for(&self, publisher: &Publisher) -> &[ScoredCandidate<T>] {
        self.strong_equivalences
            .get(publisher)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn has_strong_equivalences(&self) -> bool {
        self.strong_equivalences.values().any(|v| !v.is_empty())
    }

    /// Ids of every strong equivalence, publisher by publisher.
    pub fn strong_ids(&self) -> Vec<&ContentId> {
        self.strong_equivalences
            .values()
            .flatten()
            .map(|c| c.id())
            .collect()
    }

    pub fn combined_candidates_present(&self) -> bool {
        !self.combined.is_empty()
    }

    pub fn trace(&self) -> &TraceResult {
        &self.trace
    }
}
