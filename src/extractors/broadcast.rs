use chrono::Duration;

use crate::constants::{MULTIPLE_CANDIDATE_SCORE_WINDOW, broadcast_time_flexibility};
use crate::content::{Broadcast, EquivalenceContent};
use crate::score::ScoredCandidate;
use crate::trace::TraceResult;

use super::{EquivalenceExtractor, recorded};

const NAME: &str = "Multiple Candidate Extractor";

/// Accepts several items from one publisher when they score close to the top candidate and
/// were broadcast in the same slot as the subject.
///
/// Containers are never grouped: a brand or series subject, or a container at the top of the
/// list, selects nothing. The result is only returned when it holds more than one candidate,
/// otherwise a later extractor in the chain decides. The audit trail records the kept set
/// either way.
#[derive(Debug, Clone)]
pub struct MultipleCandidateExtractor {
    score_window: f64,
    flexibility: Duration,
}

impl Default for MultipleCandidateExtractor {
    fn default() -> Self {
        Self {
            score_window: MULTIPLE_CANDIDATE_SCORE_WINDOW,
            flexibility: broadcast_time_flexibility(),
        }
    }
}

impl MultipleCandidateExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// `inner` lies within `outer`, each edge widened by the flexibility. Strict on both ends.
    fn contained(&self, inner: &Broadcast, outer: &Broadcast) -> bool {
        inner.transmission_start > outer.transmission_start - self.flexibility
            && inner.transmission_end < outer.transmission_end + self.flexibility
    }

    fn broadcasts_match<T: EquivalenceContent>(&self, subject: &T, candidate: &T) -> bool {
        let contains = |outer: &T, inner: &T| {
            outer.broadcasts().iter().any(|o| {
                inner
                    .broadcasts()
                    .iter()
                    .any(|i| self.contained(i, o))
            })
        };
        contains(subject, candidate) || contains(candidate, subject)
    }

    /// The top candidate plus every close candidate in the subject's slot.
    fn kept<T: EquivalenceContent>(
        &self,
        candidates: &[ScoredCandidate<T>],
        subject: &T,
    ) -> Vec<ScoredCandidate<T>> {
        if subject.is_container() {
            return Vec::new();
        }
        let Some(top) = candidates.first() else {
            return Vec::new();
        };
        if top.candidate.is_container() {
            return Vec::new();
        }

        let mut selected = vec![top.clone()];
        for candidate in &candidates[1..] {
            if candidate.candidate.is_container() || selected.contains(candidate) {
                continue;
            }
            let close = candidate
                .score
                .difference(&top.score)
                .is_some_and(|d| d.abs() < self.score_window);
            if close && self.broadcasts_match(subject, &candidate.candidate) {
                selected.push(candidate.clone());
            }
        }

        selected
    }
}

impl<T: EquivalenceContent> EquivalenceExtractor<T> for MultipleCandidateExtractor {
    fn name(&self) -> &str {
        NAME
    }

    fn extract(
        &self,
        candidates: &[ScoredCandidate<T>],
        subject: &T,
        trace: &mut TraceResult,
    ) -> Vec<ScoredCandidate<T>> {
        let kept = recorded(trace, NAME, self.kept(candidates, subject));
        if kept.len() > 1 { kept } else { Vec::new() }
    }
}
