use crate::content::EquivalenceContent;
use crate::score::ScoredCandidate;
use crate::trace::TraceResult;

use super::{EquivalenceExtractor, recorded};

/// Unconditionally selects the highest-scoring candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct TopExtractor;

impl<T: EquivalenceContent> EquivalenceExtractor<T> for TopExtractor {
    fn name(&self) -> &str {
        "Top"
    }

    fn extract(
        &self,
        candidates: &[ScoredCandidate<T>],
        _subject: &T,
        trace: &mut TraceResult,
    ) -> Vec<ScoredCandidate<T>> {
        let selected = candidates.first().cloned().into_iter().collect();
        recorded(trace, "Top", selected)
    }
}

/// Selects nothing. Used to switch a publisher off explicitly.
#[derive(Debug, Clone, Copy, Default)]
pub struct NothingExtractor;

impl<T: EquivalenceContent> EquivalenceExtractor<T> for NothingExtractor {
    fn name(&self) -> &str {
        "Nothing"
    }

    fn extract(
        &self,
        _candidates: &[ScoredCandidate<T>],
        _subject: &T,
        trace: &mut TraceResult,
    ) -> Vec<ScoredCandidate<T>> {
        recorded(trace, "Nothing", Vec::new())
    }
}
