//! Candidate-selection strategies.
//!
//! An extractor receives one publisher's candidates, sorted highest score first, and the
//! subject, and returns the subset it judges equivalent. Extractors never fail: empty input,
//! `NullScore`s and missing matches all degrade to selecting nothing. Each invocation
//! appends exactly one [`StageKind::Extractor`] component to the trace (composites
//! additionally let their delegates record theirs).

pub mod basic;
pub mod broadcast;
pub mod composite;
pub mod config;
pub mod music;
pub mod percent;
pub mod threshold;
pub mod tied;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use crate::content::EquivalenceContent;
use crate::score::ScoredCandidate;
use crate::trace::{StageKind, TraceResult};

pub use basic::{NothingExtractor, TopExtractor};
pub use broadcast::MultipleCandidateExtractor;
pub use composite::{ContinueUntilOneWorks, ExcludePublisherThenExtract, RemoveAndCombine};
pub use config::ExtractorConfig;
pub use music::MusicExtractor;
pub use percent::{PercentAboveNextBest, PercentOfTotal};
pub use threshold::{
    AllOverOrEqHighestMatchingThreshold, AllOverOrEqThreshold, MultiStageAllOverOrEqThreshold,
};
pub use tied::{AllTiedAtTop, TieScope};

/// Selects confirmed equivalents from a single publisher's ranked candidate list.
pub trait EquivalenceExtractor<T: EquivalenceContent>: Send + Sync {
    /// Label used in the audit trail and logs.
    fn name(&self) -> &str;

    /// `candidates` must belong to one publisher and be sorted descending by score.
    fn extract(
        &self,
        candidates: &[ScoredCandidate<T>],
        subject: &T,
        trace: &mut TraceResult,
    ) -> Vec<ScoredCandidate<T>>;
}

/// Shared, thread-safe extractor handle.
pub type SharedExtractor<T> = Arc<dyn EquivalenceExtractor<T>>;

/// Appends the extractor component for one invocation and hands the selection back.
pub(crate) fn recorded<T: EquivalenceContent>(
    trace: &mut TraceResult,
    name: &str,
    selected: Vec<ScoredCandidate<T>>,
) -> Vec<ScoredCandidate<T>> {
    trace.record(StageKind::Extractor, name, &selected);
    selected
}

/// Renders a threshold the way the extractor names embed it.
pub(crate) fn format_threshold(threshold: f64) -> String {
    format!("{}", threshold)
}
