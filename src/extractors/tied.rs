use serde::{Deserialize, Serialize};

use crate::content::EquivalenceContent;
use crate::score::ScoredCandidate;
use crate::trace::TraceResult;

use super::{EquivalenceExtractor, format_threshold, recorded};

/// Which candidates may take part in a tie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieScope {
    /// The tie is measured at the top of the whole list.
    #[default]
    AnyPublisher,
    /// The high score is taken from the first candidate sharing the subject's publisher, and
    /// every candidate from that publisher at that score is selected, even a lone one.
    SubjectPublisher,
}

/// Selects the candidates at the high score, provided the high score reaches the threshold.
///
/// Across all publishers only a genuine tie of two or more candidates counts.
#[derive(Debug, Clone)]
pub struct AllTiedAtTop {
    threshold: f64,
    scope: TieScope,
    name: String,
}

impl AllTiedAtTop {
    pub fn new(threshold: f64, scope: TieScope) -> Self {
        let name = match scope {
            TieScope::AnyPublisher => {
                format!("All tied at top >= {}", format_threshold(threshold))
            }
            TieScope::SubjectPublisher => format!(
                "All tied at top with subject publisher >= {}",
                format_threshold(threshold)
            ),
        };
        Self {
            threshold,
            scope,
            name,
        }
    }

    pub fn any_publisher(threshold: f64) -> Self {
        Self::new(threshold, TieScope::AnyPublisher)
    }

    pub fn subject_publisher(threshold: f64) -> Self {
        Self::new(threshold, TieScope::SubjectPublisher)
    }

    pub fn scope(&self) -> TieScope {
        self.scope
    }

    fn select<T: EquivalenceContent>(
        &self,
        candidates: &[ScoredCandidate<T>],
        subject: &T,
    ) -> Vec<ScoredCandidate<T>> {
        let high = match self.scope {
            TieScope::AnyPublisher => candidates.first(),
            TieScope::SubjectPublisher => candidates
                .iter()
                .find(|c| c.publisher() == subject.publisher()),
        };
        let Some(high) = high else {
            return Vec::new();
        };
        if !high.score.at_least(self.threshold) {
            return Vec::new();
        }

        let tied: Vec<ScoredCandidate<T>> = candidates
            .iter()
            .filter(|c| c.score == high.score)
            .filter(|c| match self.scope {
                TieScope::AnyPublisher => true,
                TieScope::SubjectPublisher => c.publisher() == high.publisher(),
            })
            .cloned()
            .collect();

        if self.scope == TieScope::AnyPublisher && tied.len() < 2 {
            return Vec::new();
        }
        tied
    }
}

impl<T: EquivalenceContent> EquivalenceExtractor<T> for AllTiedAtTop {
    fn name(&self) -> &str {
        &self.name
    }

    fn extract(
        &self,
        candidates: &[ScoredCandidate<T>],
        subject: &T,
        trace: &mut TraceResult,
    ) -> Vec<ScoredCandidate<T>> {
        recorded(trace, &self.name, self.select(candidates, subject))
    }
}
