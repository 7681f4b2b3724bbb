use crate::content::EquivalenceContent;
use crate::score::ScoredCandidate;
use crate::trace::TraceResult;

use super::{EquivalenceExtractor, format_threshold, recorded};

/// Selects the top candidate when it holds strictly more than `threshold` of the total
/// positive score mass.
#[derive(Debug, Clone)]
pub struct PercentOfTotal {
    threshold: f64,
    name: String,
}

impl PercentOfTotal {
    /// `threshold` is a fraction, e.g. `0.9` for 90%.
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            name: format!("Percent of total > {}", format_threshold(threshold)),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    fn select<T: EquivalenceContent>(
        &self,
        candidates: &[ScoredCandidate<T>],
    ) -> Option<ScoredCandidate<T>> {
        let top = candidates.first()?;
        let top_score = top.score.as_f64()?;
        let total: f64 = candidates
            .iter()
            .filter_map(|c| c.score.as_f64())
            .filter(|v| *v > 0.0)
            .sum();
        if total <= 0.0 {
            return None;
        }
        (top_score / total > self.threshold).then(|| top.clone())
    }
}

impl<T: EquivalenceContent> EquivalenceExtractor<T> for PercentOfTotal {
    fn name(&self) -> &str {
        &self.name
    }

    fn extract(
        &self,
        candidates: &[ScoredCandidate<T>],
        _subject: &T,
        trace: &mut TraceResult,
    ) -> Vec<ScoredCandidate<T>> {
        let selected = self.select(candidates).into_iter().collect();
        recorded(trace, &self.name, selected)
    }
}

/// Selects the top candidate when it beats the runner-up by at least a multiplier.
#[derive(Debug, Clone)]
pub struct PercentAboveNextBest {
    multiplier: f64,
    name: String,
}

impl PercentAboveNextBest {
    pub fn new(multiplier: f64) -> Self {
        Self {
            multiplier,
            name: format!(
                "Top at least {} times next best",
                format_threshold(multiplier)
            ),
        }
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    fn select<T: EquivalenceContent>(
        &self,
        candidates: &[ScoredCandidate<T>],
    ) -> Option<ScoredCandidate<T>> {
        match candidates {
            [] => None,
            [only] => Some(only.clone()),
            [top, next, ..] => {
                let top_score = top.score.as_f64()?;
                let Some(next_score) = next.score.as_f64() else {
                    return Some(top.clone());
                };
                // A zero runner-up gives an infinite ratio (or NaN for 0/0, which rejects).
                (top_score / next_score >= self.multiplier).then(|| top.clone())
            }
        }
    }
}

impl<T: EquivalenceContent> EquivalenceExtractor<T> for PercentAboveNextBest {
    fn name(&self) -> &str {
        &self.name
    }

    fn extract(
        &self,
        candidates: &[ScoredCandidate<T>],
        _subject: &T,
        trace: &mut TraceResult,
    ) -> Vec<ScoredCandidate<T>> {
        let selected = self.select(candidates).into_iter().collect();
        recorded(trace, &self.name, selected)
    }
}
