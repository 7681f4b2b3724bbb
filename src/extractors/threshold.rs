use crate::content::EquivalenceContent;
use crate::score::ScoredCandidate;
use crate::trace::TraceResult;

use super::{EquivalenceExtractor, format_threshold, recorded};

fn all_at_least<T: EquivalenceContent>(
    candidates: &[ScoredCandidate<T>],
    threshold: f64,
) -> Vec<ScoredCandidate<T>> {
    candidates
        .iter()
        .filter(|c| c.score.at_least(threshold))
        .cloned()
        .collect()
}

/// Thresholds highest first, duplicates removed.
fn descending(thresholds: impl IntoIterator<Item = f64>) -> Vec<f64> {
    let mut sorted: Vec<f64> = thresholds.into_iter().collect();
    sorted.sort_by(|a, b| b.total_cmp(a));
    sorted.dedup();
    sorted
}

fn describe(thresholds: &[f64]) -> String {
    thresholds
        .iter()
        .map(|t| format_threshold(*t))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Selects every candidate scoring `>= threshold`.
#[derive(Debug, Clone)]
pub struct AllOverOrEqThreshold {
    threshold: f64,
    name: String,
}

impl AllOverOrEqThreshold {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            name: format!("All over or equal {}", format_threshold(threshold)),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl<T: EquivalenceContent> EquivalenceExtractor<T> for AllOverOrEqThreshold {
    fn name(&self) -> &str {
        &self.name
    }

    fn extract(
        &self,
        candidates: &[ScoredCandidate<T>],
        _subject: &T,
        trace: &mut TraceResult,
    ) -> Vec<ScoredCandidate<T>> {
        recorded(trace, &self.name, all_at_least(candidates, self.threshold))
    }
}

/// Picks the highest threshold the best real score reaches, then selects every candidate
/// at or above it.
#[derive(Debug, Clone)]
pub struct AllOverOrEqHighestMatchingThreshold {
    thresholds: Vec<f64>,
    name: String,
}

impl AllOverOrEqHighestMatchingThreshold {
    pub fn new(thresholds: impl IntoIterator<Item = f64>) -> Self {
        let thresholds = descending(thresholds);
        let name = format!(
            "All over or equal highest matching threshold [{}]",
            describe(&thresholds)
        );
        Self { thresholds, name }
    }

    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }
}

impl<T: EquivalenceContent> EquivalenceExtractor<T> for AllOverOrEqHighestMatchingThreshold {
    fn name(&self) -> &str {
        &self.name
    }

    fn extract(
        &self,
        candidates: &[ScoredCandidate<T>],
        _subject: &T,
        trace: &mut TraceResult,
    ) -> Vec<ScoredCandidate<T>> {
        let highest = candidates
            .iter()
            .filter_map(|c| c.score.as_f64())
            .max_by(|a, b| a.total_cmp(b));

        let chosen = highest.and_then(|highest| {
            self.thresholds
                .iter()
                .copied()
                .find(|threshold| *threshold <= highest)
        });

        let selected = match chosen {
            Some(threshold) => all_at_least(candidates, threshold),
            None => Vec::new(),
        };
        recorded(trace, &self.name, selected)
    }
}

/// Tries each threshold from highest to lowest and returns the first non-empty
/// "all at or above" selection.
#[derive(Debug, Clone)]
pub struct MultiStageAllOverOrEqThreshold {
    thresholds: Vec<f64>,
    name: String,
}

impl MultiStageAllOverOrEqThreshold {
    pub fn new(thresholds: impl IntoIterator<Item = f64>) -> Self {
        let thresholds = descending(thresholds);
        let name = format!(
            "Multi-stage all over or equal [{}]",
            describe(&thresholds)
        );
        Self { thresholds, name }
    }

    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }
}

impl<T: EquivalenceContent> EquivalenceExtractor<T> for MultiStageAllOverOrEqThreshold {
    fn name(&self) -> &str {
        &self.name
    }

    fn extract(
        &self,
        candidates: &[ScoredCandidate<T>],
        _subject: &T,
        trace: &mut TraceResult,
    ) -> Vec<ScoredCandidate<T>> {
        let selected = self
            .thresholds
            .iter()
            .map(|threshold| all_at_least(candidates, *threshold))
            .find(|selection| !selection.is_empty())
            .unwrap_or_default();
        recorded(trace, &self.name, selected)
    }
}
