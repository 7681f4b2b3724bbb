use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::content::{ContentId, EquivalenceContent};
use crate::score::ScoredCandidate;

/// Boolean admissibility check applied to combined candidates before extraction.
pub trait EquivalenceFilter<T: EquivalenceContent>: Send + Sync {
    fn name(&self) -> &str;

    fn admit(&self, candidate: &ScoredCandidate<T>, subject: &T) -> bool;
}

/// Admits real scores at or above a minimum.
#[derive(Debug, Clone)]
pub struct MinimumScoreFilter {
    minimum: f64,
    name: String,
}

impl MinimumScoreFilter {
    pub fn new(minimum: f64) -> Self {
        Self {
            minimum,
            name: format!("Minimum score {}", minimum),
        }
    }
}

impl<T: EquivalenceContent> EquivalenceFilter<T> for MinimumScoreFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn admit(&self, candidate: &ScoredCandidate<T>, _subject: &T) -> bool {
        candidate.score.at_least(self.minimum)
    }
}

/// Rejects explicitly excluded candidate ids.
#[derive(Debug, Clone, Default)]
pub struct ExclusionListFilter {
    excluded: HashSet<ContentId>,
}

impl ExclusionListFilter {
    pub fn new(excluded: impl IntoIterator<Item = ContentId>) -> Self {
        Self {
            excluded: excluded.into_iter().collect(),
        }
    }
}

impl<T: EquivalenceContent> EquivalenceFilter<T> for ExclusionListFilter {
    fn name(&self) -> &str {
        "Exclusion list"
    }

    fn admit(&self, candidate: &ScoredCandidate<T>, _subject: &T) -> bool {
        !self.excluded.contains(candidate.id())
    }
}

/// Rejects candidates from the subject's own publisher.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotSamePublisherFilter;

impl<T: EquivalenceContent> EquivalenceFilter<T> for NotSamePublisherFilter {
    fn name(&self) -> &str {
        "Not same publisher"
    }

    fn admit(&self, candidate: &ScoredCandidate<T>, subject: &T) -> bool {
        candidate.publisher() != subject.publisher()
    }
}

/// Admits only what every inner filter admits. With no inner filters, admits everything.
pub struct ConjunctiveFilter<T: EquivalenceContent> {
    filters: Vec<Arc<dyn EquivalenceFilter<T>>>,
}

impl<T: EquivalenceContent> ConjunctiveFilter<T> {
    pub fn new(filters: Vec<Arc<dyn EquivalenceFilter<T>>>) -> Self {
        Self { filters }
    }

    pub fn admit_all() -> Self {
        Self::new(Vec::new())
    }
}

impl<T: EquivalenceContent> fmt::Debug for ConjunctiveFilter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.filters.iter().map(|filter| filter.name()).collect();
        f.debug_struct("ConjunctiveFilter")
            .field("filters", &names)
            .finish()
    }
}

impl<T: EquivalenceContent> EquivalenceFilter<T> for ConjunctiveFilter<T> {
    fn name(&self) -> &str {
        "Conjunctive"
    }

    fn admit(&self, candidate: &ScoredCandidate<T>, subject: &T) -> bool {
        self.filters.iter().all(|f| f.admit(candidate, subject))
    }
}

type Predicate<T> = dyn Fn(&ScoredCandidate<T>, &T) -> bool + Send + Sync;

/// Wraps an arbitrary predicate.
pub struct PredicateFilter<T: EquivalenceContent> {
    name: String,
    predicate: Arc<Predicate<T>>,
}

impl<T: EquivalenceContent> PredicateFilter<T> {
    pub fn new<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&ScoredCandidate<T>, &T) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            predicate: Arc::new(predicate),
        }
    }
}

impl<T: EquivalenceContent> fmt::Debug for PredicateFilter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateFilter")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<T: EquivalenceContent> EquivalenceFilter<T> for PredicateFilter<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn admit(&self, candidate: &ScoredCandidate<T>, subject: &T) -> bool {
        (self.predicate)(candidate, subject)
    }
}
