use std::collections::BTreeSet;
use std::fmt;

use crate::content::{EquivalenceContent, Publisher};
use crate::score::ScoredCandidate;
use crate::trace::TraceResult;

use super::{EquivalenceExtractor, SharedExtractor, recorded};

/// Drops candidates from the excluded publishers, then delegates.
pub struct ExcludePublisherThenExtract<T: EquivalenceContent> {
    excluded: BTreeSet<Publisher>,
    delegate: SharedExtractor<T>,
    name: String,
}

impl<T: EquivalenceContent> ExcludePublisherThenExtract<T> {
    pub fn new(excluded: impl IntoIterator<Item = Publisher>, delegate: SharedExtractor<T>) -> Self {
        let excluded: BTreeSet<Publisher> = excluded.into_iter().collect();
        let keys: Vec<&str> = excluded.iter().map(Publisher::key).collect();
        let name = format!("Exclude [{}] then {}", keys.join(", "), delegate.name());
        Self {
            excluded,
            delegate,
            name,
        }
    }

    pub fn excluded(&self) -> &BTreeSet<Publisher> {
        &self.excluded
    }
}

impl<T: EquivalenceContent> fmt::Debug for ExcludePublisherThenExtract<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExcludePublisherThenExtract")
            .field("excluded", &self.excluded)
            .field("delegate", &self.delegate.name())
            .finish()
    }
}

impl<T: EquivalenceContent> EquivalenceExtractor<T> for ExcludePublisherThenExtract<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn extract(
        &self,
        candidates: &[ScoredCandidate<T>],
        subject: &T,
        trace: &mut TraceResult,
    ) -> Vec<ScoredCandidate<T>> {
        let remaining: Vec<ScoredCandidate<T>> = candidates
            .iter()
            .filter(|c| !self.excluded.contains(c.publisher()))
            .cloned()
            .collect();
        let selected = self.delegate.extract(&remaining, subject, trace);
        recorded(trace, &self.name, selected)
    }
}

/// Runs `first`, removes what it selected, runs `second` on the rest and returns both
/// selections.
pub struct RemoveAndCombine<T: EquivalenceContent> {
    first: SharedExtractor<T>,
    second: SharedExtractor<T>,
    name: String,
}

impl<T: EquivalenceContent> RemoveAndCombine<T> {
    pub fn new(first: SharedExtractor<T>, second: SharedExtractor<T>) -> Self {
        let name = format!("Remove {} and combine {}", first.name(), second.name());
        Self {
            first,
            second,
            name,
        }
    }
}

impl<T: EquivalenceContent> fmt::Debug for RemoveAndCombine<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoveAndCombine")
            .field("first", &self.first.name())
            .field("second", &self.second.name())
            .finish()
    }
}

impl<T: EquivalenceContent> EquivalenceExtractor<T> for RemoveAndCombine<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn extract(
        &self,
        candidates: &[ScoredCandidate<T>],
        subject: &T,
        trace: &mut TraceResult,
    ) -> Vec<ScoredCandidate<T>> {
        let mut selected = self.first.extract(candidates, subject, trace);
        let remaining: Vec<ScoredCandidate<T>> = candidates
            .iter()
            .filter(|c| !selected.contains(c))
            .cloned()
            .collect();
        for candidate in self.second.extract(&remaining, subject, trace) {
            if !selected.contains(&candidate) {
                selected.push(candidate);
            }
        }
        recorded(trace, &self.name, selected)
    }
}

/// Returns the first non-empty selection among the delegates, in order.
pub struct ContinueUntilOneWorks<T: EquivalenceContent> {
    delegates: Vec<SharedExtractor<T>>,
    name: String,
}

impl<T: EquivalenceContent> ContinueUntilOneWorks<T> {
    pub fn new(delegates: Vec<SharedExtractor<T>>) -> Self {
        let names: Vec<&str> = delegates.iter().map(|d| d.name()).collect();
        let name = format!("Continue until one works [{}]", names.join(", "));
        Self { delegates, name }
    }

    pub fn len(&self) -> usize {
        self.delegates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delegates.is_empty()
    }
}

impl<T: EquivalenceContent> fmt::Debug for ContinueUntilOneWorks<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContinueUntilOneWorks")
            .field("delegates", &self.delegates.len())
            .finish()
    }
}

impl<T: EquivalenceContent> EquivalenceExtractor<T> for ContinueUntilOneWorks<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn extract(
        &self,
        candidates: &[ScoredCandidate<T>],
        subject: &T,
        trace: &mut TraceResult,
    ) -> Vec<ScoredCandidate<T>> {
        let mut selected = Vec::new();
        for delegate in &self.delegates {
            selected = delegate.extract(candidates, subject, trace);
            if !selected.is_empty() {
                break;
            }
        }
        recorded(trace, &self.name, selected)
    }
}
