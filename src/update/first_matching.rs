use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use crate::content::EquivalenceContent;
use crate::pipeline::EquivalenceResult;

use super::error::{UpdateError, UpdateResult};
use super::updater::EquivalenceResultUpdater;

type ResultPredicate<T> = dyn Fn(&EquivalenceResult<T>) -> bool + Send + Sync;

/// Tries alternative result updaters in order and returns the first result the predicate
/// accepts.
///
/// When no result is accepted, the last updater's result is returned anyway. Callers that
/// need a guaranteed match must check the predicate themselves.
pub struct FirstMatchingPredicateUpdater<T: EquivalenceContent> {
    name: String,
    delegates: Vec<Arc<dyn EquivalenceResultUpdater<T>>>,
    predicate_name: String,
    predicate: Arc<ResultPredicate<T>>,
}

impl<T: EquivalenceContent> FirstMatchingPredicateUpdater<T> {
    pub fn new<P>(
        delegates: Vec<Arc<dyn EquivalenceResultUpdater<T>>>,
        predicate_name: impl Into<String>,
        predicate: P,
    ) -> UpdateResult<Self>
    where
        P: Fn(&EquivalenceResult<T>) -> bool + Send + Sync + 'static,
    {
        if delegates.is_empty() {
            return Err(UpdateError::invalid_config(
                "first-matching-predicate updater needs at least one delegate",
            ));
        }
        let predicate_name = predicate_name.into();
        let names: Vec<&str> = delegates.iter().map(|d| d.name()).collect();
        let name = format!("First matching {} of [{}]", predicate_name, names.join(", "));
        Ok(Self {
            name,
            delegates,
            predicate_name,
            predicate: Arc::new(predicate),
        })
    }

    /// Accepts results with at least one strong equivalence.
    pub fn has_strong_equivalences(
        delegates: Vec<Arc<dyn EquivalenceResultUpdater<T>>>,
    ) -> UpdateResult<Self> {
        Self::new(
            delegates,
            "has strong equivalences",
            EquivalenceResult::has_strong_equivalences,
        )
    }
}

impl<T: EquivalenceContent> fmt::Debug for FirstMatchingPredicateUpdater<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirstMatchingPredicateUpdater")
            .field("name", &self.name)
            .field("predicate", &self.predicate_name)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<T: EquivalenceContent> EquivalenceResultUpdater<T> for FirstMatchingPredicateUpdater<T> {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self, subject), fields(subject = %subject.id(), predicate = %self.predicate_name))]
    async fn update(&self, subject: &T) -> UpdateResult<EquivalenceResult<T>> {
        let mut last = None;
        for delegate in &self.delegates {
            let result = delegate.update(subject).await?;
            if (self.predicate)(&result) {
                debug!(delegate = delegate.name(), "Predicate matched");
                return Ok(result);
            }
            last = Some(result);
        }

        warn!(
            delegates = self.delegates.len(),
            "No delegate result matched, returning the last result"
        );
        // `new` rejects an empty delegate list, so the loop ran at least once.
        last.ok_or_else(|| UpdateError::invalid_config("no delegates"))
    }
}
