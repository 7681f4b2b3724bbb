use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, instrument};

use crate::content::{ContentId, EquivalenceContent};
use crate::pipeline::{EquivalencePipeline, EquivalenceResult};

use super::error::{UpdateError, UpdateResult};

/// Produces a full [`EquivalenceResult`] for a subject.
#[async_trait]
pub trait EquivalenceResultUpdater<T: EquivalenceContent>: Send + Sync {
    fn name(&self) -> &str;

    async fn update(&self, subject: &T) -> UpdateResult<EquivalenceResult<T>>;
}

/// Runs an equivalence update end to end, reporting only whether anything was found.
#[async_trait]
pub trait EquivalenceUpdater<T: EquivalenceContent>: Send + Sync {
    async fn update(&self, subject: &T) -> UpdateResult<bool>;
}

/// Receives finished results (persistence, messaging).
///
/// May refuse an item whose container has not been equivalenced yet by returning
/// [`UpdateError::ContainerSummaryRequired`](super::UpdateError::ContainerSummaryRequired).
#[async_trait]
pub trait EquivalenceResultHandler<T: EquivalenceContent>: Send + Sync {
    /// Returns whether the results were acted on.
    async fn handle(&self, subject: &T, results: &[EquivalenceResult<T>]) -> UpdateResult<bool>;
}

#[async_trait]
impl<T: EquivalenceContent> EquivalenceResultUpdater<T> for EquivalencePipeline<T> {
    fn name(&self) -> &str {
        EquivalencePipeline::name(self)
    }

    async fn update(&self, subject: &T) -> UpdateResult<EquivalenceResult<T>> {
        Ok(self.run(subject).await?)
    }
}

/// Runs every result updater for a subject, hands the results to the handler and reports
/// whether any combined candidates were found.
pub struct ContentEquivalenceUpdater<T: EquivalenceContent> {
    updaters: Vec<Arc<dyn EquivalenceResultUpdater<T>>>,
    handler: Arc<dyn EquivalenceResultHandler<T>>,
}

impl<T: EquivalenceContent> ContentEquivalenceUpdater<T> {
    pub fn new(
        updaters: Vec<Arc<dyn EquivalenceResultUpdater<T>>>,
        handler: Arc<dyn EquivalenceResultHandler<T>>,
    ) -> Self {
        Self { updaters, handler }
    }

    pub fn single(
        updater: Arc<dyn EquivalenceResultUpdater<T>>,
        handler: Arc<dyn EquivalenceResultHandler<T>>,
    ) -> Self {
        Self::new(vec![updater], handler)
    }
}

impl<T: EquivalenceContent> fmt::Debug for ContentEquivalenceUpdater<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.updaters.iter().map(|u| u.name()).collect();
        f.debug_struct("ContentEquivalenceUpdater")
            .field("updaters", &names)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<T: EquivalenceContent> EquivalenceUpdater<T> for ContentEquivalenceUpdater<T> {
    #[instrument(skip(self, subject), fields(subject = %subject.id()))]
    async fn update(&self, subject: &T) -> UpdateResult<bool> {
        let mut results = Vec::with_capacity(self.updaters.len());
        for updater in &self.updaters {
            results.push(updater.update(subject).await?);
        }

        let handled = self.handler.handle(subject, &results).await?;
        let found = results.iter().any(EquivalenceResult::combined_candidates_present);
        debug!(handled, found, results = results.len(), "Equivalence update finished");
        Ok(found)
    }
}

/// Updater for a hierarchy level that is switched off.
#[derive(Debug, Clone, Copy, Default)]
pub struct NopUpdater;

#[async_trait]
impl<T: EquivalenceContent> EquivalenceUpdater<T> for NopUpdater {
    async fn update(&self, _subject: &T) -> UpdateResult<bool> {
        Ok(false)
    }
}

/// Keeps every result it is handed, in arrival order.
///
/// A subject handled a second time keeps its first results. Items whose container is in the
/// required set are refused with [`UpdateError::ContainerSummaryRequired`] until that container
/// has been handled.
pub struct CollectingHandler<T> {
    results: Mutex<Vec<EquivalenceResult<T>>>,
    handled: Mutex<HashSet<ContentId>>,
    required_containers: HashSet<ContentId>,
}

impl<T: EquivalenceContent> CollectingHandler<T> {
    pub fn new() -> Self {
        Self {
            results: Mutex::new(Vec::new()),
            handled: Mutex::new(HashSet::new()),
            required_containers: HashSet::new(),
        }
    }

    pub fn requiring_containers(mut self, containers: impl IntoIterator<Item = ContentId>) -> Self {
        self.required_containers.extend(containers);
        self
    }

    pub fn len(&self) -> usize {
        self.results.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.lock().is_empty()
    }

    /// Takes everything collected so far.
    pub fn drain(&self) -> Vec<EquivalenceResult<T>> {
        std::mem::take(&mut *self.results.lock())
    }
}

impl<T: EquivalenceContent> Default for CollectingHandler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for CollectingHandler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectingHandler")
            .field("results", &self.results.lock().len())
            .field("required_containers", &self.required_containers.len())
            .finish()
    }
}

#[async_trait]
impl<T: EquivalenceContent> EquivalenceResultHandler<T> for CollectingHandler<T> {
    async fn handle(&self, subject: &T, results: &[EquivalenceResult<T>]) -> UpdateResult<bool> {
        let mut handled = self.handled.lock();
        if let Some(container) = subject.container()
            && self.required_containers.contains(container)
            && !handled.contains(container)
        {
            return Err(UpdateError::ContainerSummaryRequired {
                item: subject.id().clone(),
                container: container.clone(),
            });
        }
        if handled.insert(subject.id().clone()) {
            self.results.lock().extend(results.iter().cloned());
        }
        Ok(true)
    }
}
