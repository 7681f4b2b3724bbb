use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, instrument, warn};

use crate::content::{ContentId, EquivalenceContent};

use super::error::{UpdateError, UpdateResult};
use super::updater::EquivalenceUpdater;

/// Looks content up by id.
#[async_trait]
pub trait ContentResolver<T: EquivalenceContent>: Send + Sync {
    async fn resolve(&self, id: &ContentId) -> UpdateResult<Option<T>>;
}

/// Resolver over a fixed catalogue held in memory.
pub struct InMemoryResolver<T> {
    catalogue: HashMap<ContentId, T>,
}

impl<T: EquivalenceContent> InMemoryResolver<T> {
    pub fn new(contents: impl IntoIterator<Item = T>) -> Self {
        Self {
            catalogue: contents.into_iter().map(|c| (c.id().clone(), c)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.catalogue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalogue.is_empty()
    }
}

impl<T> fmt::Debug for InMemoryResolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryResolver")
            .field("contents", &self.catalogue.len())
            .finish()
    }
}

#[async_trait]
impl<T: EquivalenceContent> ContentResolver<T> for InMemoryResolver<T> {
    async fn resolve(&self, id: &ContentId) -> UpdateResult<Option<T>> {
        Ok(self.catalogue.get(id).cloned())
    }
}

/// Recovers from [`UpdateError::ContainerSummaryRequired`] by equivalencing the container
/// first and retrying the item exactly once.
///
/// An unresolvable container, a resolver error, a failed container update or a failed
/// retry all end the attempt with `Ok(false)`; they never loop. Other errors from the inner
/// updater pass through untouched.
pub struct RecoveringUpdater<T: EquivalenceContent> {
    inner: Arc<dyn EquivalenceUpdater<T>>,
    resolver: Arc<dyn ContentResolver<T>>,
}

impl<T: EquivalenceContent> RecoveringUpdater<T> {
    pub fn new(inner: Arc<dyn EquivalenceUpdater<T>>, resolver: Arc<dyn ContentResolver<T>>) -> Self {
        Self { inner, resolver }
    }

    async fn recover(&self, subject: &T, container_id: &ContentId) -> bool {
        let container = match self.resolver.resolve(container_id).await {
            Ok(Some(container)) => container,
            Ok(None) => {
                error!(container = %container_id, "Container not found, cannot recover");
                return false;
            }
            Err(e) => {
                error!(container = %container_id, error = %e, "Failed to resolve container");
                return false;
            }
        };

        if let Err(e) = self.inner.update(&container).await {
            error!(container = %container_id, error = %e, "Container update failed");
            return false;
        }
        info!(container = %container_id, "Container updated, retrying item");

        match self.inner.update(subject).await {
            Ok(found) => found,
            Err(e) => {
                error!(error = %e, "Item update failed after container recovery");
                false
            }
        }
    }
}

impl<T: EquivalenceContent> fmt::Debug for RecoveringUpdater<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecoveringUpdater").finish_non_exhaustive()
    }
}

#[async_trait]
impl<T: EquivalenceContent> EquivalenceUpdater<T> for RecoveringUpdater<T> {
    #[instrument(skip(self, subject), fields(subject = %subject.id()))]
    async fn update(&self, subject: &T) -> UpdateResult<bool> {
        match self.inner.update(subject).await {
            Err(UpdateError::ContainerSummaryRequired { item, container }) => {
                warn!(item = %item, container = %container, "Container summary required");
                Ok(self.recover(subject, &container).await)
            }
            other => other,
        }
    }
}
