use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::content::{EquivalenceContent, Hierarchy, Publisher};

use super::error::{UpdateError, UpdateResult};
use super::updater::EquivalenceUpdater;

/// Routes one publisher's content to the updater for its hierarchy level.
pub struct HierarchyDispatcher<T: EquivalenceContent> {
    publisher: Publisher,
    item: Arc<dyn EquivalenceUpdater<T>>,
    top_level_container: Arc<dyn EquivalenceUpdater<T>>,
    non_top_level_container: Arc<dyn EquivalenceUpdater<T>>,
}

impl<T: EquivalenceContent> HierarchyDispatcher<T> {
    pub fn new(
        publisher: Publisher,
        item: Arc<dyn EquivalenceUpdater<T>>,
        top_level_container: Arc<dyn EquivalenceUpdater<T>>,
        non_top_level_container: Arc<dyn EquivalenceUpdater<T>>,
    ) -> Self {
        Self {
            publisher,
            item,
            top_level_container,
            non_top_level_container,
        }
    }

    pub fn publisher(&self) -> &Publisher {
        &self.publisher
    }

    fn updater_for(&self, hierarchy: Hierarchy) -> &Arc<dyn EquivalenceUpdater<T>> {
        match hierarchy {
            Hierarchy::Item => &self.item,
            Hierarchy::TopLevelContainer => &self.top_level_container,
            Hierarchy::NonTopLevelContainer => &self.non_top_level_container,
        }
    }
}

impl<T: EquivalenceContent> fmt::Debug for HierarchyDispatcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HierarchyDispatcher")
            .field("publisher", &self.publisher)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<T: EquivalenceContent> EquivalenceUpdater<T> for HierarchyDispatcher<T> {
    #[instrument(skip(self, subject), fields(publisher = %self.publisher, subject = %subject.id()))]
    async fn update(&self, subject: &T) -> UpdateResult<bool> {
        if subject.publisher() != &self.publisher {
            return Err(UpdateError::PublisherMismatch {
                expected: self.publisher.clone(),
                actual: subject.publisher().clone(),
            });
        }
        let hierarchy = subject.hierarchy();
        debug!(%hierarchy, "Dispatching by hierarchy");
        self.updater_for(hierarchy).update(subject).await
    }
}
