use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::content::{ContentId, EquivalenceContent};
use crate::pipeline::EquivalenceResult;

use super::error::{UpdateError, UpdateResult};
use super::recovery::ContentResolver;
use super::updater::{EquivalenceResultHandler, EquivalenceUpdater};

/// One scripted response of a [`RecordingUpdater`].
#[derive(Debug, Clone)]
pub enum ScriptedUpdate {
    Found(bool),
    ContainerRequired(ContentId),
    Fail(String),
}

/// Updater that replays scripted responses per subject and records every call.
///
/// Subjects without a script (or whose script is used up) answer `Ok(true)`.
#[derive(Default)]
pub struct RecordingUpdater {
    scripts: Mutex<HashMap<ContentId, VecDeque<ScriptedUpdate>>>,
    delays: HashMap<ContentId, Duration>,
    calls: Mutex<Vec<ContentId>>,
}

impl RecordingUpdater {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, id: &str, responses: impl IntoIterator<Item = ScriptedUpdate>) -> Self {
        self.scripts
            .lock()
            .entry(ContentId::new(id))
            .or_default()
            .extend(responses);
        self
    }

    pub fn with_delay(mut self, id: &str, delay: Duration) -> Self {
        self.delays.insert(ContentId::new(id), delay);
        self
    }

    pub fn calls(&self) -> Vec<ContentId> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, id: &str) -> usize {
        let id = ContentId::new(id);
        self.calls.lock().iter().filter(|c| **c == id).count()
    }
}

#[async_trait]
impl<T: EquivalenceContent> EquivalenceUpdater<T> for RecordingUpdater {
    async fn update(&self, subject: &T) -> UpdateResult<bool> {
        let id = subject.id().clone();
        self.calls.lock().push(id.clone());

        if let Some(delay) = self.delays.get(&id) {
            tokio::time::sleep(*delay).await;
        }

        let next = self
            .scripts
            .lock()
            .get_mut(&id)
            .and_then(VecDeque::pop_front);
        match next {
            None => Ok(true),
            Some(ScriptedUpdate::Found(found)) => Ok(found),
            Some(ScriptedUpdate::ContainerRequired(container)) => {
                Err(UpdateError::ContainerSummaryRequired {
                    item: id,
                    container,
                })
            }
            Some(ScriptedUpdate::Fail(reason)) => Err(UpdateError::handler(reason)),
        }
    }
}

/// Resolver over a fixed map, with ids that always fail to resolve.
pub struct ScriptedResolver<T> {
    contents: HashMap<ContentId, T>,
    failing: HashSet<ContentId>,
    lookups: Mutex<Vec<ContentId>>,
}

impl<T: EquivalenceContent> ScriptedResolver<T> {
    pub fn new(contents: impl IntoIterator<Item = T>) -> Self {
        Self {
            contents: contents.into_iter().map(|c| (c.id().clone(), c)).collect(),
            failing: HashSet::new(),
            lookups: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(mut self, id: &str) -> Self {
        self.failing.insert(ContentId::new(id));
        self
    }

    pub fn lookups(&self) -> Vec<ContentId> {
        self.lookups.lock().clone()
    }
}

#[async_trait]
impl<T: EquivalenceContent> ContentResolver<T> for ScriptedResolver<T> {
    async fn resolve(&self, id: &ContentId) -> UpdateResult<Option<T>> {
        self.lookups.lock().push(id.clone());
        if self.failing.contains(id) {
            return Err(UpdateError::resolver(id.clone(), "store unavailable"));
        }
        Ok(self.contents.get(id).cloned())
    }
}

/// Handler that, like a real store, refuses items whose container it has not seen yet.
pub struct ContainerTrackingHandler<T> {
    handled: Mutex<Vec<ContentId>>,
    results: Mutex<Vec<EquivalenceResult<T>>>,
}

impl<T: EquivalenceContent> ContainerTrackingHandler<T> {
    pub fn new() -> Self {
        Self {
            handled: Mutex::new(Vec::new()),
            results: Mutex::new(Vec::new()),
        }
    }

    /// Subjects handled so far, in order.
    pub fn handled(&self) -> Vec<ContentId> {
        self.handled.lock().clone()
    }

    pub fn results(&self) -> Vec<EquivalenceResult<T>> {
        self.results.lock().clone()
    }
}

impl<T: EquivalenceContent> Default for ContainerTrackingHandler<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: EquivalenceContent> EquivalenceResultHandler<T> for ContainerTrackingHandler<T> {
    async fn handle(&self, subject: &T, results: &[EquivalenceResult<T>]) -> UpdateResult<bool> {
        let mut handled = self.handled.lock();
        if let Some(container) = subject.container()
            && !handled.contains(container)
        {
            return Err(UpdateError::ContainerSummaryRequired {
                item: subject.id().clone(),
                container: container.clone(),
            });
        }
        handled.push(subject.id().clone());
        self.results.lock().extend(results.iter().cloned());
        Ok(true)
    }
}
