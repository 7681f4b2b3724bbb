//! Updater composition layer.
//!
//! Wraps pipelines with cross-cutting policies: alternative pipelines tried until one
//! result satisfies a predicate, dispatch by hierarchy level, one-shot recovery when an
//! item's container has not been equivalenced yet, and batch execution.

pub mod batch;
pub mod error;
pub mod first_matching;
pub mod hierarchy;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod recovery;
pub mod updater;


pub use batch::{BatchReport, BatchRunner, OutcomeStatus, SubjectOutcome};
pub use error::{UpdateError, UpdateResult};
pub use first_matching::FirstMatchingPredicateUpdater;
pub use hierarchy::HierarchyDispatcher;
#[cfg(any(test, feature = "mock"))]
pub use mock::{ContainerTrackingHandler, RecordingUpdater, ScriptedResolver, ScriptedUpdate};
pub use recovery::{ContentResolver, InMemoryResolver, RecoveringUpdater};
pub use updater::{
    CollectingHandler, ContentEquivalenceUpdater, EquivalenceResultHandler,
    EquivalenceResultUpdater, EquivalenceUpdater, NopUpdater,
};
