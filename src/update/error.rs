use thiserror::Error;

use crate::content::{ContentId, Publisher};
use crate::pipeline::PipelineError;

#[derive(Debug, Error)]
pub enum UpdateError {
    /// The item's container has not been equivalenced yet. Consumed by
    /// [`RecoveringUpdater`](super::RecoveringUpdater).
    #[error("container {container} of item {item} must be equivalenced first")]
    ContainerSummaryRequired { item: ContentId, container: ContentId },

    #[error("updater for {expected} cannot update content from {actual}")]
    PublisherMismatch {
        expected: Publisher,
        actual: Publisher,
    },

    #[error("no updater configured for publisher {0}")]
    NoRouteForPublisher(Publisher),

    #[error("failed to resolve {id}: {reason}")]
    Resolver { id: ContentId, reason: String },

    #[error("result handler failed: {reason}")]
    Handler { reason: String },

    #[error("invalid updater configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl UpdateError {
    pub fn resolver(id: ContentId, reason: impl Into<String>) -> Self {
        Self::Resolver {
            id,
            reason: reason.into(),
        }
    }

    pub fn handler(reason: impl Into<String>) -> Self {
        Self::Handler {
            reason: reason.into(),
        }
    }

    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    pub fn is_container_summary_required(&self) -> bool {
        matches!(self, UpdateError::ContainerSummaryRequired { .. })
    }
}

pub type UpdateResult<T> = Result<T, UpdateError>;
