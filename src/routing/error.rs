use std::path::PathBuf;

use thiserror::Error;

use crate::content::{Hierarchy, Publisher};
use crate::pipeline::PipelineError;
use crate::update::UpdateError;

#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("failed to read routing file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid routing file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("publisher {0} is configured more than once")]
    DuplicatePublisher(Publisher),

    #[error("publisher {0} has no routes")]
    NoRoutes(Publisher),

    #[error("{publisher} {hierarchy} route references unknown pipeline '{pipeline}'")]
    UnknownPipeline {
        publisher: Publisher,
        hierarchy: Hierarchy,
        pipeline: String,
    },

    #[error("{publisher} {hierarchy} route is empty: {reason}")]
    EmptyRoute {
        publisher: Publisher,
        hierarchy: Hierarchy,
        reason: &'static str,
    },

    #[error("pipeline '{name}' is invalid: {source}")]
    InvalidPipeline {
        name: String,
        #[source]
        source: PipelineError,
    },

    #[error(transparent)]
    Update(#[from] UpdateError),
}

pub type RoutingResult<T> = Result<T, RoutingError>;
