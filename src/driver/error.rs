use std::path::PathBuf;

use thiserror::Error;

use crate::content::ContentId;
use crate::routing::RoutingError;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to read batch file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid batch file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{context} references {id}, which is not in the catalogue")]
    UnknownContent { context: String, id: ContentId },

    #[error(transparent)]
    Routing(#[from] RoutingError),
}

pub type DriverResult<T> = Result<T, DriverError>;
