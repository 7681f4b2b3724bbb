use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid pipeline configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("generator '{name}' failed: {reason}")]
    Generator { name: String, reason: String },

    #[error("scorer '{name}' failed: {reason}")]
    Scorer { name: String, reason: String },

    #[error("combiner '{name}' failed: {reason}")]
    Combiner { name: String, reason: String },

    #[error("extraction task failed: {0}")]
    Extraction(#[from] tokio::task::JoinError),
}

impl PipelineError {
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    pub fn generator(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Generator {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn scorer(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Scorer {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn combiner(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Combiner {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
