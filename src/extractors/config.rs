use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::content::{EquivalenceContent, Publisher};
use crate::pipeline::error::{PipelineError, PipelineResult};

use super::{
    AllOverOrEqHighestMatchingThreshold, AllOverOrEqThreshold, AllTiedAtTop,
    ContinueUntilOneWorks, ExcludePublisherThenExtract, MultiStageAllOverOrEqThreshold,
    MultipleCandidateExtractor, MusicExtractor, NothingExtractor, PercentAboveNextBest,
    PercentOfTotal, RemoveAndCombine, SharedExtractor, TieScope, TopExtractor,
};

/// Declarative extractor description, as found in routing files.
///
/// ```toml
/// [[pipelines.item.extractors]]
/// type = "continue_until_one_works"
/// delegates = [
///     { type = "all_over_or_eq_threshold", threshold = 2.9 },
///     { type = "all_over_or_eq_threshold", threshold = 0.9 },
/// ]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExtractorConfig {
    Top,
    Nothing,
    AllOverOrEqThreshold {
        threshold: f64,
    },
    AllOverOrEqHighestMatchingThreshold {
        thresholds: Vec<f64>,
    },
    MultiStageAllOverOrEqThreshold {
        thresholds: Vec<f64>,
    },
    AllTiedAtTop {
        threshold: f64,
        #[serde(default)]
        scope: TieScope,
    },
    MultipleCandidate,
    Music,
    PercentOfTotal {
        threshold: f64,
    },
    PercentAboveNextBest {
        multiplier: f64,
    },
    ExcludePublisher {
        publishers: Vec<Publisher>,
        delegate: Box<ExtractorConfig>,
    },
    RemoveAndCombine {
        first: Box<ExtractorConfig>,
        second: Box<ExtractorConfig>,
    },
    ContinueUntilOneWorks {
        delegates: Vec<ExtractorConfig>,
    },
}

fn finite(field: &str, value: f64) -> PipelineResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(PipelineError::invalid_config(format!(
            "{} must be finite, got {}",
            field, value
        )))
    }
}

fn threshold_set(thresholds: &[f64]) -> PipelineResult<()> {
    if thresholds.is_empty() {
        return Err(PipelineError::invalid_config(
            "threshold set must not be empty",
        ));
    }
    thresholds.iter().try_for_each(|t| finite("threshold", *t))
}

impl ExtractorConfig {
    /// Checks parameters recursively: finite thresholds, non-empty threshold sets,
    /// publisher sets and delegate lists.
    pub fn validate(&self) -> PipelineResult<()> {
        match self {
            ExtractorConfig::Top
            | ExtractorConfig::Nothing
            | ExtractorConfig::MultipleCandidate
            | ExtractorConfig::Music => Ok(()),
            ExtractorConfig::AllOverOrEqThreshold { threshold }
            | ExtractorConfig::AllTiedAtTop { threshold, .. }
            | ExtractorConfig::PercentOfTotal { threshold } => finite("threshold", *threshold),
            ExtractorConfig::PercentAboveNextBest { multiplier } => {
                finite("multiplier", *multiplier)
            }
            ExtractorConfig::AllOverOrEqHighestMatchingThreshold { thresholds }
            | ExtractorConfig::MultiStageAllOverOrEqThreshold { thresholds } => {
                threshold_set(thresholds)
            }
            ExtractorConfig::ExcludePublisher {
                publishers,
                delegate,
            } => {
                if publishers.is_empty() {
                    return Err(PipelineError::invalid_config(
                        "exclude_publisher needs at least one publisher",
                    ));
                }
                delegate.validate()
            }
            ExtractorConfig::RemoveAndCombine { first, second } => {
                first.validate()?;
                second.validate()
            }
            ExtractorConfig::ContinueUntilOneWorks { delegates } => {
                if delegates.is_empty() {
                    return Err(PipelineError::invalid_config(
                        "continue_until_one_works needs at least one delegate",
                    ));
                }
                delegates.iter().try_for_each(ExtractorConfig::validate)
            }
        }
    }

    /// Validates parameters and constructs the extractor.
    pub fn build<T: EquivalenceContent>(&self) -> PipelineResult<SharedExtractor<T>> {
        self.validate()?;
        Ok(self.construct())
    }

    fn construct<T: EquivalenceContent>(&self) -> SharedExtractor<T> {
        match self {
            ExtractorConfig::Top => Arc::new(TopExtractor),
            ExtractorConfig::Nothing => Arc::new(NothingExtractor),
            ExtractorConfig::AllOverOrEqThreshold { threshold } => {
                Arc::new(AllOverOrEqThreshold::new(*threshold))
            }
            ExtractorConfig::AllOverOrEqHighestMatchingThreshold { thresholds } => Arc::new(
                AllOverOrEqHighestMatchingThreshold::new(thresholds.iter().copied()),
            ),
            ExtractorConfig::MultiStageAllOverOrEqThreshold { thresholds } => Arc::new(
                MultiStageAllOverOrEqThreshold::new(thresholds.iter().copied()),
            ),
            ExtractorConfig::AllTiedAtTop { threshold, scope } => {
                Arc::new(AllTiedAtTop::new(*threshold, *scope))
            }
            ExtractorConfig::MultipleCandidate => Arc::new(MultipleCandidateExtractor::new()),
            ExtractorConfig::Music => Arc::new(MusicExtractor),
            ExtractorConfig::PercentOfTotal { threshold } => {
                Arc::new(PercentOfTotal::new(*threshold))
            }
            ExtractorConfig::PercentAboveNextBest { multiplier } => {
                Arc::new(PercentAboveNextBest::new(*multiplier))
            }
            ExtractorConfig::ExcludePublisher {
                publishers,
                delegate,
            } => Arc::new(ExcludePublisherThenExtract::new(
                publishers.iter().cloned(),
                delegate.construct::<T>(),
            )),
            ExtractorConfig::RemoveAndCombine { first, second } => Arc::new(
                RemoveAndCombine::new(first.construct::<T>(), second.construct::<T>()),
            ),
            ExtractorConfig::ContinueUntilOneWorks { delegates } => {
                Arc::new(ContinueUntilOneWorks::new(
                    delegates.iter().map(|d| d.construct::<T>()).collect(),
                ))
            }
        }
    }
}
