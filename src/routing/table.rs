use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::content::{ContentId, EquivalenceContent, Hierarchy, Publisher};
use crate::extractors::ExtractorConfig;
use crate::pipeline::{
    AddingCombiner, NullScoreAwareAveragingCombiner, PipelineError, PipelineResult,
    RequiredScoreFilteringCombiner, ScoreCombiner,
};

use super::error::{RoutingError, RoutingResult};

fn default_true() -> bool {
    true
}

/// Declarative combiner choice.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CombinerConfig {
    #[default]
    Adding,
    NullScoreAwareAveraging {
        #[serde(default)]
        ignore_null_scoring_candidate: bool,
    },
    RequiredScore {
        sources: Vec<String>,
        #[serde(default)]
        threshold: f64,
        delegate: Box<CombinerConfig>,
    },
}

impl CombinerConfig {
    pub fn validate(&self) -> PipelineResult<()> {
        match self {
            CombinerConfig::Adding | CombinerConfig::NullScoreAwareAveraging { .. } => Ok(()),
            CombinerConfig::RequiredScore {
                sources,
                threshold,
                delegate,
            } => {
                if sources.is_empty() {
                    return Err(PipelineError::invalid_config(
                        "required_score combiner needs at least one source",
                    ));
                }
                if !threshold.is_finite() {
                    return Err(PipelineError::invalid_config(
                        "required_score threshold must be finite",
                    ));
                }
                delegate.validate()
            }
        }
    }

    pub fn build<T: EquivalenceContent>(&self) -> Arc<dyn ScoreCombiner<T>> {
        match self {
            CombinerConfig::Adding => Arc::new(AddingCombiner),
            CombinerConfig::NullScoreAwareAveraging {
                ignore_null_scoring_candidate,
            } => Arc::new(NullScoreAwareAveragingCombiner::new(
                *ignore_null_scoring_candidate,
            )),
            CombinerConfig::RequiredScore {
                sources,
                threshold,
                delegate,
            } => Arc::new(RequiredScoreFilteringCombiner::new(
                delegate.build::<T>(),
                sources.iter().cloned(),
                *threshold,
            )),
        }
    }
}

/// One named pipeline variant: how to combine, what to admit, how to extract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineDefinition {
    #[serde(default)]
    pub combiner: CombinerConfig,
    /// Admit only real combined scores at or above this.
    #[serde(default)]
    pub minimum_score: Option<f64>,
    /// Reject candidates from the subject's own publisher.
    #[serde(default = "default_true")]
    pub exclude_same_publisher: bool,
    #[serde(default)]
    pub excluded_ids: Vec<ContentId>,
    /// Extractor chain; the first non-empty selection per publisher wins.
    pub extractors: Vec<ExtractorConfig>,
}

impl PipelineDefinition {
    pub fn validate(&self) -> PipelineResult<()> {
        self.combiner.validate()?;
        if let Some(minimum) = self.minimum_score
            && !minimum.is_finite()
        {
            return Err(PipelineError::invalid_config("minimum_score must be finite"));
        }
        if self.extractors.is_empty() {
            return Err(PipelineError::invalid_config(
                "at least one extractor is required",
            ));
        }
        self.extractors.iter().try_for_each(ExtractorConfig::validate)
    }
}

/// Pipelines to run for one hierarchy level and the publishers to look for equivalents in.
///
/// More than one pipeline means "try in order until one finds a strong equivalence".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub pipelines: Vec<String>,
    pub targets: Vec<Publisher>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRoutes {
    pub publisher: Publisher,
    #[serde(default)]
    pub item: Option<Route>,
    #[serde(default)]
    pub top_level_container: Option<Route>,
    #[serde(default)]
    pub non_top_level_container: Option<Route>,
}

impl SourceRoutes {
    pub fn route(&self, hierarchy: Hierarchy) -> Option<&Route> {
        match hierarchy {
            Hierarchy::Item => self.item.as_ref(),
            Hierarchy::TopLevelContainer => self.top_level_container.as_ref(),
            Hierarchy::NonTopLevelContainer => self.non_top_level_container.as_ref(),
        }
    }

    pub fn routes(&self) -> impl Iterator<Item = (Hierarchy, &Route)> {
        [
            Hierarchy::Item,
            Hierarchy::TopLevelContainer,
            Hierarchy::NonTopLevelContainer,
        ]
        .into_iter()
        .filter_map(|h| self.route(h).map(|r| (h, r)))
    }
}

/// Routing file contents.
///
/// ```toml
/// [pipelines.standard_item]
/// combiner = { type = "null_score_aware_averaging" }
/// extractors = [{ type = "percent_above_next_best", multiplier = 1.5 }]
///
/// [[sources]]
/// publisher = "bbc.co.uk"
/// item = { pipelines = ["standard_item"], targets = ["pressassociation.com"] }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RoutingTable {
    #[serde(default)]
    pub pipelines: BTreeMap<String, PipelineDefinition>,
    #[serde(default)]
    pub sources: Vec<SourceRoutes>,
}

impl RoutingTable {
    pub fn from_toml_str(raw: &str) -> RoutingResult<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn load(path: impl AsRef<Path>) -> RoutingResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| RoutingError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }
}
