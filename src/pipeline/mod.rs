//! Equivalence decision pipeline.
//!
//! [`EquivalencePipeline`] drives one subject through generation, scoring, combination,
//! filtering and per-publisher extraction, producing an [`EquivalenceResult`] that carries
//! the raw per-source scores, the combined scores, the strong equivalences and the audit
//! trail.
//!
//! Generators, scorers, the combiner and the filter are collaborator traits. Reference
//! combiners and filters are provided so that a pipeline can be assembled from
//! configuration alone.

pub mod combiner;
pub mod error;
pub mod filter;
pub mod generator;
pub mod orchestrator;
pub mod result;


pub use combiner::{
    AddingCombiner, NullScoreAwareAveragingCombiner, RequiredScoreFilteringCombiner,
    ScoreCombiner,
};
pub use error::{PipelineError, PipelineResult};
pub use filter::{
    ConjunctiveFilter, EquivalenceFilter, ExclusionListFilter, MinimumScoreFilter,
    NotSamePublisherFilter, PredicateFilter,
};
pub use generator::{EquivalenceGenerator, EquivalenceScorer, ReplayedScores};
pub use orchestrator::{EquivalencePipeline, PipelineConfig};
pub use result::EquivalenceResult;
