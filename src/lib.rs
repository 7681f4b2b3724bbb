//! Equivalence decision library (used by the batch driver and integration tests).
//!
//! Decides which catalogue records from other publishers describe the same real-world
//! content as a subject record. Candidates are generated and scored by pluggable sources,
//! combined, filtered, partitioned per publisher and handed to a chain of extractor
//! strategies that pick the strong equivalents.
//!
//! # Public API Surface
//!
//! ## Core Types
//! - [`Score`], [`ScoredCandidate`], [`ScoredCandidates`] - Scores and scored sets
//! - [`Content`], [`EquivalenceContent`] - Reference content model
//! - [`TraceResult`] - Audit trail attached to every result
//!
//! ## Decisions
//! - Extractor strategies and [`ExtractorConfig`]
//! - [`EquivalencePipeline`], [`PipelineConfig`], [`EquivalenceResult`]
//!
//! ## Updaters
//! - [`FirstMatchingPredicateUpdater`], [`HierarchyDispatcher`], [`RecoveringUpdater`]
//! - [`BatchRunner`] - Bounded concurrent evaluation of many subjects
//! - [`UpdaterConfigurationRegistry`] - Routing table to per-publisher updaters
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod config;
pub mod constants;
pub mod content;
pub mod driver;
pub mod extractors;
pub mod pipeline;
pub mod routing;
pub mod score;
pub mod trace;
pub mod update;

pub use config::{Config, ConfigError};
pub use content::{
    Broadcast, Content, ContentId, ContentKind, EquivalenceContent, Hierarchy, Publisher,
};
pub use driver::{BatchFile, DriverError, DriverResult, RunOutput, ScoreRecord, run_batch};
pub use extractors::{
    AllOverOrEqHighestMatchingThreshold, AllOverOrEqThreshold, AllTiedAtTop,
    ContinueUntilOneWorks, EquivalenceExtractor, ExcludePublisherThenExtract, ExtractorConfig,
    MultiStageAllOverOrEqThreshold, MultipleCandidateExtractor, MusicExtractor,
    NothingExtractor, PercentAboveNextBest, PercentOfTotal, RemoveAndCombine, SharedExtractor,
    TieScope, TopExtractor,
};
pub use pipeline::{
    AddingCombiner, ConjunctiveFilter, EquivalenceFilter, EquivalenceGenerator,
    EquivalencePipeline, EquivalenceResult, EquivalenceScorer, ExclusionListFilter,
    MinimumScoreFilter, NotSamePublisherFilter, NullScoreAwareAveragingCombiner, PipelineConfig,
    PipelineError, PipelineResult, PredicateFilter, ReplayedScores,
    RequiredScoreFilteringCombiner, ScoreCombiner,
};
pub use routing::{
    CombinerConfig, DispatchingUpdater, PipelineDefinition, Route, RoutingError, RoutingResult,
    RoutingTable, ScoreSourceProvider, ScoreSources, SourceRoutes, StaticSourceProvider,
    UpdaterConfigurationRegistry,
};
pub use score::{Score, ScoredCandidate, ScoredCandidates};
pub use trace::{StageKind, TraceComponent, TraceEntry, TraceResult};
#[cfg(any(test, feature = "mock"))]
pub use update::{ContainerTrackingHandler, RecordingUpdater, ScriptedResolver, ScriptedUpdate};
pub use update::{
    BatchReport, BatchRunner, CollectingHandler, ContentEquivalenceUpdater, ContentResolver,
    EquivalenceResultHandler, EquivalenceResultUpdater, EquivalenceUpdater,
    FirstMatchingPredicateUpdater, HierarchyDispatcher, InMemoryResolver, NopUpdater,
    OutcomeStatus, RecoveringUpdater, SubjectOutcome, UpdateError, UpdateResult,
};
