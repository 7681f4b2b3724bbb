//! Per-publisher routing.
//!
//! A [`RoutingTable`] (TOML) names pipeline variants and says, for each source publisher and
//! hierarchy level, which variants to run and which publishers to look for equivalents in.
//! [`UpdaterConfigurationRegistry`] validates the table once and assembles the updaters.

pub mod error;
pub mod registry;
pub mod table;


pub use error::{RoutingError, RoutingResult};
pub use registry::{
    DispatchingUpdater, ScoreSourceProvider, ScoreSources, StaticSourceProvider,
    UpdaterConfigurationRegistry,
};
pub use table::{CombinerConfig, PipelineDefinition, Route, RoutingTable, SourceRoutes};
