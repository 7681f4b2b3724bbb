use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::constants::DEFAULT_EXTRACTION_CONCURRENCY;
use crate::content::{EquivalenceContent, Hierarchy, Publisher};
use crate::pipeline::{
    ConjunctiveFilter, EquivalenceFilter, EquivalenceGenerator, EquivalencePipeline,
    EquivalenceScorer, MinimumScoreFilter, NotSamePublisherFilter, PipelineConfig,
    PredicateFilter,
};
use crate::update::{
    ContentEquivalenceUpdater, EquivalenceResultHandler, EquivalenceResultUpdater,
    EquivalenceUpdater, FirstMatchingPredicateUpdater, HierarchyDispatcher, NopUpdater,
    UpdateError, UpdateResult,
};

use super::error::{RoutingError, RoutingResult};
use super::table::{PipelineDefinition, Route, RoutingTable};

/// Generators and scorers feeding one configured pipeline.
pub struct ScoreSources<T: EquivalenceContent> {
    pub generators: Vec<Arc<dyn EquivalenceGenerator<T>>>,
    pub scorers: Vec<Arc<dyn EquivalenceScorer<T>>>,
}

impl<T: EquivalenceContent> Clone for ScoreSources<T> {
    fn clone(&self) -> Self {
        Self {
            generators: self.generators.clone(),
            scorers: self.scorers.clone(),
        }
    }
}

impl<T: EquivalenceContent> fmt::Debug for ScoreSources<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let generators: Vec<&str> = self.generators.iter().map(|g| g.name()).collect();
        let scorers: Vec<&str> = self.scorers.iter().map(|s| s.name()).collect();
        f.debug_struct("ScoreSources")
            .field("generators", &generators)
            .field("scorers", &scorers)
            .finish()
    }
}

/// Supplies the score sources for a pipeline, given where it sits in the routing table.
pub trait ScoreSourceProvider<T: EquivalenceContent>: Send + Sync {
    fn sources(&self, pipeline: &str, hierarchy: Hierarchy, targets: &[Publisher])
    -> ScoreSources<T>;
}

/// Hands out the same sources everywhere, unless a pipeline name has its own.
pub struct StaticSourceProvider<T: EquivalenceContent> {
    default: ScoreSources<T>,
    per_pipeline: BTreeMap<String, ScoreSources<T>>,
}

impl<T: EquivalenceContent> StaticSourceProvider<T> {
    pub fn new(
        generators: Vec<Arc<dyn EquivalenceGenerator<T>>>,
        scorers: Vec<Arc<dyn EquivalenceScorer<T>>>,
    ) -> Self {
        Self {
            default: ScoreSources {
                generators,
                scorers,
            },
            per_pipeline: BTreeMap::new(),
        }
    }

    pub fn with_pipeline(mut self, pipeline: impl Into<String>, sources: ScoreSources<T>) -> Self {
        self.per_pipeline.insert(pipeline.into(), sources);
        self
    }
}

impl<T: EquivalenceContent> ScoreSourceProvider<T> for StaticSourceProvider<T> {
    fn sources(
        &self,
        pipeline: &str,
        _hierarchy: Hierarchy,
        _targets: &[Publisher],
    ) -> ScoreSources<T> {
        self.per_pipeline
            .get(pipeline)
            .unwrap_or(&self.default)
            .clone()
    }
}

/// Validated routing table; builds the per-publisher updaters.
#[derive(Debug, Clone)]
pub struct UpdaterConfigurationRegistry {
    table: RoutingTable,
    extraction_concurrency: usize,
}

impl UpdaterConfigurationRegistry {
    /// Rejects duplicate publishers, sources without routes, empty routes, unknown pipeline
    /// names and invalid pipeline definitions.
    pub fn new(table: RoutingTable) -> RoutingResult<Self> {
        for (name, definition) in &table.pipelines {
            definition
                .validate()
                .map_err(|source| RoutingError::InvalidPipeline {
                    name: name.clone(),
                    source,
                })?;
        }

        let mut seen = HashSet::new();
        for source in &table.sources {
            if !seen.insert(&source.publisher) {
                return Err(RoutingError::DuplicatePublisher(source.publisher.clone()));
            }

            let mut routes = source.routes().peekable();
            if routes.peek().is_none() {
                return Err(RoutingError::NoRoutes(source.publisher.clone()));
            }
            for (hierarchy, route) in routes {
                check_route(&table, &source.publisher, hierarchy, route)?;
            }
        }

        Ok(Self {
            table,
            extraction_concurrency: DEFAULT_EXTRACTION_CONCURRENCY,
        })
    }

    pub fn with_extraction_concurrency(mut self, concurrency: usize) -> Self {
        self.extraction_concurrency = concurrency;
        self
    }

    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    pub fn publishers(&self) -> impl Iterator<Item = &Publisher> {
        self.table.sources.iter().map(|s| &s.publisher)
    }

    /// Whether content from `publisher` at `hierarchy` runs a pipeline rather than a no-op.
    pub fn is_routed(&self, publisher: &Publisher, hierarchy: Hierarchy) -> bool {
        self.table
            .sources
            .iter()
            .find(|s| &s.publisher == publisher)
            .is_some_and(|s| s.route(hierarchy).is_some())
    }

    /// Builds one hierarchy dispatcher per configured publisher.
    ///
    /// Hierarchy levels without a route get a [`NopUpdater`].
    #[instrument(skip_all, fields(sources = self.table.sources.len()))]
    pub fn build_dispatchers<T: EquivalenceContent>(
        &self,
        provider: &dyn ScoreSourceProvider<T>,
        handler: Arc<dyn EquivalenceResultHandler<T>>,
    ) -> RoutingResult<BTreeMap<Publisher, Arc<HierarchyDispatcher<T>>>> {
        let mut dispatchers = BTreeMap::new();
        for source in &self.table.sources {
            let level = |hierarchy: Hierarchy| -> RoutingResult<Arc<dyn EquivalenceUpdater<T>>> {
                match source.route(hierarchy) {
                    Some(route) => {
                        self.route_updater(&source.publisher, hierarchy, route, provider, &handler)
                    }
                    None => Ok(Arc::new(NopUpdater)),
                }
            };
            let item = level(Hierarchy::Item)?;
            let top_level_container = level(Hierarchy::TopLevelContainer)?;
            let non_top_level_container = level(Hierarchy::NonTopLevelContainer)?;

            dispatchers.insert(
                source.publisher.clone(),
                Arc::new(HierarchyDispatcher::new(
                    source.publisher.clone(),
                    item,
                    top_level_container,
                    non_top_level_container,
                )),
            );
        }
        info!(publishers = dispatchers.len(), "Built equivalence updaters");
        Ok(dispatchers)
    }

    /// Same as [`build_dispatchers`](Self::build_dispatchers), behind one publisher-routing
    /// updater.
    pub fn build_updater<T: EquivalenceContent>(
        &self,
        provider: &dyn ScoreSourceProvider<T>,
        handler: Arc<dyn EquivalenceResultHandler<T>>,
    ) -> RoutingResult<DispatchingUpdater<T>> {
        Ok(DispatchingUpdater::new(
            self.build_dispatchers(provider, handler)?,
        ))
    }

    fn route_updater<T: EquivalenceContent>(
        &self,
        publisher: &Publisher,
        hierarchy: Hierarchy,
        route: &Route,
        provider: &dyn ScoreSourceProvider<T>,
        handler: &Arc<dyn EquivalenceResultHandler<T>>,
    ) -> RoutingResult<Arc<dyn EquivalenceUpdater<T>>> {
        let mut pipelines: Vec<Arc<dyn EquivalenceResultUpdater<T>>> =
            Vec::with_capacity(route.pipelines.len());
        for name in &route.pipelines {
            let definition =
                self.table
                    .pipelines
                    .get(name)
                    .ok_or_else(|| RoutingError::UnknownPipeline {
                        publisher: publisher.clone(),
                        hierarchy,
                        pipeline: name.clone(),
                    })?;
            let sources = provider.sources(name, hierarchy, &route.targets);
            pipelines.push(Arc::new(self.pipeline(
                publisher,
                hierarchy,
                name,
                definition,
                &route.targets,
                sources,
            )?));
        }

        let updater: Arc<dyn EquivalenceResultUpdater<T>> = if pipelines.len() == 1 {
            pipelines.remove(0)
        } else {
            Arc::new(FirstMatchingPredicateUpdater::has_strong_equivalences(
                pipelines,
            )?)
        };
        debug!(%publisher, %hierarchy, updater = updater.name(), "Route assembled");
        Ok(Arc::new(ContentEquivalenceUpdater::single(
            updater,
            Arc::clone(handler),
        )))
    }

    fn pipeline<T: EquivalenceContent>(
        &self,
        publisher: &Publisher,
        hierarchy: Hierarchy,
        name: &str,
        definition: &PipelineDefinition,
        targets: &[Publisher],
        sources: ScoreSources<T>,
    ) -> RoutingResult<EquivalencePipeline<T>> {
        let full_name = format!("{}/{}/{}", publisher, hierarchy, name);
        let invalid = |source| RoutingError::InvalidPipeline {
            name: full_name.clone(),
            source,
        };

        let extractors = definition
            .extractors
            .iter()
            .map(|e| e.build::<T>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(invalid)?;

        let config = PipelineConfig::new(
            full_name.clone(),
            sources.generators,
            definition.combiner.build::<T>(),
            filter_for(definition, targets),
            extractors,
        )
        .with_scorers(sources.scorers)
        .with_excluded_ids(definition.excluded_ids.iter().cloned())
        .with_extraction_concurrency(self.extraction_concurrency);

        EquivalencePipeline::new(config).map_err(invalid)
    }
}

fn check_route(
    table: &RoutingTable,
    publisher: &Publisher,
    hierarchy: Hierarchy,
    route: &Route,
) -> RoutingResult<()> {
    if route.pipelines.is_empty() {
        return Err(RoutingError::EmptyRoute {
            publisher: publisher.clone(),
            hierarchy,
            reason: "no pipelines",
        });
    }
    if route.targets.is_empty() {
        return Err(RoutingError::EmptyRoute {
            publisher: publisher.clone(),
            hierarchy,
            reason: "no target publishers",
        });
    }
    if let Some(unknown) = route
        .pipelines
        .iter()
        .find(|p| !table.pipelines.contains_key(*p))
    {
        return Err(RoutingError::UnknownPipeline {
            publisher: publisher.clone(),
            hierarchy,
            pipeline: unknown.clone(),
        });
    }
    Ok(())
}

fn filter_for<T: EquivalenceContent>(
    definition: &PipelineDefinition,
    targets: &[Publisher],
) -> Arc<dyn EquivalenceFilter<T>> {
    let allowed: HashSet<Publisher> = targets.iter().cloned().collect();
    let names: Vec<&str> = targets.iter().map(Publisher::key).collect();
    let mut filters: Vec<Arc<dyn EquivalenceFilter<T>>> = vec![Arc::new(PredicateFilter::new(
        format!("Target publishers [{}]", names.join(", ")),
        move |candidate, _subject| allowed.contains(candidate.publisher()),
    ))];
    if let Some(minimum) = definition.minimum_score {
        filters.push(Arc::new(MinimumScoreFilter::new(minimum)));
    }
    if definition.exclude_same_publisher {
        filters.push(Arc::new(NotSamePublisherFilter));
    }
    Arc::new(ConjunctiveFilter::new(filters))
}

/// Sends each subject to the dispatcher of its publisher.
pub struct DispatchingUpdater<T: EquivalenceContent> {
    dispatchers: BTreeMap<Publisher, Arc<HierarchyDispatcher<T>>>,
}

impl<T: EquivalenceContent> DispatchingUpdater<T> {
    pub fn new(dispatchers: BTreeMap<Publisher, Arc<HierarchyDispatcher<T>>>) -> Self {
        Self { dispatchers }
    }

    pub fn dispatcher(&self, publisher: &Publisher) -> Option<&Arc<HierarchyDispatcher<T>>> {
        self.dispatchers.get(publisher)
    }

    pub fn publishers(&self) -> impl Iterator<Item = &Publisher> {
        self.dispatchers.keys()
    }
}

impl<T: EquivalenceContent> fmt::Debug for DispatchingUpdater<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchingUpdater")
            .field("publishers", &self.dispatchers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[async_trait]
impl<T: EquivalenceContent> EquivalenceUpdater<T> for DispatchingUpdater<T> {
    async fn update(&self, subject: &T) -> UpdateResult<bool> {
        match self.dispatchers.get(subject.publisher()) {
            Some(dispatcher) => dispatcher.update(subject).await,
            None => Err(UpdateError::NoRouteForPublisher(subject.publisher().clone())),
        }
    }
}
