//! Typed knowledge graph core.
//!
//! The module is laid out hexagonally: value objects and entities are pure
//! domain types, [`repositories`] declares the persistence ports, [`memory`]
//! is the reference adapter, [`cached`] fronts the thing ports with
//! read-through caches and [`service`] is the only write path. [`GraphService`]
//! wires everything together from [`GraphSettings`].

pub mod cache;
pub mod cached;
pub mod clock;
pub mod entities;
pub mod errors;
pub mod identity;
pub mod memory;
pub mod pagination;
pub mod problem;
pub mod repositories;
pub mod service;
pub mod value_objects;

use std::sync::Arc;

pub use clock::{Clock, FixedClock, SystemClock};
pub use entities::{
    Bundle, BundleConfiguration, Class, GeneralStatement, List, Literal, Predicate, Resource,
    Thing, ThingKind,
};
pub use errors::{ErrorCategory, ErrorKind, GraphError};
pub use pagination::{Direction, Page, Pageable, Sort, SortProperty};
pub use problem::{Matcher, ProblemDetail, ProblemMapper};
pub use repositories::{
    ClassHierarchyRepository, ClassRepository, ListRepository, LiteralRepository,
    PredicateRepository, ResourceRepository, StatementFilter, StatementRepository,
    ThingRepository,
};
pub use service::{
    ClassHierarchyService, ClassService, ListService, LiteralService, PredicateService,
    Repositories, ResourceService, StatementService,
};
pub use value_objects::{
    ContributorId, Label, ObservatoryId, OrganizationId, SearchString, StatementId, ThingId, Uri,
};

use crate::config::{GraphBackend, GraphSettings};
use cache::ThingCache;
use cached::{
    CachedClassRepository, CachedListRepository, CachedLiteralRepository,
    CachedPredicateRepository, CachedResourceRepository, CachedThingRepository,
};
use memory::{
    InMemoryClassHierarchyRepository, InMemoryClassRepository, InMemoryGraph,
    InMemoryListRepository, InMemoryLiteralRepository, InMemoryPredicateRepository,
    InMemoryResourceRepository, InMemoryStatementRepository, InMemoryThingRepository,
};

/// Type aliases simplifying repository trait object usage inside the services.
pub type ThingHandle = dyn ThingRepository<Error = GraphError> + Send + Sync + 'static;
pub type ResourceHandle = dyn ResourceRepository<Error = GraphError> + Send + Sync + 'static;
pub type LiteralHandle = dyn LiteralRepository<Error = GraphError> + Send + Sync + 'static;
pub type PredicateHandle = dyn PredicateRepository<Error = GraphError> + Send + Sync + 'static;
pub type ClassHandle = dyn ClassRepository<Error = GraphError> + Send + Sync + 'static;
pub type ClassHierarchyHandle =
    dyn ClassHierarchyRepository<Error = GraphError> + Send + Sync + 'static;
pub type StatementHandle = dyn StatementRepository<Error = GraphError> + Send + Sync + 'static;
pub type ListHandle = dyn ListRepository<Error = GraphError> + Send + Sync + 'static;

/// Entry point bundling the domain services over one backend.
#[derive(Clone)]
pub struct GraphService {
    repositories: Repositories,
    cache: Option<Arc<ThingCache>>,
    classes: ClassService,
    hierarchy: ClassHierarchyService,
    resources: ResourceService,
    literals: LiteralService,
    predicates: PredicateService,
    statements: StatementService,
    lists: ListService,
}

impl GraphService {
    /// Builds the services from configuration, using the system clock.
    #[must_use]
    pub fn from_config(settings: &GraphSettings) -> Self {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(settings: &GraphSettings, clock: Arc<dyn Clock>) -> Self {
        let graph = match settings.backend {
            GraphBackend::InMemory => {
                Arc::new(InMemoryGraph::new(&settings.identifiers, &settings.queries))
            }
        };

        let mut repositories = Repositories {
            things: Arc::new(InMemoryThingRepository::new(graph.clone())),
            resources: Arc::new(InMemoryResourceRepository::new(graph.clone())),
            literals: Arc::new(InMemoryLiteralRepository::new(graph.clone())),
            predicates: Arc::new(InMemoryPredicateRepository::new(graph.clone())),
            classes: Arc::new(InMemoryClassRepository::new(graph.clone())),
            hierarchy: Arc::new(InMemoryClassHierarchyRepository::new(graph.clone())),
            statements: Arc::new(InMemoryStatementRepository::new(graph.clone())),
            lists: Arc::new(InMemoryListRepository::new(graph)),
        };

        let cache = settings.cache.enabled.then(|| {
            let cache = Arc::new(ThingCache::new(&settings.cache));
            repositories = Repositories {
                things: Arc::new(CachedThingRepository::new(
                    repositories.things.clone(),
                    cache.clone(),
                )),
                resources: Arc::new(CachedResourceRepository::new(
                    repositories.resources.clone(),
                    cache.clone(),
                )),
                literals: Arc::new(CachedLiteralRepository::new(
                    repositories.literals.clone(),
                    cache.clone(),
                )),
                predicates: Arc::new(CachedPredicateRepository::new(
                    repositories.predicates.clone(),
                    cache.clone(),
                )),
                classes: Arc::new(CachedClassRepository::new(
                    repositories.classes.clone(),
                    cache.clone(),
                )),
                lists: Arc::new(CachedListRepository::new(
                    repositories.lists.clone(),
                    cache.clone(),
                )),
                ..repositories.clone()
            };
            cache
        });
        tracing::info!(
            backend = ?settings.backend,
            cache = settings.cache.enabled,
            "graph services ready"
        );

        Self::new(repositories, cache, clock)
    }

    /// Creates the services over already wired repositories.
    #[must_use]
    pub fn new(
        repositories: Repositories,
        cache: Option<Arc<ThingCache>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            classes: ClassService::new(&repositories, clock.clone()),
            hierarchy: ClassHierarchyService::new(&repositories, clock.clone()),
            resources: ResourceService::new(&repositories, clock.clone()),
            literals: LiteralService::new(&repositories, clock.clone()),
            predicates: PredicateService::new(&repositories, clock.clone()),
            statements: StatementService::new(&repositories, clock.clone()),
            lists: ListService::new(&repositories, clock),
            repositories,
            cache,
        }
    }

    #[must_use]
    pub fn repositories(&self) -> &Repositories {
        &self.repositories
    }

    /// The shared thing cache, absent when caching is disabled.
    #[must_use]
    pub fn cache(&self) -> Option<Arc<ThingCache>> {
        self.cache.clone()
    }

    #[must_use]
    pub fn classes(&self) -> &ClassService {
        &self.classes
    }

    #[must_use]
    pub fn hierarchy(&self) -> &ClassHierarchyService {
        &self.hierarchy
    }

    #[must_use]
    pub fn resources(&self) -> &ResourceService {
        &self.resources
    }

    #[must_use]
    pub fn literals(&self) -> &LiteralService {
        &self.literals
    }

    #[must_use]
    pub fn predicates(&self) -> &PredicateService {
        &self.predicates
    }

    #[must_use]
    pub fn statements(&self) -> &StatementService {
        &self.statements
    }

    #[must_use]
    pub fn lists(&self) -> &ListService {
        &self.lists
    }
}
