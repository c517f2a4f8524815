//! In-memory property graph adapter.
//!
//! Things live in one table per kind. Statements are kept in a single edge
//! table whose records reference subject, predicate and object by id and are
//! resolved to [`GeneralStatement`]s on read, so a renamed thing shows up in
//! every statement using it. Subclass edges are stored child to parent. All
//! adapters share one [`InMemoryGraph`]; its mutex serializes writers.

mod bundle;
mod hierarchy;
mod lists;
mod statements;
mod things;

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};

pub use bundle::LabelFilter;
pub use hierarchy::InMemoryClassHierarchyRepository;
pub use lists::InMemoryListRepository;
pub use statements::InMemoryStatementRepository;
pub use things::{
    InMemoryClassRepository, InMemoryLiteralRepository, InMemoryPredicateRepository,
    InMemoryResourceRepository, InMemoryThingRepository,
};

use super::entities::{Class, GeneralStatement, Literal, Predicate, Resource, Thing, ThingKind};
use super::errors::GraphError;
use super::identity::IdentityGenerator;
use super::value_objects::{ContributorId, StatementId, ThingId};
use crate::config::{IdentifierSettings, QuerySettings};

pub struct InMemoryGraph {
    state: Mutex<GraphState>,
    resource_ids: IdentityGenerator,
    literal_ids: IdentityGenerator,
    predicate_ids: IdentityGenerator,
    class_ids: IdentityGenerator,
    statement_ids: IdentityGenerator,
    traversal_timeout: Duration,
}

impl InMemoryGraph {
    #[must_use]
    pub fn new(identifiers: &IdentifierSettings, queries: &QuerySettings) -> Self {
        Self {
            state: Mutex::new(GraphState::default()),
            resource_ids: IdentityGenerator::new(identifiers.resource_prefix.clone()),
            literal_ids: IdentityGenerator::new(identifiers.literal_prefix.clone()),
            predicate_ids: IdentityGenerator::new(identifiers.predicate_prefix.clone()),
            class_ids: IdentityGenerator::new(identifiers.class_prefix.clone()),
            statement_ids: IdentityGenerator::new(identifiers.statement_prefix.clone()),
            traversal_timeout: queries.traversal_timeout(),
        }
    }

    #[must_use]
    pub fn traversal_timeout(&self) -> Duration {
        self.traversal_timeout
    }

    fn guard(&self) -> MutexGuard<'_, GraphState> {
        self.state.lock().expect("in-memory graph poisoned")
    }

    /// Generates and checks under the lock, so no other writer can claim the
    /// id between the probe and the return.
    fn next_thing_id(&self, generator: &IdentityGenerator) -> ThingId {
        let state = self.guard();
        ThingId::from_trusted(generator.next_unused(|candidate| state.contains_thing(candidate)))
    }

    fn next_statement_id(&self) -> StatementId {
        let state = self.guard();
        StatementId::from_trusted(
            self.statement_ids
                .next_unused(|candidate| state.statements.contains_key(candidate)),
        )
    }
}

impl Default for InMemoryGraph {
    fn default() -> Self {
        Self::new(&IdentifierSettings::default(), &QuerySettings::default())
    }
}

#[derive(Default)]
struct GraphState {
    resources: BTreeMap<ThingId, Resource>,
    literals: BTreeMap<ThingId, Literal>,
    predicates: BTreeMap<ThingId, Predicate>,
    classes: BTreeMap<ThingId, Class>,
    statements: BTreeMap<StatementId, StatementRecord>,
    /// Child class id to its parent edge.
    parents: BTreeMap<ThingId, SubclassEdge>,
}

#[derive(Clone, Debug)]
struct StatementRecord {
    id: StatementId,
    subject_id: ThingId,
    predicate_id: ThingId,
    object_id: ThingId,
    created_by: ContributorId,
    created_at: DateTime<Utc>,
    index: Option<i32>,
    modifiable: bool,
}

impl From<&GeneralStatement> for StatementRecord {
    fn from(statement: &GeneralStatement) -> Self {
        Self {
            id: statement.id.clone(),
            subject_id: statement.subject.id().clone(),
            predicate_id: statement.predicate.id.clone(),
            object_id: statement.object.id().clone(),
            created_by: statement.created_by,
            created_at: statement.created_at,
            index: statement.index,
            modifiable: statement.modifiable,
        }
    }
}

#[derive(Clone, Debug)]
struct SubclassEdge {
    parent_id: ThingId,
}

impl GraphState {
    fn contains_thing(&self, id: &str) -> bool {
        self.resources.contains_key(id)
            || self.literals.contains_key(id)
            || self.predicates.contains_key(id)
            || self.classes.contains_key(id)
    }

    /// Fails when `id` already belongs to a thing of another kind.
    fn claim(&self, id: &ThingId, kind: ThingKind) -> Result<(), GraphError> {
        match self.thing(id) {
            Some(thing) if thing.kind() != kind => {
                let id = id.clone();
                Err(match kind {
                    ThingKind::Resource => GraphError::ResourceAlreadyExists { id },
                    ThingKind::Literal => GraphError::LiteralAlreadyExists { id },
                    ThingKind::Predicate => GraphError::PredicateAlreadyExists { id },
                    ThingKind::Class => GraphError::ClassAlreadyExists { id },
                })
            }
            _ => Ok(()),
        }
    }

    fn thing(&self, id: &ThingId) -> Option<Thing> {
        if let Some(resource) = self.resources.get(id) {
            return Some(Thing::Resource(resource.clone()));
        }
        if let Some(literal) = self.literals.get(id) {
            return Some(Thing::Literal(literal.clone()));
        }
        if let Some(predicate) = self.predicates.get(id) {
            return Some(Thing::Predicate(predicate.clone()));
        }
        self.classes.get(id).cloned().map(Thing::Class)
    }

    /// Records whose endpoints no longer exist resolve to nothing.
    fn resolve(&self, record: &StatementRecord) -> Option<GeneralStatement> {
        Some(GeneralStatement {
            id: record.id.clone(),
            subject: self.thing(&record.subject_id)?,
            predicate: self.predicates.get(&record.predicate_id)?.clone(),
            object: self.thing(&record.object_id)?,
            created_by: record.created_by,
            created_at: record.created_at,
            index: record.index,
            modifiable: record.modifiable,
        })
    }

    fn general_statements(&self) -> impl Iterator<Item = GeneralStatement> + '_ {
        self.statements
            .values()
            .filter_map(|record| self.resolve(record))
    }

    fn parent_of(&self, id: &ThingId) -> Option<&ThingId> {
        self.parents.get(id).map(|edge| &edge.parent_id)
    }
}
