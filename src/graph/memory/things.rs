use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;

use super::InMemoryGraph;
use crate::graph::{
    entities::{Class, Literal, Predicate, Resource, Thing, ThingKind, VisibilityFilter},
    errors::GraphError,
    pagination::{Page, Pageable, Sortable},
    repositories::{
        ClassRepository, LiteralRepository, PredicateRepository, ResourceRepository,
        ThingRepository,
    },
    value_objects::{ContributorId, SearchString, ThingId, Uri},
};

fn select<T>(table: &BTreeMap<ThingId, T>, pageable: &Pageable, keep: impl Fn(&T) -> bool) -> Page<T>
where
    T: Sortable + Clone,
{
    Page::sorted(
        table.values().filter(|entity| keep(entity)).cloned().collect(),
        pageable,
    )
}

#[derive(Clone)]
pub struct InMemoryThingRepository {
    graph: Arc<InMemoryGraph>,
}

impl InMemoryThingRepository {
    #[must_use]
    pub fn new(graph: Arc<InMemoryGraph>) -> Self {
        Self { graph }
    }
}

#[async_trait]
impl ThingRepository for InMemoryThingRepository {
    type Error = GraphError;

    async fn find_by_thing_id(&self, id: &ThingId) -> Result<Option<Thing>, Self::Error> {
        Ok(self.graph.guard().thing(id))
    }

    async fn exists_all(&self, ids: &BTreeSet<ThingId>) -> Result<bool, Self::Error> {
        let state = self.graph.guard();
        Ok(ids.iter().all(|id| state.contains_thing(id.as_str())))
    }
}

#[derive(Clone)]
pub struct InMemoryResourceRepository {
    graph: Arc<InMemoryGraph>,
}

impl InMemoryResourceRepository {
    #[must_use]
    pub fn new(graph: Arc<InMemoryGraph>) -> Self {
        Self { graph }
    }
}

#[async_trait]
impl ResourceRepository for InMemoryResourceRepository {
    type Error = GraphError;

    async fn next_identity(&self) -> Result<ThingId, Self::Error> {
        Ok(self.graph.next_thing_id(&self.graph.resource_ids))
    }

    async fn save(&self, resource: Resource) -> Result<(), Self::Error> {
        let mut state = self.graph.guard();
        state.claim(&resource.id, ThingKind::Resource)?;
        state.resources.insert(resource.id.clone(), resource);
        Ok(())
    }

    async fn find_by_id(&self, id: &ThingId) -> Result<Option<Resource>, Self::Error> {
        Ok(self.graph.guard().resources.get(id).cloned())
    }

    async fn exists(&self, id: &ThingId) -> Result<bool, Self::Error> {
        Ok(self.graph.guard().resources.contains_key(id))
    }

    async fn find_all(&self, pageable: &Pageable) -> Result<Page<Resource>, Self::Error> {
        Ok(select(&self.graph.guard().resources, pageable, |_| true))
    }

    async fn find_all_by_label(
        &self,
        label: &SearchString,
        pageable: &Pageable,
    ) -> Result<Page<Resource>, Self::Error> {
        Ok(select(&self.graph.guard().resources, pageable, |it| {
            label.matches(&it.label)
        }))
    }

    async fn find_all_by_class(
        &self,
        class: &ThingId,
        pageable: &Pageable,
    ) -> Result<Page<Resource>, Self::Error> {
        Ok(select(&self.graph.guard().resources, pageable, |it| {
            it.has_class(class)
        }))
    }

    async fn find_all_by_visibility(
        &self,
        filter: VisibilityFilter,
        classes: &BTreeSet<ThingId>,
        pageable: &Pageable,
    ) -> Result<Page<Resource>, Self::Error> {
        Ok(select(&self.graph.guard().resources, pageable, |it| {
            filter.matches(it.visibility) && classes.is_subset(&it.classes)
        }))
    }

    async fn find_all_contributor_ids(
        &self,
        pageable: &Pageable,
    ) -> Result<Page<ContributorId>, Self::Error> {
        let contributors: BTreeSet<ContributorId> = self
            .graph
            .guard()
            .resources
            .values()
            .map(|it| it.created_by)
            .collect();
        Ok(Page::from_ordered(
            contributors.into_iter().collect(),
            pageable,
        ))
    }

    async fn delete_by_id(&self, id: &ThingId) -> Result<(), Self::Error> {
        self.graph.guard().resources.remove(id);
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), Self::Error> {
        self.graph.guard().resources.clear();
        Ok(())
    }
}

#[derive(Clone)]
pub struct InMemoryLiteralRepository {
    graph: Arc<InMemoryGraph>,
}

impl InMemoryLiteralRepository {
    #[must_use]
    pub fn new(graph: Arc<InMemoryGraph>) -> Self {
        Self { graph }
    }
}

#[async_trait]
impl LiteralRepository for InMemoryLiteralRepository {
    type Error = GraphError;

    async fn next_identity(&self) -> Result<ThingId, Self::Error> {
        Ok(self.graph.next_thing_id(&self.graph.literal_ids))
    }

    async fn save(&self, literal: Literal) -> Result<(), Self::Error> {
        let mut state = self.graph.guard();
        state.claim(&literal.id, ThingKind::Literal)?;
        state.literals.insert(literal.id.clone(), literal);
        Ok(())
    }

    async fn find_by_id(&self, id: &ThingId) -> Result<Option<Literal>, Self::Error> {
        Ok(self.graph.guard().literals.get(id).cloned())
    }

    async fn exists(&self, id: &ThingId) -> Result<bool, Self::Error> {
        Ok(self.graph.guard().literals.contains_key(id))
    }

    async fn find_all(&self, pageable: &Pageable) -> Result<Page<Literal>, Self::Error> {
        Ok(select(&self.graph.guard().literals, pageable, |_| true))
    }

    async fn find_all_by_label(
        &self,
        label: &SearchString,
        pageable: &Pageable,
    ) -> Result<Page<Literal>, Self::Error> {
        Ok(select(&self.graph.guard().literals, pageable, |it| {
            label.matches(&it.label)
        }))
    }

    async fn delete_by_id(&self, id: &ThingId) -> Result<(), Self::Error> {
        self.graph.guard().literals.remove(id);
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), Self::Error> {
        self.graph.guard().literals.clear();
        Ok(())
    }
}

#[derive(Clone)]
pub struct InMemoryPredicateRepository {
    graph: Arc<InMemoryGraph>,
}

impl InMemoryPredicateRepository {
    #[must_use]
    pub fn new(graph: Arc<InMemoryGraph>) -> Self {
        Self { graph }
    }
}

#[async_trait]
impl PredicateRepository for InMemoryPredicateRepository {
    type Error = GraphError;

    async fn next_identity(&self) -> Result<ThingId, Self::Error> {
        Ok(self.graph.next_thing_id(&self.graph.predicate_ids))
    }

    async fn save(&self, predicate: Predicate) -> Result<(), Self::Error> {
        let mut state = self.graph.guard();
        state.claim(&predicate.id, ThingKind::Predicate)?;
        state.predicates.insert(predicate.id.clone(), predicate);
        Ok(())
    }

    async fn find_by_id(&self, id: &ThingId) -> Result<Option<Predicate>, Self::Error> {
        Ok(self.graph.guard().predicates.get(id).cloned())
    }

    async fn exists(&self, id: &ThingId) -> Result<bool, Self::Error> {
        Ok(self.graph.guard().predicates.contains_key(id))
    }

    async fn find_all(&self, pageable: &Pageable) -> Result<Page<Predicate>, Self::Error> {
        Ok(select(&self.graph.guard().predicates, pageable, |_| true))
    }

    async fn find_all_by_label(
        &self,
        label: &SearchString,
        pageable: &Pageable,
    ) -> Result<Page<Predicate>, Self::Error> {
        Ok(select(&self.graph.guard().predicates, pageable, |it| {
            label.matches(&it.label)
        }))
    }

    async fn delete_by_id(&self, id: &ThingId) -> Result<(), Self::Error> {
        self.graph.guard().predicates.remove(id);
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), Self::Error> {
        self.graph.guard().predicates.clear();
        Ok(())
    }
}

#[derive(Clone)]
pub struct InMemoryClassRepository {
    graph: Arc<InMemoryGraph>,
}

impl InMemoryClassRepository {
    #[must_use]
    pub fn new(graph: Arc<InMemoryGraph>) -> Self {
        Self { graph }
    }
}

#[async_trait]
impl ClassRepository for InMemoryClassRepository {
    type Error = GraphError;

    async fn next_identity(&self) -> Result<ThingId, Self::Error> {
        Ok(self.graph.next_thing_id(&self.graph.class_ids))
    }

    async fn save(&self, class: Class) -> Result<(), Self::Error> {
        let mut state = self.graph.guard();
        state.claim(&class.id, ThingKind::Class)?;
        state.classes.insert(class.id.clone(), class);
        Ok(())
    }

    async fn find_by_id(&self, id: &ThingId) -> Result<Option<Class>, Self::Error> {
        Ok(self.graph.guard().classes.get(id).cloned())
    }

    async fn exists(&self, id: &ThingId) -> Result<bool, Self::Error> {
        Ok(self.graph.guard().classes.contains_key(id))
    }

    async fn exists_all(&self, ids: &BTreeSet<ThingId>) -> Result<bool, Self::Error> {
        let state = self.graph.guard();
        Ok(ids.iter().all(|id| state.classes.contains_key(id)))
    }

    async fn find_by_uri(&self, uri: &Uri) -> Result<Option<Class>, Self::Error> {
        Ok(self
            .graph
            .guard()
            .classes
            .values()
            .find(|class| class.uri.as_ref() == Some(uri))
            .cloned())
    }

    async fn find_all(&self, pageable: &Pageable) -> Result<Page<Class>, Self::Error> {
        Ok(select(&self.graph.guard().classes, pageable, |_| true))
    }

    async fn find_all_by_label(
        &self,
        label: &SearchString,
        pageable: &Pageable,
    ) -> Result<Page<Class>, Self::Error> {
        Ok(select(&self.graph.guard().classes, pageable, |it| {
            label.matches(&it.label)
        }))
    }

    async fn delete_by_id(&self, id: &ThingId) -> Result<(), Self::Error> {
        self.graph.guard().classes.remove(id);
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), Self::Error> {
        self.graph.guard().classes.clear();
        Ok(())
    }
}
