use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;

use super::{GraphState, InMemoryGraph, StatementRecord};
use crate::graph::{
    entities::{well_known, ExtractionMethod, List, Predicate, Resource, ThingKind, Visibility},
    errors::GraphError,
    repositories::ListRepository,
    value_objects::{ContributorId, StatementId, ThingId},
};

/// Lists are resources of class `List` whose elements hang off
/// `hasListElement` statements carrying the element position.
#[derive(Clone)]
pub struct InMemoryListRepository {
    graph: Arc<InMemoryGraph>,
}

impl InMemoryListRepository {
    #[must_use]
    pub fn new(graph: Arc<InMemoryGraph>) -> Self {
        Self { graph }
    }
}

impl GraphState {
    fn list_resource(&self, id: &ThingId) -> Option<&Resource> {
        self.resources
            .get(id)
            .filter(|resource| resource.has_class(&well_known::classes::list()))
    }

    fn element_statement_ids(&self, list_id: &ThingId) -> BTreeSet<StatementId> {
        let has_list_element = well_known::predicates::has_list_element();
        self.statements
            .values()
            .filter(|record| &record.subject_id == list_id && record.predicate_id == has_list_element)
            .map(|record| record.id.clone())
            .collect()
    }
}

#[async_trait]
impl ListRepository for InMemoryListRepository {
    type Error = GraphError;

    async fn next_identity(&self) -> Result<ThingId, Self::Error> {
        Ok(self.graph.next_thing_id(&self.graph.resource_ids))
    }

    async fn save(&self, list: List, contributor: ContributorId) -> Result<(), Self::Error> {
        let has_list_element = well_known::predicates::has_list_element();
        let mut state = self.graph.guard();
        state.claim(&list.id, ThingKind::Resource)?;

        let previous = state.resources.get(&list.id).cloned();
        let mut resource = previous.unwrap_or_else(|| Resource {
            id: list.id.clone(),
            label: list.label.clone(),
            classes: BTreeSet::new(),
            created_by: list.created_by,
            created_at: list.created_at,
            observatory_id: None,
            organization_id: None,
            extraction_method: ExtractionMethod::Unknown,
            verified: false,
            visibility: Visibility::Default,
            modifiable: list.modifiable,
        });
        resource.label.clone_from(&list.label);
        resource.modifiable = list.modifiable;
        resource.classes.insert(well_known::classes::list());
        state.resources.insert(resource.id.clone(), resource);

        state
            .predicates
            .entry(has_list_element.clone())
            .or_insert_with(|| Predicate {
                id: has_list_element.clone(),
                label: "has list element".to_string(),
                description: None,
                created_by: ContributorId::UNKNOWN,
                created_at: list.created_at,
                modifiable: false,
            });

        let stale = state.element_statement_ids(&list.id);
        state.statements.retain(|id, _| !stale.contains(id));

        for (index, element) in list.elements.iter().enumerate() {
            let id = StatementId::from_trusted(
                self.graph
                    .statement_ids
                    .next_unused(|candidate| state.statements.contains_key(candidate)),
            );
            let record = StatementRecord {
                id: id.clone(),
                subject_id: list.id.clone(),
                predicate_id: has_list_element.clone(),
                object_id: element.clone(),
                created_by: contributor,
                created_at: list.created_at,
                index: Some(i32::try_from(index).unwrap_or(i32::MAX)),
                modifiable: true,
            };
            state.statements.insert(id, record);
        }
        tracing::debug!(list_id = %list.id, elements = list.elements.len(), "saved list");
        Ok(())
    }

    async fn find_by_id(&self, id: &ThingId) -> Result<Option<List>, Self::Error> {
        let state = self.graph.guard();
        let Some(resource) = state.list_resource(id) else {
            return Ok(None);
        };
        let has_list_element = well_known::predicates::has_list_element();
        let mut elements: Vec<(Option<i32>, &ThingId)> = state
            .statements
            .values()
            .filter(|record| &record.subject_id == id && record.predicate_id == has_list_element)
            .map(|record| (record.index, &record.object_id))
            .collect();
        elements.sort();

        Ok(Some(List {
            id: resource.id.clone(),
            label: resource.label.clone(),
            elements: elements.into_iter().map(|(_, element)| element.clone()).collect(),
            created_by: resource.created_by,
            created_at: resource.created_at,
            modifiable: resource.modifiable,
        }))
    }

    async fn exists(&self, id: &ThingId) -> Result<bool, Self::Error> {
        Ok(self.graph.guard().list_resource(id).is_some())
    }

    async fn delete(&self, id: &ThingId) -> Result<(), Self::Error> {
        let mut state = self.graph.guard();
        let elements = state.element_statement_ids(id);
        state.statements.retain(|statement_id, _| !elements.contains(statement_id));
        state.resources.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn id(value: &str) -> ThingId {
        ThingId::new(value).expect("valid id")
    }

    fn list(elements: &[&str]) -> List {
        List {
            id: id("R10"),
            label: "reading list".to_string(),
            elements: elements.iter().map(|element| id(element)).collect(),
            created_by: ContributorId::UNKNOWN,
            created_at: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            modifiable: true,
        }
    }

    #[tokio::test]
    async fn keeps_element_order_and_replaces_elements() {
        let graph = Arc::new(InMemoryGraph::default());
        let lists = InMemoryListRepository::new(graph.clone());

        lists.save(list(&["R3", "R1", "R2"]), ContributorId::UNKNOWN).await.unwrap();
        let stored = lists.find_by_id(&id("R10")).await.unwrap().unwrap();
        assert_eq!(stored.elements, vec![id("R3"), id("R1"), id("R2")]);

        lists.save(list(&["R2"]), ContributorId::UNKNOWN).await.unwrap();
        let stored = lists.find_by_id(&id("R10")).await.unwrap().unwrap();
        assert_eq!(stored.elements, vec![id("R2")]);
        assert_eq!(graph.guard().statements.len(), 1);
    }

    #[tokio::test]
    async fn plain_resources_are_not_lists() {
        let graph = Arc::new(InMemoryGraph::default());
        let lists = InMemoryListRepository::new(graph);

        assert!(!lists.exists(&id("R10")).await.unwrap());
        lists.save(list(&["R1"]), ContributorId::UNKNOWN).await.unwrap();
        assert!(lists.exists(&id("R10")).await.unwrap());

        lists.delete(&id("R10")).await.unwrap();
        assert!(lists.find_by_id(&id("R10")).await.unwrap().is_none());
    }
}
