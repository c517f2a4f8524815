use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;

use super::{GraphState, InMemoryGraph, SubclassEdge};
use crate::graph::{
    entities::{ChildClass, Class, ClassHierarchyEntry, ClassSubclassRelation},
    errors::GraphError,
    pagination::{Page, Pageable},
    repositories::ClassHierarchyRepository,
    value_objects::ThingId,
};

#[derive(Clone)]
pub struct InMemoryClassHierarchyRepository {
    graph: Arc<InMemoryGraph>,
}

impl InMemoryClassHierarchyRepository {
    #[must_use]
    pub fn new(graph: Arc<InMemoryGraph>) -> Self {
        Self { graph }
    }
}

impl GraphState {
    fn children_of(&self, id: &ThingId) -> impl Iterator<Item = &ThingId> + '_ {
        let id = id.clone();
        self.parents
            .iter()
            .filter(move |(_, edge)| edge.parent_id == id)
            .map(|(child, _)| child)
    }

    /// The class and all its transitive subclasses.
    fn descendants_and_self(&self, id: &ThingId) -> BTreeSet<ThingId> {
        let mut children: BTreeMap<&ThingId, Vec<&ThingId>> = BTreeMap::new();
        for (child, edge) in &self.parents {
            children.entry(&edge.parent_id).or_default().push(child);
        }

        let mut visited = BTreeSet::from([id.clone()]);
        let mut queue = VecDeque::from([id.clone()]);
        while let Some(current) = queue.pop_front() {
            for child in children.get(&current).into_iter().flatten() {
                if visited.insert((*child).clone()) {
                    queue.push_back((*child).clone());
                }
            }
        }
        visited
    }

    /// Parent chain starting at `id`, guarded against malformed cycles.
    fn ancestors_and_self(&self, id: &ThingId) -> Vec<ThingId> {
        let mut chain = vec![id.clone()];
        let mut seen = BTreeSet::from([id.clone()]);
        let mut current = id;
        while let Some(parent) = self.parent_of(current) {
            if !seen.insert(parent.clone()) {
                break;
            }
            chain.push(parent.clone());
            current = parent;
        }
        chain
    }
}

#[async_trait]
impl ClassHierarchyRepository for InMemoryClassHierarchyRepository {
    type Error = GraphError;

    async fn save(&self, relation: ClassSubclassRelation) -> Result<(), Self::Error> {
        self.graph.guard().parents.insert(
            relation.child.id,
            SubclassEdge {
                parent_id: relation.parent.id,
            },
        );
        Ok(())
    }

    async fn save_all(&self, relations: Vec<ClassSubclassRelation>) -> Result<(), Self::Error> {
        let mut state = self.graph.guard();
        for relation in relations {
            state.parents.insert(
                relation.child.id,
                SubclassEdge {
                    parent_id: relation.parent.id,
                },
            );
        }
        Ok(())
    }

    async fn find_parent(&self, id: &ThingId) -> Result<Option<Class>, Self::Error> {
        let state = self.graph.guard();
        Ok(state
            .parent_of(id)
            .and_then(|parent| state.classes.get(parent))
            .cloned())
    }

    async fn find_root(&self, id: &ThingId) -> Result<Option<Class>, Self::Error> {
        let state = self.graph.guard();
        if !state.classes.contains_key(id) {
            return Ok(None);
        }
        let chain = state.ancestors_and_self(id);
        Ok(chain.last().and_then(|root| state.classes.get(root)).cloned())
    }

    async fn find_all_roots(&self, pageable: &Pageable) -> Result<Page<Class>, Self::Error> {
        let state = self.graph.guard();
        let roots = state
            .classes
            .values()
            .filter(|class| !state.parents.contains_key(&class.id))
            .cloned()
            .collect();
        Ok(Page::from_ordered(roots, pageable))
    }

    async fn find_children(
        &self,
        id: &ThingId,
        pageable: &Pageable,
    ) -> Result<Page<ChildClass>, Self::Error> {
        let state = self.graph.guard();
        let children = state
            .children_of(id)
            .filter_map(|child| state.classes.get(child))
            .map(|class| ChildClass {
                class: class.clone(),
                child_count: state.children_of(&class.id).count() as u64,
            })
            .collect();
        Ok(Page::from_ordered(children, pageable))
    }

    async fn find_class_hierarchy(
        &self,
        id: &ThingId,
        pageable: &Pageable,
    ) -> Result<Page<ClassHierarchyEntry>, Self::Error> {
        let state = self.graph.guard();
        if !state.classes.contains_key(id) {
            return Ok(Page::empty(pageable));
        }
        let chain: BTreeSet<ThingId> = state.ancestors_and_self(id).into_iter().collect();
        let entries = chain
            .iter()
            .filter_map(|class_id| state.classes.get(class_id))
            .map(|class| ClassHierarchyEntry {
                class: class.clone(),
                parent_id: state.parent_of(&class.id).cloned(),
            })
            .collect();
        Ok(Page::from_ordered(entries, pageable))
    }

    async fn count_class_instances(&self, id: &ThingId) -> Result<u64, Self::Error> {
        let state = self.graph.guard();
        let classes = state.descendants_and_self(id);
        Ok(state
            .resources
            .values()
            .filter(|resource| !resource.classes.is_disjoint(&classes))
            .count() as u64)
    }

    async fn exists_child(&self, id: &ThingId, child_id: &ThingId) -> Result<bool, Self::Error> {
        let state = self.graph.guard();
        Ok(state
            .ancestors_and_self(child_id)
            .iter()
            .skip(1)
            .any(|ancestor| ancestor == id))
    }

    async fn exists_children(&self, id: &ThingId) -> Result<bool, Self::Error> {
        Ok(self.graph.guard().children_of(id).next().is_some())
    }

    async fn delete_by_child_class_id(&self, id: &ThingId) -> Result<(), Self::Error> {
        self.graph.guard().parents.remove(id);
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), Self::Error> {
        self.graph.guard().parents.clear();
        Ok(())
    }
}
