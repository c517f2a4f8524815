use std::collections::BTreeSet;
use std::sync::Arc;

use super::Repositories;
use crate::graph::{
    clock::Clock,
    entities::{ChildClass, Class, ClassHierarchyEntry, ClassSubclassRelation},
    errors::GraphError,
    pagination::{Page, Pageable},
    value_objects::{ContributorId, ThingId},
    ClassHandle, ClassHierarchyHandle,
};

/// Maintains the single-parent subclass tree.
#[derive(Clone)]
pub struct ClassHierarchyService {
    classes: Arc<ClassHandle>,
    hierarchy: Arc<ClassHierarchyHandle>,
    clock: Arc<dyn Clock>,
}

impl ClassHierarchyService {
    #[must_use]
    pub fn new(repositories: &Repositories, clock: Arc<dyn Clock>) -> Self {
        Self {
            classes: repositories.classes.clone(),
            hierarchy: repositories.hierarchy.clone(),
            clock,
        }
    }

    /// Makes every class of `child_ids` a direct subclass of `parent_id`.
    ///
    /// With `check_if_parent_is_leaf` the parent must not have children yet.
    /// Either all edges are written or none.
    #[tracing::instrument(skip(self, child_ids), fields(%parent_id, children = child_ids.len()))]
    pub async fn create(
        &self,
        contributor: ContributorId,
        parent_id: &ThingId,
        child_ids: &BTreeSet<ThingId>,
        check_if_parent_is_leaf: bool,
    ) -> Result<(), GraphError> {
        let parent = self.existing(parent_id).await?;
        if check_if_parent_is_leaf && self.hierarchy.exists_children(parent_id).await? {
            return Err(GraphError::ParentClassAlreadyHasChildren {
                id: parent_id.clone(),
            });
        }

        let now = self.clock.now();
        let mut relations = Vec::with_capacity(child_ids.len());
        for child_id in child_ids {
            if child_id == parent_id || self.hierarchy.exists_child(child_id, parent_id).await? {
                return Err(GraphError::InvalidSubclassRelation {
                    child: child_id.clone(),
                    parent: parent_id.clone(),
                });
            }
            let child = self.existing(child_id).await?;
            if let Some(current) = self.hierarchy.find_parent(child_id).await? {
                return Err(GraphError::ParentClassAlreadyExists {
                    child: child_id.clone(),
                    parent: current.id,
                });
            }
            relations.push(ClassSubclassRelation {
                child,
                parent: parent.clone(),
                created_by: contributor,
                created_at: now,
            });
        }
        self.hierarchy.save_all(relations).await
    }

    /// Detaches a class from its parent.
    #[tracing::instrument(skip(self), fields(%child_id))]
    pub async fn delete(&self, child_id: &ThingId) -> Result<(), GraphError> {
        self.existing(child_id).await?;
        self.hierarchy.delete_by_child_class_id(child_id).await
    }

    pub async fn find_parent(&self, id: &ThingId) -> Result<Option<Class>, GraphError> {
        self.existing(id).await?;
        self.hierarchy.find_parent(id).await
    }

    pub async fn find_root(&self, id: &ThingId) -> Result<Option<Class>, GraphError> {
        self.existing(id).await?;
        self.hierarchy.find_root(id).await
    }

    pub async fn find_all_roots(&self, pageable: &Pageable) -> Result<Page<Class>, GraphError> {
        self.hierarchy.find_all_roots(pageable).await
    }

    pub async fn find_children(
        &self,
        id: &ThingId,
        pageable: &Pageable,
    ) -> Result<Page<ChildClass>, GraphError> {
        self.existing(id).await?;
        self.hierarchy.find_children(id, pageable).await
    }

    pub async fn find_class_hierarchy(
        &self,
        id: &ThingId,
        pageable: &Pageable,
    ) -> Result<Page<ClassHierarchyEntry>, GraphError> {
        self.existing(id).await?;
        self.hierarchy.find_class_hierarchy(id, pageable).await
    }

    pub async fn count_class_instances(&self, id: &ThingId) -> Result<u64, GraphError> {
        self.existing(id).await?;
        self.hierarchy.count_class_instances(id).await
    }

    async fn existing(&self, id: &ThingId) -> Result<Class, GraphError> {
        self.classes
            .find_by_id(id)
            .await?
            .ok_or_else(|| GraphError::class_not_found(id))
    }
}
