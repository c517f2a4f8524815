use std::collections::BTreeSet;
use std::sync::Arc;

use super::{checked_label, Repositories};
use crate::graph::{
    clock::Clock,
    entities::{List, Thing},
    errors::GraphError,
    pagination::{Page, Pageable},
    value_objects::{ContributorId, ThingId},
    ListHandle, StatementHandle, ThingHandle,
};

#[derive(Clone, Debug)]
pub struct CreateListCommand {
    pub id: Option<ThingId>,
    pub label: String,
    pub elements: Vec<ThingId>,
    pub contributor: ContributorId,
    pub modifiable: bool,
}

impl CreateListCommand {
    #[must_use]
    pub fn new(label: impl Into<String>, elements: Vec<ThingId>) -> Self {
        Self {
            id: None,
            label: label.into(),
            elements,
            contributor: ContributorId::UNKNOWN,
            modifiable: true,
        }
    }
}

#[derive(Clone, Debug)]
pub struct UpdateListCommand {
    pub id: ThingId,
    pub label: Option<String>,
    pub elements: Option<Vec<ThingId>>,
    pub contributor: ContributorId,
}

#[derive(Clone)]
pub struct ListService {
    things: Arc<ThingHandle>,
    lists: Arc<ListHandle>,
    statements: Arc<StatementHandle>,
    clock: Arc<dyn Clock>,
}

impl ListService {
    #[must_use]
    pub fn new(repositories: &Repositories, clock: Arc<dyn Clock>) -> Self {
        Self {
            things: repositories.things.clone(),
            lists: repositories.lists.clone(),
            statements: repositories.statements.clone(),
            clock,
        }
    }

    #[tracing::instrument(skip_all, fields(label = %command.label, elements = command.elements.len()))]
    pub async fn create(&self, command: CreateListCommand) -> Result<ThingId, GraphError> {
        let label = checked_label(&command.label)?;
        if let Some(id) = &command.id {
            if self.things.find_by_thing_id(id).await?.is_some() {
                return Err(GraphError::ResourceAlreadyExists { id: id.clone() });
            }
        }
        self.check_elements(&command.elements).await?;

        let id = match command.id {
            Some(id) => id,
            None => self.lists.next_identity().await?,
        };
        self.lists
            .save(
                List {
                    id: id.clone(),
                    label,
                    elements: command.elements,
                    created_by: command.contributor,
                    created_at: self.clock.now(),
                    modifiable: command.modifiable,
                },
                command.contributor,
            )
            .await?;
        tracing::info!(%id, "created list");
        Ok(id)
    }

    #[tracing::instrument(skip_all, fields(id = %command.id))]
    pub async fn update(&self, command: UpdateListCommand) -> Result<(), GraphError> {
        let mut list = self.existing(&command.id).await?;
        if !list.modifiable {
            return Err(GraphError::ListNotModifiable { id: command.id });
        }
        if let Some(label) = &command.label {
            list.label = checked_label(label)?;
        }
        if let Some(elements) = command.elements {
            self.check_elements(&elements).await?;
            list.elements = elements;
        }
        self.lists.save(list, command.contributor).await
    }

    pub async fn find_by_id(&self, id: &ThingId) -> Result<Option<List>, GraphError> {
        self.lists.find_by_id(id).await
    }

    pub async fn exists(&self, id: &ThingId) -> Result<bool, GraphError> {
        self.lists.exists(id).await
    }

    /// The elements of a list, in list order.
    pub async fn find_all_elements(
        &self,
        id: &ThingId,
        pageable: &Pageable,
    ) -> Result<Page<Thing>, GraphError> {
        let list = self.existing(id).await?;
        let mut elements = Vec::with_capacity(list.elements.len());
        for element in &list.elements {
            if let Some(thing) = self.things.find_by_thing_id(element).await? {
                elements.push(thing);
            }
        }
        Ok(Page::from_ordered(elements, pageable))
    }

    /// Deletes a list nothing points at, together with its element
    /// statements.
    #[tracing::instrument(skip(self), fields(%id))]
    pub async fn delete(&self, id: &ThingId) -> Result<(), GraphError> {
        let list = self.existing(id).await?;
        if !list.modifiable {
            return Err(GraphError::ListNotModifiable { id: id.clone() });
        }
        if self.statements.count_statements_about_resource(id).await? > 0 {
            return Err(GraphError::ResourceUsedInStatement { id: id.clone() });
        }
        self.lists.delete(id).await
    }

    async fn existing(&self, id: &ThingId) -> Result<List, GraphError> {
        self.lists
            .find_by_id(id)
            .await?
            .ok_or_else(|| GraphError::ListNotFound { id: id.clone() })
    }

    async fn check_elements(&self, elements: &[ThingId]) -> Result<(), GraphError> {
        let ids: BTreeSet<ThingId> = elements.iter().cloned().collect();
        if self.things.exists_all(&ids).await? {
            Ok(())
        } else {
            Err(GraphError::ListElementNotFound)
        }
    }
}
