use std::collections::BTreeSet;
use std::sync::Arc;

use super::{checked_label, Repositories};
use crate::graph::{
    clock::Clock,
    entities::{well_known, Class},
    errors::GraphError,
    pagination::{Page, Pageable},
    value_objects::{ContributorId, SearchString, ThingId, Uri},
    ClassHandle, ClassHierarchyHandle, ResourceHandle, StatementHandle, ThingHandle,
};

#[derive(Clone, Debug)]
pub struct CreateClassCommand {
    /// Generated when absent.
    pub id: Option<ThingId>,
    pub label: String,
    pub uri: Option<Uri>,
    pub contributor: ContributorId,
    pub modifiable: bool,
}

impl CreateClassCommand {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: None,
            label: label.into(),
            uri: None,
            contributor: ContributorId::UNKNOWN,
            modifiable: true,
        }
    }
}

/// Partial update; unset fields keep their value.
#[derive(Clone, Debug)]
pub struct UpdateClassCommand {
    pub id: ThingId,
    pub label: Option<String>,
    pub uri: Option<Uri>,
    pub modifiable: Option<bool>,
}

impl UpdateClassCommand {
    #[must_use]
    pub fn new(id: ThingId) -> Self {
        Self {
            id,
            label: None,
            uri: None,
            modifiable: None,
        }
    }
}

#[derive(Clone)]
pub struct ClassService {
    things: Arc<ThingHandle>,
    classes: Arc<ClassHandle>,
    hierarchy: Arc<ClassHierarchyHandle>,
    resources: Arc<ResourceHandle>,
    statements: Arc<StatementHandle>,
    clock: Arc<dyn Clock>,
}

impl ClassService {
    #[must_use]
    pub fn new(repositories: &Repositories, clock: Arc<dyn Clock>) -> Self {
        Self {
            things: repositories.things.clone(),
            classes: repositories.classes.clone(),
            hierarchy: repositories.hierarchy.clone(),
            resources: repositories.resources.clone(),
            statements: repositories.statements.clone(),
            clock,
        }
    }

    #[tracing::instrument(skip_all, fields(label = %command.label))]
    pub async fn create(&self, command: CreateClassCommand) -> Result<ThingId, GraphError> {
        let label = checked_label(&command.label)?;
        if let Some(id) = &command.id {
            if well_known::classes::reserved().contains(id) {
                return Err(GraphError::ClassNotAllowed { id: id.clone() });
            }
            if self.things.find_by_thing_id(id).await?.is_some() {
                return Err(GraphError::ClassAlreadyExists { id: id.clone() });
            }
        }
        if let Some(uri) = &command.uri {
            self.ensure_uri_unused(uri).await?;
        }

        let id = match command.id {
            Some(id) => id,
            None => self.classes.next_identity().await?,
        };
        self.classes
            .save(Class {
                id: id.clone(),
                label,
                uri: command.uri,
                created_by: command.contributor,
                created_at: self.clock.now(),
                modifiable: command.modifiable,
            })
            .await?;
        tracing::info!(%id, "created class");
        Ok(id)
    }

    pub async fn find_by_id(&self, id: &ThingId) -> Result<Option<Class>, GraphError> {
        self.classes.find_by_id(id).await
    }

    pub async fn find_by_uri(&self, uri: &Uri) -> Result<Option<Class>, GraphError> {
        self.classes.find_by_uri(uri).await
    }

    pub async fn find_all(&self, pageable: &Pageable) -> Result<Page<Class>, GraphError> {
        self.classes.find_all(pageable).await
    }

    pub async fn find_all_by_label(
        &self,
        label: &SearchString,
        pageable: &Pageable,
    ) -> Result<Page<Class>, GraphError> {
        self.classes.find_all_by_label(label, pageable).await
    }

    pub async fn exists_all(&self, ids: &BTreeSet<ThingId>) -> Result<bool, GraphError> {
        self.classes.exists_all(ids).await
    }

    #[tracing::instrument(skip_all, fields(id = %command.id))]
    pub async fn update(&self, command: UpdateClassCommand) -> Result<(), GraphError> {
        let mut class = self.modifiable_class(&command.id).await?;
        if let Some(label) = &command.label {
            class.label = checked_label(label)?;
        }
        if let Some(uri) = command.uri {
            self.check_uri_change(&class, &uri).await?;
            class.uri = Some(uri);
        }
        if let Some(modifiable) = command.modifiable {
            class.modifiable = modifiable;
        }
        self.classes.save(class).await
    }

    /// Sets the URI of a class. Setting the current URI again succeeds
    /// without change; a URI that is already set cannot be replaced.
    #[tracing::instrument(skip(self), fields(%id, %uri))]
    pub async fn update_uri(&self, id: &ThingId, uri: Uri) -> Result<(), GraphError> {
        let mut class = self
            .classes
            .find_by_id(id)
            .await?
            .ok_or_else(|| GraphError::class_not_found(id))?;
        if class.uri.as_ref() == Some(&uri) {
            return Ok(());
        }
        self.check_uri_change(&class, &uri).await?;
        class.uri = Some(uri);
        self.classes.save(class).await
    }

    /// Deletes an unused class together with its own parent edge.
    #[tracing::instrument(skip(self), fields(%id))]
    pub async fn delete(&self, id: &ThingId) -> Result<(), GraphError> {
        self.modifiable_class(id).await?;
        let instances = self
            .resources
            .find_all_by_class(id, &Pageable::new(0, 1))
            .await?;
        if instances.total_elements > 0
            || self.statements.check_if_resource_has_statements(id).await?
            || self.hierarchy.exists_children(id).await?
        {
            return Err(GraphError::ClassInUse { id: id.clone() });
        }
        self.hierarchy.delete_by_child_class_id(id).await?;
        self.classes.delete_by_id(id).await?;
        tracing::info!("deleted class");
        Ok(())
    }

    /// Administrative bulk removal of every class and subclass edge.
    pub async fn delete_all(&self) -> Result<(), GraphError> {
        self.hierarchy.delete_all().await?;
        self.classes.delete_all().await
    }

    async fn modifiable_class(&self, id: &ThingId) -> Result<Class, GraphError> {
        let class = self
            .classes
            .find_by_id(id)
            .await?
            .ok_or_else(|| GraphError::class_not_found(id))?;
        if !class.modifiable {
            return Err(GraphError::ClassNotModifiable { id: id.clone() });
        }
        Ok(class)
    }

    async fn check_uri_change(&self, class: &Class, uri: &Uri) -> Result<(), GraphError> {
        match &class.uri {
            Some(current) if current == uri => Ok(()),
            Some(_) => Err(GraphError::UpdateNotAllowed {
                id: class.id.clone(),
            }),
            None => self.ensure_uri_unused(uri).await,
        }
    }

    async fn ensure_uri_unused(&self, uri: &Uri) -> Result<(), GraphError> {
        match self.classes.find_by_uri(uri).await? {
            Some(owner) => Err(GraphError::UriAlreadyInUse {
                uri: uri.clone(),
                id: owner.id,
            }),
            None => Ok(()),
        }
    }
}
