use std::collections::BTreeSet;
use std::sync::Arc;

use super::{checked_label, Repositories};
use crate::graph::{
    clock::Clock,
    entities::{
        well_known, ExtractionMethod, Literal, Resource, ResourceContributor, Visibility,
        VisibilityFilter,
    },
    errors::GraphError,
    pagination::{Page, Pageable},
    value_objects::{ContributorId, ObservatoryId, OrganizationId, SearchString, ThingId},
    ClassHandle, ResourceHandle, StatementHandle, ThingHandle,
};

#[derive(Clone, Debug)]
pub struct CreateResourceCommand {
    /// Generated when absent.
    pub id: Option<ThingId>,
    pub label: String,
    pub classes: BTreeSet<ThingId>,
    pub contributor: ContributorId,
    pub observatory_id: Option<ObservatoryId>,
    pub organization_id: Option<OrganizationId>,
    pub extraction_method: ExtractionMethod,
    pub modifiable: bool,
}

impl CreateResourceCommand {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: None,
            label: label.into(),
            classes: BTreeSet::new(),
            contributor: ContributorId::UNKNOWN,
            observatory_id: None,
            organization_id: None,
            extraction_method: ExtractionMethod::Unknown,
            modifiable: true,
        }
    }
}

/// Partial update; unset fields keep their value.
#[derive(Clone, Debug)]
pub struct UpdateResourceCommand {
    pub id: ThingId,
    pub label: Option<String>,
    pub classes: Option<BTreeSet<ThingId>>,
    pub observatory_id: Option<ObservatoryId>,
    pub organization_id: Option<OrganizationId>,
    pub extraction_method: Option<ExtractionMethod>,
    pub visibility: Option<Visibility>,
    pub verified: Option<bool>,
    pub modifiable: Option<bool>,
}

impl UpdateResourceCommand {
    #[must_use]
    pub fn new(id: ThingId) -> Self {
        Self {
            id,
            label: None,
            classes: None,
            observatory_id: None,
            organization_id: None,
            extraction_method: None,
            visibility: None,
            verified: None,
            modifiable: None,
        }
    }
}

#[derive(Clone)]
pub struct ResourceService {
    things: Arc<ThingHandle>,
    resources: Arc<ResourceHandle>,
    classes: Arc<ClassHandle>,
    statements: Arc<StatementHandle>,
    clock: Arc<dyn Clock>,
}

impl ResourceService {
    #[must_use]
    pub fn new(repositories: &Repositories, clock: Arc<dyn Clock>) -> Self {
        Self {
            things: repositories.things.clone(),
            resources: repositories.resources.clone(),
            classes: repositories.classes.clone(),
            statements: repositories.statements.clone(),
            clock,
        }
    }

    #[tracing::instrument(skip_all, fields(label = %command.label))]
    pub async fn create(&self, command: CreateResourceCommand) -> Result<ThingId, GraphError> {
        let label = checked_label(&command.label)?;
        if let Some(id) = &command.id {
            if self.things.find_by_thing_id(id).await?.is_some() {
                return Err(GraphError::ResourceAlreadyExists { id: id.clone() });
            }
        }
        self.check_classes(&command.classes).await?;

        let id = match command.id {
            Some(id) => id,
            None => self.resources.next_identity().await?,
        };
        self.resources
            .save(Resource {
                id: id.clone(),
                label,
                classes: command.classes,
                created_by: command.contributor,
                created_at: self.clock.now(),
                observatory_id: command.observatory_id,
                organization_id: command.organization_id,
                extraction_method: command.extraction_method,
                verified: false,
                visibility: Visibility::Default,
                modifiable: command.modifiable,
            })
            .await?;
        tracing::info!(%id, "created resource");
        Ok(id)
    }

    pub async fn find_by_id(&self, id: &ThingId) -> Result<Option<Resource>, GraphError> {
        self.resources.find_by_id(id).await
    }

    pub async fn exists(&self, id: &ThingId) -> Result<bool, GraphError> {
        self.resources.exists(id).await
    }

    pub async fn find_all(&self, pageable: &Pageable) -> Result<Page<Resource>, GraphError> {
        self.resources.find_all(pageable).await
    }

    pub async fn find_all_by_label(
        &self,
        label: &SearchString,
        pageable: &Pageable,
    ) -> Result<Page<Resource>, GraphError> {
        self.resources.find_all_by_label(label, pageable).await
    }

    pub async fn find_all_by_class(
        &self,
        class: &ThingId,
        pageable: &Pageable,
    ) -> Result<Page<Resource>, GraphError> {
        self.resources.find_all_by_class(class, pageable).await
    }

    pub async fn find_all_by_visibility(
        &self,
        filter: VisibilityFilter,
        classes: &BTreeSet<ThingId>,
        pageable: &Pageable,
    ) -> Result<Page<Resource>, GraphError> {
        self.resources
            .find_all_by_visibility(filter, classes, pageable)
            .await
    }

    pub async fn find_all_contributor_ids(
        &self,
        pageable: &Pageable,
    ) -> Result<Page<ContributorId>, GraphError> {
        self.resources.find_all_contributor_ids(pageable).await
    }

    #[tracing::instrument(skip_all, fields(id = %command.id))]
    pub async fn update(&self, command: UpdateResourceCommand) -> Result<(), GraphError> {
        let mut resource = self.modifiable_resource(&command.id).await?;
        if let Some(label) = &command.label {
            resource.label = checked_label(label)?;
        }
        if let Some(classes) = command.classes {
            self.check_classes(&classes).await?;
            resource.classes = classes;
        }
        if let Some(observatory_id) = command.observatory_id {
            resource.observatory_id = Some(observatory_id);
        }
        if let Some(organization_id) = command.organization_id {
            resource.organization_id = Some(organization_id);
        }
        if let Some(extraction_method) = command.extraction_method {
            resource.extraction_method = extraction_method;
        }
        if let Some(visibility) = command.visibility {
            resource.visibility = visibility;
        }
        if let Some(verified) = command.verified {
            resource.verified = verified;
        }
        if let Some(modifiable) = command.modifiable {
            resource.modifiable = modifiable;
        }
        self.resources.save(resource).await
    }

    pub async fn mark_as_verified(&self, id: &ThingId) -> Result<(), GraphError> {
        self.set_verified(id, true).await
    }

    pub async fn mark_as_unverified(&self, id: &ThingId) -> Result<(), GraphError> {
        self.set_verified(id, false).await
    }

    pub async fn mark_as_featured(&self, id: &ThingId) -> Result<(), GraphError> {
        self.set_visibility(id, Visibility::Featured).await
    }

    pub async fn mark_as_non_featured(&self, id: &ThingId) -> Result<(), GraphError> {
        self.set_visibility(id, Visibility::Default).await
    }

    pub async fn mark_as_unlisted(&self, id: &ThingId) -> Result<(), GraphError> {
        self.set_visibility(id, Visibility::Unlisted).await
    }

    pub async fn mark_as_listed(&self, id: &ThingId) -> Result<(), GraphError> {
        self.set_visibility(id, Visibility::Default).await
    }

    /// Deletes a resource no statement refers to.
    #[tracing::instrument(skip(self), fields(%id))]
    pub async fn delete(&self, id: &ThingId) -> Result<(), GraphError> {
        self.modifiable_resource(id).await?;
        if self.statements.check_if_resource_has_statements(id).await? {
            return Err(GraphError::ResourceUsedInStatement { id: id.clone() });
        }
        self.resources.delete_by_id(id).await?;
        tracing::info!("deleted resource");
        Ok(())
    }

    pub async fn delete_all(&self) -> Result<(), GraphError> {
        self.resources.delete_all().await
    }

    pub async fn find_problems_by_observatory_id(
        &self,
        id: ObservatoryId,
        pageable: &Pageable,
    ) -> Result<Page<Resource>, GraphError> {
        self.statements
            .find_problems_by_observatory_id(id, pageable)
            .await
    }

    pub async fn find_problems_by_organization_id(
        &self,
        id: OrganizationId,
        pageable: &Pageable,
    ) -> Result<Page<Resource>, GraphError> {
        self.statements
            .find_problems_by_organization_id(id, pageable)
            .await
    }

    pub async fn find_contributors(
        &self,
        id: &ThingId,
        pageable: &Pageable,
    ) -> Result<Page<ContributorId>, GraphError> {
        self.existing(id).await?;
        self.statements
            .find_contributors_by_resource_id(id, pageable)
            .await
    }

    pub async fn find_timeline(
        &self,
        id: &ThingId,
        pageable: &Pageable,
    ) -> Result<Page<ResourceContributor>, GraphError> {
        self.existing(id).await?;
        self.statements
            .find_timeline_by_resource_id(id, pageable)
            .await
    }

    pub async fn find_paper_by_doi(&self, doi: &str) -> Result<Option<Resource>, GraphError> {
        self.statements.find_by_doi(doi).await
    }

    pub async fn find_doi_by_contribution_id(
        &self,
        id: &ThingId,
    ) -> Result<Option<Literal>, GraphError> {
        self.statements.find_doi_by_contribution_id(id).await
    }

    async fn existing(&self, id: &ThingId) -> Result<Resource, GraphError> {
        self.resources
            .find_by_id(id)
            .await?
            .ok_or_else(|| GraphError::resource_not_found(id))
    }

    async fn modifiable_resource(&self, id: &ThingId) -> Result<Resource, GraphError> {
        let resource = self.existing(id).await?;
        if !resource.modifiable {
            return Err(GraphError::ResourceNotModifiable { id: id.clone() });
        }
        Ok(resource)
    }

    async fn set_verified(&self, id: &ThingId, verified: bool) -> Result<(), GraphError> {
        let mut resource = self.existing(id).await?;
        resource.verified = verified;
        self.resources.save(resource).await
    }

    async fn set_visibility(&self, id: &ThingId, visibility: Visibility) -> Result<(), GraphError> {
        let mut resource = self.existing(id).await?;
        resource.visibility = visibility;
        tracing::debug!(%id, ?visibility, "changing visibility");
        self.resources.save(resource).await
    }

    /// Rejects reserved classes first, then reports every unknown class at
    /// once.
    async fn check_classes(&self, classes: &BTreeSet<ThingId>) -> Result<(), GraphError> {
        let reserved = well_known::classes::reserved();
        if let Some(id) = classes.iter().find(|id| reserved.contains(id)) {
            return Err(GraphError::ReservedClass { id: id.clone() });
        }
        if self.classes.exists_all(classes).await? {
            return Ok(());
        }
        let mut unknown = Vec::new();
        for id in classes {
            if !self.classes.exists(id).await? {
                unknown.push(id.clone());
            }
        }
        Err(GraphError::InvalidClassCollection { ids: unknown })
    }
}
