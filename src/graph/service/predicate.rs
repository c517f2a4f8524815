use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::{checked_label, Repositories};
use crate::graph::{
    clock::Clock,
    entities::{Predicate, PredicateUsageCount},
    errors::GraphError,
    pagination::{Page, Pageable},
    value_objects::{ContributorId, SearchString, ThingId},
    PredicateHandle, StatementHandle, ThingHandle,
};

#[derive(Clone, Debug)]
pub struct CreatePredicateCommand {
    pub id: Option<ThingId>,
    pub label: String,
    pub description: Option<String>,
    pub contributor: ContributorId,
    pub modifiable: bool,
}

impl CreatePredicateCommand {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: None,
            label: label.into(),
            description: None,
            contributor: ContributorId::UNKNOWN,
            modifiable: true,
        }
    }
}

#[derive(Clone, Debug)]
pub struct UpdatePredicateCommand {
    pub id: ThingId,
    pub label: Option<String>,
    pub description: Option<String>,
    pub modifiable: Option<bool>,
}

#[derive(Clone)]
pub struct PredicateService {
    things: Arc<ThingHandle>,
    predicates: Arc<PredicateHandle>,
    statements: Arc<StatementHandle>,
    clock: Arc<dyn Clock>,
}

impl PredicateService {
    #[must_use]
    pub fn new(repositories: &Repositories, clock: Arc<dyn Clock>) -> Self {
        Self {
            things: repositories.things.clone(),
            predicates: repositories.predicates.clone(),
            statements: repositories.statements.clone(),
            clock,
        }
    }

    #[tracing::instrument(skip_all, fields(label = %command.label))]
    pub async fn create(&self, command: CreatePredicateCommand) -> Result<ThingId, GraphError> {
        let label = checked_label(&command.label)?;
        if let Some(id) = &command.id {
            if self.things.find_by_thing_id(id).await?.is_some() {
                return Err(GraphError::PredicateAlreadyExists { id: id.clone() });
            }
        }

        let id = match command.id {
            Some(id) => id,
            None => self.predicates.next_identity().await?,
        };
        self.predicates
            .save(Predicate {
                id: id.clone(),
                label,
                description: command.description,
                created_by: command.contributor,
                created_at: self.clock.now(),
                modifiable: command.modifiable,
            })
            .await?;
        tracing::info!(%id, "created predicate");
        Ok(id)
    }

    pub async fn find_by_id(&self, id: &ThingId) -> Result<Option<Predicate>, GraphError> {
        self.predicates.find_by_id(id).await
    }

    pub async fn find_all(&self, pageable: &Pageable) -> Result<Page<Predicate>, GraphError> {
        self.predicates.find_all(pageable).await
    }

    pub async fn find_all_by_label(
        &self,
        label: &SearchString,
        pageable: &Pageable,
    ) -> Result<Page<Predicate>, GraphError> {
        self.predicates.find_all_by_label(label, pageable).await
    }

    /// Description literals attached with the `description` predicate.
    pub async fn find_all_descriptions(
        &self,
        ids: &BTreeSet<ThingId>,
    ) -> Result<BTreeMap<ThingId, String>, GraphError> {
        self.statements.find_all_descriptions(ids).await
    }

    pub async fn count_usage(&self, id: &ThingId) -> Result<u64, GraphError> {
        self.statements.count_predicate_usage(id).await
    }

    /// Predicates ranked by usage, most used first.
    pub async fn find_usage_ranking(
        &self,
        pageable: &Pageable,
    ) -> Result<Page<PredicateUsageCount>, GraphError> {
        self.statements.find_all_predicate_usage(pageable).await
    }

    #[tracing::instrument(skip_all, fields(id = %command.id))]
    pub async fn update(&self, command: UpdatePredicateCommand) -> Result<(), GraphError> {
        let mut predicate = self.modifiable_predicate(&command.id).await?;
        if let Some(label) = &command.label {
            predicate.label = checked_label(label)?;
        }
        if let Some(description) = command.description {
            predicate.description = Some(description);
        }
        if let Some(modifiable) = command.modifiable {
            predicate.modifiable = modifiable;
        }
        self.predicates.save(predicate).await
    }

    /// Deletes a predicate that no statement uses in any position.
    #[tracing::instrument(skip(self), fields(%id))]
    pub async fn delete(&self, id: &ThingId) -> Result<(), GraphError> {
        self.modifiable_predicate(id).await?;
        if self.statements.count_predicate_usage(id).await? > 0 {
            return Err(GraphError::PredicateUsedInStatement { id: id.clone() });
        }
        self.predicates.delete_by_id(id).await
    }

    pub async fn delete_all(&self) -> Result<(), GraphError> {
        self.predicates.delete_all().await
    }

    async fn modifiable_predicate(&self, id: &ThingId) -> Result<Predicate, GraphError> {
        let predicate = self
            .predicates
            .find_by_id(id)
            .await?
            .ok_or_else(|| GraphError::PredicateNotFound { id: id.clone() })?;
        if !predicate.modifiable {
            return Err(GraphError::PredicateNotModifiable { id: id.clone() });
        }
        Ok(predicate)
    }
}
