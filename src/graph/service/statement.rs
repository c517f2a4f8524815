use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::Repositories;
use crate::graph::{
    clock::Clock,
    entities::{well_known, Bundle, BundleConfiguration, GeneralStatement, Predicate, Thing},
    errors::GraphError,
    pagination::{sort_items, Page, Pageable, Sort},
    repositories::StatementFilter,
    value_objects::{ContributorId, StatementId, ThingId},
    PredicateHandle, StatementHandle, ThingHandle,
};

#[derive(Clone, Debug)]
pub struct CreateStatementCommand {
    /// Generated when absent.
    pub id: Option<StatementId>,
    pub subject_id: ThingId,
    pub predicate_id: ThingId,
    pub object_id: ThingId,
    pub contributor: ContributorId,
    pub modifiable: bool,
}

impl CreateStatementCommand {
    #[must_use]
    pub fn new(subject_id: ThingId, predicate_id: ThingId, object_id: ThingId) -> Self {
        Self {
            id: None,
            subject_id,
            predicate_id,
            object_id,
            contributor: ContributorId::UNKNOWN,
            modifiable: true,
        }
    }
}

/// Replaces the given endpoints; unset ones stay.
#[derive(Clone, Debug)]
pub struct UpdateStatementCommand {
    pub id: StatementId,
    pub subject_id: Option<ThingId>,
    pub predicate_id: Option<ThingId>,
    pub object_id: Option<ThingId>,
}

impl UpdateStatementCommand {
    #[must_use]
    pub fn new(id: StatementId) -> Self {
        Self {
            id,
            subject_id: None,
            predicate_id: None,
            object_id: None,
        }
    }
}

#[derive(Clone)]
pub struct StatementService {
    things: Arc<ThingHandle>,
    predicates: Arc<PredicateHandle>,
    statements: Arc<StatementHandle>,
    clock: Arc<dyn Clock>,
}

impl StatementService {
    #[must_use]
    pub fn new(repositories: &Repositories, clock: Arc<dyn Clock>) -> Self {
        Self {
            things: repositories.things.clone(),
            predicates: repositories.predicates.clone(),
            statements: repositories.statements.clone(),
            clock,
        }
    }

    /// Creates a statement, or returns the id of the statement that already
    /// links the same subject, predicate and object.
    #[tracing::instrument(
        skip_all,
        fields(subject = %command.subject_id, predicate = %command.predicate_id, object = %command.object_id)
    )]
    pub async fn create(&self, command: CreateStatementCommand) -> Result<StatementId, GraphError> {
        if let Some(id) = &command.id {
            if self.statements.exists(id).await? {
                return Err(GraphError::StatementAlreadyExists { id: id.clone() });
            }
        }
        let (subject, predicate, object) = self
            .endpoints(&command.subject_id, &command.predicate_id, &command.object_id)
            .await?;

        if let Some(existing) = self
            .statements
            .find_by_subject_id_and_predicate_id_and_object_id(
                subject.id(),
                &predicate.id,
                object.id(),
            )
            .await?
        {
            tracing::debug!(id = %existing.id, "statement already exists, reusing it");
            return Ok(existing.id);
        }

        let id = match command.id {
            Some(id) => id,
            None => self.statements.next_identity().await?,
        };
        self.statements
            .save(GeneralStatement {
                id: id.clone(),
                subject,
                predicate,
                object,
                created_by: command.contributor,
                created_at: self.clock.now(),
                index: None,
                modifiable: command.modifiable,
            })
            .await?;
        tracing::info!(%id, "created statement");
        Ok(id)
    }

    #[tracing::instrument(skip_all, fields(id = %command.id))]
    pub async fn update(&self, command: UpdateStatementCommand) -> Result<(), GraphError> {
        let mut statement = self
            .statements
            .find_by_statement_id(&command.id)
            .await?
            .ok_or_else(|| GraphError::statement_not_found(&command.id))?;
        if statement.is_list_element_statement() || !statement.modifiable {
            return Err(GraphError::UnmodifiableStatement { id: command.id });
        }

        let subject_id = command.subject_id.as_ref().unwrap_or(statement.subject.id());
        let predicate_id = command.predicate_id.as_ref().unwrap_or(&statement.predicate.id);
        let object_id = command.object_id.as_ref().unwrap_or(statement.object.id());
        let (subject, predicate, object) =
            self.endpoints(subject_id, predicate_id, object_id).await?;

        statement.subject = subject;
        statement.predicate = predicate;
        statement.object = object;
        self.statements.save(statement).await
    }

    /// Deletes a statement. Unknown ids are ignored.
    #[tracing::instrument(skip(self), fields(%id))]
    pub async fn delete(&self, id: &StatementId) -> Result<(), GraphError> {
        if let Some(statement) = self.statements.find_by_statement_id(id).await? {
            Self::check_deletable(&statement)?;
            self.statements.delete(&statement).await?;
        }
        Ok(())
    }

    /// Deletes several statements, all or none.
    #[tracing::instrument(skip_all, fields(count = ids.len()))]
    pub async fn delete_all_by_ids(&self, ids: &BTreeSet<StatementId>) -> Result<(), GraphError> {
        let selected = self
            .statements
            .find_all(
                &StatementFilter {
                    statement_ids: Some(ids.clone()),
                    ..StatementFilter::default()
                },
                &Pageable::unpaged(),
            )
            .await?;
        for statement in &selected.content {
            Self::check_deletable(statement)?;
        }
        self.statements.delete_by_statement_ids(ids).await
    }

    /// Deletes statements on behalf of `contributor`, who must own all of
    /// them unless acting as curator.
    #[tracing::instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn delete_as(
        &self,
        ids: &BTreeSet<StatementId>,
        contributor: ContributorId,
        is_curator: bool,
    ) -> Result<(), GraphError> {
        if !is_curator {
            let ownership = self.statements.determine_ownership(ids).await?;
            if ownership.iter().any(|info| info.owner != contributor) {
                return Err(GraphError::NeitherOwnerNorCurator { contributor });
            }
        }
        self.delete_all_by_ids(ids).await
    }

    pub async fn find_by_id(&self, id: &StatementId) -> Result<Option<GeneralStatement>, GraphError> {
        self.statements.find_by_statement_id(id).await
    }

    pub async fn exists(&self, id: &StatementId) -> Result<bool, GraphError> {
        self.statements.exists(id).await
    }

    pub async fn find_all(
        &self,
        filter: &StatementFilter,
        pageable: &Pageable,
    ) -> Result<Page<GeneralStatement>, GraphError> {
        self.statements.find_all(filter, pageable).await
    }

    pub async fn find_all_by_subject(
        &self,
        subject_id: &ThingId,
        pageable: &Pageable,
    ) -> Result<Page<GeneralStatement>, GraphError> {
        self.statements.find_all_by_subject(subject_id, pageable).await
    }

    pub async fn find_all_by_object(
        &self,
        object_id: &ThingId,
        pageable: &Pageable,
    ) -> Result<Page<GeneralStatement>, GraphError> {
        self.statements.find_all_by_object(object_id, pageable).await
    }

    pub async fn find_all_by_predicate(
        &self,
        predicate_id: &ThingId,
        pageable: &Pageable,
    ) -> Result<Page<GeneralStatement>, GraphError> {
        self.statements
            .find_all_by_predicate_id(predicate_id, pageable)
            .await
    }

    pub async fn count(&self) -> Result<u64, GraphError> {
        self.statements.count().await
    }

    pub async fn count_statements_about_resource(&self, id: &ThingId) -> Result<u64, GraphError> {
        self.statements.count_statements_about_resource(id).await
    }

    pub async fn count_statements_about_resources(
        &self,
        ids: &BTreeSet<ThingId>,
    ) -> Result<BTreeMap<ThingId, u64>, GraphError> {
        self.statements.count_statements_about_resources(ids).await
    }

    pub async fn count_by_id_recursive(&self, id: &ThingId) -> Result<u64, GraphError> {
        self.statements.count_by_id_recursive(id).await
    }

    pub async fn check_if_resource_has_statements(&self, id: &ThingId) -> Result<bool, GraphError> {
        self.statements.check_if_resource_has_statements(id).await
    }

    /// The subgraph around a thing. With `include_first` the statements
    /// leaving the root are always part of the bundle, whatever the level
    /// bounds and filters say.
    #[tracing::instrument(skip(self, configuration), fields(%thing_id))]
    pub async fn fetch_as_bundle(
        &self,
        thing_id: &ThingId,
        configuration: &BundleConfiguration,
        include_first: bool,
        sort: Sort,
    ) -> Result<Bundle, GraphError> {
        if self.things.find_by_thing_id(thing_id).await?.is_none() {
            return Err(GraphError::ThingNotFound {
                id: thing_id.clone(),
            });
        }
        let mut bundle = self
            .statements
            .fetch_as_bundle(thing_id, configuration, sort)
            .await?;
        if include_first {
            let first = self
                .statements
                .fetch_as_bundle(thing_id, &BundleConfiguration::first_level(), sort)
                .await?;
            bundle = bundle.merge(first);
            sort_items(&mut bundle.bundle, sort);
        }
        Ok(bundle)
    }

    fn check_deletable(statement: &GeneralStatement) -> Result<(), GraphError> {
        if statement.is_list_element_statement() {
            return Err(GraphError::ForbiddenStatementDeletion {
                id: statement.id.clone(),
            });
        }
        if !statement.modifiable {
            return Err(GraphError::UnmodifiableStatement {
                id: statement.id.clone(),
            });
        }
        Ok(())
    }

    /// Resolves and validates the three endpoints of a statement.
    async fn endpoints(
        &self,
        subject_id: &ThingId,
        predicate_id: &ThingId,
        object_id: &ThingId,
    ) -> Result<(Thing, Predicate, Thing), GraphError> {
        let subject = self
            .things
            .find_by_thing_id(subject_id)
            .await?
            .ok_or_else(|| GraphError::StatementSubjectNotFound {
                id: subject_id.clone(),
            })?;
        if matches!(subject, Thing::Literal(_)) {
            return Err(GraphError::ForbiddenStatementSubject {
                id: subject_id.clone(),
            });
        }
        let predicate = self
            .predicates
            .find_by_id(predicate_id)
            .await?
            .ok_or_else(|| GraphError::StatementPredicateNotFound {
                id: predicate_id.clone(),
            })?;
        // List membership is written by the list aggregate only.
        if predicate.id == well_known::predicates::has_list_element()
            && subject.is_resource_of_any(&[well_known::classes::list()])
        {
            return Err(GraphError::ForbiddenStatementSubject {
                id: subject_id.clone(),
            });
        }
        let object = self
            .things
            .find_by_thing_id(object_id)
            .await?
            .ok_or_else(|| GraphError::StatementObjectNotFound {
                id: object_id.clone(),
            })?;
        Ok((subject, predicate, object))
    }
}
