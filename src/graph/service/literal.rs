use std::sync::Arc;

use super::{checked_label, Repositories};
use crate::graph::{
    clock::Clock,
    entities::{well_known, Literal},
    errors::GraphError,
    pagination::{Page, Pageable},
    value_objects::{ContributorId, SearchString, ThingId},
    LiteralHandle, StatementHandle, ThingHandle,
};

#[derive(Clone, Debug)]
pub struct CreateLiteralCommand {
    pub id: Option<ThingId>,
    pub label: String,
    pub datatype: String,
    pub contributor: ContributorId,
    pub modifiable: bool,
}

impl CreateLiteralCommand {
    /// A plain `xsd:string` literal.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: None,
            label: label.into(),
            datatype: well_known::XSD_STRING.to_string(),
            contributor: ContributorId::UNKNOWN,
            modifiable: true,
        }
    }

    #[must_use]
    pub fn typed(label: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            datatype: datatype.into(),
            ..Self::new(label)
        }
    }
}

#[derive(Clone, Debug)]
pub struct UpdateLiteralCommand {
    pub id: ThingId,
    pub label: Option<String>,
    pub datatype: Option<String>,
    pub modifiable: Option<bool>,
}

#[derive(Clone)]
pub struct LiteralService {
    things: Arc<ThingHandle>,
    literals: Arc<LiteralHandle>,
    statements: Arc<StatementHandle>,
    clock: Arc<dyn Clock>,
}

impl LiteralService {
    #[must_use]
    pub fn new(repositories: &Repositories, clock: Arc<dyn Clock>) -> Self {
        Self {
            things: repositories.things.clone(),
            literals: repositories.literals.clone(),
            statements: repositories.statements.clone(),
            clock,
        }
    }

    #[tracing::instrument(skip_all, fields(datatype = %command.datatype))]
    pub async fn create(&self, command: CreateLiteralCommand) -> Result<ThingId, GraphError> {
        let label = checked_label(&command.label)?;
        Literal::validate(&label, &command.datatype)?;
        if let Some(id) = &command.id {
            if self.things.find_by_thing_id(id).await?.is_some() {
                return Err(GraphError::LiteralAlreadyExists { id: id.clone() });
            }
        }

        let id = match command.id {
            Some(id) => id,
            None => self.literals.next_identity().await?,
        };
        self.literals
            .save(Literal {
                id: id.clone(),
                label,
                datatype: command.datatype,
                created_by: command.contributor,
                created_at: self.clock.now(),
                modifiable: command.modifiable,
            })
            .await?;
        tracing::debug!(%id, "created literal");
        Ok(id)
    }

    pub async fn find_by_id(&self, id: &ThingId) -> Result<Option<Literal>, GraphError> {
        self.literals.find_by_id(id).await
    }

    pub async fn find_all(&self, pageable: &Pageable) -> Result<Page<Literal>, GraphError> {
        self.literals.find_all(pageable).await
    }

    pub async fn find_all_by_label(
        &self,
        label: &SearchString,
        pageable: &Pageable,
    ) -> Result<Page<Literal>, GraphError> {
        self.literals.find_all_by_label(label, pageable).await
    }

    #[tracing::instrument(skip_all, fields(id = %command.id))]
    pub async fn update(&self, command: UpdateLiteralCommand) -> Result<(), GraphError> {
        let mut literal = self.modifiable_literal(&command.id).await?;
        if let Some(label) = &command.label {
            literal.label = checked_label(label)?;
        }
        if let Some(datatype) = command.datatype {
            literal.datatype = datatype;
        }
        Literal::validate(&literal.label, &literal.datatype)?;
        if let Some(modifiable) = command.modifiable {
            literal.modifiable = modifiable;
        }
        self.literals.save(literal).await
    }

    #[tracing::instrument(skip(self), fields(%id))]
    pub async fn delete(&self, id: &ThingId) -> Result<(), GraphError> {
        self.modifiable_literal(id).await?;
        if self.statements.check_if_resource_has_statements(id).await? {
            return Err(GraphError::LiteralUsedInStatement { id: id.clone() });
        }
        self.literals.delete_by_id(id).await
    }

    pub async fn delete_all(&self) -> Result<(), GraphError> {
        self.literals.delete_all().await
    }

    async fn modifiable_literal(&self, id: &ThingId) -> Result<Literal, GraphError> {
        let literal = self
            .literals
            .find_by_id(id)
            .await?
            .ok_or_else(|| GraphError::LiteralNotFound { id: id.clone() })?;
        if !literal.modifiable {
            return Err(GraphError::LiteralNotModifiable { id: id.clone() });
        }
        Ok(literal)
    }
}
