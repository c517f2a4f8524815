use serde::Serialize;
use thiserror::Error;

use super::value_objects::{ContributorId, IdError, LabelError, StatementId, ThingId, Uri, UriError};

/// Broad classes of failure, used to translate errors at the boundary.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    NotFound,
    Validation,
    Conflict,
    ForbiddenOperation,
    Authorization,
    Internal,
}

/// Flat discriminant of [`GraphError`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    ThingNotFound,
    ResourceNotFound,
    LiteralNotFound,
    PredicateNotFound,
    ClassNotFound,
    StatementNotFound,
    ListNotFound,
    InvalidId,
    InvalidUri,
    InvalidLabel,
    InvalidLiteralDatatype,
    InvalidLiteralLabel,
    InvalidClassCollection,
    InvalidSubclassRelation,
    ReservedClass,
    ClassNotAllowed,
    ListElementNotFound,
    StatementSubjectNotFound,
    StatementPredicateNotFound,
    StatementObjectNotFound,
    ResourceAlreadyExists,
    LiteralAlreadyExists,
    PredicateAlreadyExists,
    ClassAlreadyExists,
    UriAlreadyInUse,
    StatementAlreadyExists,
    ParentClassAlreadyExists,
    ParentClassAlreadyHasChildren,
    UpdateNotAllowed,
    ForbiddenStatementSubject,
    ForbiddenStatementDeletion,
    UnmodifiableStatement,
    ResourceUsedInStatement,
    LiteralUsedInStatement,
    PredicateUsedInStatement,
    ClassInUse,
    ResourceNotModifiable,
    LiteralNotModifiable,
    PredicateNotModifiable,
    ClassNotModifiable,
    ListNotModifiable,
    NeitherOwnerNorCurator,
    TraversalTimeout,
}

/// Every failure the graph core reports.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("thing `{id}` not found")]
    ThingNotFound { id: ThingId },
    #[error("resource `{id}` not found")]
    ResourceNotFound { id: ThingId },
    #[error("literal `{id}` not found")]
    LiteralNotFound { id: ThingId },
    #[error("predicate `{id}` not found")]
    PredicateNotFound { id: ThingId },
    #[error("class `{id}` not found")]
    ClassNotFound { id: ThingId },
    #[error("statement `{id}` not found")]
    StatementNotFound { id: StatementId },
    #[error("list `{id}` not found")]
    ListNotFound { id: ThingId },

    #[error(transparent)]
    InvalidId(#[from] IdError),
    #[error(transparent)]
    InvalidUri(#[from] UriError),
    #[error("invalid label: {reason}")]
    InvalidLabel { reason: LabelError },
    #[error("`{datatype}` is not a valid literal datatype")]
    InvalidLiteralDatatype { datatype: String },
    #[error("literal label `{label}` is not a valid lexical form of `{datatype}`")]
    InvalidLiteralLabel { label: String, datatype: String },
    #[error("the class collection contains unknown ids: {}", join(ids))]
    InvalidClassCollection { ids: Vec<ThingId> },
    #[error("class `{child}` cannot be a subclass of `{parent}`")]
    InvalidSubclassRelation { child: ThingId, parent: ThingId },
    #[error("class `{id}` is reserved")]
    ReservedClass { id: ThingId },
    #[error("class id `{id}` is not allowed")]
    ClassNotAllowed { id: ThingId },
    #[error("all elements inside the list have to exist")]
    ListElementNotFound,
    #[error("subject `{id}` not found")]
    StatementSubjectNotFound { id: ThingId },
    #[error("predicate `{id}` not found")]
    StatementPredicateNotFound { id: ThingId },
    #[error("object `{id}` not found")]
    StatementObjectNotFound { id: ThingId },

    #[error("resource `{id}` already exists")]
    ResourceAlreadyExists { id: ThingId },
    #[error("literal `{id}` already exists")]
    LiteralAlreadyExists { id: ThingId },
    #[error("predicate `{id}` already exists")]
    PredicateAlreadyExists { id: ThingId },
    #[error("class `{id}` already exists")]
    ClassAlreadyExists { id: ThingId },
    #[error("URI <{uri}> is already in use by class `{id}`")]
    UriAlreadyInUse { uri: Uri, id: ThingId },
    #[error("statement `{id}` already exists")]
    StatementAlreadyExists { id: StatementId },
    #[error("class `{child}` already has parent class `{parent}`")]
    ParentClassAlreadyExists { child: ThingId, parent: ThingId },
    #[error("class `{id}` already has child classes")]
    ParentClassAlreadyHasChildren { id: ThingId },

    #[error("URI of class `{id}` cannot be changed once set")]
    UpdateNotAllowed { id: ThingId },
    #[error("literal `{id}` cannot be the subject of a statement")]
    ForbiddenStatementSubject { id: ThingId },
    #[error("statement `{id}` cannot be deleted")]
    ForbiddenStatementDeletion { id: StatementId },
    #[error("statement `{id}` cannot be changed")]
    UnmodifiableStatement { id: StatementId },
    #[error("resource `{id}` is still used in a statement")]
    ResourceUsedInStatement { id: ThingId },
    #[error("literal `{id}` is still used in a statement")]
    LiteralUsedInStatement { id: ThingId },
    #[error("predicate `{id}` is still used in a statement")]
    PredicateUsedInStatement { id: ThingId },
    #[error("class `{id}` is still in use")]
    ClassInUse { id: ThingId },
    #[error("resource `{id}` is not modifiable")]
    ResourceNotModifiable { id: ThingId },
    #[error("literal `{id}` is not modifiable")]
    LiteralNotModifiable { id: ThingId },
    #[error("predicate `{id}` is not modifiable")]
    PredicateNotModifiable { id: ThingId },
    #[error("class `{id}` is not modifiable")]
    ClassNotModifiable { id: ThingId },
    #[error("list `{id}` is not modifiable")]
    ListNotModifiable { id: ThingId },

    #[error("contributor `{contributor}` neither owns the statements nor is a curator")]
    NeitherOwnerNorCurator { contributor: ContributorId },

    #[error("traversal from `{root}` exceeded {timeout_ms} ms")]
    TraversalTimeout { root: ThingId, timeout_ms: u64 },
}

fn join(ids: &[ThingId]) -> String {
    ids.iter()
        .map(ThingId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<LabelError> for GraphError {
    fn from(reason: LabelError) -> Self {
        Self::InvalidLabel { reason }
    }
}

impl GraphError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ThingNotFound { .. } => ErrorKind::ThingNotFound,
            Self::ResourceNotFound { .. } => ErrorKind::ResourceNotFound,
            Self::LiteralNotFound { .. } => ErrorKind::LiteralNotFound,
            Self::PredicateNotFound { .. } => ErrorKind::PredicateNotFound,
            Self::ClassNotFound { .. } => ErrorKind::ClassNotFound,
            Self::StatementNotFound { .. } => ErrorKind::StatementNotFound,
            Self::ListNotFound { .. } => ErrorKind::ListNotFound,
            Self::InvalidId(_) => ErrorKind::InvalidId,
            Self::InvalidUri(_) => ErrorKind::InvalidUri,
            Self::InvalidLabel { .. } => ErrorKind::InvalidLabel,
            Self::InvalidLiteralDatatype { .. } => ErrorKind::InvalidLiteralDatatype,
            Self::InvalidLiteralLabel { .. } => ErrorKind::InvalidLiteralLabel,
            Self::InvalidClassCollection { .. } => ErrorKind::InvalidClassCollection,
            Self::InvalidSubclassRelation { .. } => ErrorKind::InvalidSubclassRelation,
            Self::ReservedClass { .. } => ErrorKind::ReservedClass,
            Self::ClassNotAllowed { .. } => ErrorKind::ClassNotAllowed,
            Self::ListElementNotFound => ErrorKind::ListElementNotFound,
            Self::StatementSubjectNotFound { .. } => ErrorKind::StatementSubjectNotFound,
            Self::StatementPredicateNotFound { .. } => ErrorKind::StatementPredicateNotFound,
            Self::StatementObjectNotFound { .. } => ErrorKind::StatementObjectNotFound,
            Self::ResourceAlreadyExists { .. } => ErrorKind::ResourceAlreadyExists,
            Self::LiteralAlreadyExists { .. } => ErrorKind::LiteralAlreadyExists,
            Self::PredicateAlreadyExists { .. } => ErrorKind::PredicateAlreadyExists,
            Self::ClassAlreadyExists { .. } => ErrorKind::ClassAlreadyExists,
            Self::UriAlreadyInUse { .. } => ErrorKind::UriAlreadyInUse,
            Self::StatementAlreadyExists { .. } => ErrorKind::StatementAlreadyExists,
            Self::ParentClassAlreadyExists { .. } => ErrorKind::ParentClassAlreadyExists,
            Self::ParentClassAlreadyHasChildren { .. } => ErrorKind::ParentClassAlreadyHasChildren,
            Self::UpdateNotAllowed { .. } => ErrorKind::UpdateNotAllowed,
            Self::ForbiddenStatementSubject { .. } => ErrorKind::ForbiddenStatementSubject,
            Self::ForbiddenStatementDeletion { .. } => ErrorKind::ForbiddenStatementDeletion,
            Self::UnmodifiableStatement { .. } => ErrorKind::UnmodifiableStatement,
            Self::ResourceUsedInStatement { .. } => ErrorKind::ResourceUsedInStatement,
            Self::LiteralUsedInStatement { .. } => ErrorKind::LiteralUsedInStatement,
            Self::PredicateUsedInStatement { .. } => ErrorKind::PredicateUsedInStatement,
            Self::ClassInUse { .. } => ErrorKind::ClassInUse,
            Self::ResourceNotModifiable { .. } => ErrorKind::ResourceNotModifiable,
            Self::LiteralNotModifiable { .. } => ErrorKind::LiteralNotModifiable,
            Self::PredicateNotModifiable { .. } => ErrorKind::PredicateNotModifiable,
            Self::ClassNotModifiable { .. } => ErrorKind::ClassNotModifiable,
            Self::ListNotModifiable { .. } => ErrorKind::ListNotModifiable,
            Self::NeitherOwnerNorCurator { .. } => ErrorKind::NeitherOwnerNorCurator,
            Self::TraversalTimeout { .. } => ErrorKind::TraversalTimeout,
        }
    }

    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        self.kind().category()
    }

    pub(crate) fn class_not_found(id: &ThingId) -> Self {
        Self::ClassNotFound { id: id.clone() }
    }

    pub(crate) fn resource_not_found(id: &ThingId) -> Self {
        Self::ResourceNotFound { id: id.clone() }
    }

    pub(crate) fn statement_not_found(id: &StatementId) -> Self {
        Self::StatementNotFound { id: id.clone() }
    }
}

impl ErrorKind {
    #[must_use]
    pub fn category(self) -> ErrorCategory {
        match self {
            Self::ThingNotFound
            | Self::ResourceNotFound
            | Self::LiteralNotFound
            | Self::PredicateNotFound
            | Self::ClassNotFound
            | Self::StatementNotFound
            | Self::ListNotFound => ErrorCategory::NotFound,
            Self::InvalidId
            | Self::InvalidUri
            | Self::InvalidLabel
            | Self::InvalidLiteralDatatype
            | Self::InvalidLiteralLabel
            | Self::InvalidClassCollection
            | Self::InvalidSubclassRelation
            | Self::ReservedClass
            | Self::ClassNotAllowed
            | Self::ListElementNotFound
            | Self::StatementSubjectNotFound
            | Self::StatementPredicateNotFound
            | Self::StatementObjectNotFound => ErrorCategory::Validation,
            Self::ResourceAlreadyExists
            | Self::LiteralAlreadyExists
            | Self::PredicateAlreadyExists
            | Self::ClassAlreadyExists
            | Self::UriAlreadyInUse
            | Self::StatementAlreadyExists
            | Self::ParentClassAlreadyExists
            | Self::ParentClassAlreadyHasChildren => ErrorCategory::Conflict,
            Self::UpdateNotAllowed
            | Self::ForbiddenStatementSubject
            | Self::ForbiddenStatementDeletion
            | Self::UnmodifiableStatement
            | Self::ResourceUsedInStatement
            | Self::LiteralUsedInStatement
            | Self::PredicateUsedInStatement
            | Self::ClassInUse
            | Self::ResourceNotModifiable
            | Self::LiteralNotModifiable
            | Self::PredicateNotModifiable
            | Self::ClassNotModifiable
            | Self::ListNotModifiable => ErrorCategory::ForbiddenOperation,
            Self::NeitherOwnerNorCurator => ErrorCategory::Authorization,
            Self::TraversalTimeout => ErrorCategory::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_follow_taxonomy() {
        let id = ThingId::new("R1").expect("valid id");
        assert_eq!(
            GraphError::resource_not_found(&id).category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            GraphError::from(LabelError::Invalid).category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            GraphError::ResourceUsedInStatement { id: id.clone() }.category(),
            ErrorCategory::ForbiddenOperation
        );
        assert_eq!(
            GraphError::NeitherOwnerNorCurator {
                contributor: ContributorId::UNKNOWN
            }
            .category(),
            ErrorCategory::Authorization
        );
        assert_eq!(
            GraphError::TraversalTimeout {
                root: id,
                timeout_ms: 5
            }
            .kind(),
            ErrorKind::TraversalTimeout
        );
    }

    #[test]
    fn invalid_class_collection_lists_ids() {
        let err = GraphError::InvalidClassCollection {
            ids: vec![
                ThingId::new("C1").expect("valid id"),
                ThingId::new("C2").expect("valid id"),
            ],
        };
        insta::assert_snapshot!(err.to_string(), @"the class collection contains unknown ids: C1, C2");
    }
}
