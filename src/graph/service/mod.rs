//! Domain services, the only write path into the graph.
//!
//! Every command is validated completely before the first repository write,
//! so a rejected command leaves the graph untouched.

mod class;
mod hierarchy;
mod list;
mod literal;
mod predicate;
mod resource;
mod statement;

use std::sync::Arc;

pub use class::{ClassService, CreateClassCommand, UpdateClassCommand};
pub use hierarchy::ClassHierarchyService;
pub use list::{CreateListCommand, ListService, UpdateListCommand};
pub use literal::{CreateLiteralCommand, LiteralService, UpdateLiteralCommand};
pub use predicate::{CreatePredicateCommand, PredicateService, UpdatePredicateCommand};
pub use resource::{CreateResourceCommand, ResourceService, UpdateResourceCommand};
pub use statement::{CreateStatementCommand, StatementService, UpdateStatementCommand};

use super::{
    errors::GraphError, value_objects::Label, ClassHandle, ClassHierarchyHandle, ListHandle,
    LiteralHandle, PredicateHandle, ResourceHandle, StatementHandle, ThingHandle,
};

/// Repository handles shared by the services.
#[derive(Clone)]
pub struct Repositories {
    pub things: Arc<ThingHandle>,
    pub resources: Arc<ResourceHandle>,
    pub literals: Arc<LiteralHandle>,
    pub predicates: Arc<PredicateHandle>,
    pub classes: Arc<ClassHandle>,
    pub hierarchy: Arc<ClassHierarchyHandle>,
    pub statements: Arc<StatementHandle>,
    pub lists: Arc<ListHandle>,
}

/// Applies the label rule shared by every kind.
fn checked_label(label: &str) -> Result<String, GraphError> {
    Ok(Label::new(label)?.into_inner())
}
