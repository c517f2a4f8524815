use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::GraphError;
use super::value_objects::{
    ContributorId, ObservatoryId, OrganizationId, StatementId, ThingId, Uri,
};

/// Identifiers with a fixed meaning in the graph.
pub mod well_known {
    use super::ThingId;

    macro_rules! ids {
        ($($(#[$meta:meta])* $name:ident => $value:literal),* $(,)?) => {
            $(
                $(#[$meta])*
                #[must_use]
                pub fn $name() -> ThingId {
                    ThingId::from_trusted($value)
                }
            )*
        };
    }

    pub mod classes {
        use super::ThingId;

        ids! {
            resource => "Resource",
            literal => "Literal",
            predicate => "Predicate",
            class => "Class",
            list => "List",
            paper => "Paper",
            paper_deleted => "PaperDeleted",
            contribution => "Contribution",
            problem => "Problem",
            research_problem => "ResearchProblem",
            research_field => "ResearchField",
            comparison => "Comparison",
        }

        /// Classes that the generic services never create nor assign.
        #[must_use]
        pub fn reserved() -> [ThingId; 5] {
            [resource(), literal(), predicate(), class(), list()]
        }

        /// Resources of these classes end contributor and timeline walks.
        #[must_use]
        pub fn traversal_boundaries() -> [ThingId; 4] {
            [paper(), problem(), research_problem(), research_field()]
        }
    }

    pub mod predicates {
        use super::ThingId;

        ids! {
            /// Links a list to one of its elements.
            has_list_element => "hasListElement",
            has_contribution => "P31",
            has_research_problem => "P32",
            has_doi => "P26",
            compare_contribution => "compareContribution",
            description => "description",
        }
    }

    /// Default datatype of literals.
    pub const XSD_STRING: &str = "xsd:string";
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    #[default]
    Default,
    Featured,
    Unlisted,
    Deleted,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtractionMethod {
    Automatic,
    Manual,
    #[default]
    Unknown,
}

/// Selects resources by their visibility.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VisibilityFilter {
    /// Default and featured resources.
    AllListed,
    Unlisted,
    Featured,
    /// Default resources only.
    NonFeatured,
    Deleted,
}

impl VisibilityFilter {
    #[must_use]
    pub fn matches(self, visibility: Visibility) -> bool {
        match self {
            Self::AllListed => matches!(visibility, Visibility::Default | Visibility::Featured),
            Self::Unlisted => visibility == Visibility::Unlisted,
            Self::Featured => visibility == Visibility::Featured,
            Self::NonFeatured => visibility == Visibility::Default,
            Self::Deleted => visibility == Visibility::Deleted,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ThingId,
    pub label: String,
    pub classes: BTreeSet<ThingId>,
    pub created_by: ContributorId,
    pub created_at: DateTime<Utc>,
    pub observatory_id: Option<ObservatoryId>,
    pub organization_id: Option<OrganizationId>,
    pub extraction_method: ExtractionMethod,
    pub verified: bool,
    pub visibility: Visibility,
    pub modifiable: bool,
}

impl Resource {
    #[must_use]
    pub fn has_class(&self, class: &ThingId) -> bool {
        self.classes.contains(class)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Literal {
    pub id: ThingId,
    pub label: String,
    pub datatype: String,
    pub created_by: ContributorId,
    pub created_at: DateTime<Utc>,
    pub modifiable: bool,
}

impl Literal {
    /// Checks that `datatype` is an `xsd:` shorthand or an absolute IRI and
    /// that `label` is a lexical form of the numeric and boolean XSD types.
    pub fn validate(label: &str, datatype: &str) -> Result<(), GraphError> {
        let local = match datatype.strip_prefix("xsd:") {
            Some(name) if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric()) => {
                Some(name)
            }
            Some(_) => None,
            None => {
                Uri::new(datatype).map_err(|_| GraphError::InvalidLiteralDatatype {
                    datatype: datatype.to_string(),
                })?;
                datatype.strip_prefix("http://www.w3.org/2001/XMLSchema#")
            }
        };
        if datatype.starts_with("xsd:") && local.is_none() {
            return Err(GraphError::InvalidLiteralDatatype {
                datatype: datatype.to_string(),
            });
        }

        let valid = match local {
            Some("integer" | "int" | "long") => is_integer(label),
            Some("decimal" | "float" | "double") => is_decimal(label),
            Some("boolean") => matches!(label, "true" | "false" | "1" | "0"),
            _ => true,
        };
        if valid {
            Ok(())
        } else {
            Err(GraphError::InvalidLiteralLabel {
                label: label.to_string(),
                datatype: datatype.to_string(),
            })
        }
    }
}

fn is_integer(label: &str) -> bool {
    let digits = label.strip_prefix(['+', '-']).unwrap_or(label);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn is_decimal(label: &str) -> bool {
    matches!(label, "INF" | "-INF" | "NaN") || label.parse::<f64>().is_ok_and(f64::is_finite)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    pub id: ThingId,
    pub label: String,
    pub description: Option<String>,
    pub created_by: ContributorId,
    pub created_at: DateTime<Utc>,
    pub modifiable: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    pub id: ThingId,
    pub label: String,
    pub uri: Option<Uri>,
    pub created_by: ContributorId,
    pub created_at: DateTime<Utc>,
    pub modifiable: bool,
}

/// Kind of a [`Thing`], doubling as its node label in traversals.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThingKind {
    Resource,
    Literal,
    Predicate,
    Class,
}

impl ThingKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Resource => "Resource",
            Self::Literal => "Literal",
            Self::Predicate => "Predicate",
            Self::Class => "Class",
        }
    }
}

/// Any node of the graph.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "_class", rename_all = "lowercase")]
pub enum Thing {
    Resource(Resource),
    Literal(Literal),
    Predicate(Predicate),
    Class(Class),
}

impl Thing {
    #[must_use]
    pub fn id(&self) -> &ThingId {
        match self {
            Self::Resource(it) => &it.id,
            Self::Literal(it) => &it.id,
            Self::Predicate(it) => &it.id,
            Self::Class(it) => &it.id,
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Resource(it) => &it.label,
            Self::Literal(it) => &it.label,
            Self::Predicate(it) => &it.label,
            Self::Class(it) => &it.label,
        }
    }

    #[must_use]
    pub fn created_by(&self) -> ContributorId {
        match self {
            Self::Resource(it) => it.created_by,
            Self::Literal(it) => it.created_by,
            Self::Predicate(it) => it.created_by,
            Self::Class(it) => it.created_by,
        }
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Self::Resource(it) => it.created_at,
            Self::Literal(it) => it.created_at,
            Self::Predicate(it) => it.created_at,
            Self::Class(it) => it.created_at,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ThingKind {
        match self {
            Self::Resource(_) => ThingKind::Resource,
            Self::Literal(_) => ThingKind::Literal,
            Self::Predicate(_) => ThingKind::Predicate,
            Self::Class(_) => ThingKind::Class,
        }
    }

    /// Node labels: the kind label plus, for resources, their classes.
    #[must_use]
    pub fn labels(&self) -> BTreeSet<&str> {
        let mut labels = BTreeSet::from([self.kind().label()]);
        if let Self::Resource(resource) = self {
            labels.extend(resource.classes.iter().map(ThingId::as_str));
        }
        labels
    }

    #[must_use]
    pub fn as_resource(&self) -> Option<&Resource> {
        match self {
            Self::Resource(resource) => Some(resource),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Self::Literal(literal) => Some(literal),
            _ => None,
        }
    }

    /// True for resources carrying any of `classes`.
    #[must_use]
    pub fn is_resource_of_any(&self, classes: &[ThingId]) -> bool {
        self.as_resource()
            .is_some_and(|resource| classes.iter().any(|class| resource.has_class(class)))
    }
}

impl From<Resource> for Thing {
    fn from(value: Resource) -> Self {
        Self::Resource(value)
    }
}

impl From<Literal> for Thing {
    fn from(value: Literal) -> Self {
        Self::Literal(value)
    }
}

impl From<Predicate> for Thing {
    fn from(value: Predicate) -> Self {
        Self::Predicate(value)
    }
}

impl From<Class> for Thing {
    fn from(value: Class) -> Self {
        Self::Class(value)
    }
}

/// Subject, predicate, object triple with identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralStatement {
    pub id: StatementId,
    pub subject: Thing,
    pub predicate: Predicate,
    pub object: Thing,
    pub created_by: ContributorId,
    pub created_at: DateTime<Utc>,
    /// Position of the object when the statement encodes list membership.
    pub index: Option<i32>,
    pub modifiable: bool,
}

impl GeneralStatement {
    /// Statements encoding list membership belong to the list aggregate.
    #[must_use]
    pub fn is_list_element_statement(&self) -> bool {
        self.predicate.id == well_known::predicates::has_list_element()
    }
}

/// Edge of the class hierarchy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassSubclassRelation {
    pub child: Class,
    pub parent: Class,
    pub created_by: ContributorId,
    pub created_at: DateTime<Utc>,
}

/// Named ordered sequence of things.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct List {
    pub id: ThingId,
    pub label: String,
    pub elements: Vec<ThingId>,
    pub created_by: ContributorId,
    pub created_at: DateTime<Utc>,
    pub modifiable: bool,
}

/// A direct subclass together with the number of its own children.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChildClass {
    pub class: Class,
    pub child_count: u64,
}

/// A class of a hierarchy listing paired with its parent id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ClassHierarchyEntry {
    pub class: Class,
    pub parent_id: Option<ThingId>,
}

/// An edit attributed to a contributor, truncated to the minute.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ResourceContributor {
    pub created_by: ContributorId,
    pub created_at: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PredicateUsageCount {
    pub id: ThingId,
    pub count: u64,
}

/// Creator of a statement, used for bulk authorization checks.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct OwnershipInfo {
    pub statement_id: StatementId,
    pub owner: ContributorId,
}

/// Bounds and label filters of a bundle traversal.
///
/// Levels count hops from the root: statements whose subject is the root are
/// on level 1. `blacklist` and `whitelist` hold class ids (or one of the kind
/// labels `Resource`, `Literal`, `Predicate`, `Class`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BundleConfiguration {
    pub min_level: Option<usize>,
    pub max_level: Option<usize>,
    pub blacklist: BTreeSet<ThingId>,
    pub whitelist: BTreeSet<ThingId>,
}

impl BundleConfiguration {
    /// Only the statements leaving the root.
    #[must_use]
    pub fn first_level() -> Self {
        Self {
            max_level: Some(1),
            ..Self::default()
        }
    }
}

/// Subgraph collected around a root thing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Bundle {
    pub root_id: ThingId,
    pub bundle: Vec<GeneralStatement>,
}

impl Bundle {
    /// Unites two bundles, keeping each statement once. The merged statements
    /// are ordered newest first.
    #[must_use]
    pub fn merge(self, other: Bundle) -> Bundle {
        let mut by_id: BTreeMap<StatementId, GeneralStatement> = BTreeMap::new();
        for statement in self.bundle.into_iter().chain(other.bundle) {
            by_id.entry(statement.id.clone()).or_insert(statement);
        }
        let mut bundle: Vec<_> = by_id.into_values().collect();
        bundle.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Bundle {
            root_id: self.root_id,
            bundle,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("42", "xsd:integer")]
    #[case("-7", "xsd:int")]
    #[case("3.14", "xsd:decimal")]
    #[case("true", "xsd:boolean")]
    #[case("anything", "xsd:string")]
    #[case("5", "http://www.w3.org/2001/XMLSchema#integer")]
    #[case("x", "https://example.org/datatype")]
    fn accepts_valid_literals(#[case] label: &str, #[case] datatype: &str) {
        assert!(Literal::validate(label, datatype).is_ok());
    }

    #[rstest]
    #[case("4.2", "xsd:integer")]
    #[case("yes", "xsd:boolean")]
    #[case("abc", "xsd:double")]
    fn rejects_invalid_lexical_forms(#[case] label: &str, #[case] datatype: &str) {
        assert!(matches!(
            Literal::validate(label, datatype),
            Err(GraphError::InvalidLiteralLabel { .. })
        ));
    }

    #[rstest]
    #[case("xsd:")]
    #[case("no datatype")]
    #[case("xsd:has space")]
    fn rejects_invalid_datatypes(#[case] datatype: &str) {
        assert!(matches!(
            Literal::validate("1", datatype),
            Err(GraphError::InvalidLiteralDatatype { .. })
        ));
    }

    #[test]
    fn visibility_filters() {
        assert!(VisibilityFilter::AllListed.matches(Visibility::Featured));
        assert!(VisibilityFilter::AllListed.matches(Visibility::Default));
        assert!(!VisibilityFilter::AllListed.matches(Visibility::Unlisted));
        assert!(!VisibilityFilter::NonFeatured.matches(Visibility::Featured));
        assert!(VisibilityFilter::Deleted.matches(Visibility::Deleted));
    }
}
