//! Persistence ports of the graph.
//!
//! Every port carries an associated error type so adapters can surface their
//! own failures; the services bind them to [`GraphError`](super::GraphError).

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::entities::{
    Bundle, BundleConfiguration, ChildClass, Class, ClassHierarchyEntry, ClassSubclassRelation,
    GeneralStatement, List, Literal, OwnershipInfo, Predicate, PredicateUsageCount, Resource,
    ResourceContributor, Thing, VisibilityFilter,
};
use super::pagination::{Page, Pageable, Sort};
use super::value_objects::{
    ContributorId, ObservatoryId, OrganizationId, SearchString, StatementId, ThingId, Uri,
};

/// Lookups across every kind of thing.
#[async_trait]
pub trait ThingRepository: Send + Sync {
    type Error;

    /// Resolves an id regardless of the kind it belongs to.
    async fn find_by_thing_id(&self, id: &ThingId) -> Result<Option<Thing>, Self::Error>;

    /// True when every id resolves to some thing.
    async fn exists_all(&self, ids: &BTreeSet<ThingId>) -> Result<bool, Self::Error>;
}

#[async_trait]
pub trait ResourceRepository: Send + Sync {
    type Error;

    /// Returns an id that no thing uses yet.
    async fn next_identity(&self) -> Result<ThingId, Self::Error>;

    /// Inserts or replaces the resource with the same id.
    async fn save(&self, resource: Resource) -> Result<(), Self::Error>;

    async fn find_by_id(&self, id: &ThingId) -> Result<Option<Resource>, Self::Error>;

    async fn exists(&self, id: &ThingId) -> Result<bool, Self::Error>;

    async fn find_all(&self, pageable: &Pageable) -> Result<Page<Resource>, Self::Error>;

    async fn find_all_by_label(
        &self,
        label: &SearchString,
        pageable: &Pageable,
    ) -> Result<Page<Resource>, Self::Error>;

    async fn find_all_by_class(
        &self,
        class: &ThingId,
        pageable: &Pageable,
    ) -> Result<Page<Resource>, Self::Error>;

    /// Resources matching `filter`, restricted to those carrying every class
    /// of `classes`.
    async fn find_all_by_visibility(
        &self,
        filter: VisibilityFilter,
        classes: &BTreeSet<ThingId>,
        pageable: &Pageable,
    ) -> Result<Page<Resource>, Self::Error>;

    /// Distinct creators of resources, ordered by id.
    async fn find_all_contributor_ids(
        &self,
        pageable: &Pageable,
    ) -> Result<Page<ContributorId>, Self::Error>;

    async fn delete_by_id(&self, id: &ThingId) -> Result<(), Self::Error>;

    /// Administrative bulk removal.
    async fn delete_all(&self) -> Result<(), Self::Error>;
}

#[async_trait]
pub trait LiteralRepository: Send + Sync {
    type Error;

    async fn next_identity(&self) -> Result<ThingId, Self::Error>;
    async fn save(&self, literal: Literal) -> Result<(), Self::Error>;
    async fn find_by_id(&self, id: &ThingId) -> Result<Option<Literal>, Self::Error>;
    async fn exists(&self, id: &ThingId) -> Result<bool, Self::Error>;
    async fn find_all(&self, pageable: &Pageable) -> Result<Page<Literal>, Self::Error>;
    async fn find_all_by_label(
        &self,
        label: &SearchString,
        pageable: &Pageable,
    ) -> Result<Page<Literal>, Self::Error>;
    async fn delete_by_id(&self, id: &ThingId) -> Result<(), Self::Error>;
    async fn delete_all(&self) -> Result<(), Self::Error>;
}

#[async_trait]
pub trait PredicateRepository: Send + Sync {
    type Error;

    async fn next_identity(&self) -> Result<ThingId, Self::Error>;
    async fn save(&self, predicate: Predicate) -> Result<(), Self::Error>;
    async fn find_by_id(&self, id: &ThingId) -> Result<Option<Predicate>, Self::Error>;
    async fn exists(&self, id: &ThingId) -> Result<bool, Self::Error>;
    async fn find_all(&self, pageable: &Pageable) -> Result<Page<Predicate>, Self::Error>;
    async fn find_all_by_label(
        &self,
        label: &SearchString,
        pageable: &Pageable,
    ) -> Result<Page<Predicate>, Self::Error>;
    async fn delete_by_id(&self, id: &ThingId) -> Result<(), Self::Error>;
    async fn delete_all(&self) -> Result<(), Self::Error>;
}

#[async_trait]
pub trait ClassRepository: Send + Sync {
    type Error;

    async fn next_identity(&self) -> Result<ThingId, Self::Error>;
    async fn save(&self, class: Class) -> Result<(), Self::Error>;
    async fn find_by_id(&self, id: &ThingId) -> Result<Option<Class>, Self::Error>;
    async fn exists(&self, id: &ThingId) -> Result<bool, Self::Error>;
    async fn exists_all(&self, ids: &BTreeSet<ThingId>) -> Result<bool, Self::Error>;
    async fn find_by_uri(&self, uri: &Uri) -> Result<Option<Class>, Self::Error>;
    async fn find_all(&self, pageable: &Pageable) -> Result<Page<Class>, Self::Error>;
    async fn find_all_by_label(
        &self,
        label: &SearchString,
        pageable: &Pageable,
    ) -> Result<Page<Class>, Self::Error>;
    async fn delete_by_id(&self, id: &ThingId) -> Result<(), Self::Error>;
    async fn delete_all(&self) -> Result<(), Self::Error>;
}

/// Subclass edges between classes.
///
/// Lookups on unknown ids answer empty rather than failing; the services turn
/// missing classes into `ClassNotFound`.
#[async_trait]
pub trait ClassHierarchyRepository: Send + Sync {
    type Error;

    /// Stores an edge. Both classes are expected to exist.
    async fn save(&self, relation: ClassSubclassRelation) -> Result<(), Self::Error>;

    async fn save_all(&self, relations: Vec<ClassSubclassRelation>) -> Result<(), Self::Error>;

    async fn find_parent(&self, id: &ThingId) -> Result<Option<Class>, Self::Error>;

    /// Follows parent edges until a class without parent is reached. A class
    /// without parent is its own root.
    async fn find_root(&self, id: &ThingId) -> Result<Option<Class>, Self::Error>;

    /// Classes without parent, ordered by id.
    async fn find_all_roots(&self, pageable: &Pageable) -> Result<Page<Class>, Self::Error>;

    /// Direct children ordered by id, each with the number of its own
    /// children.
    async fn find_children(
        &self,
        id: &ThingId,
        pageable: &Pageable,
    ) -> Result<Page<ChildClass>, Self::Error>;

    /// The class and all its ancestors, each paired with its parent id,
    /// ordered by id.
    async fn find_class_hierarchy(
        &self,
        id: &ThingId,
        pageable: &Pageable,
    ) -> Result<Page<ClassHierarchyEntry>, Self::Error>;

    /// Things typed with the class or any of its transitive subclasses.
    async fn count_class_instances(&self, id: &ThingId) -> Result<u64, Self::Error>;

    /// True when `child_id` is a descendant of `id`, at any depth.
    async fn exists_child(&self, id: &ThingId, child_id: &ThingId) -> Result<bool, Self::Error>;

    /// True when `id` has at least one direct child.
    async fn exists_children(&self, id: &ThingId) -> Result<bool, Self::Error>;

    /// Removes the edge to the parent of `id`; classes themselves stay.
    async fn delete_by_child_class_id(&self, id: &ThingId) -> Result<(), Self::Error>;

    async fn delete_all(&self) -> Result<(), Self::Error>;
}

/// Selection shared by the content and count halves of statement queries.
///
/// Unset fields do not restrict the selection.
#[derive(Clone, Debug, Default)]
pub struct StatementFilter {
    pub subject_id: Option<ThingId>,
    pub subject_ids: Option<BTreeSet<ThingId>>,
    pub subject_classes: BTreeSet<ThingId>,
    pub subject_label: Option<SearchString>,
    pub predicate_id: Option<ThingId>,
    pub object_id: Option<ThingId>,
    pub object_ids: Option<BTreeSet<ThingId>>,
    pub object_classes: BTreeSet<ThingId>,
    /// Matches literal objects only.
    pub object_literal_label: Option<String>,
    pub object_label: Option<SearchString>,
    pub created_by: Option<ContributorId>,
    pub created_at_start: Option<DateTime<Utc>>,
    pub created_at_end: Option<DateTime<Utc>>,
    pub statement_ids: Option<BTreeSet<StatementId>>,
}

impl StatementFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn subject(mut self, id: &ThingId) -> Self {
        self.subject_id = Some(id.clone());
        self
    }

    #[must_use]
    pub fn subjects(mut self, ids: BTreeSet<ThingId>) -> Self {
        self.subject_ids = Some(ids);
        self
    }

    #[must_use]
    pub fn subject_class(mut self, class: &ThingId) -> Self {
        self.subject_classes.insert(class.clone());
        self
    }

    #[must_use]
    pub fn predicate(mut self, id: &ThingId) -> Self {
        self.predicate_id = Some(id.clone());
        self
    }

    #[must_use]
    pub fn object(mut self, id: &ThingId) -> Self {
        self.object_id = Some(id.clone());
        self
    }

    #[must_use]
    pub fn objects(mut self, ids: BTreeSet<ThingId>) -> Self {
        self.object_ids = Some(ids);
        self
    }

    #[must_use]
    pub fn object_literal(mut self, label: impl Into<String>) -> Self {
        self.object_literal_label = Some(label.into());
        self
    }

    #[must_use]
    pub fn created_by(mut self, contributor: ContributorId) -> Self {
        self.created_by = Some(contributor);
        self
    }

    #[must_use]
    pub fn created_between(
        mut self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Self {
        self.created_at_start = start;
        self.created_at_end = end;
        self
    }

    #[must_use]
    pub fn matches(&self, statement: &GeneralStatement) -> bool {
        let subject = &statement.subject;
        let object = &statement.object;
        self.subject_id.as_ref().map_or(true, |id| subject.id() == id)
            && self
                .subject_ids
                .as_ref()
                .map_or(true, |ids| ids.contains(subject.id()))
            && has_classes(subject, &self.subject_classes)
            && self
                .subject_label
                .as_ref()
                .map_or(true, |search| search.matches(subject.label()))
            && self
                .predicate_id
                .as_ref()
                .map_or(true, |id| &statement.predicate.id == id)
            && self.object_id.as_ref().map_or(true, |id| object.id() == id)
            && self
                .object_ids
                .as_ref()
                .map_or(true, |ids| ids.contains(object.id()))
            && has_classes(object, &self.object_classes)
            && self.object_literal_label.as_ref().map_or(true, |label| {
                object.as_literal().is_some_and(|literal| &literal.label == label)
            })
            && self
                .object_label
                .as_ref()
                .map_or(true, |search| search.matches(object.label()))
            && self
                .created_by
                .map_or(true, |contributor| statement.created_by == contributor)
            && self
                .created_at_start
                .map_or(true, |start| statement.created_at >= start)
            && self
                .created_at_end
                .map_or(true, |end| statement.created_at <= end)
            && self
                .statement_ids
                .as_ref()
                .map_or(true, |ids| ids.contains(&statement.id))
    }
}

fn has_classes(thing: &Thing, classes: &BTreeSet<ThingId>) -> bool {
    classes.is_empty()
        || thing
            .as_resource()
            .is_some_and(|resource| classes.is_subset(&resource.classes))
}

/// The statement store.
///
/// All statements share one relationship shape and are told apart by their
/// predicate id. The named finders are thin selections over
/// [`StatementRepository::find_all`].
#[async_trait]
pub trait StatementRepository: Send + Sync {
    type Error: Send;

    async fn next_identity(&self) -> Result<StatementId, Self::Error>;

    async fn save(&self, statement: GeneralStatement) -> Result<(), Self::Error>;

    async fn save_all(&self, statements: Vec<GeneralStatement>) -> Result<(), Self::Error>;

    async fn count(&self) -> Result<u64, Self::Error>;

    async fn delete(&self, statement: &GeneralStatement) -> Result<(), Self::Error> {
        self.delete_by_statement_id(&statement.id).await
    }

    async fn delete_by_statement_id(&self, id: &StatementId) -> Result<(), Self::Error>;

    async fn delete_by_statement_ids(&self, ids: &BTreeSet<StatementId>)
        -> Result<(), Self::Error>;

    async fn delete_all(&self) -> Result<(), Self::Error>;

    async fn find_by_statement_id(
        &self,
        id: &StatementId,
    ) -> Result<Option<GeneralStatement>, Self::Error>;

    async fn exists(&self, id: &StatementId) -> Result<bool, Self::Error>;

    /// Statements selected by `filter`, ordered by `pageable.sort` (oldest
    /// first without one). The page total counts the same selection.
    async fn find_all(
        &self,
        filter: &StatementFilter,
        pageable: &Pageable,
    ) -> Result<Page<GeneralStatement>, Self::Error>;

    async fn find_all_by_subject(
        &self,
        subject_id: &ThingId,
        pageable: &Pageable,
    ) -> Result<Page<GeneralStatement>, Self::Error> {
        self.find_all(&StatementFilter::new().subject(subject_id), pageable)
            .await
    }

    async fn find_all_by_predicate_id(
        &self,
        predicate_id: &ThingId,
        pageable: &Pageable,
    ) -> Result<Page<GeneralStatement>, Self::Error> {
        self.find_all(&StatementFilter::new().predicate(predicate_id), pageable)
            .await
    }

    async fn find_all_by_object(
        &self,
        object_id: &ThingId,
        pageable: &Pageable,
    ) -> Result<Page<GeneralStatement>, Self::Error> {
        self.find_all(&StatementFilter::new().object(object_id), pageable)
            .await
    }

    async fn find_all_by_object_and_predicate(
        &self,
        object_id: &ThingId,
        predicate_id: &ThingId,
        pageable: &Pageable,
    ) -> Result<Page<GeneralStatement>, Self::Error> {
        let filter = StatementFilter::new()
            .object(object_id)
            .predicate(predicate_id);
        self.find_all(&filter, pageable).await
    }

    async fn find_all_by_subject_and_predicate(
        &self,
        subject_id: &ThingId,
        predicate_id: &ThingId,
        pageable: &Pageable,
    ) -> Result<Page<GeneralStatement>, Self::Error> {
        let filter = StatementFilter::new()
            .subject(subject_id)
            .predicate(predicate_id);
        self.find_all(&filter, pageable).await
    }

    /// Statements using `predicate_id` whose object is a literal labelled
    /// exactly `literal`.
    async fn find_all_by_predicate_id_and_label(
        &self,
        predicate_id: &ThingId,
        literal: &str,
        pageable: &Pageable,
    ) -> Result<Page<GeneralStatement>, Self::Error> {
        let filter = StatementFilter::new()
            .predicate(predicate_id)
            .object_literal(literal);
        self.find_all(&filter, pageable).await
    }

    async fn find_all_by_predicate_id_and_label_and_subject_class(
        &self,
        predicate_id: &ThingId,
        literal: &str,
        subject_class: &ThingId,
        pageable: &Pageable,
    ) -> Result<Page<GeneralStatement>, Self::Error> {
        let filter = StatementFilter::new()
            .predicate(predicate_id)
            .object_literal(literal)
            .subject_class(subject_class);
        self.find_all(&filter, pageable).await
    }

    async fn find_all_by_subjects(
        &self,
        subject_ids: &BTreeSet<ThingId>,
        pageable: &Pageable,
    ) -> Result<Page<GeneralStatement>, Self::Error> {
        self.find_all(&StatementFilter::new().subjects(subject_ids.clone()), pageable)
            .await
    }

    async fn find_all_by_objects(
        &self,
        object_ids: &BTreeSet<ThingId>,
        pageable: &Pageable,
    ) -> Result<Page<GeneralStatement>, Self::Error> {
        self.find_all(&StatementFilter::new().objects(object_ids.clone()), pageable)
            .await
    }

    /// Number of statements pointing at each of `ids`, zero counts included.
    async fn count_incoming_statements(
        &self,
        ids: &BTreeSet<ThingId>,
    ) -> Result<BTreeMap<ThingId, u64>, Self::Error>;

    async fn count_statements_about_resource(&self, id: &ThingId) -> Result<u64, Self::Error> {
        let counts = self
            .count_incoming_statements(&BTreeSet::from([id.clone()]))
            .await?;
        Ok(counts.get(id).copied().unwrap_or_default())
    }

    /// Incoming statement counts, leaving out ids nothing points at.
    async fn count_statements_about_resources(
        &self,
        ids: &BTreeSet<ThingId>,
    ) -> Result<BTreeMap<ThingId, u64>, Self::Error> {
        let mut counts = self.count_incoming_statements(ids).await?;
        counts.retain(|_, count| *count > 0);
        Ok(counts)
    }

    /// Statements reachable from `id`, not descending into papers, problems
    /// and research fields.
    async fn count_by_id_recursive(&self, id: &ThingId) -> Result<u64, Self::Error>;

    /// Statements using the predicate as subject, predicate or object.
    async fn count_predicate_usage(&self, id: &ThingId) -> Result<u64, Self::Error>;

    /// Predicates ranked by the number of statements using them, ties broken
    /// by ascending id.
    async fn find_all_predicate_usage(
        &self,
        pageable: &Pageable,
    ) -> Result<Page<PredicateUsageCount>, Self::Error>;

    /// True when `id` is the subject or object of any statement.
    async fn check_if_resource_has_statements(&self, id: &ThingId) -> Result<bool, Self::Error>;

    async fn determine_ownership(
        &self,
        ids: &BTreeSet<StatementId>,
    ) -> Result<BTreeSet<OwnershipInfo>, Self::Error>;

    async fn find_by_subject_id_and_predicate_id_and_object_id(
        &self,
        subject_id: &ThingId,
        predicate_id: &ThingId,
        object_id: &ThingId,
    ) -> Result<Option<GeneralStatement>, Self::Error>;

    /// The DOI literal of the paper holding the contribution.
    async fn find_doi_by_contribution_id(
        &self,
        id: &ThingId,
    ) -> Result<Option<Literal>, Self::Error>;

    /// The paper with the DOI, compared case-insensitively.
    async fn find_by_doi(&self, doi: &str) -> Result<Option<Resource>, Self::Error>;

    /// Problems addressed by contributions of papers of the observatory.
    async fn find_problems_by_observatory_id(
        &self,
        id: ObservatoryId,
        pageable: &Pageable,
    ) -> Result<Page<Resource>, Self::Error>;

    /// Problems addressed by contributions compared by the organization.
    async fn find_problems_by_organization_id(
        &self,
        id: OrganizationId,
        pageable: &Pageable,
    ) -> Result<Page<Resource>, Self::Error>;

    async fn find_contributors_by_resource_id(
        &self,
        id: &ThingId,
        pageable: &Pageable,
    ) -> Result<Page<ContributorId>, Self::Error>;

    async fn find_timeline_by_resource_id(
        &self,
        id: &ThingId,
        pageable: &Pageable,
    ) -> Result<Page<ResourceContributor>, Self::Error>;

    /// The subgraph reachable from `id` under `configuration`.
    async fn fetch_as_bundle(
        &self,
        id: &ThingId,
        configuration: &BundleConfiguration,
        sort: Sort,
    ) -> Result<Bundle, Self::Error>;

    /// The label of the `description` literal of each subject that has one.
    async fn find_all_descriptions(
        &self,
        ids: &BTreeSet<ThingId>,
    ) -> Result<BTreeMap<ThingId, String>, Self::Error>;
}

/// Lists are stored as resources plus `hasListElement` statements; this port
/// is the only writer of those statements.
#[async_trait]
pub trait ListRepository: Send + Sync {
    type Error;

    async fn next_identity(&self) -> Result<ThingId, Self::Error>;

    async fn save(&self, list: List, contributor: ContributorId) -> Result<(), Self::Error>;

    async fn find_by_id(&self, id: &ThingId) -> Result<Option<List>, Self::Error>;

    async fn exists(&self, id: &ThingId) -> Result<bool, Self::Error>;

    async fn delete(&self, id: &ThingId) -> Result<(), Self::Error>;
}
