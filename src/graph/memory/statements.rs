use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::bundle::{collect_bundle, walk, Step};
use super::{GraphState, InMemoryGraph, StatementRecord};
use crate::graph::{
    entities::{
        well_known, Bundle, BundleConfiguration, GeneralStatement, Literal, OwnershipInfo,
        PredicateUsageCount, Resource, ResourceContributor, Thing,
    },
    errors::GraphError,
    pagination::{sort_items, Page, Pageable, Sort},
    repositories::{StatementFilter, StatementRepository},
    value_objects::{ContributorId, ObservatoryId, OrganizationId, StatementId, ThingId},
};

/// Edits are reported per minute.
const TIMELINE_FORMAT: &str = "%Y-%m-%dT%H:%M:00Z";

#[derive(Clone)]
pub struct InMemoryStatementRepository {
    graph: Arc<InMemoryGraph>,
}

impl InMemoryStatementRepository {
    #[must_use]
    pub fn new(graph: Arc<InMemoryGraph>) -> Self {
        Self { graph }
    }

    /// Statements reachable from `id` without entering resources of a
    /// boundary class.
    fn bounded_subgraph(
        &self,
        state: &GraphState,
        id: &ThingId,
    ) -> Result<Vec<GeneralStatement>, GraphError> {
        let boundaries = well_known::classes::traversal_boundaries();
        let walked = walk(state, id, self.graph.traversal_timeout(), |statement, _| {
            if statement.object.is_resource_of_any(&boundaries) {
                Step::Prune
            } else {
                Step::Follow
            }
        })?;
        Ok(walked.into_iter().map(|(statement, _)| statement).collect())
    }
}

/// Problems reached from `origin` resources over `link` through
/// contributions.
fn problems_via_contributions(
    state: &GraphState,
    is_origin: impl Fn(&Resource) -> bool,
    link: &ThingId,
) -> Vec<Resource> {
    let contribution = well_known::classes::contribution();
    let problem = well_known::classes::problem();
    let has_research_problem = well_known::predicates::has_research_problem();
    let statements: Vec<GeneralStatement> = state.general_statements().collect();

    let contributions: BTreeSet<&ThingId> = statements
        .iter()
        .filter(|it| {
            it.subject.as_resource().is_some_and(&is_origin)
                && &it.predicate.id == link
                && it.object.is_resource_of_any(std::slice::from_ref(&contribution))
        })
        .map(|it| it.object.id())
        .collect();

    let mut seen = BTreeSet::new();
    statements
        .iter()
        .filter(|it| {
            contributions.contains(it.subject.id())
                && it.predicate.id == has_research_problem
                && it.object.is_resource_of_any(std::slice::from_ref(&problem))
        })
        .filter_map(|it| it.object.as_resource())
        .filter(|resource| seen.insert(resource.id.clone()))
        .cloned()
        .collect()
}

fn edit_of(thing: &Thing) -> (ContributorId, DateTime<Utc>) {
    (thing.created_by(), thing.created_at())
}

#[async_trait]
impl StatementRepository for InMemoryStatementRepository {
    type Error = GraphError;

    async fn next_identity(&self) -> Result<StatementId, Self::Error> {
        Ok(self.graph.next_statement_id())
    }

    async fn save(&self, statement: GeneralStatement) -> Result<(), Self::Error> {
        self.graph
            .guard()
            .statements
            .insert(statement.id.clone(), StatementRecord::from(&statement));
        Ok(())
    }

    async fn save_all(&self, statements: Vec<GeneralStatement>) -> Result<(), Self::Error> {
        let mut state = self.graph.guard();
        for statement in &statements {
            state
                .statements
                .insert(statement.id.clone(), StatementRecord::from(statement));
        }
        Ok(())
    }

    /// Counts the statements `find_all` can return; records with a missing
    /// endpoint are left out.
    async fn count(&self) -> Result<u64, Self::Error> {
        let count = self.graph.guard().general_statements().count();
        Ok(count as u64)
    }

    async fn delete_by_statement_id(&self, id: &StatementId) -> Result<(), Self::Error> {
        self.graph.guard().statements.remove(id);
        Ok(())
    }

    async fn delete_by_statement_ids(
        &self,
        ids: &BTreeSet<StatementId>,
    ) -> Result<(), Self::Error> {
        self.graph
            .guard()
            .statements
            .retain(|id, _| !ids.contains(id));
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), Self::Error> {
        self.graph.guard().statements.clear();
        Ok(())
    }

    async fn find_by_statement_id(
        &self,
        id: &StatementId,
    ) -> Result<Option<GeneralStatement>, Self::Error> {
        let state = self.graph.guard();
        Ok(state
            .statements
            .get(id)
            .and_then(|record| state.resolve(record)))
    }

    async fn exists(&self, id: &StatementId) -> Result<bool, Self::Error> {
        Ok(self.graph.guard().statements.contains_key(id))
    }

    async fn find_all(
        &self,
        filter: &StatementFilter,
        pageable: &Pageable,
    ) -> Result<Page<GeneralStatement>, Self::Error> {
        let selected = self
            .graph
            .guard()
            .general_statements()
            .filter(|statement| filter.matches(statement))
            .collect();
        Ok(Page::sorted(selected, pageable))
    }

    async fn count_incoming_statements(
        &self,
        ids: &BTreeSet<ThingId>,
    ) -> Result<BTreeMap<ThingId, u64>, Self::Error> {
        let state = self.graph.guard();
        let mut counts: BTreeMap<ThingId, u64> = ids.iter().map(|id| (id.clone(), 0)).collect();
        for record in state.statements.values() {
            if let Some(count) = counts.get_mut(&record.object_id) {
                *count += 1;
            }
        }
        Ok(counts)
    }

    async fn count_by_id_recursive(&self, id: &ThingId) -> Result<u64, Self::Error> {
        let state = self.graph.guard();
        Ok(self.bounded_subgraph(&state, id)?.len() as u64)
    }

    async fn count_predicate_usage(&self, id: &ThingId) -> Result<u64, Self::Error> {
        let state = self.graph.guard();
        Ok(state
            .statements
            .values()
            .filter(|record| {
                &record.predicate_id == id || &record.subject_id == id || &record.object_id == id
            })
            .count() as u64)
    }

    async fn find_all_predicate_usage(
        &self,
        pageable: &Pageable,
    ) -> Result<Page<PredicateUsageCount>, Self::Error> {
        let state = self.graph.guard();
        let mut usage: BTreeMap<&ThingId, u64> = BTreeMap::new();
        for record in state.statements.values() {
            *usage.entry(&record.predicate_id).or_default() += 1;
        }
        let mut ranking: Vec<PredicateUsageCount> = usage
            .into_iter()
            .map(|(id, count)| PredicateUsageCount {
                id: id.clone(),
                count,
            })
            .collect();
        ranking.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.id.cmp(&b.id)));
        Ok(Page::from_ordered(ranking, pageable))
    }

    async fn check_if_resource_has_statements(&self, id: &ThingId) -> Result<bool, Self::Error> {
        Ok(self
            .graph
            .guard()
            .statements
            .values()
            .any(|record| &record.subject_id == id || &record.object_id == id))
    }

    async fn determine_ownership(
        &self,
        ids: &BTreeSet<StatementId>,
    ) -> Result<BTreeSet<OwnershipInfo>, Self::Error> {
        let state = self.graph.guard();
        Ok(ids
            .iter()
            .filter_map(|id| state.statements.get(id))
            .map(|record| OwnershipInfo {
                statement_id: record.id.clone(),
                owner: record.created_by,
            })
            .collect())
    }

    async fn find_by_subject_id_and_predicate_id_and_object_id(
        &self,
        subject_id: &ThingId,
        predicate_id: &ThingId,
        object_id: &ThingId,
    ) -> Result<Option<GeneralStatement>, Self::Error> {
        let state = self.graph.guard();
        Ok(state
            .statements
            .values()
            .find(|record| {
                &record.subject_id == subject_id
                    && &record.predicate_id == predicate_id
                    && &record.object_id == object_id
            })
            .and_then(|record| state.resolve(record)))
    }

    async fn find_doi_by_contribution_id(
        &self,
        id: &ThingId,
    ) -> Result<Option<Literal>, Self::Error> {
        let state = self.graph.guard();
        let paper = well_known::classes::paper();
        let has_contribution = well_known::predicates::has_contribution();
        let has_doi = well_known::predicates::has_doi();

        let statements: Vec<GeneralStatement> = state.general_statements().collect();
        let Some(paper_id) = statements
            .iter()
            .find(|it| {
                it.subject.is_resource_of_any(std::slice::from_ref(&paper))
                    && it.predicate.id == has_contribution
                    && it.object.id() == id
            })
            .map(|it| it.subject.id().clone())
        else {
            return Ok(None);
        };
        Ok(statements
            .iter()
            .find(|it| it.subject.id() == &paper_id && it.predicate.id == has_doi)
            .and_then(|it| it.object.as_literal().cloned()))
    }

    async fn find_by_doi(&self, doi: &str) -> Result<Option<Resource>, Self::Error> {
        let state = self.graph.guard();
        let paper = well_known::classes::paper();
        let paper_deleted = well_known::classes::paper_deleted();
        let has_doi = well_known::predicates::has_doi();
        let doi = doi.to_uppercase();

        let found = state
            .general_statements()
            .find(|it| {
                it.subject.as_resource().is_some_and(|resource| {
                    resource.has_class(&paper) && !resource.has_class(&paper_deleted)
                }) && it.predicate.id == has_doi
                    && it
                        .object
                        .as_literal()
                        .is_some_and(|literal| literal.label.to_uppercase() == doi)
            })
            .and_then(|it| it.subject.as_resource().cloned());
        Ok(found)
    }

    async fn find_problems_by_observatory_id(
        &self,
        id: ObservatoryId,
        pageable: &Pageable,
    ) -> Result<Page<Resource>, Self::Error> {
        let state = self.graph.guard();
        let paper = well_known::classes::paper();
        let problems = problems_via_contributions(
            &state,
            |resource| resource.has_class(&paper) && resource.observatory_id == Some(id),
            &well_known::predicates::has_contribution(),
        );
        Ok(Page::from_ordered(problems, pageable))
    }

    async fn find_problems_by_organization_id(
        &self,
        id: OrganizationId,
        pageable: &Pageable,
    ) -> Result<Page<Resource>, Self::Error> {
        let state = self.graph.guard();
        let comparison = well_known::classes::comparison();
        let problems = problems_via_contributions(
            &state,
            |resource| resource.has_class(&comparison) && resource.organization_id == Some(id),
            &well_known::predicates::compare_contribution(),
        );
        Ok(Page::from_ordered(problems, pageable))
    }

    async fn find_contributors_by_resource_id(
        &self,
        id: &ThingId,
        pageable: &Pageable,
    ) -> Result<Page<ContributorId>, Self::Error> {
        let state = self.graph.guard();
        let mut contributors = BTreeSet::new();
        for statement in self.bounded_subgraph(&state, id)? {
            contributors.insert(statement.subject.created_by());
            contributors.insert(statement.object.created_by());
            contributors.insert(statement.created_by);
        }
        let mut contributors: Vec<ContributorId> = contributors.into_iter().collect();
        contributors.sort_by_key(ToString::to_string);
        Ok(Page::from_ordered(contributors, pageable))
    }

    async fn find_timeline_by_resource_id(
        &self,
        id: &ThingId,
        pageable: &Pageable,
    ) -> Result<Page<ResourceContributor>, Self::Error> {
        let state = self.graph.guard();
        let Some(resource) = state.resources.get(id) else {
            return Ok(Page::empty(pageable));
        };
        let since = resource.created_at;

        let mut edits = BTreeSet::new();
        for statement in self.bounded_subgraph(&state, id)? {
            edits.insert(edit_of(&statement.subject));
            edits.insert(edit_of(&statement.object));
            edits.insert((statement.created_by, statement.created_at));
        }

        let timeline: BTreeSet<ResourceContributor> = edits
            .into_iter()
            .filter(|(_, at)| *at >= since)
            .map(|(created_by, at)| ResourceContributor {
                created_by,
                created_at: at.format(TIMELINE_FORMAT).to_string(),
            })
            .collect();
        let mut timeline: Vec<ResourceContributor> = timeline.into_iter().collect();
        timeline.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.created_by.cmp(&b.created_by))
        });
        Ok(Page::from_ordered(timeline, pageable))
    }

    async fn fetch_as_bundle(
        &self,
        id: &ThingId,
        configuration: &BundleConfiguration,
        sort: Sort,
    ) -> Result<Bundle, Self::Error> {
        let state = self.graph.guard();
        let mut bundle =
            collect_bundle(&state, id, configuration, self.graph.traversal_timeout())?;
        sort_items(&mut bundle, sort);
        Ok(Bundle {
            root_id: id.clone(),
            bundle,
        })
    }

    async fn find_all_descriptions(
        &self,
        ids: &BTreeSet<ThingId>,
    ) -> Result<BTreeMap<ThingId, String>, Self::Error> {
        let state = self.graph.guard();
        let description = well_known::predicates::description();
        let mut descriptions = BTreeMap::new();
        for record in state.statements.values() {
            if record.predicate_id != description || !ids.contains(&record.subject_id) {
                continue;
            }
            if let Some(literal) = state.literals.get(&record.object_id) {
                descriptions
                    .entry(record.subject_id.clone())
                    .or_insert_with(|| literal.label.clone());
            }
        }
        Ok(descriptions)
    }
}
