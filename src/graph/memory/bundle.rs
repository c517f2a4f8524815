use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt::{self, Display, Formatter};
use std::time::{Duration, Instant};

use super::{GraphState, StatementRecord};
use crate::graph::{
    entities::{BundleConfiguration, GeneralStatement, Thing},
    errors::GraphError,
    value_objects::{StatementId, ThingId},
};

/// Node label filter compiled from a bundle configuration.
///
/// Whitelisted labels are positive terms and go first, blacklisted labels are
/// appended as negative terms. A node passes when it carries a positive
/// label; otherwise it is rejected when it carries a negative label or when
/// positive terms exist at all. A label listed on both sides therefore
/// counts as positive.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelFilter {
    positive: Vec<String>,
    negative: Vec<String>,
}

impl LabelFilter {
    #[must_use]
    pub fn compile(configuration: &BundleConfiguration) -> Self {
        Self {
            positive: configuration
                .whitelist
                .iter()
                .map(|id| id.as_str().to_string())
                .collect(),
            negative: configuration
                .blacklist
                .iter()
                .map(|id| id.as_str().to_string())
                .collect(),
        }
    }

    #[must_use]
    pub fn accepts(&self, labels: &BTreeSet<&str>) -> bool {
        if self.positive.iter().any(|label| labels.contains(label.as_str())) {
            return true;
        }
        if self.negative.iter().any(|label| labels.contains(label.as_str())) {
            return false;
        }
        self.positive.is_empty()
    }

    #[must_use]
    pub fn accepts_thing(&self, thing: &Thing) -> bool {
        self.accepts(&thing.labels())
    }
}

impl Display for LabelFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let terms: Vec<String> = self
            .positive
            .iter()
            .map(|label| format!("+{label}"))
            .chain(self.negative.iter().map(|label| format!("-{label}")))
            .collect();
        f.write_str(&terms.join("|"))
    }
}

/// Whether a statement met during a walk is taken into the subgraph.
pub(super) enum Step {
    /// Collect the statement and continue from its object.
    Follow,
    /// Leave the statement out and do not continue from it.
    Prune,
}

/// Outgoing breadth-first walk over the edge table.
///
/// Statements leaving the root are on level 1. Each node is expanded once, at
/// its lowest level, so cycles terminate. The walk aborts with
/// [`GraphError::TraversalTimeout`] once `timeout` has elapsed.
pub(super) fn walk(
    state: &GraphState,
    root: &ThingId,
    timeout: Duration,
    mut decide: impl FnMut(&GeneralStatement, usize) -> Step,
) -> Result<Vec<(GeneralStatement, usize)>, GraphError> {
    let deadline = Instant::now() + timeout;
    let mut outgoing: BTreeMap<&ThingId, Vec<&StatementRecord>> = BTreeMap::new();
    for record in state.statements.values() {
        outgoing.entry(&record.subject_id).or_default().push(record);
    }

    let mut collected = Vec::new();
    let mut seen_statements: BTreeSet<&StatementId> = BTreeSet::new();
    let mut visited = BTreeSet::from([root.clone()]);
    let mut frontier = VecDeque::from([(root.clone(), 1_usize)]);

    while let Some((node, level)) = frontier.pop_front() {
        if Instant::now() >= deadline {
            tracing::warn!(
                %root,
                timeout_ms = timeout.as_millis() as u64,
                collected = collected.len(),
                "aborting graph traversal"
            );
            return Err(GraphError::TraversalTimeout {
                root: root.clone(),
                timeout_ms: timeout.as_millis() as u64,
            });
        }
        for record in outgoing.get(&node).into_iter().flatten() {
            if !seen_statements.insert(&record.id) {
                continue;
            }
            let Some(statement) = state.resolve(record) else {
                continue;
            };
            if let Step::Prune = decide(&statement, level) {
                continue;
            }
            if visited.insert(record.object_id.clone()) {
                frontier.push_back((record.object_id.clone(), level + 1));
            }
            collected.push((statement, level));
        }
    }
    Ok(collected)
}

/// Statements of the bundle around `root`.
///
/// `max_level` stops the walk, `min_level` only hides the statements up to
/// and including that level while the walk continues through them.
pub(super) fn collect_bundle(
    state: &GraphState,
    root: &ThingId,
    configuration: &BundleConfiguration,
    timeout: Duration,
) -> Result<Vec<GeneralStatement>, GraphError> {
    let filter = LabelFilter::compile(configuration);
    tracing::debug!(%root, filter = %filter, "fetching bundle");
    let walked = walk(state, root, timeout, |statement, level| {
        let beyond_max = configuration
            .max_level
            .is_some_and(|max_level| level > max_level);
        if beyond_max || !filter.accepts_thing(&statement.object) {
            Step::Prune
        } else {
            Step::Follow
        }
    })?;
    Ok(walked
        .into_iter()
        .filter(|(_, level)| {
            configuration
                .min_level
                .map_or(true, |min_level| *level > min_level)
        })
        .map(|(statement, _)| statement)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> BTreeSet<ThingId> {
        values
            .iter()
            .map(|value| ThingId::new(*value).expect("valid id"))
            .collect()
    }

    fn filter(whitelist: &[&str], blacklist: &[&str]) -> LabelFilter {
        LabelFilter::compile(&BundleConfiguration {
            whitelist: ids(whitelist),
            blacklist: ids(blacklist),
            ..BundleConfiguration::default()
        })
    }

    #[test]
    fn renders_whitelist_before_blacklist() {
        insta::assert_snapshot!(
            filter(&["Paper", "Contribution"], &["Problem"]).to_string(),
            @"+Contribution|+Paper|-Problem"
        );
        insta::assert_snapshot!(filter(&[], &[]).to_string(), @"");
    }

    #[test]
    fn empty_filter_accepts_everything() {
        assert!(filter(&[], &[]).accepts(&BTreeSet::from(["Resource", "Paper"])));
    }

    #[test]
    fn blacklist_only_rejects_listed_labels() {
        let filter = filter(&[], &["Problem"]);
        assert!(filter.accepts(&BTreeSet::from(["Resource", "Paper"])));
        assert!(!filter.accepts(&BTreeSet::from(["Resource", "Problem"])));
    }

    #[test]
    fn whitelist_only_accepts_listed_labels() {
        let filter = filter(&["Paper"], &[]);
        assert!(filter.accepts(&BTreeSet::from(["Resource", "Paper"])));
        assert!(!filter.accepts(&BTreeSet::from(["Literal"])));
    }

    #[test]
    fn label_on_both_lists_is_positive() {
        let filter = filter(&["Paper"], &["Paper", "Problem"]);
        assert!(filter.accepts(&BTreeSet::from(["Resource", "Paper", "Problem"])));
        assert!(!filter.accepts(&BTreeSet::from(["Resource", "Problem"])));
    }
}
