use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use orkg_graph::{
    config::GraphSettings,
    graph::{
        service::{
            CreateClassCommand, CreateListCommand, CreateLiteralCommand, CreatePredicateCommand,
            CreateResourceCommand, CreateStatementCommand, UpdateStatementCommand,
        },
        BundleConfiguration, ContributorId, FixedClock, GraphError, GraphService, Pageable,
        Sort, StatementFilter, StatementId, ThingId,
    },
};
use rstest::rstest;

fn service() -> (GraphService, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
    ));
    let graph = GraphService::with_clock(&GraphSettings::default(), clock.clone());
    (graph, clock)
}

fn id(value: &str) -> ThingId {
    ThingId::new(value).expect("valid id")
}

async fn resource(graph: &GraphService, label: &str) -> ThingId {
    graph
        .resources()
        .create(CreateResourceCommand::new(label))
        .await
        .unwrap()
}

async fn link(graph: &GraphService, subject: &ThingId, predicate: &ThingId, object: &ThingId) -> StatementId {
    graph
        .statements()
        .create(CreateStatementCommand::new(
            subject.clone(),
            predicate.clone(),
            object.clone(),
        ))
        .await
        .unwrap()
}

#[tokio::test]
async fn resource_in_use_cannot_be_deleted_until_statement_is_gone() {
    let (graph, _) = service();
    let r1 = resource(&graph, "paper").await;
    let r2 = resource(&graph, "author").await;
    let p1 = graph
        .predicates()
        .create(CreatePredicateCommand::new("hasAuthor"))
        .await
        .unwrap();
    assert_eq!((r1.as_str(), r2.as_str(), p1.as_str()), ("R1", "R2", "P1"));

    let s1 = link(&graph, &r1, &p1, &r2).await;
    assert_eq!(s1.as_str(), "S1");

    let by_subject = graph
        .statements()
        .find_all_by_subject(&r1, &Pageable::default())
        .await
        .unwrap();
    let ids: Vec<_> = by_subject.content.iter().map(|it| it.id.clone()).collect();
    assert_eq!(ids, vec![s1.clone()]);
    assert!(graph
        .statements()
        .check_if_resource_has_statements(&r1)
        .await
        .unwrap());

    assert_eq!(
        graph.resources().delete(&r1).await,
        Err(GraphError::ResourceUsedInStatement { id: r1.clone() })
    );

    graph.statements().delete(&s1).await.unwrap();
    graph.resources().delete(&r1).await.unwrap();
    assert!(graph.resources().find_by_id(&r1).await.unwrap().is_none());
}

#[tokio::test]
async fn identical_triples_reuse_the_statement() {
    let (graph, _) = service();
    let r1 = resource(&graph, "paper").await;
    let r2 = resource(&graph, "author").await;
    let p1 = graph
        .predicates()
        .create(CreatePredicateCommand::new("hasAuthor"))
        .await
        .unwrap();

    let first = link(&graph, &r1, &p1, &r2).await;
    let second = link(&graph, &r1, &p1, &r2).await;

    assert_eq!(first, second);
    assert_eq!(graph.statements().count().await.unwrap(), 1);
}

#[tokio::test]
async fn statement_endpoints_are_validated() {
    let (graph, _) = service();
    let r1 = resource(&graph, "paper").await;
    let p1 = graph
        .predicates()
        .create(CreatePredicateCommand::new("hasTitle"))
        .await
        .unwrap();
    let l1 = graph
        .literals()
        .create(CreateLiteralCommand::new("A title"))
        .await
        .unwrap();

    let statements = graph.statements();
    assert_eq!(
        statements
            .create(CreateStatementCommand::new(id("R404"), p1.clone(), l1.clone()))
            .await,
        Err(GraphError::StatementSubjectNotFound { id: id("R404") })
    );
    assert_eq!(
        statements
            .create(CreateStatementCommand::new(r1.clone(), id("P404"), l1.clone()))
            .await,
        Err(GraphError::StatementPredicateNotFound { id: id("P404") })
    );
    assert_eq!(
        statements
            .create(CreateStatementCommand::new(r1.clone(), p1.clone(), id("R404")))
            .await,
        Err(GraphError::StatementObjectNotFound { id: id("R404") })
    );
    assert_eq!(
        statements
            .create(CreateStatementCommand::new(l1.clone(), p1.clone(), r1.clone()))
            .await,
        Err(GraphError::ForbiddenStatementSubject { id: l1.clone() })
    );

    let s1 = link(&graph, &r1, &p1, &l1).await;
    let duplicate = CreateStatementCommand {
        id: Some(s1.clone()),
        ..CreateStatementCommand::new(r1, p1, l1)
    };
    assert_eq!(
        statements.create(duplicate).await,
        Err(GraphError::StatementAlreadyExists { id: s1 })
    );
}

#[tokio::test]
async fn list_statements_are_protected() {
    let (graph, _) = service();
    let r1 = resource(&graph, "first").await;
    let r2 = resource(&graph, "second").await;
    let list = graph
        .lists()
        .create(CreateListCommand::new("reading list", vec![r1.clone(), r2.clone()]))
        .await
        .unwrap();
    let has_list_element = id("hasListElement");

    let elements = graph
        .statements()
        .find_all(
            &StatementFilter::new()
                .subject(&list)
                .predicate(&has_list_element),
            &Pageable::default(),
        )
        .await
        .unwrap();
    assert_eq!(elements.total_elements, 2);
    let element = elements.content[0].id.clone();

    assert_eq!(
        graph.statements().delete(&element).await,
        Err(GraphError::ForbiddenStatementDeletion {
            id: element.clone()
        })
    );
    let mut update = UpdateStatementCommand::new(element.clone());
    update.object_id = Some(r1.clone());
    assert_eq!(
        graph.statements().update(update).await,
        Err(GraphError::UnmodifiableStatement { id: element })
    );
    assert_eq!(
        graph
            .statements()
            .create(CreateStatementCommand::new(
                list.clone(),
                has_list_element,
                r1.clone()
            ))
            .await,
        Err(GraphError::ForbiddenStatementSubject { id: list.clone() })
    );

    let p1 = graph
        .predicates()
        .create(CreatePredicateCommand::new("mentions"))
        .await
        .unwrap();
    let regular = link(&graph, &list, &p1, &r2).await;
    graph.statements().delete(&regular).await.unwrap();
    assert!(!graph.statements().exists(&regular).await.unwrap());

    let stored = graph.lists().find_by_id(&list).await.unwrap().unwrap();
    assert_eq!(stored.elements, vec![r1, r2]);
}

#[tokio::test]
async fn list_elements_must_exist() {
    let (graph, _) = service();
    let result = graph
        .lists()
        .create(CreateListCommand::new("broken", vec![id("R404")]))
        .await;
    assert_eq!(result, Err(GraphError::ListElementNotFound));
    assert_eq!(
        graph.lists().delete(&id("R404")).await,
        Err(GraphError::ListNotFound { id: id("R404") })
    );
}

#[tokio::test]
async fn bulk_deletion_requires_ownership_or_curation() {
    let (graph, _) = service();
    let owner = ContributorId::random();
    let other = ContributorId::random();
    let r1 = resource(&graph, "paper").await;
    let r2 = resource(&graph, "venue").await;
    let p1 = graph
        .predicates()
        .create(CreatePredicateCommand::new("publishedIn"))
        .await
        .unwrap();
    let s1 = graph
        .statements()
        .create(CreateStatementCommand {
            contributor: owner,
            ..CreateStatementCommand::new(r1, p1, r2)
        })
        .await
        .unwrap();
    let ids = BTreeSet::from([s1.clone()]);

    assert_eq!(
        graph.statements().delete_as(&ids, other, false).await,
        Err(GraphError::NeitherOwnerNorCurator { contributor: other })
    );
    graph.statements().delete_as(&ids, owner, false).await.unwrap();
    assert!(!graph.statements().exists(&s1).await.unwrap());
}

/// Builds `R1 -> R2 -> R3` with the second hop created one minute later.
async fn chain(graph: &GraphService, clock: &FixedClock) -> (ThingId, StatementId, StatementId) {
    let root = resource(graph, "root").await;
    let o1 = resource(graph, "middle").await;
    let o2 = resource(graph, "leaf").await;
    let p1 = graph
        .predicates()
        .create(CreatePredicateCommand::new("related"))
        .await
        .unwrap();
    let first = link(graph, &root, &p1, &o1).await;
    clock.advance(Duration::minutes(1));
    let second = link(graph, &o1, &p1, &o2).await;
    (root, first, second)
}

#[rstest]
#[case::first_level_only(None, Some(1), &["S1"])]
#[case::below_first_level(Some(1), None, &["S2"])]
#[case::unbounded(None, None, &["S2", "S1"])]
#[case::empty_window(Some(2), Some(1), &[])]
#[tokio::test]
async fn bundle_level_bounds(
    #[case] min_level: Option<usize>,
    #[case] max_level: Option<usize>,
    #[case] expected: &[&str],
) {
    let (graph, clock) = service();
    let (root, _, _) = chain(&graph, &clock).await;

    let configuration = BundleConfiguration {
        min_level,
        max_level,
        ..BundleConfiguration::default()
    };
    let bundle = graph
        .statements()
        .fetch_as_bundle(&root, &configuration, false, Sort::created_at_desc())
        .await
        .unwrap();

    let ids: Vec<_> = bundle.bundle.iter().map(|it| it.id.as_str()).collect();
    assert_eq!(ids, expected);
    assert_eq!(bundle.root_id, root);
}

#[tokio::test]
async fn bundle_can_always_include_the_first_level() {
    let (graph, clock) = service();
    let (root, first, second) = chain(&graph, &clock).await;

    let configuration = BundleConfiguration {
        min_level: Some(1),
        ..BundleConfiguration::default()
    };
    let bundle = graph
        .statements()
        .fetch_as_bundle(&root, &configuration, true, Sort::created_at_desc())
        .await
        .unwrap();

    let ids: Vec<_> = bundle.bundle.into_iter().map(|it| it.id).collect();
    assert_eq!(ids, vec![second, first]);
}

#[tokio::test]
async fn bundle_filters_on_object_classes() {
    let (graph, clock) = service();
    let problem = graph
        .classes()
        .create(CreateClassCommand {
            id: Some(id("Problem")),
            ..CreateClassCommand::new("Problem")
        })
        .await
        .unwrap();
    let root = resource(&graph, "paper").await;
    let p1 = graph
        .predicates()
        .create(CreatePredicateCommand::new("addresses"))
        .await
        .unwrap();
    let topic = resource(&graph, "topic").await;
    let question = graph
        .resources()
        .create(CreateResourceCommand {
            classes: BTreeSet::from([problem.clone()]),
            ..CreateResourceCommand::new("question")
        })
        .await
        .unwrap();
    let to_topic = link(&graph, &root, &p1, &topic).await;
    clock.advance(Duration::seconds(5));
    let to_question = link(&graph, &root, &p1, &question).await;

    let blacklisted = BundleConfiguration {
        blacklist: BTreeSet::from([problem.clone()]),
        ..BundleConfiguration::default()
    };
    let bundle = graph
        .statements()
        .fetch_as_bundle(&root, &blacklisted, false, Sort::created_at_desc())
        .await
        .unwrap();
    assert_eq!(
        bundle.bundle.iter().map(|it| &it.id).collect::<Vec<_>>(),
        vec![&to_topic]
    );

    let whitelisted = BundleConfiguration {
        whitelist: BTreeSet::from([problem]),
        ..BundleConfiguration::default()
    };
    let bundle = graph
        .statements()
        .fetch_as_bundle(&root, &whitelisted, false, Sort::created_at_desc())
        .await
        .unwrap();
    assert_eq!(
        bundle.bundle.iter().map(|it| &it.id).collect::<Vec<_>>(),
        vec![&to_question]
    );
}

#[tokio::test]
async fn bundle_of_unknown_thing_fails() {
    let (graph, _) = service();
    let result = graph
        .statements()
        .fetch_as_bundle(
            &id("R404"),
            &BundleConfiguration::default(),
            false,
            Sort::created_at_desc(),
        )
        .await;
    assert_eq!(result, Err(GraphError::ThingNotFound { id: id("R404") }));
}

#[tokio::test]
async fn incoming_statement_counts() {
    let (graph, _) = service();
    let r1 = resource(&graph, "paper").await;
    let r2 = resource(&graph, "author").await;
    let p1 = graph
        .predicates()
        .create(CreatePredicateCommand::new("cites"))
        .await
        .unwrap();
    link(&graph, &r1, &p1, &r2).await;
    link(&graph, &r2, &p1, &r2).await;

    let statements = graph.statements();
    assert_eq!(statements.count_statements_about_resource(&r2).await.unwrap(), 2);
    assert_eq!(statements.count_statements_about_resource(&r1).await.unwrap(), 0);
    let counts = statements
        .count_statements_about_resources(&BTreeSet::from([r1, r2.clone()]))
        .await
        .unwrap();
    assert_eq!(counts.into_iter().collect::<Vec<_>>(), vec![(r2, 2)]);
}
