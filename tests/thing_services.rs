use std::sync::Arc;

use chrono::{TimeZone, Utc};
use orkg_graph::{
    config::GraphSettings,
    graph::{
        service::{
            CreateClassCommand, CreateListCommand, CreateLiteralCommand, CreatePredicateCommand,
            CreateResourceCommand, CreateStatementCommand, UpdateLiteralCommand,
            UpdateResourceCommand,
        },
        value_objects::{LabelError, MAX_LABEL_LENGTH},
        FixedClock, GraphError, GraphService, Pageable, PredicateRepository, ProblemMapper,
        SearchString, ThingId, ThingKind, ThingRepository,
    },
};
use rstest::rstest;

fn service_with(settings: &GraphSettings) -> GraphService {
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
    ));
    GraphService::with_clock(settings, clock)
}

fn service() -> GraphService {
    service_with(&GraphSettings::default())
}

#[derive(Clone, Copy, Debug)]
enum Kind {
    Resource,
    Literal,
    Predicate,
    Class,
    List,
}

async fn create(graph: &GraphService, kind: Kind, label: &str) -> Result<ThingId, GraphError> {
    match kind {
        Kind::Resource => {
            graph
                .resources()
                .create(CreateResourceCommand::new(label))
                .await
        }
        Kind::Literal => graph.literals().create(CreateLiteralCommand::new(label)).await,
        Kind::Predicate => {
            graph
                .predicates()
                .create(CreatePredicateCommand::new(label))
                .await
        }
        Kind::Class => graph.classes().create(CreateClassCommand::new(label)).await,
        Kind::List => {
            graph
                .lists()
                .create(CreateListCommand::new(label, Vec::new()))
                .await
        }
    }
}

#[rstest]
#[case::resource(Kind::Resource)]
#[case::literal(Kind::Literal)]
#[case::predicate(Kind::Predicate)]
#[case::class(Kind::Class)]
#[case::list(Kind::List)]
#[tokio::test]
async fn labels_are_validated_for_every_kind(#[case] kind: Kind) {
    let graph = service();

    assert_eq!(
        create(&graph, kind, "a\nb").await,
        Err(GraphError::InvalidLabel {
            reason: LabelError::Invalid
        })
    );
    assert_eq!(
        create(&graph, kind, &"x".repeat(MAX_LABEL_LENGTH + 1)).await,
        Err(GraphError::InvalidLabel {
            reason: LabelError::TooLong {
                max: MAX_LABEL_LENGTH
            }
        })
    );
    assert!(create(&graph, kind, &"x".repeat(MAX_LABEL_LENGTH)).await.is_ok());
}

#[rstest]
#[case::integer("42", "xsd:integer", true)]
#[case::signed_integer("-7", "xsd:int", true)]
#[case::broken_integer("4.2", "xsd:integer", false)]
#[case::decimal("3.14", "xsd:decimal", true)]
#[case::boolean("true", "xsd:boolean", true)]
#[case::broken_boolean("yes", "xsd:boolean", false)]
#[case::free_text("anything", "xsd:string", true)]
#[case::iri_datatype("42", "http://www.w3.org/2001/XMLSchema#integer", true)]
#[tokio::test]
async fn literal_labels_match_their_datatype(
    #[case] label: &str,
    #[case] datatype: &str,
    #[case] accepted: bool,
) {
    let graph = service();
    let result = graph
        .literals()
        .create(CreateLiteralCommand::typed(label, datatype))
        .await;

    if accepted {
        let id = result.expect("literal");
        let literal = graph.literals().find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(literal.datatype, datatype);
    } else {
        assert_eq!(
            result,
            Err(GraphError::InvalidLiteralLabel {
                label: label.to_string(),
                datatype: datatype.to_string(),
            })
        );
    }
}

#[tokio::test]
async fn literal_update_revalidates_the_label() {
    let graph = service();
    let id = graph
        .literals()
        .create(CreateLiteralCommand::typed("1", "xsd:integer"))
        .await
        .unwrap();

    let result = graph
        .literals()
        .update(UpdateLiteralCommand {
            id: id.clone(),
            label: Some("one".to_string()),
            datatype: None,
            modifiable: None,
        })
        .await;
    assert_eq!(
        result,
        Err(GraphError::InvalidLiteralLabel {
            label: "one".to_string(),
            datatype: "xsd:integer".to_string(),
        })
    );
    let stored = graph.literals().find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(stored.label, "1");
}

#[tokio::test]
async fn cached_reads_follow_writes() {
    let graph = service();
    assert!(graph.cache().is_some());
    let things = graph.repositories().things.clone();
    let id = ThingId::new("R1").unwrap();

    assert!(!graph.resources().exists(&id).await.unwrap());
    assert!(things.find_by_thing_id(&id).await.unwrap().is_none());

    let created = graph
        .resources()
        .create(CreateResourceCommand::new("before"))
        .await
        .unwrap();
    assert_eq!(created, id);
    assert!(graph.resources().exists(&id).await.unwrap());
    assert_eq!(
        graph.resources().find_by_id(&id).await.unwrap().unwrap().label,
        "before"
    );

    graph
        .resources()
        .update(UpdateResourceCommand {
            label: Some("after".to_string()),
            ..UpdateResourceCommand::new(id.clone())
        })
        .await
        .unwrap();
    assert_eq!(
        graph.resources().find_by_id(&id).await.unwrap().unwrap().label,
        "after"
    );
    let thing = things.find_by_thing_id(&id).await.unwrap().unwrap();
    assert_eq!(thing.kind(), ThingKind::Resource);
    assert_eq!(thing.label(), "after");

    graph.resources().delete(&id).await.unwrap();
    assert!(!graph.resources().exists(&id).await.unwrap());
    assert!(things.find_by_thing_id(&id).await.unwrap().is_none());
}

#[tokio::test]
async fn list_predicate_is_visible_after_the_first_list() {
    let graph = service();
    let predicates = graph.repositories().predicates.clone();
    let things = graph.repositories().things.clone();
    let has_list_element = ThingId::new("hasListElement").unwrap();

    assert!(!predicates.exists(&has_list_element).await.unwrap());
    assert!(things.find_by_thing_id(&has_list_element).await.unwrap().is_none());

    let element = create(&graph, Kind::Resource, "element").await.unwrap();
    graph
        .lists()
        .create(CreateListCommand::new("list", vec![element]))
        .await
        .unwrap();

    assert!(predicates.exists(&has_list_element).await.unwrap());
    assert!(graph
        .predicates()
        .find_by_id(&has_list_element)
        .await
        .unwrap()
        .is_some());
    let thing = things.find_by_thing_id(&has_list_element).await.unwrap().unwrap();
    assert_eq!(thing.kind(), ThingKind::Predicate);
}

#[tokio::test]
async fn uncached_service_behaves_the_same() {
    let mut settings = GraphSettings::default();
    settings.cache.enabled = false;
    let graph = service_with(&settings);
    assert!(graph.cache().is_none());

    let id = graph
        .resources()
        .create(CreateResourceCommand::new("plain"))
        .await
        .unwrap();
    graph
        .resources()
        .update(UpdateResourceCommand {
            label: Some("renamed".to_string()),
            ..UpdateResourceCommand::new(id.clone())
        })
        .await
        .unwrap();
    assert_eq!(
        graph.resources().find_by_id(&id).await.unwrap().unwrap().label,
        "renamed"
    );
}

#[tokio::test]
async fn predicates_are_ranked_by_usage() {
    let graph = service();
    let mut predicates = Vec::new();
    for label in ["first", "second", "third", "fourth"] {
        predicates.push(create(&graph, Kind::Predicate, label).await.unwrap());
    }
    let subject = create(&graph, Kind::Resource, "subject").await.unwrap();
    let mut objects = Vec::new();
    for n in 0..5 {
        objects.push(create(&graph, Kind::Resource, &format!("object {n}")).await.unwrap());
    }

    for (predicate, uses) in predicates.iter().zip([5, 5, 2, 1]) {
        for object in objects.iter().take(uses) {
            graph
                .statements()
                .create(CreateStatementCommand::new(
                    subject.clone(),
                    predicate.clone(),
                    object.clone(),
                ))
                .await
                .unwrap();
        }
    }

    let ranking = graph
        .predicates()
        .find_usage_ranking(&Pageable::new(0, 2))
        .await
        .unwrap();
    let ranking: Vec<_> = ranking
        .content
        .iter()
        .map(|usage| (usage.id.as_str(), usage.count))
        .collect();
    assert_eq!(ranking, vec![("P1", 5), ("P2", 5)]);

    let last = graph
        .predicates()
        .find_usage_ranking(&Pageable::new(1, 2))
        .await
        .unwrap();
    assert_eq!(last.total_elements, 4);
    assert_eq!(
        last.content.iter().map(|usage| usage.count).collect::<Vec<_>>(),
        vec![2, 1]
    );

    assert_eq!(
        graph.predicates().delete(&predicates[3]).await,
        Err(GraphError::PredicateUsedInStatement {
            id: predicates[3].clone()
        })
    );
}

#[tokio::test]
async fn labels_are_searched_exactly_or_fuzzily() {
    let graph = service();
    for label in ["Knowledge Graph", "knowledge  graphs", "Graph", "ab"] {
        create(&graph, Kind::Resource, label).await.unwrap();
    }

    let labels = |page: orkg_graph::graph::Page<orkg_graph::graph::Resource>| {
        page.content
            .into_iter()
            .map(|resource| resource.label)
            .collect::<Vec<_>>()
    };

    let exact = graph
        .resources()
        .find_all_by_label(&SearchString::of("Graph", true), &Pageable::default())
        .await
        .unwrap();
    assert_eq!(labels(exact), vec!["Graph"]);

    let fuzzy = graph
        .resources()
        .find_all_by_label(&SearchString::of("knowledge graph", false), &Pageable::default())
        .await
        .unwrap();
    assert_eq!(labels(fuzzy), vec!["Knowledge Graph", "knowledge  graphs"]);

    let short = graph
        .resources()
        .find_all_by_label(&SearchString::of("a", false), &Pageable::default())
        .await
        .unwrap();
    assert!(short.content.is_empty());
}

#[tokio::test]
async fn service_errors_resolve_to_problem_details() {
    let graph = service();
    let missing = ThingId::new("R404").unwrap();
    let error = graph.resources().delete(&missing).await.unwrap_err();

    let problem = ProblemMapper::default().resolve(&error, "/api/resources/R404");
    assert_eq!(problem.status, 404);
    assert_eq!(problem.title, "Not Found");
    assert_eq!(problem.detail, error.to_string());
    assert_eq!(problem.path, "/api/resources/R404");
}
