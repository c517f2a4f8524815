use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use orkg_graph::{
    config::GraphSettings,
    graph::{
        service::{CreateClassCommand, CreateResourceCommand},
        ContributorId, FixedClock, GraphError, GraphService, Pageable, ThingId, Uri,
    },
};

fn service() -> GraphService {
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
    ));
    GraphService::with_clock(&GraphSettings::default(), clock)
}

fn ids(values: &[&str]) -> BTreeSet<ThingId> {
    values
        .iter()
        .map(|value| ThingId::new(*value).expect("valid id"))
        .collect()
}

fn id(value: &str) -> ThingId {
    ThingId::new(value).expect("valid id")
}

/// Six classes arranged as `C1 { C2, C3 { C5, C6 } }` next to a lone `C4`.
async fn tree() -> GraphService {
    let graph = service();
    for label in ["one", "two", "three", "four", "five", "six"] {
        graph
            .classes()
            .create(CreateClassCommand::new(label))
            .await
            .expect("class");
    }
    let hierarchy = graph.hierarchy();
    hierarchy
        .create(ContributorId::UNKNOWN, &id("C1"), &ids(&["C2", "C3"]), false)
        .await
        .expect("first level");
    hierarchy
        .create(ContributorId::UNKNOWN, &id("C3"), &ids(&["C5", "C6"]), true)
        .await
        .expect("second level");
    graph
}

#[tokio::test]
async fn roots_and_children() {
    let graph = tree().await;
    let hierarchy = graph.hierarchy();

    let roots = hierarchy.find_all_roots(&Pageable::default()).await.unwrap();
    let roots: Vec<_> = roots.content.iter().map(|class| class.id.as_str()).collect();
    assert_eq!(roots, vec!["C1", "C4"]);

    let children = hierarchy
        .find_children(&id("C1"), &Pageable::default())
        .await
        .unwrap();
    let children: Vec<_> = children
        .content
        .iter()
        .map(|child| (child.class.id.as_str(), child.child_count))
        .collect();
    assert_eq!(children, vec![("C2", 0), ("C3", 2)]);

    assert_eq!(
        hierarchy.find_parent(&id("C5")).await.unwrap().map(|class| class.id),
        Some(id("C3"))
    );
    assert_eq!(hierarchy.find_parent(&id("C1")).await.unwrap(), None);
}

#[tokio::test]
async fn roots_and_ancestor_chains() {
    let graph = tree().await;
    let hierarchy = graph.hierarchy();

    assert_eq!(
        hierarchy.find_root(&id("C6")).await.unwrap().map(|class| class.id),
        Some(id("C1"))
    );
    assert_eq!(
        hierarchy.find_root(&id("C4")).await.unwrap().map(|class| class.id),
        Some(id("C4"))
    );

    let chain = hierarchy
        .find_class_hierarchy(&id("C6"), &Pageable::default())
        .await
        .unwrap();
    let chain: Vec<_> = chain
        .content
        .iter()
        .map(|entry| (entry.class.id.as_str(), entry.parent_id.clone()))
        .collect();
    assert_eq!(
        chain,
        vec![
            ("C1", None),
            ("C3", Some(id("C1"))),
            ("C6", Some(id("C3"))),
        ]
    );
}

#[tokio::test]
async fn instances_are_counted_over_subclasses() {
    let graph = tree().await;
    for (label, class) in [("a", "C5"), ("b", "C3"), ("c", "C2"), ("d", "C6")] {
        graph
            .resources()
            .create(CreateResourceCommand {
                classes: ids(&[class]),
                ..CreateResourceCommand::new(label)
            })
            .await
            .unwrap();
    }

    let hierarchy = graph.hierarchy();
    assert_eq!(hierarchy.count_class_instances(&id("C3")).await.unwrap(), 3);
    assert_eq!(hierarchy.count_class_instances(&id("C1")).await.unwrap(), 4);
    assert_eq!(hierarchy.count_class_instances(&id("C4")).await.unwrap(), 0);
}

#[tokio::test]
async fn invalid_relations_are_rejected() {
    let graph = tree().await;
    let hierarchy = graph.hierarchy();

    assert_eq!(
        hierarchy
            .create(ContributorId::UNKNOWN, &id("C6"), &ids(&["C1"]), false)
            .await,
        Err(GraphError::InvalidSubclassRelation {
            child: id("C1"),
            parent: id("C6"),
        })
    );
    assert_eq!(
        hierarchy
            .create(ContributorId::UNKNOWN, &id("C4"), &ids(&["C4"]), false)
            .await,
        Err(GraphError::InvalidSubclassRelation {
            child: id("C4"),
            parent: id("C4"),
        })
    );
    assert_eq!(
        hierarchy
            .create(ContributorId::UNKNOWN, &id("C4"), &ids(&["C2"]), false)
            .await,
        Err(GraphError::ParentClassAlreadyExists {
            child: id("C2"),
            parent: id("C1"),
        })
    );
    assert_eq!(
        hierarchy
            .create(ContributorId::UNKNOWN, &id("C3"), &ids(&["C4"]), true)
            .await,
        Err(GraphError::ParentClassAlreadyHasChildren { id: id("C3") })
    );
    assert_eq!(
        hierarchy
            .create(ContributorId::UNKNOWN, &id("C9"), &ids(&["C4"]), false)
            .await,
        Err(GraphError::ClassNotFound { id: id("C9") })
    );
    assert_eq!(
        hierarchy.find_children(&id("C9"), &Pageable::default()).await,
        Err(GraphError::ClassNotFound { id: id("C9") })
    );

    // C4 stays a root after the failed attempts.
    assert_eq!(hierarchy.find_parent(&id("C4")).await.unwrap(), None);
}

#[tokio::test]
async fn classes_in_use_cannot_be_deleted() {
    let graph = tree().await;

    assert_eq!(
        graph.classes().delete(&id("C3")).await,
        Err(GraphError::ClassInUse { id: id("C3") })
    );

    graph.classes().delete(&id("C6")).await.unwrap();
    let children = graph
        .hierarchy()
        .find_children(&id("C3"), &Pageable::default())
        .await
        .unwrap();
    assert_eq!(children.total_elements, 1);
    assert_eq!(children.content[0].class.id, id("C5"));
}

#[tokio::test]
async fn detached_class_becomes_a_root() {
    let graph = tree().await;
    graph.hierarchy().delete(&id("C3")).await.unwrap();

    let roots = graph
        .hierarchy()
        .find_all_roots(&Pageable::default())
        .await
        .unwrap();
    let roots: Vec<_> = roots.content.iter().map(|class| class.id.as_str()).collect();
    assert_eq!(roots, vec!["C1", "C3", "C4"]);
}

#[tokio::test]
async fn uris_are_set_once() {
    let graph = service();
    let classes = graph.classes();
    let first_uri = Uri::new("https://example.org/Paper").unwrap();
    let second_uri = Uri::new("https://example.org/Article").unwrap();

    let with_uri = classes
        .create(CreateClassCommand {
            uri: Some(first_uri.clone()),
            ..CreateClassCommand::new("paper")
        })
        .await
        .unwrap();
    let without_uri = classes.create(CreateClassCommand::new("article")).await.unwrap();

    classes.update_uri(&with_uri, first_uri.clone()).await.unwrap();
    assert_eq!(
        classes.update_uri(&with_uri, second_uri.clone()).await,
        Err(GraphError::UpdateNotAllowed {
            id: with_uri.clone()
        })
    );
    assert_eq!(
        classes.update_uri(&without_uri, first_uri.clone()).await,
        Err(GraphError::UriAlreadyInUse {
            uri: first_uri.clone(),
            id: with_uri.clone(),
        })
    );

    classes.update_uri(&without_uri, second_uri.clone()).await.unwrap();
    let stored = classes.find_by_uri(&second_uri).await.unwrap().unwrap();
    assert_eq!(stored.id, without_uri);

    assert_eq!(
        classes
            .create(CreateClassCommand {
                uri: Some(first_uri.clone()),
                ..CreateClassCommand::new("duplicate")
            })
            .await,
        Err(GraphError::UriAlreadyInUse {
            uri: first_uri,
            id: with_uri,
        })
    );
}

#[tokio::test]
async fn reserved_classes_cannot_be_created() {
    let graph = service();
    assert_eq!(
        graph
            .classes()
            .create(CreateClassCommand {
                id: Some(id("List")),
                ..CreateClassCommand::new("list")
            })
            .await,
        Err(GraphError::ClassNotAllowed { id: id("List") })
    );
}
