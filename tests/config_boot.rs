use std::{
    fs,
    time::{SystemTime, UNIX_EPOCH},
};

use orkg_graph::{
    config::Config,
    graph::{service::CreateResourceCommand, service::CreateStatementCommand, GraphError},
    logger::{self, LogLevel},
    Error,
};

fn unique_path(name: &str) -> std::path::PathBuf {
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock")
        .as_nanos();
    std::env::temp_dir().join(format!("orkg-graph-{name}-{seed}.yaml"))
}

#[tokio::test]
async fn graph_boots_from_config_file() {
    let path = unique_path("boot");
    fs::write(
        &path,
        "logger:\n  level: warn\ngraph:\n  cache:\n    enabled: false\n  identifiers:\n    resource_prefix: Res\n    statement_prefix: St\n",
    )
    .expect("config file");

    let config = Config::from_file(&path).expect("config");
    fs::remove_file(&path).ok();
    assert_eq!(config.logger.level, LogLevel::Warn);
    logger::init(&config.logger).expect("logger");

    let graph = orkg_graph::graph::GraphService::from_config(&config.graph);
    assert!(graph.cache().is_none());

    let paper = graph
        .resources()
        .create(CreateResourceCommand::new("paper"))
        .await
        .expect("resource");
    assert_eq!(paper.as_str(), "Res1");

    let missing = orkg_graph::graph::ThingId::new("P404").expect("id");
    let err = graph
        .statements()
        .create(CreateStatementCommand::new(
            paper.clone(),
            missing.clone(),
            paper,
        ))
        .await
        .map_err(Error::from)
        .expect_err("unknown predicate");
    assert_eq!(
        err.as_graph(),
        Some(&GraphError::StatementPredicateNotFound { id: missing })
    );
}

#[test]
fn missing_config_file_is_reported() {
    let path = unique_path("missing");
    let err = Config::from_file(&path).expect_err("no such file");
    assert!(matches!(err, Error::ConfigIo { path: reported, .. } if reported == path));
}

#[test]
fn malformed_config_is_rejected() {
    let path = unique_path("malformed");
    fs::write(&path, "graph:\n  cache: [1, 2]\n").expect("config file");
    let result = Config::from_file(&path);
    fs::remove_file(&path).ok();
    assert!(matches!(result, Err(Error::YAML(_))));
}
