//! Lifecycle tests against the recording mock cluster.

mod common;

use common::*;
use helios_search::{
    ConfigError, CreateIndexOptions, SearchConfig, SearchError, STATUS_BAD_REQUEST,
    STATUS_NOT_FOUND,
};
use serde_json::json;

fn config() -> SearchConfig {
    SearchConfig::default().with_index_prefix("test-")
}

#[test]
fn test_create_yields_indices_then_aliases() {
    let dir = resource_tree();
    let client = MockSearchClient::new();
    let registry = full_registry(dir.path(), config(), &client);
    let suffix = registry.current_suffix().to_string();

    let names: Vec<String> = registry
        .create(&[])
        .map(|result| result.unwrap().0)
        .collect();

    assert_eq!(
        names,
        vec![
            format!("test-authors-author-v1.0.0{suffix}"),
            "test-authors".to_string(),
            format!("test-records-record-v1.0.0{suffix}"),
            format!("test-records-sub-sub-v1.0.0{suffix}"),
            "test-records-sub".to_string(),
            "test-records".to_string(),
        ]
    );
}

#[test]
fn test_create_binds_write_alias_and_subtree_aliases() {
    let dir = resource_tree();
    let client = MockSearchClient::new();
    let registry = full_registry(dir.path(), config(), &client);
    let suffix = registry.current_suffix().to_string();

    for result in registry.create(&[]) {
        result.unwrap();
    }

    let record = format!("test-records-record-v1.0.0{suffix}");
    let sub = format!("test-records-sub-sub-v1.0.0{suffix}");
    assert_eq!(
        client.aliases_of(&record),
        vec!["test-records", "test-records-record-v1.0.0"]
    );
    assert_eq!(
        client.aliases_of(&sub),
        vec!["test-records", "test-records-sub", "test-records-sub-sub-v1.0.0"]
    );

    let alias_call = client
        .calls()
        .into_iter()
        .find(|call| matches!(call, Call::PutAlias { name, .. } if name == "test-records"))
        .unwrap();
    assert_eq!(
        alias_call,
        Call::PutAlias {
            indices: vec![record, sub],
            name: "test-records".to_string(),
            ignore: vec![],
        }
    );
}

#[test]
fn test_create_injects_write_alias_into_body() {
    let dir = resource_tree();
    let client = MockSearchClient::new();
    let registry = full_registry(dir.path(), config(), &client);

    let mut create = registry.create(&[]);
    create.next().unwrap().unwrap();
    drop(create);

    match &client.calls()[0] {
        Call::CreateIndex { body, .. } => {
            assert_eq!(body["aliases"], json!({"test-authors-author-v1.0.0": {}}));
            assert_eq!(body["mappings"]["properties"]["title"]["type"], "text");
        }
        other => panic!("unexpected call: {other:?}"),
    }
}

#[test]
fn test_create_is_lazy() {
    let dir = resource_tree();
    let client = MockSearchClient::new();
    let registry = full_registry(dir.path(), config(), &client);

    let create = registry.create(&[]);
    assert!(client.calls().is_empty());

    let first: Vec<_> = create.take(1).collect();
    assert_eq!(first.len(), 1);
    assert_eq!(client.calls().len(), 1);
}

#[test]
fn test_create_respects_allow_list() {
    let dir = resource_tree();
    let client = MockSearchClient::new();
    let registry = full_registry(dir.path(), config().with_mappings(["authors"]), &client);

    let names: Vec<String> = registry
        .create(&[])
        .map(|result| result.unwrap().0)
        .collect();

    assert_eq!(names.len(), 2);
    assert!(names.iter().all(|name| name.starts_with("test-authors")));
    assert_eq!(client.index_names().len(), 1);
}

#[test]
fn test_create_with_empty_allow_list_does_nothing() {
    let dir = resource_tree();
    let client = MockSearchClient::new();
    let config = config().with_mappings(Vec::<String>::new());
    let registry = full_registry(dir.path(), config, &client);

    assert_eq!(registry.create(&[]).count(), 0);
    assert!(client.calls().is_empty());
}

#[test]
fn test_create_twice_fails_unless_ignored() {
    let dir = resource_tree();
    let client = MockSearchClient::new();
    let registry = full_registry(dir.path(), config(), &client);
    assert!(registry.create(&[]).all(|result| result.is_ok()));

    // Same registry, same suffix: every index already exists.
    let mut create = registry.create(&[]);
    match create.next() {
        Some(Err(SearchError::Cluster(err))) => assert!(err.to_string().contains("400")),
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(create.next().is_none());

    let responses: Vec<_> = registry
        .create(&[STATUS_BAD_REQUEST])
        .map(|result| result.unwrap())
        .collect();
    assert_eq!(responses.len(), 6);
    assert_eq!(
        responses[0].1["error"]["type"],
        "resource_already_exists_exception"
    );
}

#[test]
fn test_create_stops_on_first_error() {
    let dir = resource_tree();
    let client = MockSearchClient::new();
    let registry = full_registry(dir.path(), config(), &client);
    client.fail_on("test-authors");

    let results: Vec<_> = registry.create(&[]).collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(results[1].is_err());
    assert_eq!(client.index_names().len(), 1);
}

#[test]
fn test_delete_yields_concrete_indices() {
    let dir = resource_tree();
    let client = MockSearchClient::new();
    let registry = full_registry(dir.path(), config(), &client);
    let suffix = registry.current_suffix().to_string();
    assert!(registry.create(&[]).all(|result| result.is_ok()));

    let deleted: Vec<String> = registry
        .delete(&[])
        .map(|result| result.unwrap().0)
        .collect();

    assert_eq!(
        deleted,
        vec![
            format!("test-authors-author-v1.0.0{suffix}"),
            format!("test-records-record-v1.0.0{suffix}"),
            format!("test-records-sub-sub-v1.0.0{suffix}"),
        ]
    );
    assert!(client.index_names().is_empty());
}

#[test]
fn test_delete_missing_indices_is_noop() {
    let dir = resource_tree();
    let client = MockSearchClient::new();
    let registry = full_registry(dir.path(), config(), &client);

    assert_eq!(registry.delete(&[]).count(), 0);

    let calls = client.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls.iter().all(|call| matches!(
        call,
        Call::GetAlias { ignore, .. } if ignore == &[STATUS_NOT_FOUND]
    )));
}

#[test]
fn test_delete_skips_alias_with_multiple_indices() {
    let dir = resource_tree();
    let client = MockSearchClient::new()
        .with_index("test-authors-author-v1.0.0-a", &["test-authors-author-v1.0.0"])
        .with_index("test-authors-author-v1.0.0-b", &["test-authors-author-v1.0.0"]);
    let registry = full_registry(dir.path(), config().with_mappings(["authors"]), &client);

    let (deleted, logs) = with_captured_logs(|| registry.delete(&[]).count());
    assert_eq!(deleted, 0);
    assert!(logs.contains("WARN"));
    assert!(logs.contains("Multiple indices found during deletion of authors-author-v1.0.0"));
    assert!(logs.contains("test-authors-author-v1.0.0-a"));
    assert!(logs.contains("test-authors-author-v1.0.0-b"));
    assert!(
        !client
            .calls()
            .iter()
            .any(|call| matches!(call, Call::DeleteIndex { .. }))
    );
    assert_eq!(client.index_names().len(), 2);
}

#[test]
fn test_delete_removes_unaliased_index_of_the_same_name() {
    let dir = resource_tree();
    let client = MockSearchClient::new().with_index("test-authors-author-v1.0.0", &[]);
    let registry = full_registry(dir.path(), config().with_mappings(["authors"]), &client);

    let deleted: Vec<_> = registry
        .delete(&[])
        .map(|result| result.unwrap().0)
        .collect();

    assert_eq!(deleted, vec!["test-authors-author-v1.0.0"]);
    assert!(client.index_names().is_empty());
}

#[test]
fn test_delete_passes_ignore_to_delete_call() {
    let dir = resource_tree();
    let client = MockSearchClient::new()
        .with_index("test-authors-author-v1.0.0-old", &["test-authors-author-v1.0.0"]);
    let registry = full_registry(dir.path(), config().with_mappings(["authors"]), &client);

    let deleted: Vec<_> = registry
        .delete(&[STATUS_BAD_REQUEST, STATUS_NOT_FOUND])
        .map(|result| result.unwrap().0)
        .collect();

    assert_eq!(deleted, vec!["test-authors-author-v1.0.0-old"]);
    assert!(client.calls().contains(&Call::DeleteIndex {
        index: "test-authors-author-v1.0.0-old".to_string(),
        ignore: vec![STATUS_BAD_REQUEST, STATUS_NOT_FOUND],
    }));
}

#[test]
fn test_put_templates_substitutes_prefix() {
    let dir = resource_tree();
    let client = MockSearchClient::new();
    let registry = full_registry(dir.path(), config(), &client);

    let results: Vec<_> = registry
        .put_templates(&[])
        .map(|result| result.unwrap())
        .collect();

    assert_eq!(results.len(), 1);
    let expected_path = dir.path().join("app/templates/v7/records.json");
    assert_eq!(results[0].0, expected_path.display().to_string());
    assert_eq!(
        client.template("test-v7-records").unwrap()["index_patterns"],
        json!(["test-records-*"])
    );
}

#[test]
fn test_put_templates_without_prefix() {
    let dir = resource_tree();
    let client = MockSearchClient::new();
    let registry = full_registry(dir.path(), SearchConfig::default(), &client);

    assert!(registry.put_templates(&[]).all(|result| result.is_ok()));
    assert_eq!(
        client.template("v7-records").unwrap()["index_patterns"],
        json!(["records-*"])
    );
}

#[test]
fn test_put_templates_checks_placeholder_before_any_call() {
    let dir = resource_tree();
    write_resource(
        dir.path(),
        "app/templates/v7/static.json",
        r#"{"index_patterns": ["static-*"]}"#,
    );
    let client = MockSearchClient::new();
    let registry = full_registry(dir.path(), config(), &client);

    let mut templates = registry.put_templates(&[]);
    match templates.next() {
        Some(Err(SearchError::Config(ConfigError::MissingPrefixPlaceholder {
            prefix,
            template,
            ..
        }))) => {
            assert_eq!(prefix, "test-");
            assert!(template.ends_with("static.json"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(templates.next().is_none());
    assert!(client.calls().is_empty());
}

#[test]
fn test_create_index_with_write_alias() {
    let dir = resource_tree();
    let client = MockSearchClient::new();
    let registry = full_registry(dir.path(), config(), &client);

    let outcome = registry
        .create_index(
            "records-record-v1.0.0",
            CreateIndexOptions {
                suffix: Some("-new".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(outcome.index.0, "test-records-record-v1.0.0-new");
    assert_eq!(outcome.alias.unwrap().0, "test-records-record-v1.0.0");
    assert_eq!(
        client.aliases_of("test-records-record-v1.0.0-new"),
        vec!["test-records-record-v1.0.0"]
    );
}

#[test]
fn test_create_index_without_write_alias() {
    let dir = resource_tree();
    let client = MockSearchClient::new();
    let registry = full_registry(dir.path(), config(), &client);

    let outcome = registry
        .create_index(
            "records-record-v1.0.0",
            CreateIndexOptions {
                create_write_alias: false,
                ..Default::default()
            },
        )
        .unwrap();

    assert!(outcome.alias.is_none());
    assert_eq!(client.calls().len(), 1);
}

#[test]
fn test_flush_and_refresh() {
    let dir = resource_tree();
    let client = MockSearchClient::new();
    let registry = full_registry(dir.path(), config(), &client);

    registry.flush_and_refresh("records").unwrap();

    assert_eq!(
        client.calls(),
        vec![
            Call::Flush {
                index: "test-records".to_string()
            },
            Call::Refresh {
                index: "test-records".to_string()
            },
            Call::ClusterHealth {
                status: helios_search::HealthStatus::Yellow
            },
        ]
    );
}

#[test]
fn test_build_detects_distribution() {
    let dir = resource_tree();
    let client = MockSearchClient::new();
    let registry = helios_search::SearchRegistry::builder(config(), std::sync::Arc::new(client.clone()))
        .resources(helios_search::DirectoryResources::new(dir.path()))
        .mapping_provider("records", "app.mappings")
        .build()
        .unwrap();

    assert_eq!(client.calls(), vec![Call::Info]);
    assert_eq!(
        registry.distribution(),
        helios_search::Distribution::elasticsearch(7)
    );
    assert_eq!(registry.cluster_version().unwrap(), vec![7, 17, 5]);
    assert_eq!(registry.cluster_distribution().unwrap(), "elasticsearch");
}
