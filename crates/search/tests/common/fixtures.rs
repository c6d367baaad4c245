use std::fs;
use std::path::Path;
use std::sync::Arc;

use helios_search::{
    DirectoryResources, Distribution, SearchConfig, SearchRegistry, SearchRegistryBuilder,
};
use tempfile::TempDir;

use super::mock::MockSearchClient;

/// Writes `body` to `rel` below `root`, creating parent directories.
pub fn write_resource(root: &Path, rel: &str, body: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

/// A resource tree with two top-level aliases:
///
/// ```text
/// app/mappings/v7/authors/author-v1.0.0.json
/// app/mappings/v7/records/record-v1.0.0.json
/// app/mappings/v7/records/sub/sub-v1.0.0.json
/// app/templates/v7/records.json
/// ```
pub fn resource_tree() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let mapping = r#"{"mappings": {"properties": {"title": {"type": "text"}}}}"#;
    write_resource(dir.path(), "app/mappings/v7/authors/author-v1.0.0.json", mapping);
    write_resource(dir.path(), "app/mappings/v7/records/record-v1.0.0.json", mapping);
    write_resource(dir.path(), "app/mappings/v7/records/sub/sub-v1.0.0.json", mapping);
    write_resource(
        dir.path(),
        "app/templates/v7/records.json",
        r#"{"index_patterns": ["__SEARCH_INDEX_PREFIX__records-*"], "settings": {}}"#,
    );
    dir
}

/// Builder wired to the mock cluster, the tree at `root` and ES 7.
pub fn registry_builder(
    root: &Path,
    config: SearchConfig,
    client: &MockSearchClient,
) -> SearchRegistryBuilder {
    SearchRegistry::builder(config, Arc::new(client.clone()))
        .resources(DirectoryResources::new(root))
        .distribution(Distribution::elasticsearch(7))
}

/// Registry with both aliases of [`resource_tree`] and its templates.
pub fn full_registry(root: &Path, config: SearchConfig, client: &MockSearchClient) -> SearchRegistry {
    registry_builder(root, config, client)
        .mapping_provider("authors", "app.mappings")
        .mapping_provider("records", "app.mappings")
        .template_provider(["app.templates"])
        .build()
        .unwrap()
}
