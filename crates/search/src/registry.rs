//! Registry of search aliases, index mappings and templates.
//!
//! The registry is built once at startup from an explicit list of mapping
//! and template providers and is read-only afterwards. Bulk lifecycle
//! operations ([`SearchRegistry::create`], [`SearchRegistry::put_templates`],
//! [`SearchRegistry::delete`]) walk the alias tree lazily, see
//! [`crate::lifecycle`].
//!
//! # Example
//!
//! ```ignore
//! use helios_search::{Distribution, DirectoryResources, SearchConfig, SearchRegistry};
//!
//! let registry = SearchRegistry::builder(SearchConfig::default(), client)
//!     .resources(DirectoryResources::new("/srv/app/search"))
//!     .distribution(Distribution::elasticsearch(7))
//!     .mapping_provider("records", "invenio_records.mappings")
//!     .template_provider(["invenio_records.templates"])
//!     .build()?;
//!
//! for result in registry.create(&[]) {
//!     let (name, response) = result?;
//!     println!("{name}: {response}");
//! }
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info};

use crate::alias_tree::{AliasNode, AliasTree};
use crate::client::{HealthStatus, SearchClient};
use crate::config::SearchConfig;
use crate::distribution::{self, Distribution, resolve_mappings_module};
use crate::error::{DiscoveryError, SearchResult};
use crate::naming::{IndexNaming, JSON_EXTENSION, build_index_from_parts, timestamp_suffix};
use crate::resources::{DirectoryResources, ResourceLoader, load_json};

/// Placeholder replaced by the configured index prefix in template bodies.
pub const PREFIX_PLACEHOLDER: &str = "__SEARCH_INDEX_PREFIX__";

/// Timeout used when waiting for the cluster after a flush.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(30);

/// Options for [`SearchRegistry::create_index`].
#[derive(Debug, Clone)]
pub struct CreateIndexOptions {
    /// Mapping file; looked up in [`SearchRegistry::mappings`] when `None`.
    pub mapping_path: Option<PathBuf>,
    /// Prefix override; the configured prefix when `None`.
    pub prefix: Option<String>,
    /// Suffix override; the registry's current suffix when `None`.
    pub suffix: Option<String>,
    /// Whether to bind the unsuffixed alias to the new index.
    pub create_write_alias: bool,
    /// HTTP statuses to tolerate.
    pub ignore: Vec<u16>,
    /// Compute names without calling the cluster.
    pub dry_run: bool,
}

impl Default for CreateIndexOptions {
    fn default() -> Self {
        Self {
            mapping_path: None,
            prefix: None,
            suffix: None,
            create_write_alias: true,
            ignore: Vec::new(),
            dry_run: false,
        }
    }
}

/// Outcome of [`SearchRegistry::create_index`].
///
/// Responses are `None` in dry-run mode.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateIndexOutcome {
    /// Concrete index name and the create response.
    pub index: (String, Option<Value>),
    /// Write alias name and the put-alias response, if requested.
    pub alias: Option<(String, Option<Value>)>,
}

/// Builder for [`SearchRegistry`].
///
/// Providers replace plugin discovery: the host application names every
/// alias/module pair and template module explicitly.
#[derive(Debug)]
pub struct SearchRegistryBuilder {
    config: SearchConfig,
    client: Arc<dyn SearchClient>,
    resources: Arc<dyn ResourceLoader>,
    distribution: Option<Distribution>,
    mapping_providers: Vec<(String, String)>,
    template_providers: Vec<String>,
    mappings: BTreeMap<String, PathBuf>,
}

impl SearchRegistryBuilder {
    /// Sets the resource loader (default: the current directory).
    pub fn resources(mut self, resources: impl ResourceLoader + 'static) -> Self {
        self.resources = Arc::new(resources);
        self
    }

    /// Sets a shared resource loader.
    pub fn shared_resources(mut self, resources: Arc<dyn ResourceLoader>) -> Self {
        self.resources = resources;
        self
    }

    /// Fixes the distribution instead of asking the cluster.
    pub fn distribution(mut self, distribution: Distribution) -> Self {
        self.distribution = Some(distribution);
        self
    }

    /// Registers the mappings of `module` under `alias`.
    pub fn mapping_provider(mut self, alias: impl Into<String>, module: impl Into<String>) -> Self {
        self.mapping_providers.push((alias.into(), module.into()));
        self
    }

    /// Registers template directories (dotted module names).
    pub fn template_provider<I, S>(mut self, directories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.template_providers
            .extend(directories.into_iter().map(Into::into));
        self
    }

    /// Seeds the flat index-to-mapping map.
    pub fn with_mappings(mut self, mappings: BTreeMap<String, PathBuf>) -> Self {
        self.mappings = mappings;
        self
    }

    /// Resolves the distribution and registers every provider.
    pub fn build(self) -> SearchResult<SearchRegistry> {
        let distribution = match self.distribution {
            Some(distribution) => distribution,
            None => {
                let info = self.client.info()?;
                let distribution = Distribution::from_cluster_info(&info)?;
                info!(distribution = %distribution, "Detected search distribution");
                distribution
            }
        };

        let mut registry = SearchRegistry {
            naming: IndexNaming::new(self.config.index_prefix.clone()),
            config: self.config,
            client: self.client,
            resources: self.resources,
            distribution,
            aliases: AliasTree::new(),
            mappings: self.mappings,
            templates: BTreeMap::new(),
            current_suffix: OnceLock::new(),
        };

        for (alias, module) in &self.mapping_providers {
            registry.register_mappings(alias, module)?;
        }

        for directory in &self.template_providers {
            let templates = registry.register_templates(directory)?;
            registry.templates.extend(templates);
        }

        info!(
            aliases = registry.aliases.len(),
            indices = registry.mappings.len(),
            templates = registry.templates.len(),
            "Search registry initialized"
        );

        Ok(registry)
    }
}

/// Aliases, mappings and templates of an application, bound to a cluster.
#[derive(Debug)]
pub struct SearchRegistry {
    config: SearchConfig,
    naming: IndexNaming,
    client: Arc<dyn SearchClient>,
    resources: Arc<dyn ResourceLoader>,
    distribution: Distribution,
    aliases: AliasTree,
    mappings: BTreeMap<String, PathBuf>,
    templates: BTreeMap<String, PathBuf>,
    current_suffix: OnceLock<String>,
}

impl SearchRegistry {
    /// Starts building a registry.
    pub fn builder(config: SearchConfig, client: Arc<dyn SearchClient>) -> SearchRegistryBuilder {
        SearchRegistryBuilder {
            config,
            client,
            resources: Arc::new(DirectoryResources::new(".")),
            distribution: None,
            mapping_providers: Vec::new(),
            template_providers: Vec::new(),
            mappings: BTreeMap::new(),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Returns the naming rules bound to the configured prefix.
    pub fn naming(&self) -> &IndexNaming {
        &self.naming
    }

    /// Returns the cluster client.
    pub fn client(&self) -> &dyn SearchClient {
        self.client.as_ref()
    }

    /// Returns the distribution used to resolve mapping folders.
    pub fn distribution(&self) -> Distribution {
        self.distribution
    }

    /// Returns every registered alias.
    pub fn aliases(&self) -> &AliasTree {
        &self.aliases
    }

    /// Returns the flat index-to-mapping map (empty unless registered or seeded).
    pub fn mappings(&self) -> &BTreeMap<String, PathBuf> {
        &self.mappings
    }

    /// Returns the template-name-to-file map.
    pub fn templates(&self) -> &BTreeMap<String, PathBuf> {
        &self.templates
    }

    /// Returns the suffix for indices created by this registry.
    ///
    /// Computed once on first use and stable afterwards.
    pub fn current_suffix(&self) -> &str {
        self.current_suffix.get_or_init(timestamp_suffix)
    }

    /// Returns the aliases selected by the `mappings` allow-list.
    pub fn active_aliases(&self) -> AliasTree {
        self.aliases.filtered(self.config.mappings.as_deref())
    }

    /// Returns true if the top-level alias `name` is selected.
    pub(crate) fn is_active(&self, name: &str) -> bool {
        match &self.config.mappings {
            None => true,
            Some(allow) => allow.iter().any(|a| a == name),
        }
    }

    /// Concrete name of a registered index: prefix + name + current suffix.
    pub(crate) fn resolved_index_name(&self, index: &str) -> String {
        self.naming
            .build_index_name(&[index], None, self.current_suffix())
    }

    /// Alias name of a registered index or alias: prefix + name.
    pub(crate) fn resolved_alias_name(&self, name: &str) -> String {
        self.naming.build_alias_name(&[name], None)
    }

    /// Registers the mappings shipped by `module` under `alias`.
    ///
    /// Walks `{module}.{subfolder}/{alias}` recursively. Directories become
    /// nested aliases, `.json` files become indices named after their path.
    /// Registering the same index name twice within an alias fails and
    /// leaves the registry unchanged.
    pub fn register_mappings(&mut self, alias: &str, module: &str) -> SearchResult<()> {
        let module = resolve_mappings_module(module, &self.distribution, self.resources.as_ref())?;
        debug!(alias = %alias, module = %module, "Registering mappings");

        let mut tree = match self.aliases.get(alias) {
            None => AliasTree::new(),
            Some(AliasNode::Alias(existing)) => existing.clone(),
            Some(AliasNode::Index(_)) => {
                return Err(DiscoveryError::DuplicateIndex {
                    alias: alias.to_string(),
                    index: alias.to_string(),
                }
                .into());
            }
        };
        let mut seen: HashSet<String> = tree.indices().into_iter().map(str::to_string).collect();
        let mut mappings = BTreeMap::new();

        walk_mappings(
            self.resources.as_ref(),
            &module,
            &mut tree,
            vec![alias.to_string()],
            &mut seen,
            &mut mappings,
        )?;

        self.aliases.insert(alias, AliasNode::Alias(tree));
        self.mappings.extend(mappings);
        Ok(())
    }

    /// Collects the templates of `directory` (a dotted module name).
    ///
    /// Template names are built from the path below the resolved directory,
    /// e.g. `app.templates` resolved to `app.templates.v7` yields `v7-records`
    /// for `app/templates/v7/records.json`.
    pub fn register_templates(&self, directory: &str) -> SearchResult<BTreeMap<String, PathBuf>> {
        let directory =
            resolve_mappings_module(directory, &self.distribution, self.resources.as_ref())?;
        debug!(directory = %directory, "Registering templates");

        let mut segments = directory.split('.').map(str::to_string);
        let module = segments.next().unwrap_or_default();
        let parts: Vec<String> = segments.collect();

        let mut result = BTreeMap::new();
        walk_templates(self.resources.as_ref(), &module, parts, &mut result)?;
        Ok(result)
    }

    /// Creates a single registered index and, optionally, its write alias.
    pub fn create_index(
        &self,
        index: &str,
        options: CreateIndexOptions,
    ) -> SearchResult<CreateIndexOutcome> {
        let mapping_path = match options.mapping_path {
            Some(path) => path,
            None => self
                .mappings
                .get(index)
                .cloned()
                .ok_or_else(|| DiscoveryError::UnknownIndex {
                    index: index.to_string(),
                })?,
        };
        let body = load_json(&mapping_path)?;

        let prefix = options.prefix.as_deref();
        let suffix = options
            .suffix
            .as_deref()
            .unwrap_or_else(|| self.current_suffix());
        let final_index = self.naming.build_index_name(&[index], prefix, suffix);
        let final_alias = options
            .create_write_alias
            .then(|| self.naming.build_alias_name(&[index], prefix));

        if options.dry_run {
            info!(index = %final_index, alias = ?final_alias, "Dry run, skipping index creation");
            return Ok(CreateIndexOutcome {
                index: (final_index, None),
                alias: final_alias.map(|alias| (alias, None)),
            });
        }

        let response = self
            .client
            .create_index(&final_index, &body, &options.ignore)?;
        let alias = match final_alias {
            Some(alias) => {
                let response = self.client.put_alias(
                    std::slice::from_ref(&final_index),
                    &alias,
                    &options.ignore,
                )?;
                Some((alias, Some(response)))
            }
            None => None,
        };

        Ok(CreateIndexOutcome {
            index: (final_index, Some(response)),
            alias,
        })
    }

    /// Flushes and refreshes an index, then waits for a yellow cluster.
    ///
    /// Intended for tests; do not call this in request paths.
    pub fn flush_and_refresh(&self, index: &str) -> SearchResult<()> {
        let prefixed = self.resolved_alias_name(index);
        self.client.flush(&prefixed)?;
        self.client.refresh(&prefixed)?;
        self.client
            .cluster_health(HealthStatus::Yellow, HEALTH_TIMEOUT)?;
        Ok(())
    }

    /// Returns the version of the cluster, e.g. `[7, 17, 5]`.
    pub fn cluster_version(&self) -> SearchResult<Vec<u32>> {
        let info = self.client.info()?;
        distribution::cluster_version(&info)
    }

    /// Returns the distribution name reported by the cluster.
    pub fn cluster_distribution(&self) -> SearchResult<String> {
        let info = self.client.info()?;
        Ok(distribution::cluster_distribution(&info).to_string())
    }
}

/// Removes the subtree `name` from `tree`, or returns an empty one.
fn take_subtree(tree: &mut AliasTree, name: &str) -> SearchResult<AliasTree> {
    match tree.remove(name) {
        None => Ok(AliasTree::new()),
        Some(AliasNode::Alias(sub)) => Ok(sub),
        Some(node @ AliasNode::Index(_)) => {
            tree.insert(name, node);
            Err(DiscoveryError::DuplicateIndex {
                alias: name.to_string(),
                index: name.to_string(),
            }
            .into())
        }
    }
}

fn list_resources(
    resources: &dyn ResourceLoader,
    module: &str,
    path: &Path,
) -> SearchResult<Vec<String>> {
    resources.list_dir(module, path).map_err(|source| {
        DiscoveryError::ResourceListing {
            module: module.to_string(),
            path: path.to_path_buf(),
            source,
        }
        .into()
    })
}

/// Returns the file stem of a `.json` file name.
fn json_stem(filename: &str) -> Option<&str> {
    let path = Path::new(filename);
    if path.extension().and_then(|ext| ext.to_str()) != Some(JSON_EXTENSION) {
        return None;
    }
    path.file_stem().and_then(|stem| stem.to_str())
}

fn walk_mappings(
    resources: &dyn ResourceLoader,
    module: &str,
    tree: &mut AliasTree,
    parts: Vec<String>,
    seen: &mut HashSet<String>,
    mappings: &mut BTreeMap<String, PathBuf>,
) -> SearchResult<()> {
    let resource_name: PathBuf = parts.iter().collect();

    for filename in list_resources(resources, module, &resource_name)? {
        let file_path = resource_name.join(&filename);

        if resources.is_dir(module, &file_path) {
            let mut sub_parts = parts.clone();
            sub_parts.push(filename);
            let sub_name = build_index_from_parts(&sub_parts);
            let mut sub_tree = take_subtree(tree, &sub_name)?;
            walk_mappings(resources, module, &mut sub_tree, sub_parts, seen, mappings)?;
            tree.insert(sub_name, AliasNode::Alias(sub_tree));
            continue;
        }

        let Some(stem) = json_stem(&filename) else {
            continue;
        };

        let mut index_parts = parts.clone();
        index_parts.push(stem.to_string());
        let index_name = build_index_from_parts(&index_parts);
        if tree.contains(&index_name) || !seen.insert(index_name.clone()) {
            return Err(DiscoveryError::DuplicateIndex {
                alias: build_index_from_parts(&parts),
                index: index_name,
            }
            .into());
        }

        let path = resources.resource_path(module, &file_path);
        debug!(index = %index_name, path = %path.display(), "Registered index mapping");
        tree.insert(index_name.clone(), AliasNode::Index(path.clone()));
        mappings.insert(index_name, path);
    }

    Ok(())
}

fn walk_templates(
    resources: &dyn ResourceLoader,
    module: &str,
    parts: Vec<String>,
    result: &mut BTreeMap<String, PathBuf>,
) -> SearchResult<()> {
    let resource_name: PathBuf = parts.iter().collect();

    for filename in list_resources(resources, module, &resource_name)? {
        let file_path = resource_name.join(&filename);

        if resources.is_dir(module, &file_path) {
            let mut sub_parts = parts.clone();
            sub_parts.push(filename);
            walk_templates(resources, module, sub_parts, result)?;
            continue;
        }

        let Some(stem) = json_stem(&filename) else {
            continue;
        };

        let mut name_parts: Vec<&str> = parts.iter().skip(1).map(String::as_str).collect();
        name_parts.push(stem);
        result.insert(
            build_index_from_parts(&name_parts),
            resources.resource_path(module, &file_path),
        );
    }

    Ok(())
}
