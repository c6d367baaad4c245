//! Bulk index, alias and template operations.
//!
//! Each operation returns an iterator that performs one cluster call per
//! step and yields `(name, response)` as soon as it is available, so callers
//! can report progress without buffering. The first error is yielded and
//! ends the iteration.

use std::collections::btree_map;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::alias_tree::{AliasNode, AliasTree};
use crate::client::STATUS_NOT_FOUND;
use crate::error::{ConfigError, SearchResult};
use crate::registry::{PREFIX_PLACEHOLDER, SearchRegistry};
use crate::resources::{load_json, parse_json, read_resource};

/// A `(name, response)` pair yielded by the bulk operations.
pub type Step = (String, Value);

/// One level of the depth-first walk.
struct Frame<'a> {
    alias: Option<&'a str>,
    tree: Option<&'a AliasTree>,
    entries: btree_map::Iter<'a, String, AliasNode>,
}

/// Depth-first walk over the active aliases.
struct Walk<'a> {
    registry: &'a SearchRegistry,
    stack: Vec<Frame<'a>>,
}

/// Event produced by [`Walk`].
enum Visit<'a> {
    /// A leaf index and its mapping file.
    Index(&'a str, &'a PathBuf),
    /// All children of an alias have been visited.
    AliasDone(&'a str, &'a AliasTree),
}

impl<'a> Walk<'a> {
    fn new(registry: &'a SearchRegistry) -> Self {
        Self {
            registry,
            stack: vec![Frame {
                alias: None,
                tree: None,
                entries: registry.aliases().iter(),
            }],
        }
    }

    fn stop(&mut self) {
        self.stack.clear();
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = Visit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top_level = self.stack.len() == 1;
            let frame = self.stack.last_mut()?;
            match frame.entries.next() {
                Some((name, _)) if top_level && !self.registry.is_active(name) => continue,
                Some((name, AliasNode::Alias(tree))) => self.stack.push(Frame {
                    alias: Some(name.as_str()),
                    tree: Some(tree),
                    entries: tree.iter(),
                }),
                Some((name, AliasNode::Index(path))) => return Some(Visit::Index(name, path)),
                None => {
                    if let Some(Frame {
                        alias: Some(alias),
                        tree: Some(tree),
                        ..
                    }) = self.stack.pop()
                    {
                        return Some(Visit::AliasDone(alias, tree));
                    }
                }
            }
        }
    }
}

/// Iterator returned by [`SearchRegistry::create`].
pub struct CreateIndices<'a> {
    walk: Walk<'a>,
    ignore: Vec<u16>,
}

impl Iterator for CreateIndices<'_> {
    type Item = SearchResult<Step>;

    fn next(&mut self) -> Option<Self::Item> {
        let registry = self.walk.registry;
        let result = match self.walk.next()? {
            Visit::Index(name, path) => create_leaf(registry, name, path, &self.ignore),
            Visit::AliasDone(alias, tree) => put_subtree_alias(registry, alias, tree, &self.ignore),
        };
        if result.is_err() {
            self.walk.stop();
        }
        Some(result)
    }
}

/// Creates a leaf index bound to its unsuffixed write alias.
///
/// The write alias goes into the `aliases` section of the create request so
/// that each index costs a single cluster call.
fn create_leaf(
    registry: &SearchRegistry,
    name: &str,
    path: &Path,
    ignore: &[u16],
) -> SearchResult<Step> {
    let mut body = load_json(path)?;
    let index = registry.resolved_index_name(name);
    let write_alias = registry.resolved_alias_name(name);

    if let Value::Object(object) = &mut body {
        let aliases = object
            .entry("aliases")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(aliases) = aliases {
            aliases
                .entry(write_alias)
                .or_insert_with(|| Value::Object(Map::new()));
        }
    }

    debug!(index = %index, mapping = %path.display(), "Creating index");
    let response = registry.client().create_index(&index, &body, ignore)?;
    Ok((index, response))
}

/// Binds every index below `alias` to the alias name.
fn put_subtree_alias(
    registry: &SearchRegistry,
    alias: &str,
    tree: &AliasTree,
    ignore: &[u16],
) -> SearchResult<Step> {
    let indices: Vec<String> = tree
        .indices()
        .into_iter()
        .map(|index| registry.resolved_index_name(index))
        .collect();
    let name = registry.resolved_alias_name(alias);

    debug!(alias = %name, indices = ?indices, "Putting alias");
    let response = registry.client().put_alias(&indices, &name, ignore)?;
    Ok((name, response))
}

/// Iterator returned by [`SearchRegistry::delete`].
pub struct DeleteIndices<'a> {
    walk: Walk<'a>,
    ignore: Vec<u16>,
}

impl Iterator for DeleteIndices<'_> {
    type Item = SearchResult<Step>;

    fn next(&mut self) -> Option<Self::Item> {
        let registry = self.walk.registry;
        loop {
            let (name, _) = match self.walk.next()? {
                Visit::Index(name, path) => (name, path),
                Visit::AliasDone(..) => continue,
            };
            match delete_leaf(registry, name, &self.ignore) {
                Ok(Some(step)) => return Some(Ok(step)),
                Ok(None) => continue,
                Err(e) => {
                    self.walk.stop();
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Deletes the single concrete index behind a leaf's alias.
///
/// Nothing happens when the alias resolves to no index. When it resolves to
/// several, the deletion is skipped with a warning.
fn delete_leaf(registry: &SearchRegistry, name: &str, ignore: &[u16]) -> SearchResult<Option<Step>> {
    let alias = registry.resolved_alias_name(name);
    let lookup = registry.client().get_alias(&alias, &[STATUS_NOT_FOUND])?;

    let indices: Vec<String> = match &lookup {
        Value::Object(found) if !found.contains_key("error") => found.keys().cloned().collect(),
        _ => Vec::new(),
    };

    match indices.as_slice() {
        [] => {
            debug!(alias = %alias, "No index found, nothing to delete");
            Ok(None)
        }
        [index] => {
            debug!(index = %index, alias = %alias, "Deleting index");
            let response = registry.client().delete_index(index, ignore)?;
            Ok(Some((index.clone(), response)))
        }
        _ => {
            warn!(
                "Multiple indices found during deletion of {name}: {indices:?}. Deletion was skipped for them."
            );
            Ok(None)
        }
    }
}

/// Iterator returned by [`SearchRegistry::put_templates`].
///
/// Every template is read and checked before the first cluster call.
pub struct PutTemplates<'a> {
    registry: &'a SearchRegistry,
    ignore: Vec<u16>,
    prepared: Option<std::vec::IntoIter<PreparedTemplate>>,
    done: bool,
}

struct PreparedTemplate {
    path: PathBuf,
    name: String,
    body: Value,
}

impl PutTemplates<'_> {
    fn prepare(&self) -> SearchResult<Vec<PreparedTemplate>> {
        let prefix = self.registry.naming().prefix();
        self.registry
            .templates()
            .iter()
            .map(|(template, path)| -> SearchResult<PreparedTemplate> {
                let text = read_resource(path)?;
                let text = replace_prefix(path, &text, prefix)?;
                Ok(PreparedTemplate {
                    path: path.clone(),
                    name: self.registry.resolved_alias_name(template),
                    body: parse_json(path, &text)?,
                })
            })
            .collect()
    }
}

impl Iterator for PutTemplates<'_> {
    type Item = SearchResult<Step>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if self.prepared.is_none() {
            match self.prepare() {
                Ok(prepared) => self.prepared = Some(prepared.into_iter()),
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }

        let template = self.prepared.as_mut()?.next()?;
        debug!(template = %template.name, path = %template.path.display(), "Putting template");
        let result: SearchResult<Step> = self
            .registry
            .client()
            .put_template(&template.name, &template.body, &self.ignore)
            .map(|response| (template.path.display().to_string(), response))
            .map_err(Into::into);
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}

/// Substitutes the index prefix into a template body.
///
/// A non-empty prefix requires the template to contain the placeholder.
pub fn replace_prefix(path: &Path, body: &str, prefix: &str) -> SearchResult<String> {
    if !prefix.is_empty() && !body.contains(PREFIX_PLACEHOLDER) {
        return Err(ConfigError::MissingPrefixPlaceholder {
            prefix: prefix.to_string(),
            template: path.to_path_buf(),
            placeholder: PREFIX_PLACEHOLDER,
        }
        .into());
    }
    Ok(body.replace(PREFIX_PLACEHOLDER, prefix))
}

impl SearchRegistry {
    /// Creates every active index and its aliases.
    ///
    /// Walks the active aliases depth first. Each index is created from its
    /// mapping file under `prefix + name + current suffix` and yielded; once
    /// all indices below an alias exist, the alias is bound to all of them
    /// and yielded too.
    pub fn create(&self, ignore: &[u16]) -> CreateIndices<'_> {
        CreateIndices {
            walk: Walk::new(self),
            ignore: ignore.to_vec(),
        }
    }

    /// Puts every registered template, with the prefix substituted in.
    pub fn put_templates(&self, ignore: &[u16]) -> PutTemplates<'_> {
        PutTemplates {
            registry: self,
            ignore: ignore.to_vec(),
            prepared: None,
            done: false,
        }
    }

    /// Deletes the concrete index behind every active index alias.
    ///
    /// Aliases that resolve to more than one index are skipped with a
    /// warning.
    pub fn delete(&self, ignore: &[u16]) -> DeleteIndices<'_> {
        DeleteIndices {
            walk: Walk::new(self),
            ignore: ignore.to_vec(),
        }
    }
}
