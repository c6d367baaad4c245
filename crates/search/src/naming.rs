//! Index and alias naming.
//!
//! Index names are built by joining logical name parts with `-`, then
//! applying an optional prefix and suffix. The alias name of an index is the
//! same name without the suffix, so an index can be rotated (written to a
//! freshly suffixed index, then alias-swapped) while applications keep
//! querying the alias.
//!
//! # Example
//!
//! ```
//! use helios_search::naming::IndexNaming;
//!
//! let naming = IndexNaming::new("foo-");
//! assert_eq!(
//!     naming.build_index_name(&["test", "recs", "rec"], None, "-old"),
//!     "foo-test-recs-rec-old"
//! );
//! assert_eq!(naming.build_alias_name(&["records"], Some("")), "records");
//! ```

use std::path::Path;

/// Delimiter placed between index name parts.
pub const INDEX_DELIMITER: &str = "-";

/// Extension of mapping, template and schema documents.
pub const JSON_EXTENSION: &str = "json";

/// Joins name parts with [`INDEX_DELIMITER`], skipping empty parts.
pub fn build_index_from_parts<S: AsRef<str>>(parts: &[S]) -> String {
    parts
        .iter()
        .map(AsRef::as_ref)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(INDEX_DELIMITER)
}

/// Returns a sortable timestamp used as the default index suffix.
///
/// The format is `-%Y-%m-%d-%H-%M-%S-%6f` in local time, e.g.
/// `-2024-03-01-12-30-05-123456`.
pub fn timestamp_suffix() -> String {
    chrono::Local::now()
        .format("-%Y-%m-%d-%H-%M-%S-%6f")
        .to_string()
}

/// Naming rules bound to the configured index prefix.
///
/// Every operation accepting a `prefix: Option<&str>` falls back to the
/// configured prefix when given `None`. `Some("")` disables prefixing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexNaming {
    prefix: String,
}

impl IndexNaming {
    /// Creates naming rules with the given default prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Returns the configured default prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Resolves an explicit prefix against the configured one.
    pub fn resolve_prefix<'a>(&'a self, prefix: Option<&'a str>) -> &'a str {
        prefix.unwrap_or(&self.prefix)
    }

    /// Builds a concrete index name: `prefix + parts.join("-") + suffix`.
    pub fn build_index_name<S: AsRef<str>>(
        &self,
        parts: &[S],
        prefix: Option<&str>,
        suffix: &str,
    ) -> String {
        format!(
            "{}{}{}",
            self.resolve_prefix(prefix),
            build_index_from_parts(parts),
            suffix
        )
    }

    /// Builds the alias name for an index, i.e. the index name without suffix.
    pub fn build_alias_name<S: AsRef<str>>(&self, parts: &[S], prefix: Option<&str>) -> String {
        self.build_index_name(parts, prefix, "")
    }

    /// Maps a JSON schema path to `(index name, document type)`.
    ///
    /// The schema path may start with `/`. Only `.json` schemas resolve.
    /// When `index_names` is given, the longest tail of the path parts that
    /// is a member of the list is used; an empty list rejects every schema.
    pub fn schema_to_index(
        &self,
        schema: &str,
        index_names: Option<&[String]>,
        prefix: Option<&str>,
    ) -> Option<(String, String)> {
        let schema = schema.strip_prefix('/').unwrap_or(schema);
        let mut parts: Vec<&str> = schema.split('/').collect();

        let file_name: &str = parts.last().copied()?;
        let last = Path::new(file_name);
        if last.extension().and_then(|ext| ext.to_str()) != Some(JSON_EXTENSION) {
            return None;
        }
        let doc_type = last.file_stem()?.to_str()?;
        if let Some(part) = parts.last_mut() {
            *part = doc_type;
        }

        let index = match index_names {
            None => build_index_from_parts(&parts),
            Some(names) => (0..parts.len())
                .map(|start| build_index_from_parts(&parts[start..]))
                .find(|candidate| names.iter().any(|name| name == candidate))?,
        };

        Some((
            format!("{}{}", self.resolve_prefix(prefix), index),
            doc_type.to_string(),
        ))
    }
}
