//! Search configuration.

use serde::{Deserialize, Serialize};

/// Authentication configuration for the search cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchAuth {
    /// Basic username/password authentication.
    Basic {
        /// The username for basic auth.
        username: String,
        /// The password for basic auth.
        password: String,
    },
    /// Bearer token authentication.
    Bearer {
        /// The bearer token.
        token: String,
    },
}

/// Configuration shared by the registry and the cluster client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Cluster node URLs (e.g., `["http://localhost:9200"]`).
    /// Currently uses the first node (single-node connection pool).
    #[serde(default = "default_hosts")]
    pub hosts: Vec<String>,

    /// Prefix applied to every index, alias and template name (default: empty).
    #[serde(default)]
    pub index_prefix: String,

    /// Aliases whose mappings are created.
    ///
    /// `None` selects every registered alias; an empty list selects none.
    #[serde(default)]
    pub mappings: Option<Vec<String>>,

    /// Request timeout in milliseconds (default: 30000).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Optional authentication.
    #[serde(default)]
    pub auth: Option<SearchAuth>,

    /// Whether to disable certificate validation (default: false).
    /// Only use for development/testing.
    #[serde(default)]
    pub disable_certificate_validation: bool,
}

fn default_hosts() -> Vec<String> {
    vec!["http://localhost:9200".to_string()]
}

fn default_request_timeout_ms() -> u64 {
    30000
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            hosts: default_hosts(),
            index_prefix: String::new(),
            mappings: None,
            request_timeout_ms: default_request_timeout_ms(),
            auth: None,
            disable_certificate_validation: false,
        }
    }
}

impl SearchConfig {
    /// Sets the index prefix.
    pub fn with_index_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.index_prefix = prefix.into();
        self
    }

    /// Restricts the aliases whose mappings are created.
    pub fn with_mappings<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mappings = Some(aliases.into_iter().map(Into::into).collect());
        self
    }
}
