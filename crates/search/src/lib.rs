//! Helios Search Index Lifecycle
//!
//! This crate manages the search indices of an application on an
//! Elasticsearch or OpenSearch cluster: it discovers the index mappings and
//! templates shipped by the application, organizes them into a tree of
//! aliases, and creates, deletes and templates them on the cluster.
//!
//! # Features
//!
//! - **Naming**: Prefixed, timestamp-suffixed index names with stable aliases
//! - **Discovery**: Mappings and templates loaded from resource directories,
//!   resolved per distribution and major version (`v7`, `os-v2`, ...)
//! - **Lifecycle**: Lazy, progress-reporting create/delete/template operations
//! - **Pluggable clients**: Any [`SearchClient`] implementation
//!
//! Enable the bundled cluster client with the `elasticsearch` feature (on by
//! default).
//!
//! # Architecture
//!
//! - [`naming`] - Index, alias and schema naming rules
//! - [`distribution`] - Distribution detection and versioned mapping folders
//! - [`resources`] - Resource directories and JSON documents
//! - [`alias_tree`] - The alias/index tree
//! - [`registry`] - The registry of aliases, mappings and templates
//! - [`lifecycle`] - Bulk create, delete and template operations
//! - [`client`] - The cluster client abstraction
//! - [`config`] - Configuration
//! - [`error`] - Error types for all operations
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use helios_search::{
//!     DirectoryResources, ElasticsearchClient, SearchConfig, SearchRegistry,
//! };
//!
//! let config = SearchConfig::default().with_index_prefix("dev-");
//! let client = Arc::new(ElasticsearchClient::new(&config)?);
//! let registry = SearchRegistry::builder(config, client)
//!     .resources(DirectoryResources::new("/srv/app/search"))
//!     .mapping_provider("records", "app.mappings")
//!     .template_provider(["app.templates"])
//!     .build()?;
//!
//! for result in registry.create(&[]) {
//!     let (name, response) = result?;
//!     println!("{name}: {response}");
//! }
//! # Ok::<(), helios_search::SearchError>(())
//! ```

pub mod alias_tree;
pub mod client;
pub mod config;
pub mod distribution;
#[cfg(feature = "elasticsearch")]
pub mod elasticsearch;
pub mod error;
pub mod lifecycle;
pub mod naming;
pub mod registry;
pub mod resources;

pub use alias_tree::{AliasNode, AliasTree};
pub use client::{HealthStatus, STATUS_BAD_REQUEST, STATUS_NOT_FOUND, SearchClient};
pub use config::{SearchAuth, SearchConfig};
pub use distribution::{Distribution, SearchDistribution};
#[cfg(feature = "elasticsearch")]
pub use crate::elasticsearch::ElasticsearchClient;
pub use error::{
    ClusterError, ClusterResult, ConfigError, DiscoveryError, ResourceError, SearchError,
    SearchResult,
};
pub use lifecycle::Step;
pub use naming::IndexNaming;
pub use registry::{
    CreateIndexOptions, CreateIndexOutcome, PREFIX_PLACEHOLDER, SearchRegistry,
    SearchRegistryBuilder,
};
pub use resources::{DirectoryResources, ResourceLoader};

/// Initializes the tracing subscriber for logging.
///
/// This should be called once at application startup. `RUST_LOG` takes
/// precedence over `level` (error, warn, info, debug, trace).
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("helios_search={level}")));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
