//! Error types for search index lifecycle management.
//!
//! Errors are grouped by where they originate: configuration problems,
//! discovery of mapping/template resources, reading those resources, and
//! conditions reported by the search cluster.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// The primary error type for all registry operations.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Mapping and template discovery errors
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// Mapping and template file errors
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Errors reported by the cluster client
    #[error(transparent)]
    Cluster(#[from] ClusterError),
}

/// Errors caused by invalid or inconsistent configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The cluster runs a distribution this crate does not know about.
    #[error("unknown search distribution: {name}")]
    UnknownDistribution { name: String },

    /// A prefix is configured but a template is not prefix-aware.
    #[error(
        "you are using the prefix `{prefix}`, but the template `{template}` does not contain the pattern `{placeholder}`"
    )]
    MissingPrefixPlaceholder {
        prefix: String,
        template: PathBuf,
        placeholder: &'static str,
    },

    /// The cluster reported a version string that could not be parsed.
    #[error("invalid cluster version: {version}")]
    InvalidVersion { version: String },
}

/// Errors raised while registering mappings and templates.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// Two mapping files resolve to the same index name under one alias.
    #[error("duplicate index `{index}` registered under alias `{alias}`")]
    DuplicateIndex { alias: String, index: String },

    /// A resource directory could not be listed.
    #[error("failed to list resources of module `{module}` at `{}`", path.display())]
    ResourceListing {
        module: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// No mapping file is registered for the requested index.
    #[error("no mapping registered for index `{index}`")]
    UnknownIndex { index: String },
}

/// Errors reading or parsing mapping and template files.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// The file could not be read.
    #[error("failed to read `{}`", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file is not valid JSON.
    #[error("invalid JSON in `{}`", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors returned by a [`SearchClient`](crate::client::SearchClient).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClusterError {
    /// The cluster answered with a status the caller did not ask to ignore.
    #[error("cluster returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The request never produced a response.
    #[error("transport error: {message}")]
    Transport { message: String },

    /// The response body could not be decoded.
    #[error("failed to decode cluster response: {message}")]
    Decode { message: String },
}

/// Result type for registry operations.
pub type SearchResult<T> = Result<T, SearchError>;

/// Result type for cluster client calls.
pub type ClusterResult<T> = Result<T, ClusterError>;
