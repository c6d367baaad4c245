//! Search engine distribution detection and mapping folder resolution.
//!
//! Modules ship one mapping folder per distribution and major version:
//! `v{N}` for Elasticsearch and `os-v{N}` for OpenSearch. OpenSearch
//! deployments fall back to the Elasticsearch v7 folder when a module has
//! no OpenSearch-specific mappings yet.

use std::fmt;
use std::io;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ConfigError, DiscoveryError, SearchResult};
use crate::resources::ResourceLoader;

/// Mapping folder used when an OpenSearch folder is missing.
pub const FALLBACK_SUBFOLDER: &str = "v7";

/// Search engine product family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchDistribution {
    /// Elasticsearch.
    #[default]
    Elasticsearch,
    /// OpenSearch.
    OpenSearch,
}

impl SearchDistribution {
    /// Returns the name reported by the cluster for this distribution.
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchDistribution::Elasticsearch => "elasticsearch",
            SearchDistribution::OpenSearch => "opensearch",
        }
    }
}

impl fmt::Display for SearchDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchDistribution {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "elasticsearch" => Ok(SearchDistribution::Elasticsearch),
            "opensearch" => Ok(SearchDistribution::OpenSearch),
            _ => Err(ConfigError::UnknownDistribution {
                name: s.to_string(),
            }),
        }
    }
}

/// Distribution family plus major version of the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Distribution {
    /// Product family.
    pub family: SearchDistribution,
    /// Major version, e.g. `7` for 7.10.2.
    pub major_version: u32,
}

impl Distribution {
    /// Creates a distribution descriptor.
    pub fn new(family: SearchDistribution, major_version: u32) -> Self {
        Self {
            family,
            major_version,
        }
    }

    /// Elasticsearch of the given major version.
    pub fn elasticsearch(major_version: u32) -> Self {
        Self::new(SearchDistribution::Elasticsearch, major_version)
    }

    /// OpenSearch of the given major version.
    pub fn opensearch(major_version: u32) -> Self {
        Self::new(SearchDistribution::OpenSearch, major_version)
    }

    /// Builds the descriptor from a cluster `info` response.
    ///
    /// Elasticsearch does not report `version.distribution`, so a missing
    /// field means Elasticsearch.
    pub fn from_cluster_info(info: &Value) -> SearchResult<Self> {
        let version = cluster_version(info)?;
        let family = cluster_distribution(info).parse::<SearchDistribution>()?;
        let major_version = version.first().copied().unwrap_or_default();
        Ok(Self::new(family, major_version))
    }

    /// Returns the mapping subfolder for this distribution.
    pub fn subfolder(&self) -> String {
        match self.family {
            SearchDistribution::Elasticsearch => format!("v{}", self.major_version),
            SearchDistribution::OpenSearch => format!("os-v{}", self.major_version),
        }
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{}", self.family, self.major_version)
    }
}

/// Parses `version.number` of a cluster `info` response.
pub fn cluster_version(info: &Value) -> SearchResult<Vec<u32>> {
    let number = info
        .pointer("/version/number")
        .and_then(Value::as_str)
        .unwrap_or_default();
    parse_version(number).map_err(Into::into)
}

/// Returns `version.distribution` of a cluster `info` response.
pub fn cluster_distribution(info: &Value) -> &str {
    info.pointer("/version/distribution")
        .and_then(Value::as_str)
        .unwrap_or(SearchDistribution::Elasticsearch.as_str())
}

/// Parses a dotted version string such as `7.10.2`.
pub fn parse_version(version: &str) -> Result<Vec<u32>, ConfigError> {
    version
        .split('.')
        .map(|part| part.parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| ConfigError::InvalidVersion {
            version: version.to_string(),
        })
}

/// Resolves the module holding mappings or templates for a distribution.
///
/// Returns `module.v{N}` for Elasticsearch and `module.os-v{N}` for
/// OpenSearch. When the OpenSearch folder is missing the Elasticsearch v7
/// folder is used instead and a warning is logged. Only a missing folder
/// triggers the fallback; other I/O errors are returned.
pub fn resolve_mappings_module(
    module: &str,
    distribution: &Distribution,
    resources: &dyn ResourceLoader,
) -> SearchResult<String> {
    let mut subfolder = distribution.subfolder();

    if distribution.family == SearchDistribution::OpenSearch {
        match resources.list_dir(module, Path::new(&subfolder)) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let version = distribution.major_version;
                tracing::warn!(
                    "OpenSearch v{version} mappings files not found, falling back to Elasticsearch v7 \
                     mappings for module {module}. Please add the missing OpenSearch os-v{version} mappings."
                );
                subfolder = FALLBACK_SUBFOLDER.to_string();
            }
            Err(source) => {
                return Err(DiscoveryError::ResourceListing {
                    module: module.to_string(),
                    path: subfolder.into(),
                    source,
                }
                .into());
            }
        }
    }

    Ok(format!("{}.{}", module, subfolder))
}
