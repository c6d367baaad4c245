//! Command line configuration.
//!
//! Every global option can also be set through a `SEARCH_*` environment
//! variable.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use helios_search::{Distribution, SearchAuth, SearchConfig, SearchDistribution};

/// Command line configuration for the search index tool.
#[derive(Parser, Debug, Clone)]
#[command(name = "helios-search")]
#[command(about = "Manage search indices, aliases and templates")]
pub struct CliConfig {
    /// Cluster node URLs (comma-separated). Only the first is used.
    #[arg(
        long,
        env = "SEARCH_HOSTS",
        default_value = "http://localhost:9200",
        global = true
    )]
    pub hosts: String,

    /// Prefix applied to every index, alias and template name.
    #[arg(long, env = "SEARCH_INDEX_PREFIX", default_value = "", global = true)]
    pub index_prefix: String,

    /// Aliases to create (comma-separated). All registered aliases when unset.
    #[arg(long, env = "SEARCH_MAPPINGS", value_delimiter = ',', global = true)]
    pub mappings: Option<Vec<String>>,

    /// Username for basic authentication.
    #[arg(long, env = "SEARCH_USERNAME", global = true)]
    pub username: Option<String>,

    /// Password for basic authentication.
    #[arg(long, env = "SEARCH_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,

    /// Request timeout in milliseconds.
    #[arg(
        long,
        env = "SEARCH_REQUEST_TIMEOUT_MS",
        default_value = "30000",
        global = true
    )]
    pub request_timeout_ms: u64,

    /// Disable TLS certificate validation (development only).
    #[arg(long, env = "SEARCH_INSECURE", default_value = "false", global = true)]
    pub insecure: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "SEARCH_LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    /// Directory holding the mapping and template packages.
    #[arg(long, env = "SEARCH_RESOURCE_ROOT", default_value = ".", global = true)]
    pub resource_root: PathBuf,

    /// Mapping provider as `alias=module`, e.g. `records=app.mappings`.
    #[arg(long = "mapping", value_name = "ALIAS=MODULE", global = true)]
    pub mapping_providers: Vec<String>,

    /// Template package, e.g. `app.templates`.
    #[arg(long = "templates", value_name = "MODULE", global = true)]
    pub template_providers: Vec<String>,

    /// Distribution and major version, e.g. `elasticsearch:7` or
    /// `opensearch:2`. Detected from the cluster when unset.
    #[arg(long, env = "SEARCH_DISTRIBUTION", global = true)]
    pub distribution: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Administrative commands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create all active indices and aliases, then put all templates.
    Init {
        /// Tolerate indices, aliases and templates that already exist.
        #[arg(long)]
        force: bool,
    },
    /// Delete the indices behind all active aliases.
    Destroy {
        /// Confirm the deletion.
        #[arg(long)]
        yes_i_know: bool,
        /// Tolerate indices that are already gone.
        #[arg(long)]
        force: bool,
    },
    /// Create a single registered index.
    Create {
        /// Registered index name, e.g. `records-record-v1.0.0`.
        index: String,
        /// Mapping file to use instead of the registered one.
        #[arg(long)]
        body: Option<PathBuf>,
        /// Do not bind the write alias.
        #[arg(long)]
        no_write_alias: bool,
        /// Print the names without calling the cluster.
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the active alias tree.
    List,
    /// Print the cluster version and distribution.
    Check,
}

impl CliConfig {
    /// Returns the configured cluster nodes.
    pub fn host_list(&self) -> Vec<String> {
        self.hosts
            .split(',')
            .map(str::trim)
            .filter(|host| !host.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Returns the `(alias, module)` pairs of `--mapping`.
    pub fn mapping_pairs(&self) -> Result<Vec<(String, String)>, String> {
        self.mapping_providers
            .iter()
            .map(|provider| match provider.split_once('=') {
                Some((alias, module)) if !alias.is_empty() && !module.is_empty() => {
                    Ok((alias.trim().to_string(), module.trim().to_string()))
                }
                _ => Err(format!(
                    "Invalid mapping provider '{}', expected ALIAS=MODULE",
                    provider
                )),
            })
            .collect()
    }

    /// Parses `--distribution`.
    pub fn distribution_override(&self) -> Result<Option<Distribution>, String> {
        let Some(value) = self.distribution.as_deref() else {
            return Ok(None);
        };
        let (family, major) = value
            .split_once(':')
            .ok_or_else(|| format!("Invalid distribution '{}', expected NAME:MAJOR", value))?;
        let family: SearchDistribution = family.parse().map_err(|e| format!("{}", e))?;
        let major: u32 = major
            .parse()
            .map_err(|_| format!("Invalid major version '{}'", major))?;
        Ok(Some(Distribution::new(family, major)))
    }

    /// Builds the library configuration.
    pub fn search_config(&self) -> SearchConfig {
        let auth = match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some(SearchAuth::Basic {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        };

        SearchConfig {
            hosts: self.host_list(),
            index_prefix: self.index_prefix.clone(),
            mappings: self.mappings.clone(),
            request_timeout_ms: self.request_timeout_ms,
            auth,
            disable_certificate_validation: self.insecure,
        }
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.host_list().is_empty() {
            errors.push("At least one host is required".to_string());
        }

        if self.request_timeout_ms == 0 {
            errors.push("Request timeout cannot be 0".to_string());
        }

        if self.username.is_some() != self.password.is_some() {
            errors.push("Username and password must be given together".to_string());
        }

        if let Err(e) = self.mapping_pairs() {
            errors.push(e);
        }

        if let Err(e) = self.distribution_override() {
            errors.push(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
