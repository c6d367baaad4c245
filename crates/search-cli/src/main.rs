//! Helios Search (helios-search)
//!
//! Creates, deletes and templates the search indices of an application.

mod config;

use std::sync::Arc;

use clap::Parser;
use helios_search::{
    AliasNode, AliasTree, CreateIndexOptions, DirectoryResources, ElasticsearchClient,
    STATUS_BAD_REQUEST, STATUS_NOT_FOUND, SearchRegistry, SearchResult, Step, init_logging,
};
use tracing::info;

use crate::config::{CliConfig, Command};

fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    let registry = build_registry(&config)?;

    match &config.command {
        Command::Init { force } => {
            let ignore = ignore_statuses(*force);
            report("Created", registry.create(&ignore))?;
            report("Put template", registry.put_templates(&ignore))?;
        }
        Command::Destroy { yes_i_know, force } => {
            if !yes_i_know {
                anyhow::bail!("Refusing to delete indices without --yes-i-know");
            }
            report("Deleted", registry.delete(&ignore_statuses(*force)))?;
        }
        Command::Create {
            index,
            body,
            no_write_alias,
            dry_run,
        } => {
            let outcome = registry.create_index(
                index,
                CreateIndexOptions {
                    mapping_path: body.clone(),
                    create_write_alias: !no_write_alias,
                    dry_run: *dry_run,
                    ..Default::default()
                },
            )?;
            info!(index = %outcome.index.0, response = ?outcome.index.1, "Created index");
            if let Some((alias, response)) = outcome.alias {
                info!(alias = %alias, response = ?response, "Created write alias");
            }
        }
        Command::List => print_tree(&registry.active_aliases(), 0),
        Command::Check => {
            let version = registry
                .cluster_version()?
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(".");
            println!("distribution: {}", registry.cluster_distribution()?);
            println!("version: {}", version);
            println!("mappings: {}", registry.distribution().subfolder());
        }
    }

    Ok(())
}

/// Builds the cluster client and the registry from the command line.
fn build_registry(config: &CliConfig) -> anyhow::Result<SearchRegistry> {
    let search_config = config.search_config();
    let client = ElasticsearchClient::new(&search_config)?;

    info!(
        hosts = ?search_config.hosts,
        prefix = %search_config.index_prefix,
        resources = %config.resource_root.display(),
        "Connecting to search cluster"
    );

    let mut builder = SearchRegistry::builder(search_config, Arc::new(client))
        .resources(DirectoryResources::new(&config.resource_root))
        .template_provider(config.template_providers.iter().cloned());

    for (alias, module) in config
        .mapping_pairs()
        .map_err(|e| anyhow::anyhow!(e))?
    {
        builder = builder.mapping_provider(alias, module);
    }

    if let Some(distribution) = config
        .distribution_override()
        .map_err(|e| anyhow::anyhow!(e))?
    {
        builder = builder.distribution(distribution);
    }

    Ok(builder.build()?)
}

fn ignore_statuses(force: bool) -> Vec<u16> {
    if force {
        vec![STATUS_BAD_REQUEST, STATUS_NOT_FOUND]
    } else {
        Vec::new()
    }
}

/// Logs every step of a bulk operation, stopping at the first error.
fn report(
    action: &str,
    steps: impl Iterator<Item = SearchResult<Step>>,
) -> anyhow::Result<()> {
    for step in steps {
        let (name, response) = step?;
        info!(name = %name, response = %response, "{}", action);
    }
    Ok(())
}

fn print_tree(tree: &AliasTree, depth: usize) {
    for (name, node) in tree {
        let indent = "  ".repeat(depth);
        match node {
            AliasNode::Alias(sub) => {
                println!("{indent}{name}/");
                print_tree(sub, depth + 1);
            }
            AliasNode::Index(path) => println!("{indent}{name} ({})", path.display()),
        }
    }
}
