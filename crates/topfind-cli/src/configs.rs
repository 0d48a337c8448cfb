//! `config` command: save, show, list and delete named search configurations.

use anyhow::Context;
use clap::Subcommand;
use topfind_core::{validate_export_fields, AppConfig, ConfigStore, ResourceKind, SearchConfig};
use topfind_pipeline::FilterEngine;

use crate::search::SearchInputs;

/// Sub-commands available under `config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Save (or overwrite) a named configuration
    Save {
        #[arg(long)]
        kind: ResourceKind,
        #[arg(long)]
        name: String,
        #[command(flatten)]
        inputs: SearchInputs,
    },
    /// Print a saved configuration as JSON
    Show {
        #[arg(long)]
        kind: ResourceKind,
        #[arg(long)]
        name: String,
    },
    /// List saved configuration names
    List {
        /// Limit to one kind (default: all)
        #[arg(long)]
        kind: Option<ResourceKind>,
    },
    /// Delete a saved configuration
    Delete {
        #[arg(long)]
        kind: ResourceKind,
        #[arg(long)]
        name: String,
    },
}

pub fn run(config: &AppConfig, command: ConfigCommands) -> anyhow::Result<()> {
    let store = ConfigStore::new(&config.configs_dir);
    match command {
        ConfigCommands::Save { kind, name, inputs } => {
            let saved = saved_config(kind, &inputs, config)?;
            store.save(kind, &name, &saved)?;
            println!("saved {kind} configuration '{name}' to {}", store.path_for(kind).display());
        }
        ConfigCommands::Show { kind, name } => {
            let saved = store
                .load(kind, &name)?
                .with_context(|| format!("no saved {kind} configuration named '{name}'"))?;
            println!("{}", serde_json::to_string_pretty(&saved)?);
        }
        ConfigCommands::List { kind } => {
            let kinds = kind.map_or_else(|| ResourceKind::ALL.to_vec(), |k| vec![k]);
            for kind in kinds {
                let names = store.list(kind)?;
                if names.is_empty() {
                    println!("{kind}: (none)");
                } else {
                    println!("{kind}: {}", names.join(", "));
                }
            }
        }
        ConfigCommands::Delete { kind, name } => {
            if store.delete(kind, &name)? {
                println!("deleted {kind} configuration '{name}'");
            } else {
                anyhow::bail!("no saved {kind} configuration named '{name}'");
            }
        }
    }
    Ok(())
}

/// Builds and validates the configuration to persist. Filters and export
/// fields are checked now so a saved configuration always runs.
pub fn saved_config(
    kind: ResourceKind,
    inputs: &SearchInputs,
    config: &AppConfig,
) -> anyhow::Result<SearchConfig> {
    if inputs.queries.is_empty() {
        anyhow::bail!("a saved configuration needs at least one --query");
    }
    let filter_values = inputs.load_filters()?.remove(&kind).unwrap_or_default();
    FilterEngine::for_kind(kind).validate(&filter_values)?;
    validate_export_fields(kind, &inputs.fields)?;

    Ok(SearchConfig {
        queries: inputs.queries.clone(),
        lang: inputs
            .lang
            .clone()
            .unwrap_or_else(|| config.default_lang.clone()),
        country: inputs
            .country
            .clone()
            .unwrap_or_else(|| config.default_country.clone()),
        queries_synonyms: inputs.synonym_lists(),
        filter_values,
        metadata: inputs.fields.clone(),
        taxonomy: inputs.load_taxonomy()?.unwrap_or_default(),
    })
}
