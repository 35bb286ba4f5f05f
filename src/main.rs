//! cfgtree CLI
//!
//! Builds a configuration from files and environment variables and prints
//! lookups, traversals and effective entity configs as JSON.

use std::path::PathBuf;
use std::process;

use cfgtree::{
    with_inherit_merge, with_no_inherit, with_no_inherit_from, Builder, CancelToken, Config,
    EnvCollector, Error, FileCollector, InheritOption, MergeStrategy, GLOBAL_LEVEL,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

#[derive(Parser)]
#[command(name = "cfgtree")]
#[command(about = "Inspect layered configuration trees", version)]
struct Cli {
    /// Configuration file (TOML or JSON). Later files override earlier ones.
    #[arg(long = "file", short = 'f')]
    files: Vec<PathBuf>,

    /// Read environment variables with this prefix (highest priority)
    #[arg(long)]
    env_prefix: Option<String>,

    /// Inheritance levels below global, e.g. "groups,replicasets,instances"
    #[arg(long, value_delimiter = ',')]
    levels: Vec<String>,

    /// Key prefix whose arrays are concatenated across levels
    #[arg(long)]
    append: Vec<String>,

    /// Key prefix whose maps are merged recursively across levels
    #[arg(long)]
    deep: Vec<String>,

    /// Key that descendants never inherit
    #[arg(long)]
    no_inherit: Vec<String>,

    /// Key dropped from one level only, as LEVEL:KEY
    #[arg(long)]
    no_inherit_from: Vec<String>,

    /// TOML rule file to validate the merged tree against
    #[arg(long)]
    rules: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the value at a path
    Get {
        path: String,

        /// Include provenance alongside the value
        #[arg(long)]
        meta: bool,
    },

    /// List leaves under a path
    Walk {
        #[arg(default_value = "")]
        path: String,

        /// Maximum depth (0 = unbounded)
        #[arg(long, default_value_t = 0)]
        depth: usize,
    },

    /// Print the effective config of one entity
    Effective { path: String },

    /// Print the effective config of every leaf entity
    EffectiveAll,

    /// Print the whole merged tree
    Dump,
}

#[derive(Serialize)]
struct WalkItem {
    key: String,
    source: String,
    value: Value,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = build_config(&cli)?;

    let output = match cli.command {
        Commands::Get { path, meta } => {
            let entry = config.get(path.as_str()).map_err(Error::from)?;
            if meta {
                to_json(&entry)?
            } else {
                entry.value
            }
        }
        Commands::Walk { path, depth } => {
            let cancel = CancelToken::new();
            let items: Vec<WalkItem> = config
                .walk(&cancel, path.as_str(), depth)
                .map_err(Error::from)?
                .map(|entry| WalkItem {
                    key: entry.meta.key.to_string(),
                    source: entry.meta.source.name,
                    value: entry.value,
                })
                .collect();
            to_json(&items)?
        }
        Commands::Effective { path } => config
            .effective(path.as_str())
            .map_err(Error::from)?
            .to_value(),
        Commands::EffectiveAll => {
            let all = config.effective_all().map_err(Error::from)?;
            Value::Object(
                all.into_iter()
                    .map(|(path, cfg)| (path, cfg.to_value()))
                    .collect(),
            )
        }
        Commands::Dump => config.to_value(),
    };

    let rendered = serde_json::to_string_pretty(&output).map_err(CliError::Json)?;
    println!("{}", rendered);
    Ok(())
}

fn build_config(cli: &Cli) -> Result<Config, CliError> {
    let mut builder = Builder::new();

    for path in &cli.files {
        debug!(file = %path.display(), "adding file collector");
        builder = builder.add_collector(FileCollector::new(path).map_err(Error::from)?);
    }
    if let Some(prefix) = &cli.env_prefix {
        builder = builder.add_collector(EnvCollector::new(prefix.clone()));
    }
    if let Some(rules) = &cli.rules {
        builder = builder.with_schema_file(rules).map_err(Error::from)?;
    }
    if !cli.levels.is_empty() {
        let (levels, options) = inheritance_args(cli)?;
        builder = builder.with_inheritance(levels, options);
    }

    builder.build().map_err(|e| CliError::Cfg(e.into()))
}

/// Levels (with global prepended) and options for the hierarchy
fn inheritance_args(cli: &Cli) -> Result<(Vec<String>, Vec<InheritOption>), CliError> {
    let mut levels = vec![GLOBAL_LEVEL.to_string()];
    levels.extend(
        cli.levels
            .iter()
            .filter(|level| level.as_str() != GLOBAL_LEVEL)
            .cloned(),
    );

    let mut options = Vec::new();
    for prefix in &cli.append {
        options.push(with_inherit_merge(prefix.as_str(), MergeStrategy::Append));
    }
    for prefix in &cli.deep {
        options.push(with_inherit_merge(prefix.as_str(), MergeStrategy::Deep));
    }
    if !cli.no_inherit.is_empty() {
        options.push(with_no_inherit(cli.no_inherit.iter().map(String::as_str)));
    }
    for arg in &cli.no_inherit_from {
        let (level, key) = arg
            .split_once(':')
            .ok_or_else(|| CliError::Usage(format!("expected LEVEL:KEY, got '{}'", arg)))?;
        if !levels.iter().any(|l| l == level) {
            return Err(CliError::Usage(format!("unknown level '{}'", level)));
        }
        options.push(with_no_inherit_from(level, key));
    }

    Ok((levels, options))
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, CliError> {
    serde_json::to_value(value).map_err(CliError::Json)
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Cfg(#[from] Error),

    #[error("{0}")]
    Usage(String),

    #[error("JSON error: {0}")]
    Json(serde_json::Error),
}
