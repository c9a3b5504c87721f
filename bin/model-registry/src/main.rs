//! model-registry – command-line front end.
//!
//! Startup order:
//! 1. Parse arguments and configuration from environment variables.
//! 2. Initialise tracing on stderr (JSON when configured).
//! 3. Build the registry and run one subcommand, printing JSON on stdout.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use model_registry::{create_registry, BackendKind, ModelRegistry, RegistryConfig};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

/// Versioned store for serialized models.
#[derive(Parser, Debug)]
#[command(name = "model-registry", version, about)]
struct Cli {
    /// Backend to use: local, database or s3 (overrides MODEL_REGISTRY_BACKEND).
    #[arg(long, global = true)]
    backend: Option<BackendKind>,

    /// Artifact root directory (overrides MODEL_REGISTRY_PATH).
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every model with all of its versions.
    List,

    /// List the versions of one model.
    Versions { name: String },

    /// Print the latest version label of a model.
    Latest { name: String },

    /// Print a version's metadata and its stored object.
    Show {
        name: String,
        /// Defaults to the latest version.
        #[arg(long)]
        version: Option<String>,
    },

    /// Store a JSON document as the next version of a model.
    Save {
        name: String,
        /// JSON file holding the model object.
        #[arg(long)]
        file: PathBuf,
        #[arg(long, default_value = "")]
        description: String,
        /// `key=value`; may be repeated.
        #[arg(long = "tag", value_parser = parse_tag)]
        tags: Vec<(String, String)>,
    },

    /// Delete one version, or the whole model when no version is given.
    Delete {
        name: String,
        #[arg(long)]
        version: Option<String>,
    },

    /// Registry-wide and per-model statistics.
    Stats,

    /// Versions carrying a tag, optionally with a specific value.
    FindTag { key: String, value: Option<String> },
}

fn parse_tag(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_owned(), value.to_owned()))
        }
        _ => Err(format!("expected key=value, got '{raw}'")),
    }
}

fn init_tracing(config: &RegistryConfig) {
    // Build the log-level filter, warning loudly if the configured value is
    // not a valid tracing filter expression.
    let env_filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => match config.log_level.parse::<tracing_subscriber::EnvFilter>() {
            Ok(f) => f,
            Err(e) => {
                eprintln!(
                    "WARN: MODEL_REGISTRY_LOG='{}' is not a valid tracing filter ({}); \
                     falling back to 'info'",
                    config.log_level, e
                );
                tracing_subscriber::EnvFilter::new("info")
            }
        },
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if config.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(registry: &ModelRegistry, command: Command) -> anyhow::Result<()> {
    match command {
        Command::List => print_json(&registry.list_models().await?),
        Command::Versions { name } => print_json(&registry.get_model_versions(&name).await?),
        Command::Latest { name } => {
            print_json(&json!({ "name": name, "version": registry.get_latest_version(&name).await? }))
        }
        Command::Show { name, version } => {
            let record = registry.model_info(&name, version.as_deref()).await?;
            let object: serde_json::Value = registry
                .load_model(&name, Some(record.version.as_str()))
                .await?;
            print_json(&json!({ "record": record, "object": object }))
        }
        Command::Save {
            name,
            file,
            description,
            tags,
        } => {
            let raw = tokio::fs::read(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let object: serde_json::Value = serde_json::from_slice(&raw)
                .with_context(|| format!("{} is not valid JSON", file.display()))?;
            let version = registry.save_model(&object, &name, &description, tags).await?;
            print_json(&json!({ "name": name, "version": version }))
        }
        Command::Delete { name, version } => {
            let removed = registry.delete_model(&name, version.as_deref()).await?;
            print_json(&removed)
        }
        Command::Stats => print_json(&registry.statistics().await?),
        Command::FindTag { key, value } => {
            print_json(&registry.find_models_by_tag(&key, value.as_deref()).await?)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = RegistryConfig::from_env()?;
    if let Some(root) = cli.root {
        config = config.with_root(root);
    }
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }

    init_tracing(&config);
    debug!(?config, "configuration loaded");

    let registry = create_registry(&config).await?;
    info!(backend = %config.backend, "running command");
    run(&registry, cli.command).await
}
