//! # Documenter CLI (`documenter`)
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `documenter serve` | Start the HTTP server |
//! | `documenter analyse <repo-url>` | Run one analysis from the terminal |
//! | `documenter check-config` | Print the resolved configuration (secrets redacted) |
//!
//! ## Examples
//!
//! ```bash
//! # Start the server with settings from ./documenter.toml and the environment
//! documenter serve
//!
//! # Analyse a repository without writing to MongoDB
//! documenter analyse https://github.com/acme/widgets --branch dev --dry-run
//! ```
//!
//! Logging is controlled by `DOCUMENTER_LOG` (an `EnvFilter` directive,
//! default `info`).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use documenter::config::{self, Config};
use documenter::llm::AzureOpenAiClient;
use documenter::models::{AnalysisRequest, DEFAULT_BRANCH, DEFAULT_MANIFEST};
use documenter::pipeline::Analyzer;
use documenter::server;
use documenter::store::{InMemoryStore, MongoConnector, StoreConnector};

/// Documenter: summarize a repository's key files with a chat-completion
/// model and store the results.
#[derive(Parser)]
#[command(name = "documenter", version)]
struct Cli {
    /// Path to the optional TOML configuration file.
    ///
    /// Environment variables (`AZURE_OAI_*`, `AZURE_MONGO_*`) override
    /// values from this file. A `.env` file in the working directory is
    /// loaded first.
    #[arg(long, global = true, default_value = "./documenter.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server on `[server].bind`.
    Serve,

    /// Analyse one repository and print the per-file summaries.
    Analyse {
        /// Repository URL, e.g. `https://github.com/org/repo`.
        repo_url: String,

        #[arg(long, default_value = DEFAULT_BRANCH)]
        branch: String,

        /// Manifest path inside the repository.
        #[arg(long, default_value = DEFAULT_MANIFEST)]
        manifest: String,

        /// Keep records in memory instead of writing to MongoDB.
        #[arg(long)]
        dry_run: bool,
    },

    /// Resolve configuration and print it with secrets redacted.
    CheckConfig,
}

fn init_tracing() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_env("DOCUMENTER_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))
}

/// Load `.env` from the working directory (or a parent) if one exists.
fn load_dotenv() -> anyhow::Result<()> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(error) if error.not_found() => Ok(()),
        Err(error) => Err(anyhow::Error::new(error).context("failed to load .env file")),
    }
}

fn build_analyzer(cfg: &Config, store: Arc<dyn StoreConnector>) -> anyhow::Result<Analyzer> {
    let llm = Arc::new(AzureOpenAiClient::new(&cfg.llm)?);
    Ok(Analyzer::from_config(cfg, llm, store)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    load_dotenv()?;
    init_tracing()?;

    let cfg = config::load_config(&cli.config)
        .with_context(|| format!("failed to load configuration ({})", cli.config.display()))?;

    match cli.command {
        Commands::Serve => {
            let store = Arc::new(MongoConnector::new(cfg.store.clone()));
            let analyzer = build_analyzer(&cfg, store)?;
            server::run_server(&cfg, Arc::new(analyzer)).await?;
        }
        Commands::Analyse {
            repo_url,
            branch,
            manifest,
            dry_run,
        } => {
            let store: Arc<dyn StoreConnector> = if dry_run {
                Arc::new(InMemoryStore::new())
            } else {
                Arc::new(MongoConnector::new(cfg.store.clone()))
            };
            let analyzer = build_analyzer(&cfg, store)?;
            let request = AnalysisRequest::new(repo_url, Some(branch), Some(manifest));

            let outcome = analyzer.run(&request).await?;

            println!("analyse {}", request.repo_url);
            for file in &outcome.project.main_files {
                println!();
                println!("{}", file.path);
                println!("  sha256: {}", file.hash);
                println!("  {}", file.summary.replace('\n', "\n  "));
            }
            println!();
            println!("  files analysed: {}", outcome.project.main_files.len());
            println!("  records written: {}", outcome.persisted);
            if dry_run {
                println!("  (dry run: records kept in memory)");
            }
            for failure in &outcome.persist_failures {
                eprintln!("  warning: {}", failure);
            }
            println!("{}", server::DONE_MESSAGE);
        }
        Commands::CheckConfig => {
            println!("{:#?}", cfg);
        }
    }

    Ok(())
}
