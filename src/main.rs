//! # Course Advisor CLI (`advisor`)
//!
//! Describe the course you want in plain words and get back the catalog
//! entries whose content matches best.
//!
//! ## Usage
//!
//! ```bash
//! advisor --config ./config/advisor.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `advisor serve` | Start the HTTP API |
//! | `advisor search "<query>"` | One-shot semantic search |
//! | `advisor interactive` | Prompt for queries until `quit` |
//! | `advisor list` | Print courses in catalog order |
//! | `advisor check` | Validate the catalog file |
//!
//! ## Examples
//!
//! ```bash
//! advisor check --catalog CourseData.csv
//! advisor search "beginner AI class with python" --top-k 10
//! advisor serve --bind 0.0.0.0:5000
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use course_advisor::{config, search, server};

/// Course Advisor: semantic search over a university course catalog.
///
/// All commands accept `--config` pointing to a TOML file. When the file
/// does not exist, built-in defaults are used.
#[derive(Parser)]
#[command(
    name = "advisor",
    about = "Course Advisor — semantic search over a university course catalog",
    version,
    long_about = "Course Advisor embeds every course in a catalog with a sentence-embedding \
    model and ranks them against a free-text description of the course you want, via a CLI \
    and a JSON HTTP API."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/advisor.toml")]
    config: PathBuf,

    /// Override `[catalog].path` from the config file.
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Enable debug logging (overridden by `RUST_LOG`).
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API.
    ///
    /// The listener comes up immediately; `/api/health` reports `loading`
    /// until the catalog is embedded.
    Serve {
        /// Address to bind (overrides `[server].bind`).
        #[arg(long)]
        bind: Option<String>,
    },

    /// Rank courses against a description.
    Search {
        /// What kind of course you are looking for.
        query: String,

        /// Number of results (defaults to `[retrieval].default_top_k`).
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Prompt for descriptions until `q`, `quit`, or `exit`.
    Interactive {
        /// Number of results per query.
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Print courses in catalog order.
    List {
        /// Maximum number of courses to print.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Load the catalog and report its size and missing columns.
    Check,
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("course_advisor=debug,course_advisor_core=debug")
        } else {
            EnvFilter::new("course_advisor=info,course_advisor_core=info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut cfg = config::load_or_default(&cli.config)?;
    if let Some(catalog) = cli.catalog {
        cfg.catalog.path = catalog;
    }

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                cfg.server.bind = bind;
            }
            server::run_server(&cfg).await?;
        }
        Commands::Search { query, top_k } => {
            search::run_search(&cfg, &query, top_k).await?;
        }
        Commands::Interactive { top_k } => {
            search::run_interactive(&cfg, top_k).await?;
        }
        Commands::List { limit } => {
            search::run_list(&cfg, limit)?;
        }
        Commands::Check => {
            search::run_check(&cfg)?;
        }
    }

    Ok(())
}
