//! # DocDesk CLI (`desk`)
//!
//! The `desk` binary is the operator interface for DocDesk. It manages the
//! document mirror, previews retrieval, runs one-off questions, and starts
//! the chat HTTP server.
//!
//! ## Usage
//!
//! ```bash
//! desk --config ./config/docdesk.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `desk sync` | Clone the document repository, or pull if already cloned |
//! | `desk read <path>` | Print a file from the mirror by relative path |
//! | `desk render "<query>"` | Print the retrieval context for a query |
//! | `desk ask "<query>"` | One full turn: retrieval + completion |
//! | `desk serve` | Start the chat HTTP server |
//! | `desk status` | Show mirror and collection status |

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use docdesk::completion::OpenAiModel;
use docdesk::config;
use docdesk::ingest;
use docdesk::mirror::{Mirror, SyncOutcome};
use docdesk::server;
use docdesk::turn::Assistant;

/// DocDesk — a repository-backed document assistant for chat surfaces.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/docdesk.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "desk",
    about = "DocDesk — a repository-backed document assistant",
    version,
    long_about = "DocDesk mirrors a remote git repository of documents (text and PDF), \
    ingests the top-level files into an in-memory collection, and answers chat messages \
    by substring/keyword retrieval feeding a chat-completion endpoint."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/docdesk.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Clone the document repository, or pull the latest changes.
    ///
    /// Idempotent with respect to on-disk content for an unchanged remote.
    Sync,

    /// Print a file from the mirror by relative path.
    Read {
        /// Mirror-relative path (e.g. `data/sample.txt`).
        path: String,
    },

    /// Print the retrieval context a query would inject into the prompt.
    ///
    /// Requires a synced mirror; does not call the completion endpoint.
    Render {
        /// The query string.
        query: String,
    },

    /// Run one full turn: sync, ingest, retrieve, and call the model.
    Ask {
        /// The question to answer.
        query: String,
    },

    /// Start the chat HTTP server.
    ///
    /// Syncs and ingests the mirror first, then binds to `[server].bind`.
    Serve,

    /// Show mirror and collection status.
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Sync => {
            let mirror = Mirror::new(&cfg.mirror);
            match mirror.ensure_up_to_date()? {
                SyncOutcome::Cloned => println!("Cloned repository."),
                SyncOutcome::Pulled => println!("Pulled latest changes."),
            }
            println!("Repository is up to date.");
        }
        Commands::Read { path } => {
            let mirror = Mirror::new(&cfg.mirror);
            match mirror.read_relative(&path)? {
                Some(contents) => println!("Contents of {}:\n{}", path, contents),
                None => println!("File not found."),
            }
        }
        Commands::Render { query } => {
            let mirror = Mirror::new(&cfg.mirror);
            if !mirror.dir().join(".git").exists() {
                anyhow::bail!(
                    "No mirror at {}. Run `desk sync` first.",
                    mirror.dir().display()
                );
            }
            let collection = ingest::load_all(mirror.dir(), &cfg.ingest)?;
            let result = docdesk::retrieve::render(&collection, &query);
            if result.is_empty() {
                println!("No matching documents.");
            } else {
                println!("{}", result.output);
                println!();
                println!("characters: {}", result.length);
            }
        }
        Commands::Ask { query } => {
            let model = Box::new(OpenAiModel::new(&cfg.completion)?);
            let assistant = Assistant::bootstrap(cfg, model).await?;
            let reply = assistant.handle(&query).await?;
            println!("{}", reply);
        }
        Commands::Serve => {
            let model = Box::new(OpenAiModel::new(&cfg.completion)?);
            let bind = cfg.server.bind.clone();
            let app_id = cfg.server.app_id.clone();
            let assistant = Arc::new(Assistant::bootstrap(cfg, model).await?);
            server::run_server(&bind, app_id, assistant).await?;
        }
        Commands::Status => {
            let mirror = Mirror::new(&cfg.mirror);
            println!("mirror:    {}", mirror.dir().display());
            if mirror.dir().join(".git").exists() {
                println!("synced:    yes");
                println!("head:      {}", mirror.head_summary()?);
                let collection = ingest::load_all(mirror.dir(), &cfg.ingest)?;
                println!("documents: {}", collection.documents.len());
            } else {
                println!("synced:    no (run `desk sync`)");
            }
            println!("model:     {}", cfg.completion.model);
        }
    }

    Ok(())
}
