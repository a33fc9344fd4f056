// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cairn - a local retrieval-augmented multi-agent assistant.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::path::PathBuf;

use cairn::chat::{self, ChatOptions};
use cairn::{commands, doctor, App};
use cairn_config::CairnConfig;
use cairn_core::CairnError;
use clap::{Parser, Subcommand};

/// Cairn - a local retrieval-augmented multi-agent assistant.
#[derive(Parser, Debug)]
#[command(name = "cairn", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Chunk, embed and store a document.
    Ingest {
        path: PathBuf,
        /// Document name; defaults to the file name.
        #[arg(long)]
        name: Option<String>,
        /// Declared format such as `md` or `txt`; defaults to the extension.
        #[arg(long)]
        format: Option<String>,
        /// Metadata attached to every chunk.
        #[arg(long = "meta", value_parser = commands::parse_key_val)]
        metadata: Vec<(String, String)>,
    },
    /// Search stored documents.
    Search {
        query: String,
        #[arg(long)]
        limit: Option<usize>,
        /// Only chunks whose metadata has this value.
        #[arg(long, value_parser = commands::parse_key_val)]
        filter: Vec<(String, String)>,
        #[arg(long)]
        json: bool,
    },
    /// Talk to an agent.
    Chat {
        #[arg(long, default_value = "General Chat")]
        agent: String,
        /// Send one message and exit instead of starting a REPL.
        #[arg(long, short)]
        message: Option<String>,
        /// Force document retrieval on for every turn.
        #[arg(long, conflicts_with = "no_retrieval")]
        retrieval: bool,
        /// Force document retrieval off for every turn.
        #[arg(long)]
        no_retrieval: bool,
        #[arg(long, value_parser = commands::parse_key_val)]
        filter: Vec<(String, String)>,
        /// Save the conversation when the session ends.
        #[arg(long)]
        save: bool,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// List configured agents and their tools.
    Agents,
    /// List stored documents.
    Documents {
        #[arg(long)]
        json: bool,
    },
    /// Delete every chunk of a document.
    Delete { document: String },
    /// List saved conversations, newest first.
    History {
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Print a saved conversation.
    Export {
        id: String,
        /// json, markdown or text.
        #[arg(long, default_value = "markdown")]
        format: String,
    },
    /// Check the vector backend and external services.
    Doctor {
        #[arg(long)]
        plain: bool,
    },
    /// Inspect configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Validate configuration and exit.
    Check,
    /// Print the effective configuration as TOML.
    Show,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => cairn_config::load_and_validate_path(path),
        None => cairn_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            cairn_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.app.log_level);

    if let Err(e) = run(cli.command, config).await {
        tracing::error!(error = %e, "command failed");
        eprintln!("error: {}", e.user_message());
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: CairnConfig) -> Result<(), CairnError> {
    if let Commands::Config { action } = &command {
        match action {
            ConfigAction::Check => {
                println!("configuration valid ({} agents)", config.effective_agents().len());
            }
            ConfigAction::Show => {
                let rendered = toml::to_string_pretty(&config)
                    .map_err(|e| CairnError::Internal(format!("failed to render config: {e}")))?;
                println!("{rendered}");
            }
        }
        return Ok(());
    }

    let app = App::start(config).await?;
    match command {
        Commands::Ingest {
            path,
            name,
            format,
            metadata,
        } => commands::run_ingest(&app, &path, name.as_deref(), format.as_deref(), &metadata).await,
        Commands::Search {
            query,
            limit,
            filter,
            json,
        } => commands::run_search(&app, &query, limit, &filter, json).await,
        Commands::Chat {
            agent,
            message,
            retrieval,
            no_retrieval,
            filter,
            save,
            tags,
        } => {
            let options = ChatOptions {
                retrieval: match (retrieval, no_retrieval) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
                filter,
                save,
                tags,
            };
            match message {
                Some(message) => chat::run_once(&app, &agent, &message, &options).await,
                None => chat::run_repl(&app, &agent, &options).await,
            }
        }
        Commands::Agents => {
            for name in app.agents.names() {
                let agent = app.agents.get(name)?;
                let tools = agent.tool_names();
                println!(
                    "{name:<24} temperature={:<4.1} retrieval={:<5} tools={}",
                    agent.temperature(),
                    agent.retrieval_enabled(),
                    if tools.is_empty() { "-".to_string() } else { tools.join(",") }
                );
            }
            Ok(())
        }
        Commands::Documents { json } => commands::run_documents(&app, json).await,
        Commands::Delete { document } => commands::run_delete(&app, &document).await,
        Commands::History { tags, search, limit } => {
            commands::run_history(&app, &tags, search.as_deref(), limit).await
        }
        Commands::Export { id, format } => commands::run_export(&app, &id, &format).await,
        Commands::Doctor { plain } => doctor::run_doctor(&app, plain).await,
        Commands::Config { .. } => Ok(()),
    }
}

/// Log to stderr so command output on stdout stays clean.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("cairn={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
