//! Cardsync CLI
//!
//! Command-line client for a flash card server.
//!
//! # Commands
//!
//! - `list` - Show the collection
//! - `add` - Add a card
//! - `toggle` - Flip a card's learned flag
//! - `edit` - Change a card's question or answer
//! - `delete` - Delete a card
//! - `restore` - Restore a database file from a backup

mod commands;

use cardsync_engine::{FaultConfig, SortOrder, SyncConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Flash card collection client.
#[derive(Parser)]
#[command(name = "cardsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Base URL of the server
    #[arg(global = true, long, default_value = "http://localhost:3003")]
    host: String,

    /// Delay each request by a random amount
    #[arg(global = true, long)]
    latency: bool,

    /// Fail requests at random
    #[arg(global = true, long)]
    failure: bool,

    /// Probability of a simulated failure
    #[arg(global = true, long, default_value = "0.85")]
    failure_rate: f64,

    /// Milliseconds a deleted card stays visible
    #[arg(global = true, long, default_value = "300")]
    grace_ms: u64,

    /// List oldest cards first
    #[arg(global = true, long)]
    oldest_first: bool,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn sync_config(&self) -> SyncConfig {
        let fault = FaultConfig::disabled()
            .with_latency(self.latency)
            .with_failure(self.failure)
            .with_failure_rate(self.failure_rate);
        let order = if self.oldest_first {
            SortOrder::OldestFirst
        } else {
            SortOrder::NewestFirst
        };

        SyncConfig::new(self.host.as_str())
            .with_fault(fault)
            .with_delete_grace(Duration::from_millis(self.grace_ms))
            .with_sort_order(order)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show the collection
    List {
        /// Show answers
        #[arg(short, long)]
        answers: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Add a card
    Add {
        /// Question text
        question: String,

        /// Answer text
        answer: String,
    },

    /// Flip a card's learned flag
    Toggle {
        /// Card ID
        id: String,
    },

    /// Change a card's question or answer
    Edit {
        /// Card ID
        id: String,

        /// New question
        #[arg(short, long)]
        question: Option<String>,

        /// New answer
        #[arg(short, long)]
        answer: Option<String>,
    },

    /// Delete a card
    Delete {
        /// Card ID
        id: String,
    },

    /// Restore a database file from a backup
    Restore {
        /// Backup database file
        #[arg(short, long, default_value = "db-backup.json")]
        backup: PathBuf,

        /// Database file to overwrite
        #[arg(short, long, default_value = "db.json")]
        target: PathBuf,
    },

    /// Show version information
    Version,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut out = std::io::stdout().lock();
    let config = cli.sync_config();

    match cli.command {
        Commands::List { answers, format } => {
            let controller = commands::connect(config)?;
            commands::list::run(&controller, answers, &format, &mut out).await?;
        }
        Commands::Add { question, answer } => {
            let controller = commands::connect(config)?;
            commands::add::run(&controller, &question, &answer, &mut out).await?;
        }
        Commands::Toggle { id } => {
            let controller = commands::connect(config)?;
            commands::toggle::run(&controller, &id, &mut out).await?;
        }
        Commands::Edit {
            id,
            question,
            answer,
        } => {
            let controller = commands::connect(config)?;
            commands::edit::run(&controller, &id, question, answer, &mut out).await?;
        }
        Commands::Delete { id } => {
            let controller = commands::connect(config)?;
            commands::delete::run(&controller, &id, &mut out).await?;
        }
        Commands::Restore { backup, target } => {
            commands::restore::run(&backup, &target, &mut out)?;
        }
        Commands::Version => {
            println!("cardsync CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("resource /{}", cardsync_engine::RESOURCE);
        }
    }

    Ok(())
}
