use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cardforge::cli::commands;

#[derive(Parser)]
#[command(name = "cardforge")]
#[command(version, about = "AI flashcard generation and unification engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long)]
    verbose: bool,

    #[arg(long, short)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize cardforge in the current directory
    Init {
        #[arg(long, short, help = "Overwrite existing initialization")]
        force: bool,
    },

    /// Generate flashcards for a topic and unify them with existing records
    Generate {
        #[arg(help = "Free-text topic to generate flashcards for")]
        topic: String,
        #[arg(long, short = 'n', help = "Number of flashcards to request")]
        count: Option<usize>,
        #[arg(long, help = "Category label to attach")]
        category: Option<String>,
        #[arg(long, help = "Contributor id to record on the set")]
        contributor: Option<String>,
        #[arg(long, help = "Stream items as they are generated")]
        stream: bool,
    },

    /// Fold duplicate records per topic into their earliest-created survivor
    Consolidate {
        #[arg(long, help = "Emit the report as JSON")]
        json: bool,
    },

    /// Create missing categories, correct drifted rows, re-link records
    SyncCategories {
        #[arg(long, help = "Emit the report as JSON")]
        json: bool,
    },

    /// Categorize records that have no category yet
    Backfill {
        #[arg(long, short, help = "Records to process this execution")]
        limit: Option<usize>,
        #[arg(long, help = "Emit the report as JSON")]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(long, help = "Output as JSON instead of TOML")]
        json: bool,
    },
    /// Show configuration file paths
    Path,
    /// Initialize global configuration
    Init {
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mcardforge encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Init { force } => {
            commands::init::run(force)?;
        }
        Commands::Generate {
            topic,
            count,
            category,
            contributor,
            stream,
        } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::generate::run(commands::generate::GenerateOptions {
                topic,
                count,
                category,
                contributor,
                stream,
            }))?;
        }
        Commands::Consolidate { json } => {
            commands::consolidate::run(json)?;
        }
        Commands::SyncCategories { json } => {
            commands::sync::run(json)?;
        }
        Commands::Backfill { limit, json } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::backfill::run(limit, json))?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { json } => {
                commands::config::show(json)?;
            }
            ConfigAction::Path => {
                commands::config::path()?;
            }
            ConfigAction::Init { force } => {
                commands::config::init_global(force)?;
            }
        },
    }

    Ok(())
}
