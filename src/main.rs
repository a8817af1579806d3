//! board-watch: board snapshot diff and change-tracking tool

use anyhow::Result;
use board_watch::cli::{self, CheckOptions, HistoryOptions};
use board_watch::config;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "board-watch")]
#[command(version)]
#[command(about = "Board snapshot diff and change-tracking tool", long_about = None)]
#[command(after_help = "EXIT CODES:
    0  No changes detected (or no --fail-on-change)
    1  Changes detected (with --fail-on-change)
    2  Error occurred

EXAMPLES:
    # Record and diff an already-fetched payload
    board-watch check board.json

    # Pipe the payload through stdin, naming the board explicitly
    fetch-board | board-watch check - --board abc123

    # What changed since the start of the month, for one card
    board-watch history abc123 --since 2026-08-01 --card c42")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output (also respects `NO_COLOR` env)
    #[arg(long, global = true)]
    no_color: bool,

    /// Path to the state database (overrides config and `BOARD_WATCH_DB`)
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Arguments for the `check` subcommand
#[derive(Parser)]
struct CheckArgs {
    /// Path to the fetched board payload (JSON); "-" reads stdin
    payload: PathBuf,

    /// Board id, when the payload carries none
    #[arg(long, env = "BOARD_WATCH_BOARD")]
    board: Option<String>,

    /// Print the changeset as JSON instead of the text summary
    #[arg(long)]
    json: bool,

    /// Exit with code 1 if any changes were detected (CI mode)
    #[arg(long)]
    fail_on_change: bool,
}

/// Arguments for the `history` subcommand
#[derive(Parser)]
struct HistoryArgs {
    /// Board id
    board_id: String,

    /// Limit number of changes to display
    #[arg(short = 'n', long)]
    limit: Option<usize>,

    /// Show changes since date (YYYY-MM-DD or "YYYY-MM-DD HH:MM:SS")
    #[arg(long)]
    since: Option<String>,

    /// Filter changes for a specific card id
    #[arg(long)]
    card: Option<String>,

    /// Print entries as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a board payload for changes and record the observation
    Check(CheckArgs),

    /// Show the current saved state of a board
    Show {
        /// Board id
        board_id: String,

        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// List all boards that have been checked
    List,

    /// Inspect a payload without saving state (debugging aid)
    Inspect {
        /// Path to the fetched board payload (JSON); "-" reads stdin
        payload: PathBuf,
    },

    /// Show change history for a board
    History(HistoryArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let (config, _loaded_from) = config::load_or_default(cli.config.as_deref())?;
    let db_path = config.database_path(cli.db.as_deref());
    let no_color = cli.no_color || std::env::var_os("NO_COLOR").is_some();

    match cli.command {
        Commands::Check(args) => {
            let exit_code = cli::run_check(CheckOptions {
                payload: args.payload,
                board_id: args.board,
                db_path,
                json: args.json,
                fail_on_change: args.fail_on_change,
                no_color,
                quiet: cli.quiet,
            })?;
            if exit_code != 0 {
                std::process::exit(exit_code);
            }
            Ok(())
        }

        Commands::Show { board_id, json } => cli::run_show(&board_id, &db_path, json, no_color),

        Commands::List => cli::run_list(&db_path, no_color),

        Commands::Inspect { payload } => cli::run_inspect(&payload, no_color),

        Commands::History(args) => cli::run_history(HistoryOptions {
            board_id: args.board_id,
            db_path,
            limit: args.limit.unwrap_or(config.history_limit),
            since: args.since,
            card: args.card,
            json: args.json,
            no_color,
        }),

        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "board-watch", &mut io::stdout());
            Ok(())
        }
    }
}
