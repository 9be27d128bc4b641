pub mod types;
pub mod error;
pub mod seeding;
pub mod bracket;
pub mod propagate;
pub mod round_robin;
pub mod standings;
pub mod view;
pub mod config;
pub mod snapshot;
pub mod commands;
pub mod server;

use clap::{Parser, Subcommand};
use commands::{Context, GenerateArgs, ScheduleArgs};
use config::*;
use error::{AppError, AppResult};
use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use types::Side;

// ── Command line ───────────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "bracket-tool", version)]
#[command(about = "Build and run single elimination and round robin tournaments", long_about = None)]
struct Cli {
    /// Config file (default: ./bracket-tool.json or $BRACKET_TOOL_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Tournament snapshot to operate on (overrides the config)
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a new tournament, replacing any existing snapshot
    Generate(GenerateArgs),

    /// Print the bracket grouped by round
    Show {
        #[arg(long)]
        json: bool,
    },

    /// Record the winner of a match
    Win {
        /// Match id, `round.index` (e.g. 2.0) or `3rd`
        #[arg(value_name = "MATCH")]
        reference: String,
        #[arg(value_enum)]
        side: Side,
    },

    /// Record a drawn round robin match
    Draw {
        #[arg(value_name = "MATCH")]
        reference: String,
    },

    /// Undo a result and everything that depended on it
    Clear {
        #[arg(value_name = "MATCH")]
        reference: String,
    },

    /// Undo every recorded result; byes stay resolved
    ClearAll,

    /// Set a score, or clear it when VALUE is omitted
    Score {
        #[arg(value_name = "MATCH")]
        reference: String,
        #[arg(value_enum)]
        side: Side,
        value: Option<u32>,
    },

    /// Set time, location or notes for a match
    Schedule {
        #[arg(value_name = "MATCH")]
        reference: String,
        #[command(flatten)]
        details: ScheduleArgs,
    },

    /// Print the standings table
    Standings {
        #[arg(long)]
        json: bool,
    },

    /// Serve the bracket read-only over HTTP
    Serve {
        #[arg(long)]
        addr: Option<String>,
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Flip a coin
    Flip,

    /// Print the effective config, or write it out with --write
    Config {
        #[arg(long)]
        write: bool,
    },
}

fn execute(command: Command, ctx: &Context, config_file: &Path) -> AppResult<String> {
    match command {
        Command::Generate(args) => {
            let state = commands::generate(ctx, args)?;
            Ok(format!(
                "Generated \"{}\": {} entrants, {} matches over {} rounds.",
                state.title,
                state.participants.len(),
                state.bracket.matches.len(),
                state.bracket.rounds
            ))
        }
        Command::Show { json } => commands::show(ctx, json),
        Command::Win { reference, side } => commands::win(ctx, &reference, side),
        Command::Draw { reference } => commands::draw(ctx, &reference),
        Command::Clear { reference } => commands::clear(ctx, &reference),
        Command::ClearAll => commands::clear_results(ctx),
        Command::Score { reference, side, value } => commands::score(ctx, &reference, side, value),
        Command::Schedule { reference, details } => commands::schedule(ctx, &reference, details),
        Command::Standings { json } => commands::standings(ctx, json),
        Command::Serve { addr, static_dir: dir } => {
            let addr = addr.unwrap_or_else(|| serve_addr(&ctx.config));
            let dir = dir.or_else(|| static_dir(&ctx.config));
            server::serve(ctx.state_path.clone(), dir, &addr)?;
            Ok(String::new())
        }
        Command::Flip => Ok(commands::flip_coin(&mut rand::thread_rng()).to_string()),
        Command::Config { write } => {
            if write {
                save_config(config_file, &ctx.config)?;
                return Ok(format!("Wrote {}", config_file.display()));
            }
            serde_json::to_string_pretty(&ctx.config).map_err(AppError::json("encode config"))
        }
    }
}

// ── Entry point ────────────────────────────────────────────────────────

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let env_report = load_env_file(&work_dir());

    let config_file = cli.config.clone().unwrap_or_else(config_path);
    let config = match load_config(&config_file) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Initialize tracing with daily file output
    let logs_dir = log_dir(&config);
    fs::create_dir_all(&logs_dir).ok();
    let file_appender = tracing_appender::rolling::daily(&logs_dir, "bracket-tool.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(log_filter(&config))),
        )
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();
    info!(command = ?cli.command, "Bracket Tool starting");
    log_env_report(&env_report);
    log_config_warnings(&config);

    let ctx = Context::new(config, cli.state);
    match execute(cli.command, &ctx, &config_file) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output.trim_end());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
