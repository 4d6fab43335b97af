//! Headless Lane Siege runner.
//!
//! Logs go to stderr; summaries go to stdout as JSON.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use lane_core::archetype::ArchetypeTable;
use lane_core::bot::Difficulty;
use lane_core::config::MatchConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use lane_headless::batch::{run_batch, verify_determinism, BatchConfig};
use lane_headless::runner::{run_game, GameConfig, DEFAULT_MAX_TICKS};

#[derive(Parser)]
#[command(name = "lane_headless")]
#[command(about = "Headless Lane Siege runner for balance testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one bot-vs-bot match and print its summary
    Run {
        /// Match seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Tick limit before the match is called a draw
        #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
        max_ticks: u64,

        /// Left bot difficulty
        #[arg(long, default_value = "normal")]
        left: Difficulty,

        /// Right bot difficulty
        #[arg(long, default_value = "normal")]
        right: Difficulty,

        /// RON archetype table to use instead of the standard one
        #[arg(long)]
        archetypes: Option<PathBuf>,

        /// RON match config to use instead of the defaults
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the final match state (bincode) here
        #[arg(long)]
        dump_state: Option<PathBuf>,
    },

    /// Run a batch of seeds in parallel and report win rates
    Batch {
        /// Number of games to run
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Maximum parallel games (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Starting seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Tick limit per game
        #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
        max_ticks: u64,

        /// Left bot difficulty
        #[arg(long, default_value = "normal")]
        left: Difficulty,

        /// Right bot difficulty
        #[arg(long, default_value = "normal")]
        right: Difficulty,

        /// Results JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Verify determinism by running the same seed several times
    Verify {
        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,

        /// Tick limit per run
        #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
        max_ticks: u64,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let outcome = match cli.command {
        Commands::Run {
            seed,
            max_ticks,
            left,
            right,
            archetypes,
            config,
            dump_state,
        } => cmd_run(
            seed,
            max_ticks,
            left,
            right,
            archetypes.as_deref(),
            config.as_deref(),
            dump_state.as_deref(),
        ),
        Commands::Batch {
            count,
            parallel,
            seed,
            max_ticks,
            left,
            right,
            output,
        } => {
            cmd_batch(BatchConfig {
                game_count: count,
                parallel_games: parallel,
                seed_start: seed,
                max_ticks,
                left,
                right,
                output,
            });
            Ok(())
        }
        Commands::Verify {
            seed,
            runs,
            max_ticks,
        } => cmd_verify(seed, runs, max_ticks),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            tracing::error!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn read(path: &Path) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| format!("cannot read {}: {e}", path.display()))
}

/// Play one match and print its metrics
fn cmd_run(
    seed: u64,
    max_ticks: u64,
    left: Difficulty,
    right: Difficulty,
    archetypes: Option<&Path>,
    config: Option<&Path>,
    dump_state: Option<&Path>,
) -> Result<(), String> {
    let mut game_config = GameConfig {
        seed,
        max_ticks,
        left,
        right,
        ..GameConfig::default()
    };
    if let Some(path) = archetypes {
        game_config.table = ArchetypeTable::from_ron_str(&read(path)?, &path.display().to_string())
            .map_err(|e| e.to_string())?;
    }
    if let Some(path) = config {
        game_config.match_config =
            MatchConfig::from_ron_str(&read(path)?, &path.display().to_string())
                .map_err(|e| e.to_string())?;
    }

    let result = run_game(&game_config).map_err(|e| e.to_string())?;

    if let Some(path) = dump_state {
        let bytes = result.game.serialize().map_err(|e| e.to_string())?;
        std::fs::write(path, bytes)
            .map_err(|e| format!("cannot write {}: {e}", path.display()))?;
        tracing::info!(path = %path.display(), "final state written");
    }

    let json = serde_json::to_string_pretty(&result.metrics).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}

/// Run a batch and print win rates
fn cmd_batch(config: BatchConfig) {
    let output = config.output.clone();
    let results = run_batch(config);

    if let Some(path) = &output {
        match results.save(path) {
            Ok(()) => eprintln!("Results saved to: {}", path.display()),
            Err(e) => tracing::error!(error = %e, path = %path.display(), "failed to save results"),
        }
    }

    let summary = &results.summary;
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Games played: {}", summary.total_games);
    if !results.errors.is_empty() {
        eprintln!("Games failed: {}", results.errors.len());
        for error in results.errors.iter().take(10) {
            eprintln!("  seed {}: {}", error.seed, error.message);
        }
    }
    eprintln!("Duration: {:.1}s", results.duration_seconds);
    eprintln!("\nWin rates:");
    eprintln!("  left  ({}): {:.1}%", results.config.left, summary.left_win_rate * 100.0);
    eprintln!("  right ({}): {:.1}%", results.config.right, summary.right_win_rate * 100.0);
    eprintln!("  draws: {}", summary.draws);
    eprintln!(
        "Average length: {:.0} ticks ({} - {})",
        summary.avg_duration_ticks, summary.min_duration_ticks, summary.max_duration_ticks
    );
}

/// Verify determinism
fn cmd_verify(seed: u64, runs: u32, max_ticks: u64) -> Result<(), String> {
    tracing::info!(seed, runs, "verifying determinism");
    if verify_determinism(seed, runs, max_ticks) {
        eprintln!("PASS: {runs} runs of seed {seed} produced identical state hashes");
        Ok(())
    } else {
        Err(format!("FAIL: seed {seed} diverged across {runs} runs"))
    }
}
