//! Hand Tracker - incremental poker hand-history importer.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use hand_tracker::config::{ConfigLoader, TrackerConfig};
use hand_tracker::stats::{PlayerStats, StatCounters};
use hand_tracker::store::{HandStore, SqliteStore};
use hand_tracker::watcher::FileTailer;

#[derive(Parser)]
#[command(
    name = "hand-tracker",
    about = "Import poker hand histories and accumulate player statistics",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file to use instead of the default search paths.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Hand-history directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Database file.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Screen name whose hole cards are recorded.
    #[arg(long, global = true)]
    hero: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import every hand-history file once.
    Import,
    /// Keep importing new hands until interrupted.
    Watch,
    /// Print accumulated statistics for a player.
    Stats {
        player: String,
        /// Print rows as JSON.
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

fn load_config(cli: &Cli) -> Result<TrackerConfig, hand_tracker::config::ConfigError> {
    let loader = match &cli.config {
        Some(path) => ConfigLoader::with_path(path.clone()),
        None => ConfigLoader::new(),
    };
    let mut config = loader.load()?;
    if let Some(dir) = &cli.dir {
        config.hand_history_dir.clone_from(dir);
    }
    if let Some(db) = &cli.db {
        config.database_path.clone_from(db);
    }
    if cli.hero.is_some() {
        config.hero.clone_from(&cli.hero);
    }
    Ok(config)
}

fn percent(hits: u32, chances: u32) -> String {
    if chances == 0 {
        "-".to_string()
    } else {
        format!("{:.1}%", f64::from(hits) * 100.0 / f64::from(chances))
    }
}

fn print_stats(player: &str, rows: &[PlayerStats]) {
    let mut total = StatCounters::default();
    for row in rows {
        total.merge(&row.counters);
    }

    println!("{player}: {} hands in {} buckets", total.hands, rows.len());
    println!(
        "  VPIP {}  PFR {}  RFI {}  3bet {}  Steal {}",
        percent(total.vpip, total.hands),
        percent(total.pfr, total.hands),
        percent(total.rfi, total.rfi_opp),
        percent(total.three_bet, total.three_bet_opp),
        percent(total.steal, total.steal_opp),
    );
    println!(
        "  Cbet {}  Fold to cbet {}  Barrel turn {}  WTSD {}  W$SD {}",
        percent(total.cbet_flop, total.cbet_flop_opp),
        percent(total.fold_to_cbet_flop, total.fold_to_cbet_flop_opp),
        percent(total.barrel_turn, total.barrel_turn_opp),
        percent(total.went_showdown, total.saw_flop),
        percent(total.won_showdown, total.went_showdown),
    );

    for row in rows {
        let key = &row.key;
        println!(
            "  {:<5} {}-max {} seated  bucket {:<2} hands {:>6}  VPIP {:>6}  PFR {:>6}",
            key.position.map_or("-", |p| p.as_str()),
            key.max_seats,
            key.seats_occupied,
            key.stack_bucket.map_or_else(|| "-".to_string(), |b| b.to_string()),
            row.counters.hands,
            percent(row.counters.vpip, row.counters.hands),
            percent(row.counters.pfr, row.counters.hands),
        );
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&cli)?;
    let store = Arc::new(SqliteStore::open(&config.database_path).await?);

    match cli.command {
        Commands::Import => {
            let mut tailer = FileTailer::new(
                config.hand_history_dir.clone(),
                store.clone(),
                config.tailer_options(),
            );
            let report = tailer.tick().await;
            println!(
                "Imported {} hands from {} files ({} duplicates, {} malformed, {} failed files)",
                report.hands_persisted,
                report.files_scanned,
                report.duplicates,
                report.malformed_hands,
                report.files_failed,
            );
        }
        Commands::Watch => {
            let mut tailer = FileTailer::new(
                config.hand_history_dir.clone(),
                store.clone(),
                config.tailer_options(),
            );
            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_signal.cancel();
                }
            });

            tracing::info!(
                dir = %config.hand_history_dir.display(),
                db = %config.database_path.display(),
                "Watching hand histories"
            );
            tailer.watch(config.poll_interval(), cancel).await;
        }
        Commands::Stats { player, json } => {
            let rows = store.player_stats(&player).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else if rows.is_empty() {
                println!("No hands recorded for {player}");
            } else {
                print_stats(&player, &rows);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "hand-tracker failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
