//! Arena Brawl - headless two-fighter match host
//!
//! Runs the authoritative simulation at a fixed 60 Hz tick:
//! - Fighter physics, attacks, specials and dashes
//! - A difficulty-tiered opponent for fighter two
//! - Round timing and best-of-N series scoring
//! - Per-frame snapshots for a renderer (JSON lines or tracing)

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arena_brawl::app::{MatchRunner, Pacing, RunSummary};
use arena_brawl::config::{Config, FrameSinkKind};
use arena_brawl::game::{GameMatch, JsonLinesSink, RenderSink, TracingSink};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    info!("Starting Arena Brawl");
    info!(
        mode = ?config.mode,
        autopilot = ?config.autopilot,
        rounds = config.max_rounds,
        round_time_secs = config.round_time_secs,
        seed = config.ai_seed,
        realtime = config.realtime,
        "Match settings"
    );

    let (pacing, clock) = Pacing::from_config(&config);
    let game_match = GameMatch::new(config.match_config(), config.mode, clock);

    let summary = match config.frame_sink {
        FrameSinkKind::Json => {
            let sink = JsonLinesSink::new(std::io::stdout());
            run_until_shutdown(build_runner(&config, game_match, sink, pacing)).await?
        }
        FrameSinkKind::Log => {
            run_until_shutdown(build_runner(&config, game_match, TracingSink, pacing)).await?
        }
    };

    match summary {
        Some(summary) => info!(
            ticks = summary.ticks,
            rounds = summary.rounds_played,
            wins_one = summary.round_wins[0],
            wins_two = summary.round_wins[1],
            winner = ?summary.series_winner,
            "Series complete"
        ),
        None => warn!("Match abandoned before the series finished"),
    }

    info!("Shutdown complete");
    Ok(())
}

fn build_runner<S: RenderSink>(
    config: &Config,
    game_match: GameMatch,
    sink: S,
    pacing: Pacing,
) -> MatchRunner<S> {
    let runner = MatchRunner::new(game_match, sink, pacing, config.snapshot_every)
        .with_max_ticks(config.max_ticks);

    match config.autopilot {
        Some(difficulty) => runner.with_autopilot(difficulty, config.ai_seed.wrapping_mul(31)),
        None => runner,
    }
}

/// Run the match, giving up early on a shutdown signal
async fn run_until_shutdown<S: RenderSink>(
    runner: MatchRunner<S>,
) -> anyhow::Result<Option<RunSummary>> {
    tokio::select! {
        result = runner.run() => Ok(Some(result?)),
        _ = shutdown_signal() => Ok(None),
    }
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, stopping match");
        }
        _ = terminate => {
            info!("Received terminate signal, stopping match");
        }
    }
}
