//! Room server for the fabula storytelling card game.
//!
//! Rooms are created on first join and live in memory as one actor task
//! each; clients talk to them over REST or a WebSocket per player.

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::{Context, Error};
use fabula::{CardPool, RoomRegistry};
use fabula_server::{api, config::ServerConfig, logging, metrics};
use log::info;
use pico_args::Arguments;

const HELP: &str = "\
Run a fabula room server

USAGE:
  fabula_server [OPTIONS]

OPTIONS:
  --bind          IP:PORT  Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:6969]
  --catalog       PATH     JSON card catalog           [default: env CARD_CATALOG or built-in 84 cards]
  --metrics-bind  IP:PORT  Prometheus scrape address   [default: env METRICS_BIND or disabled]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  CARD_CATALOG             Path to a JSON array of {id, title, image}
  METRICS_BIND             Prometheus exporter address
  ROOM_HAND_SIZE           Cards per hand            [default: 6]
  ROOM_WINNING_SCORE       Points that end a game    [default: 30]
  ROOM_MIN_PLAYERS         Players needed to start   [default: 3]
  ROOM_MAX_PLAYERS         Roster cap                [default: 10]
  ROOM_SCORING_RULE        standard | classic        [default: standard]
  RUST_LOG                 Log filter                [default: info]
";

struct Args {
    bind: Option<SocketAddr>,
    catalog: Option<PathBuf>,
    metrics_bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        catalog: pargs.opt_value_from_str("--catalog")?,
        metrics_bind: pargs.opt_value_from_str("--metrics-bind")?,
    };

    logging::init();

    let config = ServerConfig::from_env(args.bind, args.catalog, args.metrics_bind)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(|e| anyhow::anyhow!(e))?;
        info!("Prometheus metrics at http://{}/metrics", addr);
    }

    let pool = match &config.catalog {
        Some(path) => CardPool::from_json_file(path)
            .with_context(|| format!("Failed to load card catalog {}", path.display()))?,
        None => CardPool::builtin(),
    };
    info!("Card pool ready with {} cards", pool.len());

    let registry = RoomRegistry::in_memory(config.room_defaults.clone(), pool)?;
    info!(
        "Rooms: {}-{} players, {} cards per hand, first to {} points, {} scoring",
        config.room_defaults.min_players,
        config.room_defaults.max_players,
        config.room_defaults.hand_size,
        config.room_defaults.winning_score,
        config.room_defaults.scoring_rule
    );

    let app = api::create_router(api::AppState {
        registry: Arc::new(registry),
    });

    info!("Starting HTTP/WebSocket server on {}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
