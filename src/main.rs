#![cfg_attr(not(test), deny(clippy::panic))]

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use quipwits_server::config::{self, CredentialStore};
use quipwits_server::server::GameServer;
use quipwits_server::{logging, network, websocket};

/// QuipWits -- authoritative room server for a party-style word game
#[derive(Parser, Debug)]
#[command(name = "quipwits-server")]
#[command(about = "Room server for QuipWits: host a lobby, players join with a 4-letter code")]
#[command(version)]
struct Cli {
    /// Validate configuration and exit without starting the server.
    #[arg(long, short = 'c', conflicts_with = "print_config")]
    validate_config: bool,

    /// Print the loaded configuration to stdout (as JSON) and exit.
    #[arg(long, conflicts_with = "validate_config")]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration from config.json if present; otherwise use defaults.
    let cfg = Arc::new(config::load());

    if cli.print_config {
        let json = serde_json::to_string_pretty(&*cfg)
            .map_err(|e| anyhow::anyhow!("Failed to serialize config: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    if cli.validate_config {
        println!("Configuration validation passed");
        println!();
        println!("Configuration summary:");
        println!("  Port: {}", cfg.port);
        println!("  Players per room: {}-{}", cfg.game.min_players, cfg.game.max_players);
        println!("  Rounds per game: {}", cfg.game.rounds_per_game);
        println!("  Room max age: {}s", cfg.server.max_room_age_secs);
        println!("  Static UI dir: {}", cfg.static_dir);
        return Ok(());
    }

    logging::init_with_config(&cfg.logging);

    let credentials = Arc::new(CredentialStore::load(None));
    if credentials.has_api_key() {
        tracing::info!("API key present; remote prompt generation enabled");
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    tracing::info!(%addr, "Starting QuipWits server");

    let server = GameServer::new(Arc::clone(&cfg), credentials);

    // Idle-room reaper
    tokio::spawn(Arc::clone(&server).cleanup_task());

    let router = websocket::create_router(&cfg).with_state(Arc::clone(&server));
    let make_service = router.into_make_service_with_connect_info::<SocketAddr>();

    // Bind failures propagate and exit non-zero
    let listener = tokio::net::TcpListener::bind(addr).await?;

    if let Some(join_url) = network::join_url(cfg.port) {
        tracing::info!(%join_url, "Players can join at this address");
    }
    tracing::info!(
        %addr,
        "Server started - host UI: /host, player UI: /play, WebSocket: /ws"
    );

    axum::serve(listener, make_service)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolve on SIGINT or SIGTERM for a clean exit (code 0).
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
