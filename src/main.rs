/*****************************************************************************************
 *
 *  storeapi – In-memory KV store + record aggregation over HTTP
 *  -------------------------------------------------------------
 *
 *****************************************************************************************/

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::FmtSubscriber;

use storeapi::app;
use storeapi::config::AppConfig;
use storeapi::persistence::{open_store, save_snapshot, spawn_autosave};
use storeapi::state::AppState;
use storeapi::storage::MongoRecordRepository;

#[tokio::main]
async fn main() -> ExitCode {
    //
    // ────────────────────────────────────────────────────────
    //  Load configuration
    // ────────────────────────────────────────────────────────
    //
    let cfg = match AppConfig::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("storeapi: {e}");
            return ExitCode::FAILURE;
        }
    };

    //
    // ────────────────────────────────────────────────────────
    //  Configure logging
    // ────────────────────────────────────────────────────────
    //
    let level = match cfg.log_level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info"  => LevelFilter::INFO,
        "warn"  => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => LevelFilter::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("storeapi: failed to set tracing subscriber: {e}");
        return ExitCode::FAILURE;
    }

    tracing::info!("Starting storeapi…");

    let snapshot_every = cfg.snapshot_interval();
    tracing::info!(
        listen_addr = %cfg.listen_addr,
        snapshot_path = %cfg.snapshot_path,
        snapshot_interval = ?snapshot_every,
        database = %cfg.mongodb_database,
        collection = %cfg.mongodb_collection,
        "Loaded configuration"
    );

    let addr = match cfg.socket_addr() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    //
    // ────────────────────────────────────────────────────────
    //  Connect to the record store (fatal when unreachable)
    // ────────────────────────────────────────────────────────
    //
    let records = match MongoRecordRepository::connect(
        &cfg.mongodb_uri,
        &cfg.mongodb_database,
        &cfg.mongodb_collection,
    )
    .await
    {
        Ok(repo) => repo,
        Err(e) => {
            tracing::error!("Cannot reach MongoDB: {e}");
            return ExitCode::FAILURE;
        }
    };

    //
    // ────────────────────────────────────────────────────────
    //  Create KV store, load snapshot, start autosave loop
    // ────────────────────────────────────────────────────────
    //
    let store = open_store(Default::default(), Path::new(&cfg.snapshot_path));
    let shutdown_token = CancellationToken::new();
    let autosave = spawn_autosave(
        &cfg.snapshot_path,
        store.clone(),
        snapshot_every,
        shutdown_token.child_token(),
    );

    //
    // ────────────────────────────────────────────────────────
    //  Build app, bind and serve
    // ────────────────────────────────────────────────────────
    //
    let app = app::build_app(AppState::new(store.clone(), Arc::new(records)));

    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Could not listen on {addr}: {e}");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("Listening on http://{}", addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown(shutdown_token.clone()))
        .await;

    //
    // ────────────────────────────────────────────────────────
    //  Stop autosave and write a final snapshot
    // ────────────────────────────────────────────────────────
    //
    shutdown_token.cancel();
    autosave.join().await;

    match save_snapshot(Path::new(&cfg.snapshot_path), &store) {
        Ok(n) => tracing::info!("Snapshot saved ({n} entries). Goodbye."),
        Err(e) => tracing::warn!("Final snapshot failed: {e}"),
    }

    match served {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Server error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Resolves on Ctrl+C or when `token` is cancelled elsewhere.
async fn shutdown(token: CancellationToken) {
    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                tracing::warn!("Failed to listen for shutdown signal: {e}");
                token.cancelled().await;
            }
        }
        _ = token.cancelled() => {}
    }

    tracing::warn!("Shutdown requested, stopping server…");
}
