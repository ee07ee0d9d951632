mod config_client;
mod event_hub;
mod sinks;

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::routing::get;
use axum::Router;
use serde_json::json;
use socketioxide::extract::{Data, SocketRef};
use socketioxide::SocketIo;
use tokio::sync::{mpsc, watch};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use tdoa_core::{Station, StationSet};
use tdoa_types::PositionRecord;

use event_hub::EventHubConfig;
use sinks::ChannelSink;

// ─── Time Sync Endpoint ───────────────────────────────────────────────────────

async fn time_sync() -> axum::Json<serde_json::Value> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    axum::Json(json!({ "serverTime": now }))
}

// ─── Station Geometry ─────────────────────────────────────────────────────────

/// `TDOA_STATIONS`: JSON array of `{id, x, y}`. Defaults to the deployed
/// three-station grid.
fn load_stations() -> anyhow::Result<StationSet> {
    let stations = match std::env::var("TDOA_STATIONS") {
        Ok(raw) => serde_json::from_str::<Vec<Station>>(&raw)?,
        Err(_) => vec![
            Station::new("source1", 0.0, 0.0),
            Station::new("source2", 100_000.0, 0.0),
            Station::new("source3", 0.0, 100_000.0),
        ],
    };
    Ok(StationSet::with_default_speed(stations)?)
}

// ─── Position Broadcast Task ──────────────────────────────────────────────────

/// Drains the sink channel and fans resolved positions out to all connected
/// clients. Lives on its own task so a slow Socket.IO layer never touches
/// the solve path.
async fn run_broadcast(mut rx: mpsc::Receiver<PositionRecord>, io: SocketIo) {
    while let Some(record) = rx.recv().await {
        let _ = io.emit("position-update", &record);
    }
}

// ─── Socket Handlers ──────────────────────────────────────────────────────────

fn on_connect(socket: SocketRef, config_url: Arc<String>) {
    info!("client connected: {}", socket.id);

    // Relay object-speed changes from the UI to the external config service.
    // This setting is independent of the solver's propagation speed.
    socket.on(
        "set-object-speed",
        move |socket: SocketRef, Data::<serde_json::Value>(payload)| {
            let config_url = config_url.clone();
            async move {
                let Some(speed) = payload.get("objectSpeed").and_then(|v| v.as_f64()) else {
                    warn!("set-object-speed without a numeric objectSpeed field");
                    return;
                };
                match config_client::update_object_speed(&config_url, speed).await {
                    Ok(cfg) => {
                        info!("object speed updated to {}", cfg.object_speed);
                        let _ = socket.emit("config-update", &cfg);
                    }
                    Err(e) => warn!("{e}"),
                }
            }
        },
    );
}

// ─── Main ─────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tdoa_backend=info,socketioxide=warn".into()),
        )
        .init();

    info!("📡 TDOA Positioning Backend starting...");

    let stations = Arc::new(load_stations().expect("invalid TDOA_STATIONS geometry"));
    info!(
        "station grid: {} stations, reference '{}'",
        stations.len(),
        stations.reference().id
    );

    let config_url = Arc::new(
        std::env::var("TDOA_CONFIG_URL").unwrap_or_else(|_| "http://localhost:4002".to_string()),
    );

    // Report the external service's current setting once at startup. The
    // solver's propagation speed is a fixed constant and stays untouched.
    match config_client::fetch_config(&config_url).await {
        Ok(cfg) => info!("config service reports objectSpeed={}", cfg.object_speed),
        Err(e) => warn!("{e} (continuing without it)"),
    }

    // Build Socket.IO layer
    let (socket_layer, io) = SocketIo::builder().build_layer();

    let url_sock = config_url.clone();
    io.ns("/", move |socket: SocketRef| {
        on_connect(socket, url_sock.clone());
    });

    // Solve pipeline: event hub → bounded channel → broadcast task
    let (sink, position_rx) = ChannelSink::new(64);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(event_hub::run(
        EventHubConfig::default(),
        stations,
        sink,
        shutdown_rx,
    ));
    tokio::spawn(run_broadcast(position_rx, io.clone()));

    // CORS — allow all origins (parity with the rest of the suite)
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build Axum router
    let app = Router::new()
        .route("/health", get(|| async { "tdoa-backend ok" }))
        .route("/sync", get(time_sync))
        .layer(socket_layer)
        .layer(cors);

    let port = std::env::var("PORT").unwrap_or_else(|_| "3001".to_string());
    let addr = format!("0.0.0.0:{port}");
    info!("🚀 Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        })
        .await
        .unwrap();
}
