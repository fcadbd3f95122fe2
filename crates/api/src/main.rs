use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use boardwright_core::generation::TemplateEnhancer;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use boardwright_api::background::eviction;
use boardwright_api::config::ServerConfig;
use boardwright_api::router::build_app_router;
use boardwright_api::state::{image_generator_from_config, scene_enricher_from_config, AppState};
use boardwright_events::{EventPersistence, TracingSink};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = ServerConfig::from_env();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "boardwright_api=debug,boardwright_pipeline=debug,tower_http=debug".into()
            }),
        )
        .with(config.log_json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!config.log_json).then(tracing_subscriber::fmt::layer))
        .init();

    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Generation backends ---
    let generator = image_generator_from_config(&config);
    let enricher = scene_enricher_from_config(&config);
    let state = AppState::new(
        config.clone(),
        generator,
        Arc::new(TemplateEnhancer),
        enricher,
    );
    tracing::info!(
        max_concurrent = config.pipeline.max_concurrent_generations,
        "Build pipeline ready"
    );

    // Spawn event persistence (logs finished frames and storyboards).
    let persistence_handle = tokio::spawn(EventPersistence::run(
        Arc::new(TracingSink),
        state.event_bus.subscribe(),
    ));

    // Spawn the eviction sweeper.
    let eviction_cancel = CancellationToken::new();
    let eviction_handle = tokio::spawn(eviction::run(
        Arc::clone(&state.store),
        config.storyboard_ttl(),
        eviction::SWEEP_INTERVAL,
        eviction_cancel.clone(),
    ));

    tracing::info!("Background services started (event persistence, eviction)");

    let app = build_app_router(state);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    eviction_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), eviction_handle).await;
    tracing::info!("Eviction job stopped");

    // In-flight builds still hold the event bus, so persistence may not see
    // the channel close; give it a bounded window to drain.
    let _ = tokio::time::timeout(Duration::from_secs(5), persistence_handle).await;
    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
