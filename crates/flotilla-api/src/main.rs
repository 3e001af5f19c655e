//! Flotilla API Server

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use flotilla_api::fleet::DevFleet;
use flotilla_api::{AppState, routes};
use flotilla_broadcast::Broadcaster;
use flotilla_config::FlotillaConfig;
use flotilla_db::{create_pool, run_migrations};
use flotilla_scaler::{AutoscalerController, ScalingSteps};
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const MAINTENANCE_PERIOD: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::var("FLOTILLA_CONFIG").ok();
    let config = FlotillaConfig::load(config_path.as_deref().map(Path::new))?;

    // Create database pool
    info!("Connecting to database...");
    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;
    info!("Database connected");

    // Create app state
    let state = AppState::new(pool, &config);

    // Change-feed pump: every observable store mutation fans out to the
    // connected observers.
    let broadcaster = Arc::new(Broadcaster::new(
        state.registry.clone(),
        Arc::new(state.gateway.clone()),
    ));
    let mut feed = state.store.subscribe();
    tokio::spawn(async move {
        loop {
            match feed.recv().await {
                Ok(event) => broadcaster.on_status_change(&[event]).await,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Change feed lagged, updates dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    // Autoscaler evaluation tick.
    let steps = ScalingSteps::from_config(&config.autoscaler.steps)?;
    let controller = AutoscalerController::new(
        state.queue.clone(),
        Arc::new(DevFleet::new()),
        steps,
        config.fleet.max_capacity,
    );
    let period = Duration::from_secs(config.autoscaler.evaluation_period_secs);
    info!(fleet = %config.fleet.name, period_secs = config.autoscaler.evaluation_period_secs, "Autoscaler started");
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(period);
        loop {
            tick.tick().await;
            if let Err(e) = controller.evaluate().await {
                warn!(error = %e, "Autoscaler evaluation failed");
            }
        }
    });

    // Maintenance sweep: expired connections and archive retention.
    let registry = state.registry.clone();
    let archive = state.archive.clone();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(MAINTENANCE_PERIOD);
        loop {
            tick.tick().await;
            if let Err(e) = registry.sweep_expired().await {
                warn!(error = %e, "Connection sweep failed");
            }
            if let Err(e) = archive.prune_expired(chrono::Utc::now()).await {
                warn!(error = %e, "Archive prune failed");
            }
        }
    });

    // Build router
    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // Start server
    info!("Starting server on {}", config.listen);
    let listener = TcpListener::bind(&config.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
