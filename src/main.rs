//! disaster-hub server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use disaster_hub::api;
use disaster_hub::app_state::AppState;
use disaster_hub::config::{HubConfig, LogFormat};
use disaster_hub::hub::EventHub;
use disaster_hub::location::{
    ChainGeocoder, GazetteerExtractor, GazetteerGeocoder, Geocoder, LocationResolver,
    NominatimGeocoder,
};
use disaster_hub::persistence::{DisasterStorage, InMemoryStorage, PostgresStorage};

const GEOCODER_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = HubConfig::from_env().context("loading configuration")?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    tracing::info!(addr = %config.listen_addr, "starting disaster-hub");

    // Storage backend
    let storage: Arc<dyn DisasterStorage> = match config.postgres_url() {
        Some(url) => Arc::new(
            PostgresStorage::connect(
                url,
                config.database_max_connections,
                config.database_connect_timeout(),
            )
            .await
            .context("connecting to postgres")?,
        ),
        None => {
            tracing::warn!("no database configured, using in-memory storage");
            Arc::new(InMemoryStorage::new())
        }
    };

    // Location resolver: gazetteer first, then Nominatim if configured
    let mut geocoder = ChainGeocoder::default().with(Arc::new(GazetteerGeocoder::new()));
    if let Some(url) = config.nominatim_url.as_deref() {
        let nominatim: Arc<dyn Geocoder> = Arc::new(
            NominatimGeocoder::new(url, GEOCODER_TIMEOUT).context("building nominatim client")?,
        );
        geocoder = geocoder.with(nominatim);
        tracing::info!(url, "nominatim geocoding enabled");
    }
    let resolver = LocationResolver::new(
        Arc::new(GazetteerExtractor::new()),
        Arc::new(geocoder),
        config.extraction_min_confidence,
    );

    // Hub and application state
    let hub = EventHub::new(config.subscriber_buffer, config.monitoring_interval());
    let app_state = AppState::new(storage, resolver, hub.clone(), config.nearby_default_radius_km)
        .with_request_timeout(config.request_timeout());
    let app = api::build_app(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let stopped = hub.shutdown().await;
    tracing::info!(stopped, "monitoring sessions stopped, bye");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
