use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use placepulse::api::{create_router, AppState};
use placepulse::cache::{CacheBackend, DemographicCache, JsonFileBackend, MemoryBackend};
use placepulse::config::Config;
use placepulse::upstream::{GeocodingApi, GeocodingClient, InsightsApi, InsightsClient};

#[derive(Parser)]
#[command(name = "placepulse")]
#[command(about = "Location-intelligence backend with demographic enrichment")]
struct Args {
    /// Keep the demographic cache in memory only, ignoring PULSE_CACHE_PATH
    #[arg(long)]
    no_cache: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "placepulse=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    // One session per process; the cache is wiped wholesale at session
    // boundaries by the deployment, never entry by entry.
    let session_id = Uuid::new_v4().to_string();

    let backend: Arc<dyn CacheBackend> = match (&config.cache.path, args.no_cache) {
        (Some(path), false) => Arc::new(JsonFileBackend::new(path)),
        _ => {
            tracing::info!("Demographic cache persistence disabled, using in-memory store");
            Arc::new(MemoryBackend::new())
        }
    };
    let cache = DemographicCache::new(backend, session_id.clone());

    if config.insights.api_key.is_none() {
        tracing::warn!(
            "PULSE_INSIGHTS_API_KEY is not set; upstream insight calls will likely be rejected"
        );
    }

    let insights: Arc<dyn InsightsApi> = Arc::new(InsightsClient::new(&config.insights)?);
    let geocoder: Arc<dyn GeocodingApi> = Arc::new(GeocodingClient::new(&config.geocoding)?);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, insights, geocoder, cache);

    tracing::info!(addr, session_id, "Starting placepulse");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, create_router(state)).await?;

    Ok(())
}
