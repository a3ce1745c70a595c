use axum::http::HeaderValue;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod constants;
mod error;
mod integrations;
mod models;
mod services;
mod websocket;

use config::Config;
use constants::API_VERSION;
use integrations::{BasenameApiClient, FarcasterClient, MintClient, PinataClient};
use services::{
    metadata::HttpMetadataSource,
    notification_store::RedisNotificationStore,
    onchain::{EthersCardContract, EthersEnsLookup, L2BasenameResolver},
    resolution_cache::{ResolutionCache, SystemClock},
    ActivityReader, NotificationService, RecipientResolver, WebhookService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cardcast_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!("Starting Cardcast Backend Server");
    tracing::info!("Environment: {}", config.environment);
    tracing::info!("API Version: {}", API_VERSION);

    // Initialize Redis
    let redis = redis::Client::open(config.redis_url.clone())?;
    let redis_manager = redis::aio::ConnectionManager::new(redis).await?;

    let app_state = build_state(config, redis_manager)?;

    // Start background services
    tokio::spawn(services::start_background_services(app_state.resolver.clone()));

    // Build router
    let addr: SocketAddr = format!("{}:{}", app_state.config.host, app_state.config.port).parse()?;
    let app = build_router(app_state);

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn resolver_cache(config: &Config) -> ResolutionCache {
    ResolutionCache::new(
        Arc::new(SystemClock),
        Duration::from_secs(config.resolver_cache_ttl_secs),
        config.resolver_cache_max_entries,
    )
}

fn build_state(
    config: Config,
    redis: redis::aio::ConnectionManager,
) -> anyhow::Result<api::AppState> {
    let l2_resolver = Arc::new(L2BasenameResolver::from_config(&config)?);

    let mut resolver = RecipientResolver::new(resolver_cache(&config))
        .with_basename_source(l2_resolver.clone());
    if let Some(url) = config.basename_api_url.clone() {
        tracing::info!("Basename API fallback enabled: {}", url);
        resolver = resolver.with_basename_source(Arc::new(BasenameApiClient::new(url)));
    }
    let resolver = resolver
        .with_farcaster(Arc::new(FarcasterClient::new(
            config.farcaster_api_url.clone(),
            config.neynar_api_key.clone(),
        )))
        .with_ens(Arc::new(EthersEnsLookup::from_config(&config)?));

    let basename_resolver =
        RecipientResolver::new(resolver_cache(&config)).with_basename_source(l2_resolver);

    let activity = ActivityReader::new(
        Arc::new(EthersCardContract::from_config(&config)?),
        config.ipfs_gateway_url.clone(),
    )
    .with_metadata(Arc::new(HttpMetadataSource::new(
        config.ipfs_gateway_url.clone(),
    )));

    let pinata = PinataClient::new(
        config.pinata_api_url.clone(),
        config.ipfs_gateway_url.clone(),
        config.pinata_jwt.clone(),
    );
    if !pinata.is_configured() {
        tracing::warn!("PINATA_JWT not set; card uploads are disabled");
    }

    let notifications = Arc::new(NotificationService::new(
        Arc::new(RedisNotificationStore::new(redis.clone())),
        config.app_url.clone(),
    ));

    Ok(api::AppState {
        mint: MintClient::new(config.mint_api_url.clone(), config.mint_api_key.clone()),
        pinata,
        resolver: Arc::new(resolver),
        basename_resolver: Arc::new(basename_resolver),
        activity: Arc::new(activity),
        webhooks: Arc::new(WebhookService::new(notifications.clone())),
        notifications,
        redis,
        config,
    })
}

fn build_router(state: api::AppState) -> Router {
    // CORS configuration
    let cors = cors_from_config(&state.config);

    Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        // Recipients
        .route(
            "/api/v1/recipients/resolve",
            get(api::recipients::resolve),
        )
        .route(
            "/api/resolve-basename",
            post(api::recipients::resolve_basename),
        )
        // Cards
        .route("/api/v1/cards/sent", get(api::cards::get_sent))
        .route("/api/v1/cards/received", get(api::cards::get_received))
        .route("/api/v1/cards/mint", post(api::cards::mint_card))
        .route(
            "/api/v1/cards/upload",
            post(api::cards::upload_card).layer(api::cards::upload_body_limit()),
        )
        // Mini-app webhook
        .route("/api/webhook", post(api::webhooks::receive))
        // WebSocket endpoints
        .route("/ws/recipients", get(websocket::recipients::handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_from_config(config: &Config) -> CorsLayer {
    let raw = config.cors_allowed_origins.trim();
    if raw.is_empty() || raw == "*" {
        return CorsLayer::very_permissive();
    }

    let allowed: Vec<HeaderValue> = raw
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<HeaderValue>().ok())
        .collect();

    if allowed.is_empty() {
        tracing::warn!("No valid CORS origins parsed; falling back to permissive");
        return CorsLayer::very_permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}
