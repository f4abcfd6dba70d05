mod auth;
mod cache;
mod clock;
mod config;
mod error;
mod server;
mod spotify;

use anyhow::Result;
use cache::{ResponseCache, SEARCH_CACHE_CAPACITY, TRACK_CACHE_CAPACITY};
use clap::Parser;
use clock::{Clock, SystemClock};
use config::{Args, Config};
use server::AppState;
use spotify::Gateway;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn ttl(duration: std::time::Duration) -> Result<chrono::Duration> {
    chrono::Duration::from_std(duration).map_err(|e| anyhow::anyhow!("cache ttl out of range: {}", e))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tunesproxy=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_args(&args)?;
    tracing::info!("Loaded config: {:?}", config.credentials);

    let http = reqwest::Client::builder()
        .user_agent(concat!("tunesproxy/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // nothing is fetched here, the first request that needs a token gets one
    let tokens = Arc::new(auth::token_store(
        http.clone(),
        &config.credentials,
        clock.clone(),
    ));

    let state = AppState {
        gateway: Gateway::new(http, &config.api_url, tokens),
        search_cache: Arc::new(ResponseCache::new(
            "search",
            SEARCH_CACHE_CAPACITY,
            ttl(config.search_cache_ttl)?,
            clock.clone(),
        )),
        track_cache: Arc::new(ResponseCache::new(
            "track",
            TRACK_CACHE_CAPACITY,
            ttl(config.track_cache_ttl)?,
            clock,
        )),
        playlist_id: Arc::from(config.playlist_id.as_str()),
    };

    // Rate limiting: 10 requests per second per IP, burst of 30
    // SmartIpKeyExtractor checks x-forwarded-for and friends before falling back to peer ip
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(SmartIpKeyExtractor)
            .per_second(10)
            .burst_size(30)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Failed to build rate limiter config"))?,
    );
    let governor_limiter = governor_conf.limiter().clone();

    tokio::spawn(async move {
        loop {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            governor_limiter.retain_recent();
        }
    });

    if config.allowed_origins.is_empty() {
        tracing::warn!("ALLOWED_ORIGINS not set, accepting requests from any origin");
    }

    // cors outermost so preflights and 429s still carry the headers
    let app = server::router(state).layer(
        ServiceBuilder::new()
            .layer(server::cors_layer(&config.allowed_origins))
            .layer(GovernorLayer::new(governor_conf)),
    );

    // TcpListener::bind takes ToSocketAddrs so "localhost" resolves fine
    let bind_addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Listening on http://{}", bind_addr);
    tracing::info!("Playlist: {}", config.playlist_id);

    // connect info so the rate limiter has a peer ip to fall back on
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
