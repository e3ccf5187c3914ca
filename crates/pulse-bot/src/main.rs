//! crypto-pulse bot
//!
//! Wires the engine to X, the LLM backends and the market data sources, runs
//! the action schedule and serves a small status API.

mod handlers;
mod scheduler;
mod state;
mod x;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use chrono::Utc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::LlmProvider;
use agent_runtime::{GeminiConfig, GeminiProvider, OllamaProvider};
use pulse_engine::{
    terms::load_terms, Account, CoinGeckoClient, Collaborators, DedupLedger, EngineConfig, GenerativeFallback,
    ItemId, LlmSentiment, MockPlatform, NewsSource, PulseAgent, RssFeed, SentimentAnalyzer, SocialPlatform,
    StubSentiment,
};

use crate::handlers::{health_check, status, trigger_action};
use crate::scheduler::ScheduleConfig;
use crate::state::AppState;
use crate::x::{XClient, XConfig};

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Gemini first, local Ollama as failover
async fn build_generator(config: &EngineConfig) -> GenerativeFallback {
    let mut providers: Vec<Box<dyn LlmProvider>> = Vec::new();

    match GeminiConfig::from_env().map(GeminiProvider::from_config) {
        Some(Ok(gemini)) => {
            tracing::info!("✓ Gemini configured");
            providers.push(Box::new(gemini));
        }
        Some(Err(e)) => tracing::warn!("⚠ Gemini disabled: {}", e),
        None => tracing::warn!("⚠ No GEMINI_API_KEY"),
    }

    if env_flag("OLLAMA_ENABLED", true) {
        match OllamaProvider::from_env() {
            Ok(ollama) => match ollama.health_check().await {
                Ok(true) => {
                    tracing::info!("✓ Connected to Ollama");
                    providers.push(Box::new(ollama));
                }
                Ok(false) | Err(_) => {
                    tracing::warn!("⚠ Ollama not available, skipping");
                    tracing::warn!("  Make sure Ollama is running: ollama serve");
                }
            },
            Err(e) => tracing::warn!("⚠ Ollama misconfigured: {}", e),
        }
    }

    if providers.is_empty() {
        tracing::warn!("⚠ No generative backend, static content only");
        return GenerativeFallback::disabled();
    }

    let safety = config.safety();
    if safety.filters_disabled() {
        tracing::info!("Content filtering disabled for all harm categories");
    }
    GenerativeFallback::from_chain(providers, safety, config.generation_timeout)
}

/// X, or the logging recorder when dry run is requested.
///
/// A missing token without dry run is a startup error.
fn build_platform(dry_run: bool, x: Option<XConfig>) -> anyhow::Result<(Arc<dyn SocialPlatform>, bool)> {
    if dry_run {
        tracing::warn!("⚠ Dry run: posts are logged, not published");
        let account = Account {
            id: ItemId::from("0"),
            handle: "dry_run".into(),
        };
        let recorder: Arc<dyn SocialPlatform> = Arc::new(MockPlatform::dry_run(account));
        return Ok((recorder, true));
    }

    let config = x.context("X_BEARER_TOKEN is not set (use PULSE_DRY_RUN=true to run without X)")?;
    let client: Arc<dyn SocialPlatform> = Arc::new(XClient::from_config(config).context("failed to build X client")?);
    Ok((client, false))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    let config = EngineConfig::from_env();
    let schedule = ScheduleConfig::from_env();

    // X credentials and identity are the only fatal startup dependencies
    let (platform, dry_run) = build_platform(env_flag("PULSE_DRY_RUN", false), XConfig::from_env())?;
    let account = platform.me().await.context("could not resolve bot account")?;
    tracing::info!("🤖 Bot account: @{} ({})", account.handle, account.id);

    let generator = Arc::new(build_generator(&config).await);

    let sentiment: Arc<dyn SentimentAnalyzer> = if generator.enabled() {
        Arc::new(LlmSentiment::new(generator.clone()))
    } else {
        tracing::warn!("⚠ Sentiment is a random stub; readings are flagged degraded");
        Arc::new(StubSentiment::new())
    };

    let news: Vec<Arc<dyn NewsSource>> = RssFeed::defaults(config.http_timeout)?
        .into_iter()
        .map(|feed| Arc::new(feed) as Arc<dyn NewsSource>)
        .collect();
    tracing::info!("Registered {} news feeds", news.len());

    let deps = Collaborators {
        platform,
        generator,
        prices: Arc::new(CoinGeckoClient::new(config.http_timeout)?),
        news,
        sentiment,
        terms: load_terms(&config.terms_path),
        ledger: Arc::new(DedupLedger::new()),
    };
    let agent = Arc::new(PulseAgent::new(account, deps, config));

    // Scheduler
    let tasks = scheduler::spawn(&agent, &schedule);

    // Build application state
    let state = AppState {
        agent,
        schedule: Arc::new(schedule),
        dry_run,
        started_at: Utc::now(),
    };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/api/status", get(status))
        .route("/api/actions/{name}", post(trigger_action))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(state);

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 crypto-pulse running, status on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health              - Health check");
    tracing::info!("  GET  /api/status          - Ledger size and last outcomes");
    tracing::info!("  POST /api/actions/{{name}}  - Run an action now");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for ctrl-c: {}", e);
            }
        })
        .await?;

    tracing::info!("Shutting down scheduler");
    for task in &tasks {
        task.abort();
    }
    futures::future::join_all(tasks).await;

    Ok(())
}
