mod auth;
mod classifier;
mod gemini;
mod models;
mod parser;
mod prompts;
mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{fmt, EnvFilter};

use crate::auth::AuthService;
use crate::classifier::CraftClassifier;
use crate::gemini::GeminiClient;
use crate::routes::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Init tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let api_key = std::env::var("GEMINI_API_KEY").unwrap_or_else(|_| "DEMO_KEY".into());
    tracing::info!(
        "Using API key: {}...",
        &api_key[..std::cmp::min(10, api_key.len())]
    );

    // All shared services are constructed once here and injected into
    // handlers read-only; no lazy singletons.
    let state = AppState {
        gemini: Arc::new(GeminiClient::new(api_key)),
        classifier: Arc::new(CraftClassifier::from_env()),
        auth: AuthService::from_env(),
    };

    let app = routes::router(state).layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    );

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(5000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "🚀 Starting Craft Heritage AI Services API");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}
