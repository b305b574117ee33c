use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod config;
mod error;
mod gemini;
mod pipeline;
mod storage;
mod tripo;

use api::AppState;
use config::Config;
use gemini::GeminiClient;
use storage::StorageService;
use tripo::TripoClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------
    // Logging
    // -----------------------------
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    // -----------------------------
    // Shared state / Dependencies
    // -----------------------------
    let http = config.http_client()?;
    let images = GeminiClient::new(
        http.clone(),
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
        config.gemini_base_url.clone(),
    );
    let models = TripoClient::new(http, config.tripo_api_key.clone(), &config.tripo_base_url)?;
    let storage = StorageService::new(&config.public_dir).await?;

    let state = AppState {
        images: Arc::new(images),
        models: Arc::new(models),
        storage,
    };

    let app = api::app(state);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr).await?;

    info!("HTTP listening on http://{addr}");
    info!(public_dir = %config.public_dir.display(), "serving static files");
    info!(model = %config.gemini_model, "image generation model");

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
