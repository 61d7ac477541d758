use anyhow::{Context, Result};
use std::sync::{Arc, Mutex};
use tracing::info;
use tracing_subscriber::EnvFilter;

// Import modules
mod backend;
mod constants;
mod error;
mod form;
mod geo;
mod legend;
mod markers;
mod overlay;
mod radio;
mod selection;
mod server;
mod session;
mod settings;
mod viewport;

use backend::BackendClient;
use constants::EVENT_CHANNEL_CAPACITY;
use server::{start_server, state::AppState};
use session::MapSession;
use settings::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("legendmap=info")),
        )
        .init();

    info!("🗺️  LegendMap v{} starting...", env!("CARGO_PKG_VERSION"));

    let config_path = Settings::config_path();
    let settings = Settings::load()
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    if !config_path.exists() {
        settings.save().context("Failed to write default config")?;
        info!("📝 Default config written to {}", config_path.display());
    }
    info!("⚙️  Backend: {}", settings.backend_url);
    info!("📻 Radio directory: {} ({})", settings.radio_directory_url, settings.radio_country);

    let client = BackendClient::new(&settings).context("Failed to build HTTP client")?;
    let session = MapSession::from_settings(&settings).context("Invalid home position in settings")?;
    let port = settings.port;

    let (event_sender, _event_receiver) = tokio::sync::broadcast::channel(EVENT_CHANNEL_CAPACITY);
    let app_state = AppState {
        session: Arc::new(Mutex::new(session)),
        client,
        settings: Arc::new(Mutex::new(settings)),
        event_sender,
    };

    // Startup loads run in the background; the page polls /api/markers after Reload
    let loader = app_state.clone();
    tokio::spawn(async move {
        loader.reload().await;
    });

    start_server(app_state, port).await?;

    Ok(())
}
