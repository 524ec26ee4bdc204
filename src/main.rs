
pub mod aggregator;
pub mod config;
pub mod export;
pub mod state;
pub mod sync;

mod ui;

use {
    config::{bootstrap, CONFIG_FILE},
    state::DashboardState,
    std::{path::Path, sync::Arc},
    sync::{sync_scheduler_task, ClickDealerClient, TrackerApi, SYNC_INTERVAL},
    tokio::sync::{watch, RwLock},
};

#[tokio::main]
pub async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Initialize logger
    // Write logs to stderr (will be suppressed when UI enters alternate screen)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    // Log startup information (before UI starts to avoid overlay)
    log::info!("🚀 Starting LeadFlow...");

    let configured = match bootstrap(Path::new(CONFIG_FILE))? {
        Some(config) => {
            log::info!("📊 Configuration:");
            log::info!("   Affiliate ID: {}", config.affiliate_id);
            log::info!("   API Endpoint: {}", config.api_endpoint);
            log::info!("   API Key: {}", config.masked_key());
            Some(config)
        }
        None => {
            log::warn!("⚠️  No configuration found - running in setup mode");
            log::warn!("   Set CLICKDEALER_API_KEY and CLICKDEALER_AFFILIATE_ID (or create {})", CONFIG_FILE);
            None
        }
    };

    // Create shared state
    let state = Arc::new(RwLock::new(DashboardState::new(configured.is_some())));

    // Syncing starts live whenever credentials are available; the UI can
    // pause and resume it through this channel
    let (live_tx, live_rx) = watch::channel(configured.is_some());
    if configured.is_some() {
        state.write().await.set_live(true);
    }

    // Spawn background sync scheduler
    if let Some(config) = configured {
        let source: Arc<dyn TrackerApi + Send + Sync> = Arc::new(ClickDealerClient::new(config)?);
        let state_for_sync = state.clone();
        tokio::spawn(async move {
            sync_scheduler_task(source, state_for_sync, live_rx, SYNC_INTERVAL).await;
        });
    }

    log::info!("✅ Dashboard ready, starting terminal UI...");

    // Run the UI in the foreground; quitting it shuts everything down
    if let Err(e) = ui::run_ui(state, live_tx).await {
        log::error!("UI error: {}", e);
        return Err(e);
    }

    log::info!("👋 LeadFlow shut down");
    Ok(())
}
