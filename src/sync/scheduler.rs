//! Polling scheduler for background sync cycles
//!
//! Runs one sync cycle every [`SYNC_INTERVAL`] while the dashboard is live,
//! parks while it is paused, and fires an immediate cycle when syncing is
//! (re-)enabled. Pausing never cancels a cycle that is already in flight;
//! its results still apply.

use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tokio::time::{interval, Duration, MissedTickBehavior};

use super::client::{SyncError, TrackerApi};
use crate::state::DashboardState;

/// Time between sync cycles while live
pub const SYNC_INTERVAL: Duration = Duration::from_secs(30);

/// Run a single fetch-and-apply cycle against the shared state.
///
/// Conversions are fetched first and are mandatory: on failure nothing is
/// applied, the error lands in the banner and the cycle counts as failed.
/// A clicks failure only degrades the cycle: conversions still merge, the
/// sync timestamp still advances, and the partial condition is surfaced in
/// the banner afterwards.
pub async fn run_sync_cycle(
    source: &Arc<dyn TrackerApi + Send + Sync>,
    state: &Arc<RwLock<DashboardState>>,
) -> Result<(), SyncError> {
    let leads = match source.fetch_conversions().await {
        Ok(leads) => leads,
        Err(e) => {
            log::error!("❌ Sync cycle failed: {}", e);
            state.write().await.record_error(e.to_string());
            return Err(e);
        }
    };

    let (clicks, clicks_error) = match source.fetch_clicks().await {
        Ok(clicks) => (Some(clicks), None),
        Err(e) => {
            log::warn!("⚠️  Clicks fetch failed, applying conversions only: {}", e);
            (None, Some(e))
        }
    };

    let synced_at = chrono::Utc::now();
    {
        let mut state = state.write().await;
        let lead_count = leads.len();
        let click_count = clicks.as_ref().map(|c| c.len()).unwrap_or(0);

        state.apply_sync(leads, clicks, synced_at);
        if let Some(e) = clicks_error {
            state.record_error(format!("Clicks fetch failed: {}", e));
        }

        log::debug!(
            "✅ Sync cycle applied {} conversions / {} clicks ({} leads, {} clicks stored)",
            lead_count,
            click_count,
            state.leads().len(),
            state.clicks().len()
        );
    }

    Ok(())
}

/// Background sync loop, driven by the live/paused flag from the UI.
///
/// Each activation fires a cycle immediately (the interval's first tick
/// completes at once), then every `sync_interval`. A new tick is only
/// polled after the previous cycle finished, so cycles never overlap.
/// The task exits when the watch channel closes, which happens when the
/// UI shuts down.
pub async fn sync_scheduler_task(
    source: Arc<dyn TrackerApi + Send + Sync>,
    state: Arc<RwLock<DashboardState>>,
    mut live_rx: watch::Receiver<bool>,
    sync_interval: Duration,
) {
    log::info!("⏰ Starting sync scheduler (interval: {:?})", sync_interval);

    loop {
        // Park until the dashboard goes live
        while !*live_rx.borrow() {
            if live_rx.changed().await.is_err() {
                log::info!("🛑 Sync scheduler stopped (control channel closed)");
                return;
            }
        }

        log::info!("▶️  Sync enabled");

        let mut timer = interval(sync_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    let _ = run_sync_cycle(&source, &state).await;
                }
                changed = live_rx.changed() => {
                    if changed.is_err() {
                        log::info!("🛑 Sync scheduler stopped (control channel closed)");
                        return;
                    }
                    if !*live_rx.borrow() {
                        break;
                    }
                }
            }
        }

        log::info!("⏸️  Sync paused");
    }
}
