//! Report Binary - One-Shot Sub ID Export
//!
//! Fetches the current conversions and clicks from ClickDealer, prints the
//! per-sub-ID performance report, and writes it to a CSV file. No terminal
//! UI - suitable for cron jobs and shell pipelines.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin report [output.csv]
//! ```
//!
//! The output path defaults to `clickdealer-report-YYYY-MM-DD.csv` in the
//! working directory.
//!
//! ## Environment Variables
//!
//! - CLICKDEALER_API_KEY - API key for the ClickDealer reporting API
//! - CLICKDEALER_AFFILIATE_ID - Affiliate account id
//! - CLICKDEALER_API_ENDPOINT - API base URL (default: https://api.clickdealer.com/api/v1)
//! - RUST_LOG - Logging level (optional, default: info)

use leadflow::aggregator;
use leadflow::config::{bootstrap, CONFIG_FILE};
use leadflow::export;
use leadflow::state::DashboardState;
use leadflow::sync::{run_sync_cycle, ClickDealerClient, TrackerApi};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = bootstrap(Path::new(CONFIG_FILE))?
        .ok_or("No configuration: set CLICKDEALER_API_KEY and CLICKDEALER_AFFILIATE_ID")?;

    log::info!("📊 Fetching report for affiliate {}...", config.affiliate_id);

    let source: Arc<dyn TrackerApi + Send + Sync> = Arc::new(ClickDealerClient::new(config)?);
    let state = Arc::new(RwLock::new(DashboardState::new(true)));

    run_sync_cycle(&source, &state).await?;

    let state = state.read().await;
    if let Some(warning) = state.last_error() {
        log::warn!("⚠️  {}", warning);
    }

    let stats = aggregator::derive_stats(state.clicks(), state.leads(), state.filter());
    let report = aggregator::sub_id_report(state.clicks(), state.leads());

    println!(
        "{} clicks / {} leads / ${:.2} revenue / {:.2}% conversion",
        stats.total_clicks, stats.total_leads, stats.total_revenue, stats.conversion_rate
    );
    println!();
    println!(
        "{:<20} {:>8} {:>8} {:>10} {:>12} {:>8}",
        "Sub ID", "Clicks", "Leads", "Approved", "Revenue", "CR%"
    );
    for row in &report {
        println!(
            "{:<20} {:>8} {:>8} {:>10} {:>12} {:>8}",
            row.sub_id,
            row.clicks,
            row.leads,
            row.approved,
            format!("${:.2}", row.revenue),
            format!("{:.2}%", row.conversion_rate)
        );
    }
    println!();

    let output: PathBuf = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(export::report_filename(chrono::Utc::now().date_naive())));

    export::write_report_csv(&report, &output)?;
    println!("Report written to {}", output.display());

    Ok(())
}
