use {
    crate::aggregator,
    crate::export,
    crate::state::{DashboardState, SubIdFilter},
    crate::ui::layout::{render_layout, ActiveTab},
    ratatui::{
        backend::CrosstermBackend,
        Terminal,
    },
    std::{
        path::Path,
        sync::Arc,
        time::Duration,
    },
    tokio::sync::{watch, RwLock},
};

/// Run the TUI event loop
///
/// Handles keyboard input and redraws on a fixed cadence. `live_tx` is
/// dropped when the loop exits, which is what stops the background sync
/// scheduler.
pub async fn run_ui(
    state: Arc<RwLock<DashboardState>>,
    live_tx: watch::Sender<bool>,
) -> Result<(), Box<dyn std::error::Error>> {
    // Setup terminal
    let stdout = std::io::stdout();
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Enable raw mode for keyboard input
    crossterm::terminal::enable_raw_mode()?;

    // Clear screen and enter alternate screen mode
    // This creates a separate screen buffer, isolating stdout from stderr logs
    crossterm::execute!(
        std::io::stdout(),
        crossterm::terminal::EnterAlternateScreen,
        crossterm::cursor::Hide
    )?;

    // Clear the terminal
    terminal.clear()?;

    // The data only changes every sync cycle, so a fixed refresh is plenty
    let poll_interval = Duration::from_millis(250);
    let mut active_tab = ActiveTab::Overview;

    loop {
        // Check for keyboard input (non-blocking)
        if crossterm::event::poll(poll_interval)? {
            if let crossterm::event::Event::Key(key) = crossterm::event::read()? {
                match key.code {
                    crossterm::event::KeyCode::Char('q') | crossterm::event::KeyCode::Esc => {
                        break;
                    }
                    crossterm::event::KeyCode::Tab => {
                        active_tab = active_tab.next();
                    }
                    crossterm::event::KeyCode::Char(c @ '1'..='4') => {
                        if let Some(tab) = ActiveTab::from_digit(c) {
                            active_tab = tab;
                        }
                    }
                    crossterm::event::KeyCode::Char('l') => {
                        toggle_live(&state, &live_tx).await;
                    }
                    crossterm::event::KeyCode::Char('e') => {
                        export_report(&state).await;
                    }
                    crossterm::event::KeyCode::Char('f') => {
                        cycle_filter(&state).await;
                    }
                    _ => {
                        // Other keys are ignored
                    }
                }
            }
        }

        // Render UI
        {
            let state = state.read().await;
            let area = terminal.size()?;
            terminal.draw(|f| {
                render_layout(f, area, &state, active_tab);
            })?;
        }
    }

    // Cleanup - restore terminal state
    crossterm::execute!(
        std::io::stdout(),
        crossterm::terminal::LeaveAlternateScreen,
        crossterm::cursor::Show
    )?;
    crossterm::terminal::disable_raw_mode()?;
    Ok(())
}

/// Flip the live flag and tell the scheduler. No-op while unconfigured.
async fn toggle_live(state: &Arc<RwLock<DashboardState>>, live_tx: &watch::Sender<bool>) {
    let mut state = state.write().await;

    if !state.is_configured() {
        log::debug!("Ignoring live toggle: no API configuration");
        return;
    }

    let live = !state.is_live();
    state.set_live(live);
    let _ = live_tx.send(live);
}

/// Write the sub ID report to a dated CSV next to the binary.
async fn export_report(state: &Arc<RwLock<DashboardState>>) {
    let filename = export::report_filename(chrono::Utc::now().date_naive());
    export_report_to(state, Path::new(&filename)).await;
}

/// Snapshot the report under a read lock, write the file with no lock
/// held, then take the write lock only to record the outcome.
async fn export_report_to(state: &Arc<RwLock<DashboardState>>, path: &Path) {
    let report = {
        let state = state.read().await;
        aggregator::sub_id_report(state.clicks(), state.leads())
    };

    let outcome = export::write_report_csv(&report, path);

    let mut state = state.write().await;
    match outcome {
        Ok(()) => state.record_export(path.display().to_string()),
        Err(e) => {
            log::error!("❌ Export failed: {}", e);
            state.record_error(format!("Export failed: {}", e));
        }
    }
}

/// Advance the filter: all traffic, then each observed sub ID in turn.
async fn cycle_filter(state: &Arc<RwLock<DashboardState>>) {
    let mut state = state.write().await;

    let sub_ids = aggregator::observed_sub_ids(state.clicks(), state.leads());
    let next = match state.filter() {
        SubIdFilter::All => match sub_ids.into_iter().next() {
            Some(first) => SubIdFilter::Sub(first),
            None => SubIdFilter::All,
        },
        SubIdFilter::Sub(current) => match sub_ids.iter().position(|s| s == current) {
            Some(i) if i + 1 < sub_ids.len() => SubIdFilter::Sub(sub_ids[i + 1].clone()),
            _ => SubIdFilter::All,
        },
    };

    state.set_filter(next);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{LeadEvent, LeadStatus};
    use chrono::{TimeZone, Utc};

    fn approved_lead(id: &str, sub_id: &str, payout: f64) -> LeadEvent {
        LeadEvent {
            id: id.to_string(),
            timestamp: Utc.timestamp_opt(1_700_000_100, 0).unwrap(),
            sub_id: sub_id.to_string(),
            click_id: None,
            country: "US".to_string(),
            payout,
            status: LeadStatus::Approved,
            offer: "Test Offer".to_string(),
        }
    }

    #[tokio::test]
    async fn test_export_writes_file_and_records_path() {
        let state = Arc::new(RwLock::new(DashboardState::new(true)));
        state.write().await.apply_sync(
            vec![approved_lead("l1", "email", 75.5)],
            None,
            Utc.timestamp_opt(1_700_000_200, 0).unwrap(),
        );

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subid_report.csv");
        export_report_to(&state, &path).await;

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("email"));

        // The lock must be free again once the export returns
        let state = state.try_read().expect("state lock released after export");
        assert_eq!(state.last_export(), Some(path.display().to_string().as_str()));
        assert_eq!(state.last_error(), None);
    }

    #[tokio::test]
    async fn test_export_failure_lands_in_error_banner() {
        let state = Arc::new(RwLock::new(DashboardState::new(true)));

        let path = Path::new("/nonexistent-dir/subid_report.csv");
        export_report_to(&state, path).await;

        let state = state.read().await;
        assert_eq!(state.last_export(), None);
        let error = state.last_error().expect("failed export must surface");
        assert!(error.starts_with("Export failed:"));
    }
}
