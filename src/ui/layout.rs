use {
    crate::aggregator::{self, DerivedStats, SubIdReportRow},
    crate::state::{ClickEvent, DashboardState, LeadEvent, LeadStatus},
    crate::ui::renderer::{format_clock, format_rate, format_usd, truncate},
    ratatui::{
        layout::{Constraint, Direction, Layout as RatLayout, Rect},
        style::{Color, Modifier, Style},
        text::{Line, Span},
        widgets::{Block, Borders, Paragraph, Row, Table, Tabs},
        Frame,
    },
};

/// Content tabs across the main area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveTab {
    Overview,
    Clicks,
    Leads,
    SubIdReport,
}

impl ActiveTab {
    pub const ALL: [ActiveTab; 4] = [
        ActiveTab::Overview,
        ActiveTab::Clicks,
        ActiveTab::Leads,
        ActiveTab::SubIdReport,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            ActiveTab::Overview => "Overview",
            ActiveTab::Clicks => "Clicks",
            ActiveTab::Leads => "Leads",
            ActiveTab::SubIdReport => "Sub ID Report",
        }
    }

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|t| t == self).unwrap_or(0)
    }

    pub fn next(&self) -> ActiveTab {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn from_digit(c: char) -> Option<ActiveTab> {
        match c {
            '1' => Some(ActiveTab::Overview),
            '2' => Some(ActiveTab::Clicks),
            '3' => Some(ActiveTab::Leads),
            '4' => Some(ActiveTab::SubIdReport),
            _ => None,
        }
    }
}

/// Render the main UI layout
pub fn render_layout(f: &mut Frame, area: Rect, state: &DashboardState, tab: ActiveTab) {
    let (stats, report) = aggregator::aggregate(state.clicks(), state.leads(), state.filter());

    // Create layout sections
    let chunks = RatLayout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(5), // Stats cards
            Constraint::Length(3), // Tab bar
            Constraint::Min(0),    // Active tab content
            Constraint::Length(4), // Footer/Status
        ])
        .split(area);

    render_header(f, chunks[0]);
    render_stats_cards(f, chunks[1], state, &stats);
    render_tab_bar(f, chunks[2], tab);

    match tab {
        ActiveTab::Overview => render_overview(f, chunks[3], state),
        ActiveTab::Clicks => render_clicks_table(f, chunks[3], state),
        ActiveTab::Leads => render_leads_table(f, chunks[3], state, &stats),
        ActiveTab::SubIdReport => render_report_table(f, chunks[3], state, &report),
    }

    render_footer(f, chunks[4], state);
}

fn render_header(f: &mut Frame, area: Rect) {
    let header = Block::default().borders(Borders::ALL);

    let text = vec![Line::from(vec![
        Span::styled(
            "LeadFlow",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" - ClickDealer performance dashboard"),
    ])];

    f.render_widget(Paragraph::new(text).block(header), area);
}

fn render_stats_cards(f: &mut Frame, area: Rect, state: &DashboardState, stats: &DerivedStats) {
    let cards = RatLayout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ])
        .split(area);

    let feed_caption = if !state.is_configured() {
        Line::from(Span::styled("● Not configured", Style::default().fg(Color::Yellow)))
    } else if state.is_live() {
        Line::from(Span::styled("● Live from ClickDealer", Style::default().fg(Color::Green)))
    } else {
        Line::from(Span::styled("● Paused", Style::default().fg(Color::DarkGray)))
    };

    render_card(
        f,
        cards[0],
        "Total Clicks",
        stats.total_clicks.to_string(),
        feed_caption,
        Color::Cyan,
    );
    render_card(
        f,
        cards[1],
        "Total Leads",
        stats.total_leads.to_string(),
        Line::from(vec![
            Span::styled(format!("{} approved", stats.approved_leads), Style::default().fg(Color::Green)),
            Span::styled(" • ", Style::default().fg(Color::DarkGray)),
            Span::styled(format!("{} pending", stats.pending_leads), Style::default().fg(Color::Yellow)),
        ]),
        Color::Blue,
    );
    render_card(
        f,
        cards[2],
        "Total Revenue",
        format_usd(stats.total_revenue),
        Line::from(Span::styled("From approved leads only", Style::default().fg(Color::DarkGray))),
        Color::Green,
    );
    render_card(
        f,
        cards[3],
        "Conversion Rate",
        format_rate(stats.conversion_rate),
        Line::from(Span::styled("Leads / Clicks ratio", Style::default().fg(Color::DarkGray))),
        Color::Yellow,
    );
}

fn render_card(f: &mut Frame, area: Rect, title: &str, value: String, caption: Line, color: Color) {
    let text = vec![
        Line::from(Span::styled(
            value,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        caption,
    ];

    let block = Block::default().borders(Borders::ALL).title(title);
    f.render_widget(Paragraph::new(text).block(block), area);
}

fn render_tab_bar(f: &mut Frame, area: Rect, tab: ActiveTab) {
    let titles: Vec<Line> = ActiveTab::ALL.iter().map(|t| Line::from(t.title())).collect();

    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL))
        .select(tab.index())
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));

    f.render_widget(tabs, area);
}

fn render_overview(f: &mut Frame, area: Rect, state: &DashboardState) {
    let halves = RatLayout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    render_recent_clicks(f, halves[0], state);
    render_recent_leads(f, halves[1], state);
}

fn filtered_clicks<'a>(state: &'a DashboardState) -> Vec<&'a ClickEvent> {
    state
        .clicks()
        .iter()
        .filter(|c| state.filter().matches(&c.sub_id))
        .collect()
}

fn filtered_leads<'a>(state: &'a DashboardState) -> Vec<&'a LeadEvent> {
    state
        .leads()
        .iter()
        .filter(|l| state.filter().matches(&l.sub_id))
        .collect()
}

fn empty_message(
    state: &DashboardState,
    waiting: &'static str,
    unconfigured: &'static str,
) -> &'static str {
    if state.is_configured() {
        waiting
    } else {
        unconfigured
    }
}

fn render_recent_clicks(f: &mut Frame, area: Rect, state: &DashboardState) {
    let clicks = filtered_clicks(state);
    let block = Block::default().borders(Borders::ALL).title("Recent Clicks");

    if clicks.is_empty() {
        let message = empty_message(state, "Waiting for clicks...", "Configure API to see data");
        f.render_widget(
            Paragraph::new(message).style(Style::default().fg(Color::DarkGray)).block(block),
            area,
        );
        return;
    }

    let header = Row::new(vec!["Sub ID", "Country", "Time"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = clicks
        .iter()
        .rev() // Show newest first
        .take(5)
        .map(|click| {
            Row::new(vec![
                click.sub_id.clone(),
                click.country.clone(),
                format_clock(click.timestamp),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(18),
        Constraint::Length(9),
        Constraint::Length(10),
    ];

    f.render_widget(Table::new(rows, widths).header(header).block(block), area);
}

fn render_recent_leads(f: &mut Frame, area: Rect, state: &DashboardState) {
    let leads = filtered_leads(state);
    let block = Block::default().borders(Borders::ALL).title("Recent Leads");

    if leads.is_empty() {
        let message = empty_message(state, "Waiting for leads...", "Configure API to see data");
        f.render_widget(
            Paragraph::new(message).style(Style::default().fg(Color::DarkGray)).block(block),
            area,
        );
        return;
    }

    let rows: Vec<Row> = leads
        .iter()
        .rev() // Show newest first
        .take(5)
        .map(|lead| {
            Row::new(vec![
                lead.sub_id.clone(),
                truncate(&lead.offer, 20),
                format_usd(lead.payout),
                lead.status.as_str().to_string(),
            ])
            .style(Style::default().fg(status_color(lead.status)))
        })
        .collect();

    let header = Row::new(vec!["Sub ID", "Offer", "Payout", "Status"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let widths = [
        Constraint::Length(16),
        Constraint::Length(22),
        Constraint::Length(10),
        Constraint::Length(10),
    ];

    f.render_widget(Table::new(rows, widths).header(header).block(block), area);
}

fn render_clicks_table(f: &mut Frame, area: Rect, state: &DashboardState) {
    let clicks = filtered_clicks(state);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Clicks ({})", clicks.len()));

    if clicks.is_empty() {
        let message =
            empty_message(state, "No clicks yet. Waiting for traffic...", "Configure API to see data");
        f.render_widget(
            Paragraph::new(message).style(Style::default().fg(Color::DarkGray)).block(block),
            area,
        );
        return;
    }

    let header = Row::new(vec!["Time", "Click ID", "Sub ID", "Country", "IP Address"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = clicks
        .iter()
        .rev() // Show newest first
        .take(50) // Limit to 50 rows
        .map(|click| {
            Row::new(vec![
                format_clock(click.timestamp),
                truncate(&click.id, 14),
                click.sub_id.clone(),
                click.country.clone(),
                click.ip.clone(),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(10),
        Constraint::Length(15),
        Constraint::Length(16),
        Constraint::Length(9),
        Constraint::Length(16),
    ];

    f.render_widget(Table::new(rows, widths).header(header).block(block), area);
}

fn render_leads_table(f: &mut Frame, area: Rect, state: &DashboardState, stats: &DerivedStats) {
    let leads = filtered_leads(state);
    let block = Block::default().borders(Borders::ALL).title(format!(
        "Leads ({} approved / {} pending / {} rejected)",
        stats.approved_leads, stats.pending_leads, stats.rejected_leads
    ));

    if leads.is_empty() {
        let message =
            empty_message(state, "No leads yet. Keep driving traffic...", "Configure API to see data");
        f.render_widget(
            Paragraph::new(message).style(Style::default().fg(Color::DarkGray)).block(block),
            area,
        );
        return;
    }

    let header = Row::new(vec!["Time", "Lead ID", "Sub ID", "Offer", "Country", "Payout", "Status"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = leads
        .iter()
        .rev() // Show newest first
        .take(50) // Limit to 50 rows
        .map(|lead| {
            Row::new(vec![
                format_clock(lead.timestamp),
                truncate(&lead.id, 14),
                lead.sub_id.clone(),
                truncate(&lead.offer, 24),
                lead.country.clone(),
                format_usd(lead.payout),
                lead.status.as_str().to_string(),
            ])
            .style(Style::default().fg(status_color(lead.status)))
        })
        .collect();

    let widths = [
        Constraint::Length(10),
        Constraint::Length(15),
        Constraint::Length(16),
        Constraint::Length(26),
        Constraint::Length(9),
        Constraint::Length(10),
        Constraint::Length(10),
    ];

    f.render_widget(Table::new(rows, widths).header(header).block(block), area);
}

fn render_report_table(f: &mut Frame, area: Rect, state: &DashboardState, report: &[SubIdReportRow]) {
    // The report always covers all traffic, independent of the active filter
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Sub ID Performance Report (all traffic)");

    if report.is_empty() {
        let message =
            empty_message(state, "No data yet. Start generating traffic.", "Configure API first");
        f.render_widget(
            Paragraph::new(message).style(Style::default().fg(Color::DarkGray)).block(block),
            area,
        );
        return;
    }

    let header = Row::new(vec!["Sub ID", "Clicks", "Leads", "Approved", "Revenue", "CR%"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = report
        .iter()
        .map(|row| {
            Row::new(vec![
                row.sub_id.clone(),
                row.clicks.to_string(),
                row.leads.to_string(),
                row.approved.to_string(),
                format_usd(row.revenue),
                format_rate(row.conversion_rate),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(20),
        Constraint::Length(8),
        Constraint::Length(8),
        Constraint::Length(10),
        Constraint::Length(12),
        Constraint::Length(8),
    ];

    f.render_widget(Table::new(rows, widths).header(header).block(block), area);
}

fn status_color(status: LeadStatus) -> Color {
    match status {
        LeadStatus::Approved => Color::Green,
        LeadStatus::Pending => Color::Yellow,
        LeadStatus::Rejected => Color::Red,
    }
}

fn render_footer(f: &mut Frame, area: Rect, state: &DashboardState) {
    let (live_label, live_color) = if !state.is_configured() {
        ("NOT CONFIGURED", Color::Red)
    } else if state.is_live() {
        ("LIVE", Color::Green)
    } else {
        ("PAUSED", Color::Yellow)
    };

    let synced = state
        .last_synced()
        .map(format_clock)
        .unwrap_or_else(|| "never".to_string());

    let mut status_line = vec![
        Span::styled("Status: ", Style::default().fg(Color::Cyan)),
        Span::styled(live_label, Style::default().fg(live_color).add_modifier(Modifier::BOLD)),
        Span::raw(" | "),
        Span::styled("Filter: ", Style::default().fg(Color::Cyan)),
        Span::raw(state.filter().label().to_string()),
        Span::raw(" | "),
        Span::styled("Synced: ", Style::default().fg(Color::Cyan)),
        Span::raw(synced),
    ];

    if let Some(path) = state.last_export() {
        status_line.push(Span::raw(" | "));
        status_line.push(Span::styled("Export: ", Style::default().fg(Color::Cyan)));
        status_line.push(Span::raw(path.to_string()));
    }

    let second_line = match state.last_error() {
        Some(error) => Line::from(Span::styled(
            format!("⚠ {}", error),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        None => Line::from(Span::styled(
            "q quit | Tab/1-4 switch | l live/pause | e export | f filter",
            Style::default().fg(Color::DarkGray),
        )),
    };

    let footer = Block::default().borders(Borders::ALL).title("Status");
    let text = vec![Line::from(status_line), second_line];

    f.render_widget(Paragraph::new(text).block(footer), area);
}
