use chrono::{DateTime, Utc};

/// A single tracked click, normalized from the upstream API
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ClickEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub sub_id: String,
    pub country: String,
    pub user_agent: String,
    pub ip: String,
}

/// A single conversion/lead, normalized from the upstream API
///
/// Immutable once stored except for `status`, which the network may flip
/// between polls; a later sync with the same id overwrites the whole record.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LeadEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub sub_id: String,
    pub click_id: Option<String>,
    pub country: String,
    pub payout: f64,
    pub status: LeadStatus,
    pub offer: String,
}

/// Approval state of a lead
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    Pending,
    Approved,
    Rejected,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::Pending => "pending",
            LeadStatus::Approved => "approved",
            LeadStatus::Rejected => "rejected",
        }
    }

    /// Map an upstream status string to a known state.
    ///
    /// Only the exact strings "approved" and "rejected" are recognized;
    /// anything else (including unknown values like "refunded") is pending.
    pub fn from_upstream(raw: &str) -> Self {
        match raw {
            "approved" => LeadStatus::Approved,
            "rejected" => LeadStatus::Rejected,
            _ => LeadStatus::Pending,
        }
    }
}

/// Active sub ID filter for the derived statistics
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubIdFilter {
    #[default]
    All,
    Sub(String),
}

impl SubIdFilter {
    pub fn matches(&self, sub_id: &str) -> bool {
        match self {
            SubIdFilter::All => true,
            SubIdFilter::Sub(s) => s == sub_id,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            SubIdFilter::All => "all",
            SubIdFilter::Sub(s) => s.as_str(),
        }
    }
}

/// In-memory state for the dashboard: click/lead collections plus view flags
///
/// Shared as `Arc<RwLock<DashboardState>>` between the sync scheduler (writer)
/// and the UI/exporter (readers). All mutation goes through the named entry
/// points below; nothing else touches the collections.
pub struct DashboardState {
    /// Click events in first-seen order
    clicks: Vec<ClickEvent>,
    /// Lead events in first-seen order
    leads: Vec<LeadEvent>,
    /// Sub ID filter applied to the derived statistics
    filter: SubIdFilter,
    /// Whether the 30s polling loop is running
    live: bool,
    /// Whether API credentials are available (gates syncing)
    configured: bool,
    /// Completion time of the last applied sync cycle
    last_synced: Option<DateTime<Utc>>,
    /// Most recent sync/export failure, reduced to one message
    last_error: Option<String>,
    /// Path of the most recent CSV export
    last_export: Option<String>,
}

impl DashboardState {
    pub fn new(configured: bool) -> Self {
        Self {
            clicks: Vec::new(),
            leads: Vec::new(),
            filter: SubIdFilter::All,
            live: false,
            configured,
            last_synced: None,
            last_error: None,
            last_export: None,
        }
    }

    pub fn clicks(&self) -> &[ClickEvent] {
        &self.clicks
    }

    pub fn leads(&self) -> &[LeadEvent] {
        &self.leads
    }

    pub fn filter(&self) -> &SubIdFilter {
        &self.filter
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    pub fn last_synced(&self) -> Option<DateTime<Utc>> {
        self.last_synced
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_export(&self) -> Option<&str> {
        self.last_export.as_deref()
    }

    /// Apply one fetched sync cycle to the store.
    ///
    /// Records merge by id: a fetched record whose id is already present
    /// overwrites the stored one in place (status flips propagate without
    /// duplicating), unknown ids append in response order, and stored records
    /// absent from this response are retained. `clicks` is `None` when the
    /// clicks fetch failed for this cycle; the stored clicks then stay as-is.
    ///
    /// Clears the error banner and stamps `last_synced`; a partial-cycle
    /// condition can be recorded afterwards via [`record_error`].
    ///
    /// [`record_error`]: DashboardState::record_error
    pub fn apply_sync(
        &mut self,
        leads: Vec<LeadEvent>,
        clicks: Option<Vec<ClickEvent>>,
        synced_at: DateTime<Utc>,
    ) {
        for lead in leads {
            match self.leads.iter_mut().find(|l| l.id == lead.id) {
                Some(existing) => *existing = lead,
                None => self.leads.push(lead),
            }
        }

        if let Some(clicks) = clicks {
            for click in clicks {
                match self.clicks.iter_mut().find(|c| c.id == click.id) {
                    Some(existing) => *existing = click,
                    None => self.clicks.push(click),
                }
            }
        }

        self.last_synced = Some(synced_at);
        self.last_error = None;
    }

    /// Surface a failure in the UI banner. The collections are untouched.
    pub fn record_error(&mut self, message: String) {
        self.last_error = Some(message);
    }

    pub fn set_live(&mut self, live: bool) {
        self.live = live;
    }

    pub fn set_filter(&mut self, filter: SubIdFilter) {
        self.filter = filter;
    }

    pub fn record_export(&mut self, path: String) {
        self.last_export = Some(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn make_click(id: &str, sub_id: &str) -> ClickEvent {
        ClickEvent {
            id: id.to_string(),
            timestamp: ts(1_700_000_000),
            sub_id: sub_id.to_string(),
            country: "US".to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            ip: "203.0.113.9".to_string(),
        }
    }

    fn make_lead(id: &str, sub_id: &str, status: LeadStatus, payout: f64) -> LeadEvent {
        LeadEvent {
            id: id.to_string(),
            timestamp: ts(1_700_000_100),
            sub_id: sub_id.to_string(),
            click_id: None,
            country: "US".to_string(),
            payout,
            status,
            offer: "Test Offer".to_string(),
        }
    }

    #[test]
    fn test_apply_sync_appends_in_response_order() {
        let mut state = DashboardState::new(true);

        state.apply_sync(
            vec![
                make_lead("l1", "a", LeadStatus::Pending, 5.0),
                make_lead("l2", "b", LeadStatus::Approved, 10.0),
            ],
            Some(vec![make_click("c1", "a"), make_click("c2", "b")]),
            ts(1_700_000_200),
        );

        assert_eq!(state.leads().len(), 2);
        assert_eq!(state.clicks().len(), 2);
        assert_eq!(state.leads()[0].id, "l1");
        assert_eq!(state.clicks()[1].id, "c2");
        assert_eq!(state.last_synced(), Some(ts(1_700_000_200)));
    }

    #[test]
    fn test_apply_sync_merges_by_id_without_duplicating() {
        let mut state = DashboardState::new(true);
        state.apply_sync(
            vec![make_lead("l1", "a", LeadStatus::Pending, 5.0)],
            None,
            ts(1_700_000_200),
        );

        // Same id arrives again with a flipped status
        state.apply_sync(
            vec![make_lead("l1", "a", LeadStatus::Approved, 5.0)],
            None,
            ts(1_700_000_300),
        );

        assert_eq!(state.leads().len(), 1);
        assert_eq!(state.leads()[0].status, LeadStatus::Approved);
    }

    #[test]
    fn test_apply_sync_retains_records_missing_from_response() {
        let mut state = DashboardState::new(true);
        state.apply_sync(
            vec![make_lead("l1", "a", LeadStatus::Approved, 25.0)],
            Some(vec![make_click("c1", "a")]),
            ts(1_700_000_200),
        );

        // Next response window no longer contains l1 or c1
        state.apply_sync(
            vec![make_lead("l2", "b", LeadStatus::Pending, 3.0)],
            Some(vec![make_click("c2", "b")]),
            ts(1_700_000_300),
        );

        assert_eq!(state.leads().len(), 2);
        assert_eq!(state.clicks().len(), 2);
        assert_eq!(state.leads()[0].id, "l1");
        assert_eq!(state.leads()[0].status, LeadStatus::Approved);
    }

    #[test]
    fn test_apply_sync_with_failed_clicks_keeps_previous_clicks() {
        let mut state = DashboardState::new(true);
        state.apply_sync(
            vec![],
            Some(vec![make_click("c1", "a")]),
            ts(1_700_000_200),
        );

        state.apply_sync(
            vec![make_lead("l1", "a", LeadStatus::Pending, 1.0)],
            None,
            ts(1_700_000_300),
        );

        assert_eq!(state.clicks().len(), 1);
        assert_eq!(state.leads().len(), 1);
        assert_eq!(state.last_synced(), Some(ts(1_700_000_300)));
    }

    #[test]
    fn test_apply_sync_clears_error_banner() {
        let mut state = DashboardState::new(true);
        state.record_error("API Error: 500".to_string());
        assert_eq!(state.last_error(), Some("API Error: 500"));

        state.apply_sync(vec![], None, ts(1_700_000_200));
        assert_eq!(state.last_error(), None);
    }

    // There is no deletion entry point; reconfiguring restarts the
    // process, and the fresh store starts from nothing.
    #[test]
    fn test_fresh_state_starts_empty() {
        let state = DashboardState::new(false);

        assert!(state.clicks().is_empty());
        assert!(state.leads().is_empty());
        assert_eq!(state.filter(), &SubIdFilter::All);
        assert!(!state.is_live());
        assert_eq!(state.last_synced(), None);
        assert_eq!(state.last_error(), None);
        assert_eq!(state.last_export(), None);
    }

    #[test]
    fn test_status_from_upstream_is_exact_match() {
        assert_eq!(LeadStatus::from_upstream("approved"), LeadStatus::Approved);
        assert_eq!(LeadStatus::from_upstream("rejected"), LeadStatus::Rejected);
        assert_eq!(LeadStatus::from_upstream("refunded"), LeadStatus::Pending);
        assert_eq!(LeadStatus::from_upstream("Approved"), LeadStatus::Pending);
        assert_eq!(LeadStatus::from_upstream(""), LeadStatus::Pending);
    }

    #[test]
    fn test_filter_matching() {
        let all = SubIdFilter::All;
        let sub = SubIdFilter::Sub("promo1".to_string());

        assert!(all.matches("anything"));
        assert!(sub.matches("promo1"));
        assert!(!sub.matches("promo2"));
        assert_eq!(all.label(), "all");
        assert_eq!(sub.label(), "promo1");
    }
}
