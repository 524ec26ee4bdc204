//! ClickDealer API Integration
//!
//! Fetches conversion (lead) and click events from the ClickDealer REST API
//! and normalizes the loosely-typed upstream records into [`LeadEvent`] and
//! [`ClickEvent`] values.
//!
//! ## API Reference
//!
//! - `GET {endpoint}/conversions` → `{"conversions": [...]}`
//! - `GET {endpoint}/clicks` → `{"clicks": [...]}`
//!
//! Both requests are authenticated purely in headers: the API key as a
//! bearer token plus a JSON content type. The affiliate id is validated in
//! the configuration but never sent on the wire. Conversions are the
//! primary feed: a failed conversions fetch fails the whole sync cycle,
//! while a failed clicks fetch only degrades it (see the scheduler).

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use std::time::Duration;

use crate::config::TrackerConfig;
use crate::state::{ClickEvent, LeadEvent, LeadStatus};

#[derive(Debug)]
pub enum SyncError {
    Network(reqwest::Error),
    /// Upstream answered with a non-success HTTP status
    ApiStatus(u16),
    Parse(serde_json::Error),
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        SyncError::Network(err)
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Parse(err)
    }
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::Network(e) => write!(f, "Network error: {}", e),
            SyncError::ApiStatus(status) => write!(f, "API Error: {}", status),
            SyncError::Parse(e) => write!(f, "Response parse error: {}", e),
        }
    }
}

impl std::error::Error for SyncError {}

/// Source of tracker events for the sync scheduler
///
/// The dashboard only ever talks to the upstream through this trait, so
/// tests can substitute a scripted source without any HTTP.
#[async_trait]
pub trait TrackerApi: Send + Sync {
    /// Fetch all conversion events visible to the configured affiliate
    async fn fetch_conversions(&self) -> Result<Vec<LeadEvent>, SyncError>;

    /// Fetch all click events visible to the configured affiliate
    async fn fetch_clicks(&self) -> Result<Vec<ClickEvent>, SyncError>;
}

/// HTTP client for the ClickDealer reporting API
pub struct ClickDealerClient {
    http: reqwest::Client,
    config: TrackerConfig,
}

impl ClickDealerClient {
    pub fn new(config: TrackerConfig) -> Result<Self, SyncError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { http, config })
    }

    /// Build a GET for a collection endpoint. Authentication lives entirely
    /// in headers; nothing identifying goes into the URL.
    fn request(&self, resource: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.config.api_endpoint.trim_end_matches('/'), resource);

        self.http
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
    }

    /// GET a collection endpoint and return the raw response body
    async fn fetch_body(&self, resource: &str) -> Result<String, SyncError> {
        let response = self.request(resource).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::ApiStatus(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl TrackerApi for ClickDealerClient {
    async fn fetch_conversions(&self) -> Result<Vec<LeadEvent>, SyncError> {
        let body = self.fetch_body("conversions").await?;
        let fetched_at = Utc::now();

        let envelope: ConversionsEnvelope = serde_json::from_str(&body)?;
        let total = envelope.conversions.len();

        let leads: Vec<LeadEvent> = envelope
            .conversions
            .into_iter()
            .filter_map(|raw| normalize_conversion(raw, fetched_at))
            .collect();

        if leads.len() < total {
            log::debug!("⚠️  Dropped {} conversion records without an identifier", total - leads.len());
        }
        log::debug!("📥 Fetched {} conversions", leads.len());

        Ok(leads)
    }

    async fn fetch_clicks(&self) -> Result<Vec<ClickEvent>, SyncError> {
        let body = self.fetch_body("clicks").await?;
        let fetched_at = Utc::now();

        let envelope: ClicksEnvelope = serde_json::from_str(&body)?;
        let total = envelope.clicks.len();

        let clicks: Vec<ClickEvent> = envelope
            .clicks
            .into_iter()
            .filter_map(|raw| normalize_click(raw, fetched_at))
            .collect();

        if clicks.len() < total {
            log::debug!("⚠️  Dropped {} click records without an identifier", total - clicks.len());
        }
        log::debug!("📥 Fetched {} clicks", clicks.len());

        Ok(clicks)
    }
}

#[derive(Debug, Deserialize)]
struct ConversionsEnvelope {
    #[serde(default)]
    conversions: Vec<RawConversion>,
}

#[derive(Debug, Deserialize)]
struct ClicksEnvelope {
    #[serde(default)]
    clicks: Vec<RawClick>,
}

/// Conversion record as the API actually sends it: every field optional,
/// several known under two names
#[derive(Debug, Clone, Deserialize)]
struct RawConversion {
    conversion_id: Option<RawId>,
    id: Option<RawId>,
    timestamp: Option<RawTimestamp>,
    created_at: Option<RawTimestamp>,
    sub_id: Option<String>,
    sub1: Option<String>,
    click_id: Option<RawId>,
    country: Option<String>,
    payout: Option<RawAmount>,
    revenue: Option<RawAmount>,
    status: Option<String>,
    offer_name: Option<String>,
    campaign_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawClick {
    click_id: Option<RawId>,
    id: Option<RawId>,
    timestamp: Option<RawTimestamp>,
    created_at: Option<RawTimestamp>,
    sub_id: Option<String>,
    sub1: Option<String>,
    country: Option<String>,
    user_agent: Option<String>,
    ip_address: Option<String>,
    ip: Option<String>,
}

/// Identifier that may arrive as a string or a bare number
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

impl RawId {
    fn into_non_empty(self) -> Option<String> {
        match self {
            RawId::Number(n) => Some(n.to_string()),
            RawId::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
        }
    }
}

/// Timestamp that may arrive as epoch seconds or a datetime string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Epoch(i64),
    Float(f64),
    Text(String),
}

/// Monetary amount that may arrive as a number or a numeric string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Number(f64),
    Text(String),
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Resolve an event timestamp, falling back to the fetch time when the
/// field is missing or unparseable
fn parse_event_timestamp(raw: Option<RawTimestamp>, fallback: DateTime<Utc>) -> DateTime<Utc> {
    match raw {
        Some(RawTimestamp::Epoch(secs)) => DateTime::from_timestamp(secs, 0).unwrap_or(fallback),
        Some(RawTimestamp::Float(secs)) => DateTime::from_timestamp(secs as i64, 0).unwrap_or(fallback),
        Some(RawTimestamp::Text(text)) => parse_timestamp_text(&text).unwrap_or(fallback),
        None => fallback,
    }
}

fn parse_timestamp_text(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    // Some tracker exports use a plain UTC datetime without an offset
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Parse a payout, treating anything non-numeric or negative as zero
fn parse_amount(raw: Option<RawAmount>) -> f64 {
    let value = match raw {
        Some(RawAmount::Number(n)) => n,
        Some(RawAmount::Text(text)) => text.trim().parse().unwrap_or(0.0),
        None => 0.0,
    };

    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

/// Normalize a raw conversion; `None` when the record carries no identifier
fn normalize_conversion(raw: RawConversion, fetched_at: DateTime<Utc>) -> Option<LeadEvent> {
    let id = raw
        .conversion_id
        .and_then(RawId::into_non_empty)
        .or_else(|| raw.id.and_then(RawId::into_non_empty))?;

    Some(LeadEvent {
        id,
        timestamp: parse_event_timestamp(raw.timestamp.or(raw.created_at), fetched_at),
        sub_id: non_empty(raw.sub_id)
            .or_else(|| non_empty(raw.sub1))
            .unwrap_or_else(|| "N/A".to_string()),
        click_id: raw.click_id.and_then(RawId::into_non_empty),
        country: non_empty(raw.country).unwrap_or_else(|| "Unknown".to_string()),
        payout: parse_amount(raw.payout.or(raw.revenue)),
        status: LeadStatus::from_upstream(raw.status.as_deref().unwrap_or("")),
        offer: non_empty(raw.offer_name)
            .or_else(|| non_empty(raw.campaign_name))
            .unwrap_or_else(|| "Unknown Offer".to_string()),
    })
}

/// Normalize a raw click; `None` when the record carries no identifier
fn normalize_click(raw: RawClick, fetched_at: DateTime<Utc>) -> Option<ClickEvent> {
    let id = raw
        .click_id
        .and_then(RawId::into_non_empty)
        .or_else(|| raw.id.and_then(RawId::into_non_empty))?;

    Some(ClickEvent {
        id,
        timestamp: parse_event_timestamp(raw.timestamp.or(raw.created_at), fetched_at),
        sub_id: non_empty(raw.sub_id)
            .or_else(|| non_empty(raw.sub1))
            .unwrap_or_else(|| "N/A".to_string()),
        country: non_empty(raw.country).unwrap_or_else(|| "Unknown".to_string()),
        user_agent: non_empty(raw.user_agent).unwrap_or_else(|| "Unknown".to_string()),
        ip: non_empty(raw.ip_address)
            .or_else(|| non_empty(raw.ip))
            .unwrap_or_else(|| "0.0.0.0".to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fetch_time() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-06-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn conversion_from(value: serde_json::Value) -> RawConversion {
        serde_json::from_value(value).unwrap()
    }

    fn click_from(value: serde_json::Value) -> RawClick {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_conversion_prefers_primary_fields() {
        let raw = conversion_from(json!({
            "conversion_id": "conv-1",
            "id": "other",
            "timestamp": "2024-05-30T08:15:00Z",
            "created_at": "2024-01-01T00:00:00Z",
            "sub_id": "fb_ads",
            "sub1": "ignored",
            "click_id": "clk-9",
            "country": "DE",
            "payout": 12.5,
            "revenue": 99.0,
            "status": "approved",
            "offer_name": "Sweeps DE",
            "campaign_name": "ignored"
        }));

        let lead = normalize_conversion(raw, fetch_time()).unwrap();
        assert_eq!(lead.id, "conv-1");
        assert_eq!(lead.timestamp.to_rfc3339(), "2024-05-30T08:15:00+00:00");
        assert_eq!(lead.sub_id, "fb_ads");
        assert_eq!(lead.click_id.as_deref(), Some("clk-9"));
        assert_eq!(lead.country, "DE");
        assert_eq!(lead.payout, 12.5);
        assert_eq!(lead.status, LeadStatus::Approved);
        assert_eq!(lead.offer, "Sweeps DE");
    }

    #[test]
    fn test_conversion_falls_back_to_alternate_fields() {
        let raw = conversion_from(json!({
            "id": 4711,
            "created_at": 1717200000,
            "sub1": "email",
            "revenue": "7.25",
            "campaign_name": "Old Campaign"
        }));

        let lead = normalize_conversion(raw, fetch_time()).unwrap();
        assert_eq!(lead.id, "4711");
        assert_eq!(lead.timestamp.timestamp(), 1717200000);
        assert_eq!(lead.sub_id, "email");
        assert_eq!(lead.payout, 7.25);
        assert_eq!(lead.status, LeadStatus::Pending);
        assert_eq!(lead.offer, "Old Campaign");
    }

    #[test]
    fn test_conversion_defaults_for_missing_fields() {
        let raw = conversion_from(json!({ "conversion_id": "conv-min" }));

        let lead = normalize_conversion(raw, fetch_time()).unwrap();
        assert_eq!(lead.timestamp, fetch_time());
        assert_eq!(lead.sub_id, "N/A");
        assert_eq!(lead.click_id, None);
        assert_eq!(lead.country, "Unknown");
        assert_eq!(lead.payout, 0.0);
        assert_eq!(lead.status, LeadStatus::Pending);
        assert_eq!(lead.offer, "Unknown Offer");
    }

    #[test]
    fn test_records_without_identifier_are_dropped() {
        assert!(normalize_conversion(conversion_from(json!({})), fetch_time()).is_none());
        assert!(normalize_conversion(
            conversion_from(json!({ "conversion_id": "  ", "id": "" })),
            fetch_time()
        )
        .is_none());
        assert!(normalize_click(click_from(json!({ "country": "US" })), fetch_time()).is_none());
    }

    #[test]
    fn test_timestamp_variants() {
        let fallback = fetch_time();

        let iso = parse_event_timestamp(
            Some(RawTimestamp::Text("2024-05-30T08:15:00+02:00".to_string())),
            fallback,
        );
        assert_eq!(iso.to_rfc3339(), "2024-05-30T06:15:00+00:00");

        let plain = parse_event_timestamp(
            Some(RawTimestamp::Text("2024-05-30 08:15:00".to_string())),
            fallback,
        );
        assert_eq!(plain.to_rfc3339(), "2024-05-30T08:15:00+00:00");

        let epoch = parse_event_timestamp(Some(RawTimestamp::Epoch(1717056900)), fallback);
        assert_eq!(epoch.timestamp(), 1717056900);

        let garbage = parse_event_timestamp(Some(RawTimestamp::Text("yesterday".to_string())), fallback);
        assert_eq!(garbage, fallback);

        assert_eq!(parse_event_timestamp(None, fallback), fallback);
    }

    #[test]
    fn test_amount_variants() {
        assert_eq!(parse_amount(Some(RawAmount::Number(3.5))), 3.5);
        assert_eq!(parse_amount(Some(RawAmount::Text("12.34".to_string()))), 12.34);
        assert_eq!(parse_amount(Some(RawAmount::Text("free".to_string()))), 0.0);
        assert_eq!(parse_amount(Some(RawAmount::Number(-4.0))), 0.0);
        assert_eq!(parse_amount(Some(RawAmount::Text("NaN".to_string()))), 0.0);
        assert_eq!(parse_amount(None), 0.0);
    }

    #[test]
    fn test_click_normalization() {
        let raw = click_from(json!({
            "click_id": "clk-1",
            "timestamp": "2024-05-30 10:00:00",
            "sub_id": "banner_top",
            "country": "US",
            "user_agent": "Mozilla/5.0",
            "ip": "203.0.113.9"
        }));

        let click = normalize_click(raw, fetch_time()).unwrap();
        assert_eq!(click.id, "clk-1");
        assert_eq!(click.sub_id, "banner_top");
        assert_eq!(click.user_agent, "Mozilla/5.0");
        assert_eq!(click.ip, "203.0.113.9");

        let bare = normalize_click(click_from(json!({ "id": 88 })), fetch_time()).unwrap();
        assert_eq!(bare.id, "88");
        assert_eq!(bare.sub_id, "N/A");
        assert_eq!(bare.country, "Unknown");
        assert_eq!(bare.user_agent, "Unknown");
        assert_eq!(bare.ip, "0.0.0.0");
    }

    #[test]
    fn test_envelope_tolerates_missing_collection() {
        let conversions: ConversionsEnvelope = serde_json::from_str("{}").unwrap();
        assert!(conversions.conversions.is_empty());

        let clicks: ClicksEnvelope = serde_json::from_str(r#"{"clicks": []}"#).unwrap();
        assert!(clicks.clicks.is_empty());
    }

    #[test]
    fn test_requests_are_header_authenticated_only() {
        let config = TrackerConfig {
            api_key: "cd_live_0123456789abcdef".to_string(),
            affiliate_id: "777".to_string(),
            api_endpoint: "https://api.clickdealer.test/v2/".to_string(),
        };
        let client = ClickDealerClient::new(config).unwrap();

        let request = client.request("conversions").build().unwrap();

        // The affiliate id stays local: a bare URL, no query string
        assert_eq!(request.url().as_str(), "https://api.clickdealer.test/v2/conversions");
        assert_eq!(request.url().query(), None);
        assert_eq!(
            request.headers().get(reqwest::header::AUTHORIZATION).unwrap(),
            "Bearer cd_live_0123456789abcdef"
        );
        assert_eq!(
            request.headers().get(reqwest::header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[tokio::test]
    #[ignore] // Run only when testing with live API credentials
    async fn test_fetch_live_conversions() {
        dotenv::dotenv().ok();

        let config = TrackerConfig::from_env()
            .expect("CLICKDEALER_* variables must be set")
            .unwrap();
        let client = ClickDealerClient::new(config).unwrap();

        let leads = client.fetch_conversions().await.unwrap();
        println!("Fetched {} leads", leads.len());
    }
}
