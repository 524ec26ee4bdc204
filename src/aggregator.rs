//! Derived statistics and the per-sub-ID performance report
//!
//! Pure functions over the click/lead collections: nothing here mutates
//! state or touches the network, so recomputation is safe on every store
//! mutation or filter change.

use {
    crate::state::{ClickEvent, LeadEvent, LeadStatus, SubIdFilter},
    std::collections::HashSet,
};

/// Headline statistics across the (optionally filtered) collections
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedStats {
    pub total_clicks: usize,
    pub total_leads: usize,
    /// Sum of payout over approved leads only
    pub total_revenue: f64,
    /// Leads / clicks as a percentage; 0 when there are no clicks
    pub conversion_rate: f64,
    pub approved_leads: usize,
    pub pending_leads: usize,
    pub rejected_leads: usize,
}

/// One row of the per-sub-ID report, sorted descending by revenue
#[derive(Debug, Clone, PartialEq)]
pub struct SubIdReportRow {
    pub sub_id: String,
    pub clicks: usize,
    pub leads: usize,
    pub approved: usize,
    /// Approved payout sum for this sub ID
    pub revenue: f64,
    pub conversion_rate: f64,
}

/// Derive statistics and the sub ID report in one pass.
///
/// The statistics honor `filter`; the report is always computed over the
/// full collections so every sub ID stays visible while drilling down.
pub fn aggregate(
    clicks: &[ClickEvent],
    leads: &[LeadEvent],
    filter: &SubIdFilter,
) -> (DerivedStats, Vec<SubIdReportRow>) {
    (derive_stats(clicks, leads, filter), sub_id_report(clicks, leads))
}

/// Compute [`DerivedStats`] over the records matching `filter`.
pub fn derive_stats(
    clicks: &[ClickEvent],
    leads: &[LeadEvent],
    filter: &SubIdFilter,
) -> DerivedStats {
    let total_clicks = clicks.iter().filter(|c| filter.matches(&c.sub_id)).count();

    let mut total_leads = 0;
    let mut approved_leads = 0;
    let mut pending_leads = 0;
    let mut rejected_leads = 0;
    let mut total_revenue = 0.0;

    for lead in leads.iter().filter(|l| filter.matches(&l.sub_id)) {
        total_leads += 1;
        match lead.status {
            LeadStatus::Approved => {
                approved_leads += 1;
                total_revenue += lead.payout;
            }
            LeadStatus::Pending => pending_leads += 1,
            LeadStatus::Rejected => rejected_leads += 1,
        }
    }

    DerivedStats {
        total_clicks,
        total_leads,
        total_revenue,
        conversion_rate: conversion_rate(total_leads, total_clicks),
        approved_leads,
        pending_leads,
        rejected_leads,
    }
}

/// Build the per-sub-ID report over the full (unfiltered) collections.
///
/// The row set covers every sub ID observed in either collection; a sub ID
/// with leads but no clicks (or the reverse) still gets a row with the
/// missing side at zero. Rows sort descending by revenue; the sort is
/// stable, so revenue ties keep first-appearance order.
pub fn sub_id_report(clicks: &[ClickEvent], leads: &[LeadEvent]) -> Vec<SubIdReportRow> {
    let mut rows: Vec<SubIdReportRow> = observed_sub_ids(clicks, leads)
        .into_iter()
        .map(|sub_id| {
            let click_count = clicks.iter().filter(|c| c.sub_id == sub_id).count();
            let mut lead_count = 0;
            let mut approved = 0;
            let mut revenue = 0.0;

            for lead in leads.iter().filter(|l| l.sub_id == sub_id) {
                lead_count += 1;
                if lead.status == LeadStatus::Approved {
                    approved += 1;
                    revenue += lead.payout;
                }
            }

            SubIdReportRow {
                conversion_rate: conversion_rate(lead_count, click_count),
                sub_id,
                clicks: click_count,
                leads: lead_count,
                approved,
                revenue,
            }
        })
        .collect();

    rows.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
    rows
}

/// Distinct sub IDs across both collections, in first-appearance order
/// (clicks scanned before leads).
pub fn observed_sub_ids(clicks: &[ClickEvent], leads: &[LeadEvent]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut sub_ids = Vec::new();

    let from_clicks = clicks.iter().map(|c| c.sub_id.as_str());
    let from_leads = leads.iter().map(|l| l.sub_id.as_str());

    for sub_id in from_clicks.chain(from_leads) {
        if seen.insert(sub_id) {
            sub_ids.push(sub_id.to_string());
        }
    }

    sub_ids
}

fn conversion_rate(leads: usize, clicks: usize) -> f64 {
    if clicks == 0 {
        0.0
    } else {
        (leads as f64 / clicks as f64) * 100.0
    }
}
