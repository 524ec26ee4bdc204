//! CSV export of the per-sub-ID performance report
//!
//! Produces the same table the Sub ID tab renders: one row per sub ID with
//! click/lead counts, approved count, formatted revenue and conversion rate.

use {
    crate::aggregator::SubIdReportRow,
    chrono::NaiveDate,
    std::{io::Write, path::Path},
};

#[derive(Debug)]
pub enum ExportError {
    Csv(csv::Error),
    Io(std::io::Error),
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        ExportError::Csv(err)
    }
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::Io(err)
    }
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Csv(e) => write!(f, "CSV write error: {}", e),
            ExportError::Io(e) => write!(f, "Export I/O error: {}", e),
        }
    }
}

impl std::error::Error for ExportError {}

/// Column order matches the on-screen Sub ID report.
const REPORT_HEADER: [&str; 6] = ["Sub ID", "Clicks", "Leads", "Approved", "Revenue", "CR%"];

/// Write the report rows as CSV to any writer, header first.
///
/// Revenue renders as `$12.34` and conversion rate as `56.78%`; the csv
/// crate quotes fields as needed so sub IDs containing commas stay intact.
pub fn render_report_csv<W: Write>(rows: &[SubIdReportRow], writer: W) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(REPORT_HEADER)?;
    for row in rows {
        csv_writer.write_record(&[
            row.sub_id.clone(),
            row.clicks.to_string(),
            row.leads.to_string(),
            row.approved.to_string(),
            format!("${:.2}", row.revenue),
            format!("{:.2}%", row.conversion_rate),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Write the report to a file path, creating or truncating it.
pub fn write_report_csv(rows: &[SubIdReportRow], path: &Path) -> Result<(), ExportError> {
    let file = std::fs::File::create(path)?;
    render_report_csv(rows, file)?;
    log::info!("📄 Exported {} report rows to {}", rows.len(), path.display());
    Ok(())
}

/// Dated default filename: `clickdealer-report-YYYY-MM-DD.csv`.
pub fn report_filename(date: NaiveDate) -> String {
    format!("clickdealer-report-{}.csv", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_row(sub_id: &str, clicks: usize, leads: usize, approved: usize, revenue: f64) -> SubIdReportRow {
        let conversion_rate = if clicks == 0 {
            0.0
        } else {
            leads as f64 / clicks as f64 * 100.0
        };
        SubIdReportRow {
            sub_id: sub_id.to_string(),
            clicks,
            leads,
            approved,
            revenue,
            conversion_rate,
        }
    }

    fn render_to_string(rows: &[SubIdReportRow]) -> String {
        let mut buf = Vec::new();
        render_report_csv(rows, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_header_row_is_first() {
        let output = render_to_string(&[]);
        assert_eq!(output.lines().next().unwrap(), "Sub ID,Clicks,Leads,Approved,Revenue,CR%");
        assert_eq!(output.lines().count(), 1);
    }

    #[test]
    fn test_row_formatting() {
        let output = render_to_string(&[make_row("fb_campaign", 150, 12, 9, 245.5)]);
        let data_line = output.lines().nth(1).unwrap();
        assert_eq!(data_line, "fb_campaign,150,12,9,$245.50,8.00%");
    }

    #[test]
    fn test_zero_click_row_has_zero_rate() {
        let output = render_to_string(&[make_row("N/A", 0, 3, 1, 10.0)]);
        let data_line = output.lines().nth(1).unwrap();
        assert!(data_line.ends_with("$10.00,0.00%"));
    }

    #[test]
    fn test_sub_id_with_comma_is_quoted() {
        let output = render_to_string(&[make_row("email,blast", 10, 1, 0, 0.0)]);
        let data_line = output.lines().nth(1).unwrap();
        assert!(data_line.starts_with("\"email,blast\""));
    }

    #[test]
    fn test_rows_preserve_input_order() {
        let rows = vec![
            make_row("high", 100, 20, 18, 500.0),
            make_row("low", 100, 2, 1, 25.0),
        ];
        let output = render_to_string(&rows);
        let lines: Vec<&str> = output.lines().collect();
        assert!(lines[1].starts_with("high,"));
        assert!(lines[2].starts_with("low,"));
    }

    #[test]
    fn test_report_filename_is_dated() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(report_filename(date), "clickdealer-report-2024-03-07.csv");
    }
}
