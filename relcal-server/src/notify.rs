//! LTTD report composition
//!
//! Builds the plain-text notification body from the two record
//! partitions. Pure string assembly; dispatch goes through the mail
//! relay client.

use std::fmt::Write;

use relcal_common::lttd::MetricRecord;

pub const REPORT_SUBJECT: &str = "LTTD Metrics Report - Action Required";

fn separator() -> String {
    "=".repeat(80)
}

fn field(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => "N/A",
    }
}

/// Compose the combined report: high-LTTD section, missing-LTTD section,
/// summary. Sections for empty partitions are omitted.
pub fn compose_report(high: &[MetricRecord], missing: &[MetricRecord]) -> String {
    let mut body = String::new();
    body.push_str("Dear Team,\n\n");
    body.push_str(
        "This is an automated notification regarding change records with \
         Lead Time to Deploy (LTTD) metrics.\n\n",
    );

    if !high.is_empty() {
        let _ = writeln!(body, "{}", separator());
        body.push_str("HIGH LTTD RECORDS (LTTD > 15 days)\n");
        let _ = writeln!(body, "{}", separator());
        let _ = writeln!(body, "\nTotal Records: {}\n", high.len());

        for (idx, record) in high.iter().enumerate() {
            let lttd = record
                .lttd_days()
                .map(|d| d.to_string())
                .unwrap_or_else(|| "N/A".to_string());
            let _ = writeln!(
                body,
                "{}. Change Reference: {}\n   Month-Year: {}\n   Application: {}\n   \
                 LTTD Days: {}\n   Requested By: {}\n   Processing Hurdle: {}\n",
                idx + 1,
                field(record.change_reference()),
                record.month_year().as_deref().unwrap_or("N/A"),
                field(record.business_service()),
                lttd,
                field(record.requested_by()),
                field(record.processing_hurdle()),
            );
        }
    }

    if !missing.is_empty() {
        let _ = writeln!(body, "{}", separator());
        body.push_str("MISSING LTTD RECORDS (LTTD Not Calculated)\n");
        let _ = writeln!(body, "{}", separator());
        let _ = writeln!(body, "\nTotal Records: {}\n", missing.len());

        for (idx, record) in missing.iter().enumerate() {
            let _ = writeln!(
                body,
                "{}. Change Reference: {}\n   Month-Year: {}\n   Application: {}\n   \
                 Requested By: {}\n   LTTD Eligible: {}\n   Processing Hurdle: {}\n",
                idx + 1,
                field(record.change_reference()),
                record.month_year().as_deref().unwrap_or("N/A"),
                field(record.business_service()),
                field(record.requested_by()),
                record.lttd_eligible(),
                field(record.processing_hurdle()),
            );
        }
    }

    let _ = writeln!(body, "{}", separator());
    body.push_str("SUMMARY\n");
    let _ = writeln!(body, "{}", separator());
    let _ = writeln!(
        body,
        "\nHigh LTTD Records (>15 days): {}\nMissing LTTD Records: {}\nTotal Records: {}",
        high.len(),
        missing.len(),
        high.len() + missing.len()
    );
    body.push_str(
        "\nPlease review these records and take necessary action to improve \
         deployment lead times.\n\nBest regards,\nAutomation Team\n",
    );
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(fields: serde_json::Value) -> MetricRecord {
        serde_json::from_value(fields).unwrap()
    }

    #[test]
    fn report_contains_both_sections_and_summary() {
        let high = vec![record(json!({
            "id": "CR123",
            "business_service": "iadp-core",
            "lead_time_to_deploy_numeric_days": 22,
            "requested_by": "A. Person",
            "cr_processing_hurdle": "LTTD Successfully Calculated",
            "month": 5,
            "year": 2025,
        }))];
        let missing = vec![record(json!({
            "cr_id": "CR456",
            "business_service": "iadp-edge",
            "LTTDEligible": true,
            "cr_processing_hurdle": "Awaiting deployment data",
        }))];

        let body = compose_report(&high, &missing);
        assert!(body.contains("HIGH LTTD RECORDS (LTTD > 15 days)"));
        assert!(body.contains("1. Change Reference: CR123"));
        assert!(body.contains("Month-Year: 5-2025"));
        assert!(body.contains("LTTD Days: 22"));
        assert!(body.contains("MISSING LTTD RECORDS (LTTD Not Calculated)"));
        assert!(body.contains("1. Change Reference: CR456"));
        assert!(body.contains("LTTD Eligible: true"));
        assert!(body.contains("High LTTD Records (>15 days): 1"));
        assert!(body.contains("Total Records: 2"));
    }

    #[test]
    fn empty_partition_omits_its_section() {
        let missing = vec![record(json!({"cr_id": "CR1"}))];
        let body = compose_report(&[], &missing);
        assert!(!body.contains("HIGH LTTD RECORDS"));
        assert!(body.contains("MISSING LTTD RECORDS"));
        assert!(body.contains("High LTTD Records (>15 days): 0"));
    }

    #[test]
    fn absent_fields_render_as_not_available() {
        let high = vec![record(json!({"lead_time_to_deploy_numeric_days": 30}))];
        let body = compose_report(&high, &[]);
        assert!(body.contains("Change Reference: N/A"));
        assert!(body.contains("Month-Year: N/A"));
    }
}
