//! Lead-time-to-deploy (LTTD) record filtering and grouping
//!
//! Records arrive from the upstream metrics API as loosely-shaped JSON.
//! Field names shift between exports (`LTTDEligible` vs `lttd_eligible` vs
//! `lttdEligible`), so records are kept as raw maps with tolerant accessors
//! rather than a rigid struct.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Substring match applied to the business-unit field.
pub const TARGET_BUSINESS_UNIT: &str = "Data Assets&Provisioning Tech";

/// Sentinel the upstream sets on the processing hurdle once LTTD is
/// computed.
pub const HURDLE_SUCCESS: &str = "LTTD Successfully Calculated";

/// Records above this many days of lead time are flagged as exceeding
/// the target.
pub const LTTD_THRESHOLD_DAYS: f64 = 15.0;

/// One upstream metrics record, kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricRecord(pub BTreeMap<String, Value>);

impl MetricRecord {
    fn first(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter().find_map(|k| self.0.get(*k))
    }

    fn first_str(&self, keys: &[&str]) -> Option<&str> {
        self.first(keys).and_then(Value::as_str)
    }

    /// Eligibility flag, accepting boolean or "true"/"false" strings under
    /// any of the observed field spellings.
    pub fn lttd_eligible(&self) -> bool {
        match self.first(&["LTTDEligible", "lttd_eligible", "lttdEligible"]) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    /// Business unit, preferring the L4 rollup and falling back to L7.
    pub fn business_unit(&self) -> Option<&str> {
        self.first_str(&["l4_business_unit", "l7_business_unit"])
    }

    pub fn processing_hurdle(&self) -> Option<&str> {
        self.first_str(&["CRProcessingHurdle", "cr_processing_hurdle", "crProcessingHurdle"])
    }

    pub fn business_service(&self) -> Option<&str> {
        self.first_str(&["business_service", "businessService"])
    }

    /// Lead time in days, accepting numeric or numeric-string values.
    pub fn lttd_days(&self) -> Option<f64> {
        match self.first(&["lead_time_to_deploy_numeric_days", "lttd"])? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Strictly greater than the 15-day target.
    pub fn exceeds_threshold(&self) -> bool {
        self.lttd_days().is_some_and(|d| d > LTTD_THRESHOLD_DAYS)
    }

    /// Employee id of the requester, for directory enrichment.
    pub fn employee_id(&self) -> Option<&str> {
        self.first_str(&["RequestedByEmployeeId", "requested_by_employee_id"])
    }

    /// Change-record reference, for report listings.
    pub fn change_reference(&self) -> Option<&str> {
        self.first_str(&["id", "cr_id"])
    }

    pub fn requested_by(&self) -> Option<&str> {
        self.first_str(&["requested_by"])
    }

    /// "month-year" label when the record carries a month, else None.
    /// Month and year arrive either as numbers or strings.
    pub fn month_year(&self) -> Option<String> {
        let as_text = |v: &Value| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        };
        let month = self.first(&["month"]).and_then(as_text)?;
        let year = self
            .first(&["year"])
            .and_then(as_text)
            .unwrap_or_default();
        Some(format!("{month}-{year}"))
    }
}

/// Outcome of partitioning a raw record batch.
#[derive(Debug, Clone, Default)]
pub struct Partition {
    /// In the target business unit with lead time strictly over the
    /// 15-day target.
    pub qualifying: Vec<MetricRecord>,
    /// In the target business unit, eligible, but the hurdle never
    /// reached the success sentinel. Independent of `qualifying`: a
    /// record can appear in both.
    pub missing: Vec<MetricRecord>,
    /// Batch size before any filtering, for reporting.
    pub total_before_filter: usize,
}

/// Filter a batch down to the target business unit, then split out the
/// over-target records and the records still missing an LTTD value.
pub fn partition_records(records: Vec<MetricRecord>) -> Partition {
    let total_before_filter = records.len();

    let in_unit: Vec<MetricRecord> = records
        .into_iter()
        .filter(|r| {
            r.business_unit()
                .is_some_and(|bu| bu.contains(TARGET_BUSINESS_UNIT))
        })
        .collect();

    let qualifying = in_unit
        .iter()
        .filter(|r| r.exceeds_threshold())
        .cloned()
        .collect();

    let missing = in_unit
        .into_iter()
        .filter(|r| r.lttd_eligible() && r.processing_hurdle() != Some(HURDLE_SUCCESS))
        .collect();

    Partition {
        qualifying,
        missing,
        total_before_filter,
    }
}

/// A group of missing-LTTD records sharing one business service.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceGroup {
    pub business_service: String,
    pub count: usize,
    pub records: Vec<MetricRecord>,
}

/// Group missing-LTTD records by business service, largest groups first,
/// ties broken by service name. Records without a service land under
/// "Unknown".
pub fn group_missing_by_service(missing: &[MetricRecord]) -> Vec<ServiceGroup> {
    let mut by_service: BTreeMap<String, Vec<MetricRecord>> = BTreeMap::new();
    for record in missing {
        let service = record
            .business_service()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or("Unknown")
            .to_string();
        by_service.entry(service).or_default().push(record.clone());
    }

    let mut groups: Vec<ServiceGroup> = by_service
        .into_iter()
        .map(|(business_service, records)| ServiceGroup {
            count: records.len(),
            business_service,
            records,
        })
        .collect();
    groups.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.business_service.cmp(&b.business_service))
    });
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(fields: Value) -> MetricRecord {
        serde_json::from_value(fields).unwrap()
    }

    #[test]
    fn eligibility_accepts_all_field_spellings() {
        assert!(record(json!({"LTTDEligible": true})).lttd_eligible());
        assert!(record(json!({"lttd_eligible": "True"})).lttd_eligible());
        assert!(record(json!({"lttdEligible": true})).lttd_eligible());
        assert!(!record(json!({"lttd_eligible": "false"})).lttd_eligible());
        assert!(!record(json!({})).lttd_eligible());
    }

    #[test]
    fn business_service_accepts_both_field_spellings() {
        let snake = record(json!({"business_service": "Billing"}));
        assert_eq!(snake.business_service(), Some("Billing"));
        let camel = record(json!({"businessService": "Billing"}));
        assert_eq!(camel.business_service(), Some("Billing"));
    }

    #[test]
    fn partition_filters_unit_then_splits_over_target_and_missing() {
        let records = vec![
            record(json!({
                "l4_business_unit": "CTO - Data Assets&Provisioning Tech",
                "lead_time_to_deploy_numeric_days": 30,
                "LTTDEligible": true,
                "cr_processing_hurdle": "LTTD Successfully Calculated",
            })),
            record(json!({
                "l7_business_unit": "Data Assets&Provisioning Tech",
                "LTTDEligible": true,
                "cr_processing_hurdle": "Awaiting deployment data",
            })),
            record(json!({
                "l4_business_unit": "Data Assets&Provisioning Tech",
                "lead_time_to_deploy_numeric_days": 5,
                "LTTDEligible": false,
            })),
            record(json!({
                "l4_business_unit": "Some Other Unit",
                "lead_time_to_deploy_numeric_days": 40,
                "LTTDEligible": true,
            })),
        ];

        let p = partition_records(records);
        assert_eq!(p.total_before_filter, 4);
        assert_eq!(p.qualifying.len(), 1);
        assert_eq!(p.qualifying[0].lttd_days(), Some(30.0));
        assert_eq!(p.missing.len(), 1);
        assert_eq!(
            p.missing[0].processing_hurdle(),
            Some("Awaiting deployment data")
        );
    }

    #[test]
    fn missing_record_can_also_exceed_the_target() {
        let records = vec![record(json!({
            "l4_business_unit": "Data Assets&Provisioning Tech",
            "lead_time_to_deploy_numeric_days": 20,
            "LTTDEligible": true,
            "cr_processing_hurdle": "Stuck",
        }))];
        let p = partition_records(records);
        assert_eq!(p.qualifying.len(), 1);
        assert_eq!(p.missing.len(), 1);
    }

    #[test]
    fn threshold_is_strictly_greater_than() {
        assert!(!record(json!({"lead_time_to_deploy_numeric_days": 15.0})).exceeds_threshold());
        assert!(record(json!({"lead_time_to_deploy_numeric_days": 15.1})).exceeds_threshold());
        assert!(record(json!({"lead_time_to_deploy_numeric_days": "20"})).exceeds_threshold());
        assert!(!record(json!({})).exceeds_threshold());
    }

    #[test]
    fn grouping_sorts_by_count_then_name() {
        let missing = vec![
            record(json!({"business_service": "Beta"})),
            record(json!({"business_service": "Alpha"})),
            record(json!({"business_service": "Beta"})),
            record(json!({})),
        ];
        let groups = group_missing_by_service(&missing);
        let names: Vec<&str> = groups.iter().map(|g| g.business_service.as_str()).collect();
        assert_eq!(names, ["Beta", "Alpha", "Unknown"]);
        assert_eq!(groups[0].count, 2);
    }
}
