//! LTTD metrics pipeline endpoints
//!
//! Record retrieval, directory email enrichment, and report dispatch.
//! The heavy lifting (filtering, partitioning, grouping, composition)
//! lives in relcal-common and the notify module; these handlers wire the
//! upstream clients together.

use std::collections::HashMap;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use relcal_common::lttd::{
    self, MetricRecord, ServiceGroup, LTTD_THRESHOLD_DAYS, TARGET_BUSINESS_UNIT,
};

use crate::clients::{DirectoryClient, MailClient, MetricsClient};
use crate::clients::mail::OutboundMessage;
use crate::clients::metrics::MetricsQuery;
use crate::notify;
use crate::AppState;

const DEFAULT_TEAMBOOK_ID: &str = "449";
const DEFAULT_TEAMBOOK_LEVEL: u32 = 2;

pub enum LttdError {
    BadRequest(String),
    NotConfigured(&'static str),
    Upstream(String),
}

impl IntoResponse for LttdError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            LttdError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            LttdError::NotConfigured(what) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("{} is not configured", what),
            ),
            LttdError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
        };
        (status, Json(json!({ "status": "error", "error": message }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct RecordsRequest {
    pub from_date: String,
    pub to_date: String,
    #[serde(default = "default_teambook_id")]
    pub teambook_id: String,
    #[serde(default = "default_level")]
    pub level: u32,
}

fn default_teambook_id() -> String {
    DEFAULT_TEAMBOOK_ID.to_string()
}

fn default_level() -> u32 {
    DEFAULT_TEAMBOOK_LEVEL
}

#[derive(Debug, Serialize)]
pub struct RecordsResponse {
    pub status: String,
    pub records: Vec<MetricRecord>,
    pub count: usize,
    pub total_before_filter: usize,
    pub no_lttd_records: Vec<MetricRecord>,
    pub no_lttd_count: usize,
    pub grouped_no_lttd: Vec<ServiceGroup>,
    pub filter_description: String,
}

/// POST /api/lttd/records
///
/// Aggregate fetch, per-key detail expansion, then the business-unit /
/// threshold / missing-LTTD partition.
pub async fn lttd_records(
    State(state): State<AppState>,
    Json(request): Json<RecordsRequest>,
) -> Result<Json<RecordsResponse>, LttdError> {
    if request.from_date.trim().is_empty() || request.to_date.trim().is_empty() {
        return Err(LttdError::BadRequest(
            "from_date and to_date are required".to_string(),
        ));
    }

    let token = state
        .upstream
        .metrics_token
        .as_deref()
        .ok_or(LttdError::NotConfigured("Metrics API bearer token"))?;
    let client = MetricsClient::new(&state.upstream.metrics_base_url, token);

    let query = MetricsQuery {
        from_date: request.from_date.clone(),
        to_date: request.to_date.clone(),
        teambook_id: request.teambook_id.clone(),
        level: request.level,
    };
    let all_records = client
        .collect_records(&query)
        .await
        .map_err(|e| LttdError::Upstream(format!("Failed to fetch LTTD records: {}", e)))?;

    let partition = lttd::partition_records(all_records);
    let grouped = lttd::group_missing_by_service(&partition.missing);

    info!(
        "LTTD fetch {}..{}: {} qualifying, {} missing of {} records",
        request.from_date,
        request.to_date,
        partition.qualifying.len(),
        partition.missing.len(),
        partition.total_before_filter
    );

    Ok(Json(RecordsResponse {
        status: "success".to_string(),
        count: partition.qualifying.len(),
        records: partition.qualifying,
        total_before_filter: partition.total_before_filter,
        no_lttd_count: partition.missing.len(),
        no_lttd_records: partition.missing,
        grouped_no_lttd: grouped,
        filter_description: format!(
            "Business unit contains '{}' and LTTD > {} days",
            TARGET_BUSINESS_UNIT, LTTD_THRESHOLD_DAYS
        ),
    }))
}

#[derive(Debug, Deserialize)]
pub struct FetchEmailsRequest {
    #[serde(default)]
    pub records: Vec<MetricRecord>,
}

/// POST /api/lttd/fetch-emails
///
/// Resolve requester emails through the staff directory. Per-id failures
/// are tolerated and reported back; the matching records keep a null
/// email.
pub async fn lttd_fetch_emails(
    State(state): State<AppState>,
    Json(request): Json<FetchEmailsRequest>,
) -> Result<Json<Value>, LttdError> {
    if request.records.is_empty() {
        return Err(LttdError::BadRequest("No records provided".to_string()));
    }

    let token = state
        .upstream
        .directory_token
        .as_deref()
        .ok_or(LttdError::NotConfigured("Directory API bearer token"))?;
    let client = DirectoryClient::new(&state.upstream.directory_base_url, token);

    // Dedupe ids, preserving first-seen order.
    let mut staff_ids: Vec<String> = Vec::new();
    for record in &request.records {
        if let Some(id) = record.employee_id() {
            if !staff_ids.iter().any(|seen| seen == id) {
                staff_ids.push(id.to_string());
            }
        }
    }

    let mut email_map: HashMap<String, String> = HashMap::new();
    let mut failed_ids: Vec<String> = Vec::new();
    for staff_id in &staff_ids {
        match client.lookup_email(staff_id).await {
            Ok(Some(email)) => {
                email_map.insert(staff_id.clone(), email);
            }
            Ok(None) => failed_ids.push(staff_id.clone()),
            Err(e) => {
                warn!("Email lookup failed for staff id {}: {}", staff_id, e);
                failed_ids.push(staff_id.clone());
            }
        }
    }

    let enriched: Vec<MetricRecord> = request
        .records
        .into_iter()
        .map(|mut record| {
            let email = record
                .employee_id()
                .and_then(|id| email_map.get(id))
                .cloned();
            record.0.insert(
                "email".to_string(),
                email.map(Value::String).unwrap_or(Value::Null),
            );
            record
        })
        .collect();

    Ok(Json(json!({
        "status": "success",
        "records": enriched,
        "email_count": email_map.len(),
        "failed_count": failed_ids.len(),
        "failed_ids": failed_ids,
    })))
}

#[derive(Debug, Deserialize)]
pub struct SendEmailsRequest {
    #[serde(default)]
    pub high_lttd_records: Vec<MetricRecord>,
    #[serde(default)]
    pub no_lttd_records: Vec<MetricRecord>,
    pub to_email: Option<String>,
    #[serde(default)]
    pub cc_emails: Vec<String>,
}

/// POST /api/lttd/send-emails
///
/// Compose one combined report for both partitions and dispatch it
/// through the mail relay.
pub async fn lttd_send_emails(
    State(state): State<AppState>,
    Json(request): Json<SendEmailsRequest>,
) -> Result<Json<Value>, LttdError> {
    let to_email = request
        .to_email
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| {
            LttdError::BadRequest("Recipient email address (to_email) is required".to_string())
        })?;
    if request.high_lttd_records.is_empty() && request.no_lttd_records.is_empty() {
        return Err(LttdError::BadRequest("No records provided".to_string()));
    }

    let relay_url = state
        .upstream
        .mail_relay_url
        .as_deref()
        .ok_or(LttdError::NotConfigured("Mail relay URL"))?;
    let client = MailClient::new(relay_url);

    let body = notify::compose_report(&request.high_lttd_records, &request.no_lttd_records);
    let message = OutboundMessage {
        from: state.upstream.mail_from.clone(),
        to: to_email.to_string(),
        cc: request.cc_emails.clone(),
        subject: notify::REPORT_SUBJECT.to_string(),
        body,
    };
    client
        .send(&message)
        .await
        .map_err(|e| LttdError::Upstream(format!("Failed to send email: {}", e)))?;

    info!(
        "LTTD report sent to {} (cc: {})",
        to_email,
        request.cc_emails.join(", ")
    );

    Ok(Json(json!({
        "status": "success",
        "message": "Email sent successfully",
        "to": to_email,
        "cc": request.cc_emails,
        "high_lttd_count": request.high_lttd_records.len(),
        "no_lttd_count": request.no_lttd_records.len(),
    })))
}
