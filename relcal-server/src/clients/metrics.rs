//! Deployment-metrics API client
//!
//! Two-step retrieval: the aggregate endpoint yields one row per
//! aggregation key, then each key is expanded via the records endpoint.
//! An aggregate failure aborts the whole fetch; a per-key detail failure
//! is logged and tolerated, leaving that key's records absent.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use relcal_common::lttd::MetricRecord;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Detail pages are fetched in one request this large.
const DETAIL_PAGE_SIZE: u32 = 1000;
const AGGREGATE_PAGE_SIZE: u32 = 50;

/// Metrics client errors
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Metrics API error {0}: {1}")]
    Api(u16, String),

    #[error("Unexpected response shape: {0}")]
    Shape(String),
}

/// Query window and scope for a metrics fetch.
#[derive(Debug, Clone)]
pub struct MetricsQuery {
    pub from_date: String,
    pub to_date: String,
    pub teambook_id: String,
    pub level: u32,
}

pub struct MetricsClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl MetricsClient {
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    async fn get_json(&self, url: &str, params: &[(&str, String)]) -> Result<Value, MetricsError> {
        let response = self
            .http
            .get(url)
            .query(params)
            .bearer_auth(&self.token)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| MetricsError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MetricsError::Api(status.as_u16(), body));
        }

        response
            .json()
            .await
            .map_err(|e| MetricsError::Shape(e.to_string()))
    }

    /// Rows live under `data.data` in both upstream responses.
    fn data_rows(payload: Value) -> Result<Vec<Value>, MetricsError> {
        match payload.pointer("/data/data") {
            Some(Value::Array(rows)) => Ok(rows.clone()),
            Some(_) => Err(MetricsError::Shape("data.data is not an array".into())),
            None => Ok(Vec::new()),
        }
    }

    /// Fetch aggregate metric rows; each carries an `aggKey`.
    pub async fn fetch_aggregate(&self, query: &MetricsQuery) -> Result<Vec<Value>, MetricsError> {
        let url = format!("{}/releases/metric/lttd/teambook/metric", self.base_url);
        let params = [
            ("from", query.from_date.clone()),
            ("to", query.to_date.clone()),
            ("teambookIds", query.teambook_id.clone()),
            ("teambookLevel", query.level.to_string()),
            ("page", "1".to_string()),
            ("size", AGGREGATE_PAGE_SIZE.to_string()),
        ];
        let payload = self.get_json(&url, &params).await?;
        Self::data_rows(payload)
    }

    /// Fetch detail records for one aggregation key.
    pub async fn fetch_detail(&self, agg_key: &str) -> Result<Vec<MetricRecord>, MetricsError> {
        let url = format!("{}/releases/metric/lttd/teambook/records", self.base_url);
        let params = [
            ("aggKey", agg_key.to_string()),
            ("page", "1".to_string()),
            ("size", DETAIL_PAGE_SIZE.to_string()),
        ];
        let payload = self.get_json(&url, &params).await?;
        let rows = Self::data_rows(payload)?;
        rows.into_iter()
            .map(|row| {
                serde_json::from_value(row).map_err(|e| MetricsError::Shape(e.to_string()))
            })
            .collect()
    }

    /// Full pipeline front half: aggregate fetch (fatal on failure), then
    /// detail expansion per key (per-key failures tolerated).
    pub async fn collect_records(
        &self,
        query: &MetricsQuery,
    ) -> Result<Vec<MetricRecord>, MetricsError> {
        let aggregate = self.fetch_aggregate(query).await?;

        let mut all_records = Vec::new();
        for row in &aggregate {
            let Some(agg_key) = row.get("aggKey").and_then(Value::as_str) else {
                continue;
            };
            match self.fetch_detail(agg_key).await {
                Ok(records) => all_records.extend(records),
                Err(e) => {
                    warn!("Detail fetch failed for aggKey {}: {}", agg_key, e);
                }
            }
        }
        Ok(all_records)
    }
}
