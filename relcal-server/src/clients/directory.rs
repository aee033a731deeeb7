//! Staff-directory API client for email lookup

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Directory client errors
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Directory API error {0}")]
    Api(u16),

    #[error("Unexpected response shape: {0}")]
    Shape(String),
}

pub struct DirectoryClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl DirectoryClient {
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    /// Look up a person's email by staff id. Returns None when the
    /// directory knows the id but carries no email field.
    pub async fn lookup_email(&self, staff_id: &str) -> Result<Option<String>, DirectoryError> {
        let url = format!("{}/v1/people", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("staffID", staff_id)])
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| DirectoryError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError::Api(status.as_u16()));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| DirectoryError::Shape(e.to_string()))?;

        // Response is a list of people; the first match wins. The email
        // field name varies between directory versions.
        let person = match payload.as_array().and_then(|people| people.first()) {
            Some(person) => person,
            None => return Ok(None),
        };
        let email = ["email", "emailAddress", "Email"]
            .iter()
            .find_map(|key| person.get(*key))
            .and_then(Value::as_str)
            .map(str::to_string);
        Ok(email)
    }
}
