//! Collection export and import
//!
//! Import validates the whole payload before any mutation: one bad
//! record rejects the request and the stored collection is untouched.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use relcal_common::release::Release;

use crate::{db, snapshot, AppState};

/// Fields every imported record must carry.
const REQUIRED_FIELDS: [&str; 5] = ["id", "teamName", "appName", "releaseDate", "dryRunDate"];

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    Replace,
    Merge,
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub mode: ImportMode,
    pub releases: Vec<Value>,
}

pub enum TransferError {
    BadPayload(String),
    Database(String),
}

impl From<relcal_common::Error> for TransferError {
    fn from(e: relcal_common::Error) -> Self {
        TransferError::Database(e.to_string())
    }
}

impl IntoResponse for TransferError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            TransferError::BadPayload(msg) => (StatusCode::BAD_REQUEST, msg),
            TransferError::Database(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", msg),
            ),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// GET /api/releases/export
pub async fn export_releases(
    State(state): State<AppState>,
) -> Result<Json<Value>, TransferError> {
    let releases = db::list_releases(&state.db).await?;
    let count = releases.len();
    Ok(Json(json!({
        "success": true,
        "data": releases,
        "count": count,
    })))
}

/// Check one raw record for the required fields, before parsing.
fn check_required(index: usize, record: &Value) -> Result<(), TransferError> {
    for field in REQUIRED_FIELDS {
        let present = record
            .get(field)
            .and_then(Value::as_str)
            .map(|s| !s.trim().is_empty())
            .unwrap_or(false);
        if !present {
            return Err(TransferError::BadPayload(format!(
                "Record {} is missing required field '{}'",
                index + 1,
                field
            )));
        }
    }
    Ok(())
}

/// POST /api/releases/import
pub async fn import_releases(
    State(state): State<AppState>,
    Json(request): Json<ImportRequest>,
) -> Result<Json<Value>, TransferError> {
    if request.releases.is_empty() {
        return Err(TransferError::BadPayload(
            "Import payload contains no releases".to_string(),
        ));
    }

    let mut incoming = Vec::with_capacity(request.releases.len());
    for (index, raw) in request.releases.iter().enumerate() {
        check_required(index, raw)?;
        let release: Release = serde_json::from_value(raw.clone()).map_err(|e| {
            TransferError::BadPayload(format!("Record {} is not a valid release: {}", index + 1, e))
        })?;
        incoming.push(release);
    }

    let merged = match request.mode {
        ImportMode::Replace => incoming,
        ImportMode::Merge => {
            // Overwrite on id collision, append the rest, keeping the
            // existing collection's order.
            let mut existing = db::list_releases(&state.db).await?;
            for release in incoming {
                match existing.iter_mut().find(|r| r.id == release.id) {
                    Some(slot) => *slot = release,
                    None => existing.push(release),
                }
            }
            existing
        }
    };

    db::replace_all(&state.db, &merged).await?;
    snapshot::write(&state.snapshot_path, &merged);
    info!("Imported {} releases ({:?} mode)", merged.len(), request.mode);

    Ok(Json(json!({
        "success": true,
        "count": merged.len(),
    })))
}
