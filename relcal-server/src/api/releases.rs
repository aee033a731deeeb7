//! Release collection CRUD
//!
//! Submission runs the validation and confirmation contract: field
//! validation first, then the planning confirmation for incomplete
//! checklists, then the conflict confirmation for occupied dates. Each
//! gate reports independently so the client can re-submit with the
//! matching confirmation flag set.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use relcal_common::release::{Release, ReleaseDraft, ValidationError};
use relcal_common::{calendar, checklist, schedule};

use crate::{db, snapshot, AppState};

/// Submission body: the draft fields plus the confirmation flags that
/// stand in for the interactive prompts.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    #[serde(flatten)]
    pub draft: ReleaseDraft,
    #[serde(default)]
    pub confirm_planning: bool,
    #[serde(default)]
    pub confirm_conflict: bool,
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub confirm: bool,
}

pub enum ReleaseError {
    Validation(ValidationError),
    PlanningConfirmationRequired { completion: u8 },
    ConflictConfirmationRequired { conflicts: Vec<Release> },
    DeleteConfirmationRequired,
    NotFound(String),
    Database(String),
}

impl From<relcal_common::Error> for ReleaseError {
    fn from(e: relcal_common::Error) -> Self {
        ReleaseError::Database(e.to_string())
    }
}

impl IntoResponse for ReleaseError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ReleaseError::Validation(e) => {
                (StatusCode::BAD_REQUEST, json!({ "error": e.to_string() }))
            }
            ReleaseError::PlanningConfirmationRequired { completion } => (
                StatusCode::CONFLICT,
                json!({
                    "error": "planning_confirmation_required",
                    "completionPercentage": completion,
                }),
            ),
            ReleaseError::ConflictConfirmationRequired { conflicts } => (
                StatusCode::CONFLICT,
                json!({
                    "error": "conflict_confirmation_required",
                    "conflicts": conflicts,
                }),
            ),
            ReleaseError::DeleteConfirmationRequired => (
                StatusCode::CONFLICT,
                json!({ "error": "delete_confirmation_required" }),
            ),
            ReleaseError::NotFound(id) => (
                StatusCode::NOT_FOUND,
                json!({ "error": format!("Release not found: {}", id) }),
            ),
            ReleaseError::Database(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": format!("Database error: {}", msg) }),
            ),
        };
        (status, Json(body)).into_response()
    }
}

/// Run the confirmation gates for a submission against the current
/// collection. `exclude_id` removes the record being edited from its own
/// conflict set.
fn check_confirmations(
    all: &[Release],
    request: &SubmitRequest,
    release_date: chrono::NaiveDate,
    checklist: &checklist::Checklist,
    exclude_id: Option<&str>,
) -> Result<(), ReleaseError> {
    let completion = checklist::completion_percentage(checklist);
    if completion < 100 && !request.confirm_planning {
        return Err(ReleaseError::PlanningConfirmationRequired { completion });
    }

    let conflicts = schedule::releases_on_date(all, release_date, exclude_id);
    if !conflicts.is_empty() && !request.confirm_conflict {
        return Err(ReleaseError::ConflictConfirmationRequired {
            conflicts: conflicts.into_iter().cloned().collect(),
        });
    }
    Ok(())
}

async fn rewrite_snapshot(state: &AppState) -> Result<(), ReleaseError> {
    let releases = db::list_releases(&state.db).await?;
    snapshot::write(&state.snapshot_path, &releases);
    Ok(())
}

/// GET /api/releases
pub async fn list_releases(
    State(state): State<AppState>,
) -> Result<Json<Vec<Release>>, ReleaseError> {
    Ok(Json(db::list_releases(&state.db).await?))
}

/// GET /api/releases/:id
pub async fn get_release(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Release>, ReleaseError> {
    db::get_release(&state.db, &id)
        .await?
        .map(Json)
        .ok_or(ReleaseError::NotFound(id))
}

/// POST /api/releases
pub async fn create_release(
    State(state): State<AppState>,
    Json(request): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<Release>), ReleaseError> {
    let validated = request.draft.validate().map_err(ReleaseError::Validation)?;

    let all = db::list_releases(&state.db).await?;
    check_confirmations(&all, &request, validated.release_date, &validated.checklist, None)?;

    let release = validated.into_release(Utc::now());
    db::upsert_release(&state.db, &release).await?;
    rewrite_snapshot(&state).await?;

    info!(
        "Booked release {} ({}) on {}",
        release.id, release.app_name, release.release_date
    );
    Ok((StatusCode::CREATED, Json(release)))
}

/// PUT /api/releases/:id
pub async fn update_release(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SubmitRequest>,
) -> Result<Json<Release>, ReleaseError> {
    let existing = db::get_release(&state.db, &id)
        .await?
        .ok_or_else(|| ReleaseError::NotFound(id.clone()))?;

    let validated = request.draft.validate().map_err(ReleaseError::Validation)?;

    let all = db::list_releases(&state.db).await?;
    check_confirmations(
        &all,
        &request,
        validated.release_date,
        &validated.checklist,
        Some(&id),
    )?;

    let release = validated.apply_to(&existing, Utc::now());
    db::upsert_release(&state.db, &release).await?;
    rewrite_snapshot(&state).await?;
    Ok(Json(release))
}

/// DELETE /api/releases/:id?confirm=true
///
/// Deletion is irreversible, so the confirmation is mandatory.
pub async fn delete_release(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<serde_json::Value>, ReleaseError> {
    if !query.confirm {
        return Err(ReleaseError::DeleteConfirmationRequired);
    }
    if !db::delete_release(&state.db, &id).await? {
        return Err(ReleaseError::NotFound(id));
    }
    rewrite_snapshot(&state).await?;
    info!("Deleted release {}", id);
    Ok(Json(json!({ "success": true, "id": id })))
}

/// GET /api/releases/warnings
///
/// Advisory list of releases within 3 days of their date that are not
/// fully ready. Non-blocking; nothing transitions state here.
pub async fn release_warnings(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ReleaseError> {
    let releases = db::list_releases(&state.db).await?;
    let today = Utc::now().date_naive();
    let warnings: Vec<Release> = calendar::readiness_warnings(&releases, today)
        .into_iter()
        .cloned()
        .collect();
    let count = warnings.len();
    Ok(Json(json!({
        "warnings": warnings,
        "count": count,
    })))
}

/// POST /api/releases/bulk
///
/// Replace the whole collection in one shot. Compatibility path for
/// clients that persist collection-level saves.
pub async fn bulk_replace(
    State(state): State<AppState>,
    Json(releases): Json<Vec<Release>>,
) -> Result<Json<serde_json::Value>, ReleaseError> {
    db::replace_all(&state.db, &releases).await?;
    rewrite_snapshot(&state).await?;
    Ok(Json(json!({ "success": true, "count": releases.len() })))
}
