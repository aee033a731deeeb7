//! Calendar, dashboard, and date-availability endpoints
//!
//! Thin wrappers over the pure projection functions in relcal-common;
//! the render models go out as-is.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

use relcal_common::release::Release;
use relcal_common::{calendar, schedule};

use crate::{db, AppState};

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SuggestionQuery {
    /// Record being edited, excluded from its own conflict set.
    #[serde(rename = "excludeId")]
    pub exclude_id: Option<String>,
}

pub enum CalendarError {
    BadDate(String),
    BadMonth(u32),
    Database(String),
}

impl From<relcal_common::Error> for CalendarError {
    fn from(e: relcal_common::Error) -> Self {
        CalendarError::Database(e.to_string())
    }
}

impl IntoResponse for CalendarError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            CalendarError::BadDate(value) => (
                StatusCode::BAD_REQUEST,
                format!("Invalid date (expected YYYY-MM-DD): {}", value),
            ),
            CalendarError::BadMonth(month) => {
                (StatusCode::BAD_REQUEST, format!("Invalid month: {}", month))
            }
            CalendarError::Database(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", msg),
            ),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, CalendarError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| CalendarError::BadDate(value.to_string()))
}

/// GET /api/calendar?year=&month=
///
/// Month grid render model; defaults to the current month.
pub async fn calendar_view(
    State(state): State<AppState>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<serde_json::Value>, CalendarError> {
    let today = Utc::now().date_naive();
    let year = query.year.unwrap_or_else(|| today.year());
    let month = query.month.unwrap_or_else(|| today.month());
    if !(1..=12).contains(&month) {
        return Err(CalendarError::BadMonth(month));
    }

    let releases = db::list_releases(&state.db).await?;
    let cells = calendar::month_grid(&releases, year, month, today);
    let stats = calendar::stats(&releases, today, year, month);

    Ok(Json(json!({
        "year": year,
        "month": month,
        "today": today,
        "cells": cells,
        "stats": stats,
    })))
}

/// GET /api/dashboard
///
/// Upcoming-releases feed plus the headline counters for the current
/// month.
pub async fn dashboard_view(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, CalendarError> {
    let today = Utc::now().date_naive();
    let releases = db::list_releases(&state.db).await?;

    let upcoming = calendar::upcoming_feed(&releases, today);
    let stats = calendar::stats(&releases, today, today.year(), today.month());

    Ok(Json(json!({
        "today": today,
        "upcoming": upcoming,
        "stats": stats,
    })))
}

/// GET /api/releases/date/:date
///
/// Occupancy check for one day, used by the booking form before submit.
pub async fn releases_on_date(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<serde_json::Value>, CalendarError> {
    let date = parse_date(&date)?;
    let releases = db::list_releases(&state.db).await?;
    let on_date: Vec<Release> = schedule::releases_on_date(&releases, date, None)
        .into_iter()
        .cloned()
        .collect();

    Ok(Json(json!({
        "date": date,
        "count": on_date.len(),
        "conflict": !on_date.is_empty(),
        "releases": on_date,
    })))
}

/// GET /api/releases/date/:date/suggestions
///
/// Nearby free weekdays for an occupied candidate date.
pub async fn date_suggestions(
    State(state): State<AppState>,
    Path(date): Path<String>,
    Query(query): Query<SuggestionQuery>,
) -> Result<Json<serde_json::Value>, CalendarError> {
    let candidate = parse_date(&date)?;
    let today = Utc::now().date_naive();
    let releases = db::list_releases(&state.db).await?;

    let exclude = query.exclude_id.as_deref();
    let occupied = schedule::has_conflict(&releases, candidate, exclude);
    let suggestions = schedule::suggest_alternatives(&releases, candidate, today);

    Ok(Json(json!({
        "date": candidate,
        "available": !occupied,
        "suggestions": suggestions,
    })))
}
