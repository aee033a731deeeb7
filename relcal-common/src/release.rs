//! Release record model and submission validation
//!
//! A release is one booked entry on the shared calendar. Records are stored
//! and exported with camelCase field names so collections exported by earlier
//! versions of the dashboard import cleanly.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::checklist::{self, Checklist};

/// One booked release on the shared calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    /// Opaque identifier; defaults to a millisecond timestamp, hence
    /// time-ordered across a single booking session.
    pub id: String,
    pub team_name: String,
    pub app_name: String,
    pub release_date: NaiveDate,
    /// Rehearsal deployment date; must strictly precede `release_date`.
    pub dry_run_date: NaiveDate,
    #[serde(default)]
    pub contact_person: String,
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub additional_notes: String,
    #[serde(default)]
    pub checklist: Checklist,
    /// True when booked with an intentionally incomplete checklist.
    #[serde(default)]
    pub is_planned: bool,
    /// Snapshot of checklist completion at submission time, 0-100.
    #[serde(default)]
    pub completion_percentage: u8,
    /// Stamped at import time when absent from incoming data.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Release {
    /// Generate a fresh time-ordered identifier.
    pub fn new_id() -> String {
        Utc::now().timestamp_millis().to_string()
    }
}

/// Lifecycle of a release as driven by user action.
///
/// `Draft` exists only while a booking form is being composed; submitting
/// moves to one of the planned states, editing re-opens a draft with the
/// prior values, and deletion is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseState {
    Draft,
    /// Booked with completion < 100%, after explicit planning confirmation.
    PlannedIncomplete,
    /// Booked with every top-level checklist item complete.
    PlannedComplete,
    /// Terminal; requires explicit confirmation and cannot be undone.
    Deleted,
}

impl Release {
    /// Current lifecycle state of a stored record.
    pub fn state(&self) -> ReleaseState {
        if self.completion_percentage >= 100 && !self.is_planned {
            ReleaseState::PlannedComplete
        } else {
            ReleaseState::PlannedIncomplete
        }
    }
}

/// Form contents of an in-progress booking, prior to validation.
///
/// Fields arrive as raw strings so that emptiness can be reported with a
/// user-facing message before any date parsing happens.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseDraft {
    #[serde(default)]
    pub team_name: String,
    #[serde(default)]
    pub app_name: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub dry_run_date: String,
    #[serde(default)]
    pub contact_person: String,
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub additional_notes: String,
    #[serde(default)]
    pub checklist: Checklist,
}

/// Submission validation failure, surfaced synchronously to the user.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Please fill in the {0} field")]
    MissingField(&'static str),

    #[error("Invalid {field} date: {value}")]
    InvalidDate { field: &'static str, value: String },

    #[error("Dry run date must be before the release date")]
    DryRunNotBeforeRelease,

    #[error("Please enter at least one component/repository name")]
    EmptyRepositoryList,

    #[error("Please fill in both JIRA ID and Confluence link")]
    IncompletePair,

    #[error("Please fill in the required field for \"{0}\"")]
    MissingDetail(&'static str),
}

/// Validated form contents, ready to become a stored [`Release`].
#[derive(Debug, Clone)]
pub struct ValidatedDraft {
    pub team_name: String,
    pub app_name: String,
    pub release_date: NaiveDate,
    pub dry_run_date: NaiveDate,
    pub contact_person: String,
    pub contact_email: String,
    pub additional_notes: String,
    pub checklist: Checklist,
}

impl ReleaseDraft {
    /// Validate a submission. Rules fail independently; the first violated
    /// rule is reported with its user-facing message.
    ///
    /// Checks, in order: the six core fields are non-empty, both dates
    /// parse, the dry run strictly precedes the release date, and every
    /// checked checklist item that expects an input carries a value.
    pub fn validate(&self) -> Result<ValidatedDraft, ValidationError> {
        let core_fields: [(&'static str, &str); 6] = [
            ("team name", &self.team_name),
            ("application name", &self.app_name),
            ("release date", &self.release_date),
            ("dry run date", &self.dry_run_date),
            ("contact person", &self.contact_person),
            ("contact email", &self.contact_email),
        ];
        for (name, value) in core_fields {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingField(name));
            }
        }

        let release_date = parse_date("release", &self.release_date)?;
        let dry_run_date = parse_date("dry run", &self.dry_run_date)?;

        // Equal or later is rejected; past dry runs are acceptable.
        if dry_run_date >= release_date {
            return Err(ValidationError::DryRunNotBeforeRelease);
        }

        checklist::validate_details(&self.checklist)?;

        Ok(ValidatedDraft {
            team_name: self.team_name.trim().to_string(),
            app_name: self.app_name.trim().to_string(),
            release_date,
            dry_run_date,
            contact_person: self.contact_person.trim().to_string(),
            contact_email: self.contact_email.trim().to_string(),
            additional_notes: self.additional_notes.trim().to_string(),
            checklist: self.checklist.clone(),
        })
    }
}

impl ValidatedDraft {
    /// Materialize a new release record with a fresh identifier.
    pub fn into_release(self, now: DateTime<Utc>) -> Release {
        let completion = checklist::completion_percentage(&self.checklist);
        Release {
            id: Release::new_id(),
            team_name: self.team_name,
            app_name: self.app_name,
            release_date: self.release_date,
            dry_run_date: self.dry_run_date,
            contact_person: self.contact_person,
            contact_email: self.contact_email,
            additional_notes: self.additional_notes,
            checklist: self.checklist,
            is_planned: completion < 100,
            completion_percentage: completion,
            created_at: now,
            updated_at: None,
        }
    }

    /// Apply this draft over an existing record, preserving its identifier
    /// and creation timestamp and stamping `updated_at`.
    pub fn apply_to(self, existing: &Release, now: DateTime<Utc>) -> Release {
        let completion = checklist::completion_percentage(&self.checklist);
        Release {
            id: existing.id.clone(),
            team_name: self.team_name,
            app_name: self.app_name,
            release_date: self.release_date,
            dry_run_date: self.dry_run_date,
            contact_person: self.contact_person,
            contact_email: self.contact_email,
            additional_notes: self.additional_notes,
            checklist: self.checklist,
            is_planned: completion < 100,
            completion_percentage: completion,
            created_at: existing.created_at,
            updated_at: Some(now),
        }
    }
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| ValidationError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_draft() -> ReleaseDraft {
        ReleaseDraft {
            team_name: "Data Platform".to_string(),
            app_name: "ingest-api".to_string(),
            release_date: "2025-06-20".to_string(),
            dry_run_date: "2025-06-18".to_string(),
            contact_person: "Alex Doe".to_string(),
            contact_email: "alex.doe@example.com".to_string(),
            additional_notes: String::new(),
            checklist: Checklist::default(),
        }
    }

    #[test]
    fn missing_core_field_is_rejected() {
        let mut draft = full_draft();
        draft.contact_email = "   ".to_string();
        assert_eq!(
            draft.validate().unwrap_err(),
            ValidationError::MissingField("contact email")
        );
    }

    #[test]
    fn dry_run_on_release_day_is_rejected() {
        let mut draft = full_draft();
        draft.dry_run_date = draft.release_date.clone();
        assert_eq!(
            draft.validate().unwrap_err(),
            ValidationError::DryRunNotBeforeRelease
        );
    }

    #[test]
    fn dry_run_after_release_is_rejected() {
        let mut draft = full_draft();
        draft.dry_run_date = "2025-06-22".to_string();
        assert_eq!(
            draft.validate().unwrap_err(),
            ValidationError::DryRunNotBeforeRelease
        );
    }

    #[test]
    fn past_dry_run_is_accepted() {
        let mut draft = full_draft();
        draft.dry_run_date = "2024-01-02".to_string();
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn valid_draft_becomes_planned_release() {
        let release = full_draft()
            .validate()
            .unwrap()
            .into_release(Utc::now());
        assert!(release.is_planned);
        assert_eq!(release.completion_percentage, 0);
        assert_eq!(release.state(), ReleaseState::PlannedIncomplete);
    }

    #[test]
    fn edit_preserves_id_and_created_at() {
        let original = full_draft().validate().unwrap().into_release(Utc::now());
        let mut draft = full_draft();
        draft.app_name = "ingest-api-v2".to_string();
        let updated = draft
            .validate()
            .unwrap()
            .apply_to(&original, Utc::now());
        assert_eq!(updated.id, original.id);
        assert_eq!(updated.created_at, original.created_at);
        assert!(updated.updated_at.is_some());
        assert_eq!(updated.app_name, "ingest-api-v2");
    }

    #[test]
    fn release_serializes_with_camel_case_fields() {
        let release = full_draft().validate().unwrap().into_release(Utc::now());
        let value = serde_json::to_value(&release).unwrap();
        assert!(value.get("teamName").is_some());
        assert!(value.get("dryRunDate").is_some());
        assert_eq!(value["releaseDate"], json!("2025-06-20"));
    }
}
