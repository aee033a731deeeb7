//! Readiness checklist engine
//!
//! Tracks the fixed three-phase checklist attached to every release, plus
//! the per-repository workflow items of an in-progress booking session.
//! Two different percentages come out of this module:
//!
//! - [`completion_percentage`]: checked count over the 13 fixed top-level
//!   items. This is the snapshot persisted on the release at submission.
//! - [`workflow_progress`]: record-weighted session progress, where each
//!   registered repository contributes 7 items (4 pre-release + 3 testing)
//!   to the denominator and documentation contributes a fixed 5.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::release::ValidationError;

/// Checklist phases, in workflow order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    PreRelease,
    Testing,
    Documentation,
}

/// Kind of free-text input attached to a checklist item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Plain boolean, no associated value.
    None,
    /// One required value, stored under `<key>_value`.
    Single,
    /// Two required values (JIRA id + Confluence link), stored under
    /// `<key>_values`.
    Pair,
    /// One-or-more repository names, stored under `<key>_repos`.
    RepoList,
}

/// One entry in the fixed checklist catalog.
#[derive(Debug, Clone, Copy)]
pub struct ItemSpec {
    pub key: &'static str,
    pub phase: Phase,
    pub input: InputKind,
}

/// The fixed 13-item checklist catalog: 4 pre-release, 4 testing,
/// 5 documentation items.
pub const ITEMS: [ItemSpec; 13] = [
    // Pre-Release Preparation
    ItemSpec { key: "pomVersionIncremented", phase: Phase::PreRelease, input: InputKind::Single },
    ItemSpec { key: "iadpContractVersionCheck", phase: Phase::PreRelease, input: InputKind::Single },
    ItemSpec { key: "releaseVersionInline", phase: Phase::PreRelease, input: InputKind::Single },
    ItemSpec { key: "apixInventoryUpdated", phase: Phase::PreRelease, input: InputKind::None },
    // Testing & Validation
    ItemSpec { key: "signOffCertReleaseManager", phase: Phase::Testing, input: InputKind::None },
    ItemSpec { key: "signOffCertTestManager", phase: Phase::Testing, input: InputKind::None },
    ItemSpec { key: "purlPreparedFromCert", phase: Phase::Testing, input: InputKind::Single },
    ItemSpec { key: "crQualityCheck", phase: Phase::Testing, input: InputKind::None },
    // Documentation & Communication
    ItemSpec { key: "componentsReposImpacted", phase: Phase::Documentation, input: InputKind::RepoList },
    ItemSpec { key: "releasePageGenerated", phase: Phase::Documentation, input: InputKind::Single },
    ItemSpec { key: "crCreated", phase: Phase::Documentation, input: InputKind::Single },
    ItemSpec { key: "confluenceJira", phase: Phase::Documentation, input: InputKind::Pair },
    ItemSpec { key: "evidencesAttached", phase: Phase::Documentation, input: InputKind::None },
];

/// Number of workflow items each registered repository contributes.
pub const ITEMS_PER_REPOSITORY: usize = 7;

/// Pre-release items tracked per repository.
pub const REPO_PRE_RELEASE_ITEMS: [&str; 4] = [
    "pomVersionIncremented",
    "iadpContractVersionCheck",
    "releaseVersionInline",
    "apixInventoryUpdated",
];

/// Testing items tracked per repository.
pub const REPO_TESTING_ITEMS: [&str; 3] = [
    "signOffCertReleaseManager",
    "signOffCertTestManager",
    "purlPreparedFromCert",
];

/// Checklist contents of one release: item key → checked flag, plus the
/// optional `<key>_value` / `<key>_values` / `<key>_repos` detail entries.
///
/// Kept as a flat JSON map rather than a fully typed struct so that
/// collections exported by earlier versions of the dashboard round-trip
/// without loss.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Checklist(pub BTreeMap<String, serde_json::Value>);

impl Checklist {
    /// Whether the given top-level item is checked.
    pub fn is_checked(&self, key: &str) -> bool {
        self.0.get(key).and_then(|v| v.as_bool()).unwrap_or(false)
    }

    /// Mark an item checked or unchecked.
    pub fn set_checked(&mut self, key: &str, checked: bool) {
        self.0.insert(key.to_string(), serde_json::Value::Bool(checked));
    }

    /// Single detail value attached to an item, if present and non-empty.
    pub fn detail_value(&self, key: &str) -> Option<&str> {
        self.0
            .get(&format!("{key}_value"))
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// List of detail values attached to an item (trimmed, empties dropped).
    pub fn detail_values(&self, key: &str) -> Vec<String> {
        self.string_list(&format!("{key}_values"))
    }

    /// Repository names attached to an item (trimmed, empties dropped).
    pub fn repo_names(&self, key: &str) -> Vec<String> {
        self.string_list(&format!("{key}_repos"))
    }

    /// Raw (untrimmed) values list, preserving empty slots. Needed by the
    /// pair rule, where both positions must be individually non-empty.
    fn raw_values(&self, key: &str) -> Vec<String> {
        self.0
            .get(&format!("{key}_values"))
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .map(|v| v.as_str().unwrap_or("").to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn string_list(&self, map_key: &str) -> Vec<String> {
        self.0
            .get(map_key)
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str())
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Validate the detail entries of every checked item that expects an input.
///
/// A checked item with a missing or empty input fails with a user-facing
/// message; unchecked items are ignored regardless of their details.
pub fn validate_details(checklist: &Checklist) -> Result<(), ValidationError> {
    for item in ITEMS {
        if !checklist.is_checked(item.key) {
            continue;
        }
        match item.input {
            InputKind::None => {}
            InputKind::Single => {
                if checklist.detail_value(item.key).is_none() {
                    return Err(ValidationError::MissingDetail(item.key));
                }
            }
            InputKind::Pair => {
                let values = checklist.raw_values(item.key);
                if values.len() != 2 || values.iter().any(|v| v.trim().is_empty()) {
                    return Err(ValidationError::IncompletePair);
                }
            }
            InputKind::RepoList => {
                if checklist.repo_names(item.key).is_empty() {
                    return Err(ValidationError::EmptyRepositoryList);
                }
            }
        }
    }
    Ok(())
}

/// Completion snapshot over the 13 fixed top-level items, rounded to the
/// nearest percent.
pub fn completion_percentage(checklist: &Checklist) -> u8 {
    let completed = ITEMS.iter().filter(|i| checklist.is_checked(i.key)).count();
    ((completed as f64 / ITEMS.len() as f64) * 100.0).round() as u8
}

/// A repository registered in an in-progress booking session, carrying its
/// own copy of the pre-release and testing workflow items. Session-scoped:
/// only the name list survives submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub pre_release: BTreeMap<String, bool>,
    #[serde(default)]
    pub testing: BTreeMap<String, bool>,
}

impl RepositoryEntry {
    /// Create a fresh entry with all workflow items unchecked.
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            pre_release: REPO_PRE_RELEASE_ITEMS
                .iter()
                .map(|k| (k.to_string(), false))
                .collect(),
            testing: REPO_TESTING_ITEMS
                .iter()
                .map(|k| (k.to_string(), false))
                .collect(),
        }
    }

    /// Completed workflow items for this repository.
    pub fn completed_items(&self) -> usize {
        self.pre_release.values().filter(|v| **v).count()
            + self.testing.values().filter(|v| **v).count()
    }

    /// Per-repository progress, rounded to the nearest percent.
    pub fn progress(&self) -> u8 {
        ((self.completed_items() as f64 / ITEMS_PER_REPOSITORY as f64) * 100.0).round() as u8
    }
}

/// Booking-session repository list with duplicate protection.
#[derive(Debug, Clone, Default)]
pub struct RepositorySession {
    repositories: Vec<RepositoryEntry>,
}

/// Session mutation failures, surfaced to the user.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("Please enter a repository/component name")]
    EmptyName,
    #[error("Repository already added")]
    DuplicateName,
}

impl RepositorySession {
    pub fn repositories(&self) -> &[RepositoryEntry] {
        &self.repositories
    }

    /// Register a repository; names are unique within the session.
    pub fn add(&mut self, id: String, name: &str) -> Result<(), SessionError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SessionError::EmptyName);
        }
        if self.repositories.iter().any(|r| r.name == name) {
            return Err(SessionError::DuplicateName);
        }
        self.repositories
            .push(RepositoryEntry::new(id, name.to_string()));
        Ok(())
    }

    /// Remove a repository by id; unknown ids are ignored.
    pub fn remove(&mut self, id: &str) {
        self.repositories.retain(|r| r.id != id);
    }
}

/// Record-weighted session progress: each repository contributes a fixed
/// denominator of 7 regardless of documentation size, documentation
/// contributes a fixed 5. Not a simple average of checklist booleans.
pub fn workflow_progress(repositories: &[RepositoryEntry], checklist: &Checklist) -> u8 {
    let repo_total = repositories.len() * ITEMS_PER_REPOSITORY;
    let repo_done: usize = repositories.iter().map(|r| r.completed_items()).sum();

    let doc_items: Vec<&ItemSpec> = ITEMS
        .iter()
        .filter(|i| i.phase == Phase::Documentation)
        .collect();
    let doc_done = doc_items
        .iter()
        .filter(|i| checklist.is_checked(i.key))
        .count();

    let total = repo_total + doc_items.len();
    if total == 0 {
        return 0;
    }
    (((repo_done + doc_done) as f64 / total as f64) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn checklist_with(entries: &[(&str, serde_json::Value)]) -> Checklist {
        Checklist(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn catalog_has_three_phases() {
        let count = |p: Phase| ITEMS.iter().filter(|i| i.phase == p).count();
        assert_eq!(count(Phase::PreRelease), 4);
        assert_eq!(count(Phase::Testing), 4);
        assert_eq!(count(Phase::Documentation), 5);
    }

    #[test]
    fn completion_is_flat_over_thirteen_items() {
        let mut checklist = Checklist::default();
        assert_eq!(completion_percentage(&checklist), 0);

        for item in ITEMS.iter().take(7) {
            checklist.set_checked(item.key, true);
        }
        // 7/13 = 53.8 rounds to 54
        assert_eq!(completion_percentage(&checklist), 54);

        for item in ITEMS {
            checklist.set_checked(item.key, true);
        }
        assert_eq!(completion_percentage(&checklist), 100);
    }

    #[test]
    fn workflow_progress_is_record_weighted() {
        // One repository with 3 of 7 items done, 2 of 5 documentation items:
        // round((3+2)/(7+5)*100) = 42
        let mut repo = RepositoryEntry::new("1".to_string(), "ingest-api".to_string());
        repo.pre_release.insert("pomVersionIncremented".to_string(), true);
        repo.pre_release.insert("releaseVersionInline".to_string(), true);
        repo.testing.insert("purlPreparedFromCert".to_string(), true);

        let checklist = checklist_with(&[
            ("releasePageGenerated", json!(true)),
            ("evidencesAttached", json!(true)),
        ]);

        assert_eq!(workflow_progress(&[repo], &checklist), 42);
    }

    #[test]
    fn workflow_progress_without_repositories_counts_documentation_only() {
        let checklist = checklist_with(&[("evidencesAttached", json!(true))]);
        // 1/5 = 20
        assert_eq!(workflow_progress(&[], &checklist), 20);
    }

    #[test]
    fn checked_single_item_requires_value() {
        let checklist = checklist_with(&[("crCreated", json!(true))]);
        assert_eq!(
            validate_details(&checklist).unwrap_err(),
            ValidationError::MissingDetail("crCreated")
        );

        let checklist = checklist_with(&[
            ("crCreated", json!(true)),
            ("crCreated_value", json!("CR-1234")),
        ]);
        assert!(validate_details(&checklist).is_ok());
    }

    #[test]
    fn pair_item_requires_both_values() {
        let checklist = checklist_with(&[
            ("confluenceJira", json!(true)),
            ("confluenceJira_values", json!(["PROJ-1", ""])),
        ]);
        assert_eq!(
            validate_details(&checklist).unwrap_err(),
            ValidationError::IncompletePair
        );

        let checklist = checklist_with(&[
            ("confluenceJira", json!(true)),
            ("confluenceJira_values", json!(["PROJ-1", "https://conf/x"])),
        ]);
        assert!(validate_details(&checklist).is_ok());
    }

    #[test]
    fn repo_list_item_requires_one_row() {
        let checklist = checklist_with(&[
            ("componentsReposImpacted", json!(true)),
            ("componentsReposImpacted_repos", json!(["", "  "])),
        ]);
        assert_eq!(
            validate_details(&checklist).unwrap_err(),
            ValidationError::EmptyRepositoryList
        );
    }

    #[test]
    fn unchecked_items_skip_detail_validation() {
        let checklist = checklist_with(&[("crCreated", json!(false))]);
        assert!(validate_details(&checklist).is_ok());
    }

    #[test]
    fn session_rejects_duplicate_and_empty_names() {
        let mut session = RepositorySession::default();
        session.add("1".to_string(), "ingest-api").unwrap();
        assert_eq!(
            session.add("2".to_string(), "ingest-api").unwrap_err(),
            SessionError::DuplicateName
        );
        assert_eq!(
            session.add("3".to_string(), "   ").unwrap_err(),
            SessionError::EmptyName
        );
        session.remove("1");
        assert!(session.repositories().is_empty());
    }
}
