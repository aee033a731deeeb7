//! Conflict detection and alternative-slot suggestion
//!
//! Pure queries over the in-memory release collection. The engine only
//! reports conflicts; blocking or proceeding anyway is the caller's call,
//! made with explicit user confirmation.

use chrono::{Datelike, Days, NaiveDate, Weekday};

use crate::release::Release;

/// How far around a candidate date alternative slots are scanned.
pub const SUGGESTION_HORIZON_DAYS: i64 = 7;

/// Maximum number of alternative slots returned.
pub const MAX_SUGGESTIONS: usize = 5;

/// Releases scheduled on exactly the given calendar day.
///
/// `exclude_id` removes the record currently being edited from its own
/// conflict set: a self-conflict is not a conflict.
pub fn releases_on_date<'a>(
    releases: &'a [Release],
    date: NaiveDate,
    exclude_id: Option<&str>,
) -> Vec<&'a Release> {
    releases
        .iter()
        .filter(|r| r.release_date == date)
        .filter(|r| exclude_id != Some(r.id.as_str()))
        .collect()
}

/// Whether booking on the given day would multi-book it.
pub fn has_conflict(releases: &[Release], date: NaiveDate, exclude_id: Option<&str>) -> bool {
    !releases_on_date(releases, date, exclude_id).is_empty()
}

/// Suggest open weekday slots near a candidate date.
///
/// Scans offsets -7..=+7 (excluding the candidate itself) in ascending
/// order, so results come out earliest-first rather than sorted by
/// distance from the candidate. Weekends, days strictly before `today`,
/// and days already occupied by a release are skipped. At most
/// [`MAX_SUGGESTIONS`] dates are returned.
pub fn suggest_alternatives(
    releases: &[Release],
    candidate: NaiveDate,
    today: NaiveDate,
) -> Vec<NaiveDate> {
    let mut alternatives = Vec::new();

    for offset in -SUGGESTION_HORIZON_DAYS..=SUGGESTION_HORIZON_DAYS {
        if offset == 0 {
            continue;
        }
        let test_date = match shift(candidate, offset) {
            Some(d) => d,
            None => continue,
        };

        if matches!(test_date.weekday(), Weekday::Sat | Weekday::Sun) {
            continue;
        }
        if test_date < today {
            continue;
        }
        if !releases_on_date(releases, test_date, None).is_empty() {
            continue;
        }

        alternatives.push(test_date);
        if alternatives.len() >= MAX_SUGGESTIONS {
            break;
        }
    }

    alternatives
}

fn shift(date: NaiveDate, offset: i64) -> Option<NaiveDate> {
    if offset >= 0 {
        date.checked_add_days(Days::new(offset as u64))
    } else {
        date.checked_sub_days(Days::new((-offset) as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::release::ReleaseDraft;
    use chrono::Utc;

    fn release_on(id: &str, date: &str) -> Release {
        let draft = ReleaseDraft {
            team_name: "Team".to_string(),
            app_name: format!("app-{id}"),
            release_date: date.to_string(),
            dry_run_date: "2020-01-01".to_string(),
            contact_person: "Someone".to_string(),
            contact_email: "someone@example.com".to_string(),
            ..Default::default()
        };
        let mut release = draft.validate().unwrap().into_release(Utc::now());
        release.id = id.to_string();
        release
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn matches_exact_calendar_day_only() {
        let releases = vec![
            release_on("a", "2025-06-10"),
            release_on("b", "2025-06-10"),
            release_on("c", "2025-06-11"),
        ];

        let tuesday = releases_on_date(&releases, date("2025-06-10"), None);
        assert_eq!(tuesday.len(), 2);
        assert!(has_conflict(&releases, date("2025-06-10"), None));

        assert!(releases_on_date(&releases, date("2025-06-12"), None).is_empty());
    }

    #[test]
    fn editing_excludes_self_from_conflict_set() {
        let releases = vec![release_on("a", "2025-06-10")];
        assert!(!has_conflict(&releases, date("2025-06-10"), Some("a")));
        assert!(has_conflict(&releases, date("2025-06-10"), Some("other")));
    }

    #[test]
    fn suggestions_skip_weekends_past_and_occupied_days() {
        // Candidate: Wednesday 2025-06-11. Monday and Tuesday before it are
        // free weekdays; today is the Monday, so nothing earlier qualifies.
        let releases = vec![release_on("a", "2025-06-11")];
        let today = date("2025-06-09");

        let suggestions = suggest_alternatives(&releases, date("2025-06-11"), today);

        // Ascending scan: Mon 9th, Tue 10th, then forward past the candidate.
        assert_eq!(
            suggestions,
            vec![
                date("2025-06-09"),
                date("2025-06-10"),
                date("2025-06-12"),
                date("2025-06-13"),
                date("2025-06-16"),
            ]
        );
    }

    #[test]
    fn suggestions_exclude_candidate_itself() {
        let today = date("2025-06-09");
        let suggestions = suggest_alternatives(&[], date("2025-06-11"), today);
        assert!(!suggestions.contains(&date("2025-06-11")));
        assert_eq!(suggestions.len(), MAX_SUGGESTIONS);
    }

    #[test]
    fn occupied_alternative_days_are_skipped() {
        let releases = vec![
            release_on("a", "2025-06-11"),
            release_on("b", "2025-06-09"),
            release_on("c", "2025-06-10"),
        ];
        let today = date("2025-06-09");

        let suggestions = suggest_alternatives(&releases, date("2025-06-11"), today);
        assert!(!suggestions.contains(&date("2025-06-09")));
        assert!(!suggestions.contains(&date("2025-06-10")));
        assert_eq!(suggestions[0], date("2025-06-12"));
    }
}
