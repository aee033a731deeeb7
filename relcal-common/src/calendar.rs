//! Calendar and dashboard render models
//!
//! Pure projection from the release collection to a render model the UI
//! layer consumes. Nothing here owns state or touches the store.

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;

use crate::release::{Release, ReleaseState};
use crate::schedule;

/// Days ahead covered by the upcoming-releases feed.
pub const FEED_WINDOW_DAYS: u64 = 30;

/// Releases this close to their date with an incomplete checklist are
/// flagged for attention.
pub const WARNING_WINDOW_DAYS: i64 = 3;

/// One cell of the 42-cell month grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridCell {
    pub date: NaiveDate,
    /// False for the leading/trailing days of adjacent months.
    pub in_month: bool,
    pub is_today: bool,
    pub release_count: usize,
    /// At least one release on this day.
    pub booked: bool,
    /// Two or more releases on this day.
    pub conflict: bool,
}

/// Month grid: always 6 full weeks (42 cells) starting from the Sunday
/// on/before the first of the viewed month.
pub fn month_grid(releases: &[Release], year: i32, month: u32, today: NaiveDate) -> Vec<GridCell> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .unwrap_or_else(|| today.with_day(1).unwrap_or(today));
    let start = first - Days::new(first.weekday().num_days_from_sunday() as u64);

    (0..42)
        .map(|i| {
            let date = start + Days::new(i);
            let count = schedule::releases_on_date(releases, date, None).len();
            GridCell {
                date,
                in_month: date.month() == month && date.year() == year,
                is_today: date == today,
                release_count: count,
                booked: count >= 1,
                conflict: count >= 2,
            }
        })
        .collect()
}

/// One entry of the upcoming-releases feed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEntry {
    pub release: Release,
    pub days_until: i64,
    /// Total releases sharing this date (including this one).
    pub releases_on_day: usize,
    pub conflict: bool,
    /// Within the warning window and not 100% complete.
    pub warning: bool,
    pub ready: bool,
    /// Lifecycle state of the record at render time.
    pub state: ReleaseState,
}

/// Upcoming feed: releases in [today, today + 30 days], ascending by date,
/// each annotated with days-until and conflict/warning/ready badges.
pub fn upcoming_feed(releases: &[Release], today: NaiveDate) -> Vec<FeedEntry> {
    let horizon = today + Days::new(FEED_WINDOW_DAYS);

    let mut upcoming: Vec<&Release> = releases
        .iter()
        .filter(|r| r.release_date >= today && r.release_date <= horizon)
        .collect();
    upcoming.sort_by_key(|r| r.release_date);

    upcoming
        .into_iter()
        .map(|r| {
            let on_day = schedule::releases_on_date(releases, r.release_date, None).len();
            let days_until = (r.release_date - today).num_days();
            FeedEntry {
                days_until,
                releases_on_day: on_day,
                conflict: on_day > 1,
                warning: days_until <= WARNING_WINDOW_DAYS && r.completion_percentage < 100,
                ready: r.completion_percentage == 100,
                state: r.state(),
                release: r.clone(),
            }
        })
        .collect()
}

/// Releases that warrant an advance readiness advisory: within 3 days of
/// their date and either under 100% complete or still flagged as planned.
/// Non-blocking; surfacing it is the caller's job.
pub fn readiness_warnings<'a>(releases: &'a [Release], today: NaiveDate) -> Vec<&'a Release> {
    let horizon = today + Days::new(WARNING_WINDOW_DAYS as u64);
    releases
        .iter()
        .filter(|r| r.release_date >= today && r.release_date <= horizon)
        .filter(|r| r.completion_percentage < 100 || r.is_planned)
        .collect()
}

/// Headline counters for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_releases: usize,
    /// Releases falling in the viewed month.
    pub monthly_releases: usize,
    /// Distinct dates carrying more than one release.
    pub conflict_dates: usize,
    /// Releases in the next 7 days (inclusive).
    pub upcoming_week: usize,
}

/// Compute dashboard counters for the viewed month.
pub fn stats(releases: &[Release], today: NaiveDate, year: i32, month: u32) -> Stats {
    let monthly = releases
        .iter()
        .filter(|r| r.release_date.year() == year && r.release_date.month() == month)
        .count();

    let mut by_date: std::collections::BTreeMap<NaiveDate, usize> = Default::default();
    for r in releases {
        *by_date.entry(r.release_date).or_default() += 1;
    }
    let conflict_dates = by_date.values().filter(|c| **c > 1).count();

    let week_horizon = today + Days::new(7);
    let upcoming_week = releases
        .iter()
        .filter(|r| r.release_date >= today && r.release_date <= week_horizon)
        .count();

    Stats {
        total_releases: releases.len(),
        monthly_releases: monthly,
        conflict_dates,
        upcoming_week,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::release::ReleaseDraft;
    use chrono::{Utc, Weekday};

    fn release_on(id: &str, date: &str, completion: u8) -> Release {
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
        release.completion_percentage = completion;
        release.is_planned = completion < 100;
        release
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn grid_is_always_42_cells_starting_sunday() {
        let grid = month_grid(&[], 2025, 6, date("2025-06-15"));
        assert_eq!(grid.len(), 42);
        assert_eq!(grid[0].date.weekday(), Weekday::Sun);
        // June 1st 2025 is a Sunday, so the grid starts on the 1st.
        assert_eq!(grid[0].date, date("2025-06-01"));
        assert!(grid[0].in_month);
        // Cells past June 30 belong to July.
        assert!(!grid[41].in_month);
    }

    #[test]
    fn grid_leads_with_previous_month_when_first_is_midweek() {
        // July 1st 2025 is a Tuesday; the grid starts Sunday June 29.
        let grid = month_grid(&[], 2025, 7, date("2025-07-10"));
        assert_eq!(grid[0].date, date("2025-06-29"));
        assert!(!grid[0].in_month);
        assert!(grid[2].in_month);
    }

    #[test]
    fn booked_and_conflict_flags_follow_release_counts() {
        let releases = vec![
            release_on("a", "2025-06-10", 100),
            release_on("b", "2025-06-10", 50),
            release_on("c", "2025-06-11", 100),
        ];
        let grid = month_grid(&releases, 2025, 6, date("2025-06-01"));

        let cell = |d: &str| grid.iter().find(|c| c.date == date(d)).unwrap();
        assert!(cell("2025-06-10").booked);
        assert!(cell("2025-06-10").conflict);
        assert!(cell("2025-06-11").booked);
        assert!(!cell("2025-06-11").conflict);
        assert!(!cell("2025-06-12").booked);
    }

    #[test]
    fn feed_window_sorting_and_badges() {
        let today = date("2025-06-09");
        let releases = vec![
            release_on("far", "2025-07-20", 100),  // outside 30-day window
            release_on("soon", "2025-06-10", 50),  // warning: 1 day out, 50%
            release_on("later", "2025-06-25", 100),
            release_on("past", "2025-06-01", 100), // already released
        ];

        let feed = upcoming_feed(&releases, today);
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].release.id, "soon");
        assert_eq!(feed[0].days_until, 1);
        assert!(feed[0].warning);
        assert!(!feed[0].ready);
        assert_eq!(feed[0].state, ReleaseState::PlannedIncomplete);
        assert_eq!(feed[1].release.id, "later");
        assert!(feed[1].ready);
        assert!(!feed[1].warning);
        assert_eq!(feed[1].state, ReleaseState::PlannedComplete);
    }

    #[test]
    fn warnings_cover_incomplete_releases_within_three_days() {
        let today = date("2025-06-09");
        let releases = vec![
            release_on("a", "2025-06-10", 80),
            release_on("b", "2025-06-12", 100),
            release_on("c", "2025-06-13", 10), // 4 days out
        ];
        let warned = readiness_warnings(&releases, today);
        assert_eq!(warned.len(), 1);
        assert_eq!(warned[0].id, "a");
    }

    #[test]
    fn stats_count_month_conflicts_and_week() {
        let today = date("2025-06-09");
        let releases = vec![
            release_on("a", "2025-06-10", 100),
            release_on("b", "2025-06-10", 100),
            release_on("c", "2025-07-02", 100),
        ];
        let s = stats(&releases, today, 2025, 6);
        assert_eq!(s.total_releases, 3);
        assert_eq!(s.monthly_releases, 2);
        assert_eq!(s.conflict_dates, 1);
        assert_eq!(s.upcoming_week, 2);
    }
}
