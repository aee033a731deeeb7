//! HTTP API handlers for relcal-server

pub mod calendar;
pub mod health;
pub mod lttd;
pub mod releases;
pub mod transfer;

pub use calendar::{calendar_view, dashboard_view, date_suggestions, releases_on_date};
pub use health::health_routes;
pub use lttd::{lttd_fetch_emails, lttd_records, lttd_send_emails};
pub use releases::{
    bulk_replace, create_release, delete_release, get_release, list_releases, release_warnings,
    update_release,
};
pub use transfer::{export_releases, import_releases};
