//! # Relcal Common Library
//!
//! Shared code for the release-calendar service including:
//! - Release data model and draft validation
//! - Readiness checklist catalog and progress math
//! - Scheduling conflict detection and alternative-date suggestion
//! - Calendar/dashboard render models
//! - LTTD metric record filtering and grouping
//! - Configuration loading

pub mod calendar;
pub mod checklist;
pub mod config;
pub mod error;
pub mod lttd;
pub mod release;
pub mod schedule;

pub use error::{Error, Result};
pub use release::Release;
