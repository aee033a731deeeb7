//! HTTP clients for upstream services

pub mod directory;
pub mod mail;
pub mod metrics;

pub use directory::DirectoryClient;
pub use mail::MailClient;
pub use metrics::MetricsClient;
