//! Configuration loading and root folder resolution

use crate::{Error, Result};
use std::path::PathBuf;

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file (`root_folder` key)
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&str>, env_var_name: &str) -> Result<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Ok(PathBuf::from(path));
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        return Ok(PathBuf::from(path));
    }

    // Priority 3: TOML config file
    if let Ok(config_path) = locate_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(root_folder) = config.get("root_folder").and_then(|v| v.as_str()) {
                    return Ok(PathBuf::from(root_folder));
                }
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    Ok(default_root_folder())
}

/// Get default configuration file path for the platform
fn locate_config_file() -> Result<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("relcal").join("config.toml"));

    if let Some(path) = user_config {
        if path.exists() {
            return Ok(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/relcal/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    Err(Error::Config("No config file found".to_string()))
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("relcal"))
        .unwrap_or_else(|| PathBuf::from("./relcal_data"))
}

/// Upstream service endpoints and credentials, loaded from the environment.
///
/// Matches the deployment scheme of the original dashboard: each external
/// collaborator is configured by a base URL plus an optional bearer token.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// DORA metrics API base URL
    pub metrics_base_url: String,
    /// Bearer token for the metrics API (None disables the pipeline)
    pub metrics_token: Option<String>,
    /// Staff directory API base URL
    pub directory_base_url: String,
    /// Bearer token for the directory API
    pub directory_token: Option<String>,
    /// Mail relay dispatch endpoint
    pub mail_relay_url: Option<String>,
    /// From-address stamped on outgoing notifications
    pub mail_from: String,
}

impl UpstreamConfig {
    /// Load upstream configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            metrics_base_url: std::env::var("RELCAL_METRICS_BASE_URL")
                .unwrap_or_else(|_| "https://datasight.example.com".to_string()),
            metrics_token: std::env::var("RELCAL_METRICS_BEARER_TOKEN").ok(),
            directory_base_url: std::env::var("RELCAL_DIRECTORY_BASE_URL")
                .unwrap_or_else(|_| "https://api-teambook.example.com".to_string()),
            directory_token: std::env::var("RELCAL_DIRECTORY_BEARER_TOKEN").ok(),
            mail_relay_url: std::env::var("RELCAL_MAIL_RELAY_URL").ok(),
            mail_from: std::env::var("RELCAL_MAIL_FROM")
                .unwrap_or_else(|_| "noreply@example.com".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_arg_takes_priority() {
        let root = resolve_root_folder(Some("/tmp/explicit"), "RELCAL_TEST_UNSET_VAR").unwrap();
        assert_eq!(root, PathBuf::from("/tmp/explicit"));
    }

    #[test]
    fn falls_back_to_default_without_overrides() {
        let root = resolve_root_folder(None, "RELCAL_TEST_UNSET_VAR").unwrap();
        assert!(!root.as_os_str().is_empty());
    }
}
