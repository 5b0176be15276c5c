//! Runtime configuration resolved from the environment.
//!
//! Values come from process environment variables, optionally seeded from a
//! `.env` file in the working directory. The backend base URL is the only
//! required setting.

use std::path::PathBuf;
use std::time::Duration;

pub const BACKEND_URL_VAR: &str = "SYMPTOM_ASSIST_BACKEND_URL";
/// Accepted when the namespaced variable is unset.
pub const BACKEND_URL_FALLBACK_VAR: &str = "BACKEND_URL";
pub const TIMEOUT_VAR: &str = "SYMPTOM_ASSIST_TIMEOUT_SECS";
pub const LOG_MODE_VAR: &str = "SYMPTOM_ASSIST_LOG_MODE";
pub const LOG_FILE_VAR: &str = "SYMPTOM_ASSIST_LOG_FILE";

pub const ANALYZE_PATH: &str = "/api/analyze-symptom";
pub const HEALTH_PATH: &str = "/api/health";

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_LOG_FILE: &str = "symptom-assist.log";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("SYMPTOM_ASSIST_BACKEND_URL is not set. Point it at the analysis backend, e.g. http://localhost:8001")]
    MissingBackendUrl,

    #[error("Invalid backend URL {url:?}: {reason}")]
    InvalidBackendUrl { url: String, reason: String },

    #[error("Invalid SYMPTOM_ASSIST_TIMEOUT_SECS value {0:?}: expected a positive number of seconds")]
    InvalidTimeout(String),

    #[error("Failed to read .env file: {0}")]
    DotEnv(String),
}

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMode {
    /// File when attached to a terminal, stdout otherwise.
    #[default]
    Auto,
    File,
    Stdout,
}

impl LogMode {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "file" => Self::File,
            "stdout" => Self::Stdout,
            _ => Self::Auto,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Base URL without trailing slash.
    pub backend_url: String,
    pub request_timeout: Duration,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
}

impl AppConfig {
    /// Load `.env` (if present) and then read the environment.
    ///
    /// # Errors
    /// Returns `ConfigError` if the backend URL is missing or invalid, the
    /// timeout is not a positive integer, or `.env` exists but is unreadable.
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(ConfigError::DotEnv(e.to_string()));
            }
        }
        Self::from_env()
    }

    /// Read configuration from process environment variables.
    ///
    /// # Errors
    /// See [`AppConfig::load`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    /// See [`AppConfig::load`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = lookup(BACKEND_URL_VAR)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| lookup(BACKEND_URL_FALLBACK_VAR))
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingBackendUrl)?;
        let backend_url = normalize_base_url(&raw_url)?;

        let request_timeout = match lookup(TIMEOUT_VAR) {
            Some(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?;
                if secs == 0 {
                    return Err(ConfigError::InvalidTimeout(raw));
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let log_mode = lookup(LOG_MODE_VAR)
            .map(|v| LogMode::parse(&v))
            .unwrap_or_default();

        let log_file = lookup(LOG_FILE_VAR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));

        Ok(Self {
            backend_url,
            request_timeout,
            log_mode,
            log_file,
        })
    }

    /// Configuration pointing at `backend_url` with all other defaults.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidBackendUrl` if the URL is not http(s).
    pub fn for_backend(backend_url: &str) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| (key == BACKEND_URL_VAR).then(|| backend_url.to_string()))
    }

    #[must_use]
    pub fn analyze_url(&self) -> String {
        format!("{}{}", self.backend_url, ANALYZE_PATH)
    }

    #[must_use]
    pub fn health_url(&self) -> String {
        format!("{}{}", self.backend_url, HEALTH_PATH)
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let invalid = |reason: String| ConfigError::InvalidBackendUrl {
        url: raw.to_string(),
        reason,
    };

    let url = reqwest::Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme {other:?}"))),
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::from_lookup(lookup(&[(BACKEND_URL_VAR, "http://localhost:8001/")]))
            .expect("valid");
        assert_eq!(cfg.backend_url, "http://localhost:8001");
        assert_eq!(cfg.request_timeout, Duration::from_secs(60));
        assert_eq!(cfg.log_mode, LogMode::Auto);
        assert_eq!(cfg.log_file, PathBuf::from("symptom-assist.log"));
        assert_eq!(cfg.analyze_url(), "http://localhost:8001/api/analyze-symptom");
        assert_eq!(cfg.health_url(), "http://localhost:8001/api/health");
    }

    #[test]
    fn test_missing_url_is_an_error() {
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[])),
            Err(ConfigError::MissingBackendUrl)
        ));
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[(BACKEND_URL_VAR, "   ")])),
            Err(ConfigError::MissingBackendUrl)
        ));
    }

    #[test]
    fn test_fallback_variable() {
        let cfg = AppConfig::from_lookup(lookup(&[(BACKEND_URL_FALLBACK_VAR, "https://api.example.org")]))
            .expect("valid");
        assert_eq!(cfg.backend_url, "https://api.example.org");
    }

    #[test]
    fn test_invalid_values() {
        for url in ["localhost:8001", "ftp://example.org", "not a url"] {
            assert!(
                matches!(
                    AppConfig::from_lookup(lookup(&[(BACKEND_URL_VAR, url)])),
                    Err(ConfigError::InvalidBackendUrl { .. })
                ),
                "{url}"
            );
        }
        for timeout in ["0", "-3", "soon"] {
            assert!(matches!(
                AppConfig::from_lookup(lookup(&[
                    (BACKEND_URL_VAR, "http://localhost:8001"),
                    (TIMEOUT_VAR, timeout),
                ])),
                Err(ConfigError::InvalidTimeout(_))
            ));
        }
    }

    #[test]
    fn test_overrides() {
        let cfg = AppConfig::from_lookup(lookup(&[
            (BACKEND_URL_VAR, "http://10.0.0.2:9000/base/"),
            (TIMEOUT_VAR, "15"),
            (LOG_MODE_VAR, "STDOUT"),
            (LOG_FILE_VAR, "/tmp/assist.log"),
        ]))
        .expect("valid");
        assert_eq!(cfg.backend_url, "http://10.0.0.2:9000/base");
        assert_eq!(cfg.request_timeout, Duration::from_secs(15));
        assert_eq!(cfg.log_mode, LogMode::Stdout);
        assert_eq!(cfg.log_file, PathBuf::from("/tmp/assist.log"));
    }
}
