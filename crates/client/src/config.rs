//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `BARBUDDY_DATA_DIR` - Directory for store snapshots (default: .barbuddy)
//! - `SUPABASE_URL` - Backend project URL
//! - `SUPABASE_ANON_KEY` - Backend anonymous API key
//! - `BARBUDDY_API_BASE_URL` - RPC base URL (default: `SUPABASE_URL`)
//! - `BARBUDDY_DEMO_MODE` - Force demo mode (default: false)
//! - `BARBUDDY_CHAT_POLL_SECS` - Chat poll interval in seconds (default: 5)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//!
//! Demo mode is in effect when `BARBUDDY_DEMO_MODE` is set or when the
//! backend URL or key is missing.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const DEFAULT_DATA_DIR: &str = ".barbuddy";
const DEFAULT_CHAT_POLL_SECS: u64 = 5;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Directory holding one snapshot file per store
    pub data_dir: PathBuf,
    /// Backend connection, `None` when unconfigured
    pub backend: Option<BackendConfig>,
    /// Demo mode requested explicitly
    pub demo_mode: bool,
    /// How often a chat subscription polls for messages
    pub chat_poll_interval: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Backend endpoints and credentials.
///
/// Implements `Debug` manually to redact the key.
#[derive(Clone)]
pub struct BackendConfig {
    /// Supabase project URL (tables and auth)
    pub supabase_url: Url,
    /// Base URL of the RPC layer
    pub api_base_url: Url,
    /// Anonymous API key
    pub anon_key: SecretString,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("supabase_url", &self.supabase_url.as_str())
            .field("api_base_url", &self.api_base_url.as_str())
            .field("anon_key", &"[REDACTED]")
            .finish()
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but invalid, or if the
    /// backend key looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Same as [`ClientConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let data_dir = PathBuf::from(get("BARBUDDY_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()));

        let demo_mode = match get("BARBUDDY_DEMO_MODE") {
            Some(value) => parse_bool("BARBUDDY_DEMO_MODE", &value)?,
            None => false,
        };

        let chat_poll_secs = match get("BARBUDDY_CHAT_POLL_SECS") {
            Some(value) => value
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    ConfigError::InvalidEnvVar(
                        "BARBUDDY_CHAT_POLL_SECS".to_string(),
                        format!("expected a positive number of seconds, got '{value}'"),
                    )
                })?,
            None => DEFAULT_CHAT_POLL_SECS,
        };

        let backend = match (get("SUPABASE_URL"), get("SUPABASE_ANON_KEY")) {
            (Some(url), Some(key)) => {
                let supabase_url = parse_url("SUPABASE_URL", &url)?;
                let api_base_url = match get("BARBUDDY_API_BASE_URL") {
                    Some(api) => parse_url("BARBUDDY_API_BASE_URL", &api)?,
                    None => supabase_url.clone(),
                };
                validate_not_placeholder(&key, "SUPABASE_ANON_KEY")?;
                Some(BackendConfig {
                    supabase_url,
                    api_base_url,
                    anon_key: SecretString::from(key),
                })
            }
            _ => None,
        };

        Ok(Self {
            data_dir,
            backend,
            demo_mode,
            chat_poll_interval: Duration::from_secs(chat_poll_secs),
            sentry_dsn: get("SENTRY_DSN"),
        })
    }

    /// Offline configuration rooted at `data_dir`.
    #[must_use]
    pub fn demo(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            backend: None,
            demo_mode: true,
            chat_poll_interval: Duration::from_secs(DEFAULT_CHAT_POLL_SECS),
            sentry_dsn: None,
        }
    }

    /// Whether remote calls are replaced by no-ops.
    #[must_use]
    pub const fn is_demo(&self) -> bool {
        self.demo_mode || self.backend.is_none()
    }
}

impl BackendConfig {
    pub(crate) fn anon_key(&self) -> &str {
        self.anon_key.expose_secret()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got '{other}'"),
        )),
    }
}

fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    if PLACEHOLDER_PATTERNS
        .iter()
        .any(|p| url.as_str().to_lowercase().contains(p))
    {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "appears to be a placeholder".to_string(),
        ));
    }
    Ok(url)
}

/// Reject keys copied verbatim from a template.
fn validate_not_placeholder(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ClientConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ClientConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_are_demo() {
        let config = load(&[]).unwrap();
        assert_eq!(config.data_dir, PathBuf::from(".barbuddy"));
        assert_eq!(config.chat_poll_interval, Duration::from_secs(5));
        assert!(config.backend.is_none());
        assert!(config.is_demo());
    }

    #[test]
    fn test_backend_configured() {
        let config = load(&[
            ("SUPABASE_URL", "https://abcd.supabase.co"),
            ("SUPABASE_ANON_KEY", "eyJhbGciOiJIUzI1NiJ9.abc.def"),
        ])
        .unwrap();
        let backend = config.backend.as_ref().unwrap();
        assert_eq!(backend.api_base_url, backend.supabase_url);
        assert!(!config.is_demo());
    }

    #[test]
    fn test_demo_flag_wins() {
        let config = load(&[
            ("SUPABASE_URL", "https://abcd.supabase.co"),
            ("SUPABASE_ANON_KEY", "eyJhbGciOiJIUzI1NiJ9.abc.def"),
            ("BARBUDDY_DEMO_MODE", "true"),
        ])
        .unwrap();
        assert!(config.is_demo());
    }

    #[test]
    fn test_missing_key_means_demo() {
        let config = load(&[("SUPABASE_URL", "https://abcd.supabase.co")]).unwrap();
        assert!(config.is_demo());
    }

    #[test]
    fn test_placeholder_key_rejected() {
        let err = load(&[
            ("SUPABASE_URL", "https://abcd.supabase.co"),
            ("SUPABASE_ANON_KEY", "your-anon-key"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_invalid_values() {
        assert!(load(&[("BARBUDDY_DEMO_MODE", "maybe")]).is_err());
        assert!(load(&[("BARBUDDY_CHAT_POLL_SECS", "0")]).is_err());
        assert!(
            load(&[
                ("SUPABASE_URL", "ftp://abcd.supabase.co"),
                ("SUPABASE_ANON_KEY", "eyJhbGciOiJIUzI1NiJ9.abc.def"),
            ])
            .is_err()
        );
    }

    #[test]
    fn test_backend_debug_redacts_key() {
        let config = load(&[
            ("SUPABASE_URL", "https://abcd.supabase.co"),
            ("SUPABASE_ANON_KEY", "super_secret_anon_value"),
        ])
        .unwrap();
        let debug_output = format!("{:?}", config.backend.unwrap());
        assert!(debug_output.contains("abcd.supabase.co"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_anon_value"));
    }
}
