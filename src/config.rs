//! Configuration file parser for ~/.config/tripfeed/config.toml.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are silently ignored by serde (with `deny_unknown_fields` off),
//! though we log a warning when the file contains potential typos.
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Public tourism open API (English/Korean service, JSON over HTTPS).
pub const DEFAULT_BASE_URL: &str = "https://apis.data.go.kr/B551011/KorService1";

/// Environment variable that overrides `service_key` from the file.
pub const SERVICE_KEY_ENV: &str = "TRIPFEED_SERVICE_KEY";

/// Largest radius the location search accepts upstream.
pub const MAX_RADIUS_METERS: u32 = 20_000;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid config value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
///
/// Custom Debug impl masks `service_key` to prevent secret leakage
/// in logs, error messages, and debug output.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the tourism API service.
    pub base_url: String,

    /// API service key (alternative to the TRIPFEED_SERVICE_KEY env var).
    /// Env var takes precedence over config file.
    pub service_key: Option<String>,

    /// Rows requested per page.
    pub page_size: u32,

    /// Radius used when a location fix becomes the anchor.
    pub default_radius_meters: u32,

    /// Per-request HTTP timeout in the provider.
    pub request_timeout_secs: u64,

    /// Platform identifier required by the API (`MobileOS`).
    pub mobile_os: String,

    /// Application name required by the API (`MobileApp`).
    pub mobile_app: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            service_key: None,
            page_size: 10,
            default_radius_meters: 2_000,
            request_timeout_secs: 20,
            mobile_os: "ETC".to_string(),
            mobile_app: "tripfeed".to_string(),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("page_size", &self.page_size)
            .field("default_radius_meters", &self.default_radius_meters)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("mobile_os", &self.mobile_os)
            .field("mobile_app", &self.mobile_app)
            .field(
                "service_key",
                &self.service_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 7] = [
        "base_url",
        "service_key",
        "page_size",
        "default_radius_meters",
        "request_timeout_secs",
        "mobile_os",
        "mobile_app",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Out-of-range values → `Err(ConfigError::Invalid)`
    /// - Unknown keys → silently accepted (serde default behavior), logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race condition: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        Self::parse(&content)
    }

    /// Parse configuration from TOML text. Blank input yields defaults.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            tracing::debug!("Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        config.validate()?;
        tracing::info!(base_url = %config.base_url, page_size = config.page_size, "Loaded configuration");
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Invalid {
                key: "page_size",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.default_radius_meters == 0 || self.default_radius_meters > MAX_RADIUS_METERS {
            return Err(ConfigError::Invalid {
                key: "default_radius_meters",
                reason: format!("must be between 1 and {}", MAX_RADIUS_METERS),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "request_timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "base_url",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Apply the service key from the environment, which wins over the file.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var(SERVICE_KEY_ENV) {
            if !key.trim().is_empty() {
                self.service_key = Some(key);
            }
        }
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
