//! Configuration for the FOLIO client
//!
//! Built in code with the `with_*` builder methods, or loaded from a TOML file:
//!
//! ```toml
//! base_url = "https://okapi.example.edu"
//! timeout = 120
//! auth_mode = "expiry"
//!
//! [login]
//! username = "app_user"
//! password = "secret"
//!
//! [okapi_headers]
//! X-Okapi-Tenant = "diku"
//! User-Agent = "my-app"
//!
//! [poll]
//! interval = 1
//! timeout = 300
//! not_found_tolerance = 3
//! ```

use crate::error::{FolioError, FolioResult};
use folio_core::{duration_secs, PollConfig, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Header carrying the tenant identifier
pub const TENANT_HEADER: &str = "X-Okapi-Tenant";

/// How the client obtains access tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// `/authn/login`, token returned in the `okapiToken` body field
    Legacy,
    /// `/authn/login-with-expiry`, token returned in the `folioAccessToken` cookie
    #[default]
    Expiry,
}

impl AuthMode {
    /// Login endpoint path for this mode
    #[must_use]
    pub fn login_path(self) -> &'static str {
        match self {
            Self::Legacy => "authn/login",
            Self::Expiry => "authn/login-with-expiry",
        }
    }
}

/// Credentials posted to the login endpoint
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginParams {
    /// FOLIO username
    pub username: String,
    /// FOLIO password
    pub password: String,
}

impl LoginParams {
    /// Create login params
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for LoginParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginParams")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the Okapi gateway
    pub base_url: String,
    /// Login credentials
    pub login: LoginParams,
    /// Extra headers sent with every request (tenant, user agent, ...)
    #[serde(default)]
    pub okapi_headers: BTreeMap<String, String>,
    /// Request timeout
    #[serde(with = "duration_secs", default = "default_timeout")]
    pub timeout: Duration,
    /// Token acquisition strategy
    #[serde(default)]
    pub auth_mode: AuthMode,
    /// Job polling defaults
    #[serde(default)]
    pub poll: PollConfig,
    /// Retry policy for the duplicate-key race on record edits
    #[serde(default)]
    pub duplicate_key_retry: RetryPolicy,
    /// Pause between the steps of a data import submission
    #[serde(with = "duration_secs", default = "default_import_step_delay")]
    pub import_step_delay: Duration,
}

fn default_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_import_step_delay() -> Duration {
    Duration::from_secs(5)
}

impl ClientConfig {
    /// Create a configuration with default timeouts and policies
    pub fn new(base_url: impl Into<String>, login: LoginParams) -> Self {
        Self {
            base_url: base_url.into(),
            login,
            okapi_headers: BTreeMap::new(),
            timeout: default_timeout(),
            auth_mode: AuthMode::default(),
            poll: PollConfig::default(),
            duplicate_key_retry: RetryPolicy::default(),
            import_step_delay: default_import_step_delay(),
        }
    }

    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> FolioResult<Self> {
        toml::from_str(content)
            .map_err(|e| FolioError::config(format!("Failed to parse configuration: {e}")))
    }

    /// Load a configuration from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> FolioResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            FolioError::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Builder-style method to add an Okapi header
    #[must_use]
    pub fn with_okapi_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.okapi_headers.insert(name.into(), value.into());
        self
    }

    /// Builder-style method to set the tenant header
    #[must_use]
    pub fn with_tenant(self, tenant: impl Into<String>) -> Self {
        self.with_okapi_header(TENANT_HEADER, tenant)
    }

    /// Builder-style method to set timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builder-style method to set the authentication mode
    #[must_use]
    pub fn with_auth_mode(mut self, auth_mode: AuthMode) -> Self {
        self.auth_mode = auth_mode;
        self
    }

    /// Builder-style method to set polling defaults
    #[must_use]
    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Builder-style method to set the duplicate-key retry policy
    #[must_use]
    pub fn with_duplicate_key_retry(mut self, policy: RetryPolicy) -> Self {
        self.duplicate_key_retry = policy;
        self
    }

    /// Builder-style method to set the pause between import steps
    #[must_use]
    pub fn with_import_step_delay(mut self, delay: Duration) -> Self {
        self.import_step_delay = delay;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> FolioResult<()> {
        if self.base_url.is_empty() {
            return Err(FolioError::config("base_url cannot be empty"));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(FolioError::config(
                "base_url must start with http:// or https://",
            ));
        }

        if self.timeout.is_zero() {
            return Err(FolioError::config("timeout cannot be zero"));
        }

        if self.login.username.is_empty() {
            return Err(FolioError::config("login username cannot be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config() -> ClientConfig {
        ClientConfig::new(
            "https://folio.example.org",
            LoginParams::new("username", "password"),
        )
    }

    #[test]
    fn test_defaults() {
        let config = config();
        assert_eq!(config.timeout, Duration::from_secs(120));
        assert_eq!(config.auth_mode, AuthMode::Expiry);
        assert_eq!(config.import_step_delay, Duration::from_secs(5));
        assert_eq!(config.poll, PollConfig::default());
        assert_eq!(config.duplicate_key_retry, RetryPolicy::default());
        assert!(config.okapi_headers.is_empty());
    }

    #[test]
    fn test_builder_pattern() {
        let config = config()
            .with_tenant("diku")
            .with_okapi_header("User-Agent", "folio-client tests")
            .with_timeout(Duration::from_secs(30))
            .with_auth_mode(AuthMode::Legacy);

        assert_eq!(config.okapi_headers.get(TENANT_HEADER).map(String::as_str), Some("diku"));
        assert_eq!(config.okapi_headers.len(), 2);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.auth_mode.login_path(), "authn/login");
    }

    #[test]
    fn test_validation() {
        assert!(config().validate().is_ok());

        let mut invalid = config();
        invalid.base_url = String::new();
        assert!(invalid.validate().is_err());

        let mut invalid = config();
        invalid.base_url = "folio.example.org".to_string();
        assert!(invalid.validate().is_err());

        assert!(config().with_timeout(Duration::ZERO).validate().is_err());

        let mut invalid = config();
        invalid.login.username = String::new();
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_password_is_redacted() {
        let debug = format!("{:?}", config());
        assert!(debug.contains("username"));
        assert!(!debug.contains("\"password\""));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_from_toml_str() {
        let config = ClientConfig::from_toml_str(
            r#"
            base_url = "https://okapi.example.edu"
            timeout = 30
            auth_mode = "legacy"
            import_step_delay = 0

            [login]
            username = "app_user"
            password = "secret"

            [okapi_headers]
            X-Okapi-Tenant = "diku"

            [poll]
            interval = 2
            not_found_tolerance = 5

            [duplicate_key_retry]
            max_attempts = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.base_url, "https://okapi.example.edu");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.auth_mode, AuthMode::Legacy);
        assert_eq!(config.import_step_delay, Duration::ZERO);
        assert_eq!(config.login.username, "app_user");
        assert_eq!(config.okapi_headers.get(TENANT_HEADER).map(String::as_str), Some("diku"));
        assert_eq!(config.poll.interval, Duration::from_secs(2));
        assert_eq!(config.poll.timeout, Duration::from_secs(300));
        assert_eq!(config.poll.not_found_tolerance, 5);
        assert_eq!(config.duplicate_key_retry.max_attempts, 2);
        assert_eq!(config.duplicate_key_retry.delay, Duration::from_secs(10));
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "base_url = \"http://localhost:9130\"\n[login]\nusername = \"u\"\npassword = \"p\""
        )
        .unwrap();

        let config = ClientConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.base_url, "http://localhost:9130");
        assert_eq!(config.timeout, Duration::from_secs(120));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_errors() {
        assert!(matches!(
            ClientConfig::from_toml_str("base_url = 12"),
            Err(FolioError::Config(_))
        ));
        assert!(matches!(
            ClientConfig::from_toml_file("/nonexistent/folio.toml"),
            Err(FolioError::Config(_))
        ));
    }
}
