use std::time::Duration;

use reqwest::StatusCode;
use url::Url;

use crate::error::Error;
use crate::session::User;

const DEFAULT_SESSION_PATH: &str = "auth/me";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Solobooks API configuration.
///
/// ```rust,ignore
/// use solobooks_entitlements::ApiConfig;
///
/// let config = ApiConfig::new("https://api.solobooks.de".parse()?)
///     .with_timeout(std::time::Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ApiConfig {
    pub(crate) base_url: Url,
    pub(crate) session_path: String,
    pub(crate) timeout: Duration,
}

impl ApiConfig {
    /// The session path is resolved below `base_url`, so an API prefix such
    /// as `/api/v1` is kept.
    #[must_use]
    pub fn new(mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            base_url,
            session_path: DEFAULT_SESSION_PATH.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create config from environment variables.
    ///
    /// # Required env vars
    /// - `SOLOBOOKS_API_URL`: API base URL
    ///
    /// # Optional env vars
    /// - `SOLOBOOKS_SESSION_PATH`: Session endpoint path (default `auth/me`)
    /// - `SOLOBOOKS_TIMEOUT_SECS`: Request timeout in seconds (default 10)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the base URL is missing or a value is invalid.
    pub fn from_env() -> Result<Self, Error> {
        let base_url = std::env::var("SOLOBOOKS_API_URL")
            .map_err(|_| Error::Config("SOLOBOOKS_API_URL is required".into()))?;
        let base_url: Url = base_url
            .parse()
            .map_err(|e| Error::Config(format!("SOLOBOOKS_API_URL: {e}")))?;

        let mut config = Self::new(base_url);

        if let Ok(path) = std::env::var("SOLOBOOKS_SESSION_PATH") {
            config = config.with_session_path(path);
        }
        if let Ok(secs) = std::env::var("SOLOBOOKS_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .map_err(|e| Error::Config(format!("SOLOBOOKS_TIMEOUT_SECS: {e}")))?;
            config = config.with_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Override the session endpoint path (default: `auth/me`).
    ///
    /// A leading `/` is ignored; the path is always relative to the base URL.
    #[must_use]
    pub fn with_session_path(mut self, path: impl Into<String>) -> Self {
        self.session_path = path.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn session_path(&self) -> &str {
        &self.session_path
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Loads the current user snapshot from the Solobooks API.
pub struct SessionClient {
    config: ApiConfig,
    http: reqwest::Client,
}

impl SessionClient {
    #[must_use]
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Full URL of the session endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the session path cannot be joined onto the base URL.
    pub fn session_url(&self) -> Result<Url, Error> {
        self.config
            .base_url
            .join(self.config.session_path.trim_start_matches('/'))
            .map_err(|e| Error::Config(format!("session path: {e}")))
    }

    /// Fetch the user snapshot for `access_token`.
    ///
    /// Returns `Ok(None)` when the API rejects the token (401/403); callers
    /// then evaluate entitlements against no session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network failure, [`Error::Api`] for any
    /// other non-success status, or [`Error::Decode`] if the body is not a
    /// valid snapshot.
    pub async fn fetch_session(&self, access_token: &str) -> Result<Option<User>, Error> {
        let url = self.session_url()?;
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .timeout(self.config.timeout)
            .send()
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Session request failed"))?;

        let status = response.status();
        match classify(status) {
            SessionStatus::Active => {}
            SessionStatus::Rejected => {
                tracing::debug!(status = status.as_u16(), "Session rejected, no active session");
                return Ok(None);
            }
            SessionStatus::Failed => {
                let detail = response.text().await.unwrap_or_default();
                tracing::error!(status = status.as_u16(), "Session endpoint returned an error");
                return Err(Error::Api {
                    operation: "session request",
                    status: Some(status.as_u16()),
                    detail,
                });
            }
        }

        let body = response.bytes().await?;
        let user: User = serde_json::from_slice(&body)?;
        tracing::debug!(user_id = %user.id, plan = %user.plan, "Session loaded");
        Ok(Some(user))
    }
}

/// How a session endpoint status is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionStatus {
    /// Body holds the user snapshot.
    Active,
    /// Token not accepted; treated as no session.
    Rejected,
    Failed,
}

fn classify(status: StatusCode) -> SessionStatus {
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        SessionStatus::Rejected
    } else if status.is_success() {
        SessionStatus::Active
    } else {
        SessionStatus::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ApiConfig {
        ApiConfig::new("https://api.example.com/v1/".parse().unwrap())
    }

    #[test]
    fn config_defaults() {
        let config = test_config();
        assert_eq!(config.base_url().as_str(), "https://api.example.com/v1/");
        assert_eq!(config.session_path(), "auth/me");
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn config_with_overrides() {
        let config = test_config()
            .with_session_path("session")
            .with_timeout(Duration::from_secs(3));
        assert_eq!(config.session_path(), "session");
        assert_eq!(config.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn session_url_keeps_api_prefix() {
        let client = SessionClient::new(test_config());
        assert_eq!(
            client.session_url().unwrap().as_str(),
            "https://api.example.com/v1/auth/me"
        );
    }

    #[test]
    fn base_url_without_trailing_slash() {
        let config = ApiConfig::new("https://api.solobooks.de/api/v1".parse().unwrap());
        assert_eq!(config.base_url().as_str(), "https://api.solobooks.de/api/v1/");
        assert_eq!(
            SessionClient::new(config).session_url().unwrap().as_str(),
            "https://api.solobooks.de/api/v1/auth/me"
        );
    }

    #[test]
    fn session_url_leading_slash_stays_below_base() {
        let client = SessionClient::new(test_config().with_session_path("/auth/session"));
        assert_eq!(
            client.session_url().unwrap().as_str(),
            "https://api.example.com/v1/auth/session"
        );
    }

    #[test]
    fn bare_host_base_url() {
        let config = ApiConfig::new("https://api.example.com".parse().unwrap());
        let client = SessionClient::new(config);
        assert_eq!(
            client.session_url().unwrap().as_str(),
            "https://api.example.com/auth/me"
        );
    }

    #[test]
    fn status_classification() {
        assert_eq!(classify(StatusCode::OK), SessionStatus::Active);
        assert_eq!(classify(StatusCode::UNAUTHORIZED), SessionStatus::Rejected);
        assert_eq!(classify(StatusCode::FORBIDDEN), SessionStatus::Rejected);
        assert_eq!(classify(StatusCode::INTERNAL_SERVER_ERROR), SessionStatus::Failed);
        assert_eq!(classify(StatusCode::NOT_FOUND), SessionStatus::Failed);
    }

    #[test]
    fn session_url_relative_path() {
        let client = SessionClient::new(test_config().with_session_path("auth/me"));
        assert_eq!(
            client.session_url().unwrap().as_str(),
            "https://api.example.com/v1/auth/me"
        );
    }
}
