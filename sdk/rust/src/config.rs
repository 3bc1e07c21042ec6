//! Client and storefront configuration.

use crate::error::{ErrorCode, SdkError, SdkResult};
use crate::headers::HeaderBundle;
use std::time::Duration;
use storefront_session::SessionConfig;

/// Default Shop API endpoint.
pub const DEFAULT_API_URL: &str = "http://localhost:3000/shop-api";

/// Default domain used to turn a phone number into a login e-mail address.
pub const DEFAULT_PHONE_EMAIL_DOMAIN: &str = "kaikani.com";

/// Development-only signing secret used when `SESSION_SECRET` is unset.
pub const DEVELOPMENT_SESSION_SECRET: &str = "awdbhbjahdbaw";

/// GraphQL client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Shop API endpoint.
    pub url: String,
    /// Headers sent with every request, lowest priority after session headers.
    pub headers: HeaderBundle,
    /// Optional request timeout. Requests wait indefinitely when unset.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_API_URL.to_string(),
            headers: HeaderBundle::new(),
            timeout: None,
        }
    }
}

impl ClientConfig {
    /// Creates a new config with a URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Sets the timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Adds a default header.
    #[must_use]
    pub fn header(mut self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.set(key, value);
        self
    }

    /// Checks that the URL is an absolute http(s) URL.
    pub fn validate(&self) -> SdkResult<()> {
        let parsed = url::Url::parse(&self.url)
            .map_err(|e| SdkError::new(ErrorCode::InvalidUrl, format!("{}: {e}", self.url)))?;
        match parsed.scheme() {
            "http" | "https" => Ok(()),
            other => Err(SdkError::new(
                ErrorCode::InvalidUrl,
                format!("unsupported scheme {other:?} in {}", self.url),
            )),
        }
    }
}

/// Everything needed to run the storefront flows.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// GraphQL client settings.
    pub client: ClientConfig,
    /// Session cookie settings.
    pub session: SessionConfig,
    /// Domain appended to 10-digit phone numbers at sign-in.
    pub phone_email_domain: String,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            session: SessionConfig::new([DEVELOPMENT_SESSION_SECRET]),
            phone_email_domain: DEFAULT_PHONE_EMAIL_DOMAIN.to_string(),
        }
    }
}

impl StorefrontConfig {
    /// Reads configuration from the process environment.
    ///
    /// - `VENDURE_API_URL`: Shop API endpoint
    /// - `SESSION_SECRET`: comma-separated signing secrets, newest first
    /// - `PHONE_EMAIL_DOMAIN`: domain for phone-number logins
    /// - `VENDURE_TIMEOUT_SECS`: optional request timeout
    pub fn from_env() -> SdkResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through a key lookup function.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> SdkResult<Self> {
        let mut config = Self::default();

        if let Some(url) = lookup("VENDURE_API_URL").filter(|v| !v.trim().is_empty()) {
            config.client.url = url.trim().to_string();
        }

        if let Some(secrets) = lookup("SESSION_SECRET") {
            let secrets: Vec<String> = secrets
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
            if secrets.is_empty() {
                return Err(SdkError::config("SESSION_SECRET is set but empty"));
            }
            config.session.secrets = secrets;
        }

        if let Some(domain) = lookup("PHONE_EMAIL_DOMAIN").filter(|v| !v.trim().is_empty()) {
            config.phone_email_domain = domain.trim().to_string();
        }

        if let Some(timeout) = lookup("VENDURE_TIMEOUT_SECS") {
            let secs: u64 = timeout.trim().parse().map_err(|_| {
                SdkError::config(format!("VENDURE_TIMEOUT_SECS must be a number, got {timeout:?}"))
            })?;
            config.client.timeout = Some(Duration::from_secs(secs));
        }

        config.client.validate()?;
        Ok(config)
    }

    /// Sets the API URL.
    #[must_use]
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.client.url = url.into();
        self
    }

    /// Replaces the session signing secrets.
    #[must_use]
    pub fn session_secrets<I, S>(mut self, secrets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.session.secrets = secrets.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_client_config() {
        let config = ClientConfig::new("http://localhost:3000/shop-api")
            .timeout(Duration::from_secs(10))
            .header("X-Custom", "1");

        assert_eq!(config.url, "http://localhost:3000/shop-api");
        assert_eq!(config.timeout, Some(Duration::from_secs(10)));
        assert_eq!(config.headers.get("x-custom"), Some("1"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = StorefrontConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.client.url, DEFAULT_API_URL);
        assert_eq!(config.client.timeout, None);
        assert_eq!(config.session.secrets, vec![DEVELOPMENT_SESSION_SECRET]);
        assert_eq!(config.session.cookie_name, "vendure_remix_session");
        assert_eq!(config.phone_email_domain, DEFAULT_PHONE_EMAIL_DOMAIN);
    }

    #[test]
    fn test_environment_overrides() {
        let config = StorefrontConfig::from_lookup(lookup(&[
            ("VENDURE_API_URL", "https://shop.example.com/shop-api"),
            ("SESSION_SECRET", "new, old"),
            ("PHONE_EMAIL_DOMAIN", "example.com"),
            ("VENDURE_TIMEOUT_SECS", "15"),
        ]))
        .unwrap();

        assert_eq!(config.client.url, "https://shop.example.com/shop-api");
        assert_eq!(config.session.secrets, vec!["new", "old"]);
        assert_eq!(config.phone_email_domain, "example.com");
        assert_eq!(config.client.timeout, Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_invalid_environment() {
        let err = StorefrontConfig::from_lookup(lookup(&[("VENDURE_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigError);

        let err = StorefrontConfig::from_lookup(lookup(&[("SESSION_SECRET", " , ")])).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigError);

        let err =
            StorefrontConfig::from_lookup(lookup(&[("VENDURE_API_URL", "ftp://x")])).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidUrl);
    }
}
