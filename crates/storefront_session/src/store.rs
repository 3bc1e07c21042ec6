//! Session store capability.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::SessionConfig;
use crate::cookie::{self, MAX_COOKIE_SIZE};
use crate::error::{SessionError, SessionResult};
use crate::session::Session;

/// Loads and persists visitor sessions.
///
/// Implementations are handed to the GraphQL client explicitly, so the
/// request/response header logic never reaches for ambient state.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Resolves the session for an inbound `Cookie` header.
    ///
    /// A missing, unsigned or tampered cookie yields a fresh empty session.
    async fn get_session(&self, cookie_header: Option<&str>) -> SessionResult<Session>;

    /// Persists the session and returns the `Set-Cookie` header value.
    async fn commit_session(&self, session: &Session) -> SessionResult<String>;

    /// Discards the session and returns a `Set-Cookie` value that clears it.
    async fn destroy_session(&self, session: &Session) -> SessionResult<String>;
}

/// A session store that keeps all data inside a signed cookie.
#[derive(Debug, Clone)]
pub struct CookieSessionStore {
    config: SessionConfig,
}

impl CookieSessionStore {
    /// Creates a store, checking that the cookie can be signed.
    pub fn new(config: SessionConfig) -> SessionResult<Self> {
        if config.secrets.is_empty() {
            return Err(SessionError::NoSecrets);
        }
        if !cookie::is_valid_cookie_name(&config.cookie_name) {
            return Err(SessionError::InvalidCookieName(config.cookie_name));
        }
        Ok(Self { config })
    }

    /// Returns the store configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn read(&self, cookie_header: Option<&str>) -> Option<Session> {
        let raw = cookie::find_cookie(cookie_header?, &self.config.cookie_name)?;
        if raw.is_empty() {
            return None;
        }

        let Some(payload) = cookie::unsign(&raw, &self.config.secrets) else {
            warn!(
                cookie = %self.config.cookie_name,
                "Session cookie signature mismatch, starting a new session"
            );
            return None;
        };

        let session = cookie::decode_session(payload);
        if session.is_none() {
            warn!(cookie = %self.config.cookie_name, "Session cookie payload is malformed");
        }
        session
    }
}

#[async_trait]
impl SessionStore for CookieSessionStore {
    async fn get_session(&self, cookie_header: Option<&str>) -> SessionResult<Session> {
        Ok(self.read(cookie_header).unwrap_or_default())
    }

    async fn commit_session(&self, session: &Session) -> SessionResult<String> {
        let payload = cookie::encode_session(session)?;
        // `new` guarantees a first secret.
        let secret = self.config.secrets.first().ok_or(SessionError::NoSecrets)?;
        let signed = cookie::sign(&payload, secret)?;
        let header = cookie::serialize_set_cookie(&self.config, &signed, false);

        if header.len() > MAX_COOKIE_SIZE {
            return Err(SessionError::CookieTooLarge {
                size: header.len(),
                limit: MAX_COOKIE_SIZE,
            });
        }

        debug!(bytes = header.len(), "Committed session cookie");
        Ok(header)
    }

    async fn destroy_session(&self, _session: &Session) -> SessionResult<String> {
        debug!(cookie = %self.config.cookie_name, "Destroyed session cookie");
        Ok(cookie::serialize_set_cookie(&self.config, "", true))
    }
}
