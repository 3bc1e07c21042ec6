//! The visitor session model.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Session key holding the customer's bearer token.
pub const AUTH_TOKEN_SESSION_KEY: &str = "authToken";

/// Session key holding the selected channel token.
pub const CHANNEL_TOKEN_SESSION_KEY: &str = "channelToken";

/// A string key/value session.
///
/// Insertion order is kept so that a committed cookie is stable for the same
/// sequence of writes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Session {
    data: IndexMap<String, String>,
}

impl Session {
    /// Creates a new empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    /// Sets a value, replacing any previous one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.data.insert(key.into(), value.into());
    }

    /// Removes a value, returning it if present.
    pub fn unset(&mut self, key: &str) -> Option<String> {
        self.data.shift_remove(key)
    }

    /// Returns true if the session has a value for the key.
    pub fn has(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Returns true if the session holds no values.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterates over all entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.data.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the auth token if one is stored and non-empty.
    pub fn auth_token(&self) -> Option<&str> {
        self.get(AUTH_TOKEN_SESSION_KEY).filter(|t| !t.is_empty())
    }

    /// Stores a freshly issued auth token.
    pub fn set_auth_token(&mut self, token: impl Into<String>) {
        self.set(AUTH_TOKEN_SESSION_KEY, token);
    }

    /// Returns the channel token if one is stored and non-empty.
    pub fn channel_token(&self) -> Option<&str> {
        self.get(CHANNEL_TOKEN_SESSION_KEY).filter(|t| !t.is_empty())
    }

    /// Stores the selected channel token.
    pub fn set_channel_token(&mut self, token: impl Into<String>) {
        self.set(CHANNEL_TOKEN_SESSION_KEY, token);
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Session {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            data: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
