//! Header bundles.
//!
//! A `HeaderBundle` is an ordered, case-insensitive set of HTTP headers.
//! Names are stored lowercased, the way fetch-style header maps expose
//! them, so `Set-Cookie` and `set-cookie` address the same entry.

use indexmap::IndexMap;
use serde::Serialize;

/// Header names the storefront reads or writes.
pub mod names {
    /// Channel token request header.
    pub const VENDURE_TOKEN: &str = "vendure-token";
    /// Refreshed auth token response header.
    pub const VENDURE_AUTH_TOKEN: &str = "vendure-auth-token";
    /// API base URL attached to every requester result.
    pub const VENDURE_API_URL: &str = "x-vendure-api-url";
    /// Bearer credential request header.
    pub const AUTHORIZATION: &str = "authorization";
    /// Request body media type.
    pub const CONTENT_TYPE: &str = "content-type";
    /// Inbound session cookie.
    pub const COOKIE: &str = "cookie";
    /// Outbound session cookie.
    pub const SET_COOKIE: &str = "set-cookie";
    /// Redirect target.
    pub const LOCATION: &str = "location";
}

/// An ordered, case-insensitive collection of header name/value pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HeaderBundle {
    entries: IndexMap<String, String>,
}

impl HeaderBundle {
    /// Creates an empty bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a header, replacing any existing value but keeping its position.
    pub fn set(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.entries
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    /// Builder-style `set`.
    #[must_use]
    pub fn with(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Appends a value, joining repeated headers with `", "`.
    pub fn append(&mut self, name: impl AsRef<str>, value: impl AsRef<str>) {
        let key = name.as_ref().to_ascii_lowercase();
        match self.entries.get_mut(&key) {
            Some(existing) => {
                existing.push_str(", ");
                existing.push_str(value.as_ref());
            }
            None => {
                self.entries.insert(key, value.as_ref().to_string());
            }
        }
    }

    /// Gets a header value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Returns true if the header is present, even with an empty value.
    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }

    /// Removes a header, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.entries.shift_remove(&name.to_ascii_lowercase())
    }

    /// Overwrites entries with every entry of `other`.
    pub fn merge(&mut self, other: &HeaderBundle) {
        for (name, value) in other.iter() {
            self.set(name, value);
        }
    }

    /// Iterates over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the number of headers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no headers.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for HeaderBundle {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bundle = Self::new();
        for (name, value) in iter {
            bundle.set(name, value);
        }
        bundle
    }
}

impl<'a> IntoIterator for &'a HeaderBundle {
    type Item = (&'a str, &'a str);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a str)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
