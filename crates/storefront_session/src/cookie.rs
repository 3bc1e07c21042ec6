//! Signed cookie encoding.
//!
//! A session cookie value has the shape `<payload>.<signature>`:
//! - `payload`: URL-safe base64 (unpadded) of the JSON session data
//! - `signature`: URL-safe base64 (unpadded) HMAC-SHA256 of `payload`
//!
//! Neither part can contain `.`, `;` or `,`. Header parsing and `Set-Cookie`
//! serialization go through the `cookie` crate with percent-encoding.

use ::cookie::{time, Cookie};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};
use crate::session::Session;

type HmacSha256 = Hmac<Sha256>;

/// Largest `Set-Cookie` value browsers are required to keep.
pub const MAX_COOKIE_SIZE: usize = 4096;

/// Signs a value, returning `<value>.<signature>`.
pub fn sign(value: &str, secret: &str) -> SessionResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| SessionError::InvalidSecret(e.to_string()))?;
    mac.update(value.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    Ok(format!("{value}.{signature}"))
}

/// Verifies a signed value against any of the secrets.
///
/// Returns the unsigned value, or `None` if no secret produced the signature.
pub fn unsign<'a>(signed: &'a str, secrets: &[String]) -> Option<&'a str> {
    let (value, signature) = signed.rsplit_once('.')?;
    let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;

    secrets.iter().find_map(|secret| {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
        mac.update(value.as_bytes());
        mac.verify_slice(&signature).ok().map(|()| value)
    })
}

/// Encodes session data into a cookie payload.
pub fn encode_session(session: &Session) -> SessionResult<String> {
    let json = serde_json::to_vec(session)?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decodes a cookie payload. Malformed payloads yield `None`.
pub fn decode_session(payload: &str) -> Option<Session> {
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Finds a cookie value by name in a `Cookie` request header.
///
/// Values are percent-decoded; pairs that fail to parse are skipped.
pub fn find_cookie(header: &str, name: &str) -> Option<String> {
    Cookie::split_parse_encoded(header)
        .filter_map(Result::ok)
        .find(|c| c.name() == name)
        .map(|c| c.value_trimmed().to_string())
}

/// Returns true if `name` is a valid cookie name (an RFC 6265 token).
pub fn is_valid_cookie_name(name: &str) -> bool {
    const SEPARATORS: &[u8] = b"()<>@,;:\\\"/[]?={}";

    Cookie::parse(format!("{name}=")).is_ok_and(|c| c.name() == name)
        && name
            .bytes()
            .all(|b| b.is_ascii_graphic() && !SEPARATORS.contains(&b))
}

/// Serializes a `Set-Cookie` header value.
///
/// With `expire` set the cookie is emptied and expired immediately.
pub fn serialize_set_cookie(config: &SessionConfig, value: &str, expire: bool) -> String {
    let mut builder = Cookie::build((config.cookie_name.as_str(), value))
        .path(config.path.as_str())
        .http_only(config.http_only)
        .secure(config.secure)
        .same_site(config.same_site.into());

    if expire {
        builder = builder
            .max_age(time::Duration::ZERO)
            .expires(time::OffsetDateTime::UNIX_EPOCH);
    } else if let Some(max_age) = config.max_age {
        let secs = i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX);
        builder = builder.max_age(time::Duration::seconds(secs));
    }

    builder.build().encoded().to_string()
}
