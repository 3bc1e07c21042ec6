//! Session storage for the Vendure storefront.
//!
//! This crate provides the per-visitor session that carries the customer's
//! auth token and selected channel token between requests:
//! - `session`: The string key/value session model
//! - `config`: Cookie attributes and signing secrets
//! - `cookie`: Signing, verification and `Set-Cookie` serialization
//! - `store`: The `SessionStore` capability and its signed-cookie backend
//!
//! # Example
//!
//! ```ignore
//! use storefront_session::{CookieSessionStore, SessionConfig, SessionStore};
//!
//! let store = CookieSessionStore::new(SessionConfig::new(["s3cr3t"]))?;
//! let mut session = store.get_session(request_cookie).await?;
//! session.set_auth_token("token");
//! let set_cookie = store.commit_session(&session).await?;
//! ```

pub mod config;
pub mod cookie;
pub mod error;
pub mod session;
pub mod store;

pub use config::{SameSite, SessionConfig};
pub use error::{SessionError, SessionResult};
pub use session::{Session, AUTH_TOKEN_SESSION_KEY, CHANNEL_TOKEN_SESSION_KEY};
pub use store::{CookieSessionStore, SessionStore};
