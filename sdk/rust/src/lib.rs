//! Vendure storefront SDK
//!
//! A session-aware GraphQL client for the Vendure Shop API:
//! - `transport`: header assembly and the single POST per call
//! - `requester`: auth token refresh, derived headers, GraphQL errors
//! - `sdk`: one typed method per Shop API operation
//! - `validation` / `forms`: registration form checks
//! - `actions`: sign-in, sign-up and sign-out flows
//!
//! # Example
//!
//! ```ignore
//! use storefront_sdk::{QueryOptions, StorefrontConfig, StorefrontSdk};
//!
//! let sdk = StorefrontSdk::from_config(&StorefrontConfig::from_env()?)?;
//!
//! let options = QueryOptions::new().maybe_cookie(request_cookie);
//! let customer = sdk.active_customer(&options).await?;
//!
//! // forward `Set-Cookie` and `x-vendure-api-url`
//! for (name, value) in &customer.headers {
//!     response.header(name, value);
//! }
//! ```
//!
//! # Typed operations
//!
//! ```ignore
//! use storefront_sdk::Operation;
//!
//! #[derive(Operation)]
//! #[operation(query = "query product($slug: String!) { product(slug: $slug) { id name } }")]
//! pub struct Product;
//!
//! let product = sdk.execute::<Product>(&ProductVariables { slug }, &options).await?;
//! ```

// The derive macro names this crate by its absolute path.
extern crate self as storefront_sdk;

pub mod actions;
pub mod config;
pub mod document;
pub mod error;
pub mod forms;
pub mod headers;
pub mod http;
pub mod operation;
pub mod operations;
pub mod requester;
pub mod sdk;
pub mod transport;
pub mod validation;

// Re-export macros
pub use storefront_macros::Operation;

// Re-exports for convenience
pub use actions::{ActionOutcome, StorefrontActions};
pub use config::{ClientConfig, StorefrontConfig};
pub use document::Document;
pub use error::{ErrorCode, ResultExt, SdkError, SdkResult};
pub use forms::FormData;
pub use headers::HeaderBundle;
pub use http::{HttpClient, HttpResponse, ReqwestHttpClient};
pub use operation::{NoVariables, Operation, OperationKind, WithHeaders};
pub use requester::Requester;
pub use sdk::StorefrontSdk;
pub use storefront_session::{CookieSessionStore, Session, SessionConfig, SessionStore};
pub use transport::{GraphqlResponse, GraphqlTransport, QueryOptions};
pub use validation::{validate_registration_form, RegistrationVariant, ValidationErrors};
