//! Authenticated requester.
//!
//! Wraps the transport with the session bookkeeping every storefront call
//! needs: a refreshed `vendure-auth-token` is written back into the session
//! and surfaced as `Set-Cookie`, the API URL is attached, and GraphQL errors
//! become `SdkError`s.

use crate::document::Document;
use crate::error::{ErrorCode, SdkError, SdkResult};
use crate::headers::{names, HeaderBundle};
use crate::operation::WithHeaders;
use crate::transport::{GraphqlTransport, QueryOptions};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, error};

/// Sends documents through the transport and derives response headers.
#[derive(Debug, Clone)]
pub struct Requester {
    transport: GraphqlTransport,
}

impl Requester {
    /// Creates a requester over a transport.
    pub fn new(transport: GraphqlTransport) -> Self {
        Self { transport }
    }

    /// Returns the underlying transport.
    pub fn transport(&self) -> &GraphqlTransport {
        &self.transport
    }

    /// Executes a document and decodes its data into `R`.
    ///
    /// The session is loaded once and committed at most once, only when the
    /// server issued a new auth token.
    pub async fn request<V, R>(
        &self,
        document: &Document,
        variables: &V,
        options: &QueryOptions,
    ) -> SdkResult<WithHeaders<R>>
    where
        V: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let query = document.print();
        let operation = document.operation().and_then(|(_, name)| name).unwrap_or("anonymous");

        let mut session = self.transport.load_session(options).await?;
        let response = self
            .transport
            .send_with_session(&query, variables, options, &session)
            .await?;

        let mut headers = HeaderBundle::new();
        if let Some(token) = response
            .headers
            .get(names::VENDURE_AUTH_TOKEN)
            .filter(|t| !t.is_empty())
        {
            debug!(operation, "Storing refreshed auth token in session");
            session.set_auth_token(token);
            let set_cookie = self.transport.sessions().commit_session(&session).await?;
            headers.set(names::SET_COOKIE, set_cookie);
        }
        headers.set(names::VENDURE_API_URL, self.transport.api_url());

        if let Some(first) = response.errors.first() {
            log_graphql_errors(operation, &response.errors);
            return Err(SdkError::graphql(first));
        }

        let data = decode_payload(operation, response.data)?;
        Ok(WithHeaders::new(data, headers))
    }
}

/// Decodes `data`, treating an absent payload as an empty object.
fn decode_payload<R: DeserializeOwned>(operation: &str, data: Option<Value>) -> SdkResult<R> {
    let missing = data.is_none();
    let value = data.unwrap_or_else(|| Value::Object(serde_json::Map::new()));

    serde_json::from_value(value).map_err(|e| {
        if missing {
            SdkError::new(ErrorCode::NoData, format!("{operation} returned no data"))
        } else {
            SdkError::deserialize(format!("{operation}: {e}"))
        }
    })
}

/// Logs the first error's server stack trace, or the whole list without one.
fn log_graphql_errors(operation: &str, errors: &[Value]) {
    let stacktrace = errors
        .first()
        .and_then(|e| e.pointer("/extensions/exception/stacktrace"))
        .and_then(Value::as_array)
        .map(|lines| {
            lines
                .iter()
                .map(|line| line.as_str().map_or_else(|| line.to_string(), String::from))
                .collect::<Vec<_>>()
                .join("\n")
        });

    match stacktrace {
        Some(trace) => error!(operation, "GraphQL request failed:\n{trace}"),
        None => {
            let all = Value::Array(errors.to_vec());
            error!(operation, errors = %all, "GraphQL request failed");
        }
    }
}
