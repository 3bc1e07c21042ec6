//! GraphQL transport.
//!
//! Builds the outbound header set from caller headers and the visitor
//! session, POSTs `{query, variables}` once, and decodes the response
//! envelope without interpreting it.

use crate::config::ClientConfig;
use crate::error::{ErrorCode, ResultExt, SdkError, SdkResult};
use crate::headers::{names, HeaderBundle};
use crate::http::HttpClient;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use storefront_session::{Session, SessionStore};
use tracing::{debug, warn};

/// Per-call request options.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// The inbound request's `Cookie` header, used to resolve the session.
    pub cookie: Option<String>,
    /// Base headers for this call.
    pub headers: HeaderBundle,
    /// Overrides applied on top of the base headers.
    pub custom_headers: HeaderBundle,
}

impl QueryOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the inbound `Cookie` header.
    #[must_use]
    pub fn cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }

    /// Sets the inbound `Cookie` header if one is given.
    #[must_use]
    pub fn maybe_cookie(mut self, cookie: Option<&str>) -> Self {
        self.cookie = cookie.map(String::from);
        self
    }

    /// Adds a base header.
    #[must_use]
    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Adds a custom header override.
    #[must_use]
    pub fn custom_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.custom_headers.set(name, value);
        self
    }
}

/// A decoded `{errors, data}` envelope plus the raw response headers.
#[derive(Debug, Clone, Default)]
pub struct GraphqlResponse<T = Value> {
    /// GraphQL errors, empty when the server reported none.
    pub errors: Vec<Value>,
    /// The `data` member. `None` when absent or null.
    pub data: Option<T>,
    /// Raw response headers.
    pub headers: HeaderBundle,
    /// HTTP status code.
    pub status: u16,
}

impl GraphqlResponse<Value> {
    /// Decodes `data` into a typed payload.
    pub fn decode_data<T: DeserializeOwned>(&self) -> SdkResult<Option<T>> {
        self.data
            .clone()
            .map(serde_json::from_value)
            .transpose()
            .map_sdk_err(ErrorCode::DeserializeError)
    }
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    errors: Option<Vec<Value>>,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    variables: Option<&'a Value>,
}

/// Sends GraphQL documents to the Shop API.
#[derive(Clone)]
pub struct GraphqlTransport {
    config: ClientConfig,
    http: Arc<dyn HttpClient>,
    sessions: Arc<dyn SessionStore>,
}

impl std::fmt::Debug for GraphqlTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphqlTransport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl GraphqlTransport {
    /// Creates a transport.
    pub fn new(
        config: ClientConfig,
        http: Arc<dyn HttpClient>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            config,
            http,
            sessions,
        }
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the API URL requests are sent to.
    pub fn api_url(&self) -> &str {
        &self.config.url
    }

    /// Returns the session store.
    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    /// Resolves the session for the given options.
    pub async fn load_session(&self, options: &QueryOptions) -> SdkResult<Session> {
        Ok(self.sessions.get_session(options.cookie.as_deref()).await?)
    }

    /// Sends a query, resolving the session from `options.cookie`.
    pub async fn send_query<V>(
        &self,
        query: &str,
        variables: &V,
        options: &QueryOptions,
    ) -> SdkResult<GraphqlResponse>
    where
        V: Serialize + ?Sized + Sync,
    {
        let session = self.load_session(options).await?;
        self.send_with_session(query, variables, options, &session)
            .await
    }

    /// Sends a query using an already resolved session.
    pub async fn send_with_session<V>(
        &self,
        query: &str,
        variables: &V,
        options: &QueryOptions,
        session: &Session,
    ) -> SdkResult<GraphqlResponse>
    where
        V: Serialize + ?Sized + Sync,
    {
        let headers = self.build_headers(options, session);
        let variables = serde_json::to_value(variables).map_sdk_err(ErrorCode::SerializeError)?;
        let body = serde_json::to_string(&GraphqlRequest {
            query,
            variables: Some(&variables).filter(|v| !v.is_null()),
        })
        .map_sdk_err(ErrorCode::SerializeError)?;

        debug!(
            url = %self.config.url,
            channel = headers.get(names::VENDURE_TOKEN).unwrap_or(""),
            authenticated = headers.has(names::AUTHORIZATION),
            "Sending GraphQL request"
        );

        let request = self.http.post(&self.config.url, &headers, body);
        let response = match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, request)
                .await
                .map_err(|_| SdkError::timeout())??,
            None => request.await?,
        };

        let envelope: Envelope = serde_json::from_str(&response.body).map_err(|e| {
            warn!(status = response.status, "Response body is not a GraphQL envelope");
            SdkError::invalid_response(format!("HTTP {}: {e}", response.status))
                .with_extension("status", response.status)
        })?;

        Ok(GraphqlResponse {
            errors: envelope.errors.unwrap_or_default(),
            data: envelope.data.filter(|d| !d.is_null()),
            headers: response.headers,
            status: response.status,
        })
    }

    /// Assembles outbound headers.
    ///
    /// Order: client defaults, per-call base headers, custom overrides, then
    /// the session channel token only when no `vendure-token` was supplied
    /// (an empty value counts as supplied), then the bearer token, then the
    /// JSON content type.
    pub fn build_headers(&self, options: &QueryOptions, session: &Session) -> HeaderBundle {
        let mut headers = self.config.headers.clone();
        headers.merge(&options.headers);
        headers.merge(&options.custom_headers);

        if !headers.has(names::VENDURE_TOKEN) {
            if let Some(channel) = session.channel_token() {
                headers.set(names::VENDURE_TOKEN, channel);
            }
        }

        if let Some(token) = session.auth_token() {
            headers.set(names::AUTHORIZATION, format!("Bearer {token}"));
        }

        headers.set(names::CONTENT_TYPE, "application/json");
        headers
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::http::HttpResponse;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use storefront_session::{CookieSessionStore, SessionConfig};

    /// A recorded outbound request.
    #[derive(Debug, Clone)]
    pub(crate) struct Recorded {
        pub url: String,
        pub headers: HeaderBundle,
        pub body: Value,
    }

    /// An `HttpClient` that replays canned responses and records requests.
    #[derive(Default)]
    pub(crate) struct MockHttp {
        responses: Mutex<Vec<HttpResponse>>,
        pub requests: Mutex<Vec<Recorded>>,
    }

    impl MockHttp {
        pub(crate) fn new(responses: impl IntoIterator<Item = HttpResponse>) -> Arc<Self> {
            let mut responses: Vec<_> = responses.into_iter().collect();
            responses.reverse();
            Arc::new(Self {
                responses: Mutex::new(responses),
                requests: Mutex::default(),
            })
        }

        pub(crate) fn json(body: Value) -> Arc<Self> {
            Self::new([HttpResponse::ok(body.to_string())])
        }

        pub(crate) fn last(&self) -> Recorded {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }

        pub(crate) fn count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl HttpClient for MockHttp {
        async fn post(
            &self,
            url: &str,
            headers: &HeaderBundle,
            body: String,
        ) -> SdkResult<HttpResponse> {
            self.requests.lock().unwrap().push(Recorded {
                url: url.to_string(),
                headers: headers.clone(),
                body: serde_json::from_str(&body).unwrap(),
            });
            self.responses
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| SdkError::network("no canned response left"))
        }
    }

    pub(crate) fn store() -> Arc<CookieSessionStore> {
        Arc::new(CookieSessionStore::new(SessionConfig::new(["test-secret"])).unwrap())
    }

    pub(crate) async fn cookie_for(store: &CookieSessionStore, session: &Session) -> String {
        let set_cookie = store.commit_session(session).await.unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    fn transport(http: Arc<MockHttp>, store: Arc<CookieSessionStore>) -> GraphqlTransport {
        GraphqlTransport::new(ClientConfig::new("http://api.test/shop-api"), http, store)
    }

    fn session_with_channel(channel: &str) -> Session {
        let mut session = Session::new();
        session.set_channel_token(channel);
        session
    }

    #[test]
    fn test_session_channel_token_is_used_when_absent() {
        let t = transport(MockHttp::new([]), store());
        let headers = t.build_headers(&QueryOptions::new(), &session_with_channel("session-ch"));

        assert_eq!(headers.get(names::VENDURE_TOKEN), Some("session-ch"));
        assert_eq!(headers.get(names::CONTENT_TYPE), Some("application/json"));
        assert!(!headers.has(names::AUTHORIZATION));
    }

    #[test]
    fn test_explicit_channel_token_wins() {
        let t = transport(MockHttp::new([]), store());
        let session = session_with_channel("session-ch");

        let custom = QueryOptions::new().custom_header("Vendure-Token", "custom-ch");
        assert_eq!(
            t.build_headers(&custom, &session).get(names::VENDURE_TOKEN),
            Some("custom-ch")
        );

        let base = QueryOptions::new().header("vendure-token", "base-ch");
        assert_eq!(
            t.build_headers(&base, &session).get(names::VENDURE_TOKEN),
            Some("base-ch")
        );

        let both = QueryOptions::new()
            .header("vendure-token", "base-ch")
            .custom_header("vendure-token", "custom-ch");
        assert_eq!(
            t.build_headers(&both, &session).get(names::VENDURE_TOKEN),
            Some("custom-ch")
        );
    }

    #[test]
    fn test_empty_explicit_channel_token_still_wins() {
        let t = transport(MockHttp::new([]), store());
        let options = QueryOptions::new().custom_header(names::VENDURE_TOKEN, "");
        let headers = t.build_headers(&options, &session_with_channel("session-ch"));

        assert_eq!(headers.get(names::VENDURE_TOKEN), Some(""));
    }

    #[test]
    fn test_auth_token_and_content_type_are_forced() {
        let t = transport(MockHttp::new([]), store());
        let mut session = Session::new();
        session.set_auth_token("tok");
        let options = QueryOptions::new()
            .header("Authorization", "Basic nope")
            .custom_header("Content-Type", "text/plain");

        let headers = t.build_headers(&options, &session);
        assert_eq!(headers.get(names::AUTHORIZATION), Some("Bearer tok"));
        assert_eq!(headers.get(names::CONTENT_TYPE), Some("application/json"));
    }

    #[tokio::test]
    async fn test_send_query_posts_once_with_session_headers() {
        let http = MockHttp::json(serde_json::json!({"data": {"ok": true}}));
        let store = store();
        let cookie = cookie_for(&store, &session_with_channel("eu")).await;
        let t = transport(http.clone(), store);

        let response = t
            .send_query(
                "query q { ok }",
                &serde_json::json!({"a": 1}),
                &QueryOptions::new().cookie(cookie),
            )
            .await
            .unwrap();

        assert_eq!(http.count(), 1);
        let sent = http.last();
        assert_eq!(sent.url, "http://api.test/shop-api");
        assert_eq!(sent.headers.get(names::VENDURE_TOKEN), Some("eu"));
        assert_eq!(
            sent.body,
            serde_json::json!({"query": "query q { ok }", "variables": {"a": 1}})
        );
        assert!(response.errors.is_empty());
        assert_eq!(response.data, Some(serde_json::json!({"ok": true})));
    }

    #[tokio::test]
    async fn test_null_variables_are_omitted() {
        let http = MockHttp::json(serde_json::json!({"data": null}));
        let t = transport(http.clone(), store());

        let response = t
            .send_query("{ ok }", &crate::operation::NoVariables, &QueryOptions::new())
            .await
            .unwrap();

        assert_eq!(http.last().body, serde_json::json!({"query": "{ ok }"}));
        assert!(response.data.is_none());
    }

    #[tokio::test]
    async fn test_error_envelope_on_error_status_is_decoded() {
        let http = MockHttp::new([HttpResponse {
            status: 400,
            headers: HeaderBundle::new(),
            body: r#"{"errors":[{"message":"bad"}]}"#.to_string(),
        }]);
        let t = transport(http, store());

        let response = t.send_query("{ ok }", &(), &QueryOptions::new()).await.unwrap();
        assert_eq!(response.status, 400);
        assert_eq!(response.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_undecodable_body_is_invalid_response() {
        let http = MockHttp::new([HttpResponse {
            status: 502,
            headers: HeaderBundle::new(),
            body: "<html>Bad Gateway</html>".to_string(),
        }]);
        let t = transport(http, store());

        let err = t
            .send_query("{ ok }", &(), &QueryOptions::new())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidResponse);
        assert!(err.message.contains("502"));
    }

    #[tokio::test]
    async fn test_network_failure_propagates() {
        let t = transport(MockHttp::new([]), store());
        let err = t
            .send_query("{ ok }", &(), &QueryOptions::new())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NetworkError);
    }

    #[test]
    fn test_decode_data() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Flag {
            ok: bool,
        }

        let response = GraphqlResponse {
            data: Some(serde_json::json!({"ok": true})),
            ..GraphqlResponse::default()
        };
        assert_eq!(response.decode_data::<Flag>().unwrap(), Some(Flag { ok: true }));

        let response = GraphqlResponse {
            data: Some(serde_json::json!({"ok": "yes"})),
            ..GraphqlResponse::default()
        };
        assert_eq!(
            response.decode_data::<Flag>().unwrap_err().code,
            ErrorCode::DeserializeError
        );
    }
}
