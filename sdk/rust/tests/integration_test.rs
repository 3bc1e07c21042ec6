//! Integration tests for storefront_sdk against a mock Shop API.

use std::sync::Arc;
use std::time::Duration;
use storefront_sdk::actions::StorefrontActions;
use storefront_sdk::error::ErrorCode;
use storefront_sdk::forms::FormData;
use storefront_sdk::headers::names;
use storefront_sdk::{
    ClientConfig, CookieSessionStore, QueryOptions, ReqwestHttpClient, Session, SessionConfig,
    SessionStore, StorefrontSdk,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sdk_for(server: &MockServer, store: Arc<CookieSessionStore>) -> StorefrontSdk {
    StorefrontSdk::new(
        ClientConfig::new(format!("{}/shop-api", server.uri())),
        Arc::new(ReqwestHttpClient::new()),
        store,
    )
}

fn store() -> Arc<CookieSessionStore> {
    Arc::new(CookieSessionStore::new(SessionConfig::new(["integration-secret"])).unwrap())
}

async fn request_cookie(store: &CookieSessionStore, session: &Session) -> String {
    let set_cookie = store.commit_session(session).await.unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

#[tokio::test]
async fn test_channel_list_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/shop-api"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(serde_json::json!({
            "query": "query getChannelList{getChannelList{id token code}}"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {"getChannelList": [{"id": "1", "token": "eu", "code": "europe"}]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let sdk = sdk_for(&server, store());
    let channels = sdk.get_channel_list(&QueryOptions::new()).await.unwrap();

    assert_eq!(channels.len(), 1);
    assert_eq!(channels[0].code, "europe");
    assert_eq!(
        channels.headers.get(names::VENDURE_API_URL),
        Some(format!("{}/shop-api", server.uri()).as_str())
    );
}

#[tokio::test]
async fn test_session_headers_reach_the_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("vendure-token", "eu"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {"activeCustomer": {
                "id": "5",
                "title": null,
                "firstName": "Ann",
                "lastName": "Lee",
                "emailAddress": "ann@example.com",
                "phoneNumber": null
            }}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = store();
    let mut session = Session::new();
    session.set_channel_token("eu");
    session.set_auth_token("tok-1");
    let cookie = request_cookie(&store, &session).await;
    let sdk = sdk_for(&server, store);

    let customer = sdk
        .active_customer(&QueryOptions::new().cookie(cookie))
        .await
        .unwrap();
    assert_eq!(customer.data.as_ref().unwrap().email_address, "ann@example.com");
}

#[tokio::test]
async fn test_refreshed_token_round_trips_through_cookie() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("vendure-auth-token", "fresh")
                .set_body_json(serde_json::json!({
                    "data": {"login": {"__typename": "CurrentUser", "id": "1", "identifier": "a@b.co"}}
                })),
        )
        .mount(&server)
        .await;

    let store = store();
    let sdk = sdk_for(&server, store.clone());
    let result = sdk
        .login("a@b.co", "secret", false, &QueryOptions::new())
        .await
        .unwrap();

    let cookie = result
        .headers
        .get(names::SET_COOKIE)
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();
    let session = store.get_session(Some(&cookie)).await.unwrap();
    assert_eq!(session.auth_token(), Some("fresh"));
}

#[tokio::test]
async fn test_graphql_errors_on_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "errors": [{"message": "bad"}],
            "data": null
        })))
        .mount(&server)
        .await;

    let sdk = sdk_for(&server, store());
    let err = sdk
        .get_channel_list(&QueryOptions::new())
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::GraphqlError);
    assert!(err.message.contains("bad"));
}

#[tokio::test]
async fn test_non_json_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .mount(&server)
        .await;

    let sdk = sdk_for(&server, store());
    let err = sdk
        .get_channel_list(&QueryOptions::new())
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::InvalidResponse);
    assert!(err.message.contains("503"));
}

#[tokio::test]
async fn test_configured_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(500))
                .set_body_json(serde_json::json!({"data": {"getChannelList": []}})),
        )
        .mount(&server)
        .await;

    let sdk = StorefrontSdk::new(
        ClientConfig::new(format!("{}/shop-api", server.uri()))
            .timeout(Duration::from_millis(50)),
        Arc::new(ReqwestHttpClient::new()),
        store(),
    );
    let err = sdk
        .get_channel_list(&QueryOptions::new())
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::Timeout);
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let sdk = StorefrontSdk::new(
        ClientConfig::new("http://127.0.0.1:9/shop-api"),
        Arc::new(ReqwestHttpClient::new()),
        store(),
    );
    let err = sdk
        .get_channel_list(&QueryOptions::new())
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::NetworkError);
}

#[tokio::test]
async fn test_sign_in_flow_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({
            "variables": {"email": "0123456789@kaikani.com"}
        })))
        .and(body_partial_json(serde_json::json!({
            "query": "query getChannelsByCustomerEmail($email:String!){getChannelsByCustomerEmail(email:$email){id token code}}"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {"getChannelsByCustomerEmail": [{"id": "2", "token": "in", "code": "india"}]}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("vendure-token", "in"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("vendure-auth-token", "tok")
                .set_body_json(serde_json::json!({
                    "data": {"login": {"__typename": "CurrentUser", "id": "9", "identifier": "0123456789@kaikani.com"}}
                })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let actions = StorefrontActions::new(sdk_for(&server, store()), "kaikani.com");
    let form = FormData::parse_urlencoded("email=0123456789&password=secret");
    let outcome = actions.sign_in(&form, None).await.unwrap();

    assert_eq!(outcome.status(), 302);
    let headers = outcome.response_headers();
    assert_eq!(headers.get(names::LOCATION), Some("/account"));
    assert!(headers
        .get(names::SET_COOKIE)
        .unwrap()
        .starts_with("vendure_remix_session="));
}
