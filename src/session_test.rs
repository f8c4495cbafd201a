use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;
use crate::navigation::{Route, SESSION_EXPIRED_MESSAGE};
use crate::store::{KeyValueStorage, USER_DATA_KEY};
use crate::test_support::{fixture, live_token};

// =============================================================================
// authenticated_request
// =============================================================================

#[tokio::test]
async fn missing_token_fails_without_sending() {
    let server = MockServer::start().await;
    Mock::given(method("GET")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;
    let fx = fixture(&server);

    let url = fx.session.endpoints().me();
    let err = fx.session.authenticated_request(Method::GET, &url, RequestOptions::default()).await.unwrap_err();

    assert!(matches!(err, ConsoleError::NoToken));
    assert_eq!(err.redirect().unwrap().to, Route::Login);
}

#[tokio::test]
async fn attaches_bearer_token_and_json_content_type() {
    let server = MockServer::start().await;
    let token = live_token("1", "alice");
    Mock::given(method("GET"))
        .and(path("/api/v1/users/me"))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 1 })))
        .expect(1)
        .mount(&server)
        .await;
    let fx = fixture(&server);
    fx.store.set(&token).unwrap();

    let url = fx.session.endpoints().me();
    let response = fx.session.authenticated_request(Method::GET, &url, RequestOptions::default()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn caller_headers_win_except_authorization() {
    let server = MockServer::start().await;
    let token = live_token("1", "alice");
    Mock::given(method("POST"))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .and(header("content-type", "text/plain"))
        .and(header("x-trace", "abc"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    let fx = fixture(&server);
    fx.store.set(&token).unwrap();

    let options = RequestOptions::default()
        .header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))
        .header(HeaderName::from_static("x-trace"), HeaderValue::from_static("abc"))
        .header(AUTHORIZATION, HeaderValue::from_static("Bearer forged"));
    let url = format!("{}/anything", server.uri());
    let response = fx.session.authenticated_request(Method::POST, &url, options).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn json_body_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/users/5"))
        .and(body_json(json!({ "is_admin": true })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let fx = fixture(&server);
    fx.store.set(&live_token("1", "alice")).unwrap();

    let url = fx.session.endpoints().user(5);
    fx.session
        .authenticated_request(Method::PUT, &url, RequestOptions::json(json!({ "is_admin": true })))
        .await
        .unwrap();
}

#[tokio::test]
async fn unauthorized_purges_credentials_and_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET")).respond_with(ResponseTemplate::new(401)).expect(1).mount(&server).await;
    let fx = fixture(&server);
    fx.store.set(&live_token("1", "alice")).unwrap();
    fx.storage.set_item(USER_DATA_KEY, "{\"id\":1}").unwrap();

    let url = fx.session.endpoints().me();
    let err = fx.session.authenticated_request(Method::GET, &url, RequestOptions::default()).await.unwrap_err();

    assert!(matches!(err, ConsoleError::AuthenticationFailed));
    assert_eq!(fx.store.get(), None);
    assert_eq!(fx.storage.get_item(USER_DATA_KEY).unwrap(), None);
    let redirect = err.redirect().unwrap();
    assert_eq!(redirect.to, Route::Login);
    assert!(redirect.replace);
    assert_eq!(redirect.message.as_deref(), Some(SESSION_EXPIRED_MESSAGE));
    assert_eq!(err.display_message(), None);
}

#[tokio::test]
async fn other_error_statuses_pass_through_untouched() {
    for status in [400_u16, 403, 404, 500, 503] {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "detail": "nope" })))
            .mount(&server)
            .await;
        let fx = fixture(&server);
        fx.store.set(&live_token("1", "alice")).unwrap();

        let url = fx.session.endpoints().me();
        let response = fx.session.authenticated_request(Method::GET, &url, RequestOptions::default()).await.unwrap();

        assert_eq!(response.status().as_u16(), status);
        assert!(fx.store.get().is_some(), "token must survive status {status}");
    }
}

#[tokio::test]
async fn transport_failure_is_an_http_error_and_keeps_token() {
    let server = MockServer::start().await;
    let fx = fixture(&server);
    fx.store.set(&live_token("1", "alice")).unwrap();
    drop(server);

    let err = fx
        .session
        .authenticated_request(Method::GET, "http://127.0.0.1:9/unreachable", RequestOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ConsoleError::Http(_)));
    assert!(fx.store.get().is_some());
}

// =============================================================================
// ensure_success / get_json
// =============================================================================

#[tokio::test]
async fn get_json_surfaces_detail_on_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({ "detail": "bad input" })))
        .mount(&server)
        .await;
    let fx = fixture(&server);
    fx.store.set(&live_token("1", "alice")).unwrap();

    let err = fx.session.get_json::<Value>(&fx.session.endpoints().me()).await.unwrap_err();
    assert_eq!(err.status(), Some(422));
    assert_eq!(err.to_string(), "bad input");
}

#[tokio::test]
async fn get_json_falls_back_to_status_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET")).respond_with(ResponseTemplate::new(500).set_body_string("boom")).mount(&server).await;
    let fx = fixture(&server);
    fx.store.set(&live_token("1", "alice")).unwrap();

    let err = fx.session.get_json::<Value>(&fx.session.endpoints().me()).await.unwrap_err();
    assert_eq!(err.to_string(), "HTTP error! status: 500");
}

#[test]
fn detail_message_requires_non_empty_string() {
    assert_eq!(detail_message(r#"{"detail":"x"}"#).as_deref(), Some("x"));
    assert_eq!(detail_message(r#"{"detail":""}"#), None);
    assert_eq!(detail_message(r#"{"detail":[{"msg":"x"}]}"#), None);
    assert_eq!(detail_message("not json"), None);
}
