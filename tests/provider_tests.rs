//! 第三方登录客户端集成测试（wiremock 模拟 Graph / Twitter API）

use bearer_auth::{
    config::{FacebookConfig, TwitterConfig},
    providers::{FacebookClient, ProviderClient, ProviderError, TwitterClient},
};
use secrecy::Secret;
use serde_json::json;
use wiremock::matchers::{header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn facebook_config(server: &MockServer) -> FacebookConfig {
    FacebookConfig {
        app_id: "1234".to_string(),
        app_secret: Secret::new("app-secret".to_string()),
        graph_url: server.uri(),
        graph_version: "v2.10".to_string(),
        timeout_secs: 5,
    }
}

fn twitter_config(server: &MockServer) -> TwitterConfig {
    TwitterConfig {
        consumer_key: "consumer-key".to_string(),
        consumer_secret: Secret::new("consumer-secret".to_string()),
        api_url: format!("{}/1.1", server.uri()),
        timeout_secs: 5,
    }
}

#[tokio::test]
async fn test_facebook_fetch_profile() {
    let server = MockServer::start().await;
    let client = FacebookClient::new(&facebook_config(&server)).unwrap();
    let proof = client.appsecret_proof("fb-token").unwrap().unwrap();

    Mock::given(method("GET"))
        .and(path("/v2.10/me"))
        .and(query_param("access_token", "fb-token"))
        .and(query_param("fields", "id,name,birthday,email"))
        .and(query_param("appsecret_proof", proof.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "10001",
            "name": "Face Book",
            "email": "fb@example.com",
            "birthday": "04/18/1990"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let profile = client.fetch_profile("fb-token", None).await.unwrap();

    assert_eq!(profile.id, "10001");
    assert_eq!(profile.name.as_deref(), Some("Face Book"));
    assert_eq!(profile.email.as_deref(), Some("fb@example.com"));
    assert_eq!(profile.birthday.as_deref(), Some("04/18/1990"));
}

#[tokio::test]
async fn test_facebook_profile_without_email() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2.10/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "10001",
            "name": "Face Book"
        })))
        .mount(&server)
        .await;

    let client = FacebookClient::new(&facebook_config(&server)).unwrap();
    let profile = client.fetch_profile("fb-token", None).await.unwrap();

    assert!(profile.email.is_none());
}

#[tokio::test]
async fn test_facebook_graph_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2.10/me"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "message": "Invalid OAuth access token.",
                "type": "OAuthException",
                "code": 190
            }
        })))
        .mount(&server)
        .await;

    let client = FacebookClient::new(&facebook_config(&server)).unwrap();
    let err = client.fetch_profile("bad", None).await.unwrap_err();

    match err {
        ProviderError::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Invalid OAuth access token.");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_facebook_malformed_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2.10/me"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let client = FacebookClient::new(&facebook_config(&server)).unwrap();
    let err = client.fetch_profile("fb-token", None).await.unwrap_err();

    assert!(matches!(err, ProviderError::Decode(_)));
}

#[tokio::test]
async fn test_twitter_verify_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/1.1/account/verify_credentials.json"))
        .and(query_param("include_email", "true"))
        .and(query_param("include_entities", "true"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 20002,
            "id_str": "20002",
            "name": "Tweet Er",
            "screen_name": "tweeter",
            "email": "tw@example.com"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = TwitterClient::new(&twitter_config(&server)).unwrap();
    let profile = client
        .fetch_profile("tw-token", Some("tw-secret"))
        .await
        .unwrap();

    assert_eq!(profile.id, "20002");
    assert_eq!(profile.name.as_deref(), Some("Tweet Er"));
    assert_eq!(profile.email.as_deref(), Some("tw@example.com"));
    assert!(profile.birthday.is_none());

    let requests = server.received_requests().await.unwrap();
    let auth = requests[0]
        .headers
        .get("authorization")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(auth.starts_with("OAuth "));
    assert!(auth.contains("oauth_consumer_key=\"consumer-key\""));
    assert!(auth.contains("oauth_token=\"tw-token\""));
    assert!(auth.contains("oauth_signature_method=\"HMAC-SHA1\""));
    assert!(auth.contains("oauth_signature=\""));
}

#[tokio::test]
async fn test_twitter_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/1.1/account/verify_credentials.json"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "errors": [{ "code": 89, "message": "Invalid or expired token." }]
        })))
        .mount(&server)
        .await;

    let client = TwitterClient::new(&twitter_config(&server)).unwrap();
    let err = client.fetch_profile("stale", Some("secret")).await.unwrap_err();

    assert_eq!(err.user_message(), "Invalid or expired token.");
    assert!(matches!(err, ProviderError::Api { status: 401, .. }));
}

#[tokio::test]
async fn test_twitter_unreachable() {
    let server = MockServer::start().await;
    let config = twitter_config(&server);
    drop(server);

    let client = TwitterClient::new(&config).unwrap();
    let err = client.fetch_profile("tw-token", None).await.unwrap_err();

    assert!(matches!(err, ProviderError::Transport(_)));
    assert_eq!(err.user_message(), "Unable to reach the identity provider");
}
