//! Token lifecycle against a mock identity endpoint.

use std::sync::Arc;

use chrono::{Duration, Utc};
use orders_pdf_core::{AccessToken, CredentialError, TokenProvider};
use orders_pdf_proxy::credentials::{CredentialCache, GraphCredentials};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN_PATH: &str = "/tenant-1/oauth2/v2.0/token";

fn cache(identity: &MockServer) -> CredentialCache {
    CredentialCache::new(
        reqwest::Client::new(),
        Ok(GraphCredentials {
            token_url: format!("{}{}", identity.uri(), TOKEN_PATH),
            client_id: "client-1".to_string(),
            client_secret: "s3cret".to_string(),
            scope: "https://graph.microsoft.com/.default".to_string(),
        }),
    )
}

async fn mount_token_endpoint(identity: &MockServer, body: serde_json::Value, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=client-1"))
        .and(body_string_contains("client_secret=s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(expected_calls)
        .mount(identity)
        .await;
}

#[tokio::test]
async fn test_valid_token_served_from_cache() {
    let identity = MockServer::start().await;
    mount_token_endpoint(&identity, json!({"access_token": "fresh", "expires_in": 3599}), 0).await;

    let cache = cache(&identity);
    let expires_at = Utc::now() + Duration::minutes(10);
    cache.prime(AccessToken::new("cached", expires_at)).await;

    let token = cache.get_token().await.unwrap();
    assert_eq!(token.value, "cached");
    assert_eq!(token.expires_at, expires_at);
}

#[tokio::test]
async fn test_token_inside_margin_is_refreshed_once() {
    let identity = MockServer::start().await;
    mount_token_endpoint(&identity, json!({"access_token": "fresh", "expires_in": 3599}), 1).await;

    let cache = cache(&identity);
    cache
        .prime(AccessToken::new("stale", Utc::now() + Duration::seconds(45)))
        .await;

    let token = cache.get_token().await.unwrap();
    assert_eq!(token.value, "fresh");
    assert!(token.expires_at > Utc::now() + Duration::seconds(3500));

    // The refreshed token is now cached.
    let again = cache.get_token().await.unwrap();
    assert_eq!(again.value, "fresh");
}

#[tokio::test]
async fn test_expired_token_is_refreshed() {
    let identity = MockServer::start().await;
    mount_token_endpoint(&identity, json!({"access_token": "fresh", "expires_in": 600}), 1).await;

    let cache = cache(&identity);
    cache
        .prime(AccessToken::new("old", Utc::now() - Duration::minutes(5)))
        .await;

    assert_eq!(cache.get_token().await.unwrap().value, "fresh");
}

#[tokio::test]
async fn test_first_call_fetches_lazily() {
    let identity = MockServer::start().await;
    mount_token_endpoint(&identity, json!({"access_token": "first"}), 1).await;

    let cache = cache(&identity);
    let before = Utc::now();
    let token = cache.get_token().await.unwrap();

    assert_eq!(token.value, "first");
    // No expires_in: one hour is assumed.
    assert!(token.expires_at >= before + Duration::seconds(3600));
    assert!(token.expires_at <= Utc::now() + Duration::seconds(3600));
}

#[tokio::test]
async fn test_rejected_exchange() {
    let identity = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "invalid_client"})),
        )
        .expect(1)
        .mount(&identity)
        .await;

    let err = cache(&identity).get_token().await.unwrap_err();
    match err {
        CredentialError::Rejected(message) => {
            assert!(message.contains("401"), "{}", message);
            assert!(message.contains("invalid_client"), "{}", message);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_identity_endpoint() {
    let cache = CredentialCache::new(
        reqwest::Client::new(),
        Ok(GraphCredentials {
            token_url: "http://127.0.0.1:9/tenant-1/oauth2/v2.0/token".to_string(),
            client_id: "client-1".to_string(),
            client_secret: "s3cret".to_string(),
            scope: "scope".to_string(),
        }),
    );

    assert!(matches!(
        cache.get_token().await,
        Err(CredentialError::Unreachable(_))
    ));
}

#[tokio::test]
async fn test_concurrent_readers_share_valid_token() {
    let identity = MockServer::start().await;
    mount_token_endpoint(&identity, json!({"access_token": "fresh"}), 0).await;

    let cache = Arc::new(cache(&identity));
    cache
        .prime(AccessToken::new("shared", Utc::now() + Duration::minutes(30)))
        .await;

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get_token().await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap().value, "shared");
    }
}
