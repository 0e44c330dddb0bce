//! End-to-end account lifecycle tests over the in-memory store.
//!
//! This suite composes the crate the way the server action does, with two
//! substitutions: the in-memory credential store instead of Postgres, and a
//! recording mailbox instead of the log notifier. Engine flows run against
//! `AuthService` directly; the HTTP tests drive the real router in process
//! via `tower::ServiceExt`.

use anyhow::Result;
use atesti::auth::notifier::VerificationNotifier;
use atesti::auth::publisher::NoopPublisher;
use atesti::auth::store::CredentialStore;
use atesti::auth::{AuthConfig, AuthError, AuthService, SessionIssuer};
use atesti::store::memory::MemoryStore;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Extension;
use secrecy::SecretString;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Test double standing in for the outbound email channel.
#[derive(Debug, Default)]
struct Mailbox {
    sent: Mutex<Vec<(String, String)>>,
}

impl Mailbox {
    fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    fn last_raw_token(&self) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .last()
            .and_then(|(_, link)| link.split_once("token=").map(|(_, raw)| raw.to_string()))
    }
}

impl VerificationNotifier for Mailbox {
    fn notify_verification_link(&self, email: &str, link: &str) {
        self.sent
            .lock()
            .unwrap()
            .push((email.to_string(), link.to_string()));
    }
}

fn default_config() -> AuthConfig {
    AuthConfig::new("https://accounts.atesti.dev".to_string())
}

fn build_service(config: AuthConfig) -> (Arc<MemoryStore>, Arc<Mailbox>, Arc<AuthService>) {
    let store = Arc::new(MemoryStore::new());
    let mailbox = Arc::new(Mailbox::default());
    let service = AuthService::new(
        store.clone(),
        SessionIssuer::new(SecretString::from("integration-secret".to_string())),
        mailbox.clone(),
        Arc::new(NoopPublisher),
        config,
    );
    (store, mailbox, Arc::new(service))
}

#[tokio::test]
async fn resend_supersedes_previous_link() -> Result<()> {
    let (_store, mailbox, service) = build_service(default_config());

    service.register("kim@example.com", "hunter2").await?;
    let first = mailbox.last_raw_token().unwrap();

    service.resend_verification("kim@example.com").await?;
    assert_eq!(mailbox.sent_count(), 2);
    let second = mailbox.last_raw_token().unwrap();
    assert_ne!(first, second);

    // The superseded link is dead, indistinguishable from garbage.
    let result = service.verify_email(&first).await;
    assert!(matches!(result, Err(AuthError::InvalidToken)));

    service.verify_email(&second).await?;
    assert!(service.login("kim@example.com", "hunter2").await.is_ok());
    Ok(())
}

#[tokio::test]
async fn replayed_link_reports_already_used() -> Result<()> {
    let (_store, mailbox, service) = build_service(default_config());

    service.register("kim@example.com", "hunter2").await?;
    let raw = mailbox.last_raw_token().unwrap();

    service.verify_email(&raw).await?;
    let replay = service.verify_email(&raw).await;
    assert!(matches!(replay, Err(AuthError::TokenAlreadyUsed)));

    // The failed replay does not unverify the account.
    assert!(service.login("kim@example.com", "hunter2").await.is_ok());
    Ok(())
}

#[tokio::test]
async fn expired_link_stays_unverified() -> Result<()> {
    let (_store, mailbox, service) = build_service(default_config().with_token_ttl_seconds(0));

    service.register("kim@example.com", "hunter2").await?;
    let raw = mailbox.last_raw_token().unwrap();

    let result = service.verify_email(&raw).await;
    assert!(matches!(result, Err(AuthError::TokenExpired)));

    let login = service.login("kim@example.com", "hunter2").await;
    assert!(matches!(login, Err(AuthError::EmailNotVerified)));
    Ok(())
}

#[tokio::test]
async fn unknown_and_verified_resends_stay_quiet() -> Result<()> {
    let (_store, mailbox, service) = build_service(default_config());

    service.resend_verification("ghost@example.com").await?;
    assert_eq!(mailbox.sent_count(), 0);

    service.register("kim@example.com", "hunter2").await?;
    let raw = mailbox.last_raw_token().unwrap();
    service.verify_email(&raw).await?;

    service.resend_verification("kim@example.com").await?;
    assert_eq!(mailbox.sent_count(), 1);
    Ok(())
}

#[tokio::test]
async fn garbage_token_is_invalid() -> Result<()> {
    let (_store, _mailbox, service) = build_service(default_config());

    let result = service.verify_email("not-a-token-anyone-issued").await;
    assert!(matches!(result, Err(AuthError::InvalidToken)));
    Ok(())
}

#[tokio::test]
async fn zero_ttl_session_is_rejected_on_authenticate() -> Result<()> {
    let (_store, mailbox, service) = build_service(default_config().with_session_ttl_seconds(0));

    service.register("kim@example.com", "hunter2").await?;
    let raw = mailbox.last_raw_token().unwrap();
    service.verify_email(&raw).await?;

    let session = service.login("kim@example.com", "hunter2").await?;
    let result = service.authenticate(&session.token).await;
    assert!(matches!(result, Err(AuthError::InvalidSession)));
    Ok(())
}

fn test_app() -> (Arc<Mailbox>, axum::Router) {
    let (store, mailbox, service) = build_service(default_config());
    let (router, _doc) = atesti::api::router().split_for_parts();
    let app = router
        .layer(Extension(store as Arc<dyn CredentialStore>))
        .layer(Extension(service));
    (mailbox, app)
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Result<Value> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[tokio::test]
async fn http_lifecycle_register_verify_login_me() -> Result<()> {
    let (mailbox, app) = test_app();

    // Register returns the uniform acknowledgement.
    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/auth/register",
            &json!({"email": "kim@example.com", "password": "hunter2"}),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    // Login is gated until the link is consumed.
    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/auth/login",
            &json!({"email": "kim@example.com", "password": "hunter2"}),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let raw = mailbox.last_raw_token().unwrap();
    let response = app
        .clone()
        .oneshot(post_json("/v1/auth/verify-email", &json!({"token": raw})))
        .await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/auth/login",
            &json!({"email": "kim@example.com", "password": "hunter2"}),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await?;
    let token = body["token"].as_str().unwrap().to_string();
    assert_eq!(body["role"], "user");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/v1/me")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await?;
    assert_eq!(body["email"], "kim@example.com");
    assert_eq!(body["role"], "user");

    // Duplicate registration maps to conflict.
    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/auth/register",
            &json!({"email": "kim@example.com", "password": "other"}),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn http_health_and_resend_are_uniform() -> Result<()> {
    let (mailbox, app) = test_app();

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("X-App"));

    // Unknown address: same 202 as a real one, nothing delivered.
    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/auth/resend-verification",
            &json!({"email": "ghost@example.com"}),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(mailbox.sent_count(), 0);
    Ok(())
}
