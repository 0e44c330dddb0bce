//! Registration event fan-out.
//!
//! Downstream services (welcome mail, analytics, CRM sync) learn about new
//! registrations through this seam. Delivery is best-effort by contract:
//! implementations swallow and log their own failures so a flaky consumer
//! can never roll back a registration.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::APP_USER_AGENT;

const PUBLISH_TIMEOUT: Duration = Duration::from_secs(10);

/// Publish-only seam for the `user_registered` event.
#[async_trait]
pub trait RegistrationPublisher: Send + Sync {
    /// Announce a fresh registration. The raw token rides along as event
    /// payload so the consumer can build its own verification link; it is
    /// never logged here.
    async fn publish_user_registered(&self, email: &str, raw_token: &str);
}

/// Publisher for deployments without a downstream consumer.
#[derive(Clone, Debug)]
pub struct NoopPublisher;

#[async_trait]
impl RegistrationPublisher for NoopPublisher {
    async fn publish_user_registered(&self, _email: &str, _raw_token: &str) {}
}

/// POSTs registration events as JSON to a configured endpoint.
#[derive(Clone, Debug)]
pub struct HttpPublisher {
    client: Client,
    endpoint: String,
}

impl HttpPublisher {
    /// # Errors
    ///
    /// Fails if the underlying HTTP client cannot be constructed.
    pub fn new(endpoint: String) -> Result<Self> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(PUBLISH_TIMEOUT)
            .build()
            .context("failed to build registration publisher client")?;
        Ok(Self { client, endpoint })
    }
}

fn event_payload(email: &str, raw_token: &str) -> Value {
    json!({
        "email": email,
        "verification_token": raw_token,
    })
}

#[async_trait]
impl RegistrationPublisher for HttpPublisher {
    async fn publish_user_registered(&self, email: &str, raw_token: &str) {
        let payload = event_payload(email, raw_token);
        match self.client.post(&self.endpoint).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                debug!(endpoint = %self.endpoint, "published user_registered event");
            }
            Ok(response) => {
                warn!(
                    endpoint = %self.endpoint,
                    status = %response.status(),
                    "user_registered event rejected"
                );
            }
            Err(err) => {
                warn!(endpoint = %self.endpoint, "failed to publish user_registered event: {err}");
            }
        }
    }
}
