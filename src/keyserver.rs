//! Upstream keyserver client.
//!
//! The relay reads public keys from a VKS keyserver
//! (`GET /vks/v1/by-fingerprint/{fp}`) and needs no write capability. The
//! [`Keyserver`] trait abstracts the connection so tests can run against
//! [`MockKeyserver`] instead of the network.

use crate::config::KeyserverConfig;
use crate::error::{KeyError, KeyResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Result of a keyserver lookup.
#[derive(Debug, Clone)]
pub enum KeyserverResponse {
    /// The keyserver returned armored key material.
    Found(String),
    /// The keyserver has no key for this fingerprint.
    NotFound,
}

/// Read-only keyserver connection.
#[async_trait]
pub trait Keyserver: Send + Sync {
    /// Fetch armored key material by canonical fingerprint.
    ///
    /// A missing key is a normal answer ([`KeyserverResponse::NotFound`]);
    /// rate limiting and transport failures are errors.
    async fn fetch_by_fingerprint(&self, fingerprint: &str) -> KeyResult<KeyserverResponse>;
}

/// HTTP client for a VKS keyserver (keys.openpgp.org protocol).
#[derive(Debug, Clone)]
pub struct VksKeyserver {
    client: reqwest::Client,
    base_url: String,
}

impl VksKeyserver {
    /// Build a client from configuration.
    ///
    /// Every fetch carries a bounded timeout so a slow keyserver can never
    /// block a request indefinitely.
    pub fn new(config: &KeyserverConfig) -> KeyResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()
            .map_err(|e| KeyError::Upstream(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Keyserver for VksKeyserver {
    async fn fetch_by_fingerprint(&self, fingerprint: &str) -> KeyResult<KeyserverResponse> {
        let url = format!("{}/vks/v1/by-fingerprint/{}", self.base_url, fingerprint);
        tracing::debug!(%url, "fetching key from keyserver");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| KeyError::Upstream(e.to_string()))?;

        match response.status() {
            reqwest::StatusCode::NOT_FOUND => Ok(KeyserverResponse::NotFound),
            reqwest::StatusCode::TOO_MANY_REQUESTS => Err(KeyError::RateLimited),
            status if status.is_success() => {
                let armored = response
                    .text()
                    .await
                    .map_err(|e| KeyError::Upstream(e.to_string()))?;
                Ok(KeyserverResponse::Found(armored))
            }
            status => Err(KeyError::Upstream(format!("keyserver returned {status}"))),
        }
    }
}

/// Failure modes a [`MockKeyserver`] can be told to produce.
#[derive(Debug, Clone, Copy)]
pub enum MockFailure {
    /// Answer the next fetch with a rate-limit error.
    RateLimited,
    /// Answer the next fetch with an upstream error.
    Unavailable,
}

/// Mock keyserver for testing.
///
/// Allows publishing armored keys under fingerprints, forcing failures, and
/// counting upstream fetches for cache assertions.
#[derive(Debug, Default)]
pub struct MockKeyserver {
    inner: Arc<Mutex<MockKeyserverInner>>,
}

#[derive(Debug, Default)]
struct MockKeyserverInner {
    keys: HashMap<String, String>,
    fetches: Vec<String>,
    fail_next: Option<MockFailure>,
}

impl MockKeyserver {
    /// Create an empty mock keyserver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish armored key material under a fingerprint.
    pub fn publish(&self, fingerprint: &str, armored_key: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.keys.insert(fingerprint.to_string(), armored_key.to_string());
    }

    /// Cause the next fetch to fail.
    pub fn fail_next(&self, failure: MockFailure) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next = Some(failure);
    }

    /// Total number of fetches that reached this keyserver.
    pub fn fetch_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.fetches.len()
    }

    /// Number of fetches for one fingerprint.
    pub fn fetches_for(&self, fingerprint: &str) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.fetches.iter().filter(|f| *f == fingerprint).count()
    }
}

impl Clone for MockKeyserver {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl Keyserver for MockKeyserver {
    async fn fetch_by_fingerprint(&self, fingerprint: &str) -> KeyResult<KeyserverResponse> {
        let mut inner = self.inner.lock().unwrap();

        if let Some(failure) = inner.fail_next.take() {
            return Err(match failure {
                MockFailure::RateLimited => KeyError::RateLimited,
                MockFailure::Unavailable => KeyError::Upstream("mock keyserver unavailable".into()),
            });
        }

        inner.fetches.push(fingerprint.to_string());
        match inner.keys.get(fingerprint) {
            Some(armored) => Ok(KeyserverResponse::Found(armored.clone())),
            None => Ok(KeyserverResponse::NotFound),
        }
    }
}
