//! HTTP-backed federation provider.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use keygate_core::config::federation::FederationConfig;
use keygate_core::error::AppError;
use keygate_core::result::AppResult;

use super::provider::{FederationProvider, VerifiedClaims};

/// Request body sent to the provider's verification endpoint.
#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    assertion: &'a str,
}

/// Response body from the provider's verification endpoint.
#[derive(Debug, Deserialize)]
struct VerifyResponse {
    sub: String,
    email: Option<String>,
    name: Option<String>,
    iss: Option<String>,
}

/// Verifies assertions by calling the provider's verification endpoint.
#[derive(Debug, Clone)]
pub struct HttpFederationProvider {
    /// HTTP client with the configured timeout.
    client: reqwest::Client,
    /// Provider settings.
    config: FederationConfig,
}

impl HttpFederationProvider {
    /// Creates a new provider adapter from configuration.
    pub fn new(config: FederationConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::configuration(format!("Failed to build federation client: {e}"))
            })?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl FederationProvider for HttpFederationProvider {
    async fn resolve(&self, assertion: &str) -> AppResult<VerifiedClaims> {
        if !self.config.enabled {
            return Err(AppError::federation("Federated login is not enabled"));
        }

        let response = self
            .client
            .post(&self.config.verify_url)
            .json(&VerifyRequest { assertion })
            .send()
            .await
            .map_err(|e| {
                AppError::external_service(format!("Federation provider unreachable: {e}"))
            })?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "Federation provider rejected assertion");
            return Err(AppError::federation("Assertion could not be verified"));
        }

        let body: VerifyResponse = response.json().await.map_err(|e| {
            AppError::federation(format!("Malformed federation provider response: {e}"))
        })?;

        if let Some(expected) = &self.config.issuer {
            if body.iss.as_deref() != Some(expected.as_str()) {
                return Err(AppError::federation("Assertion issued by unexpected issuer"));
            }
        }

        let email = body
            .email
            .ok_or_else(|| AppError::federation("Assertion carries no email claim"))?;

        Ok(VerifiedClaims {
            subject: body.sub,
            email,
            name: body.name,
        })
    }
}
