//! HTTP client for the external verification service.

use veracity_protocols::error::VerifyError;
use veracity_protocols::verdict::{CheckRequest, VerificationResult};

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

/// Client for `POST {api_base}/check`. The service is an opaque
/// collaborator; this is the only network call the shell makes.
pub struct VerifyClient {
    client: reqwest::Client,
    api_base: String,
}

impl VerifyClient {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into(),
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Submit text for verification.
    pub async fn check(&self, content: &str) -> Result<VerificationResult, VerifyError> {
        let url = format!("{}/check", self.api_base.trim_end_matches('/'));
        let request = CheckRequest { content: content.to_string() };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| VerifyError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(VerifyError::Http { status: response.status().as_u16() });
        }

        response
            .json()
            .await
            .map_err(|e| VerifyError::Decode(e.to_string()))
    }
}
