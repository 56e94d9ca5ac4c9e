//! Hosted-endpoint inference provider.
//!
//! Issues a blocking `POST {endpoint}/{model_id}?api_key={key}` with the raw
//! image bytes as body, the way the hosted detection API expects, and
//! normalizes the JSON answer into `Vec<Detection>`.
//!
//! The response contract is permissive on purpose: a body without a
//! `predictions` key deserializes to zero detections rather than an error,
//! because the endpoint omits the key when nothing was found.

use crate::provider::{Detection, InferenceProvider, ProviderError};
use serde::Deserialize;

/// Upper bound on how much of an error body we carry into messages.
const ERROR_BODY_LIMIT: usize = 300;

#[derive(Debug, Deserialize)]
struct InferenceResponse {
    #[serde(default)]
    predictions: Vec<Detection>,
}

pub struct RemoteProvider {
    endpoint: String,
    model_id: String,
    api_key: String,
    client: reqwest::blocking::Client,
}

impl RemoteProvider {
    pub fn new(endpoint: String, model_id: String, api_key: String) -> Self {
        Self {
            endpoint,
            model_id,
            api_key,
            client: reqwest::blocking::Client::new(),
        }
    }

    fn inference_url(&self) -> String {
        format!(
            "{}/{}?api_key={}",
            self.endpoint.trim_end_matches('/'),
            self.model_id,
            self.api_key
        )
    }
}

fn truncate_body(body: &str) -> String {
    if body.chars().count() > ERROR_BODY_LIMIT {
        let truncated: String = body.chars().take(ERROR_BODY_LIMIT).collect();
        format!("{truncated}…")
    } else {
        body.to_string()
    }
}

impl RemoteProvider {
    fn detect_inner(&self, image_bytes: &[u8]) -> Result<Vec<Detection>, ProviderError> {
        log::debug!(
            "🌐 POST {}/{} ({} bytes)",
            self.endpoint,
            self.model_id,
            image_bytes.len()
        );

        let response = self
            .client
            .post(self.inference_url())
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(image_bytes.to_vec())
            .send()
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        if !status.is_success() {
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let parsed: InferenceResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::MalformedResponse(format!("{e} in body: {}", truncate_body(&body)))
        })?;

        log::debug!("📡 Endpoint returned {} prediction(s)", parsed.predictions.len());
        Ok(parsed.predictions)
    }
}

impl InferenceProvider for RemoteProvider {
    fn detect(&self, image_bytes: &[u8]) -> anyhow::Result<Vec<Detection>> {
        Ok(self.detect_inner(image_bytes)?)
    }

    fn describe(&self) -> String {
        format!("remote {} at {}", self.model_id, self.endpoint)
    }
}
