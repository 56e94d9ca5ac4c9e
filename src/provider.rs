//! The provider seam: one detection type, one error taxonomy, and the trait
//! both inference backends implement.
//!
//! A provider turns raw image bytes into a list of candidate detections. It
//! does not apply the user-facing confidence threshold; that happens exactly
//! once, downstream, in `filtering::by_confidence`, so that swapping
//! providers never changes what the user sees.

use serde::{Deserialize, Serialize};

/// One model output: a predicted class label with a confidence score.
///
/// No localization geometry survives past the provider boundary; this system
/// only consumes class + confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "class")]
    pub class_label: String,
    pub confidence: f32,
}

/// Failure modes of an inference provider.
///
/// Providers return `anyhow::Result` so that anything outside this taxonomy
/// (image decode failures, detector invocation errors) can still propagate;
/// the top level downcasts to `ProviderError` to pick the user-facing
/// message and treats everything else as an unexpected failure.
#[derive(Debug)]
pub enum ProviderError {
    /// The provider could not be reached at all: network failure, or the
    /// weights download failed for the local backend.
    Unavailable(String),
    /// The provider was reachable but refused the request (non-2xx status),
    /// typically invalid credentials or an unknown model identifier.
    Rejected { status: u16, body: String },
    /// The provider answered with a body we could not parse.
    MalformedResponse(String),
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderError::Unavailable(detail) => {
                write!(f, "inference provider unavailable: {detail}")
            }
            ProviderError::Rejected { status, body } => {
                write!(
                    f,
                    "inference provider rejected the request (HTTP {status}): {body}"
                )
            }
            ProviderError::MalformedResponse(detail) => {
                write!(f, "malformed provider response: {detail}")
            }
        }
    }
}

impl std::error::Error for ProviderError {}

/// A backend that can run detection over one image.
///
/// Implementations are blocking and one-shot: one image in, candidate
/// detections out, no retries.
pub trait InferenceProvider {
    fn detect(&self, image_bytes: &[u8]) -> anyhow::Result<Vec<Detection>>;

    /// Short human-readable description for logs ("remote fistik-ojqcr/3",
    /// "local weights at ...").
    fn describe(&self) -> String;
}
