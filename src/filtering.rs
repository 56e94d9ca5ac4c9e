//! The single user-facing filtering point.
//!
//! Both providers return candidate detections; the configured confidence
//! threshold is applied here, once, for either backend.

use crate::provider::Detection;

/// Keep detections with `confidence >= threshold`, preserving input order.
pub fn by_confidence(detections: &[Detection], threshold: f32) -> Vec<Detection> {
    detections
        .iter()
        .filter(|d| d.confidence >= threshold)
        .cloned()
        .collect()
}
