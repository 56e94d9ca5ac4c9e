//! Orchestration for one analysis run: provider selection, detection,
//! threshold filtering and advisory lookup.

use anyhow::Result;

use crate::advisory::{self, DiseaseInfo};
use crate::config::{AnalysisConfig, ProviderKind};
use crate::filtering;
use crate::image_input;
use crate::local::LocalProvider;
use crate::provider::{Detection, InferenceProvider};
use crate::remote::RemoteProvider;

/// One retained detection paired with its advisory card content.
#[derive(Debug, Clone)]
pub struct AnalyzedDetection {
    pub detection: Detection,
    pub info: DiseaseInfo,
}

/// Everything the presentation layer needs to render one analysis.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub detections: Vec<AnalyzedDetection>,
    pub threshold: f32,
}

/// Build the configured inference backend.
pub fn build_provider(config: &AnalysisConfig) -> Box<dyn InferenceProvider> {
    match config.provider {
        ProviderKind::Remote => {
            // from_args guarantees the remote settings are present
            let remote = config.remote.clone().expect("remote config present");
            Box::new(RemoteProvider::new(
                remote.endpoint,
                remote.model_id,
                remote.api_key,
            ))
        }
        ProviderKind::Local => {
            let weights = config.weights.clone().expect("weights config present");
            Box::new(LocalProvider::new(weights))
        }
    }
}

/// Run the full pipeline over the configured input image.
pub fn analyze_image(config: &AnalysisConfig) -> Result<AnalysisReport> {
    let image_bytes = image_input::read_image_bytes(&config.image)?;

    let provider = build_provider(config);
    log::info!("🧪 Analyzing {} via {}", config.image.display(), provider.describe());

    let candidates = provider.detect(&image_bytes)?;
    let retained = filtering::by_confidence(&candidates, config.confidence);
    log::debug!(
        "Retained {} of {} detection(s) at threshold {}",
        retained.len(),
        candidates.len(),
        config.confidence
    );

    let detections = retained
        .into_iter()
        .map(|detection| AnalyzedDetection {
            info: advisory::lookup(&detection.class_label),
            detection,
        })
        .collect();

    Ok(AnalysisReport {
        detections,
        threshold: config.confidence,
    })
}
