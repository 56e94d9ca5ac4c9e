//! In-process inference provider backed by local YOLO weights.
//!
//! The weights are resolved through the download-once cache (or an explicit
//! path override), and the ONNX session is built lazily, at most once per
//! process, behind a `OnceLock`. The first analysis pays the load cost;
//! later analyses in the same process reuse the session.
//!
//! Everything runs in memory: the uploaded image is decoded, letterboxed and
//! fed to the detector without touching disk.

use anyhow::{anyhow, Context, Result};
use image::DynamicImage;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use crate::advisory::CLASS_LABELS;
use crate::config::WeightsConfig;
use crate::provider::{Detection, InferenceProvider, ProviderError};
use crate::weights_cache::{get_or_download_weights, WeightsInfo};

/// Standard YOLO input size
const MODEL_INPUT_SIZE: usize = 640;

/// Floor below which raw boxes are not even considered candidates. The
/// user-facing threshold is applied later, in `filtering::by_confidence`.
const CANDIDATE_FLOOR: f32 = 0.05;

/// IoU above which two same-class candidates are considered duplicates.
const IOU_THRESHOLD: f32 = 0.45;

/// Session holder: loaded at most once per process, reused afterwards.
static SESSION: OnceLock<Mutex<Session>> = OnceLock::new();

pub struct LocalProvider {
    weights: WeightsConfig,
}

impl LocalProvider {
    pub fn new(weights: WeightsConfig) -> Self {
        Self { weights }
    }

    /// Resolve the weights file: explicit path override wins, otherwise the
    /// download-once cache. Download failures mean the provider is
    /// unavailable for this process.
    fn resolve_weights(&self) -> Result<PathBuf> {
        if let Some(path) = &self.weights.path_override {
            if !path.exists() {
                return Err(ProviderError::Unavailable(format!(
                    "weights file does not exist: {}",
                    path.display()
                ))
                .into());
            }
            log::debug!("🏠 Using local weights override: {}", path.display());
            return Ok(path.clone());
        }

        let url = self
            .weights
            .url
            .as_ref()
            .ok_or_else(|| anyhow!("No weights URL configured for the local provider"))?;
        let info = WeightsInfo::from_url(url.clone(), self.weights.checksum.clone());
        get_or_download_weights(&info)
            .map_err(|e| ProviderError::Unavailable(format!("weights download failed: {e}")).into())
    }

    fn session(&self) -> Result<&'static Mutex<Session>> {
        if let Some(session) = SESSION.get() {
            return Ok(session);
        }

        let weights_path = self.resolve_weights()?;
        log::info!("🧠 Loading detection model: {}", weights_path.display());
        let session = Session::builder()?
            .commit_from_file(&weights_path)
            .with_context(|| format!("Failed to load ONNX model from {}", weights_path.display()))?;

        // Single-threaded in practice; a concurrent first call would just
        // drop the extra session.
        Ok(SESSION.get_or_init(|| Mutex::new(session)))
    }
}

impl InferenceProvider for LocalProvider {
    fn detect(&self, image_bytes: &[u8]) -> Result<Vec<Detection>> {
        let img = image::load_from_memory(image_bytes).context("Failed to decode input image")?;
        let input = preprocess_image(&img, MODEL_INPUT_SIZE);

        let session = self.session()?;
        let mut session = session
            .lock()
            .map_err(|_| anyhow!("Detection session lock poisoned"))?;

        let input_contiguous = input.as_standard_layout();
        let input_tensor = TensorRef::from_array_view(&input_contiguous)
            .map_err(|e| anyhow!("Failed to create input tensor: {e}"))?;
        let outputs = session
            .run(ort::inputs!["images" => input_tensor])
            .map_err(|e| anyhow!("Detector invocation failed: {e}"))?;

        let (shape, data) = outputs["output0"]
            .try_extract_tensor::<f32>()
            .map_err(|e| anyhow!("Failed to extract detector output: {e}"))?;
        let shape: Vec<usize> = shape.iter().map(|&d| d as usize).collect();

        let detections = decode_output(&shape, data)?;
        log::debug!("🔎 Local model produced {} candidate(s)", detections.len());
        Ok(detections)
    }

    fn describe(&self) -> String {
        match &self.weights.path_override {
            Some(path) => format!("local weights at {}", path.display()),
            None => "local weights from download cache".to_string(),
        }
    }
}

/// Letterbox the image onto a gray square canvas and convert to normalized
/// NCHW floats, the layout YOLO models expect.
fn preprocess_image(img: &DynamicImage, target_size: usize) -> Array4<f32> {
    let rgb = img.to_rgb8();
    let (orig_w, orig_h) = rgb.dimensions();

    let scale = (target_size as f32 / orig_w as f32).min(target_size as f32 / orig_h as f32);
    let new_w = ((orig_w as f32 * scale) as u32).max(1);
    let new_h = ((orig_h as f32 * scale) as u32).max(1);
    let resized = image::imageops::resize(&rgb, new_w, new_h, image::imageops::FilterType::Triangle);

    let x_offset = (target_size as u32 - new_w) / 2;
    let y_offset = (target_size as u32 - new_h) / 2;

    // Gray padding (114) matches YOLO training-time letterboxing.
    let mut input = Array4::from_elem((1, 3, target_size, target_size), 114.0 / 255.0);
    for (x, y, pixel) in resized.enumerate_pixels() {
        let cx = (x + x_offset) as usize;
        let cy = (y + y_offset) as usize;
        for c in 0..3 {
            input[[0, c, cy, cx]] = pixel[c] as f32 / 255.0;
        }
    }

    input
}

/// One raw candidate box in model coordinates. Geometry is only needed here,
/// for duplicate suppression; it is dropped before the provider boundary.
#[derive(Debug, Clone)]
struct RawBox {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    confidence: f32,
    class_idx: usize,
}

impl RawBox {
    fn area(&self) -> f32 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }

    fn iou(&self, other: &RawBox) -> f32 {
        let ix = (self.x2.min(other.x2) - self.x1.max(other.x1)).max(0.0);
        let iy = (self.y2.min(other.y2) - self.y1.max(other.y1)).max(0.0);
        let intersection = ix * iy;
        let union = self.area() + other.area() - intersection;
        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }
}

/// Decode a `[1, 4 + num_classes, boxes]` YOLO output tensor into candidate
/// detections: best class per box, candidate floor, per-class NMS, then
/// class-index → label via the model's label table.
fn decode_output(shape: &[usize], data: &[f32]) -> Result<Vec<Detection>> {
    if shape.len() != 3 || shape[0] != 1 {
        return Err(anyhow!("Expected [1, attrs, boxes] detector output, got {shape:?}"));
    }
    let num_attrs = shape[1];
    let num_boxes = shape[2];
    if num_attrs < 5 {
        return Err(anyhow!(
            "Detector output has {num_attrs} attributes per box, need at least 5"
        ));
    }
    let num_classes = num_attrs - 4;
    let at = |attr: usize, b: usize| data[attr * num_boxes + b];

    let mut candidates = Vec::new();
    for b in 0..num_boxes {
        let (best_class, best_conf) = (0..num_classes)
            .map(|c| (c, at(4 + c, b)))
            .fold((0, f32::MIN), |acc, cur| if cur.1 > acc.1 { cur } else { acc });

        if best_conf < CANDIDATE_FLOOR {
            continue;
        }

        let (xc, yc, w, h) = (at(0, b), at(1, b), at(2, b), at(3, b));
        candidates.push(RawBox {
            x1: xc - w / 2.0,
            y1: yc - h / 2.0,
            x2: xc + w / 2.0,
            y2: yc + h / 2.0,
            confidence: best_conf,
            class_idx: best_class,
        });
    }

    let kept = nms(candidates, IOU_THRESHOLD);
    Ok(kept
        .into_iter()
        .map(|raw| Detection {
            class_label: class_label_for(raw.class_idx),
            confidence: raw.confidence,
        })
        .collect())
}

/// Map the detector's class index to its label. Indices beyond the known
/// table keep a synthetic label so the advisory fallback can handle them.
fn class_label_for(class_idx: usize) -> String {
    CLASS_LABELS
        .get(class_idx)
        .map(|label| label.to_string())
        .unwrap_or_else(|| format!("CLASS_{class_idx}"))
}

/// Suppress same-class duplicates, keeping the highest-confidence box of
/// each overlapping cluster. Output is ordered by descending confidence.
fn nms(mut candidates: Vec<RawBox>, iou_threshold: f32) -> Vec<RawBox> {
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<RawBox> = Vec::new();
    for candidate in candidates {
        let duplicate = kept
            .iter()
            .any(|k| k.class_idx == candidate.class_idx && k.iou(&candidate) > iou_threshold);
        if !duplicate {
            kept.push(candidate);
        }
    }
    kept
}
