//! End-to-end pipeline tests against a mocked hosted endpoint:
//! image bytes → provider → threshold filter → advisory lookup → rendering.

use httpmock::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

use antep::analysis::analyze_image;
use antep::config::{AnalysisConfig, ProviderKind, RemoteConfig};
use antep::provider::ProviderError;
use antep::report::render_report;

fn write_test_image(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("leaf.jpg");
    std::fs::write(&path, b"fake jpeg bytes").unwrap();
    path
}

fn remote_config(server: &MockServer, image: PathBuf, confidence: f32) -> AnalysisConfig {
    AnalysisConfig {
        image,
        provider: ProviderKind::Remote,
        confidence,
        remote: Some(RemoteConfig {
            endpoint: server.base_url(),
            model_id: "fistik-ojqcr/3".to_string(),
            api_key: "test-key".to_string(),
        }),
        weights: None,
    }
}

#[test]
fn test_threshold_filters_and_cards_render() {
    let temp_dir = TempDir::new().unwrap();
    let image = write_test_image(&temp_dir);

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/fistik-ojqcr/3");
        then.status(200).body(
            r#"{"predictions": [
                {"class": "PHYPSO", "confidence": 0.9},
                {"class": "SOKADE", "confidence": 0.2}
            ]}"#,
        );
    });

    let report = analyze_image(&remote_config(&server, image, 0.45)).unwrap();

    // Exactly one detection survives the 0.45 threshold.
    assert_eq!(report.detections.len(), 1);
    let analyzed = &report.detections[0];
    assert_eq!(analyzed.detection.class_label, "PHYPSO");
    assert_eq!(analyzed.info.title, "Yaprak Lekesi (Phyllosticta)");

    let rendered = render_report(&report);
    assert!(rendered.contains("Yaprak Lekesi (Phyllosticta)"));
    assert!(rendered.contains("%90.00"));
    assert!(!rendered.contains("SOKADE"));
}

#[test]
fn test_empty_predictions_render_informational_state() {
    let temp_dir = TempDir::new().unwrap();
    let image = write_test_image(&temp_dir);

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/fistik-ojqcr/3");
        then.status(200).body(r#"{"predictions": []}"#);
    });

    let report = analyze_image(&remote_config(&server, image, 0.45)).unwrap();
    assert!(report.detections.is_empty());

    let rendered = render_report(&report);
    assert!(rendered.contains("tespit edemedi"));
}

#[test]
fn test_all_detections_below_threshold_render_informational_state() {
    let temp_dir = TempDir::new().unwrap();
    let image = write_test_image(&temp_dir);

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/fistik-ojqcr/3");
        then.status(200)
            .body(r#"{"predictions": [{"class": "MYCOPT", "confidence": 0.1}]}"#);
    });

    let report = analyze_image(&remote_config(&server, image, 0.45)).unwrap();
    assert!(report.detections.is_empty());
}

#[test]
fn test_rejected_endpoint_fails_with_no_cards() {
    let temp_dir = TempDir::new().unwrap();
    let image = write_test_image(&temp_dir);

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/fistik-ojqcr/3");
        then.status(403).body("forbidden");
    });

    let err = analyze_image(&remote_config(&server, image, 0.45)).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ProviderError>(),
        Some(ProviderError::Rejected { status: 403, .. })
    ));
}

#[test]
fn test_unsupported_extension_fails_before_any_request() {
    let temp_dir = TempDir::new().unwrap();
    let image = temp_dir.path().join("leaf.bmp");
    std::fs::write(&image, b"bmp bytes").unwrap();

    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/fistik-ojqcr/3");
        then.status(200).body(r#"{"predictions": []}"#);
    });

    let err = analyze_image(&remote_config(&server, image, 0.45)).unwrap_err();
    assert!(err.to_string().contains("Unsupported image format"));
    mock.assert_hits(0);
}

#[test]
fn test_unknown_label_from_endpoint_gets_fallback_card() {
    let temp_dir = TempDir::new().unwrap();
    let image = write_test_image(&temp_dir);

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/fistik-ojqcr/3");
        then.status(200)
            .body(r#"{"predictions": [{"class": "BRAND-NEW", "confidence": 0.8}]}"#);
    });

    let report = analyze_image(&remote_config(&server, image, 0.45)).unwrap();
    assert_eq!(report.detections.len(), 1);
    assert_eq!(report.detections[0].info.title, "Bilinmeyen Etiket");
}
