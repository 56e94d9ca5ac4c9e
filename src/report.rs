//! Terminal rendering of analysis results.
//!
//! One card per retained detection: title, raw class label, a confidence bar
//! with percentage, and the advisory description. An empty result set
//! renders as a single informational line instead of an error.

use crate::analysis::{AnalysisReport, AnalyzedDetection};
use crate::color_utils::colors;

/// Width of the textual confidence bar, in characters.
const BAR_WIDTH: usize = 30;

/// Render a 0–1 confidence value as a filled/empty bar.
fn confidence_bar(confidence: f32) -> String {
    let filled = (confidence.clamp(0.0, 1.0) * BAR_WIDTH as f32).round() as usize;
    let mut bar = String::with_capacity(BAR_WIDTH * 3);
    for i in 0..BAR_WIDTH {
        bar.push(if i < filled { '█' } else { '░' });
    }
    bar
}

fn render_card(analyzed: &AnalyzedDetection) -> String {
    let detection = &analyzed.detection;
    let info = &analyzed.info;
    let percent = detection.confidence * 100.0;

    format!(
        "{} ({})\n  {} %{:.2}\n  {}\n",
        colors::card_title(info.title),
        detection.class_label,
        confidence_bar(detection.confidence),
        percent,
        info.description,
    )
}

/// Render the whole report, including the empty informational state.
pub fn render_report(report: &AnalysisReport) -> String {
    if report.detections.is_empty() {
        return format!(
            "Model, %{:.0} güvenin üzerinde bir hastalık/zararlı tespit edemedi. \
             Görünüşe göre yaprak sağlıklı olabilir!",
            report.threshold * 100.0
        );
    }

    let mut out = String::new();
    out.push_str(&colors::success("Olası hastalıklar tespit edildi:"));
    out.push('\n');
    for analyzed in &report.detections {
        out.push('\n');
        out.push_str(&render_card(analyzed));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisory;
    use crate::provider::Detection;

    fn report_with(detections: Vec<(&str, f32)>, threshold: f32) -> AnalysisReport {
        AnalysisReport {
            detections: detections
                .into_iter()
                .map(|(label, confidence)| AnalyzedDetection {
                    detection: Detection {
                        class_label: label.to_string(),
                        confidence,
                    },
                    info: advisory::lookup(label),
                })
                .collect(),
            threshold,
        }
    }

    #[test]
    fn test_confidence_bar_bounds() {
        assert_eq!(confidence_bar(0.0), "░".repeat(BAR_WIDTH));
        assert_eq!(confidence_bar(1.0), "█".repeat(BAR_WIDTH));
        // Out-of-range values clamp instead of panicking.
        assert_eq!(confidence_bar(2.0), "█".repeat(BAR_WIDTH));
        let half = confidence_bar(0.5);
        assert_eq!(half.chars().filter(|&c| c == '█').count(), BAR_WIDTH / 2);
    }

    #[test]
    fn test_card_contains_title_label_percentage_and_advice() {
        let rendered = render_report(&report_with(vec![("PHYPSO", 0.9)], 0.45));
        assert!(rendered.contains("Yaprak Lekesi (Phyllosticta)"));
        assert!(rendered.contains("(PHYPSO)"));
        assert!(rendered.contains("%90.00"));
        assert!(rendered.contains("Öneri:"));
    }

    #[test]
    fn test_unknown_label_card_uses_fallback() {
        let rendered = render_report(&report_with(vec![("MYSTERY", 0.8)], 0.45));
        assert!(rendered.contains("Bilinmeyen Etiket"));
        assert!(rendered.contains("(MYSTERY)"));
    }

    #[test]
    fn test_empty_report_is_informational() {
        let rendered = render_report(&report_with(vec![], 0.45));
        assert!(rendered.contains("%45"));
        assert!(rendered.contains("tespit edemedi"));
    }

    #[test]
    fn test_one_card_per_detection() {
        let rendered = render_report(&report_with(
            vec![("PHYPSO", 0.9), ("SOKADE", 0.6)],
            0.45,
        ));
        assert!(rendered.contains("Yaprak Lekesi (Phyllosticta)"));
        assert!(rendered.contains("Sokan ve Delen Zararlı Hasarı"));
    }
}
