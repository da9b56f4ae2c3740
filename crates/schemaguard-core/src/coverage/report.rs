//! Plain-text coverage report synthesis.

use super::analyzer::CoverageAnalyzer;
use super::types::*;

fn glyph(meets: bool) -> char {
    if meets {
        '✓'
    } else {
        '✗'
    }
}

fn metrics_section(out: &mut String, metrics: &CoverageMetrics) {
    for metric in Metric::all() {
        let m = metrics.metric(*metric);
        out.push_str(&format!(
            "  {} {:<11} {:>6.2}% ({}/{})\n",
            glyph(m.meets_threshold),
            metric.as_str(),
            m.percentage,
            m.covered,
            m.total,
        ));
    }
}

impl CoverageAnalyzer {
    /// Render the full threshold report: overall section, one subsection
    /// per layer, violations, and recommendations when present.
    pub fn generate_coverage_report(&self, dataset: &CoverageDataset) -> String {
        let layers = self.aggregate(dataset);
        let validation = self.validate_thresholds(dataset);

        let mut out = String::new();
        out.push_str("Coverage Threshold Report\n");
        out.push_str("=========================\n\n");

        out.push_str(&format!(
            "Overall (threshold {:.0}%) — score {:.2}\n",
            OVERALL_THRESHOLD, validation.overall_score
        ));
        metrics_section(&mut out, &layers.overall);

        for result in &validation.layer_results {
            out.push_str(&format!(
                "\n{} (threshold {:.0}%) — score {:.2}\n",
                result.layer,
                result.layer.threshold(),
                result.score,
            ));
            metrics_section(&mut out, layers.layer(result.layer));
        }

        out.push_str(&format!("\nViolations ({})\n", validation.violations.len()));
        for v in &validation.violations {
            out.push_str(&format!(
                "  [{}] {} {}: {:.2}% < {:.2}%\n",
                v.severity, v.layer, v.metric, v.actual, v.required,
            ));
        }

        if !validation.recommendations.is_empty() {
            out.push_str("\nRecommendations\n");
            for r in &validation.recommendations {
                out.push_str(&format!("  - {r}\n"));
            }
        }

        out
    }
}
