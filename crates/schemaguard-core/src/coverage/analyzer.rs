//! Coverage aggregation and threshold validation.

use rustc_hash::FxHashMap;
use tracing::debug;

use super::types::*;

/// Aggregates per-file coverage into layers and validates the fixed
/// threshold table.
///
/// Stateless; an empty dataset degrades to an all-zero report.
pub struct CoverageAnalyzer;

impl CoverageAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Sum per-file counts into per-layer metrics plus the derived overall.
    pub fn aggregate(&self, dataset: &CoverageDataset) -> LayerCoverage {
        let mut per_layer: FxHashMap<Layer, [CoverageCounts; 4]> = FxHashMap::default();
        for layer in Layer::all() {
            per_layer.insert(*layer, [CoverageCounts::default(); 4]);
        }
        let mut overall = [CoverageCounts::default(); 4];

        for file in &dataset.files {
            let slots = per_layer.get_mut(&file.layer).expect("all layers seeded");
            for (i, metric) in Metric::all().iter().enumerate() {
                slots[i].add(file.metric(*metric));
                overall[i].add(file.metric(*metric));
            }
        }

        let build = |counts: &[CoverageCounts; 4], threshold: f64| CoverageMetrics {
            lines: CoveragePercentage::from_counts(counts[0], threshold),
            functions: CoveragePercentage::from_counts(counts[1], threshold),
            branches: CoveragePercentage::from_counts(counts[2], threshold),
            statements: CoveragePercentage::from_counts(counts[3], threshold),
        };

        LayerCoverage {
            domain: build(&per_layer[&Layer::Domain], Layer::Domain.threshold()),
            application: build(
                &per_layer[&Layer::Application],
                Layer::Application.threshold(),
            ),
            infrastructure: build(
                &per_layer[&Layer::Infrastructure],
                Layer::Infrastructure.threshold(),
            ),
            presentation: build(
                &per_layer[&Layer::Presentation],
                Layer::Presentation.threshold(),
            ),
            overall: build(&overall, OVERALL_THRESHOLD),
        }
    }

    /// Validate every (layer, metric) pair against the threshold table.
    pub fn validate_thresholds(&self, dataset: &CoverageDataset) -> ThresholdValidation {
        let layers = self.aggregate(dataset);
        let mut layer_results = Vec::with_capacity(Layer::all().len());
        let mut violations = Vec::new();

        for layer in Layer::all() {
            let metrics = layers.layer(*layer);
            let required = layer.threshold();
            let mut gaps = Vec::new();

            for metric in Metric::all() {
                let actual = metrics.metric(*metric).percentage;
                let gap = (required - actual).max(0.0);
                if gap > 0.0 {
                    gaps.push(MetricGap {
                        metric: *metric,
                        actual,
                        required,
                        gap,
                    });
                    let severity = if actual < required - 20.0 {
                        ViolationSeverity::Critical
                    } else {
                        ViolationSeverity::Major
                    };
                    violations.push(Violation {
                        layer: *layer,
                        metric: *metric,
                        severity,
                        actual,
                        required,
                    });
                }
            }

            layer_results.push(LayerResult {
                layer: *layer,
                meets_threshold: gaps.is_empty(),
                gaps,
                score: metrics.score(),
            });
        }

        let overall_score = layer_results.iter().map(|r| r.score).sum::<f64>()
            / layer_results.len() as f64;

        let recommendations = self.recommendations(&layer_results);
        let is_valid = violations.is_empty();
        debug!(
            overall_score,
            violations = violations.len(),
            "validated coverage thresholds"
        );

        ThresholdValidation {
            is_valid,
            violations,
            layer_results,
            overall_score,
            recommendations,
        }
    }

    /// One recommendation per violating layer, naming its worst gap.
    fn recommendations(&self, layer_results: &[LayerResult]) -> Vec<String> {
        layer_results
            .iter()
            .filter(|r| !r.gaps.is_empty())
            .map(|r| {
                let worst = r
                    .gaps
                    .iter()
                    .max_by(|a, b| a.gap.partial_cmp(&b.gap).unwrap_or(std::cmp::Ordering::Equal))
                    .expect("non-empty gaps");
                format!(
                    "Layer '{}': {} coverage is {:.2}% against a {:.0}% threshold (gap {:.2}); add {} tests first",
                    r.layer,
                    worst.metric,
                    worst.actual,
                    worst.required,
                    worst.gap,
                    SuggestedTestType::for_layer(r.layer).as_str(),
                )
            })
            .collect()
    }

    /// List files with uncovered lines, highest remediation value first.
    pub fn identify_uncovered_code(&self, dataset: &CoverageDataset) -> Vec<UncoveredCode> {
        let mut uncovered: Vec<UncoveredCode> = dataset
            .files
            .iter()
            .filter(|f| f.uncovered_line_count() > 0)
            .map(|f| {
                let aggregate = f.aggregate_percentage();
                let threshold = f.layer.threshold();
                let priority = if f.layer == Layer::Domain || aggregate < threshold / 2.0 {
                    Priority::High
                } else if aggregate < threshold {
                    Priority::Medium
                } else {
                    Priority::Low
                };

                let test_type = SuggestedTestType::for_layer(f.layer);
                let mut suggested_tests = vec![SuggestedTest {
                    test_type,
                    description: format!(
                        "Add {} tests covering the uncovered lines of {}",
                        test_type.as_str(),
                        f.path
                    ),
                }];
                if f.branches.percentage() < threshold {
                    suggested_tests.push(SuggestedTest {
                        test_type,
                        description: format!(
                            "Exercise both sides of the untested branch conditions in {}",
                            f.path
                        ),
                    });
                }

                UncoveredCode {
                    file_path: f.path.clone(),
                    layer: f.layer,
                    uncovered_lines: f.uncovered_lines.clone(),
                    suggested_tests,
                    priority,
                    aggregate_coverage: aggregate,
                }
            })
            .collect();

        // Priority descending, ties broken least-covered first.
        uncovered.sort_by(|a, b| {
            a.priority.cmp(&b.priority).then(
                a.aggregate_coverage
                    .partial_cmp(&b.aggregate_coverage)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
        });
        uncovered
    }
}

impl Default for CoverageAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
