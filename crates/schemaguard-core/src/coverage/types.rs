//! Core types for coverage threshold analysis.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Required overall coverage across all layers.
pub const OVERALL_THRESHOLD: f64 = 90.0;

/// Architectural layers, each with its own fixed coverage threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Domain,
    Application,
    Infrastructure,
    Presentation,
}

impl Layer {
    pub fn all() -> &'static [Layer] {
        &[
            Self::Domain,
            Self::Application,
            Self::Infrastructure,
            Self::Presentation,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::Application => "application",
            Self::Infrastructure => "infrastructure",
            Self::Presentation => "presentation",
        }
    }

    /// Fixed threshold table; identical across the four metrics per layer.
    pub fn threshold(&self) -> f64 {
        match self {
            Self::Domain => 95.0,
            Self::Application => 90.0,
            Self::Infrastructure => 85.0,
            Self::Presentation => 85.0,
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four coverage metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Lines,
    Functions,
    Branches,
    Statements,
}

impl Metric {
    pub fn all() -> &'static [Metric] {
        &[Self::Lines, Self::Functions, Self::Branches, Self::Statements]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lines => "lines",
            Self::Functions => "functions",
            Self::Branches => "branches",
            Self::Statements => "statements",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw covered/total counts for one metric.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CoverageCounts {
    pub total: u64,
    pub covered: u64,
}

impl CoverageCounts {
    /// Percentage in [0,100]. An empty denominator degrades to zero
    /// rather than erroring, so absent data reads as uncovered.
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.covered as f64 / self.total as f64 * 100.0).clamp(0.0, 100.0)
        }
    }

    pub fn add(&mut self, other: CoverageCounts) {
        self.total += other.total;
        self.covered += other.covered;
    }
}

/// Per-file coverage record, tagged with its layer. Produced by an
/// external test runner or coverage exchange file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileCoverage {
    pub path: String,
    pub layer: Layer,
    pub lines: CoverageCounts,
    pub functions: CoverageCounts,
    pub branches: CoverageCounts,
    pub statements: CoverageCounts,
    /// 1-indexed uncovered line numbers, when the producer reports them.
    #[serde(default)]
    pub uncovered_lines: Vec<u32>,
}

impl FileCoverage {
    pub fn metric(&self, metric: Metric) -> CoverageCounts {
        match metric {
            Metric::Lines => self.lines,
            Metric::Functions => self.functions,
            Metric::Branches => self.branches,
            Metric::Statements => self.statements,
        }
    }

    /// Mean of the four metric percentages.
    pub fn aggregate_percentage(&self) -> f64 {
        Metric::all()
            .iter()
            .map(|m| self.metric(*m).percentage())
            .sum::<f64>()
            / Metric::all().len() as f64
    }

    pub fn uncovered_line_count(&self) -> u64 {
        if self.uncovered_lines.is_empty() {
            self.lines.total.saturating_sub(self.lines.covered)
        } else {
            self.uncovered_lines.len() as u64
        }
    }
}

/// The raw coverage dataset for one module.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoverageDataset {
    pub files: Vec<FileCoverage>,
}

/// One metric measured against its threshold.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CoveragePercentage {
    pub total: u64,
    pub covered: u64,
    pub percentage: f64,
    pub threshold: f64,
    pub meets_threshold: bool,
}

impl CoveragePercentage {
    pub fn from_counts(counts: CoverageCounts, threshold: f64) -> Self {
        let percentage = counts.percentage();
        Self {
            total: counts.total,
            covered: counts.covered,
            percentage,
            threshold,
            meets_threshold: percentage >= threshold,
        }
    }
}

/// The four metrics of one layer (or of the synthetic overall layer).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CoverageMetrics {
    pub lines: CoveragePercentage,
    pub functions: CoveragePercentage,
    pub branches: CoveragePercentage,
    pub statements: CoveragePercentage,
}

impl CoverageMetrics {
    pub fn metric(&self, metric: Metric) -> CoveragePercentage {
        match metric {
            Metric::Lines => self.lines,
            Metric::Functions => self.functions,
            Metric::Branches => self.branches,
            Metric::Statements => self.statements,
        }
    }

    /// Mean of the four metric percentages.
    pub fn score(&self) -> f64 {
        Metric::all()
            .iter()
            .map(|m| self.metric(*m).percentage)
            .sum::<f64>()
            / Metric::all().len() as f64
    }
}

/// Aggregated coverage for the four layers plus the derived overall.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerCoverage {
    pub domain: CoverageMetrics,
    pub application: CoverageMetrics,
    pub infrastructure: CoverageMetrics,
    pub presentation: CoverageMetrics,
    pub overall: CoverageMetrics,
}

impl LayerCoverage {
    pub fn layer(&self, layer: Layer) -> &CoverageMetrics {
        match layer {
            Layer::Domain => &self.domain,
            Layer::Application => &self.application,
            Layer::Infrastructure => &self.infrastructure,
            Layer::Presentation => &self.presentation,
        }
    }
}

/// Shortfall of one metric within a layer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MetricGap {
    pub metric: Metric,
    pub actual: f64,
    pub required: f64,
    /// `max(0, required - actual)`; never negative.
    pub gap: f64,
}

/// Per-layer threshold verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerResult {
    pub layer: Layer,
    pub meets_threshold: bool,
    /// Failing metrics only; empty when the layer passes.
    pub gaps: Vec<MetricGap>,
    /// Mean of the layer's four metric percentages.
    pub score: f64,
}

/// Severity tiers for threshold violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViolationSeverity {
    /// More than 20 points below the threshold.
    Critical,
    Major,
}

impl ViolationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Major => "major",
        }
    }
}

impl fmt::Display for ViolationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failing (layer, metric) pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Violation {
    pub layer: Layer,
    pub metric: Metric,
    pub severity: ViolationSeverity,
    pub actual: f64,
    pub required: f64,
}

/// Verdict of `validate_thresholds`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdValidation {
    /// True iff no (layer, metric) pair is below its threshold.
    pub is_valid: bool,
    pub violations: Vec<Violation>,
    pub layer_results: Vec<LayerResult>,
    /// Mean of the four layer scores; the synthetic overall layer is
    /// excluded to avoid double counting.
    pub overall_score: f64,
    pub recommendations: Vec<String>,
}

/// Remediation priority for uncovered code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The cheapest test level that can exercise a path in each layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestedTestType {
    Unit,
    Integration,
    E2e,
}

impl SuggestedTestType {
    pub fn for_layer(layer: Layer) -> Self {
        match layer {
            Layer::Domain | Layer::Application => Self::Unit,
            Layer::Infrastructure => Self::Integration,
            Layer::Presentation => Self::E2e,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unit => "unit",
            Self::Integration => "integration",
            Self::E2e => "e2e",
        }
    }
}

/// One proposed test for an uncovered file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestedTest {
    pub test_type: SuggestedTestType,
    pub description: String,
}

/// One file with uncovered lines, prioritized for remediation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UncoveredCode {
    pub file_path: String,
    pub layer: Layer,
    pub uncovered_lines: Vec<u32>,
    pub suggested_tests: Vec<SuggestedTest>,
    pub priority: Priority,
    /// Mean of the file's four metric percentages; used for tie-breaks.
    pub aggregate_coverage: f64,
}
