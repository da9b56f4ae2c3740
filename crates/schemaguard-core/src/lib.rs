//! schemaguard-core: rule-based quality-gate engine for database modules.
//!
//! The engine inspects a module's migration, seed, and entity files plus a
//! test-coverage dataset, and reports deviations from a fixed rule catalog:
//! - Rules: issue/fix data model shared by every validator
//! - Validators: naming/structural patterns, relational and entity quality,
//!   and the closed fix-dispatch that remediates auto-fixable issues
//! - Coverage: per-layer threshold validation, gap/score computation,
//!   uncovered-code prioritization, text report synthesis
//! - Gates: AND-combined pass/fail orchestration across validators
//!
//! Detection is heuristic text matching over file contents — never AST
//! parsing. File discovery, report rendering, and CI wiring live outside
//! this crate; callers hand in categorized path lists and datasets.

pub mod coverage;
pub mod error;
pub mod gates;
pub mod rules;
pub mod validators;

// Re-exports for convenience
pub use coverage::{
    CoverageAnalyzer, CoverageCounts, CoverageDataset, CoverageMetrics, CoveragePercentage,
    FileCoverage, Layer, LayerCoverage, LayerResult, Metric, MetricGap, Priority, SuggestedTest,
    SuggestedTestType, ThresholdValidation, UncoveredCode, Violation, ViolationSeverity,
};
pub use error::GuardError;
pub use gates::{
    CoverageGate, GateEvidence, GateId, GateOrchestrator, GateOutcome, ModuleGate,
    ModuleGateReport, PatternGate, QualityGate,
};
pub use rules::{
    Fix, FixAction, Issue, IssueCategory, Requirement, Severity, ValidationResult,
    ValidationTarget,
};
pub use validators::{
    FixApplier, FixReport, FixStatus, IssueCollector, PatternValidator, QualityValidator,
    Validator,
};
