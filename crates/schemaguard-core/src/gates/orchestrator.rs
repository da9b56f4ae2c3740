//! Gate orchestrator — runs every enabled gate against one module and
//! AND-combines the verdicts.

use std::time::Instant;

use tracing::{debug, info};

use super::types::*;
use crate::coverage::{CoverageAnalyzer, CoverageDataset};
use crate::rules::ValidationTarget;
use crate::validators::{PatternValidator, QualityValidator, Validator};

/// Gate over the pattern validator.
pub struct PatternGate {
    validator: PatternValidator,
}

impl PatternGate {
    pub fn new() -> Self {
        Self {
            validator: PatternValidator::new(),
        }
    }
}

impl Default for PatternGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleGate for PatternGate {
    fn id(&self) -> GateId {
        GateId::DatabasePatterns
    }

    fn name(&self) -> &'static str {
        "Database Patterns"
    }

    fn description(&self) -> &'static str {
        "Naming conventions and structural completeness of migrations and seeds"
    }

    fn run(&self, target: &ValidationTarget) -> GateOutcome {
        let started = Instant::now();
        let result = self.validator.validate(target);
        GateOutcome {
            gate_id: self.id(),
            passed: result.is_valid,
            summary: format!(
                "{}: {} issues ({} errors, {} warnings)",
                self.name(),
                result.issues.len(),
                result.error_count(),
                result.warning_count(),
            ),
            duration_ms: started.elapsed().as_millis() as u64,
            evidence: GateEvidence::Validation(result),
        }
    }
}

/// Gate over the quality validator.
pub struct QualityGate {
    validator: QualityValidator,
}

impl QualityGate {
    pub fn new() -> Self {
        Self {
            validator: QualityValidator::new(),
        }
    }
}

impl Default for QualityGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleGate for QualityGate {
    fn id(&self) -> GateId {
        GateId::DatabaseQuality
    }

    fn name(&self) -> &'static str {
        "Database Quality"
    }

    fn description(&self) -> &'static str {
        "Relational integrity, strict seed idempotency, and entity shape"
    }

    fn run(&self, target: &ValidationTarget) -> GateOutcome {
        let started = Instant::now();
        let result = self.validator.validate(target);
        GateOutcome {
            gate_id: self.id(),
            passed: result.is_valid,
            summary: format!(
                "{}: {} issues ({} errors, {} warnings)",
                self.name(),
                result.issues.len(),
                result.error_count(),
                result.warning_count(),
            ),
            duration_ms: started.elapsed().as_millis() as u64,
            evidence: GateEvidence::Validation(result),
        }
    }
}

/// Gate over the coverage analyzer. Holds its own dataset: coverage is
/// produced by an external test runner, not discovered from the target's
/// file lists.
pub struct CoverageGate {
    analyzer: CoverageAnalyzer,
    dataset: CoverageDataset,
}

impl CoverageGate {
    pub fn new(dataset: CoverageDataset) -> Self {
        Self {
            analyzer: CoverageAnalyzer::new(),
            dataset,
        }
    }
}

impl ModuleGate for CoverageGate {
    fn id(&self) -> GateId {
        GateId::Coverage
    }

    fn name(&self) -> &'static str {
        "Coverage"
    }

    fn description(&self) -> &'static str {
        "Per-layer coverage thresholds"
    }

    fn run(&self, _target: &ValidationTarget) -> GateOutcome {
        let started = Instant::now();
        let validation = self.analyzer.validate_thresholds(&self.dataset);
        GateOutcome {
            gate_id: self.id(),
            passed: validation.is_valid,
            summary: format!(
                "{}: score {:.2}, {} violations",
                self.name(),
                validation.overall_score,
                validation.violations.len(),
            ),
            duration_ms: started.elapsed().as_millis() as u64,
            evidence: GateEvidence::Coverage(validation),
        }
    }
}

/// Runs the enabled gates and AND-combines their verdicts. The module
/// passes iff every gate passes — never an average.
pub struct GateOrchestrator {
    gates: Vec<Box<dyn ModuleGate>>,
}

impl GateOrchestrator {
    pub fn new() -> Self {
        Self { gates: Vec::new() }
    }

    /// Pattern and quality gates; add a `CoverageGate` when a coverage
    /// dataset is available.
    pub fn with_default_gates() -> Self {
        Self::new()
            .with_gate(Box::new(PatternGate::new()))
            .with_gate(Box::new(QualityGate::new()))
    }

    pub fn with_gate(mut self, gate: Box<dyn ModuleGate>) -> Self {
        self.gates.push(gate);
        self
    }

    pub fn gate_count(&self) -> usize {
        self.gates.len()
    }

    pub fn run(&self, target: &ValidationTarget) -> ModuleGateReport {
        let mut outcomes = Vec::with_capacity(self.gates.len());
        for gate in &self.gates {
            debug!(gate = %gate.id(), module = %target.module_path, "running gate");
            outcomes.push(gate.run(target));
        }

        let passed = outcomes.iter().all(|o| o.passed);
        info!(
            module = %target.module_path,
            passed,
            gates = outcomes.len(),
            "gate run complete"
        );

        ModuleGateReport {
            module: target.module_path.clone(),
            passed,
            gates: outcomes,
        }
    }
}

impl Default for GateOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}
