//! Core types for gate orchestration.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::coverage::ThresholdValidation;
use crate::rules::{ValidationResult, ValidationTarget};

/// Gate identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GateId {
    DatabasePatterns,
    DatabaseQuality,
    Coverage,
}

impl GateId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DatabasePatterns => "database-patterns",
            Self::DatabaseQuality => "database-quality",
            Self::Coverage => "coverage",
        }
    }

    pub fn all() -> &'static [GateId] {
        &[Self::DatabasePatterns, Self::DatabaseQuality, Self::Coverage]
    }
}

impl fmt::Display for GateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The full result backing a gate's verdict. Pass/fail is AND-combined
/// across gates; the coverage analyzer's scalar score stays available
/// here and is never collapsed into the boolean.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum GateEvidence {
    Validation(ValidationResult),
    Coverage(ThresholdValidation),
}

/// Result produced by one gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateOutcome {
    pub gate_id: GateId,
    pub passed: bool,
    pub summary: String,
    pub duration_ms: u64,
    pub evidence: GateEvidence,
}

/// AND-combined verdict for one module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleGateReport {
    pub module: String,
    /// True iff every enabled gate passed.
    pub passed: bool,
    pub gates: Vec<GateOutcome>,
}

impl ModuleGateReport {
    pub fn gate(&self, id: GateId) -> Option<&GateOutcome> {
        self.gates.iter().find(|g| g.gate_id == id)
    }
}

/// Trait for gate implementations.
pub trait ModuleGate: Send + Sync {
    fn id(&self) -> GateId;
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn run(&self, target: &ValidationTarget) -> GateOutcome;
}
