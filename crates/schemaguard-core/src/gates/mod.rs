//! Quality gates — pass/fail combination of validators for one module.

pub mod orchestrator;
pub mod types;

pub use orchestrator::{CoverageGate, GateOrchestrator, PatternGate, QualityGate};
pub use types::*;
