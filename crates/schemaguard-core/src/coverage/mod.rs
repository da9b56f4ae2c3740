//! Coverage threshold analysis — per-layer aggregation, gap/score
//! computation, violation classification, and uncovered-code priority.

pub mod analyzer;
pub mod report;
pub mod types;

pub use analyzer::CoverageAnalyzer;
pub use types::*;
