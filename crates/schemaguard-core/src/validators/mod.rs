//! Rule validators and the shared issue collector.

pub mod fixes;
pub mod patterns;
pub mod quality;

pub use fixes::{FixApplier, FixReport, FixStatus};
pub use patterns::PatternValidator;
pub use quality::QualityValidator;

use std::path::Path;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use crate::error::GuardError;
use crate::rules::{
    Fix, FixAction, Issue, IssueCategory, Requirement, Severity, ValidationResult,
    ValidationTarget,
};

/// Trait implemented by every rule validator.
pub trait Validator: Send + Sync {
    /// Stable identifier for this validator.
    fn id(&self) -> &'static str;

    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Run the fixed rule list against the target and return a snapshot.
    ///
    /// Never returns an error and never panics on rule failures: evaluation
    /// errors become a synthetic `validation-error` issue and the remaining
    /// files are still checked.
    fn validate(&self, target: &ValidationTarget) -> ValidationResult;

    /// The static rule catalog this validator enforces. Stable and
    /// non-shrinking across releases.
    fn requirements(&self) -> Vec<Requirement>;
}

/// Per-run issue/fix accumulator.
///
/// Created fresh at the top of every `validate()` call and consumed by
/// `into_result`, so validator instances stay stateless and are safe to
/// share across concurrent validations.
#[derive(Debug)]
pub struct IssueCollector {
    issues: Vec<Issue>,
    fixes: Vec<Fix>,
    started: Instant,
}

impl IssueCollector {
    pub fn new() -> Self {
        Self {
            issues: Vec::new(),
            fixes: Vec::new(),
            started: Instant::now(),
        }
    }

    /// Append an issue and return its derived id ("{rule}-{file name}").
    pub fn add_issue(
        &mut self,
        rule: &str,
        location: &str,
        message: impl Into<String>,
        severity: Severity,
        category: IssueCategory,
        auto_fixable: bool,
    ) -> String {
        let id = format!("{rule}-{}", file_name(location));
        self.issues.push(Issue {
            id: id.clone(),
            message: message.into(),
            severity,
            category,
            rule: rule.to_string(),
            location: location.to_string(),
            auto_fixable,
        });
        id
    }

    pub fn add_fix(
        &mut self,
        issue_id: impl Into<String>,
        description: impl Into<String>,
        action: FixAction,
        parameters: serde_json::Value,
    ) {
        self.fixes.push(Fix {
            issue_id: issue_id.into(),
            description: description.into(),
            action,
            parameters,
        });
    }

    pub fn issue_count(&self) -> usize {
        self.issues.len()
    }

    /// Snapshot the accumulated issues and fixes into a result.
    /// `is_valid` holds iff no accumulated issue has Error severity.
    pub fn into_result(self, metadata: serde_json::Value) -> ValidationResult {
        let is_valid = self.issues.iter().all(|i| i.severity != Severity::Error);
        ValidationResult {
            is_valid,
            issues: self.issues,
            fixes: self.fixes,
            metadata,
            timestamp_ms: epoch_millis(),
            duration_ms: self.started.elapsed().as_millis() as u64,
        }
    }
}

impl Default for IssueCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Basename of a path, falling back to the path itself.
pub(crate) fn file_name(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
}

pub(crate) fn file_exists(path: &str) -> bool {
    Path::new(path).is_file()
}

pub(crate) fn read_file(path: &str) -> Result<String, GuardError> {
    std::fs::read_to_string(path).map_err(|e| GuardError::io(path, e))
}

pub(crate) fn write_file(path: &str, contents: &str) -> Result<(), GuardError> {
    std::fs::write(path, contents).map_err(|e| GuardError::io(path, e))
}

pub(crate) fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
