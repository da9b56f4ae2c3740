//! Core types for validation results.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity levels for issues.
///
/// Only `Error` blocks `is_valid`; `Warning` and `Info` are advisory and
/// still reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Issue taxonomy: which aspect of the module a rule inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueCategory {
    /// Naming, missing file, missing method.
    Structural,
    /// Text pattern present or absent.
    Content,
    /// Missing constraint, index, or soft-delete column.
    Relational,
    /// Missing decorator or timestamp field.
    Quality,
    /// Coverage threshold shortfall.
    Coverage,
}

impl IssueCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Structural => "structural",
            Self::Content => "content",
            Self::Relational => "relational",
            Self::Quality => "quality",
            Self::Coverage => "coverage",
        }
    }
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single rule violation detected in a module file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// Derived identity: "{rule}-{file name}". Re-running validation on
    /// unchanged input reproduces the same ids.
    pub id: String,
    pub message: String,
    pub severity: Severity,
    pub category: IssueCategory,
    pub rule: String,
    /// File path (or module path for module-level issues).
    pub location: String,
    pub auto_fixable: bool,
}

/// The closed set of automated remediations.
///
/// Pattern-validator fixes perform a single filesystem rename; quality-
/// validator fixes read, text-transform, and rewrite one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FixAction {
    RenameMigrationFile,
    RenameSeedFile,
    AddForeignKeyConstraints,
    AddPerformanceIndexes,
    AddSoftDeleteColumn,
    AddSeedIdempotency,
    AddSeedErrorHandling,
    AddEntityDecorators,
    AddEntityTimestamps,
    AddEntitySoftDelete,
}

impl FixAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RenameMigrationFile => "rename-migration-file",
            Self::RenameSeedFile => "rename-seed-file",
            Self::AddForeignKeyConstraints => "add-foreign-key-constraints",
            Self::AddPerformanceIndexes => "add-performance-indexes",
            Self::AddSoftDeleteColumn => "add-soft-delete-column",
            Self::AddSeedIdempotency => "add-seed-idempotency",
            Self::AddSeedErrorHandling => "add-seed-error-handling",
            Self::AddEntityDecorators => "add-entity-decorators",
            Self::AddEntityTimestamps => "add-entity-timestamps",
            Self::AddEntitySoftDelete => "add-entity-soft-delete",
        }
    }
}

impl fmt::Display for FixAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A proposed automated remediation for an auto-fixable issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fix {
    pub issue_id: String,
    pub description: String,
    pub action: FixAction,
    /// Action-specific parameters (paths, table and column names, ...).
    pub parameters: serde_json::Value,
}

/// Snapshot of one validator run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    /// True iff no issue has Error severity.
    pub is_valid: bool,
    pub issues: Vec<Issue>,
    pub fixes: Vec<Fix>,
    pub metadata: serde_json::Value,
    /// Unix epoch milliseconds at result creation.
    pub timestamp_ms: u64,
    pub duration_ms: u64,
}

impl ValidationResult {
    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }
}

/// Static catalog entry describing one rule a validator enforces,
/// independent of any run. External tooling renders these as documentation.
#[derive(Debug, Clone, Serialize)]
pub struct Requirement {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: IssueCategory,
    pub severity: Severity,
    pub auto_fixable: bool,
}

/// Categorized file paths for one module, supplied by an external
/// directory-discovery component. The engine never walks directories.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationTarget {
    pub module_path: String,
    pub migration_paths: Vec<String>,
    pub seed_paths: Vec<String>,
    #[serde(default)]
    pub entity_paths: Vec<String>,
}
