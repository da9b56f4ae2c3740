//! Pattern validator — naming conventions and structural completeness
//! for migration and seed files.
//!
//! Detection is heuristic text matching, not parsing. The false-positive
//! and false-negative surface of these patterns is part of the contract.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use std::path::Path;
use tracing::{debug, warn};

use super::{epoch_millis, file_exists, file_name, read_file, IssueCollector, Validator};
use crate::error::GuardError;
use crate::rules::{
    FixAction, IssueCategory, Requirement, Severity, ValidationResult, ValidationTarget,
};

/// `<13-digit-millisecond-epoch>-<PascalCaseIdentifier>.ts`
static MIGRATION_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{13}-[A-Z][A-Za-z0-9]*\.ts$").unwrap());

/// `<13-digit-epoch>-seed-<kebab>-<kebab>.ts`
static SEED_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{13}-seed-[a-z0-9]+(?:-[a-z0-9]+)+\.ts$").unwrap());

static UP_METHOD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:public\s+)?async\s+up\s*\(").unwrap());

static DOWN_METHOD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:public\s+)?async\s+down\s*\(").unwrap());

/// Deny-list of hardcoded-value patterns. None of these are safely
/// rewritable without knowledge the engine does not have.
static HARDCODED_VALUE_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    vec![
        (
            "CREATE DATABASE statement",
            Regex::new(r"(?i)CREATE\s+DATABASE\s+[A-Za-z_]\w*").unwrap(),
        ),
        (
            "loopback host literal",
            Regex::new(r"localhost|127\.0\.0\.1").unwrap(),
        ),
        (
            "schema identifier literal",
            Regex::new(r#"(?i)schema\s*[:=]\s*['"`][A-Za-z_]\w*['"`]"#).unwrap(),
        ),
        (
            "database identifier literal",
            Regex::new(r#"(?i)database\s*[:=]\s*['"`][A-Za-z_]\w*['"`]"#).unwrap(),
        ),
    ]
});

static CONNECTION_KEYWORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:host|port|connection|username|password)\b").unwrap());

static ENV_USAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"process\.env\.|\$\{[A-Za-z_][A-Za-z0-9_]*\}").unwrap());

static TRY_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\btry\b").unwrap());
static CATCH_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bcatch\b").unwrap());

/// Existence-check calls and SQL idempotency clauses. The quality
/// validator reuses this marker with stricter severity rules.
pub(crate) static IDEMPOTENCY_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:findOne|findOneBy)\s*\(|\.exists?\s*\(|\.count\s*\(|(?i:IF\s+NOT\s+EXISTS|ON\s+CONFLICT|UPSERT)",
    )
    .unwrap()
});

static LOGGING_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"console\.log|logger\.").unwrap());

static LEADING_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)").unwrap());

/// Validates naming conventions and structural completeness of migration
/// and seed files.
pub struct PatternValidator;

impl PatternValidator {
    pub fn new() -> Self {
        Self
    }

    fn check_migration(&self, c: &mut IssueCollector, path: &str) -> Result<(), GuardError> {
        let name = file_name(path);

        if !MIGRATION_NAME.is_match(name) {
            let renamed = derive_migration_rename(name);
            let issue_id = c.add_issue(
                "migration-naming",
                path,
                format!(
                    "Migration file '{name}' does not match '<timestamp>-<PascalCaseName>.ts'"
                ),
                Severity::Error,
                IssueCategory::Structural,
                true,
            );
            c.add_fix(
                issue_id,
                format!("Rename '{name}' to '{renamed}'"),
                FixAction::RenameMigrationFile,
                json!({ "from": path, "to": sibling_path(path, &renamed) }),
            );
        }

        if !file_exists(path) {
            c.add_issue(
                "migration-file-missing",
                path,
                format!("Migration file '{name}' does not exist"),
                Severity::Error,
                IssueCategory::Structural,
                false,
            );
            return Ok(());
        }

        let content = read_file(path)?;

        if !UP_METHOD.is_match(&content) {
            c.add_issue(
                "migration-up-method",
                path,
                format!("Migration '{name}' has no up() method"),
                Severity::Error,
                IssueCategory::Structural,
                true,
            );
        }
        if !DOWN_METHOD.is_match(&content) {
            c.add_issue(
                "migration-down-method",
                path,
                format!("Migration '{name}' has no down() method"),
                Severity::Error,
                IssueCategory::Structural,
                true,
            );
        }

        self.check_hardcoded_values(c, path, &content, "migration-hardcoded-values");

        if CONNECTION_KEYWORDS.is_match(&content) && !ENV_USAGE.is_match(&content) {
            c.add_issue(
                "migration-env-config",
                path,
                format!(
                    "Migration '{name}' references connection settings without environment variables"
                ),
                Severity::Warning,
                IssueCategory::Content,
                false,
            );
        }

        Ok(())
    }

    fn check_seed(&self, c: &mut IssueCollector, path: &str) -> Result<(), GuardError> {
        let name = file_name(path);

        if !SEED_NAME.is_match(name) {
            let renamed = derive_seed_rename(name);
            let issue_id = c.add_issue(
                "seed-naming",
                path,
                format!("Seed file '{name}' does not match '<timestamp>-seed-<context>-<name>.ts'"),
                Severity::Error,
                IssueCategory::Structural,
                true,
            );
            c.add_fix(
                issue_id,
                format!("Rename '{name}' to '{renamed}'"),
                FixAction::RenameSeedFile,
                json!({ "from": path, "to": sibling_path(path, &renamed) }),
            );
        }

        if !file_exists(path) {
            c.add_issue(
                "seed-file-missing",
                path,
                format!("Seed file '{name}' does not exist"),
                Severity::Error,
                IssueCategory::Structural,
                false,
            );
            return Ok(());
        }

        let content = read_file(path)?;

        self.check_hardcoded_values(c, path, &content, "seed-hardcoded-values");

        if !(TRY_TOKEN.is_match(&content) && CATCH_TOKEN.is_match(&content)) {
            c.add_issue(
                "seed-error-handling",
                path,
                format!("Seed '{name}' has no try/catch block"),
                Severity::Warning,
                IssueCategory::Content,
                true,
            );
        }

        if !IDEMPOTENCY_MARKER.is_match(&content) {
            c.add_issue(
                "seed-idempotency",
                path,
                format!(
                    "Seed '{name}' has no idempotency guard (existence check, IF NOT EXISTS, ON CONFLICT, or UPSERT)"
                ),
                Severity::Warning,
                IssueCategory::Content,
                true,
            );
        }

        if !LOGGING_TOKEN.is_match(&content) {
            c.add_issue(
                "seed-logging",
                path,
                format!("Seed '{name}' produces no log output"),
                Severity::Info,
                IssueCategory::Content,
                true,
            );
        }

        Ok(())
    }

    fn check_hardcoded_values(
        &self,
        c: &mut IssueCollector,
        path: &str,
        content: &str,
        rule: &str,
    ) {
        let matched: Vec<&str> = HARDCODED_VALUE_PATTERNS
            .iter()
            .filter(|(_, re)| re.is_match(content))
            .map(|(label, _)| *label)
            .collect();
        if !matched.is_empty() {
            c.add_issue(
                rule,
                path,
                format!(
                    "'{}' contains hardcoded values: {}",
                    file_name(path),
                    matched.join(", ")
                ),
                Severity::Error,
                IssueCategory::Content,
                false,
            );
        }
    }
}

impl Default for PatternValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator for PatternValidator {
    fn id(&self) -> &'static str {
        "database-patterns"
    }

    fn name(&self) -> &'static str {
        "Database Patterns"
    }

    fn description(&self) -> &'static str {
        "Naming conventions and structural completeness of migrations and seeds"
    }

    fn validate(&self, target: &ValidationTarget) -> ValidationResult {
        let mut c = IssueCollector::new();
        debug!(module = %target.module_path, "running pattern validation");

        for path in &target.migration_paths {
            if let Err(e) = self.check_migration(&mut c, path) {
                warn!(path = %path, error = %e, "migration check failed");
                c.add_issue(
                    "validation-error",
                    path,
                    format!("Migration check failed: {e}"),
                    Severity::Error,
                    IssueCategory::Structural,
                    false,
                );
            }
        }
        for path in &target.seed_paths {
            if let Err(e) = self.check_seed(&mut c, path) {
                warn!(path = %path, error = %e, "seed check failed");
                c.add_issue(
                    "validation-error",
                    path,
                    format!("Seed check failed: {e}"),
                    Severity::Error,
                    IssueCategory::Structural,
                    false,
                );
            }
        }

        c.into_result(json!({
            "validator": self.id(),
            "module": target.module_path,
            "migrations_checked": target.migration_paths.len(),
            "seeds_checked": target.seed_paths.len(),
        }))
    }

    fn requirements(&self) -> Vec<Requirement> {
        vec![
            Requirement {
                id: "migration-naming",
                name: "Migration naming convention",
                description: "Migration files are named <timestamp>-<PascalCaseName>.ts",
                category: IssueCategory::Structural,
                severity: Severity::Error,
                auto_fixable: true,
            },
            Requirement {
                id: "migration-up-method",
                name: "Migration up() method",
                description: "Every migration declares an async up() method",
                category: IssueCategory::Structural,
                severity: Severity::Error,
                auto_fixable: true,
            },
            Requirement {
                id: "migration-down-method",
                name: "Migration down() method",
                description: "Every migration declares an async down() method",
                category: IssueCategory::Structural,
                severity: Severity::Error,
                auto_fixable: true,
            },
            Requirement {
                id: "migration-hardcoded-values",
                name: "No hardcoded values in migrations",
                description: "Migrations carry no hardcoded schema, database, or host literals",
                category: IssueCategory::Content,
                severity: Severity::Error,
                auto_fixable: false,
            },
            Requirement {
                id: "migration-env-config",
                name: "Environment-based configuration",
                description: "Connection settings come from environment variables",
                category: IssueCategory::Content,
                severity: Severity::Warning,
                auto_fixable: false,
            },
            Requirement {
                id: "seed-naming",
                name: "Seed naming convention",
                description: "Seed files are named <timestamp>-seed-<context>-<name>.ts",
                category: IssueCategory::Structural,
                severity: Severity::Error,
                auto_fixable: true,
            },
            Requirement {
                id: "seed-hardcoded-values",
                name: "No hardcoded values in seeds",
                description: "Seeds carry no hardcoded schema, database, or host literals",
                category: IssueCategory::Content,
                severity: Severity::Error,
                auto_fixable: false,
            },
            Requirement {
                id: "seed-error-handling",
                name: "Seed error handling",
                description: "Seeds wrap their work in try/catch",
                category: IssueCategory::Content,
                severity: Severity::Warning,
                auto_fixable: true,
            },
            Requirement {
                id: "seed-idempotency",
                name: "Seed idempotency",
                description: "Seeds guard inserts with an existence check or idempotent SQL",
                category: IssueCategory::Content,
                severity: Severity::Warning,
                auto_fixable: true,
            },
            Requirement {
                id: "seed-logging",
                name: "Seed logging",
                description: "Seeds report what they inserted",
                category: IssueCategory::Content,
                severity: Severity::Info,
                auto_fixable: true,
            },
        ]
    }
}

/// Sibling path with a different file name.
fn sibling_path(path: &str, new_name: &str) -> String {
    Path::new(path)
        .with_file_name(new_name)
        .to_string_lossy()
        .into_owned()
}

/// Reuse a leading digit run when present (normalized to 13 digits),
/// else stamp the current time.
fn derive_timestamp(stem: &str) -> (String, &str) {
    if let Some(m) = LEADING_DIGITS.captures(stem) {
        let digits = m.get(1).unwrap().as_str();
        let rest = &stem[digits.len()..];
        let mut ts = digits[..digits.len().min(13)].to_string();
        while ts.len() < 13 {
            ts.push('0');
        }
        (ts, rest.trim_start_matches(['-', '_']))
    } else {
        (format!("{:013}", epoch_millis()), stem)
    }
}

fn derive_migration_rename(basename: &str) -> String {
    let stem = basename.strip_suffix(".ts").unwrap_or(basename);
    let (ts, rest) = derive_timestamp(stem);
    let ident = pascal_case(rest);
    let ident = if ident.is_empty() {
        "Migration".to_string()
    } else {
        ident
    };
    format!("{ts}-{ident}.ts")
}

fn derive_seed_rename(basename: &str) -> String {
    let stem = basename.strip_suffix(".ts").unwrap_or(basename);
    let (ts, rest) = derive_timestamp(stem);
    let rest = rest
        .strip_prefix("seed")
        .map(|r| r.trim_start_matches(['-', '_']))
        .unwrap_or(rest);
    let kebab = kebab_case(rest);
    let kebab = if kebab.is_empty() {
        "module-data".to_string()
    } else {
        kebab
    };
    format!("{ts}-seed-{kebab}.ts")
}

/// Best-effort PascalCase: word-splits on separators and uppercases each
/// first letter. Does not split camelCase runs.
fn pascal_case(s: &str) -> String {
    s.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// Best-effort kebab-case: lowers everything, breaking on separators and
/// uppercase boundaries.
fn kebab_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    let mut boundary = true;
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            if c.is_ascii_uppercase() && !boundary && !out.is_empty() {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
            boundary = false;
        } else if !boundary {
            out.push('-');
            boundary = true;
        }
    }
    out.trim_end_matches('-').to_string()
}
