//! Quality validator — relational integrity of migration SQL and the
//! shape of persistence entities.
//!
//! The relational checks operate on `CREATE TABLE (...)` text blocks. A
//! block with any constraint token anywhere in it satisfies the foreign-key
//! check even when the token belongs to an unrelated column; this matches
//! the documented behavior of the rule and is covered by tests.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use tracing::{debug, warn};

use super::patterns::IDEMPOTENCY_MARKER;
use super::{file_exists, file_name, read_file, IssueCollector, Validator};
use crate::error::GuardError;
use crate::rules::{
    FixAction, IssueCategory, Requirement, Severity, ValidationResult, ValidationTarget,
};

pub(crate) static CREATE_TABLE_HEAD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)CREATE\s+TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?["'`]?([A-Za-z_]\w*)["'`]?\s*\("#)
        .unwrap()
});

/// `<name>_id`-shaped column definition (name followed by a type token).
static ID_COLUMN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)["'`]?([a-z][a-z0-9_]*_id)["'`]?\s+[a-z]"#).unwrap());

pub(crate) static FK_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)FOREIGN\s+KEY|REFERENCES").unwrap());

static CONSTRAINT_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)CONSTRAINT\s+["'`]?(\w+)["'`]?\s+FOREIGN\s+KEY"#).unwrap()
});

static INDEX_STMT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)CREATE\s+(?:UNIQUE\s+)?INDEX\s+(?:IF\s+NOT\s+EXISTS\s+)?["'`]?(\w+)"#)
        .unwrap()
});

pub(crate) static SOFT_DELETE_COLUMN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"deleted_at|deletedAt").unwrap());

static MUTATION_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.save\s*\(|\.insert\s*\(|(?i:INSERT\s+INTO)").unwrap());

/// Broader than the pattern validator's try/catch check: promise rejection
/// handlers, rethrows, and error logging all count as handling.
pub(crate) static ERROR_HANDLING_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\btry\b|\bcatch\b|\.catch\s*\(|\bthrow\b|console\.error|logger\.error").unwrap()
});

pub(crate) static ENTITY_DECORATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"@Entity\s*\(").unwrap());

static PRIMARY_KEY_DECORATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@Primary(?:Generated)?Column\s*\(").unwrap());

static COLUMN_ANNOTATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@(?:Column|CreateDateColumn|UpdateDateColumn|DeleteDateColumn|VersionColumn)\s*\(")
        .unwrap()
});

static PROPERTY_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:public\s+|private\s+|protected\s+|readonly\s+)*[A-Za-z_]\w*[?!]?\s*:\s*[A-Za-z_]")
        .unwrap()
});

pub(crate) static CLASS_DECL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:export\s+)?(?:abstract\s+)?class\s+([A-Za-z_]\w*)").unwrap());

pub(crate) static CREATED_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@CreateDateColumn|created_at|createdAt").unwrap());

pub(crate) static UPDATED_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@UpdateDateColumn|updated_at|updatedAt").unwrap());

pub(crate) static ENTITY_SOFT_DELETE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@DeleteDateColumn|deleted_at|deletedAt").unwrap());

/// Columns that production queries filter on; `id` is excluded because
/// the primary key is always indexed.
const COMMON_QUERY_COLUMNS: &[&str] = &[
    "email",
    "user_id",
    "organization_id",
    "tenant_id",
    "status",
    "type",
    "slug",
    "created_at",
];

/// Tables holding user-facing records that must support soft deletion.
const USER_RELATED_TABLES: &[&str] = &[
    "users",
    "user_profiles",
    "accounts",
    "customers",
    "members",
    "employees",
];

const USER_RELATED_ENTITIES: &[&str] = &[
    "User",
    "UserProfile",
    "Account",
    "Customer",
    "Member",
    "Employee",
];

/// One `CREATE TABLE (...)` text block found in a source file.
pub(crate) struct TableBlock {
    pub name: String,
    pub body: String,
    /// Byte offset in the source of the block's closing parenthesis.
    pub close_offset: usize,
}

/// Extract `CREATE TABLE` blocks by balanced-paren scanning from each
/// header match. Unbalanced blocks are dropped.
pub(crate) fn extract_create_table_blocks(content: &str) -> Vec<TableBlock> {
    let mut blocks = Vec::new();
    for cap in CREATE_TABLE_HEAD.captures_iter(content) {
        let name = cap[1].to_string();
        let open = cap.get(0).unwrap().end();
        let mut depth = 1usize;
        let mut close = None;
        for (i, ch) in content[open..].char_indices() {
            match ch {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        close = Some(open + i);
                        break;
                    }
                }
                _ => {}
            }
        }
        if let Some(close_offset) = close {
            blocks.push(TableBlock {
                name,
                body: content[open..close_offset].to_string(),
                close_offset,
            });
        }
    }
    blocks
}

/// Naive pluralization used to guess the table a `<prefix>_id` column
/// references: organization_id → organizations.
pub(crate) fn pluralize(word: &str) -> String {
    if word.ends_with('y') && word.len() > 1 {
        format!("{}ies", &word[..word.len() - 1])
    } else if word.ends_with('s') {
        format!("{word}es")
    } else {
        format!("{word}s")
    }
}

fn has_typed_column(body: &str, column: &str) -> bool {
    body.lines().any(|line| {
        let t = line
            .trim_start()
            .trim_start_matches(',')
            .trim_start()
            .trim_start_matches(['"', '\'', '`']);
        match t.strip_prefix(column) {
            Some(rest) => {
                let rest = rest.trim_start_matches(['"', '\'', '`']);
                rest.starts_with(char::is_whitespace)
            }
            None => false,
        }
    })
}

pub(crate) fn index_mentions_column(content: &str, column: &str) -> bool {
    let needle = column.to_lowercase();
    content.lines().any(|line| {
        let lower = line.to_lowercase();
        lower.contains("index") && lower.contains(&needle)
    })
}

/// Validates foreign keys, indexes, soft-delete conventions, strict seed
/// idempotency, and entity decorator shape.
pub struct QualityValidator;

impl QualityValidator {
    pub fn new() -> Self {
        Self
    }

    fn check_migration(&self, c: &mut IssueCollector, path: &str) -> Result<(), GuardError> {
        if !file_exists(path) {
            c.add_issue(
                "migration-file-missing",
                path,
                format!("Migration file '{}' does not exist", file_name(path)),
                Severity::Error,
                IssueCategory::Structural,
                false,
            );
            return Ok(());
        }
        let content = read_file(path)?;
        let name = file_name(path);

        for block in extract_create_table_blocks(&content) {
            self.check_foreign_keys(c, path, name, &block);
            self.check_indexes(c, path, name, &content, &block);
            self.check_table_soft_delete(c, path, name, &block);
        }

        for cap in INDEX_STMT.captures_iter(&content) {
            let index_name = &cap[1];
            if !index_name.starts_with("IDX_") {
                c.add_issue(
                    "migration-index-naming",
                    path,
                    format!("Index '{index_name}' in '{name}' is not prefixed 'IDX_'"),
                    Severity::Warning,
                    IssueCategory::Relational,
                    false,
                );
            }
        }

        Ok(())
    }

    fn check_foreign_keys(
        &self,
        c: &mut IssueCollector,
        path: &str,
        name: &str,
        block: &TableBlock,
    ) {
        let mut id_columns: Vec<String> = Vec::new();
        for cap in ID_COLUMN.captures_iter(&block.body) {
            let col = cap[1].to_lowercase();
            if !id_columns.contains(&col) {
                id_columns.push(col);
            }
        }

        if !id_columns.is_empty() && !FK_TOKEN.is_match(&block.body) {
            let issue_id = c.add_issue(
                "migration-foreign-keys",
                path,
                format!(
                    "Table '{}' in '{name}' declares reference columns ({}) without foreign key constraints",
                    block.name,
                    id_columns.join(", ")
                ),
                Severity::Error,
                IssueCategory::Relational,
                true,
            );
            let references: Vec<String> = id_columns
                .iter()
                .map(|col| pluralize(col.trim_end_matches("_id")))
                .collect();
            c.add_fix(
                issue_id,
                format!(
                    "Add FK constraints on {} for table '{}'",
                    id_columns.join(", "),
                    block.name
                ),
                FixAction::AddForeignKeyConstraints,
                json!({
                    "path": path,
                    "table": block.name,
                    "columns": id_columns,
                    "references": references,
                }),
            );
        }

        for cap in CONSTRAINT_NAME.captures_iter(&block.body) {
            let constraint = &cap[1];
            if !constraint.starts_with("FK_") {
                c.add_issue(
                    "migration-constraint-naming",
                    path,
                    format!("Constraint '{constraint}' in '{name}' is not prefixed 'FK_'"),
                    Severity::Warning,
                    IssueCategory::Relational,
                    false,
                );
            }
        }
    }

    fn check_indexes(
        &self,
        c: &mut IssueCollector,
        path: &str,
        name: &str,
        content: &str,
        block: &TableBlock,
    ) {
        let missing: Vec<&str> = COMMON_QUERY_COLUMNS
            .iter()
            .copied()
            .filter(|col| has_typed_column(&block.body, col) && !index_mentions_column(content, col))
            .collect();

        if !missing.is_empty() {
            let issue_id = c.add_issue(
                "migration-performance-indexes",
                path,
                format!(
                    "Table '{}' in '{name}' has commonly queried columns without indexes: {}",
                    block.name,
                    missing.join(", ")
                ),
                Severity::Warning,
                IssueCategory::Relational,
                true,
            );
            c.add_fix(
                issue_id,
                format!(
                    "Create IDX_{}_<column> indexes for {}",
                    block.name,
                    missing.join(", ")
                ),
                FixAction::AddPerformanceIndexes,
                json!({ "path": path, "table": block.name, "columns": missing }),
            );
        }
    }

    fn check_table_soft_delete(
        &self,
        c: &mut IssueCollector,
        path: &str,
        name: &str,
        block: &TableBlock,
    ) {
        if USER_RELATED_TABLES.contains(&block.name.to_lowercase().as_str())
            && !SOFT_DELETE_COLUMN.is_match(&block.body)
        {
            let issue_id = c.add_issue(
                "migration-soft-delete",
                path,
                format!(
                    "User-related table '{}' in '{name}' has no soft-delete column",
                    block.name
                ),
                Severity::Warning,
                IssueCategory::Relational,
                true,
            );
            c.add_fix(
                issue_id,
                format!("Add nullable deleted_at column to '{}'", block.name),
                FixAction::AddSoftDeleteColumn,
                json!({ "path": path, "table": block.name }),
            );
        }
    }

    fn check_seed(&self, c: &mut IssueCollector, path: &str) -> Result<(), GuardError> {
        if !file_exists(path) {
            c.add_issue(
                "seed-file-missing",
                path,
                format!("Seed file '{}' does not exist", file_name(path)),
                Severity::Error,
                IssueCategory::Structural,
                false,
            );
            return Ok(());
        }
        let content = read_file(path)?;
        let name = file_name(path);

        // 2×2 decision: only (mutation ∧ ¬idempotent) is an error. Seeds
        // with no write operation are exempt entirely.
        if MUTATION_TOKEN.is_match(&content) && !IDEMPOTENCY_MARKER.is_match(&content) {
            let issue_id = c.add_issue(
                "seed-idempotency",
                path,
                format!(
                    "Seed '{name}' writes rows without an existence check, IF NOT EXISTS, ON CONFLICT, or UPSERT"
                ),
                Severity::Error,
                IssueCategory::Content,
                true,
            );
            c.add_fix(
                issue_id,
                "Insert an existence check before the first write",
                FixAction::AddSeedIdempotency,
                json!({ "path": path }),
            );
        }

        if !ERROR_HANDLING_TOKEN.is_match(&content) {
            let issue_id = c.add_issue(
                "seed-error-handling",
                path,
                format!("Seed '{name}' handles no errors (no try/catch, .catch, throw, or error log)"),
                Severity::Warning,
                IssueCategory::Content,
                true,
            );
            c.add_fix(
                issue_id,
                "Wrap the seed body in try/catch",
                FixAction::AddSeedErrorHandling,
                json!({ "path": path }),
            );
        }

        Ok(())
    }

    fn check_entity(&self, c: &mut IssueCollector, path: &str) -> Result<(), GuardError> {
        if !file_exists(path) {
            c.add_issue(
                "entity-file-missing",
                path,
                format!("Entity file '{}' does not exist", file_name(path)),
                Severity::Error,
                IssueCategory::Structural,
                false,
            );
            return Ok(());
        }
        let content = read_file(path)?;
        let name = file_name(path);
        let class_name = CLASS_DECL
            .captures(&content)
            .map(|cap| cap[1].to_string())
            .unwrap_or_default();

        if !ENTITY_DECORATOR.is_match(&content) {
            let issue_id = c.add_issue(
                "entity-decorators",
                path,
                format!("Entity '{name}' has no @Entity() decorator"),
                Severity::Error,
                IssueCategory::Quality,
                true,
            );
            c.add_fix(
                issue_id,
                format!("Add @Entity() above class {class_name}"),
                FixAction::AddEntityDecorators,
                json!({ "path": path, "class": class_name.as_str() }),
            );
        }

        if !PRIMARY_KEY_DECORATOR.is_match(&content) {
            c.add_issue(
                "entity-primary-key",
                path,
                format!("Entity '{name}' has no primary key decorator"),
                Severity::Error,
                IssueCategory::Quality,
                false,
            );
        }

        let properties = content
            .lines()
            .filter(|l| PROPERTY_DECL.is_match(l) && !l.contains('('))
            .count();
        let annotated = COLUMN_ANNOTATION.find_iter(&content).count();
        // One property (the primary key) is allowed to carry a non-column
        // decorator.
        if properties > annotated + 1 {
            c.add_issue(
                "entity-column-annotations",
                path,
                format!(
                    "Entity '{name}' declares {properties} properties but only {annotated} column decorators"
                ),
                Severity::Warning,
                IssueCategory::Quality,
                false,
            );
        }

        if !(CREATED_MARKER.is_match(&content) && UPDATED_MARKER.is_match(&content)) {
            let issue_id = c.add_issue(
                "entity-timestamps",
                path,
                format!("Entity '{name}' has no created/updated timestamp columns"),
                Severity::Warning,
                IssueCategory::Quality,
                true,
            );
            c.add_fix(
                issue_id,
                "Append createdAt/updatedAt date columns",
                FixAction::AddEntityTimestamps,
                json!({ "path": path }),
            );
        }

        if USER_RELATED_ENTITIES.contains(&class_name.as_str())
            && !ENTITY_SOFT_DELETE_MARKER.is_match(&content)
        {
            let issue_id = c.add_issue(
                "entity-soft-delete",
                path,
                format!("User-related entity '{class_name}' has no soft-delete column"),
                Severity::Warning,
                IssueCategory::Quality,
                true,
            );
            c.add_fix(
                issue_id,
                format!("Append a nullable deletedAt column to {class_name}"),
                FixAction::AddEntitySoftDelete,
                json!({ "path": path, "class": class_name }),
            );
        }

        Ok(())
    }
}

impl Default for QualityValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator for QualityValidator {
    fn id(&self) -> &'static str {
        "database-quality"
    }

    fn name(&self) -> &'static str {
        "Database Quality"
    }

    fn description(&self) -> &'static str {
        "Relational integrity, strict seed idempotency, and entity shape"
    }

    fn validate(&self, target: &ValidationTarget) -> ValidationResult {
        let mut c = IssueCollector::new();
        debug!(module = %target.module_path, "running quality validation");

        let checks: [(&[String], fn(&Self, &mut IssueCollector, &str) -> Result<(), GuardError>); 3] = [
            (&target.migration_paths, Self::check_migration),
            (&target.seed_paths, Self::check_seed),
            (&target.entity_paths, Self::check_entity),
        ];
        for (paths, check) in checks {
            for path in paths {
                if let Err(e) = check(self, &mut c, path) {
                    warn!(path = %path, error = %e, "quality check failed");
                    c.add_issue(
                        "validation-error",
                        path,
                        format!("Quality check failed: {e}"),
                        Severity::Error,
                        IssueCategory::Structural,
                        false,
                    );
                }
            }
        }

        c.into_result(json!({
            "validator": self.id(),
            "module": target.module_path,
            "migrations_checked": target.migration_paths.len(),
            "seeds_checked": target.seed_paths.len(),
            "entities_checked": target.entity_paths.len(),
        }))
    }

    fn requirements(&self) -> Vec<Requirement> {
        vec![
            Requirement {
                id: "migration-foreign-keys",
                name: "Foreign key completeness",
                description: "Reference columns carry FK constraints to their referenced tables",
                category: IssueCategory::Relational,
                severity: Severity::Error,
                auto_fixable: true,
            },
            Requirement {
                id: "migration-performance-indexes",
                name: "Performance indexes",
                description: "Commonly queried columns are indexed",
                category: IssueCategory::Relational,
                severity: Severity::Warning,
                auto_fixable: true,
            },
            Requirement {
                id: "migration-soft-delete",
                name: "Table soft-delete convention",
                description: "User-related tables carry a nullable deleted_at column",
                category: IssueCategory::Relational,
                severity: Severity::Warning,
                auto_fixable: true,
            },
            Requirement {
                id: "seed-idempotency",
                name: "Strict seed idempotency",
                description: "Seeds that write rows guard against duplicate inserts",
                category: IssueCategory::Content,
                severity: Severity::Error,
                auto_fixable: true,
            },
            Requirement {
                id: "seed-error-handling",
                name: "Seed error handling",
                description: "Seeds handle failures via try/catch, rejection handlers, or error logs",
                category: IssueCategory::Content,
                severity: Severity::Warning,
                auto_fixable: true,
            },
            Requirement {
                id: "entity-decorators",
                name: "Entity decorator",
                description: "Entities carry an @Entity() class decorator",
                category: IssueCategory::Quality,
                severity: Severity::Error,
                auto_fixable: true,
            },
            Requirement {
                id: "entity-primary-key",
                name: "Entity primary key",
                description: "Entities declare a primary key column",
                category: IssueCategory::Quality,
                severity: Severity::Error,
                auto_fixable: false,
            },
            Requirement {
                id: "entity-timestamps",
                name: "Entity timestamps",
                description: "Entities carry created/updated date columns",
                category: IssueCategory::Quality,
                severity: Severity::Warning,
                auto_fixable: true,
            },
            Requirement {
                id: "entity-soft-delete",
                name: "Entity soft-delete convention",
                description: "User-related entities carry a nullable deleted date column",
                category: IssueCategory::Quality,
                severity: Severity::Warning,
                auto_fixable: true,
            },
        ]
    }
}
