//! Fix application — closed dispatch over the fix action set.
//!
//! Every transform reads the file fresh, edits text, and writes it back.
//! Transforms anchor on the final closing brace or on a `CREATE TABLE`
//! block's closing parenthesis, so offsets shift after each edit: fixes
//! touching one file must be applied sequentially, never from a stale
//! read. `apply_all` enforces that ordering and isolates per-fix failures.

use serde_json::Value;
use tracing::{debug, warn};

use super::patterns::IDEMPOTENCY_MARKER;
use super::quality::{
    extract_create_table_blocks, index_mentions_column, pluralize, CLASS_DECL, CREATED_MARKER,
    ENTITY_DECORATOR, ENTITY_SOFT_DELETE_MARKER, ERROR_HANDLING_TOKEN, FK_TOKEN,
    SOFT_DELETE_COLUMN, UPDATED_MARKER,
};
use super::{read_file, write_file};
use crate::error::GuardError;
use crate::rules::{Fix, FixAction};

/// What happened to one fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixStatus {
    Applied,
    /// The file already satisfies the rule; nothing was written.
    Skipped,
    Failed,
}

/// Outcome record for one fix in a batch.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FixReport {
    pub issue_id: String,
    pub action: FixAction,
    pub status: FixStatus,
    pub detail: Option<String>,
}

/// Applies fixes produced by the validators.
pub struct FixApplier;

impl FixApplier {
    pub fn new() -> Self {
        Self
    }

    /// Apply one fix. I/O and anchor failures propagate to the caller.
    pub fn apply(&self, fix: &Fix) -> Result<FixStatus, GuardError> {
        debug!(action = %fix.action, issue = %fix.issue_id, "applying fix");
        match fix.action {
            FixAction::RenameMigrationFile | FixAction::RenameSeedFile => self.rename(fix),
            FixAction::AddForeignKeyConstraints => self.add_foreign_keys(fix),
            FixAction::AddPerformanceIndexes => self.add_performance_indexes(fix),
            FixAction::AddSoftDeleteColumn => self.add_soft_delete_column(fix),
            FixAction::AddSeedIdempotency => self.add_seed_idempotency(fix),
            FixAction::AddSeedErrorHandling => self.add_seed_error_handling(fix),
            FixAction::AddEntityDecorators => self.add_entity_decorators(fix),
            FixAction::AddEntityTimestamps => self.add_entity_timestamps(fix),
            FixAction::AddEntitySoftDelete => self.add_entity_soft_delete(fix),
        }
    }

    /// Apply a batch sequentially. Each transform re-reads its file, and a
    /// failing fix is recorded without blocking the remainder.
    pub fn apply_all(&self, fixes: &[Fix]) -> Vec<FixReport> {
        fixes
            .iter()
            .map(|fix| match self.apply(fix) {
                Ok(status) => FixReport {
                    issue_id: fix.issue_id.clone(),
                    action: fix.action,
                    status,
                    detail: None,
                },
                Err(e) => {
                    warn!(action = %fix.action, error = %e, "fix failed");
                    FixReport {
                        issue_id: fix.issue_id.clone(),
                        action: fix.action,
                        status: FixStatus::Failed,
                        detail: Some(e.to_string()),
                    }
                }
            })
            .collect()
    }

    fn rename(&self, fix: &Fix) -> Result<FixStatus, GuardError> {
        let from = param_str(fix, "from")?;
        let to = param_str(fix, "to")?;
        std::fs::rename(from, to).map_err(|e| GuardError::io(from, e))?;
        Ok(FixStatus::Applied)
    }

    fn add_foreign_keys(&self, fix: &Fix) -> Result<FixStatus, GuardError> {
        let path = param_str(fix, "path")?;
        let table = param_str(fix, "table")?;
        let columns = param_str_list(fix, "columns")?;
        let content = read_file(path)?;

        let block = extract_create_table_blocks(&content)
            .into_iter()
            .find(|b| b.name.eq_ignore_ascii_case(table))
            .ok_or_else(|| GuardError::FixAnchor {
                action: fix.action,
                path: path.to_string(),
            })?;
        if FK_TOKEN.is_match(&block.body) {
            return Ok(FixStatus::Skipped);
        }

        let mut insertion = String::new();
        for column in &columns {
            let referenced = pluralize(column.trim_end_matches("_id"));
            insertion.push_str(&format!(
                ",\n                CONSTRAINT \"FK_{table}_{column}\" FOREIGN KEY (\"{column}\") REFERENCES \"{referenced}\" (\"id\")"
            ));
        }
        insertion.push('\n');

        let mut updated = content;
        updated.insert_str(block.close_offset, &insertion);
        write_file(path, &updated)?;
        Ok(FixStatus::Applied)
    }

    fn add_performance_indexes(&self, fix: &Fix) -> Result<FixStatus, GuardError> {
        let path = param_str(fix, "path")?;
        let table = param_str(fix, "table")?;
        let columns = param_str_list(fix, "columns")?;
        let content = read_file(path)?;

        let missing: Vec<&String> = columns
            .iter()
            .filter(|col| !index_mentions_column(&content, col))
            .collect();
        if missing.is_empty() {
            return Ok(FixStatus::Skipped);
        }

        let mut insertion = String::new();
        for column in &missing {
            insertion.push_str(&format!(
                "        await queryRunner.query(`CREATE INDEX \"IDX_{table}_{column}\" ON \"{table}\" (\"{column}\")`);\n"
            ));
        }

        let updated = insert_before_final_brace(&content, &insertion).ok_or_else(|| {
            GuardError::FixAnchor {
                action: fix.action,
                path: path.to_string(),
            }
        })?;
        write_file(path, &updated)?;
        Ok(FixStatus::Applied)
    }

    fn add_soft_delete_column(&self, fix: &Fix) -> Result<FixStatus, GuardError> {
        let path = param_str(fix, "path")?;
        let table = param_str(fix, "table")?;
        let content = read_file(path)?;

        let block = extract_create_table_blocks(&content)
            .into_iter()
            .find(|b| b.name.eq_ignore_ascii_case(table))
            .ok_or_else(|| GuardError::FixAnchor {
                action: fix.action,
                path: path.to_string(),
            })?;
        if SOFT_DELETE_COLUMN.is_match(&block.body) {
            return Ok(FixStatus::Skipped);
        }

        let mut updated = content;
        updated.insert_str(
            block.close_offset,
            ",\n                \"deleted_at\" TIMESTAMP NULL\n",
        );
        write_file(path, &updated)?;
        Ok(FixStatus::Applied)
    }

    fn add_seed_idempotency(&self, fix: &Fix) -> Result<FixStatus, GuardError> {
        let path = param_str(fix, "path")?;
        let content = read_file(path)?;
        if IDEMPOTENCY_MARKER.is_match(&content) {
            return Ok(FixStatus::Skipped);
        }

        let open = run_body_open(&content).ok_or_else(|| GuardError::FixAnchor {
            action: fix.action,
            path: path.to_string(),
        })?;
        let template = "\n        // Skip when rows from a previous run are present\n        const existing = await repository.findOne({ where: {} });\n        if (existing) {\n            return;\n        }\n";

        let mut updated = content;
        updated.insert_str(open + 1, template);
        write_file(path, &updated)?;
        Ok(FixStatus::Applied)
    }

    fn add_seed_error_handling(&self, fix: &Fix) -> Result<FixStatus, GuardError> {
        let path = param_str(fix, "path")?;
        let content = read_file(path)?;
        if ERROR_HANDLING_TOKEN.is_match(&content) {
            return Ok(FixStatus::Skipped);
        }

        let open = run_body_open(&content).ok_or_else(|| GuardError::FixAnchor {
            action: fix.action,
            path: path.to_string(),
        })?;
        let close = matching_brace(&content, open).ok_or_else(|| GuardError::FixAnchor {
            action: fix.action,
            path: path.to_string(),
        })?;

        let mut updated = String::with_capacity(content.len() + 160);
        updated.push_str(&content[..open + 1]);
        updated.push_str("\n        try {");
        updated.push_str(&content[open + 1..close]);
        updated.push_str(
            "        } catch (error) {\n            console.error('Seed failed', error);\n            throw error;\n        }\n    ",
        );
        updated.push_str(&content[close..]);
        write_file(path, &updated)?;
        Ok(FixStatus::Applied)
    }

    fn add_entity_decorators(&self, fix: &Fix) -> Result<FixStatus, GuardError> {
        let path = param_str(fix, "path")?;
        let content = read_file(path)?;
        if ENTITY_DECORATOR.is_match(&content) {
            return Ok(FixStatus::Skipped);
        }

        let class_start = CLASS_DECL
            .find(&content)
            .map(|m| m.start())
            .ok_or_else(|| GuardError::FixAnchor {
                action: fix.action,
                path: path.to_string(),
            })?;

        let mut updated = String::with_capacity(content.len() + 64);
        if !content.contains("typeorm") {
            updated.push_str("import { Entity } from 'typeorm';\n\n");
        }
        updated.push_str(&content[..class_start]);
        updated.push_str("@Entity()\n");
        updated.push_str(&content[class_start..]);
        write_file(path, &updated)?;
        Ok(FixStatus::Applied)
    }

    fn add_entity_timestamps(&self, fix: &Fix) -> Result<FixStatus, GuardError> {
        let path = param_str(fix, "path")?;
        let content = read_file(path)?;
        if CREATED_MARKER.is_match(&content) && UPDATED_MARKER.is_match(&content) {
            return Ok(FixStatus::Skipped);
        }

        let insertion = "\n    @CreateDateColumn({ type: 'timestamp with time zone' })\n    createdAt: Date;\n\n    @UpdateDateColumn({ type: 'timestamp with time zone' })\n    updatedAt: Date;\n";
        let updated = insert_before_final_brace(&content, insertion).ok_or_else(|| {
            GuardError::FixAnchor {
                action: fix.action,
                path: path.to_string(),
            }
        })?;
        write_file(path, &updated)?;
        Ok(FixStatus::Applied)
    }

    fn add_entity_soft_delete(&self, fix: &Fix) -> Result<FixStatus, GuardError> {
        let path = param_str(fix, "path")?;
        let content = read_file(path)?;
        if ENTITY_SOFT_DELETE_MARKER.is_match(&content) {
            return Ok(FixStatus::Skipped);
        }

        let insertion = "\n    @DeleteDateColumn({ type: 'timestamp with time zone', nullable: true })\n    deletedAt: Date | null;\n";
        let updated = insert_before_final_brace(&content, insertion).ok_or_else(|| {
            GuardError::FixAnchor {
                action: fix.action,
                path: path.to_string(),
            }
        })?;
        write_file(path, &updated)?;
        Ok(FixStatus::Applied)
    }
}

impl Default for FixApplier {
    fn default() -> Self {
        Self::new()
    }
}

fn param_str<'a>(fix: &'a Fix, name: &'static str) -> Result<&'a str, GuardError> {
    fix.parameters
        .get(name)
        .and_then(Value::as_str)
        .ok_or(GuardError::MissingFixParameter {
            action: fix.action,
            name,
        })
}

fn param_str_list(fix: &Fix, name: &'static str) -> Result<Vec<String>, GuardError> {
    let values = fix
        .parameters
        .get(name)
        .and_then(Value::as_array)
        .ok_or(GuardError::MissingFixParameter {
            action: fix.action,
            name,
        })?;
    Ok(values
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect())
}

/// Byte offset of the opening brace of the seed's run/main body.
fn run_body_open(content: &str) -> Option<usize> {
    static RUN_SIGNATURE: once_cell::sync::Lazy<regex::Regex> = once_cell::sync::Lazy::new(|| {
        regex::Regex::new(r"(?:public\s+)?(?:async\s+)?(?:function\s+)?(?:run|main|seed)\s*\([^)]*\)[^{]*\{")
            .unwrap()
    });
    RUN_SIGNATURE.find(content).map(|m| m.end() - 1)
}

/// Byte offset of the brace matching the one at `open`.
fn matching_brace(content: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, ch) in content[open..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

fn insert_before_final_brace(content: &str, insertion: &str) -> Option<String> {
    let at = content.rfind('}')?;
    let mut updated = String::with_capacity(content.len() + insertion.len());
    updated.push_str(&content[..at]);
    updated.push_str(insertion);
    updated.push_str(&content[at..]);
    Some(updated)
}
