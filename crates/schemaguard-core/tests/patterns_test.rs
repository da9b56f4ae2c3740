//! Pattern validator tests — naming grammar, structural completeness,
//! and content heuristics over migration and seed files.

use std::fs;
use std::path::Path;

use schemaguard_core::{
    FixAction, PatternValidator, Severity, ValidationTarget, Validator,
};
use tempfile::TempDir;

fn write_ts(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

fn migration_target(paths: Vec<String>) -> ValidationTarget {
    ValidationTarget {
        module_path: "modules/iam".to_string(),
        migration_paths: paths,
        seed_paths: Vec::new(),
        entity_paths: Vec::new(),
    }
}

fn seed_target(paths: Vec<String>) -> ValidationTarget {
    ValidationTarget {
        module_path: "modules/iam".to_string(),
        migration_paths: Vec::new(),
        seed_paths: paths,
        entity_paths: Vec::new(),
    }
}

const GOOD_MIGRATION: &str = r#"import { MigrationInterface, QueryRunner } from 'typeorm';

export class CreateWidgetsTable1704240000001 implements MigrationInterface {
    public async up(queryRunner: QueryRunner): Promise<void> {
        await queryRunner.query(`CREATE TABLE "widgets" ("id" uuid PRIMARY KEY, "label" varchar NOT NULL)`);
    }

    public async down(queryRunner: QueryRunner): Promise<void> {
        await queryRunner.query(`DROP TABLE "widgets"`);
    }
}
"#;

const GOOD_SEED: &str = r#"export class SeedIamUsers {
    public async run(dataSource: DataSource): Promise<void> {
        try {
            const repository = dataSource.getRepository(User);
            const existing = await repository.findOne({ where: { email: adminEmail } });
            if (!existing) {
                await repository.save(admin);
            }
            console.log('seeded iam users');
        } catch (error) {
            throw error;
        }
    }
}
"#;

#[test]
fn well_formed_migration_produces_no_issues() {
    let dir = TempDir::new().unwrap();
    let path = write_ts(&dir, "1704240000001-CreateWidgetsTable.ts", GOOD_MIGRATION);

    let result = PatternValidator::new().validate(&migration_target(vec![path]));
    assert!(result.is_valid, "issues: {:?}", result.issues);
    assert!(result.issues.is_empty());
    assert!(result.fixes.is_empty());
}

#[test]
fn bad_migration_name_is_auto_fixable_error() {
    let dir = TempDir::new().unwrap();
    let path = write_ts(&dir, "create-users-table.ts", GOOD_MIGRATION);

    let result = PatternValidator::new().validate(&migration_target(vec![path]));
    assert!(!result.is_valid);

    let naming = result
        .issues
        .iter()
        .find(|i| i.rule == "migration-naming")
        .expect("naming issue");
    assert_eq!(naming.severity, Severity::Error);
    assert!(naming.auto_fixable);

    let fix = result
        .fixes
        .iter()
        .find(|f| f.issue_id == naming.id)
        .expect("companion rename fix");
    assert_eq!(fix.action, FixAction::RenameMigrationFile);
    let to = fix.parameters["to"].as_str().unwrap();
    let to_name = Path::new(to).file_name().unwrap().to_str().unwrap();
    assert!(
        to_name.ends_with("-CreateUsersTable.ts"),
        "derived name should PascalCase the remainder, got {to_name}"
    );
    assert!(to_name[..13].chars().all(|c| c.is_ascii_digit()));
}

#[test]
fn migration_name_reuses_leading_digit_run() {
    let dir = TempDir::new().unwrap();
    let path = write_ts(&dir, "1704240000001-create-users-table.ts", GOOD_MIGRATION);

    let result = PatternValidator::new().validate(&migration_target(vec![path]));
    let fix = result.fixes.first().expect("rename fix");
    let to = fix.parameters["to"].as_str().unwrap();
    let to_name = Path::new(to).file_name().unwrap().to_str().unwrap();
    assert_eq!(to_name, "1704240000001-CreateUsersTable.ts");
}

#[test]
fn missing_migration_file_skips_content_checks() {
    let dir = TempDir::new().unwrap();
    let path = dir
        .path()
        .join("1704240000001-CreateWidgetsTable.ts")
        .to_string_lossy()
        .into_owned();

    let result = PatternValidator::new().validate(&migration_target(vec![path]));
    assert!(!result.is_valid);
    assert_eq!(result.issues.len(), 1);
    assert_eq!(result.issues[0].rule, "migration-file-missing");
}

#[test]
fn missing_up_and_down_methods_are_errors() {
    let dir = TempDir::new().unwrap();
    let path = write_ts(
        &dir,
        "1704240000001-CreateWidgetsTable.ts",
        "export class CreateWidgetsTable1704240000001 {\n}\n",
    );

    let result = PatternValidator::new().validate(&migration_target(vec![path]));
    let rules: Vec<&str> = result.issues.iter().map(|i| i.rule.as_str()).collect();
    assert!(rules.contains(&"migration-up-method"));
    assert!(rules.contains(&"migration-down-method"));
    for issue in &result.issues {
        assert_eq!(issue.severity, Severity::Error);
        assert!(issue.auto_fixable);
    }
}

#[test]
fn create_database_statement_is_always_a_hardcoded_values_error() {
    let dir = TempDir::new().unwrap();
    let content = GOOD_MIGRATION.replace(
        "CREATE TABLE \"widgets\" (\"id\" uuid PRIMARY KEY, \"label\" varchar NOT NULL)",
        "CREATE DATABASE telemetryflow_db",
    );
    let path = write_ts(&dir, "1704240000001-CreateDatabase.ts", &content);

    let result = PatternValidator::new().validate(&migration_target(vec![path]));
    let issue = result
        .issues
        .iter()
        .find(|i| i.rule == "migration-hardcoded-values")
        .expect("hardcoded values issue");
    assert_eq!(issue.severity, Severity::Error);
    assert!(!issue.auto_fixable, "safe rewriting needs external knowledge");
}

#[test]
fn loopback_host_literal_is_flagged() {
    let dir = TempDir::new().unwrap();
    let content = GOOD_MIGRATION.replace("DROP TABLE \"widgets\"", "host: 'localhost'");
    let path = write_ts(&dir, "1704240000001-CreateWidgetsTable.ts", &content);

    let result = PatternValidator::new().validate(&migration_target(vec![path]));
    assert!(result
        .issues
        .iter()
        .any(|i| i.rule == "migration-hardcoded-values"));
}

#[test]
fn connection_keywords_without_env_usage_warn() {
    let dir = TempDir::new().unwrap();
    let content = GOOD_MIGRATION.replace(
        "DROP TABLE \"widgets\"",
        "ALTER TABLE widgets SET port = 5432",
    );
    let path = write_ts(&dir, "1704240000001-CreateWidgetsTable.ts", &content);

    let result = PatternValidator::new().validate(&migration_target(vec![path]));
    let issue = result
        .issues
        .iter()
        .find(|i| i.rule == "migration-env-config")
        .expect("env config warning");
    assert_eq!(issue.severity, Severity::Warning);
    assert!(result.is_valid, "warnings alone do not block validity");
}

#[test]
fn env_usage_suppresses_connection_warning() {
    let dir = TempDir::new().unwrap();
    let content = GOOD_MIGRATION.replace(
        "DROP TABLE \"widgets\"",
        "const port = process.env.DB_PORT",
    );
    let path = write_ts(&dir, "1704240000001-CreateWidgetsTable.ts", &content);

    let result = PatternValidator::new().validate(&migration_target(vec![path]));
    assert!(!result.issues.iter().any(|i| i.rule == "migration-env-config"));
}

#[test]
fn well_formed_seed_produces_no_issues() {
    let dir = TempDir::new().unwrap();
    let path = write_ts(&dir, "1704240000001-seed-iam-users.ts", GOOD_SEED);

    let result = PatternValidator::new().validate(&seed_target(vec![path]));
    assert!(result.is_valid, "issues: {:?}", result.issues);
    assert!(result.issues.is_empty());
}

#[test]
fn bad_seed_name_is_auto_fixable_error() {
    let dir = TempDir::new().unwrap();
    let path = write_ts(&dir, "seed-users.ts", GOOD_SEED);

    let result = PatternValidator::new().validate(&seed_target(vec![path]));
    let naming = result
        .issues
        .iter()
        .find(|i| i.rule == "seed-naming")
        .expect("seed naming issue");
    assert_eq!(naming.severity, Severity::Error);
    assert!(naming.auto_fixable);
    assert_eq!(
        result.fixes.first().map(|f| f.action),
        Some(FixAction::RenameSeedFile)
    );
}

#[test]
fn bare_seed_accumulates_advisory_issues() {
    let dir = TempDir::new().unwrap();
    let path = write_ts(
        &dir,
        "1704240000001-seed-iam-users.ts",
        "export class SeedIamUsers {\n    public async run(): Promise<void> {\n        await repository.save(rows);\n    }\n}\n",
    );

    let result = PatternValidator::new().validate(&seed_target(vec![path]));
    assert!(result.is_valid, "only warnings and info expected");

    let expect = |rule: &str, severity: Severity| {
        let issue = result
            .issues
            .iter()
            .find(|i| i.rule == rule)
            .unwrap_or_else(|| panic!("missing {rule}"));
        assert_eq!(issue.severity, severity);
        assert!(issue.auto_fixable);
    };
    expect("seed-error-handling", Severity::Warning);
    expect("seed-idempotency", Severity::Warning);
    expect("seed-logging", Severity::Info);
}

#[test]
fn revalidation_reproduces_identical_issue_identities() {
    let dir = TempDir::new().unwrap();
    let migration = write_ts(&dir, "bad-name.ts", "export class BadName {}\n");
    let seed = write_ts(&dir, "seed-users.ts", "export class SeedUsers {}\n");
    let target = ValidationTarget {
        module_path: "modules/iam".to_string(),
        migration_paths: vec![migration],
        seed_paths: vec![seed],
        entity_paths: Vec::new(),
    };

    let validator = PatternValidator::new();
    let mut first: Vec<String> = validator
        .validate(&target)
        .issues
        .into_iter()
        .map(|i| i.id)
        .collect();
    let mut second: Vec<String> = validator
        .validate(&target)
        .issues
        .into_iter()
        .map(|i| i.id)
        .collect();
    first.sort();
    second.sort();
    assert_eq!(first, second);
}

#[test]
fn requirements_catalog_is_stable() {
    let validator = PatternValidator::new();
    let requirements = validator.requirements();
    assert!(requirements.len() >= 10);

    let ids: Vec<&str> = requirements.iter().map(|r| r.id).collect();
    for required in [
        "migration-naming",
        "migration-up-method",
        "migration-down-method",
        "migration-hardcoded-values",
        "seed-naming",
        "seed-idempotency",
        "seed-error-handling",
        "seed-logging",
    ] {
        assert!(ids.contains(&required), "missing requirement {required}");
    }
}
