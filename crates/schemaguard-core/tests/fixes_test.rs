//! Fix application tests — renames, content transforms, sequential
//! batches, and per-fix failure isolation.

use std::fs;
use std::path::Path;

use schemaguard_core::{
    Fix, FixAction, FixApplier, FixStatus, PatternValidator, QualityValidator, ValidationTarget,
    Validator,
};
use serde_json::json;
use tempfile::TempDir;

fn write_ts(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

fn migrations(paths: Vec<String>) -> ValidationTarget {
    ValidationTarget {
        module_path: "modules/iam".to_string(),
        migration_paths: paths,
        ..Default::default()
    }
}

const MIGRATION_BODY: &str = r#"export class Migration {
    public async up(queryRunner: QueryRunner): Promise<void> {
        await queryRunner.query(`CREATE TABLE "memberships" (
                "id" uuid PRIMARY KEY,
                "organization_id" uuid NOT NULL
            )`);
    }

    public async down(queryRunner: QueryRunner): Promise<void> {}
}
"#;

#[test]
fn rename_fix_moves_the_file_on_disk() {
    let dir = TempDir::new().unwrap();
    let path = write_ts(&dir, "create-users-table.ts", MIGRATION_BODY);

    let result = PatternValidator::new().validate(&migrations(vec![path.clone()]));
    let fix = result
        .fixes
        .iter()
        .find(|f| f.action == FixAction::RenameMigrationFile)
        .expect("rename fix");

    let status = FixApplier::new().apply(fix).unwrap();
    assert_eq!(status, FixStatus::Applied);
    assert!(!Path::new(&path).exists());
    assert!(Path::new(fix.parameters["to"].as_str().unwrap()).exists());
}

#[test]
fn foreign_key_fix_rewrites_the_table_block() {
    let dir = TempDir::new().unwrap();
    let path = write_ts(&dir, "m.ts", MIGRATION_BODY);

    let validator = QualityValidator::new();
    let result = validator.validate(&migrations(vec![path.clone()]));
    let fix = result
        .fixes
        .iter()
        .find(|f| f.action == FixAction::AddForeignKeyConstraints)
        .expect("FK fix");

    let status = FixApplier::new().apply(fix).unwrap();
    assert_eq!(status, FixStatus::Applied);

    let rewritten = fs::read_to_string(&path).unwrap();
    assert!(rewritten.contains("CONSTRAINT \"FK_memberships_organization_id\""));
    assert!(rewritten.contains("REFERENCES \"organizations\" (\"id\")"));

    // The issue is gone on re-validation, and re-applying skips.
    let revalidated = validator.validate(&migrations(vec![path]));
    assert!(!revalidated
        .issues
        .iter()
        .any(|i| i.rule == "migration-foreign-keys"));
    assert_eq!(
        FixApplier::new().apply(fix).unwrap(),
        FixStatus::Skipped
    );
}

#[test]
fn soft_delete_fix_appends_a_nullable_column() {
    let dir = TempDir::new().unwrap();
    let content = MIGRATION_BODY
        .replace("memberships", "users")
        .replace("\"organization_id\" uuid NOT NULL", "\"name\" varchar NOT NULL");
    let path = write_ts(&dir, "m.ts", &content);

    let result = QualityValidator::new().validate(&migrations(vec![path.clone()]));
    let fix = result
        .fixes
        .iter()
        .find(|f| f.action == FixAction::AddSoftDeleteColumn)
        .expect("soft delete fix");

    assert_eq!(FixApplier::new().apply(fix).unwrap(), FixStatus::Applied);
    let rewritten = fs::read_to_string(&path).unwrap();
    assert!(rewritten.contains("\"deleted_at\" TIMESTAMP NULL"));
}

#[test]
fn performance_index_fix_appends_index_statements() {
    let dir = TempDir::new().unwrap();
    let fix = Fix {
        issue_id: "migration-performance-indexes-m.ts".to_string(),
        description: "add indexes".to_string(),
        action: FixAction::AddPerformanceIndexes,
        parameters: json!({
            "path": write_ts(&dir, "m.ts", MIGRATION_BODY),
            "table": "memberships",
            "columns": ["organization_id"],
        }),
    };

    assert_eq!(FixApplier::new().apply(&fix).unwrap(), FixStatus::Applied);
    let rewritten = fs::read_to_string(fix.parameters["path"].as_str().unwrap()).unwrap();
    assert!(rewritten.contains("CREATE INDEX \"IDX_memberships_organization_id\""));
}

#[test]
fn seed_idempotency_fix_inserts_an_existence_check() {
    let dir = TempDir::new().unwrap();
    let path = write_ts(
        &dir,
        "s.ts",
        "export class Seed {\n    public async run(dataSource: DataSource): Promise<void> {\n        await repository.save(rows);\n    }\n}\n",
    );
    let fix = Fix {
        issue_id: "seed-idempotency-s.ts".to_string(),
        description: "guard".to_string(),
        action: FixAction::AddSeedIdempotency,
        parameters: json!({ "path": path }),
    };

    assert_eq!(FixApplier::new().apply(&fix).unwrap(), FixStatus::Applied);
    let rewritten = fs::read_to_string(&path).unwrap();
    assert!(rewritten.contains("findOne"));
    let guard = rewritten.find("findOne").unwrap();
    let save = rewritten.find(".save(").unwrap();
    assert!(guard < save, "guard must precede the first write");
}

#[test]
fn seed_error_handling_fix_wraps_the_run_body() {
    let dir = TempDir::new().unwrap();
    let path = write_ts(
        &dir,
        "s.ts",
        "export class Seed {\n    public async run(dataSource: DataSource): Promise<void> {\n        await repository.save(rows);\n    }\n}\n",
    );
    let fix = Fix {
        issue_id: "seed-error-handling-s.ts".to_string(),
        description: "wrap".to_string(),
        action: FixAction::AddSeedErrorHandling,
        parameters: json!({ "path": path }),
    };

    assert_eq!(FixApplier::new().apply(&fix).unwrap(), FixStatus::Applied);
    let rewritten = fs::read_to_string(&path).unwrap();
    assert!(rewritten.contains("try {"));
    assert!(rewritten.contains("} catch (error) {"));
    assert!(rewritten.contains("throw error;"));
}

#[test]
fn entity_fixes_append_annotated_fields() {
    let dir = TempDir::new().unwrap();
    let path = write_ts(
        &dir,
        "user.entity.ts",
        "export class User {\n    id: string;\n}\n",
    );

    let applier = FixApplier::new();
    let decorate = Fix {
        issue_id: "entity-decorators-user.entity.ts".to_string(),
        description: "decorate".to_string(),
        action: FixAction::AddEntityDecorators,
        parameters: json!({ "path": path, "class": "User" }),
    };
    assert_eq!(applier.apply(&decorate).unwrap(), FixStatus::Applied);

    let timestamps = Fix {
        issue_id: "entity-timestamps-user.entity.ts".to_string(),
        description: "timestamps".to_string(),
        action: FixAction::AddEntityTimestamps,
        parameters: json!({ "path": path }),
    };
    assert_eq!(applier.apply(&timestamps).unwrap(), FixStatus::Applied);

    let soft_delete = Fix {
        issue_id: "entity-soft-delete-user.entity.ts".to_string(),
        description: "soft delete".to_string(),
        action: FixAction::AddEntitySoftDelete,
        parameters: json!({ "path": path, "class": "User" }),
    };
    assert_eq!(applier.apply(&soft_delete).unwrap(), FixStatus::Applied);

    let rewritten = fs::read_to_string(&path).unwrap();
    assert!(rewritten.contains("@Entity()"));
    assert!(rewritten.contains("@CreateDateColumn"));
    assert!(rewritten.contains("@UpdateDateColumn"));
    assert!(rewritten.contains("@DeleteDateColumn"));
    assert!(rewritten.contains("deletedAt: Date | null;"));
}

#[test]
fn a_failing_fix_does_not_block_the_rest_of_the_batch() {
    let dir = TempDir::new().unwrap();
    let good_path = write_ts(
        &dir,
        "user.entity.ts",
        "import { Entity } from 'typeorm';\n\n@Entity('users')\nexport class User {\n    id: string;\n}\n",
    );

    let fixes = vec![
        Fix {
            issue_id: "entity-timestamps-gone.ts".to_string(),
            description: "timestamps on a missing file".to_string(),
            action: FixAction::AddEntityTimestamps,
            parameters: json!({ "path": dir.path().join("gone.ts").to_string_lossy() }),
        },
        Fix {
            issue_id: "entity-timestamps-user.entity.ts".to_string(),
            description: "timestamps".to_string(),
            action: FixAction::AddEntityTimestamps,
            parameters: json!({ "path": good_path }),
        },
    ];

    let reports = FixApplier::new().apply_all(&fixes);
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].status, FixStatus::Failed);
    assert!(reports[0].detail.is_some());
    assert_eq!(reports[1].status, FixStatus::Applied);
}

#[test]
fn missing_parameters_fail_cleanly() {
    let fix = Fix {
        issue_id: "entity-timestamps-x.ts".to_string(),
        description: "no params".to_string(),
        action: FixAction::AddEntityTimestamps,
        parameters: json!({}),
    };

    let reports = FixApplier::new().apply_all(&[fix]);
    assert_eq!(reports[0].status, FixStatus::Failed);
    assert!(reports[0]
        .detail
        .as_deref()
        .unwrap()
        .contains("missing parameter"));
}

#[test]
fn fixes_to_one_file_apply_sequentially_with_re_reads() {
    let dir = TempDir::new().unwrap();
    let path = write_ts(
        &dir,
        "user.entity.ts",
        "import { Entity } from 'typeorm';\n\n@Entity('users')\nexport class User {\n    id: string;\n}\n",
    );

    let fixes = vec![
        Fix {
            issue_id: "entity-timestamps-user.entity.ts".to_string(),
            description: "timestamps".to_string(),
            action: FixAction::AddEntityTimestamps,
            parameters: json!({ "path": path }),
        },
        Fix {
            issue_id: "entity-soft-delete-user.entity.ts".to_string(),
            description: "soft delete".to_string(),
            action: FixAction::AddEntitySoftDelete,
            parameters: json!({ "path": path }),
        },
    ];

    let reports = FixApplier::new().apply_all(&fixes);
    assert!(reports.iter().all(|r| r.status == FixStatus::Applied));

    // Both transforms landed inside the class body, before the final brace.
    let rewritten = fs::read_to_string(&path).unwrap();
    let class_close = rewritten.rfind('}').unwrap();
    assert!(rewritten.find("@CreateDateColumn").unwrap() < class_close);
    assert!(rewritten.find("@DeleteDateColumn").unwrap() < class_close);
}
