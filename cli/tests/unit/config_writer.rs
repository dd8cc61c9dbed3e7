//! Previewed, guarded writes.

use std::path::PathBuf;

use modgenie_cli::application::services::config_writer::ConfigWriter;
use modgenie_cli::domain::error::{GuardError, WriteError};
use modgenie_cli::domain::files::FileRole;
use serde_json::{Map, Value, json};

use crate::helpers::{DESCRIPTOR, put, workspace};

const MAIN_TF: &str = "resource \"aws_db_instance\" \"main\" {\n  engine = \"postgres\"\n}\n";

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected an object"),
    }
}

// ── preview ──────────────────────────────────────────────────────────────────

#[test]
fn test_preview_of_new_file_does_not_touch_disk() {
    let (dir, guard) = workspace();
    let writer = ConfigWriter::new(guard, true);

    let dry = writer.preview("modules/db/main.tf", MAIN_TF).unwrap();

    assert!(!dry.exists);
    assert!(dry.valid);
    assert_eq!(dry.role, FileRole::Terraform);
    assert_eq!(dry.path, PathBuf::from("modules/db/main.tf"));
    assert_eq!(dry.lines_added, 3);
    assert_eq!(dry.lines_removed, 0);
    assert!(dry.diff.contains("+++ b/modules/db/main.tf"));
    assert!(!dir.path().join("modules/db/main.tf").exists());
}

#[test]
fn test_preview_reports_descriptor_shape_problems_without_erroring() {
    let (_dir, guard) = workspace();
    let writer = ConfigWriter::new(guard, true);

    let dry = writer.preview("m/facets.yaml", "intent: db\n").unwrap();

    assert!(!dry.valid);
    assert!(dry.problems.iter().any(|p| p.contains("'flavor'")), "{:?}", dry.problems);
    assert!(dry.problems.iter().any(|p| p.contains("'spec'")), "{:?}", dry.problems);
}

#[test]
fn test_preview_flags_provider_blocks_in_terraform() {
    let (_dir, guard) = workspace();
    let writer = ConfigWriter::new(guard, true);

    let dry = writer
        .preview("m/main.tf", "terraform {}\n\nprovider \"aws\" {\n  region = \"us-east-1\"\n}\n")
        .unwrap();

    assert!(!dry.valid);
    assert_eq!(dry.problems.len(), 1);
    assert!(dry.problems[0].starts_with("line 3"), "{:?}", dry.problems);
}

#[test]
fn test_output_interface_is_protected_from_generic_writes() {
    let (_dir, guard) = workspace();
    let writer = ConfigWriter::new(guard, false);

    for name in ["m/outputs.tf", "m/output.tf"] {
        let err = writer.preview(name, "locals {}\n").unwrap_err();
        assert!(matches!(err, WriteError::ProtectedFile { .. }), "{name}: {err:?}");
        let err = writer.commit(name, "locals {}\n", None).unwrap_err();
        assert!(matches!(err, WriteError::ProtectedFile { .. }), "{name}: {err:?}");
    }
}

#[test]
fn test_escape_is_rejected_before_any_io() {
    let (dir, guard) = workspace();
    let writer = ConfigWriter::new(guard, false);

    let err = writer.commit("../escaped.tf", MAIN_TF, None).unwrap_err();

    assert!(matches!(err, WriteError::Guard(GuardError::PathEscape { .. })), "{err:?}");
    assert_eq!(err.code(), "path_escape");
    assert!(!dir.path().parent().unwrap().join("escaped.tf").exists());
}

// ── commit ───────────────────────────────────────────────────────────────────

#[test]
fn test_commit_with_token_writes_and_creates_parents() {
    let (dir, guard) = workspace();
    let writer = ConfigWriter::new(guard, true);

    let dry = writer.preview("modules/db/main.tf", MAIN_TF).unwrap();
    let outcome = writer
        .commit("modules/db/main.tf", MAIN_TF, Some(&dry.preview_token))
        .unwrap();

    assert!(outcome.changed);
    assert_eq!(outcome.bytes_written, MAIN_TF.len());
    let on_disk = std::fs::read_to_string(dir.path().join("modules/db/main.tf")).unwrap();
    assert_eq!(on_disk, MAIN_TF);
}

#[test]
fn test_commit_is_idempotent() {
    let (dir, guard) = workspace();
    put(dir.path(), "m/main.tf", MAIN_TF);
    let writer = ConfigWriter::new(guard, true);

    let dry = writer.preview("m/main.tf", MAIN_TF).unwrap();
    assert!(dry.is_unchanged());
    assert!(dry.diff.is_empty());

    let outcome = writer.commit("m/main.tf", MAIN_TF, Some(&dry.preview_token)).unwrap();
    assert!(!outcome.changed);
    assert_eq!(outcome.bytes_written, 0);
    assert_eq!(std::fs::read_to_string(dir.path().join("m/main.tf")).unwrap(), MAIN_TF);
}

#[test]
fn test_strict_commit_requires_a_token() {
    let (dir, guard) = workspace();
    let writer = ConfigWriter::new(guard, true);

    let err = writer.commit("m/main.tf", MAIN_TF, None).unwrap_err();

    assert!(matches!(err, WriteError::NotPreviewed(_)), "{err:?}");
    assert_eq!(err.code(), "not_previewed");
    assert!(!dir.path().join("m/main.tf").exists());
}

#[test]
fn test_token_goes_stale_when_file_changes_after_preview() {
    let (dir, guard) = workspace();
    put(dir.path(), "m/main.tf", MAIN_TF);
    let writer = ConfigWriter::new(guard, true);
    let proposed = MAIN_TF.replace("postgres", "mysql");

    let dry = writer.preview("m/main.tf", &proposed).unwrap();
    put(dir.path(), "m/main.tf", "# edited elsewhere\n");

    let err = writer
        .commit("m/main.tf", &proposed, Some(&dry.preview_token))
        .unwrap_err();
    assert!(matches!(err, WriteError::NotPreviewed(_)), "{err:?}");
    assert_eq!(
        std::fs::read_to_string(dir.path().join("m/main.tf")).unwrap(),
        "# edited elsewhere\n"
    );
}

#[test]
fn test_token_does_not_cover_different_content() {
    let (_dir, guard) = workspace();
    let writer = ConfigWriter::new(guard, true);

    let dry = writer.preview("m/README.md", "one\n").unwrap();
    let err = writer
        .commit("m/README.md", "two\n", Some(&dry.preview_token))
        .unwrap_err();
    assert!(matches!(err, WriteError::NotPreviewed(_)));
}

#[test]
fn test_lenient_commit_skips_the_token() {
    let (dir, guard) = workspace();
    let writer = ConfigWriter::new(guard, false);

    let outcome = writer.commit("m/README.md", "# Postgres\n", None).unwrap();

    assert!(outcome.changed);
    assert!(dir.path().join("m/README.md").is_file());
}

#[test]
fn test_invalid_content_is_never_written() {
    let (dir, guard) = workspace();
    let writer = ConfigWriter::new(guard, true);
    let bad = "intent: db\n";

    let dry = writer.preview("m/facets.yaml", bad).unwrap();
    let err = writer
        .commit("m/facets.yaml", bad, Some(&dry.preview_token))
        .unwrap_err();

    assert!(matches!(err, WriteError::InvalidContent { .. }), "{err:?}");
    assert!(!dir.path().join("m/facets.yaml").exists());
}

#[test]
fn test_valid_descriptor_commits() {
    let (dir, guard) = workspace();
    let writer = ConfigWriter::new(guard, false);

    writer.commit("m/facets.yaml", DESCRIPTOR, None).unwrap();

    assert_eq!(
        std::fs::read_to_string(dir.path().join("m/facets.yaml")).unwrap(),
        DESCRIPTOR
    );
}

#[test]
fn test_dropped_final_newline_shows_in_the_preview() {
    let (dir, guard) = workspace();
    put(dir.path(), "m/README.md", "hello\n");
    let writer = ConfigWriter::new(guard, true);

    let dry = writer.preview("m/README.md", "hello").unwrap();

    assert!(!dry.is_unchanged());
    assert_eq!((dry.lines_added, dry.lines_removed), (1, 1));
    assert!(dry.diff.contains("No newline at end of file"), "{}", dry.diff);

    let outcome = writer.commit("m/README.md", "hello", Some(&dry.preview_token)).unwrap();
    assert!(outcome.changed);
    assert_eq!(std::fs::read_to_string(dir.path().join("m/README.md")).unwrap(), "hello");
}

#[test]
fn test_line_ending_only_change_is_not_an_empty_diff() {
    let (dir, guard) = workspace();
    put(dir.path(), "m/main.tf", "locals {}\r\n");
    let writer = ConfigWriter::new(guard, true);

    let dry = writer.preview("m/main.tf", "locals {}\n").unwrap();

    assert!(!dry.diff.is_empty());
    assert_eq!((dry.lines_added, dry.lines_removed), (1, 1));
}

// ── edit ─────────────────────────────────────────────────────────────────────

#[test]
fn test_edit_replaces_exact_block() {
    let (dir, guard) = workspace();
    put(dir.path(), "m/main.tf", MAIN_TF);
    let writer = ConfigWriter::new(guard, true);

    let dry = writer.edit("m/main.tf", "\"postgres\"", "\"aurora-postgresql\"", 1).unwrap();
    assert_eq!(dry.lines_added, 1);
    assert_eq!(dry.lines_removed, 1);

    writer
        .commit_edit(
            "m/main.tf",
            "\"postgres\"",
            "\"aurora-postgresql\"",
            1,
            Some(&dry.preview_token),
        )
        .unwrap();
    let on_disk = std::fs::read_to_string(dir.path().join("m/main.tf")).unwrap();
    assert!(on_disk.contains("engine = \"aurora-postgresql\""));
}

#[test]
fn test_edit_count_mismatch_is_invalid_content() {
    let (dir, guard) = workspace();
    put(dir.path(), "m/main.tf", MAIN_TF);
    let writer = ConfigWriter::new(guard, true);

    let err = writer.edit("m/main.tf", "\"", "'", 1).unwrap_err();
    assert!(matches!(err, WriteError::InvalidContent { .. }), "{err:?}");
}

#[test]
fn test_edit_of_missing_file_is_not_found() {
    let (_dir, guard) = workspace();
    let writer = ConfigWriter::new(guard, true);

    let err = writer.edit("m/main.tf", "a", "b", 1).unwrap_err();
    assert!(matches!(err, WriteError::Guard(GuardError::NotFound(_))), "{err:?}");
}

// ── output interface ─────────────────────────────────────────────────────────

#[test]
fn test_output_interface_is_fully_replaced() {
    let (dir, guard) = workspace();
    put(dir.path(), "m/facets.yaml", DESCRIPTOR);
    put(
        dir.path(),
        "m/outputs.tf",
        "locals {\n  output_attributes = {\n    stale = true\n  }\n}\n",
    );
    let writer = ConfigWriter::new(guard, true);
    let attributes = object(json!({
        "host": "aws_db_instance.main.address",
        "port": 5432,
        "password": {"value": "random_password.main.result", "sensitive": true},
    }));
    let interfaces = object(json!({}));

    let outcome = writer.write_output_interface("m", &attributes, &interfaces).unwrap();

    assert!(outcome.changed);
    let written = std::fs::read_to_string(dir.path().join("m/outputs.tf")).unwrap();
    assert!(!written.contains("stale"));
    assert!(written.contains("    host = aws_db_instance.main.address\n"), "{written}");
    assert!(written.contains("    port = 5432\n"), "{written}");
    assert!(
        written.contains("    password = sensitive(random_password.main.result)\n"),
        "{written}"
    );
    assert!(written.contains("  output_interfaces = {\n  }\n"), "{written}");
}

#[test]
fn test_output_interface_write_is_idempotent() {
    let (dir, guard) = workspace();
    put(dir.path(), "m/facets.yaml", DESCRIPTOR);
    let writer = ConfigWriter::new(guard, true);
    let attributes = object(json!({"name": "aws_db_instance.main.id"}));

    assert!(writer.write_output_interface("m", &attributes, &Map::new()).unwrap().changed);
    assert!(!writer.write_output_interface("m", &attributes, &Map::new()).unwrap().changed);
}

#[test]
fn test_output_interface_requires_a_descriptor() {
    let (dir, guard) = workspace();
    std::fs::create_dir_all(dir.path().join("m")).unwrap();
    let writer = ConfigWriter::new(guard, true);

    let err = writer
        .write_output_interface("m", &Map::new(), &Map::new())
        .unwrap_err();

    assert!(matches!(err, WriteError::Guard(GuardError::NotFound(_))), "{err:?}");
    assert!(!dir.path().join("m/outputs.tf").exists());
}
