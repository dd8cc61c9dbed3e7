//! Guarded module file listing and reading.

use std::path::PathBuf;

use modgenie_cli::application::services::module_files::{list_files, read_file};
use modgenie_cli::domain::error::GuardError;

use crate::helpers::{DESCRIPTOR, put, workspace};

#[test]
fn test_list_is_relative_sorted_and_skips_terraform_state() {
    let (dir, guard) = workspace();
    put(dir.path(), "m/facets.yaml", DESCRIPTOR);
    put(dir.path(), "m/main.tf", "");
    put(dir.path(), "m/templates/user_data.sh", "");
    put(dir.path(), "m/.terraform/providers/lock", "");

    let files = list_files(&guard, "m").unwrap();

    assert_eq!(
        files,
        vec![
            PathBuf::from("facets.yaml"),
            PathBuf::from("main.tf"),
            PathBuf::from("templates/user_data.sh"),
        ]
    );
}

#[test]
fn test_listing_outside_root_is_rejected() {
    let (_dir, guard) = workspace();
    let err = list_files(&guard, "..").unwrap_err();
    assert!(matches!(err, GuardError::PathEscape { .. }), "{err:?}");
}

#[test]
fn test_read_returns_root_relative_path() {
    let (dir, guard) = workspace();
    put(dir.path(), "m/facets.yaml", DESCRIPTOR);

    let file = read_file(&guard, "m/./facets.yaml").unwrap();

    assert_eq!(file.path, PathBuf::from("m/facets.yaml"));
    assert_eq!(file.content, DESCRIPTOR);
}

#[test]
fn test_read_missing_is_not_found() {
    let (_dir, guard) = workspace();
    let err = read_file(&guard, "m/variables.tf").unwrap_err();
    assert!(matches!(err, GuardError::NotFound(_)));
    assert_eq!(err.code(), "not_found");
}
