//! Property-based tests for path containment and pagination.
//!
//! Uses `proptest` to verify invariants across many random inputs.

use std::path::PathBuf;
use std::sync::Arc;

use modgenie_cli::domain::catalog::{ModuleCatalogEntry, search_page};
use modgenie_cli::domain::descriptor;
use modgenie_cli::domain::error::GuardError;
use proptest::prelude::*;

use crate::helpers::workspace;

// ============================================================================
// PathGuard containment
// ============================================================================

fn segment() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("..".to_string()),
        Just(".".to_string()),
        "[a-z]{1,6}",
        "[a-z]{1,4}\\.tf",
    ]
}

proptest! {
    /// Whatever the input, a resolved path is inside the root; anything else
    /// is a `PathEscape`.
    #[test]
    fn prop_resolved_paths_stay_inside_root(parts in prop::collection::vec(segment(), 1..8)) {
        let (_dir, guard) = workspace();
        let candidate: PathBuf = parts.iter().collect();
        match guard.resolve_for_write(&candidate) {
            Ok(p) => prop_assert!(p.starts_with(guard.root().as_path()), "{} -> {}", candidate.display(), p.display()),
            Err(e) => prop_assert!(matches!(e, GuardError::PathEscape { .. }), "{e:?}"),
        }
    }

    /// Missing directories, `..` and a symlink pointing out of the root never
    /// combine into a path that reaches through the symlink.
    #[cfg(unix)]
    #[test]
    fn prop_symlink_out_of_root_is_never_reachable(
        parts in prop::collection::vec(
            prop_oneof![
                Just("..".to_string()),
                Just("nope".to_string()),
                Just("link".to_string()),
                Just("m".to_string()),
                "[a-z]{1,4}\\.tf",
            ],
            1..8,
        )
    ) {
        let (dir, guard) = workspace();
        let outside = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("m")).unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();
        let outside = outside.path().canonicalize().unwrap();

        let candidate: PathBuf = parts.iter().collect();
        for result in [guard.resolve_for_write(&candidate), guard.resolve(&candidate)] {
            match result {
                Ok(p) => {
                    prop_assert!(p.starts_with(guard.root().as_path()), "{} -> {}", candidate.display(), p.display());
                    prop_assert!(!p.starts_with(guard.root().as_path().join("link")), "{} -> {}", candidate.display(), p.display());
                    prop_assert!(!p.starts_with(&outside));
                }
                Err(e) => prop_assert!(
                    matches!(e, GuardError::PathEscape { .. } | GuardError::NotFound(_)),
                    "{e:?}"
                ),
            }
        }
    }

    /// Climbing above the root by more levels than the path descends is
    /// always rejected.
    #[test]
    fn prop_net_climb_is_rejected(down in 0usize..4, extra in 1usize..4) {
        let (_dir, guard) = workspace();
        let mut candidate = PathBuf::new();
        for i in 0..down {
            candidate.push(format!("d{i}"));
        }
        for _ in 0..down + extra {
            candidate.push("..");
        }
        candidate.push("x.tf");
        let err = guard.resolve_for_write(&candidate).unwrap_err();
        prop_assert!(matches!(err, GuardError::PathEscape { .. }), "{err:?}");
    }
}

// ============================================================================
// search_page
// ============================================================================

fn entries(n: usize) -> Vec<Arc<ModuleCatalogEntry>> {
    (0..n)
        .map(|i| {
            let text = format!("intent: m{i:03}\nflavor: default\nversion: '1'\n");
            Arc::new(ModuleCatalogEntry {
                module_path: PathBuf::from(format!("m{i:03}")),
                absolute_path: PathBuf::from(format!("/w/m{i:03}")),
                descriptor: descriptor::parse(&text).expect("descriptor"),
                descriptor_text: text,
                output_interface: None,
            })
        })
        .collect()
}

proptest! {
    /// Pages never overlap and together cover every match exactly once.
    #[test]
    fn prop_pages_partition_the_matches(n in 0usize..60, size in 1usize..15) {
        let all = entries(n);
        let mut seen = Vec::new();
        let mut page = 0;
        loop {
            let result = search_page(&all, "", page, size);
            prop_assert_eq!(result.total_count, n);
            prop_assert!(result.matches.len() <= size);
            seen.extend(result.matches.iter().map(|e| e.module_path.clone()));
            if !result.has_more {
                break;
            }
            page += 1;
        }
        let expected: Vec<_> = all.iter().map(|e| e.module_path.clone()).collect();
        prop_assert_eq!(seen, expected);
    }

    /// `has_more` is true exactly when later pages hold matches.
    #[test]
    fn prop_has_more_matches_remaining(n in 0usize..60, size in 1usize..15, page in 0usize..10) {
        let result = search_page(&entries(n), "", page, size);
        prop_assert_eq!(result.has_more, (page + 1) * size < n);
    }
}
