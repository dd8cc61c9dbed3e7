//! The module tool adapter, driven through a fake `CommandRunner`.

use modgenie_cli::application::services::external_tool::{
    ExternalTool, GenerateRequest, PreviewOptions,
};
use modgenie_cli::domain::config::ToolConfig;
use modgenie_cli::domain::error::{GuardError, ToolError};

use crate::helpers::{DESCRIPTOR, FakeRunner, err_output, ok_output, put, workspace};

fn config() -> ToolConfig {
    ToolConfig::default()
}

#[tokio::test]
async fn test_validate_passes_directory_and_check_only() {
    let (dir, guard) = workspace();
    put(dir.path(), "m/facets.yaml", DESCRIPTOR);
    put(dir.path(), "m/main.tf", "resource \"null_resource\" \"x\" {}\n");
    let runner = FakeRunner::new().with("ftf", ok_output(b"module is valid\n"));
    let tool = ExternalTool::new(&runner, guard.clone(), &config());

    let outcome = tool.validate("m".as_ref(), true).await.unwrap();

    assert!(outcome.success());
    assert_eq!(outcome.stdout, "module is valid\n");
    let calls = runner.calls();
    assert_eq!(calls.len(), 1);
    let (program, args, cwd) = &calls[0];
    assert_eq!(program, "ftf");
    assert_eq!(args[0], "validate-directory");
    assert_eq!(args[2], "--check-only");
    assert_eq!(cwd, &guard.root().as_path().join("m"));
}

#[tokio::test]
async fn test_provider_block_fails_validation_before_the_tool_runs() {
    let (dir, guard) = workspace();
    put(dir.path(), "m/facets.yaml", DESCRIPTOR);
    put(dir.path(), "m/providers.tf", "provider \"aws\" {\n  region = \"eu-west-1\"\n}\n");
    let runner = FakeRunner::new().with("ftf", ok_output(b""));
    let tool = ExternalTool::new(&runner, guard, &config());

    let err = tool.validate("m".as_ref(), false).await.unwrap_err();

    match &err {
        ToolError::ValidationFailed { stderr, .. } => assert!(stderr.contains("providers.tf:1"), "{stderr}"),
        other => panic!("expected ValidationFailed, got {other:?}"),
    }
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn test_non_zero_exit_is_validation_failed_with_output() {
    let (dir, guard) = workspace();
    put(dir.path(), "m/facets.yaml", DESCRIPTOR);
    let runner = FakeRunner::new().with("ftf", err_output(1, b"spec.type missing"));
    let tool = ExternalTool::new(&runner, guard, &config());

    let err = tool.validate("m".as_ref(), false).await.unwrap_err();

    assert_eq!(err.code(), "validation_failed");
    assert!(err.to_string().contains("spec.type missing"));
}

#[tokio::test]
async fn test_missing_binary_is_unavailable_not_a_panic() {
    let (dir, guard) = workspace();
    put(dir.path(), "m/facets.yaml", DESCRIPTOR);
    let runner = FakeRunner::new().missing("ftf");
    let tool = ExternalTool::new(&runner, guard, &config());

    let err = tool.validate("m".as_ref(), false).await.unwrap_err();

    assert!(matches!(err, ToolError::Unavailable { .. }), "{err:?}");
    assert_eq!(err.code(), "tool_unavailable");
}

#[tokio::test]
async fn test_directory_outside_root_never_reaches_the_runner() {
    let (_dir, guard) = workspace();
    let runner = FakeRunner::new().with("ftf", ok_output(b""));
    let tool = ExternalTool::new(&runner, guard, &config());

    let err = tool.validate("../".as_ref(), false).await.unwrap_err();

    assert!(matches!(err, ToolError::Guard(GuardError::PathEscape { .. })), "{err:?}");
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn test_generate_builds_flags_in_order() {
    let (dir, guard) = workspace();
    std::fs::create_dir_all(dir.path().join("modules")).unwrap();
    let runner = FakeRunner::new().with("ftf", ok_output(b"generated\n"));
    let tool = ExternalTool::new(&runner, guard, &config());

    let request = GenerateRequest {
        intent: "redis".into(),
        flavor: "elasticache".into(),
        cloud: "aws".into(),
        title: "Redis".into(),
        description: "Managed Redis".into(),
        directory: "modules".into(),
    };
    tool.generate(&request).await.unwrap();

    let args = &runner.args_for("ftf")[0];
    assert_eq!(
        &args[..11],
        &[
            "generate-module", "-i", "redis", "-f", "elasticache", "-c", "aws", "-t", "Redis",
            "-d", "Managed Redis",
        ]
    );
}

#[tokio::test]
async fn test_generate_failure_is_generation_failed() {
    let (dir, guard) = workspace();
    std::fs::create_dir_all(dir.path().join("modules")).unwrap();
    let runner = FakeRunner::new().with("ftf", err_output(2, b"intent already exists"));
    let tool = ExternalTool::new(&runner, guard, &config());

    let request = GenerateRequest {
        directory: "modules".into(),
        ..GenerateRequest::default()
    };
    let err = tool.generate(&request).await.unwrap_err();
    assert_eq!(err.code(), "generation_failed");
}

#[tokio::test]
async fn test_preview_discovers_git_details() {
    let (dir, guard) = workspace();
    put(dir.path(), "m/facets.yaml", DESCRIPTOR);
    let runner = FakeRunner::new()
        .with("ftf", ok_output(b"preview registered\n"))
        .with("git", ok_output(b"git@example.com:infra/modules.git\n"));
    let tool = ExternalTool::new(&runner, guard, &config());

    let options = PreviewOptions {
        auto_create_intent: true,
        ..PreviewOptions::default()
    };
    tool.preview("m".as_ref(), &options).await.unwrap();

    assert_eq!(runner.args_for("git").len(), 2);
    let args = &runner.args_for("ftf")[0];
    assert_eq!(args[0], "preview-module");
    assert!(args.contains(&"-a".to_string()));
    let g = args.iter().position(|a| a == "-g").expect("-g flag");
    assert_eq!(args[g + 1], "git@example.com:infra/modules.git");
    assert!(!args.contains(&"--publish".to_string()));
}

#[tokio::test]
async fn test_preview_omits_git_flags_when_git_fails() {
    let (dir, guard) = workspace();
    put(dir.path(), "m/facets.yaml", DESCRIPTOR);
    let runner = FakeRunner::new()
        .with("ftf", ok_output(b""))
        .with("git", err_output(128, b"not a git repository"));
    let tool = ExternalTool::new(&runner, guard, &config());

    tool.preview("m".as_ref(), &PreviewOptions::default()).await.unwrap();

    let args = &runner.args_for("ftf")[0];
    assert!(!args.contains(&"-g".to_string()));
    assert!(!args.contains(&"-r".to_string()));
}

#[tokio::test]
async fn test_explicit_git_details_skip_discovery() {
    let (dir, guard) = workspace();
    put(dir.path(), "m/facets.yaml", DESCRIPTOR);
    let runner = FakeRunner::new().with("ftf", ok_output(b""));
    let tool = ExternalTool::new(&runner, guard, &config());

    let options = PreviewOptions {
        git_url: Some("https://example.com/repo.git".into()),
        git_ref: Some("main".into()),
        publish: true,
        ..PreviewOptions::default()
    };
    tool.preview("m".as_ref(), &options).await.unwrap();

    assert!(runner.args_for("git").is_empty());
    let args = &runner.args_for("ftf")[0];
    assert!(args.ends_with(&[
        "-g".to_string(),
        "https://example.com/repo.git".to_string(),
        "-r".to_string(),
        "main".to_string(),
        "--publish".to_string(),
    ]));
}

#[cfg(unix)]
#[tokio::test]
async fn test_tf_symlink_leaving_the_root_is_skipped_by_the_provider_check() {
    let (dir, guard) = workspace();
    put(dir.path(), "m/facets.yaml", DESCRIPTOR);
    let outside = tempfile::tempdir().unwrap();
    put(outside.path(), "providers.tf", "provider \"aws\" {}\n");
    std::os::unix::fs::symlink(outside.path().join("providers.tf"), dir.path().join("m/providers.tf")).unwrap();
    let runner = FakeRunner::new().with("ftf", ok_output(b"module is valid\n"));
    let tool = ExternalTool::new(&runner, guard, &config());

    let outcome = tool.validate("m".as_ref(), false).await.unwrap();

    assert!(outcome.success());
    assert_eq!(runner.calls().len(), 1);
}
