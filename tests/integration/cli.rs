mod common;

use common::{ctxfirst, project, read, CONTEXT_STUB};

const MAIN: &str = "package main

import \"context\"

func work(n int, ctx context.Context) {}

func main() {
	work(1, context.Background())
}
";

fn app() -> tempfile::TempDir {
    project(&[
        ("go.mod", "module example.com/app\n"),
        ("main.go", MAIN),
        ("stubs/context/context.go", CONTEXT_STUB),
        ("ctxfirst.toml", "stub_paths = [\"stubs\"]\n"),
    ])
}

#[test]
fn check_lists_files_and_fails() {
    let dir = app();
    let output = ctxfirst().arg("check").arg(dir.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("would rewrite"), "{stdout}");
    assert!(stdout.contains("main.go"), "{stdout}");
    assert_eq!(read(dir.path(), "main.go"), MAIN);
}

#[test]
fn rewrite_then_check_is_clean() {
    let dir = app();
    let output = ctxfirst().arg("rewrite").arg(dir.path()).output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let text = read(dir.path(), "main.go");
    assert!(text.contains("func work(ctx context.Context, n int) {}"));
    assert!(text.contains("work(context.Background(), 1)"));
    // Stubs are never rewritten.
    assert_eq!(read(dir.path(), "stubs/context/context.go"), CONTEXT_STUB);

    let output = ctxfirst().arg("check").arg(dir.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn check_emits_json_reports() {
    let dir = app();
    let output = ctxfirst().args(["check", "--format", "json"]).arg(dir.path()).output().unwrap();
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["changed_files"].as_array().unwrap().len(), 1);
    assert_eq!(report["mismatches"].as_array().unwrap().len(), 0);
    assert_eq!(report["written"], false);
}

#[test]
fn dry_run_leaves_files_alone() {
    let dir = app();
    let output = ctxfirst().args(["rewrite", "--dry-run"]).arg(dir.path()).output().unwrap();
    assert!(output.status.success());
    assert_eq!(read(dir.path(), "main.go"), MAIN);
}

#[test]
fn handle_type_flag_replaces_the_configured_set() {
    let dir = app();
    let output = ctxfirst()
        .args(["check", "--handle-type", "example.com/db.Tx"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn invalid_config_is_an_error() {
    let dir = project(&[("main.go", "package main\n"), ("ctxfirst.toml", "handle_types = [\"Context\"]\n")]);
    let output = ctxfirst().arg("check").arg(dir.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Config error"));
}

#[test]
fn stubs_flag_resolves_against_the_working_directory() {
    let dir = project(&[
        ("app/go.mod", "module example.com/app\n"),
        ("app/main.go", MAIN),
        ("shared/context/context.go", CONTEXT_STUB),
    ]);
    let output = ctxfirst()
        .current_dir(dir.path())
        .args(["rewrite", "--stubs", "shared", "app"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(read(dir.path(), "app/main.go").contains("work(context.Background(), 1)"));
    assert_eq!(read(dir.path(), "shared/context/context.go"), CONTEXT_STUB);
}
