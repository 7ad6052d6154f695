mod common;

use std::path::PathBuf;

use common::{project, CONTEXT_STUB};
use ctxfirst::config::Config;
use ctxfirst::diagnostics::Error;
use ctxfirst::loader::{load, LoadOptions};
use ctxfirst::rewrite::{run, RunOptions};

#[test]
fn packages_follow_go_mod_and_directories() {
    let dir = project(&[
        ("go.mod", "module example.com/app\n\ngo 1.22\n"),
        ("main.go", "package main\n"),
        ("internal/store/store.go", "package store\n"),
        ("internal/store/tx.go", "package store\n"),
    ]);
    let program = load(&LoadOptions::new(dir.path())).unwrap();
    let paths: Vec<&str> = program.packages.iter().map(|p| p.import_path.as_str()).collect();
    assert_eq!(paths, ["example.com/app", "example.com/app/internal/store"]);
    assert_eq!(program.package("example.com/app/internal/store").unwrap().units.len(), 2);
    assert!(program.packages.iter().all(|p| p.rewritable));
}

#[test]
fn file_ids_are_deterministic() {
    let dir = project(&[("b.go", "package main\n"), ("a.go", "package main\n"), ("c/c.go", "package c\n")]);
    let first: Vec<(u32, PathBuf)> = load(&LoadOptions::new(dir.path()))
        .unwrap()
        .units()
        .map(|(_, u)| (u.file_id, u.path.clone()))
        .collect();
    let second: Vec<(u32, PathBuf)> = load(&LoadOptions::new(dir.path()))
        .unwrap()
        .units()
        .map(|(_, u)| (u.file_id, u.path.clone()))
        .collect();
    assert_eq!(first, second);
    let mut ids: Vec<u32> = first.iter().map(|(id, _)| *id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 3);
}

#[test]
fn excluded_hidden_and_underscore_dirs_are_skipped() {
    let dir = project(&[
        ("main.go", "package main\n"),
        ("vendor/dep/dep.go", "package dep\n"),
        ("testdata/x.go", "package x\n"),
        (".git/y.go", "package y\n"),
        ("_scratch/z.go", "package z\n"),
        ("notes.txt", "not go"),
    ]);
    let program = load(&LoadOptions::new(dir.path())).unwrap();
    assert_eq!(program.packages.len(), 1);
    assert_eq!(program.units().count(), 1);
}

#[test]
fn test_files_are_optional_and_external_tests_get_their_own_package() {
    let dir = project(&[
        ("go.mod", "module example.com/lib\n"),
        ("lib.go", "package lib\n"),
        ("lib_test.go", "package lib\n"),
        ("api_test.go", "package lib_test\n"),
    ]);
    let program = load(&LoadOptions::new(dir.path())).unwrap();
    assert_eq!(program.package("example.com/lib").unwrap().units.len(), 2);
    assert_eq!(program.package("example.com/lib_test").unwrap().units.len(), 1);

    let opts = LoadOptions { include_tests: false, ..LoadOptions::new(dir.path()) };
    let program = load(&opts).unwrap();
    assert_eq!(program.units().count(), 1);
}

#[test]
fn stub_roots_are_not_rewritable() {
    let dir = project(&[
        ("go.mod", "module example.com/app\n"),
        ("main.go", "package main\n"),
        ("stubs/context/context.go", CONTEXT_STUB),
    ]);
    let opts = LoadOptions { stub_roots: vec![dir.path().join("stubs")], ..LoadOptions::new(dir.path()) };
    let program = load(&opts).unwrap();
    let stub = program.package("context").expect("stub package");
    assert!(!stub.rewritable);
    assert!(program.is_rewritable("example.com/app"));
    // The stub directory is not also loaded as part of the module.
    assert!(program.package("example.com/app/stubs/context").is_none());
}

#[test]
fn bundled_context_fills_in_only_when_nothing_else_provides_it() {
    let main = "package main\n\nimport \"context\"\n";
    let dir = project(&[("main.go", main), ("stubs/context/context.go", CONTEXT_STUB)]);

    let program = load(&LoadOptions::new(dir.path())).unwrap();
    let builtin = program.package("context").expect("bundled package");
    assert!(!builtin.rewritable);
    assert!(builtin.units[0].path.starts_with("<builtin>"));

    let opts = LoadOptions { stub_roots: vec![dir.path().join("stubs")], ..LoadOptions::new(dir.path()) };
    let program = load(&opts).unwrap();
    let stub = program.package("context").unwrap();
    assert_eq!(stub.units[0].path, dir.path().join("stubs/context/context.go"));
    assert_eq!(program.packages.iter().filter(|p| p.import_path == "context").count(), 1);
}

#[test]
fn syntax_errors_stop_the_load() {
    let dir = project(&[("main.go", "package main\n\nfunc f( {\n")]);
    let err = load(&LoadOptions::new(dir.path())).unwrap_err();
    assert!(matches!(err, Error::Syntax { .. }));
}

#[test]
fn missing_root_is_an_io_error() {
    let dir = project(&[]);
    let err = load(&LoadOptions::new(dir.path().join("absent"))).unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
}

const GENERIC: &str = "package app

import \"context\"

type List[T any] struct {
	items []T
}

func (l *List[T]) Each(fn func(T), ctx context.Context) {
	for _, it := range l.items {
		fn(it)
	}
}

type Pair[K comparable, V any] struct {
	Key K
	Val V
}

type Number interface {
	~int | ~int64 | float64
}

func Sum[N Number](xs []N, ctx context.Context) N {
	var total N
	for _, x := range xs {
		total += x
	}
	return total
}

func run(ctx context.Context) {
	l := &List[int]{}
	l.Each(func(n int) {}, ctx)
	_ = Sum[int]([]int{1, 2}, ctx)
	_ = Sum([]float64{1.5}, ctx)
	p := Pair[string, int]{Key: \"a\", Val: 1}
	_ = p
}
";

#[test]
fn generic_sources_load_and_rewrite() {
    let dir = project(&[("go.mod", "module example.com/app\n"), ("list.go", GENERIC)]);
    let program = load(&LoadOptions::new(dir.path())).unwrap();
    let app = program.package("example.com/app").unwrap();
    assert_eq!(app.units[0].file.decls.len(), 6);
    // `context` and `time` come from the bundled packages.
    assert!(program.package("context").is_some_and(|p| !p.rewritable));

    let report = run(&Config::default(), dir.path(), &RunOptions::default()).unwrap();
    assert!(report.mismatches.is_empty(), "{:?}", report.mismatches);
    let text = std::fs::read_to_string(dir.path().join("list.go")).unwrap();
    assert!(text.contains("func (l *List[T]) Each(ctx context.Context, fn func(T)) {"), "{text}");
    assert!(text.contains("func Sum[N Number](ctx context.Context, xs []N) N {"), "{text}");
    assert!(text.contains("l.Each(ctx, func(n int) {})"), "{text}");
    assert!(text.contains("Sum[int](ctx, []int{1, 2})"), "{text}");
    assert!(text.contains("Sum(ctx, []float64{1.5})"), "{text}");
    assert!(text.contains("type List[T any] struct {"));
}
