mod common;

use common::{program, rewrite, CONTEXT_STUB};
use ctxfirst::consistency::check_call_sites;
use ctxfirst::handles::HandleTypeSet;

const STORE_STUB: &str = "package store

import \"context\"

type Store struct{}

func (s *Store) Get(key string, ctx context.Context) error { return nil }
";

fn check(app: &str) -> Vec<ctxfirst::consistency::Mismatch> {
    let handles = HandleTypeSet::default();
    let mut program = program(
        &[("context", "context.go", CONTEXT_STUB), ("example.com/store", "store.go", STORE_STUB), ("example.com/app", "app.go", app)],
        &["context", "example.com/store"],
    );
    let (info, _) = rewrite(&mut program, &handles);
    check_call_sites(&program, &info, &handles)
}

#[test]
fn consistent_rewrites_report_nothing() {
    let src = "package app\n\nimport \"context\"\n\nfunc f(n int, ctx context.Context) {}\n\nfunc g(ctx context.Context) {\n\tf(1, ctx)\n}\n";
    assert!(check(src).is_empty());
}

#[test]
fn grouped_parameters_are_reported() {
    let src = "package app\n\nimport \"context\"\n\nfunc f(a, b int, ctx context.Context) {}\n\nfunc g(ctx context.Context) {\n\tf(1, 2, ctx)\n}\n";
    let found = check(src);
    assert_eq!(found.len(), 1);
    let m = &found[0];
    assert_eq!(m.callee, "example.com/app.f");
    assert_eq!(m.line, 8);
    assert_eq!(m.expected, [2, 0, 1]);
    assert_eq!(m.actual, [2, 1, 0]);
}

#[test]
fn stub_callees_keep_their_order() {
    let src = "package app\n\nimport (\n\t\"context\"\n\n\t\"example.com/store\"\n)\n\nfunc g(ctx context.Context, s *store.Store) error {\n\treturn s.Get(\"k\", ctx)\n}\n";
    let found = check(src);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].callee, "example.com/store.Store.Get");
    assert_eq!(found[0].expected, [0, 1]);
    assert_eq!(found[0].actual, [1, 0]);
}

#[test]
fn handles_passed_to_non_handle_params_are_reported() {
    let src = "package app\n\nimport \"context\"\n\nfunc log(msg string, v any) {}\n\nfunc g(ctx context.Context) {\n\tlog(\"m\", ctx)\n}\n";
    let found = check(src);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].expected, [0, 1]);
}

#[test]
fn spread_calls_are_not_judged() {
    let src = "package app\n\nimport \"context\"\n\nfunc all(ctx context.Context, xs ...any) {}\n\nfunc g(ctx context.Context, xs []any) {\n\tall(ctx, xs...)\n}\n";
    assert!(check(src).is_empty());
}

#[test]
fn calls_through_function_types_keep_their_order() {
    let src = "package app\n\nimport \"context\"\n\ntype Handler func(n int, ctx context.Context)\n\nfunc serve(ctx context.Context, h Handler, f func(int, context.Context)) {\n\th(1, ctx)\n\tf(2, ctx)\n}\n";
    let found = check(src);
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].callee, "h");
    assert_eq!(found[0].line, 8);
    assert_eq!(found[0].expected, [0, 1]);
    assert_eq!(found[0].actual, [1, 0]);
    assert_eq!(found[1].callee, "f");
    assert_eq!(found[1].line, 9);
}

#[test]
fn locals_bound_to_literals_and_functions_move_with_their_calls() {
    let src = "package app\n\nimport \"context\"\n\nfunc f(n int, ctx context.Context) {}\n\nfunc g(ctx context.Context) {\n\th := func(n int, c context.Context) {}\n\th(1, ctx)\n\tfunc(n int, c context.Context) {}(2, ctx)\n\tw := f\n\tw(3, ctx)\n\tvar v = f\n\tv(4, ctx)\n}\n";
    assert!(check(src).is_empty());
}

#[test]
fn locals_bound_to_stub_methods_are_judged_against_them() {
    let src = "package app\n\nimport (\n\t\"context\"\n\n\t\"example.com/store\"\n)\n\nfunc g(ctx context.Context, s *store.Store) {\n\tget := s.Get\n\tget(\"k\", ctx)\n}\n";
    let found = check(src);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].callee, "example.com/store.Store.Get");
}

#[test]
fn mismatches_serialize_to_json() {
    let src = "package app\n\nimport \"context\"\n\nfunc f(a, b int, ctx context.Context) {}\n\nfunc g(ctx context.Context) {\n\tf(1, 2, ctx)\n}\n";
    let json = serde_json::to_value(check(src)).unwrap();
    assert_eq!(json[0]["callee"], "example.com/app.f");
    assert_eq!(json[0]["expected"], serde_json::json!([2, 0, 1]));
}
