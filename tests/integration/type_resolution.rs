//! The resolver as seen through `TypeOracle`.

mod common;

use common::{program, CONTEXT_STUB};
use ctxfirst::span::Span;
use ctxfirst::typeck::{check_program, CallInfo, TypeInfo, TypeOracle};

const DB_STUB: &str = "package db

import \"context\"

type DB struct{}

func Open(dsn string) (*DB, error) { return nil, nil }

func (d *DB) Query(q string, ctx context.Context, args ...any) error { return nil }
";

/// Resolve `app` (file id 2) against the context and db stubs.
fn resolve(app: &str) -> TypeInfo {
    let program = program(
        &[("context", "context.go", CONTEXT_STUB), ("example.com/db", "db.go", DB_STUB), ("example.com/app", "app.go", app)],
        &["context", "example.com/db"],
    );
    check_program(&program)
}

fn span_of(src: &str, needle: &str) -> Span {
    let start = src.find(needle).unwrap_or_else(|| panic!("{needle:?} not in source"));
    Span::with_file(start, start + needle.len(), 2)
}

fn type_at(info: &TypeInfo, src: &str, needle: &str) -> Option<String> {
    info.type_of(span_of(src, needle)).map(|t| t.to_string())
}

fn call_at<'a>(info: &'a TypeInfo, src: &str, needle: &str) -> Option<&'a CallInfo> {
    info.call_info(span_of(src, needle))
}

#[test]
fn multi_value_calls_bind_each_name() {
    let src = "package app\n\nimport \"context\"\n\nfunc f(parent context.Context) {\n\tctx, cancel := context.WithCancel(parent)\n\t_, _ = ctx, cancel\n}\n";
    let info = resolve(src);
    assert_eq!(type_at(&info, src, "ctx").as_deref(), Some("context.Context"));
    assert_eq!(type_at(&info, src, "cancel").as_deref(), Some("context.CancelFunc"));
}

#[test]
fn methods_of_stub_types_carry_callee_facts() {
    let src = "package app\n\nimport (\n\t\"context\"\n\n\t\"example.com/db\"\n)\n\nfunc run(ctx context.Context) error {\n\tconn, err := db.Open(\"dsn\")\n\tif err != nil {\n\t\treturn err\n\t}\n\treturn conn.Query(\"q\", ctx, 1, 2)\n}\n";
    let info = resolve(src);
    let call = call_at(&info, src, "conn.Query(\"q\", ctx, 1, 2)").expect("query call");
    let callee = call.callee.as_ref().expect("declared callee");
    assert_eq!(callee.to_string(), "example.com/db.DB.Query");
    assert_eq!(callee.groups, [1, 1, 1]);
    assert!(call.sig.variadic);
    assert_eq!(call.sig.to_string(), "(string, context.Context, ...interface{}) error");

    let open = call_at(&info, src, "db.Open(\"dsn\")").expect("open call");
    assert_eq!(open.callee.as_ref().unwrap().to_string(), "example.com/db.Open");
}

#[test]
fn interface_methods_of_named_interfaces_are_callees() {
    let src = "package app\n\nimport \"context\"\n\nfunc f(ctx context.Context) any {\n\treturn ctx.Value(1)\n}\n";
    let info = resolve(src);
    let call = call_at(&info, src, "ctx.Value(1)").expect("value call");
    assert_eq!(call.callee.as_ref().unwrap().to_string(), "context.Context.Value");
}

#[test]
fn promoted_fields_resolve_through_embedding() {
    let src = "package app\n\nimport \"context\"\n\ntype Base struct{ ctx context.Context }\n\ntype Req struct {\n\tBase\n\tid int\n}\n\nfunc f(r *Req) any {\n\treturn r.ctx\n}\n";
    let info = resolve(src);
    assert_eq!(type_at(&info, src, "r.ctx").as_deref(), Some("context.Context"));
    assert_eq!(type_at(&info, src, "*Req").as_deref(), Some("*example.com/app.Req"));
}

#[test]
fn aliases_resolve_to_their_target() {
    let src = "package app\n\nimport \"context\"\n\ntype Ctx = context.Context\n\nfunc f(n int, c Ctx) {}\n";
    let info = resolve(src);
    let at = src.find("c Ctx").unwrap() + 2;
    let ty = info.type_of(Span::with_file(at, at + 3, 2)).map(|t| t.to_string());
    assert_eq!(ty.as_deref(), Some("context.Context"));
}

#[test]
fn function_values_have_call_info_without_callee() {
    let src = "package app\n\nfunc apply(f func(int) string) string {\n\treturn f(1)\n}\n";
    let info = resolve(src);
    let call = call_at(&info, src, "f(1)").expect("call through value");
    assert!(call.callee.is_none());
    assert_eq!(type_at(&info, src, "f(1)").as_deref(), Some("string"));
}

#[test]
fn unknown_names_are_absent_and_counted() {
    let src = "package app\n\nfunc f() {\n\tmystery(1)\n}\n";
    let info = resolve(src);
    assert!(call_at(&info, src, "mystery(1)").is_none());
    assert_eq!(type_at(&info, src, "mystery").as_deref(), None);
    assert!(info.unresolved_count() > 0);
}
