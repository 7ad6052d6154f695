//! End-to-end rewrites of single files against a stub `context` package.

mod common;

use common::rewrite_with_context;
use ctxfirst::canonicalize_source;
use ctxfirst::handles::HandleTypeSet;

fn header(body: &str) -> String {
    format!("package app\n\nimport \"context\"\n\n{body}")
}

#[test]
fn handle_param_moves_to_front() {
    let (out, changed) = rewrite_with_context(&header("func f(a int, h context.Context) {}\n"));
    assert!(changed);
    assert_eq!(out, header("func f(h context.Context, a int) {}\n"));
}

#[test]
fn handle_argument_moves_to_front() {
    let src = header("func f(h context.Context, a int) {}\n\nfunc g() {\n\tf(0, context.Background())\n}\n");
    let (out, changed) = rewrite_with_context(&src);
    assert!(changed);
    assert!(out.contains("\tf(context.Background(), 0)\n"), "{out}");
}

#[test]
fn lists_without_handles_are_untouched() {
    let src = header("func f(a int, b string) {}\n\nfunc g() {\n\tf(1, \"x\")\n}\n");
    let (out, changed) = rewrite_with_context(&src);
    assert!(!changed);
    assert_eq!(out, src);
}

#[test]
fn only_the_first_handle_counts() {
    let src = header("func f(h1 context.Context, a int, h2 context.Context) {}\n");
    let (out, changed) = rewrite_with_context(&src);
    assert!(!changed);
    assert_eq!(out, src);

    let (out, changed) =
        rewrite_with_context(&header("func g(a int, h1 context.Context, h2 context.Context) {}\n"));
    assert!(changed);
    assert_eq!(out, header("func g(h1 context.Context, a int, h2 context.Context) {}\n"));
}

#[test]
fn repositioning_is_a_swap_not_a_shift() {
    let (out, _) =
        rewrite_with_context(&header("func f(a int, b string, ctx context.Context, d bool) {}\n"));
    assert_eq!(out, header("func f(ctx context.Context, b string, a int, d bool) {}\n"));
}

#[test]
fn grouped_names_move_with_their_field() {
    let (out, _) = rewrite_with_context(&header("func f(a, b int, c1, c2 context.Context) {}\n"));
    assert_eq!(out, header("func f(c1, c2 context.Context, a, b int) {}\n"));
}

#[test]
fn method_receivers_stay_put() {
    let src = header("type Server struct{}\n\nfunc (s *Server) Handle(req string, ctx context.Context) error { return nil }\n");
    let (out, changed) = rewrite_with_context(&src);
    assert!(changed);
    assert!(out.contains("func (s *Server) Handle(ctx context.Context, req string) error"), "{out}");
}

#[test]
fn nested_literals_are_canonicalized_independently() {
    let src = header(
        "func outer(ctx context.Context) {\n\tinner := func(n int, c context.Context) {}\n\tinner(1, ctx)\n}\n",
    );
    let (out, changed) = rewrite_with_context(&src);
    assert!(changed);
    let want = header(
        "func outer(ctx context.Context) {\n\tinner := func(c context.Context, n int) {}\n\tinner(ctx, 1)\n}\n",
    );
    assert_eq!(out, want);
}

#[test]
fn interface_methods_are_independent() {
    let src = header(
        "type Store interface {\n\tGet(key string, ctx context.Context) error\n\tPut(ctx context.Context, key string) error\n\tLen() int\n}\n",
    );
    let (out, changed) = rewrite_with_context(&src);
    assert!(changed);
    let want = header(
        "type Store interface {\n\tGet(ctx context.Context, key string) error\n\tPut(ctx context.Context, key string) error\n\tLen() int\n}\n",
    );
    assert_eq!(out, want);
}

#[test]
fn builtins_and_conversions_are_not_calls() {
    let src = header(
        "func f(ctx context.Context) {\n\tvar xs []any\n\txs = append(xs, ctx)\n\tprintln(1, ctx)\n\t_ = xs\n}\n",
    );
    let (out, changed) = rewrite_with_context(&src);
    assert!(!changed);
    assert_eq!(out, src);
}

#[test]
fn calls_into_unloaded_packages_are_untouched() {
    let src = "package app\n\nimport (\n\t\"context\"\n\t\"net/http\"\n)\n\nfunc f(ctx context.Context) {\n\thttp.Get(\"u\", ctx)\n}\n";
    let (out, changed) = rewrite_with_context(src);
    assert!(!changed);
    assert_eq!(out, src);
}

#[test]
fn pointer_to_handle_matches_but_not_pointer_to_pointer() {
    let handles = HandleTypeSet::default();
    let src = "package app\n\nimport \"github.com/gin-gonic/gin\"\n\nfunc f(n int, c *gin.Context) {}\n\nfunc g(n int, c **gin.Context) {}\n";
    let (out, changed) = canonicalize_source(src, &handles).unwrap();
    assert!(changed);
    assert!(out.contains("func f(c *gin.Context, n int) {}"));
    assert!(out.contains("func g(n int, c **gin.Context) {}"));
}

#[test]
fn function_types_in_type_position_are_untouched() {
    let src = header("type Handler func(n int, ctx context.Context)\n");
    let (out, changed) = rewrite_with_context(&src);
    assert!(!changed);
    assert_eq!(out, src);
}

#[test]
fn canonicalizing_twice_equals_once() {
    let src = header(
        "func f(a int, ctx context.Context) {}\n\nfunc g(b bool, ctx context.Context) {\n\tf(1, ctx)\n\th := func(x string, c context.Context) { f(2, c) }\n\th(\"y\", ctx)\n}\n",
    );
    let (once, changed) = rewrite_with_context(&src);
    assert!(changed);
    let (twice, changed_again) = rewrite_with_context(&once);
    assert!(!changed_again);
    assert_eq!(once, twice);
}

#[test]
fn comments_and_layout_survive() {
    let src = header(
        "// f does work.\nfunc f(\n\ta int, // count\n\tctx context.Context, // deadline\n) {\n\t/* body */\n}\n",
    );
    let (out, _) = rewrite_with_context(&src);
    let want = header(
        "// f does work.\nfunc f(\n\tctx context.Context, // count\n\ta int, // deadline\n) {\n\t/* body */\n}\n",
    );
    assert_eq!(out, want);
}

#[test]
fn custom_handle_types_are_honoured() {
    let handles = HandleTypeSet::new(["example.com/db.Tx"]);
    let src = "package app\n\nimport \"example.com/db\"\n\nfunc save(name string, tx *db.Tx) {}\n";
    let (out, changed) = canonicalize_source(src, &handles).unwrap();
    assert!(changed);
    assert!(out.contains("func save(tx *db.Tx, name string) {}"));
}

#[test]
fn syntax_errors_are_reported() {
    let err = canonicalize_source("package app\nfunc f(a int {}\n", &HandleTypeSet::default()).unwrap_err();
    assert!(err.span().is_some());
}
