//! Visitor traversal over parsed Go sources.

use ctxfirst::parser::ast::*;
use ctxfirst::parser::parse_file;
use ctxfirst::span::Spanned;
use ctxfirst::visit::{walk_expr, walk_func_type, walk_type_expr_mut, Visitor, VisitMut};

const SOURCE: &str = r#"package app

import "context"

type Handler interface {
	Serve(ctx context.Context, req []byte) error
}

var table = map[string]func(int) int{
	"double": func(n int) int { return n * 2 },
}

func run(ctx context.Context, h Handler) {
	for i, b := range []byte("xy") {
		go func(i int) {
			_ = h.Serve(ctx, []byte{b})
		}(i)
	}
	select {
	case <-ctx.Done():
	default:
	}
}
"#;

#[derive(Default)]
struct Counts {
    calls: usize,
    func_types: usize,
    func_lits: usize,
}

impl Visitor for Counts {
    fn visit_func_type(&mut self, sig: &FuncType) {
        self.func_types += 1;
        walk_func_type(self, sig);
    }

    fn visit_expr(&mut self, expr: &Spanned<Expr>) {
        match &expr.node {
            Expr::Call { .. } => self.calls += 1,
            Expr::FuncLit { .. } => self.func_lits += 1,
            _ => {}
        }
        walk_expr(self, expr);
    }
}

#[test]
fn visitor_reaches_every_nested_shape() {
    let file = parse_file(SOURCE, 0).unwrap();
    let mut counts = Counts::default();
    counts.visit_file(&file);
    // []byte("xy"), h.Serve(...), []byte{b} is a literal, func(i int){...}(i), ctx.Done()
    assert_eq!(counts.calls, 4);
    // Serve, func(int) int, the two literals, run
    assert_eq!(counts.func_types, 5);
    assert_eq!(counts.func_lits, 2);
}

struct QualifiedRenamer;

impl VisitMut for QualifiedRenamer {
    fn visit_type_expr_mut(&mut self, te: &mut Spanned<TypeExpr>) {
        if let TypeExpr::Qualified { package, .. } = &mut te.node {
            package.node = "ctx".to_string();
        }
        walk_type_expr_mut(self, te);
    }
}

#[derive(Default)]
struct QualifiedCollector(Vec<String>);

impl Visitor for QualifiedCollector {
    fn visit_type_expr(&mut self, te: &Spanned<TypeExpr>) {
        if let TypeExpr::Qualified { package, name } = &te.node {
            self.0.push(format!("{}.{}", package.node, name.node));
        }
        ctxfirst::visit::walk_type_expr(self, te);
    }
}

#[test]
fn visit_mut_reaches_interface_and_param_types() {
    let mut file = parse_file(SOURCE, 0).unwrap();
    QualifiedRenamer.visit_file_mut(&mut file);
    let mut seen = QualifiedCollector::default();
    seen.visit_file(&file);
    assert_eq!(seen.0, ["ctx.Context", "ctx.Context"]);
}
