//! Serialise a rewritten tree by splicing its original source.
//!
//! Nothing is reformatted. For every parameter and argument list the entries'
//! span starts, sorted, give the list's original slots. When the entry now at
//! position `k` is not the one whose text occupied slot `k`, the slot is
//! replaced with that entry's own text, itself rendered the same way so lists
//! nested inside moved entries come out rewritten too.

use std::collections::BTreeMap;

use crate::loader::SourceUnit;
use crate::parser::ast::*;
use crate::span::{Span, Spanned};
use crate::visit::{walk_expr, walk_func_type, Visitor};

/// Render a unit's current tree against its source text.
pub fn render_unit(unit: &SourceUnit) -> String {
    render(&unit.source, &unit.file)
}

pub fn render(source: &str, file: &File) -> String {
    let mut lists = ListCollector::default();
    lists.visit_file(file);

    // slot start -> (slot end, entry rendered into the slot)
    let mut splices: BTreeMap<usize, (usize, Span)> = BTreeMap::new();
    for entries in &lists.lists {
        let mut slots = entries.clone();
        slots.sort_by_key(|s| s.start);
        for (slot, entry) in slots.iter().zip(entries) {
            if slot != entry {
                splices.insert(slot.start, (slot.end, *entry));
            }
        }
    }

    Splicer { source, splices: &splices }.range(0, source.len())
}

struct Splicer<'a> {
    source: &'a str,
    splices: &'a BTreeMap<usize, (usize, Span)>,
}

impl Splicer<'_> {
    fn range(&self, start: usize, end: usize) -> String {
        let mut out = String::with_capacity(end - start);
        let mut pos = start;
        for (&slot_start, &(slot_end, entry)) in self.splices.range(start..end) {
            // Slots inside a replaced slot belong to text that is not emitted
            // here; a slot equal to the range is the entry's own old slot.
            if slot_start < pos || (slot_start == start && slot_end == end) {
                continue;
            }
            out.push_str(&self.source[pos..slot_start]);
            out.push_str(&self.range(entry.start, entry.end));
            pos = slot_end;
        }
        out.push_str(&self.source[pos..end]);
        out
    }
}

/// Spans of every reorderable list's entries, in current order.
#[derive(Default)]
struct ListCollector {
    lists: Vec<Vec<Span>>,
}

impl ListCollector {
    fn push<T>(&mut self, entries: &[Spanned<T>]) {
        if entries.len() > 1 {
            self.lists.push(entries.iter().map(|e| e.span).collect());
        }
    }
}

impl Visitor for ListCollector {
    fn visit_func_type(&mut self, sig: &FuncType) {
        self.push(&sig.params);
        walk_func_type(self, sig);
    }

    fn visit_expr(&mut self, expr: &Spanned<Expr>) {
        if let Expr::Call { args, .. } = &expr.node {
            self.push(args);
        }
        walk_expr(self, expr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_file;

    fn first_func(file: &mut File) -> &mut FuncDecl {
        match &mut file.decls[0].node {
            Decl::Func(f) => f,
            _ => panic!("expected func"),
        }
    }

    #[test]
    fn untouched_tree_renders_byte_identical() {
        let src = "package p\n\n// f does things.\nfunc f(a int, /* keep */ b string) {\n\tg(a,\n\t\tb) // trailing\n}\n";
        let file = parse_file(src, 0).unwrap();
        assert_eq!(render(src, &file), src);
    }

    #[test]
    fn swapped_params_keep_separators_and_comments() {
        let src = "package p\nfunc f(a int /* first */, b, c string, h Handle) {}\n";
        let mut file = parse_file(src, 0).unwrap();
        first_func(&mut file).sig.params.swap(0, 2);
        assert_eq!(render(src, &file), "package p\nfunc f(h Handle /* first */, b, c string, a int) {}\n");
    }

    #[test]
    fn nested_lists_inside_moved_entries_are_rendered() {
        let src = "package p\nfunc f() { outer(x, inner(1, y)) }\n";
        let mut file = parse_file(src, 0).unwrap();
        let body = first_func(&mut file).body.as_mut().unwrap();
        let Stmt::Expr(call) = &mut body.node.stmts[0].node else { panic!("expected call") };
        let Expr::Call { args, .. } = &mut call.node else { panic!("expected call") };
        if let Expr::Call { args: inner, .. } = &mut args[1].node {
            inner.swap(0, 1);
        }
        args.swap(0, 1);
        assert_eq!(render(src, &file), "package p\nfunc f() { outer(inner(y, 1), x) }\n");
    }

    #[test]
    fn multiline_argument_lists_keep_layout() {
        let src = "package p\nfunc f() {\n\tcall(\n\t\tfirst,\n\t\tsecond,\n\t)\n}\n";
        let mut file = parse_file(src, 0).unwrap();
        let body = first_func(&mut file).body.as_mut().unwrap();
        let Stmt::Expr(call) = &mut body.node.stmts[0].node else { panic!("expected call") };
        let Expr::Call { args, .. } = &mut call.node else { panic!("expected call") };
        args.swap(0, 1);
        assert_eq!(render(src, &file), "package p\nfunc f() {\n\tcall(\n\t\tsecond,\n\t\tfirst,\n\t)\n}\n");
    }
}
