//! Moves the first handle-typed parameter or argument of each list to the front.
//!
//! Four shapes are rewritten: parameters of function declarations (never the
//! receiver), parameters of function literals, parameters of every interface
//! method, and arguments of calls whose callee has a known signature. In each
//! list the first matching entry is swapped with entry 0; the entries in
//! between keep their positions.

use tracing::debug;

use crate::handles::{is_handle_type, HandleTypeSet};
use crate::parser::ast::*;
use crate::span::{Span, Spanned};
use crate::typeck::TypeOracle;
use crate::visit::{walk_expr_mut, walk_func_decl_mut, walk_type_expr_mut, VisitMut};

/// A list whose entries can be tested one at a time and swapped to the front.
pub trait ReorderableList {
    fn len(&self) -> usize;

    /// Span whose resolved type decides whether entry `i` is a handle.
    fn candidate(&self, i: usize) -> Span;

    fn swap_to_front(&mut self, i: usize);
}

impl ReorderableList for [Spanned<Field>] {
    fn len(&self) -> usize {
        <[_]>::len(self)
    }

    fn candidate(&self, i: usize) -> Span {
        self[i].node.ty.span
    }

    fn swap_to_front(&mut self, i: usize) {
        self.swap(0, i);
    }
}

impl ReorderableList for [Spanned<Expr>] {
    fn len(&self) -> usize {
        <[_]>::len(self)
    }

    fn candidate(&self, i: usize) -> Span {
        self[i].span
    }

    fn swap_to_front(&mut self, i: usize) {
        self.swap(0, i);
    }
}

/// Index of the first handle-typed entry, or 0 when there is none.
pub fn find_handle_index<L, O>(list: &L, oracle: &O, handles: &HandleTypeSet) -> usize
where
    L: ReorderableList + ?Sized,
    O: TypeOracle,
{
    (0..list.len())
        .find(|&i| is_handle_type(list.candidate(i), oracle, handles))
        .unwrap_or(0)
}

/// Swap the first handle-typed entry into position 0. Returns the entry's
/// previous index when a swap happened.
pub fn reposition<L, O>(list: &mut L, oracle: &O, handles: &HandleTypeSet) -> Option<usize>
where
    L: ReorderableList + ?Sized,
    O: TypeOracle,
{
    match find_handle_index(list, oracle, handles) {
        0 => None,
        i => {
            list.swap_to_front(i);
            Some(i)
        }
    }
}

struct Canonicalizer<'a, O> {
    oracle: &'a O,
    handles: &'a HandleTypeSet,
    moved: usize,
}

impl<O: TypeOracle> Canonicalizer<'_, O> {
    fn apply<L: ReorderableList + ?Sized>(&mut self, list: &mut L, at: Span, shape: &str) {
        if let Some(from) = reposition(list, self.oracle, self.handles) {
            debug!(file_id = at.file_id, start = at.start, from, shape, "moved handle to front");
            self.moved += 1;
        }
    }
}

impl<O: TypeOracle> VisitMut for Canonicalizer<'_, O> {
    fn visit_func_decl_mut(&mut self, func: &mut FuncDecl) {
        self.apply(func.sig.params.as_mut_slice(), func.name.span, "func");
        walk_func_decl_mut(self, func);
    }

    fn visit_expr_mut(&mut self, expr: &mut Spanned<Expr>) {
        match &mut expr.node {
            Expr::FuncLit { sig, .. } => {
                self.apply(sig.params.as_mut_slice(), expr.span, "func literal");
            }
            // Conversions, builtins and calls of unknown callees have no call info.
            Expr::Call { args, .. } if self.oracle.call_info(expr.span).is_some() => {
                self.apply(args.as_mut_slice(), expr.span, "call");
            }
            _ => {}
        }
        walk_expr_mut(self, expr);
    }

    fn visit_type_expr_mut(&mut self, te: &mut Spanned<TypeExpr>) {
        if let TypeExpr::Interface(elems) = &mut te.node {
            for elem in elems.iter_mut() {
                if let InterfaceElem::Method { name, sig } = &mut elem.node {
                    self.apply(sig.params.as_mut_slice(), name.span, "interface method");
                }
            }
        }
        walk_type_expr_mut(self, te);
    }
}

/// Canonicalize every list in `file`. Returns true if anything moved.
pub fn canonicalize<O: TypeOracle>(file: &mut File, oracle: &O, handles: &HandleTypeSet) -> bool {
    let mut pass = Canonicalizer { oracle, handles, moved: 0 };
    pass.visit_file_mut(file);
    pass.moved > 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::Program;
    use crate::typeck::check_program;
    use crate::typeck::types::Type;
    use crate::typeck::TypeInfo;

    const CTX: &str = "package context\n\ntype Context interface{}\n";

    fn canon(src: &str) -> (File, bool) {
        let program = Program::from_sources(&[("context", "context.go", CTX), ("example.com/p", "p.go", src)]).unwrap();
        let info = check_program(&program);
        let mut file = program.packages[1].units[0].file.clone();
        let changed = canonicalize(&mut file, &info, &HandleTypeSet::default());
        (file, changed)
    }

    fn param_names(sig: &FuncType) -> Vec<String> {
        sig.params.iter().map(|p| p.node.names.iter().map(|n| n.node.as_str()).collect::<Vec<_>>().join(",")).collect()
    }

    fn func<'f>(file: &'f File, name: &str) -> &'f FuncDecl {
        file.decls
            .iter()
            .find_map(|d| match &d.node {
                Decl::Func(f) if f.name.node == name => Some(f),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn swaps_first_handle_with_front() {
        let (file, changed) =
            canon("package p\nimport \"context\"\nfunc f(a int, b string, ctx context.Context, d bool) {}\n");
        assert!(changed);
        assert_eq!(param_names(&func(&file, "f").sig), ["ctx", "b", "a", "d"]);
    }

    #[test]
    fn receiver_is_never_a_candidate() {
        let (file, changed) =
            canon("package p\nimport \"context\"\ntype S struct{}\nfunc (s S) Run(n int, ctx context.Context) {}\n");
        assert!(changed);
        let run = func(&file, "Run");
        assert_eq!(run.recv.as_ref().unwrap().node.names[0].node, "s");
        assert_eq!(param_names(&run.sig), ["ctx", "n"]);
    }

    #[test]
    fn first_match_wins() {
        let (file, changed) =
            canon("package p\nimport \"context\"\nfunc f(a context.Context, n int, b context.Context) {}\n");
        assert!(!changed);
        assert_eq!(param_names(&func(&file, "f").sig), ["a", "n", "b"]);
    }

    #[test]
    fn calls_without_call_info_are_untouched() {
        let mut file = crate::parser::parse_file("package p\nfunc f() { g(1, h) }\n", 0).unwrap();
        let mut info = TypeInfo::default();
        let Decl::Func(f) = &file.decls[0].node else { unreachable!() };
        let Stmt::Expr(call) = &f.body.as_ref().unwrap().node.stmts[0].node else { unreachable!() };
        let Expr::Call { args, .. } = &call.node else { unreachable!() };
        info.insert(args[1].span, Type::named("context", "Context"));
        assert!(!canonicalize(&mut file, &info, &HandleTypeSet::default()));
    }

    #[test]
    fn reposition_reports_the_old_index() {
        let mut info = TypeInfo::default();
        let args: Vec<Spanned<Expr>> = (0..3)
            .map(|i| Spanned::new(Expr::Ident(format!("x{i}")), Span::with_file(i * 3, i * 3 + 2, 0)))
            .collect();
        info.insert(args[2].span, Type::Pointer(Box::new(Type::named("context", "Context"))));
        let mut list = args.clone();
        assert_eq!(reposition(list.as_mut_slice(), &info, &HandleTypeSet::default()), Some(2));
        assert_eq!(list[0].span, args[2].span);
        assert_eq!(list[1].span, args[1].span);
        assert_eq!(list[2].span, args[0].span);
        assert_eq!(reposition(list.as_mut_slice(), &info, &HandleTypeSet::default()), None);
    }
}
