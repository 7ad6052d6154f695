//! Post-rewrite check that call sites still line up with their callees.
//!
//! The rewrite moves the first handle-typed *field* of a declaration but the
//! first handle-typed *argument* of a call. These disagree when a grouped field
//! precedes the handle (`func f(a, b int, ctx Ctx)` becomes
//! `(ctx Ctx, a, b int)` while `f(1, 2, ctx)` becomes `f(ctx, 2, 1)`), or when
//! the callee lives in a package that is never rewritten. Function types are
//! never rewritten either, so a call through a function-typed value must keep
//! its argument order.

use std::path::PathBuf;

use rayon::prelude::*;
use serde::Serialize;
use tracing::warn;

use crate::handles::HandleTypeSet;
use crate::loader::{Program, SourceUnit};
use crate::parser::ast::Expr;
use crate::span::{Span, Spanned};
use crate::typeck::types::Signature;
use crate::typeck::{TypeInfo, TypeOracle};
use crate::visit::{walk_expr, Visitor};

/// A call whose arguments are not in the order its callee's parameters now are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    pub path: PathBuf,
    /// 1-based line of the call.
    pub line: usize,
    pub span: Span,
    pub callee: String,
    /// Original argument index expected at each position.
    pub expected: Vec<usize>,
    /// Original argument index found at each position.
    pub actual: Vec<usize>,
}

/// Check every call in the rewritable packages of `program`, whose trees are
/// assumed already canonicalized. `info` must be the oracle computed before
/// rewriting.
pub fn check_call_sites(program: &Program, info: &TypeInfo, handles: &HandleTypeSet) -> Vec<Mismatch> {
    let units: Vec<&SourceUnit> =
        program.packages.iter().filter(|p| p.rewritable).flat_map(|p| &p.units).collect();
    let mismatches: Vec<Mismatch> = units
        .par_iter()
        .flat_map_iter(|unit| {
            let mut checker = CallChecker { program, info, handles, unit, found: Vec::new() };
            checker.visit_file(&unit.file);
            checker.found
        })
        .collect();
    for m in &mismatches {
        warn!(
            path = %m.path.display(),
            line = m.line,
            callee = %m.callee,
            expected = ?m.expected,
            actual = ?m.actual,
            "call arguments disagree with parameter order"
        );
    }
    mismatches
}

struct CallChecker<'a> {
    program: &'a Program,
    info: &'a TypeInfo,
    handles: &'a HandleTypeSet,
    unit: &'a SourceUnit,
    found: Vec<Mismatch>,
}

impl CallChecker<'_> {
    fn check_call(&mut self, span: Span, func: &Spanned<Expr>, args: &[Spanned<Expr>], spread: bool) {
        let Some(call) = self.info.call_info(span) else { return };
        let (expected, name) = match &call.callee {
            Some(callee) => {
                let rewritten = self.program.is_rewritable(&callee.package);
                let order = expected_order(&callee.sig, &callee.groups, args.len(), spread, rewritten, self.handles);
                (order, callee.to_string())
            }
            None if call.through_type => {
                let groups = vec![1; call.sig.params.len()];
                let order = expected_order(&call.sig, &groups, args.len(), spread, false, self.handles);
                let text = self.unit.source.get(func.span.range()).unwrap_or_default();
                (order, text.to_string())
            }
            // Literal parameters move with their calls.
            None => return,
        };
        let Some(expected) = expected else { return };
        let actual = original_order(args);
        if expected != actual {
            self.found.push(Mismatch {
                path: self.unit.path.clone(),
                line: line_of(&self.unit.source, span.start),
                span,
                callee: name,
                expected,
                actual,
            });
        }
    }
}

impl Visitor for CallChecker<'_> {
    fn visit_expr(&mut self, expr: &Spanned<Expr>) {
        if let Expr::Call { func, args, spread } = &expr.node {
            self.check_call(expr.span, func, args, *spread);
        }
        walk_expr(self, expr);
    }
}

/// For each position, the original index of the argument now there.
fn original_order(args: &[Spanned<Expr>]) -> Vec<usize> {
    let mut starts: Vec<usize> = args.iter().map(|a| a.span.start).collect();
    starts.sort_unstable();
    args.iter()
        .map(|a| starts.binary_search(&a.span.start).unwrap_or_default())
        .collect()
}

/// The argument order implied by the callee's declaration after rewriting, or
/// `None` when the call cannot be judged from its arguments alone. `groups`
/// holds the number of names in each declared field.
fn expected_order(
    sig: &Signature,
    groups: &[usize],
    nargs: usize,
    spread: bool,
    rewritten: bool,
    handles: &HandleTypeSet,
) -> Option<Vec<usize>> {
    let params = &sig.params;
    let variadic = sig.variadic;
    if variadic && spread {
        return None;
    }
    if (!variadic && nargs != params.len()) || (variadic && nargs + 1 < params.len()) {
        return None;
    }

    // Original position range of each declared field.
    let mut fields = Vec::with_capacity(groups.len());
    let mut offset = 0;
    for &size in groups {
        fields.push(offset..offset + size);
        offset += size;
    }
    if offset != params.len() {
        return None;
    }
    // The variadic field stays last and expands to the call's tail.
    let fixed = if variadic { fields.len().saturating_sub(1) } else { fields.len() };

    let handle_field = if rewritten {
        fields[..fixed].iter().position(|f| handles.matches(&params[f.start])).unwrap_or(0)
    } else {
        0
    };
    if handle_field > 0 {
        fields.swap(0, handle_field);
    }

    let mut order: Vec<usize> = fields[..fixed].iter().flat_map(|f| f.clone()).collect();
    order.extend(order.len()..nargs);
    Some(order)
}

fn line_of(source: &str, offset: usize) -> usize {
    source.as_bytes()[..offset.min(source.len())].iter().filter(|&&b| b == b'\n').count() + 1
}
