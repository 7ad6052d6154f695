//! AST visitor infrastructure
//!
//! Two visitor traits and their walk functions:
//!
//! - `Visitor`: immutable traversal (collection passes such as the renderer)
//! - `VisitMut`: mutable traversal (in-place passes such as the canonicalizer)
//!
//! Override only the methods you need and call the matching `walk_*` function
//! inside the override to keep recursing. Omitting the walk call prunes the
//! traversal at that node.
//!
//! ```rust
//! use ctxfirst::visit::{Visitor, walk_expr};
//! use ctxfirst::parser::ast::Expr;
//! use ctxfirst::span::Spanned;
//!
//! #[derive(Default)]
//! struct CallCounter {
//!     calls: usize,
//! }
//!
//! impl Visitor for CallCounter {
//!     fn visit_expr(&mut self, expr: &Spanned<Expr>) {
//!         if let Expr::Call { .. } = &expr.node {
//!             self.calls += 1;
//!         }
//!         walk_expr(self, expr);
//!     }
//! }
//! ```

use crate::parser::ast::*;
use crate::span::Spanned;

// ============================================================================
// Visitor Trait (Read-Only)
// ============================================================================

/// Read-only AST visitor. Default implementations recurse into all children.
pub trait Visitor: Sized {
    fn visit_file(&mut self, file: &File) {
        walk_file(self, file);
    }

    fn visit_decl(&mut self, decl: &Decl) {
        walk_decl(self, decl);
    }

    fn visit_func_decl(&mut self, func: &FuncDecl) {
        walk_func_decl(self, func);
    }

    fn visit_func_type(&mut self, sig: &FuncType) {
        walk_func_type(self, sig);
    }

    fn visit_field(&mut self, field: &Spanned<Field>) {
        walk_field(self, field);
    }

    fn visit_block(&mut self, block: &Spanned<Block>) {
        walk_block(self, block);
    }

    fn visit_stmt(&mut self, stmt: &Spanned<Stmt>) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Spanned<Expr>) {
        walk_expr(self, expr);
    }

    fn visit_type_expr(&mut self, te: &Spanned<TypeExpr>) {
        walk_type_expr(self, te);
    }
}

// ============================================================================
// Walk Functions (Read-Only)
// ============================================================================

pub fn walk_file<V: Visitor>(v: &mut V, file: &File) {
    for decl in &file.decls {
        v.visit_decl(&decl.node);
    }
}

pub fn walk_decl<V: Visitor>(v: &mut V, decl: &Decl) {
    match decl {
        Decl::Func(func) => v.visit_func_decl(func),
        Decl::Type(specs) => {
            for spec in specs {
                for param in &spec.node.type_params {
                    v.visit_field(param);
                }
                v.visit_type_expr(&spec.node.ty);
            }
        }
        Decl::Var(specs) | Decl::Const(specs) => {
            for spec in specs {
                walk_value_spec(v, &spec.node);
            }
        }
    }
}

fn walk_value_spec<V: Visitor>(v: &mut V, spec: &ValueSpec) {
    if let Some(ty) = &spec.ty {
        v.visit_type_expr(ty);
    }
    for value in &spec.values {
        v.visit_expr(value);
    }
}

pub fn walk_func_decl<V: Visitor>(v: &mut V, func: &FuncDecl) {
    if let Some(recv) = &func.recv {
        v.visit_field(recv);
    }
    for param in &func.type_params {
        v.visit_field(param);
    }
    v.visit_func_type(&func.sig);
    if let Some(body) = &func.body {
        v.visit_block(body);
    }
}

pub fn walk_func_type<V: Visitor>(v: &mut V, sig: &FuncType) {
    for field in sig.params.iter().chain(&sig.results) {
        v.visit_field(field);
    }
}

pub fn walk_field<V: Visitor>(v: &mut V, field: &Spanned<Field>) {
    v.visit_type_expr(&field.node.ty);
}

pub fn walk_block<V: Visitor>(v: &mut V, block: &Spanned<Block>) {
    for stmt in &block.node.stmts {
        v.visit_stmt(stmt);
    }
}

fn walk_stmts<V: Visitor>(v: &mut V, stmts: &[Spanned<Stmt>]) {
    for stmt in stmts {
        v.visit_stmt(stmt);
    }
}

pub fn walk_stmt<V: Visitor>(v: &mut V, stmt: &Spanned<Stmt>) {
    match &stmt.node {
        Stmt::Block(block) => walk_stmts(v, &block.stmts),
        Stmt::Expr(expr) | Stmt::Go(expr) | Stmt::Defer(expr) => v.visit_expr(expr),
        Stmt::Define { lhs, rhs } | Stmt::Assign { lhs, rhs, .. } => {
            for e in lhs.iter().chain(rhs) {
                v.visit_expr(e);
            }
        }
        Stmt::IncDec { target, .. } => v.visit_expr(target),
        Stmt::Send { channel, value } => {
            v.visit_expr(channel);
            v.visit_expr(value);
        }
        Stmt::Decl(decl) => v.visit_decl(decl),
        Stmt::Return(values) => {
            for e in values {
                v.visit_expr(e);
            }
        }
        Stmt::If { init, cond, then_block, else_branch } => {
            if let Some(init) = init {
                v.visit_stmt(init);
            }
            v.visit_expr(cond);
            v.visit_block(then_block);
            if let Some(else_branch) = else_branch {
                v.visit_stmt(else_branch);
            }
        }
        Stmt::For { init, cond, post, body } => {
            if let Some(init) = init {
                v.visit_stmt(init);
            }
            if let Some(cond) = cond {
                v.visit_expr(cond);
            }
            if let Some(post) = post {
                v.visit_stmt(post);
            }
            v.visit_block(body);
        }
        Stmt::Range { key, value, expr, body, .. } => {
            for e in key.iter().chain(value) {
                v.visit_expr(e);
            }
            v.visit_expr(expr);
            v.visit_block(body);
        }
        Stmt::Switch { init, tag, clauses } => {
            if let Some(init) = init {
                v.visit_stmt(init);
            }
            if let Some(tag) = tag {
                v.visit_expr(tag);
            }
            for clause in clauses {
                for e in &clause.node.exprs {
                    v.visit_expr(e);
                }
                walk_stmts(v, &clause.node.body);
            }
        }
        Stmt::TypeSwitch { init, subject, clauses, .. } => {
            if let Some(init) = init {
                v.visit_stmt(init);
            }
            v.visit_expr(subject);
            for clause in clauses {
                for te in &clause.node.types {
                    v.visit_type_expr(te);
                }
                walk_stmts(v, &clause.node.body);
            }
        }
        Stmt::Select { clauses } => {
            for clause in clauses {
                if let Some(comm) = &clause.node.comm {
                    v.visit_stmt(comm);
                }
                walk_stmts(v, &clause.node.body);
            }
        }
        Stmt::Labeled { stmt, .. } => v.visit_stmt(stmt),
        Stmt::Branch { .. } | Stmt::Empty => {}
    }
}

pub fn walk_expr<V: Visitor>(v: &mut V, expr: &Spanned<Expr>) {
    match &expr.node {
        Expr::Ident(_)
        | Expr::IntLit(_)
        | Expr::FloatLit(_)
        | Expr::ImagLit(_)
        | Expr::RuneLit(_)
        | Expr::StringLit(_) => {}
        Expr::Selector { object, .. } => v.visit_expr(object),
        Expr::Call { func, args, .. } => {
            v.visit_expr(func);
            for arg in args {
                v.visit_expr(arg);
            }
        }
        Expr::Index { object, index } => {
            v.visit_expr(object);
            v.visit_expr(index);
        }
        Expr::Instance { object, args } => {
            v.visit_expr(object);
            for arg in args {
                v.visit_expr(arg);
            }
        }
        Expr::Slice { object, low, high, max } => {
            v.visit_expr(object);
            for e in [low, high, max].into_iter().flatten() {
                v.visit_expr(e);
            }
        }
        Expr::TypeAssert { object, ty } => {
            v.visit_expr(object);
            v.visit_type_expr(ty);
        }
        Expr::Unary { operand, .. } => v.visit_expr(operand),
        Expr::Binary { lhs, rhs, .. } => {
            v.visit_expr(lhs);
            v.visit_expr(rhs);
        }
        Expr::Paren(inner) => v.visit_expr(inner),
        Expr::FuncLit { sig, body } => {
            v.visit_func_type(sig);
            v.visit_block(body);
        }
        Expr::Composite { ty, elements } => {
            if let Some(ty) = ty {
                v.visit_type_expr(ty);
            }
            for e in elements {
                v.visit_expr(e);
            }
        }
        Expr::KeyValue { key, value } => {
            v.visit_expr(key);
            v.visit_expr(value);
        }
        Expr::Type(te) => v.visit_type_expr(te),
    }
}

pub fn walk_type_expr<V: Visitor>(v: &mut V, te: &Spanned<TypeExpr>) {
    match &te.node {
        TypeExpr::Named(_) | TypeExpr::Qualified { .. } => {}
        TypeExpr::Pointer(inner)
        | TypeExpr::Slice(inner)
        | TypeExpr::Ellipsis(inner)
        | TypeExpr::Paren(inner)
        | TypeExpr::Underlying(inner) => v.visit_type_expr(inner),
        TypeExpr::Instance { base, args } => {
            v.visit_type_expr(base);
            for arg in args {
                v.visit_type_expr(arg);
            }
        }
        TypeExpr::Union(terms) => {
            for term in terms {
                v.visit_type_expr(term);
            }
        }
        TypeExpr::Array { len, elem } => {
            if let Some(len) = len {
                v.visit_expr(len);
            }
            v.visit_type_expr(elem);
        }
        TypeExpr::Map { key, value } => {
            v.visit_type_expr(key);
            v.visit_type_expr(value);
        }
        TypeExpr::Chan { elem, .. } => v.visit_type_expr(elem),
        TypeExpr::Func(sig) => v.visit_func_type(sig),
        TypeExpr::Interface(elems) => {
            for elem in elems {
                match &elem.node {
                    InterfaceElem::Method { sig, .. } => v.visit_func_type(sig),
                    InterfaceElem::Embedded(te) => v.visit_type_expr(te),
                }
            }
        }
        TypeExpr::Struct(fields) => {
            for field in fields {
                v.visit_field(field);
            }
        }
    }
}

// ============================================================================
// VisitMut Trait (Mutable)
// ============================================================================

/// Mutable AST visitor. Default implementations recurse into all children.
pub trait VisitMut: Sized {
    fn visit_file_mut(&mut self, file: &mut File) {
        walk_file_mut(self, file);
    }

    fn visit_decl_mut(&mut self, decl: &mut Decl) {
        walk_decl_mut(self, decl);
    }

    fn visit_func_decl_mut(&mut self, func: &mut FuncDecl) {
        walk_func_decl_mut(self, func);
    }

    fn visit_func_type_mut(&mut self, sig: &mut FuncType) {
        walk_func_type_mut(self, sig);
    }

    fn visit_field_mut(&mut self, field: &mut Spanned<Field>) {
        walk_field_mut(self, field);
    }

    fn visit_block_mut(&mut self, block: &mut Spanned<Block>) {
        walk_block_mut(self, block);
    }

    fn visit_stmt_mut(&mut self, stmt: &mut Spanned<Stmt>) {
        walk_stmt_mut(self, stmt);
    }

    fn visit_expr_mut(&mut self, expr: &mut Spanned<Expr>) {
        walk_expr_mut(self, expr);
    }

    fn visit_type_expr_mut(&mut self, te: &mut Spanned<TypeExpr>) {
        walk_type_expr_mut(self, te);
    }
}

// ============================================================================
// Walk Functions (Mutable)
// ============================================================================

pub fn walk_file_mut<V: VisitMut>(v: &mut V, file: &mut File) {
    for decl in &mut file.decls {
        v.visit_decl_mut(&mut decl.node);
    }
}

pub fn walk_decl_mut<V: VisitMut>(v: &mut V, decl: &mut Decl) {
    match decl {
        Decl::Func(func) => v.visit_func_decl_mut(func),
        Decl::Type(specs) => {
            for spec in specs {
                for param in &mut spec.node.type_params {
                    v.visit_field_mut(param);
                }
                v.visit_type_expr_mut(&mut spec.node.ty);
            }
        }
        Decl::Var(specs) | Decl::Const(specs) => {
            for spec in specs {
                walk_value_spec_mut(v, &mut spec.node);
            }
        }
    }
}

fn walk_value_spec_mut<V: VisitMut>(v: &mut V, spec: &mut ValueSpec) {
    if let Some(ty) = &mut spec.ty {
        v.visit_type_expr_mut(ty);
    }
    for value in &mut spec.values {
        v.visit_expr_mut(value);
    }
}

pub fn walk_func_decl_mut<V: VisitMut>(v: &mut V, func: &mut FuncDecl) {
    if let Some(recv) = &mut func.recv {
        v.visit_field_mut(recv);
    }
    for param in &mut func.type_params {
        v.visit_field_mut(param);
    }
    v.visit_func_type_mut(&mut func.sig);
    if let Some(body) = &mut func.body {
        v.visit_block_mut(body);
    }
}

pub fn walk_func_type_mut<V: VisitMut>(v: &mut V, sig: &mut FuncType) {
    for field in sig.params.iter_mut().chain(&mut sig.results) {
        v.visit_field_mut(field);
    }
}

pub fn walk_field_mut<V: VisitMut>(v: &mut V, field: &mut Spanned<Field>) {
    v.visit_type_expr_mut(&mut field.node.ty);
}

pub fn walk_block_mut<V: VisitMut>(v: &mut V, block: &mut Spanned<Block>) {
    for stmt in &mut block.node.stmts {
        v.visit_stmt_mut(stmt);
    }
}

fn walk_stmts_mut<V: VisitMut>(v: &mut V, stmts: &mut [Spanned<Stmt>]) {
    for stmt in stmts {
        v.visit_stmt_mut(stmt);
    }
}

pub fn walk_stmt_mut<V: VisitMut>(v: &mut V, stmt: &mut Spanned<Stmt>) {
    match &mut stmt.node {
        Stmt::Block(block) => walk_stmts_mut(v, &mut block.stmts),
        Stmt::Expr(expr) | Stmt::Go(expr) | Stmt::Defer(expr) => v.visit_expr_mut(expr),
        Stmt::Define { lhs, rhs } | Stmt::Assign { lhs, rhs, .. } => {
            for e in lhs.iter_mut().chain(rhs) {
                v.visit_expr_mut(e);
            }
        }
        Stmt::IncDec { target, .. } => v.visit_expr_mut(target),
        Stmt::Send { channel, value } => {
            v.visit_expr_mut(channel);
            v.visit_expr_mut(value);
        }
        Stmt::Decl(decl) => v.visit_decl_mut(decl),
        Stmt::Return(values) => {
            for e in values {
                v.visit_expr_mut(e);
            }
        }
        Stmt::If { init, cond, then_block, else_branch } => {
            if let Some(init) = init {
                v.visit_stmt_mut(init);
            }
            v.visit_expr_mut(cond);
            v.visit_block_mut(then_block);
            if let Some(else_branch) = else_branch {
                v.visit_stmt_mut(else_branch);
            }
        }
        Stmt::For { init, cond, post, body } => {
            if let Some(init) = init {
                v.visit_stmt_mut(init);
            }
            if let Some(cond) = cond {
                v.visit_expr_mut(cond);
            }
            if let Some(post) = post {
                v.visit_stmt_mut(post);
            }
            v.visit_block_mut(body);
        }
        Stmt::Range { key, value, expr, body, .. } => {
            for e in key.iter_mut().chain(value) {
                v.visit_expr_mut(e);
            }
            v.visit_expr_mut(expr);
            v.visit_block_mut(body);
        }
        Stmt::Switch { init, tag, clauses } => {
            if let Some(init) = init {
                v.visit_stmt_mut(init);
            }
            if let Some(tag) = tag {
                v.visit_expr_mut(tag);
            }
            for clause in clauses {
                for e in &mut clause.node.exprs {
                    v.visit_expr_mut(e);
                }
                walk_stmts_mut(v, &mut clause.node.body);
            }
        }
        Stmt::TypeSwitch { init, subject, clauses, .. } => {
            if let Some(init) = init {
                v.visit_stmt_mut(init);
            }
            v.visit_expr_mut(subject);
            for clause in clauses {
                for te in &mut clause.node.types {
                    v.visit_type_expr_mut(te);
                }
                walk_stmts_mut(v, &mut clause.node.body);
            }
        }
        Stmt::Select { clauses } => {
            for clause in clauses {
                if let Some(comm) = &mut clause.node.comm {
                    v.visit_stmt_mut(comm);
                }
                walk_stmts_mut(v, &mut clause.node.body);
            }
        }
        Stmt::Labeled { stmt, .. } => v.visit_stmt_mut(stmt),
        Stmt::Branch { .. } | Stmt::Empty => {}
    }
}

pub fn walk_expr_mut<V: VisitMut>(v: &mut V, expr: &mut Spanned<Expr>) {
    match &mut expr.node {
        Expr::Ident(_)
        | Expr::IntLit(_)
        | Expr::FloatLit(_)
        | Expr::ImagLit(_)
        | Expr::RuneLit(_)
        | Expr::StringLit(_) => {}
        Expr::Selector { object, .. } => v.visit_expr_mut(object),
        Expr::Call { func, args, .. } => {
            v.visit_expr_mut(func);
            for arg in args {
                v.visit_expr_mut(arg);
            }
        }
        Expr::Index { object, index } => {
            v.visit_expr_mut(object);
            v.visit_expr_mut(index);
        }
        Expr::Instance { object, args } => {
            v.visit_expr_mut(object);
            for arg in args {
                v.visit_expr_mut(arg);
            }
        }
        Expr::Slice { object, low, high, max } => {
            v.visit_expr_mut(object);
            for e in [low, high, max].into_iter().flatten() {
                v.visit_expr_mut(e);
            }
        }
        Expr::TypeAssert { object, ty } => {
            v.visit_expr_mut(object);
            v.visit_type_expr_mut(ty);
        }
        Expr::Unary { operand, .. } => v.visit_expr_mut(operand),
        Expr::Binary { lhs, rhs, .. } => {
            v.visit_expr_mut(lhs);
            v.visit_expr_mut(rhs);
        }
        Expr::Paren(inner) => v.visit_expr_mut(inner),
        Expr::FuncLit { sig, body } => {
            v.visit_func_type_mut(sig);
            v.visit_block_mut(body);
        }
        Expr::Composite { ty, elements } => {
            if let Some(ty) = ty {
                v.visit_type_expr_mut(ty);
            }
            for e in elements {
                v.visit_expr_mut(e);
            }
        }
        Expr::KeyValue { key, value } => {
            v.visit_expr_mut(key);
            v.visit_expr_mut(value);
        }
        Expr::Type(te) => v.visit_type_expr_mut(te),
    }
}

pub fn walk_type_expr_mut<V: VisitMut>(v: &mut V, te: &mut Spanned<TypeExpr>) {
    match &mut te.node {
        TypeExpr::Named(_) | TypeExpr::Qualified { .. } => {}
        TypeExpr::Pointer(inner)
        | TypeExpr::Slice(inner)
        | TypeExpr::Ellipsis(inner)
        | TypeExpr::Paren(inner)
        | TypeExpr::Underlying(inner) => v.visit_type_expr_mut(inner),
        TypeExpr::Instance { base, args } => {
            v.visit_type_expr_mut(base);
            for arg in args {
                v.visit_type_expr_mut(arg);
            }
        }
        TypeExpr::Union(terms) => {
            for term in terms {
                v.visit_type_expr_mut(term);
            }
        }
        TypeExpr::Array { len, elem } => {
            if let Some(len) = len {
                v.visit_expr_mut(len);
            }
            v.visit_type_expr_mut(elem);
        }
        TypeExpr::Map { key, value } => {
            v.visit_type_expr_mut(key);
            v.visit_type_expr_mut(value);
        }
        TypeExpr::Chan { elem, .. } => v.visit_type_expr_mut(elem),
        TypeExpr::Func(sig) => v.visit_func_type_mut(sig),
        TypeExpr::Interface(elems) => {
            for elem in elems {
                match &mut elem.node {
                    InterfaceElem::Method { sig, .. } => v.visit_func_type_mut(sig),
                    InterfaceElem::Embedded(te) => v.visit_type_expr_mut(te),
                }
            }
        }
        TypeExpr::Struct(fields) => {
            for field in fields {
                v.visit_field_mut(field);
            }
        }
    }
}
