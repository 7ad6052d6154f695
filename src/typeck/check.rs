use crate::parser::ast::*;
use crate::span::Spanned;

use super::env::{Entity, TypeEnv};
use super::infer::{infer_expr, infer_value, Operand};
use super::resolve::{declare_func_type_params, declared_type, resolve_type, underlying};
use super::types::{BasicKind, Type};

/// Pass 1: walk every declaration and function body, recording types.
pub fn check_program_bodies(env: &mut TypeEnv) {
    let program = env.program;
    for pkg in &program.packages {
        for unit in &pkg.units {
            env.enter_file(unit.file_id);
            for decl in &unit.file.decls {
                check_top_decl(&decl.node, env);
            }
        }
    }
}

fn check_top_decl(decl: &Decl, env: &mut TypeEnv) {
    match decl {
        Decl::Func(func) => check_func_decl(func, env),
        Decl::Type(specs) => {
            let package = env.ctx.package.clone();
            for spec in specs {
                if spec.node.alias {
                    resolve_type(&spec.node.ty, env);
                } else if let Some(named) = declared_type(&package, &spec.node.name.node, env) {
                    // Resolving the underlying type records every nested type expression.
                    underlying(&named, env);
                }
            }
        }
        Decl::Var(specs) | Decl::Const(specs) => {
            for spec in specs {
                if let Some(ty) = &spec.node.ty {
                    resolve_type(ty, env);
                }
                for value in &spec.node.values {
                    infer_expr(value, env);
                }
            }
        }
    }
}

fn check_func_decl(func: &FuncDecl, env: &mut TypeEnv) {
    env.push_scope();
    declare_func_type_params(func, env);
    if let Some(recv) = &func.recv {
        declare_fields(std::slice::from_ref(recv), env);
    }
    declare_fields(&func.sig.params, env);
    declare_fields(&func.sig.results, env);
    if let Some(body) = &func.body {
        check_stmts(&body.node.stmts, env);
    }
    env.pop_scope();
}

/// Resolve a parameter, result or receiver list and bind its names in the
/// current scope. Returns the per-name types and group sizes when every
/// field resolved.
pub fn declare_fields(fields: &[Spanned<Field>], env: &mut TypeEnv) -> Option<(Vec<Type>, Vec<usize>)> {
    let mut types = Vec::new();
    let mut groups = Vec::new();
    let mut complete = true;
    for field in fields {
        let arity = field.node.names.len().max(1);
        groups.push(arity);
        let Some(ty) = resolve_type(&field.node.ty, env) else {
            complete = false;
            continue;
        };
        for name in &field.node.names {
            env.define(&name.node, Entity::Var(ty.clone()));
        }
        types.extend(std::iter::repeat_n(ty, arity));
    }
    complete.then_some((types, groups))
}

pub fn check_stmts(stmts: &[Spanned<Stmt>], env: &mut TypeEnv) {
    for stmt in stmts {
        check_stmt(stmt, env);
    }
}

fn check_block(block: &Spanned<Block>, env: &mut TypeEnv) {
    env.push_scope();
    check_stmts(&block.node.stmts, env);
    env.pop_scope();
}

fn check_stmt(stmt: &Spanned<Stmt>, env: &mut TypeEnv) {
    match &stmt.node {
        Stmt::Block(block) => {
            env.push_scope();
            check_stmts(&block.stmts, env);
            env.pop_scope();
        }
        Stmt::Expr(expr) | Stmt::Go(expr) | Stmt::Defer(expr) => {
            infer_expr(expr, env);
        }
        Stmt::Define { lhs, rhs } if lhs.len() == rhs.len() => {
            let ops: Vec<Operand> = rhs.iter().map(|e| infer_expr(e, env)).collect();
            for (target, op) in lhs.iter().zip(ops) {
                bind_operand(target, op, env);
            }
        }
        Stmt::Define { lhs, rhs } => {
            let types = assigned_types(lhs.len(), rhs, env);
            for (target, ty) in lhs.iter().zip(types) {
                bind_target(target, ty, env);
            }
        }
        Stmt::Assign { lhs, rhs, .. } => {
            for e in lhs.iter().chain(rhs) {
                infer_expr(e, env);
            }
        }
        Stmt::IncDec { target, .. } => {
            infer_expr(target, env);
        }
        Stmt::Send { channel, value } => {
            infer_expr(channel, env);
            infer_expr(value, env);
        }
        Stmt::Decl(decl) => check_local_decl(decl, env),
        Stmt::Return(values) => {
            for value in values {
                infer_expr(value, env);
            }
        }
        Stmt::If { init, cond, then_block, else_branch } => {
            env.push_scope();
            if let Some(init) = init {
                check_stmt(init, env);
            }
            infer_expr(cond, env);
            check_block(then_block, env);
            if let Some(else_branch) = else_branch {
                check_stmt(else_branch, env);
            }
            env.pop_scope();
        }
        Stmt::For { init, cond, post, body } => {
            env.push_scope();
            if let Some(init) = init {
                check_stmt(init, env);
            }
            if let Some(cond) = cond {
                infer_expr(cond, env);
            }
            if let Some(post) = post {
                check_stmt(post, env);
            }
            check_block(body, env);
            env.pop_scope();
        }
        Stmt::Range { key, value, define, expr, body } => {
            env.push_scope();
            let ranged = infer_value(expr, env);
            let (key_ty, value_ty) = ranged.map(|ty| range_types(&ty, env)).unwrap_or((None, None));
            if *define {
                if let Some(key) = key {
                    bind_target(key, key_ty, env);
                }
                if let Some(value) = value {
                    bind_target(value, value_ty, env);
                }
            } else {
                for e in key.iter().chain(value) {
                    infer_expr(e, env);
                }
            }
            check_block(body, env);
            env.pop_scope();
        }
        Stmt::Switch { init, tag, clauses } => {
            env.push_scope();
            if let Some(init) = init {
                check_stmt(init, env);
            }
            if let Some(tag) = tag {
                infer_expr(tag, env);
            }
            for clause in clauses {
                for e in &clause.node.exprs {
                    infer_expr(e, env);
                }
                env.push_scope();
                check_stmts(&clause.node.body, env);
                env.pop_scope();
            }
            env.pop_scope();
        }
        Stmt::TypeSwitch { init, binding, subject, clauses } => {
            env.push_scope();
            if let Some(init) = init {
                check_stmt(init, env);
            }
            let subject_ty = infer_value(subject, env);
            for clause in clauses {
                let case_types: Vec<Option<Type>> = clause
                    .node
                    .types
                    .iter()
                    .map(|te| match &te.node {
                        TypeExpr::Named(name) if name == "nil" => None,
                        _ => resolve_type(te, env),
                    })
                    .collect();
                env.push_scope();
                if let Some(binding) = binding {
                    // A single-type case narrows the binding; otherwise it keeps the subject's type.
                    let ty = match case_types.as_slice() {
                        [Some(ty)] => Some(ty.clone()),
                        _ => subject_ty.clone(),
                    };
                    if let Some(ty) = ty {
                        env.define(&binding.node, Entity::Var(ty));
                    }
                }
                check_stmts(&clause.node.body, env);
                env.pop_scope();
            }
            env.pop_scope();
        }
        Stmt::Select { clauses } => {
            for clause in clauses {
                env.push_scope();
                if let Some(comm) = &clause.node.comm {
                    check_stmt(comm, env);
                }
                check_stmts(&clause.node.body, env);
                env.pop_scope();
            }
        }
        Stmt::Labeled { stmt, .. } => check_stmt(stmt, env),
        Stmt::Branch { .. } | Stmt::Empty => {}
    }
}

fn check_local_decl(decl: &Decl, env: &mut TypeEnv) {
    match decl {
        Decl::Var(specs) => {
            for spec in specs {
                if spec.node.ty.is_none() && spec.node.names.len() == spec.node.values.len() {
                    let ops: Vec<Operand> = spec.node.values.iter().map(|e| infer_expr(e, env)).collect();
                    for (name, op) in spec.node.names.iter().zip(ops) {
                        bind_name(&name.node, op, env);
                    }
                    continue;
                }
                let declared = spec.node.ty.as_ref().and_then(|te| resolve_type(te, env));
                let inferred = if spec.node.values.is_empty() {
                    Vec::new()
                } else {
                    assigned_types(spec.node.names.len(), &spec.node.values, env)
                };
                for (i, name) in spec.node.names.iter().enumerate() {
                    let ty = declared
                        .clone()
                        .or_else(|| inferred.get(i).cloned().flatten().map(Type::default_type));
                    if let Some(ty) = ty {
                        env.define(&name.node, Entity::Var(ty));
                    }
                }
            }
        }
        Decl::Const(specs) => {
            let mut carrier: Option<&ValueSpec> = None;
            for spec in specs {
                if spec.node.ty.is_some() || !spec.node.values.is_empty() {
                    carrier = Some(&spec.node);
                }
                let Some(source) = carrier else { continue };
                let declared = source.ty.as_ref().and_then(|te| resolve_type(te, env));
                let inferred: Vec<Option<Type>> = source.values.iter().map(|v| infer_value(v, env)).collect();
                for (i, name) in spec.node.names.iter().enumerate() {
                    if let Some(ty) = declared.clone().or_else(|| inferred.get(i).cloned().flatten()) {
                        env.define(&name.node, Entity::Var(ty));
                    }
                }
            }
        }
        Decl::Type(specs) => {
            // Local types are treated as their underlying type.
            for spec in specs {
                if let Some(ty) = resolve_type(&spec.node.ty, env) {
                    env.define(&spec.node.name.node, Entity::TypeName(ty));
                }
            }
        }
        Decl::Func(func) => check_func_decl(func, env),
    }
}

/// Types produced for `n` targets by the right-hand side of `:=`, `=` or `var`.
fn assigned_types(n: usize, rhs: &[Spanned<Expr>], env: &mut TypeEnv) -> Vec<Option<Type>> {
    let mut types = if let [single] = rhs {
        let comma_ok = n == 2
            && matches!(
                single.node,
                Expr::Index { .. } | Expr::TypeAssert { .. } | Expr::Unary { op: UnaryOp::Recv, .. }
            );
        let ty = infer_value(single, env);
        match ty {
            Some(ty) if comma_ok => vec![Some(ty), Some(Type::basic(BasicKind::Bool))],
            Some(Type::Tuple(results)) if n > 1 => results.into_iter().map(Some).collect(),
            other => vec![other],
        }
    } else {
        rhs.iter().map(|e| infer_value(e, env)).collect()
    };
    types.resize(n, None);
    types
}

/// Bind a `:=` target to one value. A function keeps its callee.
fn bind_operand(target: &Spanned<Expr>, op: Operand, env: &mut TypeEnv) {
    match (&target.node, op) {
        (Expr::Ident(name), Operand::Func(sig, callee)) if name != "_" => {
            env.record(target.span, Type::Signature(sig.clone()));
            env.define(name, Entity::Func(sig, callee));
        }
        (_, op) => bind_target(target, op.into_value(), env),
    }
}

fn bind_name(name: &str, op: Operand, env: &mut TypeEnv) {
    match op {
        Operand::Func(sig, callee) => env.define(name, Entity::Func(sig, callee)),
        op => {
            if let Some(ty) = op.into_value() {
                env.define(name, Entity::Var(ty.default_type()));
            }
        }
    }
}

/// Bind an identifier target of `:=` or `range`; anything else is inferred.
fn bind_target(target: &Spanned<Expr>, ty: Option<Type>, env: &mut TypeEnv) {
    match &target.node {
        Expr::Ident(name) => {
            let Some(ty) = ty.map(Type::default_type) else {
                env.note_unresolved(target.span, "binding");
                return;
            };
            if name != "_" {
                env.record(target.span, ty.clone());
            }
            env.define(name, Entity::Var(ty));
        }
        _ => {
            infer_expr(target, env);
        }
    }
}

fn range_types(ty: &Type, env: &mut TypeEnv) -> (Option<Type>, Option<Type>) {
    let int = Type::basic(BasicKind::Int);
    match underlying(ty, env) {
        Type::Slice(elem) | Type::Array { elem, .. } => (Some(int), Some(*elem)),
        Type::Pointer(inner) => match underlying(&inner, env) {
            Type::Array { elem, .. } => (Some(int), Some(*elem)),
            _ => (None, None),
        },
        Type::Basic(kind) if kind.is_string() => (Some(int), Some(Type::basic(BasicKind::Int32))),
        Type::Basic(_) => (Some(ty.clone().default_type()), None),
        Type::Map { key, value } => (Some(*key), Some(*value)),
        Type::Chan { elem, .. } => (Some(*elem), None),
        _ => (None, None),
    }
}
