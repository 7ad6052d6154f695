use crate::parser::ast::*;
use crate::span::{Span, Spanned};

use super::check::{check_stmts, declare_fields};
use super::env::{universe_builtin, universe_type, universe_value, Builtin, Entity, TypeEnv};
use super::resolve::{package_member, resolve_type, select_member, underlying};
use super::types::{BasicKind, Signature, Type};
use super::{CallInfo, Callee};

/// What an expression denotes.
#[derive(Debug, Clone)]
pub enum Operand {
    Value(Type),
    /// A declared function or method (or a method of a named interface). The
    /// callee is `None` for a function literal.
    Func(Signature, Option<Callee>),
    TypeName(Type),
    Package(String),
    Builtin(Builtin),
    Unknown,
}

/// Infer an expression and record its type. Type names are recorded too, so
/// conversions and composite literal types are visible to the oracle.
pub fn infer_expr(expr: &Spanned<Expr>, env: &mut TypeEnv) -> Operand {
    let op = infer_expr_inner(expr, env);
    match &op {
        Operand::Value(ty) | Operand::TypeName(ty) => env.record(expr.span, ty.clone()),
        Operand::Func(sig, _) => env.record(expr.span, Type::Signature(sig.clone())),
        Operand::Unknown if !matches!(&expr.node, Expr::Ident(name) if name == "_") => {
            env.note_unresolved(expr.span, "expression")
        }
        Operand::Unknown | Operand::Package(_) | Operand::Builtin(_) => {}
    }
    op
}

impl Operand {
    /// The type of the value this operand denotes, if it is one.
    pub fn into_value(self) -> Option<Type> {
        match self {
            Operand::Value(ty) => Some(ty),
            Operand::Func(sig, _) => Some(Type::Signature(sig)),
            _ => None,
        }
    }
}

/// Infer an expression expected to be a value.
pub fn infer_value(expr: &Spanned<Expr>, env: &mut TypeEnv) -> Option<Type> {
    infer_expr(expr, env).into_value()
}

fn infer_expr_inner(expr: &Spanned<Expr>, env: &mut TypeEnv) -> Operand {
    match &expr.node {
        Expr::Ident(name) => infer_ident(name, env),
        Expr::IntLit(_) => Operand::Value(Type::basic(BasicKind::UntypedInt)),
        Expr::FloatLit(_) => Operand::Value(Type::basic(BasicKind::UntypedFloat)),
        Expr::ImagLit(_) => Operand::Value(Type::basic(BasicKind::UntypedComplex)),
        Expr::RuneLit(_) => Operand::Value(Type::basic(BasicKind::UntypedRune)),
        Expr::StringLit(_) => Operand::Value(Type::basic(BasicKind::UntypedString)),
        Expr::Selector { object, field } => match infer_expr(object, env) {
            Operand::Value(ty) => select_member(&ty, &field.node, env).unwrap_or(Operand::Unknown),
            Operand::Package(path) => package_member(&path, &field.node, env).unwrap_or(Operand::Unknown),
            // Method values of function results and method expressions are not modelled.
            _ => Operand::Unknown,
        },
        Expr::Call { func, args, .. } => infer_call(expr.span, func, args, env),
        Expr::Index { object, index } => {
            let object = match infer_expr(object, env) {
                // `f[int]` and `List[int]` instantiate; type arguments stay opaque.
                op @ (Operand::Func(..) | Operand::TypeName(_)) => {
                    infer_expr(index, env);
                    return op;
                }
                Operand::Value(ty) => ty,
                _ => {
                    infer_expr(index, env);
                    return Operand::Unknown;
                }
            };
            infer_expr(index, env);
            match underlying(&object, env) {
                Type::Slice(elem) | Type::Array { elem, .. } => Operand::Value(*elem),
                Type::Map { value, .. } => Operand::Value(*value),
                Type::Basic(kind) if kind.is_string() => Operand::Value(Type::basic(BasicKind::Uint8)),
                Type::Pointer(inner) => match underlying(&inner, env) {
                    Type::Array { elem, .. } => Operand::Value(*elem),
                    _ => Operand::Unknown,
                },
                _ => Operand::Unknown,
            }
        }
        Expr::Instance { object, args } => {
            let op = infer_expr(object, env);
            for arg in args {
                infer_expr(arg, env);
            }
            match op {
                Operand::Func(..) | Operand::TypeName(_) => op,
                _ => Operand::Unknown,
            }
        }
        Expr::Slice { object, low, high, max } => {
            let object = infer_value(object, env);
            for bound in [low, high, max].into_iter().flatten() {
                infer_expr(bound, env);
            }
            let Some(object) = object else { return Operand::Unknown };
            match underlying(&object, env) {
                Type::Basic(kind) if kind.is_string() => Operand::Value(object.default_type()),
                Type::Slice(_) => Operand::Value(object),
                Type::Array { elem, .. } => Operand::Value(Type::Slice(elem)),
                Type::Pointer(inner) => match underlying(&inner, env) {
                    Type::Array { elem, .. } => Operand::Value(Type::Slice(elem)),
                    _ => Operand::Unknown,
                },
                _ => Operand::Unknown,
            }
        }
        Expr::TypeAssert { object, ty } => {
            infer_expr(object, env);
            resolve_type(ty, env).map(Operand::Value).unwrap_or(Operand::Unknown)
        }
        Expr::Unary { op, operand } => infer_unary(*op, operand, env),
        Expr::Binary { op, lhs, rhs } => {
            let l = infer_value(lhs, env);
            let r = infer_value(rhs, env);
            if op.is_comparison() {
                return Operand::Value(Type::basic(BasicKind::UntypedBool));
            }
            let ty = match (l, r) {
                (Some(l), _) if op.is_shift() => Some(l),
                (Some(l), Some(r)) if l.is_untyped() && !r.is_untyped() => Some(r),
                (Some(l), _) => Some(l),
                (None, r) => r,
            };
            ty.map(Operand::Value).unwrap_or(Operand::Unknown)
        }
        Expr::Paren(inner) => infer_expr(inner, env),
        Expr::FuncLit { sig, body } => {
            env.push_scope();
            let params = declare_fields(&sig.params, env);
            let results = declare_fields(&sig.results, env);
            check_stmts(&body.node.stmts, env);
            env.pop_scope();
            match (params, results) {
                (Some((params, _)), Some((results, _))) => {
                    Operand::Func(Signature { params, results, variadic: sig.is_variadic() }, None)
                }
                _ => Operand::Unknown,
            }
        }
        Expr::Composite { ty, elements } => {
            let ty = ty.as_ref().and_then(|te| resolve_type(te, env));
            infer_elements(ty.as_ref(), elements, env);
            ty.map(Operand::Value).unwrap_or(Operand::Unknown)
        }
        Expr::KeyValue { key, value } => {
            infer_expr(key, env);
            infer_expr(value, env);
            Operand::Unknown
        }
        Expr::Type(te) => resolve_type(te, env).map(Operand::TypeName).unwrap_or(Operand::Unknown),
    }
}

fn infer_ident(name: &str, env: &mut TypeEnv) -> Operand {
    if name == "_" {
        return Operand::Unknown;
    }
    match env.lookup(name) {
        Some(Entity::Var(ty)) => return Operand::Value(ty.clone()),
        Some(Entity::TypeName(ty)) => return Operand::TypeName(ty.clone()),
        Some(Entity::Func(sig, callee)) => return Operand::Func(sig.clone(), callee.clone()),
        None => {}
    }
    let package = env.ctx.package.clone();
    if let Some(op) = package_member(&package, name, env) {
        return op;
    }
    if let Some(path) = env.ctx.imports.get(name) {
        return Operand::Package(path.clone());
    }
    if let Some(ty) = universe_type(name) {
        return Operand::TypeName(ty);
    }
    if let Some(ty) = universe_value(name) {
        return Operand::Value(ty);
    }
    universe_builtin(name).map(Operand::Builtin).unwrap_or(Operand::Unknown)
}

fn infer_call(span: Span, func: &Spanned<Expr>, args: &[Spanned<Expr>], env: &mut TypeEnv) -> Operand {
    let callee = infer_expr(func, env);
    match callee {
        // Conversion
        Operand::TypeName(ty) => {
            infer_args(args, env);
            Operand::Value(ty)
        }
        Operand::Builtin(builtin) => infer_builtin(builtin, args, env),
        Operand::Func(sig, callee) => {
            infer_args(args, env);
            let result = call_result(&sig);
            env.record_call(span, CallInfo { sig, callee, through_type: false });
            result
        }
        Operand::Value(ty) => {
            infer_args(args, env);
            match underlying(&ty, env) {
                Type::Signature(sig) => {
                    let result = call_result(&sig);
                    env.record_call(span, CallInfo { sig, callee: None, through_type: true });
                    result
                }
                _ => Operand::Unknown,
            }
        }
        Operand::Package(_) | Operand::Unknown => {
            infer_args(args, env);
            Operand::Unknown
        }
    }
}

fn infer_args(args: &[Spanned<Expr>], env: &mut TypeEnv) {
    for arg in args {
        infer_expr(arg, env);
    }
}

fn call_result(sig: &Signature) -> Operand {
    match sig.results.as_slice() {
        [single] => Operand::Value(single.clone()),
        many => Operand::Value(Type::Tuple(many.to_vec())),
    }
}

fn infer_builtin(builtin: Builtin, args: &[Spanned<Expr>], env: &mut TypeEnv) -> Operand {
    let ops: Vec<Operand> = args.iter().map(|arg| infer_expr(arg, env)).collect();
    let first = ops.into_iter().next();
    match (builtin, first) {
        (Builtin::Len | Builtin::Cap | Builtin::Copy, _) => Operand::Value(Type::basic(BasicKind::Int)),
        (Builtin::New, Some(Operand::TypeName(ty))) => Operand::Value(Type::Pointer(Box::new(ty))),
        (Builtin::Make, Some(Operand::TypeName(ty))) => Operand::Value(ty),
        (Builtin::Append | Builtin::Min | Builtin::Max, Some(Operand::Value(ty))) => Operand::Value(ty),
        (Builtin::Recover, _) => Operand::Value(Type::any()),
        (Builtin::Real | Builtin::Imag, _) => Operand::Value(Type::basic(BasicKind::Float64)),
        (Builtin::Complex, _) => Operand::Value(Type::basic(BasicKind::Complex128)),
        (Builtin::Clear | Builtin::Close | Builtin::Delete | Builtin::Panic | Builtin::Print | Builtin::Println, _) => {
            Operand::Value(Type::Tuple(Vec::new()))
        }
        _ => Operand::Unknown,
    }
}

fn infer_unary(op: UnaryOp, operand: &Spanned<Expr>, env: &mut TypeEnv) -> Operand {
    match (op, infer_expr(operand, env)) {
        (UnaryOp::Deref, Operand::TypeName(ty)) => Operand::TypeName(Type::Pointer(Box::new(ty))),
        (UnaryOp::Deref, Operand::Value(ty)) => match underlying(&ty, env) {
            Type::Pointer(inner) => Operand::Value(*inner),
            _ => Operand::Unknown,
        },
        (UnaryOp::AddrOf, Operand::Value(ty)) => Operand::Value(Type::Pointer(Box::new(ty))),
        (UnaryOp::Recv, Operand::Value(ty)) => match underlying(&ty, env) {
            Type::Chan { elem, .. } => Operand::Value(*elem),
            _ => Operand::Unknown,
        },
        (UnaryOp::Neg | UnaryOp::Pos | UnaryOp::Not | UnaryOp::BitNot, Operand::Value(ty)) => Operand::Value(ty),
        _ => Operand::Unknown,
    }
}

/// Infer composite literal elements, giving elided inner literals
/// (`{1, 2}` in `[]Point{{1, 2}}`) the element type of the outer literal.
fn infer_elements(ty: Option<&Type>, elements: &[Spanned<Expr>], env: &mut TypeEnv) {
    let under = ty.map(|ty| underlying(ty, env));
    for (position, element) in elements.iter().enumerate() {
        match &element.node {
            Expr::KeyValue { key, value } => {
                let hint = match &under {
                    Some(Type::Struct(fields)) => match &key.node {
                        Expr::Ident(name) => fields.iter().find(|f| &f.name == name).map(|f| f.ty.clone()),
                        _ => None,
                    },
                    Some(Type::Map { key: key_ty, value: value_ty }) => {
                        infer_element(key, Some((**key_ty).clone()), env);
                        Some((**value_ty).clone())
                    }
                    Some(Type::Slice(elem)) | Some(Type::Array { elem, .. }) => {
                        infer_expr(key, env);
                        Some((**elem).clone())
                    }
                    // Keys of struct literals are field names, not expressions.
                    _ => None,
                };
                infer_element(value, hint, env);
            }
            _ => {
                let hint = match &under {
                    Some(Type::Struct(fields)) => fields.get(position).map(|f| f.ty.clone()),
                    Some(Type::Slice(elem)) | Some(Type::Array { elem, .. }) => Some((**elem).clone()),
                    Some(Type::Map { value, .. }) => Some((**value).clone()),
                    _ => None,
                };
                infer_element(element, hint, env);
            }
        }
    }
}

fn infer_element(element: &Spanned<Expr>, hint: Option<Type>, env: &mut TypeEnv) {
    match &element.node {
        Expr::Composite { ty: None, elements } => {
            let inner = hint.as_ref().map(|h| h.strip_pointer().clone());
            infer_elements(inner.as_ref(), elements, env);
            match hint {
                Some(hint) => env.record(element.span, hint),
                None => env.note_unresolved(element.span, "composite literal"),
            }
        }
        _ => {
            infer_expr(element, env);
        }
    }
}
