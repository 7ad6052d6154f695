use crate::parser::ast::*;
use crate::span::Spanned;

use super::env::{universe_type, Entity, FuncDef, SigFacts, TypeEnv};
use super::infer::{infer_expr, infer_value, Operand};
use super::types::{BasicKind, InterfaceType, Method, Signature, StructField, Type};
use super::Callee;

/// Resolve a type expression and record the result for its span (and, through
/// recursion, for every nested type expression).
pub fn resolve_type(te: &Spanned<TypeExpr>, env: &mut TypeEnv) -> Option<Type> {
    let ty = resolve_type_inner(te, env);
    match &ty {
        Some(ty) => env.record(te.span, ty.clone()),
        None => env.note_unresolved(te.span, "type"),
    }
    ty
}

fn resolve_type_inner(te: &Spanned<TypeExpr>, env: &mut TypeEnv) -> Option<Type> {
    match &te.node {
        TypeExpr::Named(name) => lookup_type_name(name, env),
        TypeExpr::Qualified { package, name } => {
            if env.lookup(&package.node).is_some() {
                return None;
            }
            let path = env.ctx.imports.get(&package.node)?.clone();
            qualified_type(&path, &name.node, env)
        }
        TypeExpr::Pointer(inner) => Some(Type::Pointer(Box::new(resolve_type(inner, env)?))),
        TypeExpr::Slice(elem) | TypeExpr::Ellipsis(elem) => Some(Type::Slice(Box::new(resolve_type(elem, env)?))),
        TypeExpr::Array { len, elem } => {
            let len = len.as_ref().and_then(|len| match &len.node {
                Expr::IntLit(text) => parse_int(text),
                _ => {
                    infer_expr(len, env);
                    None
                }
            });
            Some(Type::Array { len, elem: Box::new(resolve_type(elem, env)?) })
        }
        TypeExpr::Map { key, value } => {
            let key = resolve_type(key, env);
            let value = resolve_type(value, env);
            Some(Type::Map { key: Box::new(key?), value: Box::new(value?) })
        }
        TypeExpr::Chan { dir, elem } => Some(Type::Chan { dir: *dir, elem: Box::new(resolve_type(elem, env)?) }),
        TypeExpr::Func(sig) => resolve_signature(sig, env).map(|(sig, _)| Type::Signature(sig)),
        TypeExpr::Interface(elems) => resolve_interface(elems, env).map(Type::Interface),
        TypeExpr::Struct(fields) => {
            let mut out = Vec::new();
            let mut complete = true;
            for field in fields {
                let Some(ty) = resolve_type(&field.node.ty, env) else {
                    complete = false;
                    continue;
                };
                if field.node.names.is_empty() {
                    out.push(StructField { name: embedded_name(&field.node.ty.node).to_string(), ty, embedded: true });
                } else {
                    for name in &field.node.names {
                        out.push(StructField { name: name.node.clone(), ty: ty.clone(), embedded: false });
                    }
                }
            }
            complete.then_some(Type::Struct(out))
        }
        TypeExpr::Paren(inner) => resolve_type(inner, env),
        // Instantiations denote the generic type itself; its type parameters
        // stay opaque.
        TypeExpr::Instance { base, args } => {
            for arg in args {
                resolve_type(arg, env);
            }
            resolve_type(base, env)
        }
        // Constraint terms are not types of values.
        TypeExpr::Underlying(_) | TypeExpr::Union(_) => None,
    }
}

fn parse_int(text: &str) -> Option<u64> {
    let digits: String = text.chars().filter(|c| *c != '_').collect();
    match digits.get(..2) {
        Some("0x") | Some("0X") => u64::from_str_radix(&digits[2..], 16).ok(),
        Some("0b") | Some("0B") => u64::from_str_radix(&digits[2..], 2).ok(),
        Some("0o") | Some("0O") => u64::from_str_radix(&digits[2..], 8).ok(),
        _ if digits.len() > 1 && digits.starts_with('0') => u64::from_str_radix(&digits[1..], 8).ok(),
        _ => digits.parse().ok(),
    }
}

/// Field name of an embedded struct field: `T` for `T`, `*T` and `pkg.T`.
pub fn embedded_name(ty: &TypeExpr) -> &str {
    match ty {
        TypeExpr::Named(name) => name,
        TypeExpr::Qualified { name, .. } => &name.node,
        TypeExpr::Pointer(inner) | TypeExpr::Paren(inner) => embedded_name(&inner.node),
        TypeExpr::Instance { base, .. } => embedded_name(&base.node),
        _ => "",
    }
}

/// Resolve parameter and result lists. Parameters are expanded per name; the
/// group sizes are returned alongside.
pub fn resolve_signature(sig: &FuncType, env: &mut TypeEnv) -> Option<SigFacts> {
    let params = resolve_fields(&sig.params, env);
    let results = resolve_fields(&sig.results, env);
    let (params, groups) = params?;
    let (results, _) = results?;
    Some((Signature { params, results, variadic: sig.is_variadic() }, groups))
}

/// Resolve every field (recording each), expanding grouped names. Returns
/// `None` if any field failed, after still visiting the rest.
pub fn resolve_fields(fields: &[Spanned<Field>], env: &mut TypeEnv) -> Option<(Vec<Type>, Vec<usize>)> {
    let mut types = Vec::new();
    let mut groups = Vec::new();
    let mut complete = true;
    for field in fields {
        let arity = field.node.names.len().max(1);
        groups.push(arity);
        match resolve_type(&field.node.ty, env) {
            Some(ty) => types.extend(std::iter::repeat_n(ty, arity)),
            None => complete = false,
        }
    }
    complete.then_some((types, groups))
}

fn resolve_interface(elems: &[Spanned<InterfaceElem>], env: &mut TypeEnv) -> Option<InterfaceType> {
    let mut iface = InterfaceType::default();
    let mut complete = true;
    for elem in elems {
        match &elem.node {
            InterfaceElem::Method { name, sig } => match resolve_signature(sig, env) {
                Some((sig, groups)) => iface.methods.push(Method { name: name.node.clone(), sig, groups }),
                None => complete = false,
            },
            InterfaceElem::Embedded(te) => match resolve_type(te, env) {
                Some(ty) => iface.embeds.push(ty),
                None => complete = false,
            },
        }
    }
    complete.then_some(iface)
}

/// A type name in the current file: local type, package type, or predeclared.
pub fn lookup_type_name(name: &str, env: &mut TypeEnv) -> Option<Type> {
    match env.lookup(name) {
        Some(Entity::TypeName(ty)) => return Some(ty.clone()),
        Some(Entity::Var(_) | Entity::Func(..)) => return None,
        None => {}
    }
    let package = env.ctx.package.clone();
    if let Some(ty) = declared_type(&package, name, env) {
        return Some(ty);
    }
    universe_type(name)
}

/// `pkg.Name` where `pkg` imports `path`. Packages that are not loaded still
/// yield a named type; only aliases need the declaration.
pub fn qualified_type(path: &str, name: &str, env: &mut TypeEnv) -> Option<Type> {
    Some(declared_type(path, name, env).unwrap_or_else(|| Type::named(path, name)))
}

/// The type denoted by a package-level type declaration: the named type
/// itself, or the target of an alias.
pub fn declared_type(path: &str, name: &str, env: &mut TypeEnv) -> Option<Type> {
    let def = env.packages.get(path)?.types.get(name).copied()?;
    if def.spec.alias {
        return env.in_file(def.file_id, |env| resolve_type(&def.spec.ty, env));
    }
    Some(Type::named(path, name))
}

/// The underlying type of `ty`. Named types whose declaration is not loaded
/// are returned unchanged.
pub fn underlying(ty: &Type, env: &mut TypeEnv) -> Type {
    match ty {
        Type::Named { path, name } => named_underlying(path, name, env).unwrap_or_else(|| ty.clone()),
        other => other.clone(),
    }
}

fn named_underlying(path: &str, name: &str, env: &mut TypeEnv) -> Option<Type> {
    if path.is_empty() && name == "error" {
        return Some(Type::Interface(InterfaceType {
            methods: vec![Method {
                name: "Error".to_string(),
                sig: Signature { params: Vec::new(), results: vec![Type::basic(BasicKind::String)], variadic: false },
                groups: Vec::new(),
            }],
            embeds: Vec::new(),
        }));
    }
    let key = (path.to_string(), name.to_string());
    if let Some(cached) = env.underlying_cache.get(&key) {
        return cached.clone();
    }
    // Cycle guard for `type A B; type B A`.
    env.underlying_cache.insert(key.clone(), None);

    let def = env.packages.get(path)?.types.get(name).copied()?;
    let resolved = env.in_file(def.file_id, |env| {
        declare_type_params(&def.spec.type_params, env);
        resolve_type(&def.spec.ty, env)
    });
    let under = match resolved {
        Some(Type::Named { path, name }) => named_underlying(&path, &name, env),
        other => other,
    };
    env.underlying_cache.insert(key, under.clone());
    under
}

/// Bind type parameter names as opaque types in the current scope.
pub fn declare_type_params(params: &[Spanned<Field>], env: &mut TypeEnv) {
    for param in params {
        for name in &param.node.names {
            env.define(&name.node, Entity::TypeName(Type::Param(name.node.clone())));
        }
    }
}

/// Type parameters of a generic function, or those a method's receiver
/// names (`T` in `func (l *List[T]) Push(v T)`).
pub fn declare_func_type_params(func: &FuncDecl, env: &mut TypeEnv) {
    declare_type_params(&func.type_params, env);
    if let Some(recv) = &func.recv {
        let mut ty = &recv.node.ty.node;
        while let TypeExpr::Pointer(inner) | TypeExpr::Paren(inner) = ty {
            ty = &inner.node;
        }
        if let TypeExpr::Instance { args, .. } = ty {
            for arg in args {
                if let TypeExpr::Named(name) = &arg.node {
                    env.define(name, Entity::TypeName(Type::Param(name.clone())));
                }
            }
        }
    }
}

/// Signature of a declared function or method, resolved in its own file.
pub fn func_signature(def: FuncDef, env: &mut TypeEnv) -> Option<SigFacts> {
    let key = def.decl.name.span;
    if let Some(cached) = env.sig_cache.get(&key) {
        return cached.clone();
    }
    env.sig_cache.insert(key, None);
    let facts = env.in_file(def.file_id, |env| {
        declare_func_type_params(def.decl, env);
        resolve_signature(&def.decl.sig, env)
    });
    env.sig_cache.insert(key, facts.clone());
    facts
}

/// Type of a package-level variable or constant, inferred on first use.
pub fn package_value_type(path: &str, name: &str, env: &mut TypeEnv) -> Option<Type> {
    let key = (path.to_string(), name.to_string());
    if let Some(cached) = env.value_cache.get(&key) {
        return cached.clone();
    }
    env.value_cache.insert(key.clone(), None);

    let def = env.packages.get(path)?.values.get(name).copied()?;
    let ty = env.in_file(def.file_id, |env| {
        if let Some(te) = &def.spec.ty {
            return resolve_type(te, env);
        }
        let values = &def.spec.values;
        let ty = if values.len() == def.spec.names.len() {
            infer_value(values.get(def.index)?, env)
        } else if values.len() == 1 {
            match infer_value(&values[0], env)? {
                Type::Tuple(types) => types.into_iter().nth(def.index),
                _ => None,
            }
        } else {
            None
        };
        if def.is_const { ty } else { ty.map(Type::default_type) }
    });
    env.value_cache.insert(key, ty.clone());
    ty
}

/// A package-level name of package `path` used as an operand.
pub fn package_member(path: &str, name: &str, env: &mut TypeEnv) -> Option<Operand> {
    let scope = env.packages.get(path)?;
    let is_type = scope.types.contains_key(name);
    let func = scope.funcs.get(name).copied();
    let is_value = scope.values.contains_key(name);

    if is_type {
        return declared_type(path, name, env).map(Operand::TypeName);
    }
    if let Some(def) = func {
        let (sig, groups) = func_signature(def, env)?;
        let callee = Callee { package: path.to_string(), name: name.to_string(), sig: sig.clone(), groups };
        return Some(Operand::Func(sig, Some(callee)));
    }
    if is_value {
        return package_value_type(path, name, env).map(Operand::Value);
    }
    None
}

/// Select `field` on a value of type `recv`: methods of named types (through
/// one pointer), struct fields including promoted ones, and interface methods.
pub fn select_member(recv: &Type, field: &str, env: &mut TypeEnv) -> Option<Operand> {
    select_at_depth(recv, field, env, 0)
}

const MAX_EMBED_DEPTH: usize = 3;

fn select_at_depth(recv: &Type, field: &str, env: &mut TypeEnv, depth: usize) -> Option<Operand> {
    let base = recv.strip_pointer();
    if let Type::Named { path, name } = base {
        if let Some(op) = method_of(path, name, field, env) {
            return Some(op);
        }
    }
    match underlying(base, env) {
        Type::Struct(fields) => {
            if let Some(f) = fields.iter().find(|f| f.name == field) {
                return Some(Operand::Value(f.ty.clone()));
            }
            if depth >= MAX_EMBED_DEPTH {
                return None;
            }
            fields
                .iter()
                .filter(|f| f.embedded)
                .find_map(|f| select_at_depth(&f.ty, field, env, depth + 1))
        }
        Type::Interface(iface) => interface_method(base, &iface, field, env, depth),
        _ => None,
    }
}

fn method_of(path: &str, type_name: &str, method: &str, env: &mut TypeEnv) -> Option<Operand> {
    let def = env.packages.get(path)?.methods.get(type_name)?.get(method).copied()?;
    let (sig, groups) = func_signature(def, env)?;
    let callee = Callee {
        package: path.to_string(),
        name: format!("{type_name}.{method}"),
        sig: sig.clone(),
        groups,
    };
    Some(Operand::Func(sig, Some(callee)))
}

fn interface_method(
    owner: &Type,
    iface: &InterfaceType,
    method: &str,
    env: &mut TypeEnv,
    depth: usize,
) -> Option<Operand> {
    if let Some(m) = iface.methods.iter().find(|m| m.name == method) {
        return Some(match owner {
            Type::Named { path, name } if !path.is_empty() => Operand::Func(
                m.sig.clone(),
                Some(Callee {
                    package: path.clone(),
                    name: format!("{name}.{method}"),
                    sig: m.sig.clone(),
                    groups: m.groups.clone(),
                }),
            ),
            _ => Operand::Value(Type::Signature(m.sig.clone())),
        });
    }
    if depth >= MAX_EMBED_DEPTH {
        return None;
    }
    for embed in &iface.embeds {
        if let Type::Interface(inner) = underlying(embed, env) {
            if let Some(op) = interface_method(embed, &inner, method, env, depth + 1) {
                return Some(op);
            }
        }
    }
    None
}
