use crate::parser::ast::*;

use super::env::{FileCtx, FuncDef, PackageScope, TypeDef, TypeEnv, ValueDef};

/// Pass 0: index every package-level declaration and every file's imports.
/// Nothing is resolved here; resolution happens lazily on first use.
pub fn register_program(env: &mut TypeEnv) {
    let program = env.program;
    for pkg in &program.packages {
        for unit in &pkg.units {
            let mut imports = std::collections::HashMap::new();
            for spec in &unit.file.imports {
                let binding = spec.node.binding_name();
                if binding == "_" || binding == "." {
                    continue;
                }
                imports.insert(binding.to_string(), spec.node.path.node.clone());
            }
            env.files.insert(
                unit.file_id,
                FileCtx { package: pkg.import_path.clone(), imports },
            );

            let scope = env
                .packages
                .entry(pkg.import_path.clone())
                .or_insert_with(|| PackageScope { name: pkg.name.clone(), ..Default::default() });
            for decl in &unit.file.decls {
                register_decl(scope, unit.file_id, &decl.node);
            }
        }
    }
}

fn register_decl<'p>(scope: &mut PackageScope<'p>, file_id: u32, decl: &'p Decl) {
    match decl {
        Decl::Func(func) => {
            let def = FuncDef { file_id, decl: func };
            match &func.recv {
                Some(recv) => {
                    let base = receiver_base(&recv.node.ty.node).to_string();
                    scope.methods.entry(base).or_default().insert(func.name.node.clone(), def);
                }
                None if func.name.node == "init" || func.name.node == "_" => {}
                None => {
                    scope.funcs.insert(func.name.node.clone(), def);
                }
            }
        }
        Decl::Type(specs) => {
            for spec in specs {
                scope.types.insert(spec.node.name.node.clone(), TypeDef { file_id, spec: &spec.node });
            }
        }
        Decl::Var(specs) => {
            for spec in specs {
                for (index, name) in spec.node.names.iter().enumerate() {
                    scope.values.insert(
                        name.node.clone(),
                        ValueDef { file_id, spec: &spec.node, index, is_const: false },
                    );
                }
            }
        }
        Decl::Const(specs) => {
            // A constant spec with neither type nor values repeats the
            // previous spec's (the `iota` idiom).
            let mut carrier: Option<&'p ValueSpec> = None;
            for spec in specs {
                if spec.node.ty.is_some() || !spec.node.values.is_empty() {
                    carrier = Some(&spec.node);
                }
                let source = carrier.unwrap_or(&spec.node);
                for (index, name) in spec.node.names.iter().enumerate() {
                    scope.values.insert(
                        name.node.clone(),
                        ValueDef { file_id, spec: source, index, is_const: true },
                    );
                }
            }
        }
    }
}

/// `T` for receivers `T`, `*T`, `(T)` and `*T[K, V]`.
pub fn receiver_base(ty: &TypeExpr) -> &str {
    match ty {
        TypeExpr::Named(name) => name,
        TypeExpr::Pointer(inner) | TypeExpr::Paren(inner) => receiver_base(&inner.node),
        TypeExpr::Instance { base, .. } => receiver_base(&base.node),
        _ => "",
    }
}
