//! Whole-program type resolution.
//!
//! The resolver never reports type errors. Whatever it cannot resolve is
//! simply absent from the resulting [`TypeInfo`], which downstream passes treat
//! as "not a match".

pub mod check;
pub mod env;
pub mod infer;
pub mod register;
pub mod resolve;
pub mod types;

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::loader::Program;
use crate::span::Span;
use env::TypeEnv;
use types::{Signature, Type};

/// Read access to resolved type facts, keyed by the span of the expression or
/// type expression they describe. Spans travel with AST nodes, so lookups stay
/// valid after entries of a list have been reordered.
pub trait TypeOracle {
    fn type_of(&self, span: Span) -> Option<&Type>;

    /// Facts for a call of a declared function, method, function literal or
    /// function-typed value. Absent for conversions, builtins and calls of
    /// unknown callees.
    fn call_info(&self, call: Span) -> Option<&CallInfo>;
}

/// The declared function, method or interface method a call refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Callee {
    /// Import path of the declaring package.
    pub package: String,
    /// `Func`, or `Type.Method` for methods and interface methods.
    pub name: String,
    pub sig: Signature,
    /// Number of names in each declared parameter field.
    pub groups: Vec<usize>,
}

impl fmt::Display for Callee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.package, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallInfo {
    pub sig: Signature,
    /// `None` when the callee is a function literal or a function-typed value
    /// rather than a declaration.
    pub callee: Option<Callee>,
    /// True when the signature comes from a function type (a parameter,
    /// field, result or typed variable) rather than a function or literal.
    pub through_type: bool,
}

#[derive(Debug, Default)]
pub struct TypeInfo {
    types: HashMap<Span, Type>,
    calls: HashMap<Span, CallInfo>,
    unresolved: usize,
}

impl TypeInfo {
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// How many expressions or type expressions could not be resolved.
    pub fn unresolved_count(&self) -> usize {
        self.unresolved
    }

    pub fn calls(&self) -> impl Iterator<Item = (&Span, &CallInfo)> {
        self.calls.iter()
    }

    pub fn insert(&mut self, span: Span, ty: Type) {
        self.types.insert(span, ty);
    }
}

impl TypeOracle for TypeInfo {
    fn type_of(&self, span: Span) -> Option<&Type> {
        self.types.get(&span)
    }

    fn call_info(&self, call: Span) -> Option<&CallInfo> {
        self.calls.get(&call)
    }
}

/// Resolve types across every package of the program, stubs included.
pub fn check_program(program: &Program) -> TypeInfo {
    let mut env = TypeEnv::new(program);
    register::register_program(&mut env);
    check::check_program_bodies(&mut env);
    debug!(
        types = env.info.len(),
        calls = env.info.calls.len(),
        unresolved = env.info.unresolved,
        "type resolution finished"
    );
    env.info
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oracle_lookups_are_span_exact() {
        let mut info = TypeInfo::default();
        let ctx = Type::named("context", "Context");
        info.insert(Span::with_file(4, 7, 1), ctx.clone());
        assert_eq!(info.type_of(Span::with_file(4, 7, 1)), Some(&ctx));
        assert_eq!(info.type_of(Span::with_file(4, 7, 2)), None);
        assert_eq!(info.type_of(Span::with_file(4, 8, 1)), None);
        assert!(info.call_info(Span::with_file(4, 7, 1)).is_none());
    }

    #[test]
    fn callee_display_is_package_qualified() {
        let callee = Callee {
            package: "example.com/app/store".to_string(),
            name: "DB.Get".to_string(),
            sig: Signature::default(),
            groups: Vec::new(),
        };
        assert_eq!(callee.to_string(), "example.com/app/store.DB.Get");
    }
}
