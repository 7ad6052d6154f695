use std::collections::HashMap;

use tracing::debug;

use crate::loader::Program;
use crate::parser::ast::{FuncDecl, TypeSpec, ValueSpec};
use crate::span::Span;

use super::types::{BasicKind, Signature, Type};
use super::{CallInfo, Callee, TypeInfo};

/// What a name refers to inside a function body.
#[derive(Debug, Clone)]
pub enum Entity {
    Var(Type),
    TypeName(Type),
    /// A local bound by `:=` or an untyped `var` to a function literal or a
    /// declared function. Calls through it see that function.
    Func(Signature, Option<Callee>),
}

/// A package-level type declaration.
#[derive(Debug, Clone, Copy)]
pub struct TypeDef<'p> {
    pub file_id: u32,
    pub spec: &'p TypeSpec,
}

#[derive(Debug, Clone, Copy)]
pub struct FuncDef<'p> {
    pub file_id: u32,
    pub decl: &'p FuncDecl,
}

/// A package-level `var` or `const` name. `index` selects the name within
/// its spec; `spec` is the spec whose type and values apply, which for a
/// constant continuing an earlier line is that earlier spec.
#[derive(Debug, Clone, Copy)]
pub struct ValueDef<'p> {
    pub file_id: u32,
    pub spec: &'p ValueSpec,
    pub index: usize,
    pub is_const: bool,
}

/// Package-level declarations of one package, borrowed from the program.
#[derive(Debug, Default)]
pub struct PackageScope<'p> {
    pub name: String,
    pub types: HashMap<String, TypeDef<'p>>,
    pub funcs: HashMap<String, FuncDef<'p>>,
    pub values: HashMap<String, ValueDef<'p>>,
    /// Receiver base type name → method name → declaration.
    pub methods: HashMap<String, HashMap<String, FuncDef<'p>>>,
}

/// Import bindings of one file.
#[derive(Debug, Default, Clone)]
pub struct FileCtx {
    pub package: String,
    /// Binding name → import path.
    pub imports: HashMap<String, String>,
}

pub type SigFacts = (Signature, Vec<usize>);

pub struct TypeEnv<'p> {
    pub program: &'p Program,
    /// Keyed by import path.
    pub packages: HashMap<String, PackageScope<'p>>,
    pub files: HashMap<u32, FileCtx>,
    /// The file currently being checked.
    pub ctx: FileCtx,
    pub file_id: u32,
    scopes: Vec<HashMap<String, Entity>>,
    /// Underlying types of declared types; `None` marks in-progress or failed.
    pub underlying_cache: HashMap<(String, String), Option<Type>>,
    pub value_cache: HashMap<(String, String), Option<Type>>,
    /// Signatures of declared functions and methods, keyed by name span.
    pub sig_cache: HashMap<Span, Option<SigFacts>>,
    pub info: TypeInfo,
}

impl<'p> TypeEnv<'p> {
    pub fn new(program: &'p Program) -> Self {
        Self {
            program,
            packages: HashMap::new(),
            files: HashMap::new(),
            ctx: FileCtx::default(),
            file_id: 0,
            scopes: Vec::new(),
            underlying_cache: HashMap::new(),
            value_cache: HashMap::new(),
            sig_cache: HashMap::new(),
            info: TypeInfo::default(),
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    pub fn define(&mut self, name: &str, entity: Entity) {
        if name == "_" {
            return;
        }
        if self.scopes.is_empty() {
            self.push_scope();
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), entity);
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Entity> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    pub fn scope_depth(&self) -> usize {
        self.scopes.len()
    }

    /// Make `file_id` the current file with an empty scope stack.
    pub fn enter_file(&mut self, file_id: u32) {
        self.ctx = self.files.get(&file_id).cloned().unwrap_or_default();
        self.file_id = file_id;
        self.scopes.clear();
    }

    /// Run `f` in the context of another file, restoring the current file and
    /// its scopes afterwards. Used to resolve declarations lazily.
    pub fn in_file<T>(&mut self, file_id: u32, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved_ctx = std::mem::take(&mut self.ctx);
        let saved_scopes = std::mem::take(&mut self.scopes);
        let saved_file = self.file_id;
        self.enter_file(file_id);
        let result = f(self);
        self.ctx = saved_ctx;
        self.scopes = saved_scopes;
        self.file_id = saved_file;
        result
    }

    pub fn record(&mut self, span: Span, ty: Type) {
        self.info.types.insert(span, ty);
    }

    pub fn record_call(&mut self, span: Span, call: CallInfo) {
        self.info.calls.insert(span, call);
    }

    pub fn note_unresolved(&mut self, span: Span, what: &str) {
        self.info.unresolved += 1;
        debug!(file_id = span.file_id, start = span.start, end = span.end, "unresolved {what}");
    }
}

/// Predeclared type names.
pub fn universe_type(name: &str) -> Option<Type> {
    let kind = match name {
        "bool" => BasicKind::Bool,
        "string" => BasicKind::String,
        "int" => BasicKind::Int,
        "int8" => BasicKind::Int8,
        "int16" => BasicKind::Int16,
        "int32" | "rune" => BasicKind::Int32,
        "int64" => BasicKind::Int64,
        "uint" => BasicKind::Uint,
        "uint8" | "byte" => BasicKind::Uint8,
        "uint16" => BasicKind::Uint16,
        "uint32" => BasicKind::Uint32,
        "uint64" => BasicKind::Uint64,
        "uintptr" => BasicKind::Uintptr,
        "float32" => BasicKind::Float32,
        "float64" => BasicKind::Float64,
        "complex64" => BasicKind::Complex64,
        "complex128" => BasicKind::Complex128,
        "error" => return Some(Type::error()),
        "any" => return Some(Type::any()),
        _ => return None,
    };
    Some(Type::Basic(kind))
}

/// Predeclared constants and `nil`.
pub fn universe_value(name: &str) -> Option<Type> {
    match name {
        "true" | "false" => Some(Type::Basic(BasicKind::UntypedBool)),
        "nil" => Some(Type::Basic(BasicKind::UntypedNil)),
        "iota" => Some(Type::Basic(BasicKind::UntypedInt)),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Append,
    Cap,
    Clear,
    Close,
    Complex,
    Copy,
    Delete,
    Imag,
    Len,
    Make,
    Max,
    Min,
    New,
    Panic,
    Print,
    Println,
    Real,
    Recover,
}

pub fn universe_builtin(name: &str) -> Option<Builtin> {
    let builtin = match name {
        "append" => Builtin::Append,
        "cap" => Builtin::Cap,
        "clear" => Builtin::Clear,
        "close" => Builtin::Close,
        "complex" => Builtin::Complex,
        "copy" => Builtin::Copy,
        "delete" => Builtin::Delete,
        "imag" => Builtin::Imag,
        "len" => Builtin::Len,
        "make" => Builtin::Make,
        "max" => Builtin::Max,
        "min" => Builtin::Min,
        "new" => Builtin::New,
        "panic" => Builtin::Panic,
        "print" => Builtin::Print,
        "println" => Builtin::Println,
        "real" => Builtin::Real,
        "recover" => Builtin::Recover,
        _ => return None,
    };
    Some(builtin)
}
