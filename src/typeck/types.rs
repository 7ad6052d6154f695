use std::fmt;

use crate::parser::ast::ChanDir;

/// Predeclared scalar kinds, plus the kinds of untyped constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicKind {
    Bool,
    String,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    UntypedBool,
    UntypedInt,
    UntypedRune,
    UntypedFloat,
    UntypedComplex,
    UntypedString,
    UntypedNil,
}

impl BasicKind {
    pub fn name(self) -> &'static str {
        match self {
            BasicKind::Bool => "bool",
            BasicKind::String => "string",
            BasicKind::Int => "int",
            BasicKind::Int8 => "int8",
            BasicKind::Int16 => "int16",
            BasicKind::Int32 => "int32",
            BasicKind::Int64 => "int64",
            BasicKind::Uint => "uint",
            BasicKind::Uint8 => "uint8",
            BasicKind::Uint16 => "uint16",
            BasicKind::Uint32 => "uint32",
            BasicKind::Uint64 => "uint64",
            BasicKind::Uintptr => "uintptr",
            BasicKind::Float32 => "float32",
            BasicKind::Float64 => "float64",
            BasicKind::Complex64 => "complex64",
            BasicKind::Complex128 => "complex128",
            BasicKind::UntypedBool => "untyped bool",
            BasicKind::UntypedInt => "untyped int",
            BasicKind::UntypedRune => "untyped rune",
            BasicKind::UntypedFloat => "untyped float",
            BasicKind::UntypedComplex => "untyped complex",
            BasicKind::UntypedString => "untyped string",
            BasicKind::UntypedNil => "untyped nil",
        }
    }

    pub fn is_untyped(self) -> bool {
        matches!(
            self,
            BasicKind::UntypedBool
                | BasicKind::UntypedInt
                | BasicKind::UntypedRune
                | BasicKind::UntypedFloat
                | BasicKind::UntypedComplex
                | BasicKind::UntypedString
                | BasicKind::UntypedNil
        )
    }

    pub fn is_string(self) -> bool {
        matches!(self, BasicKind::String | BasicKind::UntypedString)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Basic(BasicKind),
    /// A declared type, identified by its package's import path. Predeclared
    /// `error` has an empty path.
    Named { path: String, name: String },
    Pointer(Box<Type>),
    Slice(Box<Type>),
    Array { len: Option<u64>, elem: Box<Type> },
    Map { key: Box<Type>, value: Box<Type> },
    Chan { dir: ChanDir, elem: Box<Type> },
    Signature(Signature),
    Interface(InterfaceType),
    Struct(Vec<StructField>),
    /// Result of a call with zero or several results.
    Tuple(Vec<Type>),
    /// A type parameter, opaque inside its generic declaration.
    Param(String),
}

/// Parameters are listed per name, so `func(a, b int)` has two.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Signature {
    pub params: Vec<Type>,
    pub results: Vec<Type>,
    /// The last parameter is `...T`; it is stored as `[]T`.
    pub variadic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct InterfaceType {
    pub methods: Vec<Method>,
    pub embeds: Vec<Type>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Method {
    pub name: String,
    pub sig: Signature,
    /// Number of names in each declared parameter field.
    pub groups: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructField {
    pub name: String,
    pub ty: Type,
    pub embedded: bool,
}

impl Type {
    pub fn basic(kind: BasicKind) -> Self {
        Type::Basic(kind)
    }

    pub fn named(path: impl Into<String>, name: impl Into<String>) -> Self {
        Type::Named { path: path.into(), name: name.into() }
    }

    pub fn error() -> Self {
        Type::named("", "error")
    }

    pub fn any() -> Self {
        Type::Interface(InterfaceType::default())
    }

    /// Strip exactly one level of pointer indirection.
    pub fn strip_pointer(&self) -> &Type {
        match self {
            Type::Pointer(inner) => inner,
            other => other,
        }
    }

    /// The type an untyped constant takes when bound to a variable.
    pub fn default_type(self) -> Type {
        match self {
            Type::Basic(BasicKind::UntypedBool) => Type::Basic(BasicKind::Bool),
            Type::Basic(BasicKind::UntypedInt) => Type::Basic(BasicKind::Int),
            Type::Basic(BasicKind::UntypedRune) => Type::Basic(BasicKind::Int32),
            Type::Basic(BasicKind::UntypedFloat) => Type::Basic(BasicKind::Float64),
            Type::Basic(BasicKind::UntypedComplex) => Type::Basic(BasicKind::Complex128),
            Type::Basic(BasicKind::UntypedString) => Type::Basic(BasicKind::String),
            other => other,
        }
    }

    pub fn is_untyped(&self) -> bool {
        matches!(self, Type::Basic(kind) if kind.is_untyped())
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Basic(kind) => f.write_str(kind.name()),
            Type::Named { path, name } if path.is_empty() => f.write_str(name),
            Type::Named { path, name } => write!(f, "{path}.{name}"),
            Type::Pointer(inner) => write!(f, "*{inner}"),
            Type::Slice(elem) => write!(f, "[]{elem}"),
            Type::Array { len: Some(n), elem } => write!(f, "[{n}]{elem}"),
            Type::Array { len: None, elem } => write!(f, "[?]{elem}"),
            Type::Map { key, value } => write!(f, "map[{key}]{value}"),
            Type::Chan { dir: ChanDir::Both, elem } => write!(f, "chan {elem}"),
            Type::Chan { dir: ChanDir::Send, elem } => write!(f, "chan<- {elem}"),
            Type::Chan { dir: ChanDir::Recv, elem } => write!(f, "<-chan {elem}"),
            Type::Signature(sig) => write!(f, "func{sig}"),
            Type::Interface(iface) if iface.methods.is_empty() && iface.embeds.is_empty() => {
                f.write_str("interface{}")
            }
            Type::Interface(iface) => {
                f.write_str("interface{")?;
                let mut first = true;
                for embed in &iface.embeds {
                    if !first {
                        f.write_str("; ")?;
                    }
                    first = false;
                    write!(f, "{embed}")?;
                }
                for method in &iface.methods {
                    if !first {
                        f.write_str("; ")?;
                    }
                    first = false;
                    write!(f, "{}{}", method.name, method.sig)?;
                }
                f.write_str("}")
            }
            Type::Struct(fields) => {
                f.write_str("struct{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    if field.embedded {
                        write!(f, "{}", field.ty)?;
                    } else {
                        write!(f, "{} {}", field.name, field.ty)?;
                    }
                }
                f.write_str("}")
            }
            Type::Tuple(types) => {
                f.write_str("(")?;
                write_list(f, types)?;
                f.write_str(")")
            }
            Type::Param(name) => f.write_str(name),
        }
    }
}

/// Prints `(params) results` without the leading `func`.
impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match param {
                Type::Slice(elem) if self.variadic && i + 1 == self.params.len() => write!(f, "...{elem}")?,
                _ => write!(f, "{param}")?,
            }
        }
        f.write_str(")")?;
        match self.results.as_slice() {
            [] => Ok(()),
            [single] => write!(f, " {single}"),
            many => {
                f.write_str(" (")?;
                write_list(f, many)?;
                f.write_str(")")
            }
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, types: &[Type]) -> fmt::Result {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{ty}")?;
    }
    Ok(())
}
