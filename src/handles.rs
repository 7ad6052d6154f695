//! The set of handle-like types and the matcher that decides membership.

use std::fmt;

use crate::span::Span;
use crate::typeck::types::Type;
use crate::typeck::TypeOracle;

/// Handle types recognised when no configuration overrides them.
pub const DEFAULT_HANDLE_TYPES: [&str; 3] = [
    "context.Context",
    "go.mongodb.org/mongo-driver/mongo.SessionContext",
    "github.com/gin-gonic/gin.Context",
];

/// Fully-qualified type names (`import/path.Name`) treated as handles.
/// Order is preserved; duplicates are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleTypeSet {
    names: Vec<String>,
}

impl HandleTypeSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self { names: Vec::new() };
        for name in names {
            let name = name.into();
            if !set.names.contains(&name) {
                set.names.push(name);
            }
        }
        set
    }

    /// True when `ty`, after stripping at most one pointer, prints as one of
    /// the configured names.
    pub fn matches(&self, ty: &Type) -> bool {
        let canonical = ty.strip_pointer().to_string();
        self.names.iter().any(|name| *name == canonical)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for HandleTypeSet {
    fn default() -> Self {
        Self::new(DEFAULT_HANDLE_TYPES)
    }
}

impl fmt::Display for HandleTypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names.join(", "))
    }
}

/// Whether the node at `span` has a handle-like static type. Unresolved
/// nodes never match.
pub fn is_handle_type(span: Span, oracle: &impl TypeOracle, handles: &HandleTypeSet) -> bool {
    oracle.type_of(span).is_some_and(|ty| handles.matches(ty))
}
