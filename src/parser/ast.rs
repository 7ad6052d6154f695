use crate::span::Spanned;

/// One parsed source file.
#[derive(Debug, Clone)]
pub struct File {
    pub package: Spanned<String>,
    pub imports: Vec<Spanned<ImportSpec>>,
    pub decls: Vec<Spanned<Decl>>,
}

#[derive(Debug, Clone)]
pub struct ImportSpec {
    /// Explicit binding: an identifier, `.` or `_`.
    pub name: Option<Spanned<String>>,
    /// Import path without quotes.
    pub path: Spanned<String>,
}

impl ImportSpec {
    /// The name this import binds in the file scope: the alias if present,
    /// otherwise the last path segment.
    pub fn binding_name(&self) -> &str {
        match &self.name {
            Some(name) => &name.node,
            None => self.path.node.rsplit('/').next().unwrap_or(&self.path.node),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Decl {
    Func(FuncDecl),
    Type(Vec<Spanned<TypeSpec>>),
    Var(Vec<Spanned<ValueSpec>>),
    Const(Vec<Spanned<ValueSpec>>),
}

#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub recv: Option<Spanned<Field>>,
    pub name: Spanned<String>,
    /// `[K comparable, V any]`; each field's type is the constraint.
    pub type_params: Vec<Spanned<Field>>,
    pub sig: FuncType,
    pub body: Option<Spanned<Block>>,
}

/// Parameter and result lists of a function.
#[derive(Debug, Clone, Default)]
pub struct FuncType {
    pub params: Vec<Spanned<Field>>,
    pub results: Vec<Spanned<Field>>,
}

impl FuncType {
    /// True when the last parameter is `...T`.
    pub fn is_variadic(&self) -> bool {
        self.params
            .last()
            .is_some_and(|p| matches!(p.node.ty.node, TypeExpr::Ellipsis(_)))
    }
}

/// A parameter, result, receiver or struct field entry: zero or more names
/// sharing one type (`a, b int`).
#[derive(Debug, Clone)]
pub struct Field {
    pub names: Vec<Spanned<String>>,
    pub ty: Spanned<TypeExpr>,
    pub tag: Option<Spanned<String>>,
}

#[derive(Debug, Clone)]
pub struct TypeSpec {
    pub name: Spanned<String>,
    pub type_params: Vec<Spanned<Field>>,
    /// `type A = B`
    pub alias: bool,
    pub ty: Spanned<TypeExpr>,
}

#[derive(Debug, Clone)]
pub struct ValueSpec {
    pub names: Vec<Spanned<String>>,
    pub ty: Option<Spanned<TypeExpr>>,
    pub values: Vec<Spanned<Expr>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

#[derive(Debug, Clone)]
pub enum TypeExpr {
    Named(String),
    Qualified { package: Spanned<String>, name: Spanned<String> },
    Pointer(Box<Spanned<TypeExpr>>),
    Slice(Box<Spanned<TypeExpr>>),
    Array { len: Option<Box<Spanned<Expr>>>, elem: Box<Spanned<TypeExpr>> },
    Map { key: Box<Spanned<TypeExpr>>, value: Box<Spanned<TypeExpr>> },
    Chan { dir: ChanDir, elem: Box<Spanned<TypeExpr>> },
    Func(FuncType),
    Interface(Vec<Spanned<InterfaceElem>>),
    Struct(Vec<Spanned<Field>>),
    /// `...T` in the final parameter position
    Ellipsis(Box<Spanned<TypeExpr>>),
    Paren(Box<Spanned<TypeExpr>>),
    /// `List[int]`, `pkg.Map[K, V]`
    Instance { base: Box<Spanned<TypeExpr>>, args: Vec<Spanned<TypeExpr>> },
    /// `~T` in a constraint
    Underlying(Box<Spanned<TypeExpr>>),
    /// `A | ~B` in a constraint
    Union(Vec<Spanned<TypeExpr>>),
}

#[derive(Debug, Clone)]
pub enum InterfaceElem {
    Method { name: Spanned<String>, sig: FuncType },
    Embedded(Spanned<TypeExpr>),
}

#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Spanned<Stmt>>,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Block(Block),
    Expr(Spanned<Expr>),
    /// `a, b := x, y`
    Define { lhs: Vec<Spanned<Expr>>, rhs: Vec<Spanned<Expr>> },
    /// `a, b = x, y` and `a op= x`
    Assign { lhs: Vec<Spanned<Expr>>, op: AssignOp, rhs: Vec<Spanned<Expr>> },
    IncDec { target: Spanned<Expr>, inc: bool },
    Send { channel: Spanned<Expr>, value: Spanned<Expr> },
    Decl(Decl),
    Return(Vec<Spanned<Expr>>),
    If {
        init: Option<Box<Spanned<Stmt>>>,
        cond: Spanned<Expr>,
        then_block: Spanned<Block>,
        /// Either another `If` or a `Block`.
        else_branch: Option<Box<Spanned<Stmt>>>,
    },
    For {
        init: Option<Box<Spanned<Stmt>>>,
        cond: Option<Spanned<Expr>>,
        post: Option<Box<Spanned<Stmt>>>,
        body: Spanned<Block>,
    },
    Range {
        key: Option<Spanned<Expr>>,
        value: Option<Spanned<Expr>>,
        define: bool,
        expr: Spanned<Expr>,
        body: Spanned<Block>,
    },
    Switch {
        init: Option<Box<Spanned<Stmt>>>,
        tag: Option<Spanned<Expr>>,
        clauses: Vec<Spanned<CaseClause>>,
    },
    TypeSwitch {
        init: Option<Box<Spanned<Stmt>>>,
        binding: Option<Spanned<String>>,
        subject: Spanned<Expr>,
        clauses: Vec<Spanned<TypeCaseClause>>,
    },
    Select { clauses: Vec<Spanned<CommClause>> },
    Go(Spanned<Expr>),
    Defer(Spanned<Expr>),
    Labeled { label: Spanned<String>, stmt: Box<Spanned<Stmt>> },
    Branch { kind: BranchKind, label: Option<Spanned<String>> },
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    Break,
    Continue,
    Goto,
    Fallthrough,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    AndNot,
}

#[derive(Debug, Clone)]
pub struct CaseClause {
    /// Empty for `default`.
    pub exprs: Vec<Spanned<Expr>>,
    pub is_default: bool,
    pub body: Vec<Spanned<Stmt>>,
}

#[derive(Debug, Clone)]
pub struct TypeCaseClause {
    /// Empty for `default`. `nil` appears as `TypeExpr::Named("nil")`.
    pub types: Vec<Spanned<TypeExpr>>,
    pub is_default: bool,
    pub body: Vec<Spanned<Stmt>>,
}

#[derive(Debug, Clone)]
pub struct CommClause {
    /// `None` for `default`; otherwise a send, receive or receive-assignment.
    pub comm: Option<Box<Spanned<Stmt>>>,
    pub body: Vec<Spanned<Stmt>>,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Ident(String),
    IntLit(String),
    FloatLit(String),
    /// `2i`, `1.5e3i`
    ImagLit(String),
    RuneLit(String),
    StringLit(String),
    Selector { object: Box<Spanned<Expr>>, field: Spanned<String> },
    Call { func: Box<Spanned<Expr>>, args: Vec<Spanned<Expr>>, spread: bool },
    Index { object: Box<Spanned<Expr>>, index: Box<Spanned<Expr>> },
    /// `f[K, V]`: an instantiation with several type arguments. A single
    /// argument parses as `Index`.
    Instance { object: Box<Spanned<Expr>>, args: Vec<Spanned<Expr>> },
    Slice {
        object: Box<Spanned<Expr>>,
        low: Option<Box<Spanned<Expr>>>,
        high: Option<Box<Spanned<Expr>>>,
        max: Option<Box<Spanned<Expr>>>,
    },
    TypeAssert { object: Box<Spanned<Expr>>, ty: Box<Spanned<TypeExpr>> },
    Unary { op: UnaryOp, operand: Box<Spanned<Expr>> },
    Binary { op: BinOp, lhs: Box<Spanned<Expr>>, rhs: Box<Spanned<Expr>> },
    Paren(Box<Spanned<Expr>>),
    FuncLit { sig: FuncType, body: Spanned<Block> },
    /// `T{...}`; `ty` is `None` for elided inner literals like `{1, 2}` in `[]P{{1, 2}}`.
    Composite { ty: Option<Box<Spanned<TypeExpr>>>, elements: Vec<Spanned<Expr>> },
    /// `key: value` inside a composite literal
    KeyValue { key: Box<Spanned<Expr>>, value: Box<Spanned<Expr>> },
    /// A type in expression position: `[]byte(s)`, `make(map[string]int)`.
    Type(Box<Spanned<TypeExpr>>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
    BitNot,
    Deref,
    AddrOf,
    Recv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    AndNot,
    LogAnd,
    LogOr,
    Eq,
    Neq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl BinOp {
    pub fn is_comparison(self) -> bool {
        matches!(self, BinOp::Eq | BinOp::Neq | BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq)
    }

    pub fn is_shift(self) -> bool {
        matches!(self, BinOp::Shl | BinOp::Shr)
    }
}
