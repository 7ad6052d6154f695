pub mod ast;

use crate::diagnostics::Error;
use crate::lexer::token::Token;
use crate::span::{Span, Spanned};
use ast::*;

pub struct Parser<'a> {
    tokens: &'a [Spanned<Token>],
    source: &'a str,
    file_id: u32,
    pos: usize,
    /// Set while parsing `if`/`for`/`switch` headers, where `T {` opens the
    /// body instead of a composite literal.
    restrict_composite_lit: bool,
}

/// Lex and parse one source unit.
pub fn parse_file(source: &str, file_id: u32) -> Result<File, Error> {
    let tokens = crate::lexer::lex(source, file_id)?;
    let mut parser = Parser::new(&tokens, source, file_id);
    parser.parse_file()
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Spanned<Token>], source: &'a str, file_id: u32) -> Self {
        Self { tokens, source, file_id, pos: 0, restrict_composite_lit: false }
    }

    // ── Token cursor ─────────────────────────────────────────────────

    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).map(|t| t.node)
    }

    fn peek_nth(&self, n: usize) -> Option<Token> {
        self.tokens.get(self.pos + n).map(|t| t.node)
    }

    fn at(&self, tok: Token) -> bool {
        self.peek() == Some(tok)
    }

    fn eat(&mut self, tok: Token) -> bool {
        if self.at(tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn advance(&mut self) -> Option<&'a Spanned<Token>> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn cur_span(&self) -> Span {
        self.tokens.get(self.pos).map(|t| t.span).unwrap_or_else(|| self.eof_span())
    }

    fn start(&self) -> usize {
        self.cur_span().start
    }

    fn prev_end(&self) -> usize {
        if self.pos == 0 {
            0
        } else {
            self.tokens[self.pos - 1].span.end
        }
    }

    fn span_from(&self, start: usize) -> Span {
        Span::with_file(start, self.prev_end().max(start), self.file_id)
    }

    fn eof_span(&self) -> Span {
        Span::with_file(self.source.len(), self.source.len(), self.file_id)
    }

    fn text(&self, span: Span) -> &'a str {
        &self.source[span.range()]
    }

    fn unexpected(&self, what: &str) -> Error {
        match self.tokens.get(self.pos) {
            Some(tok) => Error::syntax(format!("expected {what}, found {}", tok.node), tok.span),
            None => Error::syntax(format!("expected {what}, found end of file"), self.eof_span()),
        }
    }

    fn expect(&mut self, expected: Token) -> Result<Span, Error> {
        if self.at(expected) {
            let span = self.tokens[self.pos].span;
            self.pos += 1;
            Ok(span)
        } else {
            Err(self.unexpected(&expected.to_string()))
        }
    }

    fn expect_ident(&mut self) -> Result<Spanned<String>, Error> {
        if self.at(Token::Ident) {
            let span = self.tokens[self.pos].span;
            self.pos += 1;
            Ok(Spanned::new(self.text(span).to_string(), span))
        } else {
            Err(self.unexpected("identifier"))
        }
    }

    /// A statement or declaration terminator. Go lets the semicolon be
    /// omitted before a closing `)` or `}`.
    fn expect_semi(&mut self) -> Result<(), Error> {
        match self.peek() {
            Some(Token::Semi) => {
                self.pos += 1;
                Ok(())
            }
            Some(Token::RParen) | Some(Token::RBrace) | None => Ok(()),
            Some(_) => Err(self.unexpected("';' or newline")),
        }
    }

    fn with_restriction<T>(
        &mut self,
        restrict: bool,
        f: impl FnOnce(&mut Self) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let saved = self.restrict_composite_lit;
        self.restrict_composite_lit = restrict;
        let result = f(self);
        self.restrict_composite_lit = saved;
        result
    }

    // ── File & declarations ──────────────────────────────────────────

    pub fn parse_file(&mut self) -> Result<File, Error> {
        self.expect(Token::Package)?;
        let package = self.expect_ident()?;
        self.expect_semi()?;

        let mut imports = Vec::new();
        while self.at(Token::Import) {
            imports.extend(self.parse_import_decl()?);
            self.expect_semi()?;
        }

        let mut decls = Vec::new();
        while self.peek().is_some() {
            if self.eat(Token::Semi) {
                continue;
            }
            decls.push(self.parse_top_decl()?);
            if self.at(Token::RParen) || self.at(Token::RBrace) {
                return Err(self.unexpected("declaration"));
            }
            self.expect_semi()?;
        }

        Ok(File { package, imports, decls })
    }

    fn parse_import_decl(&mut self) -> Result<Vec<Spanned<ImportSpec>>, Error> {
        self.expect(Token::Import)?;
        let mut specs = Vec::new();
        if self.eat(Token::LParen) {
            while !self.at(Token::RParen) {
                specs.push(self.parse_import_spec()?);
                self.expect_semi()?;
            }
            self.expect(Token::RParen)?;
        } else {
            specs.push(self.parse_import_spec()?);
        }
        Ok(specs)
    }

    fn parse_import_spec(&mut self) -> Result<Spanned<ImportSpec>, Error> {
        let start = self.start();
        let name = match self.peek() {
            Some(Token::Ident) => Some(self.expect_ident()?),
            Some(Token::Dot) => {
                let span = self.expect(Token::Dot)?;
                Some(Spanned::new(".".to_string(), span))
            }
            _ => None,
        };
        let path = match self.peek() {
            Some(Token::StringLit) | Some(Token::RawStringLit) => {
                let span = self.cur_span();
                self.pos += 1;
                let raw = self.text(span);
                Spanned::new(raw[1..raw.len() - 1].to_string(), span)
            }
            _ => return Err(self.unexpected("import path")),
        };
        Ok(Spanned::new(ImportSpec { name, path }, self.span_from(start)))
    }

    fn parse_top_decl(&mut self) -> Result<Spanned<Decl>, Error> {
        match self.peek() {
            Some(Token::Func) => {
                let start = self.start();
                let func = self.parse_func_decl()?;
                Ok(Spanned::new(Decl::Func(func), self.span_from(start)))
            }
            Some(Token::Type) | Some(Token::Var) | Some(Token::Const) => self.parse_gen_decl(),
            Some(Token::Import) => Err(Error::syntax(
                "imports must appear before other declarations",
                self.cur_span(),
            )),
            _ => Err(self.unexpected("'func', 'type', 'var' or 'const'")),
        }
    }

    fn parse_gen_decl(&mut self) -> Result<Spanned<Decl>, Error> {
        let start = self.start();
        let decl = match self.advance().map(|t| t.node) {
            Some(Token::Type) => Decl::Type(self.parse_group(Self::parse_type_spec)?),
            Some(Token::Var) => Decl::Var(self.parse_group(Self::parse_value_spec)?),
            Some(Token::Const) => Decl::Const(self.parse_group(Self::parse_value_spec)?),
            _ => return Err(Error::syntax("expected declaration", self.span_from(start))),
        };
        Ok(Spanned::new(decl, self.span_from(start)))
    }

    /// One spec, or a parenthesized group of specs.
    fn parse_group<T>(
        &mut self,
        mut spec: impl FnMut(&mut Self) -> Result<Spanned<T>, Error>,
    ) -> Result<Vec<Spanned<T>>, Error> {
        if !self.eat(Token::LParen) {
            return Ok(vec![spec(self)?]);
        }
        let mut specs = Vec::new();
        while !self.at(Token::RParen) {
            if self.eat(Token::Semi) {
                continue;
            }
            specs.push(spec(self)?);
            self.expect_semi()?;
        }
        self.expect(Token::RParen)?;
        Ok(specs)
    }

    fn parse_type_spec(&mut self) -> Result<Spanned<TypeSpec>, Error> {
        let start = self.start();
        let name = self.expect_ident()?;
        let type_params = if self.at_type_params() { self.parse_type_params()? } else { Vec::new() };
        let alias = self.eat(Token::Eq);
        let ty = self.parse_type()?;
        Ok(Spanned::new(TypeSpec { name, type_params, alias, ty }, self.span_from(start)))
    }

    fn parse_value_spec(&mut self) -> Result<Spanned<ValueSpec>, Error> {
        let start = self.start();
        let mut names = vec![self.expect_ident()?];
        while self.eat(Token::Comma) {
            names.push(self.expect_ident()?);
        }
        let ty = match self.peek() {
            Some(Token::Eq) | Some(Token::Semi) | Some(Token::RParen) | None => None,
            _ => Some(self.parse_type()?),
        };
        let values = if self.eat(Token::Eq) { self.parse_expr_list()? } else { Vec::new() };
        Ok(Spanned::new(ValueSpec { names, ty, values }, self.span_from(start)))
    }

    fn parse_func_decl(&mut self) -> Result<FuncDecl, Error> {
        self.expect(Token::Func)?;
        let recv = if self.at(Token::LParen) {
            let open = self.cur_span();
            let mut fields = self.parse_params()?;
            if fields.len() != 1 {
                return Err(Error::syntax("method must have exactly one receiver", open));
            }
            fields.pop()
        } else {
            None
        };
        let name = self.expect_ident()?;
        let type_params = if self.at(Token::LBracket) { self.parse_type_params()? } else { Vec::new() };
        let sig = self.parse_signature()?;
        let body = if self.at(Token::LBrace) { Some(self.parse_block()?) } else { None };
        Ok(FuncDecl { recv, name, type_params, sig, body })
    }

    fn parse_signature(&mut self) -> Result<FuncType, Error> {
        let params = self.parse_params()?;
        let results = self.parse_results()?;
        Ok(FuncType { params, results })
    }

    fn parse_results(&mut self) -> Result<Vec<Spanned<Field>>, Error> {
        if self.at(Token::LParen) {
            return self.parse_params();
        }
        if self.at_type_start() {
            let ty = self.parse_type()?;
            let span = ty.span;
            return Ok(vec![Spanned::new(Field { names: Vec::new(), ty, tag: None }, span)]);
        }
        Ok(Vec::new())
    }

    fn at_type_start(&self) -> bool {
        match self.peek() {
            Some(Token::Ident)
            | Some(Token::Star)
            | Some(Token::LBracket)
            | Some(Token::Map)
            | Some(Token::Chan)
            | Some(Token::Func)
            | Some(Token::Interface)
            | Some(Token::Struct) => true,
            Some(Token::Arrow) => self.peek_nth(1) == Some(Token::Chan),
            _ => false,
        }
    }

    /// Parse a parenthesized parameter list, applying Go's grouping rules:
    /// either every entry is named (`a, b int, c string`) or none is.
    fn parse_params(&mut self) -> Result<Vec<Spanned<Field>>, Error> {
        self.parse_field_list(Token::LParen, Token::RParen, Self::parse_param_type)
    }

    /// `[T any, K comparable]` after a function or type name.
    fn parse_type_params(&mut self) -> Result<Vec<Spanned<Field>>, Error> {
        let open = self.cur_span();
        let params = self.parse_field_list(Token::LBracket, Token::RBracket, Self::parse_constraint)?;
        if params.iter().any(|p| p.node.names.is_empty()) {
            return Err(Error::syntax("type parameters must be named", open));
        }
        Ok(params)
    }

    /// After a type name, `[` opens type parameters unless it reads as an
    /// array length (`type Buf [N]byte`, `type Grid [N * N]int`).
    fn at_type_params(&self) -> bool {
        self.at(Token::LBracket)
            && self.peek_nth(1) == Some(Token::Ident)
            && matches!(
                self.peek_nth(2),
                Some(Token::Ident)
                    | Some(Token::Comma)
                    | Some(Token::Tilde)
                    | Some(Token::LBracket)
                    | Some(Token::Interface)
                    | Some(Token::Func)
                    | Some(Token::Map)
                    | Some(Token::Chan)
                    | Some(Token::Struct)
            )
    }

    fn parse_field_list(
        &mut self,
        open: Token,
        close: Token,
        elem: fn(&mut Self) -> Result<Spanned<TypeExpr>, Error>,
    ) -> Result<Vec<Spanned<Field>>, Error> {
        self.expect(open)?;
        let mut items: Vec<(Spanned<TypeExpr>, Option<Spanned<TypeExpr>>)> = Vec::new();
        while !self.at(close) {
            let first = elem(self)?;
            if self.at(Token::Comma) || self.at(close) {
                items.push((first, None));
            } else {
                let ty = elem(self)?;
                items.push((first, Some(ty)));
            }
            if !self.eat(Token::Comma) {
                break;
            }
        }
        self.expect(close)?;

        if items.iter().all(|(_, ty)| ty.is_none()) {
            return Ok(items
                .into_iter()
                .map(|(ty, _)| {
                    let span = ty.span;
                    Spanned::new(Field { names: Vec::new(), ty, tag: None }, span)
                })
                .collect());
        }

        let mut fields = Vec::new();
        let mut pending: Vec<Spanned<String>> = Vec::new();
        for (first, ty) in items {
            let name = match first.node {
                TypeExpr::Named(name) => Spanned::new(name, first.span),
                _ => return Err(Error::syntax("mixed named and unnamed parameters", first.span)),
            };
            pending.push(name);
            if let Some(ty) = ty {
                let names = std::mem::take(&mut pending);
                let span = names[0].span.to(ty.span);
                fields.push(Spanned::new(Field { names, ty, tag: None }, span));
            }
        }
        if let Some(dangling) = pending.first() {
            return Err(Error::syntax("missing parameter type", dangling.span));
        }
        Ok(fields)
    }

    fn parse_param_type(&mut self) -> Result<Spanned<TypeExpr>, Error> {
        let start = self.start();
        if self.eat(Token::Ellipsis) {
            let elem = self.parse_type()?;
            return Ok(Spanned::new(TypeExpr::Ellipsis(Box::new(elem)), self.span_from(start)));
        }
        self.parse_type()
    }

    /// A constraint: a type, `~T`, or a union of those.
    fn parse_constraint(&mut self) -> Result<Spanned<TypeExpr>, Error> {
        let start = self.start();
        let mut terms = vec![self.parse_constraint_term()?];
        while self.eat(Token::Pipe) {
            terms.push(self.parse_constraint_term()?);
        }
        if terms.len() == 1 {
            return Ok(terms.remove(0));
        }
        Ok(Spanned::new(TypeExpr::Union(terms), self.span_from(start)))
    }

    fn parse_constraint_term(&mut self) -> Result<Spanned<TypeExpr>, Error> {
        let start = self.start();
        if self.eat(Token::Tilde) {
            let inner = self.parse_type()?;
            return Ok(Spanned::new(TypeExpr::Underlying(Box::new(inner)), self.span_from(start)));
        }
        self.parse_type()
    }

    /// `[` directly after the previous token, as in `List[int]`. A space
    /// before it (`buf [4]byte`) makes it the start of an array type.
    fn at_adjacent_bracket(&self, n: usize) -> bool {
        match (self.tokens.get(self.pos + n), (self.pos + n).checked_sub(1).and_then(|i| self.tokens.get(i))) {
            (Some(tok), Some(prev)) => tok.node == Token::LBracket && tok.span.start == prev.span.end,
            _ => false,
        }
    }

    // ── Types ────────────────────────────────────────────────────────

    pub fn parse_type(&mut self) -> Result<Spanned<TypeExpr>, Error> {
        let start = self.start();
        let node = match self.peek() {
            Some(Token::Ident) => {
                let first = self.expect_ident()?;
                let base = if self.at(Token::Dot) && self.peek_nth(1) == Some(Token::Ident) {
                    self.pos += 1;
                    let name = self.expect_ident()?;
                    TypeExpr::Qualified { package: first, name }
                } else {
                    TypeExpr::Named(first.node)
                };
                if self.at_adjacent_bracket(0) {
                    let base = Spanned::new(base, self.span_from(start));
                    self.pos += 1;
                    let mut args = vec![self.parse_type()?];
                    while self.eat(Token::Comma) && !self.at(Token::RBracket) {
                        args.push(self.parse_type()?);
                    }
                    self.expect(Token::RBracket)?;
                    TypeExpr::Instance { base: Box::new(base), args }
                } else {
                    base
                }
            }
            Some(Token::Star) => {
                self.pos += 1;
                TypeExpr::Pointer(Box::new(self.parse_type()?))
            }
            Some(Token::LBracket) => {
                self.pos += 1;
                if self.eat(Token::RBracket) {
                    TypeExpr::Slice(Box::new(self.parse_type()?))
                } else if self.eat(Token::Ellipsis) {
                    self.expect(Token::RBracket)?;
                    TypeExpr::Array { len: None, elem: Box::new(self.parse_type()?) }
                } else {
                    let len = self.with_restriction(false, |p| p.parse_expr())?;
                    self.expect(Token::RBracket)?;
                    TypeExpr::Array { len: Some(Box::new(len)), elem: Box::new(self.parse_type()?) }
                }
            }
            Some(Token::Map) => {
                self.pos += 1;
                self.expect(Token::LBracket)?;
                let key = self.parse_type()?;
                self.expect(Token::RBracket)?;
                let value = self.parse_type()?;
                TypeExpr::Map { key: Box::new(key), value: Box::new(value) }
            }
            Some(Token::Chan) => {
                self.pos += 1;
                let dir = if self.eat(Token::Arrow) { ChanDir::Send } else { ChanDir::Both };
                TypeExpr::Chan { dir, elem: Box::new(self.parse_type()?) }
            }
            Some(Token::Arrow) => {
                self.pos += 1;
                self.expect(Token::Chan)?;
                TypeExpr::Chan { dir: ChanDir::Recv, elem: Box::new(self.parse_type()?) }
            }
            Some(Token::Func) => {
                self.pos += 1;
                TypeExpr::Func(self.parse_signature()?)
            }
            Some(Token::Interface) => {
                self.pos += 1;
                TypeExpr::Interface(self.parse_interface_body()?)
            }
            Some(Token::Struct) => {
                self.pos += 1;
                TypeExpr::Struct(self.parse_struct_body()?)
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.parse_type()?;
                self.expect(Token::RParen)?;
                TypeExpr::Paren(Box::new(inner))
            }
            _ => return Err(self.unexpected("type")),
        };
        Ok(Spanned::new(node, self.span_from(start)))
    }

    fn parse_interface_body(&mut self) -> Result<Vec<Spanned<InterfaceElem>>, Error> {
        self.expect(Token::LBrace)?;
        let mut elems = Vec::new();
        while !self.at(Token::RBrace) {
            if self.eat(Token::Semi) {
                continue;
            }
            let start = self.start();
            let elem = if self.at(Token::Ident) && self.peek_nth(1) == Some(Token::LParen) {
                let name = self.expect_ident()?;
                let sig = self.parse_signature()?;
                InterfaceElem::Method { name, sig }
            } else {
                InterfaceElem::Embedded(self.parse_constraint()?)
            };
            elems.push(Spanned::new(elem, self.span_from(start)));
            self.expect_semi()?;
        }
        self.expect(Token::RBrace)?;
        Ok(elems)
    }

    fn parse_struct_body(&mut self) -> Result<Vec<Spanned<Field>>, Error> {
        self.expect(Token::LBrace)?;
        let mut fields = Vec::new();
        while !self.at(Token::RBrace) {
            if self.eat(Token::Semi) {
                continue;
            }
            let start = self.start();
            let embedded = match (self.peek(), self.peek_nth(1)) {
                (Some(Token::Star), _) => true,
                (Some(Token::Ident), Some(Token::LBracket)) => self.at_adjacent_bracket(1),
                (Some(Token::Ident), Some(Token::Dot))
                | (Some(Token::Ident), Some(Token::Semi))
                | (Some(Token::Ident), Some(Token::RBrace))
                | (Some(Token::Ident), Some(Token::StringLit))
                | (Some(Token::Ident), Some(Token::RawStringLit)) => true,
                _ => false,
            };
            let (names, ty) = if embedded {
                (Vec::new(), self.parse_type()?)
            } else {
                let mut names = vec![self.expect_ident()?];
                while self.eat(Token::Comma) {
                    names.push(self.expect_ident()?);
                }
                (names, self.parse_type()?)
            };
            let tag = match self.peek() {
                Some(Token::StringLit) | Some(Token::RawStringLit) => {
                    let span = self.cur_span();
                    self.pos += 1;
                    Some(Spanned::new(self.text(span).to_string(), span))
                }
                _ => None,
            };
            fields.push(Spanned::new(Field { names, ty, tag }, self.span_from(start)));
            self.expect_semi()?;
        }
        self.expect(Token::RBrace)?;
        Ok(fields)
    }

    // ── Statements ───────────────────────────────────────────────────

    pub fn parse_block(&mut self) -> Result<Spanned<Block>, Error> {
        let start = self.start();
        self.expect(Token::LBrace)?;
        let stmts = self.with_restriction(false, |p| p.parse_stmt_list())?;
        self.expect(Token::RBrace)?;
        Ok(Spanned::new(Block { stmts }, self.span_from(start)))
    }

    fn parse_stmt_list(&mut self) -> Result<Vec<Spanned<Stmt>>, Error> {
        let mut stmts = Vec::new();
        loop {
            match self.peek() {
                None | Some(Token::RBrace) | Some(Token::Case) | Some(Token::Default) => break,
                Some(Token::Semi) => {
                    self.pos += 1;
                }
                Some(_) => {
                    stmts.push(self.parse_stmt()?);
                    if !matches!(self.peek(), Some(Token::Case) | Some(Token::Default)) {
                        self.expect_semi()?;
                    }
                }
            }
        }
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> Result<Spanned<Stmt>, Error> {
        let start = self.start();
        let stmt = match self.peek() {
            Some(Token::Var) | Some(Token::Const) | Some(Token::Type) => {
                let decl = self.parse_gen_decl()?;
                Stmt::Decl(decl.node)
            }
            Some(Token::LBrace) => Stmt::Block(self.parse_block()?.node),
            Some(Token::Return) => {
                self.pos += 1;
                let values = match self.peek() {
                    Some(Token::Semi) | Some(Token::RBrace) | None => Vec::new(),
                    _ => self.parse_expr_list()?,
                };
                Stmt::Return(values)
            }
            Some(Token::If) => return self.parse_if(),
            Some(Token::For) => return self.parse_for(),
            Some(Token::Switch) => return self.parse_switch(),
            Some(Token::Select) => return self.parse_select(),
            Some(Token::Go) => {
                self.pos += 1;
                Stmt::Go(self.parse_expr()?)
            }
            Some(Token::Defer) => {
                self.pos += 1;
                Stmt::Defer(self.parse_expr()?)
            }
            Some(Token::Break) | Some(Token::Continue) | Some(Token::Goto) => {
                let kind = match self.advance().map(|t| t.node) {
                    Some(Token::Break) => BranchKind::Break,
                    Some(Token::Continue) => BranchKind::Continue,
                    _ => BranchKind::Goto,
                };
                let label = if self.at(Token::Ident) { Some(self.expect_ident()?) } else { None };
                Stmt::Branch { kind, label }
            }
            Some(Token::Fallthrough) => {
                self.pos += 1;
                Stmt::Branch { kind: BranchKind::Fallthrough, label: None }
            }
            Some(Token::Ident) if self.peek_nth(1) == Some(Token::Colon) => {
                let label = self.expect_ident()?;
                self.expect(Token::Colon)?;
                let inner = if matches!(self.peek(), Some(Token::RBrace) | Some(Token::Semi)) {
                    Spanned::new(Stmt::Empty, self.span_from(self.prev_end()))
                } else {
                    self.parse_stmt()?
                };
                Stmt::Labeled { label, stmt: Box::new(inner) }
            }
            _ => return self.parse_simple_stmt(),
        };
        Ok(Spanned::new(stmt, self.span_from(start)))
    }

    fn parse_simple_stmt(&mut self) -> Result<Spanned<Stmt>, Error> {
        let start = self.start();
        let lhs = self.parse_expr_list()?;
        self.finish_simple_stmt(start, lhs)
    }

    fn finish_simple_stmt(&mut self, start: usize, mut lhs: Vec<Spanned<Expr>>) -> Result<Spanned<Stmt>, Error> {
        let stmt = match self.peek() {
            Some(Token::ColonEq) => {
                self.pos += 1;
                let rhs = self.parse_expr_list()?;
                Stmt::Define { lhs, rhs }
            }
            Some(tok) if tok.is_assign_op() => {
                self.pos += 1;
                let op = assign_op(tok);
                let rhs = self.parse_expr_list()?;
                Stmt::Assign { lhs, op, rhs }
            }
            Some(tok @ (Token::PlusPlus | Token::MinusMinus)) => {
                let target = single(lhs, "++/-- operand")?;
                self.pos += 1;
                Stmt::IncDec { target, inc: tok == Token::PlusPlus }
            }
            Some(Token::Arrow) => {
                let channel = single(lhs, "channel")?;
                self.pos += 1;
                let value = self.parse_expr()?;
                Stmt::Send { channel, value }
            }
            _ => {
                if lhs.len() != 1 {
                    return Err(Error::syntax("expected 1 expression", self.span_from(start)));
                }
                Stmt::Expr(lhs.remove(0))
            }
        };
        Ok(Spanned::new(stmt, self.span_from(start)))
    }

    fn parse_if(&mut self) -> Result<Spanned<Stmt>, Error> {
        let start = self.start();
        self.expect(Token::If)?;
        let (init, cond) = self.with_restriction(true, |p| {
            let first = if p.at(Token::Semi) { None } else { Some(p.parse_simple_stmt()?) };
            if p.eat(Token::Semi) {
                let cond = p.parse_expr()?;
                Ok((first.map(Box::new), cond))
            } else {
                match first {
                    Some(Spanned { node: Stmt::Expr(cond), .. }) => Ok((None, cond)),
                    Some(other) => Err(Error::syntax("expected condition after 'if'", other.span)),
                    None => Err(p.unexpected("condition")),
                }
            }
        })?;
        let then_block = self.parse_block()?;
        let else_branch = if self.eat(Token::Else) {
            let branch = if self.at(Token::If) {
                self.parse_if()?
            } else {
                let block = self.parse_block()?;
                let span = block.span;
                Spanned::new(Stmt::Block(block.node), span)
            };
            Some(Box::new(branch))
        } else {
            None
        };
        Ok(Spanned::new(Stmt::If { init, cond, then_block, else_branch }, self.span_from(start)))
    }

    fn parse_for(&mut self) -> Result<Spanned<Stmt>, Error> {
        let start = self.start();
        self.expect(Token::For)?;

        if self.at(Token::LBrace) {
            let body = self.parse_block()?;
            return Ok(Spanned::new(
                Stmt::For { init: None, cond: None, post: None, body },
                self.span_from(start),
            ));
        }

        if self.eat(Token::Range) {
            let expr = self.with_restriction(true, |p| p.parse_expr())?;
            let body = self.parse_block()?;
            return Ok(Spanned::new(
                Stmt::Range { key: None, value: None, define: false, expr, body },
                self.span_from(start),
            ));
        }

        enum Header {
            Range { key: Option<Spanned<Expr>>, value: Option<Spanned<Expr>>, define: bool, expr: Spanned<Expr> },
            Loop { init: Option<Box<Spanned<Stmt>>>, cond: Option<Spanned<Expr>>, post: Option<Box<Spanned<Stmt>>> },
        }

        let header = self.with_restriction(true, |p| {
            let first = if p.at(Token::Semi) {
                None
            } else {
                let stmt_start = p.start();
                let lhs = p.parse_expr_list()?;
                let is_range = matches!(p.peek(), Some(Token::ColonEq) | Some(Token::Eq))
                    && p.peek_nth(1) == Some(Token::Range);
                if is_range {
                    let define = p.at(Token::ColonEq);
                    p.pos += 2;
                    if lhs.len() > 2 {
                        return Err(Error::syntax("range clause permits at most two iteration variables", p.span_from(stmt_start)));
                    }
                    let mut vars = lhs.into_iter();
                    let key = vars.next();
                    let value = vars.next();
                    let expr = p.parse_expr()?;
                    return Ok(Header::Range { key, value, define, expr });
                }
                Some(p.finish_simple_stmt(stmt_start, lhs)?)
            };

            if p.eat(Token::Semi) {
                let cond = if p.at(Token::Semi) { None } else { Some(p.parse_expr()?) };
                p.expect(Token::Semi)?;
                let post = if p.at(Token::LBrace) { None } else { Some(Box::new(p.parse_simple_stmt()?)) };
                return Ok(Header::Loop { init: first.map(Box::new), cond, post });
            }

            match first {
                Some(Spanned { node: Stmt::Expr(cond), .. }) => Ok(Header::Loop { init: None, cond: Some(cond), post: None }),
                Some(other) => Err(Error::syntax("expected for loop condition", other.span)),
                None => Ok(Header::Loop { init: None, cond: None, post: None }),
            }
        })?;

        let body = self.parse_block()?;
        let stmt = match header {
            Header::Range { key, value, define, expr } => Stmt::Range { key, value, define, expr, body },
            Header::Loop { init, cond, post } => Stmt::For { init, cond, post, body },
        };
        Ok(Spanned::new(stmt, self.span_from(start)))
    }

    /// Scan ahead (without consuming) for `.(type)` before the header's `{`.
    fn header_is_type_switch(&self) -> bool {
        let mut depth = 0usize;
        let mut i = self.pos;
        while let Some(tok) = self.tokens.get(i).map(|t| t.node) {
            match tok {
                Token::LParen | Token::LBracket => depth += 1,
                Token::RParen | Token::RBracket => depth = depth.saturating_sub(1),
                Token::LBrace if depth == 0 => return false,
                Token::LBrace => depth += 1,
                Token::RBrace => depth = depth.saturating_sub(1),
                Token::Dot => {
                    let next = self.tokens.get(i + 1).map(|t| t.node);
                    let after = self.tokens.get(i + 2).map(|t| t.node);
                    if next == Some(Token::LParen) && after == Some(Token::Type) {
                        return true;
                    }
                }
                _ => {}
            }
            i += 1;
        }
        false
    }

    fn parse_switch(&mut self) -> Result<Spanned<Stmt>, Error> {
        let start = self.start();
        self.expect(Token::Switch)?;

        if self.header_is_type_switch() {
            return self.parse_type_switch(start);
        }

        let (init, tag) = self.with_restriction(true, |p| {
            if p.at(Token::LBrace) {
                return Ok((None, None));
            }
            let first = if p.at(Token::Semi) { None } else { Some(p.parse_simple_stmt()?) };
            if p.eat(Token::Semi) {
                let tag = if p.at(Token::LBrace) { None } else { Some(p.parse_expr()?) };
                return Ok((first.map(Box::new), tag));
            }
            match first {
                Some(Spanned { node: Stmt::Expr(tag), .. }) => Ok((None, Some(tag))),
                Some(other) => Err(Error::syntax("expected switch expression", other.span)),
                None => Ok((None, None)),
            }
        })?;

        self.expect(Token::LBrace)?;
        let mut clauses = Vec::new();
        while !self.at(Token::RBrace) {
            let clause_start = self.start();
            let (exprs, is_default) = if self.eat(Token::Default) {
                (Vec::new(), true)
            } else {
                self.expect(Token::Case)?;
                (self.parse_expr_list()?, false)
            };
            self.expect(Token::Colon)?;
            let body = self.with_restriction(false, |p| p.parse_stmt_list())?;
            clauses.push(Spanned::new(CaseClause { exprs, is_default, body }, self.span_from(clause_start)));
        }
        self.expect(Token::RBrace)?;
        Ok(Spanned::new(Stmt::Switch { init, tag, clauses }, self.span_from(start)))
    }

    fn parse_type_switch(&mut self, start: usize) -> Result<Spanned<Stmt>, Error> {
        let (init, binding, subject) = self.with_restriction(true, |p| {
            // An init statement is present when a `;` precedes the guard.
            let mut init = None;
            let guard_has_semi = {
                let mut i = p.pos;
                let mut depth = 0usize;
                let mut found = false;
                while let Some(tok) = p.tokens.get(i).map(|t| t.node) {
                    match tok {
                        Token::LParen | Token::LBracket | Token::LBrace => depth += 1,
                        Token::RParen | Token::RBracket | Token::RBrace => depth = depth.saturating_sub(1),
                        Token::Semi if depth == 0 => {
                            found = true;
                            break;
                        }
                        Token::Type if depth > 0 => break,
                        _ => {}
                    }
                    i += 1;
                }
                found
            };
            if guard_has_semi {
                init = Some(Box::new(p.parse_simple_stmt()?));
                p.expect(Token::Semi)?;
            }
            let binding = if p.at(Token::Ident) && p.peek_nth(1) == Some(Token::ColonEq) {
                let name = p.expect_ident()?;
                p.expect(Token::ColonEq)?;
                Some(name)
            } else {
                None
            };
            let subject = p.parse_unary()?;
            p.expect(Token::Dot)?;
            p.expect(Token::LParen)?;
            p.expect(Token::Type)?;
            p.expect(Token::RParen)?;
            Ok((init, binding, subject))
        })?;

        self.expect(Token::LBrace)?;
        let mut clauses = Vec::new();
        while !self.at(Token::RBrace) {
            let clause_start = self.start();
            let (types, is_default) = if self.eat(Token::Default) {
                (Vec::new(), true)
            } else {
                self.expect(Token::Case)?;
                let mut types = vec![self.parse_type()?];
                while self.eat(Token::Comma) {
                    types.push(self.parse_type()?);
                }
                (types, false)
            };
            self.expect(Token::Colon)?;
            let body = self.with_restriction(false, |p| p.parse_stmt_list())?;
            clauses.push(Spanned::new(TypeCaseClause { types, is_default, body }, self.span_from(clause_start)));
        }
        self.expect(Token::RBrace)?;
        Ok(Spanned::new(Stmt::TypeSwitch { init, binding, subject, clauses }, self.span_from(start)))
    }

    fn parse_select(&mut self) -> Result<Spanned<Stmt>, Error> {
        let start = self.start();
        self.expect(Token::Select)?;
        self.expect(Token::LBrace)?;
        let mut clauses = Vec::new();
        while !self.at(Token::RBrace) {
            let clause_start = self.start();
            let comm = if self.eat(Token::Default) {
                None
            } else {
                self.expect(Token::Case)?;
                Some(Box::new(self.parse_simple_stmt()?))
            };
            self.expect(Token::Colon)?;
            let body = self.parse_stmt_list()?;
            clauses.push(Spanned::new(CommClause { comm, body }, self.span_from(clause_start)));
        }
        self.expect(Token::RBrace)?;
        Ok(Spanned::new(Stmt::Select { clauses }, self.span_from(start)))
    }

    // ── Expressions ──────────────────────────────────────────────────

    pub fn parse_expr(&mut self) -> Result<Spanned<Expr>, Error> {
        self.parse_binary(1)
    }

    fn parse_expr_list(&mut self) -> Result<Vec<Spanned<Expr>>, Error> {
        let mut exprs = vec![self.parse_expr()?];
        while self.eat(Token::Comma) {
            exprs.push(self.parse_expr()?);
        }
        Ok(exprs)
    }

    fn parse_binary(&mut self, min_prec: u8) -> Result<Spanned<Expr>, Error> {
        let mut lhs = self.parse_unary()?;
        while let Some((op, prec)) = self.peek().and_then(binary_op) {
            if prec < min_prec {
                break;
            }
            self.pos += 1;
            let rhs = self.parse_binary(prec + 1)?;
            let span = lhs.span.to(rhs.span);
            lhs = Spanned::new(Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) }, span);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Spanned<Expr>, Error> {
        let start = self.start();
        let op = match self.peek() {
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Plus) => UnaryOp::Pos,
            Some(Token::Bang) => UnaryOp::Not,
            Some(Token::Caret) => UnaryOp::BitNot,
            Some(Token::Star) => UnaryOp::Deref,
            Some(Token::Amp) => UnaryOp::AddrOf,
            Some(Token::Arrow) if self.peek_nth(1) == Some(Token::Chan) => {
                let ty = self.parse_type()?;
                let span = ty.span;
                return self.parse_postfix(Spanned::new(Expr::Type(Box::new(ty)), span));
            }
            Some(Token::Arrow) => UnaryOp::Recv,
            _ => return self.parse_primary(),
        };
        self.pos += 1;
        let operand = self.parse_unary()?;
        Ok(Spanned::new(Expr::Unary { op, operand: Box::new(operand) }, self.span_from(start)))
    }

    fn parse_primary(&mut self) -> Result<Spanned<Expr>, Error> {
        let start = self.start();
        let operand = match self.peek() {
            Some(Token::Ident) => {
                let name = self.expect_ident()?;
                Spanned::new(Expr::Ident(name.node), name.span)
            }
            Some(tok @ (Token::IntLit | Token::FloatLit | Token::ImagLit | Token::RuneLit | Token::StringLit | Token::RawStringLit)) => {
                let span = self.cur_span();
                self.pos += 1;
                let text = self.text(span).to_string();
                let node = match tok {
                    Token::IntLit => Expr::IntLit(text),
                    Token::FloatLit => Expr::FloatLit(text),
                    Token::ImagLit => Expr::ImagLit(text),
                    Token::RuneLit => Expr::RuneLit(text),
                    _ => Expr::StringLit(text),
                };
                Spanned::new(node, span)
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.with_restriction(false, |p| p.parse_expr())?;
                self.expect(Token::RParen)?;
                Spanned::new(Expr::Paren(Box::new(inner)), self.span_from(start))
            }
            Some(Token::Func) => {
                self.pos += 1;
                let sig = self.parse_signature()?;
                if self.at(Token::LBrace) {
                    let body = self.parse_block()?;
                    Spanned::new(Expr::FuncLit { sig, body }, self.span_from(start))
                } else {
                    let span = self.span_from(start);
                    let ty = Spanned::new(TypeExpr::Func(sig), span);
                    Spanned::new(Expr::Type(Box::new(ty)), span)
                }
            }
            Some(Token::LBracket) | Some(Token::Map) | Some(Token::Chan) | Some(Token::Struct) | Some(Token::Interface) => {
                let ty = self.parse_type()?;
                let span = ty.span;
                Spanned::new(Expr::Type(Box::new(ty)), span)
            }
            _ => return Err(self.unexpected("expression")),
        };
        self.parse_postfix(operand)
    }

    fn parse_postfix(&mut self, mut expr: Spanned<Expr>) -> Result<Spanned<Expr>, Error> {
        let start = expr.span.start;
        loop {
            match self.peek() {
                Some(Token::Dot) => match self.peek_nth(1) {
                    Some(Token::Ident) => {
                        self.pos += 1;
                        let field = self.expect_ident()?;
                        expr = Spanned::new(
                            Expr::Selector { object: Box::new(expr), field },
                            self.span_from(start),
                        );
                    }
                    // `x.(type)` belongs to the enclosing type switch.
                    Some(Token::LParen) if self.peek_nth(2) == Some(Token::Type) => break,
                    Some(Token::LParen) => {
                        self.pos += 2;
                        let ty = self.with_restriction(false, |p| p.parse_type())?;
                        self.expect(Token::RParen)?;
                        expr = Spanned::new(
                            Expr::TypeAssert { object: Box::new(expr), ty: Box::new(ty) },
                            self.span_from(start),
                        );
                    }
                    _ => return Err(Error::syntax("expected selector or type assertion", self.cur_span())),
                },
                Some(Token::LParen) => {
                    self.pos += 1;
                    let (args, spread) = self.with_restriction(false, |p| {
                        let mut args = Vec::new();
                        let mut spread = false;
                        while !p.at(Token::RParen) {
                            args.push(p.parse_expr()?);
                            if p.eat(Token::Ellipsis) {
                                spread = true;
                            }
                            if !p.eat(Token::Comma) {
                                break;
                            }
                        }
                        Ok((args, spread))
                    })?;
                    self.expect(Token::RParen)?;
                    expr = Spanned::new(
                        Expr::Call { func: Box::new(expr), args, spread },
                        self.span_from(start),
                    );
                }
                Some(Token::LBracket) => {
                    self.pos += 1;
                    expr = self.with_restriction(false, |p| p.parse_index_or_slice(expr, start))?;
                }
                Some(Token::LBrace) if self.is_literal_type(&expr) => {
                    let ty = expr_to_type(expr).ok_or_else(|| {
                        Error::syntax("invalid composite literal type", self.cur_span())
                    })?;
                    let elements = self.parse_composite_body()?;
                    expr = Spanned::new(
                        Expr::Composite { ty: Some(Box::new(ty)), elements },
                        self.span_from(start),
                    );
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    /// Called after `[` has been consumed.
    fn parse_index_or_slice(&mut self, object: Spanned<Expr>, start: usize) -> Result<Spanned<Expr>, Error> {
        let low = if self.at(Token::Colon) { None } else { Some(Box::new(self.parse_expr()?)) };
        if self.at(Token::Comma) {
            let mut args: Vec<Spanned<Expr>> = low.into_iter().map(|b| *b).collect();
            while self.eat(Token::Comma) && !self.at(Token::RBracket) {
                args.push(self.parse_expr()?);
            }
            self.expect(Token::RBracket)?;
            return Ok(Spanned::new(
                Expr::Instance { object: Box::new(object), args },
                self.span_from(start),
            ));
        }
        if !self.eat(Token::Colon) {
            self.expect(Token::RBracket)?;
            let index = low.ok_or_else(|| self.unexpected("index"))?;
            return Ok(Spanned::new(
                Expr::Index { object: Box::new(object), index },
                self.span_from(start),
            ));
        }
        let high = if matches!(self.peek(), Some(Token::RBracket) | Some(Token::Colon)) {
            None
        } else {
            Some(Box::new(self.parse_expr()?))
        };
        let max = if self.eat(Token::Colon) { Some(Box::new(self.parse_expr()?)) } else { None };
        self.expect(Token::RBracket)?;
        Ok(Spanned::new(
            Expr::Slice { object: Box::new(object), low, high, max },
            self.span_from(start),
        ))
    }

    fn is_literal_type(&self, expr: &Spanned<Expr>) -> bool {
        match &expr.node {
            Expr::Type(ty) => matches!(
                ty.node,
                TypeExpr::Slice(_) | TypeExpr::Array { .. } | TypeExpr::Map { .. } | TypeExpr::Struct(_)
            ),
            Expr::Ident(_) => !self.restrict_composite_lit,
            Expr::Selector { object, .. } => {
                !self.restrict_composite_lit && matches!(object.node, Expr::Ident(_))
            }
            Expr::Index { object, .. } | Expr::Instance { object, .. } => {
                !self.restrict_composite_lit
                    && match &object.node {
                        Expr::Ident(_) => true,
                        Expr::Selector { object, .. } => matches!(object.node, Expr::Ident(_)),
                        _ => false,
                    }
            }
            _ => false,
        }
    }

    fn parse_composite_body(&mut self) -> Result<Vec<Spanned<Expr>>, Error> {
        self.expect(Token::LBrace)?;
        let elements = self.with_restriction(false, |p| {
            let mut elements = Vec::new();
            while !p.at(Token::RBrace) {
                let start = p.start();
                let first = p.parse_element()?;
                let element = if p.eat(Token::Colon) {
                    let value = p.parse_element()?;
                    Spanned::new(
                        Expr::KeyValue { key: Box::new(first), value: Box::new(value) },
                        p.span_from(start),
                    )
                } else {
                    first
                };
                elements.push(element);
                if !p.eat(Token::Comma) {
                    break;
                }
            }
            Ok(elements)
        })?;
        self.expect(Token::RBrace)?;
        Ok(elements)
    }

    fn parse_element(&mut self) -> Result<Spanned<Expr>, Error> {
        if self.at(Token::LBrace) {
            let start = self.start();
            let elements = self.parse_composite_body()?;
            return Ok(Spanned::new(Expr::Composite { ty: None, elements }, self.span_from(start)));
        }
        self.parse_expr()
    }
}

fn single(mut exprs: Vec<Spanned<Expr>>, what: &str) -> Result<Spanned<Expr>, Error> {
    if exprs.len() != 1 {
        let span = exprs[0].span.to(exprs[exprs.len() - 1].span);
        return Err(Error::syntax(format!("expected a single {what}"), span));
    }
    Ok(exprs.remove(0))
}

/// Reinterpret an expression that names a type (`T`, `pkg.T`, `[]T`).
fn expr_to_type(expr: Spanned<Expr>) -> Option<Spanned<TypeExpr>> {
    let span = expr.span;
    match expr.node {
        Expr::Ident(name) => Some(Spanned::new(TypeExpr::Named(name), span)),
        Expr::Selector { object, field } => match object.node {
            Expr::Ident(package) => Some(Spanned::new(
                TypeExpr::Qualified { package: Spanned::new(package, object.span), name: field },
                span,
            )),
            _ => None,
        },
        Expr::Type(ty) => Some(*ty),
        Expr::Paren(inner) => expr_to_type(*inner),
        Expr::Unary { op: UnaryOp::Deref, operand } => {
            Some(Spanned::new(TypeExpr::Pointer(Box::new(expr_to_type(*operand)?)), span))
        }
        Expr::Index { object, index } => Some(Spanned::new(
            TypeExpr::Instance { base: Box::new(expr_to_type(*object)?), args: vec![expr_to_type(*index)?] },
            span,
        )),
        Expr::Instance { object, args } => Some(Spanned::new(
            TypeExpr::Instance {
                base: Box::new(expr_to_type(*object)?),
                args: args.into_iter().map(expr_to_type).collect::<Option<_>>()?,
            },
            span,
        )),
        _ => None,
    }
}

fn binary_op(tok: Token) -> Option<(BinOp, u8)> {
    let op = match tok {
        Token::PipePipe => (BinOp::LogOr, 1),
        Token::AmpAmp => (BinOp::LogAnd, 2),
        Token::EqEq => (BinOp::Eq, 3),
        Token::BangEq => (BinOp::Neq, 3),
        Token::Lt => (BinOp::Lt, 3),
        Token::LtEq => (BinOp::LtEq, 3),
        Token::Gt => (BinOp::Gt, 3),
        Token::GtEq => (BinOp::GtEq, 3),
        Token::Plus => (BinOp::Add, 4),
        Token::Minus => (BinOp::Sub, 4),
        Token::Pipe => (BinOp::Or, 4),
        Token::Caret => (BinOp::Xor, 4),
        Token::Star => (BinOp::Mul, 5),
        Token::Slash => (BinOp::Div, 5),
        Token::Percent => (BinOp::Rem, 5),
        Token::Shl => (BinOp::Shl, 5),
        Token::Shr => (BinOp::Shr, 5),
        Token::Amp => (BinOp::And, 5),
        Token::AmpCaret => (BinOp::AndNot, 5),
        _ => return None,
    };
    Some(op)
}

fn assign_op(tok: Token) -> AssignOp {
    match tok {
        Token::PlusEq => AssignOp::Add,
        Token::MinusEq => AssignOp::Sub,
        Token::StarEq => AssignOp::Mul,
        Token::SlashEq => AssignOp::Div,
        Token::PercentEq => AssignOp::Rem,
        Token::AmpEq => AssignOp::And,
        Token::PipeEq => AssignOp::Or,
        Token::CaretEq => AssignOp::Xor,
        Token::ShlEq => AssignOp::Shl,
        Token::ShrEq => AssignOp::Shr,
        Token::AmpCaretEq => AssignOp::AndNot,
        _ => AssignOp::Assign,
    }
}
