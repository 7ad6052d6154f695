pub mod token;
pub use token::is_keyword;

use crate::diagnostics::Error;
use crate::span::{Span, Spanned};
use logos::Logos;
use token::Token;

/// Tokenize one source unit.
///
/// Newlines are turned into `Token::Semi` when the previous token could end a
/// statement (Go's automatic semicolon rule) and dropped otherwise. Comments
/// never reach the parser.
pub fn lex(source: &str, file_id: u32) -> Result<Vec<Spanned<Token>>, Error> {
    let mut tokens: Vec<Spanned<Token>> = Vec::new();
    let mut lexer = Token::lexer(source);

    while let Some(result) = lexer.next() {
        let range = lexer.span();
        let span = Span::with_file(range.start, range.end, file_id);
        match result {
            Ok(Token::LineComment) => {}
            Ok(Token::BlockComment) => {
                if lexer.slice().contains('\n') {
                    insert_semi(&mut tokens, span);
                }
            }
            Ok(Token::Newline) => insert_semi(&mut tokens, span),
            Ok(tok) => tokens.push(Spanned::new(tok, span)),
            Err(()) => {
                return Err(Error::syntax(
                    format!("unexpected character '{}'", &source[range.start..range.end]),
                    span,
                ));
            }
        }
    }

    // A file that does not end in a newline still terminates its last statement
    insert_semi(&mut tokens, Span::with_file(source.len(), source.len(), file_id));

    Ok(tokens)
}

fn insert_semi(tokens: &mut Vec<Spanned<Token>>, span: Span) {
    if tokens.last().is_some_and(|t| t.node.ends_line()) {
        tokens.push(Spanned::new(Token::Semi, span));
    }
}
