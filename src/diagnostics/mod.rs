use crate::span::Span;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Syntax error: {msg}")]
    Syntax { msg: String, span: Span },

    #[error("I/O error: {msg}")]
    Io { msg: String, path: PathBuf },

    #[error("Config error: {msg}")]
    Config { msg: String, path: PathBuf },

    #[error("{count} call site(s) disagree with their callee's parameter order")]
    Inconsistent { count: usize },
}

impl Error {
    pub fn syntax(msg: impl Into<String>, span: Span) -> Self {
        Self::Syntax { msg: msg.into(), span }
    }

    pub fn io(msg: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::Io { msg: msg.into(), path: path.into() }
    }

    pub fn config(msg: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::Config { msg: msg.into(), path: path.into() }
    }

    /// The span of a syntax error, if any.
    pub fn span(&self) -> Option<Span> {
        match self {
            Error::Syntax { span, .. } => Some(*span),
            _ => None,
        }
    }
}

/// Render an Error with ariadne for nice terminal output.
///
/// `source` must be the text of the unit the error's span points into.
pub fn render_error(source: &str, filename: &str, err: &Error) {
    use ariadne::{Label, Report, ReportKind, Source};

    match err {
        Error::Syntax { msg, span } => {
            let printed = Report::build(ReportKind::Error, (), span.start)
                .with_message(format!("syntax error in {filename}"))
                .with_label(Label::new(span.range()).with_message(msg))
                .finish()
                .eprint(Source::from(source));
            if printed.is_err() {
                eprintln!("error [{filename}]: {err}");
            }
        }
        Error::Io { msg, path } => {
            eprintln!("error[io]: {msg}");
            eprintln!("  --> {}", path.display());
        }
        Error::Config { msg, path } => {
            eprintln!("error[config]: {msg}");
            eprintln!("  --> {}", path.display());
        }
        Error::Inconsistent { .. } => {
            eprintln!("error: {err}");
        }
    }
}
