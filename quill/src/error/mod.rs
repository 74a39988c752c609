//! Error types and reporting

use crate::ast::Span;
use crate::interp::RuntimeError;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, CompileError>;

/// Front-end error: anything that stops source text from becoming a program
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Lexer error at {span}: {message}")]
    Lexer { message: String, span: Span },

    #[error("Parser error at {span}: {message}")]
    Parser { message: String, span: Span },

    #[error("IO error: {message}")]
    Io { message: String },
}

impl CompileError {
    pub fn lexer(message: impl Into<String>, span: Span) -> Self {
        Self::Lexer {
            message: message.into(),
            span,
        }
    }

    pub fn parser(message: impl Into<String>, span: Span) -> Self {
        Self::Parser {
            message: message.into(),
            span,
        }
    }

    pub fn io_error(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Lexer { span, .. } | Self::Parser { span, .. } => Some(*span),
            Self::Io { .. } => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Lexer { message, .. } => message,
            Self::Parser { message, .. } => message,
            Self::Io { message } => message,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Lexer { .. } => "Lexer",
            Self::Parser { .. } => "Parser",
            Self::Io { .. } => "IO",
        }
    }
}

impl From<std::io::Error> for CompileError {
    fn from(err: std::io::Error) -> Self {
        Self::io_error(err.to_string())
    }
}

/// Report a front-end error with ariadne
pub fn report_error(filename: &str, source: &str, error: &CompileError) {
    emit(filename, source, error.kind(), error.message(), error.span());
}

/// Report a runtime error with ariadne
pub fn report_runtime_error(filename: &str, source: &str, error: &RuntimeError) {
    emit(filename, source, "Runtime", &error.message, error.span);
}

fn emit(filename: &str, source: &str, kind: &str, message: &str, span: Option<Span>) {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    let result = match span {
        Some(span) => Report::build(ReportKind::Error, (filename, span.start..span.end))
            .with_message(format!("{kind} error"))
            .with_label(
                Label::new((filename, span.start..span.end))
                    .with_message(message)
                    .with_color(Color::Red),
            )
            .finish()
            .eprint((filename, Source::from(source))),
        None => Report::build(ReportKind::Error, (filename, 0..0))
            .with_message(format!("{kind} error: {message}"))
            .finish()
            .eprint((filename, Source::from(source))),
    };

    if result.is_err() {
        eprintln!("{kind} error: {message}");
    }
}
