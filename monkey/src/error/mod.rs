//! Error types and reporting

use crate::ast::{LineIndex, Span};
use crate::interp::RuntimeError;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Any failure while loading or running a program
#[derive(Debug, Error)]
pub enum Error {
    #[error("Lexer error at {span:?}: {message}")]
    Lexer { message: String, span: Span },

    #[error("Parser error at {span:?}: {message}")]
    Parser { message: String, span: Span },

    #[error("IO error: {message}")]
    Io { message: String },

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl Error {
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
            Self::Lexer { span, .. } => Some(*span),
            Self::Parser { span, .. } => Some(*span),
            Self::Io { .. } | Self::Runtime(_) => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Lexer { message, .. } => message,
            Self::Parser { message, .. } => message,
            Self::Io { message } => message,
            Self::Runtime(err) => &err.message,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::io_error(err.to_string())
    }
}

/// Report error with ariadne
pub fn report_error(filename: &str, source: &str, error: &Error) {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    let kind = match error {
        Error::Lexer { .. } => "Lexer",
        Error::Parser { .. } => "Parser",
        Error::Io { .. } => "IO",
        Error::Runtime(_) => "Runtime",
    };

    let range = match error {
        Error::Runtime(err) => Some(LineIndex::new(source).line_range(err.line, source.len())),
        _ => error.span().map(std::ops::Range::from),
    };

    let report = match range {
        Some(range) => Report::build(ReportKind::Error, (filename, range.clone()))
            .with_message(format!("{kind} error"))
            .with_label(
                Label::new((filename, range))
                    .with_message(error.message())
                    .with_color(Color::Red),
            )
            .finish(),
        None => Report::build(ReportKind::Error, (filename, 0..0))
            .with_message(format!("{kind} error: {}", error.message()))
            .finish(),
    };

    if report.eprint((filename, Source::from(source))).is_err() {
        eprintln!("{kind} error: {}", error.message());
    }
}
