mod ast;
mod parser;

pub use ast::*;
pub(crate) use parser::{option_key, parse};

use thiserror::Error;

use crate::cursor::SourceError;

/// A usage text that cannot be compiled, pointing at the offending source.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GrammarError {
    /// The text does not follow the usage grammar.
    #[error("Syntax error: {0}")]
    Syntax(SourceError),

    /// The grammar admits more than one way to count its positional arguments.
    #[error("Ambiguous grammar: {0}")]
    Ambiguous(SourceError),

    /// A suffixed positional or option spelling is declared twice.
    #[error("Duplicate declaration: {0}")]
    Duplicate(SourceError),

    /// A type reference does not resolve.
    #[error("Type error: {0}")]
    Type(SourceError),
}

impl GrammarError {
    /// The source diagnostic behind this error.
    pub fn source_error(&self) -> &SourceError {
        match self {
            GrammarError::Syntax(e)
            | GrammarError::Ambiguous(e)
            | GrammarError::Duplicate(e)
            | GrammarError::Type(e) => e,
        }
    }
}
