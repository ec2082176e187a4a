use thiserror::Error;

use crate::environment::BindError;
use crate::grammar::GrammarError;
use crate::matcher::MatchError;
use crate::options::OptionModelError;
use crate::positional::{AmbiguityError, ArgumentCountError};
use crate::types::TypeError;

/// A usage (or option set) that cannot be compiled.
///
/// Raised while building a [`Usage`](crate::Usage); never during an invocation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The usage text is malformed or ambiguous.
    #[error("Config error: {0}")]
    Grammar(#[from] GrammarError),

    /// A type could not be resolved or registered.
    #[error("Config error: {0}")]
    Type(#[from] TypeError),

    /// The positional sequence cannot be arranged deterministically.
    #[error("Config error: {0}")]
    Ambiguity(#[from] AmbiguityError),

    /// The named options are inconsistent.
    #[error("Config error: {0}")]
    OptionModel(#[from] OptionModelError),
}

/// A failure while matching and binding one invocation's tokens.
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    /// The token stream does not match the option set.
    #[error("Parse error: {0}")]
    Match(#[from] MatchError),

    /// The positional count fits no branch.
    #[error("Parse error: {0}")]
    ArgumentCount(#[from] ArgumentCountError),

    /// A value could not be bound, defaulted or coerced.
    #[error("Parse error: {0}")]
    Bind(#[from] BindError),

    /// A broken internal invariant.
    #[error("Parse error: internal error - {0}")]
    Internal(String),
}
