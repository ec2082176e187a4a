//! Builder module for `argot`.
//! See [documentation root](https://docs.rs/argot/latest/argot/index.html) for full details.
#![deny(missing_docs)]
mod constant;
mod cursor;
mod environment;
mod error;
mod grammar;
mod matcher;
mod model;
mod options;
mod positional;
pub mod prelude;
mod types;
mod usage;

pub use cursor::SourceError;
pub use environment::*;
pub use error::*;
pub use grammar::{GrammarError, Node, NamedOptionNode, OptionValue, UsageAst};
pub use matcher::*;
pub use model::*;
pub use options::{
    Arity, CliOption, CliOptionMap, InlineOption, NamedOption, Negation, OptionModelError,
    OriginGroup,
};
pub use positional::*;
pub use types::*;
pub use usage::Usage;

#[cfg(test)]
#[macro_use]
extern crate assert_matches;
