//! `argot` compiles declarative usage strings into argument binders.
//!
//! A command declares its arguments once, as a single usage line:
//! ```text
//! copy [--verbose|-v]... [--jobs|-j=INT] [--dry-run|--no-dry-run] FILE1 [FILE2]...
//! ```
//! `argot` turns that line into a [`Usage`] model, then matches, coerces and defaults each invocation's tokens into a [`LexicalEnvironment`].
//! Specifically, `argot` attempts to prioritize the following design concerns:
//! * *Fail fast on the grammar*:
//! Syntax errors, ambiguous positional counts and conflicting option declarations are all rejected while the [`Usage`] is built, with a caret pointing at the offending text.
//! No invocation ever observes a half-valid model.
//! * *Typed values*:
//! Uppercase tokens name types from a [`TypeRegistry`].
//! Compound names (`BYTE_COUNT`) synthesize subtypes of a registered root (`Count`), and pipe groups (`(ICO_FILE|PNG_FILE)`) synthesize unions.
//! * *Deterministic positional counts*:
//! Each bracket level elides a fixed run of positionals, so every argument count maps to exactly one arrangement.
//! * *Pluggable evaluation*:
//! Expression-valued arguments are resolved by a host supplied [`Evaluator`](prelude::Evaluator), after every direct value is bound.
//!
//! # Usage
//! ```
//! use argot::{NoEvaluator, Token, TypeRegistry, Usage, Value};
//!
//! let registry = TypeRegistry::standard();
//! let usage = Usage::parse("sum [--verbose|-v]... INT1 [INT]...", &registry).unwrap();
//!
//! let environment = usage
//!     .invoke(Token::classify_all(&["-v", "1", "2", "3"]), &NoEvaluator)
//!     .unwrap();
//! assert_eq!(environment.get("verbose"), Some(&Value::Count(1)));
//! assert_eq!(environment.get("$1"), Some(&Value::Integer(1)));
//! assert_eq!(
//!     environment.get("$2"),
//!     Some(&Value::List(vec![Value::Integer(2), Value::Integer(3)]))
//! );
//! assert_eq!(environment.positionals().len(), 3);
//!
//! let error = usage
//!     .invoke(Token::classify_all(&["one"]), &NoEvaluator)
//!     .unwrap_err();
//! assert_eq!(
//!     error.to_string(),
//!     "Parse error: Invalid value 'one' for 'INT1': expected Int."
//! );
//! ```
//!
//! # Features
//! * `tracing_debug`: emit `tracing::debug!` events for type synthesis, branch selection, short option decomposition and deferred resolution.
//! * `unit_test`: expose test doubles, such as `MapEvaluator`.
pub use argot_builder::*;
