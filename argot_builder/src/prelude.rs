//! Traits which, typically, may be imported without concern: `use argot::prelude::*`.

// Needs to be imported in order to implement a custom evaluator.
pub use crate::environment::{EnvironmentView, Evaluator};
