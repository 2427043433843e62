//! Error types raised while building or evaluating computations.

use thiserror::Error;

/// A computation failed to produce a usable value.
///
/// These never escape a propagation pass: the engine logs them and leaves the
/// output cell untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComputeError {
    #[error("{0}")]
    Failed(String),

    #[error("non-finite result: {0}")]
    NonFinite(f64),

    #[error("input {index} is {found}, expected a number")]
    NonNumeric { index: usize, found: &'static str },

    #[error("compute function panicked: {0}")]
    Panicked(String),

    #[error("script error: {0}")]
    Script(String),
}

/// A text formula could not be turned into a computation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScriptError {
    #[error("Rhai compile error: {0}")]
    Compile(String),

    #[error("formula declares {params} parameter(s) but has {inputs} input(s)")]
    ParamMismatch { params: usize, inputs: usize },

    #[error("invalid parameter name: {0:?}")]
    InvalidParam(String),
}
