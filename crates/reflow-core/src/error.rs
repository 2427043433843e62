//! Error types for reflow core.

use reflow_engine::engine::ScriptError;
use thiserror::Error;

/// The caller asked for something the graph cannot represent.
/// Always returned synchronously; the offending call has no effect.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("cell id must not be empty")]
    EmptyId,

    #[error("cell {0:?} already exists")]
    DuplicateId(String),

    #[error("unknown cell {0:?}")]
    UnknownCell(String),

    #[error("unknown dashboard {0:?}")]
    UnknownDashboard(String),

    #[error("cell {0:?} is not a dashboard")]
    NotADashboard(String),

    #[error("cell {0:?} is not a formula")]
    NotAFormula(String),

    #[error("computation {computation:?} has no inputs")]
    NoInputs { computation: String },

    #[error("computation {computation:?} reads unknown cell {input:?}")]
    UnknownInput { computation: String, input: String },

    #[error("computation {computation:?} writes unknown cell {output:?}")]
    UnknownOutput { computation: String, output: String },

    #[error("invalid formula: {0}")]
    Script(#[from] ScriptError),
}

/// The call is valid but the engine is not in a state to accept it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LifecycleError {
    #[error("no dashboard selected; call set_current_dashboard first")]
    NoCurrentDashboard,
}

/// Errors returned by [`crate::Engine`] operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReflowError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

impl From<ScriptError> for ReflowError {
    fn from(err: ScriptError) -> Self {
        ReflowError::Configuration(ConfigurationError::Script(err))
    }
}

pub type Result<T> = std::result::Result<T, ReflowError>;
