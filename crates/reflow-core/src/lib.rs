//! reflow-core - Cell registry, propagation, observation and snapshots.

pub mod action;
pub mod config;
pub mod error;
pub mod graph;
pub mod snapshot;

pub use action::Action;
pub use config::EngineConfig;
pub use error::{ConfigurationError, LifecycleError, ReflowError, Result};
pub use graph::{ComputationFailure, Engine, Subscription, Update};
pub use snapshot::{CellSnapshot, ComputationSnapshot, Snapshot};

pub use reflow_engine::engine::{Cell, CellKind, Compute, ComputeError, Computation, Value};
