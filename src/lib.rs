//! reflow - Bidirectional reactive cells for live dashboards.
//!
//! Cells hold values; formulas attach named computations that read some
//! cells and write one. Writing a value propagates through every
//! computation it feeds, in both directions, and observers hear about the
//! settled result.
//!
//! ```
//! use reflow::{Computation, Engine, NUMBER_TYPE};
//!
//! let mut engine = Engine::new();
//! engine.create_dashboard("main").unwrap();
//! engine.set_current_dashboard("main").unwrap();
//! for id in ["A", "B", "X"] {
//!     engine.create_element(id, NUMBER_TYPE).unwrap();
//! }
//! engine.create_formula("X=A+B").unwrap();
//! engine
//!     .add_computations(
//!         "X=A+B",
//!         [
//!             ("forward", Computation::script(["A", "B"], "X", "A + B").unwrap()),
//!             ("solve_b", Computation::script(["X", "A"], "B", "X - A").unwrap().with_priority(-1)),
//!         ],
//!     )
//!     .unwrap();
//! engine.start();
//!
//! engine.set_value("A", 5.0).unwrap();
//! engine.set_value("X", 12.0).unwrap();
//! assert_eq!(engine.value("B").and_then(|v| v.as_number()), Some(7.0));
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod session;

pub use config::{Config, load_config};
pub use error::{ConfigError, SessionError};
pub use logging::init_logging;
pub use session::{SessionGuard, SessionRegistry};

pub use reflow_core::{
    Action, CellSnapshot, ComputationFailure, ComputationSnapshot, ConfigurationError, Engine,
    EngineConfig, LifecycleError, ReflowError, Result, Snapshot, Subscription, Update,
};
pub use reflow_engine::builtins::{BUILTINS, Builtin, describe_builtin};
pub use reflow_engine::engine::{
    Cell, CellKind, Compute, ComputeError, Computation, DASHBOARD_PROPERTY, DASHBOARD_TYPE,
    FORMULA_TYPE, NUMBER_TYPE, ScriptError, VALUE_PROPERTY, Value,
};
