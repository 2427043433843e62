//! Cell and computation API.
//!
//! - [`Value`] - Typed cell values
//! - [`Cell`], [`CellKind`] - Cell storage (elements, dashboards, formulas)
//! - [`Computation`], [`Compute`] - Input set -> output mappings
//! - [`Computation::script`] - Computations from sandboxed Rhai formula text
//! - [`format_number`] - Format values for display

mod cell;
mod computation;
mod error;
mod format;
mod script;
mod value;

pub use cell::{
    Cell, CellKind, DASHBOARD_PROPERTY, DASHBOARD_TYPE, FORMULA_TYPE, NUMBER_TYPE, VALUE_PROPERTY,
};
pub use computation::{Compute, Computation};
pub use error::{ComputeError, ScriptError};
pub use format::format_number;
pub use script::create_sandbox_engine;
pub use value::Value;
