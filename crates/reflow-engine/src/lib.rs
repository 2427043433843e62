//! reflow_engine - Cell model and computations (closures + sandboxed Rhai formulas).

pub mod builtins;
pub mod engine;
