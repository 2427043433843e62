//! Cell registry and propagation (UI-agnostic).

mod observe;
mod ops;
mod propagate;
mod state;

pub use observe::{Subscription, Update};
pub use state::{ComputationFailure, Engine};
