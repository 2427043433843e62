//! Computations: an ordered input set, one output, and a pure function.
//!
//! A formula cell owns any number of these. Bidirectional relations are
//! expressed by registering one computation per "solve for" direction, so
//! `X = A + B` is typically three computations: `A,B -> X`, `X,B -> A` and
//! `X,A -> B`.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use super::{ComputeError, Value};

/// A pure, synchronous function from input values to an output value.
pub trait Compute: Send + Sync {
    fn compute(&self, inputs: &[Value]) -> Result<Value, ComputeError>;
}

impl<F> Compute for F
where
    F: Fn(&[Value]) -> Result<Value, ComputeError> + Send + Sync,
{
    fn compute(&self, inputs: &[Value]) -> Result<Value, ComputeError> {
        self(inputs)
    }
}

/// One input set -> output mapping.
#[derive(Clone)]
pub struct Computation {
    pub inputs: Vec<String>,
    pub output: String,
    /// Higher priority computations are evaluated first when several are
    /// triggered by the same cell.
    pub priority: i32,
    compute: Arc<dyn Compute>,
    source: Option<String>,
}

impl Computation {
    pub fn new<I, S, F>(inputs: I, output: impl Into<String>, compute: F) -> Computation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&[Value]) -> Result<Value, ComputeError> + Send + Sync + 'static,
    {
        Computation::from_compute(inputs, output, Arc::new(compute))
    }

    pub fn from_compute<I, S>(
        inputs: I,
        output: impl Into<String>,
        compute: Arc<dyn Compute>,
    ) -> Computation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Computation {
            inputs: inputs.into_iter().map(Into::into).collect(),
            output: output.into(),
            priority: 0,
            compute,
            source: None,
        }
    }

    /// Build a computation over numbers only.
    /// Inputs are coerced with [`Value::as_number`]; anything else fails the
    /// evaluation with [`ComputeError::NonNumeric`].
    pub fn numeric<I, S, F>(inputs: I, output: impl Into<String>, f: F) -> Computation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&[f64]) -> f64 + Send + Sync + 'static,
    {
        Computation::new(inputs, output, move |values: &[Value]| {
            let mut nums = Vec::with_capacity(values.len());
            for (index, value) in values.iter().enumerate() {
                match value.as_number() {
                    Some(n) => nums.push(n),
                    None => {
                        return Err(ComputeError::NonNumeric {
                            index,
                            found: value.kind(),
                        });
                    }
                }
            }
            Ok(Value::Number(f(&nums)))
        })
    }

    pub fn with_priority(mut self, priority: i32) -> Computation {
        self.priority = priority;
        self
    }

    pub(crate) fn with_source(mut self, source: impl Into<String>) -> Computation {
        self.source = Some(source.into());
        self
    }

    /// Formula text, for computations built from a script.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Run the compute function against `inputs`.
    ///
    /// Panics inside the function are caught, and numeric results must be
    /// finite. Either failure comes back as a [`ComputeError`].
    pub fn evaluate(&self, inputs: &[Value]) -> Result<Value, ComputeError> {
        let compute = &self.compute;
        let result = catch_unwind(AssertUnwindSafe(|| compute.compute(inputs)))
            .map_err(|payload| ComputeError::Panicked(panic_message(payload.as_ref())))??;
        if let Some(n) = result.non_finite() {
            return Err(ComputeError::NonFinite(n));
        }
        Ok(result)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl fmt::Debug for Computation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computation")
            .field("inputs", &self.inputs)
            .field("output", &self.output)
            .field("priority", &self.priority)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}
