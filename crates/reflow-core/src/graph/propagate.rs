//! Propagation of value changes through computations.
//!
//! One external write starts one pass. A computation becomes stale when one
//! of its inputs changes in the pass. The pass then repeatedly runs the
//! highest-precedence stale computation whose inputs are all settled, that
//! is, not the output of any computation that could still run in this pass.
//! In an acyclic graph this is topological order, so every output is
//! computed from final inputs.
//!
//! Each cell is written at most once per pass, and the externally written
//! cell not at all. When every stale computation waits on another (a cycle
//! such as `A = B` / `B = A`, or the solve-for directions of `X = A + B`),
//! the highest-precedence one runs anyway. That breaks cycles
//! deterministically, but a cyclic system that needs several rounds to reach
//! a numeric fixpoint only gets one.
//!
//! Observers hear about the pass once it has settled, one notification per
//! changed cell.

use super::state::{CellIndex, ComputationFailure, Engine};
use reflow_engine::engine::{VALUE_PROPERTY, Value};
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, trace, warn};

#[derive(Default)]
struct Pass {
    /// Cells that may not be written again in this pass.
    processed: HashSet<CellIndex>,
    /// Bindings with an input that changed since they last ran. Binding
    /// indices are precedence ranks, so iteration is precedence order.
    stale: BTreeSet<usize>,
    /// Cells whose value changed, in change order.
    changed: Vec<CellIndex>,
    evaluations: usize,
}

impl Engine {
    /// Store a cell value and, when running, propagate it.
    pub(crate) fn write_value(&mut self, idx: CellIndex, value: Value) {
        if !self.cells[idx].set_property(VALUE_PROPERTY, value) {
            return;
        }

        let mut pass = Pass::default();
        pass.changed.push(idx);
        if self.running {
            pass.processed.insert(idx);
            self.mark_dirty(idx, &mut pass);
            self.last_errors.clear();
            self.run(&mut pass);
        } else {
            debug!(cell = %self.cells[idx].id, "engine stopped; change not propagated");
        }
        self.finish(pass);
    }

    /// Run one pass triggered by `seeds` without marking them processed, so
    /// outputs that are also seeds can still be brought up to date.
    ///
    /// `already_changed` are cells modified before the pass (such as seeded
    /// inputs); they are published with it. Propagation only happens while
    /// running.
    pub(crate) fn settle_from(&mut self, seeds: Vec<CellIndex>, already_changed: Vec<CellIndex>) {
        let mut pass = Pass {
            changed: already_changed,
            ..Pass::default()
        };
        if self.running {
            for seed in seeds {
                self.mark_dirty(seed, &mut pass);
            }
            self.last_errors.clear();
            self.run(&mut pass);
        }
        self.finish(pass);
    }

    fn mark_dirty(&self, idx: CellIndex, pass: &mut Pass) {
        let Some(dependents) = self.dependents.get(&idx) else {
            return;
        };
        for &binding in dependents {
            if !pass.processed.contains(&self.bindings[binding].output) {
                pass.stale.insert(binding);
            }
        }
    }

    fn run(&mut self, pass: &mut Pass) {
        while let Some(binding) = self.next_binding(pass) {
            pass.stale.remove(&binding);
            self.evaluate_binding(binding, pass);
        }
    }

    /// Pick the next stale binding to evaluate, or `None` once settled.
    fn next_binding(&self, pass: &mut Pass) -> Option<usize> {
        let processed = &pass.processed;
        pass.stale
            .retain(|&b| !processed.contains(&self.bindings[b].output));
        let first = pass.stale.first().copied()?;

        let pending = self.pending_cells(pass);
        let ready = pass.stale.iter().copied().find(|&b| {
            self.bindings[b]
                .inputs
                .iter()
                .all(|input| !pending.contains(input))
        });
        Some(ready.unwrap_or_else(|| {
            trace!(
                output = %self.cells[self.bindings[first].output].id,
                "cycle; evaluating by precedence"
            );
            first
        }))
    }

    /// Cells that may still be written in this pass: outputs of stale
    /// bindings and everything downstream of them.
    fn pending_cells(&self, pass: &Pass) -> HashSet<CellIndex> {
        let mut pending = HashSet::new();
        let mut frontier: Vec<CellIndex> = pass
            .stale
            .iter()
            .map(|&b| self.bindings[b].output)
            .collect();
        while let Some(cell) = frontier.pop() {
            if !pending.insert(cell) {
                continue;
            }
            for &b in self.dependents.get(&cell).into_iter().flatten() {
                let output = self.bindings[b].output;
                if !pass.processed.contains(&output) && !pending.contains(&output) {
                    frontier.push(output);
                }
            }
        }
        pending
    }

    fn evaluate_binding(&mut self, binding: usize, pass: &mut Pass) {
        let binding = &self.bindings[binding];
        let output = binding.output;

        let Some(inputs) = binding
            .inputs
            .iter()
            .map(|&idx| self.cells[idx].value.clone())
            .collect::<Option<Vec<Value>>>()
        else {
            return;
        };

        let (name, computation) = &self.cells[binding.formula].computations()[binding.slot];
        pass.evaluations += 1;
        match computation.evaluate(&inputs) {
            Ok(result) => {
                if self.cells[output].value.as_ref() == Some(&result) {
                    return;
                }
                trace!(
                    computation = %name,
                    output = %self.cells[output].id,
                    value = %result,
                    "computed"
                );
                self.cells[output].value = Some(result);
                pass.processed.insert(output);
                pass.changed.push(output);
                self.mark_dirty(output, pass);
            }
            Err(error) => {
                let failure = ComputationFailure {
                    formula: self.cells[binding.formula].id.clone(),
                    computation: name.clone(),
                    output: self.cells[output].id.clone(),
                    error,
                };
                warn!(
                    formula = %failure.formula,
                    computation = %failure.computation,
                    output = %failure.output,
                    error = %failure.error,
                    "computation failed; output left unchanged"
                );
                self.last_errors.push(failure);
            }
        }
    }

    /// Publish a settled pass: one notification per changed cell, then state.
    fn finish(&mut self, pass: Pass) {
        if pass.changed.is_empty() {
            return;
        }
        debug!(
            changed = pass.changed.len(),
            evaluations = pass.evaluations,
            failures = self.last_errors.len(),
            "pass settled"
        );
        self.revision += 1;
        let mut seen = HashSet::new();
        for idx in pass.changed {
            if seen.insert(idx) {
                self.notify(idx, VALUE_PROPERTY);
            }
        }
        self.emit_state();
    }
}
