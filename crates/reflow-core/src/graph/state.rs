use crate::config::EngineConfig;
use crate::error::{ConfigurationError, Result};
use reflow_engine::engine::{Cell, ComputeError, Value};
use std::collections::HashMap;

use super::observe::Observers;

/// Dense index of a cell in the engine arena. Cells are never removed, so an
/// index stays valid for the engine's lifetime.
pub(crate) type CellIndex = usize;

/// A registered computation with its ids resolved to arena indices.
#[derive(Clone, Debug)]
pub(crate) struct Binding {
    /// Formula cell that owns the computation.
    pub formula: CellIndex,
    /// Position in the formula's computation list.
    pub slot: usize,
    pub inputs: Vec<CellIndex>,
    pub output: CellIndex,
}

/// A computation that failed during the most recent pass.
#[derive(Clone, Debug, PartialEq)]
pub struct ComputationFailure {
    pub formula: String,
    pub computation: String,
    pub output: String,
    pub error: ComputeError,
}

/// Owner of every cell in one session.
///
/// All mutation goes through `&mut self`, so one external write fully settles
/// before the next is accepted, and nothing can add cells mid-pass.
pub struct Engine {
    pub(crate) cells: Vec<Cell>,
    pub(crate) index: HashMap<String, CellIndex>,
    pub(crate) bindings: Vec<Binding>,
    /// Reverse dependency map: input cell -> bindings that read it, in
    /// precedence order.
    pub(crate) dependents: HashMap<CellIndex, Vec<usize>>,
    pub(crate) current_dashboard: Option<CellIndex>,
    pub(crate) running: bool,
    pub(crate) config: EngineConfig,
    pub(crate) observers: Observers,
    /// Bumped once per settled change, structural or value.
    pub(crate) revision: u64,
    pub(crate) last_errors: Vec<ComputationFailure>,
}

impl Engine {
    /// Create an empty, stopped engine.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Engine {
            cells: Vec::new(),
            index: HashMap::new(),
            bindings: Vec::new(),
            dependents: HashMap::new(),
            current_dashboard: None,
            running: false,
            config,
            observers: Observers::default(),
            revision: 0,
            last_errors: Vec::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Cell> {
        self.index.get(id).map(|&idx| &self.cells[idx])
    }

    /// Current value of a cell; `None` if the cell is unknown or undefined.
    pub fn value(&self, id: &str) -> Option<&Value> {
        self.get(id).and_then(|cell| cell.value.as_ref())
    }

    pub fn property(&self, id: &str, name: &str) -> Option<&Value> {
        self.get(id).and_then(|cell| cell.property(name))
    }

    /// Cells in creation order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn current_dashboard(&self) -> Option<&str> {
        self.current_dashboard
            .map(|idx| self.cells[idx].id.as_str())
    }

    /// Ordered child ids of a dashboard.
    pub fn dashboard_children(&self, id: &str) -> Result<&[String]> {
        let cell = self
            .get(id)
            .ok_or_else(|| ConfigurationError::UnknownDashboard(id.to_string()))?;
        if !cell.is_dashboard() {
            return Err(ConfigurationError::NotADashboard(id.to_string()).into());
        }
        Ok(cell.children())
    }

    /// Computations that failed during the most recent propagation pass.
    pub fn last_errors(&self) -> &[ComputationFailure] {
        &self.last_errors
    }

    /// Number of settled changes so far. Every snapshot carries this.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn lookup(&self, id: &str) -> Result<CellIndex> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| ConfigurationError::UnknownCell(id.to_string()).into())
    }

    /// Rebuild bindings and the reverse dependency map from every formula.
    /// Call this after computations are added or replaced.
    ///
    /// Bindings are stored in precedence order: priority (highest first),
    /// then formula creation order, then computation name. A binding's index
    /// is its rank, and every dependents list is sorted by it.
    pub(crate) fn rebuild_dependents(&mut self) {
        self.bindings.clear();
        self.dependents.clear();

        for (formula, cell) in self.cells.iter().enumerate() {
            for (slot, (_, computation)) in cell.computations().iter().enumerate() {
                // Inputs and outputs were validated at registration.
                let inputs = computation
                    .inputs
                    .iter()
                    .filter_map(|id| self.index.get(id).copied())
                    .collect::<Vec<_>>();
                let Some(&output) = self.index.get(&computation.output) else {
                    continue;
                };
                self.bindings.push(Binding {
                    formula,
                    slot,
                    inputs,
                    output,
                });
            }
        }

        let cells = &self.cells;
        self.bindings.sort_by(|a, b| {
            let (a_name, a_comp) = &cells[a.formula].computations()[a.slot];
            let (b_name, b_comp) = &cells[b.formula].computations()[b.slot];
            b_comp
                .priority
                .cmp(&a_comp.priority)
                .then(a.formula.cmp(&b.formula))
                .then(a_name.cmp(b_name))
        });

        for (rank, binding) in self.bindings.iter().enumerate() {
            for &input in &binding.inputs {
                let entry = self.dependents.entry(input).or_default();
                if entry.last() != Some(&rank) {
                    entry.push(rank);
                }
            }
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
