use super::state::{CellIndex, Engine};
use crate::error::{ConfigurationError, LifecycleError, Result};
use reflow_engine::engine::{
    Cell, CellKind, Computation, DASHBOARD_PROPERTY, DASHBOARD_TYPE, FORMULA_TYPE, NUMBER_TYPE,
    VALUE_PROPERTY, Value,
};
use std::collections::HashSet;
use tracing::{debug, info};

impl Engine {
    fn check_new_id(&self, id: &str) -> Result<()> {
        if id.is_empty() {
            return Err(ConfigurationError::EmptyId.into());
        }
        if self.index.contains_key(id) {
            return Err(ConfigurationError::DuplicateId(id.to_string()).into());
        }
        Ok(())
    }

    fn insert_cell(&mut self, mut cell: Cell) -> CellIndex {
        cell.active = self.running;
        let idx = self.cells.len();
        self.index.insert(cell.id.clone(), idx);
        self.cells.push(cell);
        idx
    }

    /// Bump the revision and publish state after a structural change.
    fn touch(&mut self) {
        self.revision += 1;
        self.emit_state();
    }

    /// Create a top-level dashboard.
    pub fn create_dashboard(&mut self, id: &str) -> Result<()> {
        self.check_new_id(id)?;
        self.insert_cell(Cell::new_dashboard(id));
        debug!(dashboard = id, "created dashboard");
        self.touch();
        Ok(())
    }

    /// Select the dashboard that new cells are attached to.
    pub fn set_current_dashboard(&mut self, id: &str) -> Result<()> {
        let idx = self
            .index
            .get(id)
            .copied()
            .ok_or_else(|| ConfigurationError::UnknownDashboard(id.to_string()))?;
        if !self.cells[idx].is_dashboard() {
            return Err(ConfigurationError::NotADashboard(id.to_string()).into());
        }
        self.current_dashboard = Some(idx);
        Ok(())
    }

    /// Create a cell inside the current dashboard.
    ///
    /// A `type_tag` of `"dashboard"` creates a nested dashboard and `"formula"`
    /// creates a formula; anything else is a plain element.
    pub fn create_element(&mut self, id: &str, type_tag: &str) -> Result<()> {
        let dashboard = self
            .current_dashboard
            .ok_or(LifecycleError::NoCurrentDashboard)?;
        self.check_new_id(id)?;

        let mut cell = match type_tag {
            DASHBOARD_TYPE => Cell::new_dashboard(id),
            FORMULA_TYPE => Cell::new_formula(id),
            _ => Cell::new_element(id, type_tag),
        };
        let dashboard_id = self.cells[dashboard].id.clone();
        cell.properties
            .insert(DASHBOARD_PROPERTY.to_string(), Value::Text(dashboard_id));

        self.insert_cell(cell);
        if let CellKind::Dashboard { children } = &mut self.cells[dashboard].kind {
            children.push(id.to_string());
        }
        debug!(cell = id, kind = type_tag, "created cell");
        self.touch();
        Ok(())
    }

    /// Create a formula inside the current dashboard. It has no computations
    /// until [`Engine::add_computations`] is called.
    pub fn create_formula(&mut self, id: &str) -> Result<()> {
        self.create_element(id, FORMULA_TYPE)
    }

    /// Register computations on a formula.
    ///
    /// The whole batch is validated before anything is registered. A name that
    /// already exists on the formula is replaced. When the engine is running
    /// the new computations are evaluated right away.
    pub fn add_computations<I, S>(&mut self, formula_id: &str, computations: I) -> Result<()>
    where
        I: IntoIterator<Item = (S, Computation)>,
        S: Into<String>,
    {
        let formula = self.lookup(formula_id)?;
        if !self.cells[formula].is_formula() {
            return Err(ConfigurationError::NotAFormula(formula_id.to_string()).into());
        }

        let batch: Vec<(String, Computation)> = computations
            .into_iter()
            .map(|(name, c)| (name.into(), c))
            .collect();
        for (name, computation) in &batch {
            if computation.inputs.is_empty() {
                return Err(ConfigurationError::NoInputs {
                    computation: name.clone(),
                }
                .into());
            }
            if let Some(input) = computation.inputs.iter().find(|id| !self.contains(id)) {
                return Err(ConfigurationError::UnknownInput {
                    computation: name.clone(),
                    input: input.clone(),
                }
                .into());
            }
            if !self.contains(&computation.output) {
                return Err(ConfigurationError::UnknownOutput {
                    computation: name.clone(),
                    output: computation.output.clone(),
                }
                .into());
            }
        }

        let mut seeds = Vec::new();
        let mut seen = HashSet::new();
        for (_, computation) in &batch {
            for input in &computation.inputs {
                let idx = self.index[input.as_str()];
                if seen.insert(idx) {
                    seeds.push(idx);
                }
            }
        }
        let mut seeded = Vec::new();
        if let Some(seed) = self.config.seed() {
            for &idx in &seeds {
                let cell = &mut self.cells[idx];
                if cell.value.is_none() && cell.type_tag == NUMBER_TYPE {
                    cell.value = Some(Value::Number(seed));
                    seeded.push(idx);
                }
            }
        }

        let count = batch.len();
        if let CellKind::Formula { computations } = &mut self.cells[formula].kind {
            for (name, computation) in batch {
                match computations.iter_mut().find(|(existing, _)| *existing == name) {
                    Some(slot) => slot.1 = computation,
                    None => computations.push((name, computation)),
                }
            }
        }
        self.rebuild_dependents();
        debug!(formula = formula_id, count, "registered computations");

        self.touch();
        let seeds = seeds
            .into_iter()
            .filter(|&idx| self.cells[idx].value.is_some())
            .collect();
        self.settle_from(seeds, seeded);
        Ok(())
    }

    /// Set any property of a cell. No-op when the stored value is structurally
    /// equal. Writing `"value"` runs propagation.
    pub fn update_element(&mut self, id: &str, property: &str, value: Value) -> Result<()> {
        let idx = self.lookup(id)?;
        if property == VALUE_PROPERTY {
            self.write_value(idx, value);
            return Ok(());
        }
        if self.cells[idx].set_property(property, value) {
            self.notify(idx, property);
            self.touch();
        }
        Ok(())
    }

    /// Set a cell's value and propagate to dependents.
    pub fn set_value(&mut self, id: &str, value: impl Into<Value>) -> Result<()> {
        self.update_element(id, VALUE_PROPERTY, value.into())
    }

    pub fn set_property(&mut self, id: &str, name: &str, value: impl Into<Value>) -> Result<()> {
        self.update_element(id, name, value.into())
    }

    /// Store a value without propagating or notifying anyone.
    /// Meant for rehydrating saved state. The revision still advances, so
    /// snapshots taken either side of the write are distinguishable.
    pub fn set_value_silently(&mut self, id: &str, value: impl Into<Value>) -> Result<()> {
        let idx = self.lookup(id)?;
        let value = value.into();
        if self.cells[idx].value.as_ref() != Some(&value) {
            self.cells[idx].value = Some(value);
            self.revision += 1;
        }
        Ok(())
    }

    /// Activate every cell and bring formulas up to date with one pass seeded
    /// from every defined cell. Idempotent.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        for cell in &mut self.cells {
            cell.active = true;
        }
        info!(cells = self.cells.len(), "engine started");

        let seeds = self
            .cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.value.is_some())
            .map(|(idx, _)| idx)
            .collect();
        self.settle_from(seeds, Vec::new());
    }

    /// Deactivate every cell and drop all subscriptions. Writes are still
    /// accepted afterwards but do not propagate until the next `start`.
    /// Idempotent.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        for cell in &mut self.cells {
            cell.active = false;
        }
        let released = self.observers.len();
        self.observers.clear();
        info!(released, "engine stopped");
    }
}
