//! Cell data structures.
//!
//! - [`Cell`] - a named container for a value and open properties
//! - [`CellKind`] - what else the cell owns (dashboard children, formula computations)
//!
//! Cells never own each other. Dashboards and computations refer to cells by id,
//! and the registry that owns every cell lives in `reflow-core`.

use std::collections::BTreeMap;

use super::{Computation, Value};

/// Property name under which a cell's value is addressed.
pub const VALUE_PROPERTY: &str = "value";
/// Property set on every element to the id of the dashboard that holds it.
pub const DASHBOARD_PROPERTY: &str = "dashboard";

pub const DASHBOARD_TYPE: &str = "dashboard";
pub const FORMULA_TYPE: &str = "formula";
/// Cells of this type get a default value when a computation first reads them.
pub const NUMBER_TYPE: &str = "number";

/// What a cell carries besides its value and properties.
#[derive(Clone, Debug)]
pub enum CellKind {
    Element,
    Dashboard { children: Vec<String> },
    Formula { computations: Vec<(String, Computation)> },
}

/// A cell in the graph.
#[derive(Clone, Debug)]
pub struct Cell {
    pub id: String,
    pub type_tag: String,
    pub value: Option<Value>,
    pub properties: BTreeMap<String, Value>,
    pub kind: CellKind,
    /// Set while the owning engine is running.
    pub active: bool,
}

impl Cell {
    pub fn new_element(id: &str, type_tag: &str) -> Cell {
        Cell {
            id: id.to_string(),
            type_tag: type_tag.to_string(),
            value: None,
            properties: BTreeMap::new(),
            kind: CellKind::Element,
            active: false,
        }
    }

    pub fn new_dashboard(id: &str) -> Cell {
        Cell {
            kind: CellKind::Dashboard {
                children: Vec::new(),
            },
            ..Cell::new_element(id, DASHBOARD_TYPE)
        }
    }

    pub fn new_formula(id: &str) -> Cell {
        Cell {
            kind: CellKind::Formula {
                computations: Vec::new(),
            },
            ..Cell::new_element(id, FORMULA_TYPE)
        }
    }

    pub fn is_dashboard(&self) -> bool {
        matches!(self.kind, CellKind::Dashboard { .. })
    }

    pub fn is_formula(&self) -> bool {
        matches!(self.kind, CellKind::Formula { .. })
    }

    /// Read a property. `"value"` reads the cell value.
    pub fn property(&self, name: &str) -> Option<&Value> {
        if name == VALUE_PROPERTY {
            self.value.as_ref()
        } else {
            self.properties.get(name)
        }
    }

    /// Write a property. Returns `false` when the stored value was already
    /// structurally equal, in which case nothing changes.
    pub fn set_property(&mut self, name: &str, value: Value) -> bool {
        if self.property(name) == Some(&value) {
            return false;
        }
        if name == VALUE_PROPERTY {
            self.value = Some(value);
        } else {
            self.properties.insert(name.to_string(), value);
        }
        true
    }

    /// Child ids, in insertion order. Empty for anything but a dashboard.
    pub fn children(&self) -> &[String] {
        match &self.kind {
            CellKind::Dashboard { children } => children,
            _ => &[],
        }
    }

    /// Named computations, in registration order. Empty unless this is a formula.
    pub fn computations(&self) -> &[(String, Computation)] {
        match &self.kind {
            CellKind::Formula { computations } => computations,
            _ => &[],
        }
    }
}
