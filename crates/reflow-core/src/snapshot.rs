//! Immutable, serializable views of engine state.
//!
//! A snapshot is taken between passes, so it never shows a partially
//! propagated graph.

use crate::graph::Engine;
use reflow_engine::engine::{Cell, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComputationSnapshot {
    pub name: String,
    pub inputs: Vec<String>,
    pub output: String,
    pub priority: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellSnapshot {
    pub id: String,
    #[serde(rename = "type")]
    pub type_tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub computations: Vec<ComputationSnapshot>,
}

impl From<&Cell> for CellSnapshot {
    fn from(cell: &Cell) -> Self {
        CellSnapshot {
            id: cell.id.clone(),
            type_tag: cell.type_tag.clone(),
            value: cell.value.clone(),
            properties: cell.properties.clone(),
            children: cell.children().to_vec(),
            computations: cell
                .computations()
                .iter()
                .map(|(name, c)| ComputationSnapshot {
                    name: name.clone(),
                    inputs: c.inputs.clone(),
                    output: c.output.clone(),
                    priority: c.priority,
                    source: c.source().map(str::to_string),
                })
                .collect(),
        }
    }
}

/// Every cell, in creation order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub revision: u64,
    pub running: bool,
    pub cells: Vec<CellSnapshot>,
}

impl Snapshot {
    pub fn cell(&self, id: &str) -> Option<&CellSnapshot> {
        self.cells.iter().find(|c| c.id == id)
    }

    pub fn value(&self, id: &str) -> Option<&Value> {
        self.cell(id).and_then(|c| c.value.as_ref())
    }
}

impl Engine {
    /// Materialize the current state.
    pub fn get_state(&self) -> Snapshot {
        Snapshot {
            revision: self.revision,
            running: self.running,
            cells: self.cells.iter().map(CellSnapshot::from).collect(),
        }
    }
}
