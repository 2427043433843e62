//! Serializable commands for driving an engine from a transport.
//!
//! A client sends `{"type": "UPDATE_VALUE", "payload": {"id": "A", "value": 5}}`
//! and the server hands the decoded [`Action`] to [`Engine::dispatch`].
//! Changes it causes reach [`Engine::observe_updates`] subscribers like any
//! other write.

use crate::error::Result;
use crate::graph::Engine;
use reflow_engine::engine::Value;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// [`Engine::set_value`].
    UpdateValue { id: String, value: Value },
    /// [`Engine::set_property`].
    UpdateProperty {
        id: String,
        property: String,
        value: Value,
    },
    /// [`Engine::create_element`] in the current dashboard.
    AddElement {
        id: String,
        #[serde(rename = "type")]
        type_tag: String,
    },
    /// [`Engine::create_dashboard`].
    AddDashboard { id: String },
    /// [`Engine::set_current_dashboard`].
    SelectDashboard { id: String },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::UpdateValue { .. } => "UPDATE_VALUE",
            Action::UpdateProperty { .. } => "UPDATE_PROPERTY",
            Action::AddElement { .. } => "ADD_ELEMENT",
            Action::AddDashboard { .. } => "ADD_DASHBOARD",
            Action::SelectDashboard { .. } => "SELECT_DASHBOARD",
        }
    }
}

impl Engine {
    /// Apply one action. Errors are those of the operation it maps to.
    pub fn dispatch(&mut self, action: Action) -> Result<()> {
        debug!(action = action.name(), "dispatch");
        match action {
            Action::UpdateValue { id, value } => self.set_value(&id, value),
            Action::UpdateProperty {
                id,
                property,
                value,
            } => self.set_property(&id, &property, value),
            Action::AddElement { id, type_tag } => self.create_element(&id, &type_tag),
            Action::AddDashboard { id } => self.create_dashboard(&id),
            Action::SelectDashboard { id } => self.set_current_dashboard(&id),
        }
    }
}
