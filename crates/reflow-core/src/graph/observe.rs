//! Observer registration for settled changes.
//!
//! Observers are plain callbacks, either keyed by `(cell, property)` or
//! engine-wide. They receive values by reference and have no handle on the
//! engine, so a notification can never re-enter a propagation pass.

use super::state::{CellIndex, Engine};
use crate::error::Result;
use crate::snapshot::Snapshot;
use reflow_engine::engine::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

type PropertyCallback = Box<dyn FnMut(&Value) + Send>;
type UpdateCallback = Box<dyn FnMut(&Update) + Send>;
type StateCallback = Box<dyn FnMut(&Snapshot) + Send>;

/// One settled property change, as seen by [`Engine::observe_updates`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub id: String,
    pub property: String,
    pub value: Value,
}

/// Handle returned by [`Engine::observe`] and [`Engine::observe_state`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

#[derive(Default)]
pub(crate) struct Observers {
    next_id: u64,
    properties: HashMap<(CellIndex, String), Vec<(Subscription, PropertyCallback)>>,
    updates: Vec<(Subscription, UpdateCallback)>,
    state: Vec<(Subscription, StateCallback)>,
}

impl Observers {
    fn next(&mut self) -> Subscription {
        self.next_id += 1;
        Subscription(self.next_id)
    }

    fn remove(&mut self, subscription: Subscription) -> bool {
        let before = self.len();
        for list in self.properties.values_mut() {
            list.retain(|(sub, _)| *sub != subscription);
        }
        self.properties.retain(|_, list| !list.is_empty());
        self.updates.retain(|(sub, _)| *sub != subscription);
        self.state.retain(|(sub, _)| *sub != subscription);
        self.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.properties.values().map(Vec::len).sum::<usize>()
            + self.updates.len()
            + self.state.len()
    }

    pub(crate) fn clear(&mut self) {
        self.properties.clear();
        self.updates.clear();
        self.state.clear();
    }

    pub(crate) fn has_state_observers(&self) -> bool {
        !self.state.is_empty()
    }
}

impl Engine {
    /// Watch one property of a cell.
    ///
    /// The callback runs once immediately with the current value (if defined),
    /// then once per settled change.
    pub fn observe<F>(&mut self, id: &str, property: &str, mut callback: F) -> Result<Subscription>
    where
        F: FnMut(&Value) + Send + 'static,
    {
        let idx = self.lookup(id)?;
        if let Some(current) = self.cells[idx].property(property) {
            callback(current);
        }
        let subscription = self.observers.next();
        self.observers
            .properties
            .entry((idx, property.to_string()))
            .or_default()
            .push((subscription, Box::new(callback)));
        Ok(subscription)
    }

    /// Receive every settled property change of every cell, in the order the
    /// engine publishes them. Nothing is replayed.
    pub fn observe_updates<F>(&mut self, callback: F) -> Subscription
    where
        F: FnMut(&Update) + Send + 'static,
    {
        let subscription = self.observers.next();
        self.observers.updates.push((subscription, Box::new(callback)));
        subscription
    }

    /// Receive a snapshot after every settled change. Replays the current
    /// state immediately.
    pub fn observe_state<F>(&mut self, mut callback: F) -> Subscription
    where
        F: FnMut(&Snapshot) + Send + 'static,
    {
        callback(&self.get_state());
        let subscription = self.observers.next();
        self.observers.state.push((subscription, Box::new(callback)));
        subscription
    }

    /// Release a subscription. Returns `false` if it was already gone.
    pub fn unobserve(&mut self, subscription: Subscription) -> bool {
        self.observers.remove(subscription)
    }

    /// Number of live subscriptions.
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub(crate) fn notify(&mut self, idx: CellIndex, property: &str) {
        let Some(value) = self.cells[idx].property(property) else {
            return;
        };
        let key = (idx, property.to_string());
        if let Some(list) = self.observers.properties.get_mut(&key) {
            for (_, callback) in list.iter_mut() {
                callback(value);
            }
        }
        if !self.observers.updates.is_empty() {
            let update = Update {
                id: self.cells[idx].id.clone(),
                property: key.1,
                value: value.clone(),
            };
            for (_, callback) in self.observers.updates.iter_mut() {
                callback(&update);
            }
        }
    }

    pub(crate) fn emit_state(&mut self) {
        if !self.observers.has_state_observers() {
            return;
        }
        let snapshot = self.get_state();
        for (_, callback) in self.observers.state.iter_mut() {
            callback(&snapshot);
        }
    }
}
