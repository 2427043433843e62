//! Single-active-engine policy per document.
//!
//! A document id may be held by at most one live [`SessionGuard`]. The claim
//! is released when the guard drops, which also stops its engine.

use crate::error::SessionError;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use reflow_core::{Engine, EngineConfig};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tracing::{debug, info};

/// Shared map of claimed documents. Cloning shares the same map.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    active: Arc<DashMap<String, ()>>,
    config: EngineConfig,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engines created by this registry use `config`.
    pub fn with_config(config: EngineConfig) -> Self {
        SessionRegistry {
            active: Arc::new(DashMap::new()),
            config,
        }
    }

    /// Claim `document` and hand back a fresh engine for it.
    pub fn claim(&self, document: &str) -> Result<SessionGuard, SessionError> {
        match self.active.entry(document.to_string()) {
            Entry::Occupied(_) => {
                debug!(document, "session already active");
                Err(SessionError::AlreadyActive(document.to_string()))
            }
            Entry::Vacant(slot) => {
                slot.insert(());
                info!(document, "session claimed");
                Ok(SessionGuard {
                    document: document.to_string(),
                    engine: Engine::with_config(self.config.clone()),
                    active: Arc::clone(&self.active),
                })
            }
        }
    }

    pub fn is_active(&self, document: &str) -> bool {
        self.active.contains_key(document)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}

/// A claimed document and its engine. Derefs to [`Engine`].
pub struct SessionGuard {
    document: String,
    engine: Engine,
    active: Arc<DashMap<String, ()>>,
}

impl SessionGuard {
    pub fn document(&self) -> &str {
        &self.document
    }
}

impl Deref for SessionGuard {
    type Target = Engine;

    fn deref(&self) -> &Engine {
        &self.engine
    }
}

impl DerefMut for SessionGuard {
    fn deref_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if self.engine.is_running() {
            self.engine.stop();
        }
        self.active.remove(&self.document);
        info!(document = %self.document, "session released");
    }
}
