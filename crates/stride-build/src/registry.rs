//! Explicit builder-factory registry.
//!
//! Maps framework names to [`BuilderFactory`] implementations at runtime.
//! The orchestrator consults this instead of loading dynamic libraries;
//! whatever sits behind a factory (in-process code, an out-of-process
//! shim) is invisible past the four-function contract.

use crate::builder::BuilderFactory;
use std::collections::HashMap;

/// Framework name → factory map.
#[derive(Default)]
pub struct BuilderRegistry {
    factories: HashMap<String, Box<dyn BuilderFactory>>,
}

impl BuilderRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under its own name, replacing any previous
    /// registration for that framework.
    pub fn register(&mut self, factory: Box<dyn BuilderFactory>) {
        self.factories.insert(factory.name().to_string(), factory);
    }

    /// Factory for a framework, if registered.
    pub fn get(&self, framework: &str) -> Option<&dyn BuilderFactory> {
        self.factories.get(framework).map(Box::as_ref)
    }

    /// Registered framework names, sorted for deterministic reporting.
    pub fn framework_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered factories.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
