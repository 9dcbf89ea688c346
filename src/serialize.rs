//! Serialization and Persistence
//!
//! This module provides the module registry a host uses to instantiate
//! modules by type id, and [`ModuleDef`], the saved form of one module
//! instance: its parameter values plus whatever state it keeps outside them.

use crate::modules::{GuideQuant, SemitoneSequencer};
use crate::param::ParamId;
use crate::port::{GraphModule, PortSpec};
use crate::state::StateError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown module type: {0}")]
    UnknownModuleType(String),

    #[error("failed to restore state of {name}: {source}")]
    State {
        name: String,
        #[source]
        source: StateError,
    },
}

/// Serializable module definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleDef {
    /// Unique instance name
    pub name: String,

    /// Module type identifier
    pub module_type: String,

    /// Parameter values by id
    #[serde(default)]
    pub params: BTreeMap<ParamId, f64>,

    /// Module-specific state
    pub state: Option<serde_json::Value>,
}

impl ModuleDef {
    pub fn new(name: impl Into<String>, module_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module_type: module_type.into(),
            params: BTreeMap::new(),
            state: None,
        }
    }

    /// Snapshot a live module
    pub fn capture(name: impl Into<String>, module: &dyn GraphModule) -> Self {
        let params = module
            .params()
            .iter()
            .filter_map(|def| module.get_param(def.id).map(|v| (def.id, v)))
            .collect();
        Self {
            name: name.into(),
            module_type: module.type_id().to_string(),
            params,
            state: module.serialize_state(),
        }
    }

    pub fn with_param(mut self, id: ParamId, value: f64) -> Self {
        self.params.insert(id, value);
        self
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Module factory function type
pub type ModuleFactory = Box<dyn Fn(f64) -> Box<dyn GraphModule> + Send + Sync>;

/// Metadata about a registered module type
#[derive(Debug, Clone)]
pub struct ModuleMetadata {
    pub type_id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub port_spec: PortSpec,
}

/// Registry of available module types for instantiation
pub struct ModuleRegistry {
    factories: HashMap<String, ModuleFactory>,
    metadata: HashMap<String, ModuleMetadata>,
}

impl ModuleRegistry {
    /// Create a registry holding the built-in modules
    pub fn new() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
            metadata: HashMap::new(),
        };

        registry.register_builtin();
        registry
    }

    fn register_builtin(&mut self) {
        self.register_factory(
            "semitone_sequencer",
            "Semitone Sequencer",
            "Sequencers",
            "Four-measure pitch sequencer with swing, detune, slide and gate probability",
            |sr| Box::new(SemitoneSequencer::new(sr)),
        );

        self.register_factory(
            "guide_quant",
            "Guide Quant",
            "Quantizers",
            "Quantizer that takes its scale from a polyphonic guide input",
            |_| Box::new(GuideQuant::new()),
        );
    }

    /// Register a module type
    pub fn register_factory<F>(
        &mut self,
        type_id: &str,
        name: &str,
        category: &str,
        description: &str,
        factory: F,
    ) where
        F: Fn(f64) -> Box<dyn GraphModule> + Send + Sync + 'static,
    {
        // Instantiate once to capture the port layout
        let port_spec = factory(44100.0).port_spec().clone();

        self.metadata.insert(
            type_id.to_string(),
            ModuleMetadata {
                type_id: type_id.to_string(),
                name: name.to_string(),
                category: category.to_string(),
                description: description.to_string(),
                port_spec,
            },
        );
        self.factories.insert(type_id.to_string(), Box::new(factory));
    }

    /// Instantiate a module with default settings
    pub fn instantiate(&self, type_id: &str, sample_rate: f64) -> Option<Box<dyn GraphModule>> {
        self.factories.get(type_id).map(|f| f(sample_rate))
    }

    /// Rebuild a saved module: parameters first, then its own state
    pub fn from_def(
        &self,
        def: &ModuleDef,
        sample_rate: f64,
    ) -> Result<Box<dyn GraphModule>, RegistryError> {
        let mut module = self
            .instantiate(&def.module_type, sample_rate)
            .ok_or_else(|| RegistryError::UnknownModuleType(def.module_type.clone()))?;

        for (&id, &value) in &def.params {
            module.set_param(id, value);
        }
        if let Some(state) = &def.state {
            module
                .deserialize_state(state)
                .map_err(|source| RegistryError::State {
                    name: def.name.clone(),
                    source,
                })?;
        }
        Ok(module)
    }

    pub fn list_modules(&self) -> impl Iterator<Item = &ModuleMetadata> {
        self.metadata.values()
    }

    pub fn get_metadata(&self, type_id: &str) -> Option<&ModuleMetadata> {
        self.metadata.get(type_id)
    }

    pub fn list_by_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a ModuleMetadata> {
        self.metadata.values().filter(move |m| m.category == category)
    }

    pub fn categories(&self) -> Vec<String> {
        let mut cats: Vec<_> = self.metadata.values().map(|m| m.category.clone()).collect();
        cats.sort();
        cats.dedup();
        cats
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
