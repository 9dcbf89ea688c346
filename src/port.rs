//! Signal Conventions and Port System
//!
//! This module defines the signal types, port definitions, polyphonic voltage
//! containers and the type-erased interface the host drives every sample.

use crate::param::{ParamDef, ParamId};
use crate::state::StateError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Unique identifier for a port within a module
pub type PortId = u32;

/// Unique identifier for an indicator light within a module
pub type LightId = u32;

/// Maximum number of channels a polyphonic cable carries
pub const MAX_CHANNELS: usize = 16;

/// Semantic signal classification following hardware modular conventions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    /// Pitch CV following 1V/octave standard
    VoltPerOctave,

    /// Gate signal: 0V (low) or +10V (high)
    Gate,

    /// Trigger signal, short pulse used for instantaneous events
    Trigger,

    /// Clock signal, regular trigger pulses at tempo
    Clock,
}

impl SignalKind {
    /// Returns the typical voltage range (min, max) for this signal type
    pub fn voltage_range(&self) -> (f64, f64) {
        match self {
            SignalKind::VoltPerOctave => (-5.0, 5.0),
            SignalKind::Gate => (0.0, 10.0),
            SignalKind::Trigger => (0.0, 10.0),
            SignalKind::Clock => (0.0, 10.0),
        }
    }

    /// Whether the port may carry more than one channel
    pub fn is_polyphonic(&self) -> bool {
        matches!(self, SignalKind::VoltPerOctave)
    }
}

/// Definition of a single port (input or output)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortDef {
    /// Unique identifier within the module
    pub id: PortId,

    /// Human-readable name (e.g., "clock", "guide", "cv")
    pub name: String,

    /// Signal type for validation and UI hints
    pub kind: SignalKind,
}

impl PortDef {
    pub fn new(id: PortId, name: impl Into<String>, kind: SignalKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
        }
    }
}

/// Specification of all ports for a module
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortSpec {
    pub inputs: Vec<PortDef>,
    pub outputs: Vec<PortDef>,
}

impl PortSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input_by_name(&self, name: &str) -> Option<&PortDef> {
        self.inputs.iter().find(|p| p.name == name)
    }

    pub fn output_by_name(&self, name: &str) -> Option<&PortDef> {
        self.outputs.iter().find(|p| p.name == name)
    }

    pub fn input_by_id(&self, id: PortId) -> Option<&PortDef> {
        self.inputs.iter().find(|p| p.id == id)
    }

    pub fn output_by_id(&self, id: PortId) -> Option<&PortDef> {
        self.outputs.iter().find(|p| p.id == id)
    }
}

/// Voltages carried by one cable, up to [`MAX_CHANNELS`] channels.
///
/// A connected cable may carry zero channels; readers must check
/// [`PolyVoltage::channels`] before relying on any value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolyVoltage {
    voltages: [f64; MAX_CHANNELS],
    channels: usize,
}

impl PolyVoltage {
    pub fn mono(value: f64) -> Self {
        let mut voltages = [0.0; MAX_CHANNELS];
        voltages[0] = value;
        Self {
            voltages,
            channels: 1,
        }
    }

    /// Build from a slice; channels beyond [`MAX_CHANNELS`] are dropped.
    pub fn from_slice(values: &[f64]) -> Self {
        let channels = values.len().min(MAX_CHANNELS);
        let mut voltages = [0.0; MAX_CHANNELS];
        voltages[..channels].copy_from_slice(&values[..channels]);
        Self { voltages, channels }
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn set_channels(&mut self, channels: usize) {
        self.channels = channels.min(MAX_CHANNELS);
    }

    /// Channel voltage, 0V for channels that are not present
    pub fn voltage(&self, channel: usize) -> f64 {
        if channel < self.channels {
            self.voltages[channel]
        } else {
            0.0
        }
    }

    pub fn set_voltage(&mut self, channel: usize, value: f64) {
        if channel < MAX_CHANNELS {
            self.voltages[channel] = value;
        }
    }

    /// The live channels only
    pub fn as_slice(&self) -> &[f64] {
        &self.voltages[..self.channels]
    }
}

impl Default for PolyVoltage {
    fn default() -> Self {
        Self {
            voltages: [0.0; MAX_CHANNELS],
            channels: 0,
        }
    }
}

/// Runtime port values container
///
/// An input that is present in the map is connected. Outputs written by a
/// module stay in the map until the module overwrites them, so a module that
/// skips a write leaves the previous voltage in place.
#[derive(Debug, Clone, Default)]
pub struct PortValues {
    pub values: HashMap<PortId, PolyVoltage>,
}

impl PortValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// First channel of a connected port
    pub fn get(&self, id: PortId) -> Option<f64> {
        self.values.get(&id).map(|v| v.voltage(0))
    }

    pub fn get_or(&self, id: PortId, default: f64) -> f64 {
        self.get(id).unwrap_or(default)
    }

    pub fn get_poly(&self, id: PortId) -> Option<&PolyVoltage> {
        self.values.get(&id)
    }

    /// Set a monophonic value
    pub fn set(&mut self, id: PortId, value: f64) {
        self.values.insert(id, PolyVoltage::mono(value));
    }

    pub fn set_poly(&mut self, id: PortId, value: PolyVoltage) {
        self.values.insert(id, value);
    }

    pub fn has(&self, id: PortId) -> bool {
        self.values.contains_key(&id)
    }

    /// Disconnect a port
    pub fn remove(&mut self, id: PortId) {
        self.values.remove(&id);
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

/// Type-erased module interface driven by the host, one `tick` per sample
pub trait GraphModule: Send + Sync {
    /// Returns the module's port specification
    fn port_spec(&self) -> &PortSpec;

    /// Process one sample given port values
    fn tick(&mut self, inputs: &PortValues, outputs: &mut PortValues);

    /// Return the module to its freshly-initialized state
    fn reset(&mut self);

    /// Randomize the module's settings
    fn randomize(&mut self) {}

    /// Set sample rate
    fn set_sample_rate(&mut self, sample_rate: f64);

    /// Get parameter definitions for UI binding
    fn params(&self) -> &[ParamDef] {
        &[]
    }

    /// Get a parameter value
    fn get_param(&self, _id: ParamId) -> Option<f64> {
        None
    }

    /// Set a parameter value
    fn set_param(&mut self, _id: ParamId, _value: f64) {}

    /// Current brightness (0–1) of an indicator light
    fn light(&self, _id: LightId) -> Option<f64> {
        None
    }

    /// Get module type identifier for serialization
    fn type_id(&self) -> &'static str {
        "unknown"
    }

    /// Serialize non-parameter module state
    fn serialize_state(&self) -> Option<serde_json::Value> {
        None
    }

    /// Restore non-parameter module state
    fn deserialize_state(&mut self, _state: &serde_json::Value) -> Result<(), StateError> {
        Ok(())
    }
}
