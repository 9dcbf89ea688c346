//! # Semitone: Pitch Sequencing and Quantization Modules
//!
//! `semitone` provides two modules for modular synthesis hosts, along with
//! the DSP pieces they are built from:
//!
//! - **Semitone Sequencer** - four measures of eight steps, each step an
//!   octave plus a semitone, with swing, random detune, slide, gate
//!   probability, scale quantization and a chord mode that plays every
//!   measure at once
//! - **Guide Quant** - a quantizer that snaps its input to whichever notes
//!   are present on a polyphonic guide cable
//!
//! Modules speak the host's port and parameter conventions through
//! [`port::GraphModule`], and are created by type id through
//! [`serialize::ModuleRegistry`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use semitone::prelude::*;
//!
//! let registry = ModuleRegistry::new();
//! let mut seq = registry.instantiate("semitone_sequencer", 44100.0).unwrap();
//!
//! let mut inputs = PortValues::new();
//! let mut outputs = PortValues::new();
//! inputs.set(1, 0.0); // external clock patched, low
//!
//! seq.set_param(seq_params::RUN, 1.0);
//! seq.tick(&inputs, &mut outputs);
//!
//! let gate = outputs.get(10);
//! let cv = outputs.get_poly(11);
//! ```

pub mod detune;
pub mod display;
pub mod dsp;
pub mod guided;
pub mod modules;
pub mod param;
pub mod port;
pub mod rng;
pub mod scale;
pub mod sequencer;
pub mod serialize;
pub mod slew;
pub mod state;
pub mod steps;

/// Prelude module for convenient imports
pub mod prelude {
    // Ports and parameters
    pub use crate::param::{ParamDef, ParamId, ParamValues, ValueFormat};
    pub use crate::port::{
        GraphModule, LightId, PolyVoltage, PortDef, PortId, PortSpec, PortValues, SignalKind,
        MAX_CHANNELS,
    };

    // Quantizers
    pub use crate::guided::{DefaultScale, GuidedQuantizer};
    pub use crate::scale::{NearestNoteQuantizer, VoltageScale};

    // Sequencer engine
    pub use crate::detune::{DetuneMode, DetuneModulator};
    pub use crate::sequencer::{
        Direction, QuantizationMode, SequencerControls, SequencerInputs, SequencerOutput,
        SequencerState, StepSequencer,
    };
    pub use crate::slew::SlewLimiter;
    pub use crate::steps::{StepBank, StepSlot};

    // Host modules
    pub use crate::modules::{guide_params, seq_params, GuideQuant, SemitoneSequencer};

    // Persistence
    pub use crate::serialize::{ModuleDef, ModuleMetadata, ModuleRegistry, RegistryError};
    pub use crate::state::{PersistedState, StateError};
}
