//! Host Modules
//!
//! The two modules a host instantiates: [`SemitoneSequencer`], the
//! four-measure pitch sequencer, and [`GuideQuant`], a quantizer whose scale
//! comes from a polyphonic guide cable. Both expose their controls as
//! parameters and their jacks through [`PortSpec`].

use crate::detune::DetuneMode;
use crate::display::DisplayTable;
use crate::guided::{DefaultScale, GuidedQuantizer};
use crate::param::{ParamDef, ParamId, ParamValues, ValueFormat};
use crate::port::{GraphModule, LightId, PortDef, PortSpec, PortValues, SignalKind};
use crate::sequencer::{
    Direction, QuantizationMode, SequencerControls, SequencerInputs, StepSequencer,
};
use crate::state::{PersistedState, StateError};
use crate::steps::{StepSlot, MAX_MEASURES, MAX_OCTAVE, MAX_SEMITONE, MIN_OCTAVE, STEPS_PER_MEASURE};
use log::debug;

/// Parameter ids of the sequencer's controls
pub mod seq_params {
    use crate::param::ParamId;

    pub const OCTAVE: ParamId = 0;
    pub const SEMITONE: ParamId = 8;
    pub const STEP_ACTIVE: ParamId = 16;
    pub const CLOCK: ParamId = 24;
    pub const MODE: ParamId = 25;
    pub const MEASURE: ParamId = 26;
    pub const RESET: ParamId = 27;
    pub const RUN: ParamId = 28;
    pub const DETUNE_AMOUNT: ParamId = 29;
    pub const SWING: ParamId = 30;
    pub const GATE_PROBABILITY: ParamId = 31;
    pub const SLIDE: ParamId = 32;
}

/// Semitone Sequencer
///
/// Four measures of eight steps, each with an octave, a semitone and an
/// enable switch. Runs from its own clock (with swing) or an external clock,
/// plays forward, backward or at random, and can play all measures at once as
/// a chord on a polyphonic CV output.
///
/// Inputs: 0 reset, 1 clock. Outputs: 10 gate, 11 cv.
pub struct SemitoneSequencer {
    engine: StepSequencer,
    params: ParamValues,
    sample_rate: f64,
    spec: PortSpec,
}

impl SemitoneSequencer {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            engine: StepSequencer::new(),
            params: ParamValues::new(Self::param_defs()),
            sample_rate,
            spec: PortSpec {
                inputs: vec![
                    PortDef::new(0, "reset", SignalKind::Trigger),
                    PortDef::new(1, "clock", SignalKind::Clock),
                ],
                outputs: vec![
                    PortDef::new(10, "gate", SignalKind::Gate),
                    PortDef::new(11, "cv", SignalKind::VoltPerOctave),
                ],
            },
        }
    }

    fn param_defs() -> Vec<ParamDef> {
        use seq_params::*;

        let mut defs = Vec::new();
        for i in 0..STEPS_PER_MEASURE as ParamId {
            defs.push(
                ParamDef::new(OCTAVE + i, format!("Step {} octave", i + 1), MIN_OCTAVE, MAX_OCTAVE, 0.0)
                    .snapped(),
            );
        }
        for i in 0..STEPS_PER_MEASURE as ParamId {
            defs.push(
                ParamDef::new(SEMITONE + i, format!("Step {} semitone", i + 1), 0.0, MAX_SEMITONE, 0.0)
                    .snapped(),
            );
        }
        for i in 0..STEPS_PER_MEASURE as ParamId {
            defs.push(
                ParamDef::new(STEP_ACTIVE + i, format!("Step {}", i + 1), 0.0, 1.0, 1.0)
                    .snapped()
                    .with_format(ValueFormat::Table(DisplayTable::StepActive)),
            );
        }

        defs.push(ParamDef::new(CLOCK, "Clock", -2.0, 6.0, 2.0).with_format(
            ValueFormat::Exponential {
                base: 2.0,
                multiplier: 60.0,
                unit: " BPM",
            },
        ));
        defs.push(
            ParamDef::new(MODE, "Mode", 0.0, 2.0, 0.0)
                .snapped()
                .with_format(ValueFormat::Table(DisplayTable::Direction)),
        );
        defs.push(
            ParamDef::new(MEASURE, "Measure", 0.0, (MAX_MEASURES - 1) as f64, 0.0)
                .snapped()
                .with_format(ValueFormat::Offset { offset: 1.0 }),
        );
        defs.push(
            ParamDef::new(RESET, "Reset", 0.0, 1.0, 0.0)
                .with_format(ValueFormat::Table(DisplayTable::Reset)),
        );
        defs.push(
            ParamDef::new(RUN, "Run", 0.0, 1.0, 0.0).with_format(ValueFormat::Table(DisplayTable::Run)),
        );
        defs.push(
            ParamDef::new(DETUNE_AMOUNT, "Detune amount", 0.0, 1.0, 0.0).with_format(
                ValueFormat::Scaled {
                    multiplier: 100.0,
                    unit: " cents",
                },
            ),
        );
        defs.push(
            ParamDef::new(SWING, "Swing ratio", 1.0, 10.0, 1.0)
                .with_format(ValueFormat::Table(DisplayTable::Swing)),
        );
        defs.push(
            ParamDef::new(GATE_PROBABILITY, "Gate probability", 0.0, 1.0, 1.0).with_format(
                ValueFormat::Scaled {
                    multiplier: 100.0,
                    unit: "%",
                },
            ),
        );
        defs.push(
            ParamDef::new(SLIDE, "Slide rate", 0.0, 1.0, 0.0)
                .with_format(ValueFormat::Table(DisplayTable::Slide)),
        );
        defs
    }

    pub fn engine(&self) -> &StepSequencer {
        &self.engine
    }

    pub fn steps_per_measure(&self) -> usize {
        self.engine.state().steps_per_measure
    }

    pub fn num_measures(&self) -> usize {
        self.engine.state().num_measures
    }

    pub fn set_steps_per_measure(&mut self, steps: usize) {
        self.engine.set_steps_per_measure(steps);
    }

    pub fn set_num_measures(&mut self, measures: usize) {
        self.engine.set_num_measures(measures);
    }

    pub fn set_chord_mode(&mut self, chord_mode: bool) {
        self.engine.set_chord_mode(chord_mode);
    }

    pub fn set_detune_mode(&mut self, mode: DetuneMode) {
        self.engine.set_detune_mode(mode);
    }

    pub fn set_quantization_mode(&mut self, mode: QuantizationMode) {
        self.engine.set_quantization_mode(mode);
    }

    /// Formatted value of a parameter, as a panel tooltip would show it
    pub fn param_display(&self, id: ParamId) -> Option<String> {
        self.params.display(id)
    }

    fn controls(&self) -> SequencerControls {
        use seq_params::*;

        let mode = libm::round(self.params.value(MODE)) as usize;
        SequencerControls {
            tempo: self.params.value(CLOCK),
            direction: Direction::from_index(mode).unwrap_or_default(),
            measure_select: self.params.value(MEASURE) as usize,
            reset_button: self.params.value(RESET),
            run_button: self.params.value(RUN),
            detune_amount: self.params.value(DETUNE_AMOUNT),
            swing: self.params.value(SWING),
            gate_probability: self.params.value(GATE_PROBABILITY),
            slide: self.params.value(SLIDE),
        }
    }

    /// Live step controls into the engine
    fn push_live_steps(&mut self) {
        use seq_params::*;

        for i in 0..STEPS_PER_MEASURE {
            let id = i as ParamId;
            let slot = StepSlot::new(
                self.params.value(OCTAVE + id),
                self.params.value(SEMITONE + id),
                self.params.value(STEP_ACTIVE + id) >= 0.5,
            );
            self.engine.bank_mut().set_live(i, slot);
        }
    }

    /// Engine's live steps and measure selector back onto the controls
    fn pull_live_steps(&mut self) {
        use seq_params::*;

        let live = *self.engine.bank().live();
        for (i, slot) in live.iter().enumerate() {
            let id = i as ParamId;
            self.params.set(OCTAVE + id, slot.octave);
            self.params.set(SEMITONE + id, slot.semitone);
            self.params.set(STEP_ACTIVE + id, if slot.active { 1.0 } else { 0.0 });
        }
        self.params
            .set(MEASURE, self.engine.state().measure_select as f64);
    }
}

impl Default for SemitoneSequencer {
    fn default() -> Self {
        Self::new(44100.0)
    }
}

impl GraphModule for SemitoneSequencer {
    fn port_spec(&self) -> &PortSpec {
        &self.spec
    }

    fn tick(&mut self, inputs: &PortValues, outputs: &mut PortValues) {
        self.push_live_steps();
        let controls = self.controls();
        let jacks = SequencerInputs {
            reset: inputs.get(0),
            clock: inputs.get(1),
        };

        let out = self.engine.process(&controls, &jacks, self.sample_rate);
        self.pull_live_steps();

        outputs.set(10, out.gate);
        outputs.set_poly(11, out.cv);
    }

    fn reset(&mut self) {
        self.params.reset_to_defaults();
        self.engine.initialize();
        self.pull_live_steps();
    }

    fn randomize(&mut self) {
        self.engine.randomize();
        self.pull_live_steps();
    }

    fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
    }

    fn params(&self) -> &[ParamDef] {
        self.params.defs()
    }

    fn get_param(&self, id: ParamId) -> Option<f64> {
        self.params.get(id)
    }

    fn set_param(&mut self, id: ParamId, value: f64) {
        self.params.set(id, value);
    }

    fn light(&self, id: LightId) -> Option<f64> {
        self.engine.light(id)
    }

    fn type_id(&self) -> &'static str {
        "semitone_sequencer"
    }

    fn serialize_state(&self) -> Option<serde_json::Value> {
        self.engine.persisted().to_value().ok()
    }

    fn deserialize_state(&mut self, state: &serde_json::Value) -> Result<(), StateError> {
        let saved = PersistedState::from_value(state)?;
        self.engine.restore(&saved);
        self.pull_live_steps();
        Ok(())
    }
}

/// Parameter ids of the guided quantizer
pub mod guide_params {
    use crate::param::ParamId;

    pub const ROOT: ParamId = 0;
    pub const SCALE: ParamId = 1;
    pub const RANGE: ParamId = 2;
}

/// Guide Quant
///
/// Quantizes its input to the nearest note found on the channels of the
/// polyphonic guide input. With no guide patched, it falls back to a fixed
/// scale transposed to the chosen root. The range control attenuates the
/// input before quantization.
///
/// Inputs: 0 guide, 1 in. Output: 10 out.
pub struct GuideQuant {
    quantizer: GuidedQuantizer,
    params: ParamValues,
    spec: PortSpec,
}

impl GuideQuant {
    pub fn new() -> Self {
        use guide_params::*;

        Self {
            quantizer: GuidedQuantizer::new(),
            params: ParamValues::new(vec![
                ParamDef::new(ROOT, "Default root note", 0.0, 11.0, 0.0).snapped(),
                ParamDef::new(SCALE, "Default scale", 0.0, (DefaultScale::ALL.len() - 1) as f64, 0.0)
                    .snapped(),
                ParamDef::new(RANGE, "Range", 0.0, 1.0, 1.0).with_format(ValueFormat::Scaled {
                    multiplier: 100.0,
                    unit: "%",
                }),
            ]),
            spec: PortSpec {
                inputs: vec![
                    PortDef::new(0, "guide", SignalKind::VoltPerOctave),
                    PortDef::new(1, "in", SignalKind::VoltPerOctave),
                ],
                outputs: vec![PortDef::new(10, "out", SignalKind::VoltPerOctave)],
            },
        }
    }

    pub fn allowed_notes(&self) -> &[f64] {
        self.quantizer.allowed_notes()
    }
}

impl Default for GuideQuant {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphModule for GuideQuant {
    fn port_spec(&self) -> &PortSpec {
        &self.spec
    }

    fn tick(&mut self, inputs: &PortValues, outputs: &mut PortValues) {
        use guide_params::*;

        let Some(input) = inputs.get(1) else {
            return;
        };
        let pitch = input * self.params.value(RANGE);

        match inputs.get_poly(0) {
            Some(guide) => self.quantizer.set_allowed_notes(guide.as_slice()),
            None => {
                let scale = DefaultScale::from_index(self.params.value(SCALE) as usize)
                    .unwrap_or_default();
                let root = self.params.value(ROOT) as u8;
                self.quantizer.set_allowed_notes_default(scale, root);
            }
        }

        let out = self.quantizer.quantize(pitch).unwrap_or(pitch);
        outputs.set(10, out);
    }

    fn reset(&mut self) {
        self.params.reset_to_defaults();
        self.quantizer = GuidedQuantizer::new();
        debug!("guide quant initialized");
    }

    fn set_sample_rate(&mut self, _: f64) {}

    fn params(&self) -> &[ParamDef] {
        self.params.defs()
    }

    fn get_param(&self, id: ParamId) -> Option<f64> {
        self.params.get(id)
    }

    fn set_param(&mut self, id: ParamId, value: f64) {
        self.params.set(id, value);
    }

    fn type_id(&self) -> &'static str {
        "guide_quant"
    }
}
