//! Step Sequencer Engine
//!
//! The per-sample state machine behind the sequencer module. It owns all
//! playback state explicitly in [`SequencerState`] and the step data in a
//! [`StepBank`], and is driven through a single [`StepSequencer::process`]
//! call per sample that takes a snapshot of the panel controls and the two
//! trigger inputs.
//!
//! # Tick order
//!
//! 1. Derive the measure from the step index and mirror it onto the measure
//!    selector while running.
//! 2. Commit the live step controls into the measure being edited, unless the
//!    selector has just moved.
//! 3. Toggle running on a run button press.
//! 4. Load the playing (or selected) measure into the live controls.
//! 5. Advance on a clock edge or when the internal phase passes 1.
//! 6. Gate, then CV for each voice.
//! 7. Reset, lights.

use crate::detune::{DetuneInputs, DetuneMode, DetuneModulator};
use crate::dsp::{BooleanTrigger, Light, PulseGenerator, SchmittTrigger};
use crate::port::{LightId, PolyVoltage};
use crate::rng;
use crate::scale::{NearestNoteQuantizer, VoltageScale};
use crate::slew::SlewLimiter;
use crate::state::PersistedState;
use crate::steps::{StepBank, StepSlot, MAX_MEASURES, SHADOW_SLOTS, STEPS_PER_MEASURE};
use log::{debug, trace};
use serde::{Deserialize, Serialize};

/// Ticks the measure selector must hold still before edits are committed
pub const MEASURE_CHANGE_TICKS: u32 = 10;

/// Gate output level when high
pub const GATE_HIGH: f64 = 10.0;

/// Brightness of a step or measure that is in play but not current
pub const DIM: f64 = 0.25;

/// Light layout: current/active pairs for the 8 steps, current/active pairs
/// for the 4 measures, the 8 step-enabled lights, then reset, gate, running.
pub const STEP_LIGHTS: LightId = 0;
pub const MEASURE_LIGHTS: LightId = 16;
pub const STEP_ACTIVE_LIGHTS: LightId = 24;
pub const RESET_LIGHT: LightId = 32;
pub const GATE_LIGHT: LightId = 33;
pub const RUNNING_LIGHT: LightId = 34;
pub const NUM_LIGHTS: usize = 35;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
    Random,
}

impl Direction {
    pub const ALL: [Direction; 3] = [Direction::Forward, Direction::Reverse, Direction::Random];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Direction::Forward => "Forward",
            Direction::Reverse => "Reverse",
            Direction::Random => "Random",
        }
    }
}

/// Scale the step pitches are snapped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QuantizationMode {
    #[default]
    Off,
    Minor,
    Major,
}

impl QuantizationMode {
    pub const ALL: [QuantizationMode; 3] = [
        QuantizationMode::Off,
        QuantizationMode::Minor,
        QuantizationMode::Major,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(&self) -> usize {
        match self {
            QuantizationMode::Off => 0,
            QuantizationMode::Minor => 1,
            QuantizationMode::Major => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            QuantizationMode::Off => "Off",
            QuantizationMode::Minor => "Minor",
            QuantizationMode::Major => "Major",
        }
    }

    pub fn scale(&self) -> Option<VoltageScale> {
        match self {
            QuantizationMode::Off => None,
            QuantizationMode::Minor => Some(VoltageScale::Minor),
            QuantizationMode::Major => Some(VoltageScale::Major),
        }
    }
}

/// Panel control values read once per tick
#[derive(Debug, Clone, Copy)]
pub struct SequencerControls {
    /// Tempo exponent; the internal clock runs at 2^tempo steps per second
    pub tempo: f64,
    pub direction: Direction,
    /// Measure selector position, 0-based
    pub measure_select: usize,
    pub reset_button: f64,
    pub run_button: f64,
    pub detune_amount: f64,
    pub swing: f64,
    pub gate_probability: f64,
    pub slide: f64,
}

impl Default for SequencerControls {
    fn default() -> Self {
        Self {
            tempo: 2.0,
            direction: Direction::Forward,
            measure_select: 0,
            reset_button: 0.0,
            run_button: 0.0,
            detune_amount: 0.0,
            swing: 1.0,
            gate_probability: 1.0,
            slide: 0.0,
        }
    }
}

/// Trigger inputs; `None` means the cable is not connected
#[derive(Debug, Clone, Copy, Default)]
pub struct SequencerInputs {
    pub reset: Option<f64>,
    pub clock: Option<f64>,
}

/// Result of one tick
#[derive(Debug, Clone, Copy)]
pub struct SequencerOutput {
    pub gate: f64,
    pub cv: PolyVoltage,
}

/// Playback position and menu settings
#[derive(Debug, Clone, PartialEq)]
pub struct SequencerState {
    pub running: bool,
    /// Step index across all measures, `0..steps_per_measure * num_measures`
    pub step: usize,
    pub measure: usize,
    /// Fraction of the current step elapsed on the internal clock
    pub phase: f64,
    pub steps_per_measure: usize,
    pub num_measures: usize,
    pub direction: Direction,
    /// Play every measure at once, one voice per measure
    pub chord_mode: bool,
    pub detune_mode: DetuneMode,
    pub quantization_mode: QuantizationMode,
    /// Measure shown on the live step controls
    pub measure_select: usize,
    pub last_measure_select: usize,
}

impl Default for SequencerState {
    fn default() -> Self {
        Self {
            running: false,
            step: 0,
            measure: 0,
            phase: 0.0,
            steps_per_measure: STEPS_PER_MEASURE,
            num_measures: MAX_MEASURES,
            direction: Direction::Forward,
            chord_mode: false,
            detune_mode: DetuneMode::RandomGate,
            quantization_mode: QuantizationMode::Off,
            measure_select: 0,
            last_measure_select: 0,
        }
    }
}

impl SequencerState {
    /// Steps in play across all measures
    pub fn total_steps(&self) -> usize {
        self.steps_per_measure * self.num_measures
    }

    /// Measure a step index falls in
    pub fn measure_of(&self, step: usize) -> usize {
        (step / self.steps_per_measure.max(1)).min(MAX_MEASURES - 1)
    }

    /// Shadow slot a step index plays from
    pub fn slot_of(&self, step: usize) -> usize {
        self.measure_of(step) * STEPS_PER_MEASURE + step % self.steps_per_measure.max(1)
    }
}

/// Four-measure, eight-step pitch sequencer with swing, detune, glide and
/// gate probability
#[derive(Debug, Clone)]
pub struct StepSequencer {
    state: SequencerState,
    bank: StepBank,

    clock_trigger: SchmittTrigger,
    reset_trigger: SchmittTrigger,
    reset_button_trigger: SchmittTrigger,
    run_trigger: SchmittTrigger,
    swing_trigger: BooleanTrigger,
    measure_change: PulseGenerator,

    detune: [DetuneModulator; MAX_MEASURES],
    slew: [SlewLimiter; MAX_MEASURES],
    quantizer: NearestNoteQuantizer,

    clock_gate: bool,
    gate_draw: f64,
    rand_current: f64,
    rand_last: f64,
    cv: PolyVoltage,

    lights_measure: usize,
    lights: [Light; NUM_LIGHTS],
}

impl StepSequencer {
    pub fn new() -> Self {
        let mut cv = PolyVoltage::default();
        cv.set_channels(1);
        Self {
            state: SequencerState::default(),
            bank: StepBank::new(),
            clock_trigger: SchmittTrigger::default(),
            reset_trigger: SchmittTrigger::default(),
            reset_button_trigger: SchmittTrigger::default(),
            run_trigger: SchmittTrigger::default(),
            swing_trigger: BooleanTrigger::default(),
            measure_change: PulseGenerator::default(),
            detune: [DetuneModulator::new(); MAX_MEASURES],
            slew: [SlewLimiter::new(); MAX_MEASURES],
            quantizer: NearestNoteQuantizer::default(),
            clock_gate: false,
            gate_draw: 0.0,
            rand_current: 0.0,
            rand_last: 0.0,
            cv,
            lights_measure: 0,
            lights: [Light::default(); NUM_LIGHTS],
        }
    }

    pub fn state(&self) -> &SequencerState {
        &self.state
    }

    pub fn bank(&self) -> &StepBank {
        &self.bank
    }

    pub fn bank_mut(&mut self) -> &mut StepBank {
        &mut self.bank
    }

    pub fn light(&self, id: LightId) -> Option<f64> {
        self.lights.get(id as usize).map(|l| l.brightness())
    }

    pub fn set_running(&mut self, running: bool) {
        self.state.running = running;
    }

    pub fn set_steps_per_measure(&mut self, steps: usize) {
        self.state.steps_per_measure = steps.clamp(1, STEPS_PER_MEASURE);
        self.wrap_step();
    }

    pub fn set_num_measures(&mut self, measures: usize) {
        self.state.num_measures = measures.clamp(1, MAX_MEASURES);
        self.wrap_step();
    }

    pub fn set_chord_mode(&mut self, chord_mode: bool) {
        self.state.chord_mode = chord_mode;
    }

    pub fn set_detune_mode(&mut self, mode: DetuneMode) {
        self.state.detune_mode = mode;
    }

    pub fn set_quantization_mode(&mut self, mode: QuantizationMode) {
        self.state.quantization_mode = mode;
    }

    /// Jump to a step, wrapping to 0 if it lies outside the active steps
    pub fn set_step(&mut self, step: usize) {
        self.state.step = step;
        self.wrap_step();
        self.state.measure = self.state.measure_of(self.state.step);
    }

    fn wrap_step(&mut self) {
        if self.state.step >= self.state.total_steps() {
            self.state.step = 0;
            self.state.measure = 0;
        }
    }

    /// Back to power-on settings: stopped, 8 steps, 4 measures, no chord,
    /// random-gate detune, no quantization, and every step zeroed and enabled
    pub fn initialize(&mut self) {
        self.state = SequencerState::default();
        self.bank = StepBank::new();
        for detune in self.detune.iter_mut() {
            detune.reset();
        }
        for slew in self.slew.iter_mut() {
            slew.reset();
        }
        debug!("sequencer initialized");
    }

    /// Random measure layout and step pitches; the selector and playback
    /// position go back to the start
    pub fn randomize(&mut self) {
        self.state.steps_per_measure = rng::below(STEPS_PER_MEASURE) + 1;
        self.state.num_measures = rng::below(MAX_MEASURES) + 1;
        self.bank.randomize_pitches();
        self.bank.load(0);
        self.state.measure_select = 0;
        self.state.last_measure_select = 0;
        self.state.step = 0;
        self.state.measure = 0;
        self.state.quantization_mode = QuantizationMode::Off;
        debug!(
            "sequencer randomized: {} steps x {} measures",
            self.state.steps_per_measure, self.state.num_measures
        );
    }

    /// Move to the next step in `direction`.
    ///
    /// Forward and reverse skip inactive steps, wrapping around the active
    /// window at most once; if nothing in the window is active the step stays
    /// put. Random ignores the enable flags. The phase restarts either way,
    /// and the per-step random draws are refreshed.
    pub fn advance(&mut self, direction: Direction) {
        let total = self.state.total_steps();
        match direction {
            Direction::Random => {
                self.state.step = if total > 1 { rng::below(total - 1) } else { 0 };
            }
            Direction::Forward | Direction::Reverse => {
                let current = self.state.step % total.max(1);
                let next = (1..=total).find_map(|offset| {
                    let candidate = match direction {
                        Direction::Reverse => (current + total - offset) % total,
                        _ => (current + offset) % total,
                    };
                    self.bank
                        .is_active(self.state.slot_of(candidate))
                        .then_some(candidate)
                });
                match next {
                    Some(step) => self.state.step = step,
                    None => trace!("no active steps in {} step window", total),
                }
            }
        }
        self.state.measure = self.state.measure_of(self.state.step);
        self.state.phase = 0.0;

        self.gate_draw = rng::uniform();
        self.rand_last = self.rand_current;
        self.rand_current = rng::uniform();
    }

    /// Jump to the start of the sequence for `direction`, or to its last step
    /// when reversing
    pub fn reset_position(&mut self, direction: Direction) {
        self.state.phase = 0.0;
        match direction {
            Direction::Forward | Direction::Random => {
                self.state.step = 0;
                self.state.measure = 0;
                self.state.measure_select = 0;
            }
            Direction::Reverse => {
                self.state.step = self.state.total_steps().saturating_sub(1);
                self.state.measure = self.state.num_measures - 1;
                self.state.measure_select = self.state.num_measures - 1;
            }
        }
    }

    /// Process one sample
    pub fn process(
        &mut self,
        controls: &SequencerControls,
        inputs: &SequencerInputs,
        sample_rate: f64,
    ) -> SequencerOutput {
        let sample_time = 1.0 / sample_rate;
        self.state.direction = controls.direction;
        self.state.measure = self.state.measure_of(self.state.step);

        self.state.measure_select = if self.state.running {
            self.state.measure
        } else {
            controls.measure_select.min(MAX_MEASURES - 1)
        };

        // Edits are committed only once the selector has settled, and only
        // into the measure the live controls were loaded from
        if self.state.measure_select != self.state.last_measure_select {
            self.measure_change.trigger(MEASURE_CHANGE_TICKS);
        }
        let measure_changing = self.measure_change.process();
        let editing = if self.state.running {
            self.state.measure
        } else {
            self.state.measure_select
        };
        if !measure_changing
            && self.state.measure_select == self.state.last_measure_select
            && editing == self.bank.loaded()
        {
            self.bank.commit(editing);
        }

        if self.run_trigger.process(controls.run_button) {
            self.state.running = !self.state.running;
            debug!("sequencer {}", if self.state.running { "started" } else { "stopped" });
        }

        let showing = if self.state.running {
            self.state.measure
        } else {
            self.state.measure_select
        };
        self.bank.load(showing);

        let clock_edge = match inputs.clock {
            Some(voltage) => {
                let edge = self.clock_trigger.process(voltage);
                self.clock_gate = self.clock_trigger.is_high();
                edge
            }
            None => false,
        };

        let mut gate = false;
        if self.state.running {
            if inputs.clock.is_some() {
                if clock_edge {
                    self.advance(controls.direction);
                }
                gate = self.clock_gate;
            } else {
                if controls.swing > 1.0 {
                    self.swing_trigger.process(self.state.step % 2 == 0);
                }
                let multiplier = if self.swing_trigger.state() {
                    controls.swing
                } else {
                    1.0
                };
                let rate = libm::pow(2.0, controls.tempo * multiplier) / controls.swing.max(1.0);
                self.state.phase += rate * sample_time;
                if self.state.phase >= 1.0 {
                    self.advance(controls.direction);
                }
                gate = self.state.phase < 0.5;
            }
        }

        // A probability of zero turns the filter off rather than muting
        let gate_out = if controls.gate_probability > 0.0 {
            gate && self.gate_draw < controls.gate_probability
        } else {
            gate
        };

        if self.state.running {
            self.render_cv(controls, gate, sample_rate);
        }

        let reset_input = inputs
            .reset
            .map(|v| self.reset_trigger.process(v))
            .unwrap_or(false);
        let reset_button = self.reset_button_trigger.process(controls.reset_button);
        if reset_input || reset_button {
            self.reset_position(controls.direction);
        }

        self.lights_measure = if self.state.running || self.reset_button_trigger.is_high() {
            self.state.measure
        } else if measure_changing {
            self.state.measure_select
        } else {
            self.lights_measure
        };
        self.update_lights(gate_out, sample_time);

        self.state.last_measure_select = self.state.measure_select;

        SequencerOutput {
            gate: if gate_out { GATE_HIGH } else { 0.0 },
            cv: self.cv,
        }
    }

    fn render_cv(&mut self, controls: &SequencerControls, gate: bool, sample_rate: f64) {
        let voices = if self.state.chord_mode {
            self.state.num_measures
        } else {
            1
        };
        if let Some(scale) = self.state.quantization_mode.scale() {
            self.quantizer.set_allowed_notes(scale);
        }

        let detune_inputs = DetuneInputs {
            gate,
            pitch: controls.tempo,
            attenuation: controls.swing,
            sample_time: 1.0 / sample_rate,
            current: self.rand_current,
            last: self.rand_last,
            phase: self.state.phase,
        };
        let step_in_measure = self.state.step % self.state.steps_per_measure.max(1);

        for voice in 0..voices {
            let detune = if controls.detune_amount > 0.0 {
                self.detune[voice].process(self.state.detune_mode, &detune_inputs)
                    * controls.detune_amount
            } else {
                0.0
            };

            let slot = if self.state.chord_mode {
                step_in_measure + voice * STEPS_PER_MEASURE
            } else {
                self.state.slot_of(self.state.step)
            };
            let raw = self.bank.slot(slot).pitch();
            let pitch = match self.state.quantization_mode {
                QuantizationMode::Off => raw,
                _ => self.quantizer.quantize(raw),
            } + detune / 12.0;

            self.slew[voice].set_rise_and_fall_time(controls.slide);
            let out = self.slew[voice].process(pitch, sample_rate);
            self.cv.set_voltage(voice, out);
        }
        self.cv.set_channels(voices);
    }

    fn update_lights(&mut self, gate: bool, sample_time: f64) {
        let spm = self.state.steps_per_measure.max(1);
        let current_step = self.state.step % spm;
        let previewing = !self.state.running && self.state.measure != self.state.measure_select;

        for i in 0..STEPS_PER_MEASURE {
            let mut current = if i == current_step { 1.0 } else { 0.0 };
            let active = if (i != current_step && i < spm) || previewing {
                current = 0.0;
                DIM
            } else {
                0.0
            };
            let enabled = if self.bank.is_active(i + self.lights_measure * STEPS_PER_MEASURE) {
                1.0
            } else {
                0.0
            };

            let base = STEP_LIGHTS as usize + 2 * i;
            self.lights[base].set_smooth_brightness(current, sample_time);
            self.lights[base + 1].set_smooth_brightness(active, sample_time);
            self.lights[STEP_ACTIVE_LIGHTS as usize + i].set_smooth_brightness(enabled, sample_time);
        }

        for i in 0..MAX_MEASURES {
            let (current, active) = if i == self.lights_measure {
                (1.0, 0.0)
            } else if i < self.state.num_measures {
                (0.0, DIM)
            } else {
                (0.0, 0.0)
            };
            let base = MEASURE_LIGHTS as usize + 2 * i;
            self.lights[base].set_smooth_brightness(current, sample_time);
            self.lights[base + 1].set_smooth_brightness(active, sample_time);
        }

        let reset = if self.reset_button_trigger.is_high() { 1.0 } else { 0.0 };
        let gate = if gate { 1.0 } else { 0.0 };
        let running = if self.state.running { 1.0 } else { 0.0 };
        self.lights[RESET_LIGHT as usize].set_smooth_brightness(reset, sample_time);
        self.lights[GATE_LIGHT as usize].set_smooth_brightness(gate, sample_time);
        self.lights[RUNNING_LIGHT as usize].set_smooth_brightness(running, sample_time);
    }

    /// Settings and step data to save
    pub fn persisted(&self) -> PersistedState {
        PersistedState {
            running: Some(self.state.running),
            current_step_number: Some(self.state.step as i64),
            steps_per_measure: Some(self.state.steps_per_measure as i64),
            number_of_measures: Some(self.state.num_measures as i64),
            chord_mode: Some(self.state.chord_mode as i64),
            detune_mode: Some(self.state.detune_mode.index() as i64),
            quantization_mode: Some(self.state.quantization_mode.index() as i64),
            steps: Some(self.bank.shadow().to_vec()),
        }
    }

    /// Apply saved settings; absent or out-of-range values leave the current
    /// setting alone
    pub fn restore(&mut self, saved: &PersistedState) {
        if let Some(running) = saved.running {
            self.state.running = running;
        }
        if let Some(steps) = saved.steps_per_measure.and_then(in_range(1, STEPS_PER_MEASURE)) {
            self.state.steps_per_measure = steps;
        }
        if let Some(measures) = saved.number_of_measures.and_then(in_range(1, MAX_MEASURES)) {
            self.state.num_measures = measures;
        }
        if let Some(chord_mode) = saved.chord_mode {
            self.state.chord_mode = chord_mode != 0;
        }
        if let Some(mode) = saved
            .detune_mode
            .and_then(in_range(0, DetuneMode::ALL.len() - 1))
            .and_then(DetuneMode::from_index)
        {
            self.state.detune_mode = mode;
        }
        if let Some(mode) = saved
            .quantization_mode
            .and_then(in_range(0, QuantizationMode::ALL.len() - 1))
            .and_then(QuantizationMode::from_index)
        {
            self.state.quantization_mode = mode;
        }
        if let Some(step) = saved.current_step_number.and_then(in_range(0, SHADOW_SLOTS - 1)) {
            self.state.step = step;
        }
        if let Some(slots) = &saved.steps {
            for (index, slot) in slots.iter().take(SHADOW_SLOTS).enumerate() {
                self.bank.set_slot(index, *slot);
            }
        }
        self.wrap_step();
        self.state.measure = self.state.measure_of(self.state.step);
        debug!("sequencer state restored: {:?}", self.state);
    }

    /// Write a step straight into its shadow slot
    pub fn set_slot(&mut self, index: usize, slot: StepSlot) {
        self.bank.set_slot(index, slot);
    }
}

impl Default for StepSequencer {
    fn default() -> Self {
        Self::new()
    }
}

fn in_range(min: usize, max: usize) -> impl Fn(i64) -> Option<usize> {
    move |value| {
        usize::try_from(value)
            .ok()
            .filter(|v| (min..=max).contains(v))
    }
}
