//! Detune Modulation
//!
//! Each output voice owns a [`DetuneModulator`]. The sequencer picks one of
//! three shapes for all voices at once and scales the result by its detune
//! amount before adding it, in semitones, to the pitch.

use crate::rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Detune shape shared by all voices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DetuneMode {
    /// Fresh random value every sample while the gate is high, 0 otherwise
    #[default]
    RandomGate,
    /// Sine LFO whose rate follows the clock tempo
    Lfo,
    /// Cosine glide between the random values drawn at the last two steps
    RandomLfo,
}

impl DetuneMode {
    pub const ALL: [DetuneMode; 3] = [DetuneMode::RandomGate, DetuneMode::Lfo, DetuneMode::RandomLfo];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(&self) -> usize {
        match self {
            DetuneMode::RandomGate => 0,
            DetuneMode::Lfo => 1,
            DetuneMode::RandomLfo => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DetuneMode::RandomGate => "Random gate",
            DetuneMode::Lfo => "LFO",
            DetuneMode::RandomLfo => "Random LFO",
        }
    }
}

/// Inputs the detune shapes read, gathered once per tick by the sequencer
#[derive(Debug, Clone, Copy, Default)]
pub struct DetuneInputs {
    pub gate: bool,
    /// Tempo exponent; sets the sine LFO rate
    pub pitch: f64,
    /// Multiplies `pitch` before exponentiation
    pub attenuation: f64,
    pub sample_time: f64,
    /// Random value drawn at the latest step advance
    pub current: f64,
    /// Random value drawn at the advance before that
    pub last: f64,
    /// Clock phase within the current step
    pub phase: f64,
}

/// Per-voice detune source; only the sine LFO keeps state
#[derive(Debug, Clone, Copy, Default)]
pub struct DetuneModulator {
    phase: f64,
}

impl DetuneModulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bipolar random value while `gate` is high, exactly 0 while it is low
    pub fn random_gate(&self, gate: bool) -> f64 {
        if gate {
            rng::uniform_bipolar()
        } else {
            0.0
        }
    }

    /// Sine LFO at `0.5 * 2^(pitch * attenuation)` Hz.
    ///
    /// The phase is kept in [-0.5, 0.5).
    pub fn sine_lfo(&mut self, pitch: f64, sample_time: f64, attenuation: f64) -> f64 {
        let freq = 0.5 * libm::pow(2.0, pitch * attenuation);
        self.phase += freq * sample_time;
        if self.phase >= 0.5 {
            self.phase -= 1.0;
        }
        libm::sin(2.0 * PI * self.phase)
    }

    /// Cosine interpolation from `last` (phase 0) to `current` (phase 1),
    /// remapped from unipolar to bipolar.
    pub fn random_smooth(current: f64, last: f64, phase: f64) -> f64 {
        let weight = libm::cos(PI * phase.min(1.0));
        // Rescale [1, -1] onto [last, current]
        let value = last + (weight - 1.0) * (current - last) / -2.0;
        value * 2.0 - 1.0
    }

    pub fn process(&mut self, mode: DetuneMode, inputs: &DetuneInputs) -> f64 {
        match mode {
            DetuneMode::RandomGate => self.random_gate(inputs.gate),
            DetuneMode::Lfo => self.sine_lfo(inputs.pitch, inputs.sample_time, inputs.attenuation),
            DetuneMode::RandomLfo => Self::random_smooth(inputs.current, inputs.last, inputs.phase),
        }
    }

    pub fn lfo_phase(&self) -> f64 {
        self.phase
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_random_gate_low_is_exactly_zero() {
        rng::seed(1);
        let detune = DetuneModulator::new();
        for _ in 0..1000 {
            assert_eq!(detune.random_gate(false), 0.0);
        }
    }

    #[test]
    fn test_random_gate_high_is_bipolar() {
        rng::seed(2);
        let detune = DetuneModulator::new();
        let values: Vec<f64> = (0..1000).map(|_| detune.random_gate(true)).collect();
        assert!(values.iter().all(|v| (-1.0..1.0).contains(v)));
        assert!(values.iter().any(|&v| v < 0.0));
        assert!(values.iter().any(|&v| v > 0.0));
    }

    #[test]
    fn test_sine_lfo_phase_wraps_and_output_bounded() {
        let mut detune = DetuneModulator::new();
        for _ in 0..100_000 {
            let v = detune.sine_lfo(6.0, 1.0 / 44100.0, 1.0);
            assert!((-1.0..=1.0).contains(&v));
            assert!((-0.5..0.5).contains(&detune.lfo_phase()));
        }
    }

    #[test]
    fn test_sine_lfo_frequency() {
        // Pitch 0 runs at 0.5 Hz, so 250 ms moves the phase by 0.125
        let mut detune = DetuneModulator::new();
        let mut v = 0.0;
        for _ in 0..250 {
            v = detune.sine_lfo(0.0, 0.001, 1.0);
        }
        assert_abs_diff_eq!(detune.lfo_phase(), 0.125, epsilon = 1e-9);
        assert_abs_diff_eq!(v, libm::sin(PI / 4.0), epsilon = 1e-9);
    }

    #[test]
    fn test_random_smooth_endpoints() {
        // Phase 0 sits on the last value, phase 1 on the current one
        assert_abs_diff_eq!(DetuneModulator::random_smooth(0.8, 0.2, 0.0), 0.2 * 2.0 - 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(DetuneModulator::random_smooth(0.8, 0.2, 1.0), 0.8 * 2.0 - 1.0, epsilon = 1e-12);
        // Past the end of the step it holds the current value
        assert_abs_diff_eq!(DetuneModulator::random_smooth(0.8, 0.2, 1.7), 0.8 * 2.0 - 1.0, epsilon = 1e-12);
        // Halfway is the midpoint
        assert_abs_diff_eq!(DetuneModulator::random_smooth(0.8, 0.2, 0.5), 0.5 * 2.0 - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mode_indices_round_trip() {
        for mode in DetuneMode::ALL {
            assert_eq!(DetuneMode::from_index(mode.index()), Some(mode));
        }
        assert_eq!(DetuneMode::from_index(3), None);
    }

    #[test]
    fn test_process_dispatches_on_mode() {
        let mut detune = DetuneModulator::new();
        let inputs = DetuneInputs {
            gate: false,
            current: 1.0,
            last: 1.0,
            phase: 0.3,
            ..Default::default()
        };
        assert_eq!(detune.process(DetuneMode::RandomGate, &inputs), 0.0);
        assert_abs_diff_eq!(detune.process(DetuneMode::RandomLfo, &inputs), 1.0, epsilon = 1e-12);
    }
}
