//! Edge Detection, Pulses and Indicator Smoothing
//!
//! Small per-sample helpers shared by the modules. All of them must be
//! evaluated every tick so single-sample pulses are never missed.

/// Exponential approach rate for indicator lights, per second
pub const LIGHT_LAMBDA: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchmittState {
    #[default]
    Uninitialized,
    Low,
    High,
}

/// Schmitt trigger with hysteresis
///
/// Goes high at or above the high threshold and low at or below the low
/// threshold. The first sample only initializes the state, so a cable that is
/// already high when first seen does not fire.
#[derive(Debug, Clone, Copy)]
pub struct SchmittTrigger {
    state: SchmittState,
    low_threshold: f64,
    high_threshold: f64,
}

impl SchmittTrigger {
    pub fn new(low_threshold: f64, high_threshold: f64) -> Self {
        Self {
            state: SchmittState::Uninitialized,
            low_threshold,
            high_threshold,
        }
    }

    /// Returns true on the low→high transition
    pub fn process(&mut self, input: f64) -> bool {
        match self.state {
            SchmittState::Uninitialized => {
                self.state = if input >= self.high_threshold {
                    SchmittState::High
                } else {
                    SchmittState::Low
                };
            }
            SchmittState::High => {
                if input <= self.low_threshold {
                    self.state = SchmittState::Low;
                }
            }
            SchmittState::Low => {
                if input >= self.high_threshold {
                    self.state = SchmittState::High;
                    return true;
                }
            }
        }
        false
    }

    pub fn is_high(&self) -> bool {
        self.state == SchmittState::High
    }

    pub fn reset(&mut self) {
        self.state = SchmittState::Uninitialized;
    }
}

impl Default for SchmittTrigger {
    fn default() -> Self {
        Self::new(0.0, 1.0)
    }
}

/// Rising-edge detector for boolean signals that remembers the last input
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanTrigger {
    state: bool,
}

impl BooleanTrigger {
    pub fn process(&mut self, input: bool) -> bool {
        let rising = input && !self.state;
        self.state = input;
        rising
    }

    pub fn state(&self) -> bool {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = false;
    }
}

/// A pulse that stays high for a fixed number of ticks
#[derive(Debug, Clone, Copy, Default)]
pub struct PulseGenerator {
    remaining: u32,
}

impl PulseGenerator {
    /// Start (or restart) the pulse
    pub fn trigger(&mut self, ticks: u32) {
        self.remaining = self.remaining.max(ticks);
    }

    /// Advance one tick; returns whether the pulse was high for this tick
    pub fn process(&mut self) -> bool {
        if self.remaining > 0 {
            self.remaining -= 1;
            true
        } else {
            false
        }
    }

    pub fn is_high(&self) -> bool {
        self.remaining > 0
    }

    pub fn reset(&mut self) {
        self.remaining = 0;
    }
}

/// Indicator brightness that glides toward its target instead of jumping
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Light {
    brightness: f64,
}

impl Light {
    pub fn brightness(&self) -> f64 {
        self.brightness
    }

    /// Move toward `target` with time constant 1/[`LIGHT_LAMBDA`]
    pub fn set_smooth_brightness(&mut self, target: f64, sample_time: f64) {
        let step = (LIGHT_LAMBDA * sample_time).min(1.0);
        self.brightness += (target - self.brightness) * step;
    }

    pub fn set_brightness(&mut self, brightness: f64) {
        self.brightness = brightness;
    }
}
