//! Display Labels
//!
//! Plain lookups from parameter values and menu settings to the strings a
//! panel or menu shows. Nothing here mutates a module, and the read-outs
//! accept a missing module so a UI built before its module exists still has
//! something to draw.

use crate::detune::DetuneMode;
use crate::modules::SemitoneSequencer;
use crate::sequencer::{Direction, QuantizationMode};

/// Which label set a parameter renders through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayTable {
    Direction,
    Run,
    Reset,
    Slide,
    Swing,
    StepActive,
}

impl DisplayTable {
    pub fn label(&self, value: f64) -> String {
        match self {
            DisplayTable::Direction => {
                let index = libm::round(value);
                if index < 0.0 {
                    return String::new();
                }
                Direction::from_index(index as usize)
                    .map(|d| d.name().to_string())
                    .unwrap_or_default()
            }
            DisplayTable::Run => {
                if value >= 1.0 {
                    "Running".to_string()
                } else {
                    "Stopped".to_string()
                }
            }
            DisplayTable::Reset => {
                if value > 0.0 {
                    "Reset".to_string()
                } else {
                    String::new()
                }
            }
            // Zero slide time bypasses the slew limiter entirely
            DisplayTable::Slide => {
                if value == 0.0 {
                    "OFF".to_string()
                } else {
                    format!("{:.2}", value)
                }
            }
            DisplayTable::Swing => format!("{:.2} : 1", value),
            DisplayTable::StepActive => {
                if value >= 0.5 {
                    "On".to_string()
                } else {
                    "Off".to_string()
                }
            }
        }
    }
}

/// Menu labels for counts 1 through 8
pub const COUNT_NAMES: [&str; 8] = [
    "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight",
];

pub fn count_name(count: usize) -> &'static str {
    count
        .checked_sub(1)
        .and_then(|i| COUNT_NAMES.get(i))
        .copied()
        .unwrap_or("")
}

pub fn detune_mode_name(mode: DetuneMode) -> &'static str {
    mode.name()
}

pub fn quantization_mode_name(mode: QuantizationMode) -> &'static str {
    mode.name()
}

pub fn steps_per_measure_readout(module: Option<&SemitoneSequencer>) -> String {
    match module {
        Some(m) => format!("Steps per measure: {}", m.steps_per_measure()),
        None => "Steps per measure: ERROR".to_string(),
    }
}

pub fn measures_readout(module: Option<&SemitoneSequencer>) -> String {
    match module {
        Some(m) => format!("Number of measures: {}", m.num_measures()),
        None => "Number of measures: ERROR".to_string(),
    }
}
