//! Parameter Definitions and Storage
//!
//! Parameters are the knob, switch and button values the host writes and the
//! modules read once per tick. Each one declares its range; stored values are
//! always clamped (and rounded, for snapping controls) on write.

use crate::display::DisplayTable;

/// Unique identifier for a parameter within a module
pub type ParamId = u32;

/// How a parameter value is rendered for display
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueFormat {
    /// Plain number with the given precision
    Decimal { places: u8 },
    /// `value * multiplier`, e.g. 0–1 shown as 0–100%
    Scaled { multiplier: f64, unit: &'static str },
    /// `multiplier * base^value`, e.g. a tempo exponent shown as BPM
    Exponential {
        base: f64,
        multiplier: f64,
        unit: &'static str,
    },
    /// Whole number shifted by `offset`, e.g. a 0-based index shown 1-based
    Offset { offset: f64 },
    /// Fixed label lookup
    Table(DisplayTable),
}

impl ValueFormat {
    pub fn format(&self, value: f64) -> String {
        match self {
            ValueFormat::Decimal { places } => {
                format!("{:.prec$}", value, prec = *places as usize)
            }
            ValueFormat::Scaled { multiplier, unit } => {
                format!("{:.0}{}", value * multiplier, unit)
            }
            ValueFormat::Exponential {
                base,
                multiplier,
                unit,
            } => format!("{:.1}{}", multiplier * libm::pow(*base, value), unit),
            ValueFormat::Offset { offset } => format!("{:.0}", value + offset),
            ValueFormat::Table(table) => table.label(value),
        }
    }
}

/// Parameter definition for UI binding
#[derive(Debug, Clone)]
pub struct ParamDef {
    pub id: ParamId,
    pub name: String,
    pub min: f64,
    pub max: f64,
    pub default: f64,
    /// Snapping controls only hold whole numbers
    pub snap: bool,
    pub format: ValueFormat,
}

impl ParamDef {
    pub fn new(id: ParamId, name: impl Into<String>, min: f64, max: f64, default: f64) -> Self {
        Self {
            id,
            name: name.into(),
            min,
            max,
            default,
            snap: false,
            format: ValueFormat::Decimal { places: 2 },
        }
    }

    pub fn snapped(mut self) -> Self {
        self.snap = true;
        self.format = ValueFormat::Decimal { places: 0 };
        self
    }

    pub fn with_format(mut self, format: ValueFormat) -> Self {
        self.format = format;
        self
    }

    /// Clamp into range, rounding first for snapping controls
    pub fn constrain(&self, value: f64) -> f64 {
        let value = if value.is_nan() { self.default } else { value };
        let value = if self.snap { libm::round(value) } else { value };
        value.clamp(self.min, self.max)
    }

    pub fn display(&self, value: f64) -> String {
        self.format.format(value)
    }
}

/// Current values for a module's parameter set, indexed by [`ParamId`]
///
/// Definitions must use consecutive ids starting at zero.
#[derive(Debug, Clone)]
pub struct ParamValues {
    defs: Vec<ParamDef>,
    values: Vec<f64>,
}

impl ParamValues {
    pub fn new(defs: Vec<ParamDef>) -> Self {
        debug_assert!(defs.iter().enumerate().all(|(i, d)| d.id as usize == i));
        let values = defs.iter().map(|d| d.default).collect();
        Self { defs, values }
    }

    pub fn defs(&self) -> &[ParamDef] {
        &self.defs
    }

    pub fn get(&self, id: ParamId) -> Option<f64> {
        self.values.get(id as usize).copied()
    }

    /// Value of a parameter known to exist; unknown ids read as 0
    pub fn value(&self, id: ParamId) -> f64 {
        self.get(id).unwrap_or(0.0)
    }

    /// Store a clamped value. Returns false for unknown ids.
    pub fn set(&mut self, id: ParamId, value: f64) -> bool {
        match (self.defs.get(id as usize), self.values.get_mut(id as usize)) {
            (Some(def), Some(slot)) => {
                *slot = def.constrain(value);
                true
            }
            _ => false,
        }
    }

    pub fn reset_to_defaults(&mut self) {
        for (slot, def) in self.values.iter_mut().zip(&self.defs) {
            *slot = def.default;
        }
    }

    pub fn display(&self, id: ParamId) -> Option<String> {
        let def = self.defs.get(id as usize)?;
        Some(def.display(self.value(id)))
    }
}
