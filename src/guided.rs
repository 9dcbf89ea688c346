//! Guide-Driven Quantization
//!
//! The [`GuidedQuantizer`] takes its allowed notes from live voltages, usually
//! the channels of a polyphonic "guide" cable, and snaps each input to the
//! truly nearest of them within the octave.

use crate::port::MAX_CHANNELS;
use serde::{Deserialize, Serialize};

/// Fallback note sets used when no guide cable is present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DefaultScale {
    #[default]
    Minor,
    Major,
    MinorTriad,
    MajorTriad,
}

impl DefaultScale {
    pub const ALL: [DefaultScale; 4] = [
        DefaultScale::Minor,
        DefaultScale::Major,
        DefaultScale::MinorTriad,
        DefaultScale::MajorTriad,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn name(&self) -> &'static str {
        match self {
            DefaultScale::Minor => "Minor",
            DefaultScale::Major => "Major",
            DefaultScale::MinorTriad => "Minor triad",
            DefaultScale::MajorTriad => "Major triad",
        }
    }

    pub fn semitones(&self) -> &'static [u8] {
        match self {
            DefaultScale::Minor => &[0, 2, 3, 5, 7, 8, 10],
            DefaultScale::Major => &[0, 2, 4, 5, 7, 9, 11],
            DefaultScale::MinorTriad => &[0, 3, 7],
            DefaultScale::MajorTriad => &[0, 4, 7],
        }
    }
}

/// Octave-independent position of a voltage within its octave, in [0, 1)
///
/// Negative voltages fold onto the same positions as their magnitude.
pub fn guide_fraction(voltage: f64) -> f64 {
    let magnitude = voltage.abs();
    magnitude - libm::trunc(magnitude)
}

/// Nearest-note quantizer over a note set rebuilt from live voltages
#[derive(Debug, Clone, Copy)]
pub struct GuidedQuantizer {
    notes: [f64; MAX_CHANNELS],
    len: usize,
}

impl GuidedQuantizer {
    pub fn new() -> Self {
        Self {
            notes: [0.0; MAX_CHANNELS],
            len: 0,
        }
    }

    /// Replace the allowed set with the fractions of `voltages`.
    ///
    /// At most [`MAX_CHANNELS`] voltages are used; an empty slice leaves the
    /// quantizer with nothing to snap to.
    pub fn set_allowed_notes(&mut self, voltages: &[f64]) {
        self.len = voltages.len().min(MAX_CHANNELS);
        for (note, &voltage) in self.notes.iter_mut().zip(&voltages[..self.len]) {
            *note = guide_fraction(voltage);
        }
    }

    /// Replace the allowed set with a fixed scale transposed up by `root`
    /// semitones (wrapping within the octave).
    pub fn set_allowed_notes_default(&mut self, scale: DefaultScale, root: u8) {
        let semitones = scale.semitones();
        self.len = semitones.len();
        for (note, &semitone) in self.notes.iter_mut().zip(semitones) {
            *note = ((semitone as u32 + root as u32) % 12) as f64 / 12.0;
        }
    }

    pub fn allowed_notes(&self) -> &[f64] {
        &self.notes[..self.len]
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Snap `pitch` to the closest allowed note in its own octave.
    ///
    /// Returns `None` when the allowed set is empty. Ties go to the earliest
    /// note in the set.
    pub fn quantize(&self, pitch: f64) -> Option<f64> {
        let octave = libm::floor(pitch);
        let fraction = pitch - octave;

        let mut notes = self.allowed_notes().iter().copied();
        let first = notes.next()?;
        let mut closest = first;
        let mut smallest = (fraction - first).abs();
        for note in notes {
            let distance = (fraction - note).abs();
            if distance < smallest {
                closest = note;
                smallest = distance;
            }
        }

        Some(closest + octave)
    }
}

impl Default for GuidedQuantizer {
    fn default() -> Self {
        Self::new()
    }
}
