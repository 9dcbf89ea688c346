//! Scale Tables and Nearest-Note Quantization
//!
//! A [`VoltageScale`] names one of the fixed semitone sets. The
//! [`NearestNoteQuantizer`] snaps a 1V/oct pitch onto the selected set using a
//! single bucket lookup rather than a full nearest-neighbour search: the
//! semitone within the octave is rescaled from 0–12 onto 0–7 and the table
//! entry at that index is taken. For the diatonic tables this picks a scale
//! neighbour; the triad tables are padded out to seven entries, and their last
//! slot folds back to the root.

use serde::{Deserialize, Serialize};

const MINOR: [u8; 7] = [0, 2, 3, 5, 7, 8, 10];
const MAJOR: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];
const MELODIC_MINOR_ASCENDING: [u8; 7] = [0, 2, 3, 5, 7, 9, 11];
const HARMONIC_MINOR: [u8; 7] = [0, 2, 3, 5, 7, 8, 11];
// The trailing 0 sends B down to the root of the same octave, not up to the
// next one.
const MINOR_TRIAD: [u8; 7] = [0, 0, 3, 3, 7, 7, 0];
const MAJOR_TRIAD: [u8; 7] = [0, 0, 4, 4, 7, 7, 0];
const CHROMATIC: [u8; 12] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];

/// Buckets used when rescaling a semitone (0–11) to a table index
const BUCKETS: usize = 7;

/// The fixed scales a [`NearestNoteQuantizer`] can be constrained to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VoltageScale {
    #[default]
    Minor,
    Major,
    MelodicMinorAscending,
    HarmonicMinor,
    MinorTriad,
    MajorTriad,
    Chromatic,
}

impl VoltageScale {
    pub const ALL: [VoltageScale; 7] = [
        VoltageScale::Minor,
        VoltageScale::Major,
        VoltageScale::MelodicMinorAscending,
        VoltageScale::HarmonicMinor,
        VoltageScale::MinorTriad,
        VoltageScale::MajorTriad,
        VoltageScale::Chromatic,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn name(&self) -> &'static str {
        match self {
            VoltageScale::Minor => "Minor",
            VoltageScale::Major => "Major",
            VoltageScale::MelodicMinorAscending => "Melodic minor (ascending)",
            VoltageScale::HarmonicMinor => "Harmonic minor",
            VoltageScale::MinorTriad => "Minor triad",
            VoltageScale::MajorTriad => "Major triad",
            VoltageScale::Chromatic => "Chromatic",
        }
    }

    /// The lookup table the quantizer indexes, padding included
    pub fn table(&self) -> &'static [u8] {
        match self {
            VoltageScale::Minor => &MINOR,
            VoltageScale::Major => &MAJOR,
            VoltageScale::MelodicMinorAscending => &MELODIC_MINOR_ASCENDING,
            VoltageScale::HarmonicMinor => &HARMONIC_MINOR,
            VoltageScale::MinorTriad => &MINOR_TRIAD,
            VoltageScale::MajorTriad => &MAJOR_TRIAD,
            VoltageScale::Chromatic => &CHROMATIC,
        }
    }

    /// Distinct semitone offsets, strictly increasing
    pub fn offsets(&self) -> Vec<u8> {
        let mut offsets = self.table().to_vec();
        offsets.sort_unstable();
        offsets.dedup();
        offsets
    }

    pub fn contains(&self, semitone: u8) -> bool {
        self.table().contains(&semitone)
    }

    /// Diatonic tables are the only ones the bucket lookup was laid out for
    pub fn is_diatonic(&self) -> bool {
        self.offsets().len() == BUCKETS
    }
}

/// Snaps pitch CV onto the notes of a [`VoltageScale`], keeping the octave
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestNoteQuantizer {
    scale: VoltageScale,
}

impl NearestNoteQuantizer {
    pub fn new(scale: VoltageScale) -> Self {
        Self { scale }
    }

    pub fn set_allowed_notes(&mut self, scale: VoltageScale) {
        self.scale = scale;
    }

    pub fn scale(&self) -> VoltageScale {
        self.scale
    }

    /// Quantize a 1V/oct pitch
    pub fn quantize(&self, pitch: f64) -> f64 {
        let semitones = libm::round(pitch * 12.0);
        let rounded_note = semitones / 12.0;

        // Equal to (semitones + 60) % 12 for anything above -5V, and still
        // non-negative below it.
        let remainder = (semitones as i64).rem_euclid(12) as u8;
        if self.scale.contains(remainder) {
            return rounded_note;
        }

        let table = self.scale.table();
        let bucket = (remainder as usize * BUCKETS / 12).min(table.len() - 1);
        rounded_note + (table[bucket] as f64 - remainder as f64) / 12.0
    }
}
