//! Step Storage
//!
//! The sequencer holds 4 measures of 8 steps. Only one measure at a time is
//! mapped onto the eight live step controls; the full set lives in the shadow
//! slots. Editing a measure is a two-phase affair: the live controls are
//! committed back into their measure's shadow slots, then whichever measure
//! is now selected is loaded into the live controls.

use crate::rng;
use serde::{Deserialize, Serialize};

/// Steps per measure, and the number of live controls
pub const STEPS_PER_MEASURE: usize = 8;
pub const MAX_MEASURES: usize = 4;
pub const SHADOW_SLOTS: usize = STEPS_PER_MEASURE * MAX_MEASURES;

pub const MIN_OCTAVE: f64 = -4.0;
pub const MAX_OCTAVE: f64 = 4.0;
pub const MAX_SEMITONE: f64 = 11.0;

/// Pitch and enable flag for one step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepSlot {
    pub octave: f64,
    pub semitone: f64,
    pub active: bool,
}

impl StepSlot {
    pub fn new(octave: f64, semitone: f64, active: bool) -> Self {
        Self {
            octave,
            semitone,
            active,
        }
    }

    /// Raw 1V/oct pitch
    pub fn pitch(&self) -> f64 {
        self.octave + self.semitone / 12.0
    }

    /// Round and clamp to the ranges the step controls allow
    pub fn constrained(self) -> Self {
        Self {
            octave: libm::round(self.octave).clamp(MIN_OCTAVE, MAX_OCTAVE),
            semitone: libm::round(self.semitone).clamp(0.0, MAX_SEMITONE),
            active: self.active,
        }
    }
}

impl Default for StepSlot {
    fn default() -> Self {
        Self::new(0.0, 0.0, true)
    }
}

/// Live step controls plus the shadow slots for every measure
#[derive(Debug, Clone)]
pub struct StepBank {
    live: [StepSlot; STEPS_PER_MEASURE],
    shadow: [StepSlot; SHADOW_SLOTS],
    /// Measure the live controls were last loaded from
    loaded: usize,
}

impl StepBank {
    pub fn new() -> Self {
        Self {
            live: [StepSlot::default(); STEPS_PER_MEASURE],
            shadow: [StepSlot::default(); SHADOW_SLOTS],
            loaded: 0,
        }
    }

    fn measure_range(measure: usize) -> std::ops::Range<usize> {
        let start = measure.min(MAX_MEASURES - 1) * STEPS_PER_MEASURE;
        start..start + STEPS_PER_MEASURE
    }

    /// Write the live controls into `measure`'s shadow slots
    pub fn commit(&mut self, measure: usize) {
        self.shadow[Self::measure_range(measure)].copy_from_slice(&self.live);
    }

    /// Copy `measure`'s shadow slots into the live controls
    pub fn load(&mut self, measure: usize) {
        self.live.copy_from_slice(&self.shadow[Self::measure_range(measure)]);
        self.loaded = measure.min(MAX_MEASURES - 1);
    }

    pub fn loaded(&self) -> usize {
        self.loaded
    }

    pub fn live(&self) -> &[StepSlot; STEPS_PER_MEASURE] {
        &self.live
    }

    pub fn set_live(&mut self, step: usize, slot: StepSlot) {
        if let Some(live) = self.live.get_mut(step) {
            *live = slot.constrained();
        }
    }

    pub fn shadow(&self) -> &[StepSlot; SHADOW_SLOTS] {
        &self.shadow
    }

    /// Shadow slot by absolute index; out-of-range indices read as a silent,
    /// inactive step
    pub fn slot(&self, index: usize) -> StepSlot {
        self.shadow
            .get(index)
            .copied()
            .unwrap_or(StepSlot::new(0.0, 0.0, false))
    }

    /// Write a shadow slot. A slot in the loaded measure is written to its
    /// live control too, so the next commit keeps it.
    pub fn set_slot(&mut self, index: usize, slot: StepSlot) {
        if let Some(shadow) = self.shadow.get_mut(index) {
            *shadow = slot.constrained();
            if index / STEPS_PER_MEASURE == self.loaded {
                self.live[index % STEPS_PER_MEASURE] = *shadow;
            }
        }
    }

    pub fn is_active(&self, index: usize) -> bool {
        self.slot(index).active
    }

    /// Random octave in -4..=4 and semitone in 0..=11 for every shadow slot
    pub fn randomize_pitches(&mut self) {
        for slot in self.shadow.iter_mut() {
            slot.octave = libm::round(rng::uniform() * 8.0) + MIN_OCTAVE;
            slot.semitone = rng::below(12) as f64;
        }
    }
}

impl Default for StepBank {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_then_load_swaps_measures() {
        let mut bank = StepBank::new();
        bank.set_live(0, StepSlot::new(1.0, 4.0, true));
        bank.set_live(7, StepSlot::new(-2.0, 11.0, false));
        bank.commit(2);

        assert_eq!(bank.slot(16), StepSlot::new(1.0, 4.0, true));
        assert_eq!(bank.slot(23), StepSlot::new(-2.0, 11.0, false));
        // Other measures untouched
        assert_eq!(bank.slot(0), StepSlot::default());

        bank.load(0);
        assert_eq!(bank.live()[0], StepSlot::default());
        bank.load(2);
        assert_eq!(bank.live()[7], StepSlot::new(-2.0, 11.0, false));
    }

    #[test]
    fn test_load_copies_all_enable_flags() {
        let mut bank = StepBank::new();
        for i in 0..STEPS_PER_MEASURE {
            bank.set_slot(8 + i, StepSlot::new(0.0, 0.0, i % 2 == 0));
        }
        bank.load(1);
        for (i, slot) in bank.live().iter().enumerate() {
            assert_eq!(slot.active, i % 2 == 0);
        }
    }

    #[test]
    fn test_live_values_are_constrained() {
        let mut bank = StepBank::new();
        bank.set_live(3, StepSlot::new(9.0, 12.6, true));
        assert_eq!(bank.live()[3], StepSlot::new(4.0, 11.0, true));
        // Past the last live control is ignored
        bank.set_live(8, StepSlot::default());
    }

    #[test]
    fn test_out_of_range_slot_reads_inactive() {
        let bank = StepBank::new();
        assert!(bank.is_active(31));
        assert!(!bank.is_active(32));
    }

    #[test]
    fn test_measure_index_is_clamped() {
        let mut bank = StepBank::new();
        bank.set_live(0, StepSlot::new(2.0, 0.0, true));
        bank.commit(9);
        assert_eq!(bank.slot(24).octave, 2.0);
    }

    #[test]
    fn test_randomize_stays_in_range() {
        rng::seed(11);
        let mut bank = StepBank::new();
        bank.randomize_pitches();
        for slot in bank.shadow() {
            assert!((MIN_OCTAVE..=MAX_OCTAVE).contains(&slot.octave));
            assert!((0.0..=MAX_SEMITONE).contains(&slot.semitone));
            assert_eq!(slot.semitone.fract(), 0.0);
        }
    }

    #[test]
    fn test_set_slot_writes_through_to_loaded_measure() {
        let mut bank = StepBank::new();
        bank.load(1);
        bank.set_slot(9, StepSlot::new(1.0, 1.0, false));
        bank.set_slot(2, StepSlot::new(3.0, 0.0, true));
        assert_eq!(bank.live()[1], StepSlot::new(1.0, 1.0, false));
        assert_eq!(bank.live()[2], StepSlot::default());
        bank.commit(bank.loaded());
        assert_eq!(bank.slot(9), StepSlot::new(1.0, 1.0, false));
    }

    #[test]
    fn test_pitch() {
        assert_eq!(StepSlot::new(1.0, 6.0, true).pitch(), 1.5);
    }
}
