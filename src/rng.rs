//! Shared Random Number Generation
//!
//! Every random draw the modules make (detune values, gate probability,
//! random step selection, randomize) comes from one small, fast,
//! non-cryptographic generator. It lives in thread-local storage so the audio
//! thread never locks; tests call [`seed`] to make their thread's sequence
//! reproducible.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;

std::thread_local! {
    static RNG_STATE: RefCell<SmallRng> = RefCell::new(SmallRng::from_entropy());
}

/// Get a random f64 in the range [0.0, 1.0).
#[inline]
pub fn uniform() -> f64 {
    RNG_STATE.with(|cell| cell.borrow_mut().gen::<f64>())
}

/// Get a random f64 in the range [-1.0, 1.0).
#[inline]
pub fn uniform_bipolar() -> f64 {
    uniform() * 2.0 - 1.0
}

/// Get a random index in `0..n`; always 0 when `n` is 0.
#[inline]
pub fn below(n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    RNG_STATE.with(|cell| cell.borrow_mut().gen_range(0..n))
}

/// Seed the thread-local RNG.
pub fn seed(seed: u64) {
    RNG_STATE.with(|cell| {
        *cell.borrow_mut() = SmallRng::seed_from_u64(seed);
    });
}
