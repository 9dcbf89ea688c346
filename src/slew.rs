//! Pitch Glide
//!
//! A per-voice slew limiter whose step size depends on how far the output
//! still has to travel: the ramp is `1 / (1 + (t / (1 + |Δ|)) * sr)` volts per
//! sample, so wide leaps move quickly at first and the glide eases in as the
//! gap closes. A rise-and-fall time of zero bypasses the limiter.

/// Slew limiter used for the sequencer's slide control
#[derive(Debug, Clone, Copy, Default)]
pub struct SlewLimiter {
    out: f64,
    rise_and_fall_time: f64,
}

impl SlewLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_rise_and_fall_time(&mut self, time: f64) {
        self.rise_and_fall_time = time;
    }

    pub fn rise_and_fall_time(&self) -> f64 {
        self.rise_and_fall_time
    }

    /// Last output value
    pub fn value(&self) -> f64 {
        self.out
    }

    /// Move one sample toward `input`, never past it
    pub fn process(&mut self, input: f64, sample_rate: f64) -> f64 {
        if self.rise_and_fall_time <= 0.0 {
            self.out = input;
            return self.out;
        }

        let delta = (input - self.out).abs();
        let ramp = 1.0 / (1.0 + (self.rise_and_fall_time / (1.0 + delta)) * sample_rate);

        if input > self.out {
            self.out = (self.out + ramp).min(input);
        } else if input < self.out {
            self.out = (self.out - ramp).max(input);
        }
        self.out
    }

    pub fn reset(&mut self) {
        self.out = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_zero_time_passes_input_through() {
        let mut slew = SlewLimiter::new();
        assert_eq!(slew.process(3.25, 44100.0), 3.25);
        assert_eq!(slew.process(-1.0, 44100.0), -1.0);
    }

    #[test]
    fn test_zero_time_after_glide_has_no_residual_lag() {
        let mut slew = SlewLimiter::new();
        slew.set_rise_and_fall_time(0.5);
        slew.process(2.0, 44100.0);
        slew.set_rise_and_fall_time(0.0);
        assert_eq!(slew.process(2.0, 44100.0), 2.0);
    }

    #[test]
    fn test_never_overshoots() {
        let mut slew = SlewLimiter::new();
        slew.set_rise_and_fall_time(1.0);
        let mut previous = slew.value();
        for _ in 0..200_000 {
            let out = slew.process(1.0, 44100.0);
            assert!(out >= previous && out <= 1.0);
            previous = out;
        }

        for _ in 0..200_000 {
            let out = slew.process(-0.5, 44100.0);
            assert!(out <= previous && out >= -0.5);
            previous = out;
        }
    }

    #[test]
    fn test_eventually_reaches_target_exactly() {
        let mut slew = SlewLimiter::new();
        slew.set_rise_and_fall_time(0.01);
        let mut out = 0.0;
        for _ in 0..10_000 {
            out = slew.process(0.5, 1000.0);
        }
        assert_eq!(out, 0.5);
    }

    #[test]
    fn test_larger_gap_moves_faster() {
        let mut near = SlewLimiter::new();
        let mut far = SlewLimiter::new();
        near.set_rise_and_fall_time(0.2);
        far.set_rise_and_fall_time(0.2);

        let near_step = near.process(0.1, 48000.0);
        let far_step = far.process(4.0, 48000.0);
        assert!(far_step > near_step);

        // ramp = 1 / (1 + (0.2 / 1.1) * 48000)
        assert_abs_diff_eq!(near_step, 1.0 / (1.0 + (0.2 / 1.1) * 48000.0), epsilon = 1e-15);
    }

    #[test]
    fn test_reset_returns_to_zero() {
        let mut slew = SlewLimiter::new();
        slew.process(2.0, 44100.0);
        slew.reset();
        assert_eq!(slew.value(), 0.0);
    }
}
