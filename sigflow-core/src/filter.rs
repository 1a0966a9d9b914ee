//! First-Order IIR Smoothing Filter
//!
//! Single-pole exponential smoothing over the raw sample stream:
//!
//! ```text
//! y[n] = alpha * y[n-1] + (1 - alpha) * x[n]
//! ```
//!
//! `alpha` close to 1 yields heavy smoothing; close to 0 yields near
//! passthrough. The filter owns exactly one `f64` of state, initialized to
//! 0.0 at construction and reset only when the process restarts. It is a
//! pure function of its state plus one input: replaying the same sequence
//! with the same coefficient reproduces identical outputs bit for bit.

use crate::errors::ConfigError;

/// Exponential smoothing filter with a single decaying state variable
#[derive(Debug, Clone)]
pub struct SmoothingFilter {
    alpha: f64,
    y: f64,
}

impl SmoothingFilter {
    /// Create a filter with the given coefficient
    ///
    /// `alpha` must lie in [0, 1]; anything else is a configuration error.
    pub fn new(alpha: f64) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(ConfigError::InvalidAlpha { alpha });
        }

        Ok(Self { alpha, y: 0.0 })
    }

    /// Feed one raw input and return the smoothed output
    ///
    /// Updates internal state to the returned value. No error conditions.
    pub fn apply(&mut self, x: f64) -> f64 {
        self.y = self.alpha * self.y + (1.0 - self.alpha) * x;
        self.y
    }

    /// Current filter state (the previous output)
    pub fn output(&self) -> f64 {
        self.y
    }

    /// Configured smoothing coefficient
    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_coefficient_outside_unit_interval() {
        assert!(SmoothingFilter::new(-0.1).is_err());
        assert!(SmoothingFilter::new(1.1).is_err());
        assert!(SmoothingFilter::new(f64::NAN).is_err());
        assert!(SmoothingFilter::new(0.0).is_ok());
        assert!(SmoothingFilter::new(1.0).is_ok());
    }

    #[test]
    fn initial_state_is_zero() {
        let filter = SmoothingFilter::new(0.5).unwrap();
        assert_eq!(filter.output(), 0.0);
    }

    #[test]
    fn reference_step() {
        // alpha=0.5, y=0, x=768 -> 0.5*0 + 0.5*768 = 384
        let mut filter = SmoothingFilter::new(0.5).unwrap();
        assert_eq!(filter.apply(768.0), 384.0);
        assert_eq!(filter.output(), 384.0);
    }

    #[test]
    fn alpha_zero_is_passthrough() {
        let mut filter = SmoothingFilter::new(0.0).unwrap();
        assert_eq!(filter.apply(100.0), 100.0);
        assert_eq!(filter.apply(5.0), 5.0);
    }

    #[test]
    fn alpha_one_holds_state() {
        let mut filter = SmoothingFilter::new(1.0).unwrap();
        assert_eq!(filter.apply(100.0), 0.0);
        assert_eq!(filter.apply(4095.0), 0.0);
    }

    #[test]
    fn replay_is_bit_for_bit_deterministic() {
        let inputs = [768.0, 12.0, 4095.0, 0.0, 333.0, 100.5];

        let mut a = SmoothingFilter::new(0.73).unwrap();
        let mut b = SmoothingFilter::new(0.73).unwrap();

        for &x in &inputs {
            let ya = a.apply(x);
            let yb = b.apply(x);
            assert_eq!(ya.to_bits(), yb.to_bits());
        }
    }
}
