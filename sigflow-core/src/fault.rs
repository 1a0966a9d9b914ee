//! Three-Sigma Fault Classification
//!
//! Flags a raw sample as anomalous when it deviates from the window mean by
//! more than three population standard deviations. The rule is evaluated
//! fresh on every sample against the post-append window statistics, so a
//! record's fault flag always reflects a baseline that includes the sample
//! itself.
//!
//! A flat window never flags: with `sigma == 0` every deviation is
//! considered nominal regardless of magnitude, since there is no noise
//! estimate to measure it against.

/// Deviation multiplier of the classification rule
pub const SIGMA_MULTIPLIER: f64 = 3.0;

/// Stateless 3-sigma classifier
#[derive(Debug, Clone, Copy, Default)]
pub struct SigmaClassifier;

impl SigmaClassifier {
    /// Create a classifier
    pub fn new() -> Self {
        Self
    }

    /// Classify one raw sample against the window baseline
    ///
    /// Returns `true` (anomalous) iff `sigma > 0` and
    /// `|raw - mean| > 3 * sigma`.
    pub fn classify(&self, raw: u16, mean: f64, sigma: f64) -> bool {
        sigma > 0.0 && libm::fabs(raw as f64 - mean) > SIGMA_MULTIPLIER * sigma
    }
}
