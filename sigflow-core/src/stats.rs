//! Sliding-Window Baseline Statistics
//!
//! ## Overview
//!
//! Maintains a bounded FIFO of the most recent N raw samples and produces
//! the arithmetic mean and the population standard deviation (divisor =
//! count, not count - 1) after every arrival. The window holds raw values
//! only, never filtered ones.
//!
//! ## Incremental Form
//!
//! Recomputing over the window on every sample would be O(N). Because raw
//! samples are 12-bit integers, the running sum and running sum of squares
//! fit comfortably in `u64` and stay exact:
//!
//! ```text
//! max sum    = 256 * 4095          < 2^21
//! max sum_sq = 256 * 4095 * 4095   < 2^33
//! ```
//!
//! Mean and variance derived from exact integer sums are identical to a
//! direct recomputation over the window contents, up to the final floating
//! divisions; append/evict cannot accumulate drift.
//!
//! ## Edge Cases
//!
//! With fewer than 2 samples in the window sigma is exactly 0.0, and a flat
//! window (all values equal) also yields exactly 0.0 since the integer sums
//! cancel.

use crate::errors::ConfigError;
use heapless::Deque;

/// Largest supported window size
///
/// Bounds the window storage at compile time: 256 * 2 bytes = 512 bytes,
/// small enough to keep the estimator allocation-free.
pub const MAX_WINDOW: usize = 256;

/// Mean and population standard deviation of the current window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowStats {
    /// Arithmetic mean over the window contents
    pub mean: f64,
    /// Population standard deviation (0.0 with fewer than 2 samples)
    pub sigma: f64,
}

/// Windowed mean/sigma estimator over the raw sample stream
///
/// The effective window size is fixed at construction; the backing store
/// is a `heapless::Deque` so no heap allocation ever happens on the
/// per-sample path.
#[derive(Debug, Clone)]
pub struct SlidingStats {
    window: Deque<u16, MAX_WINDOW>,
    capacity: usize,
    sum: u64,
    sum_sq: u64,
}

impl SlidingStats {
    /// Create an estimator over the last `n` samples
    ///
    /// `n` must lie in 1..=[`MAX_WINDOW`].
    pub fn with_window(n: usize) -> Result<Self, ConfigError> {
        if n == 0 || n > MAX_WINDOW {
            return Err(ConfigError::invalid_window(n));
        }

        Ok(Self {
            window: Deque::new(),
            capacity: n,
            sum: 0,
            sum_sq: 0,
        })
    }

    /// Append a raw sample, evicting the oldest when full, and return the
    /// statistics over the post-append window
    pub fn observe(&mut self, raw: u16) -> WindowStats {
        if self.window.len() == self.capacity {
            if let Some(oldest) = self.window.pop_front() {
                self.sum -= oldest as u64;
                self.sum_sq -= (oldest as u64) * (oldest as u64);
            }
        }

        // Cannot fail: capacity <= MAX_WINDOW and we just made room
        let _ = self.window.push_back(raw);
        self.sum += raw as u64;
        self.sum_sq += (raw as u64) * (raw as u64);

        let n = self.window.len() as f64;
        let mean = self.sum as f64 / n;

        let sigma = if self.window.len() < 2 {
            0.0
        } else {
            let variance = (self.sum_sq as f64 - self.sum as f64 * mean) / n;
            if variance > 0.0 {
                libm::sqrt(variance)
            } else {
                // Cancellation can leave a tiny negative residue
                0.0
            }
        };

        WindowStats { mean, sigma }
    }

    /// Number of samples currently held
    pub fn len(&self) -> usize {
        self.window.len()
    }

    /// Check if the window holds no samples yet
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Configured window size
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate over the window contents from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.window.iter().copied()
    }
}
