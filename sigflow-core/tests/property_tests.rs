//! Property-based tests for the decoder and the sliding estimator
//!
//! These pin the two invariants unit tests can only spot-check: the
//! incremental statistics must agree with direct recomputation over the
//! retained samples for any input sequence, and the decoder must recover
//! every frame regardless of the noise and padding around it.

use proptest::prelude::*;

use sigflow_core::{FrameDecoder, MemoryLink, SlidingStats, DEFAULT_HEADER};

/// Drain every sample the decoder can produce from a byte slice
fn decode_all(bytes: &[u8]) -> Vec<u16> {
    let mut decoder = FrameDecoder::new();
    let mut link = MemoryLink::new(bytes);
    let mut out = Vec::new();
    loop {
        match decoder.poll_sample(&mut link) {
            Ok(raw) => out.push(raw),
            Err(nb::Error::WouldBlock) => {
                // Exhaustion mid-frame means a truncated trailing frame;
                // nothing more will arrive either way.
                if link.is_exhausted() {
                    return out;
                }
            }
            Err(nb::Error::Other(e)) => match e {},
        }
    }
}

/// Mean and population sigma computed directly from a slice
fn direct_stats(window: &[u16]) -> (f64, f64) {
    let n = window.len() as f64;
    let mean = window.iter().map(|&v| v as f64).sum::<f64>() / n;
    if window.len() < 2 {
        return (mean, 0.0);
    }
    let var = window
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    (mean, var.sqrt())
}

proptest! {
    /// Incremental sums must track direct recomputation over the
    /// retained window at every step, for any sample sequence and any
    /// window size.
    #[test]
    fn sliding_stats_match_direct_recomputation(
        samples in prop::collection::vec(0u16..=4095, 1..400),
        window in 1usize..=64,
    ) {
        let mut stats = SlidingStats::with_window(window).unwrap();
        for (i, &sample) in samples.iter().enumerate() {
            let result = stats.observe(sample);

            let start = (i + 1).saturating_sub(window);
            let (mean, sigma) = direct_stats(&samples[start..=i]);

            prop_assert!((result.mean - mean).abs() <= 1e-9 * mean.abs().max(1.0));
            prop_assert!((result.sigma - sigma).abs() <= 1e-9 * sigma.abs().max(1.0));
        }
    }

    /// Sigma is never negative and is exactly zero for windows shorter
    /// than two samples.
    #[test]
    fn sigma_is_nonnegative_and_zero_for_singletons(
        samples in prop::collection::vec(0u16..=4095, 1..100),
    ) {
        let mut stats = SlidingStats::with_window(64).unwrap();
        for (i, &sample) in samples.iter().enumerate() {
            let result = stats.observe(sample);
            prop_assert!(result.sigma >= 0.0);
            if i == 0 {
                prop_assert_eq!(result.sigma, 0.0);
            }
        }
    }

    /// Every well-formed frame decodes to its sample value no matter
    /// what the padding nibble holds.
    #[test]
    fn frame_decodes_regardless_of_padding(
        value in 0u16..=4095,
        padding in 0u8..=0x0F,
    ) {
        let bytes = [
            DEFAULT_HEADER,
            (value >> 4) as u8,
            (((value & 0x0F) << 4) as u8) | padding,
        ];
        prop_assert_eq!(decode_all(&bytes), vec![value]);
    }

    /// Junk bytes that are not the header never produce samples, and the
    /// frames that follow them decode intact.
    #[test]
    fn decoder_recovers_after_junk_prefix(
        junk in prop::collection::vec(
            (0u8..=255).prop_filter("not the header", |b| *b != DEFAULT_HEADER),
            0..32,
        ),
        values in prop::collection::vec(0u16..=4095, 1..16),
    ) {
        let mut bytes = junk;
        for &value in &values {
            bytes.push(DEFAULT_HEADER);
            bytes.push((value >> 4) as u8);
            bytes.push(((value & 0x0F) << 4) as u8);
        }
        prop_assert_eq!(decode_all(&bytes), values);
    }

    /// A truncated trailing frame yields nothing and leaves the earlier
    /// frames untouched.
    #[test]
    fn truncated_trailing_frame_is_dropped(
        values in prop::collection::vec(0u16..=4095, 0..8),
        cut in 1usize..=2,
    ) {
        let mut bytes = Vec::new();
        for &value in &values {
            bytes.push(DEFAULT_HEADER);
            bytes.push((value >> 4) as u8);
            bytes.push(((value & 0x0F) << 4) as u8);
        }
        // Start one more frame but cut it short
        bytes.push(DEFAULT_HEADER);
        if cut == 2 {
            bytes.push(0x12);
        }
        prop_assert_eq!(decode_all(&bytes), values);
    }
}
