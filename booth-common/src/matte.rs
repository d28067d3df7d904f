//! Matte threshold math for mask-guided compositing
//!
//! Converts a per-pixel foreground probability (0-255) into a compositing
//! alpha through a two-threshold feather band. A single cutoff produces a
//! visible hard-edge halo around the subject; the feather band interpolates
//! alpha linearly between the two thresholds instead.

use serde::{Deserialize, Serialize};

/// Default lower threshold: probabilities below this are pure background
pub const DEFAULT_LOW: u8 = 180;

/// Default upper threshold: probabilities at or above this are pure foreground
pub const DEFAULT_HIGH: u8 = 220;

/// Two-threshold feathered alpha ramp
///
/// - probability < `low`  → alpha 0 (pure background)
/// - probability ≥ `high` → alpha 255 (pure foreground)
/// - in between           → linear interpolation across the band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatteThresholds {
    pub low: u8,
    pub high: u8,
}

impl MatteThresholds {
    /// Create thresholds, swapping the pair if given out of order
    pub fn new(low: u8, high: u8) -> Self {
        if low <= high {
            Self { low, high }
        } else {
            Self { low: high, high: low }
        }
    }

    /// Compositing alpha for a foreground probability
    ///
    /// Monotonic in `probability`: a higher probability never yields a
    /// lower alpha.
    pub fn alpha_for(&self, probability: u8) -> u8 {
        if probability < self.low {
            return 0;
        }
        if probability >= self.high {
            return 255;
        }
        // Degenerate band (low == high) is fully covered by the two
        // branches above, so the divisor is always non-zero here.
        let band = (self.high - self.low) as u32;
        let offset = (probability - self.low) as u32;
        ((offset * 255) / band) as u8
    }
}

impl Default for MatteThresholds {
    fn default() -> Self {
        Self {
            low: DEFAULT_LOW,
            high: DEFAULT_HIGH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_below_low_is_pure_background() {
        let t = MatteThresholds::default();
        assert_eq!(t.alpha_for(0), 0);
        assert_eq!(t.alpha_for(DEFAULT_LOW - 1), 0);
        // A mid probability that maps below the band: 0.5 scaled to 128
        assert_eq!(t.alpha_for(128), 0);
    }

    #[test]
    fn test_at_or_above_high_is_pure_foreground() {
        let t = MatteThresholds::default();
        assert_eq!(t.alpha_for(DEFAULT_HIGH), 255);
        assert_eq!(t.alpha_for(255), 255);
        // 0.9 probability scaled to 229 clears the upper threshold
        assert_eq!(t.alpha_for(229), 255);
    }

    #[test]
    fn test_band_is_linear() {
        let t = MatteThresholds::new(100, 200);
        assert_eq!(t.alpha_for(100), 0);
        assert_eq!(t.alpha_for(150), 127);
        assert_eq!(t.alpha_for(199), 252);
    }

    #[test]
    fn test_monotonic_over_full_range() {
        let t = MatteThresholds::default();
        let mut prev = 0u8;
        for p in 0..=255u8 {
            let alpha = t.alpha_for(p);
            assert!(
                alpha >= prev,
                "alpha decreased at probability {}: {} < {}",
                p,
                alpha,
                prev
            );
            prev = alpha;
        }
    }

    #[test]
    fn test_degenerate_band() {
        let t = MatteThresholds::new(128, 128);
        assert_eq!(t.alpha_for(127), 0);
        assert_eq!(t.alpha_for(128), 255);
    }

    #[test]
    fn test_swapped_bounds_are_normalized() {
        let t = MatteThresholds::new(220, 180);
        assert_eq!(t.low, 180);
        assert_eq!(t.high, 220);
    }
}
