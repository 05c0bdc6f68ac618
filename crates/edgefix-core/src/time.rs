//! Frame rates and frame-index ranges.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{EdgefixError, Result};

/// Frame rate as a rational number (e.g., 24000/1001 for 23.976 fps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameRate {
    /// Numerator (e.g., 24000)
    pub numerator: u32,
    /// Denominator (e.g., 1001)
    pub denominator: u32,
}

impl FrameRate {
    /// Create a new frame rate.
    #[inline]
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    pub const FPS_24: Self = Self::new(24, 1);
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::FPS_24
    }
}

/// Inclusive range of absolute, 0-based frame indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameRange {
    pub start: u32,
    pub end: u32,
}

impl FrameRange {
    /// Create a range, rejecting `start > end`.
    pub fn new(start: u32, end: u32) -> Result<Self> {
        if start > end {
            return Err(EdgefixError::invalid(format!(
                "frame range [{start} {end}] ends before it starts"
            )));
        }
        Ok(Self { start, end })
    }

    /// Number of frames covered.
    #[inline]
    pub fn len(self) -> u32 {
        self.end - self.start + 1
    }

    /// Always false; a range covers at least one frame.
    #[inline]
    pub fn is_empty(self) -> bool {
        false
    }

    /// Check if a frame index is within this range.
    #[inline]
    pub fn contains(self, index: u32) -> bool {
        index >= self.start && index <= self.end
    }

    /// Check if two ranges overlap.
    pub fn overlaps(self, other: Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

impl fmt::Display for FrameRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {}]", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_range_inclusive() {
        let r = FrameRange::new(40, 59).unwrap();
        assert_eq!(r.len(), 20);
        assert!(r.contains(40) && r.contains(59));
        assert!(!r.contains(60));
        assert!(r.overlaps(FrameRange::new(0, 40).unwrap()));
        assert!(!r.overlaps(FrameRange::new(60, 99).unwrap()));
        assert!(FrameRange::new(5, 4).is_err());
    }
}
