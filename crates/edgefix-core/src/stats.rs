//! Per-plane statistics used by statistics-driven evaluation.

use serde::{Deserialize, Serialize};

use crate::frame::Plane;
use crate::scale;

/// Summary of one plane's samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneStats {
    pub min: u16,
    pub max: u16,
    /// Mean sample normalized to `[0, 1]` of the bit depth's range.
    pub average: f64,
}

impl PlaneStats {
    pub fn measure(plane: &Plane, bits: u8) -> Self {
        let (mut min, mut max, mut sum) = (u16::MAX, 0u16, 0u64);
        for &v in &plane.data {
            min = min.min(v);
            max = max.max(v);
            sum += v as u64;
        }
        let count = plane.data.len().max(1) as f64;
        Self {
            min,
            max,
            average: sum as f64 / count / scale::peak(bits) as f64,
        }
    }
}
