//! Debanding with deterministic grain.

use serde::{Deserialize, Serialize};

use edgefix_core::{scale, EdgefixError, Frame, Plane, Result};

/// Deband strengths and grain, in the units of the common f3kdb-style filters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DebandParams {
    /// Luma threshold; 16 units correspond to one 8-bit level
    pub strength_y: u32,
    /// Chroma threshold
    pub strength_c: u32,
    /// Grain amplitude; 32 units correspond to one 8-bit level
    pub grain: u32,
    /// Maximum reference distance in luma pixels
    pub range: u32,
}

impl Default for DebandParams {
    fn default() -> Self {
        Self {
            strength_y: 64,
            strength_c: 64,
            grain: 64,
            range: 30,
        }
    }
}

impl DebandParams {
    /// Same strength on luma and chroma with the given grain and range.
    pub fn uniform(strength: u32, grain: u32, range: u32) -> Self {
        Self {
            strength_y: strength,
            strength_c: strength,
            grain,
            range,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.range == 0 {
            return Err(EdgefixError::invalid("deband range must be positive"));
        }
        Ok(())
    }
}

/// Deband service. `index` seeds the grain so each frame differs while
/// repeated requests stay identical.
pub trait Debander: Send + Sync {
    fn deband(&self, frame: &Frame, index: u32, params: &DebandParams) -> Result<Frame>;
}

/// Each sample is compared with four references at a pseudo-random distance
/// up to `range` along a cross. When all of them are within the threshold
/// the sample is replaced by their mean and grain is added.
#[derive(Debug, Clone, Copy, Default)]
pub struct GradientDeband;

impl Debander for GradientDeband {
    fn deband(&self, frame: &Frame, index: u32, params: &DebandParams) -> Result<Frame> {
        params.validate()?;
        let format = frame.format;
        let bits = format.bits;
        Ok(frame.map_planes(|i, plane| {
            let strength = if format.is_chroma(i) {
                params.strength_c
            } else {
                params.strength_y
            };
            if strength == 0 {
                return plane.clone();
            }
            let (sw, _) = format.plane_shift(i);
            let settings = PlaneSettings {
                threshold: scale_fraction(strength, 16, bits),
                grain: scale_fraction(params.grain, 32, bits),
                range: (params.range >> sw).max(1),
                seed: ((index as u64) << 8) | i as u64,
                peak: format.peak() as f64,
            };
            deband_plane(plane, &settings)
        }))
    }
}

/// `value / per_level` 8-bit levels expressed at `bits`.
fn scale_fraction(value: u32, per_level: u32, bits: u8) -> f64 {
    value as f64 / per_level as f64 * scale::peak(bits) as f64 / 255.0
}

struct PlaneSettings {
    threshold: f64,
    grain: f64,
    range: u32,
    seed: u64,
    peak: f64,
}

fn deband_plane(plane: &Plane, s: &PlaneSettings) -> Plane {
    let (w, h) = (plane.width as i64, plane.height as i64);
    let sample = |x: i64, y: i64| plane.get(x.clamp(0, w - 1) as u32, y.clamp(0, h - 1) as u32) as f64;
    Plane::from_fn(plane.width, plane.height, |x, y| {
        let v = plane.get(x, y);
        let hash = mix(s.seed ^ (((y as u64) << 32) | x as u64));
        let r = (hash % (s.range as u64 + 1)) as i64;
        let (xi, yi) = (x as i64, y as i64);
        let refs = [
            sample(xi - r, yi),
            sample(xi + r, yi),
            sample(xi, yi - r),
            sample(xi, yi + r),
        ];
        let flat = refs.iter().all(|&p| (p - v as f64).abs() < s.threshold);
        if !flat {
            return v;
        }
        let mean = refs.iter().sum::<f64>() / 4.0;
        // Uniform grain in [-grain, grain].
        let unit = (mix(hash) >> 11) as f64 / (1u64 << 53) as f64;
        let noise = (unit * 2.0 - 1.0) * s.grain;
        (mean + noise).round().clamp(0.0, s.peak) as u16
    })
}

/// SplitMix64 finalizer.
#[inline]
fn mix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgefix_core::VideoFormat;

    fn gradient() -> Frame {
        // A shallow ramp: one level every 8 columns.
        Frame::from_fn(64, 16, VideoFormat::YUV420P8, |i, x, _| {
            if i == 0 {
                60 + (x / 8) as u16
            } else {
                128
            }
        })
        .unwrap()
    }

    #[test]
    fn test_deterministic_per_index() {
        let frame = gradient();
        let params = DebandParams::default();
        let a = GradientDeband.deband(&frame, 5, &params).unwrap();
        let b = GradientDeband.deband(&frame, 5, &params).unwrap();
        let c = GradientDeband.deband(&frame, 6, &params).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_edges_survive() {
        // A hard step far above the threshold is never smoothed.
        let frame = Frame::from_fn(32, 8, VideoFormat::GRAY8, |_, x, _| if x < 16 { 30 } else { 200 }).unwrap();
        let params = DebandParams {
            grain: 0,
            ..DebandParams::default()
        };
        let out = GradientDeband.deband(&frame, 0, &params).unwrap();
        for y in 0..8 {
            assert!(out.planes[0].row(y).iter().all(|&v| v == 30 || v == 200));
        }
    }

    #[test]
    fn test_flat_area_stays_close() {
        let frame = gradient();
        let out = GradientDeband.deband(&frame, 0, &DebandParams::default()).unwrap();
        for (&a, &b) in frame.planes[0].data.iter().zip(out.planes[0].data.iter()) {
            assert!((a as i32 - b as i32).abs() <= 6);
        }
    }

    #[test]
    fn test_zero_strength_is_identity() {
        let frame = gradient();
        let params = DebandParams::uniform(0, 64, 30);
        assert_eq!(GradientDeband.deband(&frame, 3, &params).unwrap(), frame);
        assert!(GradientDeband
            .deband(&frame, 0, &DebandParams::uniform(64, 64, 0))
            .is_err());
    }
}
