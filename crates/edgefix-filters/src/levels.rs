//! Levels adjustment of single rows and columns.

use serde::{Deserialize, Serialize};

use edgefix_core::scale::{self, scale_from};
use edgefix_core::{ColorFamily, EdgefixError, Frame, Plane, Result};

/// One luma row or column, in luma pixels from the top/left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Line {
    Row(u32),
    Column(u32),
}

/// Levels mapping in 8-bit reference units.
///
/// Input is clamped to `[input_low, input_high]`, normalized, raised to
/// `1 / gamma` and mapped onto `[output_low, output_high]`. With `protect`
/// set, samples within that distance of black or white keep their value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelsParams {
    pub input_low: i64,
    pub input_high: i64,
    pub output_low: i64,
    pub output_high: i64,
    pub gamma: f64,
    pub protect: Option<i64>,
}

impl Default for LevelsParams {
    fn default() -> Self {
        Self {
            input_low: 16,
            input_high: 235,
            output_low: 16,
            output_high: 235,
            gamma: 1.0,
            protect: None,
        }
    }
}

impl LevelsParams {
    /// Mapping that crushes the whole range onto black; used next to new borders.
    pub const BLACKEN: Self = Self {
        input_low: 16,
        input_high: 255,
        output_low: 16,
        output_high: 16,
        gamma: 1.0,
        protect: None,
    };

    /// Brightness shift with protection: `adj > 0` brightens, `adj < 0` darkens.
    pub fn brightness(adj: i64, protect: i64) -> Self {
        let mut params = Self {
            protect: (protect > 0).then_some(protect),
            ..Self::default()
        };
        if adj > 0 {
            params.input_high -= adj;
        } else {
            params.output_high += adj;
        }
        params
    }

    fn validate(&self) -> Result<()> {
        if self.input_high <= self.input_low {
            return Err(EdgefixError::invalid(format!(
                "levels input range {}..{} is empty",
                self.input_low, self.input_high
            )));
        }
        if !(self.gamma.is_finite() && self.gamma > 0.0) {
            return Err(EdgefixError::invalid(format!("levels gamma must be positive, got {}", self.gamma)));
        }
        for v in [self.input_low, self.input_high, self.output_low, self.output_high] {
            if !(0..=255).contains(&v) {
                return Err(EdgefixError::invalid(format!("levels value {v} outside 0..255")));
            }
        }
        Ok(())
    }

    /// Map one sample at `bits`, computing at 16-bit precision.
    pub fn apply(&self, v: u16, bits: u8) -> u16 {
        if let Some(prot) = self.protect {
            let lo = scale::black(bits) as i64 + scale::scale(prot, bits);
            let hi = scale::white(bits) as i64 - scale::scale(prot, bits);
            if (v as i64) <= lo || (v as i64) >= hi {
                return v;
            }
        }
        let in_lo = scale_from(self.input_low, 16, 8) as f64;
        let in_hi = scale_from(self.input_high, 16, 8) as f64;
        let out_lo = scale_from(self.output_low, 16, 8) as f64;
        let out_hi = scale_from(self.output_high, 16, 8) as f64;

        let x = scale_from(v as i64, 16, bits) as f64;
        let t = ((x.clamp(in_lo, in_hi) - in_lo) / (in_hi - in_lo)).powf(1.0 / self.gamma);
        let y = (t * (out_hi - out_lo) + out_lo).round();
        let peak = scale::peak(bits) as f64;
        (y * peak / 65535.0).round().clamp(0.0, peak) as u16
    }
}

/// Per-line levels service.
pub trait LineLevels: Send + Sync {
    fn adjust(&self, frame: &Frame, line: Line, levels: &LevelsParams) -> Result<Frame>;
}

/// Adjusts the luma plane (every plane for RGB); chroma is left alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct LumaLineLevels;

impl LineLevels for LumaLineLevels {
    fn adjust(&self, frame: &Frame, line: Line, levels: &LevelsParams) -> Result<Frame> {
        levels.validate()?;
        let (index, limit) = match line {
            Line::Row(y) => (y, frame.height),
            Line::Column(x) => (x, frame.width),
        };
        if index >= limit {
            return Err(EdgefixError::invalid(format!(
                "{line:?} outside {}x{} frame",
                frame.width, frame.height
            )));
        }
        let bits = frame.format.bits;
        let all_planes = frame.format.family == ColorFamily::Rgb;
        Ok(frame.map_planes(|i, plane| {
            if i != 0 && !all_planes {
                return plane.clone();
            }
            adjust_line(plane, line, |v| levels.apply(v, bits))
        }))
    }
}

fn adjust_line(plane: &Plane, line: Line, f: impl Fn(u16) -> u16) -> Plane {
    let mut out = plane.clone();
    match line {
        Line::Row(y) => {
            for v in out.row_mut(y) {
                *v = f(*v);
            }
        }
        Line::Column(x) => {
            for y in 0..out.height {
                let v = out.get(x, y);
                out.set(x, y, f(v));
            }
        }
    }
    out
}

/// Levels adjustment of one row.
pub fn fix_row_brightness(frame: &Frame, row: u32, levels: &LevelsParams) -> Result<Frame> {
    LumaLineLevels.adjust(frame, Line::Row(row), levels)
}

/// Levels adjustment of one column.
pub fn fix_column_brightness(frame: &Frame, column: u32, levels: &LevelsParams) -> Result<Frame> {
    LumaLineLevels.adjust(frame, Line::Column(column), levels)
}

/// Brightness shift of one line leaving near-black and near-white samples
/// untouched.
pub fn fix_brightness_protect(frame: &Frame, line: Line, adj: i64, protect: i64) -> Result<Frame> {
    LumaLineLevels.adjust(frame, line, &LevelsParams::brightness(adj, protect))
}

/// Levels over whole planes.
pub fn fix_levels(frame: &Frame, levels: &LevelsParams, planes: &[usize]) -> Result<Frame> {
    levels.validate()?;
    if let Some(&bad) = planes.iter().find(|&&p| p >= frame.planes.len()) {
        return Err(EdgefixError::invalid(format!("frame has no plane {bad}")));
    }
    let bits = frame.format.bits;
    Ok(frame.map_planes(|i, plane| {
        if !planes.contains(&i) {
            return plane.clone();
        }
        let mut out = plane.clone();
        out.data.iter_mut().for_each(|v| *v = levels.apply(*v, bits));
        out
    }))
}

/// Canned repairs for common mastering faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LevelsPreset {
    /// Limited-range luma with gamma 0.88 undone.
    GammaBug,
    /// Limited-range luma stretched to full range.
    LumaOverflow,
    /// Full-range luma squeezed to 16..235 and chroma to 16..240.
    Overflow,
}

impl LevelsPreset {
    pub fn apply(self, frame: &Frame) -> Result<Frame> {
        let from_full = |output_low, output_high| LevelsParams {
            input_low: 0,
            input_high: 255,
            output_low,
            output_high,
            ..LevelsParams::default()
        };
        match self {
            Self::GammaBug => {
                let levels = LevelsParams {
                    gamma: 0.88,
                    ..LevelsParams::default()
                };
                fix_levels(frame, &levels, &[0])
            }
            Self::LumaOverflow => {
                let levels = LevelsParams {
                    output_low: 0,
                    output_high: 255,
                    ..LevelsParams::default()
                };
                fix_levels(frame, &levels, &[0])
            }
            Self::Overflow => {
                let luma = fix_levels(frame, &from_full(16, 235), &[0])?;
                let chroma: Vec<usize> = (1..frame.planes.len()).collect();
                fix_levels(&luma, &from_full(16, 240), &chroma)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgefix_core::VideoFormat;

    #[test]
    fn test_identity_levels() {
        let levels = LevelsParams::default();
        for v in [16u16, 100, 200, 235] {
            assert_eq!(levels.apply(v, 8), v);
        }
        assert_eq!(levels.apply(400, 10), 400);
    }

    #[test]
    fn test_blacken() {
        assert_eq!(LevelsParams::BLACKEN.apply(200, 8), 16);
        assert_eq!(LevelsParams::BLACKEN.apply(900, 10), 64);
    }

    #[test]
    fn test_brightness_direction() {
        let brighter = LevelsParams::brightness(10, 0);
        let darker = LevelsParams::brightness(-10, 0);
        assert!(brighter.apply(120, 8) > 120);
        assert!(darker.apply(120, 8) < 120);
    }

    #[test]
    fn test_protect_band() {
        let levels = LevelsParams::brightness(20, 20);
        // 16 + 20 = 36 and 235 - 20 = 215 bound the protected ranges.
        assert_eq!(levels.apply(30, 8), 30);
        assert_eq!(levels.apply(220, 8), 220);
        assert!(levels.apply(120, 8) > 120);
    }

    #[test]
    fn test_row_touches_luma_only() {
        let frame = Frame::from_fn(8, 4, VideoFormat::YUV420P8, |_, _, _| 100).unwrap();
        let out = fix_row_brightness(
            &frame,
            1,
            &LevelsParams {
                input_high: 200,
                ..LevelsParams::default()
            },
        )
        .unwrap();
        assert!(out.planes[0].row(1).iter().all(|&v| v > 100));
        assert_eq!(out.planes[0].row(0), frame.planes[0].row(0));
        assert_eq!(out.planes[1], frame.planes[1]);
    }

    #[test]
    fn test_column_out_of_range() {
        let frame = Frame::new(8, 4, VideoFormat::GRAY8).unwrap();
        assert!(fix_column_brightness(&frame, 8, &LevelsParams::default()).is_err());
        let bad = LevelsParams {
            input_high: 16,
            ..LevelsParams::default()
        };
        assert!(fix_column_brightness(&frame, 0, &bad).is_err());
    }

    #[test]
    fn test_gamma_keeps_endpoints() {
        let levels = LevelsParams {
            gamma: 0.88,
            ..LevelsParams::default()
        };
        assert_eq!(levels.apply(16, 8), 16);
        assert_eq!(levels.apply(235, 8), 235);
        let mid = levels.apply(126, 8);
        assert!((110..126).contains(&mid), "{mid}");
        let bad = LevelsParams {
            gamma: 0.0,
            ..LevelsParams::default()
        };
        assert!(fix_levels(&Frame::new(4, 4, VideoFormat::GRAY8).unwrap(), &bad, &[0]).is_err());
    }

    #[test]
    fn test_presets() {
        let frame = Frame::from_fn(4, 2, VideoFormat::YUV444P8, |_, x, _| if x < 2 { 0 } else { 255 }).unwrap();
        let squeezed = LevelsPreset::Overflow.apply(&frame).unwrap();
        assert_eq!(squeezed.planes[0].row(0), &[16, 16, 235, 235]);
        assert_eq!(squeezed.planes[1].row(0), &[16, 16, 240, 240]);
        assert_eq!(squeezed.planes[2].row(1), &[16, 16, 240, 240]);

        let limited = Frame::from_fn(4, 2, VideoFormat::YUV444P8, |_, x, _| if x < 2 { 16 } else { 235 }).unwrap();
        let stretched = LevelsPreset::LumaOverflow.apply(&limited).unwrap();
        assert_eq!(stretched.planes[0].row(0), &[0, 0, 255, 255]);
        assert_eq!(stretched.planes[1], limited.planes[1]);

        let fixed = LevelsPreset::GammaBug.apply(&limited).unwrap();
        assert_eq!(fixed, limited);
    }
}
