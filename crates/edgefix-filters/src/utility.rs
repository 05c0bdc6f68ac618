//! Small helpers: masked merges, greyscale, and gamma checks.

use edgefix_core::{scale, Clip, ColorFamily, EdgefixError, Frame, Plane, Result};

fn check_pair(a: &Frame, b: &Frame) -> Result<()> {
    if a.format != b.format || (a.width, a.height) != (b.width, b.height) {
        return Err(EdgefixError::FormatMismatch(format!(
            "cannot merge {}x{} {:?} with {}x{} {:?}",
            a.width, a.height, a.format, b.width, b.height, b.format
        )));
    }
    Ok(())
}

/// Take every plane sample from `b` where `mask` holds at the luma position
/// the sample covers.
fn masked_merge(a: &Frame, b: &Frame, planes: &[usize], mask: impl Fn(u32, u32) -> bool) -> Frame {
    a.map_planes(|i, plane| {
        if !planes.contains(&i) {
            return plane.clone();
        }
        let (sw, sh) = a.format.plane_shift(i);
        let mut out = plane.clone();
        for y in 0..plane.height {
            for x in 0..plane.width {
                if mask(x << sw, y << sh) {
                    out.set(x, y, b.planes[i].get(x, y));
                }
            }
        }
        out
    })
}

/// Merge planes of `b` into `a` where the luma of `a` is below `threshold`
/// (at or above it when `invert` is set).
///
/// `threshold` is in 8-bit units when `scale_inputs` is set, otherwise in
/// native sample units.
pub fn luma_mask_merge(
    a: &Frame,
    b: &Frame,
    threshold: i64,
    invert: bool,
    scale_inputs: bool,
    planes: &[usize],
) -> Result<Frame> {
    check_pair(a, b)?;
    if let Some(&bad) = planes.iter().find(|&&p| p >= a.planes.len()) {
        return Err(EdgefixError::invalid(format!("frame has no plane {bad}")));
    }
    let threshold = if scale_inputs {
        scale::scale(threshold, a.format.bits)
    } else {
        threshold
    };
    let luma = a.primary_plane();
    Ok(masked_merge(a, b, planes, |x, y| {
        ((luma.get(x, y) as i64) < threshold) != invert
    }))
}

/// Open intervals on each RGB channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbRange {
    pub red: (i64, i64),
    pub green: (i64, i64),
    pub blue: (i64, i64),
}

impl RgbRange {
    fn contains(&self, rgb: [i64; 3]) -> bool {
        [self.red, self.green, self.blue]
            .iter()
            .zip(rgb)
            .all(|(&(lo, hi), v)| lo < v && v < hi)
    }

    fn scaled(self, bits: u8) -> Self {
        let s = |(lo, hi): (i64, i64)| (scale::scale(lo, bits), scale::scale(hi, bits));
        Self {
            red: s(self.red),
            green: s(self.green),
            blue: s(self.blue),
        }
    }
}

/// Merge every plane of `b` into `a` where the RGB value of `a` lies
/// strictly inside `range`. YUV input is read as limited-range BT.709 with
/// chroma point-sampled. Bounds are in 8-bit units when `scale_inputs` is
/// set.
pub fn rgb_mask_merge(a: &Frame, b: &Frame, range: RgbRange, scale_inputs: bool) -> Result<Frame> {
    check_pair(a, b)?;
    let format = a.format;
    if format.family == ColorFamily::Gray {
        return Err(EdgefixError::UnsupportedFormat("RGB mask merge needs YUV or RGB input".into()));
    }
    let range = if scale_inputs { range.scaled(format.bits) } else { range };
    let (sw, sh) = format.plane_shift(1);
    let rgb = |x: u32, y: u32| -> [i64; 3] {
        let [p0, p1, p2] = [0, 1, 2].map(|i| {
            let (px, py) = if i == 0 { (x, y) } else { (x >> sw, y >> sh) };
            a.planes[i].get(px, py)
        });
        match format.family {
            ColorFamily::Rgb => [p0, p1, p2].map(i64::from),
            _ => bt709_to_rgb(p0, p1, p2, format.bits),
        }
    };
    let planes: Vec<usize> = (0..a.planes.len()).collect();
    Ok(masked_merge(a, b, &planes, |x, y| range.contains(rgb(x, y))))
}

/// Limited-range BT.709 YUV to full-range RGB at the same depth.
fn bt709_to_rgb(y: u16, u: u16, v: u16, bits: u8) -> [i64; 3] {
    let black = scale::black(bits) as f64;
    let luma_range = (scale::white(bits) - scale::black(bits)) as f64;
    let chroma_range = (224u32 << (bits - 8)) as f64;
    let mid = scale::neutral(bits) as f64;

    let yn = (y as f64 - black) / luma_range;
    let cb = (u as f64 - mid) / chroma_range;
    let cr = (v as f64 - mid) / chroma_range;
    let peak = scale::peak(bits) as f64;
    [
        yn + 1.5748 * cr,
        yn - 0.187324 * cb - 0.468124 * cr,
        yn + 1.8556 * cb,
    ]
    .map(|c| (c * peak).round().clamp(0.0, peak) as i64)
}

/// Replace chroma with the neutral level.
pub fn greyscale(frame: &Frame) -> Result<Frame> {
    if frame.format.family != ColorFamily::Yuv {
        return Err(EdgefixError::UnsupportedFormat("greyscale needs YUV input".into()));
    }
    let format = frame.format;
    Ok(frame.map_planes(|i, p| {
        if format.is_chroma(i) {
            Plane::filled(p.width, p.height, format.border_value(i))
        } else {
            p.clone()
        }
    }))
}

/// Raise luma gamma by `adj`, inverting frames whose average luma exceeds
/// `thr` (normalized to `[0, 1]`). Makes banding easy to spot.
pub fn auto_gamma(clip: &Clip, adj: f64, thr: f64) -> Result<Clip> {
    let format = clip.info().format;
    if format.family == ColorFamily::Rgb {
        return Err(EdgefixError::UnsupportedFormat("auto gamma needs GRAY or YUV input".into()));
    }
    if adj < 1.0 {
        return Err(EdgefixError::invalid(format!("gamma adjustment must be at least 1, got {adj}")));
    }
    let src = clip.clone();
    let peak = format.peak() as f64;
    clip.eval_with_stats(*clip.info(), 0, move |n, stats| {
        let frame = src.frame(n)?;
        let invert = stats.average > thr;
        Ok(frame.map_planes(|i, p| {
            if i != 0 {
                return p.clone();
            }
            let mut out = p.clone();
            for v in &mut out.data {
                let g = ((*v as f64 / peak).powf(1.0 / adj) * peak).round();
                let g = if invert { peak - g } else { g };
                *v = g as u16;
            }
            out
        }))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgefix_core::{FrameRate, VideoFormat};

    #[test]
    fn test_luma_mask_merge() {
        let a = Frame::from_fn(4, 2, VideoFormat::YUV420P8, |i, x, _| if i == 0 { x as u16 * 50 } else { 128 }).unwrap();
        let b = Frame::from_fn(4, 2, VideoFormat::YUV420P8, |_, _, _| 7).unwrap();
        let out = luma_mask_merge(&a, &b, 100, false, false, &[0]).unwrap();
        assert_eq!(out.planes[0].row(0), &[7, 7, 100, 150]);
        assert_eq!(out.planes[1], a.planes[1]);

        let inverted = luma_mask_merge(&a, &b, 100, true, false, &[0, 1]).unwrap();
        assert_eq!(inverted.planes[0].row(0), &[0, 50, 7, 7]);
        // Chroma sample (1, 0) follows luma at (2, 0).
        assert_eq!(inverted.planes[1].get(1, 0), 7);
        assert_eq!(inverted.planes[1].get(0, 0), 128);
    }

    #[test]
    fn test_rgb_mask_merge_yuv() {
        // (63, 102, 240) is BT.709 red, the rest mid grey.
        let a = Frame::from_fn(4, 2, VideoFormat::YUV444P8, |i, x, y| match (x, y, i) {
            (0, 0, 0) => 63,
            (0, 0, 1) => 102,
            (0, 0, _) => 240,
            (_, _, 0) => 126,
            _ => 128,
        })
        .unwrap();
        let b = Frame::from_fn(4, 2, VideoFormat::YUV444P8, |_, _, _| 9).unwrap();
        let reds = RgbRange {
            red: (200, 256),
            green: (-1, 50),
            blue: (-1, 50),
        };
        let out = rgb_mask_merge(&a, &b, reds, false).unwrap();
        for i in 0..3 {
            assert_eq!(out.planes[i].get(0, 0), 9);
            assert_eq!(out.planes[i].get(1, 0), a.planes[i].get(1, 0));
            assert_eq!(out.planes[i].get(3, 1), a.planes[i].get(3, 1));
        }
        let greys = RgbRange {
            red: (100, 150),
            green: (100, 150),
            blue: (100, 150),
        };
        let out = rgb_mask_merge(&a, &b, greys, true).unwrap();
        assert_eq!(out.planes[0].get(0, 0), 63);
        assert_eq!(out.planes[0].get(2, 1), 9);
    }

    #[test]
    fn test_rgb_mask_merge_rgb_input() {
        let a = Frame::from_fn(2, 1, VideoFormat::RGB24, |i, x, _| match (x, i) {
            (0, 0) => 250,
            (0, _) => 10,
            _ => 128,
        })
        .unwrap();
        let b = Frame::from_fn(2, 1, VideoFormat::RGB24, |_, _, _| 0).unwrap();
        let range = RgbRange {
            red: (240, 256),
            green: (0, 20),
            blue: (0, 20),
        };
        let out = rgb_mask_merge(&a, &b, range, false).unwrap();
        assert_eq!(out.planes[0].data, vec![0, 128]);
        assert_eq!(out.planes[2].data, vec![0, 128]);

        let gray = Frame::new(2, 1, VideoFormat::GRAY8).unwrap();
        let err = rgb_mask_merge(&gray, &gray, range, false).unwrap_err();
        assert!(matches!(err, EdgefixError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_greyscale() {
        let frame = Frame::test_pattern(8, 8, VideoFormat::YUV420P10).unwrap();
        let grey = greyscale(&frame).unwrap();
        assert!(grey.planes[2].data.iter().all(|&v| v == 513));
        assert_eq!(grey.planes[0], frame.planes[0]);
        assert!(greyscale(&Frame::new(8, 8, VideoFormat::RGB24).unwrap()).is_err());
    }

    #[test]
    fn test_auto_gamma_inverts_bright_frames() {
        let dark = Frame::from_fn(4, 4, VideoFormat::GRAY8, |_, _, _| 20).unwrap();
        let bright = Frame::from_fn(4, 4, VideoFormat::GRAY8, |_, _, _| 200).unwrap();
        let clip = Clip::from_frames(vec![dark, bright], FrameRate::FPS_24).unwrap();
        let out = auto_gamma(&clip, 1.0, 0.4).unwrap();
        assert_eq!(out.frame(0).unwrap().planes[0].get(0, 0), 20);
        assert_eq!(out.frame(1).unwrap().planes[0].get(0, 0), 55);
        assert!(auto_gamma(&clip, 0.5, 0.4).is_err());
    }
}
