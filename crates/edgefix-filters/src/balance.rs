//! Border balancing: recolor thin edge bands to match the clean interior.
//!
//! Each band is compared against a reference built by stretching the lines
//! just inside the band boundary over the band. Both are blurred along the
//! edge, and the band is rescaled by the ratio of the two blurs. Luma is
//! scaled around black, chroma around its neutral level. The per-sample
//! change is clamped to the threshold, so no output sample moves further than
//! `scale(threshold, bits)` from its input.
//!
//! All work happens at twice the plane resolution so that band edges on
//! subsampled planes can fall on half-sample boundaries.

use serde::{Deserialize, Serialize};
use tracing::debug;

use edgefix_core::{scale, Clip, Edge, EdgefixError, Edges, Frame, Plane, Result, SourceWindow};

use crate::orient::{orient, oriented_shift, restore};
use crate::resample::{resample_f32, ResizeKernel};

const RATIO_MIN: f32 = 0.4;
const RATIO_MAX: f32 = 8.0;
/// Smallest denominator magnitude used for ratios.
const RATIO_EPS: f32 = 1e-3;

/// Parameters for border balancing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalanceParams {
    /// Band thickness per edge in luma pixels
    pub edges: Edges<u32>,
    /// Largest per-sample change, in 8-bit units
    pub threshold: i64,
    /// Divisor of the edge length giving the blur width; 1 matches each
    /// sample locally, large values flatten the band to one color.
    pub blur: u32,
}

impl Default for BalanceParams {
    fn default() -> Self {
        Self {
            edges: Edges::default(),
            threshold: 128,
            blur: 999,
        }
    }
}

impl BalanceParams {
    /// Default threshold and blur for the given thicknesses.
    pub fn new(edges: Edges<u32>) -> Self {
        Self {
            edges,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.threshold <= 0 {
            return Err(EdgefixError::invalid(format!(
                "balance threshold must be positive, got {}",
                self.threshold
            )));
        }
        if self.blur == 0 {
            return Err(EdgefixError::invalid("balance blur must be positive"));
        }
        Ok(())
    }

    /// Thickness of `edge` clamped to the frame.
    fn thickness(&self, edge: Edge, width: u32, height: u32) -> u32 {
        let dim = if edge.is_horizontal() { height } else { width };
        self.edges.get(edge).min(dim.saturating_sub(1))
    }
}

/// Balance all four edges of `frame`, top, left, bottom then right. Each
/// edge sees the output of the previous one.
pub fn balance(frame: &Frame, params: &BalanceParams) -> Result<Frame> {
    params.validate()?;
    let mut out = frame.clone();
    for edge in Edge::BALANCE_ORDER {
        let t = params.thickness(edge, out.width, out.height);
        if t == 0 {
            continue;
        }
        out = balance_edge(&out, edge, t, params)?;
    }
    Ok(limit_change(frame, out, params.threshold))
}

/// Corners belong to two bands; keep their total change within the threshold.
fn limit_change(input: &Frame, mut output: Frame, threshold: i64) -> Frame {
    let limit = scale::scale(threshold, input.format.bits);
    for (src, dst) in input.planes.iter().zip(output.planes.iter_mut()) {
        for (&a, b) in src.data.iter().zip(dst.data.iter_mut()) {
            let a = a as i64;
            *b = (*b as i64).clamp(a - limit, a + limit) as u16;
        }
    }
    output
}

/// Balance one edge band of thickness `t`.
fn balance_edge(frame: &Frame, edge: Edge, t: u32, params: &BalanceParams) -> Result<Frame> {
    let format = frame.format;
    let edge_len = if edge.is_horizontal() {
        frame.width
    } else {
        frame.height
    };
    let blur_width = (edge_len / params.blur).max(8);
    let limit = scale::scale(params.threshold, format.bits) as f32;
    debug!(?edge, thickness = t, blur_width, "balancing edge");

    frame.try_map_planes(|i, plane| {
        let (along, across) = oriented_shift(format.plane_shift(i), edge);
        let band = BandGeometry {
            rows: (2 * t) >> across,
            seed_rows: (2u32 >> across).max(1),
            coarse_width: ((2 * blur_width) >> along).max(1),
        };
        let anchor = Anchor {
            level: format.border_value(i) as f32,
            chroma: format.is_chroma(i),
        };
        let oriented = orient(plane, edge);
        let fixed = balance_top(&oriented, band, anchor, limit, format.peak())?;
        Ok(restore(&fixed, edge))
    })
}

/// Band layout in the doubled domain of one plane.
#[derive(Debug, Clone, Copy)]
struct BandGeometry {
    rows: u32,
    seed_rows: u32,
    coarse_width: u32,
}

/// Reference point the band is scaled around.
#[derive(Debug, Clone, Copy)]
struct Anchor {
    level: f32,
    chroma: bool,
}

/// Balance the top band of one plane.
fn balance_top(
    plane: &Plane,
    band: BandGeometry,
    anchor: Anchor,
    limit: f32,
    peak: u16,
) -> Result<Plane> {
    let width = plane.width as usize * 2;
    let seed_rows = band.seed_rows as usize;
    let rows = (band.rows as usize).min((plane.height as usize * 2).saturating_sub(seed_rows));
    if rows == 0 {
        return Ok(plane.clone());
    }

    // Nearest-neighbour 2x upsample of the rows we need.
    let doubled: Vec<f32> = (0..rows + seed_rows)
        .flat_map(|k| {
            plane
                .row((k / 2) as u32)
                .iter()
                .flat_map(|&v| [v as f32, v as f32])
        })
        .collect();
    let original = &doubled[..rows * width];
    let seed = &doubled[rows * width..];
    let reference: Vec<f32> = (0..rows)
        .flat_map(|i| {
            let s = i * seed_rows / rows;
            seed[s * width..(s + 1) * width].iter().copied()
        })
        .collect();

    let blur = |buf: &[f32]| blur_rows(buf, width as u32, rows as u32, band.coarse_width);
    let corrected: Vec<f32> = if anchor.chroma {
        let magnitude = |buf: &[f32]| -> Vec<f32> {
            buf.iter().map(|&v| 2.0 * (v - anchor.level).abs()).collect()
        };
        let ref_mag = blur(&magnitude(&reference))?;
        let orig_mag = blur(&magnitude(original))?;
        let ref_raw = blur(&reference)?;
        let orig_raw = blur(original)?;
        original
            .iter()
            .enumerate()
            .map(|(k, &v)| {
                let ratio = (ref_mag[k] / orig_mag[k].max(RATIO_EPS)).clamp(RATIO_MIN, RATIO_MAX);
                ratio * (v - anchor.level) + anchor.level + ref_raw[k] - orig_raw[k]
            })
            .collect()
    } else {
        let ref_blur = blur(&reference)?;
        let orig_blur = blur(original)?;
        original
            .iter()
            .enumerate()
            .map(|(k, &v)| {
                // Bands below black keep their sign.
                let d = orig_blur[k] - anchor.level;
                let den = if d.abs() >= RATIO_EPS { d } else { RATIO_EPS.copysign(d) };
                let ratio = ((ref_blur[k] - anchor.level) / den).clamp(RATIO_MIN, RATIO_MAX);
                ratio * (v - anchor.level) + anchor.level
            })
            .collect()
    };

    // Clamp the change, then downsample by taking every other sample.
    let mut out = plane.clone();
    let peak = peak as f32;
    for y in 0..(rows as u32).div_ceil(2) {
        let k = 2 * y as usize * width;
        for (x, dst) in out.row_mut(y).iter_mut().enumerate() {
            let v = original[k + 2 * x];
            let diff = (corrected[k + 2 * x] - v).clamp(-limit, limit);
            *dst = (v + diff).round().clamp(0.0, peak) as u16;
        }
    }
    Ok(out)
}

/// Blur each row: B-spline reduce to `coarse_width` samples and back.
fn blur_rows(buf: &[f32], width: u32, rows: u32, coarse_width: u32) -> Result<Vec<f32>> {
    let kernel = ResizeKernel::BSPLINE;
    let coarse = resample_f32(
        buf,
        width,
        rows,
        coarse_width,
        rows,
        SourceWindow::full(width, rows),
        &kernel,
    )?;
    resample_f32(
        &coarse,
        coarse_width,
        rows,
        width,
        rows,
        SourceWindow::full(coarse_width, rows),
        &kernel,
    )
}

/// Balance only the outer strips of each requested side and paste them
/// back. Strips are `max(2t, 4)` luma pixels deep; left and right are
/// processed before top and bottom.
pub fn balance_strips(input: &Frame, params: &BalanceParams) -> Result<Frame> {
    params.validate()?;
    let mut frame = input.clone();
    for edge in [Edge::Left, Edge::Right, Edge::Top, Edge::Bottom] {
        let t = params.thickness(edge, frame.width, frame.height);
        if t == 0 {
            continue;
        }
        let dim = if edge.is_horizontal() {
            frame.height
        } else {
            frame.width
        };
        let depth = (2 * t).max(4);
        if depth >= dim {
            frame = balance_edge(&frame, edge, t, params)?;
            continue;
        }
        let (w, h) = (frame.width, frame.height);
        let (x, y, crop) = match edge {
            Edge::Left => (0, 0, Edges::new(0, w - depth, 0, 0)),
            Edge::Right => (w - depth, 0, Edges::new(w - depth, 0, 0, 0)),
            Edge::Top => (0, 0, Edges::new(0, 0, 0, h - depth)),
            Edge::Bottom => (0, h - depth, Edges::new(0, 0, h - depth, 0)),
        };
        let strip = frame.crop(crop.left, crop.right, crop.top, crop.bottom)?;
        let strip = balance_edge(&strip, edge, t, params)?;
        frame = paste(&frame, &strip, x, y);
    }
    Ok(limit_change(input, frame, params.threshold))
}

/// Copy `patch` over `frame` at luma position `(x, y)`.
fn paste(frame: &Frame, patch: &Frame, x: u32, y: u32) -> Frame {
    frame.map_planes(|i, plane| {
        let (sw, sh) = frame.format.plane_shift(i);
        let src = &patch.planes[i];
        let (px, py) = (x >> sw, y >> sh);
        let mut out = plane.clone();
        for row in 0..src.height {
            let dst = out.row_mut(py + row);
            dst[px as usize..(px + src.width) as usize].copy_from_slice(src.row(row));
        }
        out
    })
}

/// Balance every frame of `clip`. Parameters are validated up front.
pub fn balance_clip(clip: &Clip, params: BalanceParams) -> Result<Clip> {
    params.validate()?;
    if params.edges.is_zero() {
        return Ok(clip.clone());
    }
    Ok(clip.map_same(move |f| balance(f, &params)))
}
