//! Separable resampling with fractional source windows.

use std::borrow::Cow;
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use fast_image_resize as fir;
use fir::images::{TypedImage, TypedImageRef};
use fir::pixels::F32;
use fir::{Filter, FilterType, ResizeAlg, ResizeOptions, Resizer};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use edgefix_core::{EdgefixError, Frame, Plane, Result, SourceWindow};

/// Resize kernel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ResizeKernel {
    Point,
    Bilinear,
    /// Mitchell-Netravali cubic with parameters `b` and `c`
    Bicubic { b: f64, c: f64 },
    Lanczos { taps: u32 },
    Spline16,
    Spline36,
}

impl Default for ResizeKernel {
    fn default() -> Self {
        Self::Spline36
    }
}

impl ResizeKernel {
    /// B-spline cubic used for the balancing blur.
    pub const BSPLINE: Self = Self::Bicubic { b: 1.0, c: 0.0 };

    /// Resolve a kernel by name. `param_a`/`param_b` are `b`/`c` for bicubic
    /// and `taps` (in `param_a`) for lanczos.
    pub fn from_name(name: &str, param_a: Option<f64>, param_b: Option<f64>) -> Result<Self> {
        let kernel = match name.to_ascii_lowercase().as_str() {
            "point" => Self::Point,
            "bilinear" => Self::Bilinear,
            "bicubic" => Self::Bicubic {
                b: param_a.unwrap_or(0.0),
                c: param_b.unwrap_or(0.5),
            },
            "lanczos" => {
                let taps = param_a.unwrap_or(3.0);
                if taps < 1.0 || taps.fract() != 0.0 {
                    return Err(EdgefixError::invalid(format!("lanczos taps must be a positive integer, got {taps}")));
                }
                Self::Lanczos { taps: taps as u32 }
            }
            "spline16" => Self::Spline16,
            "spline36" => Self::Spline36,
            _ => {
                return Err(EdgefixError::invalid(format!("resizer \"{name}\" unknown")));
            }
        };
        Ok(kernel)
    }

    /// Half-width of the kernel at unit scale.
    pub fn support(&self) -> f64 {
        match self {
            Self::Point => 0.5,
            Self::Bilinear => 1.0,
            Self::Bicubic { .. } | Self::Spline16 => 2.0,
            Self::Lanczos { taps } => *taps as f64,
            Self::Spline36 => 3.0,
        }
    }

    /// Kernel weight at distance `x`.
    pub fn weight(&self, x: f64) -> f64 {
        match *self {
            Self::Point => {
                if x.abs() <= 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Bilinear => (1.0 - x.abs()).max(0.0),
            Self::Bicubic { b, c } => cubic(x, b, c),
            Self::Lanczos { taps } => lanczos(x, taps as f64),
            Self::Spline16 => spline16(x),
            Self::Spline36 => spline36(x),
        }
    }

    /// How `fast_image_resize` runs this kernel. `None` for the cubics and
    /// lanczos tap counts it has no filter for.
    fn algorithm(&self) -> Option<ResizeAlg> {
        let custom = |name, func: fn(f64) -> f64| {
            Filter::new(name, func, self.support())
                .ok()
                .map(FilterType::Custom)
        };
        let filter = match *self {
            Self::Point => return Some(ResizeAlg::Nearest),
            Self::Bilinear => FilterType::Bilinear,
            Self::Bicubic { b, c } if b == 0.0 && c == 0.5 => FilterType::CatmullRom,
            Self::Bicubic { b, c } if b == 1.0 / 3.0 && c == 1.0 / 3.0 => FilterType::Mitchell,
            Self::Bicubic { b, c } if b == 1.0 && c == 0.0 => custom("bspline", bspline)?,
            Self::Bicubic { .. } => return None,
            Self::Lanczos { taps: 3 } => FilterType::Lanczos3,
            Self::Lanczos { .. } => return None,
            Self::Spline16 => custom("spline16", spline16)?,
            Self::Spline36 => custom("spline36", spline36)?,
        };
        Some(ResizeAlg::Convolution(filter))
    }
}

impl FromStr for ResizeKernel {
    type Err = EdgefixError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s, None, None)
    }
}

impl fmt::Display for ResizeKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Point => write!(f, "point"),
            Self::Bilinear => write!(f, "bilinear"),
            Self::Bicubic { b, c } => write!(f, "bicubic(b={b}, c={c})"),
            Self::Lanczos { taps } => write!(f, "lanczos({taps})"),
            Self::Spline16 => write!(f, "spline16"),
            Self::Spline36 => write!(f, "spline36"),
        }
    }
}

/// Mitchell-Netravali cubic.
fn cubic(x: f64, b: f64, c: f64) -> f64 {
    let x = x.abs();
    if x < 1.0 {
        ((12.0 - 9.0 * b - 6.0 * c) * x * x * x + (-18.0 + 12.0 * b + 6.0 * c) * x * x + (6.0 - 2.0 * b))
            / 6.0
    } else if x < 2.0 {
        ((-b - 6.0 * c) * x * x * x + (6.0 * b + 30.0 * c) * x * x + (-12.0 * b - 48.0 * c) * x
            + (8.0 * b + 24.0 * c))
            / 6.0
    } else {
        0.0
    }
}

fn bspline(x: f64) -> f64 {
    cubic(x, 1.0, 0.0)
}

fn lanczos(x: f64, taps: f64) -> f64 {
    let x = x.abs();
    if x < taps {
        sinc(x) * sinc(x / taps)
    } else {
        0.0
    }
}

fn spline16(x: f64) -> f64 {
    let x = x.abs();
    if x < 1.0 {
        ((x - 9.0 / 5.0) * x - 1.0 / 5.0) * x + 1.0
    } else if x < 2.0 {
        let x = x - 1.0;
        ((-1.0 / 3.0 * x + 4.0 / 5.0) * x - 7.0 / 15.0) * x
    } else {
        0.0
    }
}

fn spline36(x: f64) -> f64 {
    let x = x.abs();
    if x < 1.0 {
        ((13.0 / 11.0 * x - 453.0 / 209.0) * x - 3.0 / 209.0) * x + 1.0
    } else if x < 2.0 {
        let x = x - 1.0;
        ((-6.0 / 11.0 * x + 270.0 / 209.0) * x - 156.0 / 209.0) * x
    } else if x < 3.0 {
        let x = x - 2.0;
        ((1.0 / 11.0 * x - 45.0 / 209.0) * x + 26.0 / 209.0) * x
    } else {
        0.0
    }
}

fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        let px = PI * x;
        px.sin() / px
    }
}

/// Kernel-based resize service.
pub trait Resampler: Send + Sync {
    /// Resize `frame` to `width` x `height`, sampling from `window` (luma pixels).
    fn resample(
        &self,
        frame: &Frame,
        width: u32,
        height: u32,
        window: SourceWindow,
        kernel: &ResizeKernel,
    ) -> Result<Frame>;
}

/// Separable CPU resampler on top of `fast_image_resize`.
///
/// Taps outside the plane see the nearest edge sample; the kernel is widened
/// by the reduction factor when downscaling. Subsampled planes use the
/// window scaled by their subsampling.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuResampler;

impl Resampler for CpuResampler {
    fn resample(
        &self,
        frame: &Frame,
        width: u32,
        height: u32,
        window: SourceWindow,
        kernel: &ResizeKernel,
    ) -> Result<Frame> {
        frame.format.check_dimensions(width, height)?;
        if !(window.width > 0.0 && window.height > 0.0) {
            return Err(EdgefixError::invalid(format!("empty source window {window:?}")));
        }
        let peak = frame.format.peak();
        frame.try_map_planes(|i, plane| {
            let (sw, sh) = frame.format.plane_shift(i);
            resample_plane(
                plane,
                width >> sw,
                height >> sh,
                window.subsampled(sw, sh),
                kernel,
                peak,
            )
        })
    }
}

/// Resize one plane, rounding and clamping to `[0, peak]`.
pub fn resample_plane(
    src: &Plane,
    dst_w: u32,
    dst_h: u32,
    window: SourceWindow,
    kernel: &ResizeKernel,
    peak: u16,
) -> Result<Plane> {
    let data: Vec<f32> = src.data.iter().map(|&v| v as f32).collect();
    let out = resample_f32(&data, src.width, src.height, dst_w, dst_h, window, kernel)?;
    let peak = peak as f32;
    Ok(Plane {
        data: out.iter().map(|&v| v.round().clamp(0.0, peak) as u16).collect(),
        width: dst_w,
        height: dst_h,
    })
}

/// Resize a row-major f32 buffer. Axes whose size and window are unchanged
/// are passed through untouched.
pub fn resample_f32(
    src: &[f32],
    src_w: u32,
    src_h: u32,
    dst_w: u32,
    dst_h: u32,
    window: SourceWindow,
    kernel: &ResizeKernel,
) -> Result<Vec<f32>> {
    let axes = Axes {
        x: dst_w != src_w || window.left != 0.0 || window.width != src_w as f64,
        y: dst_h != src_h || window.top != 0.0 || window.height != src_h as f64,
    };
    if !axes.x && !axes.y {
        return Ok(src.to_vec());
    }
    let src = Buffer { data: src, width: src_w, height: src_h };
    match kernel.algorithm() {
        Some(alg) => resize_fir(alg, kernel.support(), src, dst_w, dst_h, window, axes),
        None => Ok(resize_generic(kernel, src, dst_w, dst_h, window, axes)),
    }
}

/// Which axes are resampled.
#[derive(Debug, Clone, Copy)]
struct Axes {
    x: bool,
    y: bool,
}

#[derive(Debug, Clone, Copy)]
struct Buffer<'a> {
    data: &'a [f32],
    width: u32,
    height: u32,
}

fn resample_error(e: impl fmt::Display) -> EdgefixError {
    EdgefixError::Resample(e.to_string())
}

/// Resample through `fast_image_resize`. The plane is first extended by
/// edge replication so that no tap falls outside the image, which keeps
/// border samples weighted the same as interior ones.
fn resize_fir(
    alg: ResizeAlg,
    support: f64,
    src: Buffer<'_>,
    dst_w: u32,
    dst_h: u32,
    window: SourceWindow,
    axes: Axes,
) -> Result<Vec<f32>> {
    let margin = |resampled: bool, extent: f64, dst: u32| {
        if resampled {
            (support * (extent / dst as f64).max(1.0)).ceil() as u32 + 1
        } else {
            0
        }
    };
    let pad_x = margin(axes.x, window.width, dst_w);
    let pad_y = margin(axes.y, window.height, dst_h);
    let padded = pad_edges(src, pad_x, pad_y);

    let mut out = vec![0.0f32; dst_w as usize * dst_h as usize];
    {
        let src_image = TypedImageRef::<F32>::from_buffer(
            src.width + 2 * pad_x,
            src.height + 2 * pad_y,
            bytemuck::cast_slice(&padded),
        )
        .map_err(resample_error)?;
        let mut dst_image = TypedImage::<F32>::from_buffer(dst_w, dst_h, bytemuck::cast_slice_mut(&mut out))
            .map_err(resample_error)?;
        let options = ResizeOptions::new().resize_alg(alg).crop(
            window.left + pad_x as f64,
            window.top + pad_y as f64,
            window.width,
            window.height,
        );
        Resizer::new()
            .resize_typed::<F32>(&src_image, &mut dst_image, &options)
            .map_err(resample_error)?;
    }
    Ok(out)
}

/// Copy of `src` with `pad_x` columns and `pad_y` rows of edge samples
/// added on every side.
fn pad_edges(src: Buffer<'_>, pad_x: u32, pad_y: u32) -> Cow<'_, [f32]> {
    if pad_x == 0 && pad_y == 0 {
        return Cow::Borrowed(src.data);
    }
    let (w, h) = (src.width as i64, src.height as i64);
    let (px, py) = (pad_x as i64, pad_y as i64);
    let data = (-py..h + py)
        .flat_map(|y| {
            let row = &src.data[(y.clamp(0, h - 1) * w) as usize..][..w as usize];
            (-px..w + px).map(move |x| row[x.clamp(0, w - 1) as usize])
        })
        .collect();
    Cow::Owned(data)
}

/// Separable filter-bank resample for kernels `fast_image_resize` cannot
/// express, such as arbitrary `b`/`c` cubics.
fn resize_generic(
    kernel: &ResizeKernel,
    src: Buffer<'_>,
    dst_w: u32,
    dst_h: u32,
    window: SourceWindow,
    axes: Axes,
) -> Vec<f32> {
    let (sw, sh) = (src.width as usize, src.height as usize);
    let (dw, dh) = (dst_w as usize, dst_h as usize);

    let horizontal = if axes.x {
        let bank = FilterBank::new(kernel, sw, dw, window.left, window.width);
        let mut out = vec![0.0f32; dw * sh];
        out.par_chunks_mut(dw.max(1))
            .zip(src.data.par_chunks(sw.max(1)))
            .for_each(|(dst_row, src_row)| {
                for (x, d) in dst_row.iter_mut().enumerate() {
                    *d = bank.apply(x, |j| src_row[j]);
                }
            });
        out
    } else {
        src.data.to_vec()
    };

    if !axes.y {
        return horizontal;
    }
    let bank = FilterBank::new(kernel, sh, dh, window.top, window.height);
    let mut out = vec![0.0f32; dw * dh];
    out.par_chunks_mut(dw.max(1))
        .enumerate()
        .for_each(|(y, dst_row)| {
            for (x, d) in dst_row.iter_mut().enumerate() {
                *d = bank.apply(y, |j| horizontal[j * dw + x]);
            }
        });
    out
}

/// Precomputed taps for one axis.
struct FilterBank {
    /// Per output sample: (clamped source index, normalized weight)
    taps: Vec<Vec<(usize, f32)>>,
}

impl FilterBank {
    fn new(kernel: &ResizeKernel, src_len: usize, dst_len: usize, origin: f64, extent: f64) -> Self {
        let step = extent / dst_len as f64;
        let last = src_len.saturating_sub(1) as i64;
        let clamp = |j: i64| j.clamp(0, last) as usize;
        // Widen the kernel when reducing.
        let filter_scale = (1.0 / step).min(1.0);
        let support = kernel.support() / filter_scale;

        let taps = (0..dst_len)
            .map(|i| {
                let pos = origin + (i as f64 + 0.5) * step - 0.5;
                let first = (pos - support).ceil() as i64;
                let end = (pos + support).floor() as i64;
                let mut row: Vec<(usize, f64)> = (first..=end)
                    .map(|j| (clamp(j), kernel.weight((j as f64 - pos) * filter_scale)))
                    .filter(|&(_, w)| w != 0.0)
                    .collect();
                let sum: f64 = row.iter().map(|&(_, w)| w).sum();
                if sum.abs() < 1e-12 {
                    row = vec![(clamp(pos.round() as i64), 1.0)];
                } else {
                    for tap in &mut row {
                        tap.1 /= sum;
                    }
                }
                row.into_iter().map(|(j, w)| (j, w as f32)).collect()
            })
            .collect();
        Self { taps }
    }

    #[inline]
    fn apply(&self, i: usize, sample: impl Fn(usize) -> f32) -> f32 {
        self.taps[i].iter().map(|&(j, w)| sample(j) * w).sum()
    }
}
