//! Crop, fill, balance and resize as one transform.
//!
//! Cropping only ever removes even amounts. An odd crop leaves one extra line
//! that is filled from its neighbour instead, and the resampler is handed a
//! source window starting at the true (odd) crop edge, so the output samples
//! the same positions a direct fractional crop would.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use edgefix_core::{Clip, ClipInfo, ColorFamily, EdgefixError, Edges, Frame, Result, SourceWindow, VideoFormat};

use crate::balance::{balance, BalanceParams};
use crate::resample::ResizeKernel;
use crate::services::Services;

/// Frame transform: `(frame) -> frame`.
pub type FrameFn = Arc<dyn Fn(&Frame) -> Result<Frame> + Send + Sync>;

/// Resize transform: `(frame, width, height, window) -> frame`.
pub type ResizeFn = Arc<dyn Fn(&Frame, u32, u32, SourceWindow) -> Result<Frame> + Send + Sync>;

/// Extra filling of the chroma planes after the crop.
#[derive(Clone)]
pub enum ChromaFill {
    /// Fill these amounts (luma pixels) on chroma only.
    Edges(Edges<u32>),
    /// Arbitrary transform of the cropped frame.
    Custom(FrameFn),
}

impl fmt::Debug for ChromaFill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Edges(e) => f.debug_tuple("Edges").field(e).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Resize step: a named kernel through the resampler service, or a custom
/// transform.
#[derive(Clone)]
pub enum Resize {
    Kernel(ResizeKernel),
    Custom(ResizeFn),
}

impl Resize {
    /// Resolve a kernel by (case-insensitive) name.
    pub fn named(name: &str, param_a: Option<f64>, param_b: Option<f64>) -> Result<Self> {
        ResizeKernel::from_name(name, param_a, param_b).map(Self::Kernel)
    }
}

impl Default for Resize {
    fn default() -> Self {
        Self::Kernel(ResizeKernel::Spline36)
    }
}

impl fmt::Debug for Resize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kernel(k) => write!(f, "Kernel({k})"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Parameters for [`CropResize`].
#[derive(Debug, Clone, Default)]
pub struct CropResizeParams {
    /// Output width; derived from `height` when omitted
    pub width: Option<u32>,
    /// Output height; derived from `width` when omitted
    pub height: Option<u32>,
    pub crop: Edges<u32>,
    /// Part of each crop to fill instead of removing
    pub fill: Edges<u32>,
    pub chroma_fill: Option<ChromaFill>,
    /// Band thicknesses are measured from the true crop edge.
    pub balance: Option<BalanceParams>,
    pub resize: Resize,
}

/// Geometry resolved from [`CropResizeParams`] for a given input size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropResizePlan {
    /// Even amounts actually cropped
    pub crop: Edges<u32>,
    /// Parity remainder plus requested fill, filled after cropping
    pub fill: Edges<u32>,
    /// Balance thickness per edge of the cropped frame
    pub balance: Option<Edges<u32>>,
    /// Source window in the cropped frame
    pub window: SourceWindow,
    pub width: u32,
    pub height: u32,
}

impl CropResizePlan {
    /// Resolve the geometry for a `width` x `height` input.
    pub fn compute(width: u32, height: u32, format: VideoFormat, params: &CropResizeParams) -> Result<Self> {
        let (crop, fill) = (params.crop, params.fill);
        let exceeds = crop.zip(fill, |c, f| f > c).to_array().iter().any(|&b| b);
        if exceeds {
            return Err(EdgefixError::invalid(format!(
                "fill {:?} exceeds crop {:?}",
                fill.to_array(),
                crop.to_array()
            )));
        }
        let effective = crop.zip(fill, |c, f| c - f);
        if effective.horizontal() >= width || effective.vertical() >= height {
            return Err(EdgefixError::invalid(format!(
                "crop {:?} leaves nothing of {width}x{height}",
                effective.to_array()
            )));
        }
        let remainder = effective.map(|v| v % 2);
        let even = effective.zip(remainder, |e, r| e - r);
        let filled = remainder.zip(fill, |r, f| r + f);

        let cropped_w = width - even.horizontal();
        let cropped_h = height - even.vertical();
        if filled.horizontal() >= cropped_w || filled.vertical() >= cropped_h {
            return Err(EdgefixError::invalid(format!(
                "fill {:?} leaves nothing of the {cropped_w}x{cropped_h} crop",
                filled.to_array()
            )));
        }

        let window_w = (width - effective.horizontal()) as f64;
        let window_h = (height - effective.vertical()) as f64;
        let (rw, rh) = match (params.width, params.height) {
            (None, None) => (1.0, 1.0),
            (Some(w), None) => {
                let r = w as f64 / window_w;
                (r, r)
            }
            (None, Some(h)) => {
                let r = h as f64 / window_h;
                (r, r)
            }
            (Some(w), Some(h)) => (w as f64 / width as f64, h as f64 / height as f64),
        };
        let out_w = round_even(window_w * rw);
        let out_h = round_even(window_h * rh);
        format.check_dimensions(out_w, out_h)?;

        let balance = match params.balance {
            Some(b) => {
                b.validate()?;
                Some(b.edges.zip(filled, |t, f| t + f))
            }
            None => None,
        };

        Ok(Self {
            crop: even,
            fill: filled,
            balance,
            window: SourceWindow::new(
                remainder.left as f64,
                remainder.top as f64,
                window_w,
                window_h,
            ),
            width: out_w,
            height: out_h,
        })
    }
}

/// Round to the nearest even integer, ties to even.
#[inline]
pub fn round_even(v: f64) -> u32 {
    ((v / 2.0).round_ties_even() * 2.0).max(0.0) as u32
}

/// The crop/fill/resize transform, validated against one input shape.
#[derive(Debug, Clone)]
pub struct CropResize {
    input: ClipInfo,
    plan: CropResizePlan,
    params: CropResizeParams,
    services: Services,
}

impl CropResize {
    pub fn new(input: ClipInfo, params: CropResizeParams, services: Services) -> Result<Self> {
        let plan = CropResizePlan::compute(input.width, input.height, input.format, &params)?;
        if let Some(ChromaFill::Edges(_)) = params.chroma_fill {
            if input.format.family != ColorFamily::Yuv {
                return Err(EdgefixError::invalid("chroma fill needs a YUV clip"));
            }
        }
        debug!(
            crop = ?plan.crop.to_array(),
            fill = ?plan.fill.to_array(),
            width = plan.width,
            height = plan.height,
            "crop/resize plan"
        );
        Ok(Self {
            input,
            plan,
            params,
            services,
        })
    }

    pub fn plan(&self) -> &CropResizePlan {
        &self.plan
    }

    /// Metadata of the transformed clip.
    pub fn output_info(&self) -> ClipInfo {
        self.input.with_size(self.plan.width, self.plan.height)
    }

    pub fn apply(&self, frame: &Frame) -> Result<Frame> {
        let plan = &self.plan;
        let all_planes: Vec<usize> = (0..frame.planes.len()).collect();

        let mut out = if plan.crop.is_zero() {
            frame.clone()
        } else {
            frame.crop(plan.crop.left, plan.crop.right, plan.crop.top, plan.crop.bottom)?
        };
        if !plan.fill.is_zero() {
            out = self.services.edge_fill.fill(&out, plan.fill, &all_planes)?;
        }
        match &self.params.chroma_fill {
            Some(ChromaFill::Edges(edges)) => {
                out = self.services.edge_fill.fill(&out, *edges, &[1, 2])?;
            }
            Some(ChromaFill::Custom(f)) => out = f(&out)?,
            None => {}
        }
        if let (Some(params), Some(edges)) = (self.params.balance, plan.balance) {
            out = balance(&out, &BalanceParams { edges, ..params })?;
        }

        if plan.window.is_full(out.width, out.height) && (out.width, out.height) == (plan.width, plan.height) {
            return Ok(out);
        }
        match &self.params.resize {
            Resize::Kernel(kernel) => {
                self.services
                    .resampler
                    .resample(&out, plan.width, plan.height, plan.window, kernel)
            }
            Resize::Custom(f) => f(&out, plan.width, plan.height, plan.window),
        }
    }

    /// Apply to every frame of `clip`, which must match the shape this
    /// transform was built for.
    pub fn apply_clip(self, clip: &Clip) -> Result<Clip> {
        if !clip.info().same_shape(&self.input) {
            return Err(EdgefixError::FormatMismatch(format!(
                "crop/resize built for {:?}, got {:?}",
                self.input,
                clip.info()
            )));
        }
        let info = self.output_info();
        Ok(clip.map(info, move |f| self.apply(f)))
    }
}

/// Build and apply a [`CropResize`] in one step.
pub fn crop_resize(clip: &Clip, params: CropResizeParams, services: &Services) -> Result<Clip> {
    CropResize::new(*clip.info(), params, services.clone())?.apply_clip(clip)
}
