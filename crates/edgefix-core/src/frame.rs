//! Planar frame buffers with integer samples.
//!
//! Every plane stores `u16` samples regardless of bit depth, so the same code
//! paths serve 8, 10 and 16-bit material.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{EdgefixError, Result};
use crate::scale;

/// Channel family of a video format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorFamily {
    /// Single luma plane.
    Gray,
    /// Luma plus two chroma planes.
    Yuv,
    /// Three full-resolution RGB planes.
    Rgb,
}

/// Sample layout of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoFormat {
    pub family: ColorFamily,
    /// Bits per sample (8, 10 or 16)
    pub bits: u8,
    /// Horizontal chroma subsampling as a log2 shift
    pub subsampling_w: u8,
    /// Vertical chroma subsampling as a log2 shift
    pub subsampling_h: u8,
}

impl VideoFormat {
    /// Create a validated format.
    pub fn new(family: ColorFamily, bits: u8, subsampling_w: u8, subsampling_h: u8) -> Result<Self> {
        if !matches!(bits, 8 | 10 | 16) {
            return Err(EdgefixError::UnsupportedFormat(format!(
                "{bits}-bit samples (expected 8, 10 or 16)"
            )));
        }
        if subsampling_w > 1 || subsampling_h > 1 {
            return Err(EdgefixError::UnsupportedFormat(format!(
                "subsampling shift {subsampling_w}x{subsampling_h}"
            )));
        }
        if family != ColorFamily::Yuv && (subsampling_w | subsampling_h) != 0 {
            return Err(EdgefixError::UnsupportedFormat(format!(
                "{family:?} cannot be subsampled"
            )));
        }
        Ok(Self {
            family,
            bits,
            subsampling_w,
            subsampling_h,
        })
    }

    pub const GRAY8: Self = Self::fixed(ColorFamily::Gray, 8, 0, 0);
    pub const GRAY16: Self = Self::fixed(ColorFamily::Gray, 16, 0, 0);
    pub const YUV420P8: Self = Self::fixed(ColorFamily::Yuv, 8, 1, 1);
    pub const YUV420P10: Self = Self::fixed(ColorFamily::Yuv, 10, 1, 1);
    pub const YUV420P16: Self = Self::fixed(ColorFamily::Yuv, 16, 1, 1);
    pub const YUV422P10: Self = Self::fixed(ColorFamily::Yuv, 10, 1, 0);
    pub const YUV444P8: Self = Self::fixed(ColorFamily::Yuv, 8, 0, 0);
    pub const YUV444P16: Self = Self::fixed(ColorFamily::Yuv, 16, 0, 0);
    pub const RGB24: Self = Self::fixed(ColorFamily::Rgb, 8, 0, 0);

    const fn fixed(family: ColorFamily, bits: u8, subsampling_w: u8, subsampling_h: u8) -> Self {
        Self {
            family,
            bits,
            subsampling_w,
            subsampling_h,
        }
    }

    /// Number of planes for this format.
    pub fn plane_count(self) -> usize {
        match self.family {
            ColorFamily::Gray => 1,
            ColorFamily::Yuv | ColorFamily::Rgb => 3,
        }
    }

    /// Whether plane `index` carries chroma (centered on the neutral level).
    #[inline]
    pub fn is_chroma(self, index: usize) -> bool {
        self.family == ColorFamily::Yuv && index > 0
    }

    /// Subsampling shifts `(w, h)` of plane `index`.
    #[inline]
    pub fn plane_shift(self, index: usize) -> (u8, u8) {
        if self.is_chroma(index) {
            (self.subsampling_w, self.subsampling_h)
        } else {
            (0, 0)
        }
    }

    /// Dimensions of plane `index` for a frame of `width` x `height`.
    #[inline]
    pub fn plane_size(self, index: usize, width: u32, height: u32) -> (u32, u32) {
        let (sw, sh) = self.plane_shift(index);
        (width >> sw, height >> sh)
    }

    /// Largest representable sample value.
    #[inline]
    pub fn peak(self) -> u16 {
        scale::peak(self.bits)
    }

    /// Value a freshly added border is painted with on plane `index`.
    pub fn border_value(self, index: usize) -> u16 {
        match self.family {
            ColorFamily::Rgb => 0,
            _ if self.is_chroma(index) => scale::neutral(self.bits),
            _ => scale::black(self.bits),
        }
    }

    /// Check that `width` x `height` can be represented with this subsampling.
    pub fn check_dimensions(self, width: u32, height: u32) -> Result<()> {
        let mw = 1u32 << self.subsampling_w;
        let mh = 1u32 << self.subsampling_h;
        if width == 0 || height == 0 || width % mw != 0 || height % mh != 0 {
            return Err(EdgefixError::invalid(format!(
                "{width}x{height} is not a valid size for {self:?}"
            )));
        }
        Ok(())
    }
}

/// One channel's 2D grid of samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plane {
    /// Row-major samples, `width * height` long
    pub data: Vec<u16>,
    pub width: u32,
    pub height: u32,
}

impl Plane {
    /// Create a plane filled with `value`.
    pub fn filled(width: u32, height: u32, value: u16) -> Self {
        Self {
            data: vec![value; width as usize * height as usize],
            width,
            height,
        }
    }

    /// Wrap existing samples.
    pub fn from_vec(width: u32, height: u32, data: Vec<u16>) -> Result<Self> {
        if data.len() != width as usize * height as usize {
            return Err(EdgefixError::invalid(format!(
                "plane data has {} samples, expected {}x{}",
                data.len(),
                width,
                height
            )));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Build a plane from a per-sample function.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> u16) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            data,
            width,
            height,
        }
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u16 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: u16) {
        let w = self.width as usize;
        self.data[y as usize * w + x as usize] = value;
    }

    /// Get a row of samples.
    #[inline]
    pub fn row(&self, y: u32) -> &[u16] {
        let w = self.width as usize;
        let start = y as usize * w;
        &self.data[start..start + w]
    }

    /// Get a mutable row of samples.
    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [u16] {
        let w = self.width as usize;
        let start = y as usize * w;
        &mut self.data[start..start + w]
    }

    /// Copy out the rectangle at `(x, y)` of size `width` x `height`.
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> Plane {
        debug_assert!(x + width <= self.width && y + height <= self.height);
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for row in y..y + height {
            let r = self.row(row);
            data.extend_from_slice(&r[x as usize..(x + width) as usize]);
        }
        Plane {
            data,
            width,
            height,
        }
    }

    /// Swap rows and columns.
    pub fn transpose(&self) -> Plane {
        Plane::from_fn(self.height, self.width, |x, y| self.get(y, x))
    }

    /// Mirror left to right.
    pub fn flip_horizontal(&self) -> Plane {
        let w = self.width;
        Plane::from_fn(w, self.height, |x, y| self.get(w - 1 - x, y))
    }

    /// Mirror top to bottom.
    pub fn flip_vertical(&self) -> Plane {
        let h = self.height;
        Plane::from_fn(self.width, h, |x, y| self.get(x, h - 1 - y))
    }

    /// Stack `self` above `other`. Widths must match.
    pub fn stack_vertical(&self, other: &Plane) -> Plane {
        debug_assert_eq!(self.width, other.width);
        let mut data = Vec::with_capacity(self.data.len() + other.data.len());
        data.extend_from_slice(&self.data);
        data.extend_from_slice(&other.data);
        Plane {
            data,
            width: self.width,
            height: self.height + other.height,
        }
    }

    /// Place `other` to the right of `self`. Heights must match.
    pub fn stack_horizontal(&self, other: &Plane) -> Plane {
        debug_assert_eq!(self.height, other.height);
        let mut data = Vec::with_capacity(self.data.len() + other.data.len());
        for y in 0..self.height {
            data.extend_from_slice(self.row(y));
            data.extend_from_slice(other.row(y));
        }
        Plane {
            data,
            width: self.width + other.width,
            height: self.height,
        }
    }

    /// Pad with a constant value on each side.
    pub fn pad(&self, left: u32, right: u32, top: u32, bottom: u32, value: u16) -> Plane {
        let width = self.width + left + right;
        let height = self.height + top + bottom;
        let mut out = Plane::filled(width, height, value);
        for y in 0..self.height {
            let dst = out.row_mut(y + top);
            dst[left as usize..(left + self.width) as usize].copy_from_slice(self.row(y));
        }
        out
    }
}

/// A video frame: one plane per channel of its format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub format: VideoFormat,
    /// Luma (or first plane) width in pixels
    pub width: u32,
    /// Luma (or first plane) height in pixels
    pub height: u32,
    /// Sample planes (1 or 3 depending on format)
    pub planes: SmallVec<[Plane; 3]>,
}

impl Frame {
    /// Create a frame with every plane filled with its border value.
    pub fn new(width: u32, height: u32, format: VideoFormat) -> Result<Self> {
        format.check_dimensions(width, height)?;
        let planes = (0..format.plane_count())
            .map(|i| {
                let (pw, ph) = format.plane_size(i, width, height);
                Plane::filled(pw, ph, format.border_value(i))
            })
            .collect();
        Ok(Self {
            format,
            width,
            height,
            planes,
        })
    }

    /// Assemble a frame from planes, validating their geometry.
    pub fn from_planes(format: VideoFormat, planes: SmallVec<[Plane; 3]>) -> Result<Self> {
        if planes.len() != format.plane_count() {
            return Err(EdgefixError::FormatMismatch(format!(
                "{:?} needs {} planes, got {}",
                format.family,
                format.plane_count(),
                planes.len()
            )));
        }
        let width = planes[0].width;
        let height = planes[0].height;
        format.check_dimensions(width, height)?;
        let peak = format.peak();
        for (i, plane) in planes.iter().enumerate() {
            if (plane.width, plane.height) != format.plane_size(i, width, height) {
                return Err(EdgefixError::FormatMismatch(format!(
                    "plane {i} is {}x{}, expected {:?}",
                    plane.width,
                    plane.height,
                    format.plane_size(i, width, height)
                )));
            }
            if plane.data.iter().any(|&v| v > peak) {
                return Err(EdgefixError::invalid(format!(
                    "plane {i} has samples above {peak}"
                )));
            }
        }
        Ok(Self {
            format,
            width,
            height,
            planes,
        })
    }

    /// Build a frame from one generator per plane.
    pub fn from_fn(
        width: u32,
        height: u32,
        format: VideoFormat,
        mut f: impl FnMut(usize, u32, u32) -> u16,
    ) -> Result<Self> {
        format.check_dimensions(width, height)?;
        let peak = format.peak();
        let planes = (0..format.plane_count())
            .map(|i| {
                let (pw, ph) = format.plane_size(i, width, height);
                Plane::from_fn(pw, ph, |x, y| f(i, x, y).min(peak))
            })
            .collect();
        Ok(Self {
            format,
            width,
            height,
            planes,
        })
    }

    /// Replace every plane through `f`, keeping the format.
    ///
    /// All returned planes must describe the same luma geometry.
    pub fn map_planes(&self, mut f: impl FnMut(usize, &Plane) -> Plane) -> Frame {
        let planes: SmallVec<[Plane; 3]> =
            self.planes.iter().enumerate().map(|(i, p)| f(i, p)).collect();
        let (sw, sh) = self.format.plane_shift(0);
        Frame {
            format: self.format,
            width: planes[0].width << sw,
            height: planes[0].height << sh,
            planes,
        }
    }

    /// [`Frame::map_planes`] for transforms that can fail.
    pub fn try_map_planes(
        &self,
        mut f: impl FnMut(usize, &Plane) -> Result<Plane>,
    ) -> Result<Frame> {
        let planes = self
            .planes
            .iter()
            .enumerate()
            .map(|(i, p)| f(i, p))
            .collect::<Result<SmallVec<[Plane; 3]>>>()?;
        let (sw, sh) = self.format.plane_shift(0);
        Ok(Frame {
            format: self.format,
            width: planes[0].width << sw,
            height: planes[0].height << sh,
            planes,
        })
    }

    /// Crop in luma pixels. Offsets must respect the chroma subsampling.
    pub fn crop(&self, left: u32, right: u32, top: u32, bottom: u32) -> Result<Frame> {
        if left + right >= self.width || top + bottom >= self.height {
            return Err(EdgefixError::invalid(format!(
                "crop {left}/{right}/{top}/{bottom} leaves nothing of {}x{}",
                self.width, self.height
            )));
        }
        let width = self.width - left - right;
        let height = self.height - top - bottom;
        self.format.check_dimensions(width, height)?;
        let mw = 1u32 << self.format.subsampling_w;
        let mh = 1u32 << self.format.subsampling_h;
        if left % mw != 0 || top % mh != 0 {
            return Err(EdgefixError::invalid(format!(
                "crop offset {left}x{top} does not respect subsampling"
            )));
        }
        Ok(self.map_planes(|i, p| {
            let (sw, sh) = self.format.plane_shift(i);
            p.crop(left >> sw, top >> sh, width >> sw, height >> sh)
        }))
    }

    /// Total sample count across planes.
    pub fn sample_count(&self) -> usize {
        self.planes.iter().map(|p| p.data.len()).sum()
    }

    /// Get the primary plane (plane 0).
    #[inline]
    pub fn primary_plane(&self) -> &Plane {
        &self.planes[0]
    }

    /// Get the primary plane mutably.
    #[inline]
    pub fn primary_plane_mut(&mut self) -> &mut Plane {
        &mut self.planes[0]
    }

    /// Create a test pattern frame: a diagonal luma ramp with tinted chroma.
    pub fn test_pattern(width: u32, height: u32, format: VideoFormat) -> Result<Self> {
        let peak = format.peak() as u32;
        Frame::from_fn(width, height, format, |plane, x, y| {
            let ramp = (x * 7 + y * 3 + plane as u32 * 41) % 200 + 28;
            (ramp * peak / 255) as u16
        })
    }
}
