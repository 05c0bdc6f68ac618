//! Pull-based clips.
//!
//! A [`Clip`] knows its metadata up front and produces frames only when asked
//! for an index. Every derived clip is a new value; sources never mutate.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use crate::error::{EdgefixError, Result};
use crate::frame::{Frame, VideoFormat};
use crate::stats::PlaneStats;
use crate::time::{FrameRange, FrameRate};

/// Metadata shared by every frame of a clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipInfo {
    pub format: VideoFormat,
    pub width: u32,
    pub height: u32,
    pub num_frames: u32,
    pub frame_rate: FrameRate,
}

impl ClipInfo {
    /// Same clip shape with a different frame size.
    pub fn with_size(self, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..self
        }
    }

    /// Same clip shape with a different length.
    pub fn with_frames(self, num_frames: u32) -> Self {
        Self { num_frames, ..self }
    }

    /// Whether two clips can be spliced together frame for frame.
    pub fn same_shape(&self, other: &ClipInfo) -> bool {
        self.format == other.format && self.width == other.width && self.height == other.height
    }
}

/// Something that can produce frames by index.
pub trait FrameSource: Send + Sync {
    /// Clip metadata, available without producing frames.
    fn info(&self) -> &ClipInfo;

    /// Produce frame `index`. Must be idempotent.
    fn frame(&self, index: u32) -> Result<Frame>;
}

/// A cheaply clonable handle to a frame source.
#[derive(Clone)]
pub struct Clip(Arc<dyn FrameSource>);

impl fmt::Debug for Clip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Clip").field(self.info()).finish()
    }
}

impl Clip {
    /// Wrap a frame source.
    pub fn new(source: impl FrameSource + 'static) -> Self {
        Self(Arc::new(source))
    }

    /// Clip over frames held in memory. All frames must share one format and size.
    pub fn from_frames(frames: Vec<Frame>, frame_rate: FrameRate) -> Result<Self> {
        let first = frames
            .first()
            .ok_or_else(|| EdgefixError::invalid("a clip needs at least one frame"))?;
        let info = ClipInfo {
            format: first.format,
            width: first.width,
            height: first.height,
            num_frames: frames.len() as u32,
            frame_rate,
        };
        if let Some(bad) = frames
            .iter()
            .position(|f| f.format != info.format || f.width != info.width || f.height != info.height)
        {
            return Err(EdgefixError::FormatMismatch(format!(
                "frame {bad} does not match the first frame's format"
            )));
        }
        Ok(Self::new(MemorySource {
            info,
            frames: Arc::new(frames),
        }))
    }

    /// Clip whose frames are computed by `f` from their index.
    pub fn from_fn<F>(info: ClipInfo, f: F) -> Self
    where
        F: Fn(u32) -> Result<Frame> + Send + Sync + 'static,
    {
        Self::new(FnSource { info, f })
    }

    /// Clip repeating one frame `num_frames` times.
    pub fn repeat(frame: Frame, num_frames: u32, frame_rate: FrameRate) -> Self {
        let info = ClipInfo {
            format: frame.format,
            width: frame.width,
            height: frame.height,
            num_frames,
            frame_rate,
        };
        let frame = Arc::new(frame);
        Self::from_fn(info, move |_| Ok(Frame::clone(&frame)))
    }

    #[inline]
    pub fn info(&self) -> &ClipInfo {
        self.0.info()
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.info().num_frames
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Produce frame `index`, checking bounds and the produced geometry.
    pub fn frame(&self, index: u32) -> Result<Frame> {
        let info = self.info();
        if index >= info.num_frames {
            return Err(EdgefixError::FrameOutOfRange {
                index,
                len: info.num_frames,
            });
        }
        let frame = self.0.frame(index)?;
        if frame.format != info.format || frame.width != info.width || frame.height != info.height {
            return Err(EdgefixError::FormatMismatch(format!(
                "frame {index} is {}x{} {:?}, clip declares {}x{} {:?}",
                frame.width, frame.height, frame.format, info.width, info.height, info.format
            )));
        }
        Ok(frame)
    }

    /// Render a range of frames in parallel. Equal to requesting them in order.
    pub fn frames_parallel(&self, range: Range<u32>) -> Result<Vec<Frame>> {
        range.into_par_iter().map(|n| self.frame(n)).collect()
    }

    /// Per-frame transform whose output geometry is `info`.
    pub fn map<F>(&self, info: ClipInfo, f: F) -> Clip
    where
        F: Fn(&Frame) -> Result<Frame> + Send + Sync + 'static,
    {
        let src = self.clone();
        Clip::from_fn(info.with_frames(self.len()), move |n| f(&src.frame(n)?))
    }

    /// Per-frame transform keeping the clip's geometry.
    pub fn map_same<F>(&self, f: F) -> Clip
    where
        F: Fn(&Frame) -> Result<Frame> + Send + Sync + 'static,
    {
        self.map(*self.info(), f)
    }

    /// Evaluate each frame from its index and the statistics of `plane` of
    /// the upstream frame at that index.
    pub fn eval_with_stats<F>(&self, info: ClipInfo, plane: usize, f: F) -> Result<Clip>
    where
        F: Fn(u32, &PlaneStats) -> Result<Frame> + Send + Sync + 'static,
    {
        if plane >= self.info().format.plane_count() {
            return Err(EdgefixError::invalid(format!("clip has no plane {plane}")));
        }
        let src = self.clone();
        Ok(Clip::from_fn(info.with_frames(self.len()), move |n| {
            let upstream = src.frame(n)?;
            let stats = PlaneStats::measure(&upstream.planes[plane], upstream.format.bits);
            f(n, &stats)
        }))
    }

    /// Frames `range.start..=range.end`.
    pub fn trim(&self, range: FrameRange) -> Result<Clip> {
        if range.end >= self.len() {
            return Err(EdgefixError::invalid(format!(
                "range {range} exceeds clip of {} frames",
                self.len()
            )));
        }
        let src = self.clone();
        let info = self.info().with_frames(range.len());
        Ok(Clip::from_fn(info, move |n| src.frame(range.start + n)))
    }

    /// Join clips end to end. All clips must share format and size.
    pub fn concat(clips: &[Clip]) -> Result<Clip> {
        let first = clips
            .first()
            .ok_or_else(|| EdgefixError::invalid("nothing to concatenate"))?;
        let mut offsets = Vec::with_capacity(clips.len());
        let mut total = 0u32;
        for clip in clips {
            if !clip.info().same_shape(first.info()) {
                return Err(EdgefixError::FormatMismatch(format!(
                    "cannot join {:?} with {:?}",
                    clip.info(),
                    first.info()
                )));
            }
            offsets.push(total);
            total += clip.len();
        }
        let clips = clips.to_vec();
        let info = first.info().with_frames(total);
        Ok(Clip::from_fn(info, move |n| {
            let i = offsets.partition_point(|&o| o <= n) - 1;
            clips[i].frame(n - offsets[i])
        }))
    }

    /// Keep `length` frames out of every `every`, after skipping `offset.0`
    /// frames at the start and `offset.1` at the end.
    pub fn select_range_every(&self, every: u32, length: u32, offset: (u32, u32)) -> Result<Clip> {
        if every == 0 || length == 0 || length > every {
            return Err(EdgefixError::invalid(format!(
                "cannot select {length} frames out of every {every}"
            )));
        }
        if offset.0 + offset.1 >= self.len() {
            return Err(EdgefixError::invalid("offsets remove the whole clip"));
        }
        let trimmed = self.trim(FrameRange::new(offset.0, self.len() - 1 - offset.1)?)?;
        let n = trimmed.len();
        let total = (n / every) * length + (n % every).min(length);
        let info = self.info().with_frames(total);
        Ok(Clip::from_fn(info, move |i| {
            trimmed.frame((i / length) * every + i % length)
        }))
    }
}

struct MemorySource {
    info: ClipInfo,
    frames: Arc<Vec<Frame>>,
}

impl FrameSource for MemorySource {
    fn info(&self) -> &ClipInfo {
        &self.info
    }

    fn frame(&self, index: u32) -> Result<Frame> {
        Ok(self.frames[index as usize].clone())
    }
}

struct FnSource<F> {
    info: ClipInfo,
    f: F,
}

impl<F> FrameSource for FnSource<F>
where
    F: Fn(u32) -> Result<Frame> + Send + Sync,
{
    fn info(&self) -> &ClipInfo {
        &self.info
    }

    fn frame(&self, index: u32) -> Result<Frame> {
        (self.f)(index)
    }
}
