//! Per-edge amounts and fractional source windows.

use serde::{Deserialize, Serialize};

/// One of the four frame edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    Top,
    Left,
    Bottom,
    Right,
}

impl Edge {
    /// Order in which edge bands are balanced.
    pub const BALANCE_ORDER: [Edge; 4] = [Edge::Top, Edge::Left, Edge::Bottom, Edge::Right];

    /// Whether the band along this edge spans the frame width.
    #[inline]
    pub fn is_horizontal(self) -> bool {
        matches!(self, Edge::Top | Edge::Bottom)
    }
}

/// A value for each edge, in `left, right, top, bottom` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Edges<T> {
    pub left: T,
    pub right: T,
    pub top: T,
    pub bottom: T,
}

impl<T: Copy> Edges<T> {
    #[inline]
    pub const fn new(left: T, right: T, top: T, bottom: T) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }

    /// Same value on every edge.
    #[inline]
    pub const fn uniform(v: T) -> Self {
        Self::new(v, v, v, v)
    }

    #[inline]
    pub fn get(&self, edge: Edge) -> T {
        match edge {
            Edge::Left => self.left,
            Edge::Right => self.right,
            Edge::Top => self.top,
            Edge::Bottom => self.bottom,
        }
    }

    #[inline]
    pub fn set(&mut self, edge: Edge, v: T) {
        match edge {
            Edge::Left => self.left = v,
            Edge::Right => self.right = v,
            Edge::Top => self.top = v,
            Edge::Bottom => self.bottom = v,
        }
    }

    /// Apply `f` to every edge.
    pub fn map<U: Copy>(self, mut f: impl FnMut(T) -> U) -> Edges<U> {
        Edges::new(f(self.left), f(self.right), f(self.top), f(self.bottom))
    }

    /// Combine with another set of edges.
    pub fn zip<U: Copy, V: Copy>(self, other: Edges<U>, mut f: impl FnMut(T, U) -> V) -> Edges<V> {
        Edges::new(
            f(self.left, other.left),
            f(self.right, other.right),
            f(self.top, other.top),
            f(self.bottom, other.bottom),
        )
    }

    /// Values as `[left, right, top, bottom]`.
    #[inline]
    pub fn to_array(self) -> [T; 4] {
        [self.left, self.right, self.top, self.bottom]
    }

    #[inline]
    pub fn from_array(a: [T; 4]) -> Self {
        Self::new(a[0], a[1], a[2], a[3])
    }
}

impl Edges<u32> {
    /// True when every edge is zero.
    pub fn is_zero(&self) -> bool {
        self.to_array().iter().all(|&v| v == 0)
    }

    /// `left + right`
    #[inline]
    pub fn horizontal(&self) -> u32 {
        self.left + self.right
    }

    /// `top + bottom`
    #[inline]
    pub fn vertical(&self) -> u32 {
        self.top + self.bottom
    }
}

/// Fractional source rectangle handed to a resampler, in luma pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SourceWindow {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl SourceWindow {
    #[inline]
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// The whole of a `width` x `height` frame.
    #[inline]
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0.0, 0.0, width as f64, height as f64)
    }

    /// Whether this window covers exactly the whole `width` x `height` frame.
    pub fn is_full(&self, width: u32, height: u32) -> bool {
        *self == Self::full(width, height)
    }

    /// Window expressed in a plane subsampled by `(sw, sh)` shifts.
    pub fn subsampled(&self, sw: u8, sh: u8) -> Self {
        let fx = (1u32 << sw) as f64;
        let fy = (1u32 << sh) as f64;
        Self::new(
            self.left / fx,
            self.top / fy,
            self.width / fx,
            self.height / fy,
        )
    }
}
