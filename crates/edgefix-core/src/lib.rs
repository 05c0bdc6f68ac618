//! edgefix core - foundation types for border repair and crop scheduling
//!
//! This crate provides the fundamental types used throughout edgefix:
//! - Planar integer frames and their formats (8/10/16-bit)
//! - Pull-based clips with up-front metadata
//! - Frame rates and inclusive frame ranges
//! - Per-edge amounts and fractional source windows
//! - Bit-depth scaling of 8-bit reference values

pub mod clip;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod scale;
pub mod stats;
pub mod time;

pub use clip::{Clip, ClipInfo, FrameSource};
pub use error::{EdgefixError, Result};
pub use frame::{ColorFamily, Frame, Plane, VideoFormat};
pub use geometry::{Edge, Edges, SourceWindow};
pub use scale::scale;
pub use stats::PlaneStats;
pub use time::{FrameRange, FrameRate};
