//! edgefix filters - per-frame repair and geometry transforms
//!
//! Provides the border balancing engine, the crop/fill/resize transform,
//! seam-free border padding and a handful of utility filters. Everything
//! that is not an algorithm of record (resampling, edge fill, line levels,
//! debanding) sits behind a service trait with a CPU default in [`Services`].

pub mod balance;
pub mod borders;
pub mod crop_resize;
pub mod deband;
pub mod fill;
pub mod levels;
pub mod orient;
pub mod resample;
pub mod services;
pub mod utility;

pub use balance::{balance, balance_clip, balance_strips, BalanceParams};
pub use borders::{add_borders, add_borders_clip};
pub use crop_resize::{
    crop_resize, round_even, ChromaFill, CropResize, CropResizeParams, CropResizePlan, Resize,
};
pub use deband::{DebandParams, Debander, GradientDeband};
pub use fill::{fill_borders, EdgeFill, FillMargins};
pub use levels::{
    fix_brightness_protect, fix_column_brightness, fix_levels, fix_row_brightness, LevelsParams,
    LevelsPreset, Line, LineLevels, LumaLineLevels,
};
pub use resample::{CpuResampler, ResizeKernel, Resampler};
pub use services::Services;
pub use utility::{auto_gamma, greyscale, luma_mask_merge, rgb_mask_merge, RgbRange};
