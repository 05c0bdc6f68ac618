//! edgefix zones - frame-range schedules and the readers built on them
//!
//! A schedule is a whitespace-delimited text file, one zone per line,
//! starting with an inclusive `start end` frame range. Schedules are parsed
//! and validated completely before any frame is produced; the readers then
//! splice per-zone transforms over a default clip, later zones winning.

pub mod crop_reader;
pub mod deband_reader;
pub mod extract;
pub mod schedule;
pub mod table;

pub use crop_reader::{crop_resize_reader, CropReaderParams, CropResizeReader, LineFix, ReaderPlan, ZonePlan};
pub use deband_reader::{deband_reader, DebandReaderParams};
pub use extract::extract_frames;
pub use schedule::{CropZone, DebandZone, ExtractZone, Schedule, ZoneRecord};
pub use table::{splice, ZoneTable};
