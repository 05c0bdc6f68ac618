//! Per-frame zone lookup and splicing.

use std::sync::Arc;

use tracing::{debug, warn};

use edgefix_core::{Clip, EdgefixError, FrameRange, Result};

/// Which zone, if any, owns each frame. Later zones win.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneTable {
    slots: Vec<Option<u32>>,
}

impl ZoneTable {
    /// Resolve `ranges` (file order) over a clip of `len` frames. Ranges
    /// past the end of the clip are rejected.
    pub fn build(len: u32, ranges: impl IntoIterator<Item = FrameRange>) -> Result<Self> {
        let mut slots = vec![None; len as usize];
        let mut overlapping = 0usize;
        for (zone, range) in ranges.into_iter().enumerate() {
            if range.end >= len {
                return Err(EdgefixError::invalid(format!(
                    "zone {zone} {range} is past the end of a {len}-frame clip"
                )));
            }
            for slot in &mut slots[range.start as usize..=range.end as usize] {
                if slot.is_some() {
                    overlapping += 1;
                }
                *slot = Some(zone as u32);
            }
        }
        if overlapping > 0 {
            warn!(frames = overlapping, "zones overlap, later zones take precedence");
        }
        Ok(Self { slots })
    }

    /// Zone owning frame `index`.
    #[inline]
    pub fn lookup(&self, index: u32) -> Option<usize> {
        self.slots.get(index as usize).copied().flatten().map(|z| z as usize)
    }

    pub fn len(&self) -> u32 {
        self.slots.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of frames each of `zones` zones ends up owning.
    pub fn coverage(&self, zones: usize) -> Vec<u32> {
        let mut counts = vec![0; zones];
        for zone in self.slots.iter().flatten() {
            if let Some(c) = counts.get_mut(*zone as usize) {
                *c += 1;
            }
        }
        counts
    }
}

/// Frames of `zones[i]` where the table names zone `i`, `base` elsewhere.
/// Every clip must match the shape and length of `base`.
pub fn splice(base: &Clip, zones: Vec<Clip>, table: ZoneTable) -> Result<Clip> {
    if table.len() != base.len() {
        return Err(EdgefixError::invalid(format!(
            "zone table covers {} frames, clip has {}",
            table.len(),
            base.len()
        )));
    }
    for (i, zone) in zones.iter().enumerate() {
        if !zone.info().same_shape(base.info()) || zone.len() != base.len() {
            return Err(EdgefixError::FormatMismatch(format!(
                "zone {i} produces {:?}, expected {:?}",
                zone.info(),
                base.info()
            )));
        }
    }
    if let Some(bad) = table.slots.iter().flatten().find(|&&z| z as usize >= zones.len()) {
        return Err(EdgefixError::invalid(format!("zone table names missing zone {bad}")));
    }
    debug!(zones = zones.len(), frames = base.len(), "splicing zones");

    let base = base.clone();
    let zones = Arc::new(zones);
    let info = *base.info();
    Ok(Clip::from_fn(info, move |n| match table.lookup(n) {
        Some(zone) => zones[zone].frame(n),
        None => base.frame(n),
    }))
}
