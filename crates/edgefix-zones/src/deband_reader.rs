//! Scheduled debanding.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use edgefix_core::{Clip, Result};
use edgefix_filters::{DebandParams, Services};

use crate::schedule::{DebandZone, Schedule};
use crate::table::{splice, ZoneTable};

/// Settings shared by every zone; the strength comes from the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebandReaderParams {
    pub grain: u32,
    pub range: u32,
}

impl Default for DebandReaderParams {
    fn default() -> Self {
        Self { grain: 64, range: 30 }
    }
}

/// Deband each zone with its own strength on luma and chroma. Frames outside
/// every zone pass through.
pub fn deband_reader(
    clip: &Clip,
    schedule: &Schedule<DebandZone>,
    params: DebandReaderParams,
    services: &Services,
) -> Result<Clip> {
    let table = ZoneTable::build(clip.len(), schedule.ranges())?;
    let mut zones = Vec::with_capacity(schedule.len());
    for zone in schedule.iter() {
        let deband = DebandParams::uniform(zone.strength, params.grain, params.range);
        deband.validate()?;
        let src = clip.clone();
        let debander = Arc::clone(&services.debander);
        zones.push(Clip::from_fn(*clip.info(), move |n| {
            debander.deband(&src.frame(n)?, n, &deband)
        }));
    }
    splice(clip, zones, table)
}
