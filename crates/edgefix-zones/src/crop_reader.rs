//! Variable crops driven by a crop schedule.
//!
//! The output always has the target size. Frames outside every zone are
//! balanced (edges allowed by the uncrop mask only) and resized as a whole.
//! Inside a zone the frame gets line brightness fixes relative to the zone's
//! crop, small crops are filled in place, the rest is cropped and resized by
//! [`CropResize`], and seam-free borders pad it back to the target.

use serde::Serialize;
use tracing::{debug, info};

use edgefix_core::{Clip, ClipInfo, EdgefixError, Edge, Edges, FrameRange, Result};
use edgefix_filters::{
    add_borders_clip, round_even, BalanceParams, CropResize, CropResizeParams, CropResizePlan,
    LevelsParams, Line, Resize, Services,
};

use crate::schedule::{CropZone, Schedule};
use crate::table::{splice, ZoneTable};

/// Brightness fix of one line. Non-negative offsets count inwards from the
/// top/left crop edge, negative ones from the bottom/right crop edge
/// (`-1` being the last line kept).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineFix {
    pub offset: i64,
    /// Brightness change in 8-bit levels; positive brightens
    pub adj: i64,
}

/// Parameters shared by every zone of a crop schedule.
#[derive(Debug, Clone)]
pub struct CropReaderParams {
    /// Target width; derived from `height` and the frame aspect when omitted
    pub width: Option<u32>,
    /// Target height; derived from `width` and the frame aspect when omitted
    pub height: Option<u32>,
    pub rows: Vec<LineFix>,
    pub columns: Vec<LineFix>,
    /// Protection band of the line fixes, in 8-bit levels
    pub protect: i64,
    /// Crops up to this amount are filled instead of cropped
    pub fill_max: u32,
    pub balance: Option<BalanceParams>,
    /// Per edge: apply line fixes and balancing even where the crop is zero
    pub fix_uncrop: Edges<bool>,
    pub resize: Resize,
}

impl Default for CropReaderParams {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            rows: Vec::new(),
            columns: Vec::new(),
            protect: 20,
            fill_max: 2,
            balance: None,
            fix_uncrop: Edges::uniform(false),
            resize: Resize::default(),
        }
    }
}

/// Resolved geometry of one zone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZonePlan {
    pub range: FrameRange,
    /// Absolute lines and their brightness change
    pub lines: Vec<(Line, i64)>,
    /// Crops small enough to be filled in place
    pub filled: Edges<u32>,
    pub crop_resize: CropResizePlan,
    /// Borders padding the resized picture back to the target
    pub borders: Edges<u32>,
}

/// Resolved geometry of a whole schedule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReaderPlan {
    pub input: ClipInfo,
    pub width: u32,
    pub height: u32,
    /// Balance thickness outside the zones
    pub balance: Option<Edges<u32>>,
    pub zones: Vec<ZonePlan>,
}

/// Crop schedule reader, validated against one input shape.
#[derive(Debug, Clone)]
pub struct CropResizeReader {
    plan: ReaderPlan,
    default_params: CropResizeParams,
    zone_params: Vec<CropResizeParams>,
    table: ZoneTable,
    protect: i64,
    services: Services,
}

impl CropResizeReader {
    pub fn new(
        input: ClipInfo,
        schedule: &Schedule<CropZone>,
        params: CropReaderParams,
        services: Services,
    ) -> Result<Self> {
        let (width, height, rw, rh) = targets(&input, &params)?;
        if let Some(b) = &params.balance {
            b.validate()?;
        }
        let mask = params.fix_uncrop;

        let default_balance = params
            .balance
            .map(|b| b.edges.zip(mask, |t, keep| if keep { t } else { 0 }))
            .filter(|e| !e.is_zero());
        let default_params = CropResizeParams {
            width: Some(width),
            height: Some(height),
            balance: default_balance.and_then(|edges| params.balance.map(|b| BalanceParams { edges, ..b })),
            resize: params.resize.clone(),
            ..CropResizeParams::default()
        };

        let mut zones = Vec::with_capacity(schedule.len());
        let mut zone_params = Vec::with_capacity(schedule.len());
        for (i, zone) in schedule.iter().enumerate() {
            let (plan, crop_resize) = plan_zone(&input, zone, &params, (width, height, rw, rh))
                .map_err(|e| EdgefixError::invalid(format!("crop zone {i} {}: {e}", zone.range)))?;
            zones.push(plan);
            zone_params.push(crop_resize);
        }
        let table = ZoneTable::build(input.num_frames, schedule.ranges())?;

        info!(
            zones = zones.len(),
            width,
            height,
            path = %schedule.path.display(),
            "crop schedule resolved"
        );
        Ok(Self {
            plan: ReaderPlan {
                input,
                width,
                height,
                balance: default_balance,
                zones,
            },
            default_params,
            zone_params,
            table,
            protect: params.protect,
            services,
        })
    }

    pub fn plan(&self) -> &ReaderPlan {
        &self.plan
    }

    /// Metadata of the output clip.
    pub fn output_info(&self) -> ClipInfo {
        self.plan.input.with_size(self.plan.width, self.plan.height)
    }

    /// Build the output clip over `clip`, which must match the input shape.
    pub fn apply(&self, clip: &Clip) -> Result<Clip> {
        let input = self.plan.input;
        if !clip.info().same_shape(&input) || clip.len() != input.num_frames {
            return Err(EdgefixError::FormatMismatch(format!(
                "crop reader built for {input:?}, got {:?}",
                clip.info()
            )));
        }
        let base = CropResize::new(input, self.default_params.clone(), self.services.clone())?
            .apply_clip(clip)?;

        let mut zone_clips = Vec::with_capacity(self.plan.zones.len());
        for (plan, params) in self.plan.zones.iter().zip(&self.zone_params) {
            let prepared = self.prepare(clip, plan);
            let core = CropResize::new(input, params.clone(), self.services.clone())?.apply_clip(&prepared)?;
            let full = add_borders_clip(&core, plan.borders, self.services.line_levels.clone())?;
            zone_clips.push(full);
        }
        splice(&base, zone_clips, self.table.clone())
    }

    /// Line fixes and in-place fills of one zone.
    fn prepare(&self, clip: &Clip, plan: &ZonePlan) -> Clip {
        if plan.lines.is_empty() && plan.filled.is_zero() {
            return clip.clone();
        }
        let lines = plan.lines.clone();
        let filled = plan.filled;
        let protect = self.protect;
        let services = self.services.clone();
        let all_planes: Vec<usize> = (0..clip.info().format.plane_count()).collect();
        clip.map_same(move |frame| {
            let mut out = frame.clone();
            for &(line, adj) in &lines {
                out = services
                    .line_levels
                    .adjust(&out, line, &LevelsParams::brightness(adj, protect))?;
            }
            if !filled.is_zero() {
                out = services.edge_fill.fill(&out, filled, &all_planes)?;
            }
            Ok(out)
        })
    }
}

/// Target size and per-axis scale factors.
fn targets(input: &ClipInfo, params: &CropReaderParams) -> Result<(u32, u32, f64, f64)> {
    let (w, h) = (input.width as f64, input.height as f64);
    let (width, height, rw, rh) = match (params.width, params.height) {
        (None, None) => (input.width, input.height, 1.0, 1.0),
        (Some(tw), None) => {
            let r = tw as f64 / w;
            (tw, round_even(h * r), r, r)
        }
        (None, Some(th)) => {
            let r = th as f64 / h;
            (round_even(w * r), th, r, r)
        }
        (Some(tw), Some(th)) => (tw, th, tw as f64 / w, th as f64 / h),
    };
    if width % 2 != 0 || height % 2 != 0 {
        return Err(EdgefixError::invalid(format!(
            "target size {width}x{height} must be even"
        )));
    }
    input.format.check_dimensions(width, height)?;
    Ok((width, height, rw, rh))
}

fn plan_zone(
    input: &ClipInfo,
    zone: &CropZone,
    params: &CropReaderParams,
    (width, height, rw, rh): (u32, u32, f64, f64),
) -> Result<(ZonePlan, CropResizeParams)> {
    let mask = params.fix_uncrop;
    let crop = zone.crop;
    let applies = mask.zip(crop, |m, c| m || c > 0);

    let mut lines = Vec::with_capacity(params.rows.len() + params.columns.len());
    for fix in &params.rows {
        if let Some(row) = line_index(fix.offset, crop.top, crop.bottom, input.height, applies.top, applies.bottom)? {
            lines.push((Line::Row(row), fix.adj));
        }
    }
    for fix in &params.columns {
        if let Some(col) = line_index(fix.offset, crop.left, crop.right, input.width, applies.left, applies.right)? {
            lines.push((Line::Column(col), fix.adj));
        }
    }

    let mut thickness = params
        .balance
        .map(|b| b.edges.zip(applies, |t, keep| if keep { t } else { 0 }));
    let mut remaining = crop;
    let mut filled = Edges::default();
    for edge in [Edge::Left, Edge::Right, Edge::Top, Edge::Bottom] {
        let c = crop.get(edge);
        if c > 0 && c <= params.fill_max {
            filled.set(edge, c);
            remaining.set(edge, 0);
            if let Some(t) = thickness.as_mut() {
                let grown = t.get(edge) + c;
                t.set(edge, grown);
            }
        }
    }
    if filled.horizontal() >= input.width || filled.vertical() >= input.height {
        return Err(EdgefixError::invalid("in-place fill covers the whole frame"));
    }

    let crop_resize = CropResizeParams {
        width: Some(width),
        height: Some(height),
        crop: remaining,
        fill: zone.fill,
        chroma_fill: None,
        balance: thickness.zip(params.balance).map(|(edges, b)| BalanceParams { edges, ..b }),
        resize: params.resize.clone(),
    };
    let core = CropResizePlan::compute(input.width, input.height, input.format, &crop_resize)?;

    let x = round_even(remaining.left as f64 * rw);
    let y = round_even(remaining.top as f64 * rh);
    let right = width.checked_sub(core.width + x);
    let bottom = height.checked_sub(core.height + y);
    let (Some(right), Some(bottom)) = (right, bottom) else {
        return Err(EdgefixError::invalid(format!(
            "resized picture {}x{} at ({x}, {y}) does not fit {width}x{height}",
            core.width, core.height
        )));
    };
    let borders = Edges::new(x, right, y, bottom);
    debug!(range = %zone.range, borders = ?borders.to_array(), filled = ?filled.to_array(), "crop zone");

    Ok((
        ZonePlan {
            range: zone.range,
            lines,
            filled,
            crop_resize: core,
            borders,
        },
        crop_resize,
    ))
}

/// Absolute line for `offset`, or `None` when the fix does not apply.
fn line_index(
    offset: i64,
    crop_near: u32,
    crop_far: u32,
    dim: u32,
    near_applies: bool,
    far_applies: bool,
) -> Result<Option<u32>> {
    let index = if offset < 0 {
        if !far_applies {
            return Ok(None);
        }
        dim as i64 + offset - crop_far as i64
    } else {
        if !near_applies {
            return Ok(None);
        }
        crop_near as i64 + offset
    };
    if index < 0 || index >= dim as i64 {
        return Err(EdgefixError::invalid(format!(
            "line offset {offset} lands outside the frame"
        )));
    }
    Ok(Some(index as u32))
}

/// Build a [`CropResizeReader`] and apply it in one step.
pub fn crop_resize_reader(
    clip: &Clip,
    schedule: &Schedule<CropZone>,
    params: CropReaderParams,
    services: &Services,
) -> Result<Clip> {
    CropResizeReader::new(*clip.info(), schedule, params, services.clone())?.apply(clip)
}
