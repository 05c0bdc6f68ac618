//! Edge fill: rebuild border lines from their inner neighbours.

use edgefix_core::{EdgefixError, Edges, Frame, Plane, Result};

/// Edge-replication fill service.
pub trait EdgeFill: Send + Sync {
    /// Overwrite `edges` (luma pixels) of the listed `planes` in place of
    /// their current content. Frame geometry is unchanged.
    fn fill(&self, frame: &Frame, edges: Edges<u32>, planes: &[usize]) -> Result<Frame>;
}

/// Fill-margins mode: top and bottom lines are rebuilt from the adjacent
/// inner line with 3-2-3 horizontal weighting, left and right columns
/// replicate the first kept column.
///
/// Amounts on subsampled planes are divided by the subsampling factor,
/// rounding up.
#[derive(Debug, Clone, Copy, Default)]
pub struct FillMargins;

impl EdgeFill for FillMargins {
    fn fill(&self, frame: &Frame, edges: Edges<u32>, planes: &[usize]) -> Result<Frame> {
        if edges.horizontal() >= frame.width || edges.vertical() >= frame.height {
            return Err(EdgefixError::invalid(format!(
                "fill {:?} leaves nothing of {}x{}",
                edges.to_array(),
                frame.width,
                frame.height
            )));
        }
        if let Some(&bad) = planes.iter().find(|&&p| p >= frame.planes.len()) {
            return Err(EdgefixError::invalid(format!("frame has no plane {bad}")));
        }
        if edges.is_zero() {
            return Ok(frame.clone());
        }
        Ok(frame.map_planes(|i, plane| {
            if !planes.contains(&i) {
                return plane.clone();
            }
            let (sw, sh) = frame.format.plane_shift(i);
            let amounts = Edges::new(
                div_ceil(edges.left, sw),
                div_ceil(edges.right, sw),
                div_ceil(edges.top, sh),
                div_ceil(edges.bottom, sh),
            );
            fill_plane(plane, amounts)
        }))
    }
}

#[inline]
fn div_ceil(v: u32, shift: u8) -> u32 {
    (v + (1 << shift) - 1) >> shift
}

/// Fill margins of one plane. Amounts are clamped so at least one line of
/// the original content survives on each axis.
pub fn fill_plane(plane: &Plane, amounts: Edges<u32>) -> Plane {
    let mut out = plane.clone();
    let (w, h) = (plane.width, plane.height);
    let top = amounts.top.min(h - 1);
    let bottom = amounts.bottom.min(h - 1 - top);
    let left = amounts.left.min(w - 1);
    let right = amounts.right.min(w - 1 - left);

    for y in (0..top).rev() {
        let src = out.row(y + 1).to_vec();
        weighted_line(&src, out.row_mut(y));
    }
    for y in h - bottom..h {
        let src = out.row(y - 1).to_vec();
        weighted_line(&src, out.row_mut(y));
    }
    if left > 0 || right > 0 {
        for y in 0..h {
            let row = out.row_mut(y);
            let l = row[left as usize];
            row[..left as usize].fill(l);
            let r_edge = (w - 1 - right) as usize;
            let r = row[r_edge];
            row[r_edge + 1..].fill(r);
        }
    }
    out
}

/// `dst[x] = (3*src[x-1] + 2*src[x] + 3*src[x+1] + 4) / 8`, end samples copied.
fn weighted_line(src: &[u16], dst: &mut [u16]) {
    let n = src.len();
    dst[0] = src[0];
    if n == 1 {
        return;
    }
    dst[n - 1] = src[n - 1];
    for x in 1..n - 1 {
        let v = 3 * src[x - 1] as u32 + 2 * src[x] as u32 + 3 * src[x + 1] as u32 + 4;
        dst[x] = (v / 8) as u16;
    }
}

/// Fill `edges` of every plane with [`FillMargins`].
pub fn fill_borders(frame: &Frame, edges: Edges<u32>) -> Result<Frame> {
    let planes: Vec<usize> = (0..frame.planes.len()).collect();
    FillMargins.fill(frame, edges, &planes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgefix_core::VideoFormat;

    #[test]
    fn test_left_right_replicate() {
        let plane = Plane::from_fn(6, 2, |x, _| x as u16 * 10);
        let out = fill_plane(&plane, Edges::new(2, 1, 0, 0));
        assert_eq!(out.row(0), &[20, 20, 20, 30, 40, 40]);
    }

    #[test]
    fn test_top_uses_weighted_inner_row() {
        let plane = Plane::from_fn(4, 3, |x, y| if y == 0 { 0 } else { x as u16 * 8 });
        let out = fill_plane(&plane, Edges::new(0, 0, 1, 0));
        // (3*0 + 2*8 + 3*16 + 4) / 8 = 8, (3*8 + 2*16 + 3*24 + 4) / 8 = 16
        assert_eq!(out.row(0), &[0, 8, 16, 24]);
        assert_eq!(out.row(1), plane.row(1));
    }

    #[test]
    fn test_subsampled_amounts_round_up() {
        let frame = Frame::from_fn(8, 8, VideoFormat::YUV420P8, |_, x, _| x as u16).unwrap();
        let out = FillMargins.fill(&frame, Edges::new(1, 0, 0, 0), &[0, 1, 2]).unwrap();
        assert_eq!(out.planes[0].get(0, 3), 1);
        // A 1-pixel luma fill covers the first chroma column.
        assert_eq!(out.planes[1].get(0, 3), 1);
        assert_eq!(out.planes[1].get(1, 3), 1);
    }

    #[test]
    fn test_only_listed_planes_change() {
        let frame = Frame::test_pattern(8, 8, VideoFormat::YUV444P8).unwrap();
        let out = FillMargins.fill(&frame, Edges::new(2, 0, 0, 0), &[1, 2]).unwrap();
        assert_eq!(out.planes[0], frame.planes[0]);
        assert_ne!(out.planes[1], frame.planes[1]);
    }

    #[test]
    fn test_fill_everything_is_rejected() {
        let frame = Frame::new(8, 8, VideoFormat::GRAY8).unwrap();
        assert!(fill_borders(&frame, Edges::new(4, 4, 0, 0)).is_err());
        assert!(FillMargins.fill(&frame, Edges::uniform(1), &[3]).is_err());
    }
}
