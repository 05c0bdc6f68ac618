//! Add borders without leaving a dirty line at the seam.
//!
//! Plain padding leaves the outermost picture line next to flat black, which
//! encoders smear into a colored line. Each new border instead starts with a
//! mirrored, desaturated copy of the two outer lines whose luma is pulled
//! down to black, then continues with flat black.

use std::sync::Arc;

use edgefix_core::{ColorFamily, Clip, Edge, EdgefixError, Edges, Frame, Result};

use crate::levels::{Line, LevelsParams, LineLevels};

/// Chroma kept by the mirrored seam lines.
const SEAM_SATURATION: f32 = 0.4;

fn validate(edges: Edges<u32>) -> Result<()> {
    if edges.to_array().iter().any(|&t| t % 2 != 0) {
        return Err(EdgefixError::invalid(format!(
            "border sizes {:?} must be even",
            edges.to_array()
        )));
    }
    Ok(())
}

/// The two seam lines have to exist on every side that gets a border.
fn check_seam(width: u32, height: u32, edges: Edges<u32>) -> Result<()> {
    let short = (edges.horizontal() > 0 && width < 2) || (edges.vertical() > 0 && height < 2);
    if short {
        return Err(EdgefixError::invalid(format!(
            "cannot add borders {:?} to a {width}x{height} frame, seams need 2 lines",
            edges.to_array()
        )));
    }
    Ok(())
}

/// Add borders of the given even thicknesses, left, right, top then bottom.
pub fn add_borders(frame: &Frame, edges: Edges<u32>, levels: &dyn LineLevels) -> Result<Frame> {
    validate(edges)?;
    check_seam(frame.width, frame.height, edges)?;
    let mut frame = frame.clone();
    for edge in [Edge::Left, Edge::Right, Edge::Top, Edge::Bottom] {
        let t = edges.get(edge);
        if t > 0 {
            frame = add_border(&frame, edge, t, levels)?;
        }
    }
    Ok(frame)
}

/// [`add_borders`] on every frame of a clip.
pub fn add_borders_clip(clip: &Clip, edges: Edges<u32>, levels: Arc<dyn LineLevels>) -> Result<Clip> {
    validate(edges)?;
    if edges.is_zero() {
        return Ok(clip.clone());
    }
    let info = clip.info();
    check_seam(info.width, info.height, edges)?;
    let out = info.with_size(info.width + edges.horizontal(), info.height + edges.vertical());
    Ok(clip.map(out, move |f| add_borders(f, edges, levels.as_ref())))
}

fn add_border(frame: &Frame, edge: Edge, t: u32, levels: &dyn LineLevels) -> Result<Frame> {
    let (w, h) = (frame.width, frame.height);
    let seam = match edge {
        Edge::Left => frame.crop(0, w - 2, 0, 0)?,
        Edge::Right => frame.crop(w - 2, 0, 0, 0)?,
        Edge::Top => frame.crop(0, 0, 0, h - 2)?,
        Edge::Bottom => frame.crop(0, 0, h - 2, 0)?,
    };
    let seam = desaturate(&mirror(&seam, edge));

    let (joined, lines) = match edge {
        Edge::Left => (join(&seam, frame, false), [Line::Column(0), Line::Column(1)]),
        Edge::Right => (join(frame, &seam, false), [Line::Column(w), Line::Column(w + 1)]),
        Edge::Top => (join(&seam, frame, true), [Line::Row(0), Line::Row(1)]),
        Edge::Bottom => (join(frame, &seam, true), [Line::Row(h), Line::Row(h + 1)]),
    };
    let mut out = joined;
    for line in lines {
        out = levels.adjust(&out, line, &LevelsParams::BLACKEN)?;
    }

    let rest = t - 2;
    if rest == 0 {
        return Ok(out);
    }
    let mut pad = Edges::uniform(0);
    pad.set(edge, rest);
    Ok(pad_flat(&out, pad))
}

fn mirror(frame: &Frame, edge: Edge) -> Frame {
    frame.map_planes(|_, p| {
        if edge.is_horizontal() {
            p.flip_vertical()
        } else {
            p.flip_horizontal()
        }
    })
}

/// Pull chroma toward neutral; RGB samples move toward their per-pixel mean.
fn desaturate(frame: &Frame) -> Frame {
    let format = frame.format;
    let pull = |v: f32, center: f32| (center + (v - center) * SEAM_SATURATION).round() as u16;
    match format.family {
        ColorFamily::Gray => frame.clone(),
        ColorFamily::Yuv => frame.map_planes(|i, p| {
            if !format.is_chroma(i) {
                return p.clone();
            }
            let mid = format.border_value(i) as f32;
            let mut out = p.clone();
            out.data.iter_mut().for_each(|v| *v = pull(*v as f32, mid));
            out
        }),
        ColorFamily::Rgb => {
            let n = frame.planes[0].data.len();
            let means: Vec<f32> = (0..n)
                .map(|k| frame.planes.iter().map(|p| p.data[k] as f32).sum::<f32>() / 3.0)
                .collect();
            frame.map_planes(|_, p| {
                let mut out = p.clone();
                for (v, &m) in out.data.iter_mut().zip(&means) {
                    *v = pull(*v as f32, m);
                }
                out
            })
        }
    }
}

fn join(a: &Frame, b: &Frame, vertical: bool) -> Frame {
    a.map_planes(|i, p| {
        if vertical {
            p.stack_vertical(&b.planes[i])
        } else {
            p.stack_horizontal(&b.planes[i])
        }
    })
}

fn pad_flat(frame: &Frame, pad: Edges<u32>) -> Frame {
    let format = frame.format;
    frame.map_planes(|i, p| {
        let (sw, sh) = format.plane_shift(i);
        p.pad(
            pad.left >> sw,
            pad.right >> sw,
            pad.top >> sh,
            pad.bottom >> sh,
            format.border_value(i),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::LumaLineLevels;
    use edgefix_core::VideoFormat;

    fn picture() -> Frame {
        Frame::from_fn(16, 12, VideoFormat::YUV420P8, |i, x, y| match i {
            0 => 100 + (x + y) as u16,
            1 => 180,
            _ => 90,
        })
        .unwrap()
    }

    #[test]
    fn test_odd_thickness_rejected() {
        let err = add_borders(&picture(), Edges::new(3, 0, 0, 0), &LumaLineLevels).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_frame_too_small_for_seam() {
        let narrow = Frame::from_fn(1, 8, VideoFormat::GRAY8, |_, _, _| 100).unwrap();
        let err = add_borders(&narrow, Edges::new(2, 0, 0, 0), &LumaLineLevels).unwrap_err();
        assert!(err.is_configuration());
        let flat = Frame::from_fn(8, 1, VideoFormat::GRAY8, |_, _, _| 100).unwrap();
        assert!(add_borders(&flat, Edges::new(0, 0, 0, 2), &LumaLineLevels).is_err());
        assert_eq!(add_borders(&flat, Edges::new(2, 2, 0, 0), &LumaLineLevels).unwrap().width, 12);
    }

    #[test]
    fn test_output_geometry() {
        let out = add_borders(&picture(), Edges::new(2, 4, 0, 6), &LumaLineLevels).unwrap();
        assert_eq!((out.width, out.height), (22, 18));
        assert_eq!(out.planes[1].width, 11);
    }

    #[test]
    fn test_seam_lines() {
        let frame = picture();
        let out = add_borders(&frame, Edges::new(0, 0, 4, 0), &LumaLineLevels).unwrap();
        // Two blackened seam rows, then flat black on the outside.
        assert!(out.planes[0].row(2).iter().all(|&v| v == 16));
        assert!(out.planes[0].row(3).iter().all(|&v| v == 16));
        assert!(out.planes[0].row(0).iter().all(|&v| v == 16));
        // Seam chroma is desaturated: 128 + (180 - 128) * 0.4 = 148.8.
        assert_eq!(out.planes[1].get(0, 1), 149);
        assert_eq!(out.planes[2].get(0, 1), 113);
        assert_eq!(out.planes[1].get(0, 0), 128);
        // The picture itself is untouched.
        assert_eq!(out.planes[0].row(4), frame.planes[0].row(0));
    }

    #[test]
    fn test_clip_geometry_known_up_front() {
        let clip = Clip::repeat(picture(), 3, Default::default());
        let out = add_borders_clip(&clip, Edges::new(2, 2, 0, 0), Arc::new(LumaLineLevels)).unwrap();
        assert_eq!(out.info().width, 20);
        assert_eq!(out.frame(2).unwrap().width, 20);
        assert!(add_borders_clip(&clip, Edges::new(0, 1, 0, 0), Arc::new(LumaLineLevels)).is_err());
    }
}
