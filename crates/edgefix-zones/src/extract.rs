//! Frame extraction by schedule.

use tracing::info;

use edgefix_core::{Clip, EdgefixError, Result};

use crate::schedule::{ExtractZone, Schedule};

/// Concatenate the scheduled ranges in file order.
pub fn extract_frames(clip: &Clip, schedule: &Schedule<ExtractZone>) -> Result<Clip> {
    if schedule.is_empty() {
        return Err(EdgefixError::invalid(format!(
            "{} selects no frames",
            schedule.path.display()
        )));
    }
    let parts = schedule
        .ranges()
        .map(|range| clip.trim(range))
        .collect::<Result<Vec<_>>>()?;
    let out = Clip::concat(&parts)?;
    info!(ranges = parts.len(), frames = out.len(), "extracted frames");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgefix_core::{ClipInfo, Frame, FrameRate, VideoFormat};

    fn counting(n: u32) -> Clip {
        let info = ClipInfo {
            format: VideoFormat::GRAY16,
            width: 2,
            height: 2,
            num_frames: n,
            frame_rate: FrameRate::FPS_24,
        };
        Clip::from_fn(info, |i| Frame::from_fn(2, 2, VideoFormat::GRAY16, |_, _, _| i as u16))
    }

    #[test]
    fn test_ranges_in_file_order() {
        let schedule = Schedule::parse("extract.txt", "10 11 keep\n2 3\n").unwrap();
        let out = extract_frames(&counting(20), &schedule).unwrap();
        let order: Vec<u16> = (0..out.len())
            .map(|n| out.frame(n).unwrap().planes[0].get(0, 0))
            .collect();
        assert_eq!(order, vec![10, 11, 2, 3]);
    }

    #[test]
    fn test_empty_or_out_of_range() {
        let empty = Schedule::parse("extract.txt", "# nothing\n").unwrap();
        assert!(extract_frames(&counting(5), &empty).unwrap_err().is_configuration());
        let past = Schedule::parse("extract.txt", "3 5\n").unwrap();
        assert!(extract_frames(&counting(5), &past).is_err());
    }
}
