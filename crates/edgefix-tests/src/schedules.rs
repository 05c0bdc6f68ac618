//! Schedule files on disk.

use std::io::Write;

use edgefix_core::{Clip, EdgefixError, Frame, FrameRate, VideoFormat};
use edgefix_zones::{extract_frames, CropZone, DebandZone, ExtractZone, Schedule};

fn write_schedule(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn crop_schedule_with_comments_and_fills() {
    let file = write_schedule("# opening titles\n0 239 0 0 138 138\n\n240 300 2 2 140 140 0 0 2 2\n");
    let schedule = Schedule::<CropZone>::load(file.path()).unwrap();
    assert_eq!(schedule.len(), 2);
    assert_eq!(schedule.zones[1].fill.bottom, 2);
}

#[test]
fn malformed_row_reports_file_and_line() {
    let file = write_schedule("0 10 2 2 2 2\n# note\n11 20 2 2 2 2 2\n");
    let err = Schedule::<CropZone>::load(file.path()).unwrap_err();
    match &err {
        EdgefixError::Schedule { path, line, .. } => {
            assert_eq!(path, file.path());
            assert_eq!(*line, 3);
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(err.to_string().contains(":3:"));
}

#[test]
fn missing_schedule_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = Schedule::<DebandZone>::load(&dir.path().join("deband.txt")).unwrap_err();
    assert!(matches!(err, EdgefixError::NotFound(_)));
}

#[test]
fn extraction_from_file() {
    let file = write_schedule("4 5 first\n0 0\n");
    let schedule = Schedule::<ExtractZone>::load(file.path()).unwrap();
    let frames: Vec<Frame> = (0..8)
        .map(|n| Frame::from_fn(2, 2, VideoFormat::GRAY8, |_, _, _| n).unwrap())
        .collect();
    let clip = Clip::from_frames(frames, FrameRate::FPS_24).unwrap();
    let out = extract_frames(&clip, &schedule).unwrap();
    let values: Vec<u16> = (0..out.len())
        .map(|n| out.frame(n).unwrap().planes[0].get(0, 0))
        .collect();
    assert_eq!(values, vec![4, 5, 0]);
}
