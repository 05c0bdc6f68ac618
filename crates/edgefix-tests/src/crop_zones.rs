//! Crop schedules applied to whole clips.

use edgefix_core::{Clip, ClipInfo, Edges, Frame, FrameRate, SourceWindow, VideoFormat};
use edgefix_filters::{
    add_borders, balance, BalanceParams, CpuResampler, CropResizeParams, LumaLineLevels,
    Resampler, ResizeKernel, Services,
};
use edgefix_zones::{crop_resize_reader, CropReaderParams, CropResizeReader, Schedule};

fn flat_clip(frames: u32) -> Clip {
    let frame = Frame::from_fn(64, 64, VideoFormat::YUV420P8, |i, _, _| if i == 0 { 200 } else { 128 })
        .unwrap();
    Clip::repeat(frame, frames, FrameRate::FPS_24)
}

fn luma(clip: &Clip, n: u32, x: u32, y: u32) -> u16 {
    clip.frame(n).unwrap().planes[0].get(x, y)
}

#[test]
fn later_zone_wins_on_overlap() {
    let clip = flat_clip(100);
    let schedule = Schedule::parse("crop.txt", "0 99 10 10 10 10\n40 59 20 20 20 20\n").unwrap();
    let out = crop_resize_reader(&clip, &schedule, CropReaderParams::default(), &Services::cpu()).unwrap();

    for n in [0, 39, 60, 99] {
        assert_eq!(luma(&out, n, 15, 32), 200, "frame {n}");
        assert_eq!(luma(&out, n, 5, 32), 16, "frame {n}");
    }
    for n in [40, 50, 59] {
        assert_eq!(luma(&out, n, 15, 32), 16, "frame {n}");
        assert_eq!(luma(&out, n, 32, 32), 200, "frame {n}");
    }
}

#[test]
fn constant_output_size_across_zones() {
    let clip = flat_clip(100);
    let schedule = Schedule::parse("crop.txt", "0 49 10 10 10 10\n50 99 20 20 20 20\n").unwrap();
    let params = CropReaderParams {
        width: Some(32),
        ..CropReaderParams::default()
    };
    let reader = CropResizeReader::new(*clip.info(), &schedule, params, Services::cpu()).unwrap();
    let plan = reader.plan();
    assert_eq!(plan.zones[0].crop_resize.window.width, 44.0);
    assert_eq!(plan.zones[1].crop_resize.window.width, 24.0);
    assert_eq!(plan.zones[0].borders.left, 4);
    assert_eq!(plan.zones[1].borders.left, 10);

    let out = reader.apply(&clip).unwrap();
    for n in 0..100 {
        let f = out.frame(n).unwrap();
        assert_eq!((f.width, f.height), (32, 32));
    }
}

#[test]
fn no_zones_is_the_default_path() {
    let frame = Frame::test_pattern(64, 64, VideoFormat::YUV420P8).unwrap();
    let clip = Clip::repeat(frame.clone(), 100, FrameRate::FPS_24);
    let schedule = Schedule::parse("crop.txt", "").unwrap();
    let params = CropReaderParams {
        width: Some(32),
        ..CropReaderParams::default()
    };
    let out = crop_resize_reader(&clip, &schedule, params, &Services::cpu()).unwrap();
    let direct = CpuResampler
        .resample(&frame, 32, 32, SourceWindow::full(64, 64), &ResizeKernel::Spline36)
        .unwrap();
    for n in [0, 50, 99] {
        assert_eq!(out.frame(n).unwrap(), direct);
    }
}

#[test]
fn parallel_render_matches_sequential() {
    let clip = Clip::repeat(
        Frame::test_pattern(64, 64, VideoFormat::YUV420P10).unwrap(),
        24,
        FrameRate::FPS_24,
    );
    let schedule = Schedule::parse("crop.txt", "0 11 3 5 2 1\n6 20 12 12 0 0 2 0 0 0\n").unwrap();
    let params = CropReaderParams {
        width: Some(48),
        balance: Some(BalanceParams::new(Edges::uniform(1))),
        ..CropReaderParams::default()
    };
    let out = crop_resize_reader(&clip, &schedule, params, &Services::cpu()).unwrap();
    let parallel = out.frames_parallel(0..24).unwrap();
    for (n, frame) in parallel.iter().enumerate() {
        assert_eq!(frame, &out.frame(n as u32).unwrap());
    }
}

#[test]
fn fill_beyond_crop_is_rejected_up_front() {
    let info = ClipInfo {
        format: VideoFormat::YUV420P8,
        width: 64,
        height: 64,
        num_frames: 10,
        frame_rate: FrameRate::FPS_24,
    };
    let schedule = Schedule::parse("crop.txt", "0 9 4 4 4 4 6 0 0 0\n").unwrap();
    let err = CropResizeReader::new(info, &schedule, CropReaderParams::default(), Services::cpu()).unwrap_err();
    assert!(err.is_configuration());

    let params = CropResizeParams {
        crop: Edges::new(2, 0, 0, 0),
        fill: Edges::new(0, 3, 0, 0),
        ..CropResizeParams::default()
    };
    assert!(edgefix_filters::crop_resize(&flat_clip(2), params, &Services::cpu()).is_err());
}

#[test]
fn balance_stays_within_threshold() {
    let frame = Frame::from_fn(48, 32, VideoFormat::YUV420P10, |i, x, y| {
        if i == 0 && (x == 0 || y == 31) {
            90
        } else if i == 0 {
            600 + x as u16 * 3
        } else {
            512 + y as u16
        }
    })
    .unwrap();
    let params = BalanceParams {
        threshold: 12,
        ..BalanceParams::new(Edges::new(1, 0, 0, 1))
    };
    let out = balance(&frame, &params).unwrap();
    // 12 levels at 10 bits.
    for (a, b) in frame.planes.iter().zip(out.planes.iter()) {
        for (&x, &y) in a.data.iter().zip(b.data.iter()) {
            assert!((x as i32 - y as i32).abs() <= 48);
        }
    }
    assert_eq!(balance(&frame, &BalanceParams::new(Edges::uniform(0))).unwrap(), frame);
}

#[test]
fn odd_border_is_rejected() {
    let frame = Frame::test_pattern(16, 16, VideoFormat::YUV420P8).unwrap();
    let err = add_borders(&frame, Edges::new(3, 0, 0, 0), &LumaLineLevels).unwrap_err();
    assert!(err.is_configuration());
}
