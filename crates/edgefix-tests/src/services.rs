//! Injected services and error propagation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use edgefix_core::{Clip, ClipInfo, EdgefixError, Frame, FrameRate, Result, SourceWindow, VideoFormat};
use edgefix_filters::{
    auto_gamma, CpuResampler, DebandParams, Debander, Resampler, ResizeKernel, Services,
};
use edgefix_zones::{crop_resize_reader, deband_reader, CropReaderParams, DebandReaderParams, Schedule};

#[derive(Default)]
struct CountingResampler {
    calls: AtomicUsize,
}

impl Resampler for CountingResampler {
    fn resample(
        &self,
        frame: &Frame,
        width: u32,
        height: u32,
        window: SourceWindow,
        kernel: &ResizeKernel,
    ) -> Result<Frame> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        CpuResampler.resample(frame, width, height, window, kernel)
    }
}

/// Leaves frames alone and records the strengths it was asked for.
#[derive(Default)]
struct RecordingDebander {
    strengths: std::sync::Mutex<Vec<u32>>,
}

impl Debander for RecordingDebander {
    fn deband(&self, frame: &Frame, _index: u32, params: &DebandParams) -> Result<Frame> {
        if let Ok(mut s) = self.strengths.lock() {
            s.push(params.strength_y);
        }
        Ok(frame.clone())
    }
}

fn info(frames: u32) -> ClipInfo {
    ClipInfo {
        format: VideoFormat::YUV420P8,
        width: 32,
        height: 32,
        num_frames: frames,
        frame_rate: FrameRate::FPS_24,
    }
}

#[test]
fn injected_resampler_is_used() {
    let counter = Arc::new(CountingResampler::default());
    let services = Services::cpu().with_resampler(counter.clone());
    let clip = Clip::repeat(Frame::test_pattern(32, 32, VideoFormat::YUV420P8).unwrap(), 4, FrameRate::FPS_24);
    let schedule = Schedule::parse("crop.txt", "0 1 4 4 4 4\n").unwrap();
    let params = CropReaderParams {
        width: Some(16),
        ..CropReaderParams::default()
    };
    let out = crop_resize_reader(&clip, &schedule, params, &services).unwrap();
    for n in 0..4 {
        out.frame(n).unwrap();
    }
    assert_eq!(counter.calls.load(Ordering::SeqCst), 4);
}

#[test]
fn injected_debander_gets_zone_strength() {
    let debander = Arc::new(RecordingDebander::default());
    let services = Services::cpu().with_debander(debander.clone());
    let clip = Clip::repeat(Frame::new(32, 32, VideoFormat::YUV420P8).unwrap(), 6, FrameRate::FPS_24);
    let schedule = Schedule::parse("deband.txt", "0 1 32\n4 4 80\n").unwrap();
    let out = deband_reader(&clip, &schedule, DebandReaderParams::default(), &services).unwrap();
    for n in 0..6 {
        out.frame(n).unwrap();
    }
    let seen = debander.strengths.lock().unwrap().clone();
    assert_eq!(seen, vec![32, 32, 80]);
}

#[test]
fn source_failure_propagates_unchanged() {
    let clip = Clip::from_fn(info(8), |n| {
        if n == 3 {
            Err(EdgefixError::Source("decoder went away".into()))
        } else {
            Frame::new(32, 32, VideoFormat::YUV420P8)
        }
    });
    let schedule = Schedule::parse("crop.txt", "2 5 4 4 0 0\n").unwrap();
    let out = crop_resize_reader(&clip, &schedule, CropReaderParams::default(), &Services::cpu()).unwrap();
    assert!(out.frame(2).is_ok());
    let err = out.frame(3).unwrap_err();
    assert!(matches!(err, EdgefixError::Source(ref m) if m == "decoder went away"));
    assert!(!err.is_configuration());

    let gamma = auto_gamma(&clip, 1.3, 0.4).unwrap();
    assert!(matches!(gamma.frame(3), Err(EdgefixError::Source(_))));
}
