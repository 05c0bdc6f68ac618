//! Benchmarks for edgefix-core frame operations.
//!
//! Run with: cargo bench -p edgefix-core

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use edgefix_core::{Clip, Frame, FrameRate, VideoFormat};

fn bench_plane_reorientation(c: &mut Criterion) {
    let frame = Frame::test_pattern(1920, 1080, VideoFormat::YUV420P10).unwrap();
    let luma = frame.primary_plane();

    c.bench_function("transpose_1080p_luma", |bencher| {
        bencher.iter(|| black_box(luma).transpose());
    });

    c.bench_function("flip_vertical_1080p_luma", |bencher| {
        bencher.iter(|| black_box(luma).flip_vertical());
    });
}

fn bench_crop(c: &mut Criterion) {
    let frame = Frame::test_pattern(1920, 1080, VideoFormat::YUV420P10).unwrap();

    c.bench_function("crop_letterbox_1080p", |bencher| {
        bencher.iter(|| black_box(&frame).crop(0, 0, 140, 140).unwrap());
    });
}

fn bench_parallel_render(c: &mut Criterion) {
    let frame = Frame::test_pattern(640, 360, VideoFormat::YUV420P8).unwrap();
    let clip = Clip::repeat(frame, 64, FrameRate::FPS_24)
        .map_same(|f| Ok(f.map_planes(|_, p| p.flip_horizontal())));

    c.bench_function("frames_parallel_64", |bencher| {
        bencher.iter(|| clip.frames_parallel(0..64).unwrap());
    });
}

criterion_group!(benches, bench_plane_reorientation, bench_crop, bench_parallel_render);
criterion_main!(benches);
