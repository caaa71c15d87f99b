use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use gazecue_core::{Frame, ImageId, TargetSide};
use gazecue_render::{Layout, SkiaRenderer, load_font};
use gazecue_timing::HighPrecisionTimer;
use tiny_skia::{Color, Pixmap};

const WIDTH: u32 = 1920;
const HEIGHT: u32 = 1080;

fn images() -> Vec<Pixmap> {
    let mut stimulus = Pixmap::new(400, 400).unwrap();
    stimulus.fill(Color::from_rgba8(120, 90, 60, 255));
    let mut target = Pixmap::new(100, 100).unwrap();
    target.fill(Color::from_rgba8(0, 0, 0, 200));
    vec![stimulus, target]
}

fn harness() -> (SkiaRenderer, Vec<u8>, HighPrecisionTimer) {
    let renderer =
        SkiaRenderer::new(WIDTH, HEIGHT, Layout::default(), load_font(None).unwrap()).unwrap();
    let fb = vec![0u8; (WIDTH * HEIGHT * 4) as usize];
    (renderer, fb, HighPrecisionTimer::new())
}

pub fn bench_frames(c: &mut Criterion) {
    let images = images();
    let mut g = c.benchmark_group("render_frame");
    g.sample_size(40);

    let target_frame = Frame {
        fixation: true,
        stimulus: Some(ImageId(0)),
        target: Some((ImageId(1), TargetSide::Left)),
        rest_message: false,
    };
    g.bench_function("target_frame", |b| {
        b.iter_batched(
            harness,
            |(mut r, mut fb, mut t)| {
                let stats = r.render_frame(&target_frame, &images, &[], &mut fb, &mut t);
                black_box(stats)
            },
            BatchSize::LargeInput,
        )
    });

    // text is cached after the first frame, so reuse one renderer
    let (mut r, mut fb, mut t) = harness();
    let overlay = vec!["participant_id: 1".to_string(), "Trial 10 / 48".to_string()];
    g.bench_function("rest_frame_with_overlay", |b| {
        b.iter(|| black_box(r.render_frame(&Frame::rest(), &images, &overlay, &mut fb, &mut t)))
    });

    g.finish();
}

criterion_group!(benches, bench_frames);
criterion_main!(benches);
