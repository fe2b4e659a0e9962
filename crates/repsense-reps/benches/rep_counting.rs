//! Benchmarks for the rep counting pipeline.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use repsense_core::{joint_angle, ExerciseCatalog, Point2D, PoseFrame};
use repsense_reps::{ExerciseSummarizer, MultiExerciseSelector, RepetitionCounter, SyntheticCurl};

fn create_frames(count: u64) -> Vec<PoseFrame> {
    SyntheticCurl::default().frames(count).collect()
}

fn benchmark_angle(c: &mut Criterion) {
    let a = Point2D::new(320.0, 200.0);
    let b = Point2D::new(320.0, 300.0);
    let w = Point2D::new(400.0, 260.0);

    c.bench_function("joint_angle", |bench| {
        bench.iter(|| joint_angle(black_box(a), black_box(b), black_box(w)))
    });
}

fn benchmark_counter(c: &mut Criterion) {
    let frames = create_frames(1_000);
    let catalog = ExerciseCatalog::default();
    let config = catalog.get("bicep_curl").unwrap();

    c.bench_function("counter_1000_frames", |bench| {
        bench.iter(|| {
            let mut counter = RepetitionCounter::from_config(config);
            for frame in &frames {
                counter.update(black_box(frame));
            }
            counter.rep_count()
        })
    });

    let mut counter = RepetitionCounter::from_config(config);
    for frame in &frames {
        counter.update(frame);
    }
    let summarizer = ExerciseSummarizer::default();

    c.bench_function("summarize_1000_frames", |bench| {
        bench.iter(|| summarizer.summarize(black_box(&counter)))
    });
}

fn benchmark_selector(c: &mut Criterion) {
    let frames = create_frames(1_000);
    let catalog = ExerciseCatalog::default();

    c.bench_function("selector_1000_frames", |bench| {
        bench.iter(|| {
            let mut selector = MultiExerciseSelector::from_catalog(&catalog);
            for frame in &frames {
                black_box(selector.update(black_box(frame)));
            }
        })
    });
}

criterion_group!(benches, benchmark_angle, benchmark_counter, benchmark_selector);
criterion_main!(benches);
