use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use drivecheck_core::{PerceptionPhase, PerceptionSnapshot, PumpPhase, PumpSnapshot, Snapshot};
use drivecheck_render::{Renderer as _, Scene, SkiaRenderer};

fn harness() -> (SkiaRenderer, Vec<u8>) {
    let width = 1280u32;
    let height = 720u32;
    let renderer = SkiaRenderer::new(width, height).expect("renderer");
    let fb = vec![0u8; (width * height * 4) as usize];
    (renderer, fb)
}

fn perception(position_x: f64) -> Snapshot {
    Snapshot::Perception(PerceptionSnapshot {
        phase: PerceptionPhase::Running,
        elapsed_ms: 1200.0,
        position_x,
        car_visible: true,
        countdown: None,
        collided: false,
    })
}

pub fn bench_frames(c: &mut Criterion) {
    let mut g = c.benchmark_group("render_frame");
    g.sample_size(40);

    g.bench_function("perception_running", |b| {
        let first = perception(120.0);
        let second = perception(124.0);
        b.iter_batched(
            harness,
            |(mut r, mut fb)| {
                for snapshot in [&first, &second] {
                    let scene = Scene::Trial {
                        snapshot,
                        completed: 2,
                        total: 5,
                    };
                    black_box(r.render_frame(&scene, &mut fb).expect("frame"));
                }
            },
            BatchSize::SmallInput,
        )
    });

    g.bench_function("pump_exploded", |b| {
        let snapshot = Snapshot::FuelPump(PumpSnapshot {
            phase: PumpPhase::Exploded,
            elapsed_ms: 4200.0,
            level_pct: 100.0,
            pumps: 17,
            trial_points: 0,
        });
        b.iter_batched(
            harness,
            |(mut r, mut fb)| {
                let scene = Scene::Trial {
                    snapshot: &snapshot,
                    completed: 1,
                    total: 3,
                };
                black_box(r.render_frame(&scene, &mut fb).expect("frame"));
            },
            BatchSize::SmallInput,
        )
    });

    g.finish();
}

criterion_group!(benches, bench_frames);
criterion_main!(benches);
