//! Hot-path benchmarks: the per-event cost of an active lock session.

use criterion::{criterion_group, criterion_main, Criterion};

use envlens_core::{CompareController, SessionSource, Strategy};
use envlens_dom::{DomEvent, PageSpec, SimDom};
use envlens_proto::FrameMessage;
use envlens_types::SlotId;

const QUERY: &str = "env1=https%3A%2F%2Fa.example.com%2F&env2=https%3A%2F%2Fb.example.com%2F";

fn booted(spec1: PageSpec, spec2: PageSpec) -> (SimDom, CompareController) {
    let mut sim = SimDom::new();
    sim.stage_page("https://a.example.com/", spec1);
    sim.stage_page("https://b.example.com/", spec2);
    let mut controller = CompareController::new(&mut sim);
    controller
        .init(&mut sim, SessionSource::Query(QUERY))
        .unwrap();
    sim.advance(20);
    while let Some(event) = sim.poll_event() {
        controller.handle_event(&mut sim, event);
    }
    controller.toggle_lock(&mut sim);
    sim.drain_events();
    (sim, controller)
}

fn bench_transform_scroll(c: &mut Criterion) {
    let tall = PageSpec {
        content_height: 40_000.0,
        ..PageSpec::default()
    };
    let (mut sim, mut controller) = booted(tall.clone(), tall);
    assert_eq!(controller.sync_state().strategy, Strategy::Transform);
    let w1 = controller.transform_wrapper(SlotId::Env1).unwrap();

    let mut offset = 0.0;
    c.bench_function("transform scroll event", |b| {
        b.iter(|| {
            offset = if offset > 30_000.0 { 0.0 } else { offset + 17.0 };
            sim.advance(20); // let the guard window expire between events
            sim.user_scroll(w1, offset);
            while let Some(event) = sim.poll_event() {
                controller.handle_event(&mut sim, event);
            }
            controller.tick(&mut sim);
        })
    });
}

fn bench_relay_message(c: &mut Criterion) {
    let near = PageSpec {
        content_height: 40_000.0,
        ..PageSpec::default()
    };
    let far = PageSpec {
        content_height: 40_000.0,
        cross_origin: true,
        ..PageSpec::default()
    };
    let (mut sim, mut controller) = booted(near, far);
    assert_eq!(controller.sync_state().strategy, Strategy::Relay);
    let f1 = controller.frames().frame(SlotId::Env1).unwrap();

    let mut y = 0.0;
    c.bench_function("relay scroll message", |b| {
        b.iter(|| {
            y = if y > 30_000.0 { 0.0 } else { y + 17.0 };
            sim.advance(60); // past the companion emit throttle
            controller.handle_event(
                &mut sim,
                DomEvent::Message {
                    frame: f1,
                    message: FrameMessage::ScrollAbsolute {
                        frame_id: SlotId::Env1,
                        x: 0.0,
                        y,
                    },
                },
            );
            while let Some(event) = sim.poll_event() {
                controller.handle_event(&mut sim, event);
            }
        })
    });
}

criterion_group!(benches, bench_transform_scroll, bench_relay_message);
criterion_main!(benches);
