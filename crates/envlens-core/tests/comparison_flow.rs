//! End-to-end comparison scenarios over the simulated host.

use envlens_core::sync::GUARD_MS;
use envlens_core::{CompareController, LoadState, SessionSource, Strategy};
use envlens_dom::{DomEvent, DomHost, PageSpec, SimDom, StyleProp};
use envlens_proto::FrameMessage;
use envlens_types::SlotId;

const QUERY: &str = "env1=https%3A%2F%2Fa.example.com%2F&env2=https%3A%2F%2Fb.example.com%2F\
                     &env1Name=Production&env2Name=Staging";

const FRAME_STYLES: [StyleProp; 7] = [
    StyleProp::Position,
    StyleProp::Height,
    StyleProp::Overflow,
    StyleProp::Transform,
    StyleProp::Top,
    StyleProp::Left,
    StyleProp::Width,
];

fn staged_sim(spec1: PageSpec, spec2: PageSpec) -> SimDom {
    let mut sim = SimDom::new();
    sim.stage_page("https://a.example.com/", spec1);
    sim.stage_page("https://b.example.com/", spec2);
    sim
}

fn same_origin(height: f64) -> PageSpec {
    PageSpec {
        content_height: height,
        ..PageSpec::default()
    }
}

fn cross_origin(height: f64) -> PageSpec {
    PageSpec {
        content_height: height,
        cross_origin: true,
        ..PageSpec::default()
    }
}

fn pump(sim: &mut SimDom, controller: &mut CompareController) {
    loop {
        let Some(event) = sim.poll_event() else { break };
        controller.handle_event(sim, event);
    }
}

/// Boot a comparison to the both-slots-loaded state.
fn booted(sim: &mut SimDom) -> CompareController {
    let mut controller = CompareController::new(sim);
    controller.init(sim, SessionSource::Query(QUERY)).unwrap();
    sim.advance(20);
    pump(sim, &mut controller);
    assert_eq!(controller.frames().load_state(SlotId::Env1), LoadState::Loaded);
    assert_eq!(controller.frames().load_state(SlotId::Env2), LoadState::Loaded);
    controller
}

#[test]
fn every_slot_reaches_exactly_one_terminal_state() {
    let mut sim = staged_sim(same_origin(4000.0), same_origin(4000.0));
    let mut controller = CompareController::new(&mut sim);
    controller.init(&mut sim, SessionSource::Query(QUERY)).unwrap();

    sim.advance(20);
    pump(&mut sim, &mut controller);
    for slot in SlotId::BOTH {
        assert_eq!(controller.frames().load_state(slot), LoadState::Loaded);
        assert!(!sim.is_visible(controller.slot_spinner(slot)));
        assert!(!sim.is_visible(controller.slot_error_box(slot)));
    }

    // Much later, nothing flips a slot out of its terminal state.
    sim.advance(120_000);
    controller.tick(&mut sim);
    pump(&mut sim, &mut controller);
    for slot in SlotId::BOTH {
        assert_eq!(controller.frames().load_state(slot), LoadState::Loaded);
        assert!(!sim.is_visible(controller.slot_error_box(slot)));
    }
}

#[test]
fn missing_input_shows_errors_and_loads_nothing() {
    let mut sim = staged_sim(same_origin(4000.0), same_origin(4000.0));
    let mut controller = CompareController::new(&mut sim);
    let result = controller.init(
        &mut sim,
        SessionSource::Query("env2=https%3A%2F%2Fb.example.com%2F"),
    );
    assert!(result.is_err());
    for slot in SlotId::BOTH {
        assert!(sim.is_visible(controller.slot_error_box(slot)));
        assert!(controller.frames().frame(slot).is_none());
    }
}

#[test]
fn enable_then_disable_restores_frame_styles() {
    let mut sim = staged_sim(same_origin(4000.0), same_origin(4000.0));
    let mut controller = booted(&mut sim);

    let snapshot = |sim: &SimDom, controller: &CompareController| -> Vec<Option<String>> {
        SlotId::BOTH
            .iter()
            .flat_map(|&slot| {
                let frame = controller.frames().frame(slot).unwrap();
                FRAME_STYLES
                    .iter()
                    .map(move |&p| sim.style(frame, p).unwrap())
                    .collect::<Vec<_>>()
            })
            .collect()
    };

    let before = snapshot(&sim, &controller);
    controller.toggle_lock(&mut sim);
    assert_eq!(controller.sync_state().strategy, Strategy::Transform);
    controller.toggle_lock(&mut sim);
    let after = snapshot(&sim, &controller);

    assert_eq!(before, after);
    // Wrappers are gone; frames sit in their containers again.
    for slot in SlotId::BOTH {
        let frame = controller.frames().frame(slot).unwrap();
        assert_eq!(
            sim.parent(frame).unwrap(),
            Some(controller.frames().container(slot))
        );
    }
}

#[test]
fn transform_round_trip_converges_within_guard_window() {
    let mut sim = staged_sim(same_origin(4000.0), same_origin(4000.0));
    let mut controller = booted(&mut sim);
    controller.toggle_lock(&mut sim);
    sim.drain_events();

    let w1 = controller.transform_wrapper(SlotId::Env1).unwrap();
    let w2 = controller.transform_wrapper(SlotId::Env2).unwrap();
    sim.user_scroll(w1, 1000.0);
    pump(&mut sim, &mut controller);
    sim.advance(GUARD_MS);
    controller.tick(&mut sim);
    pump(&mut sim, &mut controller);

    assert!((sim.scroll_top(w2).unwrap() - 1000.0).abs() <= 1.0);
    for slot in SlotId::BOTH {
        let frame = controller.frames().frame(slot).unwrap();
        assert_eq!(
            sim.style(frame, StyleProp::Transform).unwrap().as_deref(),
            Some("translateY(-1000px)")
        );
    }
}

#[test]
fn programmatic_write_produces_no_echo_write() {
    let mut sim = staged_sim(same_origin(4000.0), same_origin(4000.0));
    let mut controller = booted(&mut sim);
    controller.toggle_lock(&mut sim);
    sim.drain_events();
    sim.reset_scroll_write_count();

    let w1 = controller.transform_wrapper(SlotId::Env1).unwrap();
    sim.user_scroll(w1, 600.0);
    pump(&mut sim, &mut controller);

    // One synchronized write to the other wrapper; its echo event is
    // suppressed by the guard and produces no write back.
    assert_eq!(sim.scroll_write_count(), 1);
}

#[test]
fn relay_applies_absolute_position_idempotently() {
    let mut sim = staged_sim(same_origin(4000.0), cross_origin(4000.0));
    let mut controller = booted(&mut sim);
    controller.toggle_lock(&mut sim);
    assert_eq!(controller.sync_state().strategy, Strategy::Relay);

    let f1 = controller.frames().frame(SlotId::Env1).unwrap();
    let f2 = controller.frames().frame(SlotId::Env2).unwrap();
    let message = FrameMessage::ScrollAbsolute {
        frame_id: SlotId::Env1,
        x: 0.0,
        y: 500.0,
    };
    controller.handle_event(
        &mut sim,
        DomEvent::Message {
            frame: f1,
            message: message.clone(),
        },
    );
    assert_eq!(sim.page_scroll(f2).unwrap(), (0.0, 500.0));

    // The same absolute report again lands on 500, not 1000.
    sim.advance(100);
    controller.handle_event(&mut sim, DomEvent::Message { frame: f1, message });
    assert_eq!(sim.page_scroll(f2).unwrap(), (0.0, 500.0));
}

#[test]
fn relay_round_trip_from_user_scroll() {
    let mut sim = staged_sim(same_origin(4000.0), cross_origin(4000.0));
    let mut controller = booted(&mut sim);
    controller.toggle_lock(&mut sim);
    assert_eq!(controller.sync_state().strategy, Strategy::Relay);

    let f1 = controller.frames().frame(SlotId::Env1).unwrap();
    let f2 = controller.frames().frame(SlotId::Env2).unwrap();
    sim.page_user_scroll(f1, 750.0);
    pump(&mut sim, &mut controller);
    assert_eq!(sim.page_scroll(f2).unwrap(), (0.0, 750.0));

    // No ping-pong: the applied scroll does not come back to move env1.
    pump(&mut sim, &mut controller);
    assert_eq!(sim.page_scroll(f1).unwrap(), (0.0, 750.0));
}

#[test]
fn disable_mid_scroll_cancels_queued_write() {
    let mut sim = staged_sim(same_origin(4000.0), same_origin(4000.0));
    let mut controller = booted(&mut sim);
    controller.toggle_lock(&mut sim);
    sim.drain_events();

    let w1 = controller.transform_wrapper(SlotId::Env1).unwrap();
    sim.user_scroll(w1, 400.0);
    pump(&mut sim, &mut controller);
    // A second scroll inside the guard leaves a queued realignment.
    sim.user_scroll(w1, 900.0);
    pump(&mut sim, &mut controller);

    controller.toggle_lock(&mut sim);
    sim.drain_events();
    sim.reset_scroll_write_count();
    sim.advance(GUARD_MS * 4);
    controller.tick(&mut sim);
    assert_eq!(sim.scroll_write_count(), 0);
}

#[test]
fn wheel_fallback_scrolls_both_content_windows() {
    let spec = PageSpec {
        content_height: 4000.0,
        cross_origin: true,
        companion_capable: false,
        scriptable: true,
        ..PageSpec::default()
    };
    let mut sim = staged_sim(spec.clone(), spec);
    let mut controller = booted(&mut sim);
    controller.toggle_lock(&mut sim);
    assert_eq!(controller.sync_state().strategy, Strategy::WheelFallback);

    sim.user_wheel(0.0, 100.0);
    pump(&mut sim, &mut controller);
    for slot in SlotId::BOTH {
        let frame = controller.frames().frame(slot).unwrap();
        let (_, y) = sim.page_scroll(frame).unwrap();
        assert_eq!(y, 150.0);
    }
}

#[test]
fn load_timeout_fails_only_the_slow_slot() {
    let mut sim = SimDom::new();
    sim.stage_page("https://a.example.com/", same_origin(4000.0));
    sim.stage_page(
        "https://b.example.com/",
        PageSpec {
            load: envlens_dom::LoadBehavior::Hang,
            ..PageSpec::default()
        },
    );
    let mut controller = CompareController::new(&mut sim);
    controller.init(&mut sim, SessionSource::Query(QUERY)).unwrap();
    sim.advance(20);
    pump(&mut sim, &mut controller);
    assert_eq!(controller.frames().load_state(SlotId::Env1), LoadState::Loaded);

    sim.advance(envlens_core::LOAD_TIMEOUT_MS);
    controller.tick(&mut sim);
    assert_eq!(controller.frames().load_state(SlotId::Env2), LoadState::Error);
    assert!(sim.is_visible(controller.slot_error_box(SlotId::Env2)));
    assert!(!sim.is_visible(controller.slot_error_box(SlotId::Env1)));
}
