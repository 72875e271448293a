//! Integration tests for touchstone.
//!
//! These drive complete managers with scripted raw input and check the
//! emitted gesture events.

use proptest::prelude::*;
use touchstone::{
    InputClass, InputOutcome, ManagerOptions, RecognizerOptions, RecognizerSpec, RecognizerState,
    RecognizerType, SetOptions, StopMode,
};
use touchstone_core::{
    Direction, ElementId, ElementTree, MouseInput, MouseKind, Point, PointerKind, PointerType, RawInput, Touch,
    TouchKind,
};
use touchstone_test::{Harness, Script, ROOT};

fn options(input_class: InputClass, recognizers: Vec<RecognizerSpec>) -> ManagerOptions {
    ManagerOptions {
        input_class: Some(input_class),
        recognizers,
        ..ManagerOptions::default()
    }
}

fn only(kind: RecognizerType, input_class: InputClass) -> Harness {
    Harness::new(options(input_class, vec![RecognizerSpec::new(kind)])).unwrap()
}

fn drag(to: Point, duration_ms: u64) -> Script {
    Script::on(ROOT).mouse_drag(Point::ORIGIN, to, 0, duration_ms, 4)
}

/// Lifecycle events (`start`, `move`, `end`, `cancel`) of `event`.
fn lifecycle(harness: &Harness, event: &str) -> Vec<String> {
    harness
        .events()
        .into_iter()
        .filter(|name| {
            name.strip_prefix(event)
                .is_some_and(|suffix| matches!(suffix, "start" | "move" | "end" | "cancel"))
        })
        .collect()
}

fn assert_closed(lifecycle: &[String], event: &str) {
    assert!(lifecycle.len() >= 2, "too few events: {lifecycle:?}");
    assert_eq!(lifecycle[0], format!("{event}start"));
    assert_eq!(lifecycle[lifecycle.len() - 1], format!("{event}end"));
    assert!(lifecycle[1..lifecycle.len() - 1]
        .iter()
        .all(|name| *name == format!("{event}move")));
}

// =============================================================================
// Determinism
// =============================================================================

fn busy_script() -> Script {
    Script::on(ROOT)
        .touch_tap(0, Point::new(50.0, 50.0), 0, 60)
        .then(Script::on(ROOT).touch_tap(0, Point::new(52.0, 51.0), 150, 60))
        .then(Script::on(ROOT).touch_drag(0, Point::new(10.0, 10.0), Point::new(200.0, 20.0), 1000, 150, 6))
        .then(Script::on(ROOT).pinch(Point::new(300.0, 300.0), 40.0, 90.0, 2000, 20, 5))
        .then(Script::on(ROOT).touch_tap(0, Point::new(5.0, 5.0), 3000, 400))
}

#[test]
fn test_replay_is_deterministic() {
    let run = || {
        let mut harness = Harness::preset().unwrap();
        harness.play(&busy_script()).settle();
        (harness.events(), harness.inputs())
    };
    let (events_a, inputs_a) = run();
    let (events_b, inputs_b) = run();
    assert!(!events_a.is_empty());
    assert_eq!(events_a, events_b);
    assert_eq!(inputs_a, inputs_b);
}

proptest! {
    #[test]
    fn prop_drag_replay_deterministic(x in -300.0f32..300.0, y in -300.0f32..300.0, duration in 20u64..800) {
        let script = Script::on(ROOT).touch_drag(0, Point::ORIGIN, Point::new(x, y), 0, duration, 5);
        let mut a = Harness::preset().unwrap();
        let mut b = Harness::preset().unwrap();
        a.play(&script).settle();
        b.play(&script).settle();
        prop_assert_eq!(a.events(), b.events());
    }
}

// =============================================================================
// Exclusivity
// =============================================================================

#[test]
fn test_one_active_recognizer_without_simultaneous() {
    let recognizers = vec![
        RecognizerSpec::new(RecognizerType::Pan)
            .with_options(RecognizerOptions::new().with_direction(Direction::HORIZONTAL)),
        RecognizerSpec::new(RecognizerType::Pan).with_options(RecognizerOptions::new().with_event("drag")),
    ];
    let mut harness = Harness::new(options(InputClass::Mouse, recognizers)).unwrap();

    for raw in &Script::on(ROOT).mouse_drag(Point::ORIGIN, Point::new(50.0, 50.0), 0, 100, 5).events {
        harness.send(raw.clone());
        let active = harness
            .manager()
            .recognizers()
            .iter()
            .filter(|r| r.state().is_active())
            .count();
        assert!(active <= 1, "{active} recognizers active");
    }
    harness.assert_fired("dragstart").assert_not_fired("panstart");
}

#[test]
fn test_simultaneous_pair_both_run() {
    let recognizers = vec![
        RecognizerSpec::new(RecognizerType::Pan),
        RecognizerSpec::new(RecognizerType::Pan)
            .with_options(RecognizerOptions::new().with_event("drag"))
            .recognize_with("pan"),
    ];
    let mut harness = Harness::new(options(InputClass::Mouse, recognizers)).unwrap();
    harness.play(&drag(Point::new(80.0, 0.0), 100));
    harness.assert_count("panstart", 1).assert_count("dragstart", 1);
}

// =============================================================================
// State Machine Closure
// =============================================================================

#[test]
fn test_pan_lifecycle_closed() {
    let mut harness = only(RecognizerType::Pan, InputClass::Mouse);
    harness.play(&drag(Point::new(100.0, 0.0), 200));
    assert_closed(&lifecycle(&harness, "pan"), "pan");
    assert_eq!(harness.state("pan"), Some(RecognizerState::Ended));
}

#[test]
fn test_pinch_lifecycle_closed() {
    let mut harness = only(RecognizerType::Pinch, InputClass::Touch);
    harness.play(&Script::on(ROOT).pinch(Point::new(200.0, 200.0), 50.0, 100.0, 0, 20, 5));
    assert_closed(&lifecycle(&harness, "pinch"), "pinch");
    harness.assert_fired("pinchout").assert_not_fired("pinchin");
}

#[test]
fn test_rotate_lifecycle_closed() {
    let mut harness = only(RecognizerType::Rotate, InputClass::Touch);
    harness.play(&Script::on(ROOT).rotate(Point::new(200.0, 200.0), 60.0, 45.0, 0, 20, 5));
    assert_closed(&lifecycle(&harness, "rotate"), "rotate");
}

#[test]
fn test_tap_is_atomic() {
    let mut harness = only(RecognizerType::Tap, InputClass::Touch);
    harness.play(&Script::on(ROOT).touch_tap(0, Point::new(10.0, 10.0), 0, 50));
    assert_eq!(harness.events(), vec!["tap"]);
}

// =============================================================================
// Thresholds
// =============================================================================

#[test]
fn test_pan_threshold_is_exclusive() {
    let mut exact = only(RecognizerType::Pan, InputClass::Mouse);
    exact.play(&Script::on(ROOT).mouse_drag(Point::ORIGIN, Point::new(10.0, 0.0), 0, 50, 1));
    exact.assert_not_fired("panstart");

    let mut over = only(RecognizerType::Pan, InputClass::Mouse);
    over.play(&Script::on(ROOT).mouse_drag(Point::ORIGIN, Point::new(11.0, 0.0), 0, 50, 1));
    over.assert_count("panstart", 1);
}

#[test]
fn test_swipe_velocity_gate() {
    // 60px in 120ms: 0.5 px/ms
    let mut fast = only(RecognizerType::Swipe, InputClass::Mouse);
    fast.play(&drag(Point::new(60.0, 0.0), 120));
    fast.assert_sequence(&["swiperight", "swipe"]);

    // 60px in 600ms: 0.1 px/ms
    let mut slow = only(RecognizerType::Swipe, InputClass::Mouse);
    slow.play(&drag(Point::new(60.0, 0.0), 600));
    slow.assert_not_fired("swipe").assert_not_fired("swiperight");
}

#[test]
fn test_press_after_hold() {
    let mut harness = only(RecognizerType::Press, InputClass::Mouse);
    harness.send(MouseInput::new(MouseKind::Down, Point::ORIGIN, 0).with_target(ROOT));
    harness.advance(250).assert_not_fired("press");
    harness.advance(251).assert_count("press", 1);
    harness.send(MouseInput::new(MouseKind::Up, Point::ORIGIN, 600).with_target(ROOT));
    harness.assert_sequence(&["press", "pressup"]);
}

// =============================================================================
// Multi-Tap
// =============================================================================

fn tap_and_doubletap() -> Harness {
    let recognizers = vec![
        RecognizerSpec::new(RecognizerType::Tap).require_failure("doubletap"),
        RecognizerSpec::new(RecognizerType::Tap)
            .with_options(RecognizerOptions::new().with_event("doubletap").with_taps(2))
            .recognize_with("tap"),
    ];
    Harness::new(options(InputClass::Mouse, recognizers)).unwrap()
}

#[test]
fn test_doubletap_suppresses_tap() {
    let mut harness = tap_and_doubletap();
    // Releases at 50 and 200, 5px apart
    harness.play(
        &Script::on(ROOT)
            .mouse_tap(Point::new(100.0, 100.0), 0, 50)
            .mouse_tap(Point::new(103.0, 104.0), 150, 50),
    );
    harness.assert_count("doubletap", 1);
    harness.settle();
    harness.assert_not_fired("tap").assert_count("doubletap", 1);
    assert_eq!(
        harness.recorder().named("doubletap")[0].input.tap_count,
        Some(2)
    );
}

#[test]
fn test_single_tap_waits_for_doubletap_to_fail() {
    let mut harness = tap_and_doubletap();
    harness.play(&Script::on(ROOT).mouse_tap(Point::new(100.0, 100.0), 0, 50));
    harness.advance(349).assert_not_fired("tap");
    harness.advance(350).assert_count("tap", 1).assert_not_fired("doubletap");
}

#[test]
fn test_slow_taps_stay_single() {
    let mut harness = tap_and_doubletap();
    harness.play(
        &Script::on(ROOT)
            .mouse_tap(Point::new(100.0, 100.0), 0, 50)
            .mouse_tap(Point::new(100.0, 100.0), 400, 50),
    );
    harness.settle();
    harness.assert_not_fired("doubletap").assert_count("tap", 2);
}

#[test]
fn test_new_press_drops_pending_tap() {
    let mut harness = tap_and_doubletap();
    // Second press lands inside the interval but too far away to pair
    harness.play(
        &Script::on(ROOT)
            .mouse_tap(Point::new(100.0, 100.0), 0, 50)
            .mouse_tap(Point::new(140.0, 100.0), 150, 50),
    );
    harness.settle();
    harness.assert_not_fired("doubletap").assert_count("tap", 1);
}

// =============================================================================
// Touch / Mouse De-duplication
// =============================================================================

#[test]
fn test_synthetic_mouse_suppressed_after_touch() {
    let mut harness = Harness::new(options(InputClass::TouchMouse, vec![])).unwrap();
    harness.play(&Script::on(ROOT).touch_tap(0, Point::new(100.0, 100.0), 0, 40));
    let inputs = harness.inputs().len();

    let manager = harness.manager_mut();
    let near = MouseInput::new(MouseKind::Down, Point::new(105.0, 103.0), 300).with_target(ROOT);
    assert_eq!(manager.handle(&RawInput::Mouse(near)), InputOutcome::default());
    let up = MouseInput::new(MouseKind::Up, Point::new(105.0, 103.0), 320).with_target(ROOT);
    manager.handle(&RawInput::Mouse(up));

    let far = MouseInput::new(MouseKind::Down, Point::new(200.0, 200.0), 400).with_target(ROOT);
    assert!(manager.handle(&RawInput::Mouse(far)).handled);
    assert_eq!(harness.inputs().len(), inputs + 1);
}

// =============================================================================
// Kinematics
// =============================================================================

#[test]
fn test_scale_relative_to_first_multi_sample() {
    let mut harness = Harness::new(options(InputClass::Touch, vec![])).unwrap();
    let frames = [
        (Point::new(0.0, 0.0), Point::new(100.0, 0.0)),
        (Point::new(20.0, 30.0), Point::new(120.0, 30.0)),
        (Point::new(20.0, 30.0), Point::new(170.0, 30.0)),
    ];
    harness.play(&Script::on(ROOT).two_finger(&frames, 0, 30));
    let scales: Vec<f32> = harness.inputs().iter().map(|i| i.scale).collect();
    assert_eq!(scales[0], 1.0);
    assert_eq!(scales[1], 1.0);
    assert!((scales[2] - 1.5).abs() < 1e-6);
}

#[test]
fn test_pointer_events_drive_pinch() {
    let mut harness = only(RecognizerType::Pinch, InputClass::Pointer);
    let script = Script::on(ROOT)
        .pointer(PointerKind::Down, 1, PointerType::Touch, Point::new(100.0, 100.0), 0)
        .pointer(PointerKind::Down, 2, PointerType::Touch, Point::new(200.0, 100.0), 10)
        .pointer(PointerKind::Move, 2, PointerType::Touch, Point::new(150.0, 100.0), 40)
        .pointer(PointerKind::Up, 2, PointerType::Touch, Point::new(150.0, 100.0), 70);
    harness.play(&script);
    // The lifted pointer still counts in its own sample
    harness.assert_sequence(&["pinchstart", "pinchend"]);
    harness.assert_fired("pinchin").assert_not_fired("pinchcancel");
}

// =============================================================================
// Manager Controls
// =============================================================================

#[test]
fn test_soft_stop_keeps_recognizing() {
    let recognizers = vec![
        RecognizerSpec::new(RecognizerType::Pan),
        RecognizerSpec::new(RecognizerType::Pan).with_options(RecognizerOptions::new().with_event("drag")),
    ];
    let mut harness = Harness::new(options(InputClass::Mouse, recognizers)).unwrap();
    harness.manager().on("panstart", |event| event.stop(false));
    harness.play(&drag(Point::new(100.0, 0.0), 200));
    // Pan is first in line and reclaims the session
    harness
        .assert_count("panstart", 1)
        .assert_count("panend", 1)
        .assert_not_fired("dragstart");
    assert_eq!(harness.manager().session().stopped(), None);
}

#[test]
fn test_forced_stop_silences_session() {
    let mut harness = only(RecognizerType::Pan, InputClass::Mouse);
    harness.manager().on("panstart", |event| event.stop(true));
    harness.play(&drag(Point::new(100.0, 0.0), 200));
    harness.assert_count("panstart", 1).assert_not_fired("panend");
    assert_eq!(harness.manager().session().stopped(), Some(StopMode::Forced));

    // The next sequence recognizes normally
    harness.play(&Script::on(ROOT).mouse_drag(Point::ORIGIN, Point::new(100.0, 0.0), 1000, 200, 4));
    harness.assert_count("panstart", 2).assert_count("panend", 1);
}

#[test]
fn test_input_target_filters_touches() {
    let inner = ElementId(2);
    let outer = ElementId(3);
    let tree = ElementTree::new(ROOT).with_child(inner, ROOT).with_child(outer, ROOT);
    let mut harness = Harness::with_tree(tree, options(InputClass::Touch, vec![RecognizerSpec::new(RecognizerType::Pinch)])).unwrap();
    harness.manager_mut().set(SetOptions::new().with_input_target(inner));

    let a = Touch::new(0, Point::new(0.0, 0.0)).with_target(inner);
    let b = Touch::new(1, Point::new(100.0, 0.0)).with_target(outer);
    let b2 = Touch::new(1, Point::new(200.0, 0.0)).with_target(outer);
    let script = Script::on(ROOT)
        .touch(TouchKind::Start, vec![a, b], vec![a, b], 0)
        .touch(TouchKind::Move, vec![a, b2], vec![b2], 30);
    harness.play(&script);
    let inputs = harness.inputs();
    assert_eq!(inputs.len(), 1);
    assert_eq!(inputs[0].pointers.len(), 1);
    harness.assert_not_fired("pinchstart");
}

#[test]
fn test_yaml_config_end_to_end() {
    let yaml = r"
input_class: mouse
recognizers:
  - type: swipe
    options: { direction: horizontal }
  - type: pan
    options: { direction: horizontal }
    with: [swipe]
";
    let mut harness = Harness::new(ManagerOptions::from_yaml(yaml).unwrap()).unwrap();
    assert_eq!(harness.manager().touch_action(), "pan-y");
    harness.play(&drag(Point::new(-80.0, 0.0), 100));
    harness
        .assert_fired("panstart")
        .assert_fired("panleft")
        .assert_fired("swipeleft");
}
