//! Integration tests for touchstone-core.
//!
//! These tests verify the public API works correctly end-to-end.

use touchstone_core::{
    Direction, ElementId, ElementTree, MouseInput, MouseKind, Point, PointerId, PointerInput,
    PointerKind, PointerType, RawInput, Surface, Touch, TouchInput, TouchKind,
};

// =============================================================================
// Geometry Integration Tests
// =============================================================================

#[test]
fn test_direction_of_point_delta() {
    let start = Point::new(100.0, 100.0);
    let end = Point::new(160.0, 110.0);
    let delta = end - start;
    assert_eq!(Direction::between(delta.x, delta.y), Direction::RIGHT);
    assert!(Direction::HORIZONTAL.contains(Direction::between(delta.x, delta.y)));
}

#[test]
fn test_angle_and_distance_agree() {
    let a = Point::new(0.0, 0.0);
    let b = Point::new(30.0, 40.0);
    let angle = a.angle_to(&b).to_radians();
    let d = a.distance(&b);
    assert!((a.x + d * angle.cos() - b.x).abs() < 0.01);
    assert!((a.y + d * angle.sin() - b.y).abs() < 0.01);
}

// =============================================================================
// Surface Integration Tests
// =============================================================================

#[test]
fn test_surface_trait_object() {
    let tree = ElementTree::new(ElementId(1)).with_child(ElementId(2), ElementId(1));
    let surface: &dyn Surface = &tree;
    assert!(surface.contains(ElementId(1), ElementId(2)));
    surface.dispatch(ElementId(2), "panstart", r#"{"delta_x":0}"#);
    assert_eq!(tree.dispatched()[0].detail, r#"{"delta_x":0}"#);
}

// =============================================================================
// Raw Input Trace Tests
// =============================================================================

#[test]
fn test_trace_lines_parse() {
    let trace = [
        r#"{"source":"touch","kind":"start","touches":[{"id":0,"position":{"x":10.0,"y":10.0}}],"changed_touches":[{"id":0,"position":{"x":10.0,"y":10.0}}],"time_ms":0}"#,
        r#"{"source":"pointer","kind":"move","pointer_id":1,"pointer_type":"pen","position":{"x":12.0,"y":10.0},"time_ms":16}"#,
        r#"{"source":"mouse","kind":"up","position":{"x":12.0,"y":10.0},"buttons":0,"time_ms":32}"#,
    ];
    let parsed: Vec<RawInput> = trace
        .iter()
        .map(|line| serde_json::from_str(line).expect("valid trace line"))
        .collect();
    let names: Vec<&str> = parsed.iter().map(RawInput::name).collect();
    assert_eq!(names, vec!["touchstart", "pointermove", "mouseup"]);
    assert_eq!(parsed[2].time_ms(), 32);
}

#[test]
fn test_builders_produce_serializable_inputs() {
    let inputs: Vec<RawInput> = vec![
        MouseInput::new(MouseKind::Down, Point::new(1.0, 1.0), 0).into(),
        PointerInput::new(
            PointerKind::Down,
            PointerId(7),
            PointerType::Touch,
            Point::new(2.0, 2.0),
            1,
        )
        .into(),
        TouchInput::new(
            TouchKind::Start,
            vec![Touch::new(0, Point::new(3.0, 3.0))],
            vec![Touch::new(0, Point::new(3.0, 3.0))],
            2,
        )
        .into(),
    ];
    for input in inputs {
        let json = serde_json::to_string(&input).expect("serialize");
        let back: RawInput = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, input);
    }
}
