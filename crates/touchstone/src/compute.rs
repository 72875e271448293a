//! Session kinematics.
//!
//! Every normalized [`InputSample`] is folded into the manager's [`Session`]
//! to produce a [`GestureInput`]: center, displacement, velocity, direction,
//! scale and rotation relative to the start of the gesture sequence.

use crate::recognizer::RecognizerId;
use serde::Serialize;
use touchstone_core::{Direction, ElementId, Point, PointerType, Surface};

/// Velocity and direction are resampled at most this often.
pub const COMPUTE_INTERVAL_MS: u64 = 25;

/// Phase of an input sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputPhase {
    /// A pointer went down
    Start,
    /// A pointer moved
    Move,
    /// A pointer went up
    End,
    /// The platform cancelled a pointer
    Cancel,
}

/// One active contact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pointer {
    /// Stable identifier for the contact's lifetime
    pub id: u32,
    /// Client position
    pub position: Point,
    /// Element the contact is over
    pub target: ElementId,
}

impl Pointer {
    /// Create a pointer.
    #[must_use]
    pub const fn new(id: u32, position: Point, target: ElementId) -> Self {
        Self {
            id,
            position,
            target,
        }
    }
}

/// Normalized output of an input source, one per raw event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputSample {
    /// All active pointers
    pub pointers: Vec<Pointer>,
    /// Pointers that triggered this event
    pub changed_pointers: Vec<Pointer>,
    /// Event phase
    pub phase: InputPhase,
    /// Pointer modality
    pub pointer_type: PointerType,
    /// Target of the raw event
    pub src_target: ElementId,
    /// Timestamp in milliseconds
    pub time_ms: u64,
}

impl InputSample {
    /// First sample of a sequence: every pointer just went down.
    #[must_use]
    pub fn is_first(&self) -> bool {
        self.phase == InputPhase::Start && self.pointers.len() == self.changed_pointers.len()
    }

    /// Last sample of a sequence: every remaining pointer just lifted.
    #[must_use]
    pub fn is_final(&self) -> bool {
        matches!(self.phase, InputPhase::End | InputPhase::Cancel)
            && self.pointers.len() == self.changed_pointers.len()
    }
}

/// A sample enriched with session kinematics.
///
/// Each recognizer receives its own clone and may annotate it
/// (`direction`, `additional_event`, `tap_count`) without affecting the
/// others.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GestureInput {
    /// All active pointers
    pub pointers: Vec<Pointer>,
    /// Pointers that triggered this event
    pub changed_pointers: Vec<Pointer>,
    /// Event phase
    pub phase: InputPhase,
    /// Pointer modality
    pub pointer_type: PointerType,
    /// Target of the raw event
    pub src_target: ElementId,
    /// Timestamp in milliseconds
    pub time_ms: u64,
    /// First sample of the session
    pub is_first: bool,
    /// Last sample of the session
    pub is_final: bool,
    /// Rounded mean of the pointer positions
    pub center: Point,
    /// Milliseconds since the session started
    pub delta_time: u64,
    /// Angle in degrees from the reference center
    pub angle: f32,
    /// Distance from the reference center
    pub distance: f32,
    /// Cumulative x displacement
    pub delta_x: f32,
    /// Cumulative y displacement
    pub delta_y: f32,
    /// Direction of the cumulative displacement
    pub offset_direction: Direction,
    /// Session x velocity in px/ms
    pub overall_velocity_x: f32,
    /// Session y velocity in px/ms
    pub overall_velocity_y: f32,
    /// Dominant session velocity
    pub overall_velocity: f32,
    /// Interval x velocity in px/ms
    pub velocity_x: f32,
    /// Interval y velocity in px/ms
    pub velocity_y: f32,
    /// Dominant interval velocity
    pub velocity: f32,
    /// Interval direction
    pub direction: Direction,
    /// Pair distance relative to the first multi-pointer sample
    pub scale: f32,
    /// Pair rotation in degrees relative to the first multi-pointer sample
    pub rotation: f32,
    /// Most pointers seen this session
    pub max_pointers: usize,
    /// Resolved target inside the root
    pub target: ElementId,
    /// Direction- or scale-specific event set by a recognizer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_event: Option<String>,
    /// Tap count set by the tap recognizer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tap_count: Option<u32>,
}

/// Frozen copy of a sample's geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Timestamp in milliseconds
    pub time_ms: u64,
    /// Rounded pointer positions
    pub pointers: Vec<Point>,
    /// Rounded center
    pub center: Point,
}

impl Snapshot {
    fn of(sample: &InputSample) -> Self {
        let pointers: Vec<Point> = sample.pointers.iter().map(|p| p.position.rounded()).collect();
        let center = Point::centroid(&pointers).unwrap_or(Point::ORIGIN);
        Self {
            time_ms: sample.time_ms,
            pointers,
            center,
        }
    }
}

/// Why the session was stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StopMode {
    /// Drop the active recognizer's exclusivity
    Soft,
    /// Refuse every recognizer until the next sequence
    Forced,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PreviousInput {
    phase: InputPhase,
    delta: Point,
    max_pointers: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct IntervalSample {
    time_ms: u64,
    delta: Point,
    velocity: Point,
    dominant: f32,
    direction: Direction,
}

/// Rolling state of one gesture sequence.
#[derive(Debug, Clone, Default)]
pub struct Session {
    first_input: Option<Snapshot>,
    first_multiple: Option<Snapshot>,
    prev_input: Option<PreviousInput>,
    offset_delta: Option<Point>,
    prev_delta: Point,
    last_interval: Option<IntervalSample>,
    pub(crate) active: Option<RecognizerId>,
    pub(crate) stopped: Option<StopMode>,
    pub(crate) prevented: bool,
}

impl Session {
    /// Start an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the first sample.
    #[must_use]
    pub const fn first_input(&self) -> Option<&Snapshot> {
        self.first_input.as_ref()
    }

    /// Snapshot of the first sample with two or more pointers.
    #[must_use]
    pub const fn first_multiple(&self) -> Option<&Snapshot> {
        self.first_multiple.as_ref()
    }

    /// Recognizer holding exclusive status.
    #[must_use]
    pub const fn active(&self) -> Option<RecognizerId> {
        self.active
    }

    /// Pending stop request.
    #[must_use]
    pub const fn stopped(&self) -> Option<StopMode> {
        self.stopped
    }

    /// Whether the touch-action polyfill prevented a default this session.
    #[must_use]
    pub const fn prevented(&self) -> bool {
        self.prevented
    }

    /// Fold `sample` into the session and derive its kinematics.
    ///
    /// The target is the raw target when it lies inside `root`, else `root`.
    pub fn compute(
        &mut self,
        sample: InputSample,
        is_first: bool,
        is_final: bool,
        surface: &dyn Surface,
        root: ElementId,
    ) -> GestureInput {
        let count = sample.pointers.len();

        if self.first_input.is_none() {
            self.first_input = Some(Snapshot::of(&sample));
        }
        if count > 1 && self.first_multiple.is_none() {
            self.first_multiple = Some(Snapshot::of(&sample));
        } else if count == 1 {
            self.first_multiple = None;
        }

        let positions: Vec<Point> = sample.pointers.iter().map(|p| p.position).collect();
        let center = Point::centroid(&positions).unwrap_or(Point::ORIGIN);

        let first_time = self.first_input.as_ref().map_or(sample.time_ms, |f| f.time_ms);
        let offset_center = self
            .first_multiple
            .as_ref()
            .or(self.first_input.as_ref())
            .map_or(center, |s| s.center);
        let delta_time = sample.time_ms.saturating_sub(first_time);

        let delta = self.delta_xy(sample.phase, center);
        let overall = velocity(delta_time, delta);

        let (scale, rotation) = match &self.first_multiple {
            Some(multi) if count > 1 && multi.pointers.len() > 1 => (
                scale(&multi.pointers, &positions),
                rotation(&multi.pointers, &positions),
            ),
            _ => (1.0, 0.0),
        };

        let max_pointers = self
            .prev_input
            .map_or(count, |prev| prev.max_pointers.max(count));

        let interval = self.interval(sample.phase, sample.time_ms, delta);

        let target = if surface.contains(root, sample.src_target) {
            sample.src_target
        } else {
            root
        };

        GestureInput {
            pointers: sample.pointers,
            changed_pointers: sample.changed_pointers,
            phase: sample.phase,
            pointer_type: sample.pointer_type,
            src_target: sample.src_target,
            time_ms: sample.time_ms,
            is_first,
            is_final,
            center,
            delta_time,
            angle: offset_center.angle_to(&center),
            distance: offset_center.distance(&center),
            delta_x: delta.x,
            delta_y: delta.y,
            offset_direction: Direction::between(delta.x, delta.y),
            overall_velocity_x: overall.x,
            overall_velocity_y: overall.y,
            overall_velocity: dominant(overall),
            velocity_x: interval.velocity.x,
            velocity_y: interval.velocity.y,
            velocity: interval.dominant,
            direction: interval.direction,
            scale,
            rotation,
            max_pointers,
            target,
            additional_event: None,
            tap_count: None,
        }
    }

    /// Remember `input` as the previous sample of the session.
    pub fn set_prev_input(&mut self, input: &GestureInput) {
        self.prev_input = Some(PreviousInput {
            phase: input.phase,
            delta: Point::new(input.delta_x, input.delta_y),
            max_pointers: input.max_pointers,
        });
    }

    /// Cumulative displacement, re-baselined whenever a new segment starts
    /// so that pointers joining or leaving do not make the delta jump.
    fn delta_xy(&mut self, phase: InputPhase, center: Point) -> Point {
        let prev_ended = self
            .prev_input
            .is_some_and(|prev| prev.phase == InputPhase::End);
        let offset = match self.offset_delta {
            Some(offset) if phase != InputPhase::Start && !prev_ended => offset,
            _ => {
                self.prev_delta = self.prev_input.map_or(Point::ORIGIN, |prev| prev.delta);
                self.offset_delta = Some(center);
                center
            }
        };
        self.prev_delta + (center - offset)
    }

    fn interval(&mut self, phase: InputPhase, time_ms: u64, delta: Point) -> IntervalSample {
        match self.last_interval {
            Some(last)
                if phase == InputPhase::Cancel
                    || time_ms.saturating_sub(last.time_ms) <= COMPUTE_INTERVAL_MS =>
            {
                last
            }
            last => {
                let (since, moved) = last.map_or((0, Point::ORIGIN), |l| {
                    (time_ms.saturating_sub(l.time_ms), delta - l.delta)
                });
                let v = velocity(since, moved);
                let sample = IntervalSample {
                    time_ms,
                    delta,
                    velocity: v,
                    dominant: dominant(v),
                    direction: Direction::between(moved.x, moved.y),
                };
                if phase != InputPhase::Cancel {
                    self.last_interval = Some(sample);
                }
                sample
            }
        }
    }
}

fn velocity(delta_time: u64, delta: Point) -> Point {
    if delta_time == 0 {
        return Point::ORIGIN;
    }
    let dt = delta_time as f32;
    Point::new(delta.x / dt, delta.y / dt)
}

fn dominant(v: Point) -> f32 {
    if v.x.abs() > v.y.abs() {
        v.x
    } else {
        v.y
    }
}

/// Ratio of the current pair distance to the initial one.
fn scale(start: &[Point], end: &[Point]) -> f32 {
    let initial = start[0].distance(&start[1]);
    if initial == 0.0 {
        return 1.0;
    }
    end[0].distance(&end[1]) / initial
}

/// Change in the pair's angle, in degrees within [-180, 180).
///
/// This is the difference of the start and current angles, not their sum:
/// a pair that holds still reads 0 whatever its orientation, and a turn
/// across the +/-180 seam reads as the short way round.
fn rotation(start: &[Point], end: &[Point]) -> f32 {
    let turned = end[1].angle_to(&end[0]) - start[1].angle_to(&start[0]);
    (turned + 180.0).rem_euclid(360.0) - 180.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use touchstone_core::ElementTree;

    const ROOT: ElementId = ElementId(1);

    fn sample(phase: InputPhase, points: &[(f32, f32)], changed: usize, time_ms: u64) -> InputSample {
        let pointers: Vec<Pointer> = points
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| Pointer::new(i as u32, Point::new(x, y), ROOT))
            .collect();
        let changed_pointers = pointers.iter().take(changed).copied().collect();
        InputSample {
            pointers,
            changed_pointers,
            phase,
            pointer_type: PointerType::Touch,
            src_target: ROOT,
            time_ms,
        }
    }

    fn feed(session: &mut Session, s: InputSample) -> GestureInput {
        let tree = ElementTree::new(ROOT);
        let (first, last) = (s.is_first(), s.is_final());
        let input = session.compute(s, first, last, &tree, ROOT);
        session.set_prev_input(&input);
        input
    }

    #[test]
    fn test_first_and_final_flags() {
        assert!(sample(InputPhase::Start, &[(0.0, 0.0)], 1, 0).is_first());
        assert!(!sample(InputPhase::Start, &[(0.0, 0.0), (1.0, 1.0)], 1, 0).is_first());
        assert!(sample(InputPhase::End, &[(0.0, 0.0)], 1, 0).is_final());
        assert!(sample(InputPhase::Cancel, &[(0.0, 0.0)], 1, 0).is_final());
        assert!(!sample(InputPhase::Move, &[(0.0, 0.0)], 1, 0).is_final());
    }

    #[test]
    fn test_delta_and_distance() {
        let mut s = Session::new();
        feed(&mut s, sample(InputPhase::Start, &[(100.0, 100.0)], 1, 0));
        let input = feed(&mut s, sample(InputPhase::Move, &[(130.0, 140.0)], 1, 50));
        assert_eq!(input.delta_x, 30.0);
        assert_eq!(input.delta_y, 40.0);
        assert!((input.distance - 50.0).abs() < 0.001);
        assert_eq!(input.delta_time, 50);
        assert_eq!(input.offset_direction, Direction::DOWN);
    }

    #[test]
    fn test_center_is_rounded() {
        let mut s = Session::new();
        let input = feed(&mut s, sample(InputPhase::Start, &[(10.4, 10.6)], 1, 0));
        assert_eq!(input.center, Point::new(10.0, 11.0));
    }

    #[test]
    fn test_overall_velocity() {
        let mut s = Session::new();
        feed(&mut s, sample(InputPhase::Start, &[(0.0, 0.0)], 1, 0));
        let input = feed(&mut s, sample(InputPhase::End, &[(60.0, 0.0)], 1, 120));
        assert!((input.overall_velocity_x - 0.5).abs() < 1e-6);
        assert_eq!(input.overall_velocity_y, 0.0);
        assert!((input.overall_velocity - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_zero_elapsed_velocity_is_zero() {
        let mut s = Session::new();
        let input = feed(&mut s, sample(InputPhase::Start, &[(5.0, 5.0)], 1, 100));
        assert_eq!(input.velocity, 0.0);
        assert_eq!(input.overall_velocity, 0.0);
        assert_eq!(input.direction, Direction::NONE);
    }

    #[test]
    fn test_interval_velocity_reused_within_window() {
        let mut s = Session::new();
        feed(&mut s, sample(InputPhase::Start, &[(0.0, 0.0)], 1, 0));
        let a = feed(&mut s, sample(InputPhase::Move, &[(30.0, 0.0)], 1, 30));
        assert!((a.velocity_x - 1.0).abs() < 1e-6);
        assert_eq!(a.direction, Direction::RIGHT);
        // 10ms later: inside the window, values carry over
        let b = feed(&mut s, sample(InputPhase::Move, &[(20.0, 0.0)], 1, 40));
        assert_eq!(b.velocity_x, a.velocity_x);
        assert_eq!(b.direction, Direction::RIGHT);
        // exactly 25ms after the last resample still reuses
        let c = feed(&mut s, sample(InputPhase::Move, &[(0.0, 0.0)], 1, 55));
        assert_eq!(c.direction, Direction::RIGHT);
        let d = feed(&mut s, sample(InputPhase::Move, &[(0.0, 0.0)], 1, 56));
        assert_eq!(d.direction, Direction::LEFT);
    }

    #[test]
    fn test_cancel_never_resamples() {
        let mut s = Session::new();
        feed(&mut s, sample(InputPhase::Start, &[(0.0, 0.0)], 1, 0));
        let a = feed(&mut s, sample(InputPhase::Move, &[(50.0, 0.0)], 1, 50));
        let b = feed(&mut s, sample(InputPhase::Cancel, &[(0.0, 0.0)], 1, 500));
        assert_eq!(b.velocity_x, a.velocity_x);
    }

    #[test]
    fn test_delta_continuity_after_segment_end() {
        let mut s = Session::new();
        feed(&mut s, sample(InputPhase::Start, &[(0.0, 0.0)], 1, 0));
        feed(&mut s, sample(InputPhase::Move, &[(20.0, 0.0)], 1, 30));
        feed(&mut s, sample(InputPhase::End, &[(20.0, 0.0)], 1, 60));
        // A new pointer takes over elsewhere; delta continues from 20
        let next = feed(&mut s, sample(InputPhase::Move, &[(500.0, 500.0)], 1, 90));
        assert_eq!(next.delta_x, 20.0);
        assert_eq!(next.delta_y, 0.0);
        let after = feed(&mut s, sample(InputPhase::Move, &[(510.0, 500.0)], 1, 120));
        assert_eq!(after.delta_x, 30.0);
    }

    #[test]
    fn test_scale_and_rotation() {
        let mut s = Session::new();
        feed(&mut s, sample(InputPhase::Start, &[(100.0, 100.0)], 1, 0));
        let joined = feed(
            &mut s,
            sample(InputPhase::Start, &[(100.0, 100.0), (200.0, 100.0)], 1, 10),
        );
        assert_eq!(joined.scale, 1.0);
        assert_eq!(joined.rotation, 0.0);
        let spread = feed(
            &mut s,
            sample(InputPhase::Move, &[(50.0, 100.0), (250.0, 100.0)], 2, 40),
        );
        assert!((spread.scale - 2.0).abs() < 1e-6);
        let turned = feed(
            &mut s,
            sample(InputPhase::Move, &[(100.0, 100.0), (100.0, 200.0)], 2, 80),
        );
        assert!((turned.rotation - 90.0).abs() < 1e-3);
    }

    #[test]
    fn test_rotation_is_relative_and_wraps() {
        let mut s = Session::new();
        feed(&mut s, sample(InputPhase::Start, &[(0.0, 0.0), (100.0, 100.0)], 2, 0));
        let still = feed(&mut s, sample(InputPhase::Move, &[(0.0, 0.0), (100.0, 100.0)], 1, 40));
        assert_eq!(still.rotation, 0.0);

        let mut s = Session::new();
        feed(&mut s, sample(InputPhase::Start, &[(0.0, 0.0), (100.0, 10.0)], 2, 0));
        let across = feed(&mut s, sample(InputPhase::Move, &[(0.0, 0.0), (100.0, -10.0)], 1, 40));
        assert!(across.rotation.abs() > 11.0 && across.rotation.abs() < 12.0);
    }

    #[test]
    fn test_single_pointer_clears_first_multiple() {
        let mut s = Session::new();
        feed(&mut s, sample(InputPhase::Start, &[(0.0, 0.0), (10.0, 0.0)], 2, 0));
        assert!(s.first_multiple().is_some());
        let one = feed(&mut s, sample(InputPhase::End, &[(0.0, 0.0)], 1, 10));
        assert!(s.first_multiple().is_none());
        assert_eq!(one.scale, 1.0);
        assert_eq!(one.max_pointers, 2);
    }

    #[test]
    fn test_empty_pointers_do_not_panic() {
        let mut s = Session::new();
        let input = feed(&mut s, sample(InputPhase::End, &[], 0, 10));
        assert_eq!(input.center, Point::ORIGIN);
        assert_eq!(input.distance, 0.0);
        assert_eq!(input.max_pointers, 0);
    }

    #[test]
    fn test_target_outside_root_falls_back() {
        let tree = ElementTree::new(ROOT).with_child(ElementId(2), ROOT);
        let mut s = Session::new();
        let mut inside = sample(InputPhase::Start, &[(0.0, 0.0)], 1, 0);
        inside.src_target = ElementId(2);
        assert_eq!(s.compute(inside, true, false, &tree, ROOT).target, ElementId(2));
        let mut outside = sample(InputPhase::Move, &[(0.0, 0.0)], 1, 0);
        outside.src_target = ElementId(9);
        assert_eq!(s.compute(outside, false, false, &tree, ROOT).target, ROOT);
    }

    proptest! {
        #[test]
        fn prop_scale_is_pair_distance_ratio(
            ax in -300i32..300, ay in -300i32..300,
            bx in -300i32..300, by in -300i32..300,
            k in 1u32..5,
        ) {
            let (ax, ay, bx, by) = (ax as f32, ay as f32, bx as f32, by as f32);
            prop_assume!((ax, ay) != (bx, by));
            let mut s = Session::new();
            feed(&mut s, sample(InputPhase::Start, &[(ax, ay), (bx, by)], 2, 0));
            let still = feed(&mut s, sample(InputPhase::Move, &[(ax, ay), (bx, by)], 2, 30));
            prop_assert_eq!(still.scale, 1.0);

            let k = k as f32;
            let moved = feed(&mut s, sample(InputPhase::Move, &[(ax * k, ay * k), (bx * k, by * k)], 2, 60));
            let expected = Point::new(ax * k, ay * k).distance(&Point::new(bx * k, by * k))
                / Point::new(ax, ay).distance(&Point::new(bx, by));
            prop_assert!((moved.scale - expected).abs() < 1e-3);
        }

        #[test]
        fn prop_max_pointers_monotonic(counts in proptest::collection::vec(1usize..5, 1..10)) {
            let mut s = Session::new();
            let mut high = 0;
            for (i, n) in counts.iter().enumerate() {
                let pts: Vec<(f32, f32)> = (0..*n).map(|j| (j as f32 * 10.0, 0.0)).collect();
                let phase = if i == 0 { InputPhase::Start } else { InputPhase::Move };
                let input = feed(&mut s, sample(phase, &pts, 1, i as u64 * 10));
                high = high.max(*n);
                prop_assert_eq!(input.max_pointers, high);
            }
        }
    }
}
