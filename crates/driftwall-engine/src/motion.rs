#![forbid(unsafe_code)]

//! Kinetic motion model.
//!
//! Each frame a lane's velocity is the blend of two sources: the ambient
//! auto-scroll (`base_speed`, scaled by the process-wide motion factor and a
//! per-lane ambient factor that eases toward 0.08 while the user is
//! interacting) and decaying drag momentum handed off by the last pointer
//! move. Pointer input itself is an explicit state machine on the lane's
//! gesture flags; while a drag is active the offset tracks the pointer 1:1,
//! bypassing velocity integration entirely.

use std::time::Duration;

use driftwall_core::ease;
use driftwall_core::event::PointerId;
use driftwall_core::surface::LaneSurface;
use tracing::trace;

use crate::lane::{GestureFlags, Lane};
use crate::window;

/// Frame delta clamp, seconds. Bounds per-frame displacement so `normalize`
/// sees at most a handful of boundary crossings even after a long stall.
pub(crate) const MAX_FRAME_DT: f32 = 0.04;
/// Ambient factor target while a drag is active or recently ended.
pub(crate) const AMBIENT_DAMPENED: f32 = 0.08;
/// Ambient ease rate constant, 1/s.
pub(crate) const AMBIENT_EASE_RATE: f32 = 5.0;
/// Fraction of drag momentum retained per second.
pub(crate) const DRAG_DECAY_BASE: f32 = 0.12;
/// Converts the last pointer-move delta (px) into hand-off momentum (px/s).
pub(crate) const FLING_GAIN: f32 = 25.0;
/// How long after the last pointer activity the ambient stays dampened.
pub(crate) const HOLD_AMBIENT: Duration = Duration::from_millis(1200);
/// Pointer travel (px) past which a gesture counts as a drag, not a tap.
pub(crate) const DRAG_MOVE_THRESHOLD: f32 = 2.0;

/// Advance one lane by `dt` seconds at host time `now`.
pub(crate) fn advance<S: LaneSurface>(
    lane: &mut Lane,
    surface: &mut S,
    now: Duration,
    dt: f32,
    speed_factor: f32,
) {
    let dampened = lane.gesture.contains(GestureFlags::ACTIVE)
        || lane.hold_until.is_some_and(|hold| now < hold);
    let target = if dampened { AMBIENT_DAMPENED } else { 1.0 };
    lane.ambient_factor = ease::approach(lane.ambient_factor, target, dt, AMBIENT_EASE_RATE);
    lane.drag_speed = ease::decay(lane.drag_speed, DRAG_DECAY_BASE, dt);

    let velocity = lane.base_speed * speed_factor * lane.ambient_factor + lane.drag_speed;
    lane.offset += velocity * dt;
    window::normalize(lane, surface);
    surface.set_offset(lane.id, lane.offset);
}

/// Pointer-down: begin a gesture. Clears `MOVED`, kills existing momentum,
/// and dampens the ambient scroll.
pub(crate) fn pointer_down<S: LaneSurface>(
    lane: &mut Lane,
    surface: &mut S,
    pointer: PointerId,
    x: f32,
    now: Duration,
) {
    lane.gesture = GestureFlags::ACTIVE;
    lane.pointer_id = Some(pointer);
    lane.pointer_x = x;
    lane.drag_speed = 0.0;
    lane.hold_until = Some(now + HOLD_AMBIENT);
    surface.set_drag_active(lane.id, true);
    trace!(lane = lane.id.0, "drag start");
}

/// Pointer-move: 1:1 offset tracking plus momentum hand-off estimate.
///
/// Moves from a pointer other than the one that started the gesture are
/// ignored; a surface that loses pointer capture simply stops delivering
/// matching moves and the gesture coasts out.
pub(crate) fn pointer_move<S: LaneSurface>(
    lane: &mut Lane,
    surface: &mut S,
    pointer: PointerId,
    x: f32,
    now: Duration,
) {
    if !lane.gesture.contains(GestureFlags::ACTIVE) || lane.pointer_id != Some(pointer) {
        return;
    }

    let delta = x - lane.pointer_x;
    lane.pointer_x = x;
    if delta.abs() > DRAG_MOVE_THRESHOLD {
        lane.gesture.insert(GestureFlags::MOVED);
    }
    lane.offset += delta;
    lane.drag_speed = delta * FLING_GAIN;
    lane.hold_until = Some(now + HOLD_AMBIENT);
    window::normalize(lane, surface);
}

/// Pointer-up or cancel: end the gesture, keeping `MOVED` set so a trailing
/// click can be told apart from a tap.
pub(crate) fn pointer_end<S: LaneSurface>(
    lane: &mut Lane,
    surface: &mut S,
    pointer: PointerId,
    now: Duration,
) {
    if !lane.gesture.contains(GestureFlags::ACTIVE) || lane.pointer_id != Some(pointer) {
        return;
    }

    lane.gesture.remove(GestureFlags::ACTIVE);
    lane.pointer_id = None;
    lane.hold_until = Some(now + HOLD_AMBIENT);
    surface.set_drag_active(lane.id, false);
    trace!(lane = lane.id.0, "drag end");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
