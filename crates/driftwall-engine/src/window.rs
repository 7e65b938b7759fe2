#![forbid(unsafe_code)]

//! Circular window manager.
//!
//! Keeps a lane's fixed set of tile slots aligned with its continuously
//! moving `offset`, reusing slots as if the pool were infinite. Recycling is
//! O(1) per boundary crossing: when the offset drifts one tile span past a
//! recycle threshold, the slot that fully left the buffer is moved to the
//! opposite end of the track and rebound to the next pool item, and the
//! offset is pulled back by one span.

use std::time::Duration;

use driftwall_core::surface::LaneSurface;
use tracing::trace;

use crate::lane::Lane;

/// Slots created up front per lane, so early pool updates hydrate a full
/// window instead of racing slot growth.
pub(crate) const PREALLOCATED_SLOT_COUNT: usize = 72;
/// Off-screen slots kept to the left of the viewport.
pub(crate) const LEFT_BUFFER_TILES: usize = 6;
/// Off-screen slots kept to the right of the viewport.
pub(crate) const RIGHT_BUFFER_TILES: usize = 10;
/// Floor on the computed slot requirement.
pub(crate) const MIN_SLOT_COUNT: usize = 10;
/// Tile width assumed when the surface has nothing to measure yet, px.
pub(crate) const FALLBACK_TILE_WIDTH: f32 = 140.0;

/// Per-slot stagger of the entrance reveal.
const REVEAL_STEP: Duration = Duration::from_millis(36);
/// Cap on the entrance reveal delay.
const REVEAL_CAP: Duration = Duration::from_millis(500);

/// Offset at which the leftmost slot has fully left the buffer to the right.
#[inline]
pub(crate) fn upper_bound(lane: &Lane) -> f32 {
    -lane.tile_span * lane.left_buffer_tiles as f32
}

/// Offset at which the leftmost slot has fully left the buffer to the left.
#[inline]
pub(crate) fn lower_bound(lane: &Lane) -> f32 {
    -lane.tile_span * (lane.left_buffer_tiles as f32 + 1.0)
}

/// Re-measure the lane and grow its slot window to the current requirement.
///
/// The slot count is a high-water mark: shrinking the viewport never removes
/// slots, and existing slots keep their bindings. Newly created slots are
/// appended at the back of the track and bound to the pool position the
/// steady-state mapping assigns them, with a staggered reveal.
pub(crate) fn assign_slot_count<S: LaneSurface>(lane: &mut Lane, surface: &mut S) {
    let metrics = surface.measure(lane.id);
    let tile_width = metrics.tile_width.unwrap_or(FALLBACK_TILE_WIDTH);
    lane.tile_span = (tile_width + metrics.gap).max(1.0);

    let visible = (metrics.viewport_width / lane.tile_span).ceil().max(0.0) as usize;
    let needed = (visible + lane.left_buffer_tiles + lane.right_buffer_tiles).max(MIN_SLOT_COUNT);
    lane.max_slot_count = lane
        .max_slot_count
        .max(needed)
        .max(PREALLOCATED_SLOT_COUNT);

    while lane.slots.len() < lane.max_slot_count {
        let handle = surface.create_tile(lane.id);
        let slot = lane.slots.len();
        let index = (lane.left_index + slot) % lane.pool.len();
        let reveal = REVEAL_STEP.saturating_mul(slot as u32).min(REVEAL_CAP);
        lane.bind_slot(surface, handle, index, reveal);
        lane.slots.push_back(handle);
    }
}

/// Pull `offset` back into the home interval, rotating one slot per span
/// crossed.
///
/// The loops make over-long frames safe: a displacement of several spans is
/// absorbed as several rotations in one call rather than corrupting the
/// window. With pool length 1 a rotation degenerates to rebinding the same
/// item, which is harmless.
pub(crate) fn normalize<S: LaneSurface>(lane: &mut Lane, surface: &mut S) {
    let upper = upper_bound(lane);
    let lower = lower_bound(lane);

    while lane.offset >= upper {
        lane.offset -= lane.tile_span;
        rotate_right(lane, surface);
    }

    while lane.offset <= lower {
        lane.offset += lane.tile_span;
        rotate_left(lane, surface);
    }
}

/// Move the rightmost slot to the left end and rebind it to the item that
/// scrolled into view there.
fn rotate_right<S: LaneSurface>(lane: &mut Lane, surface: &mut S) {
    let Some(handle) = lane.slots.pop_back() else {
        return;
    };
    let len = lane.pool.len();
    lane.left_index = (lane.left_index + len - 1) % len;
    lane.slots.push_front(handle);
    surface.move_to_front(lane.id, handle);
    lane.bind_slot(surface, handle, lane.left_index, Duration::ZERO);
    trace!(lane = lane.id.0, left_index = lane.left_index, "rotate right");
}

/// Move the leftmost slot to the right end and rebind it to the item past
/// the current window.
fn rotate_left<S: LaneSurface>(lane: &mut Lane, surface: &mut S) {
    let count = lane.slots.len();
    let Some(handle) = lane.slots.pop_front() else {
        return;
    };
    let len = lane.pool.len();
    let tail_index = (lane.left_index + count) % len;
    lane.slots.push_back(handle);
    surface.move_to_back(lane.id, handle);
    lane.bind_slot(surface, handle, tail_index, Duration::ZERO);
    lane.left_index = (lane.left_index + 1) % len;
    trace!(lane = lane.id.0, left_index = lane.left_index, "rotate left");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lane::LaneSpec;
    use driftwall_core::item::TileItem;
    use driftwall_core::surface::LaneId;
    use driftwall_harness::ScriptedSurface;

    const LANE: LaneId = LaneId(0);

    fn pool(ids: &[&str]) -> Vec<TileItem> {
        ids.iter().map(|id| TileItem::derive(*id, None, "")).collect()
    }

    /// Lane with an explicit pool, `slot_count` hand-built slots, one-tile
    /// left buffer, and a 100 px span. Offset starts mid-interval (-150).
    fn small_lane(ids: &[&str], slot_count: usize, surface: &mut ScriptedSurface) -> Lane {
        let mut lane = Lane::new(LANE, &LaneSpec::new("test", 0.0));
        lane.pool = pool(ids);
        lane.tile_span = 100.0;
        lane.left_buffer_tiles = 1;
        lane.offset = -150.0;
        for slot in 0..slot_count {
            let handle = surface.create_tile(LANE);
            let index = (lane.left_index + slot) % lane.pool.len();
            lane.bind_slot(surface, handle, index, Duration::ZERO);
            lane.slots.push_back(handle);
        }
        lane
    }

    fn assert_bindings_consistent(lane: &Lane) {
        let len = lane.pool.len();
        for (slot, handle) in lane.slots.iter().enumerate() {
            let expect = &lane.pool[(lane.left_index + slot) % len];
            assert_eq!(
                lane.bindings[handle].item_id, expect.id,
                "slot {slot} out of sync"
            );
        }
    }

    // ---- assign_slot_count tests ----

    #[test]
    fn grow_binds_modulo_pool() {
        let mut surface = ScriptedSurface::with_geometry(90.0, 10.0, 400.0);
        let mut lane = Lane::new(LANE, &LaneSpec::new("test", 0.0));
        lane.pool = pool(&["a", "b", "c"]);
        assign_slot_count(&mut lane, &mut surface);

        assert_eq!(lane.slots.len(), PREALLOCATED_SLOT_COUNT);
        assert_bindings_consistent(&lane);
        assert_eq!(surface.item_at(LANE, 0), Some("a"));
        assert_eq!(surface.item_at(LANE, 3), Some("a"));
    }

    #[test]
    fn span_falls_back_without_sample() {
        let mut surface = ScriptedSurface::with_geometry(90.0, 10.0, 400.0);
        let mut lane = Lane::new(LANE, &LaneSpec::new("test", 0.0));
        // No tiles exist yet, so the first measure has no sample.
        assign_slot_count(&mut lane, &mut surface);
        assert!((lane.tile_span - (FALLBACK_TILE_WIDTH + 10.0)).abs() < f32::EPSILON);
    }

    #[test]
    fn remeasure_uses_live_sample() {
        let mut surface = ScriptedSurface::with_geometry(90.0, 10.0, 400.0);
        let mut lane = Lane::new(LANE, &LaneSpec::new("test", 0.0));
        assign_slot_count(&mut lane, &mut surface);
        assign_slot_count(&mut lane, &mut surface);
        assert!((lane.tile_span - 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn slot_count_never_shrinks() {
        let mut surface = ScriptedSurface::with_geometry(90.0, 10.0, 9000.0);
        let mut lane = Lane::new(LANE, &LaneSpec::new("test", 0.0));
        assign_slot_count(&mut lane, &mut surface);
        let grown = lane.slots.len();
        assert!(grown > PREALLOCATED_SLOT_COUNT);

        surface.set_viewport_width(400.0);
        assign_slot_count(&mut lane, &mut surface);
        assert_eq!(lane.slots.len(), grown);
    }

    #[test]
    fn growth_keeps_existing_bindings() {
        let mut surface = ScriptedSurface::with_geometry(90.0, 10.0, 400.0);
        let mut lane = Lane::new(LANE, &LaneSpec::new("test", 0.0));
        lane.pool = pool(&["a", "b", "c", "d", "e"]);
        assign_slot_count(&mut lane, &mut surface);
        let before = surface.order(LANE);

        surface.set_viewport_width(9000.0);
        assign_slot_count(&mut lane, &mut surface);
        assert!(lane.slots.len() > before.len());
        // Old handles are still at the front, in order.
        assert_eq!(&surface.order(LANE)[..before.len()], &before[..]);
        assert_bindings_consistent(&lane);
    }

    // ---- normalize tests ----

    #[test]
    fn offset_inside_bounds_is_untouched() {
        let mut surface = ScriptedSurface::new();
        let mut lane = small_lane(&["a", "b", "c", "d", "e"], 4, &mut surface);
        normalize(&mut lane, &mut surface);
        assert!((lane.offset - -150.0).abs() < f32::EPSILON);
        assert_eq!(lane.left_index, 0);
    }

    #[test]
    fn drift_right_rotates_right() {
        let mut surface = ScriptedSurface::new();
        let mut lane = small_lane(&["a", "b", "c", "d", "e"], 4, &mut surface);
        lane.offset += 100.0; // -50, past upper (-100)
        normalize(&mut lane, &mut surface);

        assert_eq!(lane.left_index, 4);
        assert!((lane.offset - -150.0).abs() < 1e-3);
        assert_eq!(surface.moves_to_front(LANE), 1);
        assert_eq!(surface.leading_ids(LANE, 4), ["e", "a", "b", "c"]);
        assert_bindings_consistent(&lane);
    }

    #[test]
    fn drift_left_rotates_left() {
        let mut surface = ScriptedSurface::new();
        let mut lane = small_lane(&["a", "b", "c", "d", "e"], 4, &mut surface);
        lane.offset -= 100.0; // -250, past lower (-200)
        normalize(&mut lane, &mut surface);

        assert_eq!(lane.left_index, 1);
        assert!((lane.offset - -150.0).abs() < 1e-3);
        assert_eq!(surface.moves_to_back(LANE), 1);
        assert_eq!(surface.leading_ids(LANE, 4), ["b", "c", "d", "e"]);
        assert_bindings_consistent(&lane);
    }

    #[test]
    fn multi_span_displacement_absorbed_in_one_call() {
        let mut surface = ScriptedSurface::new();
        let mut lane = small_lane(&["a", "b", "c", "d", "e"], 4, &mut surface);
        lane.offset -= 330.0; // a bit over three spans left
        normalize(&mut lane, &mut surface);

        assert_eq!(surface.moves_to_back(LANE), 3);
        assert_eq!(lane.left_index, 3);
        assert!(lane.offset > lower_bound(&lane) && lane.offset < upper_bound(&lane));
        assert_bindings_consistent(&lane);
    }

    #[test]
    fn window_wraps_the_pool() {
        // The end-to-end wrap: pool [a..e], 4 slots, scroll left exactly
        // three spans in bounded steps. Three rotations, left_index 3,
        // window shows [d, e, a, b].
        let mut surface = ScriptedSurface::new();
        let mut lane = small_lane(&["a", "b", "c", "d", "e"], 4, &mut surface);
        for _ in 0..6 {
            lane.offset -= 50.0;
            normalize(&mut lane, &mut surface);
        }
        assert_eq!(surface.moves_to_back(LANE), 3);
        assert_eq!(lane.left_index, 3);
        assert_eq!(surface.leading_ids(LANE, 4), ["d", "e", "a", "b"]);
    }

    #[test]
    fn single_item_pool_never_errors() {
        let mut surface = ScriptedSurface::new();
        let mut lane = small_lane(&["only"], 4, &mut surface);
        for delta in [-70.0, -90.0, 120.0, -30.0, 300.0, -500.0] {
            lane.offset += delta;
            normalize(&mut lane, &mut surface);
        }
        assert_eq!(lane.left_index, 0);
        for handle in &lane.slots {
            assert_eq!(lane.bindings[handle].item_id, "only");
        }
    }
}
