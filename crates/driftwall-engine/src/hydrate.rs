#![forbid(unsafe_code)]

//! Progressive hydration scheduler.
//!
//! Rebinding a lane's whole slot window in one go stalls the renderer
//! (image decode plus layout for dozens of tiles), so pool replacement
//! rebinds a small chunk of slots per cooperative step instead. Correctness
//! under replacement-during-replacement rests on one mechanism: every run
//! captures the lane revision it was started for, and any step whose
//! revision no longer matches stops without writing. No timer cancellation
//! is required for safety, only for hygiene at teardown.

use std::time::Duration;

use driftwall_core::surface::{LaneSurface, TileHandle};
use tracing::{debug, trace};

use crate::lane::Lane;

/// Gap between hydration steps.
pub(crate) const HYDRATION_INTERVAL: Duration = Duration::from_millis(80);
/// Slots rebound per step.
pub(crate) const HYDRATION_CHUNK: usize = 2;

/// One in-flight rebinding pass over a lane's slots.
///
/// The slot order and left index are snapshotted at start; rotations that
/// land mid-run are tolerated, the run just finishes against its snapshot
/// and the rotated slots were rebound by the rotation itself.
pub(crate) struct HydrationRun {
    pub(crate) revision: u64,
    pub(crate) base_left_index: usize,
    pub(crate) snapshot: Vec<TileHandle>,
    pub(crate) cursor: usize,
}

/// Start a hydration run for a freshly replaced pool. Bumps the lane
/// revision (which invalidates any in-flight run) and returns the new value
/// for the caller to key timer steps with.
pub(crate) fn begin(lane: &mut Lane) -> u64 {
    lane.revision += 1;
    lane.hydration = Some(HydrationRun {
        revision: lane.revision,
        base_left_index: lane.left_index,
        snapshot: lane.slots.iter().copied().collect(),
        cursor: 0,
    });
    lane.revision
}

/// Run one chunk of the hydration keyed by `revision`.
///
/// Returns `true` when more chunks remain (the caller reschedules), `false`
/// when the run is complete or superseded.
pub(crate) fn step<S: LaneSurface>(lane: &mut Lane, surface: &mut S, revision: u64) -> bool {
    let Some(mut run) = lane.hydration.take() else {
        return false;
    };
    if run.revision != revision {
        trace!(
            lane = lane.id.0,
            stale = revision,
            current = run.revision,
            "stale hydration step abandoned"
        );
        lane.hydration = Some(run);
        return false;
    }

    let len = lane.pool.len();
    let end = (run.cursor + HYDRATION_CHUNK).min(run.snapshot.len());
    while run.cursor < end {
        let handle = run.snapshot[run.cursor];
        let index = (run.base_left_index + run.cursor) % len;
        lane.bind_slot(surface, handle, index, Duration::ZERO);
        run.cursor += 1;
    }

    if run.cursor < run.snapshot.len() {
        lane.hydration = Some(run);
        true
    } else {
        debug!(lane = lane.id.0, revision, "hydration complete");
        false
    }
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

    fn lane_with_slots(slot_count: usize, surface: &mut ScriptedSurface) -> Lane {
        let mut lane = Lane::new(LANE, &LaneSpec::new("test", 0.0));
        lane.pool = vec![TileItem::derive("old", None, "")];
        for _ in 0..slot_count {
            let handle = surface.create_tile(LANE);
            lane.bind_slot(surface, handle, 0, Duration::ZERO);
            lane.slots.push_back(handle);
        }
        lane
    }

    fn replace_pool(lane: &mut Lane, ids: &[&str]) -> u64 {
        lane.pool = ids.iter().map(|id| TileItem::derive(*id, None, "")).collect();
        lane.left_index %= lane.pool.len();
        begin(lane)
    }

    #[test]
    fn steps_rebind_in_chunks() {
        let mut surface = ScriptedSurface::new();
        let mut lane = lane_with_slots(6, &mut surface);
        let rev = replace_pool(&mut lane, &["a", "b", "c"]);

        assert!(step(&mut lane, &mut surface, rev));
        assert_eq!(surface.leading_ids(LANE, 6), ["a", "b", "old", "old", "old", "old"]);
        assert!(step(&mut lane, &mut surface, rev));
        assert!(!step(&mut lane, &mut surface, rev));
        assert_eq!(surface.leading_ids(LANE, 6), ["a", "b", "c", "a", "b", "c"]);
        assert!(lane.hydration.is_none());
    }

    #[test]
    fn cursor_honors_left_index_base() {
        let mut surface = ScriptedSurface::new();
        let mut lane = lane_with_slots(4, &mut surface);
        lane.left_index = 0;
        lane.pool = ["a", "b", "c", "d", "e"]
            .iter()
            .map(|id| TileItem::derive(*id, None, ""))
            .collect();
        lane.left_index = 2;
        let rev = begin(&mut lane);
        while step(&mut lane, &mut surface, rev) {}
        assert_eq!(surface.leading_ids(LANE, 4), ["c", "d", "e", "a"]);
    }

    #[test]
    fn stale_revision_writes_nothing() {
        let mut surface = ScriptedSurface::new();
        let mut lane = lane_with_slots(6, &mut surface);
        let first = replace_pool(&mut lane, &["a", "b", "c"]);
        assert!(step(&mut lane, &mut surface, first));

        let second = replace_pool(&mut lane, &["x", "y"]);
        let applies_before: u32 = lane
            .slots
            .iter()
            .map(|h| surface.binding(*h).unwrap().apply_count)
            .sum();

        // The first run's next step must be a pure no-op.
        assert!(!step(&mut lane, &mut surface, first));
        let applies_after: u32 = lane
            .slots
            .iter()
            .map(|h| surface.binding(*h).unwrap().apply_count)
            .sum();
        assert_eq!(applies_before, applies_after);

        // The second run then converges on the new pool alone.
        while step(&mut lane, &mut surface, second) {}
        for handle in &lane.slots {
            let id = &surface.binding(*handle).unwrap().item_id;
            assert!(id == "x" || id == "y", "stale binding survived: {id}");
        }
    }

    #[test]
    fn begin_supersedes_in_flight_run() {
        let mut surface = ScriptedSurface::new();
        let mut lane = lane_with_slots(4, &mut surface);
        let first = replace_pool(&mut lane, &["a"]);
        let second = replace_pool(&mut lane, &["b"]);
        assert_ne!(first, second);
        assert_eq!(lane.hydration.as_ref().unwrap().revision, second);
        assert_eq!(lane.revision, second);
    }

    #[test]
    fn step_without_run_is_noop() {
        let mut surface = ScriptedSurface::new();
        let mut lane = lane_with_slots(2, &mut surface);
        assert!(!step(&mut lane, &mut surface, 0));
    }
}
