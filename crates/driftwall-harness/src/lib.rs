#![forbid(unsafe_code)]

//! Deterministic test doubles for the Driftwall engine.
//!
//! [`ScriptedSurface`] implements [`LaneSurface`] entirely in memory: it
//! issues tile handles, mirrors track order under rotation, records every
//! operation in an inspectable log, and serves configurable measurements.
//! [`VirtualClock`] provides the monotonic host timestamps the engine is
//! driven with, advanced explicitly by the test.

use std::collections::HashMap;
use std::time::Duration;

use driftwall_core::item::TileItem;
use driftwall_core::surface::{LaneId, LaneSurface, SurfaceMetrics, TileHandle};

// ---------------------------------------------------------------------------
// Operation log
// ---------------------------------------------------------------------------

/// One recorded surface operation.
#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceOp {
    CreateTile { lane: LaneId, handle: TileHandle },
    ApplyItem { handle: TileHandle, item_id: String },
    MoveToFront { lane: LaneId, handle: TileHandle },
    MoveToBack { lane: LaneId, handle: TileHandle },
    SetOffset { lane: LaneId, offset: f32 },
    SetDragActive { lane: LaneId, active: bool },
    PrefetchImage { url: String },
}

/// Last binding applied to one tile handle.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundTile {
    pub item_id: String,
    pub context_ref: String,
    pub image_url: Option<String>,
    pub reveal_delay: Duration,
    /// How many times this handle has been rebound, including the first.
    pub apply_count: u32,
}

#[derive(Default)]
struct LaneMirror {
    order: Vec<TileHandle>,
    offset: f32,
    drag_active: bool,
}

// ---------------------------------------------------------------------------
// ScriptedSurface
// ---------------------------------------------------------------------------

/// In-memory [`LaneSurface`] with full operation recording.
///
/// Measurement behaves like a real surface: `tile_width` is reported only
/// once the lane has at least one tile to sample.
pub struct ScriptedSurface {
    next_handle: u64,
    tile_width: f32,
    gap: f32,
    viewport_width: f32,
    lanes: HashMap<LaneId, LaneMirror>,
    bindings: HashMap<TileHandle, BoundTile>,
    ops: Vec<SurfaceOp>,
}

impl ScriptedSurface {
    /// Surface with the default geometry (140 px tiles, 16 px gap, 1280 px
    /// viewport).
    #[must_use]
    pub fn new() -> Self {
        Self::with_geometry(140.0, 16.0, 1280.0)
    }

    /// Surface with explicit tile width, gap, and viewport width.
    #[must_use]
    pub fn with_geometry(tile_width: f32, gap: f32, viewport_width: f32) -> Self {
        Self {
            next_handle: 0,
            tile_width,
            gap,
            viewport_width,
            lanes: HashMap::new(),
            bindings: HashMap::new(),
            ops: Vec::new(),
        }
    }

    /// Change the viewport width (simulates a window resize).
    pub fn set_viewport_width(&mut self, width: f32) {
        self.viewport_width = width;
    }

    fn lane(&mut self, lane: LaneId) -> &mut LaneMirror {
        self.lanes.entry(lane).or_default()
    }

    // ---- inspection -------------------------------------------------------

    /// Every recorded operation, in order.
    #[must_use]
    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    /// Clear the operation log (bindings and order are kept).
    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    /// Number of tiles created for a lane.
    #[must_use]
    pub fn tile_count(&self, lane: LaneId) -> usize {
        self.lanes.get(&lane).map_or(0, |m| m.order.len())
    }

    /// Current front-to-back track order for a lane.
    #[must_use]
    pub fn order(&self, lane: LaneId) -> Vec<TileHandle> {
        self.lanes.get(&lane).map(|m| m.order.clone()).unwrap_or_default()
    }

    /// Item id currently bound to the tile at track position `pos`.
    #[must_use]
    pub fn item_at(&self, lane: LaneId, pos: usize) -> Option<&str> {
        let handle = self.lanes.get(&lane)?.order.get(pos)?;
        self.bindings.get(handle).map(|b| b.item_id.as_str())
    }

    /// Item ids of the first `count` tiles in track order.
    #[must_use]
    pub fn leading_ids(&self, lane: LaneId, count: usize) -> Vec<String> {
        (0..count)
            .filter_map(|pos| self.item_at(lane, pos).map(str::to_owned))
            .collect()
    }

    /// Last binding applied to a handle, if any.
    #[must_use]
    pub fn binding(&self, handle: TileHandle) -> Option<&BoundTile> {
        self.bindings.get(&handle)
    }

    /// Track offset last pushed for a lane.
    #[must_use]
    pub fn offset(&self, lane: LaneId) -> f32 {
        self.lanes.get(&lane).map_or(0.0, |m| m.offset)
    }

    /// Whether the lane is currently flagged as dragging.
    #[must_use]
    pub fn drag_active(&self, lane: LaneId) -> bool {
        self.lanes.get(&lane).is_some_and(|m| m.drag_active)
    }

    /// Count of front rotations recorded for a lane.
    #[must_use]
    pub fn moves_to_front(&self, lane: LaneId) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, SurfaceOp::MoveToFront { lane: l, .. } if *l == lane))
            .count()
    }

    /// Count of back rotations recorded for a lane.
    #[must_use]
    pub fn moves_to_back(&self, lane: LaneId) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, SurfaceOp::MoveToBack { lane: l, .. } if *l == lane))
            .count()
    }

    /// Urls prefetched so far, in order.
    #[must_use]
    pub fn prefetched(&self) -> Vec<String> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                SurfaceOp::PrefetchImage { url } => Some(url.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Default for ScriptedSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl LaneSurface for ScriptedSurface {
    fn create_tile(&mut self, lane: LaneId) -> TileHandle {
        let handle = TileHandle(self.next_handle);
        self.next_handle += 1;
        self.lane(lane).order.push(handle);
        self.ops.push(SurfaceOp::CreateTile { lane, handle });
        handle
    }

    fn apply_item(&mut self, handle: TileHandle, item: &TileItem, reveal_delay: Duration) {
        let entry = self.bindings.entry(handle).or_insert_with(|| BoundTile {
            item_id: String::new(),
            context_ref: String::new(),
            image_url: None,
            reveal_delay: Duration::ZERO,
            apply_count: 0,
        });
        entry.item_id = item.id.clone();
        entry.context_ref = item.context_ref.clone();
        entry.image_url = item.image_url.clone();
        entry.reveal_delay = reveal_delay;
        entry.apply_count += 1;
        self.ops.push(SurfaceOp::ApplyItem {
            handle,
            item_id: item.id.clone(),
        });
    }

    fn move_to_front(&mut self, lane: LaneId, handle: TileHandle) {
        let mirror = self.lane(lane);
        mirror.order.retain(|h| *h != handle);
        mirror.order.insert(0, handle);
        self.ops.push(SurfaceOp::MoveToFront { lane, handle });
    }

    fn move_to_back(&mut self, lane: LaneId, handle: TileHandle) {
        let mirror = self.lane(lane);
        mirror.order.retain(|h| *h != handle);
        mirror.order.push(handle);
        self.ops.push(SurfaceOp::MoveToBack { lane, handle });
    }

    fn set_offset(&mut self, lane: LaneId, offset: f32) {
        self.lane(lane).offset = offset;
        self.ops.push(SurfaceOp::SetOffset { lane, offset });
    }

    fn measure(&self, lane: LaneId) -> SurfaceMetrics {
        let has_sample = self.lanes.get(&lane).is_some_and(|m| !m.order.is_empty());
        SurfaceMetrics {
            tile_width: has_sample.then_some(self.tile_width),
            gap: self.gap,
            viewport_width: self.viewport_width,
        }
    }

    fn set_drag_active(&mut self, lane: LaneId, active: bool) {
        self.lane(lane).drag_active = active;
        self.ops.push(SurfaceOp::SetDragActive { lane, active });
    }

    fn prefetch_image(&mut self, url: &str) {
        self.ops.push(SurfaceOp::PrefetchImage { url: url.to_owned() });
    }
}

// ---------------------------------------------------------------------------
// VirtualClock
// ---------------------------------------------------------------------------

/// Explicitly-advanced monotonic clock.
///
/// Starts at a non-zero epoch so tests catch code that confuses "time zero"
/// with "unset".
#[derive(Clone, Copy, Debug)]
pub struct VirtualClock {
    now: Duration,
}

impl VirtualClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: Duration::from_secs(100),
        }
    }

    /// Current timestamp.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Advance and return the new timestamp.
    pub fn advance(&mut self, by: Duration) -> Duration {
        self.now += by;
        self.now
    }
}

impl Default for VirtualClock {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
