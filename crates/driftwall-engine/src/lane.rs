#![forbid(unsafe_code)]

//! Per-lane scroll state.
//!
//! A [`Lane`] owns everything one scrolling track needs: its content pool,
//! the rotating slot window over it, the kinetic state, and the gesture
//! bookkeeping. Lanes are exclusively owned by the engine and passed by
//! mutable reference into the free functions in `window`, `motion`, and
//! `hydrate` — there is no hidden shared state between lanes.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use bitflags::bitflags;
use driftwall_core::event::PointerId;
use driftwall_core::item::{PLACEHOLDER_POOL_SIZE, TileItem, placeholder_pool};
use driftwall_core::surface::{LaneId, LaneSurface, TileHandle};

use crate::hydrate::HydrationRun;
use crate::window::{LEFT_BUFFER_TILES, RIGHT_BUFFER_TILES};

bitflags! {
    /// Drag gesture state.
    ///
    /// `MOVED` persists past the end of the gesture: a subsequent click on a
    /// tile is suppressed while it is set, which is how a drag release is
    /// distinguished from a tap. It is cleared on the next pointer-down.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub(crate) struct GestureFlags: u8 {
        const ACTIVE = 1 << 0;
        const MOVED = 1 << 1;
    }
}

/// Host-facing description of one lane.
#[derive(Clone, Debug, PartialEq)]
pub struct LaneSpec {
    /// Host key the lane is addressed by (e.g. `"recent"`).
    pub key: String,
    /// Ambient scroll speed, px/s. Sign is direction.
    pub base_speed: f32,
}

impl LaneSpec {
    #[must_use]
    pub fn new(key: impl Into<String>, base_speed: f32) -> Self {
        Self {
            key: key.into(),
            base_speed,
        }
    }
}

/// Item identity a tile handle currently shows.
///
/// Kept engine-side so tile clicks can report the item actually on screen,
/// which mid-hydration is not always what the steady-state formula says.
#[derive(Clone, Debug)]
pub(crate) struct SlotBinding {
    pub(crate) item_id: String,
    pub(crate) context_ref: String,
}

/// One scrolling track and all of its mutable state.
pub(crate) struct Lane {
    pub(crate) id: LaneId,
    pub(crate) key: String,
    pub(crate) base_speed: f32,

    /// Ordered content backing the lane. Never empty: lanes start on a
    /// generated placeholder pool and updates with no items are rejected.
    pub(crate) pool: Vec<TileItem>,
    /// Pool index bound to the leftmost slot.
    pub(crate) left_index: usize,
    /// Track position relative to the recycle anchor, px.
    pub(crate) offset: f32,
    /// Measured width of one tile plus gap, px. At least 1.
    pub(crate) tile_span: f32,
    /// Slot window in track order. Grows to the high-water mark, never
    /// shrinks before teardown.
    pub(crate) slots: VecDeque<TileHandle>,
    pub(crate) bindings: HashMap<TileHandle, SlotBinding>,
    pub(crate) max_slot_count: usize,
    pub(crate) left_buffer_tiles: usize,
    pub(crate) right_buffer_tiles: usize,
    /// Fraction of a tile span the initial pre-roll peeks past the left
    /// buffer, so lanes appear mid-scroll on first paint.
    pub(crate) entry_peek_ratio: f32,

    pub(crate) ambient_factor: f32,
    pub(crate) drag_speed: f32,
    /// Ambient stays dampened until this host timestamp passes.
    pub(crate) hold_until: Option<Duration>,
    pub(crate) gesture: GestureFlags,
    pub(crate) pointer_id: Option<PointerId>,
    pub(crate) pointer_x: f32,

    /// Bumped on every pool replacement; stale hydration runs check against
    /// it and abandon themselves.
    pub(crate) revision: u64,
    pub(crate) hydration: Option<HydrationRun>,
}

impl Lane {
    pub(crate) fn new(id: LaneId, spec: &LaneSpec) -> Self {
        Self {
            id,
            key: spec.key.clone(),
            base_speed: spec.base_speed,
            pool: placeholder_pool(&spec.key, PLACEHOLDER_POOL_SIZE),
            left_index: 0,
            offset: 0.0,
            tile_span: 1.0,
            slots: VecDeque::new(),
            bindings: HashMap::new(),
            max_slot_count: 0,
            left_buffer_tiles: LEFT_BUFFER_TILES,
            right_buffer_tiles: RIGHT_BUFFER_TILES,
            entry_peek_ratio: 0.5,
            ambient_factor: 1.0,
            drag_speed: 0.0,
            hold_until: None,
            gesture: GestureFlags::empty(),
            pointer_id: None,
            pointer_x: 0.0,
            revision: 0,
            hydration: None,
        }
    }

    /// Bind the item at `pool_index` to `handle`, on the surface and in the
    /// engine-side binding table.
    pub(crate) fn bind_slot<S: LaneSurface>(
        &mut self,
        surface: &mut S,
        handle: TileHandle,
        pool_index: usize,
        reveal_delay: Duration,
    ) {
        debug_assert!(pool_index < self.pool.len());
        let item = &self.pool[pool_index];
        surface.apply_item(handle, item, reveal_delay);
        let binding = SlotBinding {
            item_id: item.id.clone(),
            context_ref: item.context_ref.clone(),
        };
        self.bindings.insert(handle, binding);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
