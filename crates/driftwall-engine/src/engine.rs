#![forbid(unsafe_code)]

//! Lane lifecycle controller.
//!
//! [`Engine`] owns every lane, the frame clock bookkeeping, and the
//! cooperative timer queue. It is driven entirely by the host: frame
//! advancement through [`Engine::advance_frame`], deferred work through
//! [`Engine::run_due_timers`], input through the pointer methods, and data
//! through [`Engine::set_row_items`]. Nothing here blocks, and invalid
//! input never faults — a dropped update must not interrupt motion, so it
//! is logged and ignored.

use std::collections::HashSet;
use std::time::Duration;

use driftwall_core::event::{PointerId, TileClick};
use driftwall_core::item::{TileItem, dedupe_items};
use driftwall_core::surface::{LaneId, LaneSurface, TileHandle};
use tracing::debug;

use crate::hydrate::{self, HYDRATION_INTERVAL};
use crate::lane::{GestureFlags, Lane, LaneSpec};
use crate::motion::{self, MAX_FRAME_DT};
use crate::timers::{TimerQueue, TimerTask};
use crate::window;

/// Quiet period after the last resize notification before lanes are
/// re-measured.
pub(crate) const RESIZE_QUIET_PERIOD: Duration = Duration::from_millis(140);
/// Cap on distinct image urls prefetched per pool update.
pub(crate) const IMAGE_WARMUP_CAP: usize = 120;

/// Callback invoked when a tile is tapped.
pub type TileClickFn = Box<dyn FnMut(TileClick)>;

/// Construction options for [`Engine`].
pub struct EngineOptions {
    /// Process-wide ambient speed scale (reduced-motion accessibility).
    pub motion_factor: f32,
    /// Receiver for tap events; `None` drops them.
    pub on_tile_click: Option<TileClickFn>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            motion_factor: 1.0,
            on_tile_click: None,
        }
    }
}

impl EngineOptions {
    /// Set the ambient speed scale.
    #[must_use]
    pub fn motion_factor(mut self, factor: f32) -> Self {
        self.motion_factor = factor;
        self
    }

    /// Set the tap receiver.
    #[must_use]
    pub fn on_tile_click(mut self, callback: impl FnMut(TileClick) + 'static) -> Self {
        self.on_tile_click = Some(Box::new(callback));
        self
    }
}

/// Read-only view of one lane's state, for hosts and tests.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LaneSnapshot {
    pub offset: f32,
    pub tile_span: f32,
    pub left_index: usize,
    pub slot_count: usize,
    pub pool_len: usize,
    pub revision: u64,
    pub hydrating: bool,
    pub ambient_factor: f32,
    pub drag_speed: f32,
}

/// The scroll engine: all lanes plus cross-cutting state.
pub struct Engine<S: LaneSurface> {
    surface: S,
    lanes: Vec<Lane>,
    timers: TimerQueue,
    paused: bool,
    speed_factor: f32,
    last_frame: Option<Duration>,
    resize_generation: u64,
    on_tile_click: Option<TileClickFn>,
}

impl<S: LaneSurface> Engine<S> {
    /// Build the engine and bring every lane up on its placeholder pool:
    /// slots are preallocated and bound, and the offset starts at a small
    /// pre-roll past the recycle anchor so lanes appear mid-scroll on first
    /// paint.
    pub fn new(mut surface: S, specs: Vec<LaneSpec>, options: EngineOptions) -> Self {
        let mut lanes: Vec<Lane> = specs
            .iter()
            .enumerate()
            .map(|(index, spec)| Lane::new(LaneId(index as u32), spec))
            .collect();

        for lane in &mut lanes {
            window::assign_slot_count(lane, &mut surface);
            lane.offset =
                -lane.tile_span * (lane.left_buffer_tiles as f32 + lane.entry_peek_ratio);
            surface.set_offset(lane.id, lane.offset);
        }
        debug!(lanes = lanes.len(), "engine initialized");

        Self {
            surface,
            lanes,
            timers: TimerQueue::new(),
            paused: false,
            speed_factor: sanitize_factor(options.motion_factor),
            last_frame: None,
            resize_generation: 0,
            on_tile_click: options.on_tile_click,
        }
    }

    /// The render surface, for host wiring.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Mutable surface access, for host wiring.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Engine id for a host lane key.
    #[must_use]
    pub fn lane_id(&self, key: &str) -> Option<LaneId> {
        self.lane_index(key).map(|index| self.lanes[index].id)
    }

    /// Snapshot a lane's state.
    #[must_use]
    pub fn lane_snapshot(&self, key: &str) -> Option<LaneSnapshot> {
        let lane = &self.lanes[self.lane_index(key)?];
        Some(LaneSnapshot {
            offset: lane.offset,
            tile_span: lane.tile_span,
            left_index: lane.left_index,
            slot_count: lane.slots.len(),
            pool_len: lane.pool.len(),
            revision: lane.revision,
            hydrating: lane.hydration.is_some(),
            ambient_factor: lane.ambient_factor,
            drag_speed: lane.drag_speed,
        })
    }

    // ---- frame loop -------------------------------------------------------

    /// Advance every lane. Call once per frame with a monotonic host
    /// timestamp; a no-op while paused, so a paused host can simply stop
    /// scheduling frames.
    pub fn advance_frame(&mut self, now: Duration) {
        if self.paused {
            return;
        }
        let dt = match self.last_frame {
            Some(last) if now > last => (now - last).as_secs_f32().min(MAX_FRAME_DT),
            _ => 0.0,
        };
        self.last_frame = Some(now);

        let speed_factor = self.speed_factor;
        for lane in &mut self.lanes {
            motion::advance(lane, &mut self.surface, now, dt, speed_factor);
        }
    }

    /// Service all timers due at `now`: hydration chunks and the resize
    /// settle. Independent of the frame loop — hydration keeps making
    /// progress while frames are paused.
    pub fn run_due_timers(&mut self, now: Duration) {
        while let Some(task) = self.timers.pop_due(now) {
            match task {
                TimerTask::HydrationStep { lane, revision } => {
                    self.hydration_step(lane, revision, now);
                }
                TimerTask::ResizeSettle { generation } => {
                    if generation == self.resize_generation {
                        self.apply_resize();
                    }
                }
            }
        }
    }

    /// Earliest pending timer deadline, so a host can sleep precisely.
    #[must_use]
    pub fn next_timer_due(&self) -> Option<Duration> {
        self.timers.next_due()
    }

    // ---- host inputs ------------------------------------------------------

    /// Note that the viewport changed. Re-measurement is debounced: it runs
    /// once per burst, [`RESIZE_QUIET_PERIOD`] after the last notification.
    pub fn notify_resize(&mut self, now: Duration) {
        self.resize_generation += 1;
        self.timers.schedule(
            now + RESIZE_QUIET_PERIOD,
            TimerTask::ResizeSettle {
                generation: self.resize_generation,
            },
        );
    }

    /// Replace a lane's content pool.
    ///
    /// Empty input or an unknown key is ignored. Items are deduped by id,
    /// their images prefetched (bounded), and the slot window is rebound to
    /// the new pool progressively; a replacement arriving mid-rebind
    /// supersedes the previous one cleanly.
    pub fn set_row_items(&mut self, key: &str, items: Vec<TileItem>, now: Duration) {
        let Some(index) = self.lane_index(key) else {
            debug!(key, "dropped items for unknown lane");
            return;
        };
        if items.is_empty() {
            debug!(key, "dropped empty item update");
            return;
        }
        let items = dedupe_items(items);
        if items.is_empty() {
            debug!(key, "dropped update with no usable identities");
            return;
        }

        let mut seen = HashSet::new();
        let mut warmed = 0usize;
        for item in &items {
            let Some(url) = &item.image_url else { continue };
            if !seen.insert(url.as_str()) {
                continue;
            }
            self.surface.prefetch_image(url);
            warmed += 1;
            if warmed >= IMAGE_WARMUP_CAP {
                break;
            }
        }

        let lane = &mut self.lanes[index];
        lane.pool = items;
        lane.left_index %= lane.pool.len();
        window::assign_slot_count(lane, &mut self.surface);
        let revision = hydrate::begin(lane);
        debug!(key, revision, pool = lane.pool.len(), "lane pool replaced");

        // First chunk binds immediately; the rest are timer-driven.
        let lane_id = self.lanes[index].id;
        self.hydration_step(lane_id, revision, now);
    }

    pub fn pointer_down(&mut self, key: &str, pointer: PointerId, x: f32, now: Duration) {
        if let Some(index) = self.lane_index(key) {
            motion::pointer_down(&mut self.lanes[index], &mut self.surface, pointer, x, now);
        }
    }

    pub fn pointer_move(&mut self, key: &str, pointer: PointerId, x: f32, now: Duration) {
        if let Some(index) = self.lane_index(key) {
            motion::pointer_move(&mut self.lanes[index], &mut self.surface, pointer, x, now);
        }
    }

    pub fn pointer_up(&mut self, key: &str, pointer: PointerId, now: Duration) {
        if let Some(index) = self.lane_index(key) {
            motion::pointer_end(&mut self.lanes[index], &mut self.surface, pointer, now);
        }
    }

    /// Same contract as [`Engine::pointer_up`]; capture loss and leave are
    /// gesture ends, not errors.
    pub fn pointer_cancel(&mut self, key: &str, pointer: PointerId, now: Duration) {
        self.pointer_up(key, pointer, now);
    }

    /// Route a click on a tile. Suppressed when the lane's last gesture was
    /// a drag; otherwise reports the item the tile currently shows.
    pub fn tile_clicked(&mut self, key: &str, handle: TileHandle) {
        let Some(index) = self.lane_index(key) else {
            return;
        };
        let lane = &self.lanes[index];
        if lane.gesture.contains(GestureFlags::MOVED) {
            debug!(key, "click suppressed after drag");
            return;
        }
        let Some(binding) = lane.bindings.get(&handle) else {
            return;
        };
        let click = TileClick {
            lane: lane.key.clone(),
            item_id: binding.item_id.clone(),
            context_ref: binding.context_ref.clone(),
        };
        if let Some(callback) = self.on_tile_click.as_mut() {
            callback(click);
        }
    }

    // ---- cross-cutting controls -------------------------------------------

    /// Pause or resume frame advancement. Idempotent. Resuming resets the
    /// frame clock so the pause gap never turns into one giant `dt`.
    pub fn set_paused(&mut self, paused: bool) {
        if self.paused == paused {
            return;
        }
        self.paused = paused;
        if !paused {
            self.last_frame = None;
        }
        debug!(paused, "pause state changed");
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Set the process-wide ambient speed scale. Negative and non-finite
    /// values clamp to zero.
    pub fn set_motion_factor(&mut self, factor: f32) {
        self.speed_factor = sanitize_factor(factor);
    }

    #[must_use]
    pub fn motion_factor(&self) -> f32 {
        self.speed_factor
    }

    /// Tear the engine down: outstanding timers (hydration chains, resize
    /// settle) are dropped so nothing fires against dead lanes.
    pub fn destroy(mut self) {
        self.timers.clear();
        self.lanes.clear();
        debug!("engine destroyed");
    }

    // ---- internals --------------------------------------------------------

    fn lane_index(&self, key: &str) -> Option<usize> {
        self.lanes.iter().position(|lane| lane.key == key)
    }

    fn hydration_step(&mut self, lane_id: LaneId, revision: u64, now: Duration) {
        let Some(lane) = self.lanes.get_mut(lane_id.index()) else {
            return;
        };
        if hydrate::step(lane, &mut self.surface, revision) {
            self.timers.schedule(
                now + HYDRATION_INTERVAL,
                TimerTask::HydrationStep {
                    lane: lane_id,
                    revision,
                },
            );
        }
    }

    fn apply_resize(&mut self) {
        for lane in &mut self.lanes {
            window::assign_slot_count(lane, &mut self.surface);
            window::normalize(lane, &mut self.surface);
            self.surface.set_offset(lane.id, lane.offset);
        }
        debug!("resize applied");
    }
}

fn sanitize_factor(factor: f32) -> f32 {
    if factor.is_finite() { factor.max(0.0) } else { 0.0 }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
