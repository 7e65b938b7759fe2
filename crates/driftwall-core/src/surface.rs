#![forbid(unsafe_code)]

//! Render surface capability trait.
//!
//! The engine never touches a concrete visual tree. Everything it needs from
//! a renderer — creating tile visuals, binding item data to them, mirroring
//! slot rotation, positioning the track, and measuring — goes through
//! [`LaneSurface`]. A production adapter wraps a real UI layer; tests use the
//! scripted surface from `driftwall-harness`.

use std::time::Duration;

use crate::item::TileItem;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Engine-assigned lane identifier, dense from zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LaneId(pub u32);

impl LaneId {
    /// Index form, for dense per-lane storage.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Opaque handle to one tile visual, issued by the surface.
///
/// Handles are stable for the life of the tile: rotation and rehydration
/// rebind a handle to new content, they never reissue it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileHandle(pub u64);

// ---------------------------------------------------------------------------
// Measurement
// ---------------------------------------------------------------------------

/// What the surface can currently measure for a lane.
///
/// `tile_width` is `None` until at least one tile visual exists to sample;
/// the engine substitutes a fixed default span in that case rather than
/// failing.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SurfaceMetrics {
    /// Width of one tile visual, px.
    pub tile_width: Option<f32>,
    /// Inter-tile gap, px.
    pub gap: f32,
    /// Width of the lane's visible viewport, px.
    pub viewport_width: f32,
}

// ---------------------------------------------------------------------------
// LaneSurface
// ---------------------------------------------------------------------------

/// Capability interface the engine drives a renderer through.
///
/// All methods are infallible: a surface that cannot honor an operation
/// (e.g. measurement before any tile exists) reports that through its return
/// value or ignores the call, never by panicking. The engine treats the
/// surface as write-mostly; the only read path is [`measure`].
///
/// [`measure`]: LaneSurface::measure
pub trait LaneSurface {
    /// Create one tile visual at the back of the lane's track and return its
    /// handle.
    fn create_tile(&mut self, lane: LaneId) -> TileHandle;

    /// Bind an item's visual parameters to a tile.
    ///
    /// `reveal_delay` staggers the tile's entrance animation; zero means
    /// show immediately.
    fn apply_item(&mut self, handle: TileHandle, item: &TileItem, reveal_delay: Duration);

    /// Move a tile visual to the front (left end) of its lane's track.
    fn move_to_front(&mut self, lane: LaneId, handle: TileHandle);

    /// Move a tile visual to the back (right end) of its lane's track.
    fn move_to_back(&mut self, lane: LaneId, handle: TileHandle);

    /// Position the lane's track at `offset` px relative to its anchor.
    fn set_offset(&mut self, lane: LaneId, offset: f32);

    /// Measure the lane. See [`SurfaceMetrics`] for partial-result rules.
    fn measure(&self, lane: LaneId) -> SurfaceMetrics;

    /// Reflect whether a drag gesture is active on the lane.
    ///
    /// Purely visual (cursor, snapping class); default does nothing.
    fn set_drag_active(&mut self, lane: LaneId, active: bool) {
        let _ = (lane, active);
    }

    /// Hint that an image will be needed soon. Default does nothing.
    fn prefetch_image(&mut self, url: &str) {
        let _ = url;
    }
}
