#![forbid(unsafe_code)]

//! Input and output event types at the engine boundary.

/// Host-assigned pointer identifier, stable for one gesture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PointerId(pub u64);

/// Emitted when a tile is activated by a tap (a click that was not the end
/// of a drag gesture).
///
/// The engine performs no navigation itself; it hands the identity of the
/// clicked content to the host callback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileClick {
    /// Host key of the lane the tile belongs to.
    pub lane: String,
    /// Identity of the item the tile currently shows.
    pub item_id: String,
    /// Opaque context reference carried by that item.
    pub context_ref: String,
}
