#![forbid(unsafe_code)]

//! Leaf types for the Driftwall scroll engine.
//!
//! This crate carries no engine logic: it defines the content item model
//! ([`item::TileItem`]), the capability trait a render surface implements
//! ([`surface::LaneSurface`]), input event types ([`event`]), and the small
//! exponential motion helpers ([`ease`]) the engine's kinetic model uses.
//!
//! The engine itself lives in `driftwall-engine`; test doubles live in
//! `driftwall-harness`.

pub mod ease;
pub mod event;
pub mod item;
pub mod surface;

pub use event::{PointerId, TileClick};
pub use item::TileItem;
pub use surface::{LaneId, LaneSurface, SurfaceMetrics, TileHandle};
