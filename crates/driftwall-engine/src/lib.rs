#![forbid(unsafe_code)]

//! Infinite-lane virtualization and kinetic scroll engine.
//!
//! Driftwall perpetually scrolls lanes of content tiles recycled from a
//! small in-memory pool. This crate is the core of that: a circular window
//! manager that keeps a fixed set of tile slots aligned with a continuously
//! moving offset, a kinetic motion model blending ambient auto-scroll with
//! drag momentum, a revision-guarded progressive hydration scheduler for
//! pool replacement, and the lane lifecycle controller tying them together.
//!
//! The engine is single-threaded and host-driven: the host calls
//! [`Engine::advance_frame`] from its frame clock and
//! [`Engine::run_due_timers`] from its timer source; neither ever blocks.
//! Rendering goes through the [`LaneSurface`] capability trait from
//! `driftwall-core`.
//!
//! # Example
//!
//! ```ignore
//! let mut engine = Engine::new(
//!     surface,
//!     vec![
//!         LaneSpec::new("recent", 26.0),
//!         LaneSpec::new("saved", -26.0),
//!         LaneSpec::new("suggested", 22.0),
//!     ],
//!     EngineOptions::default(),
//! );
//! loop {
//!     let now = host.now();
//!     engine.run_due_timers(now);
//!     engine.advance_frame(now);
//!     host.wait_for_next_frame();
//! }
//! ```

mod hydrate;
mod motion;
mod timers;
mod window;

pub mod engine;
pub mod lane;

pub use driftwall_core::{LaneId, LaneSurface, PointerId, SurfaceMetrics, TileClick, TileHandle, TileItem};
pub use engine::{Engine, EngineOptions, LaneSnapshot};
pub use lane::LaneSpec;
