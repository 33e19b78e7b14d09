#![forbid(unsafe_code)]

//! Core: geometry, viewport, and document capabilities for Waypoint.
//!
//! # Role in Waypoint
//! `waypoint-core` is the boundary layer. It owns the pixel-space primitives
//! and the read-only capabilities the tour engine uses to look at a host
//! page, so the engine itself never touches a real display surface.
//!
//! # Primary responsibilities
//! - **Geometry**: [`Rect`], [`Point`], [`Size`], [`Insets`].
//! - **Viewport**: [`Viewport`] snapshots behind the [`ViewportQuery`] trait.
//! - **Documents**: [`ElementQuery`] lookups and the in-memory [`StaticDocument`].
//! - **Time**: [`Clock`] with a host-driven [`DeterministicClock`].

pub mod clock;
pub mod document;
pub mod geometry;
pub mod viewport;

pub use clock::{Clock, DeterministicClock, SystemClock};
pub use document::{ElementQuery, ElementSpec, HostDocument, StaticDocument};
pub use geometry::{Insets, Point, Rect, Size};
pub use viewport::{Viewport, ViewportQuery};
