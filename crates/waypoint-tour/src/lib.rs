#![forbid(unsafe_code)]

//! Waypoint Tour
//!
//! Target resolution, tooltip placement, and the step state machine behind a
//! guided product tour.
//!
//! # Key Components
//!
//! - [`Step`] / [`TargetDescriptor`] - What each step spotlights and where it lives
//! - [`resolve`] - Descriptors to a combined [`BoundingRegion`]
//! - [`RetryController`] - Polls for targets that have not mounted yet
//! - [`PlacementEngine`] - Picks one of eight tooltip sides and clamps it on screen
//! - [`Tour`] - Next/Back/Skip transitions, navigation, and timers
//! - [`TourConfig`] - All tunables, loadable from TOML or JSON
//!
//! # Role in Waypoint
//! `waypoint-tour` is the engine. It reads layout through the
//! `waypoint-core` capabilities, and answers every host input with ordered
//! [`TourEvent`]s plus a [`TourView`] render model. Routing, scrolling, and
//! drawing stay with the host.

pub mod config;
pub mod error;
pub mod placement;
pub mod resolver;
pub mod retry;
pub mod scheduler;
pub mod step;
pub mod tour;

pub use config::TourConfig;
pub use error::{Result, TourError};
pub use placement::{Arrow, Candidate, PlacementConfig, PlacementEngine, PlacementResult, Side};
pub use resolver::{BoundingRegion, resolve};
pub use retry::{BackoffStrategy, RetryController, RetryOutcome, RetryPolicy, RetryState};
pub use scheduler::{Scheduler, TimerId, TimerKind};
pub use step::{PreferredPosition, Step, StepAction, TargetDescriptor, sort_steps};
pub use tour::{Direction, Tour, TourEvent, TourPhase, TourView};
