#![forbid(unsafe_code)]

//! Headless host for Waypoint tours.
//!
//! Loads a step list and a route-keyed page layout, then plays the part of
//! the browser: it swaps pages on navigation, scrolls targets into view, and
//! ticks time in fixed frames while a script drives Next/Back/Skip.

pub mod cli;
pub mod error;
pub mod host;
pub mod layout;
pub mod logging;

pub use cli::{run, run_from_env};
pub use error::{DemoError, Result};
pub use host::{Host, Report, ScriptCommand, TranscriptEntry, parse_script};
pub use layout::Layout;
