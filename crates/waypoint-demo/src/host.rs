//! Headless host loop.
//!
//! [`Host`] plays the part of a browser page around a [`Tour`]: it swaps
//! documents when the tour asks to navigate, scrolls when asked to bring a
//! region into view, and ticks time in fixed frames until the tour has no
//! pending timers.

use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;
use waypoint_core::{Rect, StaticDocument, Viewport, ViewportQuery};
use waypoint_tour::{Step, Tour, TourConfig, TourEvent, TourView};

use crate::error::{DemoError, Result};
use crate::layout::Layout;

/// Host frame length.
pub const FRAME: Duration = Duration::from_millis(50);

/// One scripted user or page action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScriptCommand {
    Next,
    Back,
    Skip,
    Close,
    /// Let time pass without input.
    Wait(Duration),
    /// Scroll the page to an absolute offset.
    Scroll { x: f64, y: f64 },
    Resize { width: f64, height: f64 },
}

impl FromStr for ScriptCommand {
    type Err = DemoError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (verb, arg) = match s.split_once(':') {
            Some((verb, arg)) => (verb, Some(arg)),
            None => (s, None),
        };
        match (verb, arg) {
            ("next", None) => Ok(Self::Next),
            ("back", None) => Ok(Self::Back),
            ("skip", None) => Ok(Self::Skip),
            ("close", None) => Ok(Self::Close),
            ("wait", Some(ms)) => ms
                .parse::<u64>()
                .map(|ms| Self::Wait(Duration::from_millis(ms)))
                .map_err(|_| DemoError::invalid(format!("wait expects milliseconds, got `{ms}`"))),
            ("scroll", Some(offset)) => {
                let (x, y) = parse_pair(offset, ',')?;
                Ok(Self::Scroll { x, y })
            }
            ("resize", Some(size)) => {
                let (width, height) = parse_pair(size, 'x')?;
                Ok(Self::Resize { width, height })
            }
            _ => Err(DemoError::invalid(format!("unknown script command `{s}`"))),
        }
    }
}

/// Parse a comma-separated script such as `next,wait:200,back`.
pub fn parse_script(script: &str) -> Result<Vec<ScriptCommand>> {
    let mut commands = Vec::new();
    let mut parts = script.split(',').map(str::trim).filter(|s| !s.is_empty());
    while let Some(part) = parts.next() {
        // `scroll:x,y` spans a comma.
        let token = if part.starts_with("scroll:") {
            let y = parts
                .next()
                .ok_or_else(|| DemoError::invalid(format!("`{part}` is missing its y offset")))?;
            format!("{part},{y}")
        } else {
            part.to_string()
        };
        commands.push(token.parse()?);
    }
    Ok(commands)
}

fn parse_pair(s: &str, sep: char) -> Result<(f64, f64)> {
    let err = || {
        DemoError::invalid(format!(
            "expected two numbers separated by `{sep}`, got `{s}`"
        ))
    };
    let (a, b) = s.split_once(sep).ok_or_else(err)?;
    let a = a.trim().parse::<f64>().map_err(|_| err())?;
    let b = b.trim().parse::<f64>().map_err(|_| err())?;
    Ok((a, b))
}

/// A tour event stamped with host time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptEntry {
    pub at_ms: u64,
    #[serde(flatten)]
    pub event: TourEvent,
}

/// Outcome of a scripted run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub route: String,
    pub elapsed_ms: u64,
    pub events: Vec<TranscriptEntry>,
    pub view: Option<TourView>,
}

pub struct Host {
    layout: Layout,
    doc: StaticDocument,
    route: String,
    tour: Tour,
    transcript: Vec<TranscriptEntry>,
    /// Longest a single settle may take before giving up.
    settle_budget: Duration,
}

impl Host {
    pub fn new(layout: Layout, steps: Vec<Step>, config: TourConfig) -> Result<Self> {
        layout.check_start()?;
        let config = config.validated()?;
        let doc = layout.document(&layout.start, layout.viewport);
        let settle_budget = settle_budget(&config, steps.len());
        Ok(Self {
            route: layout.start.clone(),
            doc,
            layout,
            tour: Tour::with_config(steps, config),
            transcript: Vec::new(),
            settle_budget,
        })
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.layout.viewport = viewport;
        self.doc.resize(viewport.width, viewport.height);
        self
    }

    pub fn tour(&self) -> &Tour {
        &self.tour
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn document(&self) -> &StaticDocument {
        &self.doc
    }

    /// Open the tour, run every command, and settle after each one.
    pub fn run_script(&mut self, script: &[ScriptCommand]) -> Result<Report> {
        tracing::info!(
            target: "waypoint.demo",
            commands = script.len(),
            route = %self.route,
            "run started"
        );
        let events = self.tour.set_open(true, &self.doc);
        self.apply(events);
        self.settle()?;

        for &command in script {
            if !self.tour.is_active() {
                tracing::debug!(target: "waypoint.demo", ?command, "tour closed; ignoring command");
                continue;
            }
            self.execute(command)?;
        }
        Ok(self.report())
    }

    pub fn report(&self) -> Report {
        Report {
            route: self.route.clone(),
            elapsed_ms: millis(self.tour.now()),
            events: self.transcript.clone(),
            view: self.tour.view(),
        }
    }

    fn execute(&mut self, command: ScriptCommand) -> Result<()> {
        tracing::debug!(target: "waypoint.demo", ?command, "script command");
        match command {
            ScriptCommand::Next => {
                let events = self.tour.next(&self.doc);
                self.apply(events);
            }
            ScriptCommand::Back => {
                let events = self.tour.back(&self.doc);
                self.apply(events);
            }
            ScriptCommand::Skip => {
                let mut events = self.tour.skip();
                // Skipping dismisses the tour, as a host's onSkip handler would.
                events.extend(self.tour.close());
                self.apply(events);
            }
            ScriptCommand::Close => {
                let events = self.tour.close();
                self.apply(events);
            }
            ScriptCommand::Wait(duration) => {
                self.run_for(duration);
                return Ok(());
            }
            ScriptCommand::Scroll { x, y } => {
                self.doc.scroll_to(x, y);
                self.tour.on_viewport_change(&self.doc);
            }
            ScriptCommand::Resize { width, height } => {
                self.doc.resize(width, height);
                self.tour.on_viewport_change(&self.doc);
            }
        }
        self.settle()
    }

    /// Tick frames until no timers remain.
    fn settle(&mut self) -> Result<()> {
        let mut waited = Duration::ZERO;
        while self.tour.has_pending_timers() {
            if waited >= self.settle_budget {
                return Err(DemoError::Unsettled {
                    waited_ms: millis(waited),
                });
            }
            self.frame();
            waited += FRAME;
        }
        Ok(())
    }

    fn run_for(&mut self, duration: Duration) {
        let mut waited = Duration::ZERO;
        while waited < duration {
            self.frame();
            waited += FRAME;
        }
    }

    fn frame(&mut self) {
        self.doc.tick(FRAME);
        let events = self.tour.advance(FRAME, &self.doc);
        self.apply(events);
    }

    fn apply(&mut self, events: Vec<TourEvent>) {
        let at_ms = millis(self.tour.now());
        for event in events {
            match &event {
                TourEvent::Navigate { path } => self.navigate(path),
                TourEvent::ScrollIntoView { region } => self.scroll_into_view(*region),
                _ => {}
            }
            self.transcript.push(TranscriptEntry { at_ms, event });
        }
    }

    fn navigate(&mut self, path: &str) {
        if !self.layout.pages.contains_key(path) {
            tracing::warn!(target: "waypoint.demo", path, "navigating to a route with no page");
        }
        self.doc = self.layout.document(path, self.doc.viewport());
        self.route = path.to_string();
    }

    /// Center `region` vertically, the way a smooth scroll would end up.
    fn scroll_into_view(&mut self, region: Rect) {
        let vp = self.doc.viewport();
        let y = (region.center().y - vp.height / 2.0).max(0.0);
        if y != vp.scroll_y {
            self.doc.scroll_to(vp.scroll_x, y);
            self.tour.on_viewport_change(&self.doc);
        }
    }
}

/// Longest one settle may take: every step retrying to exhaustion after its
/// navigation, plus a frame of slack each.
fn settle_budget(config: &TourConfig, step_count: usize) -> Duration {
    let per_step = config
        .retry
        .total_max_delay()
        .saturating_add(config.navigation_settle())
        .saturating_add(FRAME);
    let rounds = u32::try_from(step_count)
        .unwrap_or(u32::MAX)
        .saturating_add(1);
    per_step.saturating_mul(rounds)
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
