#![forbid(unsafe_code)]

//! Guided tour orchestration.
//!
//! [`Tour`] owns the step list, the current index, and every timer tied to a
//! step. It never touches the page: each operation returns the
//! [`TourEvent`]s the host must act on (navigate, scroll, attach listeners)
//! in the order they happened, and [`Tour::view`] exposes what to draw.
//!
//! Time only moves when the host calls [`Tour::advance`]. Retry ticks and
//! navigation settles fire there, in due order, against the document the
//! host passes in.

use std::time::Duration;

use serde::Serialize;
use waypoint_core::{HostDocument, Rect};

use crate::config::TourConfig;
use crate::placement::{PlacementEngine, PlacementResult};
use crate::resolver::{self, BoundingRegion};
use crate::retry::{RetryController, RetryOutcome, RetryState};
use crate::scheduler::{DueTimer, Scheduler, TimerId, TimerKind};
use crate::step::{Step, sort_steps};

/// Signals for the host, in emission order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TourEvent {
    /// Install (or remove) scroll and resize listeners.
    ViewportListeners { attached: bool },
    /// Change the displayed route.
    Navigate { path: String },
    /// A new step became current.
    StepChanged {
        index: usize,
        step: u32,
        path: Option<String>,
    },
    /// Smoothly scroll this document rectangle to the center of the viewport.
    ScrollIntoView { region: Rect },
    Skipped,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TourPhase {
    #[default]
    Closed,
    Active { index: usize },
}

/// Which way a navigation transition moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingTransition {
    timer: TimerId,
    to: usize,
}

/// Everything the overlay layer needs to draw the current step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TourView {
    pub step_index: usize,
    pub step_count: usize,
    /// Order key of the current step.
    pub step: u32,
    pub title: Option<String>,
    pub content: Option<String>,
    /// Advance button text: custom label, else "Finish" on the last step, else "Next".
    pub next_label: String,
    pub show_back: bool,
    pub is_last: bool,
    /// Union highlight in document coordinates.
    pub region: Rect,
    /// One highlight per resolved element, document coordinates.
    pub highlights: Vec<Rect>,
    pub placement: PlacementResult,
    /// Whether highlight overlays swallow clicks on the target.
    pub click_blocking: bool,
}

/// Step sequencer for one guided tour.
#[derive(Debug)]
pub struct Tour {
    steps: Vec<Step>,
    config: TourConfig,
    engine: PlacementEngine,
    retry: RetryController,
    scheduler: Scheduler,
    phase: TourPhase,
    visible: bool,
    click_disabled: bool,
    region: Option<BoundingRegion>,
    placement: Option<PlacementResult>,
    retry_timer: Option<TimerId>,
    pending: Option<PendingTransition>,
}

impl Tour {
    /// Create a closed tour with default configuration.
    pub fn new(steps: Vec<Step>) -> Self {
        Self::with_config(steps, TourConfig::default())
    }

    /// Create a closed tour. Steps are sorted by order key.
    pub fn with_config(mut steps: Vec<Step>, config: TourConfig) -> Self {
        sort_steps(&mut steps);
        Self {
            steps,
            engine: PlacementEngine::new(config.placement),
            retry: RetryController::new(config.retry),
            config,
            scheduler: Scheduler::new(),
            phase: TourPhase::Closed,
            visible: false,
            click_disabled: false,
            region: None,
            placement: None,
            retry_timer: None,
            pending: None,
        }
    }

    // ── Accessors ──────────────────────────────────────────────────

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn config(&self) -> &TourConfig {
        &self.config
    }

    pub fn phase(&self) -> TourPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        matches!(self.phase, TourPhase::Active { .. })
    }

    /// Index of the current step while active.
    pub fn step_index(&self) -> Option<usize> {
        match self.phase {
            TourPhase::Active { index } => Some(index),
            TourPhase::Closed => None,
        }
    }

    pub fn current_step(&self) -> Option<&Step> {
        self.steps.get(self.step_index()?)
    }

    /// Whether the current step's targets have been found.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn region(&self) -> Option<&BoundingRegion> {
        self.region.as_ref()
    }

    pub fn placement(&self) -> Option<&PlacementResult> {
        self.placement.as_ref()
    }

    pub fn retry_state(&self) -> RetryState {
        self.retry.state()
    }

    /// Whether a navigation is waiting to settle.
    pub fn is_transition_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn has_pending_timers(&self) -> bool {
        self.scheduler.has_pending()
    }

    /// Tour clock time.
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    pub fn is_click_disabled(&self) -> bool {
        self.click_disabled
    }

    // ── Host inputs ────────────────────────────────────────────────

    /// Open or close the tour. No-op when already in the requested state.
    pub fn set_open<D: HostDocument + ?Sized>(
        &mut self,
        open: bool,
        document: &D,
    ) -> Vec<TourEvent> {
        let mut events = Vec::new();
        match (open, self.is_active()) {
            (true, false) => self.open(document, &mut events),
            (false, true) => self.deactivate(&mut events),
            _ => {}
        }
        events
    }

    /// Close the tour, discarding timers and geometry.
    pub fn close(&mut self) -> Vec<TourEvent> {
        let mut events = Vec::new();
        if self.is_active() {
            self.deactivate(&mut events);
        }
        events
    }

    pub fn set_click_disabled(&mut self, disabled: bool) {
        self.click_disabled = disabled;
    }

    /// Replace the step list. An active tour re-resolves its clamped index.
    pub fn set_steps<D: HostDocument + ?Sized>(
        &mut self,
        mut steps: Vec<Step>,
        document: &D,
    ) -> Vec<TourEvent> {
        sort_steps(&mut steps);
        self.steps = steps;
        let mut events = Vec::new();
        let TourPhase::Active { index } = self.phase else {
            return events;
        };
        self.cancel_step_timers();
        if self.steps.is_empty() {
            tracing::warn!(target: "waypoint.tour", "step list emptied while active");
            self.complete(&mut events);
            return events;
        }
        let index = index.min(self.steps.len() - 1);
        self.phase = TourPhase::Active { index };
        self.retry.reset();
        self.resolve_with_retry(document, &mut events);
        events
    }

    /// User pressed Next.
    pub fn next<D: HostDocument + ?Sized>(&mut self, document: &D) -> Vec<TourEvent> {
        let mut events = Vec::new();
        let TourPhase::Active { index } = self.phase else {
            return events;
        };
        if self.pending.is_some() {
            tracing::debug!(
                target: "waypoint.tour",
                index,
                "next ignored while navigation settles"
            );
            return events;
        }
        if let Some(action) = self.steps.get(index).and_then(|s| s.on_next.clone()) {
            action.invoke();
        }
        self.step_forward(document, &mut events);
        events
    }

    /// User pressed Back. Ignored on the first step.
    pub fn back<D: HostDocument + ?Sized>(&mut self, document: &D) -> Vec<TourEvent> {
        let mut events = Vec::new();
        let TourPhase::Active { index } = self.phase else {
            return events;
        };
        if index == 0 {
            return events;
        }
        if self.pending.is_some() {
            tracing::debug!(
                target: "waypoint.tour",
                index,
                "back ignored while navigation settles"
            );
            return events;
        }
        let to = index - 1;
        match self.backward_route(index) {
            Some(path) => self.begin_navigation(path, to, Direction::Backward, &mut events),
            None => self.enter(to, document, &mut events),
        }
        events
    }

    /// User dismissed the tour. The index is left alone; hosts close the
    /// tour in response.
    pub fn skip(&mut self) -> Vec<TourEvent> {
        if !self.is_active() {
            return Vec::new();
        }
        tracing::info!(target: "waypoint.tour", index = ?self.step_index(), "tour skipped");
        vec![TourEvent::Skipped]
    }

    /// Scroll or resize happened. Re-resolves without retrying.
    pub fn on_viewport_change<D: HostDocument + ?Sized>(&mut self, document: &D) {
        if !self.visible {
            return;
        }
        let Some(step) = self.current_step() else {
            return;
        };
        let Some(region) = resolver::resolve(step.descriptors(), document) else {
            tracing::trace!(target: "waypoint.tour", "passive resolve missed; keeping geometry");
            return;
        };
        let position = step.position;
        self.placement = self.engine.place(Some(&region), &document.viewport(), position);
        self.region = Some(region);
    }

    /// Move time forward by `dt`, firing due timers in order.
    pub fn advance<D: HostDocument + ?Sized>(
        &mut self,
        dt: Duration,
        document: &D,
    ) -> Vec<TourEvent> {
        let until = self.scheduler.now().saturating_add(dt);
        let mut events = Vec::new();
        while let Some(due) = self.scheduler.pop_due(until) {
            self.fire(due, document, &mut events);
        }
        self.scheduler.advance_to(until);
        events
    }

    /// Render model for the current step, or `None` while closed or hidden.
    pub fn view(&self) -> Option<TourView> {
        let TourPhase::Active { index } = self.phase else {
            return None;
        };
        if !self.visible {
            return None;
        }
        let step = self.steps.get(index)?;
        let region = self.region.as_ref()?;
        let placement = self.placement?;
        let is_last = index + 1 == self.steps.len();
        let next_label = match &step.next_label {
            Some(label) => label.clone(),
            None if is_last => "Finish".to_string(),
            None => "Next".to_string(),
        };
        Some(TourView {
            step_index: index,
            step_count: self.steps.len(),
            step: step.step,
            title: step.title.clone(),
            content: step.content.clone(),
            next_label,
            show_back: index > 0,
            is_last,
            region: region.document_rect(),
            highlights: region.document_rects(),
            placement,
            click_blocking: self.click_disabled,
        })
    }

    // ── Transitions ────────────────────────────────────────────────

    fn open<D: HostDocument + ?Sized>(&mut self, document: &D, events: &mut Vec<TourEvent>) {
        self.reset_state();
        self.phase = TourPhase::Active { index: 0 };
        tracing::info!(target: "waypoint.tour", steps = self.steps.len(), "tour opened");
        events.push(TourEvent::ViewportListeners { attached: true });

        let Some(first) = self.steps.first() else {
            tracing::warn!(target: "waypoint.tour", "opened with no steps");
            self.complete(events);
            return;
        };
        match first.path.clone() {
            Some(path) => {
                // Step 0 is first looked up once the route change has settled.
                events.push(TourEvent::Navigate { path });
                let id = self.scheduler.schedule(
                    self.config.navigation_settle(),
                    TimerKind::RetryResolve { step_index: 0 },
                );
                self.retry_timer = Some(id);
            }
            None => self.resolve_with_retry(document, events),
        }
    }

    fn deactivate(&mut self, events: &mut Vec<TourEvent>) {
        self.scheduler.cancel_all();
        self.reset_state();
        self.phase = TourPhase::Closed;
        tracing::info!(target: "waypoint.tour", "tour closed");
        events.push(TourEvent::ViewportListeners { attached: false });
    }

    fn complete(&mut self, events: &mut Vec<TourEvent>) {
        tracing::info!(target: "waypoint.tour", "tour completed");
        events.push(TourEvent::Completed);
        self.deactivate(events);
    }

    fn reset_state(&mut self) {
        self.retry.reset();
        self.retry_timer = None;
        self.pending = None;
        self.clear_geometry();
    }

    fn clear_geometry(&mut self) {
        self.visible = false;
        self.region = None;
        self.placement = None;
    }

    fn cancel_step_timers(&mut self) {
        if let Some(id) = self.retry_timer.take() {
            self.scheduler.cancel(id);
        }
        if let Some(pending) = self.pending.take() {
            self.scheduler.cancel(pending.timer);
        }
    }

    /// Advance past the current step without running its action.
    fn step_forward<D: HostDocument + ?Sized>(
        &mut self,
        document: &D,
        events: &mut Vec<TourEvent>,
    ) {
        if let Some(to) = self.forward_target(events) {
            self.enter(to, document, events);
        }
    }

    /// Complete on the last step, start a navigation, or return the step to
    /// enter right away.
    fn forward_target(&mut self, events: &mut Vec<TourEvent>) -> Option<usize> {
        let TourPhase::Active { index } = self.phase else {
            return None;
        };
        if index + 1 >= self.steps.len() {
            self.complete(events);
            return None;
        }
        let to = index + 1;
        match self.forward_route(index) {
            Some(path) => {
                self.begin_navigation(path, to, Direction::Forward, events);
                None
            }
            None => Some(to),
        }
    }

    /// Route required to move from `index` to the next step, if any.
    fn forward_route(&self, index: usize) -> Option<String> {
        let current = self.steps.get(index)?;
        if let Some(path) = &current.next_path {
            return Some(path.clone());
        }
        let next = self.steps.get(index + 1)?;
        match &next.path {
            Some(path) if current.path.as_ref() != Some(path) => Some(path.clone()),
            _ => None,
        }
    }

    fn backward_route(&self, index: usize) -> Option<String> {
        let current = self.steps.get(index)?;
        let prev = self.steps.get(index.checked_sub(1)?)?;
        match &prev.path {
            Some(path) if current.path.as_ref() != Some(path) => Some(path.clone()),
            _ => None,
        }
    }

    /// Emit navigation now; enter `to` once the page has had time to settle.
    fn begin_navigation(
        &mut self,
        path: String,
        to: usize,
        direction: Direction,
        events: &mut Vec<TourEvent>,
    ) {
        if let Some(id) = self.retry_timer.take() {
            self.scheduler.cancel(id);
        }
        tracing::debug!(
            target: "waypoint.tour",
            path = %path,
            to,
            direction = ?direction,
            "navigation requested"
        );
        events.push(TourEvent::Navigate { path });
        let timer = self
            .scheduler
            .schedule(self.config.navigation_settle(), TimerKind::NavigationSettle { to });
        self.pending = Some(PendingTransition { timer, to });
    }

    fn enter<D: HostDocument + ?Sized>(
        &mut self,
        to: usize,
        document: &D,
        events: &mut Vec<TourEvent>,
    ) {
        self.begin_step(to, events);
        self.resolve_with_retry(document, events);
    }

    /// Make `to` current and announce it, without resolving its targets.
    fn begin_step(&mut self, to: usize, events: &mut Vec<TourEvent>) {
        self.cancel_step_timers();
        self.retry.reset();
        self.clear_geometry();
        self.phase = TourPhase::Active { index: to };

        let Some(step) = self.steps.get(to) else {
            return;
        };
        let _span = tracing::debug_span!("step_entry", index = to, step = step.step).entered();
        tracing::debug!(target: "waypoint.tour", index = to, step = step.step, "step changed");
        events.push(TourEvent::StepChanged {
            index: to,
            step: step.step,
            path: step.path.clone(),
        });
    }

    /// Resolve the current step. Runs of exhausted steps on the same route
    /// are skipped in this loop, one step per iteration.
    fn resolve_with_retry<D: HostDocument + ?Sized>(
        &mut self,
        document: &D,
        events: &mut Vec<TourEvent>,
    ) {
        loop {
            let TourPhase::Active { index } = self.phase else {
                return;
            };
            let Some(step) = self.steps.get(index) else {
                return;
            };
            match self.retry.attempt(step, document) {
                RetryOutcome::Resolved(region) => {
                    let scroll_to = region.document_rect();
                    let viewport = document.viewport();
                    self.placement = self.engine.place(Some(&region), &viewport, step.position);
                    self.region = Some(region);
                    self.visible = true;
                    events.push(TourEvent::ScrollIntoView { region: scroll_to });
                    return;
                }
                RetryOutcome::Retry { delay, .. } => {
                    self.clear_geometry();
                    let id = self
                        .scheduler
                        .schedule(delay, TimerKind::RetryResolve { step_index: index });
                    self.retry_timer = Some(id);
                    return;
                }
                RetryOutcome::Exhausted => {
                    self.clear_geometry();
                    match self.forward_target(events) {
                        Some(to) => self.begin_step(to, events),
                        None => return,
                    }
                }
            }
        }
    }

    fn fire<D: HostDocument + ?Sized>(
        &mut self,
        due: DueTimer,
        document: &D,
        events: &mut Vec<TourEvent>,
    ) {
        match due.kind {
            TimerKind::RetryResolve { step_index } => {
                if self.retry_timer != Some(due.id) || self.step_index() != Some(step_index) {
                    tracing::trace!(
                        target: "waypoint.tour",
                        timer = due.id.get(),
                        "stale retry timer"
                    );
                    return;
                }
                self.retry_timer = None;
                self.resolve_with_retry(document, events);
            }
            TimerKind::NavigationSettle { to } => {
                match self.pending {
                    Some(pending) if pending.timer == due.id => {
                        self.pending = None;
                        self.enter(to, document, events);
                    }
                    _ => {
                        tracing::trace!(
                            target: "waypoint.tour",
                            timer = due.id.get(),
                            "stale settle timer"
                        );
                    }
                }
            }
        }
    }
}
