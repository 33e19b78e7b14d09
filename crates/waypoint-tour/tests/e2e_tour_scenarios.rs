#![forbid(unsafe_code)]

//! End-to-end tour scenarios against an in-memory document.
//!
//! The host loop is simulated frame by frame: the document clock and the
//! tour clock advance together in 50 ms frames, and `Navigate` events swap
//! the page the way a router would.
//!
//! Run:
//!   cargo test -p waypoint-tour --test e2e_tour_scenarios

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use waypoint_core::{ElementSpec, Rect, StaticDocument, Viewport, ViewportQuery};
use waypoint_tour::{
    PlacementEngine, PreferredPosition, RetryPolicy, RetryState, Side, Step, TargetDescriptor,
    Tour, TourConfig, TourEvent, resolve,
};

const FRAME: Duration = Duration::from_millis(50);

// ── Host simulation ─────────────────────────────────────────────────

struct Host {
    pages: HashMap<String, Vec<ElementSpec>>,
    doc: StaticDocument,
    route: String,
    log: Vec<(u128, TourEvent)>,
}

impl Host {
    fn new(viewport: Viewport) -> Self {
        Self {
            pages: HashMap::new(),
            doc: StaticDocument::new(viewport),
            route: "/".to_string(),
            log: Vec::new(),
        }
    }

    fn page(mut self, path: &str, elements: Vec<ElementSpec>) -> Self {
        if path == self.route {
            self.doc = StaticDocument::with_elements(self.doc.viewport(), elements.clone());
        }
        self.pages.insert(path.to_string(), elements);
        self
    }

    fn record(&mut self, now: Duration, events: Vec<TourEvent>) {
        for event in events {
            if let TourEvent::Navigate { path } = &event {
                self.navigate(path.clone());
            }
            self.log.push((now.as_millis(), event));
        }
    }

    fn navigate(&mut self, path: String) {
        let elements = self.pages.get(&path).cloned().unwrap_or_default();
        let mut doc = StaticDocument::with_elements(self.doc.viewport(), elements);
        // Page-relative mount delays count from the moment the route changed.
        doc.set_elapsed(Duration::ZERO);
        self.doc = doc;
        self.route = path;
    }

    fn open(&mut self, tour: &mut Tour) {
        let events = tour.set_open(true, &self.doc);
        self.record(tour.now(), events);
    }

    fn next(&mut self, tour: &mut Tour) {
        let events = tour.next(&self.doc);
        self.record(tour.now(), events);
    }

    fn back(&mut self, tour: &mut Tour) {
        let events = tour.back(&self.doc);
        self.record(tour.now(), events);
    }

    fn run(&mut self, tour: &mut Tour, ms: u64) {
        for _ in 0..ms / 50 {
            self.doc.tick(FRAME);
            let events = tour.advance(FRAME, &self.doc);
            self.record(tour.now(), events);
        }
    }

    fn events(&self) -> Vec<TourEvent> {
        self.log.iter().map(|(_, e)| e.clone()).collect()
    }

    fn clear(&mut self) {
        self.log.clear();
    }
}

fn el(id: &str, x: f64, y: f64, w: f64, h: f64) -> ElementSpec {
    ElementSpec::new(Rect::new(x, y, w, h)).id(id)
}

fn full_hd() -> Viewport {
    Viewport::new(1920.0, 1080.0)
}

// ── Scenarios ───────────────────────────────────────────────────────

#[test]
fn scenario_a_ample_space_below() {
    let mut host = Host::new(full_hd()).page("/", vec![el("save", 100.0, 100.0, 100.0, 40.0)]);
    let mut tour = Tour::new(vec![Step::new(1).id("save")]);
    host.open(&mut tour);

    let view = tour.view().expect("step visible");
    assert_eq!(view.placement.side, Side::Bottom);
    assert_eq!(view.placement.tooltip.y, 170.0);
    assert_eq!(view.placement.tooltip.x, 20.0);
}

#[test]
fn scenario_b_preferred_top_without_room_falls_back() {
    let vp = Viewport::new(1200.0, 600.0);
    let mut host = Host::new(vp).page("/", vec![el("hero", 100.0, 50.0, 200.0, 300.0)]);
    let mut tour = Tour::new(vec![Step::new(1).id("hero").position(PreferredPosition::Top)]);
    host.open(&mut tour);

    let placement = tour.view().unwrap().placement;
    assert_ne!(placement.side, Side::Top);
    assert_eq!(placement.side, Side::Right);
}

#[test]
fn scenario_c_missing_second_target() {
    let mut host = Host::new(full_hd()).page("/", vec![el("a", 10.0, 10.0, 20.0, 20.0)]);
    let mut tour = Tour::new(vec![
        Step::new(1)
            .target(TargetDescriptor::by_id("a"))
            .target(TargetDescriptor::by_id("missing")),
    ]);
    host.open(&mut tour);

    let view = tour.view().unwrap();
    assert_eq!(view.highlights.len(), 1);
    assert_eq!(view.region, Rect::new(10.0, 10.0, 20.0, 20.0));
}

#[test]
fn scenario_d_late_target_resolves_on_fourth_attempt() {
    let mut host = Host::new(full_hd()).page(
        "/",
        vec![el("late", 300.0, 300.0, 50.0, 50.0).appears_after(Duration::from_millis(600))],
    );
    let mut tour = Tour::new(vec![Step::new(1).id("late"), Step::new(2).id("late")]);
    host.open(&mut tour);
    assert!(!tour.is_visible());

    host.run(&mut tour, 550);
    assert!(!tour.is_visible());
    assert_eq!(tour.retry_state(), RetryState::Retrying { attempt: 3 });

    host.run(&mut tour, 50);
    assert!(tour.is_visible());
    assert_eq!(tour.step_index(), Some(0));
    let scrolls: Vec<_> = host
        .log
        .iter()
        .filter(|(_, e)| matches!(e, TourEvent::ScrollIntoView { .. }))
        .map(|(t, _)| *t)
        .collect();
    assert_eq!(scrolls, [600]);
}

#[test]
fn scenario_e_missing_target_skips_after_budget() {
    let mut host = Host::new(full_hd()).page("/", vec![el("b", 10.0, 10.0, 10.0, 10.0)]);
    let mut tour = Tour::new(vec![Step::new(1).id("ghost"), Step::new(2).id("b")]);
    host.open(&mut tour);

    host.run(&mut tour, 2_950);
    assert_eq!(tour.step_index(), Some(0));
    assert_eq!(tour.retry_state(), RetryState::Retrying { attempt: 15 });

    host.run(&mut tour, 50);
    assert_eq!(tour.step_index(), Some(1));
    assert!(tour.is_visible());
    let (t, event) = host
        .log
        .iter()
        .find(|(_, e)| matches!(e, TourEvent::StepChanged { .. }))
        .cloned()
        .unwrap();
    assert_eq!(t, 3_000);
    assert_eq!(
        event,
        TourEvent::StepChanged {
            index: 1,
            step: 2,
            path: None
        }
    );
}

#[test]
fn scenario_e_on_last_step_completes() {
    let mut host = Host::new(full_hd());
    let mut tour = Tour::new(vec![Step::new(1).id("ghost")]);
    host.open(&mut tour);
    host.run(&mut tour, 3_000);
    assert_eq!(
        host.events(),
        vec![
            TourEvent::ViewportListeners { attached: true },
            TourEvent::Completed,
            TourEvent::ViewportListeners { attached: false },
        ]
    );
    assert!(!tour.is_active());
}

#[test]
fn exhaustion_does_not_run_step_action() {
    let hits = Rc::new(Cell::new(0));
    let counter = Rc::clone(&hits);
    let mut host = Host::new(full_hd()).page("/", vec![el("b", 10.0, 10.0, 10.0, 10.0)]);
    let mut tour = Tour::new(vec![
        Step::new(1).id("ghost").on_next(move || counter.set(counter.get() + 1)),
        Step::new(2).id("b"),
    ]);
    host.open(&mut tour);
    host.run(&mut tour, 3_000);
    assert_eq!(tour.step_index(), Some(1));
    assert_eq!(hits.get(), 0);
}

#[test]
fn long_run_of_malformed_steps_completes() {
    let mut host = Host::new(full_hd());
    let mut tour = Tour::new((1..=20_000).map(Step::new).collect());
    host.open(&mut tour);

    let events = host.events();
    let changes = events
        .iter()
        .filter(|e| matches!(e, TourEvent::StepChanged { .. }))
        .count();
    assert_eq!(changes, 19_999);
    assert_eq!(
        &events[events.len() - 2..],
        [
            TourEvent::Completed,
            TourEvent::ViewportListeners { attached: false },
        ]
    );
    assert!(!tour.is_active());
    assert!(!tour.has_pending_timers());
}

#[test]
fn long_run_without_retries_lands_on_first_resolvable_step() {
    let mut host = Host::new(full_hd()).page("/", vec![el("b", 10.0, 10.0, 10.0, 10.0)]);
    let mut steps: Vec<Step> = (1..=20_000).map(|n| Step::new(n).id("ghost")).collect();
    steps.push(Step::new(20_001).id("b"));
    let config = TourConfig {
        retry: RetryPolicy::no_retry(),
        ..TourConfig::default()
    };
    let mut tour = Tour::with_config(steps, config);
    host.open(&mut tour);

    assert_eq!(tour.step_index(), Some(20_000));
    assert!(tour.is_visible());
    assert!(!tour.has_pending_timers());
}

// ── Navigation ──────────────────────────────────────────────────────

fn two_page_host() -> Host {
    Host::new(full_hd())
        .page("/", vec![el("home", 100.0, 100.0, 100.0, 40.0)])
        .page("/settings", vec![el("toggle", 400.0, 300.0, 60.0, 30.0)])
}

fn two_page_steps() -> Vec<Step> {
    vec![
        Step::new(1).id("home").path("/"),
        Step::new(2).id("toggle").path("/settings"),
    ]
}

#[test]
fn navigate_precedes_step_change_by_settle_delay() {
    let mut host = two_page_host();
    let mut tour = Tour::new(two_page_steps());
    host.open(&mut tour);
    host.run(&mut tour, 50);
    host.clear();

    host.next(&mut tour);
    assert!(tour.is_transition_pending());
    // Stale geometry stays mounted until the settle fires.
    assert_eq!(tour.step_index(), Some(0));
    assert!(tour.view().is_some());

    host.run(&mut tour, 50);
    assert_eq!(
        host.log,
        vec![
            (
                50,
                TourEvent::Navigate {
                    path: "/settings".into()
                }
            ),
            (
                100,
                TourEvent::StepChanged {
                    index: 1,
                    step: 2,
                    path: Some("/settings".into())
                }
            ),
            (
                100,
                TourEvent::ScrollIntoView {
                    region: Rect::new(400.0, 300.0, 60.0, 30.0)
                }
            ),
        ]
    );
    assert_eq!(host.route, "/settings");
}

#[test]
fn open_resolves_first_step_after_initial_navigation_settles() {
    // The page the host starts on carries an element with the same id.
    let mut host = two_page_host().page("/", vec![el("toggle", 10.0, 10.0, 60.0, 30.0)]);
    let mut tour = Tour::new(vec![Step::new(1).id("toggle").path("/settings")]);
    host.open(&mut tour);
    assert_eq!(
        host.log,
        vec![
            (0, TourEvent::ViewportListeners { attached: true }),
            (
                0,
                TourEvent::Navigate {
                    path: "/settings".into()
                }
            ),
        ]
    );
    assert!(tour.view().is_none());

    host.run(&mut tour, 50);
    assert_eq!(
        host.log.last(),
        Some(&(
            50,
            TourEvent::ScrollIntoView {
                region: Rect::new(400.0, 300.0, 60.0, 30.0)
            }
        ))
    );
    assert_eq!(tour.step_index(), Some(0));
}

#[test]
fn reopening_navigates_to_first_step_again() {
    let mut host = two_page_host();
    let mut tour = Tour::new(two_page_steps());
    host.open(&mut tour);
    host.run(&mut tour, 50);
    host.next(&mut tour);
    host.run(&mut tour, 50);
    assert_eq!(host.route, "/settings");

    let events = tour.set_open(false, &host.doc);
    host.record(tour.now(), events);
    host.clear();
    host.open(&mut tour);
    assert_eq!(
        host.events(),
        vec![
            TourEvent::ViewportListeners { attached: true },
            TourEvent::Navigate { path: "/".into() },
        ]
    );
    assert_eq!(host.route, "/");

    host.run(&mut tour, 50);
    assert_eq!(tour.step_index(), Some(0));
    assert_eq!(
        tour.view().map(|v| v.region),
        Some(Rect::new(100.0, 100.0, 100.0, 40.0))
    );
}

#[test]
fn next_path_overrides_route() {
    let mut host = two_page_host().page("/billing", vec![el("plan", 10.0, 10.0, 10.0, 10.0)]);
    let mut tour = Tour::new(vec![
        Step::new(1).id("home").path("/").next_path("/billing"),
        Step::new(2).id("plan"),
    ]);
    host.open(&mut tour);
    host.run(&mut tour, 50);
    host.clear();
    host.next(&mut tour);
    assert_eq!(
        host.events(),
        vec![TourEvent::Navigate {
            path: "/billing".into()
        }]
    );
    host.run(&mut tour, 50);
    assert!(tour.is_visible());
}

#[test]
fn same_path_advances_without_navigation() {
    let mut host = Host::new(full_hd()).page(
        "/",
        vec![el("a", 10.0, 10.0, 10.0, 10.0), el("b", 50.0, 50.0, 10.0, 10.0)],
    );
    let mut tour = Tour::new(vec![Step::new(1).id("a").path("/"), Step::new(2).id("b").path("/")]);
    host.open(&mut tour);
    host.clear();
    host.next(&mut tour);
    assert!(matches!(host.events()[0], TourEvent::StepChanged { index: 1, .. }));
    assert!(!tour.is_transition_pending());
}

#[test]
fn next_then_back_round_trip() {
    let mut host = two_page_host();
    let mut tour = Tour::new(two_page_steps());
    host.open(&mut tour);
    host.run(&mut tour, 50);
    let before = tour.region().cloned();
    assert!(before.is_some());
    let before_index = tour.step_index();

    host.next(&mut tour);
    host.run(&mut tour, 50);
    assert_eq!(tour.step_index(), Some(1));

    host.back(&mut tour);
    host.run(&mut tour, 50);
    assert_eq!(tour.step_index(), before_index);
    assert_eq!(host.route, "/");
    assert_eq!(tour.region().cloned(), before);

    let navigations: Vec<_> = host
        .events()
        .into_iter()
        .filter_map(|e| match e {
            TourEvent::Navigate { path } => Some(path),
            _ => None,
        })
        .collect();
    assert_eq!(navigations, ["/", "/settings", "/"]);
}

#[test]
fn requests_during_settle_are_ignored() {
    let mut host = two_page_host();
    let mut tour = Tour::new(vec![
        Step::new(1).id("home").path("/"),
        Step::new(2).id("toggle").path("/settings"),
        Step::new(3).id("toggle").path("/settings"),
    ]);
    host.open(&mut tour);
    host.run(&mut tour, 50);
    host.clear();
    host.next(&mut tour);
    host.next(&mut tour);
    host.back(&mut tour);
    assert_eq!(host.events().len(), 1);

    let skip = tour.skip();
    assert_eq!(skip, vec![TourEvent::Skipped]);

    host.run(&mut tour, 50);
    assert_eq!(tour.step_index(), Some(1));
}

// ── Cancellation ────────────────────────────────────────────────────

#[test]
fn close_cancels_pending_retries() {
    let mut host = Host::new(full_hd());
    let mut tour = Tour::new(vec![Step::new(1).id("ghost")]);
    host.open(&mut tour);
    assert!(tour.has_pending_timers());

    let events = tour.close();
    host.record(tour.now(), events);
    assert!(!tour.has_pending_timers());
    host.clear();
    host.run(&mut tour, 5_000);
    assert!(host.events().is_empty());
}

#[test]
fn close_cancels_pending_settle() {
    let mut host = two_page_host();
    let mut tour = Tour::new(two_page_steps());
    host.open(&mut tour);
    host.next(&mut tour);
    let events = tour.set_open(false, &host.doc);
    host.record(tour.now(), events);
    host.clear();
    host.run(&mut tour, 200);
    assert!(host.events().is_empty());
    assert_eq!(tour.step_index(), None);
}

#[test]
fn step_change_cancels_retry_of_previous_step() {
    let mut host = Host::new(full_hd()).page("/", vec![el("b", 10.0, 10.0, 10.0, 10.0)]);
    let mut tour = Tour::new(vec![Step::new(1).id("ghost"), Step::new(2).id("b")]);
    host.open(&mut tour);
    host.run(&mut tour, 400);
    host.next(&mut tour);
    assert_eq!(tour.step_index(), Some(1));
    assert!(!tour.has_pending_timers());
    host.clear();
    host.run(&mut tour, 3_000);
    assert!(host.events().is_empty());
    assert_eq!(tour.step_index(), Some(1));
}

// ── Viewport tracking ──────────────────────────────────────────────

#[test]
fn scroll_updates_viewport_geometry_but_not_document_region() {
    let mut host = Host::new(full_hd()).page("/", vec![el("a", 100.0, 900.0, 100.0, 40.0)]);
    let mut tour = Tour::new(vec![Step::new(1).id("a")]);
    host.open(&mut tour);
    let doc_region = tour.view().unwrap().region;

    host.doc.scroll_to(0.0, 600.0);
    tour.on_viewport_change(&host.doc);
    let view = tour.view().unwrap();
    assert_eq!(view.region, doc_region);
    assert_eq!(tour.region().unwrap().viewport.y, 300.0);
    assert_eq!(tour.step_index(), Some(0));
}

#[test]
fn resize_replaces_placement() {
    let mut host = Host::new(full_hd()).page("/", vec![el("a", 800.0, 500.0, 100.0, 40.0)]);
    let mut tour = Tour::new(vec![Step::new(1).id("a")]);
    host.open(&mut tour);
    assert_eq!(tour.placement().unwrap().side, Side::Top);

    host.doc.resize(1920.0, 300.0);
    tour.on_viewport_change(&host.doc);
    let expected = PlacementEngine::default().place(
        resolve(&[TargetDescriptor::by_id("a")], &host.doc).as_ref(),
        &Viewport::new(1920.0, 300.0),
        PreferredPosition::Auto,
    );
    assert_eq!(tour.placement().copied(), expected);
}

#[test]
fn class_target_matches_first_element() {
    let mut host = Host::new(full_hd()).page(
        "/",
        vec![
            ElementSpec::new(Rect::new(10.0, 10.0, 10.0, 10.0)).class("card"),
            ElementSpec::new(Rect::new(90.0, 90.0, 10.0, 10.0)).class("card"),
        ],
    );
    let mut tour = Tour::new(vec![Step::new(1).class("card")]);
    host.open(&mut tour);
    assert_eq!(tour.view().unwrap().region, Rect::new(10.0, 10.0, 10.0, 10.0));
}
