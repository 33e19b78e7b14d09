#![no_main]

use std::time::Duration;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use waypoint_core::{ElementSpec, Rect, StaticDocument, Viewport};
use waypoint_tour::{Step, Tour, TourEvent};

#[derive(Debug, Arbitrary)]
enum Op {
    Open,
    Close,
    Next,
    Back,
    Skip,
    Advance(u16),
    Scroll(u16),
    Remove(u8),
    Insert(u8),
}

#[derive(Debug, Arbitrary)]
struct Session {
    step_targets: Vec<(u8, Option<u8>)>,
    ops: Vec<Op>,
}

fn element(i: u8) -> ElementSpec {
    let f = f64::from(i);
    ElementSpec::new(Rect::new(f * 37.0 % 1200.0, f * 53.0, 80.0, 30.0)).id(format!("e{}", i % 8))
}

fuzz_target!(|session: Session| {
    if session.step_targets.len() > 12 || session.ops.len() > 64 {
        return;
    }
    let steps: Vec<Step> = session
        .step_targets
        .iter()
        .map(|&(order, target)| {
            let step = Step::new(u32::from(order));
            match target {
                Some(t) => step.id(format!("e{}", t % 8)),
                None => step,
            }
        })
        .collect();
    let step_count = steps.len();

    let mut doc = StaticDocument::new(Viewport::new(1280.0, 720.0));
    for i in 0..4 {
        doc.insert(element(i));
    }
    let mut tour = Tour::new(steps);

    for op in session.ops {
        let events = match op {
            Op::Open => tour.set_open(true, &doc),
            Op::Close => tour.close(),
            Op::Next => tour.next(&doc),
            Op::Back => tour.back(&doc),
            Op::Skip => tour.skip(),
            Op::Advance(ms) => {
                let dt = Duration::from_millis(u64::from(ms));
                doc.tick(dt);
                tour.advance(dt, &doc)
            }
            Op::Scroll(y) => {
                doc.scroll_to(0.0, f64::from(y));
                tour.on_viewport_change(&doc);
                Vec::new()
            }
            Op::Remove(i) => {
                doc.remove_id(&format!("e{}", i % 8));
                Vec::new()
            }
            Op::Insert(i) => {
                doc.insert(element(i));
                Vec::new()
            }
        };

        // Completion always closes.
        if events.contains(&TourEvent::Completed) {
            assert!(!tour.is_active());
        }
        if let Some(index) = tour.step_index() {
            assert!(index < step_count);
        }
        if let Some(view) = tour.view() {
            let p = view.placement;
            assert!(p.tooltip.x >= 0.0 && p.tooltip.x + p.tooltip_width <= 1280.0);
            assert!(p.tooltip.y >= 0.0 && p.tooltip.y + p.tooltip_height <= 720.0);
        }
        if !tour.is_active() {
            assert!(!tour.has_pending_timers());
            assert!(tour.view().is_none());
        }
    }
});
