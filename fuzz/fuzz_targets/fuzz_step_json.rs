#![no_main]

use libfuzzer_sys::fuzz_target;
use waypoint_core::{StaticDocument, Viewport};
use waypoint_tour::{Step, Tour};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if text.len() > 4096 {
        return;
    }

    // Parsing must never panic.
    let Ok(steps) = Step::list_from_json_str(text) else {
        return;
    };

    // Whatever parsed must serialize again.
    let _ = serde_json::to_string(&steps).expect("steps serialize");

    // Opening a tour over an empty page must not panic, and malformed steps
    // must not leave timers behind.
    let all_malformed = steps.iter().all(Step::is_malformed);
    let doc = StaticDocument::new(Viewport::new(1280.0, 720.0));
    let mut tour = Tour::new(steps);
    tour.set_open(true, &doc);
    if all_malformed {
        assert!(!tour.is_active(), "all-malformed tour should complete on open");
        assert!(!tour.has_pending_timers());
    }
});
