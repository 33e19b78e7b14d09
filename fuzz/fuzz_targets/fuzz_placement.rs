#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use waypoint_core::{Rect, Viewport};
use waypoint_tour::{PlacementConfig, PlacementEngine, PreferredPosition, Side};

#[derive(Debug, Arbitrary)]
struct Input {
    x: i16,
    y: i16,
    w: u16,
    h: u16,
    vw: u16,
    vh: u16,
    prefer: u8,
}

fuzz_target!(|input: Input| {
    let vp = Viewport::new(f64::from(input.vw.max(1)), f64::from(input.vh.max(1)));
    let target = Rect::new(
        f64::from(input.x),
        f64::from(input.y),
        f64::from(input.w),
        f64::from(input.h),
    );
    let prefer = match Side::ALL.get(usize::from(input.prefer % 9)) {
        Some(&side) => PreferredPosition::from(side),
        None => PreferredPosition::Auto,
    };

    let cfg = PlacementConfig::default();
    let engine = PlacementEngine::default();
    let result = engine.place_rect(target, &vp, prefer);

    assert!(result.tooltip.x.is_finite() && result.tooltip.y.is_finite());
    assert!(result.tooltip.x >= cfg.safety_padding);
    assert!(result.tooltip.y >= cfg.safety_padding);

    let candidates = engine.candidates(target, &vp);
    if candidates.iter().any(|c| c.fits) {
        let chosen = candidates
            .iter()
            .find(|c| c.side == result.side)
            .expect("chosen side is a candidate");
        assert!(chosen.fits, "non-fitting side chosen while another fits");
    }
});
