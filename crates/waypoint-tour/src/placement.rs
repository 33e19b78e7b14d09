// SPDX-License-Identifier: Apache-2.0
//! Tooltip placement around a highlighted region.
//!
//! [`PlacementEngine`] turns a [`BoundingRegion`] and the current viewport
//! into a tooltip anchor, an arrow, and the side it chose among eight
//! candidates.
//!
//! # Selection
//!
//! 1. A concrete preferred side is used verbatim when it fits.
//! 2. Otherwise the first fitting side in [`Side::PRIORITY`] wins.
//! 3. If nothing fits, the highest adjusted score wins (ties go to the
//!    earlier side in [`Side::ALL`]).
//!
//! Whatever side is chosen, the tooltip's top-left corner is clamped into
//! the viewport's safe area.
//!
//! # Example
//!
//! ```
//! use waypoint_core::{Rect, StaticDocument, ElementSpec, Viewport};
//! use waypoint_tour::placement::{PlacementEngine, Side};
//! use waypoint_tour::resolver::resolve;
//! use waypoint_tour::step::{PreferredPosition, TargetDescriptor};
//!
//! let vp = Viewport::new(1920.0, 1080.0);
//! let doc = StaticDocument::new(vp)
//!     .element(ElementSpec::new(Rect::new(100.0, 100.0, 100.0, 40.0)).id("save"));
//! let region = resolve(&[TargetDescriptor::by_id("save")], &doc);
//!
//! let placed = PlacementEngine::default()
//!     .place(region.as_ref(), &vp, PreferredPosition::Auto)
//!     .unwrap();
//! assert_eq!(placed.side, Side::Bottom);
//! assert_eq!(placed.tooltip.y, 170.0);
//! ```

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use waypoint_core::{Insets, Point, Rect, Viewport};

use crate::resolver::BoundingRegion;
use crate::step::PreferredPosition;

/// Bonus added to fitting candidates when ranking by score.
const FIT_BONUS: f64 = 1000.0;

/// One of the eight compass placements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// The target edge a side attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Top,
    Bottom,
    Left,
    Right,
}

impl Side {
    /// Candidate iteration order; breaks score ties.
    pub const ALL: [Side; 8] = [
        Side::Top,
        Side::Bottom,
        Side::Left,
        Side::Right,
        Side::TopLeft,
        Side::TopRight,
        Side::BottomLeft,
        Side::BottomRight,
    ];

    /// Scan order when looking for the first fitting side.
    pub const PRIORITY: [Side; 8] = [
        Side::Top,
        Side::Bottom,
        Side::TopLeft,
        Side::TopRight,
        Side::BottomLeft,
        Side::BottomRight,
        Side::Right,
        Side::Left,
    ];

    /// Edge of the target this side hangs off.
    pub const fn edge(self) -> Edge {
        match self {
            Side::Top | Side::TopLeft | Side::TopRight => Edge::Top,
            Side::Bottom | Side::BottomLeft | Side::BottomRight => Edge::Bottom,
            Side::Left => Edge::Left,
            Side::Right => Edge::Right,
        }
    }

    /// Whether this is one of the four corner variants.
    pub const fn is_corner(self) -> bool {
        matches!(
            self,
            Side::TopLeft | Side::TopRight | Side::BottomLeft | Side::BottomRight
        )
    }

    /// Score multiplier. Vertical placements are preferred over horizontal.
    pub const fn weight(self) -> f64 {
        match self {
            Side::Top | Side::Bottom => 1.2,
            Side::Left | Side::Right => 1.0,
            _ => 1.1,
        }
    }

    /// Stable lowercase name (`top-left`, ...).
    pub const fn as_str(self) -> &'static str {
        match self {
            Side::Top => "top",
            Side::Bottom => "bottom",
            Side::Left => "left",
            Side::Right => "right",
            Side::TopLeft => "top-left",
            Side::TopRight => "top-right",
            Side::BottomLeft => "bottom-left",
            Side::BottomRight => "bottom-right",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Side::ALL
            .into_iter()
            .find(|side| side.as_str() == s)
            .ok_or_else(|| format!("unknown side `{s}`"))
    }
}

/// Tooltip and spacing dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    pub tooltip_width: f64,
    /// Fixed height reserved for content and controls.
    pub tooltip_height: f64,
    /// Gap between tooltip and highlight.
    pub margin: f64,
    /// Minimum distance from the viewport edges.
    pub safety_padding: f64,
    /// Outline padding drawn around the target.
    pub highlight_padding: f64,
    /// Distance between the arrow tip and the highlight.
    pub arrow_gap: f64,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            tooltip_width: 320.0,
            tooltip_height: 250.0,
            margin: 20.0,
            safety_padding: 20.0,
            highlight_padding: 10.0,
            arrow_gap: 8.0,
        }
    }
}

impl PlacementConfig {
    /// Validate dimensions. An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let positive = [
            ("tooltip_width", self.tooltip_width),
            ("tooltip_height", self.tooltip_height),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                errors.push(format!("placement.{name} must be > 0, got {value}"));
            }
        }
        let non_negative = [
            ("margin", self.margin),
            ("safety_padding", self.safety_padding),
            ("highlight_padding", self.highlight_padding),
            ("arrow_gap", self.arrow_gap),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                errors.push(format!("placement.{name} must be >= 0, got {value}"));
            }
        }
        errors
    }
}

/// Room between the padded target and the safe viewport edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Space {
    pub above: f64,
    pub below: f64,
    pub left: f64,
    pub right: f64,
}

/// One evaluated placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub side: Side,
    pub fits: bool,
    /// Weighted available space in this side's direction.
    pub score: f64,
    /// Unclamped tooltip top-left corner.
    pub anchor: Point,
}

impl Candidate {
    /// Score used when nothing fits.
    pub fn adjusted_score(&self) -> f64 {
        self.score + if self.fits { FIT_BONUS } else { 0.0 }
    }
}

/// Arrow glyph position and orientation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Arrow {
    pub anchor: Point,
    /// Degrees; the glyph points from tooltip toward target.
    pub rotation: f64,
}

/// Final tooltip geometry, in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlacementResult {
    pub side: Side,
    /// Tooltip top-left corner after clamping.
    pub tooltip: Point,
    pub tooltip_width: f64,
    pub tooltip_height: f64,
    pub arrow: Arrow,
    pub target_center: Point,
}

impl PlacementResult {
    /// Tooltip box in viewport coordinates.
    pub fn tooltip_rect(&self) -> Rect {
        Rect::new(
            self.tooltip.x,
            self.tooltip.y,
            self.tooltip_width,
            self.tooltip_height,
        )
    }
}

/// Chooses tooltip placements.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlacementEngine {
    config: PlacementConfig,
}

impl PlacementEngine {
    pub fn new(config: PlacementConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    /// Place the tooltip for `region`. Returns `None` when there is no region.
    pub fn place(
        &self,
        region: Option<&BoundingRegion>,
        viewport: &Viewport,
        preferred: PreferredPosition,
    ) -> Option<PlacementResult> {
        let region = region?;
        Some(self.place_rect(region.viewport, viewport, preferred))
    }

    /// Place the tooltip for a viewport-relative target rectangle.
    pub fn place_rect(
        &self,
        target: Rect,
        viewport: &Viewport,
        preferred: PreferredPosition,
    ) -> PlacementResult {
        let cfg = &self.config;
        let padded = self.padded(target);
        let candidates = self.candidates(target, viewport);
        let side = select(&candidates, preferred);
        let chosen = candidates
            .iter()
            .find(|c| c.side == side)
            .copied()
            .unwrap_or(candidates[0]);

        let max_x = viewport.width - cfg.tooltip_width - cfg.safety_padding;
        let max_y = viewport.height - cfg.tooltip_height - cfg.safety_padding;
        let tooltip = Point::new(
            clamp_axis(chosen.anchor.x, cfg.safety_padding, max_x),
            clamp_axis(chosen.anchor.y, cfg.safety_padding, max_y),
        );

        tracing::trace!(
            target: "waypoint.place",
            side = %side,
            preferred = ?preferred,
            fits = chosen.fits,
            x = tooltip.x,
            y = tooltip.y,
            "placement chosen"
        );

        PlacementResult {
            side,
            tooltip,
            tooltip_width: cfg.tooltip_width,
            tooltip_height: cfg.tooltip_height,
            arrow: self.arrow(side, padded),
            target_center: target.center(),
        }
    }

    /// Target rectangle grown by the highlight outline.
    pub fn padded(&self, target: Rect) -> Rect {
        target.outset(Insets::all(self.config.highlight_padding))
    }

    /// Room in each direction around the padded target.
    pub fn space(&self, target: Rect, viewport: &Viewport) -> Space {
        let padded = self.padded(target);
        let safe = self.config.safety_padding;
        Space {
            above: padded.top() - safe,
            below: viewport.height - padded.bottom() - safe,
            left: padded.left() - safe,
            right: viewport.width - padded.right() - safe,
        }
    }

    /// Evaluate all eight candidates in [`Side::ALL`] order.
    pub fn candidates(&self, target: Rect, viewport: &Viewport) -> [Candidate; 8] {
        let cfg = &self.config;
        let padded = self.padded(target);
        let space = self.space(target, viewport);
        let center = target.center();
        let (tw, th, margin, safe) = (
            cfg.tooltip_width,
            cfg.tooltip_height,
            cfg.margin,
            cfg.safety_padding,
        );

        let above_y = padded.top() - margin - th;
        let below_y = padded.bottom() + margin;
        let centered_x = center.x - tw / 2.0;
        let centered_y = center.y - th / 2.0;
        // Corners: `*-left` extends leftward from the right edge, `*-right`
        // extends rightward from the left edge.
        let leftward_x = padded.right() - tw;
        let rightward_x = padded.left();

        let fits_above = space.above >= th + margin;
        let fits_below = space.below >= th + margin;
        let leftward_ok = leftward_x >= safe;
        let rightward_ok = rightward_x + tw <= viewport.width - safe;

        Side::ALL.map(|side| {
            let (fits, room, anchor) = match side {
                Side::Top => (fits_above, space.above, Point::new(centered_x, above_y)),
                Side::Bottom => (fits_below, space.below, Point::new(centered_x, below_y)),
                Side::Left => (
                    space.left >= tw + margin,
                    space.left,
                    Point::new(padded.left() - margin - tw, centered_y),
                ),
                Side::Right => (
                    space.right >= tw + margin,
                    space.right,
                    Point::new(padded.right() + margin, centered_y),
                ),
                Side::TopLeft => (
                    fits_above && leftward_ok,
                    space.above,
                    Point::new(leftward_x, above_y),
                ),
                Side::TopRight => (
                    fits_above && rightward_ok,
                    space.above,
                    Point::new(rightward_x, above_y),
                ),
                Side::BottomLeft => (
                    fits_below && leftward_ok,
                    space.below,
                    Point::new(leftward_x, below_y),
                ),
                Side::BottomRight => (
                    fits_below && rightward_ok,
                    space.below,
                    Point::new(rightward_x, below_y),
                ),
            };
            Candidate {
                side,
                fits,
                score: room * side.weight(),
                anchor,
            }
        })
    }

    fn arrow(&self, side: Side, padded: Rect) -> Arrow {
        let gap = self.config.arrow_gap;
        let center = padded.center();
        match side.edge() {
            Edge::Top => Arrow {
                anchor: Point::new(center.x, padded.top() - gap),
                rotation: 180.0,
            },
            Edge::Bottom => Arrow {
                anchor: Point::new(center.x, padded.bottom() + gap),
                rotation: 0.0,
            },
            Edge::Left => Arrow {
                anchor: Point::new(padded.left() - gap, center.y),
                rotation: -90.0,
            },
            Edge::Right => Arrow {
                anchor: Point::new(padded.right() + gap, center.y),
                rotation: 90.0,
            },
        }
    }
}

/// Pick a side from evaluated candidates.
pub fn select(candidates: &[Candidate], preferred: PreferredPosition) -> Side {
    let find = |side: Side| candidates.iter().find(|c| c.side == side);

    if let Some(side) = preferred.side()
        && find(side).is_some_and(|c| c.fits)
    {
        return side;
    }

    if let Some(side) = Side::PRIORITY
        .into_iter()
        .find(|&side| find(side).is_some_and(|c| c.fits))
    {
        return side;
    }

    let mut best: Option<&Candidate> = None;
    for candidate in candidates {
        if best.is_none_or(|b| candidate.adjusted_score() > b.adjusted_score()) {
            best = Some(candidate);
        }
    }
    best.map_or(Side::Top, |c| c.side)
}

/// Clamp into `[lo, hi]`; `lo` wins when the range is inverted.
fn clamp_axis(value: f64, lo: f64, hi: f64) -> f64 {
    value.min(hi).max(lo)
}
