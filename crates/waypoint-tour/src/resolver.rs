#![forbid(unsafe_code)]

//! Target resolution: descriptors to a combined bounding region.
//!
//! Resolution is a pure read of layout. Calling [`resolve`] twice against an
//! unchanged document yields identical regions.

use serde::Serialize;
use waypoint_core::{HostDocument, Point, Rect};

use crate::step::{Lookup, TargetDescriptor};

/// Resolved geometry for a step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundingRegion {
    /// Union top in document coordinates.
    pub top: f64,
    /// Union left in document coordinates.
    pub left: f64,
    pub width: f64,
    pub height: f64,
    /// Union box in viewport coordinates.
    pub viewport: Rect,
    /// Per-element boxes in viewport coordinates, declaration order.
    pub rects: Vec<Rect>,
    /// Scroll offset the region was measured at.
    pub scroll: Point,
}

impl BoundingRegion {
    /// Union box in document coordinates.
    pub fn document_rect(&self) -> Rect {
        Rect::new(self.left, self.top, self.width, self.height)
    }

    /// Per-element boxes in document coordinates.
    pub fn document_rects(&self) -> Vec<Rect> {
        self.rects
            .iter()
            .map(|r| r.offset(self.scroll.x, self.scroll.y))
            .collect()
    }

    /// Whether more than one element contributed.
    pub fn is_multi(&self) -> bool {
        self.rects.len() > 1
    }
}

/// Look up one descriptor. Identifier first, then first class match.
pub fn lookup<D: HostDocument + ?Sized>(
    descriptor: &TargetDescriptor,
    document: &D,
) -> Option<Rect> {
    match descriptor.lookup()? {
        Lookup::Id(id) => document.rect_by_id(id),
        Lookup::Class(class) => document.first_rect_by_class(class),
    }
}

/// Resolve descriptors into a bounding region.
///
/// Descriptors that match nothing are skipped. Returns `None` when no
/// descriptor resolved.
pub fn resolve<D: HostDocument + ?Sized>(
    descriptors: &[TargetDescriptor],
    document: &D,
) -> Option<BoundingRegion> {
    let rects: Vec<Rect> = descriptors
        .iter()
        .filter_map(|d| lookup(d, document))
        .collect();

    let Some(union) = Rect::union_all(&rects) else {
        tracing::trace!(
            target: "waypoint.resolve",
            descriptors = descriptors.len(),
            "no target resolved"
        );
        return None;
    };

    let viewport = document.viewport();
    tracing::trace!(
        target: "waypoint.resolve",
        resolved = rects.len(),
        descriptors = descriptors.len(),
        "targets resolved"
    );

    Some(BoundingRegion {
        top: union.top() + viewport.scroll_y,
        left: union.left() + viewport.scroll_x,
        width: union.width,
        height: union.height,
        viewport: union,
        rects,
        scroll: viewport.scroll(),
    })
}
