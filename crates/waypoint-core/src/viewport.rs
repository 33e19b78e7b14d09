#![forbid(unsafe_code)]

//! Viewport snapshot and the capability that supplies it.
//!
//! Hosts never expose a global window. Components that need the visible
//! area or scroll offset receive a [`ViewportQuery`] instead, so placement
//! and resolution stay deterministic under test.

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect, Size};

/// Visible area size and scroll offset of the host document.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub scroll_x: f64,
    #[serde(default)]
    pub scroll_y: f64,
}

impl Viewport {
    /// A viewport of the given size with no scroll offset.
    #[inline]
    pub const fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }

    /// Set the scroll offset.
    #[inline]
    #[must_use]
    pub const fn with_scroll(mut self, scroll_x: f64, scroll_y: f64) -> Self {
        self.scroll_x = scroll_x;
        self.scroll_y = scroll_y;
        self
    }

    /// Visible size.
    #[inline]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Scroll offset as a point.
    #[inline]
    pub const fn scroll(&self) -> Point {
        Point::new(self.scroll_x, self.scroll_y)
    }

    /// The visible area in viewport coordinates.
    #[inline]
    pub const fn bounds(&self) -> Rect {
        Rect::from_size(self.size())
    }

    /// Convert a viewport-relative rectangle into document coordinates.
    #[inline]
    pub fn to_document(&self, rect: Rect) -> Rect {
        rect.offset(self.scroll_x, self.scroll_y)
    }

    /// Convert a document-relative rectangle into viewport coordinates.
    #[inline]
    pub fn to_viewport(&self, rect: Rect) -> Rect {
        rect.offset(-self.scroll_x, -self.scroll_y)
    }
}

/// Supplies the current viewport.
///
/// Reads must be cheap and free of side effects; callers may query on
/// every scroll or resize notification.
pub trait ViewportQuery {
    /// Current viewport size and scroll offset.
    fn viewport(&self) -> Viewport;
}

impl ViewportQuery for Viewport {
    fn viewport(&self) -> Viewport {
        *self
    }
}

impl<T: ViewportQuery + ?Sized> ViewportQuery for &T {
    fn viewport(&self) -> Viewport {
        (**self).viewport()
    }
}
