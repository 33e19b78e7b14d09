#![forbid(unsafe_code)]

//! Element lookup capability and an in-memory document.
//!
//! [`ElementQuery`] is the read-only boundary to the host's element tree.
//! Implementations return viewport-relative client rectangles, the same
//! shape a browser reports from `getBoundingClientRect`.
//!
//! [`StaticDocument`] is a table-backed implementation used by tests and by
//! headless hosts. Element rectangles are stored in document coordinates
//! and shifted by the scroll offset on read. Elements may declare an
//! appearance delay to model content that mounts asynchronously.

use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;
use crate::viewport::{Viewport, ViewportQuery};

/// Read-only lookup of live elements.
pub trait ElementQuery {
    /// Client rectangle of the element whose identifier is `id`.
    fn rect_by_id(&self, id: &str) -> Option<Rect>;

    /// Client rectangle of the first element (document order) carrying `class`.
    fn first_rect_by_class(&self, class: &str) -> Option<Rect>;
}

impl<T: ElementQuery + ?Sized> ElementQuery for &T {
    fn rect_by_id(&self, id: &str) -> Option<Rect> {
        (**self).rect_by_id(id)
    }

    fn first_rect_by_class(&self, class: &str) -> Option<Rect> {
        (**self).first_rect_by_class(class)
    }
}

/// Everything the engine reads from the host: elements plus viewport.
pub trait HostDocument: ElementQuery + ViewportQuery {}

impl<T: ElementQuery + ViewportQuery + ?Sized> HostDocument for T {}

/// One element in a [`StaticDocument`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    /// Bounds in document coordinates.
    pub rect: Rect,
    /// Element is absent until this much time has elapsed.
    #[serde(
        default,
        rename = "appears_after_ms",
        with = "duration_ms",
        skip_serializing_if = "Option::is_none"
    )]
    pub appears_after: Option<Duration>,
}

impl ElementSpec {
    /// An element with the given document bounds and no identifier.
    pub fn new(rect: Rect) -> Self {
        Self {
            id: None,
            classes: Vec::new(),
            rect,
            appears_after: None,
        }
    }

    /// Set the identifier.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add a class token.
    #[must_use]
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Keep the element absent until `delay` has elapsed.
    #[must_use]
    pub fn appears_after(mut self, delay: Duration) -> Self {
        self.appears_after = Some(delay);
        self
    }

    fn is_mounted(&self, elapsed: Duration) -> bool {
        self.appears_after.is_none_or(|delay| elapsed >= delay)
    }
}

/// Table-backed document with a controllable viewport and mount clock.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticDocument {
    viewport: Viewport,
    elements: Vec<ElementSpec>,
    elapsed: Duration,
}

impl StaticDocument {
    /// An empty document shown through `viewport`.
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            elements: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }

    /// Build a document from a list of elements.
    pub fn with_elements(viewport: Viewport, elements: Vec<ElementSpec>) -> Self {
        Self {
            viewport,
            elements,
            elapsed: Duration::ZERO,
        }
    }

    /// Append an element (document order is insertion order).
    #[must_use]
    pub fn element(mut self, element: ElementSpec) -> Self {
        self.elements.push(element);
        self
    }

    /// Append an element in place.
    pub fn insert(&mut self, element: ElementSpec) {
        self.elements.push(element);
    }

    /// Remove every element with identifier `id`. Returns how many were removed.
    pub fn remove_id(&mut self, id: &str) -> usize {
        let before = self.elements.len();
        self.elements.retain(|el| el.id.as_deref() != Some(id));
        before - self.elements.len()
    }

    /// Move the element with identifier `id` to new document bounds.
    pub fn move_id(&mut self, id: &str, rect: Rect) -> bool {
        match self
            .elements
            .iter_mut()
            .find(|el| el.id.as_deref() == Some(id))
        {
            Some(el) => {
                el.rect = rect;
                true
            }
            None => false,
        }
    }

    /// All elements, mounted or not.
    pub fn elements(&self) -> &[ElementSpec] {
        &self.elements
    }

    /// Set the scroll offset.
    pub fn scroll_to(&mut self, scroll_x: f64, scroll_y: f64) {
        self.viewport.scroll_x = scroll_x;
        self.viewport.scroll_y = scroll_y;
    }

    /// Resize the visible area.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.viewport.width = width;
        self.viewport.height = height;
    }

    /// Time since the document was shown; drives delayed mounts.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Set the mount clock.
    pub fn set_elapsed(&mut self, elapsed: Duration) {
        self.elapsed = elapsed;
    }

    /// Advance the mount clock.
    pub fn tick(&mut self, dt: Duration) {
        self.elapsed = self.elapsed.saturating_add(dt);
    }

    fn mounted(&self) -> impl Iterator<Item = &ElementSpec> {
        self.elements
            .iter()
            .filter(move |el| el.is_mounted(self.elapsed))
    }
}

impl ElementQuery for StaticDocument {
    fn rect_by_id(&self, id: &str) -> Option<Rect> {
        self.mounted()
            .find(|el| el.id.as_deref() == Some(id))
            .map(|el| self.viewport.to_viewport(el.rect))
    }

    fn first_rect_by_class(&self, class: &str) -> Option<Rect> {
        self.mounted()
            .find(|el| el.classes.iter().any(|c| c == class))
            .map(|el| self.viewport.to_viewport(el.rect))
    }
}

impl ViewportQuery for StaticDocument {
    fn viewport(&self) -> Viewport {
        self.viewport
    }
}

mod duration_ms {
    use core::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_u64(d.as_millis() as u64),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> StaticDocument {
        StaticDocument::new(Viewport::new(800.0, 600.0))
            .element(ElementSpec::new(Rect::new(10.0, 10.0, 50.0, 20.0)).id("save"))
            .element(ElementSpec::new(Rect::new(0.0, 100.0, 80.0, 30.0)).class("card"))
            .element(
                ElementSpec::new(Rect::new(0.0, 200.0, 80.0, 30.0))
                    .class("card")
                    .id("second"),
            )
    }

    #[test]
    fn id_lookup_returns_client_rect() {
        assert_eq!(doc().rect_by_id("save"), Some(Rect::new(10.0, 10.0, 50.0, 20.0)));
        assert_eq!(doc().rect_by_id("missing"), None);
    }

    #[test]
    fn class_lookup_returns_first_in_document_order() {
        assert_eq!(
            doc().first_rect_by_class("card"),
            Some(Rect::new(0.0, 100.0, 80.0, 30.0))
        );
    }

    #[test]
    fn scroll_shifts_client_rects() {
        let mut d = doc();
        d.scroll_to(0.0, 50.0);
        assert_eq!(d.rect_by_id("second"), Some(Rect::new(0.0, 150.0, 80.0, 30.0)));
    }

    #[test]
    fn delayed_elements_mount_after_elapsed() {
        let mut d = StaticDocument::new(Viewport::new(100.0, 100.0)).element(
            ElementSpec::new(Rect::new(1.0, 1.0, 1.0, 1.0))
                .id("late")
                .appears_after(Duration::from_millis(600)),
        );
        assert_eq!(d.rect_by_id("late"), None);
        d.tick(Duration::from_millis(400));
        assert_eq!(d.rect_by_id("late"), None);
        d.tick(Duration::from_millis(200));
        assert!(d.rect_by_id("late").is_some());
    }

    #[test]
    fn remove_and_move() {
        let mut d = doc();
        assert!(d.move_id("save", Rect::new(0.0, 0.0, 1.0, 1.0)));
        assert_eq!(d.rect_by_id("save"), Some(Rect::new(0.0, 0.0, 1.0, 1.0)));
        assert_eq!(d.remove_id("save"), 1);
        assert_eq!(d.rect_by_id("save"), None);
        assert!(!d.move_id("save", Rect::default()));
    }

    #[test]
    fn element_spec_parses_delay_in_ms() {
        let spec: ElementSpec = serde_json::from_str(
            r#"{"id":"a","rect":{"x":1,"y":2,"width":3,"height":4},"appears_after_ms":250}"#,
        )
        .unwrap();
        assert_eq!(spec.appears_after, Some(Duration::from_millis(250)));
        assert!(spec.classes.is_empty());
    }
}
