//! Page layouts for the headless host.
//!
//! A layout file maps route paths to element tables:
//!
//! ```json
//! {
//!   "viewport": { "width": 1280, "height": 720 },
//!   "start": "/",
//!   "pages": {
//!     "/": [{ "id": "save", "rect": { "x": 40, "y": 80, "width": 120, "height": 36 } }],
//!     "/settings": [{ "classes": ["toggle"],
//!                     "rect": { "x": 400, "y": 300, "width": 60, "height": 30 },
//!                     "appears_after_ms": 400 }]
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use waypoint_core::{ElementSpec, StaticDocument, Viewport};

use crate::error::{DemoError, Result};

fn default_start() -> String {
    "/".to_string()
}

fn default_viewport() -> Viewport {
    Viewport::new(1280.0, 720.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    #[serde(default = "default_viewport")]
    pub viewport: Viewport,
    /// Route shown before the tour opens.
    #[serde(default = "default_start")]
    pub start: String,
    pub pages: BTreeMap<String, Vec<ElementSpec>>,
}

impl Layout {
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| DemoError::io(path, e))?;
        Self::from_json_str(&content)
    }

    /// Fresh document for `path`, shown through `viewport`.
    ///
    /// Unknown routes render as empty pages; the tour's retry budget decides
    /// what happens to steps that live there.
    pub fn document(&self, path: &str, viewport: Viewport) -> StaticDocument {
        let elements = self.pages.get(path).cloned().unwrap_or_default();
        StaticDocument::with_elements(viewport, elements)
    }

    /// Fail if the start route has no page.
    pub fn check_start(&self) -> Result<()> {
        if self.pages.contains_key(&self.start) {
            Ok(())
        } else {
            Err(DemoError::UnknownRoute {
                path: self.start.clone(),
            })
        }
    }
}
