#![forbid(unsafe_code)]

//! Tour steps and target descriptors.
//!
//! A [`Step`] names what to spotlight (one or more [`TargetDescriptor`]s),
//! which route it lives on, and how its tooltip prefers to sit. Steps are
//! plain data: they can be loaded from JSON or TOML, and hosts attach the
//! optional [`StepAction`] in code.

use std::fmt;
use std::path::Path;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::{self, Result};
use crate::placement::Side;

/// How a descriptor locates its element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<'a> {
    /// Identifier lookup.
    Id(&'a str),
    /// First element carrying the class token.
    Class(&'a str),
}

/// Identifies one element to highlight.
///
/// The identifier wins when both fields are set. Empty strings count as
/// absent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TargetDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, rename = "class", skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
}

impl TargetDescriptor {
    /// Descriptor looking up an element identifier.
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            class_name: None,
        }
    }

    /// Descriptor looking up the first element with a class token.
    pub fn by_class(class: impl Into<String>) -> Self {
        Self {
            id: None,
            class_name: Some(class.into()),
        }
    }

    /// The lookup this descriptor performs, if any.
    pub fn lookup(&self) -> Option<Lookup<'_>> {
        match (self.id.as_deref(), self.class_name.as_deref()) {
            (Some(id), _) if !id.is_empty() => Some(Lookup::Id(id)),
            (_, Some(class)) if !class.is_empty() => Some(Lookup::Class(class)),
            _ => None,
        }
    }

    /// Whether the descriptor can locate anything at all.
    pub fn is_usable(&self) -> bool {
        self.lookup().is_some()
    }
}

impl fmt::Display for TargetDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.lookup() {
            Some(Lookup::Id(id)) => write!(f, "#{id}"),
            Some(Lookup::Class(class)) => write!(f, ".{class}"),
            None => f.write_str("<empty>"),
        }
    }
}

/// Preferred tooltip side for a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PreferredPosition {
    /// Let the placement engine choose.
    #[default]
    Auto,
    Top,
    Bottom,
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl PreferredPosition {
    /// The concrete side requested, or `None` for auto.
    pub const fn side(self) -> Option<Side> {
        match self {
            Self::Auto => None,
            Self::Top => Some(Side::Top),
            Self::Bottom => Some(Side::Bottom),
            Self::Left => Some(Side::Left),
            Self::Right => Some(Side::Right),
            Self::TopLeft => Some(Side::TopLeft),
            Self::TopRight => Some(Side::TopRight),
            Self::BottomLeft => Some(Side::BottomLeft),
            Self::BottomRight => Some(Side::BottomRight),
        }
    }
}

impl From<Side> for PreferredPosition {
    fn from(side: Side) -> Self {
        match side {
            Side::Top => Self::Top,
            Side::Bottom => Self::Bottom,
            Side::Left => Self::Left,
            Side::Right => Self::Right,
            Side::TopLeft => Self::TopLeft,
            Side::TopRight => Self::TopRight,
            Side::BottomLeft => Self::BottomLeft,
            Side::BottomRight => Self::BottomRight,
        }
    }
}

/// Host hook run synchronously when the user advances past a step.
#[derive(Clone)]
pub struct StepAction(Rc<dyn Fn()>);

impl StepAction {
    /// Wrap a closure.
    pub fn new(f: impl Fn() + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Run the hook.
    pub fn invoke(&self) {
        (self.0)();
    }
}

impl fmt::Debug for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StepAction(..)")
    }
}

/// One unit of a tour.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Step {
    /// Order key; steps are sorted ascending by this value.
    pub step: u32,
    /// Inline single target.
    #[serde(flatten)]
    pub target: TargetDescriptor,
    /// Explicit target list. Takes precedence over the inline target.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<TargetDescriptor>,
    /// Route this step lives on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Route to navigate to when advancing, overriding the next step's path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_path: Option<String>,
    #[serde(default)]
    pub position: PreferredPosition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Custom label for the advance button.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_label: Option<String>,
    #[serde(skip)]
    pub on_next: Option<StepAction>,
}

impl Step {
    /// A step with the given order key and no targets.
    pub fn new(step: u32) -> Self {
        Self {
            step,
            ..Self::default()
        }
    }

    /// Set the inline target to an identifier.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.target.id = Some(id.into());
        self
    }

    /// Set the inline target to a class token.
    #[must_use]
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.target.class_name = Some(class.into());
        self
    }

    /// Append to the explicit target list.
    #[must_use]
    pub fn target(mut self, target: TargetDescriptor) -> Self {
        self.targets.push(target);
        self
    }

    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn next_path(mut self, path: impl Into<String>) -> Self {
        self.next_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn position(mut self, position: impl Into<PreferredPosition>) -> Self {
        self.position = position.into();
        self
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    #[must_use]
    pub fn next_label(mut self, label: impl Into<String>) -> Self {
        self.next_label = Some(label.into());
        self
    }

    /// Attach a hook run when the user presses Next on this step.
    #[must_use]
    pub fn on_next(mut self, f: impl Fn() + 'static) -> Self {
        self.on_next = Some(StepAction::new(f));
        self
    }

    /// The descriptors this step resolves, in declaration order.
    pub fn descriptors(&self) -> &[TargetDescriptor] {
        if !self.targets.is_empty() {
            &self.targets
        } else if self.target.is_usable() {
            std::slice::from_ref(&self.target)
        } else {
            &[]
        }
    }

    /// A step that can never resolve: zero order key or nothing to look up.
    pub fn is_malformed(&self) -> bool {
        self.step == 0 || !self.descriptors().iter().any(TargetDescriptor::is_usable)
    }

    /// Parse a JSON array of steps.
    pub fn list_from_json_str(s: &str) -> Result<Vec<Step>> {
        Ok(serde_json::from_str(s)?)
    }

    /// Read a JSON array of steps from disk.
    pub fn list_from_json_file(path: impl AsRef<Path>) -> Result<Vec<Step>> {
        Self::list_from_json_str(&error::read_to_string(path.as_ref())?)
    }
}

/// Sort steps ascending by order key. Ties keep their original order.
pub fn sort_steps(steps: &mut [Step]) {
    steps.sort_by_key(|s| s.step);
}
