//! Core types for event capture
//!
//! Defines the raw event schema shared by the capture pipeline and the
//! analysis core. Every record is an immutable value type; all optional
//! fields tolerate being absent so that logs written by older (or foreign)
//! producers still load.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel window title used when the foreground window cannot be resolved.
pub const UNKNOWN_WINDOW: &str = "Unknown";

/// Kind of a captured event.
///
/// The set is open-ended: any kind string this crate does not know about
/// deserializes into [`EventKind::Other`] instead of being rejected, so
/// event logs from newer producers keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A mouse button press
    MouseClick,
    /// A single key press (possibly a rendered modifier combo)
    KeyPress,
    /// A mouse wheel / trackpad scroll
    MouseScroll,
    /// Any kind this crate does not model explicitly
    #[serde(untagged)]
    Other(String),
}

impl EventKind {
    /// The wire name of this kind.
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::MouseClick => "mouse_click",
            EventKind::KeyPress => "key_press",
            EventKind::MouseScroll => "mouse_scroll",
            EventKind::Other(s) => s,
        }
    }

    pub fn is_mouse_click(&self) -> bool {
        matches!(self, EventKind::MouseClick)
    }

    pub fn is_key_press(&self) -> bool {
        matches!(self, EventKind::KeyPress)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptor of the UI element under a click, as reported by an
/// accessibility lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiElement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub automation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    /// Bounding rectangle as `[left, top, right, bottom]`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rectangle: Option<[i32; 4]>,
}

impl UiElement {
    /// Build a short human-readable label for this element.
    ///
    /// Prefers the element name, qualified by the control type for controls
    /// that are not self-describing (anything other than buttons and menu
    /// items); falls back to the control type, qualified by the class name.
    pub fn friendly_label(&self) -> Option<String> {
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            let label = match self.control_type.as_deref().filter(|c| !c.is_empty()) {
                Some(ct) if ct != "Button" && ct != "MenuItem" => format!("{ct}: {name}"),
                _ => name.to_string(),
            };
            return Some(label);
        }

        let control_type = self.control_type.as_deref().filter(|c| !c.is_empty())?;
        let label = match self.class_name.as_deref().filter(|c| !c.is_empty()) {
            Some(class_name) => format!("{control_type}({class_name})"),
            None => control_type.to_string(),
        };
        Some(label)
    }
}

fn unknown_window() -> String {
    UNKNOWN_WINDOW.to_string()
}

/// One captured user action.
///
/// Within a session, events are produced in non-decreasing timestamp order;
/// the analysis core depends on that order and never re-sorts its input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Capture time
    pub timestamp: DateTime<Utc>,
    /// Event kind (open-ended, see [`EventKind`])
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Foreground window title at capture time; never empty,
    /// `"Unknown"` when the lookup failed
    #[serde(default = "unknown_window")]
    pub window: String,
    /// Pointer x coordinate (clicks and scrolls)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    /// Pointer y coordinate (clicks and scrolls)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    /// Mouse button name for clicks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button: Option<String>,
    /// Short label of the clicked element, when resolvable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clicked_element: Option<String>,
    /// Full descriptor of the clicked element
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<UiElement>,
    /// Key token for key presses: a single character, a named key
    /// (e.g. "Enter"), or a rendered combo (e.g. "Ctrl + C Copy")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Horizontal scroll delta
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_x: Option<i32>,
    /// Vertical scroll delta
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_y: Option<i32>,
}

impl RawEvent {
    fn base(timestamp: DateTime<Utc>, kind: EventKind, window: impl Into<String>) -> Self {
        let window = window.into();
        Self {
            timestamp,
            kind,
            window: if window.is_empty() { unknown_window() } else { window },
            x: None,
            y: None,
            button: None,
            clicked_element: None,
            element: None,
            key: None,
            delta_x: None,
            delta_y: None,
        }
    }

    /// Create a mouse click event.
    pub fn mouse_click(
        timestamp: DateTime<Utc>,
        window: impl Into<String>,
        x: i32,
        y: i32,
        button: impl Into<String>,
    ) -> Self {
        let mut event = Self::base(timestamp, EventKind::MouseClick, window);
        event.x = Some(x);
        event.y = Some(y);
        event.button = Some(button.into());
        event
    }

    /// Create a key press event.
    pub fn key_press(
        timestamp: DateTime<Utc>,
        window: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        let mut event = Self::base(timestamp, EventKind::KeyPress, window);
        event.key = Some(key.into());
        event
    }

    /// Create a scroll event.
    pub fn mouse_scroll(
        timestamp: DateTime<Utc>,
        window: impl Into<String>,
        x: i32,
        y: i32,
        delta_x: i32,
        delta_y: i32,
    ) -> Self {
        let mut event = Self::base(timestamp, EventKind::MouseScroll, window);
        event.x = Some(x);
        event.y = Some(y);
        event.delta_x = Some(delta_x);
        event.delta_y = Some(delta_y);
        event
    }

    /// Create an event of an arbitrary kind.
    pub fn other(
        timestamp: DateTime<Utc>,
        kind: impl Into<String>,
        window: impl Into<String>,
    ) -> Self {
        Self::base(timestamp, EventKind::Other(kind.into()), window)
    }

    /// Attach a UI element descriptor.
    pub fn with_element(mut self, element: UiElement) -> Self {
        self.element = Some(element);
        self
    }

    /// Attach a clicked-element label.
    pub fn with_clicked_element(mut self, label: impl Into<String>) -> Self {
        self.clicked_element = Some(label.into());
        self
    }
}
