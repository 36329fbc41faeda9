//! Workflow Step Segmentation
//!
//! Coalesces a raw event log into a compact sequence of workflow steps.
//! Consecutive key presses in one window collapse into a single "typed"
//! step; clicks and every other event kind pass through one-to-one. The
//! segmenter is a pure fold over its input: no I/O, no failure modes, and
//! partially populated events degrade to generic summaries.
//!
//! ```text
//! click(Save) key(H) key(i) click(Send)
//!      │         └────┬────┘      │
//!      ▼              ▼           ▼
//!  [Clicked 'Save']  [Typed: H i] [Clicked 'Send']
//! ```

use crate::capture::types::{EventKind, RawEvent, UiElement, UNKNOWN_WINDOW};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Segmenter tuning knobs.
#[derive(Debug, Clone, Default)]
pub struct SegmenterConfig {
    /// Close a key run when the gap between consecutive key presses exceeds
    /// this many milliseconds. `None` keeps runs open across idle gaps, so
    /// only a window change or a non-key event closes them.
    pub max_key_gap_ms: Option<u64>,
}

/// Pointer position of a click step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClickLocation {
    pub x: Option<i32>,
    pub y: Option<i32>,
}

/// Click-specific detail carried by a mouse click step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClickDetail {
    pub location: ClickLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<UiElement>,
}

/// One semantically meaningful step of the recorded workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStep {
    /// Timestamp of the step (for key runs, the run's first key)
    pub timestamp: DateTime<Utc>,
    /// Window the step happened in
    pub window: String,
    /// Kind of the underlying event(s)
    pub action_type: EventKind,
    /// One-line human-readable description
    pub summary: String,
    /// Click detail, present only for mouse click steps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub click: Option<ClickDetail>,
    /// Coalesced key tokens, present only for key press steps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keys: Option<Vec<String>>,
    /// Element context inherited by a key run from the most recent click
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<UiElement>,
}

/// Window name as it appears in step summaries.
fn window_label(window: &str) -> &str {
    if window.is_empty() || window == UNKNOWN_WINDOW {
        "Unknown window"
    } else {
        window
    }
}

/// A key run being accumulated while iterating events.
struct KeyRun {
    keys: Vec<String>,
    window: String,
    started_at: DateTime<Utc>,
    last_at: DateTime<Utc>,
    element: Option<UiElement>,
}

impl KeyRun {
    fn start(event: &RawEvent, inherited: &Option<UiElement>) -> Self {
        Self {
            keys: Vec::new(),
            window: event.window.clone(),
            started_at: event.timestamp,
            last_at: event.timestamp,
            element: event.element.clone().or_else(|| inherited.clone()),
        }
    }

    fn into_step(self) -> WorkflowStep {
        let summary = format!(
            "Typed: {} in {}",
            self.keys.join(" "),
            window_label(&self.window)
        );
        WorkflowStep {
            timestamp: self.started_at,
            window: self.window,
            action_type: EventKind::KeyPress,
            summary,
            click: None,
            keys: Some(self.keys),
            element: self.element,
        }
    }
}

fn click_step(event: &RawEvent) -> WorkflowStep {
    let label = event
        .clicked_element
        .clone()
        .or_else(|| event.element.as_ref().and_then(|e| e.name.clone()))
        .filter(|l| !l.is_empty());

    let window = window_label(&event.window);
    let summary = if let Some(label) = &label {
        format!("Clicked '{label}' in {window}")
    } else if let Some(control_type) = event
        .element
        .as_ref()
        .and_then(|e| e.control_type.as_deref())
        .filter(|c| !c.is_empty())
    {
        format!("Clicked {control_type} in {window}")
    } else {
        format!("Mouse click in {window}")
    };

    WorkflowStep {
        timestamp: event.timestamp,
        window: event.window.clone(),
        action_type: EventKind::MouseClick,
        summary,
        click: Some(ClickDetail {
            location: ClickLocation {
                x: event.x,
                y: event.y,
            },
            label,
            element: event.element.clone(),
        }),
        keys: None,
        element: None,
    }
}

fn generic_step(event: &RawEvent) -> WorkflowStep {
    let kind = event.kind.as_str();
    let summary = if kind.is_empty() {
        "event recorded".to_string()
    } else {
        format!("{kind} recorded")
    };
    WorkflowStep {
        timestamp: event.timestamp,
        window: event.window.clone(),
        action_type: event.kind.clone(),
        summary,
        click: None,
        keys: None,
        element: None,
    }
}

/// Segment a raw event log into workflow steps.
///
/// Events are consumed in input order and never re-sorted. Key presses
/// accumulate into a pending run that is flushed into one step whenever a
/// non-key event arrives, the window changes, the configured gap is
/// exceeded, or the input ends. Every non-key event produces exactly one
/// step, emitted after any pending run is flushed.
pub fn segment(events: &[RawEvent], config: &SegmenterConfig) -> Vec<WorkflowStep> {
    let mut steps = Vec::new();
    let mut run: Option<KeyRun> = None;
    // element context from the most recent click, inherited by key runs
    let mut last_click_element: Option<UiElement> = None;

    for event in events {
        if !event.kind.is_key_press() {
            if let Some(run) = run.take() {
                steps.push(run.into_step());
            }
        }

        match &event.kind {
            EventKind::MouseClick => {
                steps.push(click_step(event));
                last_click_element = event.element.clone();
            }
            EventKind::KeyPress => {
                let Some(key) = event.key.as_deref().filter(|k| !k.is_empty()) else {
                    // keyless record contributes to no step
                    continue;
                };

                let split = run.as_ref().is_some_and(|r| {
                    if r.window != event.window {
                        return true;
                    }
                    match config.max_key_gap_ms {
                        Some(gap) => {
                            let elapsed = event
                                .timestamp
                                .signed_duration_since(r.last_at)
                                .num_milliseconds();
                            elapsed > gap as i64
                        }
                        None => false,
                    }
                });
                if split {
                    if let Some(run) = run.take() {
                        steps.push(run.into_step());
                    }
                }

                let run = run.get_or_insert_with(|| KeyRun::start(event, &last_click_element));
                run.keys.push(key.to_string());
                run.last_at = event.timestamp;
            }
            _ => steps.push(generic_step(event)),
        }
    }

    if let Some(run) = run.take() {
        steps.push(run.into_step());
    }

    steps
}
