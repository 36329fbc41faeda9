//! Pattern Mining
//!
//! Surfaces automation opportunities from a raw event log: the same
//! `(window, action)` pair repeated at least a threshold number of times,
//! and sessions that span two or more distinct applications. Findings keep
//! their structured key and count so callers (and tests) can inspect them
//! before rendering the human-readable sentence.

use crate::capture::types::{EventKind, RawEvent};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Pattern miner tuning knobs.
#[derive(Debug, Clone)]
pub struct PatternConfig {
    /// Minimum occurrences of one `(window, action)` pair before a
    /// repetition finding is emitted
    pub repeat_threshold: usize,
    /// Count clicks without a resolvable element label by their pointer
    /// position. Off by default: coordinate identity is a weak signal for
    /// "same action".
    pub count_unlabeled_clicks: bool,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            repeat_threshold: 3,
            count_unlabeled_clicks: false,
        }
    }
}

/// One detected automation opportunity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PatternFinding {
    /// The same action repeated in one window
    RepeatedAction {
        window: String,
        detail: String,
        count: usize,
    },
    /// A workflow touching several applications
    CrossApplication { windows: Vec<String> },
}

impl PatternFinding {
    /// Render the finding as its suggestion sentence.
    pub fn render(&self) -> String {
        match self {
            PatternFinding::RepeatedAction {
                window,
                detail,
                count,
            } => format!(
                "Detected repetitive action: {window} - {detail} ({count} times)\
                 This can be automated."
            ),
            PatternFinding::CrossApplication { windows } => format!(
                "Detected workflow spanning multiple apps: {}.\
                 Data flow between these applications can be automated.",
                windows.join(", ")
            ),
        }
    }
}

impl std::fmt::Display for PatternFinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

/// Windows excluded from cross-application detection.
fn is_unknown_window(window: &str) -> bool {
    window.is_empty() || window.eq_ignore_ascii_case("unknown")
}

/// Mine a raw event log for repetition and cross-application findings.
///
/// Never fails: an empty log, or one whose events all miss the fields a
/// detector needs, yields an empty list. Repetition findings come first,
/// in order of each action's first occurrence, followed by at most one
/// cross-application finding.
pub fn detect_patterns(events: &[RawEvent], config: &PatternConfig) -> Vec<PatternFinding> {
    let mut counts: HashMap<(String, String), usize> = HashMap::new();
    let mut first_seen: Vec<(String, String)> = Vec::new();
    let mut windows: BTreeSet<String> = BTreeSet::new();

    for event in events {
        let detail = match &event.kind {
            EventKind::MouseClick => match event
                .clicked_element
                .as_deref()
                .filter(|label| !label.is_empty())
            {
                Some(label) => Some(label.to_string()),
                None if config.count_unlabeled_clicks => match (event.x, event.y) {
                    (Some(x), Some(y)) => Some(format!("Position({x}, {y})")),
                    _ => None,
                },
                None => None,
            },
            EventKind::KeyPress => event
                .key
                .as_deref()
                .filter(|key| !key.is_empty())
                .map(str::to_string),
            _ => None,
        };

        if let Some(detail) = detail {
            let key = (event.window.clone(), detail);
            match counts.get_mut(&key) {
                Some(count) => *count += 1,
                None => {
                    counts.insert(key.clone(), 1);
                    first_seen.push(key);
                }
            }
        }

        // every event's window feeds cross-app detection, counted or not
        if !is_unknown_window(&event.window) {
            windows.insert(event.window.clone());
        }
    }

    let mut findings = Vec::new();
    for key in first_seen {
        let count = counts[&key];
        if count >= config.repeat_threshold {
            let (window, detail) = key;
            findings.push(PatternFinding::RepeatedAction {
                window,
                detail,
                count,
            });
        }
    }

    if windows.len() >= 2 {
        findings.push(PatternFinding::CrossApplication {
            windows: windows.into_iter().collect(),
        });
    }

    findings
}
