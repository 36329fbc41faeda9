//! Workflow Analysis Integration Tests
//!
//! End-to-end tests for the analysis core: raw events through the
//! segmenter and pattern miner, asserting on the exact steps and findings
//! a session produces.

use chrono::{DateTime, TimeZone, Utc};
use deskflow::{
    detect_patterns, segment, EventKind, PatternConfig, PatternFinding, RawEvent, SegmenterConfig,
    UiElement,
};

// ============================================================================
// Helper Functions
// ============================================================================

fn ts(secs: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap() + chrono::Duration::seconds(secs as i64)
}

fn click(secs: u32, window: &str, label: &str) -> RawEvent {
    RawEvent::mouse_click(ts(secs), window, 100, 200, "Button.left")
        .with_clicked_element(label)
        .with_element(UiElement {
            name: Some(label.to_string()),
            control_type: Some("Button".to_string()),
            ..Default::default()
        })
}

fn key(secs: u32, window: &str, token: &str) -> RawEvent {
    RawEvent::key_press(ts(secs), window, token)
}

// ============================================================================
// End-to-End Session
// ============================================================================

#[test]
fn test_save_three_times_then_typing() {
    let events = vec![
        click(0, "Excel", "Save"),
        click(2, "Excel", "Save"),
        click(4, "Excel", "Save"),
        key(5, "Excel", "H"),
        key(6, "Excel", "i"),
    ];

    let steps = segment(&events, &SegmenterConfig::default());
    assert_eq!(steps.len(), 4);
    for step in &steps[..3] {
        assert_eq!(step.action_type, EventKind::MouseClick);
        assert_eq!(step.summary, "Clicked 'Save' in Excel");
    }
    assert_eq!(steps[3].action_type, EventKind::KeyPress);
    assert_eq!(
        steps[3].keys.as_deref(),
        Some(&["H".to_string(), "i".to_string()][..])
    );
    assert_eq!(steps[3].summary, "Typed: H i in Excel");

    let findings = detect_patterns(&events, &PatternConfig::default());
    let rendered: Vec<String> = findings.iter().map(PatternFinding::render).collect();
    assert_eq!(
        rendered,
        vec!["Detected repetitive action: Excel - Save (3 times)This can be automated."]
    );
}

#[test]
fn test_cross_application_session() {
    let events = vec![
        click(0, "Browser", "Copy link"),
        key(1, "Browser", "Ctrl + C Copy"),
        click(2, "Excel", "A1"),
        key(3, "Excel", "Ctrl + V Paste"),
        click(4, "Browser", "Next"),
        key(5, "Excel", "Enter"),
    ];

    let findings = detect_patterns(&events, &PatternConfig::default());
    // nothing repeats three times, but two apps are in play
    assert_eq!(
        findings,
        vec![PatternFinding::CrossApplication {
            windows: vec!["Browser".to_string(), "Excel".to_string()],
        }]
    );
    assert!(findings[0]
        .render()
        .starts_with("Detected workflow spanning multiple apps: Browser, Excel."));
}

// ============================================================================
// Segmentation Ordering
// ============================================================================

#[test]
fn test_pending_keys_flush_before_interrupting_event() {
    let events = vec![
        key(0, "Editor", "f"),
        key(1, "Editor", "o"),
        key(2, "Editor", "o"),
        RawEvent::mouse_scroll(ts(3), "Editor", 10, 10, 0, -5),
        key(4, "Editor", "b"),
    ];

    let steps = segment(&events, &SegmenterConfig::default());
    assert_eq!(steps.len(), 3);
    assert_eq!(steps[0].summary, "Typed: f o o in Editor");
    assert_eq!(steps[1].summary, "mouse_scroll recorded");
    assert_eq!(steps[2].summary, "Typed: b in Editor");
    // steps keep input order: timestamps never decrease
    assert!(steps.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}

#[test]
fn test_window_switch_mid_typing_yields_two_runs() {
    let events = vec![
        key(0, "Slack", "h"),
        key(1, "Slack", "e"),
        key(2, "Slack", "y"),
        key(3, "Browser", "w"),
        key(4, "Browser", "o"),
    ];

    let steps = segment(&events, &SegmenterConfig::default());
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0].window, "Slack");
    assert_eq!(steps[0].keys.as_ref().unwrap().len(), 3);
    assert_eq!(steps[0].timestamp, ts(0));
    assert_eq!(steps[1].window, "Browser");
    assert_eq!(steps[1].summary, "Typed: w o in Browser");
}

// ============================================================================
// Threshold Behavior
// ============================================================================

#[test]
fn test_two_repeats_silent_three_repeats_flagged() {
    let twice = vec![click(0, "Excel", "Bold"), click(1, "Excel", "Bold")];
    assert!(detect_patterns(&twice, &PatternConfig::default()).is_empty());

    let mut thrice = twice.clone();
    thrice.push(click(2, "Excel", "Bold"));
    let findings = detect_patterns(&thrice, &PatternConfig::default());
    assert_eq!(findings.len(), 1);
    assert!(findings[0].render().contains("(3 times)"));
}

#[test]
fn test_click_and_key_with_same_detail_share_action_key() {
    // action keys are (window, detail) pairs regardless of event kind, so
    // a click labeled "Save" and a key token "Save" pool their counts
    let events = vec![
        click(0, "Excel", "Save"),
        key(1, "Excel", "Save"),
        click(2, "Excel", "Save"),
    ];
    let findings = detect_patterns(&events, &PatternConfig::default());
    assert_eq!(
        findings,
        vec![PatternFinding::RepeatedAction {
            window: "Excel".to_string(),
            detail: "Save".to_string(),
            count: 3,
        }]
    );
}

// ============================================================================
// Robustness
// ============================================================================

#[test]
fn test_segmentation_is_idempotent() {
    let events = vec![
        click(0, "Excel", "Save"),
        key(1, "Excel", "H"),
        key(2, "Excel", "i"),
        click(3, "Browser", "Search"),
        key(4, "Browser", "Enter"),
    ];
    let first = segment(&events, &SegmenterConfig::default());
    let second = segment(&events, &SegmenterConfig::default());
    assert_eq!(first, second);
}

#[test]
fn test_detection_is_idempotent() {
    let events = vec![
        click(0, "Excel", "Save"),
        click(1, "Excel", "Save"),
        click(2, "Excel", "Save"),
        key(3, "Browser", "Enter"),
    ];
    let first = detect_patterns(&events, &PatternConfig::default());
    let second = detect_patterns(&events, &PatternConfig::default());
    assert_eq!(first, second);
}

#[test]
fn test_all_unknown_windows_yield_no_cross_app() {
    let events = vec![
        RawEvent::key_press(ts(0), "Unknown", "a"),
        RawEvent::key_press(ts(1), "unknown", "a"),
        RawEvent::key_press(ts(2), "Unknown", "a"),
    ];
    let findings = detect_patterns(&events, &PatternConfig::default());
    // the repeated key still counts; the window set does not
    assert_eq!(findings.len(), 1);
    assert!(matches!(
        findings[0],
        PatternFinding::RepeatedAction { count: 3, .. }
    ));
}

#[test]
fn test_foreign_event_kinds_pass_through() {
    let json = r#"[
        {"timestamp":"2025-06-01T12:00:00Z","type":"window_focus","window":"Excel"},
        {"timestamp":"2025-06-01T12:00:01Z","type":"key_press","window":"Excel","key":"a"},
        {"timestamp":"2025-06-01T12:00:02Z","type":"pen_input","window":"Excel"}
    ]"#;
    let events: Vec<RawEvent> = serde_json::from_str(json).unwrap();

    let steps = segment(&events, &SegmenterConfig::default());
    assert_eq!(steps.len(), 3);
    assert_eq!(steps[0].summary, "window_focus recorded");
    assert_eq!(steps[1].summary, "Typed: a in Excel");
    assert_eq!(steps[2].summary, "pen_input recorded");
}
