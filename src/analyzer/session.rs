//! Session Summaries
//!
//! Assembles everything a recorded session produced into one snapshot
//! document: raw events, screenshot inventory, audio transcripts, and the
//! segmented workflow steps. The snapshot is what gets persisted as
//! `workflow_<session>.json` and what the LLM prompt is built from.

use super::patterns::{detect_patterns, PatternConfig, PatternFinding};
use super::segmenter::{segment, SegmenterConfig, WorkflowStep};
use crate::capture::types::RawEvent;
use crate::store::DataStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Counts of what a session captured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTotals {
    pub total_events: usize,
    pub total_screenshots: usize,
    pub total_transcripts: usize,
}

/// One audio transcript produced by the external audio recorder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transcript {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_file: Option<String>,
    pub transcript: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Snapshot of one recorded session, ready for prompting or archiving.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Unique id of this snapshot (a session can be re-analyzed)
    pub id: Uuid,
    pub session_id: String,
    #[serde(rename = "timestamp")]
    pub generated_at: DateTime<Utc>,
    pub summary: SessionTotals,
    pub events: Vec<RawEvent>,
    pub screenshots: Vec<String>,
    pub transcripts: Vec<Transcript>,
    pub workflow_steps: Vec<WorkflowStep>,
}

impl SessionSummary {
    /// Write the snapshot as pretty JSON, replacing any previous snapshot
    /// at the same path.
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        debug!(path = %path.display(), "session summary saved");
        Ok(())
    }

    pub fn load(path: &Path) -> crate::Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}

/// Turns a session's stored captures into a [`SessionSummary`] and pattern
/// findings.
pub struct ActivityAnalyzer {
    store: DataStore,
    segmenter: SegmenterConfig,
    patterns: PatternConfig,
}

impl ActivityAnalyzer {
    pub fn new(store: DataStore) -> Self {
        Self {
            store,
            segmenter: SegmenterConfig::default(),
            patterns: PatternConfig::default(),
        }
    }

    pub fn with_segmenter(mut self, config: SegmenterConfig) -> Self {
        self.segmenter = config;
        self
    }

    pub fn with_patterns(mut self, config: PatternConfig) -> Self {
        self.patterns = config;
        self
    }

    /// Build the snapshot for `session`, or for the latest recorded session
    /// when `None`.
    ///
    /// A session with no stored captures is not an error: the snapshot
    /// simply reports zero totals and no steps.
    pub fn generate(&self, session: Option<&str>) -> crate::Result<SessionSummary> {
        let session_id = match session {
            Some(id) => id.to_string(),
            None => self
                .store
                .latest_session()?
                .unwrap_or_else(DataStore::new_session_id),
        };

        let events = self.load_events(&session_id);
        let screenshots: Vec<String> = self
            .store
            .screenshots()?
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        let transcripts = self.load_transcripts();
        let workflow_steps = segment(&events, &self.segmenter);

        info!(
            session = %session_id,
            events = events.len(),
            steps = workflow_steps.len(),
            "session analyzed"
        );

        Ok(SessionSummary {
            id: Uuid::new_v4(),
            session_id,
            generated_at: Utc::now(),
            summary: SessionTotals {
                total_events: events.len(),
                total_screenshots: screenshots.len(),
                total_transcripts: transcripts.len(),
            },
            events,
            screenshots,
            transcripts,
            workflow_steps,
        })
    }

    /// Pattern findings for a raw event log.
    pub fn findings(&self, events: &[RawEvent]) -> Vec<PatternFinding> {
        detect_patterns(events, &self.patterns)
    }

    fn load_events(&self, session: &str) -> Vec<RawEvent> {
        match self.store.event_store(session).load() {
            Ok(events) => events,
            Err(e) => {
                warn!(session, "event log unreadable: {e}");
                Vec::new()
            }
        }
    }

    /// Load `transcript_*.json` files from the audio directory, in name
    /// order. Unreadable files are skipped with a warning.
    fn load_transcripts(&self) -> Vec<Transcript> {
        let dir = self.store.audio_dir();
        let Ok(entries) = std::fs::read_dir(&dir) else {
            return Vec::new();
        };

        let mut paths: Vec<_> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("transcript_") && n.ends_with(".json"))
            })
            .collect();
        paths.sort();

        let mut transcripts = Vec::new();
        for path in paths {
            match std::fs::read_to_string(&path)
                .map_err(crate::Error::from)
                .and_then(|data| Ok(serde_json::from_str::<Transcript>(&data)?))
            {
                Ok(transcript) => transcripts.push(transcript),
                Err(e) => warn!(path = %path.display(), "skipping transcript: {e}"),
            }
        }
        transcripts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn seeded_store(dir: &Path) -> DataStore {
        let store = DataStore::new(dir);
        store.ensure_dirs().unwrap();
        store
    }

    #[test]
    fn test_generate_for_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path());
        let analyzer = ActivityAnalyzer::new(store);

        let summary = analyzer.generate(None).unwrap();
        assert_eq!(summary.summary, SessionTotals::default());
        assert!(summary.events.is_empty());
        assert!(summary.workflow_steps.is_empty());
        assert!(!summary.session_id.is_empty());
    }

    #[test]
    fn test_generate_collects_all_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path());

        let events = vec![
            RawEvent::mouse_click(ts(), "Excel", 1, 2, "Button.left").with_clicked_element("Save"),
            RawEvent::key_press(ts(), "Excel", "H"),
            RawEvent::key_press(ts(), "Excel", "i"),
        ];
        store.event_store("s1").append_batch(&events).unwrap();
        std::fs::write(
            store.screenshots_dir().join("screenshot_2025-06-01_12-00-00.png"),
            b"png",
        )
        .unwrap();
        std::fs::write(
            store.audio_dir().join("transcript_001.json"),
            r#"{"transcript":"open the report","audio_file":"a.wav"}"#,
        )
        .unwrap();
        std::fs::write(store.audio_dir().join("transcript_002.json"), "broken").unwrap();

        let analyzer = ActivityAnalyzer::new(store);
        let summary = analyzer.generate(Some("s1")).unwrap();

        assert_eq!(summary.session_id, "s1");
        assert_eq!(summary.summary.total_events, 3);
        assert_eq!(summary.summary.total_screenshots, 1);
        assert_eq!(summary.summary.total_transcripts, 1);
        assert_eq!(summary.transcripts[0].transcript, "open the report");
        assert_eq!(summary.workflow_steps.len(), 2);
        assert_eq!(summary.workflow_steps[1].summary, "Typed: H i in Excel");
    }

    #[test]
    fn test_generate_defaults_to_latest_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path());

        store
            .event_store("20250601_090000")
            .append_batch(&[RawEvent::key_press(ts(), "Excel", "a")])
            .unwrap();
        store
            .event_store("20250602_090000")
            .append_batch(&[RawEvent::key_press(ts(), "Word", "b")])
            .unwrap();

        let analyzer = ActivityAnalyzer::new(store);
        let summary = analyzer.generate(None).unwrap();
        assert_eq!(summary.session_id, "20250602_090000");
        assert_eq!(summary.events[0].window, "Word");
    }

    #[test]
    fn test_save_replaces_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path());
        let path = store.workflow_path("s1");

        store
            .event_store("s1")
            .append_batch(&[RawEvent::key_press(ts(), "Excel", "a")])
            .unwrap();

        let analyzer = ActivityAnalyzer::new(store);
        let first = analyzer.generate(Some("s1")).unwrap();
        first.save(&path).unwrap();
        let second = analyzer.generate(Some("s1")).unwrap();
        second.save(&path).unwrap();

        let loaded = SessionSummary::load(&path).unwrap();
        assert_eq!(loaded.id, second.id);
        assert_ne!(loaded.id, first.id);
        assert_eq!(loaded.summary.total_events, 1);
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path());
        let path = dir.path().join("workflow_s1.json");

        let events = vec![
            RawEvent::mouse_click(ts(), "Excel", 1, 2, "Button.left").with_clicked_element("Save"),
        ];
        store.event_store("s1").append_batch(&events).unwrap();

        let summary = ActivityAnalyzer::new(store).generate(Some("s1")).unwrap();
        summary.save(&path).unwrap();
        let loaded = SessionSummary::load(&path).unwrap();

        assert_eq!(loaded.session_id, summary.session_id);
        assert_eq!(loaded.events, summary.events);
        assert_eq!(loaded.workflow_steps, summary.workflow_steps);
    }

    #[test]
    fn test_findings_delegates_to_pattern_config() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path());
        let analyzer = ActivityAnalyzer::new(store).with_patterns(PatternConfig {
            repeat_threshold: 2,
            ..Default::default()
        });

        let events = vec![
            RawEvent::key_press(ts(), "Excel", "Enter"),
            RawEvent::key_press(ts(), "Excel", "Enter"),
        ];
        let findings = analyzer.findings(&events);
        assert_eq!(findings.len(), 1);
    }
}
