//! Session Data Storage
//!
//! Owns the on-disk layout of recorded sessions:
//!
//! ```text
//! <data root>/
//! ├── events/                          per-session event logs
//! │   └── events_<session>.json
//! ├── screenshots/                     periodic captures
//! │   └── screenshot_<ts>.png
//! ├── audio/                           transcripts from the audio recorder
//! │   └── transcript_<ts>.json
//! ├── workflow_<session>.json          analysis output
//! ├── timeline_<session>.txt
//! └── automation_suggestions_<session>.txt
//! ```
//!
//! Event logs are JSON arrays. Appending rewrites the whole file, which
//! keeps the log loadable by anything that reads plain JSON; flush batching
//! in the capture layer keeps the rewrite frequency low.

use crate::capture::types::RawEvent;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Append-oriented store for one session's event log.
#[derive(Debug, Clone)]
pub struct EventStore {
    path: PathBuf,
}

impl EventStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the full event log. A missing file is an empty log.
    pub fn load(&self) -> crate::Result<Vec<RawEvent>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = std::fs::read_to_string(&self.path)?;
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&data)?)
    }

    /// Append a batch of events, preserving everything already on disk.
    pub fn append_batch(&self, batch: &[RawEvent]) -> crate::Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut events = self.load().unwrap_or_else(|e| {
            warn!("event log unreadable, starting fresh: {e}");
            Vec::new()
        });
        events.extend_from_slice(batch);

        let json = serde_json::to_string_pretty(&events)?;
        std::fs::write(&self.path, json)?;
        debug!(total = events.len(), path = %self.path.display(), "event log written");
        Ok(())
    }
}

/// The session data root and everything laid out under it.
#[derive(Debug, Clone)]
pub struct DataStore {
    root: PathBuf,
}

impl DataStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Default data root: `~/.deskflow/data`, or `./data` when the home
    /// directory cannot be resolved.
    pub fn default_root() -> PathBuf {
        dirs::home_dir()
            .map(|home| home.join(".deskflow").join("data"))
            .unwrap_or_else(|| PathBuf::from("data"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn events_dir(&self) -> PathBuf {
        self.root.join("events")
    }

    pub fn screenshots_dir(&self) -> PathBuf {
        self.root.join("screenshots")
    }

    pub fn audio_dir(&self) -> PathBuf {
        self.root.join("audio")
    }

    /// Create the data root and its capture subdirectories.
    pub fn ensure_dirs(&self) -> crate::Result<()> {
        std::fs::create_dir_all(self.events_dir())?;
        std::fs::create_dir_all(self.screenshots_dir())?;
        std::fs::create_dir_all(self.audio_dir())?;
        Ok(())
    }

    /// Mint a new session identifier from the local wall clock.
    pub fn new_session_id() -> String {
        chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
    }

    /// Event store for one session.
    pub fn event_store(&self, session: &str) -> EventStore {
        EventStore::new(self.events_dir().join(format!("events_{session}.json")))
    }

    /// All recorded session ids, sorted ascending (timestamp ids sort
    /// chronologically).
    pub fn list_sessions(&self) -> crate::Result<Vec<String>> {
        let events_dir = self.events_dir();
        if !events_dir.exists() {
            return Ok(Vec::new());
        }
        let mut sessions = Vec::new();
        for entry in std::fs::read_dir(&events_dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(session) = name
                .strip_prefix("events_")
                .and_then(|rest| rest.strip_suffix(".json"))
            {
                sessions.push(session.to_string());
            }
        }
        sessions.sort();
        Ok(sessions)
    }

    /// Most recently recorded session, if any.
    pub fn latest_session(&self) -> crate::Result<Option<String>> {
        Ok(self.list_sessions()?.pop())
    }

    pub fn workflow_path(&self, session: &str) -> PathBuf {
        self.root.join(format!("workflow_{session}.json"))
    }

    pub fn timeline_path(&self, session: &str) -> PathBuf {
        self.root.join(format!("timeline_{session}.txt"))
    }

    pub fn suggestions_path(&self, session: &str) -> PathBuf {
        self.root
            .join(format!("automation_suggestions_{session}.txt"))
    }

    /// Screenshot paths in capture order.
    pub fn screenshots(&self) -> crate::Result<Vec<PathBuf>> {
        let dir = self.screenshots_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut shots = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            let is_shot = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("screenshot_") && n.ends_with(".png"));
            if is_shot {
                shots.push(path);
            }
        }
        shots.sort();
        Ok(shots)
    }

    /// Delete every capture subdirectory and loose analysis file under the
    /// data root. Returns the number of loose files removed.
    pub fn clear_all(&self) -> crate::Result<usize> {
        if !self.root.exists() {
            return Ok(0);
        }

        for dir in [self.events_dir(), self.screenshots_dir(), self.audio_dir()] {
            if dir.exists() {
                std::fs::remove_dir_all(&dir)?;
                debug!(dir = %dir.display(), "deleted");
            }
        }

        let mut deleted = 0;
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.path().is_file() {
                std::fs::remove_file(entry.path())?;
                deleted += 1;
            }
        }
        Ok(deleted)
    }
}
