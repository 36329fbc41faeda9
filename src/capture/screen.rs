//! Periodic Screen Capture
//!
//! Captures the primary monitor at a fixed interval and writes timestamped
//! PNG files into the session's screenshot directory. Capture failures are
//! logged and skipped; a misbehaving compositor must not take the recording
//! session down with it.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, warn};
use xcap::Monitor;

/// Lifecycle state of a [`ScreenRecorder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderStatus {
    Stopped,
    Recording,
    Paused,
}

/// Periodic screenshot recorder.
pub struct ScreenRecorder {
    output_dir: PathBuf,
    interval: Duration,
    running: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    handle: Option<JoinHandle<u64>>,
}

impl ScreenRecorder {
    /// Create a recorder writing into `output_dir` every `interval`.
    pub fn new(output_dir: impl Into<PathBuf>, interval: Duration) -> Self {
        Self {
            output_dir: output_dir.into(),
            interval,
            running: Arc::new(AtomicBool::new(false)),
            paused: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    /// Current lifecycle state.
    pub fn status(&self) -> RecorderStatus {
        if !self.running.load(Ordering::SeqCst) {
            RecorderStatus::Stopped
        } else if self.paused.load(Ordering::SeqCst) {
            RecorderStatus::Paused
        } else {
            RecorderStatus::Recording
        }
    }

    /// Start the capture loop.
    pub fn start(&mut self) -> crate::Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(crate::Error::Screen("screen recorder already running".into()));
        }
        std::fs::create_dir_all(&self.output_dir)?;
        self.paused.store(false, Ordering::SeqCst);

        let output_dir = self.output_dir.clone();
        let interval = self.interval;
        let running = Arc::clone(&self.running);
        let paused = Arc::clone(&self.paused);

        self.handle = Some(std::thread::spawn(move || {
            let mut captured: u64 = 0;
            while running.load(Ordering::SeqCst) {
                if paused.load(Ordering::SeqCst) {
                    std::thread::sleep(Duration::from_millis(500));
                    continue;
                }

                match capture_primary(&output_dir) {
                    Ok(path) => {
                        captured += 1;
                        debug!(path = %path.display(), "captured screenshot");
                    }
                    Err(e) => warn!("screenshot failed: {e}"),
                }

                // sleep in short ticks so stop() stays responsive
                let mut remaining = interval;
                while running.load(Ordering::SeqCst) && !remaining.is_zero() {
                    let tick = remaining.min(Duration::from_millis(100));
                    std::thread::sleep(tick);
                    remaining = remaining.saturating_sub(tick);
                }
            }
            captured
        }));

        debug!(dir = %self.output_dir.display(), "screen recorder started");
        Ok(())
    }

    /// Pause capture without stopping the loop.
    pub fn pause(&self) {
        if self.running.load(Ordering::SeqCst) {
            self.paused.store(true, Ordering::SeqCst);
        }
    }

    /// Resume a paused recorder.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    /// Stop the capture loop and return the number of screenshots taken.
    pub fn stop(&mut self) -> u64 {
        if !self.running.swap(false, Ordering::SeqCst) {
            return 0;
        }
        let captured = self
            .handle
            .take()
            .and_then(|h| h.join().ok())
            .unwrap_or_default();
        debug!(captured, "screen recorder stopped");
        captured
    }
}

/// Capture the primary monitor into a timestamped PNG under `dir`.
fn capture_primary(dir: &std::path::Path) -> crate::Result<PathBuf> {
    let monitors =
        Monitor::all().map_err(|e| crate::Error::Screen(format!("monitor enumeration: {e}")))?;
    let monitor = monitors
        .into_iter()
        .next()
        .ok_or_else(|| crate::Error::Screen("no monitor available".into()))?;

    let image = monitor
        .capture_image()
        .map_err(|e| crate::Error::Screen(format!("capture: {e}")))?;

    let filename = format!(
        "screenshot_{}.png",
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let path = dir.join(filename);
    image
        .save(&path)
        .map_err(|e| crate::Error::Screen(format!("save {}: {e}", path.display())))?;
    Ok(path)
}
