//! # deskflow
//!
//! A desktop activity recorder that transforms raw user interaction
//! telemetry into readable workflow summaries and automation suggestions.
//!
//! ## Overview
//!
//! deskflow captures mouse clicks, key presses, and scroll events through a
//! global input hook, tagged with the foreground window and optional
//! UI-element metadata, alongside periodic screenshots. A recorded session
//! is then analyzed in two ways: the segmenter coalesces the raw event log
//! into a compact sequence of workflow steps, and the pattern miner surfaces
//! repeated actions and cross-application workflows. Both outputs feed a
//! local Ollama model that produces free-form automation suggestions.
//!
//! ## Architecture
//!
//! - [`capture`]: input hook, ring buffer, and periodic screen capture
//! - [`analyzer`]: event segmentation, pattern mining, session summaries
//! - [`store`]: session-scoped data directories and event logs
//! - [`llm`]: Ollama client and timeline prompt construction
//! - [`app`]: CLI and configuration management
//!
//! ## Event Pipeline
//!
//! ```text
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │  Input Hook │───▶│ Ring Buffer │───▶│  Collector  │───▶│  Event Log  │
//! │   (rdev)    │    │ (lock-free) │    │   Thread    │    │  (session)  │
//! └─────────────┘    └─────────────┘    └─────────────┘    └─────────────┘
//!                                                                 │
//!                                                                 ▼
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │ Suggestions │◀───│   Ollama    │◀───│  Segmenter  │◀───│   Session   │
//! │   Output    │    │   Client    │    │ + Patterns  │    │   Snapshot  │
//! └─────────────┘    └─────────────┘    └─────────────┘    └─────────────┘
//! ```
//!
//! The analysis core ([`segment`] and [`detect_patterns`]) is pure and
//! total: it performs no I/O, never fails, and degrades gracefully on
//! partially populated events.

pub mod analyzer;
pub mod app;
pub mod capture;
pub mod llm;
pub mod store;

// Re-export commonly used types
pub use analyzer::patterns::{detect_patterns, PatternConfig, PatternFinding};
pub use analyzer::segmenter::{segment, SegmenterConfig, WorkflowStep};
pub use analyzer::session::{ActivityAnalyzer, SessionSummary};
pub use capture::types::{EventKind, RawEvent, UiElement, UNKNOWN_WINDOW};
pub use store::DataStore;

/// Result type alias for deskflow
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for deskflow
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Event capture error: {0}")]
    Capture(String),

    #[error("Screen capture error: {0}")]
    Screen(String),

    #[error("Storage error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
