//! Session analysis
//!
//! The analysis core: event segmentation into workflow steps, pattern
//! mining for automation opportunities, and session snapshot assembly.
//! `segmenter` and `patterns` are pure; all I/O lives in `session`.

pub mod patterns;
pub mod segmenter;
pub mod session;

pub use patterns::{detect_patterns, PatternConfig, PatternFinding};
pub use segmenter::{segment, ClickDetail, ClickLocation, SegmenterConfig, WorkflowStep};
pub use session::{ActivityAnalyzer, SessionSummary, SessionTotals, Transcript};
