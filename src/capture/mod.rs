//! Event and screen capture
//!
//! Everything that records a session: the raw event schema, the lock-free
//! ring buffer between hook and collector, the input tracker, and the
//! periodic screen recorder.

pub mod ring_buffer;
pub mod screen;
pub mod tracker;
pub mod types;

pub use ring_buffer::{EventConsumer, EventProducer, EventRingBuffer, DEFAULT_CAPACITY};
pub use screen::{RecorderStatus, ScreenRecorder};
pub use tracker::{ElementResolver, EventTracker, TrackerConfig, WindowProvider};
pub use types::{EventKind, RawEvent, UiElement, UNKNOWN_WINDOW};
