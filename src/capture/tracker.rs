//! Input Event Tracking
//!
//! Captures mouse clicks, key presses, and scrolls through a global `rdev`
//! hook. The hook callback resolves the foreground window and the UI
//! element under the pointer (both through injectable providers, since the
//! platform lookup is an external collaborator), renders modifier combos
//! into readable shortcut strings, and pushes complete [`RawEvent`]s into a
//! lock-free ring buffer. A collector thread drains the buffer and appends
//! to the session event log in batches.

use super::ring_buffer::{EventConsumer, EventRingBuffer, DEFAULT_CAPACITY};
use super::types::{RawEvent, UiElement, UNKNOWN_WINDOW};
use crate::store::EventStore;
use chrono::Utc;
use rdev::{Button, EventType, Key};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, warn};

/// Resolves the foreground window title at capture time.
pub trait WindowProvider: Send + Sync {
    /// The current foreground window title, or `None` if unavailable.
    fn active_window(&self) -> Option<String>;
}

/// Resolves the UI element under a screen point at capture time.
pub trait ElementResolver: Send + Sync {
    /// Descriptor of the element at `(x, y)`, or `None` if unavailable.
    fn element_at(&self, x: i32, y: i32) -> Option<UiElement>;
}

/// Event tracker configuration
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Ring buffer capacity between hook and collector
    pub ring_capacity: usize,
    /// Flush the event log after this many buffered events
    pub flush_every_events: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            ring_capacity: DEFAULT_CAPACITY,
            flush_every_events: 50,
        }
    }
}

/// Pressed-modifier state, tracked across hook callbacks.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct ModifierState {
    ctrl: bool,
    alt: bool,
    shift: bool,
}

impl ModifierState {
    pub(crate) fn press(&mut self, name: &str) {
        match name {
            "Ctrl" => self.ctrl = true,
            "Alt" => self.alt = true,
            "Shift" => self.shift = true,
            _ => {}
        }
    }

    pub(crate) fn release(&mut self, name: &str) {
        match name {
            "Ctrl" => self.ctrl = false,
            "Alt" => self.alt = false,
            "Shift" => self.shift = false,
            _ => {}
        }
    }

    pub(crate) fn any(&self) -> bool {
        self.ctrl || self.alt || self.shift
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }

    fn names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.ctrl {
            names.push("Ctrl");
        }
        if self.alt {
            names.push("Alt");
        }
        if self.shift {
            names.push("Shift");
        }
        names
    }
}

/// Map a key to its modifier group name, if it is a modifier.
pub(crate) fn modifier_name(key: &Key) -> Option<&'static str> {
    match key {
        Key::ControlLeft | Key::ControlRight => Some("Ctrl"),
        Key::Alt | Key::AltGr => Some("Alt"),
        Key::ShiftLeft | Key::ShiftRight => Some("Shift"),
        _ => None,
    }
}

/// Render a non-modifier key into a token.
///
/// Prefers the unicode text reported by the hook (filtering control
/// characters the OS emits for Ctrl combos); falls back to a readable name
/// derived from the key code.
pub(crate) fn key_token(key: &Key, name: Option<&str>) -> Option<String> {
    if matches!(key, Key::Space) {
        return Some("Space".to_string());
    }
    if let Some(name) = name {
        let printable: String = name.chars().filter(|c| !c.is_control()).collect();
        if !printable.is_empty() {
            return Some(printable);
        }
    }
    let token = match key {
        Key::Return => "Enter".to_string(),
        Key::Escape => "Esc".to_string(),
        Key::Backspace => "Backspace".to_string(),
        Key::Tab => "Tab".to_string(),
        Key::Delete => "Delete".to_string(),
        Key::UpArrow => "Up".to_string(),
        Key::DownArrow => "Down".to_string(),
        Key::LeftArrow => "Left".to_string(),
        Key::RightArrow => "Right".to_string(),
        other => {
            // Debug names look like "KeyA" / "Num1" / "F5"
            let name = format!("{other:?}");
            name.strip_prefix("Key").unwrap_or(&name).to_string()
        }
    };
    Some(token)
}

/// Friendly names for common shortcuts, appended to the rendered combo
/// (e.g. "Ctrl + C Copy").
fn shortcut_action(normalized: &str) -> Option<&'static str> {
    match normalized {
        "Ctrl+A" => Some("Select All"),
        "Ctrl+C" => Some("Copy"),
        "Ctrl+V" => Some("Paste"),
        "Ctrl+X" => Some("Cut"),
        "Ctrl+Z" => Some("Undo"),
        "Ctrl+Y" => Some("Redo"),
        "Alt+Tab" => Some("Switch tab"),
        "Ctrl+N" => Some("New"),
        "Ctrl+O" => Some("Open"),
        _ => None,
    }
}

/// Render a modifier combo like "Ctrl + C Copy" or "Ctrl + Shift + T".
pub(crate) fn render_combo(modifiers: &ModifierState, token: &str) -> String {
    let token = if token.len() == 1 && token.chars().all(|c| c.is_ascii_alphabetic()) {
        token.to_ascii_uppercase()
    } else {
        token.to_string()
    };

    let mut parts = modifiers.names();
    parts.push(&token);
    let combo = parts.join(" + ");

    match shortcut_action(&combo.replace(' ', "")) {
        Some(action) => format!("{combo} {action}"),
        None => combo,
    }
}

/// Wire name of a mouse button.
pub(crate) fn button_name(button: &Button) -> String {
    match button {
        Button::Left => "Button.left".to_string(),
        Button::Right => "Button.right".to_string(),
        Button::Middle => "Button.middle".to_string(),
        Button::Unknown(code) => format!("Button.unknown({code})"),
    }
}

/// Captures input events for one session.
///
/// The global hook installed by [`start`](Self::start) cannot be removed
/// again (`rdev::listen` has no stop API), so a tracker starts at most
/// once per process; after [`stop`](Self::stop) a second `start` returns
/// an error instead of stacking a second live listener.
pub struct EventTracker {
    config: TrackerConfig,
    store: EventStore,
    windows: Option<Arc<dyn WindowProvider>>,
    elements: Option<Arc<dyn ElementResolver>>,
    running: Arc<AtomicBool>,
    events_written: Arc<AtomicU64>,
    collector: Option<JoinHandle<()>>,
    hook_installed: bool,
}

impl EventTracker {
    /// Create a tracker that appends to the given session event log.
    pub fn new(store: EventStore, config: TrackerConfig) -> Self {
        Self {
            config,
            store,
            windows: None,
            elements: None,
            running: Arc::new(AtomicBool::new(false)),
            events_written: Arc::new(AtomicU64::new(0)),
            collector: None,
            hook_installed: false,
        }
    }

    /// Inject a foreground-window provider.
    pub fn with_window_provider(mut self, provider: Arc<dyn WindowProvider>) -> Self {
        self.windows = Some(provider);
        self
    }

    /// Inject a UI-element resolver.
    pub fn with_element_resolver(mut self, resolver: Arc<dyn ElementResolver>) -> Self {
        self.elements = Some(resolver);
        self
    }

    /// Number of events flushed to the event log so far.
    pub fn events_written(&self) -> u64 {
        self.events_written.load(Ordering::Relaxed)
    }

    /// Start the input hook and the collector thread.
    ///
    /// Fails if the tracker was already started, even after `stop`: the
    /// stopped hook stays installed, and reviving its running flag while a
    /// second hook pushes into a fresh ring would interleave two listeners.
    pub fn start(&mut self) -> crate::Result<()> {
        if self.hook_installed {
            return Err(crate::Error::Capture(
                "event tracker already started; the input hook cannot be reinstalled in this process"
                    .into(),
            ));
        }
        self.hook_installed = true;
        self.running.store(true, Ordering::SeqCst);

        let (producer, consumer) = EventRingBuffer::with_capacity(self.config.ring_capacity);

        self.spawn_hook(producer);
        self.collector = Some(self.spawn_collector(consumer));

        debug!("event tracker started");
        Ok(())
    }

    /// Stop tracking and flush any buffered events.
    ///
    /// The hook thread itself cannot be joined (`rdev::listen` has no stop
    /// API); it stays parked but discards every event once the running flag
    /// clears.
    pub fn stop(&mut self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("event tracker not running");
            return;
        }
        if let Some(handle) = self.collector.take() {
            if handle.join().is_err() {
                warn!("event collector thread panicked");
            }
        }
        debug!(events = self.events_written(), "event tracker stopped");
    }

    fn spawn_hook(&self, mut producer: super::ring_buffer::EventProducer) {
        let running = Arc::clone(&self.running);
        let windows = self.windows.clone();
        let elements = self.elements.clone();

        std::thread::spawn(move || {
            let mut modifiers = ModifierState::default();
            let mut last_pos: (i32, i32) = (0, 0);

            let active_window = move |windows: &Option<Arc<dyn WindowProvider>>| -> String {
                windows
                    .as_ref()
                    .and_then(|w| w.active_window())
                    .filter(|title| !title.is_empty())
                    .unwrap_or_else(|| UNKNOWN_WINDOW.to_string())
            };

            let result = rdev::listen(move |event: rdev::Event| {
                if !running.load(Ordering::SeqCst) {
                    return;
                }

                match event.event_type {
                    EventType::MouseMove { x, y } => {
                        // movement is tracked for click/scroll coordinates
                        // but never recorded as an event
                        last_pos = (x.round() as i32, y.round() as i32);
                    }
                    EventType::ButtonPress(button) => {
                        let (x, y) = last_pos;
                        let mut raw = RawEvent::mouse_click(
                            Utc::now(),
                            active_window(&windows),
                            x,
                            y,
                            button_name(&button),
                        );
                        if let Some(element) =
                            elements.as_ref().and_then(|e| e.element_at(x, y))
                        {
                            if let Some(label) = element.friendly_label() {
                                raw = raw.with_clicked_element(label);
                            }
                            raw = raw.with_element(element);
                        }
                        if raw.clicked_element.is_none() {
                            raw = raw.with_clicked_element(format!("Position({x}, {y})"));
                        }
                        producer.push(raw);
                    }
                    EventType::Wheel { delta_x, delta_y } => {
                        let (x, y) = last_pos;
                        producer.push(RawEvent::mouse_scroll(
                            Utc::now(),
                            active_window(&windows),
                            x,
                            y,
                            delta_x as i32,
                            delta_y as i32,
                        ));
                    }
                    EventType::KeyPress(key) => {
                        if let Some(name) = modifier_name(&key) {
                            modifiers.press(name);
                            return;
                        }
                        let Some(token) = key_token(&key, event.name.as_deref()) else {
                            return;
                        };
                        let key_str = if modifiers.any() {
                            let combo = render_combo(&modifiers, &token);
                            modifiers.clear();
                            combo
                        } else {
                            token
                        };
                        producer.push(RawEvent::key_press(
                            Utc::now(),
                            active_window(&windows),
                            key_str,
                        ));
                    }
                    EventType::KeyRelease(key) => {
                        if let Some(name) = modifier_name(&key) {
                            modifiers.release(name);
                        }
                    }
                    EventType::ButtonRelease(_) => {}
                }
            });

            if let Err(e) = result {
                warn!("input hook failed: {e:?}");
            }
        });
    }

    fn spawn_collector(&self, mut consumer: EventConsumer) -> JoinHandle<()> {
        let running = Arc::clone(&self.running);
        let store = self.store.clone();
        let flush_every = self.config.flush_every_events.max(1);
        let events_written = Arc::clone(&self.events_written);

        std::thread::spawn(move || {
            let mut buffer: Vec<RawEvent> = Vec::with_capacity(flush_every);

            let flush = |buffer: &mut Vec<RawEvent>| {
                if buffer.is_empty() {
                    return;
                }
                match store.append_batch(buffer) {
                    Ok(()) => {
                        events_written.fetch_add(buffer.len() as u64, Ordering::Relaxed);
                        debug!(count = buffer.len(), "flushed events");
                    }
                    Err(e) => warn!("failed to flush events: {e}"),
                }
                buffer.clear();
            };

            loop {
                buffer.extend(consumer.pop_batch(256));
                if buffer.len() >= flush_every {
                    flush(&mut buffer);
                }
                if !running.load(Ordering::SeqCst) {
                    // drain whatever the hook pushed before it went quiet
                    loop {
                        let batch = consumer.pop_batch(256);
                        if batch.is_empty() {
                            break;
                        }
                        buffer.extend(batch);
                    }
                    flush(&mut buffer);
                    let (pushed, dropped, consumed) = consumer.stats();
                    debug!(pushed, dropped, consumed, "collector exiting");
                    break;
                }
                std::thread::sleep(Duration::from_millis(10));
            }
        })
    }
}
