//! User-facing output sink.
//!
//! Library code never prints. Everything a user should see goes through an
//! [`Output`] so the CLI can render it for a terminal or as JSON.

use std::sync::Mutex;

/// Severity of an output event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Warning,
    Failure,
    Info,
}

/// Emitters consumed by the installer, remover and action runner.
pub trait Output {
    /// Emit a single line at `level`.
    fn emit(&self, level: Level, message: &str);

    /// Attach a structured payload (e.g. an install result) for JSON mode.
    ///
    /// Terminal renderers ignore payloads.
    fn payload(&self, _kind: &str, _value: &serde_json::Value) {}

    fn success(&self, message: &str) {
        self.emit(Level::Success, message);
    }

    fn warning(&self, message: &str) {
        self.emit(Level::Warning, message);
    }

    fn failure(&self, message: &str) {
        self.emit(Level::Failure, message);
    }

    fn info(&self, message: &str) {
        self.emit(Level::Info, message);
    }
}

/// Output that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullOutput;

impl Output for NullOutput {
    fn emit(&self, _level: Level, _message: &str) {}
}

/// Output that records every event in memory.
#[derive(Debug, Default)]
pub struct RecordingOutput {
    events: Mutex<Vec<(Level, String)>>,
}

impl RecordingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events in emission order.
    pub fn events(&self) -> Vec<(Level, String)> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Messages recorded at `level`.
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m)
            .collect()
    }

    /// Every message joined by newlines, regardless of level.
    pub fn text(&self) -> String {
        self.events()
            .into_iter()
            .map(|(_, m)| m)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Output for RecordingOutput {
    fn emit(&self, level: Level, message: &str) {
        if let Ok(mut events) = self.events.lock() {
            events.push((level, message.to_string()));
        }
    }
}
