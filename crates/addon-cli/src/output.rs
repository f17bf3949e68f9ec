//! Terminal and JSON renderers for the library's output events.

use std::io::Write;

use addon_core::output::{Level, Output};
use colored::Colorize;
use serde_json::json;

/// Colored, human-readable lines. Warnings and failures go to stderr.
#[derive(Debug, Default)]
pub struct TerminalOutput;

impl Output for TerminalOutput {
    fn emit(&self, level: Level, message: &str) {
        match level {
            Level::Success => println!("{}", message.green()),
            Level::Info => println!("{message}"),
            Level::Warning => eprintln!("{}", message.yellow()),
            Level::Failure => eprintln!("{}", message.red()),
        }
    }
}

/// One JSON object per line on stdout.
#[derive(Debug, Default)]
pub struct JsonOutput;

impl JsonOutput {
    fn write_line(value: &serde_json::Value) {
        let mut stdout = std::io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{value}") {
            tracing::debug!(error = %e, "Failed to write JSON output");
        }
    }
}

impl Output for JsonOutput {
    fn emit(&self, level: Level, message: &str) {
        Self::write_line(&json!({ "level": level, "msg": message }));
    }

    fn payload(&self, kind: &str, value: &serde_json::Value) {
        Self::write_line(&json!({ "level": Level::Info, "kind": kind, "data": value }));
    }
}

/// The renderer selected by `--json-output`.
pub fn select(json_output: bool) -> Box<dyn Output> {
    if json_output {
        Box::new(JsonOutput)
    } else {
        Box::new(TerminalOutput)
    }
}
