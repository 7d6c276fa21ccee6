#![forbid(unsafe_code)]

//! JSON-lines replay scripts.
//!
//! Each non-blank line is one step. Input records use the `curtain-web`
//! schema; three directives drive the page around the intro:
//!
//! ```text
//! # comments and blank lines are skipped
//! {"type":"probe","ok":true}        first-frame probe result
//! {"type":"wheel","delta_y":120.0}
//! {"type":"wait","ms":500}          animation frames for 500ms
//! {"type":"scroll","y":0.0}         the user scrolls the page
//! ```

use std::fmt;

use curtain_web::input::InputEvent;
use serde::{Deserialize, Serialize};

/// Host-side step that is not a DOM event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Directive {
    /// Set the page scroll offset.
    Scroll { y: f64 },
    /// Report the first-frame probe result.
    Probe { ok: bool },
    /// Run animation frames for `ms` milliseconds.
    Wait { ms: u64 },
}

/// One script line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Step {
    Input(InputEvent),
    Directive(Directive),
}

/// A line that is not a valid step.
#[derive(Debug)]
pub struct ScriptError {
    /// 1-based line number.
    pub line: usize,
    pub text: String,
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: not a script step: {}", self.line, self.text)
    }
}

impl std::error::Error for ScriptError {}

/// Parse a whole script.
pub fn parse(source: &str) -> Result<Vec<Step>, ScriptError> {
    source
        .lines()
        .enumerate()
        .filter_map(|(i, line)| {
            let line = line.trim();
            (!line.is_empty() && !line.starts_with('#')).then_some((i + 1, line))
        })
        .map(|(line, text)| {
            serde_json::from_str(text).map_err(|_| ScriptError {
                line,
                text: text.to_string(),
            })
        })
        .collect()
}
