//! G-Code line types and command recognition
//!
//! Only two commands are recognised: tool select (`T<n>`) and fan speed
//! (`M106 [P<n>] S<speed>`). Both are matched on raw bytes, anchored at the
//! start of the line and case-sensitive.

use regex::bytes::Regex;
use std::sync::OnceLock;

/// A single raw line from the instruction stream
///
/// Holds the bytes exactly as read, including the line terminator, together
/// with the 1-based physical line number in the source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcodeLine {
    /// Line number in the source (1-based)
    pub line_number: u64,
    /// Raw line content including the terminator, if any
    pub bytes: Vec<u8>,
}

impl GcodeLine {
    /// Create a new line
    pub fn new(line_number: u64, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            line_number,
            bytes: bytes.into(),
        }
    }

    /// Build a replacement for this line, keeping its line number
    pub fn replaced_with(&self, bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(self.line_number, bytes)
    }

    /// Raw content
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the line and return its raw content
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Whether the line carries no content at all
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Lossy text form without the line terminator, for logs and errors
    pub fn display_text(&self) -> String {
        let text = String::from_utf8_lossy(&self.bytes);
        text.trim_end_matches(['\r', '\n']).to_string()
    }
}

fn tool_regex() -> &'static Regex {
    static TOOL_REGEX: OnceLock<Regex> = OnceLock::new();
    TOOL_REGEX.get_or_init(|| Regex::new(r"^T(?P<tool>[0-9]+)").expect("invalid regex pattern"))
}

fn fan_regex() -> &'static Regex {
    static FAN_REGEX: OnceLock<Regex> = OnceLock::new();
    FAN_REGEX.get_or_init(|| {
        Regex::new(r"^M106(?: P(?P<index>[0-9]+))? S(?P<speed>[0-9]+(?:\.[0-9]+)?)")
            .expect("invalid regex pattern")
    })
}

/// A recognised tool select command (`T<n>`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolSelect {
    /// Selected tool index
    pub tool: u32,
}

impl ToolSelect {
    /// Recognise a tool select at the start of `line`
    ///
    /// A digit run too large for a tool index is not a tool select.
    pub fn parse(line: &[u8]) -> Option<Self> {
        let captures = tool_regex().captures(line)?;
        let digits = captures.name("tool")?.as_bytes();

        match std::str::from_utf8(digits).ok()?.parse::<u32>() {
            Ok(tool) => Some(Self { tool }),
            Err(e) => {
                tracing::warn!(
                    "Ignoring tool select with out-of-range index '{}': {}",
                    String::from_utf8_lossy(digits),
                    e
                );
                None
            }
        }
    }
}

/// A recognised fan speed command (`M106 [P<n>] S<speed>`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanSpeed {
    /// Fan index digits as written, when a `P` argument is present
    pub index: Option<String>,
    /// Speed value as written (`255`, `127.5`, ...)
    pub speed: String,
}

impl FanSpeed {
    /// Recognise a fan speed command at the start of `line`
    pub fn parse(line: &[u8]) -> Option<Self> {
        let captures = fan_regex().captures(line)?;
        let index = captures
            .name("index")
            .map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned());
        let speed = String::from_utf8_lossy(captures.name("speed")?.as_bytes()).into_owned();

        Some(Self { index, speed })
    }

    /// Numeric fan index, if present and representable
    pub fn index(&self) -> Option<u32> {
        self.index.as_deref().and_then(|i| i.parse().ok())
    }

    /// Render this command bound to `tool`, newline-terminated
    pub fn bound_to(&self, tool: u32) -> Vec<u8> {
        format!("M106 P{} S{}\n", tool, self.speed).into_bytes()
    }
}

/// Whether `line` starts with the fan speed mnemonic, matched or not
///
/// Used to tell malformed fan commands apart from unrelated lines.
pub fn looks_like_fan_command(line: &[u8]) -> bool {
    line.starts_with(b"M106") && !line.get(4).is_some_and(|b| b.is_ascii_digit())
}
