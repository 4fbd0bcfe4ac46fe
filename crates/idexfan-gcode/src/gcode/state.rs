//! Session state carried from line to line

use serde::{Deserialize, Serialize};

/// Rewriter state for one processing session
///
/// Tracks the tool most recently selected in the stream. Created empty at the
/// start of a session and only ever replaced by a later tool select.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriterState {
    active_tool: Option<u32>,
}

impl RewriterState {
    /// Create a new state with no active tool
    pub fn new() -> Self {
        Self::default()
    }

    /// Tool selected by the most recent tool select, if any
    pub fn active_tool(&self) -> Option<u32> {
        self.active_tool
    }

    /// Replace the active tool, returning the previous one
    pub fn select_tool(&mut self, tool: u32) -> Option<u32> {
        self.active_tool.replace(tool)
    }
}
