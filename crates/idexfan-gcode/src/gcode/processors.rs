//! IDEX line processor implementations

use std::collections::BTreeSet;

use idexfan_core::RewriteError;

use super::{looks_like_fan_command, FanSpeed, GcodeLine, LineProcessor, RewriterState, ToolSelect};

/// Tracks the active tool
///
/// Records the index of every `T<n>` command in the session state. Lines are
/// always passed on unchanged.
#[derive(Debug, Clone)]
pub struct ToolTracker;

impl ToolTracker {
    /// Create a new tool tracker
    pub fn new() -> Self {
        Self
    }
}

impl Default for ToolTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl LineProcessor for ToolTracker {
    fn name(&self) -> &str {
        "tool_tracker"
    }

    fn description(&self) -> &str {
        "Records the tool selected by the most recent T command"
    }

    fn process(
        &self,
        line: GcodeLine,
        state: &mut RewriterState,
    ) -> Result<Option<GcodeLine>, RewriteError> {
        if let Some(select) = ToolSelect::parse(line.as_bytes()) {
            state.select_tool(select.tool);
            tracing::debug!("Switched tool to {}", select.tool);
        }
        Ok(Some(line))
    }
}

/// Binds fan commands to the active tool
///
/// Rewrites `M106 [P<n>] S<speed>` to `M106 P<tool> S<speed>` using the tool
/// from the session state. Commands addressing an excluded fan index are left
/// alone. The speed text is copied verbatim.
#[derive(Debug, Clone)]
pub struct FanRewriter {
    excluded_indexes: BTreeSet<u32>,
}

impl FanRewriter {
    /// Create a fan rewriter that never touches the given fan indexes
    pub fn new(excluded_indexes: impl IntoIterator<Item = u32>) -> Self {
        Self {
            excluded_indexes: excluded_indexes.into_iter().collect(),
        }
    }

    /// Fan indexes this rewriter leaves untouched
    pub fn excluded_indexes(&self) -> &BTreeSet<u32> {
        &self.excluded_indexes
    }

    fn is_excluded(&self, fan: &FanSpeed) -> bool {
        fan.index()
            .is_some_and(|index| self.excluded_indexes.contains(&index))
    }
}

impl Default for FanRewriter {
    fn default() -> Self {
        Self::new(idexfan_core::DEFAULT_EXCLUDED_FAN_INDEXES.iter().copied())
    }
}

impl LineProcessor for FanRewriter {
    fn name(&self) -> &str {
        "fan_rewriter"
    }

    fn description(&self) -> &str {
        "Binds M106 fan commands to the active tool unless the fan index is excluded"
    }

    fn process(
        &self,
        line: GcodeLine,
        state: &mut RewriterState,
    ) -> Result<Option<GcodeLine>, RewriteError> {
        let Some(fan) = FanSpeed::parse(line.as_bytes()) else {
            if looks_like_fan_command(line.as_bytes()) {
                tracing::debug!(
                    "Malformed fan command at line {} passed through: {}",
                    line.line_number,
                    line.display_text()
                );
            }
            return Ok(Some(line));
        };

        if self.is_excluded(&fan) {
            tracing::debug!("Fan excluded at line {}", line.line_number);
            return Ok(Some(line));
        }

        let Some(tool) = state.active_tool() else {
            return Err(RewriteError::UnboundFanCommand {
                line_number: line.line_number,
                line: line.display_text(),
            });
        };

        tracing::debug!("Set fan for P{}", tool);
        Ok(Some(line.replaced_with(fan.bound_to(tool))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(bytes: &[u8]) -> GcodeLine {
        GcodeLine::new(1, bytes.to_vec())
    }

    fn run(processor: &dyn LineProcessor, bytes: &[u8], state: &mut RewriterState) -> Vec<u8> {
        processor
            .process(line(bytes), state)
            .unwrap()
            .unwrap()
            .into_bytes()
    }

    #[test]
    fn test_tool_tracker_records_tool() {
        let tracker = ToolTracker::new();
        let mut state = RewriterState::new();

        assert_eq!(run(&tracker, b"T1\n", &mut state), b"T1\n");
        assert_eq!(state.active_tool(), Some(1));

        assert_eq!(run(&tracker, b"T0 ; left head\n", &mut state), b"T0 ; left head\n");
        assert_eq!(state.active_tool(), Some(0));
    }

    #[test]
    fn test_tool_tracker_ignores_other_lines() {
        let tracker = ToolTracker::new();
        let mut state = RewriterState::new();
        state.select_tool(1);

        for input in [&b"G1 X10 T2\n"[..], b" T0\n", b"M104 T0 S200\n", b"\n"] {
            assert_eq!(run(&tracker, input, &mut state), input);
        }
        assert_eq!(state.active_tool(), Some(1));
    }

    #[test]
    fn test_fan_rewriter_binds_to_active_tool() {
        let rewriter = FanRewriter::new([3]);
        let mut state = RewriterState::new();
        state.select_tool(1);

        assert_eq!(run(&rewriter, b"M106 S255\n", &mut state), b"M106 P1 S255\n");
        assert_eq!(run(&rewriter, b"M106 P0 S127.5\n", &mut state), b"M106 P1 S127.5\n");
        assert_eq!(state.active_tool(), Some(1));
    }

    #[test]
    fn test_fan_rewriter_skips_excluded_index() {
        let rewriter = FanRewriter::new([3]);
        let mut state = RewriterState::new();

        assert_eq!(run(&rewriter, b"M106 P3 S50\n", &mut state), b"M106 P3 S50\n");

        state.select_tool(0);
        assert_eq!(
            run(&rewriter, b"M106 P3 S50 ; chamber\n", &mut state),
            b"M106 P3 S50 ; chamber\n"
        );
    }

    #[test]
    fn test_fan_rewriter_unbound_command() {
        let rewriter = FanRewriter::default();
        let mut state = RewriterState::new();

        let err = rewriter
            .process(GcodeLine::new(9, b"M106 S50\r\n".to_vec()), &mut state)
            .unwrap_err();
        assert_eq!(
            err,
            RewriteError::UnboundFanCommand {
                line_number: 9,
                line: "M106 S50".to_string(),
            }
        );
    }

    #[test]
    fn test_fan_rewriter_passes_malformed_through() {
        let rewriter = FanRewriter::default();
        let mut state = RewriterState::new();

        assert_eq!(run(&rewriter, b"M106 Sabc\n", &mut state), b"M106 Sabc\n");
        assert_eq!(run(&rewriter, b"M106\n", &mut state), b"M106\n");
        assert_eq!(run(&rewriter, b"M107\n", &mut state), b"M107\n");
    }

    #[test]
    fn test_fan_rewriter_drops_trailing_content() {
        let rewriter = FanRewriter::default();
        let mut state = RewriterState::new();
        state.select_tool(0);

        assert_eq!(
            run(&rewriter, b"M106 S204 ; bridge\r\n", &mut state),
            b"M106 P0 S204\n"
        );
    }

    #[test]
    fn test_fan_rewriter_empty_exclusion_set() {
        let rewriter = FanRewriter::new(Vec::new());
        let mut state = RewriterState::new();
        state.select_tool(1);

        assert!(rewriter.excluded_indexes().is_empty());
        assert_eq!(run(&rewriter, b"M106 P3 S50\n", &mut state), b"M106 P1 S50\n");
    }
}
