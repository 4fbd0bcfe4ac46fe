//! # idexfan G-Code
//!
//! Single-pass rewriting of IDEX print files: tracks the active tool and
//! binds every `M106` fan command to it. Includes the processor pipeline,
//! the built-in processors and the stream/file drivers.

pub mod gcode;

pub use gcode::{
    looks_like_fan_command, rewrite_file, FanRewriter, FanSpeed, GcodeLine, LineProcessor,
    ProcessorHandle, ProcessorPipeline, RewriteSession, RewriterState, SessionSummary, ToolSelect,
    ToolTracker,
};
