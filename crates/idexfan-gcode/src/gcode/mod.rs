//! G-Code line rewriting
//!
//! This module provides:
//! - Tool select and fan speed recognition
//! - Session state tracking
//! - The line processor framework
//! - Stream and file drivers

pub mod command;
pub mod pipeline;
pub mod processors;
pub mod state;
pub mod stream;

pub use command::*;
pub use pipeline::*;
pub use processors::*;
pub use state::*;
pub use stream::*;
