//! Defaults shared by the engine and the settings layer.

/// Fan channels that are never rebound to the active tool.
///
/// Channel 3 is the auxiliary/chamber fan on most IDEX boards.
pub const DEFAULT_EXCLUDED_FAN_INDEXES: &[u32] = &[3];

/// Comment line written at the top of every processed file.
pub const DEFAULT_MARKER: &str = "; Post-processed with idexfan";

/// Progress is logged each time this share of the input has been consumed.
pub const DEFAULT_PROGRESS_STEP_PERCENT: u8 = 10;
