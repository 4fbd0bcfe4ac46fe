//! Line processor pipeline

use std::sync::Arc;

use idexfan_core::RewriteError;

use super::{FanRewriter, GcodeLine, RewriterState, ToolTracker};

/// Trait for per-line G-Code processors
///
/// Processors inspect one line at a time, may update the session state and
/// return the line to hand to the next processor.
pub trait LineProcessor: Send + Sync {
    /// Get the name/identifier of this processor
    fn name(&self) -> &str;

    /// Get a description of what this processor does
    fn description(&self) -> &str;

    /// Process a single line
    ///
    /// # Arguments
    /// * `line` - The line to process, possibly already rewritten upstream
    /// * `state` - The session state
    ///
    /// # Returns
    /// The line to pass on, or `None` to drop it from the output.
    fn process(
        &self,
        line: GcodeLine,
        state: &mut RewriterState,
    ) -> Result<Option<GcodeLine>, RewriteError>;
}

/// Arc-wrapped processor for thread-safe sharing
pub type ProcessorHandle = Arc<dyn LineProcessor>;

/// Ordered chain of line processors
///
/// Every line is handed to each processor in registration order. A processor
/// that drops the line (or empties it) stops the chain for that line.
///
/// # Example
/// ```ignore
/// let pipeline = ProcessorPipeline::idex_fan([3]);
/// let mut state = RewriterState::new();
/// let out = pipeline.process_line(GcodeLine::new(1, b"T0\n".to_vec()), &mut state)?;
/// ```
pub struct ProcessorPipeline {
    processors: Vec<ProcessorHandle>,
}

impl ProcessorPipeline {
    /// Create a new empty processor pipeline
    pub fn new() -> Self {
        Self {
            processors: Vec::new(),
        }
    }

    /// Standard IDEX fan chain: tool tracking, then fan rebinding
    pub fn idex_fan(excluded_fan_indexes: impl IntoIterator<Item = u32>) -> Self {
        let mut pipeline = Self::new();
        pipeline
            .register(Arc::new(ToolTracker::new()))
            .register(Arc::new(FanRewriter::new(excluded_fan_indexes)));
        pipeline
    }

    /// Register a processor in the pipeline
    ///
    /// Processors are applied in the order they are registered.
    pub fn register(&mut self, processor: ProcessorHandle) -> &mut Self {
        self.processors.push(processor);
        self
    }

    /// Register multiple processors at once
    pub fn register_all(&mut self, processors: Vec<ProcessorHandle>) -> &mut Self {
        self.processors.extend(processors);
        self
    }

    /// Get the number of registered processors
    pub fn processor_count(&self) -> usize {
        self.processors.len()
    }

    /// Get a reference to a processor by name
    pub fn get_processor_by_name(&self, name: &str) -> Option<&ProcessorHandle> {
        self.processors.iter().find(|p| p.name() == name)
    }

    /// List all registered processors as (name, description)
    pub fn list_processors(&self) -> Vec<(&str, &str)> {
        self.processors
            .iter()
            .map(|p| (p.name(), p.description()))
            .collect()
    }

    /// Process a single line through the entire pipeline
    ///
    /// Returns `None` when a processor dropped the line.
    pub fn process_line(
        &self,
        line: GcodeLine,
        state: &mut RewriterState,
    ) -> Result<Option<GcodeLine>, RewriteError> {
        let mut current = line;

        for processor in &self.processors {
            let line_number = current.line_number;
            match processor.process(current, state) {
                Ok(Some(next)) if !next.is_empty() => current = next,
                Ok(_) => {
                    tracing::debug!(
                        "Processor '{}' dropped line {}",
                        processor.name(),
                        line_number
                    );
                    return Ok(None);
                }
                Err(e) => {
                    tracing::warn!("Processor '{}' failed: {}", processor.name(), e);
                    return Err(e);
                }
            }
        }

        Ok(Some(current))
    }
}

impl Default for ProcessorPipeline {
    fn default() -> Self {
        Self::idex_fan(idexfan_core::DEFAULT_EXCLUDED_FAN_INDEXES.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DropComments;

    impl LineProcessor for DropComments {
        fn name(&self) -> &str {
            "drop_comments"
        }

        fn description(&self) -> &str {
            "Drops comment-only lines"
        }

        fn process(
            &self,
            line: GcodeLine,
            _state: &mut RewriterState,
        ) -> Result<Option<GcodeLine>, RewriteError> {
            if line.as_bytes().starts_with(b";") {
                Ok(None)
            } else {
                Ok(Some(line))
            }
        }
    }

    struct Uppercase;

    impl LineProcessor for Uppercase {
        fn name(&self) -> &str {
            "uppercase"
        }

        fn description(&self) -> &str {
            "Uppercases the line"
        }

        fn process(
            &self,
            line: GcodeLine,
            _state: &mut RewriterState,
        ) -> Result<Option<GcodeLine>, RewriteError> {
            let upper = line.as_bytes().to_ascii_uppercase();
            Ok(Some(line.replaced_with(upper)))
        }
    }

    struct Blank;

    impl LineProcessor for Blank {
        fn name(&self) -> &str {
            "blank"
        }

        fn description(&self) -> &str {
            "Empties every line"
        }

        fn process(
            &self,
            line: GcodeLine,
            _state: &mut RewriterState,
        ) -> Result<Option<GcodeLine>, RewriteError> {
            Ok(Some(line.replaced_with(Vec::new())))
        }
    }

    #[test]
    fn test_idex_fan_registration_order() {
        let pipeline = ProcessorPipeline::idex_fan([3]);
        let names: Vec<&str> = pipeline.list_processors().iter().map(|p| p.0).collect();
        assert_eq!(names, vec!["tool_tracker", "fan_rewriter"]);
        assert!(pipeline.get_processor_by_name("fan_rewriter").is_some());
        assert!(pipeline.get_processor_by_name("missing").is_none());
    }

    #[test]
    fn test_processors_chain_in_order() {
        let processors: Vec<ProcessorHandle> = vec![Arc::new(Uppercase), Arc::new(DropComments)];
        let mut pipeline = ProcessorPipeline::new();
        pipeline.register_all(processors);
        let mut state = RewriterState::new();

        let out = pipeline
            .process_line(GcodeLine::new(1, b"g1 x1\n".to_vec()), &mut state)
            .unwrap();
        assert_eq!(out.unwrap().as_bytes(), b"G1 X1\n");
    }

    #[test]
    fn test_dropped_line_stops_chain() {
        let mut pipeline = ProcessorPipeline::new();
        pipeline
            .register(Arc::new(DropComments))
            .register(Arc::new(Uppercase));
        let mut state = RewriterState::new();

        let out = pipeline
            .process_line(GcodeLine::new(1, b"; layer 1\n".to_vec()), &mut state)
            .unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn test_empty_result_deletes_line() {
        let mut pipeline = ProcessorPipeline::new();
        pipeline.register(Arc::new(Blank)).register(Arc::new(Uppercase));
        let mut state = RewriterState::new();

        let out = pipeline
            .process_line(GcodeLine::new(1, b"G1 X1\n".to_vec()), &mut state)
            .unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn test_empty_pipeline_passes_through() {
        let pipeline = ProcessorPipeline::new();
        let mut state = RewriterState::new();
        assert_eq!(pipeline.processor_count(), 0);

        let out = pipeline
            .process_line(GcodeLine::new(7, b"G28\n".to_vec()), &mut state)
            .unwrap()
            .unwrap();
        assert_eq!(out.line_number, 7);
        assert_eq!(out.as_bytes(), b"G28\n");
    }

    #[test]
    fn test_error_propagates() {
        let pipeline = ProcessorPipeline::default();
        let mut state = RewriterState::new();

        let err = pipeline
            .process_line(GcodeLine::new(4, b"M106 S50\n".to_vec()), &mut state)
            .unwrap_err();
        assert_eq!(err.line_number(), 4);
    }
}
