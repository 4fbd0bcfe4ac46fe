//! Stream and file drivers
//!
//! A [`RewriteSession`] feeds lines from any reader through a
//! [`ProcessorPipeline`], prefixes the output with the processed-file marker
//! and drops a marker found on the first input line. [`rewrite_file`] wraps a
//! session with a temporary file so the destination is replaced only when
//! the whole file has been processed.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use idexfan_core::{Error, FileError, Result, DEFAULT_MARKER, DEFAULT_PROGRESS_STEP_PERCENT};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::{GcodeLine, ProcessorPipeline, RewriterState};

/// Buffer size for reading large files (256 KB)
const READ_BUFFER_SIZE: usize = 256 * 1024;

/// Counters collected over one session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Lines read from the input, marker included
    pub lines_read: u64,
    /// Lines written to the output, marker excluded
    pub lines_written: u64,
    /// Lines whose content was changed by the pipeline
    pub lines_rewritten: u64,
    /// Lines dropped by the pipeline
    pub lines_deleted: u64,
    /// Whether an existing marker line was found and skipped
    pub marker_skipped: bool,
    /// Active tool once the input was exhausted
    pub final_tool: Option<u32>,
}

/// One pass of the pipeline over one input stream
pub struct RewriteSession<'a> {
    pipeline: &'a ProcessorPipeline,
    state: RewriterState,
    marker: String,
    total_bytes: Option<u64>,
    progress_step: u8,
    bytes_consumed: u64,
    reported_percent: u64,
    summary: SessionSummary,
}

impl<'a> RewriteSession<'a> {
    /// Create a session with the default marker and progress step
    pub fn new(pipeline: &'a ProcessorPipeline) -> Self {
        Self {
            pipeline,
            state: RewriterState::new(),
            marker: DEFAULT_MARKER.to_string(),
            total_bytes: None,
            progress_step: DEFAULT_PROGRESS_STEP_PERCENT,
            bytes_consumed: 0,
            reported_percent: 0,
            summary: SessionSummary::default(),
        }
    }

    /// Use a different processed-file marker
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    /// Log progress every `step` percent of the input (clamped to 1..=100)
    pub fn with_progress_step(mut self, step: u8) -> Self {
        self.progress_step = step.clamp(1, 100);
        self
    }

    /// Declare the input size so progress can be reported
    pub fn with_total_bytes(mut self, total_bytes: u64) -> Self {
        self.total_bytes = Some(total_bytes);
        self
    }

    /// Current session state
    pub fn state(&self) -> &RewriterState {
        &self.state
    }

    /// Counters so far
    pub fn summary(&self) -> &SessionSummary {
        &self.summary
    }

    /// Feed one raw input line
    ///
    /// Returns the bytes to write, or `None` when the line produces no
    /// output (a leading marker, or a line dropped by the pipeline).
    pub fn feed(&mut self, raw: &[u8]) -> Result<Option<Vec<u8>>> {
        self.summary.lines_read += 1;
        let line_number = self.summary.lines_read;

        if line_number == 1 && raw.starts_with(self.marker.as_bytes()) {
            tracing::info!("Input already carries the processed marker, skipping it");
            self.summary.marker_skipped = true;
            return Ok(None);
        }

        let line = GcodeLine::new(line_number, raw.to_vec());
        let output = self.pipeline.process_line(line, &mut self.state)?;
        self.summary.final_tool = self.state.active_tool();

        match output {
            Some(line) => {
                if line.as_bytes() != raw {
                    self.summary.lines_rewritten += 1;
                }
                self.summary.lines_written += 1;
                Ok(Some(line.into_bytes()))
            }
            None => {
                self.summary.lines_deleted += 1;
                Ok(None)
            }
        }
    }

    /// Run the session over `reader`, writing the result to `writer`
    ///
    /// The marker line is written first. On error the writer may hold a
    /// partial result; callers writing to storage should discard it.
    pub fn run<R: BufRead, W: Write>(self, reader: R, writer: W) -> Result<SessionSummary> {
        self.stream(reader, writer).map_err(|failure| match failure {
            StreamFailure::Read(e) | StreamFailure::Write(e) => Error::Io(e),
            StreamFailure::Rewrite(e) => e,
        })
    }

    fn stream<R: BufRead, W: Write>(
        mut self,
        mut reader: R,
        mut writer: W,
    ) -> std::result::Result<SessionSummary, StreamFailure> {
        writer
            .write_all(self.marker.as_bytes())
            .and_then(|_| writer.write_all(b"\n"))
            .map_err(StreamFailure::Write)?;

        let mut buf = Vec::new();
        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .map_err(StreamFailure::Read)?;
            if read == 0 {
                break;
            }

            if let Some(out) = self.feed(&buf).map_err(StreamFailure::Rewrite)? {
                writer.write_all(&out).map_err(StreamFailure::Write)?;
            }
            self.advance_progress(read as u64);
        }

        writer.flush().map_err(StreamFailure::Write)?;
        tracing::debug!(
            "Session finished: {} read, {} written, {} rewritten",
            self.summary.lines_read,
            self.summary.lines_written,
            self.summary.lines_rewritten
        );
        Ok(self.summary)
    }

    /// Convenience for in-memory input: returns the output lines, marker first
    pub fn process_lines(mut self, lines: &[&[u8]]) -> Result<(Vec<Vec<u8>>, SessionSummary)> {
        let mut output = vec![format!("{}\n", self.marker).into_bytes()];
        for raw in lines {
            if let Some(out) = self.feed(raw)? {
                output.push(out);
            }
        }
        Ok((output, self.summary))
    }

    fn advance_progress(&mut self, read: u64) {
        self.bytes_consumed += read;
        let Some(total) = self.total_bytes else {
            return;
        };

        let step = u64::from(self.progress_step);
        if let Some(percent) =
            progress_milestone(self.bytes_consumed, total, step, self.reported_percent)
        {
            tracing::info!("{}%", percent);
            self.reported_percent = percent;
        }
    }
}

/// Why a stream pass stopped
enum StreamFailure {
    Read(std::io::Error),
    Write(std::io::Error),
    Rewrite(Error),
}

/// Next progress percentage to report, if a new step boundary was crossed
///
/// Percentages are rounded down to a multiple of `step`; nothing is reported
/// for an empty input or while still below `reported + step`.
fn progress_milestone(consumed: u64, total: u64, step: u64, reported: u64) -> Option<u64> {
    if total == 0 || step == 0 {
        return None;
    }

    let percent = (consumed.saturating_mul(100) / total).min(100);
    let milestone = percent - percent % step;
    (milestone >= reported + step).then_some(milestone)
}

/// Rewrite `input` into `output` (which may be the same path)
///
/// The result is written to a temporary file next to `output` and moved over
/// it only after the whole input was processed, so a failure leaves
/// `output` untouched. The permissions of `input` are carried over.
pub fn rewrite_file(
    input: &Path,
    output: &Path,
    session: RewriteSession<'_>,
) -> Result<SessionSummary> {
    let unreadable = |source: std::io::Error| FileError::SourceUnreadable {
        path: input.to_path_buf(),
        source,
    };
    let unwritable = |source: std::io::Error| FileError::DestinationUnwritable {
        path: output.to_path_buf(),
        source,
    };

    let metadata = fs::metadata(input).map_err(unreadable)?;
    tracing::info!("Total file size: {} bytes", metadata.len());
    let source = File::open(input).map_err(unreadable)?;

    let dir = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let temp = NamedTempFile::new_in(dir).map_err(unwritable)?;
    fs::set_permissions(temp.path(), metadata.permissions()).map_err(unwritable)?;

    let mut writer = BufWriter::new(temp);
    let summary = session
        .with_total_bytes(metadata.len())
        .stream(BufReader::with_capacity(READ_BUFFER_SIZE, source), &mut writer)
        .map_err(|failure| match failure {
            StreamFailure::Read(e) => unreadable(e).into(),
            StreamFailure::Write(e) => unwritable(e).into(),
            StreamFailure::Rewrite(e) => e,
        })?;

    tracing::info!("All processed, now saving...");
    let temp = writer
        .into_inner()
        .map_err(|e| unwritable(e.into_error()))?;
    temp.persist(output).map_err(|e| unwritable(e.error))?;
    tracing::info!("Done");

    Ok(summary)
}
