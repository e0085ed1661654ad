//! Emitting analysis results as JSON or JSON Lines.
//!
//! Every analyzed image produces one [`ImageReport`], successful or not, so a
//! batch run keeps going past individual failures and the consumer can tell
//! which input each record belongs to.

use serde::Serialize;
use std::io::{self, Write};

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// A single JSON document: one object, or an array for several images
    Json,
    /// One JSON object per line, written as each image finishes
    JsonLines,
}

impl OutputFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Some(Self::JsonLines),
            _ => None,
        }
    }
}

/// Outcome of analyzing one image.
#[derive(Debug, Clone, Serialize)]
pub struct ImageReport<T> {
    /// Input path or label of the image
    pub image: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ImageReport<T> {
    pub fn success(image: impl Into<String>, result: T) -> Self {
        Self {
            image: image.into(),
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(image: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self {
            image: image.into(),
            result: None,
            error: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_some()
    }
}

/// Writes image reports in the configured format.
///
/// JSON Lines output is streamed per report. JSON output is collected and
/// written by [`ReportWriter::finish`]: a lone report as an object, several
/// as an array.
pub struct ReportWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    pretty: bool,
    pending: Vec<serde_json::Value>,
    succeeded: usize,
    failed: usize,
}

impl<W: Write> ReportWriter<W> {
    /// `pretty` only affects JSON output; JSON Lines is always compact.
    pub fn new(writer: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
            pending: Vec::new(),
            succeeded: 0,
            failed: 0,
        }
    }

    /// Record one report.
    pub fn write<T: Serialize>(&mut self, report: &ImageReport<T>) -> io::Result<()> {
        if report.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }

        match self.format {
            OutputFormat::JsonLines => {
                serde_json::to_writer(&mut self.writer, report).map_err(io::Error::other)?;
                writeln!(self.writer)?;
                self.writer.flush()
            }
            OutputFormat::Json => {
                let value = serde_json::to_value(report).map_err(io::Error::other)?;
                self.pending.push(value);
                Ok(())
            }
        }
    }

    /// Flush collected JSON output and return the underlying writer.
    pub fn finish(mut self) -> io::Result<W> {
        if self.format == OutputFormat::Json && !self.pending.is_empty() {
            let document = if self.pending.len() == 1 {
                self.pending.remove(0)
            } else {
                serde_json::Value::Array(std::mem::take(&mut self.pending))
            };
            if self.pretty {
                serde_json::to_writer_pretty(&mut self.writer, &document)
                    .map_err(io::Error::other)?;
            } else {
                serde_json::to_writer(&mut self.writer, &document).map_err(io::Error::other)?;
            }
            writeln!(self.writer)?;
        }
        self.writer.flush()?;
        Ok(self.writer)
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    pub fn failed(&self) -> usize {
        self.failed
    }
}
