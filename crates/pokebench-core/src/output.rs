//! JSON and JSON Lines file I/O.
//!
//! Every data file the harness reads or writes goes through here: the
//! benchmark assets written by the dataset builder, the predictions snapshot
//! persisted by the runner, and the files consumed by scoring. The format is
//! picked from the file extension (`.jsonl` means JSON Lines).

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{BenchError, Result};

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Single JSON document
    Json,
    /// One JSON value per line
    JsonLines,
}

impl OutputFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Some(Self::JsonLines),
            _ => None,
        }
    }

    /// Format implied by a file's extension; anything but `.jsonl`/`.ndjson` is JSON.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::parse)
            .unwrap_or(Self::Json)
    }
}

/// A writer that serializes items to JSON or JSONL format.
pub struct OutputWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    pretty: bool,
}

impl<W: Write> OutputWriter<W> {
    /// `pretty` only affects the JSON format; JSON Lines is always compact.
    pub fn new(writer: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
        }
    }

    /// Write a single item followed by a newline.
    pub fn write<T: Serialize + ?Sized>(&mut self, item: &T) -> io::Result<()> {
        if self.pretty && self.format == OutputFormat::Json {
            serde_json::to_writer_pretty(&mut self.writer, item).map_err(io::Error::other)?;
        } else {
            serde_json::to_writer(&mut self.writer, item).map_err(io::Error::other)?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    /// Write multiple items: a JSON array, or one line per item.
    pub fn write_all<T: Serialize>(&mut self, items: &[T]) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                if self.pretty {
                    serde_json::to_writer_pretty(&mut self.writer, items)
                        .map_err(io::Error::other)?;
                } else {
                    serde_json::to_writer(&mut self.writer, items).map_err(io::Error::other)?;
                }
                writeln!(self.writer)?;
            }
            OutputFormat::JsonLines => {
                for item in items {
                    self.write(item)?;
                }
            }
        }
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Replace `path` with a new document, never leaving a half-written file.
///
/// The content goes to a sibling temp file which is flushed, synced, closed
/// and then renamed over the target.
pub fn write_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let file_error = |source: io::Error| BenchError::File {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(file_error)?;
    }

    let tmp = temp_sibling(path);
    {
        let mut writer = BufWriter::new(File::create(&tmp).map_err(file_error)?);
        write(&mut writer).map_err(file_error)?;
        let file = writer.into_inner().map_err(|e| file_error(e.into_error()))?;
        file.sync_all().map_err(file_error)?;
    }
    fs::rename(&tmp, path).map_err(file_error)
}

/// Atomically write `item` as a single JSON document.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, item: &T, pretty: bool) -> Result<()> {
    write_atomic(path, |w| {
        let mut out = OutputWriter::new(w, OutputFormat::Json, pretty);
        out.write(item)?;
        out.flush()
    })
}

/// Atomically write `items` in the format implied by the extension of `path`.
pub fn write_records<T: Serialize>(path: &Path, items: &[T], pretty: bool) -> Result<()> {
    let format = OutputFormat::from_path(path);
    write_atomic(path, |w| {
        let mut out = OutputWriter::new(w, format, pretty);
        out.write_all(items)?;
        out.flush()
    })
}

/// Read a whole JSON document.
pub fn read_json<T: DeserializeOwned>(path: &Path, kind: &'static str) -> Result<T> {
    let text = read_to_string(path)?;
    serde_json::from_str(&text).map_err(|e| BenchError::Format {
        kind,
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Read a list of records: JSON Lines for `.jsonl`, otherwise a JSON array.
///
/// Blank lines in JSON Lines input are skipped.
pub fn read_records<T: DeserializeOwned>(path: &Path, kind: &'static str) -> Result<Vec<T>> {
    match OutputFormat::from_path(path) {
        OutputFormat::Json => read_json(path, kind),
        OutputFormat::JsonLines => {
            let text = read_to_string(path)?;
            parse_lines(&text).map_err(|(line, e)| BenchError::Format {
                kind,
                path: path.to_path_buf(),
                message: format!("line {line}: {e}"),
            })
        }
    }
}

/// Parse JSON Lines text; on failure returns the 1-based line number.
pub fn parse_lines<T: DeserializeOwned>(
    text: &str,
) -> std::result::Result<Vec<T>, (usize, serde_json::Error)> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| serde_json::from_str(line).map_err(|e| (i + 1, e)))
        .collect()
}

fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| BenchError::File {
        path: path.to_path_buf(),
        source,
    })
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
