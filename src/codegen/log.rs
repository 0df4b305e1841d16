//! Per-phase generation log.
//!
//! Every emitted file produces one [`LogLine`]. Worker tasks push lines into
//! a [`LogCollector`]; the driver drains them once all tasks of a phase are
//! done and writes them to the phase log in arrival order.

use std::fmt;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tokio::sync::mpsc;

use crate::codegen::fs_utils;
use crate::error::{CodegenError, Result};

const LINE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// One generated file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub timestamp: DateTime<Local>,
    pub file_name: String,
}

impl LogLine {
    pub fn now(file_name: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            file_name: file_name.into(),
        }
    }
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] : {}",
            self.timestamp.format(LINE_TIMESTAMP_FORMAT),
            self.file_name
        )
    }
}

/// Append-only, multi-producer log collector handed to each worker task
#[derive(Debug, Clone)]
pub struct LogCollector {
    sender: mpsc::UnboundedSender<LogLine>,
}

/// Receiving half, owned by the driver
#[derive(Debug)]
pub struct LogDrain {
    receiver: mpsc::UnboundedReceiver<LogLine>,
}

pub fn collector() -> (LogCollector, LogDrain) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (LogCollector { sender }, LogDrain { receiver })
}

impl LogCollector {
    pub fn push(&self, line: LogLine) {
        // The drain outlives every task of its phase
        if self.sender.send(line).is_err() {
            tracing::warn!("Log drain closed before all lines were collected");
        }
    }
}

impl LogDrain {
    /// Take every line collected so far.
    pub fn drain(&mut self) -> Vec<LogLine> {
        let mut lines = Vec::new();
        while let Ok(line) = self.receiver.try_recv() {
            lines.push(line);
        }
        lines
    }
}

/// Name of a timestamped log file, e.g. `ModelLog20240101120000.txt`
pub fn log_file_name(prefix: &str, at: DateTime<Local>) -> String {
    format!("{}{}.txt", prefix, at.format(FILE_TIMESTAMP_FORMAT))
}

/// Write all lines to `path` and flush.
pub fn write_log(path: &Path, lines: &[LogLine]) -> Result<()> {
    let file = fs_utils::create_file(path).map_err(|e| CodegenError::io(path, e))?;
    let mut writer = BufWriter::new(file);

    for line in lines {
        writeln!(writer, "{}", line).map_err(|e| CodegenError::io(path, e))?;
    }

    writer.flush().map_err(|e| CodegenError::io(path, e))
}

/// Append a single timestamped error entry to the run's error log.
pub fn append_error(path: &Path, error: &dyn std::error::Error) -> Result<PathBuf> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| CodegenError::io(path, e))?;

    writeln!(
        file,
        "[{}] : {}",
        Local::now().format(LINE_TIMESTAMP_FORMAT),
        error
    )
    .map_err(|e| CodegenError::io(path, e))?;

    Ok(path.to_path_buf())
}
