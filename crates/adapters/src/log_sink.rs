//! Line-oriented sinks shared by the JSON logger and the access log.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// A sink that receives pre-formatted log lines.
pub trait LogSink: Send + Sync {
    /// Write a line to the sink.
    fn write_line(&self, line: &str);
}

/// Log sink that writes to stderr.
#[derive(Debug, Default)]
pub struct StderrLogSink;

impl LogSink for StderrLogSink {
    fn write_line(&self, line: &str) {
        let mut stderr = std::io::stderr();
        if let Err(error) = stderr.write_all(line.as_bytes()) {
            eprintln!("log sink write failed: {error}");
        }
    }
}

/// Log sink appending to a file.
#[derive(Debug)]
pub struct FileLogSink {
    file: Mutex<File>,
}

impl FileLogSink {
    /// Open `path` for appending, creating it when missing.
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl LogSink for FileLogSink {
    fn write_line(&self, line: &str) {
        let Ok(mut file) = self.file.lock() else {
            eprintln!("log sink lock poisoned");
            return;
        };
        if let Err(error) = file.write_all(line.as_bytes()) {
            eprintln!("log sink write failed: {error}");
        }
    }
}

/// In-memory sink, used by tests and by embedders that inspect output.
#[derive(Debug, Default)]
pub struct MemoryLogSink {
    lines: Mutex<Vec<String>>,
}

impl MemoryLogSink {
    /// Drain the captured lines.
    #[must_use]
    pub fn take(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|mut lines| std::mem::take(&mut *lines))
            .unwrap_or_default()
    }

    /// Number of captured lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.lock().map(|lines| lines.len()).unwrap_or_default()
    }

    /// Returns true when nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LogSink for MemoryLogSink {
    fn write_line(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn memory_sink_captures_lines() {
        let sink = MemoryLogSink::default();
        sink.write_line("hello\n");
        sink.write_line("world\n");
        assert_eq!(sink.len(), 2);

        let lines = sink.take();
        assert_eq!(lines, vec!["hello\n".to_string(), "world\n".to_string()]);
        assert!(sink.is_empty());
    }

    #[test]
    fn file_sink_appends() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("access.log");
        {
            let sink = FileLogSink::open(&path)?;
            sink.write_line("one\n");
        }
        let sink = FileLogSink::open(&path)?;
        sink.write_line("two\n");

        assert_eq!(std::fs::read_to_string(&path)?, "one\ntwo\n");
        Ok(())
    }
}
