//! Append-only, human-readable log of every move and undo.
//!
//! Each event is one line:
//!
//! ```text
//! <timestamp>\t<action>\t<source-path>\t<destination-path>
//! ```
//!
//! Backslashes, tabs and newlines inside paths are escaped so an event never
//! spans more than one line. Every line is written with a single `write_all`
//! on a file opened in append mode.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{SortError, SortResult};

/// Folder inside the target that holds the sort log and the session journal.
pub const LOG_DIR_NAME: &str = "Sort_Logs";

const LOG_FILE_NAME: &str = "sort.log";

/// Kind of event recorded in the sort log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogAction {
    /// A file was moved into its category folder.
    Move,
    /// A file could not be moved and was left in place.
    Skip,
    /// A file was moved back to its original location.
    Undo,
    /// A recorded move could not be reversed.
    UndoSkip,
}

impl LogAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogAction::Move => "move",
            LogAction::Skip => "skip",
            LogAction::Undo => "undo",
            LogAction::UndoSkip => "undo-skip",
        }
    }
}

impl fmt::Display for LogAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle to the sort log of one target folder.
#[derive(Debug, Clone)]
pub struct SortLog {
    path: PathBuf,
}

impl SortLog {
    /// Returns the log for `target`. Nothing is created until the first append.
    pub fn for_target(target: &Path) -> Self {
        Self {
            path: target.join(LOG_DIR_NAME).join(LOG_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Makes sure the log folder exists as a directory.
    ///
    /// Fails when something else, such as a plain file, already has its name.
    pub fn ensure_dir(&self) -> SortResult<()> {
        let Some(dir) = self.path.parent() else {
            return Ok(());
        };
        fs::create_dir_all(dir).map_err(|error| SortError::Log {
            path: dir.to_path_buf(),
            error,
        })
    }

    /// Appends one event line, creating the log folder if needed.
    pub fn append(&self, action: LogAction, source: &Path, destination: &Path) -> SortResult<()> {
        let line = format!(
            "{}\t{}\t{}\t{}\n",
            chrono::Local::now().to_rfc3339(),
            action,
            escape_path(source),
            escape_path(destination)
        );

        let write = || -> std::io::Result<()> {
            if let Some(dir) = self.path.parent() {
                fs::create_dir_all(dir)?;
            }
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            file.write_all(line.as_bytes())?;
            file.flush()
        };

        write().map_err(|error| SortError::Log {
            path: self.path.clone(),
            error,
        })?;
        debug!(action = %action, source = %source.display(), "sort log appended");
        Ok(())
    }
}

fn escape_path(path: &Path) -> String {
    let raw = path.to_string_lossy();
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\t' => escaped.push_str("\\t"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            other => escaped.push(other),
        }
    }
    escaped
}
