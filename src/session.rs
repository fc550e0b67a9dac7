/// Sort sessions: the record of moves that can still be undone.
///
/// A [`SortSession`] is an explicit value owned by the caller and passed to
/// [`crate::file_organizer::Organizer::organize`] and
/// [`crate::undo::UndoManager::undo`]. It is mirrored to a JSON journal in
/// the target's log folder so that an undo can also happen in a later run.
/// The journal is the durable copy; the in-memory session is a cache of it.
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{SortError, SortResult};
use crate::file_category::Category;
use crate::sort_log::LOG_DIR_NAME;

const JOURNAL_FILE_NAME: &str = "last_sort.json";

/// One completed relocation of a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// Where the file was before it was sorted.
    pub source: PathBuf,
    /// Where the file was moved to.
    pub destination: PathBuf,
    /// The category folder it was moved into.
    pub category: Category,
}

/// Whether a session has anything left to undo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Empty,
}

/// The ordered moves of the most recent organize pass(es) on a folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortSession {
    target: PathBuf,
    /// When the session was first started, stored as RFC 3339.
    created_at: DateTime<Local>,
    records: Vec<MoveRecord>,
}

impl SortSession {
    /// Creates an empty session for `target`.
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            created_at: Local::now(),
            records: Vec::new(),
        }
    }

    /// Loads the journaled session for `target`, or an empty one if there is
    /// no journal.
    pub fn load_or_new(target: &Path) -> SortResult<Self> {
        Ok(Self::load(target)?.unwrap_or_else(|| Self::new(target)))
    }

    /// Loads the journaled session for `target`, if any.
    pub fn load(target: &Path) -> SortResult<Option<Self>> {
        let path = Self::journal_path(target);
        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&path).map_err(|e| SortError::Journal {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        let session: Self = serde_json::from_str(&json).map_err(|e| SortError::Journal {
            path: path.clone(),
            reason: format!("JSON parse error: {}", e),
        })?;
        Ok(Some(session))
    }

    /// Returns the journal location for a target folder.
    pub fn journal_path(target: &Path) -> PathBuf {
        target.join(LOG_DIR_NAME).join(JOURNAL_FILE_NAME)
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    /// The pending moves in insertion order.
    pub fn records(&self) -> &[MoveRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn state(&self) -> SessionState {
        if self.records.is_empty() {
            SessionState::Empty
        } else {
            SessionState::Active
        }
    }

    pub(crate) fn push(&mut self, record: MoveRecord) {
        self.records.push(record);
    }

    pub(crate) fn replace_records(&mut self, records: Vec<MoveRecord>) {
        self.records = records;
    }

    /// Writes the session to its journal, or removes the journal when the
    /// session is empty.
    pub fn persist(&self) -> SortResult<()> {
        let path = Self::journal_path(&self.target);
        if self.is_empty() {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| SortError::Journal {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
            }
            return Ok(());
        }

        let journal_error = |reason: String| SortError::Journal {
            path: path.clone(),
            reason,
        };

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| journal_error(format!("JSON serialization failed: {}", e)))?;

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| journal_error(e.to_string()))?;
        }
        // Write beside the journal, then swap it in.
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, json).map_err(|e| journal_error(e.to_string()))?;
        fs::rename(&staging, &path).map_err(|e| journal_error(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(base: &Path, name: &str, category: Category) -> MoveRecord {
        MoveRecord {
            source: base.join(name),
            destination: base.join(category.dir_name()).join(name),
            category,
        }
    }

    #[test]
    fn test_new_session_is_empty() {
        let session = SortSession::new("/tmp/somewhere");
        assert!(session.is_empty());
        assert_eq!(session.state(), SessionState::Empty);
    }

    #[test]
    fn test_push_makes_session_active() {
        let mut session = SortSession::new("/tmp/somewhere");
        session.push(record(Path::new("/tmp/somewhere"), "a.pdf", Category::Documents));
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn test_persist_and_load_preserves_order() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();

        let mut session = SortSession::new(base);
        session.push(record(base, "b.mp4", Category::Videos));
        session.push(record(base, "a.pdf", Category::Documents));
        session.persist().expect("Failed to persist");

        let loaded = SortSession::load(base)
            .expect("Failed to load")
            .expect("Journal should exist");
        assert_eq!(loaded, session);
        assert_eq!(loaded.records()[0].category, Category::Videos);
    }

    #[test]
    fn test_journal_stores_creation_time_as_rfc3339() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();

        let mut session = SortSession::new(base);
        session.push(record(base, "a.pdf", Category::Documents));
        session.persist().expect("Failed to persist");

        let json = fs::read_to_string(SortSession::journal_path(base)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let created_at = value["created_at"].as_str().expect("created_at should be a string");
        let parsed = chrono::DateTime::parse_from_rfc3339(created_at).expect("Not RFC 3339");
        assert_eq!(parsed, session.created_at());
    }

    #[test]
    fn test_persist_empty_session_removes_journal() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();

        let mut session = SortSession::new(base);
        session.push(record(base, "a.pdf", Category::Documents));
        session.persist().expect("Failed to persist");
        assert!(SortSession::journal_path(base).exists());

        session.replace_records(Vec::new());
        session.persist().expect("Failed to persist");
        assert!(!SortSession::journal_path(base).exists());
    }

    #[test]
    fn test_load_or_new_without_journal() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let session = SortSession::load_or_new(temp_dir.path()).expect("Failed to load");
        assert!(session.is_empty());
        assert_eq!(session.target(), temp_dir.path());
    }

    #[test]
    fn test_load_corrupt_journal_is_an_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = SortSession::journal_path(temp_dir.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json").unwrap();

        let result = SortSession::load(temp_dir.path());
        assert!(matches!(result, Err(SortError::Journal { .. })));
    }
}
