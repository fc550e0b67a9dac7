/// Reverting organize passes.
///
/// Undo walks the moves of a [`SortSession`] newest first and puts each file
/// back where it came from. It never overwrites anything: a record whose file
/// has gone missing, or whose original location is taken again, is left in
/// the session and reported instead.
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{SortError, SortResult};
use crate::file_organizer::is_occupied;
use crate::session::{MoveRecord, SortSession};
use crate::sort_log::{LogAction, SortLog};

/// A recorded move that could not be reversed.
#[derive(Debug)]
pub struct FailedUndo {
    pub record: MoveRecord,
    pub error: SortError,
}

/// Outcome of an undo.
#[derive(Debug, Default)]
pub struct UndoReport {
    /// Moves that were reversed, newest first.
    pub restored: Vec<MoveRecord>,
    /// Moves that were left in the session.
    pub failed: Vec<FailedUndo>,
    /// Category folders removed because the undo emptied them.
    pub removed_dirs: Vec<PathBuf>,
    /// The session was already empty.
    pub nothing_to_undo: bool,
}

impl UndoReport {
    pub fn restored_count(&self) -> usize {
        self.restored.len()
    }

    /// Returns true if every pending move was reversed.
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Reverses the moves recorded in a sort session.
pub struct UndoManager;

impl UndoManager {
    /// Undoes every pending move of `session`, newest first.
    ///
    /// Reversed records are removed from the session and logged as `undo`;
    /// records that cannot be reversed stay in the session, in their
    /// original order, and are logged as `undo-skip`. An empty session is a
    /// no-op. The session journal is rewritten afterwards, and removed once
    /// the session is empty.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use foldersort::session::SortSession;
    /// use foldersort::sort_log::SortLog;
    /// use foldersort::undo::UndoManager;
    /// use std::path::Path;
    ///
    /// let target = Path::new("/home/me/Downloads");
    /// let mut session = SortSession::load_or_new(target)?;
    /// let report = UndoManager::undo(&mut session, &SortLog::for_target(target))?;
    /// println!("restored {} files", report.restored_count());
    /// # Ok::<(), foldersort::SortError>(())
    /// ```
    pub fn undo(session: &mut SortSession, log: &SortLog) -> SortResult<UndoReport> {
        if session.is_empty() {
            info!("nothing to undo");
            return Ok(UndoReport {
                nothing_to_undo: true,
                ..Default::default()
            });
        }

        info!(pending = session.len(), "undoing sort session");
        let records = session.records().to_vec();
        let mut report = UndoReport::default();
        let mut kept = Vec::new();
        let mut log_error = None;

        for record in records.into_iter().rev() {
            // Once the log cannot be written, stop touching files.
            if log_error.is_some() {
                kept.push(record);
                continue;
            }

            let action = match Self::restore_file(&record) {
                Ok(()) => {
                    debug!(restored = %record.source.display(), "restored");
                    report.restored.push(record.clone());
                    LogAction::Undo
                }
                Err(error) => {
                    warn!(error = %error, "cannot undo move");
                    kept.push(record.clone());
                    report.failed.push(FailedUndo {
                        record: record.clone(),
                        error,
                    });
                    LogAction::UndoSkip
                }
            };

            if let Err(e) = log.append(action, &record.destination, &record.source) {
                log_error = Some(e);
            }
        }

        kept.reverse();
        session.replace_records(kept);
        report.removed_dirs = Self::remove_emptied_dirs(session.target(), &report.restored);
        session.persist()?;

        if let Some(e) = log_error {
            return Err(e);
        }
        Ok(report)
    }

    /// Moves one file back to where it was before sorting.
    fn restore_file(record: &MoveRecord) -> SortResult<()> {
        let conflict = |reason: &str| SortError::UndoConflict {
            original: record.source.clone(),
            destination: record.destination.clone(),
            reason: reason.to_string(),
        };
        let failed = |error: std::io::Error| SortError::MoveFailed {
            original: record.destination.clone(),
            destination: record.source.clone(),
            error,
        };

        if !is_occupied(&record.destination) {
            return Err(conflict("file is no longer where it was sorted to"));
        }
        if is_occupied(&record.source) {
            return Err(conflict("original location is occupied"));
        }

        if let Some(parent) = record.source.parent() {
            fs::create_dir_all(parent).map_err(failed)?;
        }
        fs::rename(&record.destination, &record.source).map_err(failed)
    }

    /// Removes the category folders of `restored` that are now empty.
    fn remove_emptied_dirs(target: &Path, restored: &[MoveRecord]) -> Vec<PathBuf> {
        let dirs: BTreeSet<&Path> = restored
            .iter()
            .filter_map(|r| r.destination.parent())
            .filter(|dir| dir.parent() == Some(target))
            .collect();

        let mut removed = Vec::new();
        for dir in dirs {
            let is_empty = fs::read_dir(dir)
                .map(|mut entries| entries.next().is_none())
                .unwrap_or(false);
            if !is_empty {
                continue;
            }
            match fs::remove_dir(dir) {
                Ok(()) => removed.push(dir.to_path_buf()),
                Err(e) => warn!(dir = %dir.display(), error = %e, "could not remove empty folder"),
            }
        }
        removed
    }
}
