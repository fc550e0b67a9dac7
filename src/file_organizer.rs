/// Sorting the files of a folder into category subfolders.
///
/// Only the immediate entries of the target folder are considered. Existing
/// subfolders (category folders from an earlier pass, the log folder, or
/// anything else) are never entered, so sorting an already sorted folder
/// moves nothing.
///
/// The tool assumes it is the only writer of the target folder while a pass
/// runs. A free destination name is chosen before each rename, and another
/// process creating a file with that name in between is not detected.
use indicatif::ProgressBar;
use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::CompiledFilters;
use crate::error::{SortError, SortResult};
use crate::file_category::{Category, FileMapper};
use crate::session::{MoveRecord, SortSession};
use crate::sort_log::{LOG_DIR_NAME, LogAction, SortLog};

/// A file that was left in place because moving it failed.
#[derive(Debug)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub error: SortError,
}

/// Outcome of one organize pass.
#[derive(Debug, Default)]
pub struct OrganizeReport {
    /// Moves performed by this pass, in processing order.
    pub moved: Vec<MoveRecord>,
    /// Files that could not be moved.
    pub skipped: Vec<SkippedFile>,
}

impl OrganizeReport {
    pub fn moved_count(&self) -> usize {
        self.moved.len()
    }

    /// Number of files moved into each category by this pass.
    pub fn category_counts(&self) -> BTreeMap<Category, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.moved {
            *counts.entry(record.category).or_insert(0) += 1;
        }
        counts
    }

    pub fn is_complete_success(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Moves the files of one target folder into category subfolders.
pub struct Organizer {
    target: PathBuf,
    mapper: FileMapper,
    filters: CompiledFilters,
    excluded_paths: Vec<PathBuf>,
    log: SortLog,
}

impl Organizer {
    /// Creates an organizer for `target`.
    ///
    /// Fails with [`SortError::InvalidTarget`] if the folder does not exist,
    /// cannot be accessed, or is not a directory.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use foldersort::config::CompiledFilters;
    /// use foldersort::file_organizer::Organizer;
    /// use std::path::Path;
    ///
    /// let organizer = Organizer::new(Path::new("/home/me/Downloads"), CompiledFilters::default())?;
    /// let mut session = organizer.load_session()?;
    /// let report = organizer.organize(&mut session)?;
    /// println!("moved {} files", report.moved_count());
    /// # Ok::<(), foldersort::SortError>(())
    /// ```
    pub fn new(target: &Path, filters: CompiledFilters) -> SortResult<Self> {
        let metadata =
            fs::metadata(target).map_err(|e| SortError::invalid_target(target, e.to_string()))?;
        if !metadata.is_dir() {
            return Err(SortError::invalid_target(target, "not a directory"));
        }
        // One folder, one session, however the path was spelled.
        let target =
            fs::canonicalize(target).map_err(|e| SortError::invalid_target(target, e.to_string()))?;

        Ok(Self {
            log: SortLog::for_target(&target),
            target,
            mapper: FileMapper::default(),
            filters,
            excluded_paths: Vec::new(),
        })
    }

    /// Never moves `path`, even if it sits directly in the target folder.
    pub fn exclude_path(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let path = fs::canonicalize(&path).unwrap_or(path);
        self.excluded_paths.push(path);
        self
    }

    /// The absolute target folder.
    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn sort_log(&self) -> &SortLog {
        &self.log
    }

    /// Loads the journaled session of the target folder, or starts a new one.
    pub fn load_session(&self) -> SortResult<SortSession> {
        SortSession::load_or_new(&self.target)
    }

    /// Lists the plain files directly inside the target that would be moved.
    pub fn scan(&self) -> SortResult<Vec<PathBuf>> {
        let entries = fs::read_dir(&self.target)
            .map_err(|e| SortError::invalid_target(&self.target, e.to_string()))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "unreadable directory entry");
                    continue;
                }
            };
            let path = entry.path();
            let Ok(file_type) = entry.file_type() else {
                warn!(path = %path.display(), "could not read file type");
                continue;
            };

            // A symlink is moved as a link when it points at a file.
            let is_file = file_type.is_file() || (file_type.is_symlink() && path.is_file());
            if !is_file {
                continue;
            }
            if entry.file_name() == LOG_DIR_NAME {
                debug!(path = %path.display(), "reserved log folder name");
                continue;
            }
            if self.excluded_paths.iter().any(|p| p == &path) {
                debug!(path = %path.display(), "excluded path");
                continue;
            }
            if !self.filters.should_include(&path) {
                debug!(path = %path.display(), "filtered out");
                continue;
            }
            files.push(path);
        }
        Ok(files)
    }

    /// Sorts the target folder, extending `session` with every move.
    pub fn organize(&self, session: &mut SortSession) -> SortResult<OrganizeReport> {
        self.organize_with_progress(session, &ProgressBar::hidden())
    }

    /// Like [`Organizer::organize`], advancing `progress` once per file.
    ///
    /// A file that cannot be moved is reported in
    /// [`OrganizeReport::skipped`] and the pass continues. The session journal
    /// is rewritten at the end of the pass, even if writing the sort log
    /// failed part way through.
    pub fn organize_with_progress(
        &self,
        session: &mut SortSession,
        progress: &ProgressBar,
    ) -> SortResult<OrganizeReport> {
        if session.target() != self.target.as_path() {
            return Err(SortError::invalid_target(
                &self.target,
                format!("session belongs to {}", session.target().display()),
            ));
        }

        info!(target_dir = %self.target.display(), "organizing");
        // Without a log folder nothing could be journaled, so move nothing.
        self.log.ensure_dir()?;
        let files = self.scan()?;
        progress.set_length(files.len() as u64);

        let result = self.run_pass(&files, session, progress);
        let persisted = session.persist();
        let report = match (result, persisted) {
            (Ok(report), Ok(())) => report,
            (Ok(_), Err(e)) => return Err(e),
            (Err(e), persisted) => {
                if let Err(journal_error) = persisted {
                    warn!(error = %journal_error, "session journal not written");
                }
                return Err(e);
            }
        };

        info!(
            moved = report.moved.len(),
            skipped = report.skipped.len(),
            "organize pass finished"
        );
        Ok(report)
    }

    fn run_pass(
        &self,
        files: &[PathBuf],
        session: &mut SortSession,
        progress: &ProgressBar,
    ) -> SortResult<OrganizeReport> {
        let mut report = OrganizeReport::default();

        for file_path in files {
            let name = file_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            progress.set_message(name.clone());
            let category = self.mapper.classify(&name);

            match self.move_file(file_path, category) {
                Ok(record) => {
                    debug!(
                        source = %record.source.display(),
                        destination = %record.destination.display(),
                        "moved"
                    );
                    session.push(record.clone());
                    self.log
                        .append(LogAction::Move, &record.source, &record.destination)?;
                    report.moved.push(record);
                }
                Err(error) => {
                    warn!(error = %error, "skipping file");
                    let destination = match &error {
                        SortError::MoveFailed { destination, .. } => destination.clone(),
                        _ => self.target.join(category.dir_name()),
                    };
                    self.log.append(LogAction::Skip, file_path, &destination)?;
                    report.skipped.push(SkippedFile {
                        path: file_path.clone(),
                        error,
                    });
                }
            }
            progress.inc(1);
        }

        Ok(report)
    }

    /// Moves one file into its category folder, creating the folder if needed.
    fn move_file(&self, file_path: &Path, category: Category) -> SortResult<MoveRecord> {
        let category_dir = self.target.join(category.dir_name());
        let failed = |destination: &Path, error: std::io::Error| SortError::MoveFailed {
            original: file_path.to_path_buf(),
            destination: destination.to_path_buf(),
            error,
        };

        let file_name = file_path.file_name().ok_or_else(|| {
            failed(
                &category_dir,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "file has no name"),
            )
        })?;

        fs::create_dir_all(&category_dir).map_err(|e| failed(&category_dir, e))?;

        let destination = unique_destination(&category_dir, file_name);
        fs::rename(file_path, &destination).map_err(|e| failed(&destination, e))?;

        Ok(MoveRecord {
            source: file_path.to_path_buf(),
            destination,
            category,
        })
    }
}

/// Returns `dir/file_name`, or the first free `name (n).ext` when taken.
///
/// ```
/// use foldersort::file_organizer::unique_destination;
/// use std::ffi::OsStr;
///
/// let dir = tempfile::tempdir().unwrap();
/// std::fs::write(dir.path().join("photo.jpg"), "").unwrap();
///
/// let dest = unique_destination(dir.path(), OsStr::new("photo.jpg"));
/// assert_eq!(dest, dir.path().join("photo (1).jpg"));
/// ```
pub fn unique_destination(dir: &Path, file_name: &OsStr) -> PathBuf {
    let candidate = dir.join(file_name);
    if !is_occupied(&candidate) {
        return candidate;
    }

    let name = Path::new(file_name);
    let stem = name.file_stem().unwrap_or(file_name);
    let extension = name.extension();

    let mut n: u32 = 1;
    loop {
        let mut renamed = OsString::from(stem);
        renamed.push(format!(" ({})", n));
        if let Some(ext) = extension {
            renamed.push(".");
            renamed.push(ext);
        }

        let candidate = dir.join(renamed);
        if !is_occupied(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// True if anything, including a dangling symlink, exists at `path`.
pub(crate) fn is_occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}
