//! foldersort - sort the files of a folder into category subfolders
//!
//! This library classifies files by extension, moves them into one
//! subfolder per category, records every move in an undoable sort session
//! and an append-only log, and reverses those moves on request.

pub mod cli;
pub mod config;
pub mod error;
pub mod file_category;
pub mod file_organizer;
pub mod output;
pub mod session;
pub mod sort_log;
pub mod undo;

pub use config::{CompiledFilters, Config, ConfigError};
pub use error::{SortError, SortResult};
pub use file_category::{Category, FileMapper};
pub use file_organizer::{OrganizeReport, Organizer};
pub use session::{MoveRecord, SessionState, SortSession};
pub use sort_log::SortLog;
pub use undo::{UndoManager, UndoReport};

pub use cli::{OrganizeCommand, run_command};
