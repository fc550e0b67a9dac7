//! Command-line front end.
//!
//! This module ties the library together for the binary:
//! - one-shot commands (`organize`, `undo`) on a folder
//! - the interactive menu loop
//! - remembering the chosen folder in the configuration file

use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::{CompiledFilters, Config};
use crate::error::SortResult;
use crate::file_organizer::{OrganizeReport, Organizer};
use crate::output::OutputFormatter;
use crate::session::SortSession;
use crate::undo::{UndoManager, UndoReport};

/// A one-shot command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrganizeCommand {
    /// Sort the folder.
    Organize,
    /// Undo the pending moves of the folder.
    Undo,
}

/// What a one-shot command did.
#[derive(Debug)]
pub enum CommandOutcome {
    Organized(OrganizeReport),
    Undone(UndoReport),
}

/// Runs one command on `dir_path`, loading configuration from `config_path`
/// or the default location.
///
/// This is the non-interactive entry point. The binary uses it for
/// `--undo`, and library callers can use it instead of the menu.
///
/// # Examples
///
/// ```no_run
/// use foldersort::cli::{run_command, OrganizeCommand};
/// use std::path::Path;
///
/// run_command(OrganizeCommand::Organize, Path::new("/home/me/Downloads"), None)?;
/// run_command(OrganizeCommand::Undo, Path::new("/home/me/Downloads"), None)?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn run_command(
    command: OrganizeCommand,
    dir_path: &Path,
    config_path: Option<&Path>,
) -> Result<CommandOutcome> {
    let config = Config::load(config_path).context("Error loading configuration")?;
    let filters = config
        .compile_filters()
        .context("Error compiling filters")?;

    let mut folder = FolderContext::open(dir_path, filters)?;
    match command {
        OrganizeCommand::Organize => Ok(CommandOutcome::Organized(folder.organize()?)),
        OrganizeCommand::Undo => Ok(CommandOutcome::Undone(folder.undo()?)),
    }
}

/// A target folder together with its sort session.
pub struct FolderContext {
    organizer: Organizer,
    session: SortSession,
}

impl FolderContext {
    /// Validates `folder` and loads its journaled session.
    pub fn open(folder: &Path, filters: CompiledFilters) -> SortResult<Self> {
        let mut organizer = Organizer::new(folder, filters)?;
        // Never sort the running program into Programs/.
        if let Ok(exe) = std::env::current_exe() {
            organizer = organizer.exclude_path(exe);
        }
        let session = organizer.load_session()?;
        debug!(
            folder = %organizer.target().display(),
            pending = session.len(),
            "folder opened"
        );
        Ok(Self { organizer, session })
    }

    pub fn folder(&self) -> &Path {
        self.organizer.target()
    }

    pub fn session(&self) -> &SortSession {
        &self.session
    }

    /// Sorts the folder with a progress bar and prints the summary.
    pub fn organize(&mut self) -> SortResult<OrganizeReport> {
        OutputFormatter::info(&format!("Organizing {}", self.folder().display()));
        let progress = OutputFormatter::create_progress_bar(0);
        let result = self
            .organizer
            .organize_with_progress(&mut self.session, &progress);
        progress.finish_and_clear();

        let report = result?;
        OutputFormatter::organize_summary(&report);
        if !self.session.is_empty() {
            OutputFormatter::plain(&format!(
                "Log: {}",
                self.organizer.sort_log().path().display()
            ));
        }
        Ok(report)
    }

    /// Undoes the pending moves and prints the summary.
    pub fn undo(&mut self) -> SortResult<UndoReport> {
        let report = UndoManager::undo(&mut self.session, self.organizer.sort_log())?;
        OutputFormatter::undo_summary(&report);
        Ok(report)
    }
}

/// A parsed menu entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuCommand {
    /// Sort the current folder, or switch to the given one first.
    Organize(Option<PathBuf>),
    Undo,
    /// Switch folder; asks for the path when none is given.
    ChangeFolder(Option<PathBuf>),
    Exit,
    Invalid(String),
}

impl MenuCommand {
    /// Parses one line typed at the menu prompt.
    ///
    /// ```
    /// use foldersort::cli::MenuCommand;
    /// use std::path::PathBuf;
    ///
    /// assert_eq!(MenuCommand::parse("1"), MenuCommand::Organize(None));
    /// assert_eq!(
    ///     MenuCommand::parse("organize /tmp/inbox"),
    ///     MenuCommand::Organize(Some(PathBuf::from("/tmp/inbox")))
    /// );
    /// assert_eq!(MenuCommand::parse("q"), MenuCommand::Exit);
    /// ```
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, clean_path_input(rest)),
            None => (line, String::new()),
        };
        let path = (!rest.is_empty()).then(|| PathBuf::from(&rest));

        match word.to_lowercase().as_str() {
            "1" | "o" | "organize" | "sort" => MenuCommand::Organize(path),
            "2" | "u" | "undo" if path.is_none() => MenuCommand::Undo,
            "3" | "f" | "folder" | "cd" => MenuCommand::ChangeFolder(path),
            "4" | "q" | "quit" | "exit" if path.is_none() => MenuCommand::Exit,
            _ => MenuCommand::Invalid(line.to_string()),
        }
    }
}

/// Strips surrounding whitespace and quotes from a typed path.
fn clean_path_input(input: &str) -> String {
    input.trim().trim_matches(['"', '\'']).to_string()
}

/// Interactive state: configuration plus the folder currently selected.
pub struct App {
    config: Config,
    config_path: Option<PathBuf>,
    filters: CompiledFilters,
    current: Option<FolderContext>,
}

impl App {
    /// Builds the app. `config_path` is where a newly chosen folder is saved;
    /// with `None`, the choice is not remembered.
    pub fn new(config: Config, config_path: Option<PathBuf>) -> Result<Self> {
        let filters = config
            .compile_filters()
            .context("Error compiling filters")?;
        Ok(Self {
            config,
            config_path,
            filters,
            current: None,
        })
    }

    /// The folder remembered from an earlier run, if any.
    pub fn remembered_folder(&self) -> Option<&Path> {
        self.config.folder.as_deref()
    }

    pub fn current(&self) -> Option<&FolderContext> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut FolderContext> {
        self.current.as_mut()
    }

    /// Selects `folder` and remembers it in the configuration file.
    pub fn select_folder(&mut self, folder: &Path) -> SortResult<()> {
        let context = FolderContext::open(folder, self.filters.clone())?;
        let chosen = context.folder().to_path_buf();
        self.current = Some(context);

        if self.config.folder.as_deref() != Some(chosen.as_path()) {
            self.config.folder = Some(chosen);
            self.remember_config();
        }
        Ok(())
    }

    fn remember_config(&self) {
        let Some(path) = &self.config_path else {
            return;
        };
        if let Err(e) = self.config.save(path) {
            warn!(error = %e, "could not save configuration");
            OutputFormatter::warning(&format!("Could not remember the folder: {}", e));
        }
    }

    /// Runs the menu until the user exits or `input` ends.
    pub fn run_menu<R: BufRead>(&mut self, mut input: R) -> Result<()> {
        loop {
            if self.current.is_none() && !self.prompt_for_folder(&mut input)? {
                return Ok(());
            }

            OutputFormatter::menu(self.current.as_ref().map(|c| c.folder()));
            let Some(line) = read_line(&mut input, "Choose (1-4): ")? else {
                return Ok(());
            };

            match MenuCommand::parse(&line) {
                MenuCommand::Organize(path) => {
                    if let Some(path) = path
                        && let Err(e) = self.select_folder(&path)
                    {
                        OutputFormatter::error(&e.to_string());
                        continue;
                    }
                    if let Some(context) = self.current.as_mut()
                        && let Err(e) = context.organize()
                    {
                        OutputFormatter::error(&e.to_string());
                    }
                }
                MenuCommand::Undo => {
                    if let Some(context) = self.current.as_mut()
                        && let Err(e) = context.undo()
                    {
                        OutputFormatter::error(&e.to_string());
                    }
                }
                MenuCommand::ChangeFolder(Some(path)) => {
                    if let Err(e) = self.select_folder(&path) {
                        OutputFormatter::error(&e.to_string());
                    }
                }
                MenuCommand::ChangeFolder(None) => {
                    if !self.prompt_for_folder(&mut input)? {
                        return Ok(());
                    }
                }
                MenuCommand::Exit => {
                    OutputFormatter::plain("Bye!");
                    return Ok(());
                }
                MenuCommand::Invalid(choice) => {
                    OutputFormatter::warning(&format!(
                        "Invalid choice '{}': type 1, 2, 3 or 4",
                        choice
                    ));
                }
            }
        }
    }

    /// Asks for a folder until a valid one is given. Returns false when the
    /// input ends first.
    fn prompt_for_folder<R: BufRead>(&mut self, input: &mut R) -> Result<bool> {
        loop {
            OutputFormatter::plain("Enter the full path of the folder you want to organize.");
            let Some(line) = read_line(input, "Folder path: ")? else {
                return Ok(false);
            };

            let path = clean_path_input(&line);
            if path.is_empty() {
                OutputFormatter::warning("Path cannot be empty.");
                continue;
            }
            match self.select_folder(Path::new(&path)) {
                Ok(()) => {
                    OutputFormatter::success(&format!("Folder set to {}", path));
                    return Ok(true);
                }
                Err(e) => OutputFormatter::error(&e.to_string()),
            }
        }
    }
}

/// Prints `prompt` and reads one line. Returns `None` at end of input.
fn read_line<R: BufRead>(input: &mut R, prompt: &str) -> Result<Option<String>> {
    print!("{}", prompt);
    std::io::stdout().flush().context("Failed to flush stdout")?;

    let mut line = String::new();
    let read = input.read_line(&mut line).context("Failed to read input")?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn test_parse_menu_numbers() {
        assert_eq!(MenuCommand::parse("1"), MenuCommand::Organize(None));
        assert_eq!(MenuCommand::parse(" 2 "), MenuCommand::Undo);
        assert_eq!(MenuCommand::parse("3"), MenuCommand::ChangeFolder(None));
        assert_eq!(MenuCommand::parse("4"), MenuCommand::Exit);
    }

    #[test]
    fn test_parse_menu_words_and_paths() {
        assert_eq!(MenuCommand::parse("EXIT"), MenuCommand::Exit);
        assert_eq!(
            MenuCommand::parse("folder \"/srv/my files\""),
            MenuCommand::ChangeFolder(Some(PathBuf::from("/srv/my files")))
        );
        assert_eq!(
            MenuCommand::parse("undo now"),
            MenuCommand::Invalid("undo now".to_string())
        );
        assert_eq!(
            MenuCommand::parse("7"),
            MenuCommand::Invalid("7".to_string())
        );
    }

    #[test]
    fn test_menu_organize_then_undo() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::write(base.join("clip.mp4"), "v").unwrap();

        let mut app = App::new(Config::default(), None).unwrap();
        app.select_folder(base).unwrap();

        app.run_menu(Cursor::new("1\n")).unwrap();
        assert!(base.join("Videos").join("clip.mp4").exists());
        assert_eq!(app.current().unwrap().session().len(), 1);

        app.run_menu(Cursor::new("2\n4\n")).unwrap();
        assert!(base.join("clip.mp4").exists());
        assert!(app.current().unwrap().session().is_empty());
    }

    #[test]
    fn test_menu_prompts_until_valid_folder() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::write(base.join("a.zip"), "z").unwrap();

        let script = format!("\n/non/existent/path\n{}\n1\nq\n", base.display());
        let mut app = App::new(Config::default(), None).unwrap();
        app.run_menu(Cursor::new(script)).unwrap();

        assert!(base.join("Archives").join("a.zip").exists());
    }

    #[test]
    fn test_select_folder_is_remembered() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let target = TempDir::new().expect("Failed to create temp directory");
        let config_path = temp_dir.path().join("config.toml");

        let mut app = App::new(Config::default(), Some(config_path.clone())).unwrap();
        app.select_folder(target.path()).unwrap();

        let saved = Config::load(Some(&config_path)).unwrap();
        assert_eq!(
            saved.folder.as_deref(),
            Some(app.current().unwrap().folder())
        );
    }

    #[test]
    fn test_run_command_on_invalid_folder_fails() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "").unwrap();

        let result = run_command(
            OrganizeCommand::Organize,
            Path::new("/non/existent/path"),
            Some(&config_path),
        );
        assert!(result.is_err());
    }
}
