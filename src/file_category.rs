/// File classification by extension.
///
/// A fixed table of [`CategoryRule`]s maps file extensions to a [`Category`].
/// The table is loaded once into a lookup map by [`FileMapper::new`] and is
/// never modified afterwards.
///
/// # Examples
///
/// ```
/// use foldersort::file_category::{Category, FileMapper};
///
/// let mapper = FileMapper::default();
/// assert_eq!(mapper.classify("holiday.JPG"), Category::Images);
/// assert_eq!(mapper.classify("report.docx"), Category::Documents);
/// assert_eq!(mapper.classify("notes.xyz"), Category::Other);
/// ```
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// A group of file types, one per destination subfolder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Images,
    Videos,
    Music,
    Documents,
    Programs,
    Archives,
    /// Files whose extension is missing or not in the table.
    Other,
}

impl Category {
    /// Every category, in the order they are listed in summaries.
    pub const ALL: [Category; 7] = [
        Category::Images,
        Category::Videos,
        Category::Music,
        Category::Documents,
        Category::Programs,
        Category::Archives,
        Category::Other,
    ];

    /// Returns the subfolder name for this category.
    ///
    /// ```
    /// use foldersort::file_category::Category;
    ///
    /// assert_eq!(Category::Videos.dir_name(), "Videos");
    /// assert_eq!(Category::Other.dir_name(), "Other");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Images => "Images",
            Category::Videos => "Videos",
            Category::Music => "Music",
            Category::Documents => "Documents",
            Category::Programs => "Programs",
            Category::Archives => "Archives",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Associates a set of extensions (lowercase, no leading dot) with a category.
#[derive(Debug, Clone, Copy)]
pub struct CategoryRule {
    pub category: Category,
    pub extensions: &'static [&'static str],
}

/// The fixed extension table.
pub const CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        category: Category::Images,
        extensions: &["png", "jpg", "jpeg", "gif", "bmp", "webp", "svg", "ico", "tiff"],
    },
    CategoryRule {
        category: Category::Videos,
        extensions: &["mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v"],
    },
    CategoryRule {
        category: Category::Music,
        extensions: &["mp3", "wav", "flac", "aac", "ogg", "m4a", "wma"],
    },
    CategoryRule {
        category: Category::Documents,
        extensions: &["pdf", "txt", "doc", "docx", "xls", "xlsx", "ppt", "pptx"],
    },
    CategoryRule {
        category: Category::Programs,
        extensions: &["exe", "msi", "deb", "dmg"],
    },
    CategoryRule {
        category: Category::Archives,
        extensions: &["zip", "rar", "7z", "tar", "gz", "bz2"],
    },
];

/// Maps file names to categories using [`CATEGORY_RULES`].
#[derive(Debug, Clone)]
pub struct FileMapper {
    extension_map: HashMap<&'static str, Category>,
}

impl FileMapper {
    /// Builds the lookup map from the fixed rule table.
    pub fn new() -> Self {
        let extension_map = CATEGORY_RULES
            .iter()
            .flat_map(|rule| rule.extensions.iter().map(move |ext| (*ext, rule.category)))
            .collect();
        Self { extension_map }
    }

    /// Maps a bare extension (without the dot) to a category, ignoring case.
    ///
    /// ```
    /// use foldersort::file_category::{Category, FileMapper};
    ///
    /// let mapper = FileMapper::default();
    /// assert_eq!(mapper.extension_to_category("MP3"), Some(Category::Music));
    /// assert_eq!(mapper.extension_to_category("xyz"), None);
    /// ```
    pub fn extension_to_category(&self, ext: &str) -> Option<Category> {
        self.extension_map.get(ext.to_lowercase().as_str()).copied()
    }

    /// Determines the category of a file from its name.
    ///
    /// The extension is the text after the last '.'. Names with no extension,
    /// dotfiles such as `.bashrc`, and unknown extensions all yield
    /// [`Category::Other`].
    pub fn classify(&self, file_name: &str) -> Category {
        Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.extension_to_category(ext))
            .unwrap_or(Category::Other)
    }
}

impl Default for FileMapper {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_dir_names() {
        assert_eq!(Category::Images.dir_name(), "Images");
        assert_eq!(Category::Videos.dir_name(), "Videos");
        assert_eq!(Category::Music.dir_name(), "Music");
        assert_eq!(Category::Documents.dir_name(), "Documents");
        assert_eq!(Category::Programs.dir_name(), "Programs");
        assert_eq!(Category::Archives.dir_name(), "Archives");
        assert_eq!(Category::Other.dir_name(), "Other");
    }

    #[test]
    fn test_rules_do_not_overlap() {
        let total: usize = CATEGORY_RULES.iter().map(|r| r.extensions.len()).sum();
        assert_eq!(FileMapper::new().extension_map.len(), total);
    }

    #[test]
    fn test_every_rule_extension_classifies_to_its_category() {
        let mapper = FileMapper::default();
        for rule in CATEGORY_RULES {
            for ext in rule.extensions {
                assert_eq!(
                    mapper.classify(&format!("file.{}", ext)),
                    rule.category,
                    "extension {}",
                    ext
                );
            }
        }
    }

    #[test]
    fn test_classify_case_insensitive() {
        let mapper = FileMapper::default();
        assert_eq!(mapper.classify("PHOTO.PNG"), Category::Images);
        assert_eq!(mapper.classify("Clip.Mp4"), Category::Videos);
    }

    #[test]
    fn test_classify_uses_last_extension() {
        let mapper = FileMapper::default();
        assert_eq!(mapper.classify("backup.tar.gz"), Category::Archives);
        assert_eq!(mapper.classify("report.final.pdf"), Category::Documents);
        assert_eq!(mapper.classify("song.mp3.part"), Category::Other);
    }

    #[test]
    fn test_classify_defaults_to_other() {
        let mapper = FileMapper::default();
        assert_eq!(mapper.classify("notes.xyz"), Category::Other);
        assert_eq!(mapper.classify("Makefile"), Category::Other);
        assert_eq!(mapper.classify(".bashrc"), Category::Other);
        assert_eq!(mapper.classify("trailing."), Category::Other);
    }
}
