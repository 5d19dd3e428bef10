//! Extension-based file classification.
//!
//! Maps a file's extension (lowercase, with the leading dot) to a category
//! name such as "Images" or "Documents". Extensions without an explicit rule
//! resolve to a configurable fallback category.

use std::collections::HashMap;
use std::path::Path;

/// Default category assigned to extensions with no explicit rule.
pub const DEFAULT_FALLBACK: &str = "Others";

/// Immutable extension-to-category rule set.
///
/// Built once at startup from the default table plus any configured
/// overrides, then shared for the duration of a run.
///
/// # Examples
///
/// ```
/// use dirsort::classifier::CategoryRules;
///
/// let rules = CategoryRules::default();
/// assert_eq!(rules.classify(".pdf"), "Documents");
/// assert_eq!(rules.classify(".JPG"), "Images");
/// assert_eq!(rules.classify(".xyz"), "Others");
/// ```
#[derive(Debug, Clone)]
pub struct CategoryRules {
    map: HashMap<String, String>,
    fallback: String,
}

impl CategoryRules {
    /// Creates a rule set with the standard extension table and the default
    /// fallback category.
    pub fn new() -> Self {
        let mut rules = Self {
            map: HashMap::new(),
            fallback: DEFAULT_FALLBACK.to_string(),
        };
        rules.populate_standard_rules();
        rules
    }

    /// Creates an empty rule set with the given fallback category.
    ///
    /// Useful for fully custom tables; most callers want [`CategoryRules::new`]
    /// followed by [`CategoryRules::add_rule`] overrides.
    pub fn empty(fallback: &str) -> Self {
        Self {
            map: HashMap::new(),
            fallback: fallback.to_string(),
        }
    }

    fn populate_standard_rules(&mut self) {
        // Images
        self.add_rule(".jpg", "Images");
        self.add_rule(".jpeg", "Images");
        self.add_rule(".png", "Images");
        self.add_rule(".gif", "Images");
        self.add_rule(".bmp", "Images");
        self.add_rule(".tiff", "Images");
        self.add_rule(".svg", "Images");

        // Documents
        self.add_rule(".pdf", "Documents");
        self.add_rule(".doc", "Documents");
        self.add_rule(".docx", "Documents");
        self.add_rule(".txt", "Documents");
        self.add_rule(".rtf", "Documents");
        self.add_rule(".odt", "Documents");

        // Spreadsheets
        self.add_rule(".xls", "Spreadsheets");
        self.add_rule(".xlsx", "Spreadsheets");
        self.add_rule(".csv", "Spreadsheets");

        // Presentations
        self.add_rule(".ppt", "Presentations");
        self.add_rule(".pptx", "Presentations");

        // Archives
        self.add_rule(".zip", "Archives");
        self.add_rule(".rar", "Archives");
        self.add_rule(".7z", "Archives");
        self.add_rule(".tar", "Archives");
        self.add_rule(".gz", "Archives");

        // Audio
        self.add_rule(".mp3", "Audio");
        self.add_rule(".wav", "Audio");
        self.add_rule(".aac", "Audio");
        self.add_rule(".flac", "Audio");

        // Video
        self.add_rule(".mp4", "Video");
        self.add_rule(".mov", "Video");
        self.add_rule(".avi", "Video");
        self.add_rule(".mkv", "Video");

        // Code and scripts
        self.add_rule(".py", "Scripts");
        self.add_rule(".js", "Scripts");
        self.add_rule(".html", "Web");
        self.add_rule(".css", "Web");

        // Executables and installers
        self.add_rule(".exe", "Executables");
        self.add_rule(".msi", "Executables");
    }

    /// Adds or replaces a rule. The extension is stored lowercase; a missing
    /// leading dot is added so config entries may write either `jpg` or `.jpg`.
    pub fn add_rule(&mut self, extension: &str, category: &str) {
        let ext = extension.to_lowercase();
        let key = if ext.starts_with('.') {
            ext
        } else {
            format!(".{}", ext)
        };
        self.map.insert(key, category.to_string());
    }

    /// Replaces the fallback category.
    pub fn set_fallback(&mut self, fallback: &str) {
        self.fallback = fallback.to_string();
    }

    /// Returns the fallback category name.
    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Maps an extension to its category.
    ///
    /// Total over all strings: the lookup is case-insensitive and any miss
    /// (including the empty string) yields the fallback category.
    pub fn classify(&self, extension: &str) -> &str {
        self.map
            .get(&extension.to_lowercase())
            .map(String::as_str)
            .unwrap_or(&self.fallback)
    }

    /// Classifies a path by its extension.
    ///
    /// A path with no extension classifies as the fallback category.
    pub fn classify_path(&self, path: &Path) -> &str {
        match path.extension() {
            Some(ext) => {
                let dotted = format!(".{}", ext.to_string_lossy());
                self.classify(&dotted)
            }
            None => &self.fallback,
        }
    }
}

impl Default for CategoryRules {
    fn default() -> Self {
        Self::new()
    }
}
