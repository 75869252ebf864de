//! Extension allow-list deciding which files are aggregated.

use std::path::Path;

use crate::infra::config::Config;

/// Built-in extension list used when configuration does not provide one.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    ".js", ".jsx", ".ts", ".tsx", ".mjs", ".cjs", ".html", ".htm", ".xml", ".ejs", ".pug",
    ".jade", ".twig", ".erb", ".mustache", ".latte", ".css", ".scss", ".sass", ".less", ".styl",
    ".json", ".jsonc", ".yaml", ".yml", ".toml", ".ini", ".env", ".md", ".markdown", ".mdx",
    ".rst", ".txt", ".ex", ".exs", ".heex", ".leex", ".eex", ".vue", ".svelte", ".astro", ".py",
    ".rb", ".php", ".java", ".scala", ".c", ".cpp", ".h", ".hpp", ".cs", ".go", ".rs", ".swift",
    ".kt", ".kts", ".dart", ".lua", ".zig", ".hs", ".ml", ".clj", ".erl", ".sql", ".graphql",
    ".proto", ".tf", ".gradle", ".sh", ".bat", ".ps1", ".csv", ".tsv", ".cfg", ".conf",
    ".properties", ".ics",
];

/// Ordered set of recognized filename suffixes, each beginning with `.`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionFilter {
    extensions: Vec<String>,
}

impl Default for ExtensionFilter {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS.iter().map(|ext| (*ext).to_owned()))
    }
}

impl ExtensionFilter {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extensions: extensions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.copy.extensions())
    }

    /// Whether the file's extension is part of the set. Matching is case-sensitive.
    pub fn matches(&self, path: &Path) -> bool {
        match extension_of(path) {
            Some(ext) => self.extensions.iter().any(|candidate| *candidate == ext),
            None => false,
        }
    }
}

/// Suffix after the last `.` of the file name, dot included.
///
/// Dotfiles without a further dot (`.env`, `.gitignore`) have no extension.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
}
