//! Syntax highlighting utilities built on top of syntect.

use std::sync::Arc;

use anyhow::Result;
use once_cell::sync::Lazy;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::{LinesWithEndings, as_24_bit_terminal_escaped};

const DEFAULT_THEME: &str = "base16-ocean.dark";
const ANSI_RESET: &str = "\x1b[0m";

static DEFAULT_ASSETS: Lazy<(Arc<SyntaxSet>, Arc<ThemeSet>)> = Lazy::new(|| {
    (
        Arc::new(SyntaxSet::load_defaults_newlines()),
        Arc::new(ThemeSet::load_defaults()),
    )
});

/// Renders text with ANSI colour escapes for terminal display.
#[derive(Debug, Clone)]
pub struct Highlighter {
    syntax_set: Arc<SyntaxSet>,
    theme_set: Arc<ThemeSet>,
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter {
    pub fn new() -> Self {
        let assets = &*DEFAULT_ASSETS;
        Self {
            syntax_set: Arc::clone(&assets.0),
            theme_set: Arc::clone(&assets.1),
        }
    }

    /// Highlight `text` using the syntax registered for `extension` (without the dot).
    ///
    /// Falls back to the unmodified text when the syntax or every theme is unavailable.
    pub fn to_ansi(&self, text: &str, extension: &str, theme: &str) -> String {
        let Some(syntax) = self.syntax_set.find_syntax_by_extension(extension) else {
            tracing::debug!(extension, "no syntax for extension");
            return text.to_owned();
        };
        let Some(theme) = self.resolve_theme(theme) else {
            return text.to_owned();
        };

        match self.highlight_with_syntax(text, theme, syntax) {
            Ok(highlighted) => highlighted,
            Err(err) => {
                tracing::warn!(error = %err, "highlight failed");
                text.to_owned()
            }
        }
    }

    fn highlight_with_syntax(
        &self,
        text: &str,
        theme: &Theme,
        syntax: &SyntaxReference,
    ) -> Result<String> {
        let mut highlighter = HighlightLines::new(syntax, theme);
        let mut out = String::with_capacity(text.len() * 2);
        for line in LinesWithEndings::from(text) {
            let ranges = highlighter.highlight_line(line, &self.syntax_set)?;
            out.push_str(&as_24_bit_terminal_escaped(&ranges, false));
        }
        out.push_str(ANSI_RESET);
        Ok(out)
    }

    fn resolve_theme(&self, requested: &str) -> Option<&Theme> {
        if let Some(theme) = self.theme_set.themes.get(requested) {
            return Some(theme);
        }

        if let Some((_, theme)) = self
            .theme_set
            .themes
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(requested))
        {
            return Some(theme);
        }

        tracing::warn!(requested, fallback = DEFAULT_THEME, "theme not found");
        self.theme_set
            .themes
            .get(DEFAULT_THEME)
            .or_else(|| self.theme_set.themes.values().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_theme_is_available() {
        let highlighter = Highlighter::new();
        assert!(highlighter.theme_set.themes.contains_key(DEFAULT_THEME));
    }

    #[test]
    fn markdown_gets_escape_codes() {
        let highlighter = Highlighter::new();
        let rendered = highlighter.to_ansi("# Title\n\nbody\n", "md", DEFAULT_THEME);
        assert!(rendered.contains("\x1b["));
        assert!(rendered.contains("Title"));
        assert!(rendered.ends_with(ANSI_RESET));
    }

    #[test]
    fn unknown_theme_falls_back() {
        let highlighter = Highlighter::new();
        let rendered = highlighter.to_ansi("plain", "md", "not-a-theme");
        assert!(rendered.contains("\x1b["));
    }

    #[test]
    fn unknown_syntax_returns_text_unchanged() {
        let highlighter = Highlighter::new();
        assert_eq!(highlighter.to_ansi("raw", "nope-ext", DEFAULT_THEME), "raw");
    }
}
