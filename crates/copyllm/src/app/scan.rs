//! Directory scanning services.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ignore::WalkBuilder;

use crate::app::filter::ExtensionFilter;

/// Files whose path contains this fragment are never aggregated (vendored UI components).
pub const EXCLUDED_PATH_FRAGMENT: &str = "shadcn";

/// Result of scanning a directory root.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanResult {
    pub root: PathBuf,
    /// Matched files in traversal order.
    pub files: Vec<PathBuf>,
}

/// Depth-first walker applying the extension allow-list.
///
/// Entries are visited in the order the filesystem reports them. Nothing is sorted and no
/// ignore files or hidden-file rules apply. Symbolic links are neither followed nor included.
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    filter: ExtensionFilter,
}

impl Scanner {
    pub fn new(filter: ExtensionFilter) -> Self {
        Self { filter }
    }

    pub fn scan(&self, root: &Path) -> Result<ScanResult> {
        let walker = WalkBuilder::new(root)
            .standard_filters(false)
            .follow_links(false)
            .max_depth(None)
            .build();

        let mut files = Vec::new();
        for result in walker {
            let entry =
                result.with_context(|| format!("failed to traverse {}", root.display()))?;
            let is_file = entry.file_type().is_some_and(|ft| ft.is_file());
            if !is_file {
                continue;
            }

            let path = entry.path();
            // Only file paths are checked; excluded folders are still descended into.
            if path.to_string_lossy().contains(EXCLUDED_PATH_FRAGMENT) {
                tracing::debug!(path = %path.display(), "skipping excluded path");
                continue;
            }
            if self.filter.matches(path) {
                files.push(path.to_path_buf());
            }
        }

        tracing::debug!(root = %root.display(), matched = files.len(), "scan complete");
        Ok(ScanResult {
            root: root.to_path_buf(),
            files,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn relative(result: &ScanResult) -> Vec<String> {
        let mut paths: Vec<String> = result
            .files
            .iter()
            .map(|path| {
                path.strip_prefix(&result.root)
                    .unwrap_or(path)
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        paths.sort();
        paths
    }

    #[test]
    fn collects_matching_files_recursively() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path();
        fs::create_dir_all(root.join("src/nested/deeper"))?;
        fs::write(root.join("src/lib.rs"), "pub fn lib() {}")?;
        fs::write(root.join("src/nested/deeper/mod.rs"), "mod x;")?;
        fs::write(root.join("README.md"), "# readme")?;
        fs::write(root.join("logo.png"), [0u8, 1, 2])?;

        let scanner = Scanner::new(ExtensionFilter::new([".rs", ".md"]));
        let result = scanner.scan(root)?;

        assert_eq!(
            relative(&result),
            vec!["README.md", "src/lib.rs", "src/nested/deeper/mod.rs"]
        );
        Ok(())
    }

    #[test]
    fn skips_excluded_fragment_but_descends_into_it() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path();
        fs::create_dir_all(root.join("components/shadcn/ui"))?;
        fs::create_dir_all(root.join("components/app"))?;
        fs::write(root.join("components/shadcn/ui/button.tsx"), "export {}")?;
        fs::write(root.join("components/shadcn-theme.css"), "body {}")?;
        fs::write(root.join("components/app/page.tsx"), "export {}")?;

        let result = Scanner::default().scan(root)?;
        assert_eq!(relative(&result), vec!["components/app/page.tsx"]);
        Ok(())
    }

    #[test]
    fn ignores_gitignore_and_includes_hidden_files() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path();
        fs::create_dir_all(root.join(".config"))?;
        fs::write(root.join(".gitignore"), "generated.ts\n")?;
        fs::write(root.join("generated.ts"), "export {}")?;
        fs::write(root.join(".config/settings.json"), "{}")?;

        let result = Scanner::default().scan(root)?;
        assert_eq!(
            relative(&result),
            vec![".config/settings.json", "generated.ts"]
        );
        Ok(())
    }

    #[test]
    fn repeated_scans_are_identical() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path();
        for name in ["b.py", "a.py", "c.txt"] {
            fs::write(root.join(name), name)?;
        }

        let scanner = Scanner::default();
        assert_eq!(scanner.scan(root)?, scanner.scan(root)?);
        Ok(())
    }

    /// Depth-first listing straight from `read_dir`, descending as soon as a folder is met.
    fn read_dir_order(dir: &Path, filter: &ExtensionFilter, out: &mut Vec<PathBuf>) -> Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                read_dir_order(&entry.path(), filter, out)?;
            } else if file_type.is_file() && filter.matches(&entry.path()) {
                out.push(entry.path());
            }
        }
        Ok(())
    }

    #[test]
    fn follows_filesystem_enumeration_order() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path();
        for dir in ["zeta", "alpha/inner", "mid"] {
            fs::create_dir_all(root.join(dir))?;
        }
        for file in [
            "z.rs", "b.rs", "a.rs", "zeta/y.rs", "zeta/c.rs", "alpha/q.rs", "alpha/inner/k.rs",
            "alpha/inner/d.rs", "mid/m.rs", "mid/e.rs",
        ] {
            fs::write(root.join(file), file)?;
        }

        let filter = ExtensionFilter::new([".rs"]);
        let mut expected = Vec::new();
        read_dir_order(root, &filter, &mut expected)?;

        let result = Scanner::new(filter).scan(root)?;
        assert_eq!(result.files, expected);
        Ok(())
    }

    #[test]
    fn missing_root_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let missing = temp.path().join("nope");
        assert!(Scanner::default().scan(&missing).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_not_followed() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path();
        fs::create_dir_all(root.join("real"))?;
        fs::write(root.join("real/a.rs"), "fn a() {}")?;
        std::os::unix::fs::symlink(root.join("real"), root.join("loop"))?;
        std::os::unix::fs::symlink(root.join("real/a.rs"), root.join("alias.rs"))?;

        let result = Scanner::default().scan(root)?;
        assert_eq!(relative(&result), vec!["real/a.rs"]);
        Ok(())
    }
}
