//! Display labels for aggregated blocks.

use std::path::{Component, Path, PathBuf};

use crate::infra::config::Config;

/// Turns file paths into the labels printed above each fenced block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelFormatter {
    use_relative_paths: bool,
    workspace_root: Option<PathBuf>,
}

impl LabelFormatter {
    pub fn new(use_relative_paths: bool, workspace_root: Option<PathBuf>) -> Self {
        Self {
            use_relative_paths,
            workspace_root,
        }
    }

    pub fn from_config(config: &Config, workspace_root: Option<PathBuf>) -> Self {
        Self::new(config.copy.use_relative_paths(), workspace_root)
    }

    /// Label for `file`, optionally discovered under `base`.
    ///
    /// Workspace-relative labels win whenever they are enabled and a workspace is known;
    /// otherwise the base folder name prefixes the path below it, and a file without a base
    /// is labelled by its bare name.
    pub fn label(&self, file: &Path, base: Option<&Path>) -> String {
        if self.use_relative_paths
            && let Some(root) = &self.workspace_root
        {
            return to_slash(&relative_path(root, file));
        }

        match base {
            Some(base) => {
                let base_name = base
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                format!("{base_name}/{}", to_slash(&relative_path(base, file)))
            }
            None => file
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| to_slash(file)),
        }
    }
}

/// Path leading from `from` to `to`, climbing with `..` where they diverge.
pub fn relative_path(from: &Path, to: &Path) -> PathBuf {
    let from: Vec<Component<'_>> = from.components().collect();
    let to: Vec<Component<'_>> = to.components().collect();
    let common = from
        .iter()
        .zip(&to)
        .take_while(|(left, right)| left == right)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..from.len() {
        relative.push("..");
    }
    for component in to.iter().skip(common) {
        relative.push(component.as_os_str());
    }
    relative
}

/// Resolve `.` and `..` components without touching the filesystem.
///
/// `..` at the root stays at the root. Symbolic links are not resolved.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Normalize path to a forward-slash separated string.
fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
