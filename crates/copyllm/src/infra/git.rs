//! Git integration utilities.

use std::path::{Path, PathBuf};

use crate::app::label::normalize_path;

/// Work tree root of the repository enclosing `start`, if any.
pub fn repository_root(start: impl AsRef<Path>) -> Option<PathBuf> {
    let repo = match gix::discover(start.as_ref()) {
        Ok(repo) => repo,
        Err(err) => {
            tracing::debug!(start = %start.as_ref().display(), error = %err, "no git repository");
            return None;
        }
    };

    repo.work_dir()
        .map(Path::to_path_buf)
        .or_else(|| repo.path().parent().map(Path::to_path_buf))
}

/// Workspace root used for relative labels and workspace configuration.
///
/// An explicit directory wins, then the enclosing git work tree, then `cwd` itself.
pub fn resolve_workspace_root(explicit: Option<PathBuf>, cwd: &Path) -> PathBuf {
    explicit
        .map(|dir| normalize_path(&cwd.join(dir)))
        .or_else(|| repository_root(cwd))
        .unwrap_or_else(|| cwd.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn discovers_enclosing_repository() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let repo_dir = temp.path().join("repo");
        fs::create_dir_all(repo_dir.join("src/nested"))?;
        gix::init(&repo_dir)?;

        let root = repository_root(repo_dir.join("src/nested")).expect("repository found");
        assert_eq!(fs::canonicalize(root)?, fs::canonicalize(&repo_dir)?);
        Ok(())
    }

    #[test]
    fn explicit_workspace_wins() {
        let cwd = Path::new("/somewhere");
        assert_eq!(
            resolve_workspace_root(Some(PathBuf::from("proj")), cwd),
            PathBuf::from("/somewhere/proj")
        );
        assert_eq!(
            resolve_workspace_root(Some(PathBuf::from("../proj")), &cwd.join("deep")),
            PathBuf::from("/somewhere/proj")
        );
    }

    #[test]
    fn falls_back_to_cwd_outside_repositories() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let resolved = resolve_workspace_root(None, temp.path());
        // The temp dir may itself live inside a repository on some machines.
        assert!(temp.path().starts_with(&resolved));
        Ok(())
    }
}
