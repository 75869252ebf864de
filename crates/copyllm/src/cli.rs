//! Command-line interface.

use std::env;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use crate::app::command::{CommandOutcome, CopyCommand};
use crate::app::selection::Invocation;
use crate::domain::model::Resource;
use crate::infra::clipboard::SystemClipboard;
use crate::infra::config::{Config, normalize_extension};
use crate::infra::git::resolve_workspace_root;
use crate::infra::workbench::{DisplayMode, TerminalWorkbench};

/// Copy files and folders to the clipboard as labelled code blocks for LLM prompts.
///
/// With several paths, folders are expanded first and loose files follow. Without any path
/// the configured `selection.command` is asked to put the current selection on the clipboard.
#[derive(Parser, Debug)]
#[command(name = "copyllm", author, version, about, long_about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Files, folders, or file:// URIs to copy
    #[arg(value_name = "PATH")]
    pub paths: Vec<String>,

    /// Replace the extension allow-list (repeatable or comma-separated)
    #[arg(long = "ext", value_name = "EXT", value_delimiter = ',')]
    pub extensions: Vec<String>,

    /// Label blocks relative to the workspace root
    #[arg(long)]
    pub relative: bool,

    /// Workspace root (defaults to the enclosing git work tree, then the current directory)
    #[arg(long, value_name = "DIR")]
    pub workspace: Option<PathBuf>,

    /// Do not display the copied document
    #[arg(long, conflicts_with = "print")]
    pub no_open: bool,

    /// Print the copied document to stdout instead of opening an editor
    #[arg(long)]
    pub print: bool,

    /// Highlighting theme used when printing to a terminal
    #[arg(long, value_name = "NAME")]
    pub theme: Option<String>,

    /// Increase log verbosity
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the effective configuration as TOML
    Config,
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Cli {
    pub fn verbosity(&self) -> i8 {
        if self.quiet {
            -1
        } else {
            i8::try_from(self.verbose).unwrap_or(i8::MAX)
        }
    }

    fn apply_overrides(&self, config: &mut Config) {
        if !self.extensions.is_empty() {
            config.copy.set_extensions(
                self.extensions
                    .iter()
                    .map(|ext| ext.trim())
                    .filter(|ext| !ext.is_empty())
                    .map(normalize_extension)
                    .collect(),
            );
        }
        if self.relative {
            config.copy.set_use_relative_paths(true);
        }
        if self.no_open {
            config.viewer.set_open(false);
        }
        if let Some(theme) = &self.theme {
            config.viewer.set_theme(theme.clone());
        }
    }

    /// Positional arguments as resources; only `scheme://` arguments are read as URIs.
    pub fn resources(&self) -> Result<Vec<Resource>> {
        self.paths
            .iter()
            .map(|raw| {
                raw.parse::<Resource>()
                    .with_context(|| format!("invalid path argument '{raw}'"))
            })
            .collect()
    }
}

pub fn run(cli: Cli) -> Result<()> {
    if let Some(Commands::Completions { shell }) = &cli.command {
        clap_complete::generate(*shell, &mut Cli::command(), "copyllm", &mut io::stdout());
        return Ok(());
    }

    let cwd = env::current_dir().context("unable to determine working directory")?;
    let workspace = resolve_workspace_root(cli.workspace.clone(), &cwd);
    let mut config = Config::load(Some(&workspace))?;
    cli.apply_overrides(&mut config);

    if let Some(Commands::Config) = &cli.command {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let invocation = Invocation::from_resources(cli.resources()?);

    let mut workbench = TerminalWorkbench::new(Some(workspace), &config);
    if cli.print {
        workbench = workbench.with_display(DisplayMode::Stdout);
    }
    let mut clipboard = SystemClipboard::new();

    match CopyCommand::new(config).run(&invocation, &mut clipboard, &mut workbench)? {
        CommandOutcome::Copied(report) => {
            tracing::debug!(
                blocks = report.blocks,
                characters = report.tokens.characters,
                "copy finished"
            );
        }
        CommandOutcome::NoSelection | CommandOutcome::Skipped => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_paths_and_flags() {
        let cli = Cli::parse_from(["copyllm", "--ext", "rs,md", "--ext", "toml", "-vv", "src"]);
        assert_eq!(cli.paths, vec!["src"]);
        assert_eq!(cli.extensions, vec!["rs", "md", "toml"]);
        assert_eq!(cli.verbosity(), 2);
    }

    #[test]
    fn overrides_replace_config_values() {
        let cli = Cli::parse_from(["copyllm", "--ext", "py", "--relative", "--no-open"]);
        let mut config = Config::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.copy.extensions(), vec![".py"]);
        assert!(config.copy.use_relative_paths());
        assert!(!config.viewer.open());
    }

    #[test]
    fn colon_in_relative_path_is_a_file() -> Result<()> {
        let cli = Cli::parse_from(["copyllm", "draft:notes.md", "src/lib.rs"]);
        let resources = cli.resources()?;
        assert_eq!(resources[0], Resource::file("draft:notes.md"));
        assert!(resources.iter().all(Resource::is_local));
        Ok(())
    }

    #[test]
    fn print_and_no_open_conflict() {
        assert!(Cli::try_parse_from(["copyllm", "--print", "--no-open"]).is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
