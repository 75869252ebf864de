//! Host-side capabilities used by the copy command.

use std::env;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, anyhow};
use time::OffsetDateTime;
use time::macros::format_description;

use crate::infra::config::Config;
use crate::infra::highlight::Highlighter;

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

impl NoticeLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeLevel::Info => "info",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        }
    }
}

/// The environment a command runs in: notifications, selection, and document display.
pub trait Workbench {
    /// Root of the open workspace, if one is known.
    fn workspace_root(&self) -> Option<&Path>;

    /// Ask the host to place the currently selected paths on the clipboard, one per line.
    fn copy_selected_paths(&mut self) -> Result<()>;

    fn notify(&mut self, level: NoticeLevel, message: &str);

    /// Show `content` as a new unsaved document tagged with `language`.
    fn open_document(&mut self, content: &str, language: &str) -> Result<()>;
}

/// How [`TerminalWorkbench`] shows aggregated documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// `$VISUAL`/`$EDITOR` on an interactive terminal, stdout otherwise.
    #[default]
    Auto,
    Stdout,
    Disabled,
}

/// Workbench backed by the terminal, the user's editor, and an optional selection hook.
#[derive(Debug, Clone)]
pub struct TerminalWorkbench {
    workspace_root: Option<PathBuf>,
    selection_command: Option<String>,
    display: DisplayMode,
    theme: String,
    highlighter: Highlighter,
}

impl TerminalWorkbench {
    pub fn new(workspace_root: Option<PathBuf>, config: &Config) -> Self {
        let display = if config.viewer.open() {
            DisplayMode::Auto
        } else {
            DisplayMode::Disabled
        };
        Self {
            workspace_root,
            selection_command: config.selection.command.clone(),
            display,
            theme: config.viewer.theme(),
            highlighter: Highlighter::new(),
        }
    }

    pub fn with_display(mut self, display: DisplayMode) -> Self {
        self.display = display;
        self
    }

    fn print_document(&self, content: &str, language: &str) -> Result<()> {
        let mut stdout = io::stdout().lock();
        if stdout.is_terminal() {
            let highlighted =
                self.highlighter
                    .to_ansi(content, language_extension(language), &self.theme);
            stdout.write_all(highlighted.as_bytes())?;
        } else {
            stdout.write_all(content.as_bytes())?;
        }
        if !content.ends_with('\n') {
            stdout.write_all(b"\n")?;
        }
        stdout.flush().context("failed to write document to stdout")
    }

    fn edit_document(&self, editor: &str, content: &str, language: &str) -> Result<()> {
        let path = write_scratch_file(content, language_extension(language))?;
        let mut parts = editor.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| anyhow!("editor command is empty"))?;

        tracing::info!(editor = program, path = %path.display(), "opening scratch document");
        let status = Command::new(program)
            .args(parts)
            .arg(&path)
            .status()
            .with_context(|| format!("failed to launch editor: {program}"))?;
        if !status.success() {
            tracing::warn!(%status, "editor exited unsuccessfully");
        }
        Ok(())
    }
}

impl Workbench for TerminalWorkbench {
    fn workspace_root(&self) -> Option<&Path> {
        self.workspace_root.as_deref()
    }

    fn copy_selected_paths(&mut self) -> Result<()> {
        let Some(command) = self.selection_command.as_deref() else {
            tracing::debug!("no selection command configured");
            return Ok(());
        };

        tracing::debug!(command, "running selection command");
        let status = shell(command)
            .status()
            .with_context(|| format!("failed to run selection command: {command}"))?;
        if status.success() {
            Ok(())
        } else {
            Err(anyhow!("selection command exited with status {status}"))
        }
    }

    fn notify(&mut self, level: NoticeLevel, message: &str) {
        tracing::debug!(level = level.as_str(), "notice shown");
        eprintln!("{}", notice_line(level, message));
    }

    fn open_document(&mut self, content: &str, language: &str) -> Result<()> {
        match self.display {
            DisplayMode::Disabled => Ok(()),
            DisplayMode::Stdout => self.print_document(content, language),
            DisplayMode::Auto => match interactive_editor() {
                Some(editor) => self.edit_document(&editor, content, language),
                None => self.print_document(content, language),
            },
        }
    }
}

/// Line printed to stderr for a notice.
fn notice_line(level: NoticeLevel, message: &str) -> String {
    format!("{}: {message}", level.as_str())
}

fn interactive_editor() -> Option<String> {
    if !io::stdout().is_terminal() || !io::stdin().is_terminal() {
        return None;
    }
    env::var("VISUAL")
        .ok()
        .or_else(|| env::var("EDITOR").ok())
        .filter(|editor| !editor.trim().is_empty())
}

fn language_extension(language: &str) -> &str {
    match language {
        "markdown" => "md",
        other => other,
    }
}

/// Persist `content` as a timestamped file in the temp directory.
fn write_scratch_file(content: &str, extension: &str) -> Result<PathBuf> {
    let stamp = OffsetDateTime::now_utc()
        .format(format_description!(
            "[year][month][day]-[hour][minute][second]"
        ))
        .context("failed to format scratch file timestamp")?;

    let mut file = tempfile::Builder::new()
        .prefix(&format!("copyllm-{stamp}-"))
        .suffix(&format!(".{extension}"))
        .tempfile()
        .context("failed to create scratch document")?;
    file.write_all(content.as_bytes())
        .context("failed to write scratch document")?;

    let (_, path) = file.keep().context("failed to persist scratch document")?;
    Ok(path)
}

#[cfg(unix)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}
