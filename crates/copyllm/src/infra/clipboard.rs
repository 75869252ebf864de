//! Clipboard integration utilities.

use std::cell::{Cell, RefCell};
use std::io::{Read, Write};
use std::process::{Command, Stdio};
use std::rc::Rc;

use anyhow::{Context, Result, anyhow};

/// Read/write access to a text clipboard.
pub trait ClipboardService {
    fn read_text(&mut self) -> Result<String>;
    fn write_text(&mut self, text: &str) -> Result<()>;
}

/// Cross-platform system clipboard with fallbacks for headless environments.
pub struct SystemClipboard {
    primary: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    /// Attempt to initialize the system clipboard. When unavailable we fall back to shell-based
    /// clipboard utilities.
    pub fn new() -> Self {
        let primary = match arboard::Clipboard::new() {
            Ok(clipboard) => Some(clipboard),
            Err(err) => {
                tracing::debug!(error = %err, "system clipboard unavailable, using commands");
                None
            }
        };
        Self { primary }
    }
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipboardService for SystemClipboard {
    fn read_text(&mut self) -> Result<String> {
        if let Some(primary) = self.primary.as_mut() {
            match primary.get_text() {
                Ok(text) => return Ok(text),
                // An empty clipboard is not a backend failure.
                Err(arboard::Error::ContentNotAvailable) => return Ok(String::new()),
                Err(err) => {
                    tracing::debug!(error = %err, "clipboard read failed, trying commands");
                }
            }
        }
        fallback_read()
    }

    fn write_text(&mut self, text: &str) -> Result<()> {
        for backend in write_backends() {
            match backend {
                WriteBackend::Commands => match fallback_write(text) {
                    Ok(()) => return Ok(()),
                    Err(err) => tracing::debug!(error = %err, "clipboard commands failed"),
                },
                WriteBackend::Arboard => {
                    let Some(primary) = self.primary.as_mut() else {
                        continue;
                    };
                    match primary.set_text(text.to_owned()) {
                        Ok(()) => {
                            if SELECTION_ENDS_WITH_PROCESS {
                                tracing::warn!(
                                    "clipboard is held by this process; it stays available only if a clipboard manager takes it over"
                                );
                            }
                            return Ok(());
                        }
                        Err(err) => {
                            tracing::debug!(error = %err, "clipboard write failed");
                            self.primary = None;
                        }
                    }
                }
            }
        }

        Err(anyhow!(
            "failed to copy text to clipboard using available backends"
        ))
    }
}

/// Ways of writing the clipboard, tried in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteBackend {
    Arboard,
    Commands,
}

/// On X11 and Wayland the selection is served by its owner, so an in-process owner loses it on
/// exit. `xclip` and `wl-copy` fork a holder that outlives us.
const SELECTION_ENDS_WITH_PROCESS: bool = cfg!(all(unix, not(target_os = "macos")));

fn write_backends() -> [WriteBackend; 2] {
    if SELECTION_ENDS_WITH_PROCESS {
        [WriteBackend::Commands, WriteBackend::Arboard]
    } else {
        [WriteBackend::Arboard, WriteBackend::Commands]
    }
}

fn fallback_write(text: &str) -> Result<()> {
    for command in write_commands() {
        match try_command_write(command, text) {
            Ok(()) => return Ok(()),
            Err(err) => tracing::debug!(error = %err, "clipboard command failed"),
        }
    }

    Err(anyhow!("no clipboard command accepted the text"))
}

fn fallback_read() -> Result<String> {
    for command in read_commands() {
        match try_command_read(command) {
            Ok(text) => return Ok(text),
            Err(err) => tracing::debug!(error = %err, "clipboard command failed"),
        }
    }

    Err(anyhow!(
        "failed to read text from clipboard using available backends"
    ))
}

fn try_command_write(command: &[&str], text: &str) -> Result<()> {
    let (program, args) = command
        .split_first()
        .context("clipboard command missing program")?;

    // The holder forked by xclip/wl-copy must not keep our output streams open.
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("failed to spawn clipboard command: {program}"))?;

    if let Some(stdin) = child.stdin.as_mut() {
        stdin
            .write_all(text.as_bytes())
            .context("failed to write clipboard contents")?;
    }

    let status = child
        .wait()
        .with_context(|| format!("clipboard command did not exit cleanly: {program}"))?;
    if status.success() {
        Ok(())
    } else {
        Err(anyhow!("clipboard command exited with status {status}"))
    }
}

fn try_command_read(command: &[&str]) -> Result<String> {
    let (program, args) = command
        .split_first()
        .context("clipboard command missing program")?;

    let mut child = Command::new(program)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("failed to spawn clipboard command: {program}"))?;

    let mut text = String::new();
    if let Some(stdout) = child.stdout.as_mut() {
        stdout
            .read_to_string(&mut text)
            .context("failed to read clipboard contents")?;
    }

    let status = child
        .wait()
        .with_context(|| format!("clipboard command did not exit cleanly: {program}"))?;
    if status.success() {
        Ok(text)
    } else {
        Err(anyhow!("clipboard command exited with status {status}"))
    }
}

#[cfg(target_os = "macos")]
fn write_commands() -> Vec<&'static [&'static str]> {
    vec![&["pbcopy"]]
}

#[cfg(target_os = "macos")]
fn read_commands() -> Vec<&'static [&'static str]> {
    vec![&["pbpaste"]]
}

#[cfg(all(unix, not(target_os = "macos")))]
fn write_commands() -> Vec<&'static [&'static str]> {
    linux_write_commands(std::env::var_os("WAYLAND_DISPLAY").is_some())
}

#[cfg(all(unix, not(target_os = "macos")))]
fn linux_write_commands(wayland: bool) -> Vec<&'static [&'static str]> {
    let xclip: &'static [&'static str] = &["xclip", "-selection", "clipboard"];
    let wl_copy: &'static [&'static str] = &["wl-copy"];
    if wayland {
        vec![wl_copy, xclip]
    } else {
        vec![xclip, wl_copy]
    }
}

#[cfg(all(unix, not(target_os = "macos")))]
fn read_commands() -> Vec<&'static [&'static str]> {
    vec![
        &["xclip", "-selection", "clipboard", "-o"],
        &["wl-paste", "--no-newline"],
    ]
}

#[cfg(target_os = "windows")]
fn write_commands() -> Vec<&'static [&'static str]> {
    vec![&["powershell.exe", "-NoProfile", "-Command", "Set-Clipboard"]]
}

#[cfg(target_os = "windows")]
fn read_commands() -> Vec<&'static [&'static str]> {
    vec![&["powershell.exe", "-NoProfile", "-Command", "Get-Clipboard -Raw"]]
}

#[cfg(not(any(unix, target_os = "windows")))]
fn write_commands() -> Vec<&'static [&'static str]> {
    Vec::new()
}

#[cfg(not(any(unix, target_os = "windows")))]
fn read_commands() -> Vec<&'static [&'static str]> {
    Vec::new()
}

/// Snapshot of the clipboard text that is written back when dropped.
///
/// Used while another tool temporarily takes over the clipboard. Call [`restore`] to observe
/// restoration errors; dropping the guard restores on a best-effort basis.
///
/// [`restore`]: ClipboardSnapshot::restore
pub struct ClipboardSnapshot<'a> {
    clipboard: &'a mut dyn ClipboardService,
    original: Option<String>,
}

impl<'a> ClipboardSnapshot<'a> {
    pub fn take(clipboard: &'a mut dyn ClipboardService) -> Result<Self> {
        let original = clipboard
            .read_text()
            .context("failed to read current clipboard")?;
        Ok(Self {
            clipboard,
            original: Some(original),
        })
    }

    pub fn original(&self) -> &str {
        self.original.as_deref().unwrap_or_default()
    }

    /// Read the clipboard as it is now, while the snapshot is still held.
    pub fn read_current(&mut self) -> Result<String> {
        self.clipboard.read_text()
    }

    pub fn restore(mut self) -> Result<()> {
        match self.original.take() {
            Some(original) => self
                .clipboard
                .write_text(&original)
                .context("failed to restore clipboard"),
            None => Ok(()),
        }
    }
}

impl Drop for ClipboardSnapshot<'_> {
    fn drop(&mut self) {
        if let Some(original) = self.original.take()
            && let Err(err) = self.clipboard.write_text(&original)
        {
            tracing::warn!(error = %err, "failed to restore clipboard");
        }
    }
}

/// In-memory clipboard, handy for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    text: Rc<RefCell<String>>,
    writes: Rc<Cell<usize>>,
}

impl MemoryClipboard {
    pub fn with_text(text: impl Into<String>) -> Self {
        let clipboard = Self::default();
        *clipboard.text.borrow_mut() = text.into();
        clipboard
    }

    pub fn text(&self) -> String {
        self.text.borrow().clone()
    }

    /// Replace the contents without counting as a write through the service.
    pub fn set_external(&self, text: impl Into<String>) {
        *self.text.borrow_mut() = text.into();
    }

    pub fn writes(&self) -> usize {
        self.writes.get()
    }
}

impl ClipboardService for MemoryClipboard {
    fn read_text(&mut self) -> Result<String> {
        Ok(self.text())
    }

    fn write_text(&mut self, text: &str) -> Result<()> {
        *self.text.borrow_mut() = text.to_owned();
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}
