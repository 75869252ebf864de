//! Resolving which files and folders a command invocation targets.

use anyhow::Result;

use crate::domain::model::Resource;
use crate::infra::clipboard::{ClipboardService, ClipboardSnapshot};
use crate::infra::workbench::{NoticeLevel, Workbench};

/// Arguments a command was invoked with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    /// The item the command was invoked on.
    pub primary: Option<Resource>,
    /// Every selected item when more than one is selected.
    pub selection: Vec<Resource>,
}

impl Invocation {
    /// Map positional arguments onto an invocation.
    ///
    /// No arguments triggers the host fallback, one argument is a primary target, and several
    /// arguments form a multi-selection whose first entry is also the primary target.
    pub fn from_resources(resources: Vec<Resource>) -> Self {
        match resources.len() {
            0 => Self::default(),
            1 => Self {
                primary: resources.into_iter().next(),
                selection: Vec::new(),
            },
            _ => Self {
                primary: resources.first().cloned(),
                selection: resources,
            },
        }
    }
}

/// Outcome of selection resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A multi-selection, either explicit or recovered from the host.
    Selection(Vec<Resource>),
    /// A single local target.
    Primary(Resource),
    /// A single target outside the local filesystem; nothing to do.
    Unsupported(Resource),
    /// Nothing is selected.
    Empty,
}

/// Decide the targets of an invocation, falling back to the host's current selection.
///
/// Clipboard problems during the fallback are reported through the workbench and count as an
/// empty selection.
pub fn resolve(
    invocation: &Invocation,
    clipboard: &mut dyn ClipboardService,
    workbench: &mut dyn Workbench,
) -> Resolution {
    if !invocation.selection.is_empty() {
        return Resolution::Selection(invocation.selection.clone());
    }

    match &invocation.primary {
        Some(primary) if primary.is_local() => Resolution::Primary(primary.clone()),
        Some(primary) => Resolution::Unsupported(primary.clone()),
        None => match selection_from_host(clipboard, workbench) {
            Ok(Some(resources)) if !resources.is_empty() => Resolution::Selection(resources),
            Ok(_) => Resolution::Empty,
            Err(err) => {
                workbench.notify(
                    NoticeLevel::Error,
                    &format!("Error getting explorer selection: {err:#}"),
                );
                Resolution::Empty
            }
        },
    }
}

/// Have the host copy its selected paths, then put the previous clipboard text back.
///
/// Returns `None` when the clipboard did not change, meaning the host had nothing selected.
fn selection_from_host(
    clipboard: &mut dyn ClipboardService,
    workbench: &mut dyn Workbench,
) -> Result<Option<Vec<Resource>>> {
    let mut snapshot = ClipboardSnapshot::take(clipboard)?;
    workbench.copy_selected_paths()?;
    let copied = snapshot.read_current()?;
    let unchanged = copied.is_empty() || copied == snapshot.original();
    snapshot.restore()?;

    if unchanged {
        tracing::debug!("clipboard unchanged after copying selection");
        return Ok(None);
    }

    Ok(Some(parse_path_list(&copied)))
}

/// One path per line; blank lines are dropped and non-file URIs are ignored.
pub fn parse_path_list(text: &str) -> Vec<Resource> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match line.parse::<Resource>() {
            Ok(resource) if resource.is_local() => Some(resource),
            Ok(resource) => {
                tracing::debug!(%resource, "ignoring non-file selection entry");
                None
            }
            Err(err) => {
                tracing::debug!(line, error = %err, "ignoring selection entry");
                None
            }
        })
        .collect()
}
