//! The copy command: resolve the selection, aggregate it, and hand it to the clipboard.

use std::fs;
use std::path::{self, Path};

use anyhow::{Context, Result};

use crate::app::aggregate::Aggregator;
use crate::app::filter::ExtensionFilter;
use crate::app::label::{LabelFormatter, normalize_path};
use crate::app::scan::Scanner;
use crate::app::selection::{self, Invocation, Resolution};
use crate::app::tokens::{TokenEstimate, estimate_tokens};
use crate::domain::model::{AggregatedDocument, EntryKind, FileReference, Resource};
use crate::infra::clipboard::ClipboardService;
use crate::infra::config::Config;
use crate::infra::workbench::{NoticeLevel, Workbench};

pub const NO_SELECTION_MESSAGE: &str = "Please select files in the Explorer first";
pub const COPIED_MESSAGE: &str = "Content copied to clipboard";
const DOCUMENT_LANGUAGE: &str = "markdown";

/// Summary of a successful copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyReport {
    /// Rendered text placed on the clipboard.
    pub text: String,
    pub blocks: usize,
    pub tokens: TokenEstimate,
    pub opened_document: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Copied(CopyReport),
    /// Nothing was selected; a warning has been shown.
    NoSelection,
    /// The invocation targeted something that is not a local file or folder.
    Skipped,
}

/// Copies selected files and folders to the clipboard as labelled code blocks.
#[derive(Debug, Clone)]
pub struct CopyCommand {
    config: Config,
}

impl CopyCommand {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn run(
        &self,
        invocation: &Invocation,
        clipboard: &mut dyn ClipboardService,
        workbench: &mut dyn Workbench,
    ) -> Result<CommandOutcome> {
        let labels = LabelFormatter::from_config(
            &self.config,
            workbench.workspace_root().map(Path::to_path_buf),
        );
        let aggregator = Aggregator::new(labels);
        let scanner = Scanner::new(ExtensionFilter::from_config(&self.config));

        match selection::resolve(invocation, clipboard, workbench) {
            Resolution::Empty => {
                workbench.notify(NoticeLevel::Warning, NO_SELECTION_MESSAGE);
                Ok(CommandOutcome::NoSelection)
            }
            Resolution::Unsupported(resource) => {
                tracing::debug!(%resource, "ignoring non-file target");
                Ok(CommandOutcome::Skipped)
            }
            Resolution::Selection(resources) => {
                let references = classify(&resources)?;
                let document = aggregate_selection(&scanner, &aggregator, &references)?;
                let text = document.render();
                let report = deliver(text, document.len(), true, clipboard, workbench)?;
                Ok(CommandOutcome::Copied(report))
            }
            Resolution::Primary(resource) => {
                let Some(reference) = classify_one(&resource)? else {
                    tracing::debug!(%resource, "target is neither a file nor a folder");
                    return Ok(CommandOutcome::Skipped);
                };
                let report = if reference.is_dir() {
                    let files = scanner.scan(&reference.path)?.files;
                    let document = aggregator.aggregate_files(&reference.path, &files)?;
                    deliver(document.render(), document.len(), true, clipboard, workbench)?
                } else {
                    let document = aggregator.aggregate_file(&reference.path)?;
                    deliver(
                        document.render_standalone(),
                        document.len(),
                        false,
                        clipboard,
                        workbench,
                    )?
                };
                Ok(CommandOutcome::Copied(report))
            }
        }
    }
}

/// All folders first, then the individually selected files, each group in selection order.
fn aggregate_selection(
    scanner: &Scanner,
    aggregator: &Aggregator,
    references: &[FileReference],
) -> Result<AggregatedDocument> {
    let (directories, files): (Vec<&FileReference>, Vec<&FileReference>) =
        references.iter().partition(|reference| reference.is_dir());

    let mut document = AggregatedDocument::new();
    for directory in directories {
        let scan = scanner.scan(&directory.path)?;
        document.extend(aggregator.aggregate_files(&directory.path, &scan.files)?);
    }
    for file in files {
        document.extend(aggregator.aggregate_file(&file.path)?);
    }
    if document.is_empty() {
        tracing::debug!("selection contains no matching files");
    }
    Ok(document)
}

fn classify(resources: &[Resource]) -> Result<Vec<FileReference>> {
    let mut references = Vec::with_capacity(resources.len());
    for resource in resources.iter().filter(|resource| resource.is_local()) {
        if let Some(reference) = classify_one(resource)? {
            references.push(reference);
        }
    }
    Ok(references)
}

fn classify_one(resource: &Resource) -> Result<Option<FileReference>> {
    let path = path::absolute(&resource.path)
        .map(|path| normalize_path(&path))
        .with_context(|| format!("failed to resolve {}", resource.path.display()))?;
    let metadata =
        fs::metadata(&path).with_context(|| format!("failed to stat {}", path.display()))?;

    let kind = if metadata.is_dir() {
        EntryKind::Directory
    } else if metadata.is_file() {
        EntryKind::File
    } else {
        return Ok(None);
    };
    Ok(Some(FileReference::new(path, kind)))
}

/// Write `text` to the clipboard, confirm, and optionally show it as a document.
fn deliver(
    text: String,
    blocks: usize,
    open_document: bool,
    clipboard: &mut dyn ClipboardService,
    workbench: &mut dyn Workbench,
) -> Result<CopyReport> {
    clipboard
        .write_text(&text)
        .context("failed to copy content to clipboard")?;

    let tokens = estimate_tokens(&text);
    tracing::info!(
        blocks,
        tokens = tokens.tokens,
        source = tokens.source.as_str(),
        "copied aggregated content"
    );
    workbench.notify(
        NoticeLevel::Info,
        &format!(
            "{COPIED_MESSAGE} ({blocks} {}, ~{} tokens)",
            if blocks == 1 { "file" } else { "files" },
            tokens.tokens
        ),
    );

    if open_document {
        workbench.open_document(&text, DOCUMENT_LANGUAGE)?;
    }

    Ok(CopyReport {
        text,
        blocks,
        tokens,
        opened_document: open_document,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::infra::clipboard::MemoryClipboard;

    #[derive(Default)]
    struct RecordingWorkbench {
        root: Option<PathBuf>,
        notices: Vec<(NoticeLevel, String)>,
        documents: Vec<(String, String)>,
    }

    impl Workbench for RecordingWorkbench {
        fn workspace_root(&self) -> Option<&Path> {
            self.root.as_deref()
        }

        fn copy_selected_paths(&mut self) -> Result<()> {
            Ok(())
        }

        fn notify(&mut self, level: NoticeLevel, message: &str) {
            self.notices.push((level, message.to_owned()));
        }

        fn open_document(&mut self, content: &str, language: &str) -> Result<()> {
            self.documents.push((content.to_owned(), language.to_owned()));
            Ok(())
        }
    }

    fn copied(outcome: CommandOutcome) -> CopyReport {
        match outcome {
            CommandOutcome::Copied(report) => report,
            other => panic!("expected a copy, got {other:?}"),
        }
    }

    #[test]
    fn single_file_has_no_trailing_separator_and_no_document() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let file = temp.path().join("notes.md");
        fs::write(&file, "# notes")?;

        let mut clipboard = MemoryClipboard::default();
        let mut workbench = RecordingWorkbench::default();
        let invocation = Invocation::from_resources(vec![Resource::file(&file)]);

        let report = copied(CopyCommand::new(Config::default()).run(
            &invocation,
            &mut clipboard,
            &mut workbench,
        )?);

        assert_eq!(report.text, "notes.md:\n```\n# notes\n```");
        assert_eq!(clipboard.text(), report.text);
        assert!(!report.opened_document);
        assert!(workbench.documents.is_empty());
        assert!(workbench.notices[0].1.starts_with(COPIED_MESSAGE));
        Ok(())
    }

    #[test]
    fn folders_come_before_files_in_a_selection() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let pkg = temp.path().join("pkg");
        fs::create_dir_all(&pkg)?;
        fs::write(pkg.join("lib.rs"), "pub fn f() {}")?;
        let loose = temp.path().join("loose.txt");
        fs::write(&loose, "loose")?;

        let mut clipboard = MemoryClipboard::default();
        let mut workbench = RecordingWorkbench::default();
        let invocation =
            Invocation::from_resources(vec![Resource::file(&loose), Resource::file(&pkg)]);

        let report = copied(CopyCommand::new(Config::default()).run(
            &invocation,
            &mut clipboard,
            &mut workbench,
        )?);

        assert_eq!(
            report.text,
            "pkg/lib.rs:\n```\npub fn f() {}\n```\n\nloose.txt:\n```\nloose\n```\n\n"
        );
        assert_eq!(report.blocks, 2);
        assert_eq!(workbench.documents.len(), 1);
        assert_eq!(workbench.documents[0].1, "markdown");
        Ok(())
    }

    #[test]
    fn relative_paths_use_workspace_root() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let ws = path::absolute(temp.path())?;
        fs::create_dir_all(ws.join("sub"))?;
        fs::write(ws.join("sub/a.ts"), "export {}")?;

        let mut config = Config::default();
        config.copy.set_use_relative_paths(true);
        let mut clipboard = MemoryClipboard::default();
        let mut workbench = RecordingWorkbench {
            root: Some(ws.clone()),
            ..Default::default()
        };
        let invocation = Invocation::from_resources(vec![Resource::file(&ws)]);

        let report =
            copied(CopyCommand::new(config).run(&invocation, &mut clipboard, &mut workbench)?);

        assert_eq!(report.text, "sub/a.ts:\n```\nexport {}\n```\n\n");
        Ok(())
    }

    #[test]
    fn parent_segments_keep_the_folder_name_in_labels() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let proj = temp.path().join("proj");
        fs::create_dir_all(proj.join("child"))?;
        fs::write(proj.join("a.rs"), "fn a() {}")?;

        let mut clipboard = MemoryClipboard::default();
        let mut workbench = RecordingWorkbench::default();
        let invocation = Invocation::from_resources(vec![Resource::file(proj.join("child/.."))]);

        let report = copied(CopyCommand::new(Config::default()).run(
            &invocation,
            &mut clipboard,
            &mut workbench,
        )?);

        assert_eq!(report.text, "proj/a.rs:\n```\nfn a() {}\n```\n\n");
        Ok(())
    }

    #[test]
    fn missing_file_propagates_error() {
        let temp = tempfile::tempdir().unwrap();
        let mut clipboard = MemoryClipboard::with_text("before");
        let mut workbench = RecordingWorkbench::default();
        let invocation =
            Invocation::from_resources(vec![Resource::file(temp.path().join("gone.rs"))]);

        let result =
            CopyCommand::new(Config::default()).run(&invocation, &mut clipboard, &mut workbench);

        assert!(result.is_err());
        assert_eq!(clipboard.text(), "before");
        assert_eq!(clipboard.writes(), 0);
    }

    #[test]
    fn empty_fallback_warns_without_reading_files() -> Result<()> {
        let mut clipboard = MemoryClipboard::with_text("previous");
        let mut workbench = RecordingWorkbench::default();

        let outcome = CopyCommand::new(Config::default()).run(
            &Invocation::default(),
            &mut clipboard,
            &mut workbench,
        )?;

        assert_eq!(outcome, CommandOutcome::NoSelection);
        assert_eq!(
            workbench.notices,
            vec![(NoticeLevel::Warning, NO_SELECTION_MESSAGE.to_owned())]
        );
        assert_eq!(clipboard.text(), "previous");
        assert_eq!(clipboard.writes(), 1);
        Ok(())
    }
}
