//! Domain models for selections, file references, and aggregated documents.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use url::Url;

use crate::domain::errors::ResourceParseError;

const FILE_SCHEME: &str = "file";

/// A resource locator handed to a command invocation.
///
/// Plain arguments are filesystem paths, even when they contain a colon. Only `<scheme>://`
/// locators are parsed as URIs: `file://` URIs resolve to local paths and every other scheme
/// is kept as a non-local resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub scheme: String,
    pub path: PathBuf,
    uri: Option<Url>,
}

impl Resource {
    /// Build a local file resource from a filesystem path.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            scheme: FILE_SCHEME.to_owned(),
            path: path.into(),
            uri: None,
        }
    }

    /// Whether the resource lives on the local filesystem.
    pub fn is_local(&self) -> bool {
        self.scheme == FILE_SCHEME
    }

    fn from_uri(raw: &str) -> Result<Self, ResourceParseError> {
        let uri = Url::parse(raw).map_err(|err| ResourceParseError::InvalidUri {
            uri: raw.to_owned(),
            reason: err.to_string(),
        })?;
        if uri.scheme() != FILE_SCHEME {
            return Ok(Self {
                scheme: uri.scheme().to_owned(),
                path: PathBuf::from(uri.path()),
                uri: Some(uri),
            });
        }

        let path = uri
            .to_file_path()
            .map_err(|()| ResourceParseError::MissingPath(raw.to_owned()))?;
        Ok(Self::file(path))
    }
}

impl FromStr for Resource {
    type Err = ResourceParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ResourceParseError::Empty);
        }
        if trimmed.contains("://") {
            return Self::from_uri(trimmed);
        }
        Ok(Self::file(trimmed))
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.uri {
            Some(uri) => write!(f, "{uri}"),
            None => write!(f, "{}", self.path.display()),
        }
    }
}

/// Kind of filesystem entry a reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// A resolved selection entry: an absolute path plus what it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReference {
    pub path: PathBuf,
    pub kind: EntryKind,
}

impl FileReference {
    pub fn new(path: impl Into<PathBuf>, kind: EntryKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// One labelled file inside an [`AggregatedDocument`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub label: String,
    pub content: String,
}

/// Ordered collection of labelled blocks rendered into a single prompt-ready string.
///
/// Blocks keep insertion order and are never deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregatedDocument {
    blocks: Vec<Block>,
}

impl AggregatedDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, label: impl Into<String>, content: impl Into<String>) {
        self.blocks.push(Block {
            label: label.into(),
            content: content.into(),
        });
    }

    pub fn extend(&mut self, other: AggregatedDocument) {
        self.blocks.extend(other.blocks);
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Render every block followed by a blank separator line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            write_block(&mut out, block);
            out.push_str("\n\n");
        }
        out
    }

    /// Render a standalone single block, without the trailing separator.
    pub fn render_standalone(&self) -> String {
        let mut out = String::new();
        for (index, block) in self.blocks.iter().enumerate() {
            if index > 0 {
                out.push_str("\n\n");
            }
            write_block(&mut out, block);
        }
        out
    }
}

fn write_block(out: &mut String, block: &Block) {
    out.push_str(&block.label);
    out.push_str(":\n```\n");
    out.push_str(&block.content);
    out.push_str("\n```");
}
