use crate::history::build::Build;
use anyhow::Result;
use serde::Serialize;
use std::fmt::Debug;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AffectedPath {
    pub action: String,
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeEntry {
    pub revision: Option<String>,
    pub author: String,
    pub date: Option<String>,
    pub msg: String,
    pub paths: Vec<AffectedPath>,
}

/// Source-control metadata that only describes the build it was parsed for.
///
/// Historical entries are parsed with the current build's parser, so anything
/// exposed through this hook is stale for them and gets cleared before
/// rendering.
pub trait ClearableRevisionMetadata {
    fn clear_revision_metadata(&mut self) -> Result<()>;
}

pub trait ChangeLogSet: Debug + Send {
    fn kind(&self) -> &'static str;

    fn entries(&self) -> &[ChangeEntry];

    fn is_empty_set(&self) -> bool {
        self.entries().is_empty()
    }

    fn revision_labels(&self) -> Vec<String> {
        Vec::new()
    }

    fn revision_metadata_mut(&mut self) -> Option<&mut dyn ClearableRevisionMetadata> {
        None
    }
}

pub trait ChangeLogParser: Send + Sync {
    fn parse(&self, build: &dyn Build, file: &Path) -> Result<Box<dyn ChangeLogSet>>;
}

#[derive(Debug, Clone, Default)]
pub struct EmptyChangeLogSet;

impl ChangeLogSet for EmptyChangeLogSet {
    fn kind(&self) -> &'static str {
        "none"
    }

    fn entries(&self) -> &[ChangeEntry] {
        &[]
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullChangeLogParser;

impl ChangeLogParser for NullChangeLogParser {
    fn parse(&self, _build: &dyn Build, _file: &Path) -> Result<Box<dyn ChangeLogSet>> {
        Ok(Box::new(EmptyChangeLogSet))
    }
}
