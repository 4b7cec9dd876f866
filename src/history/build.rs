use crate::history::changelog::ChangeLogParser;
use anyhow::Result;
use std::path::{Path, PathBuf};

pub const CHANGE_LOG_FILE: &str = "changelog.xml";

/// What the archival and rendering code needs from the build server's build
/// model. Host integrations implement this over their own storage.
pub trait Build {
    fn number(&self) -> u64;

    fn root_dir(&self) -> &Path;

    fn url(&self) -> String;

    fn next_build(&self) -> Result<Option<Self>>
    where
        Self: Sized;

    fn change_log_parser(&self) -> Box<dyn ChangeLogParser>;

    fn has_history(&self) -> bool;

    fn add_history_marker(&mut self);

    fn save(&self) -> Result<()>;

    fn change_log_file(&self) -> PathBuf {
        self.root_dir().join(CHANGE_LOG_FILE)
    }
}
