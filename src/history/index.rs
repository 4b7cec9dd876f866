use crate::error::HistoryError;
use crate::history::build::Build;
use crate::history::changelog::ChangeLogSet;
use crate::history::store;
use crate::history::warn::{self, WarnEvent};

#[derive(Debug)]
pub enum ArchiveEntry {
    Parsed(Box<dyn ChangeLogSet>),
    Failed(String),
}

#[derive(Debug)]
pub struct HistoryItem {
    pub number: u64,
    pub entry: ArchiveEntry,
}

#[derive(Debug, Default)]
pub struct HistoryListing {
    pub items: Vec<HistoryItem>,
}

impl HistoryListing {
    pub fn numbers(&self) -> Vec<u64> {
        self.items.iter().map(|item| item.number).collect()
    }

    #[cfg(test)]
    pub fn get(&self, number: u64) -> Option<&ArchiveEntry> {
        self.items
            .iter()
            .find(|item| item.number == number)
            .map(|item| &item.entry)
    }

    pub fn failed(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item.entry, ArchiveEntry::Failed(_)))
            .count()
    }
}

fn clear_stale_revisions(build: &dyn Build, number: u64, set: &mut dyn ChangeLogSet) {
    let Some(metadata) = set.revision_metadata_mut() else {
        return;
    };
    if let Err(err) = metadata.clear_revision_metadata() {
        warn::emit(WarnEvent {
            code: "REVISION_CLEAR_FAILED",
            stage: "index",
            action: "clear-revision-metadata",
            url: &build.url(),
            build: &number.to_string(),
            target: "archived-change-log",
            reason: "stale-revisions-may-render",
            err: &format!("{err:#}"),
        });
    }
}

pub fn list_history(build: &dyn Build) -> HistoryListing {
    let parser = build.change_log_parser();
    let entries = store::list_entries(&store::archive_dir(build.root_dir()));

    let mut items = Vec::with_capacity(entries.len());
    for (number, path) in entries.into_iter().rev() {
        let entry = match store::parse_entry(parser.as_ref(), build, &path) {
            Ok(mut set) => {
                clear_stale_revisions(build, number, set.as_mut());
                ArchiveEntry::Parsed(set)
            }
            Err(err) => {
                warn::emit(WarnEvent {
                    code: "HISTORY_ENTRY_UNPARSEABLE",
                    stage: "index",
                    action: "parse-archived-change-log",
                    url: &build.url(),
                    build: &number.to_string(),
                    target: &path.display().to_string(),
                    reason: "rendered-as-failed-entry",
                    err: &err.to_string(),
                });
                ArchiveEntry::Failed(err.to_string())
            }
        };
        items.push(HistoryItem { number, entry });
    }

    HistoryListing { items }
}

/// Parse the archived change log of one historical build. `Ok(None)` when
/// nothing is archived under `number`.
pub fn fetch_one(
    build: &dyn Build,
    number: u64,
) -> Result<Option<Box<dyn ChangeLogSet>>, HistoryError> {
    let Some(path) = store::list_entries(&store::archive_dir(build.root_dir())).remove(&number)
    else {
        return Ok(None);
    };
    let parser = build.change_log_parser();
    let mut set = store::parse_entry(parser.as_ref(), build, &path)?;
    clear_stale_revisions(build, number, set.as_mut());
    Ok(Some(set))
}
