use crate::history::build::Build;
use crate::history::changelog::{
    AffectedPath, ChangeEntry, ChangeLogParser, ChangeLogSet, ClearableRevisionMetadata,
};
use anyhow::{Context, Result, bail};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const REVISION_FILE: &str = "revision.txt";

/// `revisions` maps each checked-out module url to the revision the build
/// was made from. It is read from the build that does the parsing, not from
/// the change log itself.
#[derive(Debug, Clone, Default)]
pub struct SvnChangeLogSet {
    pub entries: Vec<ChangeEntry>,
    pub revisions: BTreeMap<String, u64>,
}

impl ChangeLogSet for SvnChangeLogSet {
    fn kind(&self) -> &'static str {
        "svn"
    }

    fn entries(&self) -> &[ChangeEntry] {
        &self.entries
    }

    fn revision_labels(&self) -> Vec<String> {
        self.revisions
            .iter()
            .map(|(url, rev)| format!("{url} @ r{rev}"))
            .collect()
    }

    fn revision_metadata_mut(&mut self) -> Option<&mut dyn ClearableRevisionMetadata> {
        Some(self)
    }
}

impl ClearableRevisionMetadata for SvnChangeLogSet {
    fn clear_revision_metadata(&mut self) -> Result<()> {
        self.revisions.clear();
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SvnChangeLogParser;

impl ChangeLogParser for SvnChangeLogParser {
    fn parse(&self, build: &dyn Build, file: &Path) -> Result<Box<dyn ChangeLogSet>> {
        let raw =
            fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
        let entries = parse_log(&raw)?;
        let revisions = read_revision_file(&build.root_dir().join(REVISION_FILE))?;
        Ok(Box::new(SvnChangeLogSet { entries, revisions }))
    }
}

pub fn parse_revision_lines(raw: &str) -> BTreeMap<String, u64> {
    let mut out = BTreeMap::new();
    for line in raw.lines() {
        let trimmed = line.trim();
        let Some((url, rev)) = trimmed.rsplit_once('/') else {
            continue;
        };
        if url.is_empty() {
            continue;
        }
        if let Ok(rev) = rev.parse::<u64>() {
            out.insert(url.to_string(), rev);
        }
    }
    out
}

fn read_revision_file(path: &Path) -> Result<BTreeMap<String, u64>> {
    if !path.is_file() {
        return Ok(BTreeMap::new());
    }
    let raw =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(parse_revision_lines(&raw))
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Author,
    Date,
    Msg,
    Path,
}

fn attr(start: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
    let Some(attr) = start.try_get_attribute(name)? else {
        return Ok(None);
    };
    Ok(Some(attr.unescape_value()?.into_owned()))
}

fn new_entry(start: &BytesStart<'_>) -> Result<ChangeEntry> {
    Ok(ChangeEntry {
        revision: attr(start, b"revision")?,
        ..ChangeEntry::default()
    })
}

fn push_text(
    entry: Option<&mut ChangeEntry>,
    path: Option<&mut AffectedPath>,
    field: Option<Field>,
    text: &str,
) {
    match (field, entry, path) {
        (Some(Field::Path), _, Some(path)) => path.path.push_str(text),
        (Some(Field::Author), Some(entry), _) => entry.author.push_str(text),
        (Some(Field::Msg), Some(entry), _) => entry.msg.push_str(text),
        (Some(Field::Date), Some(entry), _) => {
            entry.date.get_or_insert_with(String::new).push_str(text)
        }
        _ => {}
    }
}

/// Parse the `svn log --xml` document a Subversion build records as its
/// change log.
pub fn parse_log(xml: &str) -> Result<Vec<ChangeEntry>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut current: Option<ChangeEntry> = None;
    let mut pending_path: Option<AffectedPath> = None;
    let mut field: Option<Field> = None;
    let mut saw_root = false;

    loop {
        let event = reader
            .read_event()
            .with_context(|| format!("malformed change log at byte {}", reader.buffer_position()))?;
        match event {
            Event::Start(start) => match start.name().as_ref() {
                b"log" => saw_root = true,
                b"logentry" => current = Some(new_entry(&start)?),
                b"author" => field = Some(Field::Author),
                b"date" => field = Some(Field::Date),
                b"msg" => field = Some(Field::Msg),
                b"path" => {
                    pending_path = Some(AffectedPath {
                        action: attr(&start, b"action")?.unwrap_or_default(),
                        path: String::new(),
                    });
                    field = Some(Field::Path);
                }
                _ => {}
            },
            Event::Empty(start) => match start.name().as_ref() {
                b"log" => saw_root = true,
                b"logentry" => entries.push(new_entry(&start)?),
                _ => {}
            },
            Event::Text(text) => {
                let text = text.unescape()?;
                push_text(current.as_mut(), pending_path.as_mut(), field, &text);
            }
            Event::CData(data) => {
                let text = String::from_utf8_lossy(&data).into_owned();
                push_text(current.as_mut(), pending_path.as_mut(), field, &text);
            }
            Event::End(end) => match end.name().as_ref() {
                b"logentry" => {
                    if let Some(entry) = current.take() {
                        entries.push(entry);
                    }
                }
                b"path" => {
                    if let (Some(path), Some(entry)) = (pending_path.take(), current.as_mut()) {
                        entry.paths.push(path);
                    }
                    field = None;
                }
                b"author" | b"date" | b"msg" => field = None,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        bail!("change log has no <log> root element");
    }
    if current.is_some() {
        bail!("change log ends inside a <logentry>");
    }
    Ok(entries)
}
