use crate::error::HistoryError;
use crate::history::build::Build;
use crate::history::changelog::{ChangeLogParser, ChangeLogSet};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const ARCHIVE_DIR_NAME: &str = "changelog-history";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    Written,
    Unchanged,
}

pub fn archive_dir(build_root: &Path) -> PathBuf {
    build_root.join(ARCHIVE_DIR_NAME)
}

pub fn entry_file_name(number: u64) -> String {
    format!("{number}.xml")
}

pub fn build_number_of(file_name: &str) -> Option<u64> {
    let digits = file_name.strip_suffix(".xml")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u64>().ok()
}

/// Archived entries keyed by build number. A missing or unreadable
/// directory yields an empty map.
pub fn list_entries(archive_dir: &Path) -> BTreeMap<u64, PathBuf> {
    let mut out = BTreeMap::new();
    let Ok(read_dir) = fs::read_dir(archive_dir) else {
        return out;
    };

    for entry in read_dir.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(number) = build_number_of(name) else {
            continue;
        };
        // `7.xml` wins over `007.xml` when both exist.
        let canonical = name == entry_file_name(number);
        match out.get(&number) {
            Some(_) if !canonical => {}
            _ => {
                out.insert(number, path);
            }
        }
    }

    out
}

fn ensure_dir(dir: &Path) -> Result<(), HistoryError> {
    if dir.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|source| HistoryError::DirectoryCreation {
        path: dir.to_path_buf(),
        source,
    })
}

pub fn file_hash(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

fn same_content(a: &Path, b: &Path) -> bool {
    match (file_hash(a), file_hash(b)) {
        (Ok(left), Ok(right)) => left == right,
        _ => false,
    }
}

pub fn copy_into(
    source: &Path,
    archive_dir: &Path,
    dest_name: &str,
) -> Result<CopyOutcome, HistoryError> {
    ensure_dir(archive_dir)?;
    let dest = archive_dir.join(dest_name);
    if dest.is_file() && same_content(source, &dest) {
        return Ok(CopyOutcome::Unchanged);
    }

    fs::copy(source, &dest).map_err(|err| HistoryError::Copy {
        from: source.to_path_buf(),
        to: dest.clone(),
        source: err,
    })?;
    Ok(CopyOutcome::Written)
}

pub fn parse_entry(
    parser: &dyn ChangeLogParser,
    build: &dyn Build,
    file: &Path,
) -> Result<Box<dyn ChangeLogSet>, HistoryError> {
    parser.parse(build, file).map_err(|err| HistoryError::Parse {
        path: file.to_path_buf(),
        message: format!("{err:#}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn build_number_of_accepts_only_digit_xml_names() {
        assert_eq!(build_number_of("5.xml"), Some(5));
        assert_eq!(build_number_of("0042.xml"), Some(42));
        assert_eq!(build_number_of(".xml"), None);
        assert_eq!(build_number_of("5.xml.bak"), None);
        assert_eq!(build_number_of("-5.xml"), None);
        assert_eq!(build_number_of("5a.xml"), None);
        assert_eq!(build_number_of("changelog.xml"), None);
        assert_eq!(build_number_of("99999999999999999999999.xml"), None);
    }

    #[test]
    fn list_entries_ignores_non_matching_files() {
        let tmp = tempdir().expect("tempdir");
        let dir = tmp.path();
        fs::write(dir.join("3.xml"), "<log/>").expect("write 3");
        fs::write(dir.join("12.xml"), "<log/>").expect("write 12");
        fs::write(dir.join("notes.txt"), "x").expect("write notes");
        fs::write(dir.join("changelog.xml"), "<log/>").expect("write changelog");
        fs::create_dir_all(dir.join("7.xml")).expect("mkdir 7.xml");

        let got = list_entries(dir);
        assert_eq!(got.keys().copied().collect::<Vec<_>>(), vec![3, 12]);
        assert_eq!(got[&12], dir.join("12.xml"));
    }

    #[test]
    fn list_entries_prefers_canonical_name_on_duplicate_number() {
        let tmp = tempdir().expect("tempdir");
        fs::write(tmp.path().join("007.xml"), "old").expect("write padded");
        fs::write(tmp.path().join("7.xml"), "new").expect("write canonical");

        let got = list_entries(tmp.path());
        assert_eq!(got.len(), 1);
        assert_eq!(got[&7], tmp.path().join("7.xml"));
    }

    #[test]
    fn list_entries_of_missing_dir_is_empty() {
        let tmp = tempdir().expect("tempdir");
        assert!(list_entries(&tmp.path().join("missing")).is_empty());
    }

    #[test]
    fn copy_into_creates_dir_and_skips_identical_content() {
        let tmp = tempdir().expect("tempdir");
        let source = tmp.path().join("changelog.xml");
        fs::write(&source, "<log>a</log>").expect("write source");
        let archive = archive_dir(&tmp.path().join("6"));

        let first = copy_into(&source, &archive, "5.xml").expect("first copy");
        assert_eq!(first, CopyOutcome::Written);
        assert_eq!(
            fs::read(archive.join("5.xml")).expect("read copy"),
            b"<log>a</log>"
        );

        let second = copy_into(&source, &archive, "5.xml").expect("second copy");
        assert_eq!(second, CopyOutcome::Unchanged);

        fs::write(&source, "<log>b</log>").expect("rewrite source");
        let third = copy_into(&source, &archive, "5.xml").expect("third copy");
        assert_eq!(third, CopyOutcome::Written);
        assert_eq!(
            fs::read(archive.join("5.xml")).expect("read overwrite"),
            b"<log>b</log>"
        );
    }

    #[test]
    fn copy_into_reports_missing_source() {
        let tmp = tempdir().expect("tempdir");
        let err = copy_into(
            &tmp.path().join("absent.xml"),
            &tmp.path().join("archive"),
            "1.xml",
        )
        .expect_err("copy should fail");
        assert!(matches!(err, HistoryError::Copy { .. }));
    }

    #[test]
    fn copy_into_reports_directory_creation_failure() {
        let tmp = tempdir().expect("tempdir");
        let blocker = tmp.path().join("blocker");
        fs::write(&blocker, "file, not dir").expect("write blocker");
        let source = tmp.path().join("changelog.xml");
        fs::write(&source, "<log/>").expect("write source");

        let err = copy_into(&source, &blocker.join("changelog-history"), "1.xml")
            .expect_err("mkdir should fail");
        assert!(matches!(err, HistoryError::DirectoryCreation { .. }));
    }
}
