use crate::history::build::Build;
use crate::history::store::{self, CopyOutcome};
use crate::history::warn::{self, WarnEvent};
use anyhow::{Context, Result};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchivalOutcome {
    pub next_build: Option<u64>,
    pub written: Vec<String>,
    pub unchanged: Vec<String>,
    pub marker_added: bool,
}

impl ArchivalOutcome {
    fn record(&mut self, name: String, outcome: CopyOutcome) {
        match outcome {
            CopyOutcome::Written => self.written.push(name),
            CopyOutcome::Unchanged => self.unchanged.push(name),
        }
    }

    pub fn copied(&self) -> usize {
        self.written.len() + self.unchanged.len()
    }
}

/// Deletion hook. Archival is best-effort: failures are reported as
/// warnings and never reach the caller, so the deletion itself proceeds.
pub fn on_deleted<B: Build>(build: &B) -> Option<ArchivalOutcome> {
    match copy_change_logs(build) {
        Ok(outcome) => Some(outcome),
        Err(err) => {
            warn::emit(WarnEvent {
                code: "ARCHIVE_FAILED",
                stage: "archive",
                action: "copy-change-logs",
                url: &build.url(),
                build: &build.number().to_string(),
                target: "next-build",
                reason: "changelog-history-failure",
                err: &format!("{err:#}"),
            });
            None
        }
    }
}

fn has_changes<B: Build>(build: &B, change_log: &Path) -> bool {
    let parser = build.change_log_parser();
    match store::parse_entry(parser.as_ref(), build, change_log) {
        Ok(set) => !set.is_empty_set(),
        Err(err) => {
            // Unreadable logs are still carried forward.
            warn::emit(WarnEvent {
                code: "CHANGELOG_UNPARSEABLE",
                stage: "archive",
                action: "inspect-change-log",
                url: &build.url(),
                build: &build.number().to_string(),
                target: &change_log.display().to_string(),
                reason: "archiving-raw-file",
                err: &err.to_string(),
            });
            true
        }
    }
}

pub fn copy_change_logs<B: Build>(build: &B) -> Result<ArchivalOutcome> {
    let Some(mut next) = build.next_build()? else {
        return Ok(ArchivalOutcome::default());
    };
    let target = store::archive_dir(next.root_dir());
    let mut out = ArchivalOutcome {
        next_build: Some(next.number()),
        ..ArchivalOutcome::default()
    };

    let change_log = build.change_log_file();
    if change_log.is_file() && has_changes(build, &change_log) {
        let name = store::entry_file_name(build.number());
        let outcome = store::copy_into(&change_log, &target, &name)?;
        out.record(name, outcome);
    }

    // Only `<n>.xml` entries move forward; anything else in the archive
    // directory stays behind with the deleted build.
    for path in store::list_entries(&store::archive_dir(build.root_dir())).into_values() {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let name = name.to_string();
        let outcome = store::copy_into(&path, &target, &name)?;
        out.record(name, outcome);
    }

    if out.copied() > 0 && !next.has_history() {
        next.add_history_marker();
        next.save()
            .with_context(|| format!("failed to save build #{}", next.number()))?;
        out.marker_added = true;
    }

    out.written.sort();
    out.unchanged.sort();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::fs_host::FsJob;
    use crate::history::test_support::{SvnCommit, job_with_builds, svn_log_xml};
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::tempdir;

    fn archive_of(job: &FsJob, number: u64) -> BTreeMap<u64, Vec<u8>> {
        let build = job.build(number).expect("load").expect("build exists");
        store::list_entries(&store::archive_dir(build.root_dir()))
            .into_iter()
            .map(|(n, path)| (n, fs::read(path).expect("read entry")))
            .collect()
    }

    fn delete(job: &FsJob, number: u64) -> Option<ArchivalOutcome> {
        job.delete_build(number).expect("delete")
    }

    #[test]
    fn newest_build_has_nowhere_to_archive() {
        let tmp = tempdir().expect("tempdir");
        let job = job_with_builds(tmp.path(), &[1, 2]);

        let out = delete(&job, 2).expect("archival ran");
        assert_eq!(out, ArchivalOutcome::default());
        assert!(!job.build(1).expect("load").expect("build 1").has_history());
    }

    #[test]
    fn change_log_lands_in_next_build_under_its_number() {
        let tmp = tempdir().expect("tempdir");
        let job = job_with_builds(tmp.path(), &[3, 4]);
        let build3 = job.build(3).expect("load").expect("build 3");
        let xml = svn_log_xml(&[SvnCommit::new(11, "add xml file")]);
        fs::write(build3.change_log_file(), &xml).expect("write change log");

        let out = delete(&job, 3).expect("archival ran");
        assert_eq!(out.next_build, Some(4));
        assert_eq!(out.written, vec!["3.xml".to_string()]);
        assert!(out.marker_added);

        let archive = archive_of(&job, 4);
        assert_eq!(archive.keys().copied().collect::<Vec<_>>(), vec![3]);
        assert_eq!(archive[&3], xml.as_bytes());
        assert!(job.build(4).expect("load").expect("build 4").has_history());
    }

    #[test]
    fn empty_change_log_does_not_mark_next_build() {
        let tmp = tempdir().expect("tempdir");
        let job = job_with_builds(tmp.path(), &[1, 2]);
        let build1 = job.build(1).expect("load").expect("build 1");
        fs::write(build1.change_log_file(), "<log/>").expect("write empty log");

        let out = delete(&job, 1).expect("archival ran");
        assert_eq!(out.copied(), 0);
        assert!(!out.marker_added);
        let build2 = job.build(2).expect("load").expect("build 2");
        assert!(!build2.has_history());
        assert!(!store::archive_dir(build2.root_dir()).exists());
    }

    #[test]
    fn absent_change_log_does_not_mark_next_build() {
        let tmp = tempdir().expect("tempdir");
        let job = job_with_builds(tmp.path(), &[1, 2]);

        let out = delete(&job, 1).expect("archival ran");
        assert_eq!(out.next_build, Some(2));
        assert_eq!(out.copied(), 0);
        assert!(!job.build(2).expect("load").expect("build 2").has_history());
    }

    #[test]
    fn empty_inherited_archive_does_not_mark_next_build() {
        let tmp = tempdir().expect("tempdir");
        let job = job_with_builds(tmp.path(), &[1, 2]);
        let build1 = job.build(1).expect("load").expect("build 1");
        fs::create_dir_all(store::archive_dir(build1.root_dir())).expect("mkdir archive");

        let out = delete(&job, 1).expect("archival ran");
        assert_eq!(out.copied(), 0);
        assert!(!out.marker_added);
        let build2 = job.build(2).expect("load").expect("build 2");
        assert!(!build2.has_history());
        assert!(!store::archive_dir(build2.root_dir()).exists());
    }

    #[test]
    fn stray_files_in_inherited_archive_are_left_behind() {
        let tmp = tempdir().expect("tempdir");
        let job = job_with_builds(tmp.path(), &[1, 2]);
        let build1 = job.build(1).expect("load").expect("build 1");
        let inherited = store::archive_dir(build1.root_dir());
        fs::create_dir_all(&inherited).expect("mkdir archive");
        fs::write(inherited.join("notes.txt"), "scratch").expect("write stray file");

        let out = delete(&job, 1).expect("archival ran");
        assert!(out.written.is_empty());
        assert!(!out.marker_added);
        assert!(!job.build(2).expect("load").expect("build 2").has_history());
        assert!(archive_of(&job, 2).is_empty());
    }

    #[test]
    fn stray_files_do_not_travel_with_real_entries() {
        let tmp = tempdir().expect("tempdir");
        let job = job_with_builds(tmp.path(), &[1, 2]);
        let build1 = job.build(1).expect("load").expect("build 1");
        let inherited = store::archive_dir(build1.root_dir());
        fs::create_dir_all(&inherited).expect("mkdir archive");
        fs::write(inherited.join("notes.txt"), "scratch").expect("write stray file");
        fs::write(
            inherited.join("007.xml"),
            svn_log_xml(&[SvnCommit::new(7, "padded entry")]),
        )
        .expect("write padded entry");

        let out = delete(&job, 1).expect("archival ran");
        assert_eq!(out.written, vec!["007.xml".to_string()]);
        assert!(out.marker_added);
        let build2 = job.build(2).expect("load").expect("build 2");
        assert!(!store::archive_dir(build2.root_dir()).join("notes.txt").exists());
        assert_eq!(archive_of(&job, 2).keys().copied().collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn inherited_history_moves_forward_with_original_numbers() {
        let tmp = tempdir().expect("tempdir");
        let job = job_with_builds(tmp.path(), &[2, 3, 4]);
        for number in [2, 3] {
            let build = job.build(number).expect("load").expect("build");
            let xml = svn_log_xml(&[SvnCommit::new(number * 10, &format!("commit {number}"))]);
            fs::write(build.change_log_file(), xml).expect("write change log");
        }

        delete(&job, 2).expect("archival of 2");
        let out = delete(&job, 3).expect("archival of 3");
        assert_eq!(out.written, vec!["2.xml".to_string(), "3.xml".to_string()]);

        let archive = archive_of(&job, 4);
        assert_eq!(archive.keys().copied().collect::<Vec<_>>(), vec![2, 3]);
        assert!(String::from_utf8_lossy(&archive[&2]).contains("commit 2"));
        assert!(String::from_utf8_lossy(&archive[&3]).contains("commit 3"));
    }

    #[test]
    fn rerunning_for_same_build_is_idempotent() {
        let tmp = tempdir().expect("tempdir");
        let job = job_with_builds(tmp.path(), &[5, 6]);
        let build5 = job.build(5).expect("load").expect("build 5");
        fs::write(
            build5.change_log_file(),
            svn_log_xml(&[SvnCommit::new(50, "remove file")]),
        )
        .expect("write change log");

        let first = copy_change_logs(&build5).expect("first pass");
        let after_first = archive_of(&job, 6);
        let second = copy_change_logs(&build5).expect("second pass");
        let after_second = archive_of(&job, 6);

        assert_eq!(first.written, vec!["5.xml".to_string()]);
        assert!(first.marker_added);
        assert!(second.written.is_empty());
        assert_eq!(second.unchanged, vec!["5.xml".to_string()]);
        assert!(!second.marker_added);
        assert_eq!(after_first, after_second);
    }

    #[test]
    fn unparseable_change_log_is_still_archived() {
        let tmp = tempdir().expect("tempdir");
        let job = job_with_builds(tmp.path(), &[1, 2]);
        let build1 = job.build(1).expect("load").expect("build 1");
        fs::write(build1.change_log_file(), "<log><logentry></log>").expect("write broken log");

        let out = delete(&job, 1).expect("archival ran");
        assert_eq!(out.written, vec!["1.xml".to_string()]);
    }

    #[test]
    fn failures_are_swallowed_by_the_deletion_hook() {
        let tmp = tempdir().expect("tempdir");
        let job = job_with_builds(tmp.path(), &[1, 2]);
        let build1 = job.build(1).expect("load").expect("build 1");
        fs::write(
            build1.change_log_file(),
            svn_log_xml(&[SvnCommit::new(1, "first")]),
        )
        .expect("write change log");
        let build2 = job.build(2).expect("load").expect("build 2");
        // A plain file where the archive dir should go makes mkdir fail.
        fs::write(store::archive_dir(build2.root_dir()), "blocker").expect("write blocker");

        assert!(copy_change_logs(&build1).is_err());
        assert!(on_deleted(&build1).is_none());
        assert!(!job.build(2).expect("load").expect("build 2").has_history());
    }
}
