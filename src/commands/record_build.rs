use anyhow::Result;
use std::path::PathBuf;

use crate::commands::CommandReport;
use crate::history::build::Build;
use crate::history::fs_host::{FsJob, ScmKind};
use crate::history::paths::resolve_paths;

#[derive(Debug, Clone)]
pub struct RecordBuildOptions {
    pub job: String,
    pub build: u64,
    pub scm: ScmKind,
    pub change_log: Option<PathBuf>,
}

pub fn run(opts: &RecordBuildOptions) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let mut report = CommandReport::new("record-build");

    let job = FsJob::create(&paths.jobs_dir, &opts.job)?;
    if job.build(opts.build)?.is_some() {
        report.issue(format!(
            "build #{} already exists in job `{}`",
            opts.build, opts.job
        ));
        return Ok(report);
    }

    let build = job.record_build(opts.build, opts.scm, opts.change_log.as_deref())?;
    report.detail(format!("build={}", build.url()));
    report.detail(format!("root={}", build.root_dir().display()));
    report.detail(format!(
        "change_log={}",
        if build.change_log_file().is_file() {
            "recorded"
        } else {
            "none"
        }
    ));
    Ok(report)
}
