pub mod changes;
pub mod delete_build;
pub mod history;
pub mod record_build;
pub mod show;
pub mod status;

use crate::history::fs_host::{FsBuild, FsJob};
use crate::history::paths::HistoryPaths;
use anyhow::Result;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct CommandReport {
    pub command: String,
    pub ok: bool,
    pub details: Vec<String>,
    pub issues: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
}

impl CommandReport {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ok: true,
            details: Vec::new(),
            issues: Vec::new(),
            page: None,
        }
    }

    pub fn detail(&mut self, text: impl Into<String>) {
        self.details.push(text.into());
    }

    pub fn issue(&mut self, text: impl Into<String>) {
        self.ok = false;
        self.issues.push(text.into());
    }

    pub fn set_page(&mut self, page: String) {
        self.page = Some(page);
    }
}

pub fn open_build(
    paths: &HistoryPaths,
    job_name: &str,
    number: u64,
    report: &mut CommandReport,
) -> Result<Option<(FsJob, FsBuild)>> {
    let job = FsJob::open(&paths.jobs_dir, job_name)?;
    match job.build(number)? {
        Some(build) => Ok(Some((job, build))),
        None => {
            report.detail("status=404");
            report.issue(format!("build #{number} not found in job `{job_name}`"));
            Ok(None)
        }
    }
}
