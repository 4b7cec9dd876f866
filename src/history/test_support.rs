//! Fixtures shared by unit tests.

use crate::history::fs_host::{FsJob, ScmKind};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct SvnCommit {
    pub revision: u64,
    pub author: String,
    pub msg: String,
    pub paths: Vec<(String, String)>,
}

impl SvnCommit {
    pub fn new(revision: u64, msg: &str) -> Self {
        Self {
            revision,
            author: "alan".to_string(),
            msg: msg.to_string(),
            paths: Vec::new(),
        }
    }

    pub fn path(mut self, action: &str, path: &str) -> Self {
        self.paths.push((action.to_string(), path.to_string()));
        self
    }
}

pub fn svn_log_xml(commits: &[SvnCommit]) -> String {
    let mut out = String::from("<?xml version=\"1.0\"?>\n<log>\n");
    for commit in commits {
        out.push_str(&format!("<logentry revision=\"{}\">\n", commit.revision));
        out.push_str(&format!("<author>{}</author>\n", commit.author));
        out.push_str("<date>2009-07-24T23:30:14.221869Z</date>\n");
        out.push_str("<paths>\n");
        for (action, path) in &commit.paths {
            out.push_str(&format!(
                "<path kind=\"file\" action=\"{action}\">{path}</path>\n"
            ));
        }
        out.push_str("</paths>\n");
        out.push_str(&format!("<msg>{}</msg>\n", commit.msg));
        out.push_str("</logentry>\n");
    }
    out.push_str("</log>\n");
    out
}

pub fn job_with_builds(jobs_dir: &Path, numbers: &[u64]) -> FsJob {
    let job = FsJob::create(jobs_dir, "test-job").expect("create job");
    for number in numbers {
        job.record_build(*number, ScmKind::Svn, None)
            .expect("record build");
    }
    job
}
