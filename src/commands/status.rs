use anyhow::Result;
use std::env;

use crate::commands::CommandReport;
use crate::history::audit;
use crate::history::config::load_config;
use crate::history::fs_host::FsJob;
use crate::history::paths::resolve_paths;

include!(concat!(env!("OUT_DIR"), "/clh_env_allowlist.rs"));

pub fn run() -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let mut report = CommandReport::new("status");

    report.detail(format!("home={}", paths.home.display()));
    report.detail(format!("jobs_dir={}", paths.jobs_dir.display()));
    report.detail(format!("config_file={}", paths.config_file.display()));
    for key in GENERATED_CLH_ENV_ALLOWLIST {
        let state = if env::var_os(key).is_some() { "set" } else { "unset" };
        report.detail(format!("env.{key}={state}"));
    }

    match load_config(&paths) {
        Ok(cfg) => {
            report.detail(format!("web.context_path={}", cfg.web.context_path));
            report.detail(format!("web.link_text={}", cfg.web.link_text));
            report.detail(format!("audit.enabled={}", cfg.audit.enabled));
        }
        Err(err) => report.issue(format!("config invalid: {err:#}")),
    }

    if !paths.jobs_dir.exists() {
        report.issue(format!("missing jobs dir ({})", paths.jobs_dir.display()));
        return Ok(report);
    }

    let mut names = Vec::new();
    for entry in std::fs::read_dir(&paths.jobs_dir)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            names.push(name.to_string());
        }
    }
    names.sort();

    for name in names {
        let Ok(job) = FsJob::open(&paths.jobs_dir, &name) else {
            continue;
        };
        let numbers = job.build_numbers()?;
        let mut with_history = Vec::new();
        for number in &numbers {
            if let Some(build) = job.build(*number)?
                && build.metadata().history
            {
                with_history.push(number.to_string());
            }
        }
        report.detail(format!(
            "job.{name}=builds:{} history:[{}]",
            numbers.len(),
            with_history.join(",")
        ));
        match audit::read_events(job.dir()) {
            Ok(events) => {
                if let Some(last) = events.last() {
                    report.detail(format!(
                        "job.{name}.last_archive={} {} at {}",
                        last.status, last.message, last.at_epoch_secs
                    ));
                }
            }
            Err(err) => report.issue(format!("job.{name}.audit unreadable: {err:#}")),
        }
    }

    Ok(report)
}
