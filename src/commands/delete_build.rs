use anyhow::Result;

use crate::commands::{CommandReport, open_build};
use crate::history::audit;
use crate::history::build::Build;
use crate::history::config::load_config;
use crate::history::paths::resolve_paths;

#[derive(Debug, Clone)]
pub struct DeleteBuildOptions {
    pub job: String,
    pub build: u64,
}

pub fn run(opts: &DeleteBuildOptions) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let cfg = load_config(&paths)?;
    let mut report = CommandReport::new("delete-build");

    let Some((job, build)) = open_build(&paths, &opts.job, opts.build, &mut report)? else {
        return Ok(report);
    };
    let url = build.url();

    let outcome = job.delete_build(opts.build)?;
    report.detail(format!("deleted={url}"));

    let (status, message) = match &outcome {
        Some(out) => match out.next_build {
            Some(next) => {
                report.detail(format!("archive.next_build={next}"));
                report.detail(format!("archive.written={}", out.written.join(",")));
                report.detail(format!("archive.unchanged={}", out.unchanged.join(",")));
                report.detail(format!("archive.marker_added={}", out.marker_added));
                (
                    "ok",
                    format!(
                        "build #{} -> #{next}: {} written, {} unchanged",
                        opts.build,
                        out.written.len(),
                        out.unchanged.len()
                    ),
                )
            }
            None => {
                report.detail("archive.skipped=no next build");
                (
                    "skipped",
                    format!("build #{} has no next build", opts.build),
                )
            }
        },
        None => {
            // Deletion went ahead; the warning line carries the cause.
            report.detail("archive.failed=true");
            ("failed", format!("build #{} archival failed", opts.build))
        }
    };

    if cfg.audit.enabled
        && let Err(err) = audit::append_event(job.dir(), "archive", status, &message)
    {
        report.detail(format!("audit.write_failed={err:#}"));
    }

    Ok(report)
}
