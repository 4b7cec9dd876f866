use anyhow::Result;

use crate::commands::{CommandReport, open_build};
use crate::history::action::HistoryAction;
use crate::history::build::Build;
use crate::history::paths::resolve_paths;
use crate::history::render::render_listing;

#[derive(Debug, Clone)]
pub struct HistoryOptions {
    pub job: String,
    pub build: u64,
}

pub fn run(opts: &HistoryOptions) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let mut report = CommandReport::new("history");

    let Some((_job, build)) = open_build(&paths, &opts.job, opts.build, &mut report)? else {
        return Ok(report);
    };
    let Some(action) = HistoryAction::for_build(&build) else {
        report.detail("status=404");
        report.issue(format!("build #{} has no change log history", build.number()));
        return Ok(report);
    };

    let listing = action.listing();
    report.detail(format!("action={}", action.url_name()));
    report.detail(format!("url={}", action.url()));
    report.detail(format!(
        "entries={}",
        listing
            .numbers()
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(",")
    ));
    if listing.failed() > 0 {
        report.detail(format!("failed_entries={}", listing.failed()));
    }
    report.set_page(render_listing(&action, &listing));
    Ok(report)
}
