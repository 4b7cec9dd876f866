use anyhow::Result;

use crate::commands::{CommandReport, open_build};
use crate::history::action::{Dispatch, HistoryAction, URL_NAME};
use crate::history::build::Build;
use crate::history::paths::resolve_paths;
use crate::history::render::{render_detail, render_listing};

#[derive(Debug, Clone)]
pub struct ShowOptions {
    pub job: String,
    pub build: u64,
    pub path: String,
}

fn strip_action_prefix(path: &str) -> &str {
    let path = path.trim_start_matches('/');
    match path.strip_prefix(URL_NAME) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => path,
    }
}

pub fn run(opts: &ShowOptions) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let mut report = CommandReport::new("show");

    let Some((_job, build)) = open_build(&paths, &opts.job, opts.build, &mut report)? else {
        return Ok(report);
    };
    let Some(action) = HistoryAction::for_build(&build) else {
        report.detail("status=404");
        report.issue(format!("build #{} has no change log history", build.number()));
        return Ok(report);
    };

    match action.dispatch(strip_action_prefix(&opts.path))? {
        Dispatch::Listing(listing) => {
            report.detail("status=200");
            report.set_page(render_listing(&action, &listing));
        }
        Dispatch::Detail { number, set } => {
            report.detail("status=200");
            report.detail(format!("build_number={number}"));
            report.set_page(render_detail(number, set.as_ref()));
        }
        Dispatch::NotFound(message) => {
            report.detail("status=404");
            report.issue(format!("not found: {message}"));
        }
        Dispatch::BadRequest(message) => {
            report.detail("status=400");
            report.issue(format!("bad request: {message}"));
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::strip_action_prefix;

    #[test]
    fn action_prefix_is_optional() {
        assert_eq!(strip_action_prefix("changelog-history/5/changes"), "/5/changes");
        assert_eq!(strip_action_prefix("/changelog-history/"), "/");
        assert_eq!(strip_action_prefix("changelog-history"), "");
        assert_eq!(strip_action_prefix("5/changes"), "5/changes");
        assert_eq!(strip_action_prefix("changelog-historyx/5"), "changelog-historyx/5");
    }
}
