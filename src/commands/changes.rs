use anyhow::Result;

use crate::commands::{CommandReport, open_build};
use crate::history::annotator::{HistoryPageLink, ViewContext, ViewKind};
use crate::history::build::Build;
use crate::history::changelog::{ChangeLogSet, EmptyChangeLogSet};
use crate::history::config::load_config;
use crate::history::fs_host::{FsBuild, FsJob};
use crate::history::paths::resolve_paths;
use crate::history::render::render_changes;
use crate::history::util::escape_html;

#[derive(Debug, Clone)]
pub struct ChangesOptions {
    pub job: String,
    pub build: Option<u64>,
}

fn change_set(build: &FsBuild) -> Result<Box<dyn ChangeLogSet>> {
    let file = build.change_log_file();
    if !file.is_file() {
        return Ok(Box::new(EmptyChangeLogSet));
    }
    build.change_log_parser().parse(build, &file)
}

fn render_build(
    build: &FsBuild,
    view: &ViewContext<'_>,
    link: &HistoryPageLink,
    report: &mut CommandReport,
) -> String {
    match change_set(build) {
        Ok(set) => render_changes(build, set.as_ref(), view, link),
        Err(err) => {
            report.detail(format!("build.{}.change_log=unreadable", build.number()));
            format!(
                "<h2>Build #{}</h2>\n<p class=\"error\">Failed to render change log: {}</p>\n",
                build.number(),
                escape_html(&format!("{err:#}"))
            )
        }
    }
}

pub fn run(opts: &ChangesOptions) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let cfg = load_config(&paths)?;
    let mut report = CommandReport::new("changes");
    let link = HistoryPageLink::new(cfg.web.link_text.clone());
    let view_for = |request_path: &str| ViewContext {
        kind: ViewKind::from_request_path(request_path),
        context_path: &cfg.web.context_path,
    };

    let mut page = String::from("<h1>Changes</h1>\n");
    match opts.build {
        Some(number) => {
            let Some((_job, build)) = open_build(&paths, &opts.job, number, &mut report)? else {
                return Ok(report);
            };
            let request_path = format!("{}/{}changes", cfg.web.context_path, build.url());
            report.detail(format!("url={request_path}"));
            let view = view_for(&request_path);
            page.push_str(&render_build(&build, &view, &link, &mut report));
        }
        None => {
            let job = FsJob::open(&paths.jobs_dir, &opts.job)?;
            let request_path = format!("{}/job/{}/changes", cfg.web.context_path, job.name());
            report.detail(format!("url={request_path}"));
            let view = view_for(&request_path);
            for number in job.build_numbers()?.into_iter().rev() {
                let Some(build) = job.build(number)? else {
                    continue;
                };
                page.push_str(&render_build(&build, &view, &link, &mut report));
            }
        }
    }

    report.set_page(page);
    Ok(report)
}
