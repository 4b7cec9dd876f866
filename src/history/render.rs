use crate::history::action::HistoryAction;
use crate::history::annotator::{HistoryPageLink, MarkupText, ViewContext};
use crate::history::build::Build;
use crate::history::changelog::{ChangeEntry, ChangeLogSet};
use crate::history::index::{ArchiveEntry, HistoryListing};
use crate::history::util::escape_html;
use chrono::{DateTime, Utc};

fn display_date(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw.trim()) {
        Ok(parsed) => parsed
            .with_timezone(&Utc)
            .format("%Y-%m-%d %H:%M:%S UTC")
            .to_string(),
        Err(_) => raw.to_string(),
    }
}

fn first_line(msg: &str) -> &str {
    msg.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("")
}

fn entry_summary(entry: &ChangeEntry) -> String {
    let mut out = escape_html(first_line(&entry.msg));
    if !entry.author.is_empty() {
        out.push_str(&format!(" ({})", escape_html(&entry.author)));
    }
    out
}

fn push_revisions(out: &mut String, set: &dyn ChangeLogSet) {
    let labels = set.revision_labels();
    if labels.is_empty() {
        return;
    }
    out.push_str("<p>Revisions:</p>\n<ul>\n");
    for label in labels {
        out.push_str(&format!("<li>{}</li>\n", escape_html(&label)));
    }
    out.push_str("</ul>\n");
}

pub fn render_listing(action: &HistoryAction<'_>, listing: &HistoryListing) -> String {
    let mut out = format!(
        "<h1><img src=\"/images/24x24/{}\" alt=\"\"> {} of build #{}</h1>\n",
        action.icon_file_name(),
        action.display_name(),
        action.build().number()
    );
    if listing.items.is_empty() {
        out.push_str("<p>No change log history.</p>\n");
        return out;
    }

    for item in &listing.items {
        let number = item.number;
        out.push_str(&format!(
            "<h2><a href=\"{number}/changes\">Build #{number}</a></h2>\n"
        ));
        match &item.entry {
            ArchiveEntry::Failed(message) => {
                out.push_str(&format!(
                    "<p class=\"error\">Failed to render change log: {}</p>\n",
                    escape_html(message)
                ));
            }
            ArchiveEntry::Parsed(set) if set.is_empty_set() => {
                out.push_str("<p>No changes.</p>\n");
            }
            ArchiveEntry::Parsed(set) => {
                out.push_str("<ol>\n");
                for (i, entry) in set.entries().iter().enumerate() {
                    out.push_str(&format!(
                        "<li><a href=\"{number}/changes#detail{i}\">{}</a></li>\n",
                        entry_summary(entry)
                    ));
                }
                out.push_str("</ol>\n");
            }
        }
    }
    out
}

pub fn render_detail(number: u64, set: &dyn ChangeLogSet) -> String {
    let mut out = format!(
        "<h1>Changes in build #{number}</h1>\n<p>Source control: {}</p>\n",
        set.kind()
    );
    push_revisions(&mut out, set);
    if set.is_empty_set() {
        out.push_str("<p>No changes.</p>\n");
        return out;
    }

    for (i, entry) in set.entries().iter().enumerate() {
        out.push_str(&format!("<div id=\"detail{i}\">\n<h3>"));
        if let Some(rev) = &entry.revision {
            out.push_str(&format!("Revision {} ", escape_html(rev)));
        }
        if !entry.author.is_empty() {
            out.push_str(&format!("by {} ", escape_html(&entry.author)));
        }
        if let Some(date) = &entry.date {
            out.push_str(&format!("on {}", escape_html(&display_date(date))));
        }
        out.push_str("</h3>\n");
        out.push_str(&format!("<pre>{}</pre>\n", escape_html(entry.msg.trim())));
        if !entry.paths.is_empty() {
            out.push_str("<ul>\n");
            for path in &entry.paths {
                out.push_str(&format!(
                    "<li>{} {}</li>\n",
                    escape_html(&path.action),
                    escape_html(&path.path)
                ));
            }
            out.push_str("</ul>\n");
        }
        out.push_str("</div>\n");
    }
    out
}

pub fn render_changes(
    build: &dyn Build,
    set: &dyn ChangeLogSet,
    view: &ViewContext<'_>,
    link: &HistoryPageLink,
) -> String {
    let mut out = format!("<h2>Build #{}</h2>\n", build.number());
    if set.is_empty_set() {
        out.push_str("<p>No changes.</p>\n");
        return out;
    }

    out.push_str("<ol>\n");
    for (i, entry) in set.entries().iter().enumerate() {
        let mut text = MarkupText::new(entry_summary(entry));
        link.annotate(build, view, set, i, &mut text);
        out.push_str(&format!("<li>{}</li>\n", text.into_string()));
    }
    out.push_str("</ol>\n");
    out
}
