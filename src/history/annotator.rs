use crate::history::action::URL_NAME;
use crate::history::build::Build;
use crate::history::changelog::ChangeLogSet;
use crate::history::util::escape_html;

pub const DEFAULT_LINK_TEXT: &str = "More change log history";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    ChangeList,
    Other,
}

impl ViewKind {
    pub fn from_request_path(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        if path.ends_with("/changes") {
            Self::ChangeList
        } else {
            Self::Other
        }
    }
}

/// The page being rendered, passed explicitly to annotators.
#[derive(Debug, Clone, Copy)]
pub struct ViewContext<'a> {
    pub kind: ViewKind,
    pub context_path: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkupText {
    text: String,
}

impl MarkupText {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn wrap_by(&mut self, start: &str, end: &str) {
        self.text.insert_str(0, start);
        self.text.push_str(end);
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

#[derive(Debug, Clone)]
pub struct HistoryPageLink {
    link_text: String,
}

impl Default for HistoryPageLink {
    fn default() -> Self {
        Self::new(DEFAULT_LINK_TEXT)
    }
}

impl HistoryPageLink {
    pub fn new(link_text: impl Into<String>) -> Self {
        Self {
            link_text: link_text.into(),
        }
    }

    pub fn link_markup(&self, build: &dyn Build, context_path: &str) -> String {
        format!(
            "<div style=\"float:right\"><a href=\"{}/{}{}/\">{}</a></div>",
            escape_html(context_path),
            escape_html(&build.url()),
            URL_NAME,
            escape_html(&self.link_text)
        )
    }

    pub fn annotate(
        &self,
        build: &dyn Build,
        view: &ViewContext<'_>,
        set: &dyn ChangeLogSet,
        entry_index: usize,
        text: &mut MarkupText,
    ) {
        if !build.has_history() {
            return;
        }
        if view.kind != ViewKind::ChangeList {
            return;
        }
        if entry_index + 1 != set.entries().len() {
            return;
        }
        text.wrap_by("", &self.link_markup(build, view.context_path));
    }
}
