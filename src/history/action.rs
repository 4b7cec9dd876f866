use crate::error::HistoryError;
use crate::history::build::Build;
use crate::history::changelog::ChangeLogSet;
use crate::history::index::{self, HistoryListing};

pub const URL_NAME: &str = "changelog-history";
pub const DISPLAY_NAME: &str = "Change Log History";
pub const ICON_FILE_NAME: &str = "notepad.gif";

#[derive(Debug)]
pub enum Dispatch {
    Listing(HistoryListing),
    Detail {
        number: u64,
        set: Box<dyn ChangeLogSet>,
    },
    NotFound(String),
    BadRequest(String),
}

pub struct HistoryAction<'a> {
    build: &'a dyn Build,
}

impl<'a> HistoryAction<'a> {
    pub fn for_build(build: &'a dyn Build) -> Option<Self> {
        build.has_history().then_some(Self { build })
    }

    pub fn build(&self) -> &dyn Build {
        self.build
    }

    pub fn url_name(&self) -> &'static str {
        URL_NAME
    }

    pub fn display_name(&self) -> &'static str {
        DISPLAY_NAME
    }

    pub fn icon_file_name(&self) -> &'static str {
        ICON_FILE_NAME
    }

    pub fn url(&self) -> String {
        format!("{}{URL_NAME}/", self.build.url())
    }

    pub fn listing(&self) -> HistoryListing {
        index::list_history(self.build)
    }

    pub fn dispatch(&self, rest: &str) -> Result<Dispatch, HistoryError> {
        let rest = rest.trim_start_matches('/');
        if rest.is_empty() {
            return Ok(Dispatch::Listing(self.listing()));
        }

        let Some((head, tail)) = rest.split_once('/') else {
            return Ok(Dispatch::BadRequest(format!(
                "expected `<build>/changes`, got `{rest}`"
            )));
        };
        if tail != "changes" && tail != "changes/" {
            return Ok(Dispatch::BadRequest(format!(
                "expected `{head}/changes`, got `{rest}`"
            )));
        }

        let Some(number) = parse_build_number(head) else {
            return Ok(Dispatch::NotFound(format!("`{head}` is not a build number")));
        };
        match index::fetch_one(self.build, number)? {
            Some(set) => Ok(Dispatch::Detail { number, set }),
            None => Ok(Dispatch::NotFound(
                HistoryError::NotFound { number }.to_string(),
            )),
        }
    }
}

fn parse_build_number(raw: &str) -> Option<u64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse::<u64>().ok()
}
