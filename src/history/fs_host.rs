use crate::history::build::Build;
use crate::history::changelog::{ChangeLogParser, NullChangeLogParser};
use crate::history::svn::SvnChangeLogParser;
use crate::history::trigger::{self, ArchivalOutcome};
use anyhow::{Context, Result, anyhow, bail};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const BUILDS_DIR: &str = "builds";
pub const BUILD_METADATA_FILE: &str = "build.json";
const LOCK_FILE: &str = ".lock";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScmKind {
    #[default]
    Svn,
    None,
}

impl ScmKind {
    pub fn parser(self) -> Box<dyn ChangeLogParser> {
        match self {
            Self::Svn => Box::new(SvnChangeLogParser),
            Self::None => Box::new(NullChangeLogParser),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildMetadata {
    pub schema_version: u32,
    pub number: u64,
    pub scm: ScmKind,
    pub history: bool,
}

impl Default for BuildMetadata {
    fn default() -> Self {
        Self {
            schema_version: 1,
            number: 0,
            scm: ScmKind::default(),
            history: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FsJob {
    name: String,
    dir: PathBuf,
}

#[derive(Debug)]
pub struct JobLock {
    file: File,
}

impl Drop for JobLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn validate_job_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        bail!("job name cannot be empty");
    }
    if trimmed != name || name.contains(['/', '\\']) || name == "." || name == ".." {
        bail!("invalid job name `{name}`");
    }
    Ok(())
}

fn parse_build_dir_name(name: &str) -> Option<u64> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse::<u64>().ok().filter(|n| *n > 0)
}

impl FsJob {
    pub fn open(jobs_dir: &Path, name: &str) -> Result<Self> {
        validate_job_name(name)?;
        let dir = jobs_dir.join(name);
        if !dir.is_dir() {
            bail!("job `{name}` not found in {}", jobs_dir.display());
        }
        Ok(Self {
            name: name.to_string(),
            dir,
        })
    }

    pub fn create(jobs_dir: &Path, name: &str) -> Result<Self> {
        validate_job_name(name)?;
        let dir = jobs_dir.join(name);
        fs::create_dir_all(dir.join(BUILDS_DIR))
            .with_context(|| format!("failed to create {}", dir.display()))?;
        Ok(Self {
            name: name.to_string(),
            dir,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn builds_dir(&self) -> PathBuf {
        self.dir.join(BUILDS_DIR)
    }

    pub fn build_numbers(&self) -> Result<Vec<u64>> {
        list_build_numbers(&self.builds_dir())
    }

    pub fn build(&self, number: u64) -> Result<Option<FsBuild>> {
        FsBuild::load(&self.name, &self.builds_dir(), number)
    }

    pub fn lock(&self) -> Result<JobLock> {
        let path = self.dir.join(LOCK_FILE);
        let file = fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        file.lock_exclusive()
            .with_context(|| format!("failed to lock {}", path.display()))?;
        Ok(JobLock { file })
    }

    pub fn record_build(
        &self,
        number: u64,
        scm: ScmKind,
        change_log: Option<&Path>,
    ) -> Result<FsBuild> {
        if number == 0 {
            bail!("build numbers start at 1");
        }
        let root = self.builds_dir().join(number.to_string());
        if root.exists() {
            bail!("build #{number} already exists in job `{}`", self.name);
        }
        fs::create_dir_all(&root)
            .with_context(|| format!("failed to create {}", root.display()))?;

        let build = FsBuild {
            job_name: self.name.clone(),
            builds_dir: self.builds_dir(),
            root,
            metadata: BuildMetadata {
                number,
                scm,
                ..BuildMetadata::default()
            },
        };
        if let Some(source) = change_log {
            let dest = build.change_log_file();
            fs::copy(source, &dest).with_context(|| {
                format!("failed to copy {} to {}", source.display(), dest.display())
            })?;
        }
        build.save()?;
        Ok(build)
    }

    /// Delete a build the way the server does: the deletion hook runs first,
    /// then the build directory goes away regardless of the hook's result.
    pub fn delete_build(&self, number: u64) -> Result<Option<ArchivalOutcome>> {
        let _lock = self.lock()?;
        let build = self
            .build(number)?
            .ok_or_else(|| anyhow!("build #{number} not found in job `{}`", self.name))?;

        let outcome = trigger::on_deleted(&build);

        fs::remove_dir_all(build.root_dir())
            .with_context(|| format!("failed to remove {}", build.root_dir().display()))?;
        Ok(outcome)
    }
}

fn list_build_numbers(builds_dir: &Path) -> Result<Vec<u64>> {
    if !builds_dir.exists() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    let read_dir = fs::read_dir(builds_dir)
        .with_context(|| format!("failed to read {}", builds_dir.display()))?;
    for entry in read_dir {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        if let Some(number) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(parse_build_dir_name)
        {
            out.push(number);
        }
    }
    out.sort_unstable();
    Ok(out)
}

#[derive(Debug, Clone)]
pub struct FsBuild {
    job_name: String,
    builds_dir: PathBuf,
    root: PathBuf,
    metadata: BuildMetadata,
}

impl FsBuild {
    fn load(job_name: &str, builds_dir: &Path, number: u64) -> Result<Option<Self>> {
        let root = builds_dir.join(number.to_string());
        if !root.is_dir() {
            return Ok(None);
        }

        let meta_path = root.join(BUILD_METADATA_FILE);
        let mut metadata = if meta_path.exists() {
            let raw = fs::read_to_string(&meta_path)
                .with_context(|| format!("failed to read {}", meta_path.display()))?;
            serde_json::from_str::<BuildMetadata>(&raw)
                .with_context(|| format!("failed to parse {}", meta_path.display()))?
        } else {
            BuildMetadata::default()
        };
        // The directory name is authoritative.
        metadata.number = number;

        Ok(Some(Self {
            job_name: job_name.to_string(),
            builds_dir: builds_dir.to_path_buf(),
            root,
            metadata,
        }))
    }

    pub fn metadata(&self) -> &BuildMetadata {
        &self.metadata
    }
}

impl Build for FsBuild {
    fn number(&self) -> u64 {
        self.metadata.number
    }

    fn root_dir(&self) -> &Path {
        &self.root
    }

    fn url(&self) -> String {
        format!("job/{}/{}/", self.job_name, self.metadata.number)
    }

    fn next_build(&self) -> Result<Option<Self>> {
        let next = list_build_numbers(&self.builds_dir)?
            .into_iter()
            .find(|n| *n > self.metadata.number);
        match next {
            Some(number) => Self::load(&self.job_name, &self.builds_dir, number),
            None => Ok(None),
        }
    }

    fn change_log_parser(&self) -> Box<dyn ChangeLogParser> {
        self.metadata.scm.parser()
    }

    fn has_history(&self) -> bool {
        self.metadata.history
    }

    fn add_history_marker(&mut self) {
        self.metadata.history = true;
    }

    fn save(&self) -> Result<()> {
        let path = self.root.join(BUILD_METADATA_FILE);
        let data = serde_json::to_string_pretty(&self.metadata)?;
        let mut tmp = NamedTempFile::new_in(&self.root)
            .with_context(|| format!("failed to create temp file in {}", self.root.display()))?;
        tmp.write_all(format!("{data}\n").as_bytes())?;
        tmp.persist(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}
