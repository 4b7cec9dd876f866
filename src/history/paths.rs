use anyhow::Result;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct HistoryPaths {
    pub home: PathBuf,
    pub jobs_dir: PathBuf,
    pub config_file: PathBuf,
}

fn required_home_dir() -> Result<PathBuf> {
    if let Some(home) = dirs::home_dir() {
        return Ok(home);
    }
    Err(anyhow::anyhow!("HOME directory could not be resolved"))
}

fn env_or_default_path(var: &str, fallback: PathBuf) -> PathBuf {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => fallback,
    }
}

pub fn resolve_paths() -> Result<HistoryPaths> {
    let home = match env::var("CLH_HOME") {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => required_home_dir()?.join(".changelog-history"),
    };
    let jobs_dir = env_or_default_path("CLH_JOBS_DIR", home.join("jobs"));
    let config_file = env_or_default_path("CLH_CONFIG_PATH", home.join("config.toml"));

    Ok(HistoryPaths {
        home,
        jobs_dir,
        config_file,
    })
}
