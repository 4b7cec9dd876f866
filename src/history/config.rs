use crate::history::annotator::DEFAULT_LINK_TEXT;
use crate::history::paths::HistoryPaths;
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub context_path: String,
    pub link_text: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            context_path: String::new(),
            link_text: DEFAULT_LINK_TEXT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub enabled: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HistoryConfig {
    pub web: WebConfig,
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialHistoryConfig {
    web: Option<WebConfig>,
    audit: Option<AuditConfig>,
}

fn env_or_bool(var: &str, fallback: bool) -> bool {
    match env::var(var) {
        Ok(v) => match v.trim() {
            "1" | "true" | "TRUE" | "yes" | "on" => true,
            "0" | "false" | "FALSE" | "no" | "off" => false,
            _ => fallback,
        },
        Err(_) => fallback,
    }
}

fn env_or_string(var: &str, fallback: &str) -> String {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

fn validate(cfg: &HistoryConfig) -> Result<()> {
    let context = &cfg.web.context_path;
    if !context.is_empty() && (!context.starts_with('/') || context.ends_with('/')) {
        return Err(anyhow!(
            "invalid context path `{context}`: use empty or `/prefix` without trailing slash"
        ));
    }
    if cfg.web.link_text.trim().is_empty() {
        return Err(anyhow!("invalid link text: cannot be empty"));
    }
    Ok(())
}

fn merge_file_config(base: &mut HistoryConfig, path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(path)?;
    let parsed: PartialHistoryConfig = toml::from_str(&raw)
        .map_err(|err| anyhow!("failed to parse config {}: {err}", path.display()))?;
    if let Some(web) = parsed.web {
        base.web = web;
    }
    if let Some(audit) = parsed.audit {
        base.audit = audit;
    }
    Ok(())
}

pub fn load_config(paths: &HistoryPaths) -> Result<HistoryConfig> {
    let mut cfg = HistoryConfig::default();
    merge_file_config(&mut cfg, &paths.config_file)?;

    cfg.web.context_path = match env::var("CLH_CONTEXT_PATH") {
        Ok(v) => v.trim().to_string(),
        Err(_) => cfg.web.context_path,
    };
    cfg.web.link_text = env_or_string("CLH_LINK_TEXT", &cfg.web.link_text);
    cfg.audit.enabled = env_or_bool("CLH_AUDIT_ENABLED", cfg.audit.enabled);

    validate(&cfg)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_sections_replace_defaults() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            "[web]\ncontext_path = \"/jenkins\"\nlink_text = \"Older changes\"\n",
        )
        .expect("write config");

        let mut cfg = HistoryConfig::default();
        merge_file_config(&mut cfg, &path).expect("merge");
        assert_eq!(cfg.web.context_path, "/jenkins");
        assert_eq!(cfg.web.link_text, "Older changes");
        assert!(cfg.audit.enabled);
        validate(&cfg).expect("valid");
    }

    #[test]
    fn missing_file_keeps_defaults() {
        let tmp = tempdir().expect("tempdir");
        let mut cfg = HistoryConfig::default();
        merge_file_config(&mut cfg, &tmp.path().join("absent.toml")).expect("merge");
        assert_eq!(cfg.web.link_text, DEFAULT_LINK_TEXT);
    }

    #[test]
    fn validate_rejects_bad_context_path() {
        let mut cfg = HistoryConfig::default();
        cfg.web.context_path = "jenkins".to_string();
        assert!(validate(&cfg).is_err());
        cfg.web.context_path = "/jenkins/".to_string();
        assert!(validate(&cfg).is_err());
        cfg.web.context_path = "/jenkins".to_string();
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn validate_rejects_blank_link_text() {
        let mut cfg = HistoryConfig::default();
        cfg.web.link_text = "  ".to_string();
        assert!(validate(&cfg).is_err());
    }
}
