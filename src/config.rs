use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::clean::AnonymizationConfig;
use crate::mail::imap_client::{DEFAULT_PORT, DEFAULT_SERVER};

pub const DEFAULT_BIND: &str = "0.0.0.0:3000";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub imap_server: String,
    pub imap_port: u16,
    pub bind: String,
    pub export_dir: Option<String>,
    pub anonymize: AnonymizationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            imap_server: DEFAULT_SERVER.to_string(),
            imap_port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            export_dir: None,
            anonymize: AnonymizationConfig::default(),
        }
    }
}

fn config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("no config dir available"))?
        .join("mail_inspector"))
}

pub fn config_path() -> Result<PathBuf> {
    let mut p = config_dir()?;
    fs::create_dir_all(&p)?;
    p.push("config.toml");
    Ok(p)
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

/// Read `path`, writing a template with the defaults first if it is missing.
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        let sample = Config::default();
        fs::write(path, toml::to_string_pretty(&sample)?)?;
        log::info!("created template config at {}", path.display());
        return Ok(sample);
    }
    let s = fs::read_to_string(path)?;
    let cfg: Config = toml::from_str(&s)?;
    Ok(cfg)
}

pub fn resolve_export_dir(cfg: &Config) -> PathBuf {
    cfg.export_dir
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}
