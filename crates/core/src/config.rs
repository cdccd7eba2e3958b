use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub default_patterns: Vec<String>,
    pub exiftool_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_patterns: vec!["*".to_string()],
            exiftool_path: None,
        }
    }
}

fn config_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from("com", "kelly", "tphoto-renamer")
        .context("設定ディレクトリを特定できませんでした")?;
    Ok(proj.config_dir().join("config.toml"))
}

pub fn load_config() -> Result<AppConfig> {
    let path = config_path()?;
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(AppConfig::default()),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("設定ファイルを読めませんでした: {}", path.display()))
        }
    };
    toml::from_str(&raw)
        .with_context(|| format!("設定ファイルの形式が不正です: {}", path.display()))
}
