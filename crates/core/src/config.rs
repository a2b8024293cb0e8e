use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::network::Protocol;

pub const CONFIG_FILE: &str = "cichecker.toml";
pub const CONFIG_ENV: &str = "CICHECKER_CONFIG";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub timeout_secs: Option<f64>,
    pub protocol: Option<Protocol>,
    pub recurse: Option<bool>,
    pub log_level: Option<String>,
    pub output_format: Option<String>,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents =
            std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let config: Config =
            toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
        Ok(config)
    }

    /// `$CICHECKER_CONFIG`, else `./cichecker.toml` when present.
    pub fn discover() -> Option<anyhow::Result<Self>> {
        if let Some(p) = std::env::var_os(CONFIG_ENV) {
            return Some(Config::load(&PathBuf::from(p)));
        }
        let path = Path::new(CONFIG_FILE);
        if path.exists() {
            Some(Config::load(path))
        } else {
            None
        }
    }
}
