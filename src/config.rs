use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub data: DataConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    /// Directory holding the live snapshot's JSON tables.
    pub live_path: PathBuf,
    /// Directory holding the review (preview build) snapshot.
    pub review_path: PathBuf,
    /// TOML file persisting the chat-group → snapshot mapping.
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
    /// Directory holding `hero_aliases.json` and `monster_aliases.json`.
    #[serde(default = "default_alias_dir")]
    pub alias_dir: PathBuf,
}

fn default_state_file() -> PathBuf {
    PathBuf::from("./data/group_sources.toml")
}

fn default_alias_dir() -> PathBuf {
    PathBuf::from("./data/aliases")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
    /// User ids allowed to switch a group's data source over HTTP.
    #[serde(default)]
    pub admin_users: Vec<i64>,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.data.live_path.as_os_str().is_empty() {
        anyhow::bail!("data.live_path must not be empty");
    }
    if config.data.review_path.as_os_str().is_empty() {
        anyhow::bail!("data.review_path must not be empty");
    }
    if config.data.live_path == config.data.review_path {
        anyhow::bail!("data.live_path and data.review_path must differ");
    }
    if config.server.bind.is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }

    Ok(config)
}
