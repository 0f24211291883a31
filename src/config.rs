use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
pub struct Config {
    /// Sender identity for outgoing invites
    pub sender: SenderConfig,

    /// Which mailer binary to use (convoke-mailer-<name>)
    #[serde(default = "default_mailer")]
    pub mailer: String,
}

#[derive(Debug, Deserialize)]
pub struct SenderConfig {
    /// From address, e.g. "Convoke Polls <polls@example.com>"
    pub from: String,

    /// Reply-To override; defaults to the poll creator's address
    #[serde(default)]
    pub reply_to: Option<String>,
}

fn default_mailer() -> String {
    "smtp".to_string()
}

/// Get the config directory path (~/.config/convoke)
pub fn config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Could not determine config directory")?
        .join("convoke");
    Ok(config_dir)
}

/// Get the config file path (~/.config/convoke/config.toml)
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Load config from ~/.config/convoke/config.toml
pub fn load_config() -> Result<Config> {
    let path = config_path()?;

    if !path.exists() {
        anyhow::bail!(
            "Config file not found at {}\n\n\
            Create it with your sender identity:\n\n\
            [sender]\n\
            from = \"Convoke Polls <polls@example.com>\"\n\
            # reply_to = \"you@example.com\"\n\n\
            mailer = \"smtp\"",
            path.display()
        );
    }

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;

    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

    Ok(config)
}
