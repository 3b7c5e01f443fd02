use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// CLI preferences kept next to the session file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub current_portfolio: Option<i64>,
    pub last_email: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("ATLAS_CLI_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("atlas").join("cli")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// Durable token/profile storage used by the session
pub fn session_file() -> anyhow::Result<PathBuf> {
    Ok(get_config_dir()?.join("session.json"))
}

pub fn load_environment_config() -> anyhow::Result<EnvironmentConfig> {
    let config_dir = get_config_dir()?;
    let env_file = config_dir.join("env.json");

    if !env_file.exists() {
        return Ok(EnvironmentConfig::default());
    }

    let content = fs::read_to_string(env_file)?;
    let config: EnvironmentConfig = serde_json::from_str(&content)?;
    Ok(config)
}

pub fn save_environment_config(config: &EnvironmentConfig) -> anyhow::Result<()> {
    let config_dir = get_config_dir()?;
    let env_file = config_dir.join("env.json");

    let mut config = config.clone();
    config.updated_at = Some(Utc::now());

    let content = serde_json::to_string_pretty(&config)?;
    fs::write(env_file, content)?;
    Ok(())
}

/// Update the environment config in place
pub fn update_environment_config<F>(update: F) -> anyhow::Result<EnvironmentConfig>
where
    F: FnOnce(&mut EnvironmentConfig),
{
    let mut config = load_environment_config()?;
    update(&mut config);
    save_environment_config(&config)?;
    Ok(config)
}
