use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const API_VERSION: &str = "legacy";

const ENV_URL: &str = "ZENTAO_URL";
const ENV_USERNAME: &str = "ZENTAO_USERNAME";
const ENV_PASSWORD: &str = "ZENTAO_PASSWORD";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub url: String,
    pub username: String,
    pub password: String,
    #[serde(default = "legacy")]
    pub api_version: String,
}

fn legacy() -> String {
    API_VERSION.into()
}

impl Credentials {
    pub fn new(url: &str, username: &str, password: &str) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
            api_version: legacy(),
        }
    }

    /// Copy safe to print.
    pub fn masked(&self) -> Self {
        Self {
            password: "***".into(),
            ..self.clone()
        }
    }
}

pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".zentao")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Credentials from the environment, falling back to the config file.
pub fn load() -> Result<Option<Credentials>> {
    load_from(|key| std::env::var(key).ok(), &config_path())
}

pub fn save(credentials: &Credentials) -> Result<()> {
    save_to(credentials, &config_path())
}

pub(crate) fn load_from(
    env: impl Fn(&str) -> Option<String>,
    path: &Path,
) -> Result<Option<Credentials>> {
    let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());
    if let (Some(url), Some(username), Some(password)) =
        (var(ENV_URL), var(ENV_USERNAME), var(ENV_PASSWORD))
    {
        return Ok(Some(Credentials::new(&url, &username, &password)));
    }

    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let mut credentials: Credentials = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    credentials.url = credentials.url.trim_end_matches('/').to_string();
    credentials.api_version = legacy();
    Ok(Some(credentials))
}

pub(crate) fn save_to(credentials: &Credentials, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let stored = Credentials {
        api_version: legacy(),
        ..credentials.clone()
    };
    let contents = toml::to_string_pretty(&stored).context("Failed to serialize credentials")?;
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;
    Ok(())
}
