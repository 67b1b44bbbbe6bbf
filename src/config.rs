use crate::retry::RetryPolicy;
use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub sonar: SonarConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub retry: RetryPolicy,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct SonarConfig {
    /// Base URL of the SonarQube/SonarCloud server
    #[serde(default = "default_sonar_base_url")]
    pub base_url: String,
    /// Project whose issues and hotspots are fixed
    #[serde(default = "default_project_key")]
    pub project_key: String,
}

impl Default for SonarConfig {
    fn default() -> Self {
        Self {
            base_url: default_sonar_base_url(),
            project_key: default_project_key(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible inference endpoint
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Request timeout in seconds (unset: no timeout)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_model(),
            timeout_secs: None,
        }
    }
}

fn default_sonar_base_url() -> String {
    "https://sonarcloud.io".to_string()
}

fn default_project_key() -> String {
    "pundliksarafdar_sonar-autofix-llm".to_string()
}

fn default_llm_base_url() -> String {
    "https://models.github.ai/inference".to_string()
}

fn default_model() -> String {
    "openai/gpt-4.1".to_string()
}

impl Config {
    /// Load config from a TOML file, falling back to defaults when it does not exist
    pub fn load(path: &str, overrides: &[String]) -> anyhow::Result<Self> {
        let mut value = if Path::new(path).exists() {
            let content =
                fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
            toml::from_str::<toml::Value>(&content)
                .with_context(|| format!("Failed to parse {}", path))?
        } else {
            toml::Value::Table(toml::Table::new())
        };

        for entry in overrides {
            apply_override(&mut value, entry)?;
        }

        value
            .try_into()
            .with_context(|| format!("Invalid config in {}", path))
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Apply a `dotted.key=value` override to a parsed TOML document
///
/// Values are parsed as TOML scalars when possible and kept as strings otherwise.
fn apply_override(root: &mut toml::Value, entry: &str) -> anyhow::Result<()> {
    let Some((key, raw)) = entry.split_once('=') else {
        bail!("Invalid override '{}', expected key=value", entry);
    };
    let parts: Vec<&str> = key.trim().split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        bail!("Invalid override key '{}'", key);
    }

    let mut current = root;
    for part in &parts[..parts.len() - 1] {
        let table = current
            .as_table_mut()
            .with_context(|| format!("Override '{}' does not point into a table", key))?;
        current = table
            .entry(part.to_string())
            .or_insert_with(|| toml::Value::Table(toml::Table::new()));
    }

    let table = current
        .as_table_mut()
        .with_context(|| format!("Override '{}' does not point into a table", key))?;
    table.insert(parts[parts.len() - 1].to_string(), parse_scalar(raw.trim()));
    Ok(())
}

fn parse_scalar(raw: &str) -> toml::Value {
    if let Ok(b) = raw.parse::<bool>() {
        toml::Value::Boolean(b)
    } else if let Ok(i) = raw.parse::<i64>() {
        toml::Value::Integer(i)
    } else if let Ok(f) = raw.parse::<f64>() {
        toml::Value::Float(f)
    } else {
        toml::Value::String(raw.to_string())
    }
}

/// Everything a fix pass needs, resolved once at startup
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: Config,
    pub sonar_token: String,
    pub llm_api_key: String,
    pub source_root: PathBuf,
    pub dry_run: bool,
}
