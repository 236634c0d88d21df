use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

const DEFAULT_CONFIG: &str = include_str!("../config.toml");
const DEFAULT_BIND: &str = "127.0.0.1:1323";
const DEFAULT_FORM_MATCHES: usize = 5;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub leagues: Vec<League>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_form_matches")]
    pub default_form_matches: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            default_form_matches: default_form_matches(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct League {
    pub name: String,
    pub url: String,
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_form_matches() -> usize {
    DEFAULT_FORM_MATCHES
}

impl Config {
    /// Embedded defaults, or the file named by `TKS_CONFIG`. `TKS_BIND`
    /// overrides the listen address either way.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var("TKS_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::from_file(Path::new(path.trim()))?,
            _ => Self::parse(DEFAULT_CONFIG).context("embedded config is invalid")?,
        };
        if let Ok(bind) = std::env::var("TKS_BIND") {
            if !bind.trim().is_empty() {
                config.server.bind = bind.trim().to_string();
            }
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("failed to parse config {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let config: Config = toml::from_str(raw).context("invalid toml")?;
        if config.leagues.is_empty() {
            return Err(anyhow!("config lists no leagues"));
        }
        if config.server.default_form_matches == 0 {
            return Err(anyhow!("default_form_matches must be at least 1"));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_config_parses() {
        let config = Config::parse(DEFAULT_CONFIG).unwrap();
        assert!(!config.leagues.is_empty());
        assert!(config.leagues.iter().all(|l| l.url.ends_with(".csv")));
        assert_eq!(config.server.bind, DEFAULT_BIND);
    }

    #[test]
    fn server_section_is_optional() {
        let config = Config::parse(
            r#"
            [[leagues]]
            name = "Eredivisie"
            url = "https://example.invalid/N1.csv"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.default_form_matches, DEFAULT_FORM_MATCHES);
        assert_eq!(config.leagues[0].name, "Eredivisie");
    }

    #[test]
    fn empty_league_list_is_rejected() {
        assert!(Config::parse("leagues = []").is_err());
        assert!(Config::parse("[server]\nbind = \"0.0.0.0:80\"").is_err());
    }
}
